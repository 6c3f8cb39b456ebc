// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::Result;
use clap::Parser;
use pipegen_cli::Cli;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

// --- Test Setup: fixture paths and argument helpers ---
fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

fn cli(args: &[&str]) -> Cli {
    Cli::parse_from(std::iter::once("pipegen").chain(args.iter().copied()))
}

fn empty_config(dir: &Path) -> Result<PathBuf> {
    let path = dir.join("pipegen.toml");
    fs::write(&path, "")?;
    Ok(path)
}
// ---

#[test]
fn test_generates_every_artifact() -> Result<()> {
    // --- 1. ARRANGE ---
    let dir = tempdir()?;
    let out = dir.path().join("generated");
    let config = empty_config(dir.path())?;
    let input = fixture("window_params.ron");

    // --- 2. ACT ---
    let outcome = pipegen_cli::run(&cli(&[
        input.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]))?;

    // --- 3. ASSERT ---
    assert_eq!(outcome.written.len(), 7);
    assert_eq!(outcome.diagnostics, 0);
    for name in [
        "layouts.ron",
        "marshal.ron",
        "setup.ron",
        "resize.ron",
        "pipelines.ron",
        "structs.glsl",
        "manifest.ron",
    ] {
        assert!(out.join(name).is_file(), "{name} should be written");
    }

    let layouts = fs::read_to_string(out.join("layouts.ron"))?;
    assert!(layouts.contains("total_size: 48"));
    let glsl = fs::read_to_string(out.join("structs.glsl"))?;
    assert!(glsl.contains("struct WindowParamsType"));
    Ok(())
}

#[test]
fn test_check_writes_nothing() -> Result<()> {
    let dir = tempdir()?;
    let out = dir.path().join("generated");
    let config = empty_config(dir.path())?;
    let input = fixture("deferred.ron");

    let outcome = pipegen_cli::run(&cli(&[
        input.to_str().unwrap(),
        "--check",
        "-o",
        out.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]))?;

    assert!(outcome.written.is_empty());
    // GBuffer has two color attachments, the geometry program writes one output.
    assert_eq!(outcome.diagnostics, 1);
    assert!(!out.exists());
    Ok(())
}

#[test]
fn test_resize_plan_uses_configured_window() -> Result<()> {
    // --- 1. ARRANGE ---
    let dir = tempdir()?;
    let out = dir.path().join("generated");
    let config = dir.path().join("pipegen.toml");
    fs::write(
        &config,
        "backend = \"d3d12\"\nwindowing = \"glfw\"\n[initial_window]\nwidth = 640\nheight = 480\n",
    )?;

    // --- 2. ACT ---
    pipegen_cli::run(&cli(&[
        fixture("deferred.ron").to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]))?;

    // --- 3. ASSERT ---
    let resize = fs::read_to_string(out.join("resize.ron"))?;
    assert!(resize.contains("width: 640"));
    assert!(resize.contains("\"GBuffer\""));
    let albedo = resize.find("\"Albedo\"").unwrap();
    let gbuffer = resize.find("\"GBuffer\"").unwrap();
    assert!(albedo < gbuffer);

    let manifest = fs::read_to_string(out.join("manifest.ron"))?;
    assert!(manifest.contains("d3d12"));
    assert!(manifest.contains("glfw"));
    Ok(())
}

#[test]
fn test_failure_reports_stage_and_writes_nothing() -> Result<()> {
    let dir = tempdir()?;
    let out = dir.path().join("generated");
    let config = empty_config(dir.path())?;

    let err = pipegen_cli::run(&cli(&[
        fixture("cyclic.ron").to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]))
    .unwrap_err();

    let chain = format!("{err:#}");
    assert!(chain.contains("LayoutComputed"), "{chain}");
    assert!(chain.contains("A -> B -> A"), "{chain}");
    assert!(!out.exists());
    Ok(())
}

#[test]
fn test_missing_input_is_reported() -> Result<()> {
    let dir = tempdir()?;
    let config = empty_config(dir.path())?;
    let missing = dir.path().join("nowhere.ron");

    let err = pipegen_cli::run(&cli(&[
        missing.to_str().unwrap(),
        "--check",
        "--config",
        config.to_str().unwrap(),
    ]))
    .unwrap_err();
    assert!(err.to_string().contains("nowhere.ron"));
    Ok(())
}

#[test]
fn test_shared_uniform_block_is_declared_once() -> Result<()> {
    // --- 1. ARRANGE ---
    let dir = tempdir()?;
    let out = dir.path().join("generated");
    let config = empty_config(dir.path())?;

    // --- 2. ACT ---
    pipegen_cli::run(&cli(&[
        fixture("deferred.ron").to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]))?;

    // --- 3. ASSERT ---
    // Geometry and Lighting both bind SceneType at binding 0.
    let glsl = fs::read_to_string(out.join("structs.glsl"))?;
    assert_eq!(glsl.matches("uniform SceneTypeBlock\n").count(), 1, "{glsl}");
    assert_eq!(glsl.matches("struct SceneType\n").count(), 1, "{glsl}");
    assert!(glsl.contains("// Used by: Geometry, Lighting\n"), "{glsl}");
    Ok(())
}
