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

//! Renders generation artifacts to text, entirely in memory.

use crate::config::{Backend, GeneratorConfig, WindowSize, Windowing};
use anyhow::{Context, Result};
use pipegen_core::GeneratedArtifacts;
use ron::ser::PrettyConfig;
use serde::Serialize;

/// Struct layouts.
pub const LAYOUTS_FILE: &str = "layouts.ron";
/// Marshal plans.
pub const MARSHAL_FILE: &str = "marshal.ron";
/// Resource creation steps.
pub const SETUP_FILE: &str = "setup.ron";
/// The resize plan for the initial window.
pub const RESIZE_FILE: &str = "resize.ron";
/// Pipeline emission plans.
pub const PIPELINES_FILE: &str = "pipelines.ron";
/// GLSL struct and uniform block declarations.
pub const GLSL_FILE: &str = "structs.glsl";
/// The run summary.
pub const MANIFEST_FILE: &str = "manifest.ron";

/// One artifact file and its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    /// The file name inside the output directory.
    pub name: &'static str,
    /// The file contents.
    pub contents: String,
}

#[derive(Serialize)]
struct Manifest<'a> {
    generator: &'static str,
    backend: Backend,
    windowing: Windowing,
    initial_window: WindowSize,
    structs: usize,
    resources: usize,
    pipelines: Vec<&'a str>,
    diagnostics: Vec<String>,
    files: Vec<&'static str>,
}

fn to_ron<T: Serialize + ?Sized>(value: &T, file: &str) -> Result<String> {
    let mut text = ron::ser::to_string_pretty(value, PrettyConfig::default())
        .with_context(|| format!("Failed to serialize '{file}'"))?;
    text.push('\n');
    Ok(text)
}

/// Renders every artifact file.
pub fn render_all(artifacts: &GeneratedArtifacts, config: &GeneratorConfig) -> Result<Vec<RenderedFile>> {
    let window = config.initial_window;
    let mut files = vec![
        RenderedFile {
            name: LAYOUTS_FILE,
            contents: to_ron(&artifacts.layouts, LAYOUTS_FILE)?,
        },
        RenderedFile {
            name: MARSHAL_FILE,
            contents: to_ron(&artifacts.marshal_plans, MARSHAL_FILE)?,
        },
        RenderedFile {
            name: SETUP_FILE,
            contents: to_ron(&artifacts.setup, SETUP_FILE)?,
        },
        RenderedFile {
            name: RESIZE_FILE,
            contents: to_ron(&artifacts.resize_plan(window.width, window.height), RESIZE_FILE)?,
        },
        RenderedFile {
            name: PIPELINES_FILE,
            contents: to_ron(&artifacts.pipelines, PIPELINES_FILE)?,
        },
        RenderedFile {
            name: GLSL_FILE,
            contents: artifacts.glsl_declarations(),
        },
    ];

    let manifest = Manifest {
        generator: concat!("pipegen ", env!("CARGO_PKG_VERSION")),
        backend: config.backend,
        windowing: config.windowing,
        initial_window: window,
        structs: artifacts.layouts.len(),
        resources: artifacts.setup.len(),
        pipelines: artifacts.pipelines.iter().map(|p| p.name.as_str()).collect(),
        diagnostics: artifacts.diagnostics.iter().map(ToString::to_string).collect(),
        files: files.iter().map(|f| f.name).collect(),
    };
    files.push(RenderedFile {
        name: MANIFEST_FILE,
        contents: to_ron(&manifest, MANIFEST_FILE)?,
    });
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipegen_core::{Generator, Specification, StructDef};

    #[test]
    fn renders_every_file() {
        let spec = Specification::default().with_struct(StructDef::new(
            "Params",
            [("Time", "float".parse().unwrap())],
        ));
        let artifacts = Generator::new().run(&spec).unwrap();
        let files = render_all(&artifacts, &GeneratorConfig::default()).unwrap();

        let names: Vec<_> = files.iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            [
                LAYOUTS_FILE,
                MARSHAL_FILE,
                SETUP_FILE,
                RESIZE_FILE,
                PIPELINES_FILE,
                GLSL_FILE,
                MANIFEST_FILE
            ]
        );
        let manifest = &files[6].contents;
        assert!(manifest.contains("backend: opengl") || manifest.contains("backend:opengl"));
        assert!(files[1].contents.contains("Time"));
        assert!(files[5].contents.contains("struct Params"));
    }
}
