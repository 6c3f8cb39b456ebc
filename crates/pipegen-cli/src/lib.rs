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

//! # Pipegen CLI
//!
//! Reads a specification, runs the generator and writes its artifacts.

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod load;
pub mod output;
pub mod render;

pub use cli::Cli;
pub use config::GeneratorConfig;

use anyhow::{Context, Result};
use pipegen_core::Generator;
use std::path::PathBuf;

/// What a successful invocation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// The files written, empty for `--check`.
    pub written: Vec<PathBuf>,
    /// The number of non-fatal diagnostics reported.
    pub diagnostics: usize,
}

/// Runs one invocation of the command line tool.
pub fn run(cli: &Cli) -> Result<Outcome> {
    let mut config = GeneratorConfig::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);

    let spec = load::load_specification(&cli.input)?;
    let artifacts = Generator::new()
        .run(&spec)
        .with_context(|| format!("Failed to generate from '{}'", cli.input.display()))?;
    for diagnostic in &artifacts.diagnostics {
        log::warn!("{diagnostic}");
    }

    if cli.check {
        log::info!("'{}' is valid.", cli.input.display());
        return Ok(Outcome {
            written: Vec::new(),
            diagnostics: artifacts.diagnostics.len(),
        });
    }

    let files = render::render_all(&artifacts, &config)?;
    let written = output::write_staged(&files, &config.output_dir)?;
    log::info!(
        "Wrote {} artifacts to '{}' for {:?} / {:?}.",
        written.len(),
        config.output_dir.display(),
        config.backend,
        config.windowing
    );
    Ok(Outcome {
        written,
        diagnostics: artifacts.diagnostics.len(),
    })
}
