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

//! Command line arguments.

use crate::config::{Backend, GeneratorConfig, WindowSize, Windowing};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Generates GPU pipeline artifacts from a specification.
#[derive(Parser, Debug, Clone)]
#[command(name = "pipegen", version, about)]
pub struct Cli {
    /// The specification to read (`.ron` or `.json`).
    pub input: PathBuf,

    /// Directory the artifacts are written to.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// The targeted graphics API.
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// The windowing shim.
    #[arg(long, value_enum)]
    pub windowing: Option<Windowing>,

    /// Configuration file to use instead of `pipegen.toml`.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Validate the specification without writing anything.
    #[arg(long)]
    pub check: bool,

    /// Initial window size, e.g. `1920x1080`.
    #[arg(long)]
    pub window: Option<WindowSize>,

    /// Increase log verbosity.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Applies the flags that override configuration values.
    pub fn apply_overrides(&self, config: &mut GeneratorConfig) {
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(windowing) = self.windowing {
            config.windowing = windowing;
        }
        if let Some(window) = self.window {
            config.initial_window = window;
        }
    }
}
