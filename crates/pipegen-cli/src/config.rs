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

//! The `pipegen.toml` configuration file.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "pipegen.toml";

/// The graphics API targeted by the generated source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// OpenGL 4.5 core profile.
    #[default]
    #[value(name = "opengl")]
    OpenGl,
    /// Direct3D 12.
    #[value(name = "d3d12")]
    D3d12,
}

/// The windowing shim driving the generated main loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Windowing {
    /// SDL2.
    #[default]
    Sdl,
    /// GLFW.
    Glfw,
}

/// A window size in pixels, written `WIDTHxHEIGHT` on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

impl FromStr for WindowSize {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (w, h) = text
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{text}'"))?;
        let parse = |part: &str| -> Result<u32, String> {
            match part.trim().parse::<u32>() {
                Ok(0) | Err(_) => Err(format!("'{part}' is not a positive pixel count")),
                Ok(n) => Ok(n),
            }
        };
        Ok(Self {
            width: parse(w)?,
            height: parse(h)?,
        })
    }
}

impl fmt::Display for WindowSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Generator settings, read from `pipegen.toml` and overridden by flags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// The targeted graphics API.
    pub backend: Backend,
    /// The windowing shim.
    pub windowing: Windowing,
    /// Where artifacts are written.
    pub output_dir: PathBuf,
    /// The window size the initial resize plan is computed for.
    pub initial_window: WindowSize,
}

impl Default for GeneratorConfig {
    /// OpenGL through SDL, a 1280x720 window, artifacts in `generated/`.
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            windowing: Windowing::default(),
            output_dir: PathBuf::from("generated"),
            initial_window: WindowSize::default(),
        }
    }
}

impl GeneratorConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse generator configuration")
    }

    /// Loads the configuration.
    ///
    /// An explicit path must exist. Without one, `pipegen.toml` in the working
    /// directory is used if present, and the defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !path.exists() {
                    log::debug!("No '{}' found. Using default configuration.", path.display());
                    return Ok(Self::default());
                }
                path
            }
        };

        log::info!("Loading configuration from '{}'.", path.display());
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration file '{}'", path.display()))?;
        Self::from_toml(&text)
            .with_context(|| format!("Failed to parse TOML from '{}'", path.display()))
    }
}
