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

//! Pipelines ("renderers") and the render passes they run in order.
//!
//! The runtime selects the active pipeline through a [`PipelineId`]; the
//! switch over that id is generated glue and not modelled here.

mod copy;
mod validate;

pub use copy::expand_copies;
pub use validate::{
    validate, BufferBinding, Diagnostic, ImageUnit, PassEmission, PipelineEmission, TextureSwap,
    TextureUnit, Upload, ValidationResult,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a pipeline by its declaration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PipelineId(pub usize);

impl fmt::Display for PipelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a pass executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassKind {
    /// A non-indexed draw of `vertices` vertices.
    Draw {
        /// Vertex count.
        vertices: u32,
    },
    /// A compute dispatch of `x * y * z` work groups.
    Dispatch {
        /// Work groups along X.
        x: u32,
        /// Work groups along Y.
        y: u32,
        /// Work groups along Z.
        z: u32,
    },
}

/// Where a pass renders to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassOutput {
    /// The window's default target.
    #[default]
    Window,
    /// A declared framebuffer.
    Framebuffer(String),
}

/// Fixed-function state toggled around a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Depth testing.
    DepthTest,
    /// Stencil testing.
    StencilTest,
    /// Color blending.
    Blend,
    /// Back-face culling.
    CullFace,
    /// Scissor testing.
    ScissorTest,
    /// Linear to sRGB conversion on write.
    FramebufferSrgb,
    /// Multisample rasterization.
    Multisample,
}

/// Enables or disables a [`Capability`] for the duration of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassFlag {
    /// Turn the capability on.
    Enable(Capability),
    /// Turn the capability off.
    Disable(Capability),
}

/// A texture sampled by a pass, with the sampler it is read through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureBinding {
    /// The sampled texture.
    pub texture: String,
    /// The sampler.
    pub sampler: String,
}

/// One step of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderPass {
    /// The pass name, unique within its pipeline.
    pub name: String,
    /// The shader program run by the pass.
    pub program: String,
    /// Draw or dispatch parameters.
    pub kind: PassKind,
    /// Buffers or textures refreshed from host data before the pass runs.
    #[serde(default)]
    pub updates: Vec<String>,
    /// Sampled textures, bound to consecutive texture units.
    #[serde(default)]
    pub textures: Vec<TextureBinding>,
    /// Textures bound for image load/store (UAVs on D3D12), in binding order.
    #[serde(default)]
    pub images: Vec<String>,
    /// Uniform buffers bound for the pass.
    #[serde(default)]
    pub buffers: Vec<String>,
    /// The render target.
    #[serde(default)]
    pub output: PassOutput,
    /// Fixed-function state changes.
    #[serde(default)]
    pub flags: Vec<PassFlag>,
}

impl RenderPass {
    /// Creates a draw pass that renders to the window with no inputs.
    pub fn draw(name: impl Into<String>, program: impl Into<String>, vertices: u32) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            kind: PassKind::Draw { vertices },
            updates: Vec::new(),
            textures: Vec::new(),
            images: Vec::new(),
            buffers: Vec::new(),
            output: PassOutput::Window,
            flags: Vec::new(),
        }
    }
}

/// An ordered list of passes, a.k.a. a renderer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pipeline {
    /// The pipeline name.
    pub name: String,
    /// Pipelines whose passes run first, in order. A pass of this pipeline
    /// with the name of a copied pass replaces it in place.
    #[serde(default)]
    pub copies: Vec<String>,
    /// The passes, in execution order.
    pub passes: Vec<RenderPass>,
    /// The pipeline selected after this one finishes, if any.
    #[serde(default)]
    pub next: Option<String>,
}

impl Pipeline {
    /// Creates a pipeline with no successor.
    pub fn new(name: impl Into<String>, passes: Vec<RenderPass>) -> Self {
        Self {
            name: name.into(),
            copies: Vec::new(),
            passes,
            next: None,
        }
    }
}
