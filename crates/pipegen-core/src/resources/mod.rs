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

//! Defines the GPU resources a specification declares.
//!
//! Resources are identified by name only. Assigning them slots in a handle
//! table is left to the emission layer.

mod graph;
mod resize;

pub use graph::ResourceGraph;
pub use resize::{
    AttachmentRebind, AttachmentSlot, FramebufferRebind, ResizePlan, ResizeStep, TextureRecreate,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// How the dimensions of a texture or framebuffer are determined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SizePolicy {
    /// A constant size in texels.
    Fixed {
        /// Width in texels.
        width: u32,
        /// Height in texels.
        height: u32,
    },
    /// A multiple of the window size, recomputed on every resize.
    WindowRelative {
        /// Horizontal scale applied to the window width.
        scale_x: f32,
        /// Vertical scale applied to the window height.
        scale_y: f32,
    },
}

impl SizePolicy {
    /// Returns `true` for [`SizePolicy::WindowRelative`].
    pub fn is_window_relative(&self) -> bool {
        matches!(self, SizePolicy::WindowRelative { .. })
    }

    /// The concrete size for a window of `width` x `height`.
    ///
    /// Window-relative sizes are rounded to the nearest texel and never drop
    /// below one.
    pub fn resolve(&self, width: u32, height: u32) -> (u32, u32) {
        match *self {
            SizePolicy::Fixed { width, height } => (width, height),
            SizePolicy::WindowRelative { scale_x, scale_y } => {
                (scale_extent(width, scale_x), scale_extent(height, scale_y))
            }
        }
    }
}

fn scale_extent(extent: u32, scale: f32) -> u32 {
    let scaled = (f64::from(extent) * f64::from(scale)).round();
    scaled.clamp(1.0, f64::from(u32::MAX)) as u32
}

/// The texel formats a texture may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureFormat {
    /// Four 8-bit normalized unsigned channels.
    Rgba8Unorm,
    /// Four 8-bit normalized unsigned channels, sRGB encoded.
    Rgba8UnormSrgb,
    /// Four 16-bit float channels.
    Rgba16Float,
    /// Four 32-bit float channels.
    Rgba32Float,
    /// Two 16-bit float channels.
    Rg16Float,
    /// Two 32-bit float channels.
    Rg32Float,
    /// One 32-bit float channel.
    R32Float,
    /// One 32-bit unsigned integer channel.
    R32Uint,
    /// One 8-bit normalized unsigned channel.
    R8Unorm,
    /// Packed 10-bit color channels with a 2-bit alpha.
    Rgb10A2Unorm,
    /// Packed 11/11/10-bit float color channels.
    Rg11B10Float,
    /// 16-bit normalized depth.
    Depth16Unorm,
    /// 32-bit float depth.
    Depth32Float,
    /// 24-bit depth with 8-bit stencil.
    Depth24Stencil8,
}

impl TextureFormat {
    /// Returns `true` if this is a depth (or depth-stencil) format.
    pub fn is_depth(self) -> bool {
        matches!(
            self,
            TextureFormat::Depth16Unorm | TextureFormat::Depth32Float | TextureFormat::Depth24Stencil8
        )
    }
}

/// Texel filtering used when sampling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterMode {
    /// Returns the nearest texel.
    Nearest,
    /// Interpolates between neighbouring texels.
    #[default]
    Linear,
}

/// How coordinates outside `[0, 1]` are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressMode {
    /// Coordinates wrap around.
    #[default]
    Repeat,
    /// Coordinates are clamped to the edge texel.
    ClampToEdge,
    /// Coordinates wrap around, mirroring at each boundary.
    MirroredRepeat,
}

/// The pipeline stage a shader runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderStageKind {
    /// Vertex shading.
    Vertex,
    /// Fragment shading.
    Fragment,
    /// Compute work.
    Compute,
}

/// Where shader text comes from. The text itself is never inspected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderSource {
    /// Text embedded in the specification.
    Inline(String),
    /// A file read by the generated program.
    Path(PathBuf),
}

fn one() -> u32 {
    1
}

/// The kind-specific parameters of a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResourceKind {
    /// A uniform buffer holding one instance of a struct.
    Buffer {
        /// The struct stored in the buffer; its size is the buffer size.
        struct_name: String,
    },
    /// A 2D texture, either sized by policy or loaded from an image.
    Texture {
        /// The texel format.
        format: TextureFormat,
        /// Number of mip levels, at least one.
        #[serde(default = "one")]
        mip_levels: u32,
        /// The size policy, for textures not loaded from an image.
        #[serde(default)]
        size: Option<SizePolicy>,
        /// An RGBA8 image providing the initial contents and size.
        #[serde(default)]
        source: Option<PathBuf>,
        /// The color the texture is cleared to after creation.
        #[serde(default)]
        clear: Option<[f32; 4]>,
    },
    /// A texture sampler.
    Sampler {
        /// Minification filter.
        #[serde(default)]
        min: FilterMode,
        /// Magnification filter.
        #[serde(default)]
        mag: FilterMode,
        /// Coordinate wrapping.
        #[serde(default)]
        wrap: AddressMode,
    },
    /// A render target made of texture attachments.
    Framebuffer {
        /// Color attachments, by slot index.
        #[serde(default)]
        color: Vec<String>,
        /// The depth attachment.
        #[serde(default)]
        depth: Option<String>,
        /// The declared size policy, checked against the attachments.
        #[serde(default)]
        size: Option<SizePolicy>,
    },
    /// One shader stage.
    ShaderStage {
        /// The stage it runs in.
        stage: ShaderStageKind,
        /// Where its text comes from.
        source: ShaderSource,
    },
    /// A linked shader program.
    ShaderProgram {
        /// The stages linked into the program.
        stages: Vec<String>,
        /// Structs bound as std140 uniform blocks, in binding order.
        #[serde(default)]
        uniform_blocks: Vec<String>,
        /// Number of color outputs written by the fragment stage.
        #[serde(default)]
        fragment_outputs: u32,
    },
}

impl ResourceKind {
    /// The class of this resource.
    pub fn class(&self) -> ResourceClass {
        match self {
            ResourceKind::Buffer { .. } => ResourceClass::Buffer,
            ResourceKind::Texture { .. } => ResourceClass::Texture,
            ResourceKind::Sampler { .. } => ResourceClass::Sampler,
            ResourceKind::Framebuffer { .. } => ResourceClass::Framebuffer,
            ResourceKind::ShaderStage { .. } => ResourceClass::ShaderStage,
            ResourceKind::ShaderProgram { .. } => ResourceClass::ShaderProgram,
        }
    }
}

/// The class of a resource, without its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceClass {
    /// See [`ResourceKind::Buffer`].
    Buffer,
    /// See [`ResourceKind::Texture`].
    Texture,
    /// See [`ResourceKind::Sampler`].
    Sampler,
    /// See [`ResourceKind::Framebuffer`].
    Framebuffer,
    /// See [`ResourceKind::ShaderStage`].
    ShaderStage,
    /// See [`ResourceKind::ShaderProgram`].
    ShaderProgram,
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceClass::Buffer => "buffer",
            ResourceClass::Texture => "texture",
            ResourceClass::Sampler => "sampler",
            ResourceClass::Framebuffer => "framebuffer",
            ResourceClass::ShaderStage => "shader stage",
            ResourceClass::ShaderProgram => "shader program",
        })
    }
}

/// A named resource declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDecl {
    /// The unique resource name.
    pub name: String,
    /// The kind and its parameters.
    pub kind: ResourceKind,
}

impl ResourceDecl {
    /// Creates a declaration.
    pub fn new(name: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// The class of this resource.
    pub fn class(&self) -> ResourceClass {
        self.kind.class()
    }

    /// Declares a uniform buffer.
    pub fn buffer(name: impl Into<String>, struct_name: impl Into<String>) -> Self {
        Self::new(
            name,
            ResourceKind::Buffer {
                struct_name: struct_name.into(),
            },
        )
    }

    /// Declares a single-mip texture with a size policy.
    pub fn texture(name: impl Into<String>, format: TextureFormat, size: SizePolicy) -> Self {
        Self::new(
            name,
            ResourceKind::Texture {
                format,
                mip_levels: 1,
                size: Some(size),
                source: None,
                clear: None,
            },
        )
    }

    /// Declares a framebuffer whose size follows its attachments.
    pub fn framebuffer<S: Into<String>>(
        name: impl Into<String>,
        color: impl IntoIterator<Item = S>,
        depth: Option<&str>,
    ) -> Self {
        Self::new(
            name,
            ResourceKind::Framebuffer {
                color: color.into_iter().map(Into::into).collect(),
                depth: depth.map(str::to_string),
                size: None,
            },
        )
    }

    /// Declares a shader stage with inline text.
    pub fn stage(name: impl Into<String>, stage: ShaderStageKind, text: &str) -> Self {
        Self::new(
            name,
            ResourceKind::ShaderStage {
                stage,
                source: ShaderSource::Inline(text.to_string()),
            },
        )
    }

    /// Declares a shader program.
    pub fn program<S: Into<String>, B: Into<String>>(
        name: impl Into<String>,
        stages: impl IntoIterator<Item = S>,
        uniform_blocks: impl IntoIterator<Item = B>,
        fragment_outputs: u32,
    ) -> Self {
        Self::new(
            name,
            ResourceKind::ShaderProgram {
                stages: stages.into_iter().map(Into::into).collect(),
                uniform_blocks: uniform_blocks.into_iter().map(Into::into).collect(),
                fragment_outputs,
            },
        )
    }
}

/// A generated copy of a texture that a pass both samples and renders into.
///
/// The pass renders into the shadow while sampling the original, and the two
/// handles are swapped once the pass has run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ShadowTarget {
    /// The double-buffered texture.
    pub texture: String,
    /// The generated copy, `<texture>Target` unless that name is taken.
    pub name: String,
}

impl ShadowTarget {
    /// Picks a shadow name for `texture` that `taken` does not reject.
    pub fn named(texture: &str, mut taken: impl FnMut(&str) -> bool) -> Self {
        let mut name = format!("{texture}Target");
        let mut attempt = 1;
        while taken(&name) {
            name = format!("{texture}Target{attempt}");
            attempt += 1;
        }
        Self {
            texture: texture.to_string(),
            name,
        }
    }
}
