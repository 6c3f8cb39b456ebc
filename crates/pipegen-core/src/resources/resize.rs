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

//! The data describing what a runtime must do when the window is resized.

use super::TextureFormat;
use serde::Serialize;

/// A window-relative texture to destroy and recreate at a new size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextureRecreate {
    /// The texture name.
    pub name: String,
    /// The preserved texel format.
    pub format: TextureFormat,
    /// The preserved mip count.
    pub mip_levels: u32,
    /// The preserved clear color.
    pub clear: Option<[f32; 4]>,
    /// New width in texels.
    pub width: u32,
    /// New height in texels.
    pub height: u32,
}

/// A framebuffer attachment point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum AttachmentSlot {
    /// A color attachment by slot index.
    Color(usize),
    /// The depth attachment.
    Depth,
}

/// One attachment to rebind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AttachmentRebind {
    /// The attachment point.
    pub slot: AttachmentSlot,
    /// The (recreated or unchanged) texture bound there.
    pub texture: String,
}

/// A framebuffer whose attachments must be rebound after recreation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FramebufferRebind {
    /// The framebuffer name.
    pub name: String,
    /// Color slots by index, then depth.
    pub attachments: Vec<AttachmentRebind>,
}

/// The ordered resize work for one window size.
///
/// Every texture is recreated before any framebuffer is rebound, since binding
/// a destroyed texture handle is undefined in the target APIs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResizePlan {
    /// The window width the plan was computed for.
    pub width: u32,
    /// The window height the plan was computed for.
    pub height: u32,
    /// Textures to recreate, in declaration order.
    pub textures: Vec<TextureRecreate>,
    /// Framebuffers to rebind, in declaration order.
    pub framebuffers: Vec<FramebufferRebind>,
}

/// One step of a [`ResizePlan`], in execution order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeStep<'a> {
    /// Destroy and recreate a texture.
    Recreate(&'a TextureRecreate),
    /// Rebind a framebuffer's attachments.
    Rebind(&'a FramebufferRebind),
}

impl ResizeStep<'_> {
    /// The resource the step acts on.
    pub fn name(&self) -> &str {
        match self {
            ResizeStep::Recreate(t) => &t.name,
            ResizeStep::Rebind(f) => &f.name,
        }
    }
}

impl ResizePlan {
    /// Returns `true` if nothing depends on the window size.
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty() && self.framebuffers.is_empty()
    }

    /// Iterates every step in execution order.
    pub fn steps(&self) -> impl Iterator<Item = ResizeStep<'_>> {
        self.textures
            .iter()
            .map(ResizeStep::Recreate)
            .chain(self.framebuffers.iter().map(ResizeStep::Rebind))
    }
}
