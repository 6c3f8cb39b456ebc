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

//! Checks passes against the resource graph and resolves their bindings.

use super::{expand_copies, PassFlag, PassKind, PassOutput, Pipeline, PipelineId, RenderPass};
use crate::error::SpecError;
use crate::layout::LayoutEngine;
use crate::resources::{
    ResourceClass, ResourceDecl, ResourceGraph, ResourceKind, ShaderStageKind, ShadowTarget,
};
use crate::types::is_identifier;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// A non-fatal finding. Generation proceeds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Diagnostic {
    /// A framebuffer's color attachment count differs from the number of
    /// outputs the program's fragment stage writes.
    AttachmentCountMismatch {
        /// The pipeline containing the pass.
        pipeline: String,
        /// The pass rendering into the framebuffer.
        pass: String,
        /// The framebuffer.
        framebuffer: String,
        /// Its color attachment count.
        attachments: usize,
        /// The program.
        program: String,
        /// The program's fragment output count.
        outputs: u32,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::AttachmentCountMismatch {
                pipeline,
                pass,
                framebuffer,
                attachments,
                program,
                outputs,
            } => write!(
                f,
                "pass '{pass}' of pipeline '{pipeline}': framebuffer '{framebuffer}' has \
                 {attachments} color attachment(s) but program '{program}' writes {outputs} output(s)"
            ),
        }
    }
}

/// A resource refreshed from host data before a pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Upload {
    /// A uniform buffer, written through its struct's marshal plan.
    Buffer {
        /// The buffer.
        buffer: String,
        /// The struct whose marshal plan performs the upload.
        struct_name: String,
    },
    /// A texture whose texels are replaced.
    Texture {
        /// The texture.
        texture: String,
    },
}

/// A texture bound to a texture unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TextureUnit {
    /// The unit index, following the pass's binding order.
    pub unit: u32,
    /// The texture.
    pub texture: String,
    /// The sampler.
    pub sampler: String,
}

/// A texture bound for image load/store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ImageUnit {
    /// The image unit, following the pass's binding order.
    pub unit: u32,
    /// The texture.
    pub texture: String,
}

/// A uniform buffer bound to a block binding point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BufferBinding {
    /// The binding point: the index of the struct among the program's uniform blocks.
    pub binding: u32,
    /// The buffer.
    pub buffer: String,
    /// The struct it holds.
    pub struct_name: String,
}

/// Exchanges the handles of a double-buffered texture and its shadow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TextureSwap {
    /// The texture sampled by the pass.
    pub texture: String,
    /// The shadow the pass rendered into.
    pub shadow: String,
}

/// A fully resolved pass, ready for emission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PassEmission {
    /// The pass name.
    pub name: String,
    /// The shader program.
    pub program: String,
    /// Draw or dispatch parameters.
    pub kind: PassKind,
    /// Resources refreshed before the pass.
    pub uploads: Vec<Upload>,
    /// Sampled textures.
    pub textures: Vec<TextureUnit>,
    /// Image load/store bindings.
    pub images: Vec<ImageUnit>,
    /// Uniform buffer bindings.
    pub buffers: Vec<BufferBinding>,
    /// The render target.
    pub output: PassOutput,
    /// `false` for the window's default target, which needs no explicit bind.
    pub explicit_bind: bool,
    /// The framebuffer attaches a double-buffered texture and must be
    /// regenerated against the current handles before the pass.
    pub regenerate_framebuffer: bool,
    /// Swaps performed after the pass, one per texture it both samples and
    /// renders into.
    pub swaps: Vec<TextureSwap>,
    /// Fixed-function state changes.
    pub flags: Vec<PassFlag>,
}

/// The emission plan of one pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PipelineEmission {
    /// The pipeline id used by the runtime switch.
    pub id: PipelineId,
    /// The pipeline name.
    pub name: String,
    /// The pipeline selected afterwards.
    pub next: Option<PipelineId>,
    /// The passes, in execution order, with copied passes expanded.
    pub passes: Vec<PassEmission>,
}

/// The outcome of a successful validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// One emission plan per pipeline, in declaration order.
    pub emissions: Vec<PipelineEmission>,
    /// Shadow textures to add to the resource graph, in order of first use.
    pub shadows: Vec<ShadowTarget>,
    /// Non-fatal findings.
    pub diagnostics: Vec<Diagnostic>,
}

/// Validates `pipelines` and resolves every pass.
///
/// `layouts` must already hold the layout of every struct a buffer or program
/// refers to; missing ones are reported as [`SpecError::UnknownStruct`].
/// Textures a pass samples while rendering into them are double buffered:
/// their shadows are listed in [`ValidationResult::shadows`] and are expected
/// to be added to the graph with
/// [`ResourceGraph::add_shadow`](crate::resources::ResourceGraph::add_shadow).
pub fn validate(
    pipelines: &[Pipeline],
    graph: &ResourceGraph,
    layouts: &LayoutEngine,
) -> Result<ValidationResult, SpecError> {
    let mut ids = HashMap::with_capacity(pipelines.len());
    for (i, pipeline) in pipelines.iter().enumerate() {
        if !is_identifier(&pipeline.name) {
            return Err(SpecError::InvalidIdentifier {
                name: pipeline.name.clone(),
            });
        }
        if ids.insert(pipeline.name.as_str(), PipelineId(i)).is_some() {
            return Err(SpecError::DuplicateName {
                kind: "pipeline",
                name: pipeline.name.clone(),
            });
        }
    }
    let expanded = expand_copies(pipelines)?;

    let validator = Validator {
        graph,
        layouts,
        shadows: shadow_targets(&expanded, graph),
    };
    let mut result = ValidationResult::default();
    for (i, (pipeline, passes)) in pipelines.iter().zip(&expanded).enumerate() {
        let next = match &pipeline.next {
            Some(name) => Some(*ids.get(name.as_str()).ok_or_else(|| {
                SpecError::DanglingReference {
                    referrer: pipeline.name.clone(),
                    missing: name.clone(),
                }
            })?),
            None => None,
        };

        let passes = passes
            .iter()
            .map(|pass| validator.pass(&pipeline.name, pass, &mut result.diagnostics))
            .collect::<Result<Vec<_>, SpecError>>()?;

        log::debug!(
            "Validated pipeline '{}' ({} passes).",
            pipeline.name,
            passes.len()
        );
        result.emissions.push(PipelineEmission {
            id: PipelineId(i),
            name: pipeline.name.clone(),
            next,
            passes,
        });
    }
    result.shadows = validator.shadows;
    Ok(result)
}

/// The attachments of the framebuffer `pass` renders into that it also
/// samples, in attachment order.
fn feedback_textures<'a>(pass: &RenderPass, graph: &'a ResourceGraph) -> Vec<&'a str> {
    let PassOutput::Framebuffer(name) = &pass.output else {
        return Vec::new();
    };
    let Some(ResourceKind::Framebuffer { color, depth, .. }) = graph.get(name).map(|d| &d.kind)
    else {
        return Vec::new();
    };
    color
        .iter()
        .chain(depth.iter())
        .filter(|attachment| pass.textures.iter().any(|b| &b.texture == *attachment))
        .map(String::as_str)
        .collect()
}

fn shadow_targets(passes: &[Vec<RenderPass>], graph: &ResourceGraph) -> Vec<ShadowTarget> {
    let mut shadows: Vec<ShadowTarget> = Vec::new();
    for pass in passes.iter().flatten() {
        for texture in feedback_textures(pass, graph) {
            if shadows.iter().any(|s| s.texture == texture) {
                continue;
            }
            let shadow = ShadowTarget::named(texture, |name| {
                graph.get(name).is_some() || shadows.iter().any(|s| s.name == name)
            });
            shadows.push(shadow);
        }
    }
    shadows
}

fn wrong_kind(referrer: &str, decl: &ResourceDecl, expected: ResourceClass) -> SpecError {
    SpecError::WrongResourceKind {
        referrer: referrer.to_string(),
        name: decl.name.clone(),
        expected,
        found: decl.class(),
    }
}

struct Validator<'a> {
    graph: &'a ResourceGraph,
    layouts: &'a LayoutEngine,
    shadows: Vec<ShadowTarget>,
}

impl Validator<'_> {
    fn struct_of_buffer(&self, referrer: &str, buffer: &str) -> Result<String, SpecError> {
        let decl = self.graph.require(referrer, buffer, ResourceClass::Buffer)?;
        let ResourceKind::Buffer { struct_name } = &decl.kind else {
            return Err(wrong_kind(referrer, decl, ResourceClass::Buffer));
        };
        if self.layouts.get(struct_name).is_none() {
            return Err(SpecError::UnknownStruct {
                referrer: buffer.to_string(),
                name: struct_name.clone(),
            });
        }
        Ok(struct_name.clone())
    }

    fn shadow_of(&self, texture: &str) -> Option<&ShadowTarget> {
        self.shadows.iter().find(|s| s.texture == texture)
    }

    fn pass(
        &self,
        pipeline: &str,
        pass: &RenderPass,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<PassEmission, SpecError> {
        let referrer = format!("{pipeline}.{}", pass.name);
        let invalid = |reason: String| SpecError::InvalidPass {
            pipeline: pipeline.to_string(),
            pass: pass.name.clone(),
            reason,
        };

        // (a) The program and its uniform blocks.
        let program = self
            .graph
            .require(&referrer, &pass.program, ResourceClass::ShaderProgram)?;
        let ResourceKind::ShaderProgram {
            stages,
            uniform_blocks,
            fragment_outputs,
        } = &program.kind
        else {
            return Err(wrong_kind(&referrer, program, ResourceClass::ShaderProgram));
        };
        for block in uniform_blocks {
            if self.layouts.get(block).is_none() {
                return Err(SpecError::UnknownStruct {
                    referrer: program.name.clone(),
                    name: block.clone(),
                });
            }
        }
        let is_compute = stages.iter().any(|stage| {
            matches!(
                self.graph.get(stage).map(|d| &d.kind),
                Some(ResourceKind::ShaderStage {
                    stage: ShaderStageKind::Compute,
                    ..
                })
            )
        });

        // (b) Every referenced resource, with its kind.
        let mut uploads = Vec::with_capacity(pass.updates.len());
        for name in &pass.updates {
            let decl = self.graph.get(name).ok_or_else(|| SpecError::DanglingReference {
                referrer: referrer.clone(),
                missing: name.clone(),
            })?;
            uploads.push(match &decl.kind {
                ResourceKind::Buffer { .. } => Upload::Buffer {
                    buffer: name.clone(),
                    struct_name: self.struct_of_buffer(&referrer, name)?,
                },
                ResourceKind::Texture { .. } => Upload::Texture {
                    texture: name.clone(),
                },
                _ => {
                    return Err(invalid(format!(
                        "updates {} '{name}'; only buffers and textures take host data",
                        decl.class()
                    )))
                }
            });
        }

        let mut textures = Vec::with_capacity(pass.textures.len());
        for (unit, binding) in pass.textures.iter().enumerate() {
            self.graph
                .require(&referrer, &binding.texture, ResourceClass::Texture)?;
            self.graph
                .require(&referrer, &binding.sampler, ResourceClass::Sampler)?;
            textures.push(TextureUnit {
                unit: unit as u32,
                texture: binding.texture.clone(),
                sampler: binding.sampler.clone(),
            });
        }

        let mut images = Vec::with_capacity(pass.images.len());
        for (unit, texture) in pass.images.iter().enumerate() {
            self.graph
                .require(&referrer, texture, ResourceClass::Texture)?;
            if images.iter().any(|i: &ImageUnit| i.texture == *texture) {
                return Err(invalid(format!("binds image '{texture}' more than once")));
            }
            images.push(ImageUnit {
                unit: unit as u32,
                texture: texture.clone(),
            });
        }

        let mut buffers = Vec::with_capacity(pass.buffers.len());
        for buffer in &pass.buffers {
            let struct_name = self.struct_of_buffer(&referrer, buffer)?;
            let binding = uniform_blocks
                .iter()
                .position(|block| *block == struct_name)
                .ok_or_else(|| {
                    invalid(format!(
                        "buffer '{buffer}' holds '{struct_name}', which is not a uniform block of program '{}'",
                        program.name
                    ))
                })?;
            buffers.push(BufferBinding {
                binding: binding as u32,
                buffer: buffer.clone(),
                struct_name,
            });
        }

        let (explicit_bind, attachments) = match &pass.output {
            PassOutput::Window => (false, None),
            PassOutput::Framebuffer(name) => {
                let fb = self
                    .graph
                    .require(&referrer, name, ResourceClass::Framebuffer)?;
                let ResourceKind::Framebuffer { color, depth, .. } = &fb.kind else {
                    return Err(wrong_kind(&referrer, fb, ResourceClass::Framebuffer));
                };
                (true, Some((name, color, depth)))
            }
        };

        // Pass-level consistency.
        match pass.kind {
            PassKind::Dispatch { .. } if !is_compute => {
                return Err(invalid(format!(
                    "dispatches program '{}', which has no compute stage",
                    program.name
                )));
            }
            PassKind::Dispatch { .. } if explicit_bind => {
                return Err(invalid(
                    "a dispatch cannot render into a framebuffer; bind images instead".into(),
                ));
            }
            PassKind::Draw { .. } if is_compute => {
                return Err(invalid(format!(
                    "draws with compute program '{}'",
                    program.name
                )));
            }
            _ => {}
        }

        // Double buffering.
        let regenerate_framebuffer = attachments.is_some_and(|(_, color, depth)| {
            color
                .iter()
                .chain(depth.iter())
                .any(|t| self.shadow_of(t).is_some())
        });
        let swaps = feedback_textures(pass, self.graph)
            .into_iter()
            .filter_map(|texture| self.shadow_of(texture))
            .map(|shadow| TextureSwap {
                texture: shadow.texture.clone(),
                shadow: shadow.name.clone(),
            })
            .collect();

        // (c) Attachment count versus fragment outputs, reported only.
        if let Some((name, color, _)) = attachments {
            if color.len() != *fragment_outputs as usize {
                let diagnostic = Diagnostic::AttachmentCountMismatch {
                    pipeline: pipeline.to_string(),
                    pass: pass.name.clone(),
                    framebuffer: name.clone(),
                    attachments: color.len(),
                    program: program.name.clone(),
                    outputs: *fragment_outputs,
                };
                log::warn!("{diagnostic}");
                diagnostics.push(diagnostic);
            }
        }

        Ok(PassEmission {
            name: pass.name.clone(),
            program: program.name.clone(),
            kind: pass.kind,
            uploads,
            textures,
            images,
            buffers,
            output: pass.output.clone(),
            explicit_bind,
            regenerate_framebuffer,
            swaps,
            flags: pass.flags.clone(),
        })
    }
}
