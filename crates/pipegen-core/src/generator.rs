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

//! The staged generation run.
//!
//! A run moves through [`Stage`]s in a fixed order. The first fatal error
//! aborts it with a [`GenerationError`] naming the stage being entered, and no
//! artifacts are produced.

use crate::error::{GenerationError, SpecError};
use crate::graph::topological_sort;
use crate::layout::{LayoutEngine, StructLayout};
use crate::marshal::{MarshalGenerator, MarshalPlan};
use crate::pipeline::{validate, Diagnostic, PipelineEmission};
use crate::resources::{ResizePlan, ResourceClass, ResourceGraph, ResourceKind};
use crate::spec::Specification;
use crate::types::glsl::{struct_declaration, uniform_block};
use crate::types::{StructDef, StructTable};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// The steps of a generation run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Stage {
    /// The specification has been read.
    Loaded,
    /// Struct declarations are well formed.
    TypeChecked,
    /// Every struct has a std140 layout.
    LayoutComputed,
    /// Resources are indexed and their references resolved.
    GraphBuilt,
    /// Pipelines and passes are resolved.
    Validated,
    /// All artifacts are produced.
    Emitted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One resource to create, in creation order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetupStep {
    /// The resource name.
    pub name: String,
    /// The resource class.
    pub class: ResourceClass,
    /// The declared parameters.
    pub kind: ResourceKind,
    /// The size of a buffer in bytes.
    pub byte_size: Option<usize>,
}

/// Everything an emission layer needs to write backend source.
#[derive(Debug, Clone)]
pub struct GeneratedArtifacts {
    /// The checked struct table.
    pub structs: StructTable,
    /// One layout per struct, in declaration order.
    pub layouts: Vec<StructLayout>,
    /// One marshal plan per struct, in declaration order.
    pub marshal_plans: Vec<MarshalPlan>,
    /// Resource creation steps, in creation order.
    pub setup: Vec<SetupStep>,
    /// The resource graph, for resize plans.
    pub graph: ResourceGraph,
    /// One emission plan per pipeline.
    pub pipelines: Vec<PipelineEmission>,
    /// Non-fatal findings.
    pub diagnostics: Vec<Diagnostic>,
}

impl GeneratedArtifacts {
    /// The layout of `name`.
    pub fn layout(&self, name: &str) -> Option<&StructLayout> {
        self.layouts.iter().find(|l| l.name == name)
    }

    /// The marshal plan of `name`.
    pub fn marshal_plan(&self, name: &str) -> Option<&MarshalPlan> {
        self.marshal_plans.iter().find(|p| p.struct_name == name)
    }

    /// The resize work for a window of `width` x `height`.
    pub fn resize_plan(&self, width: u32, height: u32) -> ResizePlan {
        self.graph.plan_resize(width, height)
    }

    /// Structs ordered so every struct follows the structs it embeds.
    pub fn structs_in_dependency_order(&self) -> Vec<&StructDef> {
        let defs: Vec<&StructDef> = self.structs.iter().collect();
        let index: HashMap<&str, usize> = defs
            .iter()
            .enumerate()
            .map(|(i, def)| (def.name.as_str(), i))
            .collect();
        let edges = defs.iter().enumerate().flat_map(|(child, def)| {
            def.fields
                .iter()
                .filter_map(|f| f.ty.referenced_struct())
                .filter_map(|name| index.get(name).map(|&parent| (parent, child)))
                .collect::<Vec<_>>()
        });
        match topological_sort(defs.len(), edges) {
            Ok(order) => order.into_iter().map(|i| defs[i]).collect(),
            // Layouts were computed, so the struct graph is acyclic.
            Err(_) => defs,
        }
    }

    /// GLSL declarations of every struct, followed by one uniform block per
    /// struct and binding point used by a program, so shader sources can
    /// include host-consistent types.
    ///
    /// The first binding of a struct declares `<Struct>Block` with its members
    /// at global scope. Programs binding the same struct elsewhere get
    /// `<Struct>Block<binding>`, scoped by the instance `<Struct>At<binding>`.
    pub fn glsl_declarations(&self) -> String {
        let mut out = String::new();
        for def in self.structs_in_dependency_order() {
            out.push_str(&struct_declaration(def));
            out.push('\n');
        }

        let mut blocks: Vec<(&str, u32, Vec<&str>)> = Vec::new();
        for step in &self.setup {
            if let ResourceKind::ShaderProgram { uniform_blocks, .. } = &step.kind {
                for (binding, name) in uniform_blocks.iter().enumerate() {
                    let binding = binding as u32;
                    match blocks
                        .iter_mut()
                        .find(|(s, b, _)| *s == name.as_str() && *b == binding)
                    {
                        Some((_, _, programs)) => programs.push(step.name.as_str()),
                        None => blocks.push((name.as_str(), binding, vec![step.name.as_str()])),
                    }
                }
            }
        }

        for (i, (name, binding, programs)) in blocks.iter().enumerate() {
            let Some(def) = self.structs.get(name) else {
                continue;
            };
            let rebound = blocks[..i].iter().any(|(s, _, _)| s == name);
            let (block, instance) = if rebound {
                (format!("{name}Block{binding}"), format!("{name}At{binding}"))
            } else {
                (format!("{name}Block"), String::new())
            };
            out.push_str(&format!("// Used by: {}\n", programs.join(", ")));
            out.push_str(&uniform_block(def, *binding, &block, &instance));
            out.push('\n');
        }
        out
    }
}

/// Drives a [`Specification`] through every [`Stage`].
#[derive(Debug, Clone, Default)]
pub struct Generator {
    reached: Option<Stage>,
}

impl Generator {
    /// Creates a generator that has not started.
    pub fn new() -> Self {
        Self::default()
    }

    /// The last stage successfully reached, if any.
    pub fn stage(&self) -> Option<Stage> {
        self.reached
    }

    fn advance(&mut self, stage: Stage) {
        log::info!("Generation reached stage {stage}.");
        self.reached = Some(stage);
    }

    /// Runs every stage over `spec`.
    pub fn run(&mut self, spec: &Specification) -> Result<GeneratedArtifacts, GenerationError> {
        self.reached = None;
        log::info!(
            "Loaded specification: {} structs, {} resources, {} pipelines.",
            spec.structs.len(),
            spec.resources.len(),
            spec.pipelines.len()
        );
        self.advance(Stage::Loaded);

        let at = |stage: Stage| move |error: SpecError| GenerationError::new(stage, error);

        // TypeChecked
        let structs = StructTable::new(spec.structs.iter().cloned()).map_err(at(Stage::TypeChecked))?;
        structs.check().map_err(at(Stage::TypeChecked))?;
        self.advance(Stage::TypeChecked);

        // LayoutComputed
        let mut engine = LayoutEngine::new(structs);
        engine.compute_all().map_err(at(Stage::LayoutComputed))?;
        for decl in &spec.resources {
            if let ResourceKind::Buffer { struct_name } = &decl.kind {
                engine
                    .layout_for(&decl.name, struct_name)
                    .map_err(at(Stage::LayoutComputed))?;
            }
        }
        self.advance(Stage::LayoutComputed);

        // GraphBuilt
        let mut graph =
            ResourceGraph::build(spec.resources.iter().cloned()).map_err(at(Stage::GraphBuilt))?;
        self.advance(Stage::GraphBuilt);

        // Validated
        let validation =
            validate(&spec.pipelines, &graph, &engine).map_err(at(Stage::Validated))?;
        for shadow in &validation.shadows {
            graph.add_shadow(shadow).map_err(at(Stage::Validated))?;
        }
        self.advance(Stage::Validated);

        // Emitted
        let marshal = MarshalGenerator::new(&engine);
        let marshal_plans = engine
            .layouts()
            .map(|layout| marshal.plan_for(layout))
            .collect::<Result<Vec<_>, _>>()
            .map_err(at(Stage::Emitted))?;
        let setup = graph
            .creation_order()
            .into_iter()
            .map(|decl| SetupStep {
                name: decl.name.clone(),
                class: decl.class(),
                kind: decl.kind.clone(),
                byte_size: match &decl.kind {
                    ResourceKind::Buffer { struct_name } => {
                        engine.get(struct_name).map(|l| l.total_size)
                    }
                    _ => None,
                },
            })
            .collect();

        let structs = engine.table().clone();
        let artifacts = GeneratedArtifacts {
            structs,
            layouts: engine.into_layouts(),
            marshal_plans,
            setup,
            graph,
            pipelines: validation.emissions,
            diagnostics: validation.diagnostics,
        };
        if !artifacts.diagnostics.is_empty() {
            log::warn!(
                "Generation finished with {} diagnostic(s).",
                artifacts.diagnostics.len()
            );
        }
        self.advance(Stage::Emitted);
        Ok(artifacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Pipeline, RenderPass};
    use crate::resources::{ResourceDecl, ShaderStageKind};

    fn window_params() -> StructDef {
        StructDef::new(
            "WindowParamsType",
            [
                ("WindowSize", "vec4".parse().unwrap()),
                ("WindowScale", "vec4".parse().unwrap()),
                ("ElapsedTime", "float".parse().unwrap()),
            ],
        )
    }

    fn minimal() -> Specification {
        Specification::default()
            .with_struct(window_params())
            .with_resource(ResourceDecl::buffer("WindowParams", "WindowParamsType"))
            .with_resource(ResourceDecl::stage("Vs", ShaderStageKind::Vertex, "void main() {}"))
            .with_resource(ResourceDecl::stage("Fs", ShaderStageKind::Fragment, "void main() {}"))
            .with_resource(ResourceDecl::program("Splat", ["Vs", "Fs"], ["WindowParamsType"], 1))
            .with_pipeline(Pipeline::new("Main", vec![RenderPass::draw("Splat", "Splat", 6)]))
    }

    #[test]
    fn stages_are_ordered() {
        assert!(Stage::Loaded < Stage::TypeChecked);
        assert!(Stage::Validated < Stage::Emitted);
        assert_eq!(Stage::GraphBuilt.to_string(), "GraphBuilt");
    }

    #[test]
    fn successful_run_reaches_emitted() {
        let mut generator = Generator::new();
        let artifacts = generator.run(&minimal()).unwrap();
        assert_eq!(generator.stage(), Some(Stage::Emitted));
        assert_eq!(artifacts.layout("WindowParamsType").unwrap().total_size, 48);
        assert_eq!(artifacts.marshal_plan("WindowParamsType").unwrap().ops.len(), 9);
        let buffer = artifacts.setup.iter().find(|s| s.name == "WindowParams").unwrap();
        assert_eq!(buffer.byte_size, Some(48));
        assert!(artifacts.resize_plan(640, 480).is_empty());
    }

    #[test]
    fn unknown_buffer_struct_fails_at_layout_stage() {
        let spec = minimal().with_resource(ResourceDecl::buffer("Stray", "Missing"));
        let mut generator = Generator::new();
        let err = generator.run(&spec).unwrap_err();
        assert_eq!(err.stage, Stage::LayoutComputed);
        assert_eq!(
            err.error,
            SpecError::UnknownStruct {
                referrer: "Stray".to_string(),
                name: "Missing".to_string(),
            }
        );
        assert_eq!(generator.stage(), Some(Stage::TypeChecked));
    }

    #[test]
    fn shared_uniform_blocks_are_declared_once() {
        let spec = minimal()
            .with_struct(StructDef::new("Camera", [("View", "mat4".parse().unwrap())]))
            .with_resource(ResourceDecl::program("Blur", ["Vs", "Fs"], ["WindowParamsType"], 1))
            .with_resource(ResourceDecl::program(
                "Sky",
                ["Vs", "Fs"],
                ["Camera", "WindowParamsType"],
                1,
            ));
        let text = Generator::new().run(&spec).unwrap().glsl_declarations();

        assert_eq!(text.matches("uniform WindowParamsTypeBlock\n").count(), 1);
        assert!(text.contains("// Used by: Splat, Blur\n"));
        assert_eq!(text.matches("uniform WindowParamsTypeBlock1\n").count(), 1);
        assert!(text.contains("} WindowParamsTypeAt1;"));
        assert_eq!(text.matches("uniform CameraBlock\n").count(), 1);
    }

    #[test]
    fn oversized_structs_fail_at_layout_stage() {
        let data = "vec4[1152921504606846976]".parse().unwrap();
        let spec = Specification::default().with_struct(StructDef::new("Huge", [("Data", data)]));
        let err = Generator::new().run(&spec).unwrap_err();
        assert_eq!(err.stage, Stage::LayoutComputed);
        assert!(matches!(err.error, SpecError::LayoutOverflow { ref name, .. } if name == "Huge"));
    }

    #[test]
    fn glsl_declares_nested_structs_first() {
        let spec = Specification::default()
            .with_struct(StructDef::new("Scene", [("Sun", "Light".parse().unwrap())]))
            .with_struct(StructDef::new("Light", [("Color", "vec3".parse().unwrap())]));
        let artifacts = Generator::new().run(&spec).unwrap();
        let text = artifacts.glsl_declarations();
        let light = text.find("struct Light").unwrap();
        let scene = text.find("struct Scene").unwrap();
        assert!(light < scene);
    }
}
