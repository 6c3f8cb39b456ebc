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

//! # Pipegen Core
//!
//! The data model and algorithms behind the pipegen code generator.
//!
//! A [`Specification`] declares std140 struct types, GPU resources and the
//! ordered render passes of each pipeline. The [`Generator`] turns it into
//! artifacts an emission layer renders as backend source:
//!
//! - **[`types`]**: GLSL value types and the struct table.
//! - **[`layout`]**: std140 offsets, sizes and alignments for every struct.
//! - **[`marshal`]**: ordered scalar write plans that upload a host value.
//! - **[`resources`]**: the resource graph and window resize plans.
//! - **[`pipeline`]**: pass validation and per-pipeline emission plans.
//! - **[`generator`]**: the staged generation run tying it all together.

#![warn(missing_docs)]

pub mod error;
pub mod generator;
pub mod graph;
pub mod layout;
pub mod marshal;
pub mod pipeline;
pub mod resources;
pub mod spec;
pub mod types;

pub use error::{GenerationError, SpecError};
pub use generator::{GeneratedArtifacts, Generator, Stage};
pub use layout::{FieldLayout, LayoutEngine, StructLayout};
pub use marshal::{MarshalGenerator, MarshalPlan, WriteOp};
pub use pipeline::{Pipeline, PipelineId, RenderPass, ValidationResult};
pub use resources::{ResizePlan, ResourceDecl, ResourceGraph, SizePolicy};
pub use spec::Specification;
pub use types::{GlslType, ScalarKind, StructDef, StructTable};
