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

//! Defines the hierarchy of error types raised while checking a specification.
//!
//! Every variant of [`SpecError`] is fatal: it describes a specification
//! authoring mistake and aborts the generation run. Non-fatal findings are
//! reported as [`Diagnostic`](crate::pipeline::Diagnostic)s instead.

use crate::generator::Stage;
use crate::resources::ResourceClass;
use thiserror::Error;

/// A fatal error found in a specification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    /// A struct reaches itself through its own fields.
    #[error("struct '{name}' is cyclic: {}", path.join(" -> "))]
    CyclicStruct {
        /// The struct whose resolution was re-entered.
        name: String,
        /// The resolution stack, from the outermost struct back to `name`.
        path: Vec<String>,
    },
    /// A struct name resolves to nothing.
    #[error("unknown struct '{name}' referenced by '{referrer}'")]
    UnknownStruct {
        /// The struct, buffer or program holding the reference.
        referrer: String,
        /// The undeclared struct name.
        name: String,
    },
    /// A struct does not fit in a uniform block.
    #[error("struct '{name}' exceeds the {limit}-byte block limit")]
    LayoutOverflow {
        /// The struct being laid out.
        name: String,
        /// The largest size accepted, in bytes.
        limit: usize,
    },
    /// A pipeline reaches itself through the pipelines it copies.
    #[error("pipeline '{pipeline}' copies itself: {}", path.join(" -> "))]
    CyclicCopy {
        /// The pipeline whose expansion was re-entered.
        pipeline: String,
        /// The copy chain, from the outermost pipeline back to `pipeline`.
        path: Vec<String>,
    },
    /// A resource name resolves to nothing.
    #[error("'{referrer}' references undeclared resource '{missing}'")]
    DanglingReference {
        /// The resource, pass or pipeline holding the reference.
        referrer: String,
        /// The undeclared name.
        missing: String,
    },
    /// A framebuffer's declared size policy disagrees with its attachments.
    #[error("size policy conflict on framebuffer '{framebuffer}': {detail}")]
    SizePolicyConflict {
        /// The offending framebuffer.
        framebuffer: String,
        /// Which attachment rule was violated.
        detail: String,
    },
    /// Two declarations of the same kind share a name.
    #[error("duplicate {kind} name '{name}'")]
    DuplicateName {
        /// What was declared twice (`struct`, `resource`, `pipeline`, ...).
        kind: &'static str,
        /// The repeated name.
        name: String,
    },
    /// A struct declares the same field twice.
    #[error("struct '{structure}' contains more than one field named '{field}'")]
    DuplicateField {
        /// The struct being declared.
        structure: String,
        /// The repeated field name.
        field: String,
    },
    /// A struct is named after a builtin GLSL type.
    #[error("struct cannot be named after builtin type '{name}'")]
    ReservedName {
        /// The reserved name.
        name: String,
    },
    /// A name is not a valid GLSL identifier.
    #[error("'{name}' is not a valid identifier")]
    InvalidIdentifier {
        /// The rejected name.
        name: String,
    },
    /// A struct has no fields.
    #[error("struct '{name}' has no fields")]
    EmptyStruct {
        /// The empty struct.
        name: String,
    },
    /// A reference names a resource of the wrong kind.
    #[error("'{referrer}' expects '{name}' to be a {expected}, but it is a {found}")]
    WrongResourceKind {
        /// The resource or pass holding the reference.
        referrer: String,
        /// The referenced resource.
        name: String,
        /// The kind the reference requires.
        expected: ResourceClass,
        /// The kind actually declared.
        found: ResourceClass,
    },
    /// A framebuffer attachment slot holds a texture of the wrong format class.
    #[error("framebuffer '{framebuffer}' cannot attach '{attachment}': {detail}")]
    AttachmentFormat {
        /// The offending framebuffer.
        framebuffer: String,
        /// The attached texture.
        attachment: String,
        /// Why the attachment is rejected.
        detail: String,
    },
    /// A resource declaration is internally inconsistent.
    #[error("invalid resource '{name}': {reason}")]
    InvalidResource {
        /// The offending resource.
        name: String,
        /// The rule that was violated.
        reason: String,
    },
    /// A render pass is internally inconsistent.
    #[error("invalid pass '{pass}' in pipeline '{pipeline}': {reason}")]
    InvalidPass {
        /// The pipeline containing the pass.
        pipeline: String,
        /// The offending pass.
        pass: String,
        /// The rule that was violated.
        reason: String,
    },
}

/// A fatal error annotated with the generation stage that detected it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("generation failed while entering stage {stage}")]
pub struct GenerationError {
    /// The stage the run was trying to reach.
    pub stage: Stage,
    /// The underlying specification error.
    #[source]
    pub error: SpecError,
}

impl GenerationError {
    /// Wraps a [`SpecError`] with the stage that detected it.
    pub fn new(stage: Stage, error: SpecError) -> Self {
        Self { stage, error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn cyclic_struct_display_lists_path() {
        let err = SpecError::CyclicStruct {
            name: "A".to_string(),
            path: vec!["A".to_string(), "B".to_string(), "A".to_string()],
        };
        assert_eq!(format!("{err}"), "struct 'A' is cyclic: A -> B -> A");
    }

    #[test]
    fn dangling_reference_names_both_sides() {
        let err = SpecError::DanglingReference {
            referrer: "GBuffer".to_string(),
            missing: "Albedo".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "'GBuffer' references undeclared resource 'Albedo'"
        );
    }

    #[test]
    fn generation_error_exposes_source() {
        let err = GenerationError::new(
            Stage::LayoutComputed,
            SpecError::UnknownStruct {
                referrer: "Params".to_string(),
                name: "Missing".to_string(),
            },
        );
        assert_eq!(
            format!("{err}"),
            "generation failed while entering stage LayoutComputed"
        );
        let source = err.source().expect("source should be the spec error");
        assert_eq!(
            source.to_string(),
            "unknown struct 'Missing' referenced by 'Params'"
        );
    }
}
