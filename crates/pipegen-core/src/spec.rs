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

//! The parsed input document.

use crate::pipeline::Pipeline;
use crate::resources::ResourceDecl;
use crate::types::StructDef;
use serde::{Deserialize, Serialize};

/// Everything a generation run consumes: structs, resources and pipelines.
///
/// Any serde format works; the command line front-end reads RON and JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    /// Struct types, in declaration order.
    #[serde(default)]
    pub structs: Vec<StructDef>,
    /// GPU resources, in declaration order.
    #[serde(default)]
    pub resources: Vec<ResourceDecl>,
    /// Pipelines; the index of each is its [`PipelineId`](crate::PipelineId).
    #[serde(default)]
    pub pipelines: Vec<Pipeline>,
}

impl Specification {
    /// Adds a struct.
    pub fn with_struct(mut self, def: StructDef) -> Self {
        self.structs.push(def);
        self
    }

    /// Adds a resource.
    pub fn with_resource(mut self, decl: ResourceDecl) -> Self {
        self.resources.push(decl);
        self
    }

    /// Adds a pipeline.
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipelines.push(pipeline);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{PassKind, PassOutput};
    use crate::resources::ResourceKind;

    const DOCUMENT: &str = r#"(
        structs: [
            (name: "WindowParamsType", fields: [
                (name: "WindowSize", type: "vec4"),
                (name: "WindowScale", type: "vec4"),
                (name: "ElapsedTime", type: "float"),
            ]),
        ],
        resources: [
            (name: "WindowParams", kind: Buffer(struct_name: "WindowParamsType")),
            (name: "SplatVs", kind: ShaderStage(stage: Vertex, source: Path("shaders/splat.vs.glsl"))),
        ],
        pipelines: [
            (name: "Main", passes: [
                (name: "Splat", program: "Splat", kind: Draw(vertices: 6), updates: ["WindowParams"]),
            ]),
        ],
    )"#;

    #[test]
    fn reads_ron_documents() {
        let spec: Specification = ron::from_str(DOCUMENT).unwrap();
        assert_eq!(spec.structs[0].fields.len(), 3);
        assert_eq!(spec.structs[0].fields[2].ty.to_string(), "float");
        assert!(matches!(spec.resources[0].kind, ResourceKind::Buffer { .. }));

        let pass = &spec.pipelines[0].passes[0];
        assert_eq!(pass.kind, PassKind::Draw { vertices: 6 });
        assert_eq!(pass.output, PassOutput::Window);
        assert!(spec.pipelines[0].next.is_none());
    }

    #[test]
    fn reads_json_documents() {
        let json = r#"{
            "structs": [{"name": "P", "fields": [{"name": "x", "type": "mat3"}]}],
            "resources": [{"name": "B", "kind": {"Buffer": {"struct_name": "P"}}}]
        }"#;
        let spec: Specification = serde_json::from_str(json).unwrap();
        assert_eq!(spec.structs[0].fields[0].ty.to_string(), "mat3");
        assert!(spec.pipelines.is_empty());
    }
}
