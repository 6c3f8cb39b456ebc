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

//! The struct table: declared struct types indexed by name.

use super::GlslType;
use crate::error::SpecError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Returns `true` if `name` is a valid GLSL identifier.
///
/// Names starting with `gl_` are reserved by GLSL and rejected.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    starts_well
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with("gl_")
}

/// A single named field of a struct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDef {
    /// The field name.
    pub name: String,
    /// The field type.
    #[serde(rename = "type")]
    pub ty: GlslType,
}

impl FieldDef {
    /// Creates a field.
    pub fn new(name: impl Into<String>, ty: GlslType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A declared struct type. Field order is significant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructDef {
    /// The struct name.
    pub name: String,
    /// The fields, in declaration order.
    pub fields: Vec<FieldDef>,
}

impl StructDef {
    /// Creates a struct from `(name, type)` pairs.
    pub fn new<N: Into<String>>(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = (N, GlslType)>,
    ) -> Self {
        Self {
            name: name.into(),
            fields: fields
                .into_iter()
                .map(|(name, ty)| FieldDef::new(name, ty))
                .collect(),
        }
    }
}

/// The struct table, kept in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructTable {
    structs: Vec<StructDef>,
    index: HashMap<String, usize>,
}

impl StructTable {
    /// Indexes the given structs, rejecting duplicate names.
    pub fn new(structs: impl IntoIterator<Item = StructDef>) -> Result<Self, SpecError> {
        let mut table = Self::default();
        for def in structs {
            if table.index.contains_key(&def.name) {
                return Err(SpecError::DuplicateName {
                    kind: "struct",
                    name: def.name,
                });
            }
            table.index.insert(def.name.clone(), table.structs.len());
            table.structs.push(def);
        }
        Ok(table)
    }

    /// Looks up a struct by name.
    pub fn get(&self, name: &str) -> Option<&StructDef> {
        self.index.get(name).map(|&i| &self.structs[i])
    }

    /// Returns `true` if a struct with this name is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterates the structs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &StructDef> {
        self.structs.iter()
    }

    /// The number of declared structs.
    pub fn len(&self) -> usize {
        self.structs.len()
    }

    /// Returns `true` if no struct is declared.
    pub fn is_empty(&self) -> bool {
        self.structs.is_empty()
    }

    /// Checks every struct for local well-formedness.
    ///
    /// Unknown references and transitive cycles are left to the layout engine,
    /// which sees the whole resolution path.
    pub fn check(&self) -> Result<(), SpecError> {
        for def in &self.structs {
            if !is_identifier(&def.name) {
                return Err(SpecError::InvalidIdentifier {
                    name: def.name.clone(),
                });
            }
            if GlslType::is_builtin_name(&def.name) {
                return Err(SpecError::ReservedName {
                    name: def.name.clone(),
                });
            }
            if def.fields.is_empty() {
                return Err(SpecError::EmptyStruct {
                    name: def.name.clone(),
                });
            }

            let mut seen = HashSet::new();
            for field in &def.fields {
                if !is_identifier(&field.name) {
                    return Err(SpecError::InvalidIdentifier {
                        name: format!("{}.{}", def.name, field.name),
                    });
                }
                if !seen.insert(field.name.as_str()) {
                    return Err(SpecError::DuplicateField {
                        structure: def.name.clone(),
                        field: field.name.clone(),
                    });
                }
                if field.ty.referenced_struct() == Some(def.name.as_str()) {
                    return Err(SpecError::CyclicStruct {
                        name: def.name.clone(),
                        path: vec![def.name.clone(), def.name.clone()],
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScalarKind;

    fn float() -> GlslType {
        GlslType::Scalar(ScalarKind::Float)
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("WindowParamsType"));
        assert!(is_identifier("_tmp1"));
        assert!(!is_identifier("1st"));
        assert!(!is_identifier("has space"));
        assert!(!is_identifier("gl_Position"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn duplicate_struct_names_are_rejected() {
        let result = StructTable::new([
            StructDef::new("A", [("x", float())]),
            StructDef::new("A", [("y", float())]),
        ]);
        assert_eq!(
            result,
            Err(SpecError::DuplicateName {
                kind: "struct",
                name: "A".to_string()
            })
        );
    }

    #[test]
    fn check_rejects_local_mistakes() {
        let reserved = StructTable::new([StructDef::new("vec4", [("x", float())])]).unwrap();
        assert!(matches!(reserved.check(), Err(SpecError::ReservedName { .. })));

        let empty = StructTable::new([StructDef::new::<&str>("Empty", [])]).unwrap();
        assert!(matches!(empty.check(), Err(SpecError::EmptyStruct { .. })));

        let dup = StructTable::new([StructDef::new("P", [("x", float()), ("x", float())])])
            .unwrap();
        assert_eq!(
            dup.check(),
            Err(SpecError::DuplicateField {
                structure: "P".to_string(),
                field: "x".to_string()
            })
        );
    }

    #[test]
    fn direct_self_reference_is_a_cycle() {
        let table = StructTable::new([StructDef::new(
            "Node",
            [("children", GlslType::array(GlslType::structure("Node"), 2).unwrap())],
        )])
        .unwrap();
        assert!(matches!(
            table.check(),
            Err(SpecError::CyclicStruct { ref name, .. }) if name == "Node"
        ));
    }

    #[test]
    fn preserves_declaration_order() {
        let table = StructTable::new([
            StructDef::new("B", [("x", float())]),
            StructDef::new("A", [("y", float())]),
        ])
        .unwrap();
        let names: Vec<_> = table.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["B", "A"]);
        assert!(table.check().is_ok());
    }
}
