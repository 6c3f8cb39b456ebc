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

//! Computes std140 memory layouts for declared structs.
//!
//! The [`LayoutEngine`] resolves structs lazily and memoises every result.
//! Nested struct references are resolved depth first while a resolution stack
//! tracks the structs currently being laid out; re-entering one of them is a
//! cycle and is reported with the full path instead of recursing forever.

pub mod std140;

use crate::error::SpecError;
use crate::types::{GlslType, StructTable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std140::{checked_block_size, round_up, type_layout, VEC4_ALIGNMENT};

/// The placement of one field inside a [`StructLayout`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldLayout {
    /// The field name.
    pub name: String,
    /// The field type.
    #[serde(rename = "type")]
    pub ty: GlslType,
    /// Byte offset from the start of the struct.
    pub offset: usize,
    /// Bytes occupied, excluding trailing padding.
    pub size: usize,
    /// Base alignment in bytes.
    pub alignment: usize,
    /// Array element or matrix column stride.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stride: Option<usize>,
}

/// The std140 layout of a struct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructLayout {
    /// The struct name.
    pub name: String,
    /// Field placements, in declaration order.
    pub fields: Vec<FieldLayout>,
    /// Size in bytes, rounded up to `alignment`.
    pub total_size: usize,
    /// Alignment of the struct, at least 16.
    pub alignment: usize,
}

impl StructLayout {
    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|f| f.name == name)
    }
}

const LAYOUT_REQUEST: &str = "layout request";

/// Lays out the structs of a [`StructTable`], memoising each result.
#[derive(Debug)]
pub struct LayoutEngine {
    table: StructTable,
    layouts: HashMap<String, StructLayout>,
}

impl LayoutEngine {
    /// Creates an engine over a checked struct table.
    pub fn new(table: StructTable) -> Self {
        Self {
            table,
            layouts: HashMap::new(),
        }
    }

    /// The struct table being laid out.
    pub fn table(&self) -> &StructTable {
        &self.table
    }

    /// Returns the layout of `name`, computing it and its dependencies if needed.
    pub fn layout_of(&mut self, name: &str) -> Result<&StructLayout, SpecError> {
        self.layout_for(LAYOUT_REQUEST, name)
    }

    /// Like [`layout_of`](Self::layout_of), naming `referrer` if `name` is unknown.
    pub fn layout_for(&mut self, referrer: &str, name: &str) -> Result<&StructLayout, SpecError> {
        let mut stack = Vec::new();
        resolve(&self.table, &mut self.layouts, &mut stack, referrer, name)?;
        self.layouts
            .get(name)
            .ok_or_else(|| SpecError::UnknownStruct {
                referrer: referrer.to_string(),
                name: name.to_string(),
            })
    }

    /// Lays out every declared struct, in declaration order.
    pub fn compute_all(&mut self) -> Result<(), SpecError> {
        let names: Vec<String> = self.table.iter().map(|s| s.name.clone()).collect();
        for name in names {
            self.layout_of(&name)?;
        }
        Ok(())
    }

    /// Returns an already computed layout without resolving anything.
    pub fn get(&self, name: &str) -> Option<&StructLayout> {
        self.layouts.get(name)
    }

    /// Iterates the computed layouts in struct declaration order.
    pub fn layouts(&self) -> impl Iterator<Item = &StructLayout> {
        self.table.iter().filter_map(|s| self.layouts.get(&s.name))
    }

    /// Consumes the engine, returning the computed layouts in declaration order.
    pub fn into_layouts(mut self) -> Vec<StructLayout> {
        self.table
            .iter()
            .filter_map(|s| self.layouts.remove(&s.name))
            .collect()
    }
}

fn resolve(
    table: &StructTable,
    layouts: &mut HashMap<String, StructLayout>,
    stack: &mut Vec<String>,
    referrer: &str,
    name: &str,
) -> Result<(usize, usize), SpecError> {
    if let Some(done) = layouts.get(name) {
        return Ok((done.total_size, done.alignment));
    }
    if stack.iter().any(|s| s == name) {
        let mut path = stack.clone();
        path.push(name.to_string());
        return Err(SpecError::CyclicStruct {
            name: name.to_string(),
            path,
        });
    }
    let def = table.get(name).ok_or_else(|| SpecError::UnknownStruct {
        referrer: referrer.to_string(),
        name: name.to_string(),
    })?;

    stack.push(name.to_string());
    let mut fields = Vec::with_capacity(def.fields.len());
    let mut cursor = 0;
    let mut alignment = VEC4_ALIGNMENT;
    for field in &def.fields {
        let placed = type_layout(name, &field.ty, &mut |nested| {
            resolve(table, layouts, stack, name, nested)
        })?;
        let offset = round_up(cursor, placed.alignment);
        cursor = checked_block_size(name, offset.checked_add(placed.size))?;
        alignment = alignment.max(placed.alignment);
        fields.push(FieldLayout {
            name: field.name.clone(),
            ty: field.ty.clone(),
            offset,
            size: placed.size,
            alignment: placed.alignment,
            stride: placed.stride,
        });
    }
    stack.pop();

    let layout = StructLayout {
        name: name.to_string(),
        fields,
        total_size: round_up(cursor, alignment),
        alignment,
    };
    log::debug!(
        "Laid out struct '{}': {} bytes, alignment {}.",
        layout.name,
        layout.total_size,
        layout.alignment
    );
    let result = (layout.total_size, layout.alignment);
    layouts.insert(name.to_string(), layout);
    Ok(result)
}
