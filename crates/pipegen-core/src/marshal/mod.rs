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

//! Turns struct layouts into ordered scalar write plans.
//!
//! A [`MarshalPlan`] lists one [`WriteOp`] per scalar component of a host value,
//! in field order. Replaying it against a zeroed buffer of the struct's total
//! size writes every non-padding byte exactly once.

mod path;

pub use path::{HostPath, PathSegment};

use crate::error::SpecError;
use crate::layout::std140::{self, matrix_column_stride, SCALAR_SIZE};
use crate::layout::{LayoutEngine, StructLayout};
use crate::types::{GlslType, ScalarKind};
use serde::Serialize;
use thiserror::Error;

/// How a host scalar is converted before it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Coercion {
    /// The bits are written as they are.
    Identity,
    /// `false`/`true` are written as the 32-bit integers `0`/`1`.
    BoolToInt32,
}

impl Coercion {
    fn for_kind(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::Bool => Coercion::BoolToInt32,
            _ => Coercion::Identity,
        }
    }
}

/// A single scalar write into the destination buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WriteOp {
    /// Where the value is read from in the host struct.
    pub host_path: HostPath,
    /// Byte offset of the write in the destination buffer.
    pub dest_offset: usize,
    /// Width of the write in bytes.
    pub scalar_width: usize,
    /// The scalar kind declared for this component.
    pub scalar: ScalarKind,
    /// Conversion applied before writing.
    pub coercion: Coercion,
}

/// The ordered writes that upload one struct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MarshalPlan {
    /// The struct this plan uploads.
    pub struct_name: String,
    /// Size of the destination buffer in bytes.
    pub total_size: usize,
    /// The writes, in host field order.
    pub ops: Vec<WriteOp>,
}

/// A host value for one [`WriteOp`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostScalar {
    /// A host boolean.
    Bool(bool),
    /// A signed integer.
    Int(i32),
    /// An unsigned integer.
    UInt(u32),
    /// A float.
    Float(f32),
}

impl HostScalar {
    /// The kind of this value.
    pub fn kind(&self) -> ScalarKind {
        match self {
            HostScalar::Bool(_) => ScalarKind::Bool,
            HostScalar::Int(_) => ScalarKind::Int,
            HostScalar::UInt(_) => ScalarKind::UInt,
            HostScalar::Float(_) => ScalarKind::Float,
        }
    }
}

/// An error raised while replaying a [`MarshalPlan`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarshalError {
    /// The destination cannot hold the struct.
    #[error("destination holds {actual} bytes but '{struct_name}' needs {needed}")]
    DestinationTooSmall {
        /// The struct being uploaded.
        struct_name: String,
        /// The struct's total size.
        needed: usize,
        /// The destination length.
        actual: usize,
    },
    /// No value was supplied for a write.
    #[error("no value supplied for '{path}'")]
    MissingValue {
        /// The host path of the write.
        path: String,
    },
    /// The supplied value has the wrong kind.
    #[error("'{path}' expects a {expected:?} value, got {found:?}")]
    KindMismatch {
        /// The host path of the write.
        path: String,
        /// The declared kind.
        expected: ScalarKind,
        /// The supplied kind.
        found: ScalarKind,
    },
}

impl MarshalPlan {
    /// Performs the writes into `dest`, asking `value_of` for each value.
    pub fn replay<F>(&self, dest: &mut [u8], mut value_of: F) -> Result<(), MarshalError>
    where
        F: FnMut(&WriteOp) -> Option<HostScalar>,
    {
        if dest.len() < self.total_size {
            return Err(MarshalError::DestinationTooSmall {
                struct_name: self.struct_name.clone(),
                needed: self.total_size,
                actual: dest.len(),
            });
        }

        for op in &self.ops {
            let value = value_of(op).ok_or_else(|| MarshalError::MissingValue {
                path: op.host_path.to_string(),
            })?;
            if value.kind() != op.scalar {
                return Err(MarshalError::KindMismatch {
                    path: op.host_path.to_string(),
                    expected: op.scalar,
                    found: value.kind(),
                });
            }

            let target = &mut dest[op.dest_offset..op.dest_offset + op.scalar_width];
            match value {
                HostScalar::Bool(b) => {
                    debug_assert_eq!(op.coercion, Coercion::BoolToInt32);
                    target.copy_from_slice(bytemuck::bytes_of(&i32::from(b)))
                }
                HostScalar::Int(v) => target.copy_from_slice(bytemuck::bytes_of(&v)),
                HostScalar::UInt(v) => target.copy_from_slice(bytemuck::bytes_of(&v)),
                HostScalar::Float(v) => target.copy_from_slice(bytemuck::bytes_of(&v)),
            }
        }
        Ok(())
    }
}

/// Builds [`MarshalPlan`]s from the layouts held by a [`LayoutEngine`].
#[derive(Debug, Clone, Copy)]
pub struct MarshalGenerator<'a> {
    layouts: &'a LayoutEngine,
}

impl<'a> MarshalGenerator<'a> {
    /// Creates a generator over an engine whose layouts are already computed.
    pub fn new(layouts: &'a LayoutEngine) -> Self {
        Self { layouts }
    }

    /// Builds the write plan of `layout`.
    ///
    /// Fails with [`SpecError::UnknownStruct`] if a nested struct has no
    /// computed layout.
    pub fn plan_for(&self, layout: &StructLayout) -> Result<MarshalPlan, SpecError> {
        let mut ops = Vec::new();
        self.emit_struct(layout, 0, &HostPath::root(), &mut ops)?;
        log::debug!(
            "Planned {} writes for struct '{}'.",
            ops.len(),
            layout.name
        );
        Ok(MarshalPlan {
            struct_name: layout.name.clone(),
            total_size: layout.total_size,
            ops,
        })
    }

    fn nested(&self, referrer: &str, name: &str) -> Result<&'a StructLayout, SpecError> {
        self.layouts
            .get(name)
            .ok_or_else(|| SpecError::UnknownStruct {
                referrer: referrer.to_string(),
                name: name.to_string(),
            })
    }

    fn emit_struct(
        &self,
        layout: &StructLayout,
        base: usize,
        path: &HostPath,
        ops: &mut Vec<WriteOp>,
    ) -> Result<(), SpecError> {
        for field in &layout.fields {
            self.emit_type(
                &layout.name,
                &field.ty,
                base + field.offset,
                &path.field(&field.name),
                ops,
            )?;
        }
        Ok(())
    }

    fn emit_type(
        &self,
        owner: &str,
        ty: &GlslType,
        base: usize,
        path: &HostPath,
        ops: &mut Vec<WriteOp>,
    ) -> Result<(), SpecError> {
        match ty {
            GlslType::Scalar(kind) => ops.push(scalar_op(path.clone(), base, *kind)),
            GlslType::Vector { component, arity } => {
                for c in 0..arity.get() {
                    ops.push(scalar_op(
                        path.component(c),
                        base + c * SCALAR_SIZE,
                        *component,
                    ));
                }
            }
            GlslType::Matrix { columns, rows } => {
                let stride = matrix_column_stride(*rows);
                for column in 0..columns.get() {
                    let column_path = path.index(column);
                    for row in 0..rows.get() {
                        ops.push(scalar_op(
                            column_path.component(row),
                            base + column * stride + row * SCALAR_SIZE,
                            ScalarKind::Float,
                        ));
                    }
                }
            }
            GlslType::Array { element, length } => {
                let placed = std140::type_layout(owner, ty, &mut |name| {
                    self.nested(owner, name).map(|l| (l.total_size, l.alignment))
                })?;
                let stride = placed.stride.unwrap_or(placed.size / length.get());
                for i in 0..length.get() {
                    self.emit_type(owner, element, base + i * stride, &path.index(i), ops)?;
                }
            }
            GlslType::Struct(name) => {
                let nested = self.nested(owner, name)?;
                self.emit_struct(nested, base, path, ops)?;
            }
        }
        Ok(())
    }
}

fn scalar_op(host_path: HostPath, dest_offset: usize, scalar: ScalarKind) -> WriteOp {
    WriteOp {
        host_path,
        dest_offset,
        scalar_width: SCALAR_SIZE,
        scalar,
        coercion: Coercion::for_kind(scalar),
    }
}
