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

//! The std140 packing rules for individual types.

use crate::error::SpecError;
use crate::types::{Arity, GlslType};

/// Every scalar component is four bytes on the device, booleans included.
pub const SCALAR_SIZE: usize = 4;

/// The alignment arrays and structs are rounded up to.
pub const VEC4_ALIGNMENT: usize = 16;

/// The largest block a layout may describe, matching the D3D12 constant
/// buffer limit.
pub const MAX_BLOCK_SIZE: usize = 64 * 1024;

/// Rounds `value` up to the next multiple of `alignment`.
#[inline]
pub fn round_up(value: usize, alignment: usize) -> usize {
    debug_assert!(alignment > 0);
    value.div_ceil(alignment) * alignment
}

/// Size, alignment and element stride of a single type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeLayout {
    /// Bytes occupied, excluding trailing padding.
    pub size: usize,
    /// Base alignment in bytes.
    pub alignment: usize,
    /// Array element or matrix column stride, if the type has one.
    pub stride: Option<usize>,
}

/// The base alignment of a vector with `arity` components.
pub fn vector_alignment(arity: Arity) -> usize {
    match arity.get() {
        2 => 2 * SCALAR_SIZE,
        _ => VEC4_ALIGNMENT,
    }
}

/// The column stride of a matrix with `rows` rows.
///
/// Columns are laid out like the elements of an array of `vecR`.
pub fn matrix_column_stride(rows: Arity) -> usize {
    round_up(
        round_up(SCALAR_SIZE * rows.get(), vector_alignment(rows)),
        VEC4_ALIGNMENT,
    )
}

/// Computes the std140 layout of `ty`, a field type of struct `owner`.
///
/// `struct_layout` yields `(total_size, alignment)` for a referenced struct,
/// resolving it on demand. Sizes above [`MAX_BLOCK_SIZE`] are rejected with
/// [`SpecError::LayoutOverflow`].
pub fn type_layout<F>(
    owner: &str,
    ty: &GlslType,
    struct_layout: &mut F,
) -> Result<TypeLayout, SpecError>
where
    F: FnMut(&str) -> Result<(usize, usize), SpecError>,
{
    let layout = match ty {
        GlslType::Scalar(_) => TypeLayout {
            size: SCALAR_SIZE,
            alignment: SCALAR_SIZE,
            stride: None,
        },
        GlslType::Vector { arity, .. } => TypeLayout {
            size: SCALAR_SIZE * arity.get(),
            alignment: vector_alignment(*arity),
            stride: None,
        },
        GlslType::Matrix { columns, rows } => {
            let stride = matrix_column_stride(*rows);
            TypeLayout {
                size: columns.get() * stride,
                alignment: VEC4_ALIGNMENT,
                stride: Some(stride),
            }
        }
        GlslType::Array { element, length } => {
            let element = type_layout(owner, element, struct_layout)?;
            let stride = round_up(round_up(element.size, element.alignment), VEC4_ALIGNMENT);
            TypeLayout {
                size: checked_block_size(owner, length.get().checked_mul(stride))?,
                alignment: VEC4_ALIGNMENT,
                stride: Some(stride),
            }
        }
        GlslType::Struct(name) => {
            let (total_size, alignment) = struct_layout(name)?;
            TypeLayout {
                size: total_size,
                alignment: round_up(alignment, VEC4_ALIGNMENT),
                stride: None,
            }
        }
    };
    Ok(layout)
}

/// Accepts `size` if it was computed without overflow and fits in a block.
pub fn checked_block_size(owner: &str, size: Option<usize>) -> Result<usize, SpecError> {
    size.filter(|&s| s <= MAX_BLOCK_SIZE)
        .ok_or_else(|| SpecError::LayoutOverflow {
            name: owner.to_string(),
            limit: MAX_BLOCK_SIZE,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(text: &str) -> TypeLayout {
        let ty: GlslType = text.parse().unwrap();
        type_layout("S", &ty, &mut |_| Ok((32, 16))).unwrap()
    }

    #[test]
    fn round_up_to_alignment() {
        assert_eq!(round_up(0, 16), 0);
        assert_eq!(round_up(4, 16), 16);
        assert_eq!(round_up(16, 16), 16);
        assert_eq!(round_up(13, 4), 16);
    }

    #[test]
    fn scalars_and_vectors() {
        assert_eq!((layout("bool").size, layout("bool").alignment), (4, 4));
        assert_eq!((layout("vec2").size, layout("vec2").alignment), (8, 8));
        assert_eq!((layout("ivec3").size, layout("ivec3").alignment), (12, 16));
        assert_eq!((layout("uvec4").size, layout("uvec4").alignment), (16, 16));
    }

    #[test]
    fn matrices_are_padded_columns() {
        assert_eq!(layout("mat3").size, 48);
        assert_eq!(layout("mat3").stride, Some(16));
        assert_eq!(layout("mat4").size, 64);
        assert_eq!(layout("mat2").size, 32);
        assert_eq!(layout("mat2").stride, Some(16));
        assert_eq!(layout("mat2").alignment, 16);
        assert_eq!(layout("mat4x2").size, 64);
        assert_eq!(layout("mat3x2").size, 48);
        assert_eq!(layout("mat2x4").size, 32);
    }

    #[test]
    fn oversized_arrays_are_rejected() {
        let huge: GlslType = "vec4[1152921504606846976]".parse().unwrap();
        let err = type_layout("Big", &huge, &mut |_| Ok((16, 16))).unwrap_err();
        assert_eq!(
            err,
            SpecError::LayoutOverflow {
                name: "Big".to_string(),
                limit: MAX_BLOCK_SIZE,
            }
        );

        let large: GlslType = "vec4[1000000000]".parse().unwrap();
        assert!(type_layout("Big", &large, &mut |_| Ok((16, 16))).is_err());

        let fits: GlslType = "vec4[4096]".parse().unwrap();
        let layout = type_layout("Big", &fits, &mut |_| Ok((16, 16))).unwrap();
        assert_eq!(layout.size, MAX_BLOCK_SIZE);
    }

    #[test]
    fn array_elements_round_to_sixteen() {
        let floats = layout("float[4]");
        assert_eq!((floats.size, floats.alignment, floats.stride), (64, 16, Some(16)));
        let mats = layout("mat3[2]");
        assert_eq!((mats.size, mats.stride), (96, Some(48)));
        let nested = layout("vec2[2][3]");
        assert_eq!((nested.size, nested.stride), (96, Some(48)));
    }

    #[test]
    fn struct_references_use_the_nested_layout() {
        let s = layout("Light");
        assert_eq!((s.size, s.alignment, s.stride), (32, 16, None));
        assert_eq!(layout("Light[3]").size, 96);
    }
}
