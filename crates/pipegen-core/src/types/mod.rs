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

//! The closed set of GLSL value types a specification may use.
//!
//! Types are validated when constructed: a [`GlslType`] can only hold a legal
//! vector arity, matrix shape, or non-empty array length. Struct references are
//! names resolved later against a [`StructTable`].

pub mod glsl;
mod table;

pub use table::{is_identifier, FieldDef, StructDef, StructTable};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;
use thiserror::Error;

/// An error raised when building or parsing a [`GlslType`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// A vector arity or matrix dimension outside `2..=4`.
    #[error("vector and matrix dimensions must be 2, 3 or 4, got {0}")]
    InvalidArity(usize),
    /// An array declared with zero elements.
    #[error("array length must be greater than zero")]
    ZeroLengthArray,
    /// Text that does not spell a GLSL type.
    #[error("'{0}' is not a valid GLSL type")]
    Unparseable(String),
}

/// The component kind of a scalar, vector or matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScalarKind {
    /// A boolean, stored on the device as a 32-bit integer.
    Bool,
    /// A signed 32-bit integer.
    Int,
    /// An unsigned 32-bit integer.
    UInt,
    /// A 32-bit float.
    Float,
}

impl ScalarKind {
    /// The GLSL spelling of the scalar type.
    pub fn glsl_name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Int => "int",
            ScalarKind::UInt => "uint",
            ScalarKind::Float => "float",
        }
    }

    /// The prefix GLSL uses for vectors of this kind (`vec`, `ivec`, ...).
    pub fn vector_prefix(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bvec",
            ScalarKind::Int => "ivec",
            ScalarKind::UInt => "uvec",
            ScalarKind::Float => "vec",
        }
    }
}

/// A vector arity or matrix dimension, always 2, 3 or 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Arity(u8);

impl Arity {
    /// Two components.
    pub const TWO: Arity = Arity(2);
    /// Three components.
    pub const THREE: Arity = Arity(3);
    /// Four components.
    pub const FOUR: Arity = Arity(4);

    /// Validates a component count.
    pub fn new(count: usize) -> Result<Self, TypeError> {
        match count {
            2..=4 => Ok(Arity(count as u8)),
            _ => Err(TypeError::InvalidArity(count)),
        }
    }

    /// The component count.
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

/// A GLSL value type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GlslType {
    /// A single scalar.
    Scalar(ScalarKind),
    /// A vector of `arity` scalars.
    Vector {
        /// The component kind.
        component: ScalarKind,
        /// The number of components.
        arity: Arity,
    },
    /// A column-major float matrix.
    Matrix {
        /// The number of columns.
        columns: Arity,
        /// The number of rows, i.e. the size of each column vector.
        rows: Arity,
    },
    /// A fixed-length array.
    Array {
        /// The element type.
        element: Box<GlslType>,
        /// The number of elements.
        length: NonZeroUsize,
    },
    /// A reference to a declared struct.
    Struct(String),
}

impl GlslType {
    /// Builds a scalar type.
    pub fn scalar(kind: ScalarKind) -> Self {
        GlslType::Scalar(kind)
    }

    /// Builds a vector type, rejecting arities outside `2..=4`.
    pub fn vector(component: ScalarKind, arity: usize) -> Result<Self, TypeError> {
        Ok(GlslType::Vector {
            component,
            arity: Arity::new(arity)?,
        })
    }

    /// Builds a `columns` x `rows` float matrix.
    pub fn matrix(columns: usize, rows: usize) -> Result<Self, TypeError> {
        Ok(GlslType::Matrix {
            columns: Arity::new(columns)?,
            rows: Arity::new(rows)?,
        })
    }

    /// Builds an array type, rejecting zero lengths.
    pub fn array(element: GlslType, length: usize) -> Result<Self, TypeError> {
        let length = NonZeroUsize::new(length).ok_or(TypeError::ZeroLengthArray)?;
        Ok(GlslType::Array {
            element: Box::new(element),
            length,
        })
    }

    /// Builds a reference to a struct by name.
    pub fn structure(name: impl Into<String>) -> Self {
        GlslType::Struct(name.into())
    }

    /// The struct this type ultimately refers to, looking through arrays.
    pub fn referenced_struct(&self) -> Option<&str> {
        match self {
            GlslType::Struct(name) => Some(name),
            GlslType::Array { element, .. } => element.referenced_struct(),
            _ => None,
        }
    }

    /// Returns `true` if `name` spells a builtin scalar, vector or matrix type.
    pub fn is_builtin_name(name: &str) -> bool {
        matches!(
            parse_base(name),
            Some(GlslType::Scalar(_) | GlslType::Vector { .. } | GlslType::Matrix { .. })
        )
    }
}

fn parse_base(text: &str) -> Option<GlslType> {
    let scalar = match text {
        "bool" => Some(ScalarKind::Bool),
        "int" => Some(ScalarKind::Int),
        "uint" => Some(ScalarKind::UInt),
        "float" => Some(ScalarKind::Float),
        _ => None,
    };
    if let Some(kind) = scalar {
        return Some(GlslType::Scalar(kind));
    }

    for kind in [
        ScalarKind::Bool,
        ScalarKind::Int,
        ScalarKind::UInt,
        ScalarKind::Float,
    ] {
        if let Some(digits) = text.strip_prefix(kind.vector_prefix()) {
            if let Some(arity) = single_dimension(digits) {
                return Some(GlslType::Vector {
                    component: kind,
                    arity,
                });
            }
        }
    }

    if let Some(shape) = text.strip_prefix("mat") {
        let dimensions = match shape.split_once('x') {
            Some((c, r)) => single_dimension(c).zip(single_dimension(r)),
            None => single_dimension(shape).map(|n| (n, n)),
        };
        if let Some((columns, rows)) = dimensions {
            return Some(GlslType::Matrix { columns, rows });
        }
    }

    // `vec5` or `mat4x7` are malformed builtins, not struct names.
    let builtin_shaped = ["bvec", "ivec", "uvec", "vec", "mat"].iter().any(|prefix| {
        text.strip_prefix(prefix).is_some_and(|rest| {
            !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit() || c == 'x')
        })
    });
    if !builtin_shaped && is_identifier(text) {
        return Some(GlslType::Struct(text.to_string()));
    }
    None
}

fn single_dimension(digits: &str) -> Option<Arity> {
    if digits.len() != 1 {
        return None;
    }
    digits
        .parse::<usize>()
        .ok()
        .and_then(|n| Arity::new(n).ok())
}

impl FromStr for GlslType {
    type Err = TypeError;

    /// Parses GLSL type spelling, e.g. `vec3`, `mat3x4`, `Light[4]`, `float[2][3]`.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        let unparseable = || TypeError::Unparseable(text.to_string());

        let (base, mut suffix) = match text.find('[') {
            Some(index) => (text[..index].trim_end(), &text[index..]),
            None => (text, ""),
        };

        let mut lengths = Vec::new();
        while !suffix.is_empty() {
            let inner = suffix.strip_prefix('[').ok_or_else(unparseable)?;
            let close = inner.find(']').ok_or_else(unparseable)?;
            let length = inner[..close]
                .trim()
                .parse::<usize>()
                .map_err(|_| unparseable())?;
            lengths.push(length);
            suffix = inner[close + 1..].trim_start();
        }

        let mut ty = parse_base(base).ok_or_else(unparseable)?;
        // `T[a][b]` is an array of `a` arrays of `b` elements.
        for length in lengths.into_iter().rev() {
            ty = GlslType::array(ty, length)?;
        }
        Ok(ty)
    }
}

impl fmt::Display for GlslType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lengths = Vec::new();
        let mut base = self;
        while let GlslType::Array { element, length } = base {
            lengths.push(length.get());
            base = element;
        }

        match base {
            GlslType::Scalar(kind) => f.write_str(kind.glsl_name())?,
            GlslType::Vector { component, arity } => {
                write!(f, "{}{}", component.vector_prefix(), arity.get())?
            }
            GlslType::Matrix { columns, rows } if columns == rows => {
                write!(f, "mat{}", columns.get())?
            }
            GlslType::Matrix { columns, rows } => {
                write!(f, "mat{}x{}", columns.get(), rows.get())?
            }
            GlslType::Struct(name) => f.write_str(name)?,
            // Unwrapped by the loop above.
            GlslType::Array { .. } => {}
        }

        for length in lengths {
            write!(f, "[{length}]")?;
        }
        Ok(())
    }
}

impl TryFrom<String> for GlslType {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GlslType> for String {
    fn from(value: GlslType) -> Self {
        value.to_string()
    }
}

impl Serialize for GlslType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GlslType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scalars_vectors_and_matrices() {
        assert_eq!(
            "float".parse::<GlslType>().unwrap(),
            GlslType::Scalar(ScalarKind::Float)
        );
        assert_eq!(
            "ivec3".parse::<GlslType>().unwrap(),
            GlslType::vector(ScalarKind::Int, 3).unwrap()
        );
        assert_eq!(
            "bvec2".parse::<GlslType>().unwrap(),
            GlslType::vector(ScalarKind::Bool, 2).unwrap()
        );
        assert_eq!(
            "mat4".parse::<GlslType>().unwrap(),
            GlslType::matrix(4, 4).unwrap()
        );
        assert_eq!(
            "mat2x3".parse::<GlslType>().unwrap(),
            GlslType::matrix(2, 3).unwrap()
        );
    }

    #[test]
    fn array_suffixes_follow_glsl_order() {
        let ty: GlslType = "float[2][3]".parse().unwrap();
        let inner = GlslType::array(GlslType::Scalar(ScalarKind::Float), 3).unwrap();
        assert_eq!(ty, GlslType::array(inner, 2).unwrap());
        assert_eq!(ty.to_string(), "float[2][3]");
    }

    #[test]
    fn struct_arrays_report_their_struct() {
        let ty: GlslType = "Light[4]".parse().unwrap();
        assert_eq!(ty.referenced_struct(), Some("Light"));
        assert_eq!(ty.to_string(), "Light[4]");
        assert_eq!(
            "material".parse::<GlslType>().unwrap(),
            GlslType::structure("material")
        );
    }

    #[test]
    fn rejects_illegal_shapes() {
        assert_eq!(
            "vec5".parse::<GlslType>(),
            Err(TypeError::Unparseable("vec5".to_string()))
        );
        assert_eq!(
            "float[0]".parse::<GlslType>(),
            Err(TypeError::ZeroLengthArray)
        );
        assert_eq!(GlslType::vector(ScalarKind::Float, 1), Err(TypeError::InvalidArity(1)));
        assert_eq!(GlslType::matrix(4, 5), Err(TypeError::InvalidArity(5)));
        assert!("vec3[".parse::<GlslType>().is_err());
        assert!("9lives".parse::<GlslType>().is_err());
    }

    #[test]
    fn builtin_names_are_recognised() {
        assert!(GlslType::is_builtin_name("vec4"));
        assert!(GlslType::is_builtin_name("mat3x2"));
        assert!(GlslType::is_builtin_name("uint"));
        assert!(!GlslType::is_builtin_name("WindowParamsType"));
    }

    #[test]
    fn serializes_through_glsl_spelling() {
        let ty = GlslType::matrix(3, 3).unwrap();
        let json = serde_json::to_string(&ty).unwrap();
        assert_eq!(json, "\"mat3\"");
        let back: GlslType = serde_json::from_str("\"uvec4[2]\"").unwrap();
        assert_eq!(back.to_string(), "uvec4[2]");
    }
}
