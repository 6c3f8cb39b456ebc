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

use serde::Serialize;
use std::fmt;

const COMPONENTS: [char; 4] = ['x', 'y', 'z', 'w'];

/// One step of a [`HostPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A named struct field.
    Field(String),
    /// An array element or matrix column.
    Index(usize),
    /// A vector component, `0..4` for `x y z w`.
    Component(usize),
}

/// A structured path into a host value, e.g. `Lights[2].Color.z`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct HostPath(Vec<PathSegment>);

impl HostPath {
    /// The empty path, naming the value itself.
    pub fn root() -> Self {
        Self::default()
    }

    /// The segments of the path, outermost first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Returns a new path extended by `segment`.
    pub fn join(&self, segment: PathSegment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        Self(segments)
    }

    /// Extends the path with a field name.
    pub fn field(&self, name: &str) -> Self {
        self.join(PathSegment::Field(name.to_string()))
    }

    /// Extends the path with an index.
    pub fn index(&self, index: usize) -> Self {
        self.join(PathSegment::Index(index))
    }

    /// Extends the path with a vector component.
    pub fn component(&self, component: usize) -> Self {
        self.join(PathSegment::Component(component))
    }
}

impl fmt::Display for HostPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => f.write_str(name)?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
                PathSegment::Component(c) => match COMPONENTS.get(*c) {
                    Some(letter) => write!(f, ".{letter}")?,
                    None => write!(f, ".{c}")?,
                },
            }
        }
        Ok(())
    }
}

impl Serialize for HostPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_dotted_text() {
        let path = HostPath::root().field("Lights").index(2).field("Color").component(2);
        assert_eq!(path.to_string(), "Lights[2].Color.z");

        let column = HostPath::root().field("Model").index(1).component(1);
        assert_eq!(column.to_string(), "Model[1].y");
        assert_eq!(column.segments().len(), 3);
    }
}
