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

//! Reads specifications from disk.

use anyhow::{bail, Context, Result};
use pipegen_core::Specification;
use std::fs;
use std::path::Path;

/// The formats a specification may be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFormat {
    /// Rusty Object Notation.
    Ron,
    /// JSON.
    Json,
}

impl SpecFormat {
    /// Picks the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("ron") => Ok(SpecFormat::Ron),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(SpecFormat::Json),
            _ => bail!(
                "Cannot tell the format of '{}': expected a .ron or .json file",
                path.display()
            ),
        }
    }
}

/// Parses specification text.
pub fn parse_specification(text: &str, format: SpecFormat) -> Result<Specification> {
    let spec = match format {
        SpecFormat::Ron => ron::from_str(text).context("Failed to parse RON specification")?,
        SpecFormat::Json => {
            serde_json::from_str(text).context("Failed to parse JSON specification")?
        }
    };
    Ok(spec)
}

/// Reads and parses the specification at `path`.
pub fn load_specification(path: &Path) -> Result<Specification> {
    let format = SpecFormat::from_path(path)?;
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read specification '{}'", path.display()))?;
    parse_specification(&text, format)
        .with_context(|| format!("Invalid specification '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_the_extension() {
        assert_eq!(SpecFormat::from_path(Path::new("a.ron")).unwrap(), SpecFormat::Ron);
        assert_eq!(SpecFormat::from_path(Path::new("a.JSON")).unwrap(), SpecFormat::Json);
        assert!(SpecFormat::from_path(Path::new("a.yaml")).is_err());
    }

    #[test]
    fn empty_documents_are_valid() {
        let spec = parse_specification("()", SpecFormat::Ron).unwrap();
        assert!(spec.structs.is_empty());
        let spec = parse_specification("{}", SpecFormat::Json).unwrap();
        assert!(spec.pipelines.is_empty());
    }

    #[test]
    fn bad_types_are_reported() {
        let err = parse_specification(
            r#"(structs: [(name: "S", fields: [(name: "x", type: "vec9")])])"#,
            SpecFormat::Ron,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("vec9"));
    }
}
