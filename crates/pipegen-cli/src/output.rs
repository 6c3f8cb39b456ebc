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

//! Writes rendered artifacts through a staging directory.
//!
//! Files are first written into a temporary directory next to the output
//! directory and only moved into place once every file was written.

use crate::render::RenderedFile;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Writes `files` into `output_dir`, returning the final paths.
pub fn write_staged(files: &[RenderedFile], output_dir: &Path) -> Result<Vec<PathBuf>> {
    let parent = match output_dir.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)
        .with_context(|| format!("Failed to create directory '{}'", parent.display()))?;

    let staging = tempfile::Builder::new()
        .prefix(".pipegen-staging-")
        .tempdir_in(&parent)
        .with_context(|| format!("Failed to create staging directory in '{}'", parent.display()))?;

    for file in files {
        let path = staging.path().join(file.name);
        fs::write(&path, &file.contents)
            .with_context(|| format!("Failed to stage '{}'", path.display()))?;
    }

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory '{}'", output_dir.display()))?;
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let from = staging.path().join(file.name);
        let to = output_dir.join(file.name);
        fs::rename(&from, &to)
            .with_context(|| format!("Failed to move '{}' into place", to.display()))?;
        log::debug!("Wrote '{}'.", to.display());
        written.push(to);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_files_and_cleans_up_staging() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("generated");
        let files = [RenderedFile {
            name: "a.ron",
            contents: "()\n".to_string(),
        }];

        let written = write_staged(&files, &out).unwrap();

        assert_eq!(written, vec![out.join("a.ron")]);
        assert_eq!(fs::read_to_string(out.join("a.ron")).unwrap(), "()\n");
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("generated")]);
    }
}
