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

//! Splices the passes of copied pipelines into the pipelines copying them.

use super::{Pipeline, RenderPass};
use crate::error::SpecError;
use std::collections::{HashMap, HashSet};

/// Returns the passes each pipeline runs once its `copies` are expanded.
///
/// Copied passes come first, in copy order. A later pass carrying the name of
/// an earlier one replaces it in place, so a pipeline can copy another and
/// override some of its passes. Copies resolve transitively; a pipeline
/// reaching itself is a [`SpecError::CyclicCopy`].
pub fn expand_copies(pipelines: &[Pipeline]) -> Result<Vec<Vec<RenderPass>>, SpecError> {
    let index: HashMap<&str, usize> = pipelines
        .iter()
        .enumerate()
        .map(|(i, p)| (p.name.as_str(), i))
        .collect();
    let mut expanded: Vec<Option<Vec<RenderPass>>> = vec![None; pipelines.len()];
    let mut stack = Vec::new();
    for i in 0..pipelines.len() {
        expand(pipelines, &index, &mut expanded, &mut stack, i)?;
    }
    Ok(expanded
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}

fn expand(
    pipelines: &[Pipeline],
    index: &HashMap<&str, usize>,
    expanded: &mut [Option<Vec<RenderPass>>],
    stack: &mut Vec<usize>,
    i: usize,
) -> Result<(), SpecError> {
    if expanded[i].is_some() {
        return Ok(());
    }
    let pipeline = &pipelines[i];
    if stack.contains(&i) {
        let mut path: Vec<String> = stack.iter().map(|&s| pipelines[s].name.clone()).collect();
        path.push(pipeline.name.clone());
        return Err(SpecError::CyclicCopy {
            pipeline: pipeline.name.clone(),
            path,
        });
    }

    stack.push(i);
    let mut passes = Vec::new();
    for target in &pipeline.copies {
        let &j = index
            .get(target.as_str())
            .ok_or_else(|| SpecError::DanglingReference {
                referrer: pipeline.name.clone(),
                missing: target.clone(),
            })?;
        expand(pipelines, index, expanded, stack, j)?;
        for pass in expanded[j].clone().unwrap_or_default() {
            merge(&mut passes, pass);
        }
    }
    stack.pop();

    let mut own = HashSet::new();
    for pass in &pipeline.passes {
        if !own.insert(pass.name.as_str()) {
            return Err(SpecError::DuplicateName {
                kind: "pass",
                name: format!("{}.{}", pipeline.name, pass.name),
            });
        }
        merge(&mut passes, pass.clone());
    }

    if !pipeline.copies.is_empty() {
        log::debug!(
            "Pipeline '{}' runs {} passes after expanding {} copies.",
            pipeline.name,
            passes.len(),
            pipeline.copies.len()
        );
    }
    expanded[i] = Some(passes);
    Ok(())
}

fn merge(passes: &mut Vec<RenderPass>, pass: RenderPass) {
    match passes.iter_mut().find(|p| p.name == pass.name) {
        Some(slot) => *slot = pass,
        None => passes.push(pass),
    }
}
