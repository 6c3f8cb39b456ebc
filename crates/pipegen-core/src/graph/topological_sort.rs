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

//! A stable variant of Kahn's algorithm for topological sorting.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// An error indicating that a cycle was detected in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleError {
    /// The nodes that could not be ordered, in ascending order.
    pub remaining: Vec<usize>,
}

/// Performs a topological sort over nodes `0..node_count`.
///
/// Edges are `(parent, child)` pairs: the parent is emitted before the child.
/// Whenever several nodes are ready at once the lowest index wins, so a graph
/// without edges sorts to `0, 1, 2, ...` and the result depends only on the
/// input.
///
/// # Returns
///
/// * `Ok(Vec<usize>)`: The node indices in a valid topological order.
/// * `Err(CycleError)`: If the graph contains one or more cycles.
pub fn topological_sort(
    node_count: usize,
    edges: impl IntoIterator<Item = (usize, usize)>,
) -> Result<Vec<usize>, CycleError> {
    let mut adjacency_list: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut in_degree: Vec<usize> = vec![0; node_count];

    // 1. Build adjacency list and in-degree counts from edges.
    for (parent, child) in edges {
        if parent >= node_count || child >= node_count {
            continue;
        }
        adjacency_list[parent].push(child);
        in_degree[child] += 1;
    }

    // 2. Seed the ready set with every root node.
    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, &degree)| degree == 0)
        .map(|(node, _)| Reverse(node))
        .collect();

    // 3. Process the ready set, lowest index first.
    let mut sorted_list = Vec::with_capacity(node_count);
    while let Some(Reverse(parent)) = ready.pop() {
        sorted_list.push(parent);
        for &child in &adjacency_list[parent] {
            in_degree[child] -= 1;
            if in_degree[child] == 0 {
                ready.push(Reverse(child));
            }
        }
    }

    // 4. Check for cycles.
    if sorted_list.len() != node_count {
        let remaining = (0..node_count).filter(|&n| in_degree[n] > 0).collect();
        Err(CycleError { remaining })
    } else {
        Ok(sorted_list)
    }
}
