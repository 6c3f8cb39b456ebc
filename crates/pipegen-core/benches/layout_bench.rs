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

use criterion::{criterion_group, criterion_main, Criterion};
use pipegen_core::{GlslType, LayoutEngine, MarshalGenerator, StructDef, StructTable};
use std::hint::black_box;

/// A chain of 64 structs, each embedding the previous one in an array.
fn chained_structs() -> StructTable {
    let mut defs = vec![StructDef::new(
        "Link0",
        [
            ("Color", "vec3".parse::<GlslType>().unwrap()),
            ("Transform", "mat4".parse().unwrap()),
        ],
    )];
    for i in 1..64 {
        defs.push(StructDef::new(
            format!("Link{i}"),
            [
                ("Weight", "float".parse::<GlslType>().unwrap()),
                ("Previous", format!("Link{}[2]", i - 1).parse().unwrap()),
            ],
        ));
    }
    defs.reverse();
    StructTable::new(defs).unwrap()
}

fn bench_layouts(c: &mut Criterion) {
    let table = chained_structs();
    let mut group = c.benchmark_group("std140");

    group.bench_function("Layout 64 nested structs", |b| {
        b.iter(|| {
            let mut engine = LayoutEngine::new(table.clone());
            engine.compute_all().unwrap();
            black_box(engine);
        });
    });

    let mut engine = LayoutEngine::new(table.clone());
    engine.compute_all().unwrap();
    group.bench_function("Marshal plan for Link8", |b| {
        let layout = engine.get("Link8").unwrap();
        b.iter(|| {
            let plan = MarshalGenerator::new(&engine).plan_for(layout).unwrap();
            black_box(plan.ops.len());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_layouts);
criterion_main!(benches);
