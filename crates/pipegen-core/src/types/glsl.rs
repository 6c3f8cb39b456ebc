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

//! Shader-side declaration text for struct types.
//!
//! The host layout and these declarations describe the same bytes, so they are
//! generated from the same [`StructDef`].

use super::{GlslType, StructDef};
use std::fmt::Write;

const INDENT: &str = "    ";

/// Formats one member line, e.g. `float Weights[4];`.
pub fn member_declaration(name: &str, ty: &GlslType) -> String {
    let spelled = ty.to_string();
    match spelled.find('[') {
        Some(split) => format!("{} {}{};", &spelled[..split], name, &spelled[split..]),
        None => format!("{spelled} {name};"),
    }
}

fn write_members(out: &mut String, def: &StructDef) {
    for field in &def.fields {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{INDENT}{}", member_declaration(&field.name, &field.ty));
    }
}

/// Formats a GLSL `struct` declaration.
pub fn struct_declaration(def: &StructDef) -> String {
    let mut out = format!("struct {}\n{{\n", def.name);
    write_members(&mut out, def);
    out.push_str("};\n");
    out
}

/// Formats a std140 uniform block exposing the fields of `def`.
///
/// An empty `instance` declares the members at global scope.
pub fn uniform_block(def: &StructDef, binding: u32, block: &str, instance: &str) -> String {
    let mut out = format!("layout(std140, binding = {binding})\nuniform {block}\n{{\n");
    write_members(&mut out, def);
    out.push('}');
    if !instance.is_empty() {
        out.push(' ');
        out.push_str(instance);
    }
    out.push_str(";\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_params() -> StructDef {
        StructDef::new(
            "WindowParamsType",
            [
                ("WindowSize", "vec4".parse().unwrap()),
                ("WindowScale", "vec4".parse().unwrap()),
                ("ElapsedTime", "float".parse().unwrap()),
            ],
        )
    }

    #[test]
    fn struct_text() {
        let text = struct_declaration(&window_params());
        assert_eq!(
            text,
            "struct WindowParamsType\n{\n    vec4 WindowSize;\n    vec4 WindowScale;\n    float ElapsedTime;\n};\n"
        );
    }

    #[test]
    fn array_members_put_lengths_after_the_name() {
        let ty: GlslType = "Light[2][3]".parse().unwrap();
        assert_eq!(member_declaration("Lights", &ty), "Light Lights[2][3];");
    }

    #[test]
    fn uniform_block_text() {
        let text = uniform_block(&window_params(), 0, "WindowParams", "");
        assert!(text.starts_with("layout(std140, binding = 0)\nuniform WindowParams\n{\n"));
        assert!(text.ends_with("};\n"));

        let named = uniform_block(&window_params(), 3, "WindowParams", "Window");
        assert!(named.ends_with("} Window;\n"));
    }
}
