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

//! The resource graph and its window-size dependency queries.

use super::{
    AttachmentRebind, AttachmentSlot, FramebufferRebind, ResizePlan, ResourceClass, ResourceDecl,
    ResourceKind, ShaderStageKind, ShadowTarget, SizePolicy, TextureFormat, TextureRecreate,
};
use crate::error::SpecError;
use crate::graph::topological_sort;
use crate::types::is_identifier;
use std::collections::{BTreeSet, HashMap, HashSet};

/// An indexed, validated set of resource declarations.
///
/// Framebuffers depend on the textures they attach and programs on the stages
/// they link. A framebuffer attaching a window-relative texture is itself
/// window-relative.
#[derive(Debug, Clone)]
pub struct ResourceGraph {
    decls: Vec<ResourceDecl>,
    index: HashMap<String, usize>,
    window_relative: Vec<bool>,
}

impl ResourceGraph {
    /// Indexes and validates `decls`.
    ///
    /// # Errors
    ///
    /// Returns the first violation found, in declaration order:
    /// [`SpecError::DuplicateName`], [`SpecError::InvalidIdentifier`],
    /// [`SpecError::InvalidResource`], [`SpecError::DanglingReference`],
    /// [`SpecError::WrongResourceKind`], [`SpecError::AttachmentFormat`] or
    /// [`SpecError::SizePolicyConflict`].
    pub fn build(decls: impl IntoIterator<Item = ResourceDecl>) -> Result<Self, SpecError> {
        let decls: Vec<ResourceDecl> = decls.into_iter().collect();
        let mut index = HashMap::with_capacity(decls.len());
        for (i, decl) in decls.iter().enumerate() {
            if !is_identifier(&decl.name) {
                return Err(SpecError::InvalidIdentifier {
                    name: decl.name.clone(),
                });
            }
            if index.insert(decl.name.clone(), i).is_some() {
                return Err(SpecError::DuplicateName {
                    kind: "resource",
                    name: decl.name.clone(),
                });
            }
        }

        let mut graph = Self {
            window_relative: vec![false; decls.len()],
            decls,
            index,
        };
        for i in 0..graph.decls.len() {
            graph.check(i)?;
        }
        for i in 0..graph.decls.len() {
            graph.window_relative[i] = graph.compute_window_relative(i);
        }

        log::debug!(
            "Built resource graph: {} resources, {} window-relative.",
            graph.decls.len(),
            graph.window_relative.iter().filter(|&&w| w).count()
        );
        Ok(graph)
    }

    /// Looks up a resource by name.
    pub fn get(&self, name: &str) -> Option<&ResourceDecl> {
        self.index.get(name).map(|&i| &self.decls[i])
    }

    /// Iterates the resources in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceDecl> {
        self.decls.iter()
    }

    /// The number of resources.
    pub fn len(&self) -> usize {
        self.decls.len()
    }

    /// Returns `true` if no resource is declared.
    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Resolves `name` on behalf of `referrer`, requiring it to be a `class`.
    pub fn require(
        &self,
        referrer: &str,
        name: &str,
        class: ResourceClass,
    ) -> Result<&ResourceDecl, SpecError> {
        let decl = self.get(name).ok_or_else(|| SpecError::DanglingReference {
            referrer: referrer.to_string(),
            missing: name.to_string(),
        })?;
        if decl.class() != class {
            return Err(SpecError::WrongResourceKind {
                referrer: referrer.to_string(),
                name: name.to_string(),
                expected: class,
                found: decl.class(),
            });
        }
        Ok(decl)
    }

    /// Adds the shadow copy of a double-buffered texture.
    ///
    /// The copy shares every parameter of the original, so a window-relative
    /// original yields a window-relative shadow that is recreated on resize.
    pub fn add_shadow(&mut self, shadow: &ShadowTarget) -> Result<(), SpecError> {
        let original = self
            .require(&shadow.name, &shadow.texture, ResourceClass::Texture)?
            .clone();
        if self.index.contains_key(&shadow.name) {
            return Err(SpecError::DuplicateName {
                kind: "resource",
                name: shadow.name.clone(),
            });
        }

        let i = self.decls.len();
        self.decls.push(ResourceDecl::new(shadow.name.clone(), original.kind));
        self.index.insert(shadow.name.clone(), i);
        self.window_relative.push(self.compute_window_relative(i));
        log::debug!(
            "Double-buffering texture '{}' through '{}'.",
            shadow.texture,
            shadow.name
        );
        Ok(())
    }

    /// Returns `true` if `name` must be recreated or rebound on resize.
    pub fn is_window_relative(&self, name: &str) -> bool {
        self.index
            .get(name)
            .is_some_and(|&i| self.window_relative[i])
    }

    /// The names of every resource touched by a resize.
    pub fn affected_by_resize(&self) -> BTreeSet<String> {
        self.decls
            .iter()
            .zip(&self.window_relative)
            .filter(|(_, &wr)| wr)
            .map(|(decl, _)| decl.name.clone())
            .collect()
    }

    /// All resources in creation order.
    ///
    /// Stages precede the programs linking them and textures precede the
    /// framebuffers attaching them; otherwise declaration order is kept.
    pub fn creation_order(&self) -> Vec<&ResourceDecl> {
        let mut edges = Vec::new();
        for (child, decl) in self.decls.iter().enumerate() {
            for dependency in dependencies(&decl.kind) {
                if let Some(&parent) = self.index.get(dependency) {
                    edges.push((parent, child));
                }
            }
        }

        match topological_sort(self.decls.len(), edges) {
            Ok(order) => order.into_iter().map(|i| &self.decls[i]).collect(),
            Err(cycle) => {
                // Only textures and stages are depended on, and they depend on nothing.
                log::warn!(
                    "Resource dependencies contain a cycle through {:?}; using declaration order.",
                    cycle.remaining
                );
                self.decls.iter().collect()
            }
        }
    }

    /// Computes the resize work for a window of `width` x `height`.
    pub fn plan_resize(&self, width: u32, height: u32) -> ResizePlan {
        let mut textures = Vec::new();
        let mut recreated = HashSet::new();
        for decl in &self.decls {
            if let ResourceKind::Texture {
                format,
                mip_levels,
                size: Some(policy @ SizePolicy::WindowRelative { .. }),
                clear,
                ..
            } = &decl.kind
            {
                let (w, h) = policy.resolve(width, height);
                recreated.insert(decl.name.as_str());
                textures.push(TextureRecreate {
                    name: decl.name.clone(),
                    format: *format,
                    mip_levels: *mip_levels,
                    clear: *clear,
                    width: w,
                    height: h,
                });
            }
        }

        let mut framebuffers = Vec::new();
        for decl in &self.decls {
            if let ResourceKind::Framebuffer { color, depth, .. } = &decl.kind {
                let touches_recreated = color
                    .iter()
                    .chain(depth.iter())
                    .any(|t| recreated.contains(t.as_str()));
                if !touches_recreated {
                    continue;
                }
                let attachments = color
                    .iter()
                    .enumerate()
                    .map(|(slot, texture)| AttachmentRebind {
                        slot: AttachmentSlot::Color(slot),
                        texture: texture.clone(),
                    })
                    .chain(depth.iter().map(|texture| AttachmentRebind {
                        slot: AttachmentSlot::Depth,
                        texture: texture.clone(),
                    }))
                    .collect();
                framebuffers.push(FramebufferRebind {
                    name: decl.name.clone(),
                    attachments,
                });
            }
        }

        ResizePlan {
            width,
            height,
            textures,
            framebuffers,
        }
    }

    fn compute_window_relative(&self, i: usize) -> bool {
        match &self.decls[i].kind {
            ResourceKind::Texture { size, .. } => size.is_some_and(|s| s.is_window_relative()),
            ResourceKind::Framebuffer { color, depth, .. } => {
                color.iter().chain(depth.iter()).any(|t| self.texture_is_window_relative(t))
            }
            _ => false,
        }
    }

    fn texture_is_window_relative(&self, name: &str) -> bool {
        matches!(
            self.get(name).map(|d| &d.kind),
            Some(ResourceKind::Texture { size: Some(SizePolicy::WindowRelative { .. }), .. })
        )
    }

    fn check(&self, i: usize) -> Result<(), SpecError> {
        let decl = &self.decls[i];
        let invalid = |reason: String| SpecError::InvalidResource {
            name: decl.name.clone(),
            reason,
        };

        match &decl.kind {
            ResourceKind::Buffer { .. } | ResourceKind::Sampler { .. } => Ok(()),
            ResourceKind::ShaderStage { .. } => Ok(()),
            ResourceKind::Texture {
                format,
                mip_levels,
                size,
                source,
                ..
            } => {
                if *mip_levels == 0 {
                    return Err(invalid("mip level count must be at least 1".into()));
                }
                match (size, source) {
                    (Some(_), Some(_)) => {
                        Err(invalid("declares both a size and an image source".into()))
                    }
                    (None, None) => Err(invalid("declares neither a size nor an image source".into())),
                    (None, Some(_)) if *format != TextureFormat::Rgba8Unorm => Err(invalid(
                        format!("image-backed textures must be Rgba8Unorm, not {format:?}"),
                    )),
                    (Some(SizePolicy::Fixed { width, height }), None)
                        if *width == 0 || *height == 0 =>
                    {
                        Err(invalid(format!("fixed size {width}x{height} is empty")))
                    }
                    (Some(SizePolicy::WindowRelative { scale_x, scale_y }), None)
                        if !(scale_x.is_finite() && *scale_x > 0.0)
                            || !(scale_y.is_finite() && *scale_y > 0.0) =>
                    {
                        Err(invalid(format!(
                            "window scale {scale_x}x{scale_y} must be positive"
                        )))
                    }
                    _ => Ok(()),
                }
            }
            ResourceKind::Framebuffer { color, depth, size } => {
                self.check_framebuffer(&decl.name, color, depth.as_deref(), size.as_ref())
            }
            ResourceKind::ShaderProgram { stages, .. } => {
                if stages.is_empty() {
                    return Err(invalid("links no shader stages".into()));
                }
                let mut kinds = Vec::with_capacity(stages.len());
                for stage in stages {
                    if let ResourceKind::ShaderStage { stage: kind, .. } =
                        &self.require(&decl.name, stage, ResourceClass::ShaderStage)?.kind
                    {
                        kinds.push(*kind);
                    }
                }
                let compute = kinds.contains(&ShaderStageKind::Compute);
                if compute && kinds.len() > 1 {
                    return Err(invalid("mixes compute and raster stages".into()));
                }
                if !compute && !kinds.contains(&ShaderStageKind::Vertex) {
                    return Err(invalid("has no vertex stage".into()));
                }
                Ok(())
            }
        }
    }

    fn check_framebuffer(
        &self,
        name: &str,
        color: &[String],
        depth: Option<&str>,
        size: Option<&SizePolicy>,
    ) -> Result<(), SpecError> {
        if color.is_empty() && depth.is_none() {
            return Err(SpecError::InvalidResource {
                name: name.to_string(),
                reason: "has no attachments".into(),
            });
        }

        let mut seen = HashSet::new();
        let slots = color
            .iter()
            .map(|t| (t.as_str(), false))
            .chain(depth.map(|t| (t, true)));
        let mut window_relative = Vec::new();
        let mut fixed = Vec::new();
        for (texture, is_depth_slot) in slots {
            if !seen.insert(texture) {
                return Err(SpecError::InvalidResource {
                    name: name.to_string(),
                    reason: format!("attaches '{texture}' more than once"),
                });
            }
            let decl = self.require(name, texture, ResourceClass::Texture)?;
            if let ResourceKind::Texture { format, size: policy, .. } = &decl.kind {
                if format.is_depth() != is_depth_slot {
                    let detail = if is_depth_slot {
                        format!("color format {format:?} in the depth slot")
                    } else {
                        format!("depth format {format:?} in a color slot")
                    };
                    return Err(SpecError::AttachmentFormat {
                        framebuffer: name.to_string(),
                        attachment: texture.to_string(),
                        detail,
                    });
                }
                if policy.is_some_and(|p| p.is_window_relative()) {
                    window_relative.push(texture);
                } else {
                    fixed.push(texture);
                }
            }
        }

        let conflict = |detail: String| SpecError::SizePolicyConflict {
            framebuffer: name.to_string(),
            detail,
        };
        match size {
            Some(SizePolicy::Fixed { .. }) => {
                if let Some(texture) = window_relative.first() {
                    return Err(conflict(format!(
                        "fixed-size framebuffer attaches window-relative texture '{texture}'"
                    )));
                }
            }
            Some(SizePolicy::WindowRelative { .. }) if window_relative.is_empty() => {
                return Err(conflict(
                    "window-relative framebuffer has no window-relative attachment".into(),
                ));
            }
            _ => {}
        }
        if let (Some(relative), Some(constant)) = (window_relative.first(), fixed.first()) {
            return Err(conflict(format!(
                "mixes window-relative texture '{relative}' with fixed-size texture '{constant}'"
            )));
        }
        Ok(())
    }
}

fn dependencies(kind: &ResourceKind) -> Vec<&str> {
    match kind {
        ResourceKind::Framebuffer { color, depth, .. } => color
            .iter()
            .chain(depth.iter())
            .map(String::as_str)
            .collect(),
        ResourceKind::ShaderProgram { stages, .. } => stages.iter().map(String::as_str).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ResizeStep;

    fn full_window() -> SizePolicy {
        SizePolicy::WindowRelative {
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    fn fixed(size: u32) -> SizePolicy {
        SizePolicy::Fixed {
            width: size,
            height: size,
        }
    }

    #[test]
    fn resize_recreates_textures_before_rebinding() {
        let graph = ResourceGraph::build([
            ResourceDecl::framebuffer("F", ["T"], Some("D")),
            ResourceDecl::texture("T", TextureFormat::Rgba16Float, full_window()),
            ResourceDecl::texture("D", TextureFormat::Depth32Float, full_window()),
            ResourceDecl::texture("Shadow", TextureFormat::Depth32Float, fixed(1024)),
            ResourceDecl::framebuffer("G", std::iter::empty::<&str>(), Some("Shadow")),
        ])
        .unwrap();

        let plan = graph.plan_resize(800, 600);
        let order: Vec<_> = plan.steps().map(|s| s.name().to_string()).collect();
        assert_eq!(order, ["T", "D", "F"]);
        assert!(matches!(plan.steps().last(), Some(ResizeStep::Rebind(_))));
        assert_eq!(
            plan.framebuffers[0].attachments,
            vec![
                AttachmentRebind {
                    slot: AttachmentSlot::Color(0),
                    texture: "T".to_string()
                },
                AttachmentRebind {
                    slot: AttachmentSlot::Depth,
                    texture: "D".to_string()
                },
            ]
        );
        assert_eq!((plan.textures[0].width, plan.textures[0].height), (800, 600));
        assert_eq!(
            graph.affected_by_resize().into_iter().collect::<Vec<_>>(),
            ["D", "F", "T"]
        );
    }

    #[test]
    fn shadows_copy_the_texture_and_follow_resizes() {
        let mut graph = ResourceGraph::build([
            ResourceDecl::texture("Accum", TextureFormat::Rgba16Float, full_window()),
            ResourceDecl::framebuffer("History", ["Accum"], None),
        ])
        .unwrap();
        let shadow = ShadowTarget::named("Accum", |name| graph.get(name).is_some());
        graph.add_shadow(&shadow).unwrap();

        let copy = graph.get("AccumTarget").unwrap();
        assert_eq!(copy.kind, graph.get("Accum").unwrap().kind);
        assert!(graph.is_window_relative("AccumTarget"));

        let plan = graph.plan_resize(1024, 512);
        let order: Vec<_> = plan.steps().map(|s| s.name().to_string()).collect();
        assert_eq!(order, ["Accum", "AccumTarget", "History"]);
        assert_eq!(
            graph.creation_order().last().map(|d| d.name.as_str()),
            Some("AccumTarget")
        );

        assert!(matches!(
            graph.add_shadow(&shadow),
            Err(SpecError::DuplicateName { .. })
        ));
        let stray = ShadowTarget::named("History", |_| false);
        assert!(matches!(
            graph.add_shadow(&stray),
            Err(SpecError::WrongResourceKind { .. })
        ));
    }

    #[test]
    fn dangling_attachment_names_both_sides() {
        let err = ResourceGraph::build([ResourceDecl::framebuffer("GBuffer", ["Albedo"], None)])
            .unwrap_err();
        assert_eq!(
            err,
            SpecError::DanglingReference {
                referrer: "GBuffer".to_string(),
                missing: "Albedo".to_string()
            }
        );
    }

    #[test]
    fn fixed_framebuffer_cannot_attach_window_relative_texture() {
        let mut fb = ResourceDecl::framebuffer("F", ["T"], None);
        if let ResourceKind::Framebuffer { size, .. } = &mut fb.kind {
            *size = Some(fixed(256));
        }
        let err = ResourceGraph::build([
            ResourceDecl::texture("T", TextureFormat::Rgba8Unorm, full_window()),
            fb,
        ])
        .unwrap_err();
        assert!(matches!(err, SpecError::SizePolicyConflict { ref framebuffer, .. } if framebuffer == "F"));
    }

    #[test]
    fn window_relative_framebuffer_needs_a_window_relative_attachment() {
        let mut fb = ResourceDecl::framebuffer("F", ["T"], None);
        if let ResourceKind::Framebuffer { size, .. } = &mut fb.kind {
            *size = Some(full_window());
        }
        let err = ResourceGraph::build([
            ResourceDecl::texture("T", TextureFormat::Rgba8Unorm, fixed(64)),
            fb,
        ])
        .unwrap_err();
        assert!(matches!(err, SpecError::SizePolicyConflict { .. }));
    }

    #[test]
    fn attachment_formats_must_match_their_slot() {
        let err = ResourceGraph::build([
            ResourceDecl::texture("D", TextureFormat::Depth24Stencil8, fixed(64)),
            ResourceDecl::framebuffer("F", ["D"], None),
        ])
        .unwrap_err();
        assert!(matches!(err, SpecError::AttachmentFormat { .. }));
    }

    #[test]
    fn wrong_kind_and_duplicates() {
        let err = ResourceGraph::build([
            ResourceDecl::buffer("B", "S"),
            ResourceDecl::framebuffer("F", ["B"], None),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            SpecError::WrongResourceKind {
                referrer: "F".to_string(),
                name: "B".to_string(),
                expected: ResourceClass::Texture,
                found: ResourceClass::Buffer,
            }
        );

        let err =
            ResourceGraph::build([ResourceDecl::buffer("B", "S"), ResourceDecl::buffer("B", "S")])
                .unwrap_err();
        assert!(matches!(err, SpecError::DuplicateName { kind: "resource", .. }));
    }

    #[test]
    fn programs_are_created_after_their_stages() {
        let graph = ResourceGraph::build([
            ResourceDecl::program("Blit", ["BlitVs", "BlitFs"], ["WindowParamsType"], 1),
            ResourceDecl::stage("BlitVs", ShaderStageKind::Vertex, "void main() {}"),
            ResourceDecl::stage("BlitFs", ShaderStageKind::Fragment, "void main() {}"),
            ResourceDecl::buffer("Params", "WindowParamsType"),
        ])
        .unwrap();
        let order: Vec<_> = graph.creation_order().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(order, ["BlitVs", "BlitFs", "Blit", "Params"]);
    }

    #[test]
    fn programs_cannot_mix_compute_and_raster() {
        let err = ResourceGraph::build([
            ResourceDecl::stage("Vs", ShaderStageKind::Vertex, ""),
            ResourceDecl::stage("Cs", ShaderStageKind::Compute, ""),
            ResourceDecl::program("P", ["Vs", "Cs"], std::iter::empty::<&str>(), 0),
        ])
        .unwrap_err();
        assert!(matches!(err, SpecError::InvalidResource { ref name, .. } if name == "P"));
    }

    #[test]
    fn textures_need_exactly_one_size_source() {
        let err = ResourceGraph::build([ResourceDecl::new(
            "Logo",
            ResourceKind::Texture {
                format: TextureFormat::Rgba16Float,
                mip_levels: 1,
                size: None,
                source: Some("logo.png".into()),
                clear: None,
            },
        )])
        .unwrap_err();
        assert!(matches!(err, SpecError::InvalidResource { .. }));
    }
}
