//! Mesh fragment assembly: local meshes are transformed and their faces
//! renumbered against one running global vertex offset, so any number of
//! fragments can be concatenated into a single indexed OBJ mesh.
//!
//! The offset is read and advanced exactly once per fragment inside
//! [`FragmentBuilder::build`]. Fragments must therefore be built in the
//! order they will be written.

use crate::error::ConvertError;
use crate::identifier::{instance_name, object_name};
use crate::math::rotate;
use crate::scene::LocalMesh;
use crate::types::{Face, MeshFragment, Transform, Vertex};
use glam::{Vec2, Vec3};

/// Naming and material of a fragment about to be built.
#[derive(Debug, Clone, Copy)]
pub struct FragmentLabel<'a> {
    pub name: &'a str,
    pub material: &'a str,
    pub suffix: NameSuffix,
}

/// Which global vertex offset, if any, is appended to a fragment name.
///
/// Homogeneous instances (triles, background planes) share a base name and
/// are told apart by the offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameSuffix {
    /// Plain object name.
    #[default]
    None,
    /// Offset observed before the fragment's vertices were emitted.
    Before,
    /// Offset after the fragment's vertices were emitted.
    After,
}

/// Owns the global vertex offset of one conversion run.
#[derive(Debug, Default)]
pub struct FragmentBuilder {
    offset: u32,
}

impl FragmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vertices emitted so far in this run.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Transform `mesh` by `transform` plus `centering`, renumber its faces
    /// against the current offset, then advance the offset by its vertex count.
    ///
    /// Fails if a face index or the advanced offset does not fit in `u32`.
    pub fn build(
        &mut self,
        mesh: &LocalMesh,
        transform: &Transform,
        centering: Vec3,
        label: FragmentLabel<'_>,
    ) -> Result<MeshFragment, ConvertError> {
        let base = self.offset;
        let translation = transform.position + centering;

        let vertices = mesh
            .vertices
            .iter()
            .map(|v| Vertex {
                position: rotate(v.position, transform.rotation) * transform.scale + translation,
                normal: rotate(v.normal, transform.rotation),
                uv: inset_uv(flip_v(v.uv), mesh.uv_inset),
            })
            .collect::<Vec<_>>();

        let global = |local: u32| {
            local
                .checked_add(1)
                .and_then(|i| i.checked_add(base))
                .ok_or_else(|| {
                    ConvertError::Validation(format!(
                        "Face index {} of '{}' overflows at vertex offset {}",
                        local, label.name, base
                    ))
                })
        };
        let faces = mesh
            .triangles
            .iter()
            .map(|t| -> Result<Face, ConvertError> {
                Ok(Face([global(t[0])?, global(t[1])?, global(t[2])?]))
            })
            .collect::<Result<Vec<_>, ConvertError>>()?;

        let end = u32::try_from(vertices.len())
            .ok()
            .and_then(|count| base.checked_add(count))
            .ok_or_else(|| {
                ConvertError::Validation(format!(
                    "Vertex offset overflows after '{}' ({} + {} vertices)",
                    label.name,
                    base,
                    vertices.len()
                ))
            })?;
        self.offset = end;

        let name = match label.suffix {
            NameSuffix::None => object_name(label.name),
            NameSuffix::Before => instance_name(label.name, base),
            NameSuffix::After => instance_name(label.name, end),
        };

        Ok(MeshFragment {
            name,
            material: label.material.to_string(),
            vertices,
            faces,
        })
    }
}

/// OBJ texture space has V pointing up.
pub fn flip_v(uv: Vec2) -> Vec2 {
    Vec2::new(uv.x, 1.0 - uv.y)
}

/// Pull each coordinate `eps` toward the centre of the unit square.
pub fn inset_uv(uv: Vec2, eps: f32) -> Vec2 {
    let pull = |c: f32| {
        if c < 0.5 {
            c + eps
        } else if c > 0.5 {
            c - eps
        } else {
            c
        }
    };
    if eps == 0.0 {
        uv
    } else {
        Vec2::new(pull(uv.x), pull(uv.y))
    }
}
