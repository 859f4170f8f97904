use crate::error::ConvertError;
use crate::fragment::{FragmentBuilder, FragmentLabel, NameSuffix};
use crate::identifier::{asset_stem, object_name};
use crate::math::{cross, rotate};
use crate::scene::{ArtObject, ArtObjectInstance, BackgroundPlane, LocalMesh, Trile, TrileInstance, TrileSet};
use crate::types::{MeshFragment, Transform};
use glam::{Quat, Vec2, Vec3};

/// Half-cell shift aligning art objects and planes to the trile grid.
pub const CELL_ALIGNMENT: Vec3 = Vec3::splat(0.5);

/// Distance a background plane is pushed along its normal to avoid
/// z-fighting with coplanar geometry.
pub const PLANE_PUSH: f32 = 0.0005;

/// Sprite pixels per world unit.
pub const PIXELS_PER_UNIT: f32 = 16.0;

/// Convert an art object with an explicit transform and centering offset.
pub fn convert_art_object(
    builder: &mut FragmentBuilder,
    art: &ArtObject,
    transform: &Transform,
    centering: Vec3,
) -> Result<MeshFragment, ConvertError> {
    let material = object_name(&art.name);
    builder.build(
        &art.mesh,
        transform,
        centering,
        FragmentLabel {
            name: &art.name,
            material: &material,
            suffix: NameSuffix::None,
        },
    )
}

/// Convert a standalone art object file, centred on its own bounding size.
pub fn convert_art_object_file(
    builder: &mut FragmentBuilder,
    art: &ArtObject,
) -> Result<MeshFragment, ConvertError> {
    let size = art.size.ok_or_else(|| ConvertError::MissingElement {
        element: "Size".to_string(),
        parent: "ArtObject".to_string(),
    })?;
    convert_art_object(builder, art, &Transform::IDENTITY, -size / 2.0)
}

/// Convert one art object instance placed in a level.
pub fn convert_art_object_instance(
    builder: &mut FragmentBuilder,
    art: &ArtObject,
    instance: &ArtObjectInstance,
    level_centering: Vec3,
) -> Result<MeshFragment, ConvertError> {
    let transform = Transform {
        position: instance.position,
        rotation: instance.rotation,
        scale: instance.scale,
    };
    convert_art_object(builder, art, &transform, level_centering - CELL_ALIGNMENT)
}

/// Convert one trile instance: discrete yaw, no scale. The name carries the
/// offset reached after the trile's vertices.
pub fn convert_trile(
    builder: &mut FragmentBuilder,
    trile: &Trile,
    instance: &TrileInstance,
    material: &str,
    level_centering: Vec3,
) -> Result<MeshFragment, ConvertError> {
    let transform = Transform {
        position: instance.position,
        rotation: instance.orientation.rotation(),
        scale: Vec3::ONE,
    };
    builder.build(
        &trile.mesh,
        &transform,
        level_centering,
        FragmentLabel {
            name: &trile.name,
            material,
            suffix: NameSuffix::After,
        },
    )
}

/// Convert every palette entry of a trile set, unplaced, into one run.
pub fn convert_trile_set(
    builder: &mut FragmentBuilder,
    set: &TrileSet,
) -> Result<Vec<MeshFragment>, ConvertError> {
    set.iter()
        .map(|(key, trile)| {
            log::debug!("Trile {} '{}': {} vertices", key, trile.name, trile.mesh.vertex_count());
            builder.build(
                &trile.mesh,
                &Transform::IDENTITY,
                Vec3::ZERO,
                FragmentLabel {
                    name: &trile.name,
                    material: &set.name,
                    suffix: NameSuffix::After,
                },
            )
        })
        .collect()
}

/// Facing direction of a quad rotated by `rotation`: the normalized cross
/// product of its rotated horizontal and vertical edges.
pub fn plane_normal(rotation: Quat) -> Vec3 {
    cross(rotate(Vec3::X, rotation), rotate(Vec3::Y, rotation))
}

/// Convert a background plane given the pixel size of one sprite. The name
/// carries the offset reached before the quad's vertices.
pub fn convert_background_plane(
    builder: &mut FragmentBuilder,
    plane: &BackgroundPlane,
    sprite_size: Vec2,
    level_centering: Vec3,
) -> Result<MeshFragment, ConvertError> {
    let normal = plane_normal(plane.rotation);
    let transform = Transform {
        position: plane.position + normal * PLANE_PUSH - CELL_ALIGNMENT,
        rotation: plane.rotation,
        scale: plane.scale * (sprite_size / PIXELS_PER_UNIT).extend(1.0),
    };
    let material = asset_stem(&plane.texture_name);
    builder.build(
        &LocalMesh::unit_quad(),
        &transform,
        level_centering,
        FragmentLabel {
            name: &material,
            material: &material,
            suffix: NameSuffix::Before,
        },
    )
}
