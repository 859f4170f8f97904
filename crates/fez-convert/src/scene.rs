//! Typed views over the four source document kinds.

use crate::document::Element;
use crate::error::ConvertError;
use crate::math::face_normal;
use crate::types::{Orientation, PlaneFlags};
use glam::{Quat, Vec2, Vec3};
use std::collections::HashMap;

/// UV inset applied to background-plane quads to avoid atlas bleed.
pub const TEX_EPSILON: f32 = 0.005;

/// Trile id marking an empty level cell.
pub const EMPTY_TRILE_ID: &str = "-1";

/// Root element kinds understood by the converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentKind {
    ArtObject,
    TrileSet,
    Level,
    AnimatedTexture,
    Unknown(String),
}

impl DocumentKind {
    pub fn from_root(root: &Element) -> Self {
        match root.name.as_str() {
            "ArtObject" => DocumentKind::ArtObject,
            "TrileSet" => DocumentKind::TrileSet,
            "Level" => DocumentKind::Level,
            "AnimatedTexturePC" => DocumentKind::AnimatedTexture,
            other => DocumentKind::Unknown(other.to_string()),
        }
    }
}

/// A vertex as authored: normal already resolved from its face-side code,
/// UV not yet flipped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

/// An entity's mesh in its own local space.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocalMesh {
    pub vertices: Vec<LocalVertex>,
    pub triangles: Vec<[u32; 3]>,
    /// Distance every UV corner is pulled toward the quad centre.
    pub uv_inset: f32,
}

impl LocalMesh {
    /// Read every `VertexPositionNormalTextureInstance` and `Indices/Index`
    /// below `element`.
    pub fn from_element(element: &Element) -> Result<Self, ConvertError> {
        let vertices = element
            .descendants("VertexPositionNormalTextureInstance")
            .into_iter()
            .map(read_vertex)
            .collect::<Result<Vec<_>, _>>()?;

        let mut indices = Vec::new();
        for list in element.descendants("Indices") {
            for index in list.children_named("Index") {
                indices.push(index.parse_text::<u32>()?);
            }
        }

        if indices.len() % 3 != 0 {
            log::warn!(
                "<{}> has {} indices, dropping the trailing partial triangle",
                element.name,
                indices.len()
            );
        }

        let triangles = indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect();

        Ok(Self {
            vertices,
            triangles,
            uv_inset: 0.0,
        })
    }

    /// The unit quad every background plane is built from, wound
    /// top-left, top-right, bottom-right, bottom-left.
    pub fn unit_quad() -> Self {
        let corner = |x: f32, y: f32, u: f32, v: f32| LocalVertex {
            position: Vec3::new(x, y, 0.0),
            normal: Vec3::Z,
            uv: Vec2::new(u, v),
        };
        Self {
            vertices: vec![
                corner(-0.5, 0.5, 0.0, 0.0),
                corner(0.5, 0.5, 1.0, 0.0),
                corner(0.5, -0.5, 1.0, 1.0),
                corner(-0.5, -0.5, 0.0, 1.0),
            ],
            triangles: vec![[0, 1, 2], [2, 3, 0]],
            uv_inset: TEX_EPSILON,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}

fn read_vertex(node: &Element) -> Result<LocalVertex, ConvertError> {
    let position = node.vector3_at("Position")?;
    let side = node.require_child("Normal")?.parse_text::<i32>()?;
    let uv = node.vector2_at("TextureCoord")?;
    Ok(LocalVertex {
        position,
        normal: face_normal(side),
        uv,
    })
}

/// A standalone art object mesh.
#[derive(Debug, Clone)]
pub struct ArtObject {
    pub name: String,
    /// Bounding size; only standalone conversion centres on it.
    pub size: Option<Vec3>,
    pub mesh: LocalMesh,
}

impl ArtObject {
    pub fn from_element(root: &Element) -> Result<Self, ConvertError> {
        Ok(Self {
            name: root.require_attr("name")?.to_string(),
            size: root
                .path(&["Size", "Vector3"])
                .map(Element::vector3)
                .transpose()?,
            mesh: LocalMesh::from_element(root)?,
        })
    }
}

/// One palette entry of a trile set.
#[derive(Debug, Clone)]
pub struct Trile {
    pub name: String,
    pub atlas_offset: Vec2,
    pub mesh: LocalMesh,
}

impl Trile {
    pub fn from_element(node: &Element) -> Result<Self, ConvertError> {
        let mesh = match node.path(&["Geometry", "ShaderInstancedIndexedPrimitives"]) {
            Some(geometry) => LocalMesh::from_element(geometry)?,
            None => LocalMesh::default(),
        };
        let atlas_offset = match node.path(&["AtlasOffset", "Vector2"]) {
            Some(v) => v.vector2()?,
            None => Vec2::ZERO,
        };
        Ok(Self {
            name: node.require_attr("name")?.to_string(),
            atlas_offset,
            mesh,
        })
    }
}

/// A palette of triles keyed by string id, kept in source order.
#[derive(Debug, Clone, Default)]
pub struct TrileSet {
    pub name: String,
    entries: Vec<(String, Trile)>,
    by_key: HashMap<String, usize>,
}

impl TrileSet {
    pub fn from_element(root: &Element) -> Result<Self, ConvertError> {
        let mut set = TrileSet {
            name: root.require_attr("name")?.to_string(),
            ..Default::default()
        };
        for entry in root.path_all(&["Triles", "TrileEntry"]) {
            let key = entry.require_attr("key")?;
            let trile = Trile::from_element(entry.require_child("Trile")?)?;
            set.insert(key, trile);
        }
        Ok(set)
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a trile; a repeated key replaces the earlier entry in place.
    pub fn insert(&mut self, key: &str, trile: Trile) {
        match self.by_key.get(key) {
            Some(&i) => self.entries[i].1 = trile,
            None => {
                self.by_key.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), trile));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Trile> {
        self.by_key.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Trile)> {
        self.entries.iter().map(|(k, t)| (k.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrileInstance {
    pub trile_id: String,
    pub orientation: Orientation,
    pub position: Vec3,
}

impl TrileInstance {
    pub fn from_element(node: &Element) -> Result<Self, ConvertError> {
        let trile_id = node.require_attr("trileId")?.to_string();
        let position = node.vector3_at("Position")?;
        let orientation = if trile_id == EMPTY_TRILE_ID {
            // Empty cells are never placed, so their orientation is not checked.
            node.i32_attr("orientation")
                .ok()
                .and_then(|o| Orientation::from_index(o).ok())
                .unwrap_or_default()
        } else {
            Orientation::from_index(node.i32_attr("orientation")?)?
        };
        Ok(Self {
            trile_id,
            orientation,
            position,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.trile_id == EMPTY_TRILE_ID
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArtObjectInstance {
    pub name: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl ArtObjectInstance {
    pub fn from_element(node: &Element) -> Result<Self, ConvertError> {
        Ok(Self {
            name: node.require_attr("name")?.to_string(),
            position: node.vector3_at("Position")?,
            rotation: node.quaternion_at("Rotation")?,
            scale: node.vector3_at("Scale")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundPlane {
    pub texture_name: String,
    pub animated: bool,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub flags: PlaneFlags,
}

impl BackgroundPlane {
    pub fn from_element(node: &Element) -> Result<Self, ConvertError> {
        Ok(Self {
            texture_name: node.require_attr("textureName")?.to_string(),
            animated: node.bool_attr("animated"),
            position: node.vector3_at("Position")?,
            rotation: node.quaternion_at("Rotation")?,
            scale: node.vector3_at("Scale")?,
            flags: PlaneFlags {
                double_sided: node.bool_attr("doubleSided"),
                billboard: node.bool_attr("billboard"),
                light_map: node.bool_attr("lightMap"),
                pixelated_lightmap: node.bool_attr("pixelatedLightmap"),
                clamp_texture: node.bool_attr("clampTexture"),
            },
        })
    }
}

/// A level: trile, art object and background plane instances.
#[derive(Debug, Clone)]
pub struct Level {
    pub name: Option<String>,
    pub trile_set_name: String,
    pub size: Vec3,
    pub triles: Vec<TrileInstance>,
    pub art_objects: Vec<ArtObjectInstance>,
    pub planes: Vec<BackgroundPlane>,
}

impl Level {
    pub fn from_element(root: &Element) -> Result<Self, ConvertError> {
        let triles = root
            .path_all(&["Triles", "Entry", "TrileInstance"])
            .into_iter()
            .map(TrileInstance::from_element)
            .collect::<Result<Vec<_>, _>>()?;
        let art_objects = root
            .path_all(&["ArtObjects", "Entry", "ArtObjectInstance"])
            .into_iter()
            .map(ArtObjectInstance::from_element)
            .collect::<Result<Vec<_>, _>>()?;
        let planes = root
            .path_all(&["BackgroundPlanes", "Entry", "BackgroundPlane"])
            .into_iter()
            .map(BackgroundPlane::from_element)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: root.attr("name").map(str::to_string),
            trile_set_name: root.require_attr("trileSetName")?.to_string(),
            size: root.vector3_at("Size")?,
            triles,
            art_objects,
            planes,
        })
    }

    /// Offset that centres the level on the origin.
    pub fn centering(&self) -> Vec3 {
        -self.size / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Sprite sheet metadata of an animated background plane.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatedTexture {
    pub width: u32,
    pub height: u32,
    pub actual_width: u32,
    pub actual_height: u32,
    pub frames: Vec<FrameRect>,
}

impl AnimatedTexture {
    pub fn from_element(root: &Element) -> Result<Self, ConvertError> {
        let frames = root
            .path_all(&["Frames", "FramePC", "Rectangle"])
            .into_iter()
            .map(|r| -> Result<FrameRect, ConvertError> {
                Ok(FrameRect {
                    x: r.parse_attr("x")?,
                    y: r.parse_attr("y")?,
                    w: r.parse_attr("w")?,
                    h: r.parse_attr("h")?,
                })
            })
            .collect::<Result<Vec<_>, ConvertError>>()?;
        Ok(Self {
            width: root.parse_attr("width")?,
            height: root.parse_attr("height")?,
            actual_width: root.parse_attr("actualWidth")?,
            actual_height: root.parse_attr("actualHeight")?,
            frames,
        })
    }

    /// Size of one sprite frame in pixels.
    pub fn frame_size(&self) -> Vec2 {
        Vec2::new(self.actual_width as f32, self.actual_height as f32)
    }

    /// Ratio between the sheet size and one frame.
    pub fn scale_correction(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32) / self.frame_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_str;

    const TRILE_SET: &str = r#"<TrileSet name="Untitled">
  <Triles>
    <TrileEntry key="0">
      <Trile name="grass top">
        <AtlasOffset><Vector2 x="0.25" y="0.5" /></AtlasOffset>
        <Geometry><ShaderInstancedIndexedPrimitives>
          <Vertices>
            <VertexPositionNormalTextureInstance>
              <Position><Vector3 x="0" y="0" z="0" /></Position>
              <Normal>4</Normal>
              <TextureCoord><Vector2 x="0" y="0.25" /></TextureCoord>
            </VertexPositionNormalTextureInstance>
            <VertexPositionNormalTextureInstance>
              <Position><Vector3 x="1" y="0" z="0" /></Position>
              <Normal>9</Normal>
              <TextureCoord><Vector2 x="1" y="0" /></TextureCoord>
            </VertexPositionNormalTextureInstance>
            <VertexPositionNormalTextureInstance>
              <Position><Vector3 x="0" y="1" z="0" /></Position>
              <Normal>2</Normal>
              <TextureCoord><Vector2 x="0" y="1" /></TextureCoord>
            </VertexPositionNormalTextureInstance>
          </Vertices>
          <Indices><Index>0</Index><Index>1</Index><Index>2</Index><Index>0</Index></Indices>
        </ShaderInstancedIndexedPrimitives></Geometry>
      </Trile>
    </TrileEntry>
    <TrileEntry key="7"><Trile name="empty"><AtlasOffset><Vector2 x="0" y="0" /></AtlasOffset></Trile></TrileEntry>
  </Triles>
</TrileSet>"#;

    #[test]
    fn test_trile_set_from_element() {
        let set = TrileSet::from_element(&parse_str(TRILE_SET).unwrap()).unwrap();
        assert_eq!(set.name, "Untitled");
        assert_eq!(set.len(), 2);
        let keys: Vec<&str> = set.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["0", "7"]);

        let trile = set.get("0").unwrap();
        assert_eq!(trile.name, "grass top");
        assert_eq!(trile.atlas_offset, Vec2::new(0.25, 0.5));
        assert_eq!(trile.mesh.vertex_count(), 3);
        // The trailing lone index is dropped.
        assert_eq!(trile.mesh.triangles, vec![[0, 1, 2]]);
        assert_eq!(trile.mesh.vertices[0].normal, Vec3::Y);
        assert_eq!(trile.mesh.vertices[1].normal, Vec3::NEG_X);
        assert_eq!(trile.mesh.vertices[2].normal, Vec3::NEG_Z);
        assert_eq!(trile.mesh.vertices[0].uv, Vec2::new(0.0, 0.25));

        assert!(set.get("7").unwrap().mesh.vertices.is_empty());
        assert!(set.get("3").is_none());
    }

    #[test]
    fn test_art_object_from_element() {
        let xml = r#"<ArtObject name="Bell Tower">
  <Size><Vector3 x="2" y="4" z="2" /></Size>
  <Geometry><Vertices>
    <VertexPositionNormalTextureInstance>
      <Position><Vector3 x="0.5" y="1" z="0" /></Position>
      <Normal>5</Normal>
      <TextureCoord><Vector2 x="0.5" y="0.5" /></TextureCoord>
    </VertexPositionNormalTextureInstance>
  </Vertices><Indices /></Geometry>
</ArtObject>"#;
        let ao = ArtObject::from_element(&parse_str(xml).unwrap()).unwrap();
        assert_eq!(ao.name, "Bell Tower");
        assert_eq!(ao.size, Some(Vec3::new(2.0, 4.0, 2.0)));
        assert_eq!(ao.mesh.vertex_count(), 1);
        assert!(ao.mesh.triangles.is_empty());
        assert_eq!(ao.mesh.vertices[0].normal, Vec3::Z);
    }

    #[test]
    fn test_art_object_size_is_optional() {
        let xml = r#"<ArtObject name="Lamp"><Geometry><Vertices /><Indices /></Geometry></ArtObject>"#;
        let ao = ArtObject::from_element(&parse_str(xml).unwrap()).unwrap();
        assert_eq!(ao.size, None);
        assert_eq!(ao.mesh.vertex_count(), 0);

        let bad = r#"<ArtObject name="Lamp"><Size><Vector3 x="1" y="?" z="1" /></Size></ArtObject>"#;
        let err = ArtObject::from_element(&parse_str(bad).unwrap()).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidNumber { .. }));
    }

    #[test]
    fn test_malformed_vertex_is_fatal() {
        let xml = r#"<ArtObject name="x"><Size><Vector3 x="1" y="1" z="1" /></Size>
  <VertexPositionNormalTextureInstance>
    <Position><Vector3 x="abc" y="0" z="0" /></Position>
    <Normal>0</Normal>
    <TextureCoord><Vector2 x="0" y="0" /></TextureCoord>
  </VertexPositionNormalTextureInstance>
</ArtObject>"#;
        let err = ArtObject::from_element(&parse_str(xml).unwrap()).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidNumber { .. }));
    }

    #[test]
    fn test_unit_quad() {
        let quad = LocalMesh::unit_quad();
        assert_eq!(quad.vertex_count(), 4);
        assert_eq!(quad.triangles, vec![[0, 1, 2], [2, 3, 0]]);
        assert_eq!(quad.uv_inset, TEX_EPSILON);
        assert!(quad.vertices.iter().all(|v| v.normal == Vec3::Z));
    }

    #[test]
    fn test_level_from_element() {
        let xml = r#"<Level name="VILLAGE" trileSetName="Untitled">
  <Size><Vector3 x="4" y="2" z="6" /></Size>
  <Triles>
    <Entry><TrileInstance trileId="0" orientation="3"><Position><Vector3 x="1" y="0" z="0" /></Position></TrileInstance></Entry>
    <Entry><TrileInstance trileId="-1" orientation="255"><Position><Vector3 x="2" y="0" z="0" /></Position></TrileInstance></Entry>
  </Triles>
  <ArtObjects>
    <Entry><ArtObjectInstance name="Bell Tower">
      <Position><Vector3 x="1" y="2" z="3" /></Position>
      <Rotation><Quaternion x="0" y="0" z="0" w="1" /></Rotation>
      <Scale><Vector3 x="1" y="1" z="1" /></Scale>
    </ArtObjectInstance></Entry>
  </ArtObjects>
  <BackgroundPlanes>
    <Entry><BackgroundPlane textureName="Water Fall" animated="True" doubleSided="True" billboard="False" lightMap="True" pixelatedLightmap="False" clampTexture="True">
      <Position><Vector3 x="0" y="0" z="0" /></Position>
      <Rotation><Quaternion x="0" y="0" z="0" w="1" /></Rotation>
      <Scale><Vector3 x="1" y="1" z="1" /></Scale>
    </BackgroundPlane></Entry>
  </BackgroundPlanes>
</Level>"#;
        let level = Level::from_element(&parse_str(xml).unwrap()).unwrap();
        assert_eq!(level.name.as_deref(), Some("VILLAGE"));
        assert_eq!(level.centering(), Vec3::new(-2.0, -1.0, -3.0));
        assert_eq!(level.triles.len(), 2);
        assert_eq!(level.triles[0].orientation, Orientation::Right);
        assert!(!level.triles[0].is_empty());
        assert!(level.triles[1].is_empty());
        assert_eq!(level.art_objects[0].name, "Bell Tower");
        assert_eq!(level.art_objects[0].position, Vec3::new(1.0, 2.0, 3.0));

        let plane = &level.planes[0];
        assert!(plane.animated);
        assert_eq!(
            plane.flags,
            PlaneFlags {
                double_sided: true,
                billboard: false,
                light_map: true,
                pixelated_lightmap: false,
                clamp_texture: true,
            }
        );
    }

    #[test]
    fn test_bad_orientation_is_fatal() {
        let xml = r#"<TrileInstance trileId="4" orientation="5"><Position><Vector3 x="0" y="0" z="0" /></Position></TrileInstance>"#;
        let err = TrileInstance::from_element(&parse_str(xml).unwrap()).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidOrientation(5)));
    }

    #[test]
    fn test_animated_texture() {
        let xml = r#"<AnimatedTexturePC width="64" height="32" actualWidth="16" actualHeight="16">
  <Frames>
    <FramePC duration="100"><Rectangle x="0" y="0" w="16" h="16" /></FramePC>
    <FramePC duration="100"><Rectangle x="16" y="0" w="16" h="16" /></FramePC>
  </Frames>
</AnimatedTexturePC>"#;
        let anim = AnimatedTexture::from_element(&parse_str(xml).unwrap()).unwrap();
        assert_eq!(anim.frames.len(), 2);
        assert_eq!(anim.frames[1], FrameRect { x: 16, y: 0, w: 16, h: 16 });
        assert_eq!(anim.frame_size(), Vec2::new(16.0, 16.0));
        assert_eq!(anim.scale_correction(), Vec2::new(4.0, 2.0));
    }

    #[test]
    fn test_document_kind() {
        let kind = |xml: &str| DocumentKind::from_root(&parse_str(xml).unwrap());
        assert_eq!(kind("<ArtObject/>"), DocumentKind::ArtObject);
        assert_eq!(kind("<TrileSet/>"), DocumentKind::TrileSet);
        assert_eq!(kind("<Level/>"), DocumentKind::Level);
        assert_eq!(kind("<AnimatedTexturePC/>"), DocumentKind::AnimatedTexture);
        assert_eq!(kind("<Sky/>"), DocumentKind::Unknown("Sky".into()));
    }
}
