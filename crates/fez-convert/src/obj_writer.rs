use crate::error::ConvertError;
use crate::types::{Face, MeshFragment};
use std::collections::HashSet;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Shading preset shared by every material: unlit white diffuse, no specular.
const MATERIAL_PRESET: &str = "Ns 0.000000\n\
Ka 1.000000 1.000000 1.000000\n\
Kd 1.000000 1.000000 1.000000\n\
Ks 0.000000 0.000000 0.000000\n\
Ke 0.000000 0.000000 0.000000\n\
Ni 1.000000\n\
d 1.000000\n\
illum 2\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Material {
    pub name: String,
    /// Diffuse texture file name, relative to the material file.
    pub texture: String,
}

/// Materials in first-seen order, one per distinct name.
#[derive(Debug, Clone, Default)]
pub struct MaterialLibrary {
    materials: Vec<Material>,
    names: HashSet<String>,
}

impl MaterialLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a material unless one with the same name already exists.
    /// Returns `true` if it was added.
    pub fn add(&mut self, name: impl Into<String>, texture: impl Into<String>) -> bool {
        let name = name.into();
        if !self.names.insert(name.clone()) {
            return false;
        }
        self.materials.push(Material {
            name,
            texture: texture.into(),
        });
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.iter()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

/// Write fragments as OBJ text, in emission order.
pub fn write_obj<W: Write>(out: &mut W, fragments: &[MeshFragment]) -> std::io::Result<()> {
    for fragment in fragments {
        write_fragment(out, fragment)?;
    }
    Ok(())
}

/// One `o` block: positions, texture coordinates and normals as three
/// contiguous runs, then the faces.
pub fn write_fragment<W: Write>(out: &mut W, fragment: &MeshFragment) -> std::io::Result<()> {
    writeln!(out, "o {}", fragment.name)?;
    writeln!(out, "usemtl {}", fragment.material)?;
    writeln!(out)?;

    for v in &fragment.vertices {
        writeln!(out, "v {} {} {}", v.position.x, v.position.y, v.position.z)?;
    }
    writeln!(out)?;
    for v in &fragment.vertices {
        writeln!(out, "vt {} {}", v.uv.x, v.uv.y)?;
    }
    writeln!(out)?;
    for v in &fragment.vertices {
        writeln!(out, "vn {} {} {}", v.normal.x, v.normal.y, v.normal.z)?;
    }
    writeln!(out)?;
    for face in &fragment.faces {
        write_face(out, face)?;
    }
    writeln!(out)?;
    writeln!(out)
}

fn write_face<W: Write>(out: &mut W, face: &Face) -> std::io::Result<()> {
    let [a, b, c] = face.0;
    writeln!(out, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}")
}

pub fn write_mtl<W: Write>(out: &mut W, materials: &MaterialLibrary) -> std::io::Result<()> {
    for material in materials.iter() {
        writeln!(out, "newmtl {}", material.name)?;
        out.write_all(MATERIAL_PRESET.as_bytes())?;
        writeln!(out, "map_kd {}", material.texture)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Write the geometry and material files of one conversion run.
pub fn write_files(
    obj_path: &Path,
    mtl_path: &Path,
    fragments: &[MeshFragment],
    materials: &MaterialLibrary,
) -> Result<(), ConvertError> {
    if let Some(dir) = obj_path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }

    let mut obj = BufWriter::new(fs::File::create(obj_path)?);
    write_obj(&mut obj, fragments)?;
    obj.flush()?;

    let mut mtl = BufWriter::new(fs::File::create(mtl_path)?);
    write_mtl(&mut mtl, materials)?;
    mtl.flush()?;

    log::info!(
        "Wrote {} ({} objects) and {} ({} materials)",
        obj_path.display(),
        fragments.len(),
        mtl_path.display(),
        materials.len()
    );
    Ok(())
}
