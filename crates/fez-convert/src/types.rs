use crate::error::ConvertError;
use glam::{Quat, Vec2, Vec3};
use std::f32::consts::{FRAC_PI_2, PI};
use std::path::{Path, PathBuf};

/// Configuration for a single conversion run (built by the CLI or tests).
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Source XML document (art object, trile set, level or sprite sheet).
    pub input: PathBuf,
    /// Directory receiving the generated files (default: the input's directory).
    pub output_dir: Option<PathBuf>,
    /// Content root holding `trile sets/`, `art objects/` and
    /// `background planes/` (default: the grandparent of the input).
    pub content_root: Option<PathBuf>,
}

impl ConvertConfig {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: None,
            content_root: None,
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_content_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.content_root = Some(dir.into());
        self
    }

    /// Resolved output directory.
    pub fn output_dir(&self) -> PathBuf {
        match &self.output_dir {
            Some(dir) => dir.clone(),
            None => parent_or_current(&self.input),
        }
    }

    /// Resolved content root. Levels live in `<root>/levels/<name>.xml`.
    pub fn content_root(&self) -> PathBuf {
        match &self.content_root {
            Some(dir) => dir.clone(),
            None => parent_or_current(&parent_or_current(&self.input)),
        }
    }

    /// File stem of the input document, used to name every output file.
    pub fn input_stem(&self) -> Result<String, ConvertError> {
        self.input
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                ConvertError::Validation(format!("Invalid input filename: {}", self.input.display()))
            })
    }
}

fn parent_or_current(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// One emitted vertex. UVs are stored already flipped (`v' = 1 - v`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

/// A triangle of 1-based global vertex indices, shared by the position,
/// texture and normal streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face(pub [u32; 3]);

/// One entity's converted mesh, ready for concatenation.
#[derive(Debug, Clone)]
pub struct MeshFragment {
    pub name: String,
    pub material: String,
    pub vertices: Vec<Vertex>,
    pub faces: Vec<Face>,
}

/// Spatial placement of an entity instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Discrete trile orientation: a yaw step about the vertical axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// 180°.
    Back = 0,
    /// −90°.
    Left = 1,
    /// 0°, the identity.
    #[default]
    Front = 2,
    /// +90°.
    Right = 3,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::Back,
        Orientation::Left,
        Orientation::Front,
        Orientation::Right,
    ];

    pub fn from_index(index: i32) -> Result<Self, ConvertError> {
        match index {
            0 => Ok(Orientation::Back),
            1 => Ok(Orientation::Left),
            2 => Ok(Orientation::Front),
            3 => Ok(Orientation::Right),
            other => Err(ConvertError::InvalidOrientation(other)),
        }
    }

    pub fn yaw(self) -> f32 {
        match self {
            Orientation::Back => PI,
            Orientation::Left => -FRAC_PI_2,
            Orientation::Front => 0.0,
            Orientation::Right => FRAC_PI_2,
        }
    }

    pub fn rotation(self) -> Quat {
        match self {
            Orientation::Front => Quat::IDENTITY,
            other => Quat::from_rotation_y(other.yaw()),
        }
    }
}

/// Rendering hints carried by background planes. None of them affect the
/// emitted geometry or materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaneFlags {
    pub double_sided: bool,
    pub billboard: bool,
    pub light_map: bool,
    pub pixelated_lightmap: bool,
    pub clamp_texture: bool,
}

/// What a conversion run produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionSummary {
    Mesh(MeshSummary),
    Sprites { frames_dir: PathBuf, frames: usize },
    /// The root element named no known document kind; nothing was written.
    Unrecognized { root: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshSummary {
    pub obj_path: PathBuf,
    pub mtl_path: PathBuf,
    pub fragments: usize,
    pub vertices: usize,
    pub faces: usize,
    pub materials: usize,
}
