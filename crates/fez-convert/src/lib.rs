/// Error types for scene conversion.
pub mod error;

/// Core type definitions: configuration, vertices, fragments, transforms.
pub mod types;

/// Vector and quaternion math.
pub mod math;

/// XML document tree and typed attribute readers.
pub mod document;

/// Typed views of art objects, trile sets, levels and sprite sheets.
pub mod scene;

/// Object, material and asset-file naming.
pub mod identifier;

/// Global vertex offset and fragment assembly.
pub mod fragment;

/// Per-entity conversion (trile, art object, background plane, trile set).
pub mod converter;

/// Three-phase level assembly.
pub mod level;

/// OBJ/MTL text output.
pub mod obj_writer;

/// Copying referenced textures next to the output.
pub mod staging;

/// Sprite sheet frame extraction and image size queries.
pub mod sprites;

pub use error::ConvertError;
pub use types::{ConversionSummary, ConvertConfig, MeshFragment, MeshSummary};

use converter::{convert_art_object_file, convert_trile_set};
use fragment::FragmentBuilder;
use level::{assemble_level, ContentPaths};
use obj_writer::{write_files, MaterialLibrary};
use scene::{AnimatedTexture, ArtObject, DocumentKind, Level, TrileSet};
use staging::AssetStager;
use std::path::Path;

/// Convert the document named by `config.input`, dispatching on its root
/// element, and write the outputs.
pub fn convert(config: &ConvertConfig) -> Result<ConversionSummary, ConvertError> {
    log::info!("Loading {}", config.input.display());
    let root = document::load(&config.input)?;

    match DocumentKind::from_root(&root) {
        DocumentKind::ArtObject => convert_art_object(config, &ArtObject::from_element(&root)?),
        DocumentKind::TrileSet => convert_trile_set_file(config, &TrileSet::from_element(&root)?),
        DocumentKind::Level => convert_level(config, &Level::from_element(&root)?),
        DocumentKind::AnimatedTexture => {
            extract_sprites(config, &AnimatedTexture::from_element(&root)?)
        }
        DocumentKind::Unknown(name) => {
            log::warn!("Unknown document kind <{}>, nothing converted", name);
            Ok(ConversionSummary::Unrecognized { root: name })
        }
    }
}

/// Convert a standalone art object into `<stem>.obj`/`<stem>.mtl`.
pub fn convert_art_object(
    config: &ConvertConfig,
    art: &ArtObject,
) -> Result<ConversionSummary, ConvertError> {
    log::info!("Converting ArtObject '{}'", art.name);
    let stem = config.input_stem()?;

    let mut builder = FragmentBuilder::new();
    let fragment = convert_art_object_file(&mut builder, art)?;

    let mut materials = MaterialLibrary::new();
    materials.add(fragment.material.as_str(), format!("{}.png", stem));

    write_mesh(&config.output_dir(), &stem, &[fragment], &materials)
}

/// Convert every trile of a set into one `<stem>.obj`/`<stem>.mtl` pair.
pub fn convert_trile_set_file(
    config: &ConvertConfig,
    set: &TrileSet,
) -> Result<ConversionSummary, ConvertError> {
    log::info!("Converting TrileSet '{}': {} triles", set.name, set.len());
    let stem = config.input_stem()?;

    let mut builder = FragmentBuilder::new();
    let fragments = convert_trile_set(&mut builder, set)?;

    let mut materials = MaterialLibrary::new();
    materials.add(set.name.as_str(), format!("{}.png", stem));

    write_mesh(&config.output_dir(), &stem, &fragments, &materials)
}

/// Convert a level into `<output>/<stem>/<stem>.obj`/`.mtl`, staging every
/// referenced texture into the same directory.
///
/// A missing trile set aborts the whole level.
pub fn convert_level(
    config: &ConvertConfig,
    level: &Level,
) -> Result<ConversionSummary, ConvertError> {
    let stem = config.input_stem()?;
    let paths = ContentPaths::new(config.content_root());
    log::info!(
        "Converting Level '{}' (trile set '{}', content root {})",
        level.name.as_deref().unwrap_or(&stem),
        level.trile_set_name,
        paths.root().display()
    );

    let trile_set_root = document::load(&paths.trile_set(&level.trile_set_name))?;
    let trile_set = TrileSet::from_element(&trile_set_root)?;

    let export_dir = config.output_dir().join(&stem);
    let mut stager = AssetStager::new(&export_dir);
    let output = assemble_level(level, &trile_set, &paths, &mut stager)?;
    if output.skipped > 0 {
        log::warn!("{} instances skipped", output.skipped);
    }

    write_mesh(&export_dir, &stem, &output.fragments, &output.materials)
}

/// Split an animated sprite sheet into one PNG per frame.
pub fn extract_sprites(
    config: &ConvertConfig,
    anim: &AnimatedTexture,
) -> Result<ConversionSummary, ConvertError> {
    let stem = config.input_stem()?;
    let sheet = config.input.with_file_name(format!("{}.ani.png", stem));
    let frames_dir = sprites::extract_frames(anim, &sheet, &config.output_dir(), &stem)?;
    Ok(ConversionSummary::Sprites {
        frames_dir,
        frames: anim.frames.len(),
    })
}

fn write_mesh(
    dir: &Path,
    stem: &str,
    fragments: &[MeshFragment],
    materials: &MaterialLibrary,
) -> Result<ConversionSummary, ConvertError> {
    let obj_path = dir.join(format!("{}.obj", stem));
    let mtl_path = dir.join(format!("{}.mtl", stem));
    write_files(&obj_path, &mtl_path, fragments, materials)?;

    Ok(ConversionSummary::Mesh(MeshSummary {
        obj_path,
        mtl_path,
        fragments: fragments.len(),
        vertices: fragments.iter().map(|f| f.vertices.len()).sum(),
        faces: fragments.iter().map(|f| f.faces.len()).sum(),
        materials: materials.len(),
    }))
}
