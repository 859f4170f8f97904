//! Level assembly.
//!
//! A level is converted in three fixed phases: triles, art objects, then
//! background planes. All phases share one [`FragmentBuilder`], so the
//! fragments come out in exactly the order they must be written.

use crate::converter::{convert_art_object_instance, convert_background_plane, convert_trile};
use crate::document;
use crate::error::ConvertError;
use crate::fragment::FragmentBuilder;
use crate::identifier::{asset_stem, object_name};
use crate::obj_writer::MaterialLibrary;
use crate::scene::{AnimatedTexture, ArtObject, BackgroundPlane, Level, TrileSet};
use crate::sprites::image_size;
use crate::staging::AssetStager;
use crate::types::MeshFragment;
use glam::{Vec2, Vec3};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Locations of referenced documents and textures below the content root.
#[derive(Debug, Clone)]
pub struct ContentPaths {
    root: PathBuf,
}

impl ContentPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn trile_set_stem(name: &str) -> String {
        name.to_lowercase()
    }

    pub fn trile_set(&self, name: &str) -> PathBuf {
        self.root
            .join("trile sets")
            .join(format!("{}.xml", Self::trile_set_stem(name)))
    }

    pub fn trile_set_texture(&self, name: &str) -> PathBuf {
        self.trile_set(name).with_extension("png")
    }

    pub fn art_object(&self, name: &str) -> PathBuf {
        self.root
            .join("art objects")
            .join(format!("{}.xml", asset_stem(name)))
    }

    pub fn art_object_texture(&self, name: &str) -> PathBuf {
        self.art_object(name).with_extension("png")
    }

    /// `<stem>.ani.png` for animated planes, `<stem>.png` otherwise.
    pub fn plane_texture(&self, texture_name: &str, animated: bool) -> PathBuf {
        let suffix = if animated { ".ani.png" } else { ".png" };
        self.root
            .join("background planes")
            .join(format!("{}{}", asset_stem(texture_name), suffix))
    }

    pub fn plane_animation(&self, texture_name: &str) -> PathBuf {
        self.root
            .join("background planes")
            .join(format!("{}.xml", asset_stem(texture_name)))
    }
}

/// Everything produced for one level, in emission order.
#[derive(Debug, Default)]
pub struct LevelOutput {
    pub fragments: Vec<MeshFragment>,
    pub materials: MaterialLibrary,
    /// Instances dropped because a referenced document or id was missing.
    pub skipped: usize,
}

/// Convert a level against its already-loaded trile set.
pub fn assemble_level(
    level: &Level,
    trile_set: &TrileSet,
    paths: &ContentPaths,
    stager: &mut AssetStager,
) -> Result<LevelOutput, ConvertError> {
    let mut assembler = LevelAssembler {
        level,
        paths,
        stager,
        centering: level.centering(),
        builder: FragmentBuilder::new(),
        art_objects: HashMap::new(),
        output: LevelOutput::default(),
    };
    assembler.triles_phase(trile_set)?;
    assembler.art_objects_phase()?;
    assembler.planes_phase()?;
    Ok(assembler.output)
}

struct LevelAssembler<'a> {
    level: &'a Level,
    paths: &'a ContentPaths,
    stager: &'a mut AssetStager,
    centering: Vec3,
    builder: FragmentBuilder,
    /// Loaded art objects by instance name; `None` when the document is missing.
    art_objects: HashMap<String, Option<ArtObject>>,
    output: LevelOutput,
}

impl LevelAssembler<'_> {
    fn triles_phase(&mut self, trile_set: &TrileSet) -> Result<(), ConvertError> {
        let level = self.level;
        let set_name = &level.trile_set_name;
        let material = ContentPaths::trile_set_stem(set_name);
        self.output
            .materials
            .add(material.as_str(), format!("{}.png", material));
        self.stager.stage(&self.paths.trile_set_texture(set_name))?;

        let total = level.triles.len();
        log::info!("Triles: {} instances", total);
        for (i, instance) in level.triles.iter().enumerate() {
            log::debug!("{}/{} Triles", i + 1, total);
            if instance.is_empty() {
                continue;
            }
            let Some(trile) = trile_set.get(&instance.trile_id) else {
                log::warn!(
                    "Trile id {} not in trile set '{}', skipped",
                    instance.trile_id,
                    set_name
                );
                self.output.skipped += 1;
                continue;
            };
            let fragment =
                convert_trile(&mut self.builder, trile, instance, &material, self.centering)?;
            self.output.fragments.push(fragment);
        }
        Ok(())
    }

    fn art_objects_phase(&mut self) -> Result<(), ConvertError> {
        let level = self.level;
        let total = level.art_objects.len();
        log::info!("Art objects: {} instances", total);
        for (i, instance) in level.art_objects.iter().enumerate() {
            log::debug!("{}/{} Art objects: {}", i + 1, total, instance.name);
            if !self.art_objects.contains_key(&instance.name) {
                let loaded = self.load_art_object(&instance.name)?;
                self.art_objects.insert(instance.name.clone(), loaded);
            }
            let Some(Some(art)) = self.art_objects.get(&instance.name) else {
                self.output.skipped += 1;
                continue;
            };

            let fragment =
                convert_art_object_instance(&mut self.builder, art, instance, self.centering)?;
            self.output.materials.add(
                object_name(&art.name),
                format!("{}.png", asset_stem(&instance.name)),
            );
            self.output.fragments.push(fragment);
        }
        Ok(())
    }

    /// Load an art object document once and stage its texture. A missing
    /// document only drops the instances that reference it.
    fn load_art_object(&mut self, name: &str) -> Result<Option<ArtObject>, ConvertError> {
        let path = self.paths.art_object(name);
        let root = match document::load(&path) {
            Ok(root) => root,
            Err(ConvertError::MissingDocument { path }) => {
                log::warn!("Art object '{}' not found at {}, skipped", name, path.display());
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let art = ArtObject::from_element(&root)?;
        self.stager.stage(&self.paths.art_object_texture(name))?;
        Ok(Some(art))
    }

    fn planes_phase(&mut self) -> Result<(), ConvertError> {
        let level = self.level;
        let total = level.planes.len();
        log::info!("Background planes: {} instances", total);
        for (i, plane) in level.planes.iter().enumerate() {
            log::debug!("{}/{} Background planes: {}", i + 1, total, plane.texture_name);
            let Some(sprite_size) = self.sprite_size(plane)? else {
                self.output.skipped += 1;
                continue;
            };

            let fragment =
                convert_background_plane(&mut self.builder, plane, sprite_size, self.centering)?;
            let texture = self.paths.plane_texture(&plane.texture_name, plane.animated);
            let texture_file = texture
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.output
                .materials
                .add(fragment.material.as_str(), texture_file);
            self.stager.stage(&texture)?;
            self.output.fragments.push(fragment);
        }
        Ok(())
    }

    /// Pixel size of one sprite of `plane`, or `None` if the plane must be
    /// skipped because its metadata or image is unavailable.
    fn sprite_size(&self, plane: &BackgroundPlane) -> Result<Option<Vec2>, ConvertError> {
        if plane.animated {
            let path = self.paths.plane_animation(&plane.texture_name);
            let root = match document::load(&path) {
                Ok(root) => root,
                Err(ConvertError::MissingDocument { .. }) => {
                    log::warn!(
                        "Missing animation metadata for '{}' ({}), plane skipped",
                        plane.texture_name,
                        path.display()
                    );
                    return Ok(None);
                }
                Err(e) => return Err(e),
            };
            let anim = AnimatedTexture::from_element(&root)?;
            log::debug!(
                "  animated: frame {:?}, sheet correction {:?}",
                anim.frame_size(),
                anim.scale_correction()
            );
            Ok(Some(anim.frame_size()))
        } else {
            let path = self.paths.plane_texture(&plane.texture_name, false);
            match image_size(&path) {
                Ok(size) => Ok(Some(size)),
                Err(e) => {
                    log::warn!("{}, plane '{}' skipped", e, plane.texture_name);
                    Ok(None)
                }
            }
        }
    }
}
