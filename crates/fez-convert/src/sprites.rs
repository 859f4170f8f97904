use crate::error::ConvertError;
use crate::scene::{AnimatedTexture, FrameRect};
use glam::Vec2;
use image::GenericImageView;
use std::fs;
use std::path::{Path, PathBuf};

/// Pixel dimensions of an image file, read from its header.
pub fn image_size(path: &Path) -> Result<Vec2, ConvertError> {
    let (width, height) = image::image_dimensions(path).map_err(|e| ConvertError::ImageDecode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(Vec2::new(width as f32, height as f32))
}

fn validate_frame(frame: &FrameRect, width: u32, height: u32) -> Result<(), ConvertError> {
    let fits = frame.w > 0
        && frame.h > 0
        && frame.x.checked_add(frame.w).is_some_and(|r| r <= width)
        && frame.y.checked_add(frame.h).is_some_and(|b| b <= height);
    if !fits {
        return Err(ConvertError::Validation(format!(
            "Frame {}×{} at ({}, {}) outside {}×{} sheet",
            frame.w, frame.h, frame.x, frame.y, width, height
        )));
    }
    Ok(())
}

/// Crop every frame of `anim` out of `sheet_path` into
/// `out_dir/<name>-frames/<name>-<i>.png`. Returns the frames directory.
pub fn extract_frames(
    anim: &AnimatedTexture,
    sheet_path: &Path,
    out_dir: &Path,
    name: &str,
) -> Result<PathBuf, ConvertError> {
    let sheet = image::open(sheet_path).map_err(|e| ConvertError::ImageDecode {
        path: sheet_path.to_path_buf(),
        message: e.to_string(),
    })?;
    let (width, height) = sheet.dimensions();
    log::info!(
        "Sprite sheet {}: {}×{}, {} frames",
        sheet_path.display(),
        width,
        height,
        anim.frames.len()
    );

    let frames_dir = out_dir.join(format!("{}-frames", name));
    fs::create_dir_all(&frames_dir)?;

    for (i, frame) in anim.frames.iter().enumerate() {
        validate_frame(frame, width, height)?;
        let sprite = sheet.crop_imm(frame.x, frame.y, frame.w, frame.h);
        let path = frames_dir.join(format!("{}-{}.png", name, i));
        sprite.save(&path).map_err(|e| ConvertError::ImageDecode {
            path: path.clone(),
            message: e.to_string(),
        })?;
        log::debug!("  frame {} -> {}", i, path.display());
    }

    Ok(frames_dir)
}
