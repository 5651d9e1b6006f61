use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::{
    error::{SpriteError, SpriteResult},
    grid::FrameRect,
};

/// A decoded sprite sheet, always held as straight-alpha RGBA8.
#[derive(Clone, Debug)]
pub struct SpriteSheet {
    pub path: PathBuf,
    pixels: RgbaImage,
}

impl SpriteSheet {
    pub fn open(path: impl AsRef<Path>) -> SpriteResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(SpriteError::missing_source(path));
        }

        let decoded = image::open(path).map_err(|e| SpriteError::image(path, e))?;
        tracing::debug!(
            path = %path.display(),
            color = ?decoded.color(),
            "decoded sprite sheet"
        );

        Ok(Self {
            path: path.to_path_buf(),
            pixels: decoded.into_rgba8(),
        })
    }

    pub fn from_rgba(path: impl Into<PathBuf>, pixels: RgbaImage) -> Self {
        Self {
            path: path.into(),
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// File stem used to namespace this sheet's character directories.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sheet".to_string())
    }

    pub fn crop(&self, rect: FrameRect) -> SpriteResult<RgbaImage> {
        if rect.is_empty() || rect.right > self.width() || rect.bottom > self.height() {
            return Err(SpriteError::invalid_dimensions(format!(
                "frame rect {rect:?} does not fit inside {}x{} sheet '{}'",
                self.width(),
                self.height(),
                self.path.display()
            )));
        }
        Ok(image::imageops::crop_imm(
            &self.pixels,
            rect.left,
            rect.top,
            rect.width(),
            rect.height(),
        )
        .to_image())
    }
}

pub fn ensure_parent_dir(path: &Path) -> SpriteResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SpriteError::io(parent, e))?;
    }
    Ok(())
}

/// Crops `rect` out of `sheet` and writes it as a PNG at `out_path`, replacing
/// any existing file.
pub fn extract_frame(
    sheet: &SpriteSheet,
    rect: FrameRect,
    out_path: &Path,
) -> SpriteResult<PathBuf> {
    let frame = sheet.crop(rect)?;
    ensure_parent_dir(out_path)?;
    frame
        .save_with_format(out_path, image::ImageFormat::Png)
        .map_err(|e| SpriteError::image(out_path, e))?;

    tracing::debug!(
        out = %out_path.display(),
        left = rect.left,
        top = rect.top,
        width = rect.width(),
        height = rect.height(),
        "wrote frame"
    );
    Ok(out_path.to_path_buf())
}

pub fn frame_file_name(direction: &str, frame_index: u32) -> String {
    format!("{direction}_{frame_index}.png")
}
