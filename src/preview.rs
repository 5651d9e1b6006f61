use std::{
    fs::File,
    io::{BufWriter, Write as _},
    path::{Path, PathBuf},
};

use crate::{
    error::{SpriteError, SpriteResult},
    extract::ensure_parent_dir,
};

pub const PREVIEW_FILE_NAME: &str = "preview.gif";

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PreviewSpec {
    pub frame_duration_ms: u32,
    /// 0 loops forever.
    pub loop_count: u16,
    /// NeuQuant speed, 1 (best) to 30 (fastest).
    pub quantize_speed: i32,
}

impl Default for PreviewSpec {
    fn default() -> Self {
        Self {
            frame_duration_ms: 200,
            loop_count: 0,
            quantize_speed: 10,
        }
    }
}

impl PreviewSpec {
    pub fn validate(&self) -> SpriteResult<()> {
        if self.frame_duration_ms < 10 {
            return Err(SpriteError::invalid_dimensions(
                "preview frame duration must be at least 10ms (one GIF delay unit)",
            ));
        }
        if !(1..=30).contains(&self.quantize_speed) {
            return Err(SpriteError::invalid_dimensions(
                "preview quantize speed must be within 1..=30",
            ));
        }
        Ok(())
    }

    /// GIF delays are stored in centiseconds; rounds to the nearest one.
    pub fn delay_cs(&self) -> u16 {
        (self.frame_duration_ms.saturating_add(5) / 10).min(u32::from(u16::MAX)) as u16
    }

    fn repeat(&self) -> gif::Repeat {
        match self.loop_count {
            0 => gif::Repeat::Infinite,
            n => gif::Repeat::Finite(n),
        }
    }
}

/// Encodes the already-written frames at `frame_paths`, in the given order,
/// into one looping GIF at `out_path`.
///
/// Returns `Ok(None)` without touching the filesystem when there are no frames.
/// Every frame is disposed to background before the next one is drawn, so
/// transparent pixels never show the previous pose.
pub fn assemble_preview(
    frame_paths: &[PathBuf],
    out_path: &Path,
    spec: &PreviewSpec,
) -> SpriteResult<Option<PathBuf>> {
    if frame_paths.is_empty() {
        tracing::debug!(out = %out_path.display(), "no frames, skipping preview");
        return Ok(None);
    }
    spec.validate()?;

    let mut frames = Vec::with_capacity(frame_paths.len());
    for path in frame_paths {
        let img = image::open(path)
            .map_err(|e| SpriteError::image(path, e))?
            .into_rgba8();
        frames.push(img);
    }

    let canvas_w = frames.iter().map(|f| f.width()).max().unwrap_or(0);
    let canvas_h = frames.iter().map(|f| f.height()).max().unwrap_or(0);
    let (canvas_w, canvas_h) = gif_dims(canvas_w, canvas_h)?;

    ensure_parent_dir(out_path)?;
    let file = File::create(out_path).map_err(|e| SpriteError::io(out_path, e))?;
    let mut encoder = gif::Encoder::new(BufWriter::new(file), canvas_w, canvas_h, &[])
        .map_err(|e| SpriteError::encode(format!("failed to start GIF: {e}")))?;
    encoder
        .set_repeat(spec.repeat())
        .map_err(|e| SpriteError::encode(format!("failed to set GIF repeat: {e}")))?;

    for (i, img) in frames.into_iter().enumerate() {
        let (w, h) = gif_dims(img.width(), img.height())?;
        let mut rgba = img.into_raw();
        let mut frame = gif::Frame::from_rgba_speed(w, h, &mut rgba, spec.quantize_speed);
        frame.delay = spec.delay_cs();
        frame.dispose = gif::DisposalMethod::Background;
        encoder
            .write_frame(&frame)
            .map_err(|e| SpriteError::encode(format!("failed to encode GIF frame {i}: {e}")))?;
    }

    let mut writer = encoder
        .into_inner()
        .map_err(|e| SpriteError::io(out_path, e))?;
    writer.flush().map_err(|e| SpriteError::io(out_path, e))?;

    tracing::debug!(
        out = %out_path.display(),
        frames = frame_paths.len(),
        delay_cs = spec.delay_cs(),
        "wrote preview"
    );
    Ok(Some(out_path.to_path_buf()))
}

fn gif_dims(w: u32, h: u32) -> SpriteResult<(u16, u16)> {
    match (u16::try_from(w), u16::try_from(h)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(SpriteError::invalid_dimensions(format!(
            "{w}x{h} exceeds the GIF frame size limit"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "spritecut_{name}_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ))
    }

    fn write_frames(dir: &Path, sizes: &[(u32, u32)]) -> Vec<PathBuf> {
        std::fs::create_dir_all(dir).unwrap();
        sizes
            .iter()
            .enumerate()
            .map(|(i, &(w, h))| {
                let p = dir.join(format!("walk_down_{i}.png"));
                let shade = (i as u8).wrapping_mul(60);
                image::RgbaImage::from_fn(w, h, |x, _| {
                    if x == 0 {
                        image::Rgba([0, 0, 0, 0])
                    } else {
                        image::Rgba([shade, 255 - shade, 40, 255])
                    }
                })
                .save(&p)
                .unwrap();
                p
            })
            .collect()
    }

    fn decode(path: &Path) -> (gif::Decoder<File>, Vec<(u16, gif::DisposalMethod, u16, u16)>) {
        let mut opts = gif::DecodeOptions::new();
        opts.set_color_output(gif::ColorOutput::RGBA);
        let mut decoder = opts.read_info(File::open(path).unwrap()).unwrap();
        let mut frames = Vec::new();
        while let Some(frame) = decoder.read_next_frame().unwrap() {
            frames.push((frame.delay, frame.dispose, frame.width, frame.height));
        }
        (decoder, frames)
    }

    #[test]
    fn empty_frame_list_writes_nothing() {
        let tmp = temp_dir("preview_empty");
        let out = tmp.join(PREVIEW_FILE_NAME);
        let got = assemble_preview(&[], &out, &PreviewSpec::default()).unwrap();
        assert!(got.is_none());
        assert!(!out.exists());
        assert!(!tmp.exists());
    }

    #[test]
    fn preview_has_delay_loop_and_background_disposal() {
        let tmp = temp_dir("preview_basic");
        let frames = write_frames(&tmp, &[(6, 5), (6, 5), (6, 5)]);
        let out = tmp.join(PREVIEW_FILE_NAME);

        let got = assemble_preview(&frames, &out, &PreviewSpec::default()).unwrap();
        assert_eq!(got.as_deref(), Some(out.as_path()));

        let (decoder, decoded) = decode(&out);
        assert_eq!((decoder.width(), decoder.height()), (6, 5));
        assert_eq!(decoder.repeat(), gif::Repeat::Infinite);
        assert_eq!(decoded.len(), 3);
        for (delay, dispose, w, h) in decoded {
            assert_eq!(delay, 20);
            assert_eq!(dispose, gif::DisposalMethod::Background);
            assert_eq!((w, h), (6, 5));
        }

        std::fs::remove_dir_all(&tmp).ok();
    }

    #[test]
    fn uneven_frames_fit_a_canvas_of_the_largest() {
        let tmp = temp_dir("preview_uneven");
        let frames = write_frames(&tmp, &[(4, 3), (5, 3), (4, 4)]);
        let out = tmp.join(PREVIEW_FILE_NAME);
        assemble_preview(&frames, &out, &PreviewSpec::default()).unwrap();

        let (decoder, decoded) = decode(&out);
        assert_eq!((decoder.width(), decoder.height()), (5, 4));
        assert_eq!(decoded[1].2, 5);

        std::fs::remove_dir_all(&tmp).ok();
    }

    #[test]
    fn finite_loop_and_custom_duration() {
        let tmp = temp_dir("preview_finite");
        let frames = write_frames(&tmp, &[(3, 3)]);
        let out = tmp.join(PREVIEW_FILE_NAME);
        let spec = PreviewSpec {
            frame_duration_ms: 120,
            loop_count: 2,
            ..PreviewSpec::default()
        };
        assemble_preview(&frames, &out, &spec).unwrap();

        let (decoder, decoded) = decode(&out);
        assert_eq!(decoder.repeat(), gif::Repeat::Finite(2));
        assert_eq!(decoded[0].0, 12);

        std::fs::remove_dir_all(&tmp).ok();
    }

    #[test]
    fn missing_frame_file_is_an_error() {
        let tmp = temp_dir("preview_missing");
        let out = tmp.join(PREVIEW_FILE_NAME);
        let err = assemble_preview(&[tmp.join("nope.png")], &out, &PreviewSpec::default())
            .unwrap_err();
        assert!(matches!(err, SpriteError::Image { .. }));
    }

    #[test]
    fn spec_validation() {
        assert!(PreviewSpec::default().validate().is_ok());
        assert_eq!(PreviewSpec::default().delay_cs(), 20);
        let too_fast = PreviewSpec {
            frame_duration_ms: 5,
            ..PreviewSpec::default()
        };
        assert!(too_fast.validate().is_err());
    }

    #[test]
    fn delay_rounds_to_nearest_centisecond() {
        let delay = |frame_duration_ms| {
            PreviewSpec {
                frame_duration_ms,
                ..PreviewSpec::default()
            }
            .delay_cs()
        };
        assert_eq!(delay(14), 1);
        assert_eq!(delay(15), 2);
        assert_eq!(delay(199), 20);
        assert_eq!(delay(204), 20);
        assert_eq!(delay(u32::MAX), u16::MAX);
    }
}
