use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use crate::{
    config::SlicerConfig,
    descriptor::{CharacterRecord, write_descriptor},
    error::{SpriteError, SpriteResult},
    extract::{SpriteSheet, extract_frame, frame_file_name},
    grid::{GroupLayout, partition},
    preview::{PREVIEW_FILE_NAME, assemble_preview},
};

/// Output of one character group.
#[derive(Clone, Debug)]
pub struct CharacterOutput {
    pub dir: PathBuf,
    pub record: CharacterRecord,
    pub frame_paths: Vec<PathBuf>,
    pub preview: Option<PathBuf>,
    pub descriptor: PathBuf,
}

#[derive(Clone, Debug)]
pub struct SheetReport {
    pub sheet: PathBuf,
    pub characters: Vec<CharacterOutput>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: Vec<SheetReport>,
    pub failed: Vec<(PathBuf, SpriteError)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn character_count(&self) -> usize {
        self.processed.iter().map(|s| s.characters.len()).sum()
    }
}

/// `{sheetStem}_character_{NN}`, NN being the 1-based group number.
pub fn character_id(sheet_stem: &str, group_index: u32) -> String {
    format!("{sheet_stem}_character_{:02}", group_index + 1)
}

/// Runs partition, extraction, preview and descriptor for every group of the
/// sheet at `sheet_path`, writing under `out_root`.
#[tracing::instrument(skip_all, fields(sheet = %sheet_path.display()))]
pub fn process_sheet(
    sheet_path: &Path,
    out_root: &Path,
    cfg: &SlicerConfig,
) -> SpriteResult<SheetReport> {
    cfg.validate()?;
    let sheet = SpriteSheet::open(sheet_path)?;
    let groups = partition(sheet.width(), sheet.height(), &cfg.grid)?;
    let stem = sheet.stem();

    let mut characters = Vec::with_capacity(groups.len());
    for group in &groups {
        let id = character_id(&stem, group.cell.index);
        let out = process_group(&sheet, group, &id, &out_root.join(&id), cfg)?;
        tracing::info!(
            id = %id,
            frames = out.frame_paths.len(),
            dir = %out.dir.display(),
            "wrote character"
        );
        characters.push(out);
    }

    Ok(SheetReport {
        sheet: sheet_path.to_path_buf(),
        characters,
    })
}

fn process_group(
    sheet: &SpriteSheet,
    group: &GroupLayout,
    id: &str,
    dir: &Path,
    cfg: &SlicerConfig,
) -> SpriteResult<CharacterOutput> {
    let directions = &cfg.grid.directions;
    let mut frames: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut frame_paths = Vec::with_capacity(group.frames.len());

    // group.frames is direction-major, which is also the preview order.
    for cell in &group.frames {
        let direction = &directions[cell.direction_index as usize];
        let name = frame_file_name(direction, cell.frame_index);
        frame_paths.push(extract_frame(sheet, cell.rect, &dir.join(&name))?);
        frames.entry(direction.clone()).or_default().push(name);
    }

    let preview = assemble_preview(&frame_paths, &dir.join(PREVIEW_FILE_NAME), &cfg.preview)?;
    let record = CharacterRecord::new(id, directions, cfg.grid.frame_columns, frames);
    let descriptor = write_descriptor(dir, &record)?;

    Ok(CharacterOutput {
        dir: dir.to_path_buf(),
        record,
        frame_paths,
        preview,
        descriptor,
    })
}

fn is_sheet_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"))
}

/// PNG files directly inside `assets_dir`, sorted by file name.
pub fn discover_sheets(assets_dir: &Path) -> SpriteResult<Vec<PathBuf>> {
    if !assets_dir.is_dir() {
        return Err(SpriteError::missing_source(assets_dir));
    }

    let mut sheets = Vec::new();
    for entry in WalkDir::new(assets_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry
            .map_err(|e| SpriteError::Other(anyhow::Error::new(e).context("scan assets dir")))?;
        if entry.file_type().is_file() && is_sheet_file(entry.path()) {
            sheets.push(entry.into_path());
        }
    }
    Ok(sheets)
}

/// Processes `sheets` in order. A failing sheet is logged and recorded without
/// stopping the remaining ones.
pub fn run_batch(sheets: &[PathBuf], out_root: &Path, cfg: &SlicerConfig) -> BatchReport {
    let mut report = BatchReport::default();
    for sheet in sheets {
        match process_sheet(sheet, out_root, cfg) {
            Ok(done) => report.processed.push(done),
            Err(err) => {
                tracing::warn!(sheet = %sheet.display(), error = %err, "sheet failed");
                report.failed.push((sheet.clone(), err));
            }
        }
    }
    report
}
