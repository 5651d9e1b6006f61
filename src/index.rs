use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use crate::{
    descriptor::{DescriptorLoad, StoredDescriptor, read_descriptor},
    error::{SpriteError, SpriteResult},
};

pub const INDEX_FILE_NAME: &str = "characters_index.json";

/// Every character under an output root, keyed by character id. Descriptors
/// are kept as read, including fields this crate does not know about.
pub type CharacterIndex = BTreeMap<String, StoredDescriptor>;

/// Collects the descriptor of every immediate subdirectory of `root`.
///
/// Directories are visited in file-name order; a later directory wins when two
/// descriptors share an id. Entries without a non-empty string `character_id`
/// are keyed by their directory name. Symlinked directories are followed.
/// Directories without a descriptor, or with one that is not a JSON object,
/// are skipped. A missing `root` yields an empty index.
pub fn build_index(root: &Path) -> CharacterIndex {
    let mut index = CharacterIndex::new();
    if !root.is_dir() {
        return index;
    }

    let entries = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry");
                None
            }
        });

    for entry in entries {
        if !entry.file_type().is_dir() {
            continue;
        }
        let dir = entry.path();
        match read_descriptor(dir) {
            DescriptorLoad::Absent => {}
            DescriptorLoad::Malformed(err) => {
                tracing::warn!(dir = %dir.display(), error = %err, "skipping malformed descriptor");
            }
            DescriptorLoad::Valid(stored) => {
                let id = match stored.character_id() {
                    Some(id) => id.to_string(),
                    None => entry.file_name().to_string_lossy().into_owned(),
                };
                index.insert(id, stored);
            }
        }
    }

    index
}

/// Writes `index` to `root/characters_index.json`, creating `root` if needed.
pub fn write_index(root: &Path, index: &CharacterIndex) -> SpriteResult<PathBuf> {
    std::fs::create_dir_all(root).map_err(|e| SpriteError::io(root, e))?;
    let path = root.join(INDEX_FILE_NAME);

    let mut json = serde_json::to_string_pretty(index)
        .map_err(|e| SpriteError::serde(format!("character index: {e}")))?;
    json.push('\n');
    std::fs::write(&path, json).map_err(|e| SpriteError::io(&path, e))?;
    Ok(path)
}

/// Rebuilds the index for `root` from scratch and writes it.
pub fn rebuild_index(root: &Path) -> SpriteResult<(PathBuf, CharacterIndex)> {
    let index = build_index(root);
    let path = write_index(root, &index)?;
    tracing::info!(path = %path.display(), characters = index.len(), "wrote character index");
    Ok((path, index))
}
