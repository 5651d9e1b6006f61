use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use crate::error::{SpriteError, SpriteResult};

pub const DESCRIPTOR_FILE_NAME: &str = "info.json";

/// Per-character descriptor written next to the extracted frames.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CharacterRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub character_id: String,
    #[serde(default)]
    pub directions: Vec<String>,
    #[serde(default)]
    pub frames_per_direction: u32,
    /// Direction label -> frame file names, in frame order.
    #[serde(default)]
    pub frames: BTreeMap<String, Vec<String>>,
}

impl CharacterRecord {
    pub fn new(
        character_id: impl Into<String>,
        directions: &[String],
        frames_per_direction: u32,
        frames: BTreeMap<String, Vec<String>>,
    ) -> Self {
        Self {
            character_id: character_id.into(),
            directions: directions.to_vec(),
            frames_per_direction,
            frames,
        }
    }

    /// Frame file names in preview order: direction order, then frame order.
    pub fn ordered_frame_files(&self) -> impl Iterator<Item = &str> {
        self.directions
            .iter()
            .filter_map(|d| self.frames.get(d))
            .flat_map(|names| names.iter().map(String::as_str))
    }

    pub fn to_json_pretty(&self) -> SpriteResult<String> {
        let mut out = serde_json::to_string_pretty(self)
            .map_err(|e| SpriteError::serde(format!("descriptor '{}': {e}", self.character_id)))?;
        out.push('\n');
        Ok(out)
    }
}

fn null_as_empty<'de, D>(de: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let id: Option<String> = serde::Deserialize::deserialize(de)?;
    Ok(id.unwrap_or_default())
}

/// A descriptor exactly as found on disk: any JSON object, unknown fields and
/// all. Only [`StoredDescriptor::to_record`] imposes the record schema.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct StoredDescriptor(pub serde_json::Map<String, serde_json::Value>);

impl StoredDescriptor {
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// The stored `character_id`, if it is a non-empty string.
    pub fn character_id(&self) -> Option<&str> {
        self.get("character_id")
            .and_then(serde_json::Value::as_str)
            .filter(|id| !id.is_empty())
    }

    pub fn to_record(&self) -> SpriteResult<CharacterRecord> {
        serde_json::from_value(serde_json::Value::Object(self.0.clone())).map_err(|e| {
            SpriteError::serde(format!("descriptor does not fit the record schema: {e}"))
        })
    }
}

impl From<&CharacterRecord> for StoredDescriptor {
    fn from(record: &CharacterRecord) -> Self {
        match serde_json::to_value(record) {
            Ok(serde_json::Value::Object(map)) => Self(map),
            _ => Self::default(),
        }
    }
}

/// Result of looking for a descriptor in a character directory.
#[derive(Debug)]
pub enum DescriptorLoad {
    Absent,
    Malformed(SpriteError),
    Valid(StoredDescriptor),
}

/// Serializes `record` into `dir/info.json`, replacing any previous descriptor.
pub fn write_descriptor(dir: &Path, record: &CharacterRecord) -> SpriteResult<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| SpriteError::io(dir, e))?;
    let path = dir.join(DESCRIPTOR_FILE_NAME);
    std::fs::write(&path, record.to_json_pretty()?).map_err(|e| SpriteError::io(&path, e))?;
    tracing::debug!(path = %path.display(), id = %record.character_id, "wrote descriptor");
    Ok(path)
}

/// Reads `dir/info.json`. A missing file is [`DescriptorLoad::Absent`]; an
/// unreadable file, invalid JSON or a non-object document is
/// [`DescriptorLoad::Malformed`]. Field types are not checked here.
pub fn read_descriptor(dir: &Path) -> DescriptorLoad {
    let path = dir.join(DESCRIPTOR_FILE_NAME);
    if !path.is_file() {
        return DescriptorLoad::Absent;
    }

    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => return DescriptorLoad::Malformed(SpriteError::io(&path, e)),
    };

    match serde_json::from_slice::<StoredDescriptor>(&bytes) {
        Ok(stored) => DescriptorLoad::Valid(stored),
        Err(e) => {
            DescriptorLoad::Malformed(SpriteError::malformed_descriptor(&path, e.to_string()))
        }
    }
}
