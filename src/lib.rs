//! Slices grid-based character sprite sheets into per-direction walk-cycle frames,
//! writes a looping GIF preview and a JSON descriptor per character, and aggregates
//! the descriptors into one character index.
//!
//! Per sheet: [`partition`] -> [`extract_frame`] -> [`assemble_preview`] ->
//! [`write_descriptor`], driven by [`process_sheet`]. [`rebuild_index`] only reads
//! what those steps left on disk.
#![forbid(unsafe_code)]

pub mod config;
pub mod descriptor;
pub mod error;
pub mod extract;
pub mod grid;
pub mod index;
pub mod pipeline;
pub mod preview;

pub use config::SlicerConfig;
pub use descriptor::{
    CharacterRecord, DESCRIPTOR_FILE_NAME, DescriptorLoad, StoredDescriptor, read_descriptor,
    write_descriptor,
};
pub use error::{SpriteError, SpriteResult};
pub use extract::{SpriteSheet, extract_frame, frame_file_name};
pub use grid::{FrameCell, FrameRect, GridSpec, GroupCell, GroupLayout, group_cell, partition};
pub use index::{CharacterIndex, INDEX_FILE_NAME, build_index, rebuild_index, write_index};
pub use pipeline::{
    BatchReport, CharacterOutput, SheetReport, character_id, discover_sheets, process_sheet,
    run_batch,
};
pub use preview::{PREVIEW_FILE_NAME, PreviewSpec, assemble_preview};
