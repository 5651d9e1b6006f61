use std::collections::HashSet;

use crate::error::{SpriteError, SpriteResult};

/// Layout of a sprite sheet: a grid of character groups, each holding one row
/// of frames per direction.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GridSpec {
    pub group_columns: u32,
    pub group_rows: u32,
    /// Frames per direction (columns inside one group).
    pub frame_columns: u32,
    /// One label per frame row inside a group, top to bottom.
    pub directions: Vec<String>,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            group_columns: 4,
            group_rows: 2,
            frame_columns: 3,
            directions: ["walk_down", "walk_left", "walk_right", "walk_up"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl GridSpec {
    pub fn new(
        group_columns: u32,
        group_rows: u32,
        frame_columns: u32,
        directions: impl IntoIterator<Item = impl Into<String>>,
    ) -> SpriteResult<Self> {
        let spec = Self {
            group_columns,
            group_rows,
            frame_columns,
            directions: directions.into_iter().map(Into::into).collect(),
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> SpriteResult<()> {
        if self.group_columns == 0 || self.group_rows == 0 {
            return Err(SpriteError::invalid_dimensions(
                "grid must have at least one group column and one group row",
            ));
        }
        if self.frame_columns == 0 {
            return Err(SpriteError::invalid_dimensions(
                "grid must have at least one frame per direction",
            ));
        }
        if self.directions.is_empty() {
            return Err(SpriteError::invalid_dimensions(
                "grid must name at least one direction",
            ));
        }

        let mut seen = HashSet::new();
        for label in &self.directions {
            if label.is_empty() || label.contains(['/', '\\']) || label == "." || label == ".." {
                return Err(SpriteError::invalid_dimensions(format!(
                    "direction label '{label}' is not usable as a file name prefix"
                )));
            }
            if !seen.insert(label.as_str()) {
                return Err(SpriteError::invalid_dimensions(format!(
                    "direction label '{label}' appears more than once"
                )));
            }
        }
        Ok(())
    }

    pub fn group_count(&self) -> u32 {
        self.group_columns * self.group_rows
    }

    /// Frame rows per group; always equal to the number of directions.
    pub fn frame_rows(&self) -> u32 {
        self.directions.len() as u32
    }
}

/// Position of a group in the sheet grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GroupCell {
    pub index: u32,
    pub row: u32,
    pub column: u32,
}

impl GroupCell {
    /// Inverse of [`group_cell`].
    pub fn linear_index(self, group_columns: u32) -> u32 {
        self.row * group_columns + self.column
    }
}

/// Maps a group index to its grid cell in row-major order: indices run left to
/// right across the first row, then continue on the next row.
pub fn group_cell(index: u32, group_columns: u32) -> GroupCell {
    GroupCell {
        index,
        row: index / group_columns,
        column: index % group_columns,
    }
}

/// Half-open pixel rectangle `[left, right) x [top, bottom)` in sheet coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FrameRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl FrameRect {
    pub fn width(self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    pub fn is_empty(self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn overlaps(self, other: FrameRect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameCell {
    /// Row inside the group, indexing `GridSpec::directions`.
    pub direction_index: u32,
    /// Column inside the group.
    pub frame_index: u32,
    pub rect: FrameRect,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupLayout {
    pub cell: GroupCell,
    pub bounds: FrameRect,
    /// Direction-major: every frame of `directions[0]`, then `directions[1]`, ...
    pub frames: Vec<FrameCell>,
}

impl GroupLayout {
    pub fn frames_for_direction(&self, direction_index: u32) -> impl Iterator<Item = &FrameCell> {
        self.frames
            .iter()
            .filter(move |f| f.direction_index == direction_index)
    }
}

/// Splits a `width x height` sheet into one [`GroupLayout`] per group, in
/// row-major group order.
///
/// Every edge is computed on its own from the real-valued group edges and then
/// rounded half-to-even, so neighbouring frames share their edge exactly and
/// the error per edge stays within half a pixel.
pub fn partition(width: u32, height: u32, spec: &GridSpec) -> SpriteResult<Vec<GroupLayout>> {
    if width == 0 || height == 0 {
        return Err(SpriteError::invalid_dimensions(format!(
            "sheet must be non-empty, got {width}x{height}"
        )));
    }
    spec.validate()?;

    let total_columns = u64::from(spec.group_columns) * u64::from(spec.frame_columns);
    let total_rows = u64::from(spec.group_rows) * u64::from(spec.frame_rows());
    if u64::from(width) < total_columns || u64::from(height) < total_rows {
        return Err(SpriteError::invalid_dimensions(format!(
            "sheet {width}x{height} is smaller than its {total_columns}x{total_rows} frame grid"
        )));
    }

    let frame_rows = spec.frame_rows();
    let mut groups = Vec::with_capacity(spec.group_count() as usize);

    for index in 0..spec.group_count() {
        let cell = group_cell(index, spec.group_columns);
        let x0 = split_point(0.0, f64::from(width), cell.column, spec.group_columns);
        let x1 = split_point(0.0, f64::from(width), cell.column + 1, spec.group_columns);
        let y0 = split_point(0.0, f64::from(height), cell.row, spec.group_rows);
        let y1 = split_point(0.0, f64::from(height), cell.row + 1, spec.group_rows);

        let mut frames = Vec::with_capacity((frame_rows * spec.frame_columns) as usize);
        for direction_index in 0..frame_rows {
            let top = split_point(y0, y1, direction_index, frame_rows);
            let bottom = split_point(y0, y1, direction_index + 1, frame_rows);
            for frame_index in 0..spec.frame_columns {
                let left = split_point(x0, x1, frame_index, spec.frame_columns);
                let right = split_point(x0, x1, frame_index + 1, spec.frame_columns);
                let rect = FrameRect {
                    left: to_pixel(left),
                    top: to_pixel(top),
                    right: to_pixel(right),
                    bottom: to_pixel(bottom),
                };
                if rect.is_empty() {
                    return Err(SpriteError::invalid_dimensions(format!(
                        "frame {frame_index} of direction {direction_index} in group {index} is empty"
                    )));
                }
                frames.push(FrameCell {
                    direction_index,
                    frame_index,
                    rect,
                });
            }
        }

        groups.push(GroupLayout {
            cell,
            bounds: FrameRect {
                left: to_pixel(x0),
                top: to_pixel(y0),
                right: to_pixel(x1),
                bottom: to_pixel(y1),
            },
            frames,
        });
    }

    Ok(groups)
}

// The last point is `end` itself so outer frame edges land exactly on the group edge.
fn split_point(start: f64, end: f64, i: u32, n: u32) -> f64 {
    if i == n {
        return end;
    }
    start + (end - start) * f64::from(i) / f64::from(n)
}

fn to_pixel(v: f64) -> u32 {
    v.round_ties_even() as u32
}
