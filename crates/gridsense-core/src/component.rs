//! Candidate UI regions handed over by the recognition collaborator.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{Bounds, Position};

/// A candidate UI region extracted from the grid.
///
/// Components are produced by flood-fill/contour extraction outside this
/// workspace and are only ever read by the matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Component {
    /// Unique component identifier
    pub id: String,
    /// Bounding box
    pub bounding_box: Bounds,
    /// Cells strictly inside the region
    #[serde(default)]
    pub interior_cells: Vec<Position>,
    /// Cells on the region's outline
    #[serde(default)]
    pub boundary_cells: Vec<Position>,
    /// Text recognized inside the region
    #[serde(default)]
    pub text_content: String,
}

impl Component {
    /// Create a component with no cells and no text.
    pub fn new(id: impl Into<String>, bounding_box: Bounds) -> Self {
        Self {
            id: id.into(),
            bounding_box,
            interior_cells: Vec::new(),
            boundary_cells: Vec::new(),
            text_content: String::new(),
        }
    }

    /// Single-row component whose bounds fit the given text exactly.
    pub fn from_text(id: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let width = text.chars().count().min(u16::MAX as usize) as u16;
        Self::new(id, Bounds::new(0, 0, width, 1)).with_text(text)
    }

    /// Set the text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = text.into();
        self
    }

    /// Set the boundary cells.
    pub fn with_boundary(mut self, cells: Vec<Position>) -> Self {
        self.boundary_cells = cells;
        self
    }

    /// Set the interior cells.
    pub fn with_interior(mut self, cells: Vec<Position>) -> Self {
        self.interior_cells = cells;
        self
    }

    /// Width of the bounding box in columns.
    pub fn width(&self) -> u16 {
        self.bounding_box.width
    }

    /// Height of the bounding box in rows.
    pub fn height(&self) -> u16 {
        self.bounding_box.height
    }
}
