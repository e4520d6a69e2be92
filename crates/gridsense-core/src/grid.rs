//! Read-only grid access used by rule evaluation.
//!
//! Grid storage belongs to the recognition collaborator. The matcher only
//! needs to read characters back out of it, which is what [`GridContext`]
//! expresses. [`TextGrid`] is a plain in-memory implementation and
//! [`NoGrid`] stands in when a component carries its own text.

use crate::{Bounds, Dimensions, Position};

/// Read access to the character grid a component was extracted from.
pub trait GridContext: Send + Sync {
    /// Grid dimensions.
    fn dimensions(&self) -> Dimensions;

    /// Character at a position, `None` when out of bounds.
    fn char_at(&self, pos: Position) -> Option<char>;

    /// Extract text from a region.
    ///
    /// Rows are joined with `\n` and trailing whitespace is trimmed per row.
    fn extract_text(&self, bounds: &Bounds) -> String {
        let mut lines = Vec::with_capacity(bounds.height as usize);
        for row in bounds.row..bounds.row.saturating_add(bounds.height) {
            let mut line = String::new();
            for col in bounds.col..bounds.col.saturating_add(bounds.width) {
                if let Some(ch) = self.char_at(Position::new(row, col)) {
                    line.push(ch);
                }
            }
            lines.push(line.trim_end().to_string());
        }
        lines.join("\n")
    }

    /// Concatenate the characters at the given cells, in order.
    fn text_of_cells(&self, cells: &[Position]) -> String {
        cells.iter().filter_map(|pos| self.char_at(*pos)).collect()
    }
}

/// Empty grid context.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGrid;

impl GridContext for NoGrid {
    fn dimensions(&self) -> Dimensions {
        Dimensions::new(0, 0)
    }

    fn char_at(&self, _pos: Position) -> Option<char> {
        None
    }
}

/// In-memory character grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextGrid {
    /// Cell storage (row-major order)
    cells: Vec<char>,
    /// Grid dimensions
    dimensions: Dimensions,
}

impl TextGrid {
    /// Create a new grid filled with spaces.
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            cells: vec![' '; dimensions.cell_count()],
            dimensions,
        }
    }

    /// Build a grid from text, one row per line.
    ///
    /// The grid is as wide as the longest line; shorter lines are padded
    /// with spaces. Lines beyond `u16::MAX` rows or columns are cut.
    pub fn from_text(text: &str) -> Self {
        let lines: Vec<Vec<char>> = text
            .lines()
            .take(u16::MAX as usize)
            .map(|line| line.chars().take(u16::MAX as usize).collect())
            .collect();
        let cols = lines.iter().map(Vec::len).max().unwrap_or(0) as u16;
        let mut grid = Self::new(Dimensions::new(lines.len() as u16, cols));
        for (row, line) in lines.iter().enumerate() {
            for (col, ch) in line.iter().enumerate() {
                grid.set(Position::new(row as u16, col as u16), *ch);
            }
        }
        grid
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if pos.row < self.dimensions.rows && pos.col < self.dimensions.cols {
            Some(pos.row as usize * self.dimensions.cols as usize + pos.col as usize)
        } else {
            None
        }
    }

    /// Set the character at a position.
    ///
    /// Returns false if the position is out of bounds.
    pub fn set(&mut self, pos: Position, ch: char) -> bool {
        match self.index(pos) {
            Some(idx) => {
                self.cells[idx] = ch;
                true
            }
            None => false,
        }
    }
}

impl GridContext for TextGrid {
    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn char_at(&self, pos: Position) -> Option<char> {
        self.index(pos).map(|idx| self.cells[idx])
    }
}
