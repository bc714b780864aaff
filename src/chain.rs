//! Chain selection: the player's drag path over the board.

use crate::game::{Board, Coord};

/// Outcome of feeding one pointer coordinate to the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainStep {
    /// The coordinate was appended to the chain.
    Extended,
    /// The last coordinate was popped (one-step backtrack).
    Retracted,
    /// No change (wrong colour, non-adjacent, duplicate, or empty cell).
    Ignored,
}

/// Ordered path of distinct grid coordinates. Invariants: consecutive
/// coordinates are 4-adjacent, and every tile on the path matches the colour
/// of the tile under the first coordinate. Colour checks are live board
/// lookups; selection is only active while the board is Idle, so the cells
/// underneath cannot change mid-drag.
#[derive(Debug, Clone, Default)]
pub struct ChainSelector {
    cells: Vec<Coord>,
}

impl ChainSelector {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        !self.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Coord] {
        &self.cells
    }

    /// Start a fresh chain at `coord`. Caller guarantees the board is Idle.
    pub fn begin(&mut self, coord: Coord) {
        self.cells.clear();
        self.cells.push(coord);
    }

    /// Grow toward `coord`, or backtrack one step when the player retraces.
    pub fn extend_or_retract(&mut self, coord: Coord, board: &Board) -> ChainStep {
        if self.cells.is_empty() {
            return ChainStep::Ignored;
        }
        if self.cells.len() > 1 && self.cells[self.cells.len() - 2] == coord {
            self.cells.pop();
            return ChainStep::Retracted;
        }
        let last = self.cells[self.cells.len() - 1];
        if !adjacent(last, coord) || self.cells.contains(&coord) {
            return ChainStep::Ignored;
        }
        let anchor = match board.tile_at(self.cells[0]) {
            Some(tile) => tile.color,
            None => return ChainStep::Ignored,
        };
        match board.tile_at(coord) {
            Some(tile) if tile.color == anchor => {
                self.cells.push(coord);
                ChainStep::Extended
            }
            _ => ChainStep::Ignored,
        }
    }

    /// End the drag. A chain of at least two tiles is handed to the caller
    /// for clearing; anything shorter is dropped. Either way the selector
    /// resets.
    pub fn finish(&mut self) -> Option<Vec<Coord>> {
        let chain = std::mem::take(&mut self.cells);
        if chain.len() > 1 { Some(chain) } else { None }
    }
}

/// 4-directional grid adjacency.
fn adjacent(a: Coord, b: Coord) -> bool {
    let dc = a.0.abs_diff(b.0);
    let dr = a.1.abs_diff(b.1);
    dc + dr == 1
}
