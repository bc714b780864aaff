//! Game state: board grid, tile gravity/refill, settling, score, events.

use crate::catalog::{TileCatalog, TileRng};
use crate::chain::{ChainSelector, ChainStep};
use crate::theme::Theme;
use ratatui::style::Color;

/// Grid coordinate as (col, row); row 0 is the top.
pub type Coord = (usize, usize);

/// One fruit tile. Owned by exactly one grid cell; moved (never copied)
/// between cells during gravity compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// Index into the catalog.
    pub kind: u8,
    pub color: Color,
    /// Square side in board pixels.
    pub size: i32,
    /// Current top-left position in board pixels. `y` animates during settling.
    pub x: i32,
    pub y: i32,
}

/// Notification for external collaborators (score, audio). Queued by the
/// board/selector and drained once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// A chain was cleared; `count` tiles were released.
    Cleared { count: usize },
    /// The selection grew or backtracked; `len` is the chain length after.
    Chained { len: usize },
}

/// N×N board of optional tiles. `cells[row][col]`, row 0 at the top.
///
/// Two states: Idle and Settling. `refill` enters Settling; `step_settle`
/// returns to Idle once every tile sits at its cell's canonical pixel
/// position.
#[derive(Debug, Clone)]
pub struct Board {
    n: usize,
    tile_size: i32,
    tile_gap: i32,
    margin: i32,
    fall_speed: i32,
    cells: Vec<Vec<Option<Tile>>>,
    settling: bool,
}

impl Board {
    /// Fresh fully-populated board with every tile at rest.
    pub fn new(config: &crate::GameConfig, catalog: &TileCatalog, rng: &mut TileRng) -> Self {
        let n = config.grid_size;
        let mut board = Self {
            n,
            tile_size: config.tile_size,
            tile_gap: config.tile_gap,
            margin: config.margin,
            fall_speed: config.fall_speed,
            cells: (0..n).map(|_| (0..n).map(|_| None).collect()).collect(),
            settling: false,
        };
        for row in 0..n {
            for col in 0..n {
                let kind = catalog.spawn_kind(rng);
                board.cells[row][col] = Some(board.make_tile(catalog, kind, col, row as i32));
            }
        }
        board
    }

    /// Grid side length.
    #[inline]
    pub fn size(&self) -> usize {
        self.n
    }

    /// Board side length in pixels, margin included.
    #[inline]
    pub fn pixel_span(&self) -> i32 {
        self.margin + self.stride() * self.n as i32
    }

    /// Tile square side in pixels.
    #[inline]
    pub fn tile_size(&self) -> i32 {
        self.tile_size
    }

    #[inline]
    pub fn is_settling(&self) -> bool {
        self.settling
    }

    #[inline]
    fn stride(&self) -> i32 {
        self.tile_size + self.tile_gap
    }

    /// Pixel origin of a cell index along either axis; virtual rows above the
    /// board are negative.
    #[inline]
    fn cell_px(&self, index: i32) -> i32 {
        self.margin + self.stride() * index
    }

    /// Top-left pixel of a cell.
    pub fn pixel_for_coordinate(&self, col: usize, row: usize) -> (i32, i32) {
        (self.cell_px(col as i32), self.cell_px(row as i32))
    }

    /// Cell under a pixel position, clamped to the grid in both axes.
    pub fn coordinate_for_pixel(&self, pos: (i32, i32)) -> Coord {
        let max = self.n as i32 - 1;
        let col = (pos.0 - self.margin).div_euclid(self.stride()).clamp(0, max);
        let row = (pos.1 - self.margin).div_euclid(self.stride()).clamp(0, max);
        (col as usize, row as usize)
    }

    #[inline]
    pub fn tile_at(&self, coord: Coord) -> Option<&Tile> {
        self.cells[coord.1][coord.0].as_ref()
    }

    /// All tiles with their grid coordinates, top row first.
    pub fn tiles(&self) -> impl Iterator<Item = (Coord, &Tile)> {
        self.cells.iter().enumerate().flat_map(|(row, line)| {
            line.iter()
                .enumerate()
                .filter_map(move |(col, cell)| cell.as_ref().map(|t| ((col, row), t)))
        })
    }

    fn make_tile(&self, catalog: &TileCatalog, kind: u8, col: usize, row: i32) -> Tile {
        let def = catalog.def(kind);
        Tile {
            kind,
            color: def.color,
            size: def.size,
            x: self.cell_px(col as i32),
            y: self.cell_px(row),
        }
    }

    /// Release every tile along the chain and queue a `Cleared` event with the
    /// chain length. Each coordinate must hold a tile; an empty coordinate is
    /// a caller bug (loud in debug builds, skipped in release).
    pub fn clear(&mut self, chain: &[Coord], events: &mut Vec<GameEvent>) {
        for &(col, row) in chain {
            let released = self.cells[row][col].take();
            debug_assert!(released.is_some(), "cleared empty cell ({col}, {row})");
        }
        events.push(GameEvent::Cleared { count: chain.len() });
    }

    /// Per column: compact surviving tiles toward the bottom (relative order
    /// kept, pixel positions untouched so they fall into place) and spawn one
    /// new tile per vacancy above the visible board, each successive spawn one
    /// row higher. Enters Settling.
    pub fn refill(&mut self, catalog: &TileCatalog, rng: &mut TileRng) {
        for col in 0..self.n {
            let mut survivors: Vec<Tile> = Vec::with_capacity(self.n);
            for row in 0..self.n {
                if let Some(tile) = self.cells[row][col].take() {
                    survivors.push(tile);
                }
            }
            let vacant = self.n - survivors.len();
            for row in 0..vacant {
                let kind = catalog.spawn_kind(rng);
                let spawn_row = row as i32 - vacant as i32;
                self.cells[row][col] = Some(self.make_tile(catalog, kind, col, spawn_row));
            }
            for (i, tile) in survivors.into_iter().enumerate() {
                self.cells[vacant + i][col] = Some(tile);
            }
        }
        self.settling = true;
    }

    /// One settling frame: every tile above its cell's canonical y falls by
    /// `fall_speed`, clamped so it never overshoots its slot. Leaves Settling
    /// once all tiles are aligned.
    pub fn step_settle(&mut self) {
        if !self.settling {
            return;
        }
        let mut aligned = true;
        for row in 0..self.n {
            let target_y = self.cell_px(row as i32);
            for col in 0..self.n {
                if let Some(tile) = self.cells[row][col].as_mut() {
                    if tile.y < target_y {
                        tile.y = (tile.y + self.fall_speed).min(target_y);
                    }
                    if tile.y != target_y {
                        aligned = false;
                    }
                }
            }
        }
        if aligned {
            self.settling = false;
        }
    }

    /// Build a board from a kind matrix (rows top to bottom), all tiles at rest.
    #[cfg(test)]
    pub fn from_kinds(
        config: &crate::GameConfig,
        catalog: &TileCatalog,
        rows: &[&[u8]],
    ) -> Self {
        let n = config.grid_size;
        assert_eq!(rows.len(), n);
        assert!(rows.iter().all(|r| r.len() == n));
        let mut board = Self {
            n,
            tile_size: config.tile_size,
            tile_gap: config.tile_gap,
            margin: config.margin,
            fall_speed: config.fall_speed,
            cells: (0..n).map(|_| (0..n).map(|_| None).collect()).collect(),
            settling: false,
        };
        for (row, kinds) in rows.iter().enumerate() {
            for (col, &kind) in kinds.iter().enumerate() {
                board.cells[row][col] = Some(board.make_tile(catalog, kind, col, row as i32));
            }
        }
        board
    }
}

/// Score and turn accumulation; mutated only via `Cleared` events.
#[derive(Debug, Clone)]
pub struct Scoreboard {
    pub score: u32,
    pub turns: u32,
    score_base: u32,
}

impl Scoreboard {
    pub fn new(score_base: u32) -> Self {
        Self {
            score: 0,
            turns: 0,
            score_base,
        }
    }

    /// Points a clear of `count` tiles is worth: `(score_base * count)²`.
    pub fn worth(&self, count: usize) -> u32 {
        let base = self.score_base.saturating_mul(count as u32);
        base.saturating_mul(base)
    }

    /// `score += (score_base * count)²`, one turn per clear.
    pub fn on_cleared(&mut self, count: usize) {
        self.score = self.score.saturating_add(self.worth(count));
        self.turns = self.turns.saturating_add(1);
    }
}

/// Whole-game state: board, selector, scoreboard, catalog, event queue.
/// Owned and mutated by the single loop thread only.
#[derive(Debug)]
pub struct GameState {
    pub theme: Theme,
    pub board: Board,
    pub selector: ChainSelector,
    pub scoreboard: Scoreboard,
    pub catalog: TileCatalog,
    rng: TileRng,
    events: Vec<GameEvent>,
    /// Pointer position in board pixels while a selection is active; the
    /// chain line is drawn out to it.
    pub pointer: Option<(i32, i32)>,
    /// Cells released by the most recent clear, kept for the clear flash.
    pub last_clear: Vec<Coord>,
}

impl GameState {
    pub fn new(theme: Theme, config: &crate::GameConfig) -> Self {
        let catalog = TileCatalog::from_theme(&theme, config.kinds, config.tile_size);
        let mut rng = TileRng::new(config.seed);
        let board = Board::new(config, &catalog, &mut rng);
        Self {
            theme,
            board,
            selector: ChainSelector::new(),
            scoreboard: Scoreboard::new(config.score_base),
            catalog,
            rng,
            events: Vec::new(),
            pointer: None,
            last_clear: Vec::new(),
        }
    }

    /// Start a selection at the cell under the pointer. Rejected while Settling.
    pub fn pointer_down(&mut self, px: i32, py: i32) {
        if self.board.is_settling() {
            return;
        }
        let coord = self.board.coordinate_for_pixel((px, py));
        self.selector.begin(coord);
        self.pointer = Some((px, py));
    }

    /// Grow or backtrack the selection toward the cell under the pointer.
    pub fn pointer_moved(&mut self, px: i32, py: i32) {
        if !self.selector.is_active() {
            return;
        }
        self.pointer = Some((px, py));
        let coord = self.board.coordinate_for_pixel((px, py));
        match self.selector.extend_or_retract(coord, &self.board) {
            ChainStep::Extended | ChainStep::Retracted => {
                self.events.push(GameEvent::Chained {
                    len: self.selector.len(),
                });
            }
            ChainStep::Ignored => {}
        }
    }

    /// Finish the selection: a chain longer than one tile is cleared and the
    /// board refilled. Rejected while Settling.
    pub fn pointer_up(&mut self) {
        if self.board.is_settling() {
            return;
        }
        self.pointer = None;
        if let Some(chain) = self.selector.finish() {
            self.board.clear(&chain, &mut self.events);
            self.board.refill(&self.catalog, &mut self.rng);
            self.last_clear = chain;
        }
    }

    /// Per-frame state advance: one settling step.
    pub fn tick(&mut self) {
        self.board.step_settle();
    }

    /// Drain the event queue (once per frame): `Cleared` feeds the scoreboard;
    /// the events are returned for the audio collaborator.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        let events = std::mem::take(&mut self.events);
        for event in &events {
            if let GameEvent::Cleared { count } = event {
                self.scoreboard.on_cleared(*count);
            }
        }
        events
    }

    /// Colour of the active chain (its first tile), if any.
    pub fn chain_color(&self) -> Option<Color> {
        self.selector
            .cells()
            .first()
            .and_then(|&coord| self.board.tile_at(coord))
            .map(|tile| tile.color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameConfig;

    fn test_config(grid_size: usize) -> GameConfig {
        GameConfig {
            grid_size,
            kinds: 4,
            tile_size: 6,
            tile_gap: 1,
            margin: 1,
            fall_speed: 2,
            score_base: 1,
            seed: 1,
            mute: true,
            no_animation: true,
        }
    }

    fn catalog(config: &GameConfig) -> TileCatalog {
        TileCatalog::from_theme(&Theme::onedark_default(), config.kinds, config.tile_size)
    }

    /// Drive settling to convergence; panics if it never converges.
    fn settle(board: &mut Board) {
        for _ in 0..10_000 {
            if !board.is_settling() {
                return;
            }
            board.step_settle();
        }
        panic!("board never settled");
    }

    #[test]
    fn test_pixel_coordinate_round_trip() {
        let config = test_config(8);
        let board = Board::new(&config, &catalog(&config), &mut TileRng::new(1));
        for row in 0..8 {
            for col in 0..8 {
                let pos = board.pixel_for_coordinate(col, row);
                assert_eq!(board.coordinate_for_pixel(pos), (col, row));
            }
        }
    }

    #[test]
    fn test_coordinate_clamped_both_axes() {
        let config = test_config(8);
        let board = Board::new(&config, &catalog(&config), &mut TileRng::new(1));
        assert_eq!(board.coordinate_for_pixel((-100, -100)), (0, 0));
        assert_eq!(board.coordinate_for_pixel((100_000, -5)), (7, 0));
        assert_eq!(board.coordinate_for_pixel((-5, 100_000)), (0, 7));
        assert_eq!(board.coordinate_for_pixel((100_000, 100_000)), (7, 7));
    }

    #[test]
    fn test_clear_releases_and_fires_event() {
        let config = test_config(4);
        let cat = catalog(&config);
        #[rustfmt::skip]
        let mut board = Board::from_kinds(&config, &cat, &[
            &[0, 1, 2, 3],
            &[1, 2, 3, 0],
            &[2, 3, 0, 1],
            &[3, 0, 1, 2],
        ]);
        let mut events = Vec::new();
        board.clear(&[(0, 0), (0, 1), (1, 1)], &mut events);
        assert_eq!(events, vec![GameEvent::Cleared { count: 3 }]);
        assert!(board.tile_at((0, 0)).is_none());
        assert!(board.tile_at((0, 1)).is_none());
        assert!(board.tile_at((1, 1)).is_none());
        assert!(board.tile_at((2, 2)).is_some());
    }

    #[test]
    fn test_refill_spawns_per_column_and_keeps_order() {
        let config = test_config(4);
        let cat = catalog(&config);
        #[rustfmt::skip]
        let mut board = Board::from_kinds(&config, &cat, &[
            &[0, 0, 0, 0],
            &[1, 0, 0, 0],
            &[2, 0, 0, 0],
            &[3, 0, 0, 0],
        ]);
        // Two holes in column 0: rows 1 and 2.
        let mut events = Vec::new();
        board.clear(&[(0, 1), (0, 2)], &mut events);
        board.refill(&cat, &mut TileRng::new(9));
        assert!(board.is_settling());
        // Survivors compact to the bottom in their original order.
        assert_eq!(board.tile_at((0, 2)).unwrap().kind, 0);
        assert_eq!(board.tile_at((0, 3)).unwrap().kind, 3);
        // Exactly two spawned tiles on top, parked above the visible board,
        // each successive spawn one row higher.
        let spawn_top = board.tile_at((0, 0)).unwrap();
        let spawn_bottom = board.tile_at((0, 1)).unwrap();
        let row0_y = board.pixel_for_coordinate(0, 0).1;
        assert!(spawn_bottom.y < row0_y);
        assert!(spawn_top.y < spawn_bottom.y);
        // Other columns untouched and already at rest.
        for row in 0..4 {
            for col in 1..4 {
                let tile = board.tile_at((col, row)).unwrap();
                assert_eq!(tile.y, board.pixel_for_coordinate(col, row).1);
            }
        }
    }

    #[test]
    fn test_settle_repopulates_every_cell_at_canonical_position() {
        let config = test_config(8);
        let cat = catalog(&config);
        let mut rng = TileRng::new(3);
        let mut board = Board::new(&config, &cat, &mut rng);
        let chain: Vec<Coord> = vec![(2, 7), (2, 6), (3, 6), (3, 5), (4, 5)];
        let mut events = Vec::new();
        board.clear(&chain, &mut events);
        board.refill(&cat, &mut rng);
        settle(&mut board);
        for row in 0..8 {
            for col in 0..8 {
                let tile = board.tile_at((col, row)).expect("cell left empty");
                assert_eq!(
                    (tile.x, tile.y),
                    board.pixel_for_coordinate(col, row),
                    "tile at ({col}, {row}) not at rest"
                );
            }
        }
    }

    #[test]
    fn test_refill_full_board_settles_immediately() {
        let config = test_config(4);
        let cat = catalog(&config);
        let mut rng = TileRng::new(5);
        let mut board = Board::new(&config, &cat, &mut rng);
        board.refill(&cat, &mut rng);
        assert!(board.is_settling());
        board.step_settle();
        assert!(!board.is_settling());
    }

    #[test]
    fn test_fall_clamps_to_slot() {
        let config = test_config(4);
        let cat = catalog(&config);
        #[rustfmt::skip]
        let mut board = Board::from_kinds(&config, &cat, &[
            &[0, 0, 0, 0],
            &[1, 0, 0, 0],
            &[2, 0, 0, 0],
            &[3, 0, 0, 0],
        ]);
        let mut events = Vec::new();
        board.clear(&[(0, 3)], &mut events);
        board.refill(&cat, &mut TileRng::new(9));
        // The old row-0 tile (kind 0) now owns row 1; it must fall one full
        // stride without ever passing its slot.
        let target = board.pixel_for_coordinate(0, 1).1;
        let mut prev = board.tile_at((0, 1)).unwrap().y;
        while board.is_settling() {
            board.step_settle();
            let y = board.tile_at((0, 1)).unwrap().y;
            assert!(y >= prev && y <= target);
            prev = y;
        }
        assert_eq!(board.tile_at((0, 1)).unwrap().kind, 0);
        assert_eq!(board.tile_at((0, 1)).unwrap().y, target);
    }

    #[test]
    fn test_scoreboard_squares_base_times_count() {
        let mut scoreboard = Scoreboard::new(1);
        scoreboard.on_cleared(3);
        assert_eq!(scoreboard.score, 9);
        assert_eq!(scoreboard.turns, 1);
        scoreboard.on_cleared(5);
        assert_eq!(scoreboard.score, 9 + 25);
        assert_eq!(scoreboard.turns, 2);
    }

    #[test]
    fn test_scoreboard_respects_base() {
        let mut scoreboard = Scoreboard::new(10);
        scoreboard.on_cleared(2);
        assert_eq!(scoreboard.score, 400);
    }

    #[test]
    fn test_release_clears_scores_and_refills() {
        let config = test_config(4);
        let theme = Theme::onedark_default();
        let mut state = GameState::new(theme, &config);
        // Deterministic layout: column 0 all apples, rest alternating.
        #[rustfmt::skip]
        let board = Board::from_kinds(&config, &state.catalog, &[
            &[0, 1, 2, 3],
            &[0, 2, 3, 1],
            &[0, 3, 1, 2],
            &[0, 1, 2, 3],
        ]);
        state.board = board;
        let (px, py) = state.board.pixel_for_coordinate(0, 0);
        state.pointer_down(px, py);
        let (px, py) = state.board.pixel_for_coordinate(0, 1);
        state.pointer_moved(px, py);
        let (px, py) = state.board.pixel_for_coordinate(0, 2);
        state.pointer_moved(px, py);
        state.pointer_up();

        assert!(state.board.is_settling());
        assert_eq!(state.last_clear, vec![(0, 0), (0, 1), (0, 2)]);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::Cleared { count: 3 }));
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, GameEvent::Chained { .. }))
                .count(),
            2
        );
        assert_eq!(state.scoreboard.score, 9);
        assert_eq!(state.scoreboard.turns, 1);
    }

    #[test]
    fn test_press_rejected_while_settling() {
        let config = test_config(4);
        let mut state = GameState::new(Theme::onedark_default(), &config);
        #[rustfmt::skip]
        let board = Board::from_kinds(&config, &state.catalog, &[
            &[0, 1, 2, 3],
            &[0, 2, 3, 1],
            &[0, 3, 1, 2],
            &[0, 1, 2, 3],
        ]);
        state.board = board;
        let (px, py) = state.board.pixel_for_coordinate(0, 0);
        state.pointer_down(px, py);
        let (mx, my) = state.board.pixel_for_coordinate(0, 1);
        state.pointer_moved(mx, my);
        state.pointer_up();
        assert!(state.board.is_settling());

        state.pointer_down(px, py);
        assert!(!state.selector.is_active());
    }

    #[test]
    fn test_single_tile_release_is_no_clear() {
        let config = test_config(4);
        let mut state = GameState::new(Theme::onedark_default(), &config);
        let (px, py) = state.board.pixel_for_coordinate(2, 2);
        state.pointer_down(px, py);
        state.pointer_up();
        assert!(!state.board.is_settling());
        assert!(state.drain_events().is_empty());
        assert_eq!(state.scoreboard.turns, 0);
    }
}
