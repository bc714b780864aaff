//! Tile catalog: the fixed set of fruit kinds tiles are spawned from.

use crate::theme::Theme;
use ratatui::style::Color;

/// Fruit names by kind index; the first four are the classic set.
pub const FRUIT_NAMES: [&str; 6] = ["apple", "kiwi", "grape", "banana", "plum", "mint"];

/// One spawnable tile kind: display name, colour, square size in board pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileDef {
    pub name: &'static str,
    pub color: Color,
    pub size: i32,
}

/// Immutable catalog built once at startup from the theme palette.
#[derive(Debug, Clone)]
pub struct TileCatalog {
    defs: Vec<TileDef>,
}

impl TileCatalog {
    /// Build a catalog of `kinds` fruit kinds (2..=6) coloured from the theme.
    pub fn from_theme(theme: &Theme, kinds: usize, tile_size: i32) -> Self {
        let kinds = kinds.clamp(2, FRUIT_NAMES.len());
        let defs = (0..kinds)
            .map(|i| TileDef {
                name: FRUIT_NAMES[i],
                color: theme.fruit_color(i as u8),
                size: tile_size,
            })
            .collect();
        Self { defs }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Definition for a kind index. Indices come from `spawn_kind` and stay in range.
    #[inline]
    pub fn def(&self, kind: u8) -> &TileDef {
        &self.defs[kind as usize % self.defs.len()]
    }

    pub fn defs(&self) -> &[TileDef] {
        &self.defs
    }

    /// Uniform random kind index.
    pub fn spawn_kind(&self, rng: &mut TileRng) -> u8 {
        debug_assert!(!self.is_empty());
        (rng.next_rand() as usize % self.defs.len()) as u8
    }
}

/// Small deterministic generator for tile spawning; seedable for reproducible boards.
#[derive(Debug, Clone)]
pub struct TileRng {
    state: u32,
}

impl TileRng {
    pub fn new(seed: u32) -> Self {
        Self {
            state: seed ^ 0x1234_5678,
        }
    }

    fn next_rand(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1103515245).wrapping_add(12345);
        self.state >> 16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_kind_in_range() {
        let theme = Theme::onedark_default();
        let catalog = TileCatalog::from_theme(&theme, 4, 6);
        let mut rng = TileRng::new(7);
        for _ in 0..200 {
            assert!((catalog.spawn_kind(&mut rng) as usize) < catalog.len());
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let theme = Theme::onedark_default();
        let catalog = TileCatalog::from_theme(&theme, 6, 6);
        let mut a = TileRng::new(42);
        let mut b = TileRng::new(42);
        let sa: Vec<u8> = (0..32).map(|_| catalog.spawn_kind(&mut a)).collect();
        let sb: Vec<u8> = (0..32).map(|_| catalog.spawn_kind(&mut b)).collect();
        assert_eq!(sa, sb);
    }

    #[test]
    fn test_kinds_clamped() {
        let theme = Theme::onedark_default();
        assert_eq!(TileCatalog::from_theme(&theme, 1, 6).len(), 2);
        assert_eq!(TileCatalog::from_theme(&theme, 99, 6).len(), 6);
    }

    #[test]
    fn test_catalog_colors_match_theme() {
        let theme = Theme::onedark_default();
        let catalog = TileCatalog::from_theme(&theme, 4, 6);
        for (i, def) in catalog.defs().iter().enumerate() {
            assert_eq!(def.color, theme.fruit_color(i as u8));
            assert_eq!(def.size, 6);
        }
    }
}
