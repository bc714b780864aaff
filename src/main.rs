//! Chaintui — Chains-style fruit-linking puzzle game in the terminal.

mod app;
mod audio;
mod catalog;
mod chain;
mod game;
mod input;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};

/// Gap between tiles and outer board margin, in board pixels.
const TILE_GAP: i32 = 1;
const BOARD_MARGIN: i32 = 1;

/// Immutable game configuration, built once from CLI args and passed by
/// reference to the board/selector/scoreboard constructors.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Board side length in tiles.
    pub grid_size: usize,
    /// Number of fruit kinds in play (2..=6).
    pub kinds: usize,
    /// Tile square side in board pixels.
    pub tile_size: i32,
    /// Gap between neighbouring tiles in board pixels.
    pub tile_gap: i32,
    /// Outer board margin in board pixels.
    pub margin: i32,
    /// Pixels a falling tile drops per frame while settling.
    pub fall_speed: i32,
    /// A chain of n tiles scores (score_base * n)².
    pub score_base: u32,
    /// Tile-spawn RNG seed.
    pub seed: u32,
    pub mute: bool,
    pub no_animation: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let config = GameConfig {
        grid_size: usize::from(args.size.clamp(2, 26)),
        kinds: usize::from(args.kinds.clamp(2, 6)),
        tile_size: i32::from(args.tile_size.clamp(2, 16)),
        tile_gap: TILE_GAP,
        margin: BOARD_MARGIN,
        fall_speed: i32::from(args.fall_speed.clamp(1, 64)),
        score_base: args.score_base,
        seed: args.seed.unwrap_or_else(seed_from_clock),
        mute: args.mute,
        no_animation: args.no_animation,
    };
    let mut app = App::new(&args, config, theme)?;
    app.run()?;
    Ok(())
}

/// Sub-second clock noise; good enough to deal a different board per run.
fn seed_from_clock() -> u32 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ (d.as_secs() as u32))
        .unwrap_or(0x5EED_F00D)
}

/// Chains-style fruit-linking puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "chaintui",
    version,
    about = "Chains-style fruit-linking puzzle in the terminal. Drag through adjacent same-coloured fruits, release to clear the chain.",
    long_about = "Chaintui is a terminal puzzle game inspired by the classic Chains.\n\n\
        The board is a grid of coloured fruits. Hold the left mouse button and drag \
        through adjacent fruits of the same colour to build a chain; retrace your path \
        to back out one step. Release to clear the chain — a chain of n fruits scores \
        (base*n)^2 — and new fruits fall in from above.\n\n\
        CONTROLS:\n  Mouse drag  Build a chain   P  Pause   R  Restart\n  M           Sound on/off    Q / Esc    Quit\n\n\
        Use --theme to load a btop-style theme (e.g. onedark.theme), --seed for a \
        reproducible board, and --kinds to change how many fruit colours are in play."
)]
pub struct Args {
    /// Board side length in tiles. Clamped so the board fits the terminal.
    #[arg(short, long, default_value = "8", value_name = "N")]
    pub size: u16,

    /// Number of fruit kinds in play (2-6). More kinds means shorter chains.
    #[arg(short, long, default_value = "4", value_name = "N")]
    pub kinds: u16,

    /// Path to theme file (btop-style theme[key]="value"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Tile size in board pixels (one pixel is half a terminal row).
    #[arg(long, default_value = "6", value_name = "PX")]
    pub tile_size: u16,

    /// Fall speed in board pixels per frame while the board settles.
    #[arg(long, default_value = "2", value_name = "PX")]
    pub fall_speed: u16,

    /// Score base b: a chain of n fruits scores (b*n)^2.
    #[arg(long, default_value = "1", value_name = "B")]
    pub score_base: u32,

    /// Tile-spawn RNG seed for a reproducible board (random if not set).
    #[arg(long, value_name = "N")]
    pub seed: Option<u32>,

    /// Target frames per second.
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Start with the bell muted.
    #[arg(long)]
    pub mute: bool,

    /// Disable the clear flash animation.
    #[arg(long)]
    pub no_animation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
