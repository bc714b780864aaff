//! Layout and drawing: board, chain line, clear flash, sidebar, overlays.

use crate::app::{QuitOption, Screen};
use crate::game::{GameState, Tile};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

const SIDEBAR_WIDTH: u16 = 24;

/// Duration of the clear flash (TachyonFX fade over the released cells).
const CLEAR_FLASH_MS: u32 = 300;

/// Bordered board size in terminal cells for a board pixel span.
/// We use half-blocks (▀) to get 2 board pixels per terminal cell (vertically).
fn board_terminal_size(span: u16) -> (u16, u16) {
    (span + 2, span.div_ceil(2) + 2)
}

/// Largest grid side whose bordered board + sidebar fit the terminal.
/// Used so --size is clamped and the board always fits on screen.
pub fn max_grid_for_terminal(term_cols: u16, term_rows: u16, config: &crate::GameConfig) -> usize {
    let stride = (config.tile_size + config.tile_gap) as u32;
    let avail_w = u32::from(term_cols.saturating_sub(2 + SIDEBAR_WIDTH))
        .saturating_sub(config.margin as u32);
    let avail_h =
        (u32::from(term_rows.saturating_sub(2)) * 2).saturating_sub(config.margin as u32);
    (avail_w.min(avail_h) / stride) as usize
}

/// Centred board + sidebar areas; both draw and mouse mapping use this.
fn board_areas(area: Rect, state: &GameState) -> (Rect, Rect) {
    let span = state.board.pixel_span() as u16;
    let (bw, bh) = board_terminal_size(span);
    let total_w = bw + SIDEBAR_WIDTH;
    let x = area.x + area.width.saturating_sub(total_w) / 2;
    let y = area.y + area.height.saturating_sub(bh) / 2;
    let board = Rect {
        x,
        y,
        width: bw.min(area.width),
        height: bh.min(area.height),
    };
    let sidebar = Rect {
        x: board.x + board.width,
        y: board.y,
        width: SIDEBAR_WIDTH.min(area.width.saturating_sub(board.width)),
        height: board.height,
    };
    (board, sidebar)
}

/// Board interior (no border) in terminal cells. One cell is one pixel wide
/// and two pixels tall.
pub fn board_rect(area: Rect, state: &GameState) -> Rect {
    let (board, _) = board_areas(area, state);
    let span = state.board.pixel_span() as u16;
    Rect {
        x: board.x + 1,
        y: board.y + 1,
        width: span.min(board.width.saturating_sub(2)),
        height: span.div_ceil(2).min(board.height.saturating_sub(2)),
    }
}

/// Draw the current screen, with optional pause overlay and quit menu.
/// While `state.last_clear` is non-empty and animation is on, runs the
/// TachyonFX clear flash and updates `clear_effect` / `clear_effect_time`.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    state: &GameState,
    paused: bool,
    muted: bool,
    no_animation: bool,
    clear_effect: &mut Option<Effect>,
    clear_effect_time: &mut Option<Instant>,
    now: Instant,
    quit_selected: Option<QuitOption>,
) {
    let area = frame.area();
    draw_game(frame, state, area, muted);
    if !state.last_clear.is_empty() && !no_animation {
        apply_clear_flash(frame, state, area, clear_effect, clear_effect_time, now);
    }
    match screen {
        Screen::Playing => {
            if paused {
                draw_pause_overlay(frame, state, area);
            }
        }
        Screen::QuitMenu => {
            if let Some(opt) = quit_selected {
                draw_quit_menu(frame, state, opt);
            }
        }
    }
}

/// Create or update the clear flash and process it (fade the released cells
/// to the background while the refill falls through them).
fn apply_clear_flash(
    frame: &mut Frame,
    state: &GameState,
    area: Rect,
    clear_effect: &mut Option<Effect>,
    clear_effect_time: &mut Option<Instant>,
    now: Instant,
) {
    let rect = board_rect(area, state);
    let delta = clear_effect_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    let tfx_delta = TfxDuration::from_millis(delta_ms);
    *clear_effect_time = Some(now);

    if clear_effect.is_none() {
        let flash_set = cleared_buffer_positions(rect, state);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            flash_set.contains(&(pos.x, pos.y))
        }));
        let bg = state.theme.bg;
        let effect = fx::fade_to(bg, bg, (CLEAR_FLASH_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(rect);
        *clear_effect = Some(effect);
    }

    if let Some(effect) = clear_effect {
        frame.render_effect(effect, rect, tfx_delta);
    }
}

/// Buffer (x, y) positions covered by the just-cleared tiles.
fn cleared_buffer_positions(rect: Rect, state: &GameState) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    let size = state.board.tile_size();
    for &(col, row) in &state.last_clear {
        let (px, py) = state.board.pixel_for_coordinate(col, row);
        let x0 = rect.x + px as u16;
        let y0 = rect.y + (py / 2) as u16;
        let x1 = (x0 + size as u16).min(rect.x + rect.width);
        let y1 = (y0 + (((py + size) + 1).div_euclid(2) - py / 2) as u16).min(rect.y + rect.height);
        for bx in x0..x1 {
            for by in y0..y1 {
                set.insert((bx, by));
            }
        }
    }
    set
}

/// Draw game: board + sidebar; use full area and centre the board.
fn draw_game(frame: &mut Frame, state: &GameState, area: Rect, muted: bool) {
    let (board_area, sidebar_area) = board_areas(area, state);
    draw_board(frame, state, board_area);
    draw_sidebar(frame, state, sidebar_area, muted);
}

fn draw_board(frame: &mut Frame, state: &GameState, area: Rect) {
    let n = state.board.size();
    let title = format!(" Chaintui {n}×{n}  | Score: {} ", state.scoreboard.score);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(state.theme.div_line).bg(state.theme.bg))
        .title(Span::styled(title, state.theme.title));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let span = state.board.pixel_span() as usize;
    let mut pixels = vec![vec![state.theme.bg; span]; span];

    for (_, tile) in state.board.tiles() {
        paint_tile(&mut pixels, tile);
    }

    // Chain line through cell centres, out to the pointer, in the chain colour.
    if let Some(color) = state.chain_color() {
        let half = state.board.tile_size() / 2;
        let mut points: Vec<(i32, i32)> = state
            .selector
            .cells()
            .iter()
            .map(|&(col, row)| {
                let (px, py) = state.board.pixel_for_coordinate(col, row);
                (px + half, py + half)
            })
            .collect();
        if let Some(pointer) = state.pointer {
            points.push(pointer);
        }
        let thickness = (state.board.tile_size() / 2).max(1);
        for pair in points.windows(2) {
            draw_segment(&mut pixels, pair[0], pair[1], thickness, color);
        }
    }

    let buf = frame.buffer_mut();
    for y in (0..span).step_by(2) {
        for x in 0..span {
            let top = pixels[y][x];
            let bot = if y + 1 < span {
                pixels[y + 1][x]
            } else {
                state.theme.bg
            };
            let rx = inner.x + x as u16;
            let ry = inner.y + (y / 2) as u16;
            if rx < inner.x + inner.width && ry < inner.y + inner.height {
                buf[(rx, ry)]
                    .set_symbol("▀")
                    .set_style(Style::default().fg(top).bg(bot));
            }
        }
    }
}

/// Paint one tile square with a light bevel; rows above the board clip away.
fn paint_tile(pixels: &mut [Vec<Color>], tile: &Tile) {
    let span = pixels.len() as i32;
    for dy in 0..tile.size {
        let y = tile.y + dy;
        if y < 0 || y >= span {
            continue;
        }
        for dx in 0..tile.size {
            let x = tile.x + dx;
            if x < 0 || x >= span {
                continue;
            }
            let factor = if dy == 0 || dx == 0 {
                1.18
            } else if dy == tile.size - 1 || dx == tile.size - 1 {
                0.82
            } else {
                1.0
            };
            pixels[y as usize][x as usize] = scale_color(tile.color, factor);
        }
    }
}

/// Thick pixel segment between two points (chain links are axis-aligned; the
/// pointer tail can be diagonal).
fn draw_segment(
    pixels: &mut [Vec<Color>],
    from: (i32, i32),
    to: (i32, i32),
    thickness: i32,
    color: Color,
) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let steps = dx.abs().max(dy.abs()).max(1);
    for i in 0..=steps {
        let x = from.0 + dx * i / steps;
        let y = from.1 + dy * i / steps;
        stamp(pixels, x, y, thickness, color);
    }
}

/// Filled square centred on (cx, cy), clipped to the buffer.
fn stamp(pixels: &mut [Vec<Color>], cx: i32, cy: i32, thickness: i32, color: Color) {
    let span = pixels.len() as i32;
    let half = thickness / 2;
    for y in (cy - half)..(cy - half + thickness) {
        if y < 0 || y >= span {
            continue;
        }
        for x in (cx - half)..(cx - half + thickness) {
            if x < 0 || x >= span {
                continue;
            }
            pixels[y as usize][x as usize] = color;
        }
    }
}

/// Simple RGB scaling for the tile bevel.
fn scale_color(color: Color, factor: f32) -> Color {
    let (r, g, b) = match color {
        Color::Rgb(r, g, b) => (r, g, b),
        Color::Red => (255, 0, 0),
        Color::Green => (0, 255, 0),
        Color::Yellow => (255, 255, 0),
        Color::Blue => (0, 0, 255),
        Color::Magenta => (255, 0, 255),
        Color::Cyan => (0, 255, 255),
        Color::Gray => (128, 128, 128),
        Color::DarkGray => (64, 64, 64),
        Color::White => (255, 255, 255),
        _ => (128, 128, 128),
    };
    Color::Rgb(
        (r as f32 * factor).min(255.0) as u8,
        (g as f32 * factor).min(255.0) as u8,
        (b as f32 * factor).min(255.0) as u8,
    )
}

fn sidebar_block_style(state: &GameState) -> Style {
    Style::default().fg(state.theme.div_line).bg(state.theme.bg)
}

fn draw_sidebar(frame: &mut Frame, state: &GameState, area: Rect, muted: bool) {
    let title_style = Style::default().fg(state.theme.title);
    let fg_style = Style::default().fg(state.theme.main_fg);
    let dim_style = Style::default().fg(state.theme.inactive_fg);
    let border_style = sidebar_block_style(state);

    // Free-floating sections with their own borders; vertical layout with small gaps
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Score (border + score, turns)
            Constraint::Length(1), // gap
            Constraint::Length(4), // Chain (border + length, worth)
            Constraint::Length(1), // gap
            Constraint::Length(5), // Fruits (border + title + strip + counts)
            Constraint::Length(1), // gap
            Constraint::Length(7), // Controls (border + help)
        ])
        .split(area);

    // --- Score (own border) ---
    let score_outer = chunks[0];
    let score_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let score_inner = score_block.inner(score_outer);
    score_block.render(score_outer, frame.buffer_mut());
    let score_lines = vec![
        Line::from(vec![
            Span::styled("Score: ", title_style),
            Span::styled(state.scoreboard.score.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Turns: ", title_style),
            Span::styled(state.scoreboard.turns.to_string(), fg_style),
        ]),
    ];
    Paragraph::new(ratatui::text::Text::from(score_lines))
        .render(score_inner, frame.buffer_mut());

    // --- Chain (own border): live length and what it would score ---
    let chain_outer = chunks[2];
    let chain_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let chain_inner = chain_block.inner(chain_outer);
    chain_block.render(chain_outer, frame.buffer_mut());
    let len = state.selector.len();
    let chain_style = state.chain_color().map_or(fg_style, |c| Style::default().fg(c));
    let fruit = state
        .selector
        .cells()
        .first()
        .and_then(|&coord| state.board.tile_at(coord))
        .map(|tile| state.catalog.def(tile.kind).name);
    let chain_label = match fruit {
        Some(name) => format!("{len} ({name})"),
        None => len.to_string(),
    };
    let chain_lines = vec![
        Line::from(vec![
            Span::styled("Chain: ", title_style),
            Span::styled(chain_label, chain_style),
        ]),
        Line::from(vec![
            Span::styled("Worth: ", title_style),
            Span::styled(state.scoreboard.worth(len).to_string(), fg_style),
        ]),
    ];
    Paragraph::new(ratatui::text::Text::from(chain_lines))
        .render(chain_inner, frame.buffer_mut());

    // --- Fruits (own border) ---
    let fruits_outer = chunks[4];
    let fruits_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let fruits_inner = fruits_block.inner(fruits_outer);
    fruits_block.render(fruits_outer, frame.buffer_mut());
    let fruits_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(fruits_inner);
    Paragraph::new(Line::from(Span::styled("Fruits", title_style)))
        .render(fruits_layout[0], frame.buffer_mut());
    draw_fruit_strip(frame, state, fruits_layout[1], fruits_layout[2]);

    // --- Controls (own border) ---
    let controls_outer = chunks[6];
    let controls_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let controls_inner = controls_block.inner(controls_outer);
    controls_block.render(controls_outer, frame.buffer_mut());
    let sound = if muted { "off" } else { "on" };
    let controls_lines = vec![
        Line::from(Span::styled("Drag — chain fruits", dim_style)),
        Line::from(Span::styled("P — pause", dim_style)),
        Line::from(Span::styled("R — restart", dim_style)),
        Line::from(Span::styled(format!("M — sound ({sound})"), dim_style)),
        Line::from(Span::styled("Q — quit", dim_style)),
    ];
    Paragraph::new(ratatui::text::Text::from(controls_lines))
        .render(controls_inner, frame.buffer_mut());
}

/// Draw a row of coloured blocks, one per catalog kind, with how many of
/// each are currently on the board underneath.
fn draw_fruit_strip(frame: &mut Frame, state: &GameState, strip: Rect, counts_area: Rect) {
    let mut counts = vec![0usize; state.catalog.len()];
    let n = counts.len();
    for (_, tile) in state.board.tiles() {
        counts[tile.kind as usize % n] += 1;
    }
    let kinds = state.catalog.len() as u16;
    let block_w = (strip.width / kinds.max(1)).max(1);
    for (i, def) in state.catalog.defs().iter().enumerate() {
        let r = Rect {
            x: strip.x + (i as u16) * block_w,
            y: strip.y,
            width: block_w,
            height: strip.height.min(1),
        };
        let p = Paragraph::new("█").style(Style::default().fg(def.color).bg(def.color));
        p.render(r, frame.buffer_mut());
        let c = Rect {
            x: counts_area.x + (i as u16) * block_w,
            y: counts_area.y,
            width: block_w,
            height: counts_area.height.min(1),
        };
        Paragraph::new(counts[i].to_string())
            .style(Style::default().fg(state.theme.main_fg))
            .render(c, frame.buffer_mut());
    }
}

fn draw_pause_overlay(frame: &mut Frame, state: &GameState, area: Rect) {
    let popup_w = 28u16;
    let popup_h = 5u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P — Resume    Q — Quit ",
            Style::default().fg(state.theme.main_fg),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(state.theme.div_line).bg(state.theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

pub fn draw_quit_menu(frame: &mut Frame, state: &GameState, selected: QuitOption) {
    let area = frame.area();
    let qw = 24;
    let qh = 8;
    let quit_rect = Rect {
        x: area.x + area.width.saturating_sub(qw) / 2,
        y: area.y + area.height.saturating_sub(qh) / 2,
        width: qw,
        height: qh,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(state.theme.title))
        .title(" Quit? ");

    // Clear background
    for y in quit_rect.y..quit_rect.y + quit_rect.height {
        for x in quit_rect.x..quit_rect.x + quit_rect.width {
            frame.buffer_mut()[(x, y)].set_style(Style::default().bg(state.theme.bg));
        }
    }

    let inner = block.inner(quit_rect);
    block.render(quit_rect, frame.buffer_mut());

    let options = [
        (QuitOption::Resume, " Resume "),
        (QuitOption::Restart, " Restart "),
        (QuitOption::Exit, " Exit "),
    ];

    for (i, (opt, label)) in options.iter().enumerate() {
        let style = if *opt == selected {
            Style::default()
                .fg(state.theme.bg)
                .bg(state.theme.title)
                .bold()
        } else {
            Style::default().fg(state.theme.title)
        };
        let rx = inner.x + (inner.width.saturating_sub(label.len() as u16)) / 2;
        let ry = inner.y + 1 + i as u16 * 2;
        frame.buffer_mut().set_string(rx, ry, label, style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(grid_size: usize) -> crate::GameConfig {
        crate::GameConfig {
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

    #[test]
    fn test_max_grid_shrinks_with_terminal() {
        let config = test_config(8);
        let roomy = max_grid_for_terminal(120, 40, &config);
        let tight = max_grid_for_terminal(80, 24, &config);
        assert!(roomy >= 8);
        assert!(tight < 8);
        assert!(tight >= 2);
    }

    #[test]
    fn test_board_fits_after_clamp() {
        let config = test_config(8);
        let (cols, rows) = (80u16, 24u16);
        let n = max_grid_for_terminal(cols, rows, &config);
        let span = (config.margin + (config.tile_size + config.tile_gap) * n as i32) as u16;
        let (bw, bh) = board_terminal_size(span);
        assert!(bw + SIDEBAR_WIDTH <= cols);
        assert!(bh <= rows);
    }
}
