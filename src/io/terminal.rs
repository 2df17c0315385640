//! Terminal display backend (ratatui + crossterm)
//!
//! Projects the logical surface onto the terminal grid. Text is drawn at the
//! cell under its logical position; large fonts are rendered bold. Left mouse
//! presses stand in for touches and are mapped back to the centre of the
//! clicked cell in logical pixels.

use crate::domain::types::{Point, SurfaceSize};
use crate::infra::config::Rgb;
use crate::io::display::{PointerInput, Surface};
use anyhow::Context;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, MouseButton, MouseEventKind},
    execute,
    terminal::{self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Paragraph},
    Terminal,
};
use std::io::{self, Stdout};
use std::time::Duration;
use tracing::{debug, info};

/// Fonts at least this large are drawn bold
const BOLD_FROM_PX: u32 = 100;

/// Terminal grid size in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub cols: u16,
    pub rows: u16,
}

impl Grid {
    /// Cell under a logical point, clamped to the grid
    pub fn cell_at(&self, point: Point, logical: SurfaceSize) -> (u16, u16) {
        let col = scale_down(point.x, logical.width, self.cols);
        let row = scale_down(point.y, logical.height, self.rows);
        (col, row)
    }

    /// Logical point at the centre of a cell
    pub fn point_at(&self, col: u16, row: u16, logical: SurfaceSize) -> Point {
        Point::new(
            scale_up(col, self.cols, logical.width),
            scale_up(row, self.rows, logical.height),
        )
    }

    /// Logical pixels covered by one column
    pub fn col_width(&self, logical: SurfaceSize) -> f32 {
        logical.width as f32 / f32::from(self.cols.max(1))
    }
}

fn scale_down(value: f32, logical: u32, cells: u16) -> u16 {
    if cells == 0 || logical == 0 {
        return 0;
    }
    let cell = (value.max(0.0) * f32::from(cells) / logical as f32) as u16;
    cell.min(cells - 1)
}

fn scale_up(cell: u16, cells: u16, logical: u32) -> f32 {
    (f32::from(cell) + 0.5) * logical as f32 / f32::from(cells.max(1))
}

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb[0], rgb[1], rgb[2])
}

struct TextOp {
    text: String,
    at: Point,
    font_px: u32,
    color: Rgb,
}

pub struct TerminalScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    logical: SurfaceSize,
    grid: Grid,
    background: Rgb,
    pending: Vec<TextOp>,
}

impl TerminalScreen {
    /// Take over the terminal: raw mode, alternate screen, mouse capture
    pub fn new(logical: SurfaceSize) -> anyhow::Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
            .context("Failed to enter alternate screen")?;

        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (cols, rows) = terminal::size().context("Failed to read terminal size")?;
        let grid = Grid { cols, rows };
        info!(cols = %cols, rows = %rows, width = %logical.width, height = %logical.height, "terminal_display_ready");

        Ok(Self { terminal, logical, grid, background: [0, 0, 0], pending: Vec::new() })
    }
}

impl Surface for TerminalScreen {
    fn size(&self) -> SurfaceSize {
        self.logical
    }

    fn fill(&mut self, color: Rgb) {
        self.background = color;
        self.pending.clear();
    }

    fn text_width(&self, text: &str, _font_px: u32) -> u32 {
        (text.chars().count() as f32 * self.grid.col_width(self.logical)) as u32
    }

    fn draw_text(&mut self, text: &str, at: Point, font_px: u32, color: Rgb) {
        self.pending.push(TextOp { text: text.to_string(), at, font_px, color });
    }

    fn present(&mut self) -> anyhow::Result<()> {
        let ops = std::mem::take(&mut self.pending);
        let background = to_color(self.background);
        let logical = self.logical;

        self.terminal.draw(|frame| {
            let area = frame.area();
            frame.render_widget(Block::default().style(Style::default().bg(background)), area);
            if area.width == 0 || area.height == 0 {
                return;
            }

            let grid = Grid { cols: area.width, rows: area.height };
            for op in &ops {
                let (col, row) = grid.cell_at(op.at, logical);
                let width = (op.text.chars().count() as u16).min(area.width - col);
                let rect = Rect::new(area.x + col, area.y + row, width, 1);

                let mut style = Style::default().fg(to_color(op.color)).bg(background);
                if op.font_px >= BOLD_FROM_PX {
                    style = style.add_modifier(Modifier::BOLD);
                }
                frame.render_widget(Paragraph::new(Span::styled(op.text.as_str(), style)), rect);
            }
        })?;

        Ok(())
    }
}

impl PointerInput for TerminalScreen {
    fn poll(&mut self, timeout: Duration) -> anyhow::Result<Vec<Point>> {
        let mut points = Vec::new();
        let mut wait = timeout;

        while event::poll(wait)? {
            match event::read()? {
                Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                    let point = self.grid.point_at(mouse.column, mouse.row, self.logical);
                    debug!(col = %mouse.column, row = %mouse.row, x = %point.x, y = %point.y, "pointer_down");
                    points.push(point);
                }
                Event::Resize(cols, rows) => {
                    debug!(cols = %cols, rows = %rows, "terminal_resized");
                    self.grid = Grid { cols, rows };
                }
                _ => {}
            }
            wait = Duration::ZERO;
        }

        Ok(points)
    }
}

impl Drop for TerminalScreen {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture);
        let _ = self.terminal.show_cursor();
    }
}
