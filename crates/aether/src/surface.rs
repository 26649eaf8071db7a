//! Rasterizes surface primitives into terminal cells.
//!
//! Each cell stands for a `CELL_WIDTH` x `CELL_HEIGHT` block of surface
//! pixels. A cell keeps one glyph and one color; opacity is carried along
//! so trails can fade out and is applied against black when drawn.

use aether_core::Rgba;
use aether_runtime::{Surface, SurfaceSize};
use glam::Vec2;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Color,
    widgets::Widget,
};

pub const CELL_WIDTH: f32 = 8.0;
pub const CELL_HEIGHT: f32 = 16.0;

/// Cells dimmer than this are treated as empty.
const MIN_ALPHA: f32 = 0.02;

/// Surface size covering a terminal area of `columns` x `rows`.
pub fn size_for_cells(columns: u16, rows: u16) -> SurfaceSize {
    SurfaceSize::new(columns as f32 * CELL_WIDTH, rows as f32 * CELL_HEIGHT)
}

/// Surface position at the center of a terminal cell.
pub fn cell_center(column: u16, row: u16) -> Vec2 {
    Vec2::new(
        (column as f32 + 0.5) * CELL_WIDTH,
        (row as f32 + 0.5) * CELL_HEIGHT,
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    glyph: char,
    color: Rgba,
}

/// A terminal-backed [`Surface`].
#[derive(Debug, Clone, Default)]
pub struct CellSurface {
    columns: usize,
    rows: usize,
    cells: Vec<Option<Cell>>,
    visible: bool,
}

impl CellSurface {
    pub fn new(size: SurfaceSize) -> Self {
        let mut surface = Self::default();
        surface.resize(size);
        surface
    }

    /// Glyph drawn at a cell, if any.
    pub fn glyph_at(&self, column: usize, row: usize) -> Option<char> {
        self.cell(column, row).map(|cell| cell.glyph)
    }

    /// Opacity of a cell, `0.0` when empty.
    pub fn alpha_at(&self, column: usize, row: usize) -> f32 {
        self.cell(column, row).map_or(0.0, |cell| cell.color.a)
    }

    pub fn filled_cells(&self) -> usize {
        self.cells.iter().flatten().count()
    }

    fn cell(&self, column: usize, row: usize) -> Option<&Cell> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        self.cells[row * self.columns + column].as_ref()
    }

    fn cell_index(&self, point: Vec2) -> Option<usize> {
        if point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        let column = (point.x / CELL_WIDTH) as usize;
        let row = (point.y / CELL_HEIGHT) as usize;
        (column < self.columns && row < self.rows).then(|| row * self.columns + column)
    }

    /// Brighter writes win; a faint line never hides a star.
    fn plot(&mut self, index: usize, glyph: char, color: Rgba) {
        if color.a < MIN_ALPHA {
            return;
        }
        let slot = &mut self.cells[index];
        if slot.is_none_or(|cell| color.a >= cell.color.a) {
            *slot = Some(Cell { glyph, color });
        }
    }

    fn plot_at(&mut self, point: Vec2, glyph: char, color: Rgba) {
        if let Some(index) = self.cell_index(point) {
            self.plot(index, glyph, color);
        }
    }

    /// Visit cells whose centers lie within `radius` of `center`, plus the
    /// cell containing `center`. The callback gets the cell index and the
    /// normalized distance.
    fn for_cells_in_radius(
        &mut self,
        center: Vec2,
        radius: f32,
        mut visit: impl FnMut(&mut Self, usize, f32),
    ) {
        if let Some(index) = self.cell_index(center) {
            visit(self, index, 0.0);
        }
        if radius <= 0.0 {
            return;
        }
        let min_col = ((center.x - radius) / CELL_WIDTH).floor().max(0.0) as usize;
        let max_col = ((center.x + radius) / CELL_WIDTH).ceil().max(0.0) as usize;
        let min_row = ((center.y - radius) / CELL_HEIGHT).floor().max(0.0) as usize;
        let max_row = ((center.y + radius) / CELL_HEIGHT).ceil().max(0.0) as usize;
        let home = self.cell_index(center);

        for row in min_row..max_row.min(self.rows) {
            for column in min_col..max_col.min(self.columns) {
                let index = row * self.columns + column;
                if Some(index) == home {
                    continue;
                }
                let distance = cell_center(column as u16, row as u16).distance(center);
                if distance <= radius {
                    visit(self, index, distance / radius);
                }
            }
        }
    }
}

fn dot_for(radius: f32) -> char {
    if radius >= CELL_WIDTH {
        '●'
    } else if radius >= 2.0 {
        '•'
    } else {
        '·'
    }
}

fn shade_for(alpha: f32) -> char {
    if alpha > 0.5 {
        '▒'
    } else {
        '░'
    }
}

/// Line glyph for a direction in cell units; `y` grows downward.
fn line_glyph(dx: f32, dy: f32) -> char {
    let (ax, ay) = (dx.abs(), dy.abs());
    if ay <= ax * 0.5 {
        '─'
    } else if ax <= ay * 0.5 {
        '│'
    } else if (dx > 0.0) == (dy > 0.0) {
        '╲'
    } else {
        '╱'
    }
}

impl Surface for CellSurface {
    fn size(&self) -> SurfaceSize {
        SurfaceSize::new(
            self.columns as f32 * CELL_WIDTH,
            self.rows as f32 * CELL_HEIGHT,
        )
    }

    fn resize(&mut self, size: SurfaceSize) {
        self.columns = (size.width / CELL_WIDTH).round().max(0.0) as usize;
        self.rows = (size.height / CELL_HEIGHT).round().max(0.0) as usize;
        self.cells = vec![None; self.columns * self.rows];
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn clear(&mut self) {
        self.cells.fill(None);
    }

    fn fade(&mut self, amount: f32) {
        let keep = 1.0 - amount.clamp(0.0, 1.0);
        for slot in &mut self.cells {
            if let Some(cell) = slot {
                cell.color.a *= keep;
                if cell.color.a < MIN_ALPHA {
                    *slot = None;
                }
            }
        }
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        let glyph = dot_for(radius);
        self.for_cells_in_radius(center, radius, |surface, index, _| {
            surface.plot(index, glyph, color);
        });
    }

    fn fill_glow(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.for_cells_in_radius(center, radius, |surface, index, distance| {
            let faded = color.with_alpha(color.a * (1.0 - distance));
            surface.plot(index, shade_for(faded.a), faded);
        });
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Rgba) {
        let delta = to - from;
        let (dx, dy) = (delta.x / CELL_WIDTH, delta.y / CELL_HEIGHT);
        let glyph = line_glyph(dx, dy);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            self.plot_at(from + delta * t, glyph, color);
        }
    }

    fn draw_glyph(&mut self, at: Vec2, glyph: char, color: Rgba) {
        // Glyph positions name the baseline of a text cell.
        if let Some(index) = self.cell_index(at) {
            self.cells[index] = Some(Cell { glyph, color });
        }
    }
}

impl Widget for &CellSurface {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if !self.visible {
            return;
        }
        for row in 0..self.rows.min(area.height as usize) {
            for column in 0..self.columns.min(area.width as usize) {
                let Some(cell) = self.cells[row * self.columns + column] else {
                    continue;
                };
                let (r, g, b) = cell.color.premultiplied();
                let position = (area.x + column as u16, area.y + row as u16);
                if let Some(target) = buf.cell_mut(position) {
                    target.set_char(cell.glyph).set_fg(Color::Rgb(r, g, b));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(columns: u16, rows: u16) -> CellSurface {
        let mut surface = CellSurface::new(size_for_cells(columns, rows));
        surface.set_visible(true);
        surface
    }

    #[test]
    fn test_size_round_trips_cells() {
        let surface = surface(10, 4);
        assert_eq!(surface.size(), SurfaceSize::new(80.0, 64.0));
        assert_eq!(cell_center(0, 0), Vec2::new(4.0, 8.0));
    }

    #[test]
    fn test_small_circle_marks_its_cell() {
        let mut surface = surface(10, 4);
        surface.fill_circle(Vec2::new(20.0, 20.0), 1.0, Rgba::rgb(255, 0, 0));
        assert_eq!(surface.glyph_at(2, 1), Some('·'));
        assert_eq!(surface.filled_cells(), 1);
    }

    #[test]
    fn test_faint_write_does_not_hide_bright_cell() {
        let mut surface = surface(10, 4);
        surface.draw_glyph(Vec2::new(4.0, 8.0), 'A', Rgba::rgb(0, 255, 0));
        surface.stroke_line(Vec2::new(0.0, 8.0), Vec2::new(79.0, 8.0), Rgba::new(0, 255, 255, 0.3));
        assert_eq!(surface.glyph_at(0, 0), Some('A'));
        assert_eq!(surface.glyph_at(5, 0), Some('─'));
    }

    #[test]
    fn test_line_glyphs() {
        assert_eq!(line_glyph(5.0, 0.0), '─');
        assert_eq!(line_glyph(0.0, -3.0), '│');
        assert_eq!(line_glyph(2.0, 2.0), '╲');
        assert_eq!(line_glyph(2.0, -2.0), '╱');
    }

    #[test]
    fn test_fade_empties_cells() {
        let mut surface = surface(4, 4);
        surface.draw_glyph(Vec2::new(1.0, 1.0), 'Z', Rgba::rgb(0, 255, 0));
        surface.fade(0.5);
        assert!((surface.alpha_at(0, 0) - 0.5).abs() < 1e-6);
        for _ in 0..10 {
            surface.fade(0.5);
        }
        assert_eq!(surface.glyph_at(0, 0), None);
    }

    #[test]
    fn test_out_of_bounds_draws_are_ignored() {
        let mut surface = surface(4, 4);
        surface.fill_circle(Vec2::new(-50.0, -50.0), 3.0, Rgba::rgb(1, 2, 3));
        surface.draw_glyph(Vec2::new(500.0, 10.0), 'x', Rgba::rgb(1, 2, 3));
        surface.stroke_line(Vec2::new(-100.0, 10.0), Vec2::new(-10.0, 10.0), Rgba::rgb(1, 2, 3));
        assert_eq!(surface.filled_cells(), 0);
    }

    #[test]
    fn test_widget_skips_empty_cells() {
        let mut fg = surface(4, 2);
        fg.draw_glyph(Vec2::new(9.0, 1.0), '#', Rgba::rgb(255, 255, 255));

        let area = Rect::new(0, 0, 4, 2);
        let mut buf = Buffer::empty(area);
        buf[(0, 0)].set_char('b');
        (&fg).render(area, &mut buf);

        assert_eq!(buf[(0, 0)].symbol(), "b");
        assert_eq!(buf[(1, 0)].symbol(), "#");
        assert_eq!(buf[(1, 0)].fg, Color::Rgb(255, 255, 255));
    }

    #[test]
    fn test_hidden_surface_draws_nothing() {
        let mut fg = surface(2, 1);
        fg.draw_glyph(Vec2::ZERO, '#', Rgba::rgb(255, 255, 255));
        fg.set_visible(false);
        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        (&fg).render(area, &mut buf);
        assert_eq!(buf[(0, 0)].symbol(), " ");
    }
}
