use hexblox_engine::{Block, Piece};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Rect},
    widgets::{Block as BlockWidget, BlockExt as _, Widget},
};

use crate::ui::widgets::BlockDisplay;

/// Preview of a single piece in its current rotation, cropped to its bounding box.
#[derive(Debug)]
pub struct PieceDisplay<'a> {
    piece: Option<&'a Piece>,
    block: Option<BlockWidget<'a>>,
}

impl<'a> PieceDisplay<'a> {
    pub fn new() -> Self {
        Self {
            piece: None,
            block: None,
        }
    }

    pub fn piece(self, piece: &'a Piece) -> Self {
        Self {
            piece: Some(piece),
            ..self
        }
    }

    pub fn block(self, block: BlockWidget<'a>) -> Self {
        Self {
            block: Some(block),
            ..self
        }
    }

    pub fn width(&self) -> u16 {
        4 * BlockDisplay::width() + super::block_horizontal_margin(self.block.as_ref())
    }

    pub fn height(&self) -> u16 {
        4 * BlockDisplay::height() + super::block_vertical_margin(self.block.as_ref())
    }
}

/// `(min_dx, min_dy, width, height)` of the visible offsets.
fn bounding_box(piece: &Piece) -> Option<(i32, i32, u16, u16)> {
    let offsets = piece
        .blocks()
        .iter()
        .filter(|b| b.is_visible())
        .map(Block::offset);
    let (min_x, min_y, max_x, max_y) = offsets.fold(None, |acc: Option<(i32, i32, i32, i32)>, (dx, dy)| {
        Some(match acc {
            None => (dx, dy, dx, dy),
            Some((x0, y0, x1, y1)) => (x0.min(dx), y0.min(dy), x1.max(dx), y1.max(dy)),
        })
    })?;
    let width = u16::try_from(max_x - min_x + 1).ok()?;
    let height = u16::try_from(max_y - min_y + 1).ok()?;
    Some((min_x, min_y, width, height))
}

impl Widget for PieceDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &PieceDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.block.as_ref().render(area, buf);
        let area = self.block.inner_if_some(area);

        let Some(piece) = self.piece else {
            return;
        };
        let Some((min_x, min_y, width, height)) = bounding_box(piece) else {
            return;
        };
        let piece_area = area.centered(
            Constraint::Length(width * BlockDisplay::width()),
            Constraint::Length(height * BlockDisplay::height()),
        );

        let col_constraints = (0..width).map(|_| Constraint::Length(BlockDisplay::width()));
        let row_constraints = (0..height).map(|_| Constraint::Length(BlockDisplay::height()));
        let horizontal = Layout::horizontal(col_constraints).flex(Flex::Center);
        let vertical = Layout::vertical(row_constraints);
        let grid_rows = piece_area
            .layout_vec(&vertical)
            .into_iter()
            .map(|row| row.layout_vec(&horizontal));

        for (y, grid_row) in (min_y..).zip(grid_rows) {
            for (x, grid_cell) in (min_x..).zip(grid_row) {
                let block = piece
                    .blocks()
                    .iter()
                    .find(|b| b.is_visible() && b.offset() == (x, y));
                let display =
                    block.map_or_else(|| BlockDisplay::empty(false), BlockDisplay::from_block);
                display.render(grid_cell, buf);
            }
        }
    }
}
