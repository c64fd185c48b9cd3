use std::iter;

use hexblox_engine::{BOARD_HEIGHT, BOARD_WIDTH, Board};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Rect},
    widgets::{Block as BlockWidget, BlockExt as _, Widget},
};

use crate::ui::widgets::BlockDisplay;

/// The 10x20 playfield: settled blocks, the falling piece and rows being cleared.
#[derive(Debug)]
pub struct BoardDisplay<'a> {
    board: &'a Board,
    block: Option<BlockWidget<'a>>,
}

impl<'a> BoardDisplay<'a> {
    pub fn new(board: &'a Board) -> Self {
        Self { board, block: None }
    }

    pub fn block(self, block: BlockWidget<'a>) -> Self {
        Self {
            block: Some(block),
            ..self
        }
    }

    pub fn width(&self) -> u16 {
        10 * BlockDisplay::width() + super::block_horizontal_margin(self.block.as_ref())
    }

    pub fn height(&self) -> u16 {
        20 * BlockDisplay::height() + super::block_vertical_margin(self.block.as_ref())
    }
}

impl Widget for BoardDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &BoardDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.block.as_ref().render(area, buf);
        let area = self.block.inner_if_some(area);

        let col_constraints = (0..BOARD_WIDTH).map(|_| Constraint::Length(BlockDisplay::width()));
        let row_constraints =
            (0..BOARD_HEIGHT).map(|_| Constraint::Length(BlockDisplay::height()));
        let horizontal = Layout::horizontal(col_constraints).flex(Flex::Center);
        let vertical = Layout::vertical(row_constraints);

        let grid_rows = area
            .layout::<BOARD_HEIGHT>(&vertical)
            .into_iter()
            .map(|row| row.layout::<BOARD_WIDTH>(&horizontal));

        for (y, grid_row) in iter::zip(0.., grid_rows) {
            for (x, grid_cell) in iter::zip(0.., grid_row) {
                let display = self
                    .board
                    .query(x, y)
                    .map_or_else(|| BlockDisplay::empty(true), BlockDisplay::from_block);
                display.render(grid_cell, buf);
            }
        }
    }
}
