use hexblox_engine::Block;
use ratatui::{
    prelude::{Buffer, Rect},
    style::Style,
    widgets::{Paragraph, Widget},
};

use crate::ui::widgets::style;

/// One board cell, two terminal columns wide.
#[derive(Debug)]
pub struct BlockDisplay {
    style: Style,
    symbol: String,
}

impl BlockDisplay {
    pub fn new(style: Style, symbol: impl Into<String>) -> Self {
        Self {
            style,
            symbol: symbol.into(),
        }
    }

    pub const fn width() -> u16 {
        2
    }

    pub const fn height() -> u16 {
        1
    }

    pub fn empty(show_dots: bool) -> Self {
        if show_dots {
            Self::new(style::EMPTY_DOT, ".")
        } else {
            Self::new(style::EMPTY, "")
        }
    }

    /// A flashing block is drawn blank for the off phase of the row-clear animation.
    pub fn from_block(block: &Block) -> Self {
        if block.is_flashing() {
            return Self::new(style::EMPTY, "");
        }
        Self::new(style::block(block.color()), value_label(block.value()))
    }
}

fn value_label(value: u32) -> String {
    if value < 100 {
        format!("{value:>2}")
    } else {
        "++".to_owned()
    }
}

impl Widget for BlockDisplay {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &BlockDisplay {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        // Paragraph fills the whole area, not just the cells with the symbol
        Paragraph::new(self.symbol.as_str())
            .style(self.style)
            .centered()
            .render(area, buf);
    }
}
