use ratatui::{layout::Rect, widgets::Block as BlockWidget};

pub use self::{
    block_display::*, board_display::*, game_display::*, piece_display::*, stats_display::*,
};

mod block_display;
mod board_display;
mod game_display;
mod piece_display;
mod stats_display;

mod color {
    use hexblox_engine::BlockColor;
    use ratatui::style::Color;

    pub const GRAY: Color = Color::Rgb(127, 127, 127);
    pub const BLACK: Color = Color::Rgb(0, 0, 0);
    pub const WHITE: Color = Color::Rgb(255, 255, 255);
    pub const YELLOW: Color = Color::Rgb(255, 255, 0);
    pub const RED: Color = Color::Rgb(255, 0, 0);
    pub const CYAN: Color = Color::Rgb(0, 255, 255);

    pub const fn block(color: BlockColor) -> Color {
        match color {
            BlockColor::Crimson => Color::Rgb(220, 20, 60),
            BlockColor::DodgerBlue => Color::Rgb(30, 144, 255),
            BlockColor::Gold => Color::Rgb(255, 215, 0),
            BlockColor::Green => Color::Rgb(0, 128, 0),
            BlockColor::DarkOrange => Color::Rgb(255, 140, 0),
            BlockColor::DeepPink => Color::Rgb(255, 20, 147),
            BlockColor::DarkTurquoise => Color::Rgb(0, 206, 209),
            BlockColor::BlueViolet => Color::Rgb(138, 43, 226),
            BlockColor::LimeGreen => Color::Rgb(50, 205, 50),
        }
    }
}

pub mod style {
    use hexblox_engine::BlockColor;
    use ratatui::style::{Color, Modifier, Style};

    use crate::ui::widgets::color;

    const fn fg_bg(fg: Color, bg: Color) -> Style {
        Style::new().fg(fg).bg(bg)
    }

    const fn bg_only(color: Color) -> Style {
        Style::new().fg(color).bg(color)
    }

    pub const DEFAULT: Style = fg_bg(color::WHITE, color::BLACK);
    pub const EMPTY: Style = bg_only(color::BLACK);
    pub const EMPTY_DOT: Style = fg_bg(color::GRAY, color::BLACK);
    pub const KEY: Style = fg_bg(color::CYAN, color::BLACK);
    pub const HINT: Style = fg_bg(color::GRAY, color::BLACK);

    /// Block face: the value printed in black on the block colour.
    pub const fn block(block_color: BlockColor) -> Style {
        fg_bg(color::BLACK, color::block(block_color)).add_modifier(Modifier::BOLD)
    }
}

fn block_vertical_margin(block: Option<&BlockWidget>) -> u16 {
    let dummy_rect = Rect::new(0, 0, 100, 100);
    let inner_rect = block.map_or(dummy_rect, |block| block.inner(dummy_rect));
    dummy_rect.height - inner_rect.height
}

fn block_horizontal_margin(block: Option<&BlockWidget>) -> u16 {
    let dummy_rect = Rect::new(0, 0, 100, 100);
    let inner_rect = block.map_or(dummy_rect, |block| block.inner(dummy_rect));
    dummy_rect.width - inner_rect.width
}
