use hexblox_engine::Board;
use ratatui::{
    layout::{Constraint, Flex, Layout},
    prelude::{Buffer, Rect},
    style::Style,
    text::{Line, Span, Text},
    widgets::{Block, Clear, Padding, Widget},
};

use crate::ui::widgets::{BoardDisplay, PieceDisplay, StatsDisplay, color, style};

const KEY_HINTS: &[(&str, &str)] = &[
    ("←/→/↓", "move"),
    ("↑/Space", "rotate"),
    ("p", "pause"),
    ("Enter/r", "new game"),
    ("q", "quit"),
];

/// Whole play screen: stats, board, next-piece preview, key hints and state popups.
#[derive(Debug)]
pub struct GameDisplay<'a> {
    board: &'a Board,
    message: Option<&'a str>,
    horizontal_padding: u16,
    vertical_padding: u16,
}

impl<'a> GameDisplay<'a> {
    pub fn new(board: &'a Board) -> Self {
        Self {
            board,
            message: None,
            horizontal_padding: 1,
            vertical_padding: 0,
        }
    }

    /// Short status line shown under the board (last clear, new best, ...).
    pub fn message(self, message: Option<&'a str>) -> Self {
        Self { message, ..self }
    }

    fn is_paused(&self) -> bool {
        self.board.mode().is_paused() || self.board.is_suspended()
    }
}

impl Widget for GameDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &GameDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        let block_padding = Padding::symmetric(self.horizontal_padding, self.vertical_padding);
        let border_style = if self.board.is_game_over() {
            color::RED
        } else if self.is_paused() {
            color::YELLOW
        } else {
            color::WHITE
        };

        let game_board = BoardDisplay::new(self.board)
            .block(Block::bordered().border_style(border_style).style(style::DEFAULT));
        let next_panel = {
            let panel = PieceDisplay::new().block(
                Block::bordered()
                    .title(Line::from("NEXT").centered())
                    .padding(block_padding)
                    .border_style(border_style)
                    .style(style::DEFAULT),
            );
            match self.board.next_piece() {
                Some(piece) => panel.piece(piece),
                None => panel,
            }
        };
        let stats = StatsDisplay::new(self.board).block(
            Block::bordered()
                .title(Line::from("STATS").centered())
                .padding(block_padding)
                .border_style(border_style)
                .style(style::DEFAULT),
        );

        let [left_column, center_column, right_column] = Layout::horizontal([
            Constraint::Length(stats.width()),
            Constraint::Length(game_board.width()),
            Constraint::Length(next_panel.width()),
        ])
        .flex(Flex::Center)
        .spacing(1)
        .areas(area);

        let [stats_area] =
            Layout::vertical([Constraint::Length(stats.height())]).areas(left_column);
        let [board_area, message_area, hints_area] = Layout::vertical([
            Constraint::Length(game_board.height()),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(center_column);
        let [next_area] =
            Layout::vertical([Constraint::Length(next_panel.height())]).areas(right_column);

        let game_board_width = game_board.width();
        stats.render(stats_area, buf);
        game_board.render(board_area, buf);
        next_panel.render(next_area, buf);

        if let Some(message) = self.message {
            Line::styled(message, style::DEFAULT)
                .centered()
                .render(message_area, buf);
        }
        key_hints().render(hints_row(area, hints_area), buf);

        let popup = if self.board.is_game_over() {
            Some(("GAME OVER!!", Style::new().fg(color::WHITE).bg(color::RED)))
        } else if self.is_paused() {
            Some(("PAUSED", Style::new().fg(color::BLACK).bg(color::YELLOW)))
        } else {
            None
        };

        if let Some((text, style)) = popup {
            let block = Block::new().style(style);
            let text = Text::styled(text, style).centered();
            let area =
                board_area.centered(Constraint::Length(game_board_width), Constraint::Length(3));
            let inner = block.inner(area);
            Clear.render(area, buf);
            block.render(area, buf);
            text.render(inner.centered_vertically(Constraint::Length(1)), buf);
        }
    }
}

/// The hints line is wider than the board column, so it spans the full width of `area`.
fn hints_row(area: Rect, hints_area: Rect) -> Rect {
    Rect::new(area.x, hints_area.y, area.width, hints_area.height)
}

fn key_hints() -> Line<'static> {
    let mut spans = vec![];
    for (i, (key, desc)) in KEY_HINTS.iter().copied().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", style::HINT));
        }
        spans.push(Span::styled(key, style::KEY));
        spans.push(Span::styled(format!(" {desc}"), style::DEFAULT));
    }
    Line::from(spans).centered()
}
