use std::{iter, time::Duration};

use chrono::Local;
use hexblox_engine::Board;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    text::Line,
    widgets::{Block as BlockWidget, BlockExt as _, Widget},
};

use crate::ui::widgets::style;

pub struct StatsDisplay<'a> {
    board: &'a Board,
    block: Option<BlockWidget<'a>>,
}

impl<'a> StatsDisplay<'a> {
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
        20 + super::block_horizontal_margin(self.block.as_ref())
    }

    pub fn height(&self) -> u16 {
        ROW_COUNT + super::block_vertical_margin(self.block.as_ref())
    }
}

#[derive(Clone, Copy)]
enum Row {
    Empty,
    FullLabel(&'static str),
    FullValue(&'static dyn Fn(&Board) -> String),
    LabelValue(&'static str, &'static dyn Fn(&Board) -> String),
}

const ROW_COUNT: u16 = 13;

const ROWS: [Row; ROW_COUNT as usize] = [
    Row::FullLabel("SCORE:"),
    Row::FullValue(&|board| board.score().to_string()),
    Row::FullLabel("BEST:"),
    Row::FullValue(&|board| {
        board
            .best_score()
            .map_or_else(|| "-".to_owned(), |best| best.score.to_string())
    }),
    Row::FullValue(&|board| {
        board.best_score().map_or_else(String::new, |best| {
            best.achieved_at
                .with_timezone(&Local)
                .format("%Y-%m-%d")
                .to_string()
        })
    }),
    Row::Empty,
    Row::LabelValue("LEVEL:", &|board| board.level().to_string()),
    Row::LabelValue("LINES:", &|board| board.lines().to_string()),
    Row::Empty,
    Row::LabelValue("PIECES:", &|board| {
        board.stats().completed_pieces().to_string()
    }),
    Row::LabelValue("PERFECT:", &|board| {
        board.stats().perfect_clears().to_string()
    }),
    Row::FullLabel("TIME:"),
    Row::FullValue(&|board| format_time(board.now())),
];

fn format_time(dur: Duration) -> String {
    format!(
        "{:0}:{:0>2}.{:0>2}",
        dur.as_secs() / 60,
        dur.as_secs() % 60,
        dur.subsec_millis() / 10
    )
}

impl Widget for StatsDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.block.as_ref().render(area, buf);
        let area = self.block.inner_if_some(area);

        let style = style::DEFAULT;

        let rows_areas =
            Layout::vertical((0..ROW_COUNT).map(|_| Constraint::Length(1))).split(area);

        for (row, area) in iter::zip(ROWS, rows_areas.iter().copied()) {
            match row {
                Row::Empty => {}
                Row::FullLabel(label) => {
                    Line::styled(label, style).left_aligned().render(area, buf);
                }
                Row::FullValue(value) => {
                    Line::styled(value(self.board), style)
                        .right_aligned()
                        .render(area, buf);
                }
                Row::LabelValue(label, value) => {
                    let [label_area, value_area] = area.layout(&Layout::horizontal([
                        Constraint::Fill(1),
                        Constraint::Fill(1),
                    ]));
                    Line::styled(label, style)
                        .left_aligned()
                        .render(label_area, buf);
                    Line::styled(value(self.board), style)
                        .right_aligned()
                        .render(value_area, buf);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_is_minutes_seconds_centiseconds() {
        assert_eq!(format_time(Duration::from_millis(0)), "0:00.00");
        assert_eq!(format_time(Duration::from_millis(125_340)), "2:05.34");
    }
}
