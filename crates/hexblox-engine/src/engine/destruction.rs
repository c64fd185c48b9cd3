use std::time::Duration;

use crate::core::{Block, BlockRef, Piece};

use super::timers::{TimerHandle, Timers};

/// Identity of one row clear in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[display("row-clear#{_0}")]
pub struct RowClearId(u64);

/// Work items the board schedules on its timer queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTask {
    AutoFall,
    Flash(RowClearId),
    Hide(RowClearId),
}

/// A full row found by line detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullRow {
    pub y: i32,
    pub blocks: Vec<BlockRef>,
    /// Sum of the row's block values at detection time.
    pub raw_score: u64,
}

/// Handed back to the board once a row is hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletedRow {
    pub y: i32,
    pub raw_score: u64,
    /// Number of rows detected in the same pass.
    pub batch: u32,
}

#[derive(Debug, Clone)]
struct RowClear {
    id: RowClearId,
    row: FullRow,
    batch: u32,
    flashes: u32,
    flash: Option<TimerHandle>,
    hide: Option<TimerHandle>,
}

/// Times the flash/hide animation of cleared rows.
///
/// Each row runs on its own timers: its blocks toggle `flashing` every interval, and after
/// `cycles` intervals they are hidden and the row is reported complete. Rows of one batch
/// share due times and complete in ascending `y`.
#[derive(Debug, Clone)]
pub struct DestructionSequencer {
    interval: Duration,
    cycles: u32,
    next_id: u64,
    rows: Vec<RowClear>,
}

impl DestructionSequencer {
    #[must_use]
    pub fn new(interval: Duration, cycles: u32) -> Self {
        debug_assert!(cycles > 0);
        Self {
            interval,
            cycles,
            next_id: 0,
            rows: Vec::new(),
        }
    }

    /// Number of rows still animating.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.rows.len()
    }

    /// Rows still animating, in the order they will complete.
    pub fn rows(&self) -> impl Iterator<Item = i32> + '_ {
        self.rows.iter().map(|r| r.row.y)
    }

    /// Starts the animation for one detection pass. Rows go blank at once and toggle on
    /// every interval after that.
    pub fn start(
        &mut self,
        mut rows: Vec<FullRow>,
        pieces: &mut [Piece],
        timers: &mut Timers<TimerTask>,
    ) {
        rows.sort_by_key(|r| r.y);
        #[expect(clippy::cast_possible_truncation)]
        let batch = rows.len() as u32;
        for row in rows {
            let id = RowClearId(self.next_id);
            self.next_id += 1;
            for block_ref in &row.blocks {
                if let Some(block) = block_mut(pieces, *block_ref) {
                    block.set_flashing(true);
                }
            }
            let flash = (self.cycles > 1).then(|| timers.schedule(self.interval, TimerTask::Flash(id)));
            let hide = timers.schedule(self.interval * self.cycles, TimerTask::Hide(id));
            log::debug!("{id}: row {} scheduled to clear", row.y);
            self.rows.push(RowClear {
                id,
                row,
                batch,
                flashes: 0,
                flash,
                hide: Some(hide),
            });
        }
    }

    /// Toggles the row's blocks and re-arms the flash timer until the last interval.
    pub fn on_flash(
        &mut self,
        id: RowClearId,
        pieces: &mut [Piece],
        timers: &mut Timers<TimerTask>,
    ) {
        let Some(clear) = self.rows.iter_mut().find(|r| r.id == id) else {
            return;
        };
        clear.flashes += 1;
        for block_ref in &clear.row.blocks {
            if let Some(block) = block_mut(pieces, *block_ref) {
                let flashing = block.is_flashing();
                block.set_flashing(!flashing);
            }
        }
        clear.flash = (clear.flashes + 1 < self.cycles)
            .then(|| timers.schedule(self.interval, TimerTask::Flash(id)));
    }

    /// Hides the row's blocks and returns the completion record.
    pub fn on_hide(
        &mut self,
        id: RowClearId,
        pieces: &mut [Piece],
        timers: &mut Timers<TimerTask>,
    ) -> Option<CompletedRow> {
        let index = self.rows.iter().position(|r| r.id == id)?;
        let clear = self.rows.remove(index);
        if let Some(flash) = clear.flash {
            timers.cancel(flash);
        }
        for block_ref in &clear.row.blocks {
            if let Some(block) = block_mut(pieces, *block_ref) {
                block.hide();
            }
        }
        Some(CompletedRow {
            y: clear.row.y,
            raw_score: clear.row.raw_score,
            batch: clear.batch,
        })
    }

    /// Aborts one row's animation. Its blocks keep whatever flash state they had and the
    /// row is never reported complete. Returns `false` if the row is not in flight.
    pub fn cancel(&mut self, id: RowClearId, timers: &mut Timers<TimerTask>) -> bool {
        let Some(index) = self.rows.iter().position(|r| r.id == id) else {
            return false;
        };
        let clear = self.rows.remove(index);
        for handle in [clear.flash, clear.hide].into_iter().flatten() {
            timers.cancel(handle);
        }
        log::debug!("{id}: row {} clear cancelled", clear.row.y);
        true
    }

    /// Ids of the rows still animating.
    pub fn row_ids(&self) -> impl Iterator<Item = RowClearId> + '_ {
        self.rows.iter().map(|r| r.id)
    }

    /// Aborts every pending animation.
    pub fn cancel_all(&mut self, timers: &mut Timers<TimerTask>) {
        let ids: Vec<_> = self.row_ids().collect();
        for id in ids {
            self.cancel(id, timers);
        }
    }
}

fn block_mut(pieces: &mut [Piece], block_ref: BlockRef) -> Option<&mut Block> {
    let piece = pieces.iter_mut().find(|p| p.id() == block_ref.piece)?;
    piece.blocks_mut().get_mut(block_ref.index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BlockColor, CellKey, PieceId, PieceKind};

    const INTERVAL: Duration = Duration::from_millis(300);

    fn cyan(id: u64, y: i32) -> Piece {
        // Cyan rotation 0 lies on row origin.y + 1.
        Piece::new(PieceId::new(id), PieceKind::Cyan, [BlockColor::Gold; 4])
            .with_origin(CellKey::new(0, y - 1))
    }

    fn full_row(piece: &Piece, y: i32) -> FullRow {
        FullRow {
            y,
            blocks: (0..4)
                .map(|index| BlockRef {
                    piece: piece.id(),
                    index,
                })
                .collect(),
            raw_score: 12,
        }
    }

    fn run(
        seq: &mut DestructionSequencer,
        pieces: &mut [Piece],
        timers: &mut Timers<TimerTask>,
        until: Duration,
    ) -> Vec<CompletedRow> {
        let mut done = Vec::new();
        while let Some(task) = timers.pop_due(until) {
            match task {
                TimerTask::Flash(id) => seq.on_flash(id, pieces, timers),
                TimerTask::Hide(id) => done.extend(seq.on_hide(id, pieces, timers)),
                TimerTask::AutoFall => {}
            }
        }
        timers.advance_to(until);
        done
    }

    #[test]
    fn test_flash_then_hide() {
        let mut pieces = vec![cyan(1, 19)];
        let mut timers = Timers::new();
        let mut seq = DestructionSequencer::new(INTERVAL, 3);
        let row = full_row(&pieces[0], 19);
        seq.start(vec![row], &mut pieces, &mut timers);
        assert_eq!(seq.in_flight(), 1);
        // Blank from the moment the row is detected.
        assert!(pieces[0].blocks().iter().all(Block::is_flashing));

        assert!(run(&mut seq, &mut pieces, &mut timers, INTERVAL).is_empty());
        assert!(pieces[0].blocks().iter().all(|b| !b.is_flashing()));

        assert!(run(&mut seq, &mut pieces, &mut timers, INTERVAL * 2).is_empty());
        assert!(pieces[0].blocks().iter().all(Block::is_flashing));

        let done = run(&mut seq, &mut pieces, &mut timers, INTERVAL * 3);
        assert_eq!(
            done,
            vec![CompletedRow {
                y: 19,
                raw_score: 12,
                batch: 1
            }]
        );
        assert!(pieces[0].is_fully_hidden());
        assert_eq!(seq.in_flight(), 0);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_batch_completes_in_ascending_rows() {
        let mut pieces = vec![cyan(1, 19), cyan(2, 17)];
        let mut timers = Timers::new();
        let mut seq = DestructionSequencer::new(INTERVAL, 3);
        let rows = vec![full_row(&pieces[0], 19), full_row(&pieces[1], 17)];
        seq.start(rows, &mut pieces, &mut timers);
        assert_eq!(seq.rows().collect::<Vec<_>>(), vec![17, 19]);

        let done = run(&mut seq, &mut pieces, &mut timers, INTERVAL * 3);
        let ys: Vec<_> = done.iter().map(|r| r.y).collect();
        assert_eq!(ys, vec![17, 19]);
        assert!(done.iter().all(|r| r.batch == 2));
    }

    #[test]
    fn test_cancel_all_drops_pending_timers() {
        let mut pieces = vec![cyan(1, 19)];
        let mut timers = Timers::new();
        let mut seq = DestructionSequencer::new(INTERVAL, 3);
        let row = full_row(&pieces[0], 19);
        seq.start(vec![row], &mut pieces, &mut timers);
        seq.cancel_all(&mut timers);
        assert!(timers.is_empty());
        assert!(run(&mut seq, &mut pieces, &mut timers, INTERVAL * 10).is_empty());
        assert!(!pieces[0].is_fully_hidden());
    }

    #[test]
    fn test_single_flash_cycle_stays_blank_until_hidden() {
        let mut pieces = vec![cyan(1, 19)];
        let mut timers = Timers::new();
        let mut seq = DestructionSequencer::new(INTERVAL, 1);
        let row = full_row(&pieces[0], 19);
        seq.start(vec![row], &mut pieces, &mut timers);
        assert!(pieces[0].blocks().iter().all(Block::is_flashing));
        assert_eq!(timers.len(), 1);

        let done = run(&mut seq, &mut pieces, &mut timers, INTERVAL);
        assert_eq!(done.len(), 1);
        assert!(pieces[0].is_fully_hidden());
    }

    #[test]
    fn test_cancel_one_row_leaves_the_rest_running() {
        let mut pieces = vec![cyan(1, 19), cyan(2, 17)];
        let mut timers = Timers::new();
        let mut seq = DestructionSequencer::new(INTERVAL, 3);
        let rows = vec![full_row(&pieces[0], 19), full_row(&pieces[1], 17)];
        seq.start(rows, &mut pieces, &mut timers);

        let ids: Vec<_> = seq.row_ids().collect();
        assert!(seq.cancel(ids[0], &mut timers));
        assert!(!seq.cancel(ids[0], &mut timers));
        assert_eq!(seq.rows().collect::<Vec<_>>(), vec![19]);

        let done = run(&mut seq, &mut pieces, &mut timers, INTERVAL * 3);
        assert_eq!(done.iter().map(|r| r.y).collect::<Vec<_>>(), vec![19]);
        assert!(pieces[0].is_fully_hidden());
        assert!(!pieces[1].is_fully_hidden());
        assert!(timers.is_empty());
    }

    #[test]
    fn test_unknown_row_is_ignored() {
        let mut pieces = vec![cyan(1, 19)];
        let mut timers = Timers::new();
        let mut seq = DestructionSequencer::new(INTERVAL, 3);
        assert!(seq.on_hide(RowClearId(7), &mut pieces, &mut timers).is_none());
    }
}
