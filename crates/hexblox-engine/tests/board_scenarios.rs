//! End-to-end games driven through the public board API on the virtual clock.

use std::{fs, path::PathBuf, time::Duration};

use hexblox_engine::{
    BestScoreStore as _, Board, Direction, GameConfig, GameEvent, JsonFileBestScoreStore,
    PieceKind, PieceSeed,
};

const FLASH_DONE: Duration = Duration::from_millis(900);

fn scripted(kinds: &[PieceKind]) -> GameConfig {
    GameConfig {
        test_mode: true,
        test_sequence: kinds.to_vec(),
        seed: Some(PieceSeed::from_u128(0x5eed)),
        ..GameConfig::default()
    }
}

fn shift(board: &mut Board, direction: Direction, steps: usize) {
    for _ in 0..steps {
        board.move_player_piece(direction);
    }
}

fn drop_piece(board: &mut Board) {
    for _ in 0..=20 {
        if board.falling_piece().is_none() {
            return;
        }
        board.move_player_piece(Direction::Down);
    }
    panic!("piece never settled");
}

fn row_sum(board: &Board, y: i32) -> u64 {
    (0..10)
        .filter_map(|x| board.query(x, y))
        .map(|b| u64::from(b.value()))
        .sum()
}

/// Fills row 19 with two horizontal cyans and a square dropped in between.
fn fill_bottom_row(board: &mut Board) {
    shift(board, Direction::Left, 3);
    drop_piece(board);
    board.frame();
    shift(board, Direction::Right, 3);
    drop_piece(board);
    board.frame();
    assert_eq!(board.falling_piece().map(|p| p.kind()), Some(PieceKind::Yellow));
    drop_piece(board);
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("hexblox-{}-{name}", std::process::id()))
}

#[test]
fn line_clear_counts_a_line_and_shifts_blocks_above() {
    let mut board = Board::new(scripted(&[PieceKind::Cyan, PieceKind::Cyan, PieceKind::Yellow]))
        .unwrap();
    fill_bottom_row(&mut board);
    assert_eq!(board.y_matrix().iter().filter(|y| **y == 19).count(), 10);

    board.frame();
    assert_eq!(board.destroying(), 1);
    let raw = row_sum(&board, 19);
    let above: Vec<_> = board
        .static_blocks()
        .into_iter()
        .filter(|b| b.cell.y == 18)
        .collect();
    assert_eq!(above.len(), 2);

    board.tick(FLASH_DONE);
    assert_eq!(board.destroying(), 0);
    assert_eq!(board.lines(), 1);
    assert_eq!(board.score(), raw);

    // The old row is gone; the square's upper half now sits on the floor.
    let remaining = board.static_blocks();
    assert_eq!(remaining.len(), 2);
    for (before, after) in above.iter().zip(&remaining) {
        assert_eq!(after.cell.x, before.cell.x);
        assert_eq!(after.cell.y, 19);
        assert_eq!(after.block.color(), before.block.color());
    }
    assert!(board.query(0, 19).is_none());

    // The next scripted piece spawned once the row finished.
    assert_eq!(board.falling_piece().map(|p| p.kind()), Some(PieceKind::Cyan));
    let events: Vec<_> = board.drain_events().collect();
    assert!(events.contains(&GameEvent::LineCleared { row: 19, award: raw }));
    assert!(events.contains(&GameEvent::ScoreChanged {
        score: raw,
        lines: 1,
        level: 1
    }));
}

#[test]
fn stacking_to_the_top_ends_the_game() {
    let mut board = Board::new(scripted(&[PieceKind::Cyan])).unwrap();
    for _ in 0..50 {
        if board.is_game_over() {
            break;
        }
        drop_piece(&mut board);
        board.frame();
    }
    assert!(board.is_game_over());
    // Each cyan stacks one row higher; the 19th settles with its origin on row 0.
    assert_eq!(board.stats().completed_pieces(), 19);
    assert!(board.falling_piece().is_none());

    let before = board.static_blocks();
    board.move_player_piece(Direction::Left);
    board.tick(Duration::from_secs(10));
    assert_eq!(board.static_blocks(), before);

    board.reset();
    assert!(!board.is_game_over());
    assert!(board.static_blocks().is_empty());
    assert!(board.falling_piece().is_some());
}

#[test]
fn game_over_persists_a_new_best_score() {
    let path = temp_path("best.json");
    let _ = fs::remove_file(&path);

    let config = scripted(&[PieceKind::Cyan, PieceKind::Cyan, PieceKind::Yellow]);
    let store = JsonFileBestScoreStore::new(&path);
    let mut board = Board::with_store(config.clone(), Box::new(store)).unwrap();
    assert_eq!(board.best_score(), None);

    fill_bottom_row(&mut board);
    board.frame();
    board.tick(FLASH_DONE);
    let score = board.score();
    assert!(score > 0);

    for _ in 0..50 {
        if board.is_game_over() {
            break;
        }
        drop_piece(&mut board);
        board.frame();
    }
    assert!(board.is_game_over());
    assert_eq!(board.best_score().map(|b| b.score), Some(score));
    assert!(board.drain_events().any(|e| e == GameEvent::NewBestScore { score }));

    let stored = JsonFileBestScoreStore::new(&path).load().unwrap();
    assert_eq!(stored.map(|b| b.score), Some(score));

    let reopened = Board::with_store(config, Box::new(JsonFileBestScoreStore::new(&path))).unwrap();
    assert_eq!(reopened.best_score().map(|b| b.score), Some(score));
    fs::remove_file(&path).unwrap();
}

#[test]
fn same_seed_and_commands_replay_identically() {
    let config = GameConfig {
        seed: Some(PieceSeed::from_u128(0x0123_4567_89ab_cdef)),
        ..GameConfig::default()
    };
    let mut a = Board::new(config.clone()).unwrap();
    let mut b = Board::new(config).unwrap();

    for i in 0..400_u32 {
        for board in [&mut a, &mut b] {
            match i % 5 {
                0 => board.move_player_piece(Direction::Left),
                1 => board.rotate_player_piece(),
                2 => board.move_player_piece(Direction::Right),
                _ => board.move_player_piece(Direction::Down),
            }
            board.tick(Duration::from_millis(250));
        }
    }
    assert_eq!(a.static_blocks(), b.static_blocks());
    assert_eq!(a.score(), b.score());
    assert_eq!(a.lines(), b.lines());
    assert_eq!(a.is_game_over(), b.is_game_over());
}
