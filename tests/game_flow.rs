use chess_core::board::Board;
use chess_core::game::{Game, GameConfig, Outcome, TurnOutcome, TurnState};
use chess_core::moves::CastleSide;
use chess_core::piece::{Color, Piece, PieceType};
use chess_core::square::Square;
use chess_core::ChessError;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn sq(x: i32, y: i32) -> Square {
    Square::new(x, y).expect("test square on the board")
}

/// Drive a move through the two-step selection protocol.
fn click(game: &mut Game, from: (i32, i32), to: (i32, i32)) -> TurnOutcome {
    let destinations = game.select_origin(sq(from.0, from.1)).expect("origin accepted");
    assert!(
        destinations.contains(&sq(to.0, to.1)),
        "{from:?} -> {to:?} not offered: {destinations:?}"
    );
    assert!(matches!(game.turn_state(), TurnState::AwaitingDestination { .. }));
    game.select_destination(sq(to.0, to.1)).expect("destination accepted")
}

#[test]
fn scholars_mate() {
    let mut game = Game::default();
    click(&mut game, (4, 6), (4, 4));
    click(&mut game, (4, 1), (4, 3));
    click(&mut game, (5, 7), (2, 4));
    click(&mut game, (1, 0), (2, 2));
    click(&mut game, (3, 7), (7, 3));
    click(&mut game, (6, 0), (5, 2));
    let outcome = click(&mut game, (7, 3), (5, 1));

    let mate = Outcome::Checkmate { winner: Color::White };
    assert_eq!(outcome, TurnOutcome::Finished(mate));
    assert_eq!(game.turn_state(), &TurnState::Finished(mate));
    assert!(game.is_checkmate(Color::Black));
    assert!(!game.is_draw());
    assert!(matches!(game.select_origin(sq(4, 0)), Err(ChessError::GameOver)));
}

#[test]
fn snapshot_resumes_mid_game() {
    let mut game = Game::default();
    click(&mut game, (6, 7), (5, 5));
    click(&mut game, (6, 0), (5, 2));
    click(&mut game, (6, 6), (6, 5));
    click(&mut game, (6, 1), (6, 2));
    click(&mut game, (5, 7), (6, 6));
    click(&mut game, (5, 0), (6, 1));

    let snapshot = game.to_snapshot().unwrap();
    let mut resumed = Game::from_snapshot(&snapshot).unwrap();
    assert_eq!(resumed, game);

    // Both copies can castle and stay in step.
    let a = game.attempt_castle(CastleSide::Kingside).unwrap();
    let b = resumed.attempt_castle(CastleSide::Kingside).unwrap();
    assert_eq!(a, b);
    assert_eq!(resumed.board(), game.board());

    // Undo history travels with the snapshot: black is to move again, before
    // its bishop move and white's castle.
    resumed.undo_turn().unwrap();
    assert_eq!(resumed.to_move(), Color::Black);
    assert!(resumed.board().piece_at(sq(4, 7)).unwrap().is(PieceType::King, Color::White));
    assert!(resumed.board().piece_at(sq(5, 0)).unwrap().is(PieceType::Bishop, Color::Black));
}

#[test]
fn snapshot_with_off_board_square_is_rejected() {
    let mut game = Game::default();
    click(&mut game, (4, 6), (4, 4));
    let mut value: serde_json::Value = serde_json::from_str(&game.to_snapshot().unwrap()).unwrap();
    value["last_moved"] = serde_json::json!({ "x": 9, "y": 0 });

    let before = game.clone();
    let err = game.load_snapshot(&value.to_string()).unwrap_err();
    assert!(matches!(err, ChessError::Snapshot(_)), "got {err:?}");
    assert_eq!(game, before);
}

/// Two seeded computer players only ever play moves the rules allow.
#[test]
fn computer_players_play_legal_moves() {
    let config = GameConfig {
        white_computer: true,
        black_computer: true,
        ..GameConfig::new()
    };
    let mut game = Game::new(config);
    let mut rng = StdRng::seed_from_u64(2024);

    for _ in 0..40 {
        if game.outcome().is_some() {
            break;
        }
        let mover = game.to_move();
        let legal = game.legal_moves();
        let (mv, _) = game.play_computer_turn(&mut rng).expect("computer moves");
        assert!(legal.contains(&mv), "{mover} played {mv}, not in {legal:?}");
        assert!(!game.is_check(mover), "{mover} left its own king in check");
    }
    assert!(game.board().find_king(Color::White).is_some());
    assert!(game.board().find_king(Color::Black).is_some());
}

/// Kings alone are a dead draw as soon as the last other piece goes.
#[test]
fn capture_down_to_bare_kings_is_a_draw() {
    let mut board = Board::empty();
    board.place(sq(4, 7), Some(Piece::new(PieceType::King, Color::White)));
    board.place(sq(4, 0), Some(Piece::new(PieceType::King, Color::Black)));
    board.place(sq(4, 6), Some(Piece::new(PieceType::Knight, Color::Black)));
    let mut game = Game::with_board(board, Color::White, GameConfig::new());

    let outcome = game.attempt_move(sq(4, 7), sq(4, 6)).unwrap();
    assert_eq!(
        outcome,
        TurnOutcome::Finished(Outcome::Draw(chess_core::game::DrawReason::InsufficientMaterial))
    );
}

#[test]
fn coordinates_are_validated() {
    let err = Square::new(8, 0).unwrap_err();
    assert_eq!(err.to_string(), "coordinates (8, 0) are off the board");
    assert!(Square::new(-1, 3).is_err());
    assert_eq!(sq(3, 4).to_string(), "(3, 4)");
}
