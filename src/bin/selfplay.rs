use std::env;

use chess_core::game::{Game, GameConfig, TurnOutcome};

const MAX_HALF_MOVES: u32 = 300;

fn main() {
    let print_snapshot = env::args().any(|arg| arg == "--snapshot");

    let config = GameConfig {
        white_computer: true,
        black_computer: true,
        ..GameConfig::new()
    };
    let mut game = Game::new(config);
    let mut rng = rand::thread_rng();
    let mut half_moves = 0;

    while game.outcome().is_none() && half_moves < MAX_HALF_MOVES {
        let mover = game.to_move();
        match game.play_computer_turn(&mut rng) {
            Ok((mv, outcome)) => {
                half_moves += 1;
                let note = match outcome {
                    TurnOutcome::Continue { check: true } => " check",
                    _ => "",
                };
                eprintln!("{half_moves:>3}. {mover}: {mv}{note}");
            }
            Err(e) => {
                eprintln!("{mover} could not move: {e}");
                break;
            }
        }
    }

    let result = game
        .outcome()
        .map(|o| o.to_string())
        .unwrap_or_else(|| "ongoing".to_string());
    eprintln!("Game over after {half_moves} half-moves: {result}");

    if print_snapshot {
        match game.to_snapshot() {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("snapshot failed: {e}"),
        }
    }
}
