pub mod board;
pub mod engine;
pub mod error;
pub mod game;
pub mod history;
pub mod moves;
pub mod piece;
pub mod square;

pub use error::ChessError;
