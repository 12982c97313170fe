use crate::board::{Board, Mark};
use crate::config::GameParameters;
use crate::reward::evaluate_move;
use crate::states::Tables;

pub mod board;
pub mod config;
pub mod error;
pub mod players;
pub mod q_table;
pub mod reward;
pub mod search;
pub mod states;
pub mod storage;
pub mod trainer;

pub use trainer::{learn_model, train_both_players};

/// Columns that still have room, lowest first.
pub fn legal_moves(board: &Board) -> Vec<usize> {
    board.legal_columns()
}

/// Reward `mark` would get for dropping into `column`, leaving `board` untouched.
pub fn evaluate_single_move(
    board: &Board,
    column: usize,
    mark: Mark,
    params: &GameParameters,
) -> i64 {
    let mut after = board.clone();
    let position = after.drop_disc(column, mark);
    evaluate_move(&after, position, mark, params)
}

/// Enumerates every reachable position for both players with zeroed Q-values.
pub fn generate_tables(params: &GameParameters) -> Tables {
    states::enumerate(params)
}
