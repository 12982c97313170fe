use crate::board::{Board, Mark, Position};
use crate::config::GameParameters;
use crate::reward::is_winning_move;
use crate::search::AlphaBeta;
use crate::states::PlayerTable;
use rand::prelude::SliceRandom;
use rand::thread_rng;
use std::collections::HashMap;
use std::fmt;

pub trait Player {
    fn get_mark(&self) -> Mark;
    fn get_name(&self) -> &str;
    fn choose_move(&mut self, board: &Board, plies: usize) -> usize;
    fn make_move(&self, board: &mut Board, column: usize) -> Position {
        board.drop_disc(column, self.get_mark())
    }
}

#[derive(Debug)]
pub struct RandomPlayer {
    pub name: String,
    pub mark: Mark,
}

#[derive(Debug)]
pub struct AlphaBetaPlayer {
    pub name: String,
    pub mark: Mark,
    pub depth: usize,
    pub params: GameParameters,
}

/// Plays greedily from a trained table and searches when the board is unknown.
#[derive(Debug)]
pub struct TrainedPlayer {
    pub name: String,
    table: PlayerTable,
    index: HashMap<String, usize>,
    fallback: AlphaBetaPlayer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Winner(Mark),
    Draw,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MatchRecord {
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
}

impl fmt::Display for MatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} wins, {} draws, {} losses",
            self.wins, self.draws, self.losses
        )
    }
}

impl RandomPlayer {
    pub fn new(name: &str, mark: Mark) -> Self {
        RandomPlayer {
            name: name.to_owned(),
            mark,
        }
    }
}

impl Player for RandomPlayer {
    fn get_mark(&self) -> Mark {
        self.mark
    }
    fn get_name(&self) -> &str {
        &self.name
    }
    fn choose_move(&mut self, board: &Board, _plies: usize) -> usize {
        let columns = board.legal_columns();
        *columns
            .choose(&mut thread_rng())
            .expect("a move is only requested while the board has room")
    }
}

impl AlphaBetaPlayer {
    pub fn new(name: &str, mark: Mark, params: &GameParameters) -> Self {
        AlphaBetaPlayer {
            name: name.to_owned(),
            mark,
            depth: params.depth(mark),
            params: params.clone(),
        }
    }
}

impl Player for AlphaBetaPlayer {
    fn get_mark(&self) -> Mark {
        self.mark
    }
    fn get_name(&self) -> &str {
        &self.name
    }
    fn choose_move(&mut self, board: &Board, plies: usize) -> usize {
        AlphaBeta::new(&self.params, self.mark, thread_rng())
            .choose_column(board, self.depth, plies)
            .expect("a move is only requested while the board has room")
    }
}

impl TrainedPlayer {
    pub fn new(name: &str, table: PlayerTable, params: &GameParameters) -> Self {
        let index = table.index();
        let fallback = AlphaBetaPlayer::new(name, table.mark, params);
        TrainedPlayer {
            name: name.to_owned(),
            table,
            index,
            fallback,
        }
    }

    /// Greedy column for a board the table knows about.
    pub fn table_move(&self, board: &Board) -> Option<usize> {
        let &state = self.index.get(&board.to_state_key())?;
        self.table
            .q_table
            .best_action(state, |column| self.table.transition(state, column).is_some())
    }
}

impl Player for TrainedPlayer {
    fn get_mark(&self) -> Mark {
        self.table.mark
    }
    fn get_name(&self) -> &str {
        &self.name
    }
    fn choose_move(&mut self, board: &Board, plies: usize) -> usize {
        match self.table_move(board) {
            Some(column) => column,
            None => self.fallback.choose_move(board, plies),
        }
    }
}

/// Plays one game on a live board. `first` moves on even plies.
pub fn play_game(
    first: &mut dyn Player,
    second: &mut dyn Player,
    params: &GameParameters,
) -> GameOutcome {
    let mut board = Board::new(params.size_x, params.size_y);
    let mut plies = 0;
    while !board.is_full() && plies < params.max_n_moves {
        let player: &mut dyn Player = match Mark::to_move(plies) {
            Mark::First => &mut *first,
            Mark::Second => &mut *second,
        };
        let column = player.choose_move(&board, plies);
        let position = player.make_move(&mut board, column);
        if is_winning_move(&board, position, player.get_mark(), params.min_to_win) {
            return GameOutcome::Winner(player.get_mark());
        }
        plies += 1;
    }
    GameOutcome::Draw
}

/// Plays `games` games and tallies them from `agent`'s side.
pub fn evaluate(
    agent: &mut dyn Player,
    opponent: &mut dyn Player,
    games: usize,
    params: &GameParameters,
) -> MatchRecord {
    let mut record = MatchRecord::default();
    for _ in 0..games {
        let outcome = match agent.get_mark() {
            Mark::First => play_game(agent, opponent, params),
            Mark::Second => play_game(opponent, agent, params),
        };
        match outcome {
            GameOutcome::Winner(mark) if mark == agent.get_mark() => record.wins += 1,
            GameOutcome::Winner(_) => record.losses += 1,
            GameOutcome::Draw => record.draws += 1,
        }
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::states::enumerate;

    #[test]
    fn random_player_stays_legal() {
        let mut board = Board::new(3, 2);
        board.drop_disc(0, Mark::First);
        board.drop_disc(0, Mark::Second);
        let mut player = RandomPlayer::new("random", Mark::First);
        for _ in 0..50 {
            assert_ne!(player.choose_move(&board, 2), 0);
        }
    }

    #[test]
    fn games_finish_with_an_outcome() {
        let params = GameParameters::with_board(4, 3, 3);
        let mut first = RandomPlayer::new("one", Mark::First);
        let mut second = AlphaBetaPlayer::new("two", Mark::Second, &params);
        for _ in 0..10 {
            let outcome = play_game(&mut first, &mut second, &params);
            assert!(matches!(outcome, GameOutcome::Winner(_) | GameOutcome::Draw));
        }
    }

    #[test]
    fn trained_player_reads_its_table() {
        let params = GameParameters::with_board(2, 2, 2);
        let mut tables = enumerate(&params);
        tables.first.q_table[[0, 1]] = 1.0;
        let player = TrainedPlayer::new("trained", tables.first, &params);
        let board = Board::new(2, 2);
        assert_eq!(player.table_move(&board), Some(1));
        let mut unknown = Board::new(2, 2);
        unknown.drop_disc(0, Mark::First);
        assert_eq!(player.table_move(&unknown), None);
    }

    #[test]
    fn search_beats_random_on_small_board() {
        let params = GameParameters {
            random_plays1: 0,
            depth_1: 3,
            ..GameParameters::with_board(4, 4, 3)
        };
        let mut agent = AlphaBetaPlayer::new("search", Mark::First, &params);
        let mut opponent = RandomPlayer::new("random", Mark::Second);
        let record = evaluate(&mut agent, &mut opponent, 30, &params);
        assert_eq!(record.wins + record.draws + record.losses, 30);
        assert!(record.wins > record.losses, "{record}");
    }
}
