use crate::board::{Board, Mark};
use crate::config::GameParameters;
use crate::q_table::QTable;
use crate::reward::{evaluate_move, is_winning_move};
use ndarray::prelude::*;
use std::collections::{HashMap, HashSet};
use std::time::Instant;

/// Stored in place of a state id when a column leads nowhere.
pub const NO_TRANSITION: i64 = -1;

/// Every position in which `mark` is about to move.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerTable {
    pub mark: Mark,
    /// `[state, column]` -> id in the opponent's table, or `NO_TRANSITION`.
    pub transitions: Array2<i64>,
    /// `[state, column]` -> reward for dropping there, or the illegal sentinel.
    pub prizes: Array2<i64>,
    pub boards: Vec<Board>,
    pub q_table: QTable,
}

/// Both players' tables. Transitions from one always land in the other.
#[derive(Debug, Clone, PartialEq)]
pub struct Tables {
    pub first: PlayerTable,
    pub second: PlayerTable,
}

impl PlayerTable {
    pub fn len(&self) -> usize {
        self.boards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    pub fn size_x(&self) -> usize {
        self.transitions.ncols()
    }

    pub fn transition(&self, state: usize, column: usize) -> Option<usize> {
        usize::try_from(self.transitions[[state, column]]).ok()
    }

    pub fn prize(&self, state: usize, column: usize) -> i64 {
        self.prizes[[state, column]]
    }

    /// Columns that lead somewhere from `state`.
    pub fn legal_actions(&self, state: usize) -> Vec<usize> {
        (0..self.size_x())
            .filter(|&column| self.transition(state, column).is_some())
            .collect()
    }

    /// No column carries a real reward: the board is full or the game is won.
    pub fn is_ending_state(&self, state: usize, params: &GameParameters) -> bool {
        self.prizes
            .row(state)
            .iter()
            .all(|&prize| prize == params.not_allowed_move_prize)
    }

    /// Column with the highest immediate reward; the first one wins ties.
    pub fn best_prize_action(&self, state: usize) -> usize {
        let row = self.prizes.row(state);
        let mut action = 0;
        for (column, &prize) in row.iter().enumerate() {
            if prize > row[action] {
                action = column;
            }
        }
        action
    }

    pub fn find(&self, board: &Board) -> Option<usize> {
        self.boards.iter().position(|candidate| candidate == board)
    }

    /// State key -> id, for repeated lookups of live boards.
    pub fn index(&self) -> HashMap<String, usize> {
        self.boards
            .iter()
            .enumerate()
            .map(|(id, board)| (board.to_state_key(), id))
            .collect()
    }
}

impl Tables {
    pub fn table(&self, mark: Mark) -> &PlayerTable {
        match mark {
            Mark::First => &self.first,
            Mark::Second => &self.second,
        }
    }

    pub fn table_mut(&mut self, mark: Mark) -> &mut PlayerTable {
        match mark {
            Mark::First => &mut self.first,
            Mark::Second => &mut self.second,
        }
    }

    /// Id of the empty board in the first player's table.
    pub fn initial_state(&self) -> Option<usize> {
        let size_y = self.first.boards.first().map_or(0, Board::size_y);
        self.first.find(&Board::new(self.first.size_x(), size_y))
    }
}

struct Record {
    key: String,
    board: Board,
    ply: usize,
    prizes: Vec<i64>,
    children: Vec<(String, usize)>,
}

struct Pending {
    board: Board,
    ply: usize,
    ending: bool,
}

/// Walks every reachable position once and builds both players' tables.
pub fn enumerate(params: &GameParameters) -> Tables {
    let t0 = Instant::now();
    let records = explore(params);
    println!(
        "Game tree: {} distinct states in {:.3} seconds",
        records.len(),
        t0.elapsed().as_secs_f64()
    );
    let t0 = Instant::now();
    let tables = index_records(records, params.size_x);
    println!(
        "Indexed {} + {} states in {:.3} seconds",
        tables.first.len(),
        tables.second.len(),
        t0.elapsed().as_secs_f64()
    );
    tables
}

fn explore(params: &GameParameters) -> Vec<Record> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut records = Vec::new();
    let mut worklist = vec![Pending {
        board: Board::new(params.size_x, params.size_y),
        ply: 0,
        ending: false,
    }];
    while let Some(Pending { board, ply, ending }) = worklist.pop() {
        let key = board.to_state_key();
        if !seen.insert(key.clone()) {
            continue;
        }
        let mark = Mark::to_move(ply);
        let mut prizes = vec![params.not_allowed_move_prize; params.size_x];
        let mut children = Vec::new();
        let mut next = Vec::new();
        if !ending && ply < params.max_n_moves {
            for column in board.legal_columns() {
                let mut child = board.clone();
                let position = child.drop_disc(column, mark);
                prizes[column] = evaluate_move(&child, position, mark, params);
                let ending = is_winning_move(&child, position, mark, params.min_to_win);
                children.push((child.to_state_key(), column));
                next.push(Pending {
                    board: child,
                    ply: ply + 1,
                    ending,
                });
            }
        }
        // lowest column on top of the stack
        worklist.extend(next.into_iter().rev());
        records.push(Record {
            key,
            board,
            ply,
            prizes,
            children,
        });
    }
    records
}

fn index_records(records: Vec<Record>, size_x: usize) -> Tables {
    let max_ply = records.iter().map(|r| r.ply).max().unwrap_or(0);
    let mut by_ply: Vec<Vec<Record>> = (0..=max_ply).map(|_| Vec::new()).collect();
    for record in records {
        by_ply[record.ply].push(record);
    }
    let (first, second): (Vec<Record>, Vec<Record>) = by_ply
        .into_iter()
        .flatten()
        .partition(|record| Mark::to_move(record.ply) == Mark::First);

    let (first_links, second_links) = {
        let first_ids = ids(&first);
        let second_ids = ids(&second);
        (
            link(&first, &second_ids, size_x),
            link(&second, &first_ids, size_x),
        )
    };
    Tables {
        first: into_table(Mark::First, first, first_links, size_x),
        second: into_table(Mark::Second, second, second_links, size_x),
    }
}

fn ids(records: &[Record]) -> HashMap<&str, usize> {
    records
        .iter()
        .enumerate()
        .map(|(id, record)| (record.key.as_str(), id))
        .collect()
}

fn link(records: &[Record], opponent_ids: &HashMap<&str, usize>, size_x: usize) -> Array2<i64> {
    let mut transitions = Array2::from_elem((records.len(), size_x), NO_TRANSITION);
    for (id, record) in records.iter().enumerate() {
        for (key, column) in &record.children {
            if let Some(&next) = opponent_ids.get(key.as_str()) {
                transitions[[id, *column]] = next as i64;
            }
        }
    }
    transitions
}

fn into_table(
    mark: Mark,
    records: Vec<Record>,
    transitions: Array2<i64>,
    size_x: usize,
) -> PlayerTable {
    let mut prizes = Array2::zeros((records.len(), size_x));
    for (id, record) in records.iter().enumerate() {
        for (column, &prize) in record.prizes.iter().enumerate() {
            prizes[[id, column]] = prize;
        }
    }
    let q_table = QTable::zeros(records.len(), size_x);
    PlayerTable {
        mark,
        transitions,
        prizes,
        boards: records.into_iter().map(|record| record.board).collect(),
        q_table,
    }
}
