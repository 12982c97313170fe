use crate::board::{Board, Mark, Position};
use crate::config::GameParameters;
use crate::reward::{evaluate_move, is_winning_move};
use rand::prelude::SliceRandom;
use rand::Rng;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    Max,
    Min,
}

impl Role {
    fn flip(self) -> Self {
        match self {
            Role::Max => Role::Min,
            Role::Min => Role::Max,
        }
    }

    fn worst(self) -> f64 {
        match self {
            Role::Max => f64::NEG_INFINITY,
            Role::Min => f64::INFINITY,
        }
    }
}

/// A column together with the value the search gave it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scored {
    pub column: Option<usize>,
    pub score: f64,
}

/// Depth-limited alpha-beta over a live board, scored for `agent`.
pub struct AlphaBeta<'a, R: Rng> {
    params: &'a GameParameters,
    agent: Mark,
    rng: R,
}

impl<'a, R: Rng> AlphaBeta<'a, R> {
    pub fn new(params: &'a GameParameters, agent: Mark, rng: R) -> Self {
        AlphaBeta { params, agent, rng }
    }

    /// Column `agent` should play on `board`, `plies` half-moves into the game.
    pub fn choose_column(&mut self, board: &Board, depth: usize, plies: usize) -> Option<usize> {
        let scored = self.search(
            board,
            depth,
            Role::Max,
            None,
            (f64::NEG_INFINITY, f64::INFINITY),
            plies,
        );
        scored
            .column
            .or_else(|| board.legal_columns().first().copied())
    }

    fn frame(&self, value: f64, mover: Mark) -> f64 {
        if mover == self.agent {
            value
        } else {
            -value
        }
    }

    fn search(
        &mut self,
        board: &Board,
        depth: usize,
        role: Role,
        last: Option<(Position, Mark)>,
        (mut alpha, mut beta): (f64, f64),
        plies: usize,
    ) -> Scored {
        let (current, won) = match last {
            Some((position, who)) => {
                let won = is_winning_move(board, position, who, self.params.min_to_win);
                let prize = if won { self.params.win_prize as f64 } else { 0.0 };
                (self.frame(prize, who), won)
            }
            None => (0.0, false),
        };
        if board.is_full() || depth == 0 || won {
            return Scored {
                column: last.map(|(position, _)| position.column),
                score: current,
            };
        }

        let mover = Mark::to_move(plies);
        let mut candidates: Vec<(usize, f64)> = board
            .legal_columns()
            .into_iter()
            .map(|column| (column, 0.0))
            .collect();
        if plies / 2 >= self.params.random_plays(mover) {
            for (column, heuristic) in candidates.iter_mut() {
                let mut child = board.clone();
                let position = child.drop_disc(*column, mover);
                *heuristic = evaluate_move(&child, position, mover, self.params) as f64;
            }
            // stable, so equal heuristics keep ascending column order
            candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
        } else {
            candidates.shuffle(&mut self.rng);
        }

        let mut best = Scored {
            column: None,
            score: role.worst(),
        };
        for (column, heuristic) in candidates {
            let local = self.frame(heuristic, mover);
            let mut child = board.clone();
            let position = child.drop_disc(column, mover);
            let reply = self.search(
                &child,
                depth - 1,
                role.flip(),
                Some((position, mover)),
                (alpha - local, beta - local),
                plies + 1,
            );
            let score = reply.score + local;
            let improves = match role {
                Role::Max => score > best.score,
                Role::Min => score < best.score,
            };
            if improves {
                best = Scored {
                    column: Some(column),
                    score,
                };
            }
            match role {
                Role::Max => {
                    if score >= beta {
                        break;
                    }
                    alpha = alpha.max(score);
                }
                Role::Min => {
                    if score <= alpha {
                        break;
                    }
                    beta = beta.min(score);
                }
            }
        }
        best
    }
}
