use crate::board::Mark;
use crate::config::GameParameters;
use crate::error::TrainingError;
use crate::search::AlphaBeta;
use crate::states::{PlayerTable, Tables};
use crate::storage::write_player_table;
use rand::prelude::SliceRandom;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use std::thread;

/// Tabular Q-learning for one mark over a private copy of the tables.
pub struct Trainer<'a, R: Rng> {
    params: &'a GameParameters,
    trained: Mark,
    tables: Tables,
    initial: usize,
    rng: R,
}

impl<'a, R: Rng> Trainer<'a, R> {
    pub fn new(
        params: &'a GameParameters,
        trained: Mark,
        tables: Tables,
        rng: R,
    ) -> Result<Self, TrainingError> {
        let initial = tables.initial_state().ok_or(TrainingError::NoInitialState)?;
        Ok(Trainer {
            params,
            trained,
            tables,
            initial,
            rng,
        })
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    pub fn tables_mut(&mut self) -> &mut Tables {
        &mut self.tables
    }

    pub fn into_tables(self) -> Tables {
        self.tables
    }

    /// The table this trainer has been updating.
    pub fn into_table(self) -> PlayerTable {
        match self.trained {
            Mark::First => self.tables.first,
            Mark::Second => self.tables.second,
        }
    }

    /// Epsilon-greedy over the columns that lead somewhere.
    pub fn choose_action(&mut self, state: usize) -> Result<usize, TrainingError> {
        let table = self.tables.table(self.trained);
        let legal = table.legal_actions(state);
        let action = if self.rng.gen::<f64>() < self.params.epsilon {
            legal.choose(&mut self.rng).copied()
        } else {
            table
                .q_table
                .best_action(state, |column| table.transition(state, column).is_some())
        };
        action.ok_or(TrainingError::NoLegalAction {
            mark: self.trained,
            state,
        })
    }

    /// Bootstrap value for landing on `next` in the opponent's table.
    ///
    /// Rather than maximising Q over the opponent's position, this follows
    /// the opponent's highest-reward reply back into our own table and
    /// maximises Q there.
    pub fn next_max(&self, next: usize) -> Result<f64, TrainingError> {
        let opponent = self.tables.table(self.trained.other());
        if opponent.is_ending_state(next, self.params) {
            return Ok(self.params.win_prize as f64);
        }
        // Enumerated full boards carry only sentinel prizes and are caught
        // above; this only answers for hand-built tables.
        if opponent.boards[next].is_full() {
            return Ok(self.params.draw_prize as f64);
        }
        let reply = opponent.best_prize_action(next);
        let own = opponent
            .transition(next, reply)
            .ok_or(TrainingError::MissingTransition {
                mark: opponent.mark,
                state: next,
                column: reply,
            })?;
        Ok(self.tables.table(self.trained).q_table.max_value(own))
    }

    /// Picks an action from `state`, updates its Q-value and returns the
    /// opponent's state it leads to.
    pub fn train_step(&mut self, state: usize) -> Result<usize, TrainingError> {
        let action = self.choose_action(state)?;
        let table = self.tables.table(self.trained);
        let next = table
            .transition(state, action)
            .ok_or(TrainingError::MissingTransition {
                mark: self.trained,
                state,
                column: action,
            })?;
        let reward = table.prize(state, action) as f64;
        let next_max = self.next_max(next)?;
        let (alpha, gamma) = (self.params.alpha, self.params.gamma);
        self.tables
            .table_mut(self.trained)
            .q_table
            .update(state, action, reward, next_max, alpha, gamma);
        Ok(next)
    }

    fn opponent_column(
        &mut self,
        state: usize,
        plies: usize,
        random: bool,
    ) -> Result<usize, TrainingError> {
        let opponent = self.trained.other();
        let board = &self.tables.table(opponent).boards[state];
        let column = if random {
            board.legal_columns().choose(&mut self.rng).copied()
        } else {
            AlphaBeta::new(self.params, opponent, &mut self.rng).choose_column(
                board,
                self.params.depth(opponent),
                plies,
            )
        };
        column.ok_or(TrainingError::NoLegalAction {
            mark: opponent,
            state,
        })
    }

    /// Plays one game from the empty board, returning how many plies it took.
    pub fn run_episode(&mut self) -> Result<usize, TrainingError> {
        let opponent = self.trained.other();
        let random_opponent = self.rng.gen::<f64>() < self.params.random_moves(opponent);
        let mut mover = Mark::First;
        let mut plies = 0;
        let mut state = self.initial;
        while !self.tables.table(mover).is_ending_state(state, self.params)
            && plies < self.params.max_n_moves
        {
            state = if mover == self.trained {
                self.train_step(state)?
            } else {
                let column = self.opponent_column(state, plies, random_opponent)?;
                self.tables
                    .table(mover)
                    .transition(state, column)
                    .ok_or(TrainingError::MissingTransition {
                        mark: mover,
                        state,
                        column,
                    })?
            };
            plies += 1;
            mover = mover.other();
        }
        Ok(plies)
    }

    pub fn train(&mut self, episodes: usize) -> Result<(), TrainingError> {
        let label = match self.trained {
            Mark::First => "First",
            Mark::Second => "Second",
        };
        let tenth = (episodes / 10).max(1);
        let mut percentage = 0;
        for episode in 1..=episodes {
            self.run_episode()?;
            if episode % tenth == 0 && percentage < 100 {
                percentage += 10;
                println!("{label} model: {percentage} %");
            }
        }
        Ok(())
    }
}

/// Trains `trained`'s table on its own copy of `tables`, optionally saving it.
pub fn learn_model<R: Rng>(
    params: &GameParameters,
    trained: Mark,
    tables: Tables,
    episodes: usize,
    output: Option<&Path>,
    rng: R,
) -> Result<PlayerTable, TrainingError> {
    let mut trainer = Trainer::new(params, trained, tables, rng)?;
    trainer.train(episodes)?;
    let table = trainer.into_table();
    if let Some(path) = output {
        write_player_table(path, &table)?;
    }
    Ok(table)
}

fn worker_rng(seed: Option<u64>, mark: Mark) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(mark.index() as u64)),
        None => StdRng::from_entropy(),
    }
}

/// Trains both players at once, each on a private copy, then merges them.
pub fn train_both_players(
    params: &GameParameters,
    tables: &Tables,
    episodes: usize,
    outputs: [Option<PathBuf>; 2],
    seed: Option<u64>,
) -> Result<Tables, TrainingError> {
    let [first_output, second_output] = outputs;
    let (first, second) = thread::scope(|scope| {
        let first = scope.spawn(|| {
            learn_model(
                params,
                Mark::First,
                tables.clone(),
                episodes,
                first_output.as_deref(),
                worker_rng(seed, Mark::First),
            )
        });
        let second = scope.spawn(|| {
            learn_model(
                params,
                Mark::Second,
                tables.clone(),
                episodes,
                second_output.as_deref(),
                worker_rng(seed, Mark::Second),
            )
        });
        (first.join(), second.join())
    });
    let first = first.map_err(|_| TrainingError::WorkerPanicked(Mark::First))??;
    let second = second.map_err(|_| TrainingError::WorkerPanicked(Mark::Second))??;
    Ok(Tables { first, second })
}
