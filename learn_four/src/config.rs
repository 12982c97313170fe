use crate::board::Mark;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const NUM_EPISODES: usize = 100_000_usize;

/// Every knob the core reads. Field names match the JSON metafile keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameParameters {
    pub size_x: usize,
    pub size_y: usize,
    pub max_n_moves: usize,
    pub min_to_win: usize,
    pub not_allowed_move_prize: i64,
    pub draw_prize: i64,
    pub win_prize: i64,
    pub move_point: i64,
    pub points_for_rows: i64,
    pub points_for_blocking: i64,
    pub points_for_creating_ending_state: i64,
    pub points_for_preventing_ending_state: i64,
    pub alpha: f64,
    pub gamma: f64,
    pub epsilon: f64,
    pub random_moves1: f64,
    pub random_moves2: f64,
    pub depth_1: usize,
    pub depth_2: usize,
    pub random_plays1: usize,
    pub random_plays2: usize,
}

impl Default for GameParameters {
    fn default() -> Self {
        GameParameters {
            size_x: 5,
            size_y: 4,
            max_n_moves: 20,
            min_to_win: 4,
            not_allowed_move_prize: -100,
            draw_prize: 5,
            win_prize: 100,
            move_point: 1,
            points_for_rows: 2,
            points_for_blocking: 2,
            points_for_creating_ending_state: 20,
            points_for_preventing_ending_state: 15,
            alpha: 0.75,
            gamma: 0.75,
            epsilon: 0.3,
            random_moves1: 0.5,
            random_moves2: 0.5,
            depth_1: 2,
            depth_2: 2,
            random_plays1: 1,
            random_plays2: 1,
        }
    }
}

impl GameParameters {
    /// Board of the given shape, everything else at its default.
    pub fn with_board(size_x: usize, size_y: usize, min_to_win: usize) -> Self {
        GameParameters {
            size_x,
            size_y,
            max_n_moves: size_x * size_y,
            min_to_win,
            ..GameParameters::default()
        }
    }

    pub fn random_moves(&self, mark: Mark) -> f64 {
        match mark {
            Mark::First => self.random_moves1,
            Mark::Second => self.random_moves2,
        }
    }

    pub fn depth(&self, mark: Mark) -> usize {
        match mark {
            Mark::First => self.depth_1,
            Mark::Second => self.depth_2,
        }
    }

    pub fn random_plays(&self, mark: Mark) -> usize {
        match mark {
            Mark::First => self.random_plays1,
            Mark::Second => self.random_plays2,
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let params: GameParameters = serde_json::from_str(&content)?;
        params.validate()?;
        Ok(params)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size_x == 0 || self.size_y == 0 {
            return Err(ConfigError::Validation(
                "size_x and size_y must be > 0".into(),
            ));
        }
        if self.min_to_win < 2 {
            return Err(ConfigError::Validation("min_to_win must be >= 2".into()));
        }
        for (name, rate) in [
            ("alpha", self.alpha),
            ("gamma", self.gamma),
            ("epsilon", self.epsilon),
            ("random_moves1", self.random_moves1),
            ("random_moves2", self.random_moves2),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::Validation(format!("{name} must be in [0, 1]")));
            }
        }
        // A legal move scores at least move_point once the shaping weights are
        // non-negative, so the sentinel stays distinguishable.
        let weights = [
            self.points_for_rows,
            self.points_for_blocking,
            self.points_for_creating_ending_state,
            self.points_for_preventing_ending_state,
            self.win_prize,
        ];
        if weights.iter().any(|w| *w < 0) {
            return Err(ConfigError::Validation(
                "reward weights must be >= 0".into(),
            ));
        }
        if self.not_allowed_move_prize >= self.move_point {
            return Err(ConfigError::Validation(
                "not_allowed_move_prize must be below move_point".into(),
            ));
        }
        Ok(())
    }
}
