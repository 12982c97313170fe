use ndarray::prelude::*;
use std::ops::{Deref, DerefMut};

/// Learned action values, one row per state and one column per board column.
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    values: Array2<f64>,
}

impl Deref for QTable {
    type Target = Array2<f64>;
    fn deref(&self) -> &<Self as Deref>::Target {
        &self.values
    }
}

impl DerefMut for QTable {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.values
    }
}

impl From<Array2<f64>> for QTable {
    fn from(values: Array2<f64>) -> Self {
        QTable { values }
    }
}

/// One-step Q-learning target blend.
pub fn blend(old: f64, reward: f64, next_max: f64, alpha: f64, gamma: f64) -> f64 {
    (1.0 - alpha) * old + alpha * (reward + gamma * next_max)
}

impl QTable {
    pub fn zeros(n_states: usize, n_columns: usize) -> Self {
        QTable {
            values: Array2::zeros((n_states, n_columns)),
        }
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.values.outer_iter().map(|row| row.to_vec()).collect()
    }

    pub fn value(&self, state: usize, column: usize) -> f64 {
        self.values[[state, column]]
    }

    /// Largest value in the row, illegal columns included.
    pub fn max_value(&self, state: usize) -> f64 {
        let row = self.values.row(state);
        row.iter().skip(1).fold(row[0], |acc, &v| if v > acc { v } else { acc })
    }

    /// Greedy column among those `allowed`; the first one seen wins ties.
    pub fn best_action<F>(&self, state: usize, allowed: F) -> Option<usize>
    where
        F: Fn(usize) -> bool,
    {
        let row = self.values.row(state);
        let mut best: Option<(usize, f64)> = None;
        for (column, &value) in row.iter().enumerate() {
            if !allowed(column) {
                continue;
            }
            match best {
                Some((_, max_value)) if value <= max_value => {}
                _ => best = Some((column, value)),
            }
        }
        best.map(|(column, _)| column)
    }

    pub fn update(
        &mut self,
        state: usize,
        column: usize,
        reward: f64,
        next_max: f64,
        alpha: f64,
        gamma: f64,
    ) -> f64 {
        let cell = &mut self.values[[state, column]];
        *cell = blend(*cell, reward, next_max, alpha, gamma);
        *cell
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_learning_rate_leaves_value_alone() {
        let mut q = QTable::zeros(2, 3);
        q[[1, 2]] = 4.5;
        for _ in 0..10 {
            q.update(1, 2, 10.0, 7.0, 0.0, 0.9);
        }
        assert_eq!(q.value(1, 2), 4.5);
    }

    #[test]
    fn repeated_updates_reach_fixed_point() {
        let (reward, alpha, gamma) = (2.0, 0.5, 0.75);
        let mut q = QTable::zeros(1, 1);
        for _ in 0..500 {
            let next_max = q.value(0, 0);
            q.update(0, 0, reward, next_max, alpha, gamma);
        }
        let expected = reward / (1.0 - gamma);
        assert!((q.value(0, 0) - expected).abs() < 1e-9, "got {}", q.value(0, 0));
    }

    #[test]
    fn fixed_target_is_approached() {
        let mut q = QTable::zeros(1, 2);
        for _ in 0..200 {
            q.update(0, 1, 1.0, 3.0, 0.3, 0.5);
        }
        assert!((q.value(0, 1) - 2.5).abs() < 1e-9);
        assert_eq!(q.value(0, 0), 0.0);
    }

    #[test]
    fn best_action_skips_disallowed_and_keeps_first_tie() {
        let mut q = QTable::zeros(1, 4);
        q[[0, 0]] = 9.0;
        q[[0, 1]] = 2.0;
        q[[0, 3]] = 2.0;
        assert_eq!(q.best_action(0, |c| c != 0), Some(1));
        assert_eq!(q.best_action(0, |_| true), Some(0));
        assert_eq!(q.best_action(0, |_| false), None);
    }

    #[test]
    fn max_value_covers_whole_row() {
        let mut q = QTable::zeros(1, 3);
        q[[0, 0]] = -1.0;
        q[[0, 2]] = -0.5;
        assert_eq!(q.max_value(0), 0.0);
    }

    #[test]
    fn rows_round_trip() {
        let mut q = QTable::zeros(2, 2);
        q[[0, 1]] = 0.25;
        let rows = q.to_rows();
        assert_eq!(rows, vec![vec![0.0, 0.25], vec![0.0, 0.0]]);
        let values = Array2::from_shape_vec((2, 2), rows.concat()).unwrap();
        assert_eq!(QTable::from(values), q);
    }
}
