use crate::board::{Board, Mark, Position};
use crate::config::GameParameters;

/// The four lines a disc can belong to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Horizontal,
    Vertical,
    Rising,
    Falling,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Horizontal,
        Direction::Vertical,
        Direction::Rising,
        Direction::Falling,
    ];

    /// (column step, row step) of one half of the line.
    fn step(self) -> (isize, isize) {
        match self {
            Direction::Horizontal => (1, 0),
            Direction::Vertical => (0, -1),
            Direction::Rising => (1, 1),
            Direction::Falling => (1, -1),
        }
    }

    // Discs stack, so nothing can sit above a freshly placed one.
    fn both_ways(self) -> bool {
        self != Direction::Vertical
    }
}

fn run_length(
    board: &Board,
    position: Position,
    mark: Mark,
    (dx, dy): (isize, isize),
    cap: usize,
) -> usize {
    let mut x = position.column as isize + dx;
    let mut y = position.row as isize + dy;
    let mut repeats = 0;
    while repeats < cap
        && (0..board.size_x() as isize).contains(&x)
        && (0..board.size_y() as isize).contains(&y)
        && board[[y as usize, x as usize]] == mark.as_cell()
    {
        repeats += 1;
        x += dx;
        y += dy;
    }
    repeats
}

/// Length of the `mark` line through `position`, counting the cell itself.
/// Each half of the line is capped at `min_to_win`.
pub fn count_line(
    board: &Board,
    position: Position,
    mark: Mark,
    direction: Direction,
    min_to_win: usize,
) -> usize {
    let (dx, dy) = direction.step();
    let mut row = 1 + run_length(board, position, mark, (dx, dy), min_to_win);
    if direction.both_ways() {
        row += run_length(board, position, mark, (-dx, -dy), min_to_win);
    }
    row
}

pub fn is_winning_move(board: &Board, position: Position, mark: Mark, min_to_win: usize) -> bool {
    Direction::ALL
        .iter()
        .any(|&direction| count_line(board, position, mark, direction, min_to_win) >= min_to_win)
}

/// Reward for the disc `mark` just placed at `position`.
pub fn evaluate_move(
    board: &Board,
    position: Position,
    mark: Mark,
    params: &GameParameters,
) -> i64 {
    let min_to_win = params.min_to_win;
    let mut prize = params.move_point;
    if is_winning_move(board, position, mark, min_to_win) {
        prize += params.win_prize;
    }
    for direction in Direction::ALL {
        let repeats = count_line(board, position, mark, direction, min_to_win) - 1;
        if repeats != 0 {
            if repeats == min_to_win - 1 {
                prize += params.points_for_creating_ending_state;
            }
            prize += repeats as i64 * params.points_for_rows;
        }
        let repeats = count_line(board, position, mark.other(), direction, min_to_win) - 1;
        if repeats != 0 {
            if repeats == min_to_win - 1 {
                prize += params.points_for_preventing_ending_state;
            }
            prize += repeats as i64 * params.points_for_blocking;
        }
    }
    prize
}
