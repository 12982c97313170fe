use crate::board::{Board, Mark};
use crate::error::StorageError;
use crate::q_table::QTable;
use crate::states::{PlayerTable, Tables};
use chrono::offset::Local;
use ndarray::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// On-disk form of one player's table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerTableRecord {
    #[serde(rename = "States")]
    pub states: Vec<Vec<i64>>,
    #[serde(rename = "Q-Tables")]
    pub q_tables: Vec<Vec<f64>>,
    #[serde(rename = "Prizes")]
    pub prizes: Vec<Vec<i64>>,
    #[serde(rename = "Boards")]
    pub boards: Vec<Vec<Vec<u8>>>,
}

/// On-disk form of both tables; each field holds `[first, second]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablesRecord {
    #[serde(rename = "States")]
    pub states: [Vec<Vec<i64>>; 2],
    #[serde(rename = "Q-Tables")]
    pub q_tables: [Vec<Vec<f64>>; 2],
    #[serde(rename = "Prizes")]
    pub prizes: [Vec<Vec<i64>>; 2],
    #[serde(rename = "Boards")]
    pub boards: [Vec<Vec<Vec<u8>>>; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Pickle,
}

impl Format {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("pickle") | Some("pkl") => Format::Pickle,
            _ => Format::Json,
        }
    }
}

fn array_rows<T: Clone>(array: &Array2<T>) -> Vec<Vec<T>> {
    array.outer_iter().map(|row| row.to_vec()).collect()
}

fn rows_to_array<T: Clone>(
    rows: &[Vec<T>],
    width: usize,
    what: &str,
) -> Result<Array2<T>, StorageError> {
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != width) {
        return Err(StorageError::Shape(format!(
            "{what} row {i} has {} columns, expected {width}",
            row.len()
        )));
    }
    let flat: Vec<T> = rows.iter().flatten().cloned().collect();
    Array2::from_shape_vec((rows.len(), width), flat)
        .map_err(|e| StorageError::Shape(format!("{what}: {e}")))
}

impl From<&PlayerTable> for PlayerTableRecord {
    fn from(table: &PlayerTable) -> Self {
        PlayerTableRecord {
            states: array_rows(&table.transitions),
            q_tables: table.q_table.to_rows(),
            prizes: array_rows(&table.prizes),
            boards: table.boards.iter().map(Board::to_rows).collect(),
        }
    }
}

impl PlayerTableRecord {
    pub fn into_table(self, mark: Mark) -> Result<PlayerTable, StorageError> {
        let n_states = self.states.len();
        if [self.q_tables.len(), self.prizes.len(), self.boards.len()]
            .iter()
            .any(|&len| len != n_states)
        {
            return Err(StorageError::Shape(format!(
                "{} states, {} Q rows, {} prize rows, {} boards",
                n_states,
                self.q_tables.len(),
                self.prizes.len(),
                self.boards.len()
            )));
        }
        let width = self
            .boards
            .first()
            .and_then(|rows| rows.first())
            .map_or(0, Vec::len);
        let size_y = self.boards.first().map_or(0, Vec::len);
        let transitions = rows_to_array(&self.states, width, "States")?;
        let prizes = rows_to_array(&self.prizes, width, "Prizes")?;
        let q_table = QTable::from(rows_to_array(&self.q_tables, width, "Q-Tables")?);
        let boards = self
            .boards
            .iter()
            .enumerate()
            .map(|(i, rows)| {
                if rows.len() != size_y {
                    return Err(StorageError::Shape(format!(
                        "Boards entry {i} has {} rows, expected {size_y}",
                        rows.len()
                    )));
                }
                rows_to_array(rows, width, &format!("Boards entry {i}")).map(Board::from)
            })
            .collect::<Result<Vec<Board>, _>>()?;
        Ok(PlayerTable {
            mark,
            transitions,
            prizes,
            boards,
            q_table,
        })
    }
}

impl From<&Tables> for TablesRecord {
    fn from(tables: &Tables) -> Self {
        let first = PlayerTableRecord::from(&tables.first);
        let second = PlayerTableRecord::from(&tables.second);
        TablesRecord {
            states: [first.states, second.states],
            q_tables: [first.q_tables, second.q_tables],
            prizes: [first.prizes, second.prizes],
            boards: [first.boards, second.boards],
        }
    }
}

impl TablesRecord {
    pub fn into_tables(self) -> Result<Tables, StorageError> {
        let [states1, states2] = self.states;
        let [q1, q2] = self.q_tables;
        let [prizes1, prizes2] = self.prizes;
        let [boards1, boards2] = self.boards;
        let first = PlayerTableRecord {
            states: states1,
            q_tables: q1,
            prizes: prizes1,
            boards: boards1,
        };
        let second = PlayerTableRecord {
            states: states2,
            q_tables: q2,
            prizes: prizes2,
            boards: boards2,
        };
        Ok(Tables {
            first: first.into_table(Mark::First)?,
            second: second.into_table(Mark::Second)?,
        })
    }
}

fn write_record<T: Serialize>(path: &Path, record: &T) -> Result<(), StorageError> {
    let mut writer = BufWriter::new(File::create(path)?);
    match Format::from_path(path) {
        Format::Json => serde_json::to_writer(&mut writer, record)?,
        Format::Pickle => serde_pickle::to_writer(&mut writer, record, serde_pickle::SerOptions::new())?,
    }
    writer.flush()?;
    Ok(())
}

fn read_record<T: DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    let reader = BufReader::new(File::open(path)?);
    let record = match Format::from_path(path) {
        Format::Json => serde_json::from_reader(reader)?,
        Format::Pickle => serde_pickle::from_reader(reader, serde_pickle::DeOptions::new())?,
    };
    Ok(record)
}

pub fn write_tables(path: &Path, tables: &Tables) -> Result<(), StorageError> {
    write_record(path, &TablesRecord::from(tables))
}

pub fn read_tables(path: &Path) -> Result<Tables, StorageError> {
    read_record::<TablesRecord>(path)?.into_tables()
}

pub fn write_player_table(path: &Path, table: &PlayerTable) -> Result<(), StorageError> {
    write_record(path, &PlayerTableRecord::from(table))
}

pub fn read_player_table(path: &Path, mark: Mark) -> Result<PlayerTable, StorageError> {
    read_record::<PlayerTableRecord>(path)?.into_table(mark)
}

/// `<prefix>-<today>.<extension>`, the way trained archives are named.
pub fn dated_file_name(prefix: &str, extension: &str) -> String {
    let today = Local::now().date_naive();
    format!("{prefix}-{today}.{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameParameters;
    use crate::states::enumerate;

    fn trained_tables() -> Tables {
        let mut tables = enumerate(&GameParameters::with_board(3, 2, 2));
        tables.first.q_table[[0, 1]] = 0.123_456_789;
        tables.second.q_table[[3, 2]] = -42.5;
        tables
    }

    #[test]
    fn json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tables.json");
        let tables = trained_tables();
        write_tables(&path, &tables).unwrap();
        let loaded = read_tables(&path).unwrap();
        assert_eq!(loaded.first.boards, tables.first.boards);
        assert_eq!(loaded.second.prizes, tables.second.prizes);
        assert_eq!(loaded.first.transitions, tables.first.transitions);
        assert_eq!(loaded.second.q_table.shape(), tables.second.q_table.shape());
        for (a, b) in loaded.first.q_table.iter().zip(tables.first.q_table.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn pickle_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tables.pickle");
        let tables = trained_tables();
        write_tables(&path, &tables).unwrap();
        assert_eq!(read_tables(&path).unwrap(), tables);
    }

    #[test]
    fn single_player_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tables2.json");
        let tables = trained_tables();
        write_player_table(&path, &tables.second).unwrap();
        let loaded = read_player_table(&path, Mark::Second).unwrap();
        assert_eq!(loaded.boards, tables.second.boards);
        assert_eq!(loaded.transitions, tables.second.transitions);
    }

    #[test]
    fn record_uses_external_field_names() {
        let tables = trained_tables();
        let json = serde_json::to_value(PlayerTableRecord::from(&tables.first)).unwrap();
        for key in ["States", "Q-Tables", "Prizes", "Boards"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["States"][0], serde_json::json!([0, 1, 2]));
        assert_eq!(json["Boards"][0], serde_json::json!([[0, 0, 0], [0, 0, 0]]));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let record: PlayerTableRecord = serde_json::from_str(
            r#"{"States": [[1, -1], [-1]],
                "Q-Tables": [[0.0, 0.0], [0.0, 0.0]],
                "Prizes": [[3, -100], [-100, -100]],
                "Boards": [[[0, 0]], [[1, 0]]]}"#,
        )
        .unwrap();
        let err = record.into_table(Mark::First).unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed table: States row 1 has 1 columns, expected 2"
        );
    }

    fn record_with(q_tables: &str, boards: &str) -> PlayerTableRecord {
        serde_json::from_str(&format!(
            r#"{{"States": [[1, -1], [-1, -1]],
                "Q-Tables": {q_tables},
                "Prizes": [[3, -100], [-100, -100]],
                "Boards": {boards}}}"#
        ))
        .unwrap()
    }

    #[test]
    fn ragged_q_rows_are_rejected() {
        let record = record_with("[[0.5, 0.25, 9.0], [7.0]]", "[[[0, 0]], [[1, 0]]]");
        let err = record.into_table(Mark::First).unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed table: Q-Tables row 0 has 3 columns, expected 2"
        );
    }

    #[test]
    fn boards_must_share_one_shape() {
        let wide = record_with("[[0.0, 0.0], [0.0, 0.0]]", "[[[0, 0]], [[1, 0, 0]]]");
        assert_eq!(
            wide.into_table(Mark::First).unwrap_err().to_string(),
            "malformed table: Boards entry 1 row 0 has 3 columns, expected 2"
        );
        let tall = record_with("[[0.0, 0.0], [0.0, 0.0]]", "[[[0, 0]], [[1, 0], [0, 0]]]");
        assert_eq!(
            tall.into_table(Mark::First).unwrap_err().to_string(),
            "malformed table: Boards entry 1 has 2 rows, expected 1"
        );
        let fine = record_with("[[0.5, 0.25], [9.0, 7.0]]", "[[[0, 0]], [[1, 0]]]");
        let table = fine.into_table(Mark::First).unwrap();
        assert_eq!(table.q_table.value(0, 1), 0.25);
        assert_eq!(table.q_table.value(1, 0), 9.0);
        assert_eq!(table.boards[1].to_rows(), vec![vec![1, 0]]);
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(Format::from_path(Path::new("a/tables.pickle")), Format::Pickle);
        assert_eq!(Format::from_path(Path::new("tables.json")), Format::Json);
        assert_eq!(Format::from_path(Path::new("tables")), Format::Json);
        assert!(dated_file_name("tables", "json").starts_with("tables-"));
    }
}
