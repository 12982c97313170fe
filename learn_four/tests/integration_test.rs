use learn_four::board::Mark;
use learn_four::config::GameParameters;
use learn_four::players::{evaluate, RandomPlayer, TrainedPlayer};
use learn_four::storage::{read_player_table, read_tables, write_tables};
use learn_four::{generate_tables, train_both_players};

#[test]
fn generate_save_train_and_play() {
    let params = GameParameters {
        random_moves1: 1.0,
        random_moves2: 1.0,
        ..GameParameters::with_board(3, 3, 3)
    };
    params.validate().unwrap();
    let dir = tempfile::tempdir().unwrap();

    let tables = generate_tables(&params);
    let tables_path = dir.path().join("tables.json");
    write_tables(&tables_path, &tables).unwrap();
    let loaded = read_tables(&tables_path).unwrap();
    assert_eq!(loaded.first.boards, tables.first.boards);
    assert_eq!(loaded.second.transitions, tables.second.transitions);

    let outputs = [
        Some(dir.path().join("tables1.pickle")),
        Some(dir.path().join("tables2.pickle")),
    ];
    let trained = train_both_players(&params, &loaded, 300, outputs, Some(2024)).unwrap();
    let first = read_player_table(&dir.path().join("tables1.pickle"), Mark::First).unwrap();
    assert_eq!(first, trained.first);

    let mut agent = TrainedPlayer::new("trained", trained.first, &params);
    let mut opponent = RandomPlayer::new("random", Mark::Second);
    let record = evaluate(&mut agent, &mut opponent, 20, &params);
    println!("trained vs random: {record}");
    assert_eq!(record.wins + record.draws + record.losses, 20);
}

#[test]
fn parameters_survive_a_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metafile.json");
    let params = GameParameters {
        epsilon: 0.1,
        depth_2: 4,
        ..GameParameters::with_board(6, 5, 4)
    };
    params.save(&path).unwrap();
    let loaded = GameParameters::load(&path).unwrap();
    assert_eq!(loaded.size_x, 6);
    assert_eq!(loaded.max_n_moves, 30);
    assert_eq!(loaded.depth_2, 4);
    assert_eq!(loaded.epsilon, 0.1);
}
