// Integration tests for joinx
use chrono::NaiveDate;
use joinx::{
    fuzzy_join, Analyzer, CountVectorizer, EncoderKind, Error, FuzzyJoiner, JoinHow,
    JoinOptions, SCORE_COLUMN,
};
use joinx_core::frame::datetime_column;
use polars::prelude::*;
use proptest::prelude::*;
use std::fs::File;
use std::process::Command;

const LEFT_JSON: &str = r#"[{"a":"ana","b":1},{"a":"lala","b":2},{"a":"nana","b":3}]"#;
const RIGHT_JSON: &str =
    r#"[{"a":"anna","c":5},{"a":"lala","c":6},{"a":"ana","c":7},{"a":"nnana","c":8}]"#;

fn left() -> DataFrame {
    df!("a" => ["ana", "lala", "nana"], "b" => [1i64, 2, 3]).unwrap()
}

fn right() -> DataFrame {
    df!("a" => ["anna", "lala", "ana", "nnana"], "c" => [5i64, 6, 7, 8]).unwrap()
}

fn names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|n| n.to_string()).collect()
}

fn text(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    let column = df.column(name).unwrap().cast(&DataType::String).unwrap();
    column.str().unwrap().iter().map(|v| v.map(str::to_string)).collect()
}

fn ints(df: &DataFrame, name: &str) -> Vec<Option<i64>> {
    let column = df.column(name).unwrap().cast(&DataType::Int64).unwrap();
    column.i64().unwrap().iter().collect()
}

fn floats(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    let column = df.column(name).unwrap().cast(&DataType::Float64).unwrap();
    column.f64().unwrap().iter().collect()
}

fn some(values: &[&str]) -> Vec<Option<String>> {
    values.iter().map(|v| Some(v.to_string())).collect()
}

fn day(y: i32, m: u32, d: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

#[test]
fn test_example_default_settings() {
    let joined = fuzzy_join(&left(), &right(), &JoinOptions::new().on(["a"])).unwrap();

    assert_eq!(names(&joined), vec!["a_x", "b", "a_y", "c"]);
    assert_eq!(joined.height(), 3);
    assert_eq!(text(&joined, "a_y"), some(&["ana", "lala", "nnana"]));
    assert_eq!(ints(&joined, "c")[2], Some(8));
}

#[test]
fn test_example_strict_threshold() {
    let options = JoinOptions::new().on(["a"]).match_score(1.0).return_score(true);
    let joined = fuzzy_join(&left(), &right(), &options).unwrap();

    assert_eq!(joined.height(), 3);
    assert_eq!(floats(&joined, SCORE_COLUMN), vec![Some(1.0), Some(1.0), Some(0.5)]);

    // left columns survive, right columns are nulled
    assert_eq!(text(&joined, "a_x")[2].as_deref(), Some("nana"));
    assert_eq!(ints(&joined, "b")[2], Some(3));
    assert_eq!(text(&joined, "a_y")[2], None);
    assert_eq!(ints(&joined, "c")[2], None);
}

#[test]
fn test_exact_numeric_and_datetime_matches() {
    let main = DataFrame::new(vec![
        Column::new("amount".into(), [10.0, 250.0, 99.5]),
        datetime_column("date", &[day(2024, 1, 1), day(2024, 6, 1), day(2024, 3, 15)]).unwrap(),
    ])
    .unwrap();
    let aux = DataFrame::new(vec![
        Column::new("amount".into(), [99.5, 10.0, 400.0, 250.0]),
        datetime_column(
            "date",
            &[day(2024, 3, 15), day(2024, 1, 1), day(2025, 1, 1), day(2024, 6, 1)],
        )
        .unwrap(),
        Column::new("id".into(), ["c", "a", "z", "b"]),
    ])
    .unwrap();

    let out = FuzzyJoiner::new(JoinOptions::new().on(["amount", "date"]))
        .unwrap()
        .join(&main, &aux)
        .unwrap();

    assert_eq!(text(&out.table, "id"), some(&["a", "b", "c"]));
    assert!(out.report.records.iter().all(|r| r.score == 1.0));
}

#[test]
fn test_mixed_key_groups() {
    let main = df!(
        "name" => ["Acme Corp", "Globex", "Initech"],
        "year" => [2020i64, 2021, 2020]
    )
    .unwrap();
    let aux = df!(
        "company" => ["initech", "acme corporation", "globex inc", "acme corp"],
        "founded" => [2020i64, 2020, 2021, 1999]
    )
    .unwrap();

    let options = JoinOptions::new().left_right_on(["name", "year"], ["company", "founded"]);
    let joined = fuzzy_join(&main, &aux, &options).unwrap();

    assert_eq!(names(&joined), vec!["name", "year", "company", "founded"]);
    assert_eq!(text(&joined, "company")[1].as_deref(), Some("globex inc"));
    assert_eq!(text(&joined, "company")[2].as_deref(), Some("initech"));
}

#[test]
fn test_count_encoder_and_word_analyzer() {
    let main = df!("title" => ["the old man and the sea", "war and peace"]).unwrap();
    let aux = df!(
        "title" => ["peace and war", "old man sea", "moby dick"],
        "year" => [1869i64, 1952, 1851]
    )
    .unwrap();

    let options = JoinOptions::new()
        .on(["title"])
        .encoder(EncoderKind::Count)
        .analyzer(Analyzer::Word)
        .ngram_range((1, 1));
    let joined = fuzzy_join(&main, &aux, &options).unwrap();
    assert_eq!(ints(&joined, "year"), vec![Some(1952), Some(1869)]);
}

#[test]
fn test_custom_vectorizer() {
    let options = JoinOptions::new()
        .on(["a"])
        .vectorizer(Box::new(CountVectorizer::new(Analyzer::Char, (1, 2))));
    let joined = fuzzy_join(&left(), &right(), &options).unwrap();
    assert_eq!(&ints(&joined, "c")[..2], &[Some(7), Some(6)]);
}

#[test]
fn test_how_right_matches_swapped_left() {
    let as_right = FuzzyJoiner::new(JoinOptions::new().on(["a"]).how(JoinHow::Right))
        .unwrap()
        .join(&left(), &right())
        .unwrap();
    let as_left = FuzzyJoiner::new(JoinOptions::new().on(["a"]).suffixes("_y", "_x"))
        .unwrap()
        .join(&right(), &left())
        .unwrap();

    assert_eq!(as_right.report, as_left.report);
    assert_eq!(as_right.table.height(), as_left.table.height());
    for name in names(&as_right.table) {
        let ours = as_right.table.column(&name).unwrap().as_materialized_series();
        let theirs = as_left.table.column(&name).unwrap().as_materialized_series();
        assert!(ours.equals_missing(theirs), "column {name} differs");
    }
    // conventional merge order: left table's columns first
    assert_eq!(names(&as_right.table), vec!["a_x", "b", "a_y", "c"]);
    assert_eq!(names(&as_left.table), vec!["a_y", "c", "a_x", "b"]);
}

#[test]
fn test_sort_by_main_keys() {
    let options = JoinOptions::new().on(["a"]).how(JoinHow::Right).sort(true);
    let joined = fuzzy_join(&left(), &right(), &options).unwrap();
    assert_eq!(text(&joined, "a_y"), some(&["ana", "anna", "lala", "nnana"]));
}

#[test]
fn test_nullable_keys_still_join() {
    let main = df!(
        "a" => [Some("lala"), None],
        "b" => [Some(1.0), None]
    )
    .unwrap();
    let out = FuzzyJoiner::new(JoinOptions::new().on(["a"]))
        .unwrap()
        .join(&main, &right())
        .unwrap();
    assert_eq!(out.table.height(), 2);
    assert_eq!(out.warnings.len(), 2);
    assert_eq!(ints(&out.table, "c")[0], Some(6));
}

#[test]
fn test_infinite_key_is_rejected() {
    let main = df!("x" => [1.0, f64::NEG_INFINITY]).unwrap();
    let aux = df!("x" => [1.0, 2.0]).unwrap();
    let err = fuzzy_join(&main, &aux, &JoinOptions::new().on(["x"])).unwrap_err();
    assert!(matches!(err, Error::NonFiniteKey { ref column, row: 1 } if column == "x"));
}
#[test]
fn test_configuration_errors() {
    assert!(matches!(
        "outer".parse::<JoinHow>(),
        Err(Error::InvalidHow(_))
    ));
    assert!(matches!(
        "bytes".parse::<Analyzer>(),
        Err(Error::InvalidAnalyzer(_))
    ));
    assert!(matches!(
        "minhash".parse::<EncoderKind>(),
        Err(Error::InvalidEncoder(_))
    ));
    assert!(matches!(
        fuzzy_join(&left(), &right(), &JoinOptions::new()),
        Err(Error::MissingKeys)
    ));
    assert!(matches!(
        fuzzy_join(&left(), &right(), &JoinOptions::new().on(["a"]).ngram_range((4, 2))),
        Err(Error::InvalidNgramRange { min: 4, max: 2 })
    ));
    assert!(matches!(
        fuzzy_join(&left(), &right(), &JoinOptions::new().left_right_on(["a"], ["c"]).how(JoinHow::Right)),
        Err(Error::IncompatibleKeyTypes { .. })
    ));
}

fn word_table(name: &str, words: &[String]) -> DataFrame {
    let rows: Vec<i64> = (0..words.len() as i64).collect();
    df!(name => words, "row" => rows).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_scores_in_unit_range(
        main in prop::collection::vec("[a-e]{1,6}", 1..8),
        aux in prop::collection::vec("[a-e]{1,6}", 1..8),
    ) {
        let options = JoinOptions::new().on(["k"]).return_score(true);
        let joined = fuzzy_join(&word_table("k", &main), &word_table("k", &aux), &options).unwrap();
        prop_assert_eq!(joined.height(), main.len());
        for score in floats(&joined, SCORE_COLUMN) {
            let score = score.unwrap();
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }

    #[test]
    fn prop_exact_keys_score_one(
        aux in prop::collection::vec("[a-e]{1,6}", 2..8),
        picks in prop::collection::vec(0usize..8, 1..6),
    ) {
        let main: Vec<String> = picks.iter().map(|&i| aux[i % aux.len()].clone()).collect();
        let out = FuzzyJoiner::new(JoinOptions::new().on(["k"]))
            .unwrap()
            .join(&word_table("k", &main), &word_table("k", &aux))
            .unwrap();
        for record in &out.report.records {
            prop_assert_eq!(record.distance, 0.0);
            prop_assert_eq!(record.score, 1.0);
        }
    }

    #[test]
    fn prop_row_counts_follow_threshold(
        main in prop::collection::vec("[a-e]{1,6}", 1..8),
        aux in prop::collection::vec("[a-e]{1,6}", 1..8),
    ) {
        let left = word_table("k", &main);
        let right = word_table("k", &aux);
        let mut previous = usize::MAX;
        for threshold in [0.0, 0.5, 0.6, 0.75, 0.9, 1.0] {
            let kept = FuzzyJoiner::new(JoinOptions::new().on(["k"]).match_score(threshold))
                .unwrap()
                .join(&left, &right)
                .unwrap();
            prop_assert_eq!(kept.table.height(), main.len());

            let dropped = FuzzyJoiner::new(
                JoinOptions::new().on(["k"]).match_score(threshold).drop_unmatched(true),
            )
            .unwrap()
            .join(&left, &right)
            .unwrap();
            let accepted = dropped.report.records.iter().filter(|r| r.score >= threshold).count();
            prop_assert_eq!(dropped.table.height(), accepted);
            prop_assert!(accepted <= previous);
            previous = accepted;
        }
    }
}

#[test]
fn test_cli_join_files() {
    let dir = tempfile::tempdir().unwrap();
    let left_path = dir.path().join("left.json");
    let right_path = dir.path().join("right.json");
    let out_path = dir.path().join("out.json");
    std::fs::write(&left_path, LEFT_JSON).unwrap();
    std::fs::write(&right_path, RIGHT_JSON).unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_joinx"))
        .args(["--left", left_path.to_str().unwrap()])
        .args(["--right", right_path.to_str().unwrap()])
        .args(["--on", "a", "--match-score", "1", "--return-score"])
        .args(["--suffixes", "_l,_r", "--log-level", "error"])
        .args(["--output", out_path.to_str().unwrap()])
        .status()
        .unwrap();
    assert!(status.success());

    let joined = JsonReader::new(File::open(&out_path).unwrap()).finish().unwrap();
    assert_eq!(names(&joined), vec!["a_l", "b", "a_r", "c", SCORE_COLUMN]);
    assert_eq!(text(&joined, "a_r")[2], None);
    assert_eq!(ints(&joined, "c")[0], Some(7));
}

#[test]
fn test_cli_csv_files() {
    let dir = tempfile::tempdir().unwrap();
    let left_path = dir.path().join("left.csv");
    let right_path = dir.path().join("right.csv");
    let out_path = dir.path().join("out.csv");
    std::fs::write(&left_path, "a,b\nana,1\nlala,2\nnana,3\n").unwrap();
    std::fs::write(&right_path, "a,c\nanna,5\nlala,6\nana,7\nnnana,8\n").unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_joinx"))
        .args(["--left", left_path.to_str().unwrap()])
        .args(["--right", right_path.to_str().unwrap()])
        .args(["--on", "a", "--match-score", "1", "--log-level", "error"])
        .args(["--output", out_path.to_str().unwrap()])
        .status()
        .unwrap();
    assert!(status.success());

    let written = std::fs::read_to_string(&out_path).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines[0], "a_x,b,a_y,c");
    assert_eq!(lines[1], "ana,1,ana,7");
    assert_eq!(lines[3], "nana,3,,");
}

#[test]
fn test_cli_config_and_report() {
    let dir = tempfile::tempdir().unwrap();
    let left_path = dir.path().join("left.json");
    let right_path = dir.path().join("right.json");
    let config_path = dir.path().join("config.json");
    std::fs::write(&left_path, LEFT_JSON).unwrap();
    std::fs::write(&right_path, RIGHT_JSON).unwrap();
    std::fs::write(
        &config_path,
        r#"{"on": "a", "match_score": 1.0, "drop_unmatched": true}"#,
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_joinx"))
        .args(["--left", left_path.to_str().unwrap()])
        .args(["--right", right_path.to_str().unwrap()])
        .args(["--config", config_path.to_str().unwrap()])
        .args(["--report", "--log-level", "error"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let document: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = document["table"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1]["a_y"], "lala");
    assert_eq!(document["report"]["stats"]["rejected"], 1);
    assert_eq!(document["report"]["records"].as_array().unwrap().len(), 3);
    assert_eq!(document["warnings"][0]["kind"], "experimental");
}

#[test]
fn test_cli_rejects_bad_how() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("t.json");
    std::fs::write(&path, LEFT_JSON).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_joinx"))
        .args(["--left", path.to_str().unwrap(), "--right", path.to_str().unwrap()])
        .args(["--on", "a", "--how", "inner"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("'how'"));
}
