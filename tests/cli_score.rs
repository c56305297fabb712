use assert_cmd::Command;
use serde_json::Value;

fn score(target: &str, input: &str, elapsed: &str) -> Value {
    let output = Command::cargo_bin("clackr")
        .unwrap()
        .args(["score", "--target", target, "--input", input, "--elapsed", elapsed])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    serde_json::from_slice(&output).unwrap()
}

#[test]
fn score_full_match() {
    let report = score("the quick brown fox", "the quick brown fox", "30");

    assert_eq!(report["errors"], 0);
    assert_eq!(report["accuracy"], 100.0);
    assert_eq!(report["current_word_index"], 3);
    assert_eq!(report["final_word_complete"], true);
    assert!((report["wpm"].as_f64().unwrap() - 7.6).abs() < 1e-9);
}

#[test]
fn score_over_typed_word() {
    let report = score("cat", "catty", "10");

    assert_eq!(report["errors"], 2);
    assert_eq!(report["correct_chars"], 3);
    assert_eq!(report["accuracy"], 60.0);
    assert_eq!(report["final_word_complete"], false);
}

#[test]
fn score_empty_input() {
    let report = score("", "", "0");

    assert_eq!(report["wpm"], 0.0);
    assert_eq!(report["accuracy"], 100.0);
    assert_eq!(report["errors"], 0);
    assert_eq!(report["current_word_index"], 0);
}
