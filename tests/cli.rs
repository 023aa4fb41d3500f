use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

const CORPUS: &str = "the quick brown fox jumps over the lazy dog.\n\
the lazy dog sleeps while the quick fox runs.\n\
it's the fox's den; the dog's bed is nearby.\n";

fn temp_workspace() -> TempDir {
    tempfile::tempdir().expect("create tempdir")
}

fn bytepair() -> Command {
    Command::cargo_bin("bytepair").expect("binary exists")
}

fn train_from_stdin(workspace: &TempDir, extra: &[&str]) {
    let mut train = bytepair();
    train
        .current_dir(workspace.path())
        .args(["--quiet", "train", "--no-progress", "-o", "params.json"])
        .args(extra)
        .write_stdin(CORPUS.repeat(4))
        .assert()
        .success();
}

#[test]
fn train_encode_decode_round_trip() {
    let workspace = temp_workspace();
    train_from_stdin(&workspace, &["--max-iterations", "40"]);
    let params = workspace.path().join("params.json");
    assert!(params.exists(), "params.json was created");

    let artifact: Value =
        serde_json::from_slice(&fs::read(&params).expect("read params")).expect("valid JSON");
    let rules = artifact["replacement_keys"].as_array().expect("keys").len();
    assert!(rules > 0 && rules <= 40);
    assert_eq!(artifact["last_token"].as_u64(), Some(255 + rules as u64));
    assert!(artifact["preprocessor"].is_object());

    let sample = "the lazy fox's quick dog; sleeps.";
    let encoded = bytepair()
        .current_dir(workspace.path())
        .args(["--quiet", "encode", "-m", "params.json"])
        .write_stdin(sample)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let token_text = String::from_utf8(encoded).expect("token list is UTF-8");
    let token_count = token_text.split_whitespace().count();
    assert!(token_count > 0 && token_count < sample.len());

    fs::write(workspace.path().join("tokens.txt"), &token_text).expect("write tokens");
    bytepair()
        .current_dir(workspace.path())
        .args([
            "--quiet",
            "decode",
            "-m",
            "params.json",
            "--input",
            "tokens.txt",
            "--output",
            "decoded.txt",
        ])
        .assert()
        .success();
    let decoded = fs::read(workspace.path().join("decoded.txt")).expect("read decoded output");
    assert_eq!(decoded, sample.as_bytes());
}

#[test]
fn directory_training_and_json_encoding() {
    let workspace = temp_workspace();
    let corpus_dir = workspace.path().join("corpus");
    fs::create_dir(&corpus_dir).expect("create corpus dir");
    fs::write(corpus_dir.join("a.txt"), CORPUS).expect("write a");
    fs::write(corpus_dir.join("b.txt"), CORPUS.to_uppercase()).expect("write b");

    bytepair()
        .current_dir(workspace.path())
        .args([
            "--quiet",
            "train",
            "corpus",
            "--no-progress",
            "--no-normalize",
            "--pretty",
            "--max-token",
            "270",
        ])
        .assert()
        .success();

    let artifact: Value = serde_json::from_slice(
        &fs::read(workspace.path().join("params.json")).expect("read params"),
    )
    .expect("valid JSON");
    assert!(artifact["preprocessor"].is_null());
    assert!(artifact["last_token"].as_u64().expect("last token") <= 270);

    let encoded = bytepair()
        .current_dir(workspace.path())
        .args(["--quiet", "encode", "corpus/a.txt", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let record: Value = serde_json::from_slice(&encoded).expect("encoded output is JSON");
    assert_eq!(record["path"], "corpus/a.txt");
    let token_args = record["tokens"]
        .as_array()
        .expect("tokens array")
        .iter()
        .map(|v| v.as_u64().expect("u64 token").to_string())
        .collect::<Vec<_>>();

    let decoded = bytepair()
        .current_dir(workspace.path())
        .args(["--quiet", "decode"])
        .args(&token_args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(decoded, CORPUS.as_bytes());
}

#[test]
fn vocab_and_info_describe_the_artifact() {
    let workspace = temp_workspace();
    train_from_stdin(&workspace, &["--max-iterations", "10"]);

    let vocab = bytepair()
        .current_dir(workspace.path())
        .args(["--quiet", "vocab", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let vocab: Value = serde_json::from_slice(&vocab).expect("vocab output is JSON");
    let entries = vocab.as_object().expect("object");
    assert_eq!(entries.len(), 10);
    assert!(entries.contains_key("256"));

    let info = bytepair()
        .current_dir(workspace.path())
        .args(["--quiet", "info"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let info_text = String::from_utf8(info).expect("info output is UTF-8");
    assert!(info_text.contains("Merge rules  : 10"));
    assert!(info_text.contains("Last token   : 265"));
}

#[test]
fn decode_rejects_unissued_tokens() {
    let workspace = temp_workspace();
    train_from_stdin(&workspace, &["--max-iterations", "5"]);

    let output = bytepair()
        .current_dir(workspace.path())
        .args(["--quiet", "decode", "97", "261"])
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8_lossy(&output);
    assert!(stderr.contains("malformed token 261"), "stderr: {stderr}");
}

#[test]
fn verbose_training_reports_iterations_through_the_log() {
    let workspace = temp_workspace();
    let output = bytepair()
        .current_dir(workspace.path())
        .args(["-v", "train", "--max-iterations", "3"])
        .write_stdin(CORPUS)
        .assert()
        .success()
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8_lossy(&output);
    assert_eq!(stderr.matches("iter ").count(), 3, "stderr: {stderr}");
    assert!(!stderr.contains("learning merge rules"), "stderr: {stderr}");
}
