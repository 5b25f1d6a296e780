use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_rosterd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn rosterd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> &str {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

fn select_workspace(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    workspace: &PathBuf,
) {
    let _ = request_ok(
        stdin,
        reader,
        "select",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
}

const SAMPLE_CSV: &str = "id,nom,prenom,specialite,moyenne_generale,age,date_inscription,email,credits,statut\n\
    1,Dupont,Jean,Informatique,12.0,20,2024-01-05 10:00:00,jean.dupont@u.fr,180,Actif\n\
    2,Martin,Claire,Droit,15.5,22,2024-02-10 09:30:00,claire.martin@u.fr,120,Actif\n";

#[test]
fn replace_import_round_trips_through_export() {
    let workspace = temp_dir("rosterd-roundtrip");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let applied = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "roster.importApply",
        json!({ "csv": SAMPLE_CSV, "mode": "replace" }),
    );
    assert_eq!(applied["mode"], json!("replace"));
    assert_eq!(applied["rowsImported"], json!(2));
    assert_eq!(applied["studentCount"], json!(2));

    let exported = request_ok(&mut stdin, &mut reader, "2", "roster.exportCsv", json!({}));
    assert_eq!(exported["rowsExported"], json!(2));
    assert_eq!(exported["csv"].as_str().expect("csv text"), SAMPLE_CSV);
    let name = exported["suggestedFilename"].as_str().expect("filename");
    assert!(
        name.starts_with("etudiants_Université_Azure_") && name.ends_with(".csv"),
        "unexpected filename {}",
        name
    );

    // Importing the export back in replace mode is a fixed point.
    let again = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "roster.importApply",
        json!({ "csv": exported["csv"], "mode": "replace" }),
    );
    assert_eq!(again["studentCount"], json!(2));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn append_import_keeps_duplicate_ids_verbatim() {
    let workspace = temp_dir("rosterd-append");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "roster.importApply",
        json!({ "csv": SAMPLE_CSV, "mode": "replace" }),
    );
    let appended = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "roster.importApply",
        json!({ "csv": SAMPLE_CSV, "mode": "append" }),
    );
    assert_eq!(appended["studentCount"], json!(4));

    // No id reassignment and no duplicate detection on import.
    let list = request_ok(&mut stdin, &mut reader, "3", "students.list", json!({}));
    let ids: Vec<i64> = list["students"]
        .as_array()
        .expect("students array")
        .iter()
        .map(|s| s["id"].as_i64().expect("id"))
        .collect();
    assert_eq!(ids, vec![1, 2, 1, 2]);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn append_unions_columns_like_a_dataframe_concat() {
    let workspace = temp_dir("rosterd-append-columns");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "roster.importApply",
        json!({ "csv": SAMPLE_CSV, "mode": "replace" }),
    );
    let extra = "id,nom,prenom,campus\n7,Durand,Luc,Lyon\n";
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "roster.importApply",
        json!({ "csv": extra, "mode": "append" }),
    );

    let list = request_ok(&mut stdin, &mut reader, "3", "students.list", json!({}));
    assert_eq!(list["count"], json!(3));
    let third = &list["students"][2];
    assert_eq!(third["id"], json!(7));
    assert_eq!(third["campus"], json!("Lyon"));
    assert!(third["status"].is_null());

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn preview_reports_shape_and_warnings_without_mutating() {
    let workspace = temp_dir("rosterd-preview");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let csv = "id,nom,prenom\n1,Dupont,Jean\n1,,Claire\n2,Martin,\n";
    let preview = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "roster.importPreview",
        json!({ "csv": csv }),
    );
    assert_eq!(preview["totalRows"], json!(3));
    assert_eq!(preview["columns"], json!(["id", "nom", "prenom"]));
    assert_eq!(preview["previewRows"][0]["nom"], json!("Dupont"));

    let warnings = preview["warnings"].as_array().expect("warnings");
    let codes: Vec<&str> = warnings
        .iter()
        .map(|w| w["code"].as_str().expect("code"))
        .collect();
    assert!(codes.contains(&"missing_name"));
    assert!(codes.contains(&"duplicate_id"));

    // Preview alone must not create or change the table.
    let list = request_ok(&mut stdin, &mut reader, "2", "students.list", json!({}));
    assert_eq!(list["count"], json!(0));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn unreadable_import_input_fails_without_mutation() {
    let workspace = temp_dir("rosterd-import-bad");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "roster.importApply",
        json!({ "csv": SAMPLE_CSV, "mode": "replace" }),
    );

    let missing_file = request(
        &mut stdin,
        &mut reader,
        "2",
        "roster.importApply",
        json!({ "path": workspace.join("nope.csv").to_string_lossy(), "mode": "replace" }),
    );
    assert_eq!(error_code(&missing_file), "import_parse_failed");

    let ragged = request(
        &mut stdin,
        &mut reader,
        "3",
        "roster.importApply",
        json!({ "csv": "a,b\n1,2,3\n", "mode": "replace" }),
    );
    assert_eq!(error_code(&ragged), "import_parse_failed");

    let bad_mode = request(
        &mut stdin,
        &mut reader,
        "4",
        "roster.importApply",
        json!({ "csv": SAMPLE_CSV, "mode": "merge" }),
    );
    assert_eq!(error_code(&bad_mode), "bad_params");

    let list = request_ok(&mut stdin, &mut reader, "5", "students.list", json!({}));
    assert_eq!(list["count"], json!(2));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn filtered_export_writes_the_requested_file() {
    let workspace = temp_dir("rosterd-export-filtered");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "roster.importApply",
        json!({ "csv": SAMPLE_CSV, "mode": "replace" }),
    );

    let out_path = workspace.join("out").join("droit.csv");
    let exported = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "roster.exportCsv",
        json!({ "query": "droit", "outPath": out_path.to_string_lossy() }),
    );
    assert_eq!(exported["rowsExported"], json!(1));
    let name = exported["suggestedFilename"].as_str().expect("filename");
    assert!(name.starts_with("recherche_droit_"), "filename {}", name);

    let written = std::fs::read_to_string(&out_path).expect("read export");
    assert_eq!(written, exported["csv"].as_str().expect("csv"));
    assert!(written.contains("Martin"));
    assert!(!written.contains("Dupont"));

    drop(stdin);
    let _ = child.wait();
}
