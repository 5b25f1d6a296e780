use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use crate::config::ConfigStore;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::roster::{ImportMode, RosterStore, RosterTable, StoreError};

fn workspace<'a>(state: &'a AppState, req: &Request) -> Result<&'a Path, Value> {
    state
        .workspace
        .as_deref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

fn store_err(id: &str, e: StoreError) -> Value {
    err(id, &e.code, e.message, e.details)
}

fn write_text_file(path: &str, contents: &str) -> Result<(), StoreError> {
    let out = PathBuf::from(path);
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StoreError {
            code: "export_failed".to_string(),
            message: e.to_string(),
            details: Some(json!({ "path": path })),
        })?;
    }
    std::fs::write(&out, contents).map_err(|e| StoreError {
        code: "export_failed".to_string(),
        message: e.to_string(),
        details: Some(json!({ "path": path })),
    })
}

/// Uploaded tabular input comes either inline (`params.csv`, the browser
/// upload) or as a file path. Both funnel into the same parser.
fn read_import_text(req: &Request) -> Result<String, Value> {
    if let Some(text) = req.params.get("csv").and_then(|v| v.as_str()) {
        return Ok(text.to_string());
    }
    if let Some(path) = req.params.get("path").and_then(|v| v.as_str()) {
        return std::fs::read_to_string(path).map_err(|e| {
            err(
                &req.id,
                "import_parse_failed",
                format!("could not read file: {}", e),
                Some(json!({ "path": path })),
            )
        });
    }
    Err(err(&req.id, "bad_params", "missing csv or path", None))
}

/// Informational per-row warnings for the import preview. Import itself never
/// validates; the operator decides after seeing these.
fn preview_warnings(table: &RosterTable) -> Vec<Value> {
    let mut warnings = Vec::new();

    let last_col = table.col("nom");
    let first_col = table.col("prenom");
    for (i, row) in table.rows.iter().enumerate() {
        let blank = |c: Option<usize>| {
            c.map(|c| row.get(c).map(|v| v.trim().is_empty()).unwrap_or(true))
                .unwrap_or(true)
        };
        if blank(last_col) || blank(first_col) {
            warnings.push(json!({
                "line": i + 2,
                "code": "missing_name",
                "message": "nom and prenom are empty or absent"
            }));
        }
    }

    if let Some(id_col) = table.col("id") {
        let mut seen = std::collections::HashSet::new();
        for (i, row) in table.rows.iter().enumerate() {
            if let Some(id) = row.get(id_col).and_then(|s| s.trim().parse::<i64>().ok()) {
                if !seen.insert(id) {
                    warnings.push(json!({
                        "line": i + 2,
                        "code": "duplicate_id",
                        "message": format!("id {} appears more than once", id)
                    }));
                }
            }
        }
    }

    warnings
}

fn handle_export_csv(state: &mut AppState, req: &Request) -> Value {
    let workspace = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let config = ConfigStore::new(workspace).load();
    let table = RosterStore::new(workspace).load();

    let query = req
        .params
        .get("query")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let now = chrono::Local::now();
    let (csv, suggested_filename, rows_exported) = match &query {
        Some(q) => {
            let matches = table.search(q);
            (
                table.to_csv_rows(&matches),
                format!("recherche_{}_{}.csv", q, now.format("%Y%m%d")),
                matches.len(),
            )
        }
        None => (
            table.to_csv(),
            format!(
                "etudiants_{}_{}.csv",
                config.university_name.replace(' ', "_"),
                now.format("%Y%m%d_%H%M%S")
            ),
            table.rows.len(),
        ),
    };

    let out_path = req.params.get("outPath").and_then(|v| v.as_str());
    if let Some(path) = out_path {
        if let Err(e) = write_text_file(path, &csv) {
            return store_err(&req.id, e);
        }
    }

    ok(
        &req.id,
        json!({
            "csv": csv,
            "suggestedFilename": suggested_filename,
            "rowsExported": rows_exported,
            "path": out_path
        }),
    )
}

fn handle_import_preview(state: &mut AppState, req: &Request) -> Value {
    if let Err(e) = workspace(state, req) {
        return e;
    }
    let text = match read_import_text(req) {
        Ok(t) => t,
        Err(e) => return e,
    };
    let table = match RosterTable::parse_csv(&text) {
        Ok(t) => t,
        Err(e) => return store_err(&req.id, e),
    };

    let preview_rows: Vec<Value> = table
        .rows
        .iter()
        .take(5)
        .map(|row| {
            let mut obj = serde_json::Map::new();
            for (c, name) in table.columns.iter().enumerate() {
                obj.insert(
                    name.clone(),
                    Value::String(row.get(c).cloned().unwrap_or_default()),
                );
            }
            Value::Object(obj)
        })
        .collect();

    ok(
        &req.id,
        json!({
            "columns": table.columns,
            "previewRows": preview_rows,
            "totalRows": table.rows.len(),
            "warnings": preview_warnings(&table)
        }),
    )
}

fn handle_import_apply(state: &mut AppState, req: &Request) -> Value {
    let workspace = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let Some(mode) = req
        .params
        .get("mode")
        .and_then(|v| v.as_str())
        .and_then(ImportMode::parse)
    else {
        return err(&req.id, "bad_params", "mode must be replace or append", None);
    };
    let text = match read_import_text(req) {
        Ok(t) => t,
        Err(e) => return e,
    };
    let incoming = match RosterTable::parse_csv(&text) {
        Ok(t) => t,
        Err(e) => return store_err(&req.id, e),
    };

    let store = RosterStore::new(workspace);
    let rows_imported = match store.import_bulk(incoming, mode) {
        Ok(n) => n,
        Err(e) => return store_err(&req.id, e),
    };
    let student_count = store.load().rows.len();

    ok(
        &req.id,
        json!({
            "mode": mode.as_str(),
            "rowsImported": rows_imported,
            "studentCount": student_count
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.exportCsv" => Some(handle_export_csv(state, req)),
        "roster.importPreview" => Some(handle_import_preview(state, req)),
        "roster.importApply" => Some(handle_import_apply(state, req)),
        _ => None,
    }
}
