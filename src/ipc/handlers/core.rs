use std::path::PathBuf;

use serde_json::json;

use crate::config::ConfigStore;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::CONFIRM_PHRASE;
use crate::ipc::types::{AppState, Request};
use crate::roster::{RosterStore, ENROLLMENT_DATE_FORMAT};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    if let Err(e) = std::fs::create_dir_all(path.join("data"))
        .and_then(|_| std::fs::create_dir_all(path.join("config")))
    {
        return err(&req.id, "workspace_open_failed", e.to_string(), None);
    }

    // First run writes the default config document; a corrupt one is left
    // alone and the defaults are used in memory.
    let config = ConfigStore::new(&path).load();
    state.workspace = Some(path.clone());
    ok(
        &req.id,
        json!({
            "workspacePath": path.to_string_lossy(),
            "universityName": config.university_name
        }),
    )
}

fn handle_system_info(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(workspace) = state.workspace.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let config = ConfigStore::new(workspace).load();
    let store = RosterStore::new(workspace);
    let table = store.load();

    let meta = std::fs::metadata(store.csv_path()).ok();
    let data_file_size = meta.as_ref().map(|m| m.len()).unwrap_or(0);
    let last_modified = meta.and_then(|m| m.modified().ok()).map(|t| {
        chrono::DateTime::<chrono::Local>::from(t)
            .format(ENROLLMENT_DATE_FORMAT)
            .to_string()
    });

    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "configVersion": config.version,
            "universityName": config.university_name,
            "studentCount": table.rows.len(),
            "dataFileSizeBytes": data_file_size,
            "lastModifiedAt": last_modified
        }),
    )
}

/// Deletes both data files so the next interaction starts from scratch, the
/// dashboard's "reset application" tool. Same confirmation phrase as the
/// destructive roster operations.
fn handle_workspace_reset(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(workspace) = state.workspace.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let confirmation = req
        .params
        .get("confirmation")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if confirmation != CONFIRM_PHRASE {
        return err(
            &req.id,
            "bad_confirmation",
            format!("confirmation phrase must be '{}'", CONFIRM_PHRASE),
            None,
        );
    }

    let store = RosterStore::new(workspace);
    let config_store = ConfigStore::new(workspace);
    for path in [store.csv_path(), config_store.path()] {
        if let Err(e) = std::fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                return err(
                    &req.id,
                    "reset_failed",
                    e.to_string(),
                    Some(json!({ "path": path.to_string_lossy() })),
                );
            }
        }
    }

    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "workspace.reset" => Some(handle_workspace_reset(state, req)),
        "system.info" => Some(handle_system_info(state, req)),
        _ => None,
    }
}
