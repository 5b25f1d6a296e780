use serde_json::{json, Map, Value};

use crate::config::{ConfigStore, UniversityConfig};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};

fn parse_i64_range(v: &Value, key: &str, min: i64, max: i64) -> Result<i64, String> {
    let n = v
        .as_i64()
        .ok_or_else(|| format!("{} must be integer", key))?;
    if !(min..=max).contains(&n) {
        return Err(format!("{} must be in {}..={}", key, min, max));
    }
    Ok(n)
}

fn parse_non_empty_string(v: &Value, key: &str) -> Result<String, String> {
    let s = v
        .as_str()
        .ok_or_else(|| format!("{} must be string", key))?
        .trim();
    if s.is_empty() {
        return Err(format!("{} must not be empty", key));
    }
    Ok(s.to_string())
}

/// Field-wise patch application. `version` is read-only; unknown keys are
/// rejected rather than stored.
fn merge_config_patch(
    config: &mut UniversityConfig,
    patch: &Map<String, Value>,
) -> Result<(), String> {
    for (k, v) in patch {
        match k.as_str() {
            "university_name" => {
                config.university_name = parse_non_empty_string(v, k)?;
            }
            "max_students" => {
                config.max_students = parse_i64_range(v, k, 1, 1_000_000)?;
            }
            "min_age" => {
                config.min_age = parse_i64_range(v, k, 1, 150)?;
            }
            "max_age" => {
                config.max_age = parse_i64_range(v, k, 1, 150)?;
            }
            "specialties" => {
                let Some(list) = v.as_array() else {
                    return Err("specialties must be a list of strings".into());
                };
                let mut specialties = Vec::new();
                for item in list {
                    specialties.push(parse_non_empty_string(item, "specialties entry")?);
                }
                if specialties.is_empty() {
                    return Err("specialties must not be empty".into());
                }
                config.specialties = specialties;
            }
            "version" => return Err("version is read-only".into()),
            _ => return Err(format!("unknown config field: {}", k)),
        }
    }
    if config.min_age > config.max_age {
        return Err("min_age must not exceed max_age".into());
    }
    Ok(())
}

fn handle_config_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(workspace) = state.workspace.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let config = ConfigStore::new(workspace).load();
    match serde_json::to_value(&config) {
        Ok(v) => ok(&req.id, json!({ "config": v })),
        Err(e) => err(&req.id, "config_encode_failed", e.to_string(), None),
    }
}

fn handle_config_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(workspace) = state.workspace.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(patch) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    let store = ConfigStore::new(workspace);
    let mut config = store.load();
    if let Err(msg) = merge_config_patch(&mut config, patch) {
        return err(&req.id, "bad_params", msg, None);
    }
    if let Err(e) = store.save(&config) {
        return err(&req.id, "config_save_failed", e.to_string(), None);
    }

    match serde_json::to_value(&config) {
        Ok(v) => ok(&req.id, json!({ "config": v })),
        Err(e) => err(&req.id, "config_encode_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "config.get" => Some(handle_config_get(state, req)),
        "config.update" => Some(handle_config_update(state, req)),
        _ => None,
    }
}
