use std::path::Path;

use serde_json::{json, Value};

use crate::config::ConfigStore;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::CONFIRM_PHRASE;
use crate::ipc::types::{AppState, Request};
use crate::roster::{NewStudent, RosterStore, Status, StoreError, StudentPatch};

fn workspace<'a>(state: &'a AppState, req: &Request) -> Result<&'a Path, Value> {
    state
        .workspace
        .as_deref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

fn store_err(id: &str, e: StoreError) -> Value {
    err(id, &e.code, e.message, e.details)
}

fn required_str(req: &Request, key: &str) -> Result<String, Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

fn required_i64(req: &Request, key: &str) -> Result<i64, Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing/invalid {}", key), None))
}

fn required_f64(req: &Request, key: &str) -> Result<f64, Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing/invalid {}", key), None))
}

fn handle_students_list(state: &mut AppState, req: &Request) -> Value {
    let workspace = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let table = RosterStore::new(workspace).load();
    let students: Vec<Value> = (0..table.rows.len()).map(|i| table.row_json(i)).collect();
    ok(
        &req.id,
        json!({ "students": students, "count": students.len() }),
    )
}

fn handle_students_get(state: &mut AppState, req: &Request) -> Value {
    let workspace = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let id = match required_i64(req, "id") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let table = RosterStore::new(workspace).load();
    match table.find_by_id(id) {
        Some(row) => ok(&req.id, json!({ "student": table.row_json(row) })),
        None => err(
            &req.id,
            "not_found",
            format!("no student with id {}", id),
            None,
        ),
    }
}

fn handle_students_create(state: &mut AppState, req: &Request) -> Value {
    let workspace = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let last_name = match required_str(req, "lastName") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let first_name = match required_str(req, "firstName") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let specialty = match required_str(req, "specialty") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let average_grade = match required_f64(req, "averageGrade") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let age = match required_i64(req, "age") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let email = req
        .params
        .get("email")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());
    let credits = req.params.get("credits").and_then(|v| v.as_i64());

    let input = NewStudent {
        last_name,
        first_name,
        specialty,
        average_grade,
        age,
        email,
        credits,
    };
    let config = ConfigStore::new(workspace).load();
    match RosterStore::new(workspace).create(&config, &input) {
        Ok(student) => ok(&req.id, json!({ "student": student })),
        Err(e) => store_err(&req.id, e),
    }
}

fn parse_patch(req: &Request, patch: &serde_json::Map<String, Value>) -> Result<StudentPatch, Value> {
    let mut out = StudentPatch::default();
    for (k, v) in patch {
        match k.as_str() {
            "lastName" => {
                let Some(s) = v.as_str() else {
                    return Err(err(&req.id, "bad_params", "patch.lastName must be a string", None));
                };
                out.last_name = Some(s.to_string());
            }
            "firstName" => {
                let Some(s) = v.as_str() else {
                    return Err(err(&req.id, "bad_params", "patch.firstName must be a string", None));
                };
                out.first_name = Some(s.to_string());
            }
            "specialty" => {
                let Some(s) = v.as_str() else {
                    return Err(err(&req.id, "bad_params", "patch.specialty must be a string", None));
                };
                out.specialty = Some(s.to_string());
            }
            "averageGrade" => {
                let Some(n) = v.as_f64() else {
                    return Err(err(&req.id, "bad_params", "patch.averageGrade must be a number", None));
                };
                out.average_grade = Some(n);
            }
            "age" => {
                let Some(n) = v.as_i64() else {
                    return Err(err(&req.id, "bad_params", "patch.age must be an integer", None));
                };
                out.age = Some(n);
            }
            "email" => {
                let Some(s) = v.as_str() else {
                    return Err(err(&req.id, "bad_params", "patch.email must be a string", None));
                };
                out.email = Some(s.to_string());
            }
            "credits" => {
                let Some(n) = v.as_i64() else {
                    return Err(err(&req.id, "bad_params", "patch.credits must be an integer", None));
                };
                out.credits = Some(n);
            }
            "status" => {
                let Some(s) = v.as_str() else {
                    return Err(err(&req.id, "bad_params", "patch.status must be a string", None));
                };
                let Some(status) = Status::parse(s) else {
                    return Err(err(
                        &req.id,
                        "validation_failed",
                        "status must be one of: Actif, Inactif, Diplômé, Abandon",
                        None,
                    ));
                };
                out.status = Some(status);
            }
            "id" | "enrollmentDate" => {
                return Err(err(
                    &req.id,
                    "bad_params",
                    format!("{} is immutable", k),
                    None,
                ));
            }
            _ => {
                return Err(err(
                    &req.id,
                    "bad_params",
                    format!("unknown patch field: {}", k),
                    None,
                ));
            }
        }
    }
    Ok(out)
}

fn handle_students_update(state: &mut AppState, req: &Request) -> Value {
    let workspace = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let id = match required_i64(req, "id") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "missing/invalid patch", None);
    };
    let patch = match parse_patch(req, patch_obj) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let config = ConfigStore::new(workspace).load();
    match RosterStore::new(workspace).update(&config, id, &patch) {
        Ok(student) => ok(&req.id, json!({ "student": student })),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> Value {
    let workspace = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let id = match required_i64(req, "id") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match RosterStore::new(workspace).delete(id) {
        Ok(removed) => ok(&req.id, json!({ "removed": removed })),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_students_delete_all(state: &mut AppState, req: &Request) -> Value {
    let workspace = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
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
    match RosterStore::new(workspace).delete_all() {
        Ok(()) => ok(&req.id, json!({ "studentCount": 0 })),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_students_search(state: &mut AppState, req: &Request) -> Value {
    let workspace = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let query = match required_str(req, "query") {
        Ok(v) => v,
        Err(e) => return e,
    };
    if query.trim().is_empty() {
        return err(&req.id, "bad_params", "query must not be empty", None);
    }

    let table = RosterStore::new(workspace).load();
    let matches = table.search(&query);
    let students: Vec<Value> = matches.iter().map(|&i| table.row_json(i)).collect();
    ok(
        &req.id,
        json!({ "students": students, "count": students.len(), "query": query }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.get" => Some(handle_students_get(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        "students.deleteAll" => Some(handle_students_delete_all(state, req)),
        "students.search" => Some(handle_students_search(state, req)),
        _ => None,
    }
}
