use std::path::Path;

use serde_json::{json, Value};

use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::roster::RosterStore;
use crate::stats;

/// Age buckets the demographics histogram is drawn with.
const AGE_BUCKET_WIDTH: i64 = 5;

fn workspace<'a>(state: &'a AppState, req: &Request) -> Result<&'a Path, Value> {
    state
        .workspace
        .as_deref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

fn handle_stats_summary(state: &mut AppState, req: &Request) -> Value {
    let workspace = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let table = RosterStore::new(workspace).load();
    match serde_json::to_value(stats::summary(&table)) {
        Ok(v) => ok(&req.id, v),
        Err(e) => err(&req.id, "stats_encode_failed", e.to_string(), None),
    }
}

fn handle_stats_breakdown(state: &mut AppState, req: &Request) -> Value {
    let workspace = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let table = RosterStore::new(workspace).load();

    ok(
        &req.id,
        json!({
            "bySpecialty": stats::by_specialty(&table),
            "ageHistogram": stats::age_histogram(&table, AGE_BUCKET_WIDTH),
            "gradeSummary": stats::grade_summary(&table),
            "scatter": stats::scatter_points(&table)
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "stats.summary" => Some(handle_stats_summary(state, req)),
        "stats.breakdown" => Some(handle_stats_breakdown(state, req)),
        _ => None,
    }
}
