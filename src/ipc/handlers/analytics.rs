use std::path::PathBuf;

use crate::ipc::helpers::{get_opt_str, get_required_str, respond, to_json, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store::Store;
use serde_json::{json, Value};

const DEFAULT_ACTIVITY_LIMIT: usize = 20;

fn dashboard_admin(store: &Store) -> Result<Value, HandlerErr> {
    to_json(&store.admin_dashboard())
}

fn dashboard_student(store: &Store, params: &Value) -> Result<Value, HandlerErr> {
    // Students land here right after login; fall back to the session user.
    let student = match get_opt_str(params, "studentId") {
        Some(s) => s,
        None => store
            .session
            .user_id()
            .map(str::to_string)
            .ok_or_else(|| HandlerErr::field("studentId", "missing studentId"))?,
    };
    let semester = get_opt_str(params, "semester");
    to_json(&store.student_dashboard(&student, semester.as_deref())?)
}

fn analytics_overview(store: &Store, params: &Value) -> Result<Value, HandlerErr> {
    let semester = get_opt_str(params, "semester");
    to_json(&store.analytics_overview(semester.as_deref()))
}

fn semesters_list(store: &Store) -> Result<Value, HandlerErr> {
    Ok(json!({
        "current": store.settings.current_term(),
        "semesters": store.semesters(),
    }))
}

fn activity_recent(store: &Store, params: &Value) -> Result<Value, HandlerErr> {
    let limit = match params.get("limit") {
        None | Some(Value::Null) => DEFAULT_ACTIVITY_LIMIT,
        Some(v) => v
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| HandlerErr::field("limit", "limit must be a non-negative integer"))?,
    };
    Ok(json!({ "activity": to_json(&store.recent_activity(limit))? }))
}

fn activity_export_csv(store: &Store, params: &Value) -> Result<Value, HandlerErr> {
    let out_path = PathBuf::from(get_required_str(params, "outPath")?);
    let rows = store.export_activity_csv(&out_path)?;
    Ok(json!({ "path": out_path.to_string_lossy(), "rows": rows }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let store = &state.store;
    let p = &req.params;
    let result = match req.method.as_str() {
        "dashboard.admin" => dashboard_admin(store),
        "dashboard.student" => dashboard_student(store, p),
        "analytics.overview" => analytics_overview(store, p),
        "semesters.list" => semesters_list(store),
        "activity.recent" => activity_recent(store, p),
        "activity.exportCsv" => activity_export_csv(store, p),
        _ => return None,
    };
    Some(respond(req, result))
}
