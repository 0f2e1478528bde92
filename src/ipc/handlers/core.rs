use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = &state.store;
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "schoolName": store.settings.school_name(),
            "currentTerm": store.settings.current_term(),
            "counts": {
                "departments": store.departments.len(),
                "classes": store.classes.len(),
                "subjects": store.subjects.len(),
                "students": store.students.len(),
                "results": store.results.len(),
            }
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        _ => None,
    }
}
