use std::path::PathBuf;

use crate::ipc::helpers::{get_opt_str, get_required_str, parse_params, respond, to_json, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store::{ResultFilter, ResultInput, Store};
use serde_json::{json, Value};

fn results_enter(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    if !params.get("score").is_some_and(Value::is_number) {
        return Err(HandlerErr::field("score", "score must be a number"));
    }
    let input: ResultInput = parse_params(params)?;
    Ok(json!({ "result": to_json(&store.enter_result(input)?)? }))
}

fn results_list(store: &Store, params: &Value) -> Result<Value, HandlerErr> {
    let filter: ResultFilter = parse_params(params)?;
    let rows = store
        .list_results(&filter)
        .into_iter()
        .map(|r| {
            let mut v = to_json(r)?;
            if let Ok(s) = store.student(&r.student_id) {
                v["studentName"] = json!(s.name);
                v["studentNumber"] = json!(s.student_id);
            }
            if let Ok(s) = store.subject(&r.subject_id) {
                v["subjectName"] = json!(s.name);
            }
            Ok(v)
        })
        .collect::<Result<Vec<_>, HandlerErr>>()?;
    Ok(json!({ "results": rows }))
}

fn results_delete(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "resultId")?;
    Ok(json!({ "result": to_json(&store.delete_result(&id)?)? }))
}

fn results_regrade(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let changed = store.regrade(get_opt_str(params, "semester").as_deref())?;
    Ok(json!({ "changed": changed }))
}

fn results_roster(store: &Store, params: &Value) -> Result<Value, HandlerErr> {
    let class_id = get_required_str(params, "classId")?;
    let subject_id = get_required_str(params, "subjectId")?;
    let semester = get_opt_str(params, "semester");
    let rows = store.roster(&class_id, &subject_id, semester.as_deref())?;
    Ok(json!({
        "semester": store.semester_or_current(semester.as_deref()),
        "rows": to_json(&rows)?,
        "subjects": to_json(&store.subjects_for_class(&class_id))?,
    }))
}

fn results_summary(store: &Store, params: &Value) -> Result<Value, HandlerErr> {
    let student = get_required_str(params, "studentId")?;
    let semester = get_opt_str(params, "semester");
    to_json(&store.summary(&student, semester.as_deref())?)
}

fn results_slip(store: &Store, params: &Value) -> Result<Value, HandlerErr> {
    let student = get_required_str(params, "studentId")?;
    let semester = get_opt_str(params, "semester");
    let out_dir = get_opt_str(params, "outDir").map(PathBuf::from);
    to_json(&store.slip(&student, semester.as_deref(), out_dir.as_deref())?)
}

fn results_slip_bundle(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let class_id = get_required_str(params, "classId")?;
    let out_path = PathBuf::from(get_required_str(params, "outPath")?);
    let semester = get_opt_str(params, "semester");
    to_json(&store.slip_bundle(&class_id, semester.as_deref(), &out_path)?)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let store = &mut state.store;
    let p = &req.params;
    let result = match req.method.as_str() {
        "results.enter" => results_enter(store, p),
        "results.list" => results_list(store, p),
        "results.delete" => results_delete(store, p),
        "results.regrade" => results_regrade(store, p),
        "results.roster" => results_roster(store, p),
        "results.summary" => results_summary(store, p),
        "results.slip" => results_slip(store, p),
        "results.slipBundle" => results_slip_bundle(store, p),
        _ => return None,
    };
    Some(respond(req, result))
}
