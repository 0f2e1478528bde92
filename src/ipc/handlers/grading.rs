use crate::ipc::helpers::{get_opt_str, get_required_str, parse_field, parse_params, respond, to_json, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store::{GradeLevelInput, GradeLevelPatch, GradingSystemInput, GradingSystemPatch, Store};
use serde_json::{json, Value};

fn system_id(params: &Value) -> Result<String, HandlerErr> {
    get_required_str(params, "systemId")
}

fn grading_list(store: &Store) -> Result<Value, HandlerErr> {
    let active = store
        .grading_systems
        .iter()
        .find(|g| g.is_default)
        .map(|g| g.id.clone());
    Ok(json!({
        "systems": to_json(&store.grading_systems)?,
        "defaultId": active,
    }))
}

fn grading_get(store: &Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = system_id(params)?;
    Ok(json!({ "system": to_json(store.grading_system(&id)?)? }))
}

fn grading_create(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let input: GradingSystemInput = parse_params(params)?;
    Ok(json!({ "system": to_json(&store.create_grading_system(input)?)? }))
}

fn grading_update(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = system_id(params)?;
    let patch: GradingSystemPatch = parse_field(params, "patch")?;
    Ok(json!({ "system": to_json(&store.update_grading_system(&id, patch)?)? }))
}

fn grading_delete(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = system_id(params)?;
    store.delete_grading_system(&id)?;
    Ok(json!({ "deleted": true }))
}

fn grading_set_default(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = system_id(params)?;
    Ok(json!({ "system": to_json(&store.set_default_grading_system(&id)?)? }))
}

fn grading_add_level(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = system_id(params)?;
    let level: GradeLevelInput = parse_field(params, "level")?;
    Ok(json!({ "system": to_json(&store.add_grade_level(&id, level)?)? }))
}

fn grading_update_level(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = system_id(params)?;
    let level_id = get_required_str(params, "levelId")?;
    let patch: GradeLevelPatch = parse_field(params, "patch")?;
    Ok(json!({ "system": to_json(&store.update_grade_level(&id, &level_id, patch)?)? }))
}

fn grading_remove_level(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = system_id(params)?;
    let level_id = get_required_str(params, "levelId")?;
    Ok(json!({ "system": to_json(&store.remove_grade_level(&id, &level_id)?)? }))
}

fn grading_compute(store: &Store, params: &Value) -> Result<Value, HandlerErr> {
    let score = params
        .get("score")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| HandlerErr::field("score", "score must be a number"))?;
    let outcome = store.compute_grade(score, get_opt_str(params, "systemId").as_deref())?;
    to_json(&outcome)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let store = &mut state.store;
    let p = &req.params;
    let result = match req.method.as_str() {
        "grading.list" => grading_list(store),
        "grading.get" => grading_get(store, p),
        "grading.create" => grading_create(store, p),
        "grading.update" => grading_update(store, p),
        "grading.delete" => grading_delete(store, p),
        "grading.setDefault" => grading_set_default(store, p),
        "grading.addLevel" => grading_add_level(store, p),
        "grading.updateLevel" => grading_update_level(store, p),
        "grading.removeLevel" => grading_remove_level(store, p),
        "grading.compute" => grading_compute(store, p),
        _ => return None,
    };
    Some(respond(req, result))
}
