use crate::ipc::helpers::{get_required_str, parse_field, parse_params, respond, to_json, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::permissions::{parse_action, parse_role, AdminRole, RESOURCES};
use crate::store::{AdminUserInput, AdminUserPatch, Store, StoreError};
use serde_json::{json, Value};

fn user_id(params: &Value) -> Result<String, HandlerErr> {
    get_required_str(params, "userId")
}

fn roles_list(store: &Store) -> Result<Value, HandlerErr> {
    Ok(json!({ "users": to_json(&store.admin_users)? }))
}

fn roles_get(store: &Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = user_id(params)?;
    Ok(json!({ "user": to_json(store.admin_user(&id)?)? }))
}

fn roles_create(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let input: AdminUserInput = parse_params(params)?;
    Ok(json!({ "user": to_json(&store.create_admin_user(input)?)? }))
}

fn roles_update(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = user_id(params)?;
    let patch: AdminUserPatch = parse_field(params, "patch")?;
    Ok(json!({ "user": to_json(&store.update_admin_user(&id, patch)?)? }))
}

fn roles_delete(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = user_id(params)?;
    store.delete_admin_user(&id)?;
    Ok(json!({ "deleted": true }))
}

fn roles_apply_template(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = user_id(params)?;
    let role = parse_role(&get_required_str(params, "role")?).map_err(StoreError::from)?;
    Ok(json!({ "user": to_json(&store.apply_role_template(&id, role)?)? }))
}

fn roles_toggle_permission(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = user_id(params)?;
    let resource = get_required_str(params, "resource")?;
    let action = parse_action(&get_required_str(params, "action")?).map_err(StoreError::from)?;
    let on = params
        .get("enabled")
        .and_then(|v| v.as_bool())
        .ok_or_else(|| HandlerErr::field("enabled", "enabled must be boolean"))?;
    Ok(json!({ "user": to_json(&store.toggle_admin_permission(&id, &resource, action, on)?)? }))
}

fn roles_check(store: &Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = user_id(params)?;
    let resource = get_required_str(params, "resource")?;
    let action = parse_action(&get_required_str(params, "action")?).map_err(StoreError::from)?;
    Ok(json!({ "allowed": store.check_admin_permission(&id, &resource, action)? }))
}

fn roles_templates() -> Result<Value, HandlerErr> {
    let templates = AdminRole::ALL
        .iter()
        .map(|r| Ok(json!({ "role": r.as_str(), "permissions": to_json(&r.template())? })))
        .collect::<Result<Vec<_>, HandlerErr>>()?;
    Ok(json!({ "templates": templates, "resources": RESOURCES }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let store = &mut state.store;
    let p = &req.params;
    let result = match req.method.as_str() {
        "roles.list" => roles_list(store),
        "roles.get" => roles_get(store, p),
        "roles.create" => roles_create(store, p),
        "roles.update" => roles_update(store, p),
        "roles.delete" => roles_delete(store, p),
        "roles.applyTemplate" => roles_apply_template(store, p),
        "roles.togglePermission" => roles_toggle_permission(store, p),
        "roles.check" => roles_check(store, p),
        "roles.templates" => roles_templates(),
        _ => return None,
    };
    Some(respond(req, result))
}
