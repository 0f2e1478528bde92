use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{get_required_str, respond, to_json, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::session::AdminTab;
use serde_json::json;

fn str_param<'a>(req: &'a Request, key: &str) -> &'a str {
    req.params.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

fn snapshot(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    to_json(&state.store.session.snapshot())
}

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let admin = req
        .params
        .get("isAdmin")
        .and_then(|v| v.as_bool())
        .unwrap_or(state.store.session.admin_login);
    let result = state
        .store
        .login(str_param(req, "userId"), str_param(req, "password"), admin)
        .map_err(HandlerErr::from)
        .and_then(|_| snapshot(state));
    respond(req, result)
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.store.logout();
    respond(req, snapshot(state))
}

fn handle_toggle_settings(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = state
        .store
        .session
        .toggle_settings()
        .map_err(HandlerErr::from)
        .and_then(|_| snapshot(state));
    respond(req, result)
}

fn handle_select_tab(state: &mut AppState, req: &Request) -> serde_json::Value {
    let raw = match get_required_str(&req.params, "tab") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let Some(tab) = AdminTab::parse(&raw) else {
        return err(
            &req.id,
            "bad_params",
            format!("unknown tab: {raw}"),
            Some(json!({ "field": "tab" })),
        );
    };
    let result = state
        .store
        .session
        .select_tab(tab)
        .map_err(HandlerErr::from)
        .and_then(|_| snapshot(state));
    respond(req, result)
}

fn handle_toggle_login_mode(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = state
        .store
        .session
        .toggle_login_mode()
        .map_err(HandlerErr::from)
        .and_then(|_| snapshot(state));
    respond(req, result)
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(req, snapshot(state))
}

fn handle_change_password(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.store.session.change_password(
        str_param(req, "currentPassword"),
        str_param(req, "newPassword"),
        str_param(req, "confirmPassword"),
    ) {
        Ok(()) => {
            state.store.record(
                "Password Changed",
                "password change accepted",
                crate::model::ActivityKind::Info,
            );
            ok(&req.id, json!({ "changed": true }))
        }
        Err(e) => HandlerErr::from(e).response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.login" => Some(handle_login(state, req)),
        "session.logout" => Some(handle_logout(state, req)),
        "session.toggleSettings" => Some(handle_toggle_settings(state, req)),
        "session.selectTab" => Some(handle_select_tab(state, req)),
        "session.toggleLoginMode" => Some(handle_toggle_login_mode(state, req)),
        "session.get" => Some(handle_get(state, req)),
        "account.changePassword" => Some(handle_change_password(state, req)),
        _ => None,
    }
}
