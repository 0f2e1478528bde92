use crate::ipc::error::{err, ok};
use crate::ipc::helpers::HandlerErr;
use crate::ipc::types::{AppState, Request};
use crate::settings::SettingsSection;
use serde_json::json;

fn handle_settings_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(raw) = req.params.get("section").and_then(|v| v.as_str()) else {
        return ok(&req.id, json!({ "settings": state.store.settings.all() }));
    };
    let Some(section) = SettingsSection::parse(raw) else {
        return err(
            &req.id,
            "bad_params",
            format!("unknown section: {raw}"),
            Some(json!({ "field": "section" })),
        );
    };
    ok(
        &req.id,
        json!({ "section": section.key(), "settings": state.store.settings.section(section) }),
    )
}

fn handle_settings_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(section_raw) = req.params.get("section").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing section", Some(json!({ "field": "section" })));
    };
    let Some(section) = SettingsSection::parse(section_raw) else {
        return err(&req.id, "bad_params", "unknown section", Some(json!({ "field": "section" })));
    };
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", Some(json!({ "field": "patch" })));
    };
    match state.store.update_settings(section, patch_obj) {
        Ok(current) => ok(&req.id, json!({ "section": section.key(), "settings": current })),
        Err(e) => HandlerErr::from(e).response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "settings.get" => Some(handle_settings_get(state, req)),
        "settings.update" => Some(handle_settings_update(state, req)),
        _ => None,
    }
}
