use crate::ipc::helpers::{get_required_str, parse_params, respond, to_json, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store::{BulkUploadAdvance, BulkUploadInput, Store};
use serde_json::{json, Value};

fn uploads_list(store: &Store) -> Result<Value, HandlerErr> {
    let rows = store
        .bulk_uploads_newest_first()
        .into_iter()
        .map(|u| {
            let mut v = to_json(u)?;
            v["className"] = json!(store.class_label(&u.class_id));
            if let Ok(s) = store.subject(&u.subject_id) {
                v["subjectName"] = json!(s.name);
            }
            Ok(v)
        })
        .collect::<Result<Vec<_>, HandlerErr>>()?;
    Ok(json!({ "uploads": rows }))
}

fn uploads_create(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let input: BulkUploadInput = parse_params(params)?;
    Ok(json!({ "upload": to_json(&store.create_bulk_upload(input)?)? }))
}

fn uploads_advance(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "uploadId")?;
    let step: BulkUploadAdvance = parse_params(params)?;
    Ok(json!({ "upload": to_json(&store.advance_bulk_upload(&id, step)?)? }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let store = &mut state.store;
    let p = &req.params;
    let result = match req.method.as_str() {
        "bulkUploads.list" => uploads_list(store),
        "bulkUploads.create" => uploads_create(store, p),
        "bulkUploads.advance" => uploads_advance(store, p),
        _ => return None,
    };
    Some(respond(req, result))
}
