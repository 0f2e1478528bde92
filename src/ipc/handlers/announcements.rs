use crate::ipc::helpers::{get_opt_str, get_required_str, parse_field, parse_params, respond, to_json, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::{AnnouncementStatus, Channels};
use crate::store::{AnnouncementInput, NotificationInput, Store};
use serde_json::{json, Value};

fn announcements_list(store: &Store, params: &Value) -> Result<Value, HandlerErr> {
    let status = match get_opt_str(params, "status").as_deref() {
        None | Some("all") => None,
        Some("draft") => Some(AnnouncementStatus::Draft),
        Some("published") => Some(AnnouncementStatus::Published),
        Some(other) => {
            return Err(HandlerErr::field("status", format!("unknown status: {other}")))
        }
    };
    Ok(json!({ "announcements": to_json(&store.list_announcements(status))? }))
}

fn announcements_create(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let input: AnnouncementInput = parse_params(params)?;
    Ok(json!({ "announcement": to_json(&store.create_announcement(input)?)? }))
}

fn announcements_publish(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "announcementId")?;
    Ok(json!({ "announcement": to_json(&store.publish_announcement(&id)?)? }))
}

fn announcements_delete(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "announcementId")?;
    store.delete_announcement(&id)?;
    Ok(json!({ "deleted": true }))
}

fn publishing_classes(store: &Store, params: &Value) -> Result<Value, HandlerErr> {
    let semester = get_opt_str(params, "semester");
    Ok(json!({
        "semester": store.semester_or_current(semester.as_deref()),
        "classes": to_json(&store.publishing_classes(semester.as_deref())?)?,
    }))
}

fn publishing_publish(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let class_id = get_required_str(params, "classId")?;
    let semester = get_opt_str(params, "semester");
    let channels: Channels = parse_field(params, "channels")?;
    let publication = store.publish_results(&class_id, semester.as_deref(), channels)?;
    Ok(json!({ "publication": to_json(&publication)? }))
}

fn publishing_list(store: &Store) -> Result<Value, HandlerErr> {
    let rows = store
        .publications_newest_first()
        .into_iter()
        .map(|p| {
            let mut v = to_json(p)?;
            v["className"] = json!(store.class_label(&p.class_id));
            Ok(v)
        })
        .collect::<Result<Vec<_>, HandlerErr>>()?;
    Ok(json!({ "publications": rows }))
}

fn notifications_send(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let input: NotificationInput = parse_params(params)?;
    let deliveries = store.send_notification(input)?;
    let logged = deliveries.iter().filter(|d| d.status == "logged").count();
    Ok(json!({
        "logged": logged,
        "skipped": deliveries.len() - logged,
        "deliveries": to_json(&deliveries)?,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let store = &mut state.store;
    let p = &req.params;
    let result = match req.method.as_str() {
        "announcements.list" => announcements_list(store, p),
        "announcements.create" => announcements_create(store, p),
        "announcements.publish" => announcements_publish(store, p),
        "announcements.delete" => announcements_delete(store, p),
        "publishing.classes" => publishing_classes(store, p),
        "publishing.publish" => publishing_publish(store, p),
        "publishing.list" => publishing_list(store),
        "notifications.send" => notifications_send(store, p),
        _ => return None,
    };
    Some(respond(req, result))
}
