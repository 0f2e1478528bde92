use crate::ipc::helpers::{get_required_str, parse_field, parse_params, respond, to_json, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::{Student, StudentStatus};
use crate::store::{filter_students, Store, StudentFilter, StudentInput, StudentPatch};
use serde_json::{json, Value};

fn student_json(store: &Store, s: &Student) -> Result<Value, HandlerErr> {
    let mut v = to_json(s)?;
    v["className"] = json!(store.class_label(&s.class_id));
    v["departmentName"] = json!(store.department_name(&s.department_id));
    v["programName"] = json!(store.program_name(&s.department_id, &s.program_id));
    Ok(v)
}

fn students_list(store: &Store, params: &Value) -> Result<Value, HandlerErr> {
    let filter: StudentFilter = parse_params(params)?;
    let rows = filter_students(&store.students, &filter)
        .into_iter()
        .map(|s| student_json(store, s))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(json!({ "total": store.students.len(), "students": rows }))
}

fn students_get(store: &Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "studentId")?;
    let student = store.student(&id)?;
    Ok(json!({ "student": student_json(store, student)? }))
}

fn students_create(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let input: StudentInput = parse_params(params)?;
    let student = store.create_student(input)?;
    Ok(json!({ "student": student_json(store, &student)? }))
}

fn students_update(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "studentId")?;
    let patch: StudentPatch = parse_field(params, "patch")?;
    let student = store.update_student(&id, patch)?;
    Ok(json!({ "student": student_json(store, &student)? }))
}

fn students_set_status(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "studentId")?;
    let raw = get_required_str(params, "status")?;
    let status = StudentStatus::parse(&raw)
        .ok_or_else(|| HandlerErr::field("status", format!("unknown status: {raw}")))?;
    let student = store.set_student_status(&id, status)?;
    Ok(json!({ "student": student_json(store, &student)? }))
}

fn students_delete(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "studentId")?;
    let removed = store.delete_student(&id)?;
    Ok(json!({ "deleted": true, "resultsRemoved": removed }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let store = &mut state.store;
    let p = &req.params;
    let result = match req.method.as_str() {
        "students.list" => students_list(store, p),
        "students.get" => students_get(store, p),
        "students.create" => students_create(store, p),
        "students.update" => students_update(store, p),
        "students.setStatus" => students_set_status(store, p),
        "students.delete" => students_delete(store, p),
        _ => return None,
    };
    Some(respond(req, result))
}
