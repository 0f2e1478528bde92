use crate::ipc::helpers::{get_opt_str, get_required_str, parse_field, parse_params, respond, to_json, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::{ClassLevel, SubjectType};
use crate::store::{
    ClassInput, ClassPatch, DepartmentInput, ProgramInput, Store, SubjectFilter, SubjectInput,
    SubjectPatch,
};
use serde_json::{json, Value};

fn departments_list(store: &Store) -> Result<Value, HandlerErr> {
    let rows: Vec<Value> = store
        .departments
        .iter()
        .map(|d| {
            json!({
                "id": d.id,
                "name": d.name,
                "description": d.description,
                "programs": d.programs,
                "classCount": store.classes.iter().filter(|c| c.department_id == d.id).count(),
                "subjectCount": store.subjects.iter().filter(|s| s.department_id == d.id).count(),
                "studentCount": store.students.iter().filter(|s| s.department_id == d.id).count(),
            })
        })
        .collect();
    Ok(json!({ "departments": rows }))
}

fn departments_get(store: &Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "departmentId")?;
    Ok(json!({ "department": to_json(store.department(&id)?)? }))
}

fn departments_create(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let input: DepartmentInput = parse_params(params)?;
    Ok(json!({ "department": to_json(&store.create_department(input)?)? }))
}

fn departments_update(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "departmentId")?;
    let patch: DepartmentInput = parse_field(params, "patch")?;
    Ok(json!({ "department": to_json(&store.update_department(&id, patch)?)? }))
}

fn departments_delete(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "departmentId")?;
    store.delete_department(&id)?;
    Ok(json!({ "deleted": true }))
}

fn programs_add(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let dept = get_required_str(params, "departmentId")?;
    let input: ProgramInput = parse_params(params)?;
    Ok(json!({ "program": to_json(&store.add_program(&dept, input)?)? }))
}

fn programs_update(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let dept = get_required_str(params, "departmentId")?;
    let program = get_required_str(params, "programId")?;
    let patch: ProgramInput = parse_field(params, "patch")?;
    Ok(json!({ "program": to_json(&store.update_program(&dept, &program, patch)?)? }))
}

fn programs_remove(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let dept = get_required_str(params, "departmentId")?;
    let program = get_required_str(params, "programId")?;
    store.remove_program(&dept, &program)?;
    Ok(json!({ "removed": true }))
}

fn class_json(store: &Store, c: &ClassLevel) -> Result<Value, HandlerErr> {
    let mut v = to_json(c)?;
    v["label"] = json!(c.label());
    v["enrollmentStatus"] = to_json(&c.enrollment_status())?;
    v["departmentName"] = json!(store.department_name(&c.department_id));
    v["programName"] = json!(store.program_name(&c.department_id, &c.program_id));
    v["studentCount"] = json!(store.class_students(&c.id).len());
    Ok(v)
}

fn classes_list(store: &Store) -> Result<Value, HandlerErr> {
    let rows = store
        .classes
        .iter()
        .map(|c| class_json(store, c))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(json!({ "classes": rows }))
}

fn classes_get(store: &Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "classId")?;
    let class = store.class(&id)?;
    let subjects = to_json(&store.subjects_for_class(&id))?;
    Ok(json!({ "class": class_json(store, class)?, "subjects": subjects }))
}

fn classes_create(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let input: ClassInput = parse_params(params)?;
    let class = store.create_class(input)?;
    Ok(json!({ "class": class_json(store, &class)? }))
}

fn classes_update(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "classId")?;
    let patch: ClassPatch = parse_field(params, "patch")?;
    let class = store.update_class(&id, patch)?;
    Ok(json!({ "class": class_json(store, &class)? }))
}

fn classes_delete(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "classId")?;
    store.delete_class(&id)?;
    Ok(json!({ "deleted": true }))
}

fn subjects_list(store: &Store, params: &Value) -> Result<Value, HandlerErr> {
    let kind = match get_opt_str(params, "type").as_deref() {
        None | Some("all") => None,
        Some(raw) => Some(
            SubjectType::parse(raw)
                .ok_or_else(|| HandlerErr::field("type", format!("unknown subject type: {raw}")))?,
        ),
    };
    let filter = SubjectFilter {
        class_id: get_opt_str(params, "classId").filter(|c| c != "all"),
        department_id: get_opt_str(params, "departmentId").filter(|d| d != "all"),
        kind,
    };
    Ok(json!({ "subjects": to_json(&store.list_subjects(&filter))? }))
}

fn subjects_get(store: &Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "subjectId")?;
    Ok(json!({ "subject": to_json(store.subject(&id)?)? }))
}

fn subjects_create(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let input: SubjectInput = parse_params(params)?;
    Ok(json!({ "subject": to_json(&store.create_subject(input)?)? }))
}

fn subjects_update(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "subjectId")?;
    let patch: SubjectPatch = parse_field(params, "patch")?;
    Ok(json!({ "subject": to_json(&store.update_subject(&id, patch)?)? }))
}

fn subjects_delete(store: &mut Store, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "subjectId")?;
    store.delete_subject(&id)?;
    Ok(json!({ "deleted": true }))
}

fn subjects_assign(store: &mut Store, params: &Value, on: bool) -> Result<Value, HandlerErr> {
    let subject = get_required_str(params, "subjectId")?;
    let class = get_required_str(params, "classId")?;
    let out = if on {
        store.assign_subject_class(&subject, &class)?
    } else {
        store.unassign_subject_class(&subject, &class)?
    };
    Ok(json!({ "subject": to_json(&out)? }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let store = &mut state.store;
    let p = &req.params;
    let result = match req.method.as_str() {
        "departments.list" => departments_list(store),
        "departments.get" => departments_get(store, p),
        "departments.create" => departments_create(store, p),
        "departments.update" => departments_update(store, p),
        "departments.delete" => departments_delete(store, p),
        "programs.add" => programs_add(store, p),
        "programs.update" => programs_update(store, p),
        "programs.remove" => programs_remove(store, p),
        "classes.list" => classes_list(store),
        "classes.get" => classes_get(store, p),
        "classes.create" => classes_create(store, p),
        "classes.update" => classes_update(store, p),
        "classes.delete" => classes_delete(store, p),
        "subjects.list" => subjects_list(store, p),
        "subjects.get" => subjects_get(store, p),
        "subjects.create" => subjects_create(store, p),
        "subjects.update" => subjects_update(store, p),
        "subjects.delete" => subjects_delete(store, p),
        "subjects.assignClass" => subjects_assign(store, p, true),
        "subjects.unassignClass" => subjects_assign(store, p, false),
        _ => return None,
    };
    Some(respond(req, result))
}
