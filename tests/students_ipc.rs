mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar};

fn numbers(list: &serde_json::Value) -> Vec<String> {
    list["students"]
        .as_array()
        .expect("students")
        .iter()
        .filter_map(|s| s["studentId"].as_str().map(str::to_string))
        .collect()
}

#[test]
fn students_list_combines_filters() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let all = request_ok(&mut stdin, &mut reader, "1", "students.list", json!({}));
    assert_eq!(all["total"], json!(6));
    assert_eq!(numbers(&all).len(), 6);

    let johnsons = request_ok(&mut stdin, &mut reader, "2", "students.list", json!({ "search": "JOHNSON" }));
    assert_eq!(numbers(&johnsons), vec!["STU001", "STU006"]);

    let arts = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.list",
        json!({ "search": "johnson", "classId": "3", "status": "all" }),
    );
    assert_eq!(numbers(&arts), vec!["STU006"]);
    assert_eq!(arts["total"], json!(6));

    let suspended = request_ok(&mut stdin, &mut reader, "4", "students.list", json!({ "status": "suspended" }));
    assert_eq!(numbers(&suspended), vec!["STU003"]);
    assert_eq!(suspended["students"][0]["className"], json!("Form 2 - Arts A"));

    let by_number = request_ok(&mut stdin, &mut reader, "5", "students.list", json!({ "search": "stu00" }));
    assert_eq!(numbers(&by_number).len(), 6);

    let exact = request_ok(&mut stdin, &mut reader, "6", "students.list", json!({ "search": "STU002" }));
    assert_eq!(numbers(&exact), vec!["STU002"]);
    assert_eq!(exact["students"][0]["name"], json!("Michael Chen"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn enrollment_follows_create_move_and_delete() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "students.create",
        json!({
            "name": "Ama Owusu",
            "studentId": "STU007",
            "classId": "5",
            "email": "ama@email.com",
            "guardianName": "Kofi Owusu"
        }),
    );
    let student = &created["student"];
    assert_eq!(student["status"], json!("active"));
    assert_eq!(student["form"], json!("Form 2"));
    assert_eq!(student["departmentName"], json!("Technical"));

    let class = request_ok(&mut stdin, &mut reader, "2", "classes.get", json!({ "classId": "5" }));
    assert_eq!(class["class"]["currentEnrollment"], json!(23));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "students.create",
        json!({ "name": "Duplicate", "studentId": "stu007", "classId": "5" }),
    );
    assert_eq!(e["code"], json!("conflict"));

    let moved = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.update",
        json!({ "studentId": "STU007", "patch": { "classId": "4" } }),
    );
    assert_eq!(moved["student"]["form"], json!("Form 3"));
    assert_eq!(moved["student"]["departmentId"], json!("3"));

    let five = request_ok(&mut stdin, &mut reader, "5", "classes.get", json!({ "classId": "5" }));
    assert_eq!(five["class"]["currentEnrollment"], json!(22));
    let four = request_ok(&mut stdin, &mut reader, "6", "classes.get", json!({ "classId": "4" }));
    assert_eq!(four["class"]["currentEnrollment"], json!(29));

    let deleted = request_ok(&mut stdin, &mut reader, "7", "students.delete", json!({ "studentId": "STU007" }));
    assert_eq!(deleted["resultsRemoved"], json!(0));
    let four = request_ok(&mut stdin, &mut reader, "8", "classes.get", json!({ "classId": "4" }));
    assert_eq!(four["class"]["currentEnrollment"], json!(28));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn full_class_rejects_new_students() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "classes.update",
        json!({ "classId": "5", "patch": { "currentEnrollment": 25 } }),
    );
    let class = request_ok(&mut stdin, &mut reader, "2", "classes.get", json!({ "classId": "5" }));
    assert_eq!(class["class"]["enrollmentStatus"], json!("Full"));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "students.create",
        json!({ "name": "Late Comer", "studentId": "STU010", "classId": "5" }),
    );
    assert_eq!(e["code"], json!("conflict"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn status_changes_and_delete_cascades_results() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let e = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "students.setStatus",
        json!({ "studentId": "STU004", "status": "expelled" }),
    );
    assert_eq!(e["details"]["field"], json!("status"));

    let s = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.setStatus",
        json!({ "studentId": "4", "status": "graduated" }),
    );
    assert_eq!(s["student"]["status"], json!("graduated"));

    let deleted = request_ok(&mut stdin, &mut reader, "3", "students.delete", json!({ "studentId": "STU004" }));
    assert_eq!(deleted["resultsRemoved"], json!(4));

    let e = request_err(&mut stdin, &mut reader, "4", "students.get", json!({ "studentId": "STU004" }));
    assert_eq!(e["code"], json!("not_found"));

    let left = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "results.list",
        json!({ "studentId": "4" }),
    );
    assert_eq!(left["results"], json!([]));

    drop(stdin);
    let _ = child.wait();
}
