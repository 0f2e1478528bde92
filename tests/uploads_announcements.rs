mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar};

#[test]
fn bulk_upload_status_machine() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let e = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "bulkUploads.create",
        json!({ "fileName": "results.pdf", "classId": "1", "subjectId": "1" }),
    );
    assert_eq!(e["details"]["field"], json!("fileName"));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "bulkUploads.create",
        json!({ "fileName": "econ.csv", "classId": "1", "subjectId": "7" }),
    );
    assert_eq!(e["details"]["field"], json!("subjectId"));

    request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "session.login",
        json!({ "userId": "teacher004", "password": "pw", "isAdmin": true }),
    );
    let created = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "bulkUploads.create",
        json!({ "fileName": "chemistry_form1.XLSX", "classId": "1", "subjectId": "3", "totalRecords": 30 }),
    );
    let upload = &created["upload"];
    let upload_id = upload["id"].as_str().expect("id").to_string();
    assert_eq!(upload["status"], json!("pending"));
    assert_eq!(upload["uploadedBy"], json!("teacher004"));

    let list = request_ok(&mut stdin, &mut reader, "5", "bulkUploads.list", json!({}));
    assert_eq!(list["uploads"][0]["id"], json!(upload_id));
    assert_eq!(list["uploads"][0]["className"], json!("Form 1 - Science A"));
    assert_eq!(list["uploads"][0]["subjectName"], json!("Chemistry"));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "bulkUploads.advance",
        json!({ "uploadId": upload_id, "status": "completed" }),
    );
    assert_eq!(e["code"], json!("invalid_transition"));

    request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "bulkUploads.advance",
        json!({ "uploadId": upload_id, "status": "processing", "processedRecords": 10 }),
    );

    let e = request_err(
        &mut stdin,
        &mut reader,
        "8",
        "bulkUploads.advance",
        json!({ "uploadId": upload_id, "status": "failed" }),
    );
    assert_eq!(e["details"]["field"], json!("errors"));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "9",
        "bulkUploads.advance",
        json!({
            "uploadId": upload_id,
            "status": "failed",
            "processedRecords": 31,
            "errors": ["Missing student ID in row 4"]
        }),
    );
    assert_eq!(e["details"]["field"], json!("processedRecords"));

    let done = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "bulkUploads.advance",
        json!({ "uploadId": upload_id, "status": "completed" }),
    );
    assert_eq!(done["upload"]["processedRecords"], json!(30));

    // Seed upload 2 already failed.
    let e = request_err(
        &mut stdin,
        &mut reader,
        "11",
        "bulkUploads.advance",
        json!({ "uploadId": "2", "status": "processing" }),
    );
    assert_eq!(e["code"], json!("invalid_transition"));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "12",
        "bulkUploads.advance",
        json!({ "uploadId": "nope", "status": "processing" }),
    );
    assert_eq!(e["code"], json!("not_found"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn announcements_draft_publish_and_delete() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let general = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "announcements.create",
        json!({ "title": "Sports Day", "message": "Bring your kit." }),
    );
    assert_eq!(general["announcement"]["type"], json!("general"));
    assert_eq!(general["announcement"]["targetAudience"], json!("all_students"));
    assert_eq!(general["announcement"]["status"], json!("published"));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "announcements.create",
        json!({ "title": "Class trip", "message": "Bus at 8", "targetAudience": "specific_class" }),
    );
    assert_eq!(e["details"]["field"], json!("classIds"));

    let draft = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "announcements.create",
        json!({
            "title": "Exam timetable",
            "message": "Draft timetable attached.",
            "type": "urgent",
            "targetAudience": "specific_class",
            "classIds": ["1", "2"],
            "status": "draft"
        }),
    );
    let draft_id = draft["announcement"]["id"].as_str().expect("id").to_string();

    let drafts = request_ok(&mut stdin, &mut reader, "4", "announcements.list", json!({ "status": "draft" }));
    assert_eq!(drafts["announcements"].as_array().map(|a| a.len()), Some(1));

    let all = request_ok(&mut stdin, &mut reader, "5", "announcements.list", json!({ "status": "all" }));
    let titles: Vec<&str> = all["announcements"]
        .as_array()
        .expect("list")
        .iter()
        .filter_map(|a| a["title"].as_str())
        .collect();
    assert_eq!(
        titles,
        vec!["Exam timetable", "Sports Day", "Semester Results Published", "Parent-Teacher Meeting"]
    );

    let published = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "announcements.publish",
        json!({ "announcementId": draft_id }),
    );
    assert_eq!(published["announcement"]["status"], json!("published"));
    let e = request_err(
        &mut stdin,
        &mut reader,
        "7",
        "announcements.publish",
        json!({ "announcementId": draft_id }),
    );
    assert_eq!(e["code"], json!("invalid_transition"));

    request_ok(&mut stdin, &mut reader, "8", "announcements.delete", json!({ "announcementId": draft_id }));
    let e = request_err(
        &mut stdin,
        &mut reader,
        "9",
        "announcements.delete",
        json!({ "announcementId": draft_id }),
    );
    assert_eq!(e["code"], json!("not_found"));

    let e = request_err(&mut stdin, &mut reader, "10", "announcements.list", json!({ "status": "archived" }));
    assert_eq!(e["details"]["field"], json!("status"));

    drop(stdin);
    let _ = child.wait();
}
