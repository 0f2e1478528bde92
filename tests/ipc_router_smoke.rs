mod test_support;

use serde_json::json;
use test_support::{request, request_err, spawn_sidecar, temp_dir};

#[test]
fn ipc_router_smoke_covers_every_method_family() {
    let workspace = temp_dir("resultsd-router-smoke");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let calls = vec![
        ("health", json!({})),
        ("session.get", json!({})),
        ("session.login", json!({ "userId": "admin", "password": "pw", "isAdmin": true })),
        ("session.selectTab", json!({ "tab": "results" })),
        ("departments.list", json!({})),
        ("classes.list", json!({})),
        ("subjects.list", json!({ "classId": "1" })),
        ("students.list", json!({ "search": "sarah" })),
        ("students.get", json!({ "studentId": "STU001" })),
        ("grading.list", json!({})),
        ("grading.compute", json!({ "score": 75 })),
        ("results.list", json!({ "classId": "1" })),
        ("results.roster", json!({ "classId": "1", "subjectId": "1" })),
        ("results.summary", json!({ "studentId": "STU001" })),
        ("results.slip", json!({ "studentId": "STU001" })),
        ("bulkUploads.list", json!({})),
        ("roles.list", json!({})),
        ("roles.templates", json!({})),
        ("announcements.list", json!({})),
        ("publishing.classes", json!({})),
        ("publishing.list", json!({})),
        ("dashboard.admin", json!({})),
        ("dashboard.student", json!({ "studentId": "STU001" })),
        ("analytics.overview", json!({})),
        ("semesters.list", json!({})),
        ("activity.recent", json!({ "limit": 3 })),
        (
            "activity.exportCsv",
            json!({ "outPath": workspace.join("activity.csv").to_string_lossy() }),
        ),
        ("settings.get", json!({})),
        ("settings.get", json!({ "section": "grading" })),
    ];

    for (i, (method, params)) in calls.into_iter().enumerate() {
        let resp = request(&mut stdin, &mut reader, &format!("s{i}"), method, params);
        assert_eq!(
            resp.get("ok").and_then(|v| v.as_bool()),
            Some(true),
            "{} failed: {}",
            method,
            resp
        );
    }

    let e = request_err(&mut stdin, &mut reader, "unknown", "markbook.open", json!({}));
    assert_eq!(e["code"], json!("not_implemented"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn malformed_lines_get_bad_json_and_the_loop_continues() {
    use std::io::{BufRead, Write};

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    writeln!(stdin, "{{not json").expect("write");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read");
    let v: serde_json::Value = serde_json::from_str(line.trim()).expect("json");
    assert_eq!(v["ok"], json!(false));
    assert_eq!(v["error"]["code"], json!("bad_json"));

    let health = request(&mut stdin, &mut reader, "after", "health", json!({}));
    assert_eq!(health["result"]["counts"]["students"], json!(6));
    assert_eq!(health["result"]["currentTerm"], json!("2023/2024 - Semester 2"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn empty_seed_starts_with_builtin_grading_only() {
    let (mut child, mut stdin, mut reader) = test_support::spawn_empty_sidecar();
    let health = test_support::request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["counts"]["students"], json!(0));
    assert_eq!(health["counts"]["classes"], json!(0));

    let grading = test_support::request_ok(&mut stdin, &mut reader, "2", "grading.list", json!({}));
    assert_eq!(grading["systems"].as_array().map(|a| a.len()), Some(2));
    assert_eq!(grading["defaultId"], json!("1"));

    drop(stdin);
    let _ = child.wait();
}
