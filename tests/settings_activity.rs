mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn settings_sections_update_and_validate() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let all = request_ok(&mut stdin, &mut reader, "1", "settings.get", json!({}));
    for key in ["school", "system", "grading", "preferences", "profile"] {
        assert!(all["settings"][key].is_object(), "missing section {}", key);
    }

    let e = request_err(&mut stdin, &mut reader, "2", "settings.get", json!({ "section": "billing" }));
    assert_eq!(e["details"]["field"], json!("section"));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "settings.update",
        json!({ "section": "grading", "patch": { "passMark": 150 } }),
    );
    assert_eq!(e["code"], json!("bad_params"));
    assert_eq!(e["details"]["field"], json!("grading"));

    // One bad key rejects the whole patch.
    let e = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "settings.update",
        json!({ "section": "preferences", "patch": { "darkMode": true, "fontSize": "huge" } }),
    );
    assert_eq!(e["code"], json!("bad_params"));
    let prefs = request_ok(&mut stdin, &mut reader, "5", "settings.get", json!({ "section": "preferences" }));
    assert_eq!(prefs["settings"]["darkMode"], json!(false));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "settings.update",
        json!({ "section": "school", "patch": { "termStartDate": "2024-07-01" } }),
    );
    assert_eq!(e["code"], json!("bad_params"));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "7",
        "settings.update",
        json!({ "section": "system", "patch": [] }),
    );
    assert_eq!(e["details"]["field"], json!("patch"));

    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "settings.update",
        json!({ "section": "preferences", "patch": { "darkMode": true, "language": "french" } }),
    );
    assert_eq!(updated["section"], json!("preferences"));
    assert_eq!(updated["settings"]["darkMode"], json!(true));
    assert_eq!(updated["settings"]["fontSize"], json!("medium"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn grading_thresholds_feed_pass_status() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let john = request_ok(&mut stdin, &mut reader, "1", "results.summary", json!({ "studentId": "STU004" }));
    assert_eq!(john["status"], json!("PASS"));

    request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "settings.update",
        json!({ "section": "grading", "patch": { "passMark": 65 } }),
    );
    let john = request_ok(&mut stdin, &mut reader, "3", "results.summary", json!({ "studentId": "STU004" }));
    assert_eq!(john["status"], json!("FAIL"));

    let overview = request_ok(&mut stdin, &mut reader, "4", "analytics.overview", json!({}));
    // averages 88.75, 64.75, 81.25, 79.5, 48.5, 70.5
    assert_eq!(overview["passRate"], json!(66.7));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn current_term_drives_default_semester() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "settings.update",
        json!({ "section": "school", "patch": { "currentTerm": "2024/2025 - Semester 1" } }),
    );
    let health = request_ok(&mut stdin, &mut reader, "2", "health", json!({}));
    assert_eq!(health["currentTerm"], json!("2024/2025 - Semester 1"));

    let summary = request_ok(&mut stdin, &mut reader, "3", "results.summary", json!({ "studentId": "STU001" }));
    assert_eq!(summary["semester"], json!("2024/2025 - Semester 1"));
    assert_eq!(summary["subjects"], json!([]));

    let entered = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "results.enter",
        json!({ "studentId": "STU001", "subjectId": "1", "score": 90 }),
    );
    assert_eq!(entered["result"]["semester"], json!("2024/2025 - Semester 1"));

    let semesters = request_ok(&mut stdin, &mut reader, "5", "semesters.list", json!({}));
    assert_eq!(semesters["current"], json!("2024/2025 - Semester 1"));
    assert_eq!(semesters["semesters"].as_array().map(|a| a.len()), Some(3));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn activity_log_is_recent_first_and_exports_csv() {
    let workspace = temp_dir("resultsd-activity");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let recent = request_ok(&mut stdin, &mut reader, "1", "activity.recent", json!({}));
    let rows = recent["activity"].as_array().expect("activity");
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0]["action"], json!("Result Upload"));
    assert_eq!(rows[0]["kind"], json!("success"));

    request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "departments.create",
        json!({ "name": "Agriculture" }),
    );
    let recent = request_ok(&mut stdin, &mut reader, "3", "activity.recent", json!({ "limit": 2 }));
    assert_eq!(recent["activity"].as_array().map(|a| a.len()), Some(2));
    assert_eq!(recent["activity"][0]["action"], json!("Department Created"));
    assert_eq!(recent["activity"][0]["user"], json!("System"));

    let e = request_err(&mut stdin, &mut reader, "4", "activity.recent", json!({ "limit": -1 }));
    assert_eq!(e["details"]["field"], json!("limit"));

    let out_path = workspace.join("logs").join("activity.csv");
    let exported = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "activity.exportCsv",
        json!({ "outPath": out_path.to_string_lossy() }),
    );
    assert_eq!(exported["rows"], json!(6));

    let csv = std::fs::read_to_string(&out_path).expect("read csv");
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "timestamp,action,user,details,type");
    assert_eq!(lines.len(), 7);
    assert!(lines[2].starts_with("2024-01-15 14:15:00,Failed Login,Unknown,"));
    assert!(lines[6].ends_with(",success"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
