mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar};

#[test]
fn compute_uses_default_system_and_floors_gap_scores() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let a = request_ok(&mut stdin, &mut reader, "1", "grading.compute", json!({ "score": 80 }));
    assert_eq!(a, json!({ "grade": "A", "points": 4.0, "remark": "Excellent" }));

    let b = request_ok(&mut stdin, &mut reader, "2", "grading.compute", json!({ "score": 79.5 }));
    assert_eq!(b["grade"], json!("B"));

    let ap = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "grading.compute",
        json!({ "score": 96, "systemId": "2" }),
    );
    assert_eq!(ap["grade"], json!("A+"));

    let e = request_err(&mut stdin, &mut reader, "4", "grading.compute", json!({ "score": 101 }));
    assert_eq!(e["code"], json!("bad_params"));
    assert_eq!(e["details"]["field"], json!("score"));

    let e = request_err(&mut stdin, &mut reader, "5", "grading.compute", json!({ "score": "ninety" }));
    assert_eq!(e["code"], json!("bad_params"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn systems_and_levels_are_validated() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grading.create",
        json!({ "name": "Pass/Fail", "gradeScale": [
            { "grade": "P", "minScore": 50, "maxScore": 100, "points": 1, "remark": "Pass" },
            { "grade": "F", "minScore": 0, "maxScore": 49, "points": 0, "remark": "Fail" }
        ] }),
    );
    let system_id = created["system"]["id"].as_str().expect("id").to_string();
    assert_eq!(created["system"]["isDefault"], json!(false));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "grading.addLevel",
        json!({ "systemId": system_id, "level": { "grade": "M", "minScore": 45, "maxScore": 60, "points": 0.5 } }),
    );
    assert_eq!(e["code"], json!("bad_params"));
    assert_eq!(e["details"]["field"], json!("gradeScale"));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "grading.update",
        json!({ "systemId": system_id, "patch": { "name": "  " } }),
    );
    assert_eq!(e["details"]["field"], json!("name"));

    let e = request_err(&mut stdin, &mut reader, "4", "grading.delete", json!({ "systemId": "1" }));
    assert_eq!(e["code"], json!("conflict"));

    let def = request_ok(&mut stdin, &mut reader, "5", "grading.setDefault", json!({ "systemId": system_id }));
    assert_eq!(def["system"]["isDefault"], json!(true));
    let list = request_ok(&mut stdin, &mut reader, "6", "grading.list", json!({}));
    assert_eq!(list["defaultId"], json!(system_id));
    let defaults = list["systems"]
        .as_array()
        .expect("systems")
        .iter()
        .filter(|s| s["isDefault"] == json!(true))
        .count();
    assert_eq!(defaults, 1);

    let p = request_ok(&mut stdin, &mut reader, "7", "grading.compute", json!({ "score": 64 }));
    assert_eq!(p["grade"], json!("P"));

    request_ok(&mut stdin, &mut reader, "8", "grading.delete", json!({ "systemId": "1" }));
    let e = request_err(&mut stdin, &mut reader, "9", "grading.get", json!({ "systemId": "1" }));
    assert_eq!(e["code"], json!("not_found"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn removed_level_leaves_scores_uncovered() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let sys = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grading.removeLevel",
        json!({ "systemId": "1", "levelId": "5" }),
    );
    assert_eq!(sys["system"]["gradeScale"].as_array().map(|a| a.len()), Some(4));

    let e = request_err(&mut stdin, &mut reader, "2", "grading.compute", json!({ "score": 30 }));
    assert_eq!(e["code"], json!("grade_out_of_range"));
    assert_eq!(e["details"]["score"], json!(30.0));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "results.enter",
        json!({ "studentId": "STU003", "subjectId": "5", "score": 30 }),
    );
    assert_eq!(e["code"], json!("grade_out_of_range"));

    let level = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "grading.updateLevel",
        json!({ "systemId": "1", "levelId": "4", "patch": { "minScore": 0, "remark": "Pass" } }),
    );
    let d = level["system"]["gradeScale"]
        .as_array()
        .expect("scale")
        .iter()
        .find(|l| l["id"] == json!("4"))
        .cloned()
        .expect("level D");
    assert_eq!(d["minScore"], json!(0.0));

    let c = request_ok(&mut stdin, &mut reader, "5", "grading.compute", json!({ "score": 30 }));
    assert_eq!(c, json!({ "grade": "D", "points": 1.0, "remark": "Pass" }));

    drop(stdin);
    let _ = child.wait();
}
