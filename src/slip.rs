use anyhow::Context;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::grading::PassStatus;

const MANIFEST_ENTRY: &str = "manifest.json";
pub const BUNDLE_FORMAT: &str = "result-slips-v1";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlipSubject {
    pub name: String,
    pub score: f64,
    pub grade: String,
    pub remarks: String,
}

/// Everything a result slip shows. Also the payload of the student dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResultSlip {
    pub name: String,
    pub student_id: String,
    pub class: String,
    pub semester: String,
    pub subjects: Vec<SlipSubject>,
    pub total_score: f64,
    pub average: f64,
    pub position: usize,
    pub total_students: usize,
    pub status: PassStatus,
}

/// `{studentId}_{semester}_Result.html`, every whitespace run in the semester
/// collapsed to a single underscore.
pub fn file_name(student_id: &str, semester: &str) -> String {
    let mut sem = String::with_capacity(semester.len());
    let mut in_space = false;
    for ch in semester.chars() {
        if ch.is_whitespace() {
            if !in_space {
                sem.push('_');
            }
            in_space = true;
        } else {
            sem.push(ch);
            in_space = false;
        }
    }
    format!("{student_id}_{sem}_Result.html")
}

/// Semester labels contain `/` ("2023/2024"); keep the file in one directory.
pub fn disk_file_name(name: &str) -> String {
    name.replace(['/', '\\'], "-")
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

pub fn render(school_name: &str, slip: &ResultSlip) -> String {
    page(school_name, slip).into_string()
}

fn page(school_name: &str, slip: &ResultSlip) -> Markup {
    let status_class = match slip.status {
        PassStatus::Pass => "pass",
        PassStatus::Fail => "fail",
    };
    html! {
        (DOCTYPE)
        html {
            head {
                title { "Result Slip - " (slip.name) }
                style { (PreEscaped(CSS)) }
            }
            body {
                div.header {
                    div."school-name" { (school_name.to_uppercase()) }
                    h2 { "STUDENT RESULT SLIP" }
                    p { (slip.semester) }
                }
                div."student-info" {
                    p { strong { "Name:" } " " (slip.name) }
                    p { strong { "Student ID:" } " " (slip.student_id) }
                    p { strong { "Class:" } " " (slip.class) }
                }
                table."results-table" {
                    thead {
                        tr {
                            th { "Subject" }
                            th { "Score" }
                            th { "Grade" }
                            th { "Remarks" }
                        }
                    }
                    tbody {
                        @for subject in &slip.subjects {
                            tr {
                                td { (subject.name) }
                                td { (format_number(subject.score)) }
                                td { (subject.grade) }
                                td { (subject.remarks) }
                            }
                        }
                    }
                }
                div.summary {
                    p { strong { "Total Score:" } " " (format_number(slip.total_score)) }
                    p { strong { "Average:" } " " (format!("{:.1}", slip.average)) "%" }
                    p {
                        strong { "Position:" } " "
                        (slip.position) " out of " (slip.total_students)
                    }
                    p {
                        strong { "Status:" } " "
                        span class=(status_class) { (slip.status.as_str()) }
                    }
                }
            }
        }
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

pub fn write_slip(out_dir: &Path, slip: &ResultSlip, html: &str) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create directory {}", out_dir.to_string_lossy()))?;
    let path = out_dir.join(disk_file_name(&file_name(&slip.student_id, &slip.semester)));
    std::fs::write(&path, html)
        .with_context(|| format!("failed to write slip {}", path.to_string_lossy()))?;
    Ok(path)
}

#[derive(Debug, Clone)]
pub struct BundleSummary {
    pub bundle_format: String,
    pub entry_count: usize,
}

/// Writes one HTML slip per student plus a manifest carrying per-entry digests.
pub fn write_bundle(
    out_path: &Path,
    class_label: &str,
    semester: &str,
    school_name: &str,
    slips: &[ResultSlip],
) -> anyhow::Result<BundleSummary> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries = Vec::with_capacity(slips.len());
    for slip in slips {
        let html = render(school_name, slip);
        let entry_name = format!(
            "slips/{}",
            disk_file_name(&file_name(&slip.student_id, &slip.semester))
        );
        zip.start_file(entry_name.as_str(), opts)
            .with_context(|| format!("failed to start entry {entry_name}"))?;
        zip.write_all(html.as_bytes())
            .with_context(|| format!("failed to write entry {entry_name}"))?;
        entries.push(json!({
            "studentId": slip.student_id,
            "entry": entry_name,
            "sha256": sha256_hex(html.as_bytes()),
        }));
    }

    let manifest = json!({
        "format": BUNDLE_FORMAT,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "class": class_label,
        "semester": semester,
        "exportedAt": chrono::Utc::now().to_rfc3339(),
        "entries": entries,
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;
    zip.finish().context("failed to finalize zip bundle")?;

    Ok(BundleSummary {
        bundle_format: BUNDLE_FORMAT.to_string(),
        entry_count: slips.len() + 1,
    })
}

const CSS: &str = r#"
body { font-family: Arial, sans-serif; margin: 20px; }
.header { text-align: center; margin-bottom: 30px; }
.school-name { font-size: 24px; font-weight: bold; color: #1e40af; }
.student-info { margin: 20px 0; }
.results-table { width: 100%; border-collapse: collapse; margin: 20px 0; }
.results-table th, .results-table td { border: 1px solid #ddd; padding: 8px; text-align: left; }
.results-table th { background-color: #f2f2f2; }
.summary { margin: 20px 0; padding: 15px; background-color: #f9f9f9; }
.pass { color: green; font-weight: bold; }
.fail { color: red; font-weight: bold; }
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResultSlip {
        let subjects = [
            ("Mathematics", 92.0, "A", "Excellent performance"),
            ("Physics", 88.0, "B", "Good understanding"),
            ("Chemistry", 85.0, "B", "Consistent effort"),
            ("Biology", 90.0, "A", "Outstanding work"),
            ("English", 87.0, "B", "Well written"),
            ("History", 83.0, "B", "Good analysis"),
            ("Geography", 89.0, "B", "Strong grasp"),
            ("Computer Science", 95.0, "A", "Exceptional skills"),
        ];
        ResultSlip {
            name: "Sarah Johnson".into(),
            student_id: "STU001".into(),
            class: "12A".into(),
            semester: "2023/2024 - Semester 2".into(),
            subjects: subjects
                .iter()
                .map(|(n, s, g, r)| SlipSubject {
                    name: (*n).into(),
                    score: *s,
                    grade: (*g).into(),
                    remarks: (*r).into(),
                })
                .collect(),
            total_score: 709.0,
            average: 88.6,
            position: 3,
            total_students: 45,
            status: PassStatus::Pass,
        }
    }

    #[test]
    fn filename_replaces_spaces() {
        assert_eq!(
            file_name("STU001", "2023/2024 - Semester 2"),
            "STU001_2023/2024_-_Semester_2_Result.html"
        );
        assert_eq!(file_name("S", "Term  1"), "S_Term_1_Result.html");
        assert_eq!(
            disk_file_name("STU001_2023/2024_-_Semester_2_Result.html"),
            "STU001_2023-2024_-_Semester_2_Result.html"
        );
    }

    #[test]
    fn render_contains_every_subject_and_summary() {
        let slip = sample();
        let html = render("Meghis Secondary School", &slip);
        assert!(html.contains("MEGHIS SECONDARY SCHOOL"));
        assert!(html.contains("STUDENT RESULT SLIP"));
        for s in &slip.subjects {
            assert!(html.contains(&format!("<td>{}</td>", s.name)), "{}", s.name);
        }
        assert!(html.contains("<td>92</td>"));
        assert!(html.contains("709"));
        assert!(html.contains("88.6%"));
        assert!(html.contains("3 out of 45"));
        assert!(html.contains(r#"<span class="pass">PASS</span>"#));
    }

    #[test]
    fn render_escapes_markup() {
        let mut slip = sample();
        slip.name = "<script>x</script>".into();
        let html = render("School", &slip);
        assert!(!html.contains("<script>x</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn sha256_is_lower_hex() {
        let d = sha256_hex(b"abc");
        assert_eq!(
            d,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
