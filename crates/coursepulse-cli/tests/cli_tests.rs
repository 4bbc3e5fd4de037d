//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A command isolated from any config or data outside `dir`.
fn coursepulse(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("coursepulse").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("COURSEPULSE_DATA_DIR")
        .env_remove("RUST_LOG")
        .arg("--data-dir")
        .arg(dir.join("data"));
    cmd
}

const FORM_TOML: &str = r#"
[form]
course = "CS 220"
instructor = "Dr. Rao"
assigned_faculty = ["faculty1@college.edu"]

[[questions]]
text = "How clear were the lectures?"
type = "rating"

[[questions]]
text = "How was the pace?"
type = "rating"

[[questions]]
text = "Issues"
type = "multi_choice"
options = ["Noise", "Slides"]
"#;

/// Create and publish the sample form, returning its id.
fn create_form(dir: &Path) -> u64 {
    let path = dir.join("form.toml");
    std::fs::write(&path, FORM_TOML).unwrap();
    coursepulse(dir)
        .args(["form", "create", "--publish", "--file"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created form"));

    let output = coursepulse(dir)
        .args(["form", "list", "--json"])
        .output()
        .unwrap();
    let forms: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    forms[0]["id"].as_u64().unwrap()
}

fn submit(dir: &Path, form: u64, email: &str, answers: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = coursepulse(dir);
    cmd.args(["submit", "--form", &form.to_string(), "--email", email]);
    for answer in answers {
        cmd.args(["--answer", answer]);
    }
    cmd.assert()
}

#[test]
fn init_creates_config_and_seeds_accounts() {
    let dir = TempDir::new().unwrap();

    coursepulse(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created coursepulse.toml"))
        .stdout(predicate::str::contains("Demo accounts: 4 added"));

    assert!(dir.path().join("coursepulse.toml").exists());
    for file in ["users.json", "forms.json", "responses.json", "analyticsByForm.json"] {
        assert!(dir.path().join("data").join(file).exists(), "{file} missing");
    }
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();
    coursepulse(dir.path()).arg("init").assert().success();

    coursepulse(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"))
        .stdout(predicate::str::contains("Demo accounts").not())
        .stdout(predicate::str::contains("Analytics rebuilt").not());
}

#[test]
fn seeded_admin_can_log_in() {
    let dir = TempDir::new().unwrap();
    coursepulse(dir.path())
        .args(["user", "login", "--email", "admin@college.edu", "--password", "Admin@123"])
        .assert()
        .success()
        .stdout(predicate::str::contains("System Admin (admin)"));

    coursepulse(dir.path())
        .args(["user", "login", "--email", "admin@college.edu", "--password", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid credentials"));
}

#[test]
fn register_reports_validation_messages() {
    let dir = TempDir::new().unwrap();
    let register = |email: &str, password: &str| {
        let mut cmd = coursepulse(dir.path());
        cmd.args([
            "user",
            "register",
            "--name",
            "Asha",
            "--email",
            email,
            "--register-no",
            "2100031001",
            "--password",
            password,
            "--confirm-password",
            password,
        ]);
        cmd.assert()
    };

    register("asha@example.org", "Strong#Pass1")
        .failure()
        .stderr(predicate::str::contains("Email must be from a valid domain"));
    register("asha@gmail.com", "weak")
        .failure()
        .stderr(predicate::str::contains("Password is missing: at least 8 characters"));
    register("asha@gmail.com", "Strong#Pass1")
        .success()
        .stdout(predicate::str::contains("Registered asha@gmail.com as student"));
    register("asha@gmail.com", "Strong#Pass1")
        .failure()
        .stderr(predicate::str::contains("User already exists"));
}

#[test]
fn faculty_add_list_remove() {
    let dir = TempDir::new().unwrap();
    coursepulse(dir.path())
        .args([
            "faculty",
            "add",
            "--name",
            "Dr. Rao",
            "--email",
            "rao@college.edu",
            "--password",
            "Faculty@123",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added faculty rao@college.edu (FAC"));

    coursepulse(dir.path())
        .args(["faculty", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rao@college.edu"))
        .stdout(predicate::str::contains("faculty2@college.edu"));

    coursepulse(dir.path())
        .args(["faculty", "remove", "--email", "rao@college.edu"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed faculty rao@college.edu"));

    coursepulse(dir.path())
        .args(["faculty", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rao@college.edu").not());
}

#[test]
fn submit_twice_is_rejected() {
    let dir = TempDir::new().unwrap();
    let form = create_form(dir.path());

    submit(dir.path(), form, "student1@college.edu", &["1=5", "2=4", "3=Noise|Slides"])
        .success()
        .stdout(predicate::str::contains("Feedback for CS 220 - Dr. Rao recorded"));
    submit(dir.path(), form, "student1@college.edu", &["1=3"])
        .failure()
        .stderr(predicate::str::contains("already submitted"));

    coursepulse(dir.path())
        .args(["responses", "check", "--form", &form.to_string(), "--email", "student1@college.edu"])
        .assert()
        .success()
        .stdout(predicate::str::contains("has submitted"));
}

#[test]
fn submit_rejects_out_of_range_rating() {
    let dir = TempDir::new().unwrap();
    let form = create_form(dir.path());
    submit(dir.path(), form, "a@gmail.com", &["1=9"])
        .failure()
        .stderr(predicate::str::contains("Question 1 rating must be between 1 and 5, got 9."));
}

#[test]
fn analytics_follow_submissions() {
    let dir = TempDir::new().unwrap();
    let form = create_form(dir.path());
    submit(dir.path(), form, "a@gmail.com", &["1=5", "2=4", "3=Noise"]).success();
    submit(dir.path(), form, "b@gmail.com", &["1=4", "2=2", "3=Noise|Slides"]).success();

    let output = coursepulse(dir.path())
        .args(["analytics", "show", "--json", "--form", &form.to_string()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let analytics: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(analytics["totalSubmissions"], 2);
    assert_eq!(analytics["averagePerQuestion"][0]["average"], 4.5);
    assert_eq!(analytics["averagePerQuestion"][1]["average"], 3.0);
    assert_eq!(analytics["overallRating"], 3.75);
    assert_eq!(analytics["choiceCounts"][0]["option"], "Noise");

    coursepulse(dir.path())
        .args(["analytics", "student"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total responses: 2"))
        .stdout(predicate::str::contains("Average rating: 3.8"))
        .stdout(predicate::str::contains("Noise (2)"));

    coursepulse(dir.path())
        .args(["analytics", "faculty", "--email", "faculty1@college.edu"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Assigned forms: 1"))
        .stdout(predicate::str::contains("Average rating: 3.75"));

    coursepulse(dir.path())
        .args(["analytics", "progress", "--email", "a@gmail.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Submitted: 1"))
        .stdout(predicate::str::contains("Pending: 0"));
}

#[test]
fn read_only_commands_keep_analytics_cache() {
    let dir = TempDir::new().unwrap();
    let form = create_form(dir.path());
    submit(dir.path(), form, "a@gmail.com", &["1=5"]).success();
    let cache = dir.path().join("data").join("analyticsByForm.json");
    let before = std::fs::read_to_string(&cache).unwrap();

    std::thread::sleep(std::time::Duration::from_millis(20));
    coursepulse(dir.path()).args(["form", "list"]).assert().success();
    coursepulse(dir.path())
        .args(["analytics", "show", "--form", &form.to_string()])
        .assert()
        .success();

    assert_eq!(std::fs::read_to_string(&cache).unwrap(), before);
}

#[test]
fn delete_removes_responses() {
    let dir = TempDir::new().unwrap();
    let form = create_form(dir.path());
    submit(dir.path(), form, "a@gmail.com", &["1=5"]).success();

    coursepulse(dir.path())
        .args(["form", "delete", &form.to_string()])
        .assert()
        .success()
        .stdout(predicate::str::contains("and 1 response(s)"));

    coursepulse(dir.path())
        .args(["responses", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No responses found."));
    coursepulse(dir.path())
        .args(["form", "delete", &form.to_string()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn unpublished_form_rejects_submissions() {
    let dir = TempDir::new().unwrap();
    let form = create_form(dir.path());
    coursepulse(dir.path())
        .args(["form", "publish", &form.to_string(), "--unpublish"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is now draft"));

    submit(dir.path(), form, "a@gmail.com", &["1=5"])
        .failure()
        .stderr(predicate::str::contains("is not published"));
}

#[test]
fn create_from_template() {
    let dir = TempDir::new().unwrap();
    coursepulse(dir.path())
        .args(["form", "templates"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Quick Pulse"));

    coursepulse(dir.path())
        .args(["form", "create", "--template", "quick pulse", "--course", "CS 101"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created form"));

    coursepulse(dir.path())
        .args(["form", "create", "--template", "exit survey", "--course", "CS 101"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown template"));
}

#[test]
fn validate_form_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("form.toml");
    std::fs::write(&path, FORM_TOML).unwrap();
    coursepulse(dir.path())
        .args(["form", "validate", "--file"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Form: CS 220 (3 questions)"))
        .stdout(predicate::str::contains("Form definition valid."));
}

#[test]
fn legacy_data_dir_is_migrated() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(
        data.join("forms.json"),
        r#"[{"id": 7, "course": "CS 220", "instructor": "Dr. Rao", "published": true}]"#,
    )
    .unwrap();
    std::fs::write(
        data.join("responses.json"),
        r#"[{"id": 1, "formId": 7, "submittedBy": "a@gmail.com", "answers": {"rating": 4}}]"#,
    )
    .unwrap();

    coursepulse(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Migrated 1 legacy form(s) and 1 legacy response(s)",
        ));

    coursepulse(dir.path())
        .args(["responses", "check", "--form", "7", "--email", "a@gmail.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("has submitted"));
}

#[test]
fn help_output() {
    let dir = TempDir::new().unwrap();
    coursepulse(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Course feedback forms and analytics"));
}
