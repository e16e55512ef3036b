use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn pbaudit_cmd() -> Command {
    let mut cmd = Command::cargo_bin("pbaudit-cli").expect("binary should be built");
    // Keep runs deterministic regardless of the host environment.
    cmd.env_remove("OPENAI_API_KEY");
    cmd
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A project whose only source call hardcodes server and database.
fn hardcoded_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(&root.join("Demo.pbip"), "{}");
    write(
        &root.join("Demo.SemanticModel/definition/tables/Sales.tmdl"),
        concat!(
            "table Sales\n\n",
            "\tcolumn OrderId\n",
            "\tcolumn Amount\n\n",
            "\tpartition Sales = import\n",
            "\t\tsource =\n",
            "\t\t\tlet\n",
            "\t\t\t\tSource = Sql.Database(\"myserver.database.windows.net\", \"SalesDB\")\n",
            "\t\t\tin\n",
            "\t\t\t\tSource\n",
        ),
    );
    tmp
}

/// A fully parameterized project with range parameters and tidy naming.
fn clean_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(&root.join("Demo.pbip"), "{}");
    write(
        &root.join("Demo.SemanticModel/definition/tables/dim_date.tmdl"),
        concat!(
            "table dim_date\n\n",
            "\tcolumn DateId\n",
            "\tcolumn CalendarDate\n\n",
            "\tpartition dim_date = import\n",
            "\t\tsource =\n",
            "\t\t\tlet\n",
            "\t\t\t\tSource = Sql.Database(ServerHost, DatabaseName),\n",
            "\t\t\t\t#\"Filtered\" = Table.SelectRows(Source, each [CalendarDate] >= RangeStart)\n",
            "\t\t\tin\n",
            "\t\t\t\t#\"Filtered\"\n",
        ),
    );
    write(
        &root.join("Demo.SemanticModel/definition/expressions.tmdl"),
        concat!(
            "expression ServerHost = \"srv\" meta [IsParameterQuery = true]\n\n",
            "expression DatabaseName = \"db\" meta [IsParameterQuery = true]\n\n",
            "expression RangeStart = #datetime(2020, 1, 1, 0, 0, 0) meta [IsParameterQuery = true]\n",
        ),
    );
    tmp
}

/// Retained query whose source shape is unrecognized: not parameterized,
/// not literal.
fn unparameterized_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write(
        &tmp.path().join("Demo.SemanticModel/definition/tables/staging.tmdl"),
        concat!(
            "table staging\n\n",
            "\tcolumn Id\n\n",
            "\tpartition staging = import\n",
            "\t\tSource = let rows = Table.FromRows({}) in rows\n",
        ),
    );
    tmp
}

#[test]
fn hardcoded_project_exits_2() {
    let project = hardcoded_project();
    pbaudit_cmd().arg(project.path()).assert().code(2);
}

#[test]
fn clean_project_exits_0() {
    let project = clean_project();
    pbaudit_cmd().arg(project.path()).assert().code(0);
}

#[test]
fn unparameterized_project_exits_1() {
    let project = unparameterized_project();
    pbaudit_cmd().arg(project.path()).assert().code(1);
}

#[test]
fn json_output_is_valid_and_complete() {
    let project = hardcoded_project();
    let output = pbaudit_cmd()
        .arg(project.path())
        .output()
        .expect("command should run");

    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON");

    assert!(parsed.get("schema_version").is_some());
    assert!(parsed.get("tool").is_some());
    assert!(parsed.get("project").is_some());
    assert!(parsed.get("analysis").is_some());
    assert!(parsed.get("signals").is_some());
    assert!(parsed.get("findings").is_some());
    assert!(parsed.get("summary").is_some());
}

#[test]
fn hardcoded_findings_include_pq020_and_pq001() {
    let project = hardcoded_project();
    let output = pbaudit_cmd().arg(project.path()).output().unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

    let ids: Vec<&str> = parsed["findings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&"PQ020"));
    assert!(ids.contains(&"PQ001"));
    assert_eq!(parsed["summary"]["exitCode"], 2);
    assert_eq!(parsed["summary"]["highestSeverity"], "HIGH");
}

#[test]
fn clean_project_reports_incremental_ready() {
    let project = clean_project();
    let output = pbaudit_cmd().arg(project.path()).output().unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(parsed["signals"]["incremental"]["hasRangeParamsOrRefs"], true);
    let ids: Vec<&str> = parsed["findings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["id"].as_str().unwrap())
        .collect();
    assert!(!ids.contains(&"PQ010"));
    assert!(!ids.contains(&"PQ020"));
}

#[test]
fn text_output_lists_findings() {
    let project = hardcoded_project();
    pbaudit_cmd()
        .arg(project.path())
        .arg("--format")
        .arg("text")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Project: Demo"))
        .stdout(predicate::str::contains("PQ020"))
        .stdout(predicate::str::contains("Highest severity: HIGH"));
}

#[test]
fn out_flag_writes_artifacts() {
    let project = hardcoded_project();
    let out = TempDir::new().unwrap();
    let run_dir = out.path().join("run");

    pbaudit_cmd()
        .arg(project.path())
        .arg("--out")
        .arg(&run_dir)
        .assert()
        .code(2);

    for artifact in ["inventory.json", "signals.json", "findings.json", "report.txt"] {
        assert!(run_dir.join(artifact).exists(), "{artifact} missing");
    }
    let inventory: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(run_dir.join("inventory.json")).unwrap()).unwrap();
    assert_eq!(inventory["model"]["tablesCount"], 1);
}

#[test]
fn commit_flag_embeds_hash_in_report() {
    let project = clean_project();
    let output = pbaudit_cmd()
        .arg(project.path())
        .arg("--commit")
        .arg("abc123def456")
        .output()
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["tool"]["commit"], "abc123def456");
}

#[test]
fn ai_flag_without_credential_fails_after_core_artifacts() {
    let project = clean_project();
    let out = TempDir::new().unwrap();
    let run_dir = out.path().join("run");

    pbaudit_cmd()
        .arg(project.path())
        .arg("--ai")
        .arg("--out")
        .arg(&run_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("OPENAI_API_KEY"));

    // The credential failure aborts only the AI stage.
    assert!(run_dir.join("inventory.json").exists());
    assert!(run_dir.join("findings.json").exists());
    assert!(!run_dir.join("ai_summary.json").exists());
}

#[test]
fn deterministic_json_across_runs() {
    let project = hardcoded_project();

    let output_a = pbaudit_cmd().arg(project.path()).output().expect("first run");
    let output_b = pbaudit_cmd().arg(project.path()).output().expect("second run");

    let json_a: serde_json::Value = serde_json::from_slice(&output_a.stdout).unwrap();
    let json_b: serde_json::Value = serde_json::from_slice(&output_b.stdout).unwrap();

    assert_eq!(json_a["signals"], json_b["signals"]);
    assert_eq!(json_a["findings"], json_b["findings"]);
    assert_eq!(json_a["summary"], json_b["summary"]);
    assert_eq!(json_a["project"]["fingerprint"], json_b["project"]["fingerprint"]);
}

#[test]
fn manifest_path_is_accepted() {
    let project = clean_project();
    pbaudit_cmd()
        .arg(project.path().join("Demo.pbip"))
        .assert()
        .code(0);
}

#[test]
fn missing_project_arg_fails() {
    pbaudit_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn nonexistent_project_fails() {
    pbaudit_cmd()
        .arg("/tmp/does_not_exist_pbaudit_test")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn invalid_format_flag_fails() {
    let project = clean_project();
    pbaudit_cmd()
        .arg(project.path())
        .arg("--format")
        .arg("xml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn help_flag_prints_usage() {
    pbaudit_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Heuristic QA audit"));
}

#[test]
fn version_flag_prints_version() {
    pbaudit_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pbaudit"));
}

#[test]
fn default_format_is_json() {
    let project = clean_project();
    let output = pbaudit_cmd().arg(project.path()).output().unwrap();
    serde_json::from_slice::<serde_json::Value>(&output.stdout)
        .expect("default output should be valid JSON");
}
