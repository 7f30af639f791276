use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn tripwire() -> Command {
    Command::new(env!("CARGO_BIN_EXE_tripwire"))
}

#[test]
fn test_cli_help_command() {
    let output = tripwire()
        .arg("--help")
        .output()
        .expect("Failed to execute tripwire --help");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("validate"));
    assert!(stdout.contains("list"));
    assert!(stdout.contains("eval"));
}

#[test]
fn test_cli_eval_command() {
    let output = tripwire()
        .args([
            "eval",
            "amount / (divider * 2.0)",
            "--var",
            "amount=80",
            "--var",
            "divider=100.0",
        ])
        .output()
        .expect("Failed to execute tripwire eval");

    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap().trim(), "0.4");
}

#[test]
fn test_cli_validate_and_list() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("breakpoints.yml");
    fs::write(
        &path,
        r#"
breakpoints:
  reactor_fuel:
    return: 0.5
    post_call: log(amount)
  idle:
    enabled: false
"#,
    )
    .unwrap();

    let output = tripwire()
        .args(["validate", "--config"])
        .arg(&path)
        .output()
        .expect("Failed to execute tripwire validate");
    assert!(output.status.success());

    let output = tripwire()
        .args(["list", "--json", "--config"])
        .arg(&path)
        .output()
        .expect("Failed to execute tripwire list");
    assert!(output.status.success());

    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed[0]["tag"], "idle");
    assert_eq!(listed[0]["armed"], false);
    assert_eq!(listed[1]["tag"], "reactor_fuel");
    assert_eq!(listed[1]["facets"], serde_json::json!(["post_call", "return"]));
}

#[test]
fn test_cli_validate_reports_syntax_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("breakpoints.yml");
    fs::write(&path, "breakpoints:\n  broken:\n    pre_call: 'log(('\n").unwrap();

    let output = tripwire()
        .args(["validate", "--config"])
        .arg(&path)
        .output()
        .expect("Failed to execute tripwire validate");

    assert!(!output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("broken [pre_call]"));
}

#[test]
fn test_cli_missing_config_fails() {
    let dir = tempdir().unwrap();
    let output = tripwire()
        .args(["list", "--config"])
        .arg(dir.path().join("absent.yml"))
        .output()
        .expect("Failed to execute tripwire list");

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Missing configuration"));
}
