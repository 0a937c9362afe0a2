use std::fs::{create_dir_all, write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

/// Run the built binary from `cwd` with a scrubbed environment.
fn exctree(cwd: &Path, args: &[&str], envs: &[(&str, &str)]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_exctree"));
    command
        .current_dir(cwd)
        .env_remove("PYTHONPATH")
        .env_remove("RUST_LOG")
        .env_remove("EXCTREE_CONFIG")
        .args(args);
    for (key, value) in envs {
        command.env(key, value);
    }
    command.output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).unwrap()
}

#[test]
fn test_renders_from_python_path() {
    let cwd = tempfile::tempdir().unwrap();
    let fixtures = fixtures();
    let output = exctree(cwd.path(), &["-c", "-p", fixtures.to_str().unwrap(), "abc_example"], &[]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "Exception\n├── abc_example.A\n│   ├── abc_example.B\n│   └── abc_example.C *\n└── ValueError\n"
    );
}

#[test]
fn test_pythonpath_and_current_directory_are_searched() {
    let fixtures = fixtures();
    let output = exctree(&fixtures, &["abc_example", "--compact"], &[]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));

    let cwd = tempfile::tempdir().unwrap();
    let output = exctree(
        cwd.path(),
        &["abc_example", "--all-paths", "--compact"],
        &[("PYTHONPATH", fixtures.to_str().unwrap())],
    );
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert!(stdout(&output).ends_with("└── ValueError\n    └── abc_example.C *\n"));
}

#[test]
fn test_no_exceptions_exits_one() {
    let output = exctree(&fixtures(), &["plain_module"], &[]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "");
    assert_eq!(stderr(&output), "No Exception subclasses found in 'plain_module'.\n");
}

#[test]
fn test_import_failures_exit_ten() {
    let cwd = tempfile::tempdir().unwrap();
    let output = exctree(cwd.path(), &["no_such_module"], &[]);
    assert_eq!(output.status.code(), Some(10));
    assert_eq!(
        stderr(&output),
        "Error: could not import 'no_such_module': No module named 'no_such_module'\n"
    );

    write(cwd.path().join("broken.py"), "class Broken(Exception:\n    pass\n").unwrap();
    let output = exctree(cwd.path(), &["broken"], &[]);
    assert_eq!(output.status.code(), Some(10));
    assert!(
        stderr(&output).starts_with("Error: could not import 'broken': "),
        "{}",
        stderr(&output)
    );
}

#[test]
fn test_broken_submodules_are_skipped() {
    let cwd = tempfile::tempdir().unwrap();
    create_dir_all(cwd.path().join("pkg")).unwrap();
    write(cwd.path().join("pkg/__init__.py"), "class Base(Exception):\n    pass\n").unwrap();
    write(cwd.path().join("pkg/bad.py"), "def (\n").unwrap();
    let output = exctree(cwd.path(), &["pkg", "-c"], &[("RUST_LOG", "warn")]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "Exception\n└── pkg.Base\n");
    assert!(stderr(&output).contains("skipping submodule"), "{}", stderr(&output));
}

#[test]
fn test_manifest_and_json_output() {
    let cwd = tempfile::tempdir().unwrap();
    let manifest = cwd.path().join("classes.json");
    write(
        &manifest,
        r#"{"classes": [
            {"module": "svc.errors", "name": "ServiceError", "bases": ["Exception"]},
            {"module": "svc.errors", "name": "Unavailable", "bases": ["svc.errors.ServiceError", "ConnectionError"]}
        ]}"#,
    )
    .unwrap();
    let output = exctree(
        cwd.path(),
        &["svc", "--manifest", manifest.to_str().unwrap(), "-o", "json"],
        &[],
    );
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["name"], "Exception");
    assert_eq!(value["children"][0]["name"], "OSError");
    assert_eq!(value["children"][1]["name"], "svc.errors.ServiceError");
    assert_eq!(value["children"][1]["children"][0]["multi_parent"], true);

    let output = exctree(cwd.path(), &["other", "--manifest", manifest.to_str().unwrap()], &[]);
    assert_eq!(output.status.code(), Some(10));
}

#[test]
fn test_config_file_supplies_defaults() {
    let cwd = tempfile::tempdir().unwrap();
    let config = cwd.path().join("exctree.json");
    write(
        &config,
        serde_json::json!({
            "python_path": [fixtures()],
            "compact": true,
        })
        .to_string(),
    )
    .unwrap();

    let output = exctree(cwd.path(), &["abc_example"], &[("EXCTREE_CONFIG", config.to_str().unwrap())]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert!(!stdout(&output).contains("|\n"));

    write(&config, "not json").unwrap();
    let output = exctree(cwd.path(), &["abc_example", "--config", config.to_str().unwrap()], &[]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).starts_with("Error: bad config: "));
}

#[test]
fn test_usage_errors_exit_two() {
    let cwd = tempfile::tempdir().unwrap();
    let output = exctree(cwd.path(), &[], &[]);
    assert_eq!(output.status.code(), Some(2));

    let output = exctree(cwd.path(), &["--help"], &[]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("Use -a or --all-paths to see them."));
}
