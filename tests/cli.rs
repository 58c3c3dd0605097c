use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn run_blog(home: &Path, args: &[&str], env: &[(&str, &str)]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_blog"));
    command
        .args(args)
        .current_dir(home)
        .env("HOME", home)
        .env("NO_COLOR", "1");
    for (name, _) in std::env::vars() {
        if name.starts_with("BLOG_") {
            command.env_remove(name);
        }
    }
    for (name, value) in env {
        command.env(name, value);
    }

    command.output().unwrap()
}

#[test]
fn runs_without_any_configuration() {
    let home = tempfile::tempdir().unwrap();
    let output = run_blog(home.path(), &[], &[]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "{output:?}");
    assert!(stdout.contains("failed to read configuration file"), "{stdout}");
    assert!(stdout.contains("\tinfo\t"), "{stdout}");
    assert!(stdout.contains("resolved settings"), "{stdout}");
}

#[test]
fn finds_the_file_in_the_working_directory() {
    let home = tempfile::tempdir().unwrap();
    fs::write(
        home.path().join("blog.yaml"),
        "log:\n  level: debug\n  format: json\ndb:\n  name: blog\n",
    )
    .unwrap();

    let output = run_blog(home.path(), &[], &[]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{output:?}");
    assert!(stdout.contains("using config file"), "{stdout}");

    let resolved = stdout
        .lines()
        .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
        .find(|line| line["message"] == "resolved settings")
        .expect("no resolved settings record");
    let settings: serde_json::Value =
        serde_json::from_str(resolved["settings"].as_str().unwrap()).unwrap();
    assert_eq!(settings["db.name"], "blog");
    assert_eq!(settings["log.level"], "debug");
}

#[test]
fn environment_raises_the_level() {
    let home = tempfile::tempdir().unwrap();
    let config = home.path().join("custom.yaml");
    fs::write(&config, "log:\n  level: debug\n").unwrap();

    let output = run_blog(
        home.path(),
        &["--config", config.to_str().unwrap()],
        &[("BLOG_LOG_LEVEL", "error")],
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{output:?}");
    assert!(!stdout.contains("resolved settings"), "{stdout}");
}

#[test]
fn malformed_explicit_file_is_not_fatal() {
    let home = tempfile::tempdir().unwrap();
    let config = home.path().join("broken.yaml");
    fs::write(&config, "log: [oops\n").unwrap();

    let output = run_blog(home.path(), &["-c", config.to_str().unwrap()], &[]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{output:?}");
    assert!(stdout.contains("failed to read configuration file"), "{stdout}");
    assert!(stdout.contains("resolved settings"), "{stdout}");
}

#[test]
fn rejects_positional_arguments() {
    let home = tempfile::tempdir().unwrap();
    let output = run_blog(home.path(), &["unexpected"], &[]);
    assert!(!output.status.success());
}
