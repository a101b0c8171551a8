use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

/// A `simlaunch` command isolated from the caller's config and device choice.
fn simlaunch(home: &str) -> Command {
    let home = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(home);
    std::fs::create_dir_all(&home).unwrap();

    let mut cmd = Command::cargo_bin("simlaunch").unwrap();
    cmd.env("HOME", &home).env_remove("SIMLAUNCH_DEVICE");
    cmd
}

fn json_output(cmd: &mut Command) -> serde_json::Value {
    let assert = cmd.assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    serde_json::from_str(&stdout).expect("stdout should be JSON")
}

#[test]
fn test_help_exits_zero() {
    simlaunch("help")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("simlaunch"));
}

#[test]
fn test_launch_app_propagates_child_environment() {
    let json = json_output(
        simlaunch("launch-json")
            .env("FBSIMCTL_CHILD_FOO", "BAR")
            .env("FBSIMCTL_CHILD_BING", "BONG")
            .args(["--format", "json", "launch-app", "com.example.TableSearch"]),
    );

    assert_eq!(json["device"], "booted");
    assert_eq!(json["action"]["type"], "launch_app");
    assert_eq!(json["action"]["bundle_id"], "com.example.TableSearch");
    let environment = json["action"]["environment"].as_object().unwrap();
    assert_eq!(environment["FOO"], "BAR");
    assert_eq!(environment["BING"], "BONG");
    assert!(!environment.contains_key("PATH"));
    assert!(!environment.keys().any(|k| k.starts_with("FBSIMCTL_CHILD_")));
}

#[test]
fn test_child_variable_overrides_base_environment() {
    let json = json_output(
        simlaunch("launch-collision")
            .env("FBSIMCTL_CHILD_FOO", "BAR")
            .args(["--format", "json", "launch-app", "com.example.App", "-e", "FOO=OLD", "-e", "KEEP=ME"]),
    );

    let environment = &json["action"]["environment"];
    assert_eq!(environment["FOO"], "BAR");
    assert_eq!(environment["KEEP"], "ME");
}

#[test]
fn test_launch_app_text_renders_simctl_command() {
    simlaunch("launch-text")
        .env("FBSIMCTL_CHILD_FOO", "BAR")
        .args(["-d", "A1B2", "launch-app", "com.example.App", "--", "--reset"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "SIMCTL_CHILD_FOO=BAR xcrun simctl launch A1B2 com.example.App --reset",
        ));
}

#[test]
fn test_xctest_environment_reaches_hosted_app() {
    let json = json_output(
        simlaunch("xctest-json")
            .env("FBSIMCTL_CHILD_FOO", "BAR")
            .args([
                "--format",
                "json",
                "launch-xctest",
                "--test-bundle",
                "/tmp/Tests.xctest",
                "--app",
                "com.example.App",
            ]),
    );

    let action = &json["action"];
    assert_eq!(action["type"], "launch_xctest");
    assert_eq!(action["test_bundle_path"], "/tmp/Tests.xctest");
    assert_eq!(action["application_launch_configuration"]["environment"]["FOO"], "BAR");
}

#[test]
fn test_xctest_env_without_app_is_rejected() {
    simlaunch("xctest-env-no-app")
        .args(["launch-xctest", "--test-bundle", "/tmp/Tests.xctest", "-e", "FOO=1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--app"));
}

#[test]
fn test_unsafe_variable_name_is_not_rendered() {
    simlaunch("unsafe-key")
        .args(["launch-app", "com.example.App", "-e", "X;touch /tmp/owned=1"])
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Invalid environment variable name"));
}

#[test]
fn test_xctest_text_is_unsupported() {
    simlaunch("xctest-text")
        .args(["launch-xctest", "--test-bundle", "/tmp/Tests.xctest"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("launch_xctest"));
}

#[test]
fn test_boot_propagates_boot_environment() {
    let json = json_output(
        simlaunch("boot-json")
            .env("FBSIMCTL_CHILD_BING", "BONG")
            .args(["--format", "json", "boot", "--scale", "50"]),
    );

    assert_eq!(json["action"]["type"], "boot");
    assert_eq!(json["action"]["scale"], "percent50");
    assert_eq!(json["action"]["boot_environment"]["BING"], "BONG");
}

#[test]
fn test_passthrough_action_ignores_child_environment() {
    simlaunch("terminate")
        .env("FBSIMCTL_CHILD_FOO", "BAR")
        .args(["terminate", "com.example.App"])
        .assert()
        .success()
        .stdout(predicate::str::diff("xcrun simctl terminate booted com.example.App\n"));
}

#[test]
fn test_set_device_becomes_default() {
    simlaunch("set-device")
        .args(["set-device", "CONFIGURED-UDID"])
        .assert()
        .success();

    simlaunch("set-device")
        .arg("shutdown")
        .assert()
        .success()
        .stdout(predicate::str::contains("xcrun simctl shutdown CONFIGURED-UDID"));

    simlaunch("set-device")
        .args(["-d", "EXPLICIT", "shutdown"])
        .assert()
        .success()
        .stdout(predicate::str::contains("shutdown EXPLICIT"));
}

#[test]
fn test_blank_set_device_clears_default() {
    simlaunch("set-device-blank")
        .args(["set-device", "CONFIGURED-UDID"])
        .assert()
        .success();

    simlaunch("set-device-blank")
        .args(["set-device", ""])
        .assert()
        .success()
        .stdout(predicate::str::contains("cleared"));

    simlaunch("set-device-blank")
        .arg("shutdown")
        .assert()
        .success()
        .stdout(predicate::str::diff("xcrun simctl shutdown booted\n"));
}

#[test]
fn test_malformed_env_flag_is_rejected() {
    simlaunch("bad-env")
        .args(["launch-app", "com.example.App", "-e", "NOEQUALS"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("KEY=VALUE"));
}

#[test]
fn test_unknown_subcommand() {
    simlaunch("unknown")
        .arg("totally-fake-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}
