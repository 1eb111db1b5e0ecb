use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn flow_help_works() {
    Command::cargo_bin("flow")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("task tracking"));
}

#[test]
fn subcommand_help_works() {
    let subcommands = [
        "init",
        "login",
        "logout",
        "whoami",
        "task",
        "update",
        "category",
        "request",
        "report",
        "directory",
    ];

    for cmd in subcommands {
        Command::cargo_bin("flow")
            .expect("binary")
            .arg(cmd)
            .arg("--help")
            .assert()
            .success();
    }
}

#[test]
fn unknown_subcommand_fails() {
    Command::cargo_bin("flow")
        .expect("binary")
        .arg("frobnicate")
        .assert()
        .failure();
}
