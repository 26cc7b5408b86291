mod common;

use common::{shadowing_project, tabs_project, taglib_cmd, write};
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn test_list_shows_winning_definitions() {
    let temp = TempDir::new().unwrap();
    shadowing_project(temp.path());

    taglib_cmd()
        .arg("list")
        .arg(temp.path().join("proj/src/pages/login/template.marko"))
        .assert()
        .success()
        .stdout(predicate::str::contains("app-button"))
        .stdout(predicate::str::contains("template"))
        .stdout(predicate::str::contains("app-card"));
}

#[test]
fn test_list_relative_template() {
    let temp = TempDir::new().unwrap();
    tabs_project(temp.path());

    taglib_cmd()
        .current_dir(temp.path())
        .args(["list", "page.marko"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ui-tabs.tab"))
        .stdout(predicate::str::contains("nested"));
}

#[test]
fn test_show_prints_json() {
    let temp = TempDir::new().unwrap();
    tabs_project(temp.path());

    taglib_cmd()
        .current_dir(temp.path())
        .args(["show", "page.marko", "ui-tabs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"ui-tabs\""))
        .stdout(predicate::str::contains("\"cardinality\""));
}

#[test]
fn test_show_unknown_tag() {
    let temp = TempDir::new().unwrap();
    tabs_project(temp.path());

    taglib_cmd()
        .current_dir(temp.path())
        .args(["show", "page.marko", "ui-menu"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("unknown tag <ui-menu>"));
}

#[test]
fn test_check_ok() {
    let temp = TempDir::new().unwrap();
    tabs_project(temp.path());

    taglib_cmd()
        .current_dir(temp.path())
        .args(["check", "page.marko", "ui-tabs", "class='x'", "tabs=data.tabs"])
        .assert()
        .success()
        .stdout(predicate::str::diff("ok\n"));
}

#[test]
fn test_check_unknown_attribute() {
    let temp = TempDir::new().unwrap();
    tabs_project(temp.path());

    taglib_cmd()
        .current_dir(temp.path())
        .args(["check", "page.marko", "ui-tabs", "foo"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("'foo'"))
        .stderr(predicate::str::contains("Suggestions"));
}

#[test]
fn test_broken_taglib_exit_code() {
    let temp = TempDir::new().unwrap();
    write(&temp.path().join("marko.json"), "{ \"<x>\": 42 }");

    taglib_cmd()
        .current_dir(temp.path())
        .args(["list", "page.marko"])
        .assert()
        .code(2);
}

#[test]
fn test_config_file_overrides_taglib_names() {
    let temp = TempDir::new().unwrap();
    write(
        &temp.path().join("tags.json"),
        r#"{ "<custom-tag>": { "renderer": "./custom.js" } }"#,
    );
    write(&temp.path().join("taglib.toml"), "taglib-files = [\"tags.json\"]\n");

    taglib_cmd()
        .current_dir(temp.path())
        .args(["--config", "taglib.toml", "list", "page.marko"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom-tag"));

    taglib_cmd()
        .current_dir(temp.path())
        .args(["list", "page.marko"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom-tag").not());
}

#[test]
fn test_invalid_config_file() {
    let temp = TempDir::new().unwrap();
    write(&temp.path().join("taglib.toml"), "colour = \"blue\"\n");

    taglib_cmd()
        .current_dir(temp.path())
        .args(["--config", "taglib.toml", "list", "page.marko"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid configuration"));
}
