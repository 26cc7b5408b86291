#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::Path;

pub fn taglib_cmd() -> Command {
    let mut cmd = Command::cargo_bin("taglib").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Write a fixture file, creating parent directories
pub fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Project with a root taglib and a nearer one that shadows `app-button`
///
/// ```text
/// proj/marko.json              app-button (renderer), app-card
/// proj/src/marko.json          app-button (template)
/// proj/src/pages/login/        template lives here
/// ```
pub fn shadowing_project(root: &Path) {
    write(
        &root.join("proj/marko.json"),
        r#"{
            "<app-button>": { "renderer": "./button/renderer.js", "@size": "string" },
            "<app-card>": { "template": "./card/template.marko" }
        }"#,
    );
    write(
        &root.join("proj/src/marko.json"),
        r#"{ "<app-button>": { "template": "./components/button.marko", "@variant": "string" } }"#,
    );
    write(&root.join("proj/src/pages/login/template.marko"), "<app-button/>");
}

/// Project declaring `ui-tabs` with a repeated nested `tab`
pub fn tabs_project(root: &Path) {
    write(
        &root.join("marko.json"),
        r#"{
            "<ui-tabs>": {
                "renderer": "./tabs/renderer.js",
                "@class": "string",
                "@tabs <tab>[]": { "@title": "string", "@selected": "boolean" }
            }
        }"#,
    );
    write(&root.join("page.marko"), "");
}
