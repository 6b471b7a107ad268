// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::path::Path;
use std::process::{Command, Output};
use tagrank::util::test_fixtures::TestFixtureRoot;

fn run_cli(root: &Path, args: &[&str]) -> Output {
    let binary = env!("CARGO_BIN_EXE_tagrank");
    Command::new(binary)
        .arg("-C")
        .arg(root)
        .args(args)
        .output()
        .expect("run tagrank cli")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn cli_manages_tags_and_resolves() {
    let fixture = TestFixtureRoot::new_unique("cli-e2e").expect("fixture");
    let root = fixture.path();

    for args in [
        &["tag", "create", "t1"][..],
        &["tag", "create", "t2"][..],
        &["member", "assign", "u1", "t1"][..],
        &["member", "assign", "u1", "t2"][..],
        &["override", "set", "t1", "setting_a", "1"][..],
        &["override", "set", "t2", "setting_a", "2"][..],
        &["override", "set", "global", "setting_b", "\"plain\""][..],
    ] {
        let output = run_cli(root, args);
        assert!(output.status.success(), "{:?}: {:?}", args, output);
    }

    let output = run_cli(root, &["resolve", "key", "u1", "setting_a"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "setting_a=1 (from t1)");

    let output = run_cli(root, &["tag", "reorder", "t2", "t1", "--version", "2"]);
    assert!(output.status.success(), "{:?}", output);

    let output = run_cli(root, &["resolve", "key", "u1", "setting_a"]);
    assert_eq!(stdout(&output).trim(), "setting_a=2 (from t2)");

    let output = run_cli(root, &["r", "eff", "u1"]);
    let text = stdout(&output);
    assert!(text.contains("Sequence: user:u1 > t2 > t1 > global"), "{}", text);
    assert!(text.contains("setting_b=plain (from global)"), "{}", text);
}

#[test]
fn cli_reports_failures_with_exit_codes() {
    let fixture = TestFixtureRoot::new_unique("cli-e2e-errors").expect("fixture");
    let root = fixture.path();

    let output = run_cli(root, &["tag", "remove", "admin"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("forbidden"));

    let output = run_cli(root, &["tag", "reorder", "ghost"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid_order"));

    let output = run_cli(root, &["nope", "list"]);
    assert_eq!(output.status.code(), Some(2));

    let output = run_cli(root, &["help"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("tag reorder"));
}
