use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

mod common;

#[test]
fn test_large_replay() {
    let input = common::generate_replay(20_000);

    let mut cmd = Command::new(cargo_bin!("temple-ledger"));
    cmd.arg(input.path()).env("RUST_LOG", "warn");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1,Temple 1,City 1,2000,2000,0,0,20000.00"))
        .stdout(predicate::str::contains("10,Temple 10,City 10,2000,2000,0,0,20000.00"));
}
