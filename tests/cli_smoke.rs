//! CLI smoke tests for the offline subcommands.

use assert_cmd::{cargo, prelude::*};
use predicates::prelude::*;
use std::process::Command;

const BOLETO_47: &str = "23791234546789012345767890123457398810000012345";
const BOLETO_47_FMT: &str = "23791.23454 67890.123457 67890.123457 3 98810000012345";
const ARREC_48: &str = "846700000017123456789015234567890129345678901231";
const NFE_KEY: &str = "35250711222333000181001000012345125512345677";
const BAD_47: &str = "23791234506789012345767890123457398810000012345";

fn leitor() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("leitor"));
    cmd.arg("--no-color");
    cmd
}

#[test]
fn validate_accepts_a_valid_boleto() {
    leitor()
        .args(["validate", BOLETO_47])
        .assert()
        .success()
        .stdout(predicate::str::contains("boleto"))
        .stdout(predicate::str::contains("check digits verified"));
}

#[test]
fn validate_normalizes_formatted_input() {
    leitor()
        .args(["validate", BOLETO_47_FMT])
        .assert()
        .success()
        .stdout(predicate::str::contains(BOLETO_47));
}

#[test]
fn validate_accepts_an_arrecadacao() {
    leitor()
        .args(["validate", ARREC_48])
        .assert()
        .success()
        .stdout(predicate::str::contains("arrecadacao"));
}

#[test]
fn validate_rejects_an_nfe_access_key() {
    leitor()
        .args(["validate", NFE_KEY])
        .assert()
        .failure()
        .stdout(predicate::str::contains("NF-e access key"));
}

#[test]
fn validate_rejects_bad_check_digits() {
    leitor()
        .args(["validate", BAD_47])
        .assert()
        .failure()
        .stdout(predicate::str::contains("check digits failed"));
}

#[test]
fn validate_emits_json_when_asked() {
    leitor()
        .args(["--json", "validate", ARREC_48])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"accepted\": true"))
        .stdout(predicate::str::contains("\"kind\": \"arrecadacao\""));
}

#[test]
fn send_without_payer_id_fails_with_a_log_trail() {
    leitor()
        .env("SOAP_URL", "http://127.0.0.1:1/ws")
        .args([
            "send",
            "--id-fluxus",
            "1234567",
            "--barcode",
            BOLETO_47,
        ])
        .assert()
        .failure()
        .stdout(predicate::str::contains("IDPGTO unavailable"));
}
