use std::fs;

use assert_cmd::Command;
use tempfile::tempdir;

#[test]
fn cli_enriches_in_place_and_writes_summary() {
    let dir = tempdir().expect("tempdir");
    let mha = dir.path().join("mha_data.csv");
    let zip = dir.path().join("ZIP_Locale_Detail.csv");
    let summary = dir.path().join("summary.json");
    fs::write(&mha, "CODE,NAME\n101,\"Fort Bragg, NC\"\n").expect("write mha");
    fs::write(
        &zip,
        "ZIP,TYPE,CITY,STATE\n28307,MIL,Fort Bragg,NC\n90210,CIV,Beverly Hills,CA\n",
    )
    .expect("write zip");

    Command::cargo_bin("update_zip_locale")
        .expect("binary")
        .arg("--mha")
        .arg(&mha)
        .arg("--zip")
        .arg(&zip)
        .arg("--summary")
        .arg(&summary)
        .assert()
        .success();

    let enriched = fs::read_to_string(&zip).expect("read zip");
    assert!(enriched.starts_with("ZIP,TYPE,CITY,STATE,MHA_CODE,MHA_NAME"));
    assert!(enriched.contains("28307,MIL,Fort Bragg,NC,101,\"Fort Bragg, NC\""));
    assert!(enriched.contains("90210,CIV,Beverly Hills,CA,,"));

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&summary).expect("read summary")).expect("json");
    assert_eq!(report["join"]["rows"], 2);
    assert_eq!(report["join"]["matched"], 1);
    assert_eq!(report["join"]["replaced_input"], true);
    assert_eq!(report["lookup"]["entries"], 1);
}

#[test]
fn cli_fails_when_mha_file_missing() {
    let dir = tempdir().expect("tempdir");
    let zip = dir.path().join("zips.csv");
    fs::write(&zip, "ZIP,TYPE,CITY,STATE\n").expect("write zip");

    Command::cargo_bin("update_zip_locale")
        .expect("binary")
        .arg("--mha")
        .arg(dir.path().join("missing.csv"))
        .arg("--zip")
        .arg(&zip)
        .assert()
        .failure();

    assert_eq!(fs::read_to_string(&zip).expect("read zip"), "ZIP,TYPE,CITY,STATE\n");
}

#[test]
fn cli_rejects_zero_progress_interval() {
    Command::cargo_bin("update_zip_locale")
        .expect("binary")
        .args(["--progress-interval", "0"])
        .assert()
        .failure();
}
