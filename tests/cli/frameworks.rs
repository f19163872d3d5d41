use anyhow::Result;
use insta::assert_snapshot;

use crate::{CliTest, stdout_of};

#[test]
fn lists_every_builtin_plugin() -> Result<()> {
    let test = CliTest::new()?;

    let (stdout, _, code) = stdout_of(test.command().arg("frameworks"));
    assert_eq!(code, Some(0));

    let header = stdout.lines().next().unwrap().to_string();
    assert_snapshot!(header, @"NAME        LANGUAGE    PARADIGM");

    for name in [
        "jest",
        "vitest",
        "cypress",
        "playwright",
        "pytest",
        "unittest",
        "junit4",
        "junit5",
    ] {
        assert!(stdout.contains(name), "{name} missing from listing");
    }
    Ok(())
}

#[test]
fn language_filter_restricts_rows() -> Result<()> {
    let test = CliTest::new()?;

    let (stdout, _, code) = stdout_of(
        test.command()
            .arg("frameworks")
            .args(["--language", "python"]),
    );
    assert_eq!(code, Some(0));
    assert!(stdout.contains("pytest"));
    assert!(stdout.contains("unittest"));
    assert!(!stdout.contains("jest"));
    Ok(())
}

#[test]
fn json_listing_is_machine_readable() -> Result<()> {
    let test = CliTest::new()?;

    let (stdout, _, code) = stdout_of(test.command().arg("frameworks").arg("--json"));
    assert_eq!(code, Some(0));

    let rows: serde_json::Value = serde_json::from_str(&stdout)?;
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 8);
    assert!(
        rows.iter()
            .any(|r| r["name"] == "pytest" && r["paradigm"] == "function")
    );
    Ok(())
}
