use anyhow::Result;

use crate::{CliTest, stdout_of};

#[test]
fn init_writes_a_default_config() -> Result<()> {
    let test = CliTest::new()?;

    let (stdout, _, code) = stdout_of(test.command().arg("init"));
    assert_eq!(code, Some(0));
    assert!(stdout.contains("Created .hamletrc.json"));

    let config: serde_json::Value = serde_json::from_str(&test.read_file(".hamletrc.json")?)?;
    assert_eq!(config["source"], "cypress");
    assert_eq!(config["target"], "playwright");
    assert_eq!(config["stateDir"], ".hamlet");
    Ok(())
}

#[test]
fn init_refuses_to_overwrite() -> Result<()> {
    let test = CliTest::with_file(".hamletrc.json", "{}")?;

    let (_, stderr, code) = stdout_of(test.command().arg("init"));
    assert_eq!(code, Some(2));
    assert!(stderr.contains("already exists"));
    Ok(())
}

#[test]
fn bare_invocation_prints_help() -> Result<()> {
    let test = CliTest::new()?;

    let (stdout, _, code) = stdout_of(&mut test.command());
    assert_eq!(code, Some(0));
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("convert"));
    assert!(stdout.contains("migrate"));
    Ok(())
}

#[test]
fn help_flag_lists_subcommands() -> Result<()> {
    let test = CliTest::new()?;

    let (stdout, _, code) = stdout_of(test.command().arg("--help"));
    assert_eq!(code, Some(0));
    assert!(stdout.contains("frameworks"));
    assert!(stdout.contains("init"));
    Ok(())
}
