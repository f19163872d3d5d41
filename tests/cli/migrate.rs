use anyhow::Result;

use crate::{CliTest, stdout_of};

fn cypress_project() -> Result<CliTest> {
    let test = CliTest::new()?;
    test.write_file(
        "cypress/e2e/helpers.cy.js",
        "\
describe('helpers', () => {
  it('loads', () => {
    cy.visit('/');
  });
});
",
    )?;
    test.write_file(
        "cypress/e2e/login.cy.js",
        "\
import { fillLogin } from './helpers.cy.js';

describe('login', () => {
  beforeEach(() => {
    cy.visit('/login');
  });
  it('shows an error', () => {
    cy.get('.error').should('be.visible');
  });
});
",
    )?;
    test.write_file("cypress/fixtures/user.json", "{\"name\": \"u\"}\n")?;
    Ok(test)
}

#[test]
fn migrates_a_cypress_project_in_dependency_order() -> Result<()> {
    let test = cypress_project()?;

    let (stdout, _, code) = stdout_of(
        test.migrate_command()
            .args(["--from", "cypress", "--to", "playwright"]),
    );
    assert_eq!(code, Some(0));

    // Helper precedes its importer in the progress log.
    let helpers_pos = stdout.find("helpers.cy.js").unwrap();
    let login_pos = stdout.find("login.cy.js").unwrap();
    assert!(helpers_pos < login_pos);

    // Renamed outputs exist and the import specifier was rewritten.
    assert!(test.exists("cypress/e2e/helpers.spec.js"));
    assert!(test.exists("cypress/e2e/login.spec.js"));
    let login = test.read_file("cypress/e2e/login.spec.js")?;
    assert!(login.contains("from './helpers.spec.js'"));
    assert!(login.contains("await expect(page.locator('.error')).toBeVisible();"));

    // State and checklist land under the state directory.
    assert!(test.exists(".hamlet/state.json"));
    assert!(test.exists(".hamlet/checklist.md"));

    let state: serde_json::Value = serde_json::from_str(&test.read_file(".hamlet/state.json")?)?;
    assert_eq!(state["version"], 1);
    assert_eq!(state["source"], "cypress");
    assert_eq!(
        state["files"]["cypress/e2e/login.cy.js"]["status"],
        "converted"
    );
    assert_eq!(
        state["files"]["cypress/fixtures/user.json"]["status"],
        "skipped"
    );
    Ok(())
}

#[test]
fn json_report_has_summary_and_files() -> Result<()> {
    let test = cypress_project()?;

    let (stdout, _, code) = stdout_of(
        test.migrate_command()
            .args(["--from", "cypress", "--to", "playwright", "--json"]),
    );
    assert_eq!(code, Some(0));

    let report: serde_json::Value = serde_json::from_str(&stdout)?;
    assert_eq!(report["success"], true);
    assert_eq!(report["summary"]["converted"], 2);
    assert_eq!(report["summary"]["skipped"], 1);
    assert_eq!(report["summary"]["failed"], 0);
    assert!(report["files"].as_array().unwrap().len() >= 3);
    Ok(())
}

#[test]
fn continue_skips_already_converted_files() -> Result<()> {
    let test = cypress_project()?;

    let (_, _, first) = stdout_of(
        test.migrate_command()
            .args(["--from", "cypress", "--to", "playwright"]),
    );
    assert_eq!(first, Some(0));

    let (stdout, _, second) = stdout_of(
        test.migrate_command()
            .args(["--from", "cypress", "--to", "playwright", "--continue"]),
    );
    assert_eq!(second, Some(0));
    assert!(stdout.contains("already converted"));
    Ok(())
}

#[test]
fn identical_inputs_yield_identical_summaries() -> Result<()> {
    let first_project = cypress_project()?;
    let second_project = cypress_project()?;

    let (first_out, _, _) = stdout_of(
        first_project
            .migrate_command()
            .args(["--from", "cypress", "--to", "playwright", "--json"]),
    );
    let (second_out, _, _) = stdout_of(
        second_project
            .migrate_command()
            .args(["--from", "cypress", "--to", "playwright", "--json"]),
    );
    let first: serde_json::Value = serde_json::from_str(&first_out)?;
    let second: serde_json::Value = serde_json::from_str(&second_out)?;
    assert_eq!(first["summary"], second["summary"]);
    assert_eq!(first["files"], second["files"]);
    Ok(())
}

#[test]
fn rerunning_over_outputs_skips_target_dialect_files() -> Result<()> {
    let test = cypress_project()?;

    stdout_of(
        test.migrate_command()
            .args(["--from", "cypress", "--to", "playwright"]),
    );
    let (stdout, _, code) = stdout_of(
        test.migrate_command()
            .args(["--from", "cypress", "--to", "playwright", "--json"]),
    );
    assert_eq!(code, Some(0));

    let report: serde_json::Value = serde_json::from_str(&stdout)?;
    assert_eq!(report["summary"]["failed"], 0);
    let spec_entry = report["files"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["path"] == "cypress/e2e/login.spec.js")
        .unwrap();
    assert_eq!(spec_entry["status"], "skipped");
    Ok(())
}

#[test]
fn config_file_supplies_source_and_target() -> Result<()> {
    let test = cypress_project()?;
    test.write_file(
        ".hamletrc.json",
        "{\n  \"source\": \"cypress\",\n  \"target\": \"playwright\"\n}\n",
    )?;

    let (_, _, code) = stdout_of(&mut test.migrate_command());
    assert_eq!(code, Some(0));
    assert!(test.exists("cypress/e2e/login.spec.js"));
    Ok(())
}

#[test]
fn missing_target_is_an_error() -> Result<()> {
    let test = cypress_project()?;

    let (_, stderr, code) = stdout_of(test.migrate_command().args(["--from", "cypress"]));
    assert_eq!(code, Some(2));
    assert!(stderr.contains("--to is required"));
    Ok(())
}

#[test]
fn checklist_buckets_by_confidence() -> Result<()> {
    let test = cypress_project()?;
    // An unparseable file exercises the recovery path (confidence 30).
    test.write_file(
        "cypress/e2e/broken.cy.js",
        "describe('broken', () => {\n  it('x', () => {\n    cy.visit('/');\n",
    )?;

    let (_, _, code) = stdout_of(
        test.migrate_command()
            .args(["--from", "cypress", "--to", "playwright"]),
    );
    assert_eq!(code, Some(0));

    let checklist = test.read_file(".hamlet/checklist.md")?;
    assert!(checklist.contains("# Migration checklist: cypress → playwright"));
    assert!(checklist.contains("## Fully converted"));
    assert!(checklist.contains("## Needs review"));
    assert!(checklist.contains("broken.spec.js") || checklist.contains("broken.cy.js"));
    assert!(checklist.contains("## Config changes"));
    Ok(())
}

#[test]
fn backups_mirror_overwritten_files() -> Result<()> {
    let test = CliTest::with_file(
        "math.test.js",
        "\
describe('math', () => {
  it('adds', () => {
    expect(add(1, 2)).toEqual(3);
  });
});
",
    )?;

    let (_, _, code) = stdout_of(
        test.migrate_command()
            .args(["--from", "jest", "--to", "vitest"]),
    );
    assert_eq!(code, Some(0));

    // Jest and Vitest share file naming, so conversion overwrites in
    // place and the original is preserved under backups/.
    let backup = test.read_file(".hamlet/backups/math.test.js")?;
    assert!(!backup.contains("vitest"));
    let converted = test.read_file("math.test.js")?;
    assert!(converted.contains("from 'vitest'"));
    Ok(())
}
