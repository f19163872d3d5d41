use anyhow::Result;

use crate::{CliTest, stdout_of};

const CYPRESS_SPEC: &str = "\
describe('login', () => {
  beforeEach(() => {
    cy.visit('/login');
  });
  it('shows an error', () => {
    cy.get('[data-test=submit]').click();
    cy.get('.error').should('be.visible');
    cy.url().should('include', '/login');
  });
});
";

#[test]
fn cypress_to_playwright_writes_the_output_file() -> Result<()> {
    let test = CliTest::with_file("login.cy.js", CYPRESS_SPEC)?;

    let (stdout, _, code) = stdout_of(
        test.convert_command()
            .arg("login.cy.js")
            .args(["--from", "cypress", "--to", "playwright"])
            .args(["--output", "login.spec.js"]),
    );
    assert_eq!(code, Some(0));
    assert!(stdout.contains("converted with"));

    let converted = test.read_file("login.spec.js")?;
    assert!(converted.starts_with("import { test, expect } from '@playwright/test';"));
    assert!(converted.contains("test('shows an error', async ({ page }) => {"));
    assert!(converted.contains("await page.goto('/login');"));
    assert!(converted.contains("await expect(page.locator('.error')).toBeVisible();"));
    assert!(!converted.contains("cy."));
    Ok(())
}

#[test]
fn stdout_carries_code_and_stderr_the_report() -> Result<()> {
    let test = CliTest::with_file("login.cy.js", CYPRESS_SPEC)?;

    let (stdout, stderr, code) = stdout_of(
        test.convert_command()
            .arg("login.cy.js")
            .args(["--from", "cypress", "--to", "playwright"]),
    );
    assert_eq!(code, Some(0));
    assert!(stdout.contains("await page.goto('/login');"));
    assert!(stderr.contains("converted with"));
    Ok(())
}

#[test]
fn json_output_includes_code_and_report() -> Result<()> {
    let test = CliTest::with_file("login.cy.js", CYPRESS_SPEC)?;

    let (stdout, _, code) = stdout_of(
        test.convert_command()
            .arg("login.cy.js")
            .args(["--from", "cypress", "--to", "playwright", "--json"]),
    );
    assert_eq!(code, Some(0));
    let payload: serde_json::Value = serde_json::from_str(&stdout)?;
    assert_eq!(payload["success"], true);
    assert_eq!(payload["emitter"], "legacy");
    assert!(payload["code"].as_str().unwrap().contains("page.goto"));
    assert!(payload["report"]["confidence"].as_u64().unwrap() <= 100);
    assert_eq!(payload["report"]["level"], "high");
    Ok(())
}

#[test]
fn ir_patch_reports_coverage() -> Result<()> {
    let test = CliTest::with_file(
        "login.cy.js",
        "\
describe('login', () => {
  it('x', () => {
    cy.get('.error').should('be.visible');
    cy.get('.badge').should('have.glow');
  });
});
",
    )?;

    let (stdout, _, code) = stdout_of(
        test.convert_command()
            .arg("login.cy.js")
            .args(["--from", "cypress", "--to", "playwright"])
            .args(["--emitter", "ir-patch", "--json"]),
    );
    assert_eq!(code, Some(0));
    let payload: serde_json::Value = serde_json::from_str(&stdout)?;
    assert_eq!(payload["emitter"], "ir-patch");
    let coverage = &payload["report"]["irCoverage"];
    assert_eq!(coverage["supportedAssertions"], 1);
    assert_eq!(coverage["unsupportedAssertions"], 1);
    assert_eq!(coverage["coveragePercent"], 50);
    assert!(payload["todos"].as_u64().unwrap() >= 1);
    Ok(())
}

#[test]
fn jest_to_vitest_keeps_expectations() -> Result<()> {
    let test = CliTest::with_file(
        "math.test.js",
        "\
describe('math', () => {
  it('adds', () => {
    jest.useFakeTimers();
    expect(add(1, 2)).toEqual(3);
  });
});
",
    )?;

    let (stdout, _, code) = stdout_of(
        test.convert_command()
            .arg("math.test.js")
            .args(["--from", "jest", "--to", "vitest"]),
    );
    assert_eq!(code, Some(0));
    assert!(stdout.contains("from 'vitest'"));
    assert!(stdout.contains("vi.useFakeTimers();"));
    assert!(stdout.contains("expect(add(1, 2)).toEqual(3);"));
    Ok(())
}

#[test]
fn unknown_framework_fails_with_exit_two() -> Result<()> {
    let test = CliTest::with_file("a.test.js", "it('x', () => {});\n")?;

    let (_, stderr, code) = stdout_of(
        test.convert_command()
            .arg("a.test.js")
            .args(["--from", "jasmine", "--to", "vitest"]),
    );
    assert_eq!(code, Some(2));
    assert!(stderr.contains("unknown framework: jasmine"));
    Ok(())
}

#[test]
fn same_framework_fails() -> Result<()> {
    let test = CliTest::with_file("a.test.js", "it('x', () => {});\n")?;

    let (_, stderr, code) = stdout_of(
        test.convert_command()
            .arg("a.test.js")
            .args(["--from", "jest", "--to", "jest"]),
    );
    assert_eq!(code, Some(2));
    assert!(stderr.contains("source and target framework are both 'jest'"));
    Ok(())
}

#[test]
fn json_failure_shape_on_error() -> Result<()> {
    let test = CliTest::with_file("a.sql", "SELECT 1;\n")?;

    let (stdout, _, code) = stdout_of(
        test.convert_command()
            .arg("a.sql")
            .args(["--from", "cypress", "--to", "playwright", "--json"]),
    );
    assert_eq!(code, Some(2));
    let payload: serde_json::Value = serde_json::from_str(&stdout)?;
    assert_eq!(payload["success"], false);
    assert!(payload["error"].as_str().unwrap().contains("detection"));
    Ok(())
}

#[test]
fn pytest_to_unittest_produces_a_test_class() -> Result<()> {
    let test = CliTest::with_file(
        "test_calc.py",
        "\
def test_add():
    assert add(1, 2) == 3

def test_none():
    assert result() is None
",
    )?;

    let (stdout, _, code) = stdout_of(
        test.convert_command()
            .arg("test_calc.py")
            .args(["--from", "pytest", "--to", "unittest"]),
    );
    assert_eq!(code, Some(0));
    assert!(stdout.contains("import unittest"));
    assert!(stdout.contains("class Tests(unittest.TestCase):"));
    assert!(stdout.contains("self.assertEqual(add(1, 2), 3)"));
    assert!(stdout.contains("self.assertIsNone(result())"));
    assert!(stdout.contains("unittest.main()"));
    Ok(())
}

#[test]
fn junit4_to_junit5_upgrades_annotations() -> Result<()> {
    let test = CliTest::with_file(
        "CalcTest.java",
        "\
import org.junit.Before;
import org.junit.Test;
import static org.junit.Assert.assertEquals;

public class CalcTest {
    @Before
    public void setUp() {
    }

    @Test
    public void adds() {
        assertEquals(3, calc.add(1, 2));
    }
}
",
    )?;

    let (stdout, _, code) = stdout_of(
        test.convert_command()
            .arg("CalcTest.java")
            .args(["--from", "junit4", "--to", "junit5"]),
    );
    assert_eq!(code, Some(0));
    assert!(stdout.contains("import org.junit.jupiter.api.BeforeEach;"));
    assert!(stdout.contains("import org.junit.jupiter.api.Test;"));
    assert!(stdout.contains("@BeforeEach"));
    Ok(())
}
