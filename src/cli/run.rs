//! Command dispatcher.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::json;

use super::args::{
    Arguments, Command, ConvertCommand, FrameworksCommand, MigrateCommand,
};
use super::exit_status::ExitStatus;
use super::report;
use crate::config::{CONFIG_FILE_NAME, Config, default_config_json};
use crate::emitter::EmitterRouter;
use crate::markers::{count_todos, count_warnings};
use crate::migrate::{
    FailureReport, FileReport, MigrateOptions, MigrationEngine, MigrationReport,
    MigrationSummary,
};
use crate::pipeline::{ConvertOptions, Converter};
use crate::registry::FrameworkRegistry;

pub fn run(Arguments { command }: Arguments) -> Result<ExitStatus> {
    match command {
        Some(Command::Convert(cmd)) => convert(cmd),
        Some(Command::Migrate(cmd)) => migrate(cmd),
        Some(Command::Frameworks(cmd)) => frameworks(cmd),
        Some(Command::Init) => {
            init()?;
            println!("Created {CONFIG_FILE_NAME}");
            Ok(ExitStatus::Success)
        }
        None => {
            bail!("No command provided. Use --help to see available commands.")
        }
    }
}

fn convert(cmd: ConvertCommand) -> Result<ExitStatus> {
    let from = cmd
        .args
        .from
        .clone()
        .context("--from is required for convert")?;
    let to = cmd.args.to.clone().context("--to is required for convert")?;

    let src = fs::read_to_string(&cmd.file)
        .with_context(|| format!("Failed to read file: {}", cmd.file.display()))?;

    let registry = FrameworkRegistry::with_builtins();
    let router = EmitterRouter::with_builtins();
    let converter = Converter::new(&registry, &router);
    let opts = ConvertOptions {
        emitter: cmd.args.emitter,
        experimental_ir: cmd.args.experimental_ir,
        language: cmd.args.language.clone(),
    };

    let conversion = match converter.convert(&src, &from, &to, &opts) {
        Ok(conversion) => conversion,
        Err(err) => {
            if cmd.args.json {
                let report = FailureReport::new(err.to_string());
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(ExitStatus::Error);
            }
            return Err(err.into());
        }
    };

    if let Some(output) = &cmd.output {
        fs::write(output, &conversion.code)
            .with_context(|| format!("Failed to write file: {}", output.display()))?;
    }

    if cmd.args.json {
        let payload = json!({
            "success": true,
            "emitter": conversion.emit_path.as_str(),
            "code": conversion.code,
            "report": conversion.report,
            "todos": count_todos(&conversion.code),
            "warnings": count_warnings(&conversion.code),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        if cmd.output.is_none() {
            // Code goes to stdout; keep the report on stderr.
            print!("{}", conversion.code);
            report::print_conversion_report_to(&conversion.report, &mut std::io::stderr().lock());
        } else {
            report::print_conversion_report(&conversion.report);
        }
        if cmd.args.verbose {
            eprintln!("emitter path: {}", conversion.emit_path.as_str());
        }
    }
    Ok(ExitStatus::Success)
}

fn migrate(cmd: MigrateCommand) -> Result<ExitStatus> {
    let root = cmd
        .root
        .clone()
        .unwrap_or_else(|| Path::new(".").to_path_buf());
    let root = root
        .canonicalize()
        .with_context(|| format!("Migration root not found: {}", root.display()))?;

    let config = Config::load(&root)?;
    let Some(source) = cmd.args.from.clone().or(config.source) else {
        bail!("--from is required (or set \"source\" in {CONFIG_FILE_NAME})");
    };
    let Some(target) = cmd.args.to.clone().or(config.target) else {
        bail!("--to is required (or set \"target\" in {CONFIG_FILE_NAME})");
    };

    let mut opts = MigrateOptions::new(source, target);
    opts.language = cmd.args.language.clone().or(config.language);
    opts.include = if cmd.include.is_empty() {
        config.include
    } else {
        cmd.include.clone()
    };
    opts.ignore = if cmd.ignore.is_empty() {
        config.ignore
    } else {
        cmd.ignore.clone()
    };
    if let Some(state_dir) = &cmd.state_dir {
        opts.state_dir = state_dir.clone();
    } else {
        opts.state_dir = config.state_dir;
    }
    opts.continue_run = cmd.continue_run;
    opts.retry_failed = cmd.retry_failed;
    opts.emitter = cmd.args.emitter;
    opts.experimental_ir = cmd.args.experimental_ir;
    opts.verbose = cmd.args.verbose;

    let registry = FrameworkRegistry::with_builtins();
    let router = EmitterRouter::with_builtins();
    let engine = MigrationEngine::new(&registry, &router);

    let json = cmd.args.json;
    let outcome = engine.migrate(&root, &opts, &mut |rel, status, confidence| {
        if !json {
            report::print_progress(rel, status, confidence);
        }
    });
    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(err) => {
            if json {
                let report = FailureReport::new(err.to_string());
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(ExitStatus::Error);
            }
            return Err(err.into());
        }
    };

    let (converted, skipped, failed) = outcome.state.counts();
    if json {
        let report = MigrationReport {
            success: failed == 0,
            summary: MigrationSummary {
                converted,
                skipped,
                failed,
            },
            files: outcome
                .results
                .iter()
                .map(|r| FileReport {
                    path: r.rel_path.clone(),
                    confidence: r.confidence,
                    status: r.status,
                    warnings: r.warnings,
                    todos: r.todos,
                    error: r.error.clone(),
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report::print_migration_summary(&outcome.results);
        println!(
            "Checklist written to {}",
            root.join(&opts.state_dir).join("checklist.md").display()
        );
    }

    if failed > 0 {
        Ok(ExitStatus::Failure)
    } else {
        Ok(ExitStatus::Success)
    }
}

fn frameworks(cmd: FrameworksCommand) -> Result<ExitStatus> {
    let registry = FrameworkRegistry::with_builtins();
    let plugins = registry.list(cmd.language.as_deref());

    if cmd.json {
        let rows: Vec<serde_json::Value> = plugins
            .iter()
            .map(|p| {
                json!({
                    "name": p.name(),
                    "language": p.language(),
                    "paradigm": p.paradigm().to_string(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        let rows: Vec<(String, String, String)> = plugins
            .iter()
            .map(|p| {
                (
                    p.name().to_string(),
                    p.language().to_string(),
                    p.paradigm().to_string(),
                )
            })
            .collect();
        report::print_frameworks_table(&rows, &mut std::io::stdout().lock());
    }
    Ok(ExitStatus::Success)
}

fn init() -> Result<()> {
    let config_path = Path::new(CONFIG_FILE_NAME);
    if config_path.exists() {
        anyhow::bail!("{} already exists", CONFIG_FILE_NAME);
    }
    fs::write(config_path, default_config_json()?)?;
    Ok(())
}
