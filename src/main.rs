use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use indexmap::IndexMap;
use oapi_contracts::{check_schema_refs_in, OpenApiValidator, SchemaValidator, ValidationReport};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about = "Validate API contract schemas and OpenAPI specs", long_about = None)]
struct Cli {
    /// Directory holding JSON schemas
    #[arg(long, global = true, env = "CONTRACTS_SCHEMA_DIR", default_value = "schemas")]
    schema_dir: PathBuf,
    /// Directory holding OpenAPI specs
    #[arg(long, global = true, env = "CONTRACTS_OPENAPI_DIR", default_value = "openapi")]
    openapi_dir: PathBuf,
    /// Print reports as JSON
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate one JSON schema, or all of them
    ValidateSchema {
        /// Schema name; omit to validate all
        name: Option<String>,
        /// Validate every schema in the directory
        #[arg(long, conflicts_with = "name")]
        all: bool,
    },
    /// Validate one OpenAPI spec, or all of them
    ValidateOpenapi {
        /// Spec name; omit to validate all
        name: Option<String>,
        /// Validate every spec in the directory
        #[arg(long, conflicts_with = "name")]
        all: bool,
    },
    /// Report `$ref`s to undefined component schemas
    CheckRefs {
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        name: Option<String>,
        /// Check a spec file outside the OpenAPI directory
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Compare a property's type and format across two schemas
    Consistency {
        first: String,
        second: String,
        field: String,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_single(name: &str, report: &ValidationReport, json: bool) -> anyhow::Result<()> {
    if json {
        let payload = serde_json::json!({
            "name": name,
            "status": report.status(),
            "issues": report.issues,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }
    println!("{}: {}", name, report.status());
    if !report.is_valid() {
        println!("\nIssues:");
        for issue in report.issues.iter() {
            println!("  - {}", issue);
        }
    }
    Ok(())
}

fn print_all(
    title: &str,
    results: &IndexMap<String, ValidationReport>,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }
    println!("{}", title);
    println!("{}", "=".repeat(70));
    for (name, report) in results.iter() {
        println!("\n{}: {}", name, report.status());
        for issue in report.issues.iter() {
            println!("  - {}", issue);
        }
    }
    Ok(())
}

fn exit_code(valid: bool) -> ExitCode {
    if valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let schemas = SchemaValidator::new(&cli.schema_dir);
    let specs = OpenApiValidator::new(&cli.openapi_dir);

    let valid = match cli.command {
        Command::ValidateSchema { name, all } => match name {
            Some(name) if !all => {
                let report = schemas.validate_schema(&name);
                print_single(&name, &report, cli.json)?;
                report.is_valid()
            }
            _ => {
                let results = schemas.validate_all_schemas()?;
                print_all("Schema Validation Results:", &results, cli.json)?;
                results.values().all(ValidationReport::is_valid)
            }
        },
        Command::ValidateOpenapi { name, all } => match name {
            Some(name) if !all => {
                let report = specs.validate_spec(&name);
                print_single(&name, &report, cli.json)?;
                report.is_valid()
            }
            _ => {
                let results = specs.validate_all_specs()?;
                print_all("OpenAPI Validation Results:", &results, cli.json)?;
                results.values().all(ValidationReport::is_valid)
            }
        },
        Command::CheckRefs { name, file } => {
            let (label, report) = match (name, file) {
                (_, Some(file)) => (file.display().to_string(), check_schema_refs_in(&file)?),
                (Some(name), None) => {
                    let report = specs.check_schema_refs(&name)?;
                    (name, report)
                }
                (None, None) => anyhow::bail!("either a spec name or --file is required"),
            };
            print_single(&label, &report, cli.json)?;
            report.is_valid()
        }
        Command::Consistency {
            first,
            second,
            field,
        } => {
            let report = schemas.check_schema_consistency(&first, &second, &field)?;
            print_single(&format!("{}/{} '{}'", first, second, field), &report, cli.json)?;
            report.is_valid()
        }
    };

    Ok(exit_code(valid))
}
