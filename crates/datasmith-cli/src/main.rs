mod config;
mod error;
mod logging;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use datasmith_schema::{
    ObjectKind, ObjectSchemas, OutputFormat, Project, ValidationReport, build_request,
    project_json_schema, request_json_schema, validate_request, validate_request_document,
};
use datasmith_trees::Tree;

use config::{CliConfig, LogFormat, load_config};
use error::{CliError, CliResult};
use logging::init_logging;
use output::{emit, load_json, load_tree};

#[derive(Parser, Debug)]
#[command(name = "datasmith", version, about = "Datasmith dataset schema CLI")]
struct Cli {
    /// TOML config file (defaults to ./datasmith.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log filter directive, e.g. `info` or `datasmith_schema=debug`.
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,
    /// Write compact JSON instead of pretty-printed JSON.
    #[arg(long, global = true, default_value_t = false)]
    compact: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge a settings patch over previous settings and the defaults.
    Merge(MergeArgs),
    /// Print the visible form elements for a settings file.
    Form(FormArgs),
    /// Build a generation request from a project file.
    Export(ExportArgs),
    /// Check the built-in schemas and, optionally, a request document.
    Check(CheckArgs),
    /// Print the JSON Schema of generation requests (or projects).
    RequestSchema(SchemaArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    Table,
    Field,
}

impl From<KindArg> for ObjectKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Table => ObjectKind::Table,
            KindArg::Field => ObjectKind::Field,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    MultiTable,
    SingleTable,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::MultiTable => OutputFormat::MultiTable,
            FormatArg::SingleTable => OutputFormat::SingleTable,
        }
    }
}

#[derive(Args, Debug)]
struct MergeArgs {
    #[arg(long, value_enum)]
    kind: KindArg,
    /// Previous settings; the defaults are used when omitted.
    #[arg(long)]
    old: Option<PathBuf>,
    /// Partial settings patch.
    #[arg(long)]
    new: PathBuf,
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FormArgs {
    #[arg(long, value_enum)]
    kind: KindArg,
    /// Settings to render; missing keys are filled from the defaults.
    #[arg(long)]
    settings: Option<PathBuf>,
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Project JSON file.
    #[arg(long)]
    project: PathBuf,
    #[arg(long, value_enum, default_value = "multi-table")]
    output_format: FormatArg,
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Generation request JSON to validate.
    request: Option<PathBuf>,
    /// JSON Schema to validate against instead of the built-in one.
    #[arg(long)]
    request_schema: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Emit the project schema instead of the request schema.
    #[arg(long, default_value_t = false)]
    project: bool,
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = load_config(cli.config.as_deref())?.with_overrides(
        cli.log_level,
        cli.log_format,
        cli.compact,
    );
    init_logging(&config.log_level, config.log_format)?;

    let schemas = ObjectSchemas::builtin()?;
    tracing::debug!(event = "schemas_loaded");

    match cli.command {
        Command::Merge(args) => run_merge(args, &schemas, &config),
        Command::Form(args) => run_form(args, &schemas, &config),
        Command::Export(args) => run_export(args, &schemas, &config),
        Command::Check(args) => run_check(args),
        Command::RequestSchema(args) => run_request_schema(args, &config),
    }
}

fn run_merge(args: MergeArgs, schemas: &ObjectSchemas, config: &CliConfig) -> CliResult<()> {
    let schema = schemas.get(args.kind.into())?;
    let old = match &args.old {
        Some(path) => load_tree(path)?,
        None => schema.defaults().clone(),
    };
    let new = load_tree(&args.new)?;

    let merged = schema.merge(&old, &new)?;
    tracing::info!(event = "settings_merged", kind = %schema.kind());
    emit(&merged, args.out.as_deref(), config.pretty)
}

fn run_form(args: FormArgs, schemas: &ObjectSchemas, config: &CliConfig) -> CliResult<()> {
    let schema = schemas.get(args.kind.into())?;
    let settings = match &args.settings {
        Some(path) => schema.merge(&load_tree(path)?, &Tree::new())?,
        None => schema.defaults().clone(),
    };

    let elements = schema.visible_form(&settings)?;
    tracing::info!(event = "form_built", kind = %schema.kind(), elements = elements.len());
    emit(&elements, args.out.as_deref(), config.pretty)
}

fn run_export(args: ExportArgs, schemas: &ObjectSchemas, config: &CliConfig) -> CliResult<()> {
    let project: Project = serde_json::from_value(load_json(&args.project)?)?;
    let request = build_request(&project, schemas, args.output_format.into())?;

    let report = validate_request(&request);
    print_report(&report);
    if !report.is_ok() {
        return Err(CliError::Validation(report.errors.len()));
    }

    emit(&request, args.out.as_deref(), config.pretty)
}

fn run_check(args: CheckArgs) -> CliResult<()> {
    let Some(request_path) = args.request else {
        eprintln!("built-in schemas are valid");
        return Ok(());
    };

    let request_json = load_json(&request_path)?;
    let request_schema = match &args.request_schema {
        Some(path) => load_json(path)?,
        None => serde_json::to_value(request_json_schema())?,
    };

    match validate_request_document(&request_json, &request_schema) {
        Ok(validated) => {
            print_report(&ValidationReport {
                errors: Vec::new(),
                warnings: validated.warnings,
            });
            eprintln!("request {} is valid", validated.request.request_id);
            Ok(())
        }
        Err(report) => {
            print_report(&report);
            Err(CliError::Validation(report.errors.len()))
        }
    }
}

fn run_request_schema(args: SchemaArgs, config: &CliConfig) -> CliResult<()> {
    let schema = if args.project {
        project_json_schema()
    } else {
        request_json_schema()
    };
    emit(&schema, args.out.as_deref(), config.pretty)
}

fn print_report(report: &ValidationReport) {
    for issue in &report.errors {
        eprintln!("error {} {}: {}", issue.code, issue.path, issue.message);
        if let Some(hint) = &issue.hint {
            eprintln!("  hint: {hint}");
        }
    }
    for issue in &report.warnings {
        eprintln!("warning {} {}: {}", issue.code, issue.path, issue.message);
        if let Some(hint) = &issue.hint {
            eprintln!("  hint: {hint}");
        }
    }
}
