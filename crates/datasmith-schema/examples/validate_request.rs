use std::env;
use std::path::{Path, PathBuf};

use datasmith_schema::{ValidationReport, request_json_schema, validate_request_document};
use serde_json::Value;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let mut request_path: Option<PathBuf> = None;
    let mut request_schema_path: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--request-schema" => {
                request_schema_path = args.next().map(PathBuf::from);
            }
            _ => {
                if request_path.is_none() {
                    request_path = Some(PathBuf::from(arg));
                } else {
                    return Err("unexpected argument".into());
                }
            }
        }
    }

    let request_path = request_path.ok_or("missing request path")?;
    let request_json = load_json(&request_path)?;
    let request_schema = match request_schema_path {
        Some(path) => load_json(&path)?,
        None => serde_json::to_value(request_json_schema())?,
    };

    let validated = match validate_request_document(&request_json, &request_schema) {
        Ok(validated) => validated,
        Err(report) => {
            eprintln!("request validation failed");
            print_report(&report);
            std::process::exit(1);
        }
    };

    if !validated.warnings.is_empty() {
        eprintln!("request validated with warnings:");
        print_report(&ValidationReport {
            errors: Vec::new(),
            warnings: validated.warnings,
        });
    } else {
        println!(
            "request {} validated successfully ({} tables)",
            validated.request.request_id,
            validated.request.tables.len()
        );
    }

    Ok(())
}

fn load_json(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let json = serde_json::from_str(&contents)?;
    Ok(json)
}

fn print_report(report: &ValidationReport) {
    for issue in report.errors.iter().chain(&report.warnings) {
        let level = match issue.severity {
            datasmith_schema::IssueSeverity::Error => "error",
            datasmith_schema::IssueSeverity::Warning => "warning",
        };
        eprintln!("{level} {} {}: {}", issue.code, issue.path, issue.message);
        if let Some(hint) = &issue.hint {
            eprintln!("  hint: {hint}");
        }
    }
}
