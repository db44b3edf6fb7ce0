//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::TrackerBlueprint;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    bind_addr: String,
    record_ttl_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lines_path: Option<String>,
    endpoint: String,
    interval_ms: u64,
    queue_capacity: usize,
    max_in_flight: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    bind_addr: blueprint.server.bind_addr(),
                    record_ttl_secs: blueprint.server.record_ttl_secs,
                    lines_path: blueprint
                        .server
                        .lines_path
                        .as_ref()
                        .map(|p| p.display().to_string()),
                    endpoint: blueprint.reporter.endpoint.clone(),
                    interval_ms: blueprint.reporter.interval_ms,
                    queue_capacity: blueprint.reporter.queue_capacity,
                    max_in_flight: blueprint.reporter.max_in_flight,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &TrackerBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.server.record_ttl_secs.is_none() {
        warnings.push(
            "server.record_ttl_secs is not set - abandoned positions are served forever"
                .to_string(),
        );
    }

    if let Some(ref path) = blueprint.server.lines_path {
        if !path.exists() {
            warnings.push(format!(
                "server.lines_path '{}' does not exist - serve will refuse to start",
                path.display()
            ));
        }
    }

    let endpoint = &blueprint.reporter.endpoint;
    let local = ["http://localhost", "http://127.0.0.1", "http://[::1]"];
    if endpoint.starts_with("http://") && !local.iter().any(|p| endpoint.starts_with(p)) {
        warnings.push(format!(
            "reporter.endpoint '{endpoint}' is not local and does not use https"
        ));
    }

    if blueprint.reporter.min_displacement_m == 0.0 {
        warnings.push("reporter.min_displacement_m is 0 - stationary buses upload every tick".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Registry: {}", summary.bind_addr);
            match summary.record_ttl_secs {
                Some(ttl) => println!("  Record TTL: {}s", ttl),
                None => println!("  Record TTL: never"),
            }
            if let Some(ref path) = summary.lines_path {
                println!("  Line catalog: {}", path);
            }
            println!("  Reporter endpoint: {}", summary.endpoint);
            println!("  Interval: {}ms", summary.interval_ms);
            println!(
                "  Upload queue: {} slots, {} in flight",
                summary.queue_capacity, summary.max_in_flight
            );
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
