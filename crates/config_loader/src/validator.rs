//! Configuration validation
//!
//! Rules:
//! - server.host not empty, server.port != 0
//! - record_ttl_secs > 0 when set, sweep_interval_secs > 0
//! - lines_path not empty when set
//! - reporter.endpoint is an http(s) URL
//! - interval_ms > 0, min_update_interval_ms <= interval_ms
//! - min_displacement_m finite and >= 0
//! - timeouts, queue_capacity and max_in_flight > 0

use contracts::{ContractError, ReporterConfig, ServerConfig, TrackerBlueprint};

/// Validate a TrackerBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &TrackerBlueprint) -> Result<(), ContractError> {
    validate_server(&blueprint.server)?;
    validate_endpoint(&blueprint.reporter)?;
    validate_cadence(&blueprint.reporter)?;
    validate_timeouts(&blueprint.reporter)?;
    validate_queue(&blueprint.reporter)?;
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ContractError> {
    if server.host.trim().is_empty() {
        return Err(ContractError::config_validation(
            "server.host",
            "host cannot be empty",
        ));
    }
    if server.port == 0 {
        return Err(ContractError::config_validation(
            "server.port",
            "port must be > 0",
        ));
    }
    if server.record_ttl_secs == Some(0) {
        return Err(ContractError::config_validation(
            "server.record_ttl_secs",
            "record_ttl_secs must be > 0 (omit it to disable expiry)",
        ));
    }
    if server.sweep_interval_secs == 0 {
        return Err(ContractError::config_validation(
            "server.sweep_interval_secs",
            "sweep_interval_secs must be > 0",
        ));
    }
    if server
        .lines_path
        .as_ref()
        .is_some_and(|path| path.as_os_str().is_empty())
    {
        return Err(ContractError::config_validation(
            "server.lines_path",
            "lines_path cannot be empty (omit it to disable line geometry)",
        ));
    }
    Ok(())
}

fn validate_endpoint(reporter: &ReporterConfig) -> Result<(), ContractError> {
    let endpoint = reporter.endpoint.trim();
    if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        return Err(ContractError::config_validation(
            "reporter.endpoint",
            format!("endpoint must be an http(s) URL, got '{}'", reporter.endpoint),
        ));
    }
    Ok(())
}

fn validate_cadence(reporter: &ReporterConfig) -> Result<(), ContractError> {
    if reporter.interval_ms == 0 {
        return Err(ContractError::config_validation(
            "reporter.interval_ms",
            "interval_ms must be > 0",
        ));
    }
    if reporter.min_update_interval_ms > reporter.interval_ms {
        return Err(ContractError::config_validation(
            "reporter.min_update_interval_ms / reporter.interval_ms",
            format!(
                "min_update_interval_ms ({}) must be <= interval_ms ({})",
                reporter.min_update_interval_ms, reporter.interval_ms
            ),
        ));
    }
    if !reporter.min_displacement_m.is_finite() || reporter.min_displacement_m < 0.0 {
        return Err(ContractError::config_validation(
            "reporter.min_displacement_m",
            format!(
                "min_displacement_m must be >= 0, got {}",
                reporter.min_displacement_m
            ),
        ));
    }
    Ok(())
}

fn validate_timeouts(reporter: &ReporterConfig) -> Result<(), ContractError> {
    let timeouts = [
        ("reporter.request_timeout_secs", reporter.request_timeout_secs),
        ("reporter.connect_timeout_secs", reporter.connect_timeout_secs),
        ("reporter.fetch_timeout_secs", reporter.fetch_timeout_secs),
    ];
    for (field, value) in timeouts {
        if value == 0 {
            return Err(ContractError::config_validation(
                field,
                "timeout must be > 0",
            ));
        }
    }
    Ok(())
}

fn validate_queue(reporter: &ReporterConfig) -> Result<(), ContractError> {
    if reporter.queue_capacity == 0 {
        return Err(ContractError::config_validation(
            "reporter.queue_capacity",
            "queue_capacity must be > 0",
        ));
    }
    if reporter.max_in_flight == 0 {
        return Err(ContractError::config_validation(
            "reporter.max_in_flight",
            "max_in_flight must be > 0",
        ));
    }
    Ok(())
}
