use crate::config::types::{
    CompletionSpec, Config, CrawlerConfig, EnqueueSpec, JobConfig, OutputConfig, UserAgentConfig,
};
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_job_config(&config.job)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 100 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 100, got {}",
            config.workers
        )));
    }

    if config.max_accesses_per_window < 1 {
        return Err(ConfigError::Validation(format!(
            "max_accesses_per_window must be >= 1, got {}",
            config.max_accesses_per_window
        )));
    }

    if config.window_ms < 1 {
        return Err(ConfigError::Validation(
            "window_ms must be >= 1ms".to_string(),
        ));
    }

    if config.request_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_ms must be >= 100ms, got {}ms",
            config.request_timeout_ms
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    // Validate contact URL
    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    // Validate contact email (basic validation)
    validate_email(&config.contact_email)?;

    if let Some(proxy) = &config.proxy {
        Url::parse(proxy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", proxy, e)))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the job section
///
/// Seed-within-domain checks are left to the job builder, which reports
/// them as `SeedUriMismatch`.
fn validate_job_config(job: &JobConfig) -> Result<(), ConfigError> {
    validate_http_url("domain", &job.domain)?;

    for seed in &job.seeds {
        validate_http_url("seed", seed)?;
    }

    validate_pattern("pattern", &job.pattern)?;

    for spec in &job.completion {
        validate_completion_spec(spec)?;
    }

    for spec in &job.enqueue {
        match spec {
            EnqueueSpec::IncludePattern { pattern } | EnqueueSpec::ExcludePattern { pattern } => {
                if pattern.is_empty() {
                    return Err(ConfigError::Validation(
                        "enqueue pattern cannot be empty".to_string(),
                    ));
                }
                validate_pattern("enqueue pattern", pattern)?;
            }
            EnqueueSpec::MaxDepth { .. } => {}
        }
    }

    for cookie in &job.cookies {
        if cookie.name.is_empty() || cookie.name.contains(['=', ';']) {
            return Err(ConfigError::Validation(format!(
                "Invalid cookie name: '{}'",
                cookie.name
            )));
        }
    }

    Ok(())
}

fn validate_completion_spec(spec: &CompletionSpec) -> Result<(), ConfigError> {
    let (kind, limit) = match spec {
        CompletionSpec::MaxPages { limit } => ("max-pages", *limit as u64),
        CompletionSpec::MaxTime { seconds } => ("max-time", *seconds),
        CompletionSpec::MaxResults { limit } => ("max-results", *limit as u64),
        CompletionSpec::MaxErrors { limit } => ("max-errors", *limit as u64),
    };

    if limit == 0 {
        return Err(ConfigError::Validation(format!(
            "{} completion limit must be >= 1",
            kind
        )));
    }

    Ok(())
}

/// Validates an absolute http(s) URL with a host
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use the http or https scheme",
            field, value
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' has no host",
            field, value
        )));
    }

    Ok(())
}

fn validate_pattern(field: &str, pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Ok(());
    }

    Regex::new(pattern)
        .map(|_| ())
        .map_err(|e| ConfigError::Validation(format!("Invalid {}: {}", field, e)))
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Basic email format check: must contain @ and have text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    // Domain part should contain at least one dot
    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
