use crate::config::types::{
    Config, ConverterConfig, CrawlerConfig, OracleConfig, PacingConfig, RetryConfig,
};
use crate::retry::RetryPolicy;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_pacing_config(&config.pacing)?;
    validate_oracle_config(&config.oracle)?;
    validate_converter_config(&config.converter)?;
    validate_retry_config(&config.retry)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_depth < 1 {
        return Err(ConfigError::Validation(format!(
            "max-depth must be >= 1, got {}",
            config.max_depth
        )));
    }

    if config.max_breadth < 1 {
        return Err(ConfigError::Validation(format!(
            "max-breadth must be >= 1, got {}",
            config.max_breadth
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    for seed in &config.seeds {
        validate_http_url("seed", seed)?;
    }

    Ok(())
}

/// Validates pacing ranges
fn validate_pacing_config(config: &PacingConfig) -> Result<(), ConfigError> {
    if config.dwell_min_ms > config.dwell_max_ms {
        return Err(ConfigError::Validation(format!(
            "dwell-min-ms ({}) must not exceed dwell-max-ms ({})",
            config.dwell_min_ms, config.dwell_max_ms
        )));
    }

    if config.min_clicks > config.max_clicks {
        return Err(ConfigError::Validation(format!(
            "min-clicks ({}) must not exceed max-clicks ({})",
            config.min_clicks, config.max_clicks
        )));
    }

    if config.click_pause_min_ms > config.click_pause_max_ms {
        return Err(ConfigError::Validation(format!(
            "click-pause-min-ms ({}) must not exceed click-pause-max-ms ({})",
            config.click_pause_min_ms, config.click_pause_max_ms
        )));
    }

    Ok(())
}

/// Validates oracle configuration
fn validate_oracle_config(config: &OracleConfig) -> Result<(), ConfigError> {
    validate_http_url("api-base-url", &config.api_base_url)?;

    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation("model cannot be empty".to_string()));
    }

    if config.api_key_env.trim().is_empty() {
        return Err(ConfigError::Validation(
            "api-key-env cannot be empty".to_string(),
        ));
    }

    if !(0.0..=2.0).contains(&config.temperature) {
        return Err(ConfigError::Validation(format!(
            "temperature must be between 0 and 2, got {}",
            config.temperature
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "oracle timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates converter configuration
fn validate_converter_config(config: &ConverterConfig) -> Result<(), ConfigError> {
    if !config.endpoint.contains("{url}") {
        return Err(ConfigError::Validation(format!(
            "converter endpoint must contain '{{url}}', got '{}'",
            config.endpoint
        )));
    }

    let sample = config.endpoint.replace("{url}", "https://example.com/");
    validate_http_url("converter endpoint", &sample)?;

    if config.chunk_size < 1000 {
        return Err(ConfigError::Validation(format!(
            "chunk-size must be >= 1000, got {}",
            config.chunk_size
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "converter timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates every retry policy
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    validate_retry_policy("navigation", &config.navigation)?;
    validate_retry_policy("conversion", &config.conversion)?;
    validate_retry_policy("classification", &config.classification)?;
    validate_retry_policy("extraction", &config.extraction)?;
    Ok(())
}

fn validate_retry_policy(name: &str, policy: &RetryPolicy) -> Result<(), ConfigError> {
    if policy.max_attempts < 1 || policy.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "retry.{}.max-attempts must be between 1 and 10, got {}",
            name, policy.max_attempts
        )));
    }

    if policy.backoff_factor < 1.0 {
        return Err(ConfigError::Validation(format!(
            "retry.{}.backoff-factor must be >= 1.0, got {}",
            name, policy.backoff_factor
        )));
    }

    Ok(())
}

/// Validates that `value` is an absolute http(s) URL with a host
fn validate_http_url(what: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", what, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            what, value
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' has no host",
            what, value
        )));
    }

    Ok(())
}
