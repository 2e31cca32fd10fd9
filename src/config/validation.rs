//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, thresholds > 0)
//! - Validate bind addresses
//! - The inbound request deadline must cover the upstream deadline
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Backend URIs are checked again (and fatally) when the pool is built

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least one backend is required")]
    NoBackends,

    #[error("backend address must not be empty (backend #{0})")]
    EmptyBackendAddress(usize),

    #[error("{field}: invalid bind address '{value}'")]
    InvalidBindAddress { field: &'static str, value: String },

    #[error("admin.bind_address must differ from listener.bind_address")]
    AdminAddressConflict,

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("health_check.path must start with '/' (got '{0}')")]
    InvalidHealthPath(String),

    #[error("timeouts.request_secs ({request}) must not be shorter than timeouts.upstream_secs ({upstream})")]
    RequestTimeoutTooShort { request: u64, upstream: u64 },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }
    for (i, backend) in config.backends.iter().enumerate() {
        if backend.address.trim().is_empty() {
            errors.push(ValidationError::EmptyBackendAddress(i));
        }
    }

    check_bind(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.admin.enabled {
        check_bind(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.bind_address == config.listener.bind_address {
            errors.push(ValidationError::AdminAddressConflict);
        }
    }
    if config.observability.metrics_enabled {
        check_bind(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    let health = &config.health_check;
    if health.enabled {
        if health.interval_secs == 0 {
            errors.push(ValidationError::Zero("health_check.interval_secs"));
        }
        if health.timeout_secs == 0 {
            errors.push(ValidationError::Zero("health_check.timeout_secs"));
        }
        if health.unhealthy_threshold == 0 {
            errors.push(ValidationError::Zero("health_check.unhealthy_threshold"));
        }
        if health.healthy_threshold == 0 {
            errors.push(ValidationError::Zero("health_check.healthy_threshold"));
        }
        if !health.path.starts_with('/') {
            errors.push(ValidationError::InvalidHealthPath(health.path.clone()));
        }
    }

    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.upstream_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    } else if config.timeouts.request_secs < config.timeouts.upstream_secs {
        errors.push(ValidationError::RequestTimeoutTooShort {
            request: config.timeouts.request_secs,
            upstream: config.timeouts.upstream_secs,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_bind(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::BackendConfig;

    fn valid() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.backends.push(BackendConfig::new("http://127.0.0.1:3001"));
        config
    }

    #[test]
    fn test_default_with_backend_is_valid() {
        assert_eq!(validate_config(&valid()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ProxyConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.upstream_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::NoBackends));
        assert!(errors.contains(&ValidationError::Zero("timeouts.upstream_secs")));
    }

    #[test]
    fn test_health_settings_checked_only_when_enabled() {
        let mut config = valid();
        config.health_check.interval_secs = 0;
        config.health_check.path = "health".into();
        assert!(validate_config(&config).is_ok());

        config.health_check.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::Zero("health_check.interval_secs")));
        assert!(errors.contains(&ValidationError::InvalidHealthPath("health".into())));
    }

    #[test]
    fn test_admin_must_not_share_listener_address() {
        let mut config = valid();
        config.admin.enabled = true;
        config.admin.bind_address = config.listener.bind_address.clone();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::AdminAddressConflict]);
    }

    #[test]
    fn test_request_timeout_must_cover_upstream_timeout() {
        let mut config = valid();
        config.timeouts.upstream_secs = 30;
        config.timeouts.request_secs = 10;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::RequestTimeoutTooShort {
                request: 10,
                upstream: 30
            }]
        );

        config.timeouts.request_secs = 30;
        assert!(validate_config(&config).is_ok());
    }
}
