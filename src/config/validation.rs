//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check app context paths are routable and unique
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::http::{RequestContext, DEFAULT_FAVICON_PATH};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("app '{name}' has invalid context path '{context_path}'")]
    InvalidContextPath { name: String, context_path: String },

    #[error("app '{name}' uses the reserved path '{context_path}'")]
    ReservedContextPath { name: String, context_path: String },

    #[error("context path '{0}' is used by more than one app")]
    DuplicateContextPath(String),

    #[error("app name '{0}' is used more than once")]
    DuplicateAppName(String),
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }

    let mut paths = HashSet::new();
    let mut names = HashSet::new();
    for app in &config.apps {
        if app.context_path == DEFAULT_FAVICON_PATH {
            errors.push(ValidationError::ReservedContextPath {
                name: app.name.clone(),
                context_path: app.context_path.clone(),
            });
        } else if !is_context_path(&app.context_path) {
            errors.push(ValidationError::InvalidContextPath {
                name: app.name.clone(),
                context_path: app.context_path.clone(),
            });
        }
        if !paths.insert(app.context_path.as_str()) {
            errors.push(ValidationError::DuplicateContextPath(app.context_path.clone()));
        }
        if !names.insert(app.name.as_str()) {
            errors.push(ValidationError::DuplicateAppName(app.name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// A context path is routable when a request for it resolves back to itself.
fn is_context_path(path: &str) -> bool {
    let request = RequestContext::new(path);
    request.is_valid() && request.context_path() == path
}
