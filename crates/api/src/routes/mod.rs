//! API route definitions.

use axum::Router;

use auditflow_core::workflow::DecisionAction;
use auditflow_shared::AppError;

use crate::{AppState, error::ApiError};

pub mod business_trips;
pub mod health;
pub mod work_papers;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(work_papers::routes())
        .merge(business_trips::routes())
}

/// Trims a required text field, rejecting blank input.
pub(crate) fn required(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Parses a decision action from its wire name.
pub(crate) fn parse_action(action: &str) -> Result<DecisionAction, ApiError> {
    DecisionAction::parse(action).ok_or_else(|| {
        ApiError::bad_request("invalid_action", format!("Unknown action '{action}'"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_trims_and_rejects_blank() {
        assert_eq!(required("  Cash count ", "title").unwrap(), "Cash count");
        assert!(matches!(
            required("   ", "title"),
            Err(AppError::Validation(msg)) if msg == "title is required"
        ));
    }

    #[test]
    fn test_parse_action() {
        assert_eq!(parse_action("sign").unwrap(), DecisionAction::Sign);
        assert_eq!(parse_action("Reject").unwrap(), DecisionAction::Reject);
        let err = parse_action("approve-ish").unwrap_err();
        assert_eq!(err.code(), "invalid_action");
    }
}
