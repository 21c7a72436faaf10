use log::debug;

use crate::error::AppError;
use crate::models::{ApiErrorBody, ErrorDetails};

/// Map a non-2xx portal API response to an `AppError`.
///
/// The backend answers `{error, message?, details?, pending_approval?}`;
/// when the body is not in that shape the status code alone decides.
pub fn map_portal_error(status_code: u16, response_text: &str) -> AppError {
    debug!("Mapping portal error: status={}, response={}", status_code, response_text);

    let body = serde_json::from_str::<ApiErrorBody>(response_text).ok();
    let message = body
        .as_ref()
        .and_then(ApiErrorBody::best_message)
        .unwrap_or_else(|| fallback_message(status_code, response_text));

    match (status_code, body) {
        (400 | 422, Some(ApiErrorBody { details: Some(ErrorDetails::Fields(details)), .. }))
            if !details.is_empty() =>
        {
            AppError::ValidationFailed { message, details }
        }
        (400 | 422, _) => AppError::ValidationError(message),
        (401, _) => AppError::AuthError(message),
        (403, Some(ApiErrorBody { pending_approval: true, .. })) => AppError::PendingApproval(message),
        (403, _) => AppError::AccessDenied(message),
        (404, _) => AppError::NotFoundError(message),
        (429, _) => AppError::RateLimited(message),
        (500..=599, _) => AppError::ExternalServiceError(format!("Server error ({status_code}): {message}")),
        _ => AppError::ExternalServiceError(format!("Unexpected status {status_code}: {message}")),
    }
}

fn fallback_message(status_code: u16, response_text: &str) -> String {
    let trimmed = response_text.trim();
    // HTML error pages are noise for the user
    if trimmed.is_empty() || trimmed.starts_with('<') {
        match status_code {
            400 => "Bad request".to_string(),
            401 => "Authentication required".to_string(),
            403 => "Access denied".to_string(),
            404 => "Resource not found".to_string(),
            429 => "Too many requests".to_string(),
            _ => format!("HTTP {status_code}"),
        }
    } else {
        trimmed.to_string()
    }
}
