use reqwest::RequestBuilder;
use reqwest::header::{AUTHORIZATION, HeaderValue};

use crate::constants::AUTH_SCHEME;
use crate::error::{AppError, AppResult};

/// `Authorization` header value for the backend's token scheme.
pub fn authorization_value(token: &str) -> AppResult<HeaderValue> {
    if token.trim().is_empty() {
        return Err(AppError::AuthError("No authentication token available".to_string()));
    }
    let mut value = HeaderValue::from_str(&format!("{AUTH_SCHEME} {token}"))
        .map_err(|e| AppError::InvalidArgument(format!("Token is not a valid header value: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Applies the authorization header to a request.
pub fn apply_auth_headers(builder: RequestBuilder, token: &str) -> AppResult<RequestBuilder> {
    Ok(builder.header(AUTHORIZATION, authorization_value(token)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_scheme() {
        let value = authorization_value("9944b09199c62bcf9418ad846dd0e4bbdfc6ee4b").unwrap();
        assert_eq!(value.to_str().unwrap(), "Token 9944b09199c62bcf9418ad846dd0e4bbdfc6ee4b");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_rejects_unusable_tokens() {
        assert!(matches!(authorization_value(" "), Err(AppError::AuthError(_))));
        assert!(matches!(
            authorization_value("line\nbreak"),
            Err(AppError::InvalidArgument(_))
        ));
    }
}
