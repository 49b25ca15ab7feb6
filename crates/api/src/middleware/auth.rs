use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::{
    error::{ApiError, AppError},
    state::{AppState, RequestId},
};

/// Gate bot-only endpoints behind the shared secret. Runs after the
/// request-id layer, so a 401 still carries a correlation id.
pub async fn bearer_auth(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .cloned()
        .unwrap_or_else(|| RequestId(String::new()));

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(parse_bearer)
        .ok_or_else(|| AppError::Unauthorized.with_request_id(&request_id.0))?;

    if !token_matches(token, &state.api_key) {
        return Err(AppError::Unauthorized.with_request_id(&request_id.0));
    }

    Ok(next.run(req).await)
}

fn parse_bearer(value: &HeaderValue) -> Option<&str> {
    let value = value.to_str().ok()?;
    let mut parts = value.splitn(2, ' ');
    let scheme = parts.next()?;
    let token = parts.next()?;
    if scheme != "Bearer" || token.is_empty() {
        return None;
    }
    Some(token)
}

fn token_matches(token: &str, expected: &str) -> bool {
    token.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(value: &str) -> HeaderValue {
        HeaderValue::from_str(value).unwrap()
    }

    #[test]
    fn test_parse_bearer_valid() {
        assert_eq!(parse_bearer(&header("Bearer secret-key")), Some("secret-key"));
    }

    #[test]
    fn test_parse_bearer_rejects_wrong_scheme() {
        assert_eq!(parse_bearer(&header("Basic secret-key")), None);
        assert_eq!(parse_bearer(&header("bearer secret-key")), None);
    }

    #[test]
    fn test_parse_bearer_rejects_empty_token() {
        assert_eq!(parse_bearer(&header("Bearer ")), None);
        assert_eq!(parse_bearer(&header("Bearer")), None);
    }

    #[test]
    fn test_parse_bearer_token_may_contain_spaces() {
        // splitn keeps everything after the first space as the token
        assert_eq!(parse_bearer(&header("Bearer a b")), Some("a b"));
    }

    #[test]
    fn test_token_matches() {
        assert!(token_matches("shared-secret", "shared-secret"));
        assert!(!token_matches("shared-secret", "other-secret"));
        assert!(!token_matches("", "shared-secret"));
        assert!(!token_matches("shared", "shared-secret"));
    }
}
