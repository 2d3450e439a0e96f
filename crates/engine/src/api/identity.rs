//! Caller identity taken from the `x-user-id` header.
//!
//! The header carries a user UUID. Without it the caller is anonymous, which
//! is enough for public reads; mutating routes use [`RequiredUser`].

use axum::{extract::FromRequestParts, http::request::Parts};
use tablesmith_domain::UserId;
use uuid::Uuid;

use super::http::ApiError;
use crate::infrastructure::ports::Requester;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The caller, possibly anonymous.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Requester);

/// A caller that must be signed in; 401 otherwise.
#[derive(Debug, Clone, Copy)]
pub struct RequiredUser(pub UserId);

fn user_from_parts(parts: &Parts) -> Result<Option<UserId>, ApiError> {
    let Some(value) = parts.headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };
    let raw = value
        .to_str()
        .map_err(|_| ApiError::BadRequest("x-user-id must be a UUID".to_string()))?;
    let id = Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::BadRequest("x-user-id must be a UUID".to_string()))?;
    Ok(Some(UserId::from_uuid(id)))
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let requester = match user_from_parts(parts)? {
            Some(id) => Requester::User(id),
            None => Requester::Anonymous,
        };
        Ok(CurrentUser(requester))
    }
}

impl<S> FromRequestParts<S> for RequiredUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_from_parts(parts)?
            .map(RequiredUser)
            .ok_or(ApiError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    async fn whoami(CurrentUser(requester): CurrentUser) -> String {
        match requester.user_id() {
            Some(id) => id.to_string(),
            None => "anonymous".to_string(),
        }
    }

    async fn protected(RequiredUser(user): RequiredUser) -> String {
        user.to_string()
    }

    fn router() -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .route("/protected", get(protected))
    }

    async fn call(uri: &str, header: Option<&str>) -> (StatusCode, String) {
        let mut request = Request::builder().uri(uri);
        if let Some(value) = header {
            request = request.header(USER_ID_HEADER, value);
        }
        let response = router()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn missing_header_is_anonymous() {
        let (status, body) = call("/whoami", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
    }

    #[tokio::test]
    async fn header_becomes_user() {
        let id = Uuid::new_v4();
        let (status, body) = call("/protected", Some(&id.to_string())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, id.to_string());
    }

    #[tokio::test]
    async fn protected_route_needs_header() {
        let (status, _) = call("/protected", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_header_is_bad_request() {
        let (status, _) = call("/whoami", Some("gm-42")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
