//! Request extractors shared by the JSON handlers.

use axum::{
    extract::{FromRequest, FromRequestParts, OptionalFromRequest, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::User;
use crate::AppState;

/// JSON body whose rejections use the `validation_failed` error shape.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match <Json<T> as FromRequest<S>>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(AppError::Validation(rejection.body_text())),
        }
    }
}

impl<S, T> OptionalFromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        match <Json<T> as OptionalFromRequest<S>>::from_request(req, state).await {
            Ok(value) => Ok(value.map(|Json(value)| ApiJson(value))),
            Err(rejection) => Err(AppError::Validation(rejection.body_text())),
        }
    }
}

/// The authenticated caller, resolved from the session through the access guard.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(status, message)| {
                tracing::error!(%status, message, "Session layer missing from router");
                AppError::Upstream(message.to_string())
            })?;

        let user = state.access_guard.authenticate(&session).await?;
        Ok(CurrentUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct TtlBody {
        ttl_minutes: Option<i64>,
    }

    fn json_request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .expect("request builds")
    }

    #[tokio::test]
    async fn well_formed_body_is_extracted() {
        let ApiJson(body) = <ApiJson<TtlBody> as FromRequest<()>>::from_request(
            json_request(r#"{"ttl_minutes": 15}"#),
            &(),
        )
        .await
        .expect("body parses");

        assert_eq!(body.ttl_minutes, Some(15));
    }

    #[tokio::test]
    async fn malformed_body_is_validation_error() {
        let result = <ApiJson<TtlBody> as FromRequest<()>>::from_request(
            json_request(r#"{"ttl_minutes": "soon"}"#),
            &(),
        )
        .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn absent_optional_body_is_none() {
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::empty())
            .expect("request builds");

        let result =
            <ApiJson<TtlBody> as OptionalFromRequest<()>>::from_request(request, &()).await;

        assert!(matches!(result, Ok(None)));
    }
}
