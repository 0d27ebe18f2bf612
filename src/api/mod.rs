use crate::core::error::CompanionError;
use async_trait::async_trait;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use log::error;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

pub mod avatar;
pub mod chat;
pub mod journal;
pub mod moods;

const X_USER_ID: &str = "X-User-ID";

/// Every route of the service, without DI provider or middleware.
pub fn router() -> Router {
    Router::new()
        .merge(chat::router())
        .nest("/moods", moods::router())
        .nest("/journal", journal::router())
        .nest("/avatar", avatar::router())
}

/// The authenticated user, taken from the `X-User-ID` header.
#[derive(Debug)]
pub struct ExtractUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for ExtractUser
where
    S: Send + Sync,
{
    type Rejection = CompanionError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, CompanionError> {
        let user_id = parts
            .headers
            .get(X_USER_ID)
            .ok_or(CompanionError::AuthRequired)?
            .to_str()
            .map_err(|_| CompanionError::AuthRequired)?;

        Uuid::from_str(user_id)
            .map(ExtractUser)
            .map_err(|_| CompanionError::AuthRequired)
    }
}

/// `Json<T>` whose rejection renders as a 400 `{error}` body.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = CompanionError;

    async fn from_request(req: Request, state: &S) -> Result<Self, CompanionError> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(value))
    }
}

/// `Query<T>` whose rejection renders as a 400 `{error}` body.
#[derive(Debug)]
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = CompanionError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, CompanionError> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(QueryParams(value))
    }
}

impl From<JsonRejection> for CompanionError {
    fn from(rejection: JsonRejection) -> Self {
        CompanionError::invalid(rejection.body_text())
    }
}

impl From<QueryRejection> for CompanionError {
    fn from(rejection: QueryRejection) -> Self {
        CompanionError::invalid(rejection.body_text())
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct ListQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl CompanionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CompanionError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            CompanionError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            CompanionError::QuotaExhausted => StatusCode::PAYMENT_REQUIRED,
            CompanionError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CompanionError::AuthRequired => StatusCode::UNAUTHORIZED,
            CompanionError::Upstream(_)
            | CompanionError::Persistence(_)
            | CompanionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the user. Storage and internal details stay in the log.
    pub fn public_message(&self) -> String {
        match self {
            CompanionError::Persistence(_) => {
                "Failed to save or load your data. Please try again.".to_owned()
            }
            CompanionError::Internal(_) => "Internal server error".to_owned(),
            other => other.to_string(),
        }
    }
}

pub fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorBody { error: message })).into_response()
}

impl IntoResponse for CompanionError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("request failed: {self}");
        }

        error_response(status, self.public_message())
    }
}
