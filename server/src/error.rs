// error.rs
use log::debug;
use rocket::http::Status;
use rocket::response::{self, status, Responder};
use rocket::serde::json::serde_json::error::Category;
use rocket::serde::json::{Error as JsonError, Json};
use rocket::serde::Serialize;
use rocket::Request;
use thiserror::Error;

use crate::mirror::MirrorError;
use crate::store::StoreError;

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ErrorBody {
    pub detail: String,
}

impl ErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Errors surfaced to HTTP clients as `{"detail": ...}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Item not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Malformed(String),
    #[error("Mirror unavailable: {0}")]
    MirrorUnavailable(#[from] MirrorError),
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::NotFound => Status::NotFound,
            ApiError::Validation(_) => Status::UnprocessableEntity,
            ApiError::Malformed(_) => Status::BadRequest,
            ApiError::MirrorUnavailable(_) => Status::ServiceUnavailable,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => ApiError::NotFound,
            e @ StoreError::IdOutOfRange(_) => ApiError::Validation(e.to_string()),
        }
    }
}

// Well-formed JSON of the wrong shape (missing `name`, wrong types) is a
// validation error; anything that is not JSON at all is malformed.
impl<'a> From<JsonError<'a>> for ApiError {
    fn from(e: JsonError<'a>) -> Self {
        match e {
            JsonError::Parse(_, e) if e.classify() == Category::Data => {
                ApiError::Validation(e.to_string())
            }
            JsonError::Parse(_, e) => ApiError::Malformed(e.to_string()),
            JsonError::Io(e) => ApiError::Malformed(e.to_string()),
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        debug!("{} {} -> {}: {}", req.method(), req.uri(), status, self);
        status::Custom(status, Json(ErrorBody::new(self.to_string()))).respond_to(req)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Unwraps a JSON data guard, mapping parse failures to `ApiError`.
pub fn parse_body<T>(body: Result<Json<T>, JsonError<'_>>) -> ApiResult<T> {
    body.map(|Json(value)| value).map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::NewRecord;
    use rocket::serde::json::serde_json;

    fn parse(input: &str) -> ApiError {
        let e = serde_json::from_str::<NewRecord>(input).unwrap_err();
        ApiError::from(JsonError::Parse(input, e))
    }

    #[test]
    fn test_missing_name_is_validation() {
        let e = parse(r#"{"value": 1}"#);
        assert_eq!(e.status(), Status::UnprocessableEntity);
        assert!(e.to_string().contains("name"));
    }

    #[test]
    fn test_syntax_error_is_malformed() {
        assert_eq!(parse(r#"{"name": "#).status(), Status::BadRequest);
        assert_eq!(parse("not json").status(), Status::BadRequest);
    }

    #[test]
    fn test_not_found() {
        let e = ApiError::from(StoreError::NotFound(3));
        assert_eq!(e.status(), Status::NotFound);
        assert_eq!(e.to_string(), "Item not found");
    }

    #[test]
    fn test_id_out_of_range_is_validation() {
        let e = ApiError::from(StoreError::IdOutOfRange(i64::MAX));
        assert_eq!(e.status(), Status::UnprocessableEntity);
    }
}
