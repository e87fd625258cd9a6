// Copyright 2024 The Kubepod Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    RenderError(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InternalServerError(String),
}

impl ApiError {
    /// Maps an accessor failure. Missing resources answer 404 only when
    /// `not_found_status` is set, 500 otherwise.
    pub fn from_accessor(err: kubepod_resources::error::Error, not_found_status: bool) -> Self {
        if not_found_status && err.is_not_found() {
            Self::NotFound(err.to_string())
        } else {
            Self::InternalServerError(err.to_string())
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::RenderError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn status_text(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "Invalid request.",
            Self::RenderError(_) => "Error rendering response.",
            Self::NotFound(_) => "Resource not found.",
            Self::InternalServerError(_) => "Internal server error.",
        }
    }
}

/// The body of every failed request.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ErrorResponse {
    /// User-level status text.
    pub status: String,
    /// Application error code, equal to the HTTP status.
    pub code: u16,
    /// The underlying error message.
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        error!("{} - {}", status, self);

        let body = ErrorResponse {
            status: self.status_text().to_string(),
            code: status.as_u16(),
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
