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

use std::collections::HashMap;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use validator::Validate;

use crate::errors::ApiError;

/// The only parameter also accepted in a JSON request body.
const CALLER_ID: &str = "callerId";

/// Request parameters, deserialized then validated. Any failure answers 400.
///
/// Parameters come from the query string. A `callerId` missing there is taken
/// from a JSON body such as `{"callerId": "c-1"}` when one is sent.
#[derive(Debug)]
pub struct ValidatedParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedParams<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<HashMap<String, String>>::try_from_uri(req.uri())
            .map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))?;
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))?;

        let mut params: Map<String, Value> = query.into_iter().map(|(key, value)| (key, Value::String(value))).collect();
        if !params.contains_key(CALLER_ID) {
            if let Some(caller_id) = caller_id_from_body(&body)? {
                params.insert(CALLER_ID.to_string(), caller_id);
            }
        }

        let value: T = serde_json::from_value(Value::Object(params))
            .map_err(|err| ApiError::InvalidRequest(format!("Failed to deserialize request parameters: {err}")))?;
        value.validate().map_err(|err| ApiError::InvalidRequest(err.to_string()))?;

        Ok(ValidatedParams(value))
    }
}

fn caller_id_from_body(body: &[u8]) -> Result<Option<Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(mut object)) => Ok(object.remove(CALLER_ID)),
        Ok(_) => Err(ApiError::InvalidRequest("request body must be a JSON object".into())),
        Err(err) => Err(ApiError::InvalidRequest(format!("request body is not valid JSON: {err}"))),
    }
}

/// Path parameters, deserialized then validated. Any failure answers 400.
#[derive(Debug)]
pub struct ValidatedPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))?;
        value.validate().map_err(|err| ApiError::InvalidRequest(err.to_string()))?;

        Ok(ValidatedPath(value))
    }
}
