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

use std::future::Future;

use tracing::warn;

use crate::context::Context;
use crate::errors::ApiError;

pub mod node;
pub mod pod;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Runs an accessor call under the request deadline and maps its failure.
async fn guard<T, F>(ctx: &Context, call: F) -> Result<T>
where
    F: Future<Output = kubepod_resources::error::Result<T>>,
{
    let timeout = ctx.config.request_timeout();

    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(ApiError::from_accessor(err, ctx.config.not_found_status)),
        Err(_) => {
            warn!("cluster call exceeded the {:?} deadline", timeout);
            Err(ApiError::InternalServerError(format!(
                "deadline of {}s exceeded while calling the cluster API",
                timeout.as_secs()
            )))
        }
    }
}
