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

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;

use crate::context::Context;
use crate::errors::ApiError;
use crate::extract::{ValidatedPath, ValidatedParams};
use crate::requests::pod::{NamespacePath, NamespacedPodPath, PodPath, PodQuery, PodsQuery};
use crate::requests::CallerQuery;
use crate::response::data;
use crate::responses::pod::{PodResponse, PodsResponse};
use crate::services::pod::PodService;

/// List pods, of one namespace or of all of them
#[utoipa::path(
    get, path = "/pods",
    params(PodsQuery),
    responses(
        (status = 200, description = "List pods successfully", body = PodsResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 500, description = "Cluster API failure", body = crate::errors::ErrorResponse),
    ),
    tag = "Pods"
)]
pub async fn list(
    State(ctx): State<Arc<Context>>,
    ValidatedParams(query): ValidatedParams<PodsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let pods = PodService::list(ctx.clone(), query.namespace.as_deref()).await?;

    Ok(data(PodsResponse {
        cluster_name: ctx.config.eks_cluster_name.clone(),
        caller_id: query.caller_id,
        pods,
    }))
}

/// Get a pod by name
#[utoipa::path(
    get, path = "/pods/{pod}",
    params(PodPath, PodQuery),
    responses(
        (status = 200, description = "Pod found successfully", body = PodResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Pod not found, when 404 answers are enabled", body = crate::errors::ErrorResponse),
        (status = 500, description = "Cluster API failure or pod not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Pods"
)]
pub async fn detail(
    State(ctx): State<Arc<Context>>,
    ValidatedPath(path): ValidatedPath<PodPath>,
    ValidatedParams(query): ValidatedParams<PodQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let pod = PodService::get(ctx.clone(), &path.pod, &query.namespace).await?;

    Ok(data(PodResponse {
        cluster_name: ctx.config.eks_cluster_name.clone(),
        caller_id: query.caller_id,
        pod,
    }))
}

/// List the pods of a namespace
#[utoipa::path(
    get, path = "/namespaces/{namespace}/pods",
    params(NamespacePath, CallerQuery),
    responses(
        (status = 200, description = "List pods successfully", body = PodsResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 500, description = "Cluster API failure", body = crate::errors::ErrorResponse),
    ),
    tag = "Pods"
)]
pub async fn namespaced_list(
    State(ctx): State<Arc<Context>>,
    ValidatedPath(path): ValidatedPath<NamespacePath>,
    ValidatedParams(query): ValidatedParams<CallerQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let pods = PodService::list(ctx.clone(), Some(&path.namespace)).await?;

    Ok(data(PodsResponse {
        cluster_name: ctx.config.eks_cluster_name.clone(),
        caller_id: query.caller_id,
        pods,
    }))
}

/// Get a pod of a namespace by name
#[utoipa::path(
    get, path = "/namespaces/{namespace}/pods/{pod}",
    params(NamespacedPodPath, CallerQuery),
    responses(
        (status = 200, description = "Pod found successfully", body = PodResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Pod not found, when 404 answers are enabled", body = crate::errors::ErrorResponse),
        (status = 500, description = "Cluster API failure or pod not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Pods"
)]
pub async fn namespaced_detail(
    State(ctx): State<Arc<Context>>,
    ValidatedPath(path): ValidatedPath<NamespacedPodPath>,
    ValidatedParams(query): ValidatedParams<CallerQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let pod = PodService::get(ctx.clone(), &path.pod, &path.namespace).await?;

    Ok(data(PodResponse {
        cluster_name: ctx.config.eks_cluster_name.clone(),
        caller_id: query.caller_id,
        pod,
    }))
}
