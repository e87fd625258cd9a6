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
use crate::requests::node::NodePath;
use crate::requests::CallerQuery;
use crate::response::data;
use crate::responses::node::{NodeResponse, NodesResponse};
use crate::services::node::NodeService;

/// List all nodes of the cluster
#[utoipa::path(
    get, path = "/nodes",
    params(CallerQuery),
    responses(
        (status = 200, description = "List all nodes successfully", body = NodesResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 500, description = "Cluster API failure", body = crate::errors::ErrorResponse),
    ),
    tag = "Nodes"
)]
pub async fn list(
    State(ctx): State<Arc<Context>>,
    ValidatedParams(query): ValidatedParams<CallerQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let nodes = NodeService::list(ctx.clone()).await?;

    Ok(data(NodesResponse {
        cluster_name: ctx.config.eks_cluster_name.clone(),
        caller_id: query.caller_id,
        nodes,
    }))
}

/// Get a node by name
#[utoipa::path(
    get, path = "/nodes/{node}",
    params(NodePath, CallerQuery),
    responses(
        (status = 200, description = "Node found successfully", body = NodeResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Node not found, when 404 answers are enabled", body = crate::errors::ErrorResponse),
        (status = 500, description = "Cluster API failure or node not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Nodes"
)]
pub async fn detail(
    State(ctx): State<Arc<Context>>,
    ValidatedPath(path): ValidatedPath<NodePath>,
    ValidatedParams(query): ValidatedParams<CallerQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let node = NodeService::get(ctx.clone(), &path.node).await?;

    Ok(data(NodeResponse {
        cluster_name: ctx.config.eks_cluster_name.clone(),
        caller_id: query.caller_id,
        node,
    }))
}
