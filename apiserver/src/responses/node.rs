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

use k8s_openapi::api::core::v1::Node;
use kubepod_resources::NodeList;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodesResponse {
    /// The name of the EKS cluster.
    pub cluster_name: String,
    /// The caller id of the request.
    pub caller_id: String,
    /// The node list, exactly as returned by the API server.
    #[schema(value_type = Object)]
    pub nodes: NodeList,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeResponse {
    pub cluster_name: String,
    pub caller_id: String,
    #[schema(value_type = Object)]
    pub node: Node,
}
