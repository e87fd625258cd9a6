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

use k8s_openapi::api::core::v1::Node;
use kubepod_resources::NodeList;

use super::{guard, Result};
use crate::context::Context;

pub struct NodeService;

impl NodeService {
    pub async fn list(ctx: Arc<Context>) -> Result<NodeList> {
        guard(&ctx, ctx.accessor.list_nodes()).await
    }

    pub async fn get(ctx: Arc<Context>, name: &str) -> Result<Node> {
        guard(&ctx, ctx.accessor.get_node(name)).await
    }
}
