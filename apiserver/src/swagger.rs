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

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{errors, handlers, responses};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::node::list,
        handlers::node::detail,
        //
        handlers::pod::list,
        handlers::pod::detail,
        handlers::pod::namespaced_list,
        handlers::pod::namespaced_detail,
    ),
    components(
        schemas(
            responses::node::NodesResponse,
            responses::node::NodeResponse,
            responses::pod::PodsResponse,
            responses::pod::PodResponse,
            errors::ErrorResponse,
        )
    ),
    tags(
        (name = "Nodes", description = "The Nodes Service Handlers"),
        (name = "Pods", description = "The Pods Service Handlers"),
    ),
)]
struct ApiDoc;

pub fn build() -> SwaggerUi {
    SwaggerUi::new("/swagger").url("/openapi.json", ApiDoc::openapi())
}
