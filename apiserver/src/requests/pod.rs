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

use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use super::{validate_label, validate_subdomain};

#[derive(Debug, Deserialize, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PodsQuery {
    /// Correlation id of the caller, echoed back in the response. Also
    /// accepted as `callerId` in a JSON body.
    #[validate(length(min = 1, max = 128))]
    pub caller_id: String,
    /// Only list pods of this namespace. All namespaces when absent.
    #[validate(custom(function = "validate_label"))]
    pub namespace: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PodQuery {
    /// Correlation id of the caller, echoed back in the response. Also
    /// accepted as `callerId` in a JSON body.
    #[validate(length(min = 1, max = 128))]
    pub caller_id: String,
    /// The namespace of the pod.
    #[validate(custom(function = "validate_label"))]
    pub namespace: String,
}

#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Path)]
pub struct PodPath {
    /// The name of pod
    #[validate(custom(function = "validate_subdomain"))]
    pub pod: String,
}

#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Path)]
pub struct NamespacePath {
    /// The namespace of the pods
    #[validate(custom(function = "validate_label"))]
    pub namespace: String,
}

#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Path)]
pub struct NamespacedPodPath {
    /// The namespace of the pod
    #[validate(custom(function = "validate_label"))]
    pub namespace: String,
    /// The name of pod
    #[validate(custom(function = "validate_subdomain"))]
    pub pod: String,
}
