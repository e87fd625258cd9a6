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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{kind} {name} not found")]
    NotFound { kind: &'static str, name: String },

    #[error("Kube Error: {0}")]
    KubeError(#[source] kube::Error),

    #[error("Cluster Error: {0}")]
    ClusterError(#[source] kubepod_cluster::Error),
}

impl Error {
    /// Classifies a failed call on the resource `kind`/`name`: a 404 from the
    /// API server becomes [`Error::NotFound`], anything else is kept as is.
    pub fn from_kube(kind: &'static str, name: &str, err: kube::Error) -> Self {
        match &err {
            kube::Error::Api(response) if response.code == 404 => Error::NotFound { kind, name: name.to_string() },
            _ => Error::KubeError(err),
        }
    }

    /// Whether the API server rejected our bearer token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::KubeError(kube::Error::Api(response)) if response.code == 401)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
