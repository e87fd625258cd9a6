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

use std::borrow::Cow;

use serde::Deserialize;
use utoipa::IntoParams;
use validator::{Validate, ValidationError};

pub mod node;
pub mod pod;

const DNS1123_LABEL_MAX_LENGTH: usize = 63;
const DNS1123_SUBDOMAIN_MAX_LENGTH: usize = 253;

/// Query parameters shared by every endpoint.
#[derive(Debug, Deserialize, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CallerQuery {
    /// Correlation id of the caller, echoed back in the response. Also
    /// accepted as `callerId` in a JSON body.
    #[validate(length(min = 1, max = 128))]
    pub caller_id: String,
}

/// Accepts a DNS-1123 label: lowercase alphanumerics and '-', starting and
/// ending with an alphanumeric, at most 63 characters.
pub fn validate_label(value: &str) -> Result<(), ValidationError> {
    if is_label(value) {
        Ok(())
    } else {
        Err(invalid("dns1123_label", format!("{value:?} is not a valid DNS-1123 label")))
    }
}

/// Accepts a DNS-1123 subdomain: dot separated labels, at most 253 characters.
pub fn validate_subdomain(value: &str) -> Result<(), ValidationError> {
    if value.len() <= DNS1123_SUBDOMAIN_MAX_LENGTH && value.split('.').all(is_label) {
        Ok(())
    } else {
        Err(invalid("dns1123_subdomain", format!("{value:?} is not a valid DNS-1123 subdomain")))
    }
}

fn is_label(value: &str) -> bool {
    let alphanumeric = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();

    !value.is_empty()
        && value.len() <= DNS1123_LABEL_MAX_LENGTH
        && value.chars().all(|c| alphanumeric(c) || c == '-')
        && value.starts_with(alphanumeric)
        && value.ends_with(alphanumeric)
}

fn invalid(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::from(message));
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert!(validate_label("default").is_ok());
        assert!(validate_label("kube-system").is_ok());
        assert!(validate_label("a").is_ok());
        assert!(validate_label(&"a".repeat(63)).is_ok());

        assert!(validate_label("").is_err());
        assert!(validate_label("Default").is_err());
        assert!(validate_label("-default").is_err());
        assert!(validate_label("default-").is_err());
        assert!(validate_label("kube.system").is_err());
        assert!(validate_label(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_subdomains() {
        assert!(validate_subdomain("ip-10-0-1-23.ec2.internal").is_ok());
        assert!(validate_subdomain("web-7d4b9c6f5-x2x9z").is_ok());

        assert!(validate_subdomain("").is_err());
        assert!(validate_subdomain("ip-10-0-1-23..internal").is_err());
        assert!(validate_subdomain(".internal").is_err());
        assert!(validate_subdomain("web_1").is_err());
        assert!(validate_subdomain("../etc").is_err());
        assert!(validate_subdomain(&vec!["a".repeat(63); 4].join(".")).is_err());
    }
}
