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

//! Bearer tokens for the EKS API server.
//!
//! A token is a presigned STS `GetCallerIdentity` URL whose signature also
//! covers the `x-k8s-aws-id` header naming the cluster. The API server replays
//! the URL against STS to learn the caller's identity.

use std::time::{Duration, SystemTime};

use aws_credential_types::Credentials;
use aws_sigv4::http_request::{sign, SignableBody, SignableRequest, SignatureLocation, SigningSettings};
use aws_sigv4::sign::v4;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use url::Url;

use crate::error::{Error, Result};

pub const TOKEN_PREFIX: &str = "k8s-aws-v1.";
pub const CLUSTER_ID_HEADER: &str = "x-k8s-aws-id";

/// How long the presigned URL itself stays valid.
const PRESIGN_EXPIRY: Duration = Duration::from_secs(60);
/// EKS accepts a token for 15 minutes; treat it as expired one minute earlier.
pub const TOKEN_LIFETIME: Duration = Duration::from_secs(14 * 60);

#[derive(Clone)]
pub struct BearerToken {
    pub token: String,
    pub expires_at: SystemTime,
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerToken").field("expires_at", &self.expires_at).finish_non_exhaustive()
    }
}

/// Mints a bearer token for `cluster` signed with `credentials` at time `now`.
pub fn generate_token(credentials: &Credentials, region: &str, cluster: &str, now: SystemTime) -> Result<BearerToken> {
    let url = presign(credentials, region, cluster, now)?;
    let token = format!("{}{}", TOKEN_PREFIX, URL_SAFE_NO_PAD.encode(url.as_str()));

    Ok(BearerToken { token, expires_at: now + TOKEN_LIFETIME })
}

fn presign(credentials: &Credentials, region: &str, cluster: &str, now: SystemTime) -> Result<Url> {
    let failed = |err: &dyn std::fmt::Display| Error::TokenGeneration(format!("cluster {cluster}: {err}"));

    let mut url = Url::parse(&format!("https://sts.{region}.amazonaws.com/")).map_err(|err| failed(&err))?;
    url.query_pairs_mut()
        .append_pair("Action", "GetCallerIdentity")
        .append_pair("Version", "2011-06-15");

    let mut settings = SigningSettings::default();
    settings.signature_location = SignatureLocation::QueryParams;
    settings.expires_in = Some(PRESIGN_EXPIRY);

    let identity = credentials.clone().into();
    let params = v4::SigningParams::builder()
        .identity(&identity)
        .region(region)
        .name("sts")
        .time(now)
        .settings(settings)
        .build()
        .map_err(|err| failed(&err))?
        .into();

    let headers = [(CLUSTER_ID_HEADER, cluster)];
    let request = SignableRequest::new("GET", url.as_str(), headers.into_iter(), SignableBody::Bytes(&[]))
        .map_err(|err| failed(&err))?;

    let (instructions, _signature) = sign(request, &params).map_err(|err| failed(&err))?.into_parts();
    let (_headers, query) = instructions.into_parts();

    {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in query {
            pairs.append_pair(name, &value);
        }
    }

    Ok(url)
}
