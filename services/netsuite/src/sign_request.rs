// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::fmt::Write;

use async_trait::async_trait;
use http::header::AUTHORIZATION;
use http::request::Parts;
use http::HeaderValue;
use http::Method;
use log::debug;
use rand::RngCore;
use restgate_core::hash::base64_hmac_sha256;
use restgate_core::time::{format_unix_timestamp, now, DateTime};
use restgate_core::utils::Redact;
use restgate_core::{percent_encode, Context, Error, Result, SignRequest, SigningRequest};

use crate::constants::*;
use crate::Credential;

/// RequestSigner that implements NetSuite token based authentication,
/// an OAuth 1.0a variant signed with HMAC-SHA256.
///
/// - [OAuth 1.0a: Signing Requests](https://oauth.net/core/1.0a/#signing_process)
/// - [NetSuite: The Signature for Web Services and RESTlets](https://docs.oracle.com/en/cloud/saas/netsuite/ns-online-help/section_1534941295.html)
#[derive(Debug, Default)]
pub struct RequestSigner {
    time: Option<DateTime>,
    nonce: Option<String>,
}

impl RequestSigner {
    /// Create a new request signer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    #[cfg(test)]
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Specify the nonce.
    ///
    /// # Note
    ///
    /// A nonce must never be reused across requests.
    /// Only use this function for testing.
    #[cfg(test)]
    pub fn with_nonce(mut self, nonce: &str) -> Self {
        self.nonce = Some(nonce.to_string());
        self
    }
}

#[async_trait]
impl SignRequest for RequestSigner {
    type Credential = Credential;

    async fn sign_request(&self, _: &Context, req: &mut Parts, cred: &Credential) -> Result<()> {
        // Both values are taken right before signing and never shared between calls.
        let nonce = self.nonce.clone().unwrap_or_else(generate_nonce);
        let timestamp = format_unix_timestamp(self.time.unwrap_or_else(now));

        let mut signing_req = SigningRequest::build(req)?;
        if let Some((k, _)) = signing_req
            .query
            .iter()
            .find(|(k, _)| k.starts_with(OAUTH_PARAM_PREFIX))
        {
            return Err(Error::request_invalid(format!(
                "query parameter {k} collides with oauth protocol parameters"
            )));
        }

        let base_url = signing_req.base_url();
        let signature = signature(
            cred,
            &signing_req.method,
            &base_url,
            &signing_req.query,
            &nonce,
            &timestamp,
        );

        let mut value =
            HeaderValue::from_str(&authorization_header(cred, &nonce, &timestamp, &signature))?;
        value.set_sensitive(true);
        signing_req.headers.insert(AUTHORIZATION, value);

        signing_req.apply(req)
    }
}

/// Generate a fresh 32 hex characters nonce from the thread local CSPRNG.
pub fn generate_nonce() -> String {
    let mut buf = [0u8; NONCE_BYTES];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

/// Compute the base64 encoded HMAC-SHA256 signature for a request.
///
/// `query` holds the request's own parameters, not percent encoded. The
/// oauth protocol parameters are derived from `cred`, `nonce` and
/// `timestamp`. The result is a pure function of its inputs.
pub fn signature(
    cred: &Credential,
    method: &Method,
    base_url: &str,
    query: &[(String, String)],
    nonce: &str,
    timestamp: &str,
) -> String {
    let params = query
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .chain(oauth_params(cred, nonce, timestamp));
    let param_string = parameter_string(params);
    debug!("parameter string: {}", redact_credential(cred, &param_string));

    let string_to_sign = string_to_sign(method, base_url, &param_string);
    debug!("string to sign: {}", redact_credential(cred, &string_to_sign));

    base64_hmac_sha256(signing_key(cred).as_bytes(), string_to_sign.as_bytes())
}

/// Mask the consumer key and token id in `s` for logging.
///
/// Both values can appear raw, percent encoded once in the parameter string
/// or twice in the string to sign.
fn redact_credential(cred: &Credential, s: &str) -> String {
    let mut out = s.to_string();
    for secret in [&cred.consumer_key, &cred.token_id] {
        if secret.is_empty() {
            continue;
        }
        let masked = Redact::from(secret).to_string();
        let once = percent_encode(secret);
        let twice = percent_encode(&once);
        for form in [twice, once, secret.clone()] {
            out = out.replace(&form, &masked);
        }
    }
    out
}

/// The oauth protocol parameters that take part in the signature.
fn oauth_params<'a>(
    cred: &'a Credential,
    nonce: &'a str,
    timestamp: &'a str,
) -> [(&'static str, &'a str); 6] {
    [
        (OAUTH_CONSUMER_KEY, cred.consumer_key.as_str()),
        (OAUTH_TOKEN, cred.token_id.as_str()),
        (OAUTH_NONCE, nonce),
        (OAUTH_TIMESTAMP, timestamp),
        (OAUTH_SIGNATURE_METHOD, HMAC_SHA256),
        (OAUTH_VERSION, OAUTH_VERSION_1_0),
    ]
}

/// Build the normalized parameter string.
///
/// Every key and value is percent encoded on its own, pairs are sorted by
/// encoded key (stable, byte-wise) and joined as `k=v` with `&`.
pub fn parameter_string<'a>(params: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut encoded: Vec<(String, String)> = params
        .into_iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort_by(|a, b| a.0.cmp(&b.0));

    SigningRequest::query_to_string(encoded, "=", "&")
}

/// Construct the signature base string.
///
/// ## Format
///
/// ```text
/// METHOD + "&" + encode(base_url) + "&" + encode(parameter_string)
/// ```
pub fn string_to_sign(method: &Method, base_url: &str, param_string: &str) -> String {
    format!(
        "{}&{}&{}",
        method.as_str(),
        percent_encode(base_url),
        percent_encode(param_string)
    )
}

/// The HMAC key: `encode(consumer_secret) + "&" + encode(token_secret)`.
pub fn signing_key(cred: &Credential) -> String {
    format!(
        "{}&{}",
        percent_encode(&cred.consumer_secret),
        percent_encode(&cred.token_secret)
    )
}

/// Build the `Authorization` header value.
///
/// Field order is fixed; the remote re-sorts parameters on its side.
pub fn authorization_header(
    cred: &Credential,
    nonce: &str,
    timestamp: &str,
    signature: &str,
) -> String {
    let mut s = String::with_capacity(512);
    // Writing into a String never fails.
    let _ = write!(s, "OAuth realm=\"{}\", ", cred.account_id);
    let _ = write!(s, "{OAUTH_CONSUMER_KEY}=\"{}\", ", cred.consumer_key);
    let _ = write!(s, "{OAUTH_TOKEN}=\"{}\", ", cred.token_id);
    let _ = write!(s, "{OAUTH_NONCE}=\"{nonce}\", ");
    let _ = write!(s, "{OAUTH_TIMESTAMP}=\"{timestamp}\", ");
    let _ = write!(s, "{OAUTH_SIGNATURE_METHOD}=\"{HMAC_SHA256}\", ");
    let _ = write!(s, "{OAUTH_VERSION}=\"{OAUTH_VERSION_1_0}\", ");
    let _ = write!(s, "{OAUTH_SIGNATURE}=\"{}\"", percent_encode(signature));
    s
}
