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

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::string::FromUtf8Error;
use std::time::Duration;
use thiserror::Error;

/// Result that carries a gateway [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Every way a gateway request can fail.
///
/// Each variant maps to exactly one HTTP status, see [`Error::status`].
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded. Only raised at startup.
    #[error(transparent)]
    Config(restgate_core::Error),
    /// The inbound request is missing something the gateway needs.
    #[error("{0}")]
    BadRequest(String),
    /// The alias has no entry in the registry.
    #[error("alias '{0}' not registered")]
    AliasNotFound(String),
    /// Direct id access was requested but is turned off.
    #[error("direct access disabled")]
    DirectAccessDisabled,
    /// The outbound request could not be signed.
    #[error("failed to sign request: {}", .0.message())]
    Signing(#[source] restgate_core::Error),
    /// The remote answered with a non-success status.
    #[error("{body}")]
    Upstream { status: StatusCode, body: String },
    /// The remote could not be reached.
    #[error("upstream unreachable: {}", .0.message())]
    Transport(#[source] restgate_core::Error),
    /// The remote did not answer within the configured deadline.
    #[error("upstream timed out after {}s", .0.as_secs())]
    UpstreamTimeout(Duration),
    /// The remote answered 200 but the envelope could not be decoded.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}

/// Failures while unpacking a successful remote response.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("invalid json in upstream response: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("missing contentBase64")]
    MissingContent,
    #[error("contentBase64 is not a string")]
    ContentNotString,
    #[error("invalid contentBase64: {0}")]
    InvalidBase64(String),
    #[error("decoded content is not valid utf-8: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),
}

impl EnvelopeError {
    /// HTTP status reported for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            EnvelopeError::MissingContent => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Error {
    /// HTTP status reported to the caller for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Config(_) | Error::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::AliasNotFound(_) | Error::DirectAccessDisabled => StatusCode::NOT_FOUND,
            Error::Upstream { status, .. } => *status,
            Error::Transport(_) => StatusCode::BAD_GATEWAY,
            Error::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::Envelope(e) => e.status(),
        }
    }

    /// Human readable detail returned in the response body.
    pub fn detail(&self) -> String {
        self.to_string()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.detail() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(Error::BadRequest("missing query parameter: alias".into()), StatusCode::BAD_REQUEST; "bad request")]
    #[test_case(Error::AliasNotFound("nope".into()), StatusCode::NOT_FOUND; "alias not found")]
    #[test_case(Error::DirectAccessDisabled, StatusCode::NOT_FOUND; "direct disabled")]
    #[test_case(Error::Signing(restgate_core::Error::request_invalid("bad")), StatusCode::INTERNAL_SERVER_ERROR; "signing")]
    #[test_case(Error::Transport(restgate_core::Error::unexpected("refused")), StatusCode::BAD_GATEWAY; "transport")]
    #[test_case(Error::UpstreamTimeout(Duration::from_secs(30)), StatusCode::GATEWAY_TIMEOUT; "timeout")]
    #[test_case(Error::Upstream { status: StatusCode::FORBIDDEN, body: "denied".into() }, StatusCode::FORBIDDEN; "upstream status")]
    #[test_case(EnvelopeError::MissingContent.into(), StatusCode::BAD_REQUEST; "missing content")]
    #[test_case(EnvelopeError::ContentNotString.into(), StatusCode::INTERNAL_SERVER_ERROR; "content not string")]
    #[test_case(EnvelopeError::InvalidBase64("bad".into()).into(), StatusCode::INTERNAL_SERVER_ERROR; "invalid base64")]
    fn test_status(err: Error, expected: StatusCode) {
        assert_eq!(err.status(), expected);
    }

    #[test]
    fn test_detail_messages() {
        assert_eq!(
            Error::AliasNotFound("pedidos".into()).detail(),
            "alias 'pedidos' not registered"
        );
        assert_eq!(
            Error::UpstreamTimeout(Duration::from_secs(30)).detail(),
            "upstream timed out after 30s"
        );
        assert_eq!(
            Error::Upstream {
                status: StatusCode::UNAUTHORIZED,
                body: r#"{"error":"INVALID_LOGIN"}"#.into()
            }
            .detail(),
            r#"{"error":"INVALID_LOGIN"}"#
        );
        assert_eq!(
            Error::from(EnvelopeError::MissingContent).detail(),
            "missing contentBase64"
        );
        assert_eq!(
            Error::Config(restgate_core::Error::config_invalid("timeout_secs must be greater than zero"))
                .detail(),
            "invalid configuration: timeout_secs must be greater than zero"
        );
        assert_eq!(
            Error::Transport(restgate_core::Error::unexpected(
                "failed to connect to remote: connection refused"
            ))
            .detail(),
            "upstream unreachable: failed to connect to remote: connection refused"
        );
        assert_eq!(
            Error::Signing(restgate_core::Error::request_invalid(
                "query parameter oauth_x collides with oauth protocol parameters"
            ))
            .detail(),
            "failed to sign request: query parameter oauth_x collides with oauth protocol parameters"
        );
    }

    #[tokio::test]
    async fn test_into_response_body() -> anyhow::Result<()> {
        let resp = Error::AliasNotFound("pedidos".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            resp.headers()[http::header::CONTENT_TYPE],
            "application/json"
        );

        let body = to_bytes(resp.into_body(), usize::MAX).await?;
        let value: serde_json::Value = serde_json::from_slice(&body)?;
        assert_eq!(value, json!({ "detail": "alias 'pedidos' not registered" }));

        Ok(())
    }
}
