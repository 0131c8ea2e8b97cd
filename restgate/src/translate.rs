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

use crate::dispatch::RemoteEnvelope;
use crate::{EnvelopeError, Error, Result};
use axum::response::{IntoResponse, Response};
use http::header::CONTENT_TYPE;
use http::StatusCode;
use log::warn;
use restgate_core::hash::base64_decode;
use serde_json::Value;

/// Field of the success envelope that carries the base64 payload.
pub const CONTENT_FIELD: &str = "contentBase64";

/// Decoded tabular payload returned to the caller as `text/csv`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsvBody(pub String);

impl IntoResponse for CsvBody {
    fn into_response(self) -> Response {
        (StatusCode::OK, [(CONTENT_TYPE, "text/csv")], self.0).into_response()
    }
}

/// Turn a remote answer into the caller's result.
///
/// Only a 200 answer is decoded. Any other status is passed through with
/// the remote body as detail.
pub fn translate(envelope: RemoteEnvelope) -> Result<CsvBody> {
    if envelope.status != StatusCode::OK {
        let body = String::from_utf8_lossy(&envelope.body).into_owned();
        warn!("remote answered {}: {body}", envelope.status);
        return Err(Error::Upstream {
            status: envelope.status,
            body,
        });
    }

    Ok(CsvBody(decode_content(&envelope.body)?))
}

/// Extract and decode the `contentBase64` field of a JSON envelope.
///
/// A body that is valid JSON but not an object carrying the field is
/// reported as missing content.
pub fn decode_content(body: &[u8]) -> std::result::Result<String, EnvelopeError> {
    let value: Value = serde_json::from_slice(body)?;
    let content = match value.get(CONTENT_FIELD) {
        None => return Err(EnvelopeError::MissingContent),
        Some(Value::String(s)) => s,
        Some(_) => return Err(EnvelopeError::ContentNotString),
    };

    // Line-wrapped base64 is accepted; any other stray byte is not.
    let compact: String = content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let decoded =
        base64_decode(&compact).map_err(|e| EnvelopeError::InvalidBase64(e.message().to_string()))?;

    Ok(String::from_utf8(decoded)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use bytes::Bytes;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn envelope(status: StatusCode, body: &'static str) -> RemoteEnvelope {
        RemoteEnvelope {
            status,
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[test]
    fn test_translate_success() -> anyhow::Result<()> {
        let csv = translate(envelope(
            StatusCode::OK,
            r#"{"contentBase64":"YSxiCjEsMg=="}"#,
        ))?;

        assert_eq!(csv, CsvBody("a,b\n1,2".to_string()));
        Ok(())
    }

    #[test]
    fn test_translate_keeps_bytes_verbatim() -> anyhow::Result<()> {
        // "id;nome\r\n1;São Paulo\r\n" with a trailing CRLF.
        let csv = translate(envelope(
            StatusCode::OK,
            r#"{"contentBase64":"aWQ7bm9tZQ0KMTtTw6NvIFBhdWxvDQo=","extra":1}"#,
        ))?;

        assert_eq!(csv.0, "id;nome\r\n1;São Paulo\r\n");
        Ok(())
    }

    #[test]
    fn test_translate_empty_content() -> anyhow::Result<()> {
        let csv = translate(envelope(StatusCode::OK, r#"{"contentBase64":""}"#))?;

        assert_eq!(csv.0, "");
        Ok(())
    }

    #[test]
    fn test_translate_wrapped_base64() -> anyhow::Result<()> {
        let csv = translate(envelope(
            StatusCode::OK,
            r#"{"contentBase64":"YSxi\nCjEs\r\nMg=="}"#,
        ))?;

        assert_eq!(csv.0, "a,b\n1,2");
        Ok(())
    }

    #[test]
    fn test_translate_upstream_status() {
        let err = translate(envelope(StatusCode::UNAUTHORIZED, "INVALID_LOGIN_ATTEMPT")).unwrap_err();

        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.detail(), "INVALID_LOGIN_ATTEMPT");
    }

    #[test_case(StatusCode::NO_CONTENT; "no content")]
    #[test_case(StatusCode::CREATED; "created")]
    #[test_case(StatusCode::FOUND; "redirect")]
    fn test_translate_only_200_is_success(status: StatusCode) {
        let err = translate(envelope(status, r#"{"contentBase64":"YSxiCjEsMg=="}"#)).unwrap_err();

        assert_eq!(err.status(), status);
    }

    #[test]
    fn test_translate_missing_field() {
        let err = translate(envelope(StatusCode::OK, r#"{"foo":"bar"}"#)).unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.detail(), "missing contentBase64");
    }

    #[test_case("[1,2,3]"; "array")]
    #[test_case("\"contentBase64\""; "string")]
    #[test_case("null"; "null")]
    fn test_translate_non_object_is_missing(body: &'static str) {
        let err = translate(envelope(StatusCode::OK, body)).unwrap_err();

        assert!(matches!(err, Error::Envelope(EnvelopeError::MissingContent)), "{err:?}");
    }

    #[test]
    fn test_translate_invalid_json() {
        let err = translate(envelope(StatusCode::OK, "<html>oops</html>")).unwrap_err();

        assert!(matches!(err, Error::Envelope(EnvelopeError::InvalidJson(_))), "{err:?}");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_translate_content_not_string() {
        let err = translate(envelope(StatusCode::OK, r#"{"contentBase64":42}"#)).unwrap_err();

        assert!(matches!(err, Error::Envelope(EnvelopeError::ContentNotString)), "{err:?}");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_translate_invalid_base64() {
        let err = translate(envelope(StatusCode::OK, r#"{"contentBase64":"!!!"}"#)).unwrap_err();

        assert!(matches!(err, Error::Envelope(EnvelopeError::InvalidBase64(_))), "{err:?}");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_translate_invalid_utf8() {
        // base64 of [0xff, 0xfe].
        let err = translate(envelope(StatusCode::OK, r#"{"contentBase64":"//4="}"#)).unwrap_err();

        assert!(matches!(err, Error::Envelope(EnvelopeError::InvalidUtf8(_))), "{err:?}");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_csv_body_response() -> anyhow::Result<()> {
        let resp = CsvBody("a,b\n1,2".to_string()).into_response();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/csv");
        let body = to_bytes(resp.into_body(), usize::MAX).await?;
        assert_eq!(body, Bytes::from_static(b"a,b\n1,2"));

        Ok(())
    }
}
