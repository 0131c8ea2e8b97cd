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

use std::mem;
use std::str::FromStr;

use http::uri::Authority;
use http::uri::PathAndQuery;
use http::uri::Scheme;
use http::HeaderMap;
use http::Method;
use http::Uri;
use percent_encoding::utf8_percent_encode;
use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;

use crate::{Error, Result};

/// AsciiSet for [RFC 3986](https://www.rfc-editor.org/rfc/rfc3986#section-2.3) encoding.
///
/// - Encode every byte except the unreserved characters: 'A'-'Z', 'a'-'z', '0'-'9', '-', '.', '_', and '~'.
/// - No reserved character (`/`, `:`, `@`, ...) is exempted.
pub static UNRESERVED_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent encode input with [`UNRESERVED_ENCODE_SET`].
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, &UNRESERVED_ENCODE_SET).to_string()
}

/// Signing context for request.
#[derive(Debug)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: Method,
    /// HTTP scheme.
    pub scheme: Scheme,
    /// HTTP authority.
    pub authority: Authority,
    /// HTTP path.
    pub path: String,
    /// HTTP query parameters, percent decoded.
    pub query: Vec<(String, String)>,
    /// HTTP headers.
    pub headers: HeaderMap,
}

impl SigningRequest {
    /// Build a signing context from http::request::Parts.
    pub fn build(parts: &mut http::request::Parts) -> Result<Self> {
        let uri = mem::take(&mut parts.uri).into_parts();
        let paq = uri
            .path_and_query
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        Ok(SigningRequest {
            method: parts.method.clone(),
            scheme: uri.scheme.unwrap_or(Scheme::HTTP),
            authority: uri.authority.ok_or_else(|| {
                Error::request_invalid("request without authority is invalid for signing")
            })?,
            path: paq.path().to_string(),
            query: paq
                .query()
                .map(|v| {
                    form_urlencoded::parse(v.as_bytes())
                        .map(|(k, v)| (k.into_owned(), v.into_owned()))
                        .collect()
                })
                .unwrap_or_default(),

            // Take the headers out of the request to avoid copy.
            // We will return it back when apply the context.
            headers: mem::take(&mut parts.headers),
        })
    }

    /// Apply the signing context back to http::request::Parts.
    ///
    /// Query pairs are written back with [`UNRESERVED_ENCODE_SET`] so the
    /// wire form matches what was signed.
    pub fn apply(mut self, parts: &mut http::request::Parts) -> Result<()> {
        // Return headers back.
        mem::swap(&mut parts.headers, &mut self.headers);
        parts.method = self.method;
        parts.uri = {
            let mut uri_parts = mem::take(&mut parts.uri).into_parts();
            uri_parts.scheme = Some(self.scheme);
            uri_parts.authority = Some(self.authority);
            uri_parts.path_and_query = {
                let paq = if self.query.is_empty() {
                    self.path
                } else {
                    let query: Vec<(String, String)> = self
                        .query
                        .iter()
                        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
                        .collect();
                    format!("{}?{}", self.path, Self::query_to_string(query, "=", "&"))
                };

                Some(PathAndQuery::from_str(&paq)?)
            };
            Uri::from_parts(uri_parts)?
        };

        Ok(())
    }

    /// The request URL without query string: `scheme://authority/path`.
    pub fn base_url(&self) -> String {
        format!("{}://{}{}", self.scheme, self.authority, self.path)
    }

    /// Join query pairs in the given order.
    ///
    /// `sep` is always written, even for empty values.
    ///
    /// ```shell
    /// [(a, b), (c, "")] => "a=b&c="
    /// ```
    pub fn query_to_string(query: Vec<(String, String)>, sep: &str, join: &str) -> String {
        let mut s = String::with_capacity(16);

        for (idx, (k, v)) in query.into_iter().enumerate() {
            if idx != 0 {
                s.push_str(join);
            }

            s.push_str(&k);
            s.push_str(sep);
            s.push_str(&v);
        }

        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CONTENT_TYPE;
    use percent_encoding::percent_decode_str;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn test_percent_encode_reserved() {
        assert_eq!(percent_encode("a-b.c_d~e"), "a-b.c_d~e");
        assert_eq!(
            percent_encode("https://x.io/a b?c=d&e@f+g"),
            "https%3A%2F%2Fx.io%2Fa%20b%3Fc%3Dd%26e%40f%2Bg"
        );
        assert_eq!(percent_encode("ñ"), "%C3%B1");
    }

    #[test_case(""; "empty")]
    #[test_case("/:@&=+?#%"; "reserved")]
    #[test_case("a b"; "space")]
    #[test_case("~"; "tilde")]
    #[test_case("ñ São 🦀"; "multi byte")]
    fn test_percent_encode_round_trip(input: &str) {
        let encoded = percent_encode(input);
        assert!(encoded
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"-._~%".contains(&b)));

        let decoded = percent_decode_str(&encoded).decode_utf8().unwrap();
        assert_eq!(decoded, input);
    }

    #[test]
    fn test_build_and_apply() -> Result<()> {
        let (mut parts, _) = http::Request::get(
            "https://1234-sb1.restlets.api.netsuite.com/app/site/hosting/restlet.nl?script=2582&deploy=1&searchId=a%20b",
        )
        .header(CONTENT_TYPE, "application/json")
        .body(())?
        .into_parts();

        let req = SigningRequest::build(&mut parts)?;
        assert_eq!(
            req.base_url(),
            "https://1234-sb1.restlets.api.netsuite.com/app/site/hosting/restlet.nl"
        );
        assert_eq!(
            req.query,
            vec![
                ("script".to_string(), "2582".to_string()),
                ("deploy".to_string(), "1".to_string()),
                ("searchId".to_string(), "a b".to_string()),
            ]
        );
        assert_eq!(req.headers[CONTENT_TYPE], "application/json");
        assert!(parts.headers.is_empty());

        req.apply(&mut parts)?;
        assert_eq!(
            parts.uri.to_string(),
            "https://1234-sb1.restlets.api.netsuite.com/app/site/hosting/restlet.nl?script=2582&deploy=1&searchId=a%20b"
        );
        assert_eq!(parts.headers[CONTENT_TYPE], "application/json");
        Ok(())
    }

    #[test]
    fn test_build_without_authority() {
        let (mut parts, _) = http::Request::get("/relative")
            .body(())
            .expect("request must be valid")
            .into_parts();
        assert!(SigningRequest::build(&mut parts).is_err());
    }

    #[test]
    fn test_query_to_string() {
        let query = vec![
            ("a".to_string(), "b".to_string()),
            ("c".to_string(), String::new()),
        ];
        assert_eq!(SigningRequest::query_to_string(query, "=", "&"), "a=b&c=");
    }
}
