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

use crate::{AliasConfig, Error, Result};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Request, StatusCode};
use log::{debug, info};
use restgate_core::{percent_encode, Signer};
use restgate_netsuite::Credential;
use std::time::Duration;

/// Query parameter carrying the script id.
pub const QUERY_SCRIPT: &str = "script";
/// Query parameter carrying the deployment id.
pub const QUERY_DEPLOY: &str = "deploy";
/// Query parameter carrying the saved search id.
pub const QUERY_SEARCH_ID: &str = "searchId";

/// Raw answer of the remote, alive for one request only.
#[derive(Clone, Debug)]
pub struct RemoteEnvelope {
    /// HTTP status returned by the remote.
    pub status: StatusCode,
    /// Unparsed response body.
    pub body: Bytes,
}

/// Sends signed GET requests to the RESTlet endpoint.
///
/// Each call performs exactly one request with no retry. The whole exchange
/// is bounded by `timeout`.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    signer: Signer<Credential>,
    restlet_url: String,
    timeout: Duration,
}

impl Dispatcher {
    /// Create a dispatcher for `restlet_url`.
    ///
    /// `restlet_url` must not carry a query string.
    pub fn new(signer: Signer<Credential>, restlet_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            signer,
            restlet_url: restlet_url.into(),
            timeout,
        }
    }

    /// The configured deadline for one remote call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sign and send the request for `target`.
    ///
    /// Every HTTP status the remote answers with is returned as an envelope.
    /// Only failures to obtain an answer are errors.
    pub async fn dispatch(&self, target: &AliasConfig) -> Result<RemoteEnvelope> {
        let req = self.build_request(target)?;
        let (mut parts, body) = req.into_parts();
        self.signer.sign(&mut parts).await.map_err(Error::Signing)?;
        let req = Request::from_parts(parts, body);

        info!(
            "dispatching alias '{}' to script={} deploy={} searchId={}",
            target.alias, target.script, target.deploy, target.search_id
        );
        let resp = tokio::time::timeout(self.timeout, self.signer.context().http_send(req))
            .await
            .map_err(|_| Error::UpstreamTimeout(self.timeout))?
            .map_err(Error::Transport)?;

        let (parts, body) = resp.into_parts();
        debug!(
            "remote answered alias '{}' with {} ({} bytes)",
            target.alias,
            parts.status,
            body.len()
        );
        Ok(RemoteEnvelope {
            status: parts.status,
            body,
        })
    }

    fn build_request(&self, target: &AliasConfig) -> Result<Request<Bytes>> {
        let uri = format!(
            "{}?{QUERY_SCRIPT}={}&{QUERY_DEPLOY}={}&{QUERY_SEARCH_ID}={}",
            self.restlet_url,
            percent_encode(&target.script),
            percent_encode(&target.deploy),
            percent_encode(&target.search_id),
        );

        Request::get(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Bytes::new())
            .map_err(|e| Error::Signing(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use http::header::AUTHORIZATION;
    use http::Response;
    use pretty_assertions::assert_eq;
    use restgate_core::{Context, HttpSend};
    use restgate_netsuite::RequestSigner;
    use std::sync::{Arc, Mutex};

    const RESTLET: &str = "https://1234567-sb1.restlets.api.netsuite.com/app/site/hosting/restlet.nl";

    #[derive(Debug)]
    enum Reply {
        Status(StatusCode, &'static str),
        Fail,
        Hang,
    }

    #[derive(Debug, Clone)]
    struct MockRemote {
        reply: Arc<Reply>,
        seen: Arc<Mutex<Vec<Request<Bytes>>>>,
    }

    impl MockRemote {
        fn new(reply: Reply) -> Self {
            Self {
                reply: Arc::new(reply),
                seen: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl HttpSend for MockRemote {
        async fn http_send(&self, req: Request<Bytes>) -> restgate_core::Result<Response<Bytes>> {
            self.seen.lock().unwrap().push(req);
            match self.reply.as_ref() {
                Reply::Status(status, body) => Ok(Response::builder()
                    .status(*status)
                    .body(Bytes::from_static(body.as_bytes()))?),
                Reply::Fail => Err(restgate_core::Error::unexpected(
                    "failed to connect to remote: connection refused",
                )),
                Reply::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    unreachable!("the dispatcher deadline must fire first")
                }
            }
        }
    }

    fn dispatcher(remote: &MockRemote) -> Dispatcher {
        let ctx = Context::new().with_http_send(remote.clone());
        let cred = Credential::new("1234567_SB1", "ck", "cs", "tid", "ts");
        let signer = Signer::new(ctx, cred, RequestSigner::new());
        Dispatcher::new(signer, RESTLET, Duration::from_secs(30))
    }

    #[tokio::test]
    async fn test_dispatch_sends_signed_get() -> anyhow::Result<()> {
        let remote = MockRemote::new(Reply::Status(StatusCode::OK, "{}"));
        let target = AliasConfig::new("clientes", "2582", "1", "3575");

        let envelope = dispatcher(&remote).dispatch(&target).await?;
        assert_eq!(envelope.status, StatusCode::OK);
        assert_eq!(envelope.body, Bytes::from_static(b"{}"));

        let seen = remote.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let req = &seen[0];
        assert_eq!(req.method(), http::Method::GET);
        assert_eq!(
            req.uri().to_string(),
            format!("{RESTLET}?script=2582&deploy=1&searchId=3575")
        );
        assert_eq!(req.headers()[CONTENT_TYPE], "application/json");
        let auth = req.headers()[AUTHORIZATION].to_str()?;
        assert!(
            auth.starts_with(r#"OAuth realm="1234567_SB1", oauth_consumer_key="ck", "#),
            "{auth}"
        );
        assert!(req.body().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_dispatch_encodes_ids() -> anyhow::Result<()> {
        let remote = MockRemote::new(Reply::Status(StatusCode::OK, "{}"));
        let target = AliasConfig::new("raro", "25 82", "1/2", "ñ");

        dispatcher(&remote).dispatch(&target).await?;

        let seen = remote.seen.lock().unwrap();
        assert_eq!(
            seen[0].uri().query(),
            Some("script=25%2082&deploy=1%2F2&searchId=%C3%B1")
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_dispatch_returns_non_success_status() -> anyhow::Result<()> {
        let remote = MockRemote::new(Reply::Status(StatusCode::UNAUTHORIZED, "INVALID_LOGIN"));
        let target = AliasConfig::new("clientes", "2582", "1", "3575");

        let envelope = dispatcher(&remote).dispatch(&target).await?;
        assert_eq!(envelope.status, StatusCode::UNAUTHORIZED);
        assert_eq!(envelope.body, Bytes::from_static(b"INVALID_LOGIN"));

        Ok(())
    }

    #[tokio::test]
    async fn test_dispatch_transport_failure() {
        let remote = MockRemote::new(Reply::Fail);
        let target = AliasConfig::new("clientes", "2582", "1", "3575");

        let err = dispatcher(&remote).dispatch(&target).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)), "{err:?}");
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_timeout() {
        let remote = MockRemote::new(Reply::Hang);
        let target = AliasConfig::new("clientes", "2582", "1", "3575");

        let err = dispatcher(&remote).dispatch(&target).await.unwrap_err();
        assert!(matches!(err, Error::UpstreamTimeout(d) if d == Duration::from_secs(30)));
        assert_eq!(err.to_string(), "upstream timed out after 30s");
    }
}
