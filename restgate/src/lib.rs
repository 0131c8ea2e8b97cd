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

//! Signing gateway in front of a NetSuite RESTlet.
//!
//! A caller asks for a data set by alias. The gateway resolves the alias to
//! RESTlet ids, signs a GET with OAuth 1.0a HMAC-SHA256, sends it and
//! returns the base64 `contentBase64` payload of the answer as `text/csv`.
//!
//! ```no_run
//! use restgate::{router, AppState, Config};
//! use restgate_core::{Context, OsEnv};
//! use restgate_file_read_tokio::TokioFileRead;
//! use restgate_http_send_reqwest::ReqwestHttpSend;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let ctx = Context::new()
//!     .with_file_read(TokioFileRead)
//!     .with_http_send(ReqwestHttpSend::default())
//!     .with_env(OsEnv);
//! let config = Config::load(&ctx, "restgate.toml").await?;
//! let state = AppState::load(ctx, &config).await?;
//!
//! let listener = tokio::net::TcpListener::bind(&config.listen).await?;
//! axum::serve(listener, router(state)).await?;
//! # Ok(())
//! # }
//! ```

mod config;
pub use config::{
    AliasEntry, Config, DirectConfig, NETSUITE_RESTLET_URL, RESTGATE_CONFIG, RESTGATE_LISTEN,
};

mod dispatch;
pub use dispatch::{Dispatcher, RemoteEnvelope, QUERY_DEPLOY, QUERY_SCRIPT, QUERY_SEARCH_ID};

mod error;
pub use error::{EnvelopeError, Error, Result};

mod registry;
pub use registry::{AliasConfig, AliasRegistry};

mod server;
pub use server::{router, AppState};

mod translate;
pub use translate::{decode_content, translate, CsvBody, CONTENT_FIELD};
