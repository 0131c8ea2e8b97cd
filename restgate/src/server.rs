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

use crate::translate::{translate, CsvBody};
use crate::{AliasConfig, AliasRegistry, Config, DirectConfig, Dispatcher, Error, Result};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;
use log::{info, warn};
use restgate_core::{Context, Signer};
use restgate_netsuite::{DefaultCredentialProvider, RequestSigner};
use serde::Deserialize;
use std::sync::Arc;

/// Alias recorded for requests served by the direct endpoint.
const DIRECT_ALIAS: &str = "<direct>";

/// Shared, read-only state of every request handler.
#[derive(Clone, Debug)]
pub struct AppState {
    registry: Arc<AliasRegistry>,
    dispatcher: Dispatcher,
    direct: Arc<DirectConfig>,
}

impl AppState {
    /// Create the state served by [`router`].
    pub fn new(registry: AliasRegistry, dispatcher: Dispatcher, direct: DirectConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            dispatcher,
            direct: Arc::new(direct),
        }
    }

    /// Load credentials through the default provider chain and build the
    /// state described by `config`.
    ///
    /// Any failure here is fatal: the gateway must not start without a
    /// complete credential.
    pub async fn load(ctx: Context, config: &Config) -> Result<Self> {
        let signer = Signer::load(ctx, DefaultCredentialProvider::new(), RequestSigner::new())
            .await
            .map_err(Error::Config)?;
        info!(
            "loaded credential for account {}",
            signer.credential().account_id
        );

        let registry = config.registry()?;
        info!("registered aliases: {:?}", registry.names());
        if config.direct.enabled {
            info!("direct access enabled on /netsuite/data");
        }

        let dispatcher = Dispatcher::new(signer, config.restlet_url()?, config.timeout());
        Ok(Self::new(registry, dispatcher, config.direct.clone()))
    }
}

/// Build the gateway routes.
///
/// - `GET /data?alias=<name>`: fetch a registered data set.
/// - `GET /netsuite/data?script=&deploy=&searchId=`: fetch by raw ids when enabled.
/// - `GET /healthz`: liveness probe, never contacts the remote.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/data", get(data_handler))
        .route("/netsuite/data", get(direct_handler))
        .route("/healthz", get(health_check_handler))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct DataQuery {
    alias: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DirectQuery {
    script: Option<String>,
    deploy: Option<String>,
    #[serde(rename = "searchId")]
    search_id: Option<String>,
}

async fn data_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<DataQuery>, QueryRejection>,
) -> Result<CsvBody> {
    let Query(query) = query
        .map_err(bad_query)
        .inspect_err(|e| warn!("rejected request: {e}"))?;
    let alias = query
        .alias
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::BadRequest("missing query parameter: alias".to_string()))
        .inspect_err(|e| warn!("rejected request: {e}"))?;
    info!("request received for alias '{alias}'");

    let target = state
        .registry
        .lookup(&alias)
        .inspect_err(|e| warn!("rejected request: {e}"))?;
    fetch(&state, target).await
}

async fn direct_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<DirectQuery>, QueryRejection>,
) -> Result<CsvBody> {
    let Query(query) = query
        .map_err(bad_query)
        .inspect_err(|e| warn!("rejected request: {e}"))?;
    let target = resolve_direct(&state.direct, query).inspect_err(|e| warn!("rejected request: {e}"))?;
    info!(
        "direct request received with script={} deploy={} searchId={}",
        target.script, target.deploy, target.search_id
    );

    fetch(&state, &target).await
}

fn bad_query(rejection: QueryRejection) -> Error {
    Error::BadRequest(rejection.body_text())
}

async fn health_check_handler() -> &'static str {
    "ok"
}

async fn fetch(state: &AppState, target: &AliasConfig) -> Result<CsvBody> {
    let result = state.dispatcher.dispatch(target).await.and_then(translate);

    match &result {
        Ok(csv) => info!(
            "served alias '{}' with {} chars of csv",
            target.alias,
            csv.0.chars().count()
        ),
        Err(e) => warn!("alias '{}' failed with {}: {e}", target.alias, e.status()),
    }
    result
}

fn resolve_direct(direct: &DirectConfig, query: DirectQuery) -> Result<AliasConfig> {
    if !direct.enabled {
        return Err(Error::DirectAccessDisabled);
    }

    let pick = |given: Option<String>, default: &Option<String>, name: &str| {
        given
            .filter(|v| !v.is_empty())
            .or_else(|| default.clone())
            .ok_or_else(|| Error::BadRequest(format!("missing query parameter: {name}")))
    };

    Ok(AliasConfig::new(
        DIRECT_ALIAS,
        pick(query.script, &direct.script, "script")?,
        pick(query.deploy, &direct.deploy, "deploy")?,
        pick(query.search_id, &direct.search_id, "searchId")?,
    ))
}
