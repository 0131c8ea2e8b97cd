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

use crate::{constants::*, Credential};
use async_trait::async_trait;
use log::debug;
use restgate_core::{Context, Error, ProvideCredential, Result};
use serde::Deserialize;

/// FileCredentialProvider loads NetSuite credentials from a TOML file.
///
/// The file path is read from `NETSUITE_CREDENTIALS_FILE`. The file looks like:
///
/// ```toml
/// account_id = "1234567_SB1"
/// consumer_key = "..."
/// consumer_secret = "..."
/// token_id = "..."
/// token_secret = "..."
/// ```
///
/// Returns `None` if the env is not set. A file that is set but cannot be
/// read or parsed is an error.
#[derive(Debug, Default)]
pub struct FileCredentialProvider;

impl FileCredentialProvider {
    /// Create a new FileCredentialProvider.
    pub fn new() -> Self {
        Self
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CredentialFile {
    account_id: String,
    consumer_key: String,
    consumer_secret: String,
    token_id: String,
    token_secret: String,
}

#[async_trait]
impl ProvideCredential for FileCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let Some(path) = ctx.env_var(NETSUITE_CREDENTIALS_FILE) else {
            debug!("{NETSUITE_CREDENTIALS_FILE} is not set, skipping");
            return Ok(None);
        };

        let content = ctx.file_read_as_string(&path).await?;
        let file: CredentialFile = toml::from_str(&content).map_err(|e| {
            Error::config_invalid(format!("failed to parse credentials file {path}: {e}"))
                .with_source(e)
        })?;
        debug!("loaded netsuite credential from {path}");

        Ok(Some(Credential {
            account_id: file.account_id,
            consumer_key: file.consumer_key,
            consumer_secret: file.consumer_secret,
            token_id: file.token_id,
            token_secret: file.token_secret,
        }))
    }
}
