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

/// EnvCredentialProvider loads NetSuite credentials from environment variables.
///
/// This provider looks for the following environment variables:
/// - `NETSUITE_ACCOUNT_ID`: The account id, used as OAuth realm
/// - `NETSUITE_CONSUMER_KEY`: The integration consumer key
/// - `NETSUITE_CONSUMER_SECRET`: The integration consumer secret
/// - `NETSUITE_TOKEN_ID`: The access token id
/// - `NETSUITE_TOKEN_SECRET`: The access token secret
///
/// Returns `None` when none of them is set and an error when only some are.
#[derive(Debug, Default)]
pub struct EnvCredentialProvider;

impl EnvCredentialProvider {
    /// Create a new EnvCredentialProvider.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProvideCredential for EnvCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let envs = ctx.env_vars();
        let keys = [
            NETSUITE_ACCOUNT_ID,
            NETSUITE_CONSUMER_KEY,
            NETSUITE_CONSUMER_SECRET,
            NETSUITE_TOKEN_ID,
            NETSUITE_TOKEN_SECRET,
        ];
        let values = keys.map(|k| envs.get(k).filter(|v| !v.is_empty()).cloned());

        if values.iter().all(Option::is_none) {
            debug!("no netsuite credential found in env");
            return Ok(None);
        }

        match values {
            [Some(account_id), Some(consumer_key), Some(consumer_secret), Some(token_id), Some(token_secret)] => {
                Ok(Some(Credential {
                    account_id,
                    consumer_key,
                    consumer_secret,
                    token_id,
                    token_secret,
                }))
            }
            values => {
                let missing: Vec<&str> = keys
                    .iter()
                    .zip(values.iter())
                    .filter(|(_, v)| v.is_none())
                    .map(|(k, _)| *k)
                    .collect();
                Err(Error::config_invalid(format!(
                    "incomplete netsuite credential in env, missing: {}",
                    missing.join(", ")
                )))
            }
        }
    }
}
