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

use crate::{Error, Result};
use log::debug;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

/// An alias together with the remote ids it resolves to.
#[derive(Clone, PartialEq, Eq)]
pub struct AliasConfig {
    /// Name callers use to request the data set.
    pub alias: String,
    /// RESTlet script id.
    pub script: String,
    /// RESTlet deployment id.
    pub deploy: String,
    /// Saved search the RESTlet should run.
    pub search_id: String,
}

impl AliasConfig {
    /// Create a new alias entry.
    pub fn new(
        alias: impl Into<String>,
        script: impl Into<String>,
        deploy: impl Into<String>,
        search_id: impl Into<String>,
    ) -> Self {
        Self {
            alias: alias.into(),
            script: script.into(),
            deploy: deploy.into(),
            search_id: search_id.into(),
        }
    }

    fn empty_field(&self) -> Option<&'static str> {
        if self.alias.is_empty() {
            Some("alias")
        } else if self.script.is_empty() {
            Some("script")
        } else if self.deploy.is_empty() {
            Some("deploy")
        } else if self.search_id.is_empty() {
            Some("search_id")
        } else {
            None
        }
    }
}

impl Debug for AliasConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} => script={} deploy={} searchId={}",
            self.alias, self.script, self.deploy, self.search_id
        )
    }
}

/// Immutable mapping from alias name to [`AliasConfig`].
///
/// Built once from configuration and shared read-only by every request.
/// Lookups are exact and case-sensitive.
#[derive(Clone, Debug, Default)]
pub struct AliasRegistry {
    aliases: HashMap<String, AliasConfig>,
}

impl AliasRegistry {
    /// Build a registry from alias entries.
    ///
    /// Fails if an entry has an empty field or an alias is registered twice.
    pub fn new(entries: impl IntoIterator<Item = AliasConfig>) -> Result<Self> {
        let mut aliases = HashMap::new();
        for entry in entries {
            if let Some(field) = entry.empty_field() {
                return Err(config_error(format!(
                    "alias '{}' has an empty {field}",
                    entry.alias
                )));
            }
            if aliases.contains_key(&entry.alias) {
                return Err(config_error(format!(
                    "alias '{}' registered twice",
                    entry.alias
                )));
            }

            debug!("registered alias {entry:?}");
            aliases.insert(entry.alias.clone(), entry);
        }

        Ok(Self { aliases })
    }

    /// Resolve `alias` to its entry.
    pub fn lookup(&self, alias: &str) -> Result<&AliasConfig> {
        self.aliases
            .get(alias)
            .ok_or_else(|| Error::AliasNotFound(alias.to_string()))
    }

    /// Registered alias names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.aliases.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered aliases.
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Whether no alias is registered.
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

fn config_error(message: impl Into<String>) -> Error {
    Error::Config(restgate_core::Error::config_invalid(message))
}
