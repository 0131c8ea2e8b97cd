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

use crate::{AliasConfig, AliasRegistry, Error, Result};
use http::Uri;
use log::{debug, info};
use restgate_core::Context;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Env name of the gateway configuration file.
pub const RESTGATE_CONFIG: &str = "RESTGATE_CONFIG";
/// Env name overriding the listen address.
pub const RESTGATE_LISTEN: &str = "RESTGATE_LISTEN";
/// Env name overriding the RESTlet endpoint.
pub const NETSUITE_RESTLET_URL: &str = "NETSUITE_RESTLET_URL";

const DEFAULT_LISTEN: &str = "127.0.0.1:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Gateway configuration, fixed for the lifetime of the process.
///
/// ```toml
/// listen = "0.0.0.0:8000"
/// restlet_url = "https://1234567-sb1.restlets.api.netsuite.com/app/site/hosting/restlet.nl"
/// timeout_secs = 30
///
/// [aliases.clientes]
/// script = "2582"
/// deploy = "1"
/// search_id = "3575"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Address the HTTP server binds to.
    #[serde(default = "default_listen")]
    pub listen: String,
    /// RESTlet endpoint without query string.
    #[serde(default)]
    pub restlet_url: Option<String>,
    /// Deadline for one remote call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Settings of the direct id endpoint.
    #[serde(default)]
    pub direct: DirectConfig,
    /// Alias table keyed by alias name.
    #[serde(default)]
    pub aliases: BTreeMap<String, AliasEntry>,
}

/// One `[aliases.<name>]` table.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AliasEntry {
    pub script: String,
    pub deploy: String,
    #[serde(alias = "searchId")]
    pub search_id: String,
}

/// The `[direct]` table.
///
/// Ids missing from a direct request fall back to these defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectConfig {
    #[serde(default)]
    pub enabled: bool,
    pub script: Option<String>,
    pub deploy: Option<String>,
    #[serde(alias = "searchId")]
    pub search_id: Option<String>,
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            restlet_url: None,
            timeout_secs: default_timeout_secs(),
            direct: DirectConfig::default(),
            aliases: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Parse a configuration document.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            Error::Config(
                restgate_core::Error::config_invalid(format!("failed to parse config: {e}"))
                    .with_source(e),
            )
        })
    }

    /// Load the configuration file at `path`, then apply env overrides.
    pub async fn load(ctx: &Context, path: &str) -> Result<Self> {
        let content = ctx.file_read_as_string(path).await.map_err(Error::Config)?;
        let mut config = Self::from_toml(&content)?;
        info!("loaded gateway config from {path}");

        config.apply_env(ctx);
        config.validate()?;
        Ok(config)
    }

    /// Apply `RESTGATE_LISTEN` and `NETSUITE_RESTLET_URL` when set.
    pub fn apply_env(&mut self, ctx: &Context) {
        if let Some(listen) = ctx.env_var(RESTGATE_LISTEN).filter(|v| !v.is_empty()) {
            debug!("listen address overridden by {RESTGATE_LISTEN}");
            self.listen = listen;
        }
        if let Some(url) = ctx.env_var(NETSUITE_RESTLET_URL).filter(|v| !v.is_empty()) {
            debug!("restlet url overridden by {NETSUITE_RESTLET_URL}");
            self.restlet_url = Some(url);
        }
    }

    /// Check the values that cannot be expressed in the schema.
    pub fn validate(&self) -> Result<()> {
        self.restlet_url()?;
        if self.timeout_secs == 0 {
            return Err(config_error("timeout_secs must be greater than zero"));
        }
        if self.aliases.is_empty() && !self.direct.enabled {
            return Err(config_error(
                "no alias registered and direct access disabled",
            ));
        }
        Ok(())
    }

    /// The RESTlet endpoint, checked to be an absolute URL without query.
    pub fn restlet_url(&self) -> Result<&str> {
        let url = self
            .restlet_url
            .as_deref()
            .ok_or_else(|| config_error(format!("restlet_url is not set, nor {NETSUITE_RESTLET_URL}")))?;

        let uri: Uri = url
            .parse()
            .map_err(|e| config_error(format!("restlet_url {url} is invalid: {e}")))?;
        if uri.scheme().is_none() || uri.authority().is_none() {
            return Err(config_error(format!("restlet_url {url} must be absolute")));
        }
        if uri.query().is_some() {
            return Err(config_error(format!(
                "restlet_url {url} must not carry a query string"
            )));
        }

        Ok(url)
    }

    /// Deadline for one remote call.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the alias registry from the `[aliases]` tables.
    pub fn registry(&self) -> Result<AliasRegistry> {
        AliasRegistry::new(self.aliases.iter().map(|(alias, entry)| {
            AliasConfig::new(
                alias.as_str(),
                entry.script.as_str(),
                entry.deploy.as_str(),
                entry.search_id.as_str(),
            )
        }))
    }
}

fn config_error(message: impl Into<String>) -> Error {
    Error::Config(restgate_core::Error::config_invalid(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use restgate_core::{FileRead, StaticEnv};
    use std::collections::HashMap;

    const SAMPLE: &str = r#"
listen = "0.0.0.0:9000"
restlet_url = "https://1234567-sb1.restlets.api.netsuite.com/app/site/hosting/restlet.nl"
timeout_secs = 10

[direct]
enabled = true
script = "2265"
deploy = "1"
searchId = "2931"

[aliases.clientes]
script = "2582"
deploy = "1"
search_id = "3575"

[aliases.pedidos]
script = "2582"
deploy = "1"
searchId = "4120"
"#;

    #[derive(Debug)]
    struct InlineFile(&'static str);

    #[async_trait::async_trait]
    impl FileRead for InlineFile {
        async fn file_read(&self, _: &str) -> restgate_core::Result<Vec<u8>> {
            Ok(self.0.as_bytes().to_vec())
        }
    }

    fn context(content: &'static str, envs: &[(&str, &str)]) -> Context {
        Context::new().with_file_read(InlineFile(content)).with_env(StaticEnv {
            envs: envs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        })
    }

    #[test]
    fn test_parse_sample() -> anyhow::Result<()> {
        let config = Config::from_toml(SAMPLE)?;

        assert_eq!(config.listen, "0.0.0.0:9000");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(
            config.direct,
            DirectConfig {
                enabled: true,
                script: Some("2265".into()),
                deploy: Some("1".into()),
                search_id: Some("2931".into()),
            }
        );
        assert_eq!(config.aliases.len(), 2);
        assert_eq!(config.aliases["pedidos"].search_id, "4120");

        let registry = config.registry()?;
        assert_eq!(
            registry.lookup("clientes")?,
            &AliasConfig::new("clientes", "2582", "1", "3575")
        );

        Ok(())
    }

    #[test]
    fn test_defaults() -> anyhow::Result<()> {
        let config = Config::from_toml(
            r#"
restlet_url = "https://example.com/restlet.nl"

[aliases.a]
script = "1"
deploy = "1"
search_id = "1"
"#,
        )?;

        assert_eq!(config.listen, DEFAULT_LISTEN);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(!config.direct.enabled);
        config.validate()?;

        Ok(())
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Config::from_toml("restlet = \"x\"").unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("failed to parse config"), "{err}");
    }

    #[tokio::test]
    async fn test_load_with_env_overrides() -> anyhow::Result<()> {
        let ctx = context(
            SAMPLE,
            &[
                (RESTGATE_LISTEN, "127.0.0.1:7000"),
                (NETSUITE_RESTLET_URL, "https://7654321.restlets.api.netsuite.com/restlet.nl"),
            ],
        );

        let config = Config::load(&ctx, "restgate.toml").await?;
        assert_eq!(config.listen, "127.0.0.1:7000");
        assert_eq!(
            config.restlet_url()?,
            "https://7654321.restlets.api.netsuite.com/restlet.nl"
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_load_without_restlet_url() {
        let ctx = context("[direct]\nenabled = true\n", &[]);

        let err = Config::load(&ctx, "restgate.toml").await.unwrap_err();
        assert!(err.to_string().contains("restlet_url is not set"), "{err}");
    }

    #[test]
    fn test_restlet_url_with_query_rejected() {
        let config = Config {
            restlet_url: Some("https://example.com/restlet.nl?script=1".into()),
            ..Default::default()
        };

        let err = config.restlet_url().unwrap_err();
        assert!(err.to_string().contains("must not carry a query string"), "{err}");
    }

    #[test]
    fn test_relative_restlet_url_rejected() {
        let config = Config {
            restlet_url: Some("/app/site/hosting/restlet.nl".into()),
            ..Default::default()
        };

        assert!(config.restlet_url().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = Config {
            restlet_url: Some("https://example.com/restlet.nl".into()),
            timeout_secs: 0,
            ..Default::default()
        };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_secs"), "{err}");
    }

    #[test]
    fn test_nothing_to_serve_rejected() {
        let config = Config {
            restlet_url: Some("https://example.com/restlet.nl".into()),
            ..Default::default()
        };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("no alias registered"), "{err}");
    }
}
