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

use anyhow::Context as _;
use clap::Parser;
use log::info;
use restgate::{router, AppState, Config, RESTGATE_CONFIG};
use restgate_core::{Context, OsEnv};
use restgate_file_read_tokio::TokioFileRead;
use restgate_http_send_reqwest::ReqwestHttpSend;

/// Signing gateway that serves NetSuite saved searches as CSV.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the gateway configuration file.
    #[arg(short, long, env = RESTGATE_CONFIG, default_value = "restgate.toml")]
    config: String,

    /// Address to listen on, overriding the configuration.
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    let _ = dotenv::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let ctx = Context::new()
        .with_file_read(TokioFileRead)
        .with_http_send(ReqwestHttpSend::default())
        .with_env(OsEnv);

    let mut config = Config::load(&ctx, &args.config)
        .await
        .with_context(|| format!("failed to load config from {}", args.config))?;
    if let Some(listen) = args.listen {
        config.listen = listen;
    }

    let state = AppState::load(ctx, &config)
        .await
        .context("failed to initialize gateway")?;

    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    info!("restgate listening on {}", config.listen);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("restgate stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested, stopping server");
}
