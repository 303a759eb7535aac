// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use test_proxy_admin::catalog::{Catalog, Namespace};
use test_proxy_admin::config::Config;
use test_proxy_admin::server::{self, AdminState};
use test_proxy_admin::service::RegistrationService;
use test_proxy_admin::sessions::AnySession;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "test-proxy-admin")]
struct Args {
    /// Listen address, overrides `[general] listen` from the config file
    #[arg(long)]
    listen: Option<String>,

    /// Optional config TOML path (listen address and default components)
    #[arg(long)]
    config: Option<String>,
}

async fn load_config(path: Option<&str>) -> Config {
    match path {
        Some(p) => Config::load_from_path(p).await.unwrap_or_else(|e| {
            let reason = format!("{:#}", e);
            warn!(%p, %reason, "failed to load config, using defaults");
            Config::default()
        }),
        None => Config::default(),
    }
}

fn listen_addr(args: &Args, cfg: &Config) -> anyhow::Result<SocketAddr> {
    let raw = args.listen.as_deref().unwrap_or(&cfg.general.listen);
    Ok(raw.parse()?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let cfg = load_config(args.config.as_deref()).await;
    let addr = listen_addr(&args, &cfg)?;

    let catalog = Catalog::builtin();
    info!(
        sanitizers = ?catalog.type_names(Namespace::Sanitizer),
        matchers = ?catalog.type_names(Namespace::Matcher),
        transforms = ?catalog.type_names(Namespace::Transform),
        "component catalog loaded"
    );

    let service = RegistrationService::new(catalog, cfg.defaults.clone())?;
    info!(
        sanitizers = service.list(None).len(),
        "global defaults installed"
    );
    let state = Arc::new(AdminState::new(service, Arc::new(AnySession)));

    let server = server::run_admin(addr, state);

    tokio::select! {
        res = server => {
            if let Err(e) = res {
                error!(%e, "server error");
            }
        }
        _ = signal::ctrl_c() => {
            info!("shutting down");
        }
    }

    Ok(())
}
