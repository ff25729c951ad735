use anyhow::Result;
use clap::Parser;
use rmcp::{RoleClient, service::Peer};
use tokio_util::sync::CancellationToken;

use kodegen_strict_schema::catalog::ToolCatalog;
use kodegen_strict_schema::cli::{Cli, ToolSource};
use kodegen_strict_schema::commands;
use kodegen_strict_schema::stdio::StrictProxyServer;
use kodegen_strict_schema::upstream::UpstreamService;
use kodegen_strict_schema::{install_strict_listing, StrictOptions, ToolRoute, ToolService};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the MCP stdio transport
    env_logger::init();

    let cli = Cli::parse();
    let options = cli.strict_options();

    match cli.source()? {
        ToolSource::Catalog(path) => {
            let catalog = ToolCatalog::from_file(&path)?;
            log::info!(
                "Loaded tool catalog {} ({} tools)",
                path.display(),
                catalog.tool_count().unwrap_or(0)
            );
            run(&catalog, None, &options, cli.list_tools).await
        }
        ToolSource::Upstream { program, args } => {
            let upstream = UpstreamService::spawn(&program, &args).await?;
            let peer = upstream.peer();

            let result = run(&upstream, Some(peer), &options, cli.list_tools).await;

            if let Err(e) = upstream.shutdown().await {
                log::warn!("Upstream MCP server did not shut down cleanly: {e}");
            }
            result
        }
    }
}

/// Install strict schemas on `service`, then either print the listing or
/// serve it over stdio.
async fn run<S: ToolService>(
    service: &S,
    upstream: Option<Peer<RoleClient>>,
    options: &StrictOptions,
    list_only: bool,
) -> Result<()> {
    let installation = install_strict_listing(service, options);
    let route = ToolRoute::from_installation(installation, || service.tool_lister());

    if list_only {
        return commands::handle_list_tools(&route).await;
    }

    // stdin closing ends serving on its own; signals cut it short
    let shutdown_token = CancellationToken::new();
    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        let signal = shutdown_signal().await;
        log::info!("Received {signal}, stopping strict proxy");
        signal_token.cancel();
    });

    StrictProxyServer::new(route, upstream)
        .serve_stdio(shutdown_token)
        .await
}

/// Resolves with the name of the signal that asked the proxy to stop. A
/// signal that cannot be hooked never resolves, which leaves the MCP client
/// disconnect as the only way out.
async fn shutdown_signal() -> &'static str {
    let interrupt = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                log::warn!("Cannot listen for SIGINT: {e}");
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                "SIGTERM"
            }
            Err(e) => {
                log::warn!("Cannot listen for SIGTERM: {e}");
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    }
}
