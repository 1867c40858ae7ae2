use std::sync::Arc;

use clap::Parser;
use groovy_lsp_server::{SymbolIndex, server::Backend};
use tower_lsp::{LspService, Server};

#[derive(Parser, Debug)]
#[command(name = "groovy-lsp-server", version)]
struct Args {
    /// Serve over stdio (default transport).
    #[arg(long)]
    stdio: bool,

    /// Serve over a TCP socket on the given port instead of stdio.
    #[arg(long)]
    socket: Option<u16>,

    /// Path to the SQLite symbol index. Defaults to a cache dir under the
    /// platform cache directory.
    #[arg(long)]
    index_path: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .init();

    let args = Args::parse();

    let index_path = args.index_path.unwrap_or_else(|| {
        groovy_lsp_server::constants::get_cache_dir()
            .join("index.sqlite")
            .to_string_lossy()
            .to_string()
    });

    let index = match SymbolIndex::initialize(&index_path).await {
        Ok(index) => Arc::new(index),
        Err(e) => {
            tracing::error!("Failed to open symbol index at {index_path}: {e}");
            std::process::exit(1);
        }
    };

    match args.socket {
        Some(port) => {
            let listener = match tokio::net::TcpListener::bind(("127.0.0.1", port)).await {
                Ok(listener) => listener,
                Err(e) => {
                    tracing::error!("Failed to bind socket on port {port}: {e}");
                    std::process::exit(1);
                }
            };
            let (stream, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::error!("Failed to accept connection: {e}");
                    std::process::exit(1);
                }
            };
            let (read, write) = tokio::io::split(stream);
            let (service, socket) = LspService::new(|client| Backend::new(client, index.clone()));
            Server::new(read, write, socket).serve(service).await;
        }
        None => {
            let (service, socket) =
                LspService::new(|client| Backend::new(client, index.clone()));
            Server::new(tokio::io::stdin(), tokio::io::stdout(), socket)
                .serve(service)
                .await;
        }
    }
}
