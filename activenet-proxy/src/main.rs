use std::{env, io, sync::Arc};

use tokio::{net::TcpListener, signal};
use tracing::{info, warn};

use activenet_proxy::{cli, logging, server, sessions::SessionManager};

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = cli::parse(env::args().skip(1).collect());
    logging::init(args.verbose);

    info!(base_url = %args.client.base_url, "proxying upstream");
    if args.client.session_cookie.is_some() {
        info!("forwarding configured upstream cookie");
    }

    let sessions = Arc::new(SessionManager::new(args.client, args.session_capacity));
    let router = server::router(sessions);

    let listener = TcpListener::bind(args.address).await?;
    info!("Listening at http://{}", args.address);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("shutting down"),
        Err(err) => {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    }
}
