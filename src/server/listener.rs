use tokio::net::TcpListener;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::config::{Config, ProxyConfig};
use crate::proxy::resolver::{DnsResolver, Resolve};
use crate::proxy::upstream::{Connect, TcpConnector};
use crate::server::session::{Session, SessionOutcome};
use crate::server::shutdown::Shutdown;

pub async fn run(cfg: &Config, shutdown: Shutdown) -> anyhow::Result<()> {
    let listener = TcpListener::bind(cfg.listen_addr()).await?;
    info!("Listening on {}", listener.local_addr()?);

    let connector = TcpConnector::new(cfg.proxy.connect_timeout());
    serve(listener, &DnsResolver, &connector, &cfg.proxy, shutdown).await
}

/// Accepts and handles connections one at a time until shutdown.
///
/// Shutdown is only observed between connections; a session that has
/// started always runs to its end.
pub async fn serve<R, C>(
    listener: TcpListener,
    resolver: &R,
    connector: &C,
    config: &ProxyConfig,
    shutdown: Shutdown,
) -> anyhow::Result<()>
where
    R: Resolve,
    C: Connect,
{
    loop {
        let accepted = tokio::select! {
            biased;
            _ = shutdown.wait() => {
                info!("Shutdown requested, no longer accepting connections");
                break;
            }
            res = listener.accept() => res,
        };

        let (socket, peer) = match accepted {
            Ok(conn) => conn,
            Err(e) => {
                error!(error = %e, "Accept failed");
                continue;
            }
        };
        info!("Accepted connection from {}", peer);

        let session = Session::new(socket, resolver, connector, config);
        match session.run().instrument(info_span!("session", %peer)).await {
            Ok(SessionOutcome::Relayed {
                request_bytes,
                response_bytes,
            }) => {
                info!(%peer, request_bytes, response_bytes, "Response relayed");
            }
            Ok(SessionOutcome::ClientClosed) => {
                debug!(%peer, "Client closed before sending a request");
            }
            Ok(SessionOutcome::Idle) => {
                debug!(%peer, "Client sent nothing before the read deadline");
            }
            Err(e) => {
                warn!(%peer, error = %e, "Session failed");
            }
        }
    }

    Ok(())
}
