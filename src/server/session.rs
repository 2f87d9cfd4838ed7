use std::net::SocketAddrV4;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::parser::parse_http_request;
use crate::http::request::{ParsedRequest, RawRequest};
use crate::http::response::Response;
use crate::http::rewriter::{inject_connection_close, rewrite_absolute_target};
use crate::http::writer::{write_fully, write_response};
use crate::proxy::relay::forward_all;
use crate::proxy::resolver::{Destination, Resolve};
use crate::proxy::upstream::Connect;

/// One pass of a client connection through the proxy.
///
/// The session owns the client stream and, once connected, the upstream
/// stream. Both are dropped, and so closed, on every way out of [`run`].
///
/// [`run`]: Session::run
pub struct Session<'a, S, R, C> {
    client: S,
    resolver: &'a R,
    connector: &'a C,
    config: &'a ProxyConfig,
}

/// Where a session is in the pipeline. Each state carries what the next
/// step needs and nothing else.
enum SessionState<U> {
    Accepted,
    Received(RawRequest),
    Parsed {
        raw: RawRequest,
        request: ParsedRequest,
    },
    Resolved {
        raw: RawRequest,
        addr: SocketAddrV4,
    },
    Connected {
        raw: RawRequest,
        upstream: U,
    },
    Rewritten {
        raw: RawRequest,
        upstream: U,
    },
    Forwarded {
        upstream: U,
        request_bytes: usize,
    },
    Closed(SessionOutcome),
}

/// What the client sent before the request head was complete.
enum ClientInput {
    Request(RawRequest),
    Closed,
    Idle,
}

/// How a session that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The client closed without sending anything.
    ClientClosed,
    /// The client sent nothing before the read deadline.
    Idle,
    /// The request went upstream and the response came back.
    Relayed {
        request_bytes: usize,
        response_bytes: u64,
    },
}

impl<'a, S, R, C> Session<'a, S, R, C>
where
    S: AsyncRead + AsyncWrite + Unpin,
    R: Resolve,
    C: Connect,
{
    pub fn new(client: S, resolver: &'a R, connector: &'a C, config: &'a ProxyConfig) -> Self {
        Self {
            client,
            resolver,
            connector,
            config,
        }
    }

    /// Drives the session to completion.
    ///
    /// On failure the client gets the error's synthetic response, if it has
    /// one, before the error is returned.
    pub async fn run(mut self) -> Result<SessionOutcome, ProxyError> {
        let mut state = SessionState::Accepted;

        loop {
            state = match self.advance(state).await {
                Ok(SessionState::Closed(outcome)) => return Ok(outcome),
                Ok(next) => next,
                Err(e) => {
                    self.reject(&e).await;
                    return Err(e);
                }
            };
        }
    }

    async fn advance(
        &mut self,
        state: SessionState<C::Stream>,
    ) -> Result<SessionState<C::Stream>, ProxyError> {
        match state {
            SessionState::Accepted => match self.read_request().await? {
                ClientInput::Request(raw) => {
                    trace!(bytes = raw.len(), "Request received");
                    Ok(SessionState::Received(raw))
                }
                ClientInput::Closed => Ok(SessionState::Closed(SessionOutcome::ClientClosed)),
                ClientInput::Idle => Ok(SessionState::Closed(SessionOutcome::Idle)),
            },

            SessionState::Received(raw) => {
                let request = parse_http_request(raw.as_bytes())?;
                debug!(
                    method = %request.method,
                    url = %request.url,
                    host = request.host().unwrap_or("-"),
                    "Request parsed"
                );
                Ok(SessionState::Parsed { raw, request })
            }

            SessionState::Parsed { raw, request } => {
                let destination =
                    Destination::from_host_header(request.host(), self.config.default_port)?;
                let addr = destination.resolve(self.resolver).await?;
                debug!(host = %destination.host, upstream = %addr, "Host resolved");
                Ok(SessionState::Resolved { raw, addr })
            }

            SessionState::Resolved { raw, addr } => {
                let upstream = self
                    .connector
                    .connect(addr)
                    .await
                    .map_err(|source| ProxyError::Connect { addr, source })?;
                Ok(SessionState::Connected { raw, upstream })
            }

            SessionState::Connected { mut raw, upstream } => {
                if self.config.rewrite_absolute_target {
                    rewrite_absolute_target(&mut raw)?;
                }
                inject_connection_close(&mut raw)?;
                Ok(SessionState::Rewritten { raw, upstream })
            }

            SessionState::Rewritten { raw, mut upstream } => {
                let request_bytes = write_fully(&mut upstream, raw.as_bytes())
                    .await
                    .map_err(ProxyError::UpstreamWrite)?;
                trace!(bytes = request_bytes, "Request forwarded");
                Ok(SessionState::Forwarded {
                    upstream,
                    request_bytes,
                })
            }

            SessionState::Forwarded {
                mut upstream,
                request_bytes,
            } => {
                let response_bytes =
                    forward_all(&mut upstream, &mut self.client, self.config.relay_chunk_size)
                        .await
                        .map_err(ProxyError::Relay)?;
                Ok(SessionState::Closed(SessionOutcome::Relayed {
                    request_bytes,
                    response_bytes,
                }))
            }

            SessionState::Closed(outcome) => Ok(SessionState::Closed(outcome)),
        }
    }

    /// Reads until the header block is complete, the buffer is full, or the
    /// client stops sending.
    ///
    /// Every read is bounded by `request_read_timeout`. A client that goes
    /// quiet before sending anything is dropped; one that stalls mid-request
    /// gets a 400.
    async fn read_request(&mut self) -> Result<ClientInput, ProxyError> {
        let mut raw = RawRequest::with_capacity(self.config.buffer_capacity);
        let mut temp = [0u8; 1024];
        let deadline = self.config.request_read_timeout();

        loop {
            let want = raw.remaining().min(temp.len());
            let read = self.client.read(&mut temp[..want]);

            let n = match deadline {
                Some(limit) => match timeout(limit, read).await {
                    Ok(res) => res,
                    Err(_) if raw.is_empty() => return Ok(ClientInput::Idle),
                    Err(_) => {
                        return Err(ProxyError::Malformed("timed out reading request headers"));
                    }
                },
                None => read.await,
            }
            .map_err(ProxyError::ClientRead)?;

            if n == 0 {
                break;
            }

            raw.fill(&temp[..n]);

            if raw.header_end().is_some() || raw.is_full() {
                break;
            }
        }

        if raw.is_empty() {
            return Ok(ClientInput::Closed);
        }
        Ok(ClientInput::Request(raw))
    }

    /// Best-effort error response. Write failures are only logged.
    async fn reject(&mut self, error: &ProxyError) {
        let Some(status) = error.status() else {
            return;
        };

        if let Err(e) = write_response(&mut self.client, &Response::error(status)).await {
            debug!(error = %e, status = status.as_u16(), "Could not send error response");
        }
    }
}
