//! # TCP Transport
//!
//! Frames are `u32 BE length || JSON(GossipMessage)` via
//! `LengthDelimitedCodec`. Each send opens a short-lived connection, so an
//! unreachable peer costs one failed connect and nothing carries over to
//! the next round.

use crate::domain::{GossipConfig, GossipMessage, GossipResult, TransportError};
use crate::ports::PeerTransport;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch, Semaphore};
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};
use tracing::{debug, info, warn};

fn codec(max_frame_len: usize) -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .max_frame_length(max_frame_len)
        .new_codec()
}

/// Dials peers by `host:port`.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    local_address: String,
    max_frame_len: usize,
}

impl TcpTransport {
    pub fn new(local_address: impl Into<String>, max_frame_len: usize) -> Self {
        Self {
            local_address: local_address.into(),
            max_frame_len,
        }
    }
}

#[async_trait]
impl PeerTransport for TcpTransport {
    async fn send(&self, peer: &str, message: GossipMessage) -> Result<(), TransportError> {
        let payload =
            serde_json::to_vec(&message).map_err(|e| TransportError::Encode(e.to_string()))?;
        if payload.len() > self.max_frame_len {
            return Err(TransportError::FrameTooLarge {
                size: payload.len(),
                max: self.max_frame_len,
            });
        }

        let unreachable = |e: std::io::Error| TransportError::Unreachable {
            peer: peer.to_string(),
            reason: e.to_string(),
        };

        let stream = TcpStream::connect(peer).await.map_err(unreachable)?;
        stream.set_nodelay(true).map_err(unreachable)?;

        let mut framed = FramedWrite::new(stream, codec(self.max_frame_len));
        framed.send(Bytes::from(payload)).await.map_err(unreachable)?;
        SinkExt::<Bytes>::close(&mut framed).await.map_err(unreachable)?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("tcp:{}", self.local_address)
    }
}

/// Accepts peer connections and forwards decoded messages to the gossip
/// inbox.
///
/// At most `max_connections` are read at once, and a connection that sends
/// nothing for `read_timeout` is closed.
pub struct TcpAcceptor {
    listener: TcpListener,
    max_frame_len: usize,
    read_timeout: Duration,
    slots: Arc<Semaphore>,
}

impl TcpAcceptor {
    pub async fn bind(address: &str, config: &GossipConfig) -> GossipResult<Self> {
        let listener = TcpListener::bind(address).await?;
        Ok(Self {
            listener,
            max_frame_len: config.max_frame_len,
            read_timeout: config.read_timeout,
            slots: Arc::new(Semaphore::new(config.max_connections)),
        })
    }

    pub fn local_addr(&self) -> GossipResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept until `shutdown` turns `true`. Connections already open finish
    /// on their own once the peer closes or goes idle.
    pub async fn serve(
        self,
        inbound: mpsc::Sender<GossipMessage>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        if let Ok(addr) = self.listener.local_addr() {
            info!(%addr, "[pl-04] 📡 Gossip listener accepting connections");
        }

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        let Ok(permit) = Arc::clone(&self.slots).try_acquire_owned() else {
                            warn!(%remote, "[pl-04] connection limit reached, dropping connection");
                            continue;
                        };
                        let inbound = inbound.clone();
                        let max = self.max_frame_len;
                        let idle = self.read_timeout;
                        tokio::spawn(async move {
                            read_frames(stream, remote, max, idle, inbound).await;
                            drop(permit);
                        });
                    }
                    Err(e) => warn!("[pl-04] accept failed: {}", e),
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("[pl-04] Gossip listener stopped");
    }
}

async fn read_frames(
    stream: TcpStream,
    remote: SocketAddr,
    max_frame_len: usize,
    read_timeout: Duration,
    inbound: mpsc::Sender<GossipMessage>,
) {
    let mut frames = FramedRead::new(stream, codec(max_frame_len));

    loop {
        let frame = match tokio::time::timeout(read_timeout, frames.next()).await {
            Ok(Some(frame)) => frame,
            Ok(None) => return,
            Err(_) => {
                debug!(%remote, "[pl-04] closing idle connection");
                return;
            }
        };
        let bytes = match frame {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(%remote, "[pl-04] dropping connection: {}", e);
                return;
            }
        };

        match serde_json::from_slice::<GossipMessage>(&bytes) {
            Ok(message) => {
                debug!(%remote, events = message.events.len(), "[pl-04] frame received");
                if inbound.send(message).await.is_err() {
                    return;
                }
            }
            Err(e) => warn!(%remote, "[pl-04] undecodable gossip frame: {}", e),
        }
    }
}
