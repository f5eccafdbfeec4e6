//! Adapter runtime integration.
//!
//! Bridges the sync game loop with the async TCP server.

use std::net::SocketAddr;

use anyhow::Context;
use arrayvec::ArrayVec;
use log::{error, info};
use tokio::runtime::Runtime;
use tokio::sync::{mpsc, oneshot, watch};

use crate::core::GameSnapshot;
use crate::protocol::{
    build_observation, create_ack, AckMessage, ErrorMessage, ObservationMessage, MAX_ACTIONS,
};
use crate::server::{is_disabled, run_server_with_status, ServerConfig, ServerStatus};
use crate::types::GameAction;

/// Command delivered to the game loop.
#[derive(Debug, Clone)]
pub struct InboundCommand {
    pub client_id: usize,
    pub seq: u64,
    pub payload: InboundPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundPayload {
    /// Controller actions, applied in order
    Actions(ArrayVec<GameAction, MAX_ACTIONS>),
    /// A client just subscribed and wants the current state
    SnapshotRequest,
}

/// Outbound message to be delivered by the server.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    Ack {
        client_id: usize,
        ack: AckMessage,
    },
    Error {
        client_id: usize,
        err: ErrorMessage,
    },
    Observation {
        client_id: usize,
        obs: ObservationMessage,
    },
    /// Sent to every handshaken client that streams observations
    Broadcast {
        obs: ObservationMessage,
    },
}

/// Running adapter instance.
pub struct Adapter {
    _rt: Runtime,
    addr: SocketAddr,
    cmd_rx: mpsc::Receiver<InboundCommand>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
    status_rx: watch::Receiver<ServerStatus>,
    obs_seq: u64,
}

impl Adapter {
    /// Start the adapter from environment variables.
    ///
    /// Returns `Ok(None)` if `BOULDER_AI_DISABLED` is set.
    pub fn start_from_env() -> anyhow::Result<Option<Self>> {
        if is_disabled() {
            info!("adapter disabled via BOULDER_AI_DISABLED");
            return Ok(None);
        }
        Self::start(ServerConfig::from_env()).map(Some)
    }

    /// Start the server on its own runtime and wait until it listens
    pub fn start(config: ServerConfig) -> anyhow::Result<Self> {
        let max_pending = config.max_pending_commands.max(1);
        let (cmd_tx, cmd_rx) = mpsc::channel::<InboundCommand>(max_pending);
        let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
        let (ready_tx, ready_rx) = oneshot::channel();
        let (status_tx, status_rx) = watch::channel(ServerStatus::default());

        let rt = Runtime::new().context("failed to create tokio runtime")?;
        let server = rt.spawn(async move {
            let served =
                run_server_with_status(config, cmd_tx, out_rx, Some(ready_tx), Some(status_tx))
                    .await;
            if let Err(e) = served {
                error!("adapter stopped: {:#}", e);
                return Err(e);
            }
            Ok(())
        });

        let addr = match rt.block_on(ready_rx) {
            Ok(addr) => addr,
            // The server dropped the ready channel: it failed before listening.
            Err(_) => {
                return match rt.block_on(server) {
                    Ok(Err(e)) => Err(e),
                    _ => Err(anyhow::anyhow!("adapter exited before listening")),
                };
            }
        };

        Ok(Self {
            _rt: rt,
            addr,
            cmd_rx,
            out_tx,
            status_rx,
            obs_seq: 0,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Latest connection counts
    pub fn status(&self) -> ServerStatus {
        *self.status_rx.borrow()
    }

    pub fn try_recv(&mut self) -> Option<InboundCommand> {
        self.cmd_rx.try_recv().ok()
    }

    pub fn send(&self, msg: OutboundMessage) {
        let _ = self.out_tx.send(msg);
    }

    pub fn ack(&self, client_id: usize, seq: u64, applied: u32) {
        self.send(OutboundMessage::Ack {
            client_id,
            ack: create_ack(seq, applied),
        });
    }

    fn next_obs_seq(&mut self) -> u64 {
        self.obs_seq += 1;
        self.obs_seq
    }

    /// Send the current state to one client
    pub fn observe_to(&mut self, client_id: usize, snap: &GameSnapshot) {
        let obs = build_observation(snap, self.next_obs_seq());
        self.send(OutboundMessage::Observation { client_id, obs });
    }

    /// Send the current state to every streaming client
    pub fn broadcast(&mut self, snap: &GameSnapshot) {
        let obs = build_observation(snap, self.next_obs_seq());
        self.send(OutboundMessage::Broadcast { obs });
    }
}
