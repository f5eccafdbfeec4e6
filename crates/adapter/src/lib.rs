//! Adapter module - remote control via TCP socket with JSON protocol
//!
//! This module lets an external agent play the game through a TCP socket
//! connection, and lets any number of observers watch it.
//!
//! # Protocol Overview
//!
//! The adapter implements a **line-delimited JSON protocol** over TCP:
//!
//! 1. **Connection**: Client connects to TCP socket (default: 127.0.0.1:7777)
//! 2. **Handshake**: Client sends `hello`, server responds with `welcome`
//! 3. **Controller Assignment**: First client to hello becomes the controller;
//!    when it leaves, the oldest remaining client is promoted
//! 4. **Observation Streaming**: Server sends game state observations
//! 5. **Commanding**: Controller sends commands to execute game actions
//!
//! # Message Types
//!
//! ## Client → Server
//!
//! - **hello**: Initial handshake with client info and requested capabilities
//! - **command**: Up to 16 actions (`moveLeft`, `moveRight`, `moveUp`,
//!   `moveDown`, `pause`, `restart`) applied in order
//!
//! ## Server → Client
//!
//! - **welcome**: Response to hello with the assigned role
//! - **observation**: Full game state snapshot (board rows, score, countdown...)
//! - **ack**: Command applied
//! - **error**: Error response with code and message
//!
//! `seq` must strictly increase per client.
//!
//! # Environment Variables
//!
//! - `BOULDER_AI_HOST`: Bind address (default: "127.0.0.1")
//! - `BOULDER_AI_PORT`: Port number (default: 7777)
//! - `BOULDER_AI_MAX_PENDING`: Bounded command queue size (default: 10)
//! - `BOULDER_AI_DISABLED`: Set to "1" or "true" to disable adapter entirely
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Server: {"type":"hello","seq":1,"client":{"name":"bot","version":"1.0.0"},"protocol_version":"1.0.0","requested":{"stream_observations":true}}
//! Server -> Client: {"type":"welcome","seq":1,"ts":1234567890,"protocol_version":"1.0.0","client_id":1,"role":"controller",...}
//! Server -> Client: {"type":"observation","seq":1,"ts":1234567891,"board":{"rows":3,"cols":5,"cells":["#####","#P.*#","#####"]},...}
//! Client -> Server: {"type":"command","seq":2,"actions":["moveRight","moveRight"]}
//! Server -> Client: {"type":"ack","seq":2,"ts":1234567892,"status":"ok","applied":2}
//! ```

pub mod protocol;
pub mod runtime;
pub mod server;

pub use tui_boulder_core as core;
pub use tui_boulder_types as types;

// Re-export protocol types for convenience
pub use protocol::*;
pub use runtime::{Adapter, InboundCommand, InboundPayload, OutboundMessage};
pub use server::{
    is_disabled, run_server, run_server_with_status, ServerConfig, ServerState, ServerStatus,
    PROTOCOL_VERSION,
};
