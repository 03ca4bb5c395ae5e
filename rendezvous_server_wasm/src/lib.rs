//! WASI-compatible two-peer WebRTC rendezvous server using wstd
//!
//! Two browser peers exchange an offer, an answer and their ICE candidates
//! through a single polling endpoint. The server never identifies sessions
//! or peers: a new offer starts a new negotiation, and who receives what is
//! decided from the state of that negotiation (or from an optional role
//! hint).
//!
//! # Protocol
//!
//! - **POST /api/signal** - Post an SDP and/or candidate, or poll
//! - **OPTIONS /api/signal** - CORS preflight
//! - **GET /api/hello** - Liveness check
//!
//! ## Requests (client → server)
//!
//! - `{"sdp": {"type": "offer", ...}}` - Start a negotiation (discards the previous one)
//! - `{"sdp": {"type": "answer", ...}}` - Answer the current offer
//! - `{"candidate": {...}}` - Trickle an ICE candidate
//! - `{}` or `{"role": "offerer" | "answerer"}` - Poll
//!
//! Writes are acknowledged with `{}`. Polls receive:
//!
//! ```json
//! {"sdp": {...} | null, "candidates": [...] | null}
//! ```
//!
//! # State between requests
//!
//! `wasmtime serve` creates a fresh instance for every request, so the
//! negotiation is handed from one instance to the next through a snapshot
//! file, `rendezvous_state.json` in the working directory unless
//! `RENDEZVOUS_STATE_FILE` names another path. The directory must be
//! preopened for the component. `RENDEZVOUS_STATE_FILE=none` keeps state in
//! instance memory only, for hosts that reuse one instance.
//!
//! # Example
//!
//! ```bash
//! # Start the server
//! wasmtime serve -S common -S cli --dir . --addr 127.0.0.1:8000 rendezvous-signaling-wasm.wasm
//!
//! # Offerer posts its offer
//! curl -X POST -H "Content-Type: application/json" \
//!   -d '{"sdp":{"type":"offer","sdp":"v=0..."}}' http://127.0.0.1:8000/api/signal
//!
//! # Answerer polls for it
//! curl -X POST -d '{"role":"answerer"}' http://127.0.0.1:8000/api/signal
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod handler;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::SignalingError;
pub use handler::handle_request;
pub use state::ServerState;
pub use store::{IgnoreReason, Outcome, SignalingStore};
