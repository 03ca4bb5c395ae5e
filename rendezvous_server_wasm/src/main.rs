//! WASI HTTP server entry point for the rendezvous server
//!
//! This module provides the main entry point when running as a WASI HTTP component
//! using `wasmtime serve`.

#[cfg(target_os = "wasi")]
use rendezvous_server_wasm::{Config, ServerState, config, handle_request};
#[cfg(target_os = "wasi")]
use wstd::http::{Body, Request, Response};

// Initialised on the first request an instance handles
#[cfg(target_os = "wasi")]
static SERVER: std::sync::OnceLock<(Config, ServerState)> = std::sync::OnceLock::new();

#[cfg(target_os = "wasi")]
fn server() -> &'static (Config, ServerState) {
    SERVER.get_or_init(|| {
        let config = Config::from_env();
        config::init_logging(&config);
        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            state_file = ?config.state_file,
            "rendezvous server instance starting"
        );
        if config.state_file.is_none() {
            tracing::warn!(
                "no state snapshot configured; hosts that create an instance per request will not carry a negotiation between requests"
            );
        }
        let state = ServerState::from_config(&config);
        (config, state)
    })
}

/// The main HTTP handler for WASI
///
/// This function is called by the WASI runtime for each incoming HTTP request.
#[cfg(target_os = "wasi")]
#[wstd::http_server]
async fn main(request: Request<Body>) -> Result<Response<Body>, wstd::http::Error> {
    let (config, state) = server();
    handle_request(request, state, config).await
}

#[cfg(not(target_os = "wasi"))]
fn main() {
    eprintln!(
        "rendezvous-signaling-wasm is a WASI HTTP component; build it for wasm32-wasip2 and run it with `wasmtime serve`"
    );
    std::process::exit(2);
}
