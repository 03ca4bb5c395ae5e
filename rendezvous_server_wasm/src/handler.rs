//! HTTP handlers for the rendezvous server
//!
//! Routing and response building are plain functions over [`Reply`] so they
//! can be exercised without a WASI host. [`handle_request`] is the thin
//! adapter that reads the `wstd` request body and writes the response.

use crate::config::Config;
use crate::error::SignalingError;
use crate::state::ServerState;
use crate::store::IgnoreReason;
use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CONTENT_TYPE,
};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use rendezvous_protocol::{Signal, SignalRequest};
use tracing::{debug, error, info, warn};
use wstd::http::{Body, Request, Response};

pub const SIGNAL_PATH: &str = "/api/signal";
pub const HELLO_PATH: &str = "/api/hello";

/// Body returned for writes and when a poll response cannot be encoded
const EMPTY_OBJECT: &str = "{}";

/// A transport-independent HTTP response
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl Reply {
    fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: String::new(),
        }
    }

    fn json(status: StatusCode, body: String) -> Self {
        let mut reply = Self::new(status);
        reply
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        reply.body = body;
        reply
    }

    fn text(body: String) -> Self {
        let mut reply = Self::new(StatusCode::OK);
        reply.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        reply.body = body;
        reply
    }

    /// Permissive cross-origin headers for browser callers
    fn with_cors(mut self, config: &Config) -> Self {
        self.headers
            .insert(ACCESS_CONTROL_ALLOW_ORIGIN, config.allow_origin.clone());
        self.headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        );
        self.headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        );
        self
    }

    fn into_response(self) -> Response<Body> {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Where a request is dispatched
#[derive(Debug)]
pub enum Route {
    Hello,
    Preflight,
    /// `POST /api/signal`; the only route that reads the body
    Signal,
    Rejected(SignalingError),
}

impl Route {
    pub fn of(method: &Method, path: &str) -> Route {
        match path {
            HELLO_PATH => Route::Hello,
            SIGNAL_PATH if method == Method::OPTIONS => Route::Preflight,
            SIGNAL_PATH if method == Method::POST => Route::Signal,
            SIGNAL_PATH => Route::Rejected(SignalingError::MethodNotAllowed(method.clone())),
            _ => Route::Rejected(SignalingError::NotFound(path.to_string())),
        }
    }

    /// Produce the reply for this route; `body` is only read for [`Route::Signal`]
    pub fn respond(self, body: &str, state: &ServerState, config: &Config) -> Reply {
        match self {
            Route::Hello => Reply::text(config.hello_text.clone()),
            Route::Preflight => Reply::new(StatusCode::OK).with_cors(config),
            Route::Signal => handle_signal(body, state).with_cors(config),
            Route::Rejected(e) => {
                debug!(error = %e, "request rejected");
                let reply = Reply::new(e.status());
                match e {
                    SignalingError::MethodNotAllowed(_) => reply.with_cors(config),
                    _ => reply,
                }
            }
        }
    }
}

/// Decode a signal body, tolerating malformed input
///
/// Anything that does not parse is logged and treated as an empty signal,
/// which makes the request a poll.
pub fn decode_signal(body: &str) -> Signal {
    match body.parse::<Signal>() {
        Ok(signal) => signal,
        Err(e) => {
            warn!(error = %e, "malformed signal body treated as poll");
            Signal::default()
        }
    }
}

/// Fields of a poll that were accepted but had no effect
///
/// Writes report these through the store's outcomes instead.
pub fn ignored_on_poll(signal: &Signal) -> Option<IgnoreReason> {
    if signal.is_write() {
        return None;
    }
    signal.unknown_role().map(|_| IgnoreReason::UnknownRole)
}

/// Apply a write, or answer a poll
fn handle_signal(body: &str, state: &ServerState) -> Reply {
    debug!(%body, "signal request");

    let signal = decode_signal(body);
    if let Some(reason) = ignored_on_poll(&signal) {
        warn!(?reason, role = ?signal.unknown_role(), "poll field ignored, inferring from state");
    }

    match SignalRequest::from(signal) {
        SignalRequest::Write(signal) => {
            let outcomes = state.apply(&signal);
            debug!(?outcomes, "signal applied");
            Reply::json(StatusCode::OK, EMPTY_OBJECT.to_string())
        }
        SignalRequest::Poll { role } => {
            let response = state.resolve(role);
            match serde_json::to_string(&response) {
                Ok(json) => {
                    info!(
                        role = ?role,
                        sdp = response.sdp.is_some(),
                        candidates = response.candidates.as_ref().map_or(0, Vec::len),
                        "poll served"
                    );
                    Reply::json(StatusCode::OK, json)
                }
                Err(e) => {
                    error!(error = %SignalingError::from(e), "failed to encode poll response");
                    Reply::json(StatusCode::INTERNAL_SERVER_ERROR, EMPTY_OBJECT.to_string())
                }
            }
        }
    }
}

/// Handle an HTTP request - main router
pub async fn handle_request(
    request: Request<Body>,
    state: &ServerState,
    config: &Config,
) -> Result<Response<Body>, wstd::http::Error> {
    let route = Route::of(request.method(), request.uri().path());

    let body = match route {
        Route::Signal => {
            let mut body = request.into_body();
            match body.str_contents().await {
                Ok(s) => s.to_string(),
                Err(e) => {
                    warn!(error = ?e, "failed to read signal body");
                    String::new()
                }
            }
        }
        _ => String::new(),
    };

    Ok(route.respond(&body, state, config).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn post(body: &str, state: &ServerState) -> Reply {
        Route::of(&Method::POST, SIGNAL_PATH).respond(body, state, &Config::default())
    }

    fn body_json(reply: &Reply) -> Value {
        serde_json::from_str(&reply.body).unwrap()
    }

    fn assert_cors(reply: &Reply) {
        assert_eq!(reply.headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(reply.headers[ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
        assert_eq!(reply.headers[ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
    }

    #[test]
    fn write_is_acknowledged_with_empty_object() {
        let state = ServerState::new();
        let reply = post(r#"{"sdp":{"type":"offer","x":1}}"#, &state);

        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.headers[CONTENT_TYPE], "application/json");
        assert_eq!(body_json(&reply), json!({}));
        assert_cors(&reply);
    }

    #[test]
    fn poll_returns_offer_then_answer() {
        let state = ServerState::new();
        post(r#"{"sdp":{"type":"offer","x":1}}"#, &state);
        post(r#"{"candidate":{"c":1}}"#, &state);

        let reply = post("{}", &state);
        assert_eq!(
            body_json(&reply),
            json!({"sdp": {"type": "offer", "x": 1}, "candidates": [{"c": 1}]})
        );
        assert_cors(&reply);

        post(r#"{"sdp":{"type":"answer","y":2}}"#, &state);
        assert_eq!(
            body_json(&post("{}", &state)),
            json!({"sdp": {"type": "answer", "y": 2}, "candidates": null})
        );
    }

    #[test]
    fn empty_state_poll_has_null_keys() {
        let reply = post("{}", &ServerState::new());
        assert_eq!(reply.body, r#"{"sdp":null,"candidates":null}"#);
    }

    #[test]
    fn malformed_body_degrades_to_poll() {
        let state = ServerState::new();
        post(r#"{"sdp":{"type":"offer"}}"#, &state);

        let reply = post("this is not json", &state);

        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(
            body_json(&reply),
            json!({"sdp": {"type": "offer"}, "candidates": null})
        );
        assert_eq!(state.snapshot().offer_sdp(), Some(&json!({"type": "offer"})));
    }

    #[test]
    fn unknown_role_on_poll_is_reported_and_inferred() {
        let signal: Signal = r#"{"role":"observer"}"#.parse().unwrap();
        assert_eq!(ignored_on_poll(&signal), Some(IgnoreReason::UnknownRole));

        let known: Signal = r#"{"role":"offerer"}"#.parse().unwrap();
        assert_eq!(ignored_on_poll(&known), None);

        // On writes the store reports the role itself.
        let write: Signal = r#"{"candidate":{"c":1},"role":"observer"}"#.parse().unwrap();
        assert_eq!(ignored_on_poll(&write), None);

        let state = ServerState::new();
        post(r#"{"sdp":{"type":"offer"}}"#, &state);
        assert_eq!(
            body_json(&post(r#"{"role":"observer"}"#, &state)),
            json!({"sdp": {"type": "offer"}, "candidates": null})
        );
    }

    #[test]
    fn role_hint_on_poll_selects_counterpart() {
        let state = ServerState::new();
        post(r#"{"sdp":{"type":"offer"}}"#, &state);

        assert_eq!(
            body_json(&post(r#"{"role":"offerer"}"#, &state)),
            json!({"sdp": null, "candidates": null})
        );
        assert_eq!(
            body_json(&post(r#"{"role":"answerer"}"#, &state)),
            json!({"sdp": {"type": "offer"}, "candidates": null})
        );
    }

    #[test]
    fn preflight_is_ok_with_cors_and_no_body() {
        let reply = Route::of(&Method::OPTIONS, SIGNAL_PATH).respond(
            "",
            &ServerState::new(),
            &Config::default(),
        );
        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.is_empty());
        assert_cors(&reply);
    }

    #[test]
    fn other_methods_are_not_allowed() {
        let route = Route::of(&Method::GET, SIGNAL_PATH);
        assert!(matches!(
            route,
            Route::Rejected(SignalingError::MethodNotAllowed(_))
        ));

        let reply = route.respond("", &ServerState::new(), &Config::default());
        assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_cors(&reply);
    }

    #[test]
    fn hello_returns_configured_text() {
        let config = Config {
            hello_text: "still here".to_string(),
            ..Config::default()
        };
        let reply = Route::of(&Method::GET, HELLO_PATH).respond("", &ServerState::new(), &config);
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body, "still here");
    }

    #[test]
    fn unknown_path_is_not_found() {
        let reply = Route::of(&Method::POST, "/api/other").respond(
            "{}",
            &ServerState::new(),
            &Config::default(),
        );
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert!(!reply.headers.contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[test]
    fn configured_origin_is_echoed() {
        let config = Config {
            allow_origin: HeaderValue::from_static("https://call.example.org"),
            ..Config::default()
        };
        let reply = Route::of(&Method::POST, SIGNAL_PATH).respond("{}", &ServerState::new(), &config);
        assert_eq!(
            reply.headers[ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://call.example.org"
        );
    }
}
