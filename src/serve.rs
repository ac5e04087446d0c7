//! HTTP server for the interactive dashboard
//!
//! `streamdash serve` → starts server, opens browser, serves the page and a
//! small JSON API. Requests are handled one at a time on one thread; each
//! session id owns its own view and selection, the working set is shared.

use std::collections::HashMap;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use tiny_http::{Header, Method, Request, Response, Server};

use crate::charts::{self, Dashboard, Palette, View};
use crate::dataset::WorkingSet;
use crate::model::Field;
use crate::selection::{SelectionError, SelectionState};

// Embed the UI directly in the binary
const UI_HTML: &str = include_str!("dashboard.html");

const DEFAULT_SESSION: &str = "default";

/// Sessions kept before the least recently used one is dropped.
const MAX_SESSIONS: usize = 64;

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self { ok: true, data: Some(data), error: None }
    }
}

impl ApiResponse<()> {
    fn failure(error: String) -> Self {
        Self { ok: false, data: None, error: Some(error) }
    }
}

/// Query-string parameters. Which ones matter depends on the route.
#[derive(Deserialize, Debug, Default)]
pub struct ApiParams {
    pub session: Option<String>,
    pub start: Option<usize>,
    pub end: Option<usize>,
    pub x: Option<String>,
    pub y: Option<String>,
    pub track: Option<String>,
    pub field: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub x_min: Option<f64>,
    pub x_max: Option<f64>,
    pub y_min: Option<f64>,
    pub y_max: Option<f64>,
}

/// One browser session's mutable state.
#[derive(Debug, Clone)]
struct Session {
    view: View,
    selection: SelectionState,
    last_used: u64,
}

impl Session {
    fn new(view: View) -> Self {
        Self {
            view,
            selection: SelectionState::default(),
            last_used: 0,
        }
    }
}

/// A response ready to hand to the transport.
#[derive(Debug)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Reply {
    fn html(body: String) -> Self {
        Self { status: 200, content_type: "text/html; charset=utf-8", body }
    }

    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        let body = serde_json::to_string(value).unwrap_or_else(|e| {
            format!(r#"{{"ok":false,"data":null,"error":"serialization failed: {e}"}}"#)
        });
        Self { status, content_type: "application/json", body }
    }

    fn bad_request(error: String) -> Self {
        Self::json(400, &ApiResponse::failure(error))
    }

    fn not_found() -> Self {
        Self { status: 404, content_type: "text/plain", body: "Not found".into() }
    }
}

/// Routing and per-session state, independent of the socket.
pub struct App<'a> {
    working_set: &'a WorkingSet,
    palette: Palette,
    default_view: View,
    sessions: HashMap<String, Session>,
    clock: u64,
}

impl<'a> App<'a> {
    pub fn new(working_set: &'a WorkingSet, palette: Palette, default_view: View) -> Self {
        Self {
            working_set,
            palette,
            default_view,
            sessions: HashMap::new(),
            clock: 0,
        }
    }

    /// Handle one request. `query` is the raw query string without `?`.
    pub fn handle(&mut self, method: &Method, path: &str, query: &str) -> Reply {
        let params: ApiParams = match serde_urlencoded::from_str(query) {
            Ok(p) => p,
            Err(e) => return Reply::bad_request(format!("bad query string: {e}")),
        };

        match (method, path) {
            (Method::Get, "/") => Reply::html(UI_HTML.to_string()),

            (Method::Get, "/api/dashboard") => self.with_session(&params, |s| {
                let next = view_from(&s.view, &params)?;
                // Intervals on axes that are no longer plotted can't be seen or cleared.
                for old in [s.view.x, s.view.y] {
                    if old != next.x && old != next.y {
                        s.selection.brush.remove(Field::Feature(old));
                    }
                }
                s.view = next;
                Ok(())
            }),

            (Method::Post, "/api/highlight") => self.with_session(&params, |s| {
                let track = params.track.as_deref().ok_or("missing track parameter")?;
                let on = s.selection.highlight.toggle(track);
                log::info!("highlight {:?} {}", track, if on { "on" } else { "off" });
                Ok(())
            }),

            (Method::Post, "/api/highlight/clear") => self.with_session(&params, |s| {
                s.selection.highlight.clear();
                Ok(())
            }),

            (Method::Post, "/api/brush") => self.with_session(&params, |s| {
                apply_brush(s, &params)?;
                Ok(())
            }),

            (Method::Delete, "/api/brush") => self.with_session(&params, |s| {
                s.selection.brush.clear();
                Ok(())
            }),

            _ => Reply::not_found(),
        }
    }

    /// Run a mutation against the caller's session, then recompose. A failed
    /// mutation leaves the session untouched and never creates one.
    fn with_session<F>(&mut self, params: &ApiParams, mutate: F) -> Reply
    where
        F: FnOnce(&mut Session) -> std::result::Result<(), ApiError>,
    {
        let id = params.session.as_deref().unwrap_or(DEFAULT_SESSION);
        let mut next = match self.sessions.get(id) {
            Some(s) => s.clone(),
            None => Session::new(self.default_view),
        };

        if let Err(e) = mutate(&mut next) {
            log::debug!("Rejected request: {}", e.0);
            return Reply::bad_request(e.0);
        }

        self.clock += 1;
        next.last_used = self.clock;
        let dashboard: Dashboard =
            charts::compose(self.working_set, &next.view, &next.selection, &self.palette);

        if !self.sessions.contains_key(id) {
            self.evict_oldest_if_full();
        }
        self.sessions.insert(id.to_string(), next);

        Reply::json(200, &ApiResponse::success(dashboard))
    }

    fn evict_oldest_if_full(&mut self) {
        if self.sessions.len() < MAX_SESSIONS {
            return;
        }
        let oldest = self
            .sessions
            .iter()
            .min_by_key(|(_, s)| s.last_used)
            .map(|(id, _)| id.clone());
        if let Some(id) = oldest {
            log::debug!("Dropping idle session {id:?}");
            self.sessions.remove(&id);
        }
    }
}

/// Message returned to the client with a 400.
#[derive(Debug)]
struct ApiError(String);

impl From<SelectionError> for ApiError {
    fn from(e: SelectionError) -> Self {
        Self(e.to_string())
    }
}

impl From<&str> for ApiError {
    fn from(e: &str) -> Self {
        Self(e.to_string())
    }
}

fn view_from(current: &View, p: &ApiParams) -> std::result::Result<View, SelectionError> {
    let start = p.start.unwrap_or(current.slice.start());
    let end = p.end.unwrap_or(current.slice.end());
    let x = p.x.as_deref().unwrap_or(current.x.column());
    let y = p.y.as_deref().unwrap_or(current.y.column());
    View::parse(start, end, x, y)
}

/// `field`/`min`/`max` sets one interval; `x_min`..`y_max` set intervals on
/// the session's current scatter axes.
fn apply_brush(s: &mut Session, p: &ApiParams) -> std::result::Result<(), ApiError> {
    let mut touched = false;

    if let Some(field) = p.field.as_deref() {
        let (Some(min), Some(max)) = (p.min, p.max) else {
            return Err("brush needs both min and max".into());
        };
        s.selection.brush.set_parsed(field, min, max)?;
        touched = true;
    }
    if let (Some(a), Some(b)) = (p.x_min, p.x_max) {
        s.selection.brush.set_parsed(s.view.x.column(), a, b)?;
        touched = true;
    }
    if let (Some(a), Some(b)) = (p.y_min, p.y_max) {
        s.selection.brush.set_parsed(s.view.y.column(), a, b)?;
        touched = true;
    }

    if touched {
        Ok(())
    } else {
        Err("brush needs field/min/max or x_min/x_max/y_min/y_max".into())
    }
}

/// Start server, open browser, serve the dashboard until the process exits.
pub fn start(port: u16, open_browser: bool, mut app: App<'_>) -> Result<()> {
    let addr = format!("127.0.0.1:{}", port);
    let server = Server::http(&addr).map_err(|e| anyhow!("failed to bind {addr}: {e}"))?;

    let url = format!("http://localhost:{}", port);
    println!("Dashboard running at {url} (Ctrl-C to stop)");

    if open_browser {
        if let Err(e) = open::that(&url) {
            log::warn!("Could not open browser: {e}");
        }
    }

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &mut app) {
            log::warn!("Error answering request: {}", e);
        }
    }

    Ok(())
}

fn handle_request(request: Request, app: &mut App<'_>) -> std::io::Result<()> {
    let url = request.url().to_string();
    let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));
    let method = request.method().clone();
    log::debug!("{} {}", method, url);

    let reply = app.handle(&method, path, query);
    let header = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes())
        .map_err(|_| std::io::Error::other("invalid content type header"))?;
    let response = Response::from_string(reply.body)
        .with_status_code(reply.status)
        .with_header(header);
    request.respond(response)
}
