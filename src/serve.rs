//! HTTP server: a pool of worker threads sharing one `tiny_http` listener.
//!
//! # Architecture
//!
//! ```text
//!              ┌──────────────────────┐
//!              │  tiny_http::Server   │  (one listener, Arc-shared)
//!              └──────────┬───────────┘
//!        recv_timeout     │      recv_timeout
//!      ┌──────────────────┼──────────────────┐
//!      ▼                  ▼                  ▼
//!  worker-0           worker-1    ...    worker-N
//!      │  tiny_http::Request ─► router::Request (deadline = now + timeout)
//!      │  Web::handle
//!      └─ router::Response ─► tiny_http::Response, log line
//! ```
//!
//! Ctrl+C sets the shutdown flag and unblocks the listener; every worker
//! finishes its current request and returns.

use crate::{
    config::PlumeConfig,
    log,
    router::{Method, Request, Response},
    web::Web,
};
use anyhow::{Context, Result};
use std::{
    io::{Cursor, Read},
    net::{IpAddr, SocketAddr},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};
use tiny_http::{Header, Server, StatusCode};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

/// How often an idle worker checks for shutdown.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Largest accepted request body. Anything bigger gets `413`.
const MAX_BODY: usize = 8 * 1024 * 1024;

// ============================================================================
// Server Entry Point
// ============================================================================

/// Serve `web` until Ctrl+C.
pub fn serve_site(config: &PlumeConfig, web: Web) -> Result<()> {
    let interface: IpAddr = config
        .server
        .interface
        .parse()
        .with_context(|| format!("Invalid [server.interface] `{}`", config.server.interface))?;
    let timeout = config.request_timeout();
    let workers = config.server.workers.max(1);

    let (server, addr) = try_bind_port(interface, config.server.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);
    let shutdown = Arc::new(AtomicBool::new(false));

    // Set up Ctrl+C handler for graceful shutdown
    {
        let server = Arc::clone(&server);
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            log!("serve"; "shutting down...");
            shutdown.store(true, Ordering::Release);
            server.unblock();
        })
        .context("Failed to set Ctrl+C handler")?;
    }

    log!("serve"; "http://{} ({} workers)", addr, workers);

    thread::scope(|scope| -> Result<()> {
        for i in 0..workers {
            let (server, web, shutdown) = (&server, &web, &shutdown);
            thread::Builder::new()
                .name(format!("worker-{i}"))
                .spawn_scoped(scope, move || worker(server, web, shutdown, timeout))
                .context("Failed to spawn worker thread")?;
        }
        Ok(())
    })
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        max_retries,
        base_port,
        base_port.saturating_add(max_retries.saturating_sub(1)),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

fn worker(server: &Server, web: &Web, shutdown: &AtomicBool, timeout: Duration) {
    while !shutdown.load(Ordering::Acquire) {
        match server.recv_timeout(POLL_INTERVAL) {
            Ok(Some(request)) => handle_request(request, web, timeout),
            Ok(None) => {}
            Err(err) => {
                if !shutdown.load(Ordering::Acquire) {
                    log!("serve"; "accept failed: {err}");
                }
            }
        }
    }
}

// ============================================================================
// Request Handling
// ============================================================================

fn handle_request(mut request: tiny_http::Request, web: &Web, timeout: Duration) {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.url().split('?').next().unwrap_or_default().to_owned();

    let response = match convert_request(&mut request, start + timeout) {
        Ok(req) => convert_response(web.handle(req)),
        Err(status) => tiny_http::Response::from_data(Vec::new()).with_status_code(status),
    };
    let status = response.status_code().0;

    if let Err(err) = request.respond(response) {
        log!("serve"; "{method} {path}: write failed: {err}");
    }
    log!("serve"; "{method} {path} {status} {:.1?}", start.elapsed());
}

/// `Err` carries the status to answer with when the request can't be routed.
fn convert_request(request: &mut tiny_http::Request, deadline: Instant) -> Result<Request, StatusCode> {
    let method = Method::parse(request.method().as_str()).ok_or(StatusCode(405))?;

    let mut req = Request::new(method, request.url())
        .with_deadline(deadline)
        .with_remote(request.remote_addr().copied());
    for header in request.headers() {
        req = req.with_header(header.field.as_str().as_str(), header.value.as_str());
    }

    let declared = request.body_length();
    let body = read_body(request.as_reader(), declared)?;
    Ok(req.with_body(body))
}

/// Read at most [`MAX_BODY`] bytes. A declared or actual length past the
/// limit is `413`, never a silently truncated body.
fn read_body(reader: impl Read, declared: Option<usize>) -> Result<Vec<u8>, StatusCode> {
    if declared.is_some_and(|len| len > MAX_BODY) {
        return Err(StatusCode(413));
    }
    let mut body = Vec::new();
    reader
        .take(MAX_BODY as u64 + 1)
        .read_to_end(&mut body)
        .map_err(|_| StatusCode(400))?;
    if body.len() > MAX_BODY {
        return Err(StatusCode(413));
    }
    Ok(body)
}

/// Bytes that would let a value end the header line or start a new one.
fn is_header_safe(bytes: &[u8]) -> bool {
    bytes.iter().all(|&b| b == b'\t' || (b >= 0x20 && b != 0x7f))
}

fn convert_response(res: Response) -> tiny_http::Response<Cursor<Vec<u8>>> {
    let (status, headers, body) = res.into_parts();
    let mut response = tiny_http::Response::from_data(body).with_status_code(status);
    for (name, value) in headers {
        if !is_header_safe(name.as_bytes()) || !is_header_safe(value.as_bytes()) {
            log!("serve"; "dropping header `{}` with control characters", name.escape_debug());
            continue;
        }
        match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => response.add_header(header),
            Err(()) => log!("serve"; "dropping invalid header `{name}`"),
        }
    }
    response
}
