//! Development server.
//!
//! Every request goes through a fixed chain:
//!
//! ```text
//! bundler ──Pass──► fallback roots ──miss──► 404
//!    │                   │
//!    ├─ Asset / Static   └─ file (index.html for directories)
//!    └─ error ──► 500
//! ```

mod lifecycle;
mod path;
mod response;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tiny_http::{Request, Server};

use crate::config::ServeConfig;
use crate::core::{is_shutdown, register_server};
use crate::router::{Bundler, Outcome};
use crate::{debug, log};

/// Bound server ready to accept requests.
pub struct BoundServer {
    server: Arc<Server>,
    addr: SocketAddr,
    threads: usize,
}

/// Everything a request handler needs, shared across the pool.
struct Host {
    bundler: Bundler,
    roots: Vec<PathBuf>,
}

/// Bind the HTTP server and register it for Ctrl+C shutdown.
pub fn bind_server(config: &ServeConfig) -> Result<BoundServer> {
    let (server, addr) = lifecycle::bind_with_retry(config.interface, config.port)?;
    let server = Arc::new(server);
    register_server(Arc::clone(&server));

    Ok(BoundServer {
        server,
        addr,
        threads: config.threads,
    })
}

impl BoundServer {
    /// Serve requests until shutdown (blocking).
    pub fn run(self, bundler: Bundler, roots: Vec<PathBuf>) -> Result<()> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|i| format!("sheaf-http-{i}"))
            .build()
            .context("failed to create request thread pool")?;

        log!(
            "serve";
            "http://{} ({} bundles from {})",
            self.addr,
            bundler.manifest().bundle_names().len(),
            bundler.options().boot.display()
        );
        for root in &roots {
            debug!("serve"; "fallback: {}", root.display());
        }

        let host = Arc::new(Host { bundler, roots });
        for request in self.server.incoming_requests() {
            let host = Arc::clone(&host);
            pool.spawn(move || {
                if let Err(e) = handle_request(request, &host) {
                    log!("serve"; "request error: {e:#}");
                }
            });
        }
        Ok(())
    }
}

fn handle_request(request: Request, host: &Host) -> Result<()> {
    if is_shutdown() {
        return response::respond_unavailable(request);
    }

    let outcome = host.bundler.handle(request.method().as_str(), request.url());
    match outcome {
        Ok(Outcome::Asset { body, content_type }) => {
            response::respond_asset(request, body, content_type)
        }
        Ok(Outcome::Static(file)) => response::respond_file(request, &file),
        Ok(Outcome::Pass) => respond_fallback(request, host),
        Err(err) => {
            debug!("serve"; "{} {}: {}", request.method(), request.url(), err);
            response::respond_error(request, &err)
        }
    }
}

fn respond_fallback(request: Request, host: &Host) -> Result<()> {
    if !response::is_read_request(&request) {
        return response::respond_not_found(request);
    }
    match path::resolve_in(request.url(), &host.roots) {
        Some(file) => response::respond_file(request, &file),
        None => response::respond_not_found(request),
    }
}
