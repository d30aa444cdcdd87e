//! Static file server for the built HTML.
//!
//! The listener is bound synchronously before any runtime starts, so an
//! occupied port is reported immediately instead of after startup.

use crate::error::{Error, Result};
use axum::{
    body::Body,
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use percent_encoding::percent_decode_str;
use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_PORT: u16 = 8000;

/// Bind `addr`, failing fast with [`Error::PortInUse`] when it is taken.
pub fn bind(addr: SocketAddr) -> Result<TcpListener> {
    match TcpListener::bind(addr) {
        Ok(listener) => Ok(listener),
        Err(e) if e.kind() == ErrorKind::AddrInUse => Err(Error::PortInUse { addr }),
        Err(e) => Err(Error::io(format!("tcp://{}", addr), e)),
    }
}

/// Serve `html_dir` on `listener` until Ctrl-C, on a single-threaded runtime.
pub fn serve(listener: TcpListener, html_dir: &Path) -> Result<()> {
    if !html_dir.is_dir() {
        return Err(Error::DocsNotFound(html_dir.to_path_buf()));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::io(html_dir, e))?;

    runtime.block_on(async {
        let addr = listener.local_addr().map_err(|e| Error::io(html_dir, e))?;
        let listener = into_tokio(listener, html_dir)?;
        println!("Serving documentation at http://{}", addr);
        info!(%addr, root = %html_dir.display(), "docs server listening");

        axum::serve(listener, router(html_dir.to_path_buf()))
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("shutting down docs server");
            })
            .await
            .map_err(|e| Error::io(html_dir, e))
    })
}

fn into_tokio(listener: TcpListener, html_dir: &Path) -> Result<tokio::net::TcpListener> {
    listener
        .set_nonblocking(true)
        .and_then(|_| tokio::net::TcpListener::from_std(listener))
        .map_err(|e| Error::io(html_dir, e))
}

/// Router serving every path from `root`.
pub fn router(root: PathBuf) -> Router {
    Router::new().fallback(serve_file).with_state(Arc::new(root))
}

async fn serve_file(State(root): State<Arc<PathBuf>>, method: Method, uri: Uri) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let Some(mut path) = resolve(&root, uri.path()) else {
        debug!(path = uri.path(), "rejected request path");
        return StatusCode::NOT_FOUND.into_response();
    };
    if tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
        path.push("index.html");
    }

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            debug!(path = %path.display(), "200");
            let body = if method == Method::HEAD {
                Body::empty()
            } else {
                Body::from(bytes)
            };
            ([(header::CONTENT_TYPE, content_type(&path))], body).into_response()
        }
        Err(_) => {
            debug!(path = %path.display(), "404");
            (StatusCode::NOT_FOUND, "Not Found").into_response()
        }
    }
}

/// Map a URL path onto `root`, refusing anything that would leave it.
/// Segments are percent-decoded before they are checked.
fn resolve(root: &Path, url_path: &str) -> Option<PathBuf> {
    let mut path = root.to_path_buf();
    for segment in url_path.split('/').filter(|s| !s.is_empty()) {
        let segment = percent_decode_str(segment).decode_utf8().ok()?;
        let mut components = Path::new(&*segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) => path.push(part),
            (Some(Component::CurDir), None) => {}
            _ => return None,
        }
    }
    Some(path)
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "txt" | "rst" => "text/plain; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "eot" => "application/vnd.ms-fontobject",
        _ => "application/octet-stream",
    }
}
