//! Embedded static assets under `/assets/`.

use super::bind;
use crate::{
    router::{HandlerResult, Request, Response, Router},
    web::App,
};
use std::{path::Path, sync::Arc};
use tiny_http::StatusCode;

/// Files compiled into the binary, keyed by path below `/assets/`.
const FILES: &[(&str, &str)] = &[
    ("css/style.css", include_str!("../../embed/style.css")),
    ("css/dashboard.css", include_str!("../../embed/dashboard.css")),
];

pub(super) fn register(router: &mut Router, app: &Arc<App>) {
    router.get("/assets/*path", bind(app, serve));
}

fn serve(_app: &App, res: &mut Response, req: &Request) -> HandlerResult {
    let path = req.param("path");
    // no directory browsing
    if path.is_empty() || path.ends_with('/') {
        return Ok(StatusCode(404));
    }

    let Some((name, content)) = FILES.iter().find(|(name, _)| *name == path) else {
        return Ok(StatusCode(404));
    };

    res.set_header("Content-Type", guess_content_type(Path::new(name)));
    res.set_header("Cache-Control", "public, max-age=3600");
    res.write(content);
    Ok(StatusCode(200))
}

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{router::Method, web::testing::*};

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("a/b.css")), "text/css; charset=utf-8");
        assert_eq!(guess_content_type(Path::new("logo.png")), "image/png");
        assert_eq!(guess_content_type(Path::new("README")), "application/octet-stream");
    }

    #[test]
    fn test_serves_stylesheet() {
        let (web, _) = web();
        let res = web.handle(Request::new(Method::Get, "/assets/css/style.css"));
        assert_eq!(res.status().0, 200);
        assert_eq!(res.header("Content-Type"), Some("text/css; charset=utf-8"));
        assert!(!res.body().is_empty());
    }

    #[test]
    fn test_missing_and_directories() {
        let (web, _) = web();
        for path in ["/assets", "/assets/css", "/assets/css/nope.css", "/assets/../Cargo.toml"] {
            let res = web.handle(Request::new(Method::Get, path));
            assert_eq!(res.status().0, 404, "{path}");
        }
    }
}
