//! Route table.
//!
//! | Route                              | Module       |
//! |------------------------------------|--------------|
//! | `/`, `/dashboard`, reload          | `home`       |
//! | `/blog`, `/:slug`                  | `post`       |
//! | `/dashboard/posts/...`             | `post_admin` |
//! | `/dashboard/styles`                | `styles`     |
//! | `/login/:slug`, logout             | `login`      |
//! | robots, sitemap, rss, well-known   | `xml`        |
//! | `/assets/*path`                    | `assets`     |
//!
//! Dashboard routes are only reachable with a session; that check happens
//! before routing, in [`Web::handle`](super::Web::handle).

mod assets;
mod home;
mod login;
mod post;
mod post_admin;
mod styles;
mod xml;

use super::App;
use crate::router::{Handler, HandlerError, HandlerResult, Request, Response, Router};
use anyhow::anyhow;
use std::sync::Arc;

type Action = fn(&App, &mut Response, &Request) -> HandlerResult;

pub(super) fn register(router: &mut Router, app: &Arc<App>) {
    home::register(router, app);
    post::register(router, app);
    post_admin::register(router, app);
    styles::register(router, app);
    login::register(router, app);
    xml::register(router, app);
    assets::register(router, app);
}

/// Turn a plain function into a handler sharing `app`.
fn bind(app: &Arc<App>, action: Action) -> impl Handler + 'static {
    let app = Arc::clone(app);
    move |res: &mut Response, req: &Request| action(&app, res, req)
}

/// 400 unless the submitted form carries the session's CSRF token.
fn check_csrf(app: &App, req: &Request) -> Result<(), HandlerError> {
    if app.sessions.check_csrf(req) {
        Ok(())
    } else {
        Err(HandlerError::bad_request(anyhow!("CSRF token mismatch")))
    }
}
