//! HTTP surface: shared application state, routes and the request pipeline.
//!
//! ```text
//! Web::handle(req)
//!   ├─ precheck: canonical host, trailing slash ──► redirect / 404
//!   ├─ /dashboard/* without a session ────────────► 404
//!   └─ Router::dispatch ─► handler ─► completion
//!                                      ├─ error page for >= 400
//!                                      ├─ log handler errors
//!                                      └─ default Content-Type
//! ```

pub mod form;
pub mod middleware;
pub mod notify;
pub mod render;
mod routes;
pub mod session;

use crate::{
    log,
    model::Site,
    router::{HandlerResult, Request, Response, Router},
    storage::{ContentStore, StoreError},
};
use middleware::{Precheck, conditional_get, is_dashboard, precheck};
use notify::Notifier;
use render::{LayoutOptions, Markdown, Page, dashboard_page, error_page, public_page};
use maud::Markup;
use session::{Credentials, Sessions};
use std::sync::Arc;
use tiny_http::StatusCode;

/// Everything a handler needs, built once at boot.
pub struct App {
    pub store: ContentStore,
    pub sessions: Sessions,
    pub credentials: Credentials,
    pub markdown: Box<dyn Markdown>,
    pub notifier: Notifier,
    /// Local development mode.
    pub local: bool,
}

impl App {
    /// Current site, bounded by the request deadline.
    pub fn load(&self, req: &Request) -> Result<Arc<Site>, StoreError> {
        self.store.load_by(req.deadline())
    }

    pub fn layout(&self, req: &Request) -> LayoutOptions {
        LayoutOptions {
            authenticated: self.sessions.authenticated(req),
            local: self.local,
        }
    }

    /// Write `page` wrapped in the public layout.
    pub fn render(&self, res: &mut Response, req: &Request, site: &Site, page: &Page) -> HandlerResult {
        res.write(public_page(site, self.markdown.as_ref(), page, self.layout(req)));
        Ok(StatusCode(200))
    }

    pub fn render_dashboard(&self, res: &mut Response, title: &str, body: Markup) -> HandlerResult {
        res.write(dashboard_page(title, body, self.store.snapshot().stack_edit));
        Ok(StatusCode(200))
    }

    /// `Some(304)` when the client's copy of public content is still
    /// current; otherwise sets `Last-Modified` and returns `None`.
    ///
    /// Logged-in visitors see drafts and dashboard links, so they always
    /// get a fresh page.
    pub fn not_modified(&self, res: &mut Response, req: &Request, site: &Site) -> Option<StatusCode> {
        if self.sessions.authenticated(req) {
            return None;
        }
        match conditional_get(req, site.last_modified()) {
            Some(last_modified) => {
                res.set_header("Last-Modified", last_modified);
                None
            }
            None => Some(StatusCode(304)),
        }
    }
}

/// `302 Found` to `location`.
pub fn redirect(res: &mut Response, location: &str) -> HandlerResult {
    res.set_header("Location", location);
    Ok(StatusCode(302))
}

/// The routed application.
pub struct Web {
    app: Arc<App>,
    router: Router,
}

impl Web {
    pub fn new(app: App) -> Self {
        let app = Arc::new(app);
        let mut router = Router::new();
        routes::register(&mut router, &app);

        let shared = Arc::clone(&app);
        router.completion(move |res: &mut Response, req: &Request, status: StatusCode, err: Option<&anyhow::Error>| {
            complete(&shared, res, req, status, err);
        });

        Self { app, router }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    /// Run `req` through the prechecks and the router.
    pub fn handle(&self, req: Request) -> Response {
        let site = self.app.store.snapshot();
        match precheck(&req, &site, self.app.local) {
            Precheck::Continue => {}
            Precheck::NotFound => return self.router.respond(&req, Response::default(), StatusCode(404)),
            Precheck::Redirect(location) => {
                let mut res = Response::default();
                res.set_header("Location", location);
                return self.router.respond(&req, res, StatusCode(308));
            }
        }

        if is_dashboard(req.path()) && !self.app.sessions.authenticated(&req) {
            return self.router.respond(&req, Response::default(), StatusCode(404));
        }

        self.router.dispatch(req)
    }
}

/// Runs once for every response, whatever produced it.
fn complete(app: &App, res: &mut Response, req: &Request, status: StatusCode, err: Option<&anyhow::Error>) {
    if let Some(err) = err {
        log!("error"; "{} {} ({}): {err:#}", req.method(), req.path(), status.0);
    }

    if status.0 >= 400 {
        res.clear_body();
        res.set_header("Content-Type", "text/html; charset=utf-8");
        res.write(error_page(&app.store.snapshot(), app.markdown.as_ref(), status.0));
    }

    if !req.path().starts_with("/assets/") && res.header("Content-Type").is_none() {
        res.set_header("Content-Type", "text/html; charset=utf-8");
    }
}
