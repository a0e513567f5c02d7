//! Crawler and feed endpoints, plus the Bridgy Fed discovery redirects.

use super::bind;
use crate::{
    generator::{build_rss, build_sitemap},
    router::{HandlerResult, Request, Response, Router},
    web::App,
};
use std::sync::Arc;
use tiny_http::StatusCode;

const ROBOTS: &str = "User-agent: *\nAllow: /\n";

pub(super) fn register(router: &mut Router, app: &Arc<App>) {
    router
        .get("/robots.txt", bind(app, robots))
        .get("/sitemap.xml", bind(app, sitemap))
        .get("/rss.xml", bind(app, rss))
        .get("/.well-known/host-meta", bind(app, fediverse))
        .get("/.well-known/webfinger", bind(app, fediverse));
}

fn robots(_app: &App, res: &mut Response, _req: &Request) -> HandlerResult {
    res.set_header("Content-Type", "text/plain; charset=utf-8");
    res.write(ROBOTS);
    Ok(StatusCode(200))
}

fn sitemap(app: &App, res: &mut Response, req: &Request) -> HandlerResult {
    let site = app.load(req)?;
    res.set_header("Content-Type", "application/xml; charset=utf-8");
    res.write(build_sitemap(&site));
    Ok(StatusCode(200))
}

/// `?q=tag` limits the feed to one tag.
fn rss(app: &App, res: &mut Response, req: &Request) -> HandlerResult {
    let site = app.load(req)?;
    let query = req.query("q");
    let tag = Some(query.as_str()).filter(|q| !q.is_empty());

    res.set_header("Content-Type", "application/rss+xml; charset=utf-8");
    res.write(build_rss(&site, app.markdown.as_ref(), tag));
    Ok(StatusCode(200))
}

/// Send fediverse discovery to the Bridgy Fed web domain, query intact.
fn fediverse(app: &App, res: &mut Response, req: &Request) -> HandlerResult {
    let site = app.load(req)?;
    if site.bridgy_fed_web.is_empty() {
        return Ok(StatusCode(404));
    }

    let mut location = format!("https://{}{}", site.bridgy_fed_web, req.path());
    if !req.raw_query().is_empty() {
        location.push('?');
        location.push_str(req.raw_query());
    }
    res.set_header("Location", location);
    Ok(StatusCode(302))
}
