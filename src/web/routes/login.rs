//! Operator login and logout.

use super::{bind, check_csrf};
use crate::{
    log,
    router::{HandlerResult, Request, Response, Router},
    web::{App, form::Form, redirect, render::Page},
};
use maud::html;
use std::sync::Arc;
use tiny_http::StatusCode;

pub(super) fn register(router: &mut Router, app: &Arc<App>) {
    router
        .get("/login/:slug", bind(app, show))
        .post("/login/:slug", bind(app, submit))
        .get("/dashboard/logout", bind(app, logout));
}

/// The login form, only under the site's configured login path.
fn show(app: &App, res: &mut Response, req: &Request) -> HandlerResult {
    let site = app.load(req)?;
    if req.param("slug") != site.login_url {
        return Ok(StatusCode(404));
    }

    let csrf = app.sessions.set_csrf(req, res);
    let action = format!("/login/{}", urlencoding::encode(&site.login_url));
    let form = Form::new(&csrf)
        .text("Username", "username", "")
        .password("Password", "password")
        .finish(&action, "Log in");

    let page = Page {
        title: "Login".into(),
        body: html! {
            h1 { "Login" }
            (form)
        },
        ..Default::default()
    };
    app.render(res, req, &site, &page)
}

/// Failed attempts go back to the home page without saying why.
fn submit(app: &App, res: &mut Response, req: &Request) -> HandlerResult {
    let site = app.load(req)?;
    if req.param("slug") != site.login_url {
        return Ok(StatusCode(404));
    }
    check_csrf(app, req)?;

    let form = req.form();
    let username = form.get("username");
    if !app.credentials.verify(username, form.get("password")) {
        let from = req.remote().map(|addr| addr.ip().to_string()).unwrap_or_default();
        log!("login"; "failed login for `{username}` from {from}");
        return redirect(res, "/");
    }

    app.sessions.login(req, res, username);
    log!("login"; "`{username}` logged in");
    redirect(res, "/dashboard")
}

fn logout(app: &App, res: &mut Response, req: &Request) -> HandlerResult {
    app.sessions.logout(req, res);
    redirect(res, "/")
}
