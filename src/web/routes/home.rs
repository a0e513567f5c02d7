//! Home page and site settings.

use super::{bind, check_csrf, post};
use crate::{
    router::{HandlerResult, Request, Response, Router},
    web::{App, form::Form, redirect, render::Page},
};
use maud::PreEscaped;
use std::sync::Arc;

const EMPTY_HOME: &str = "*No content yet.*";

pub(super) fn register(router: &mut Router, app: &Arc<App>) {
    router
        .get("/", bind(app, show))
        .get("/dashboard", bind(app, edit))
        .post("/dashboard", bind(app, update))
        .get("/dashboard/reload", bind(app, reload));
}

/// Home content, or the blog index when the site sends "home" elsewhere.
fn show(app: &App, res: &mut Response, req: &Request) -> HandlerResult {
    let site = app.load(req)?;
    if !site.home_url.is_empty() {
        return post::index(app, res, req);
    }
    if let Some(status) = app.not_modified(res, req, &site) {
        return Ok(status);
    }

    let content = if site.content.is_empty() { EMPTY_HOME } else { site.content.as_str() };
    let page = Page {
        canonical: site.site_url(None),
        body: PreEscaped(app.markdown.render(content)),
        ..Default::default()
    };
    app.render(res, req, &site, &page)
}

fn edit(app: &App, res: &mut Response, req: &Request) -> HandlerResult {
    let site = app.load(req)?;
    let csrf = app.sessions.set_csrf(req, res);

    // Suggest the host being used right now until a domain is saved.
    let domain = if site.url.is_empty() {
        req.header("Host").unwrap_or_default()
    } else {
        site.url.as_str()
    };

    let form = Form::new(&csrf)
        .text("Site title", "title", &site.title)
        .text("Subtitle", "subtitle", &site.subtitle)
        .text("Author", "author", &site.author)
        .text("Description", "pdescription", &site.description)
        .text("Scheme (http or https)", "scheme", &site.scheme)
        .text("Domain", "domain", domain)
        .text("Login path (/login/...)", "loginurl", &site.login_url)
        .text("Home URL (leave empty to show the home content at /)", "homeurl", &site.home_url)
        .text("Language", "lang", &site.lang)
        .text("Google Analytics ID", "googleanalytics", &site.google_analytics_id)
        .text("Disqus ID", "disqus", &site.disqus_id)
        .text("Cactus site name", "cactus", &site.cactus_site_name)
        .text("Fediverse creator", "fedicreator", &site.fedi_creator)
        .text("Bridgy Fed domain", "bridgyfeddomain", &site.bridgy_fed_domain)
        .text("Bridgy Fed web redirect", "bridgyfedweb", &site.bridgy_fed_web)
        .checkbox("Show dates as YYYY-MM-DD", "isodate", site.iso_date)
        .textarea("Footer", "footer", site.footer_markdown(), 3)
        .textarea("Home content", "content", &site.content, 20)
        .finish("/dashboard", "Save");

    app.render_dashboard(res, "Edit site", form)
}

fn update(app: &App, res: &mut Response, req: &Request) -> HandlerResult {
    check_csrf(app, req)?;
    let form = req.form();

    app.store.update(req.deadline(), |site| {
        site.title = form.get("title").to_owned();
        site.subtitle = form.get("subtitle").to_owned();
        site.author = form.get("author").to_owned();
        site.description = form.get("pdescription").to_owned();
        site.scheme = form.get("scheme").to_owned();
        site.url = form.get("domain").to_owned();
        site.login_url = form.get("loginurl").to_owned();
        site.home_url = form.get("homeurl").to_owned();
        site.lang = form.get("lang").to_owned();
        site.google_analytics_id = form.get("googleanalytics").to_owned();
        site.disqus_id = form.get("disqus").to_owned();
        site.cactus_site_name = form.get("cactus").to_owned();
        site.fedi_creator = form.get("fedicreator").to_owned();
        site.bridgy_fed_domain = form.get("bridgyfeddomain").to_owned();
        site.bridgy_fed_web = form.get("bridgyfedweb").to_owned();
        site.iso_date = form.checked("isodate");
        site.footer = Some(form.get("footer").to_owned());
        site.content = form.get("content").to_owned();
        site.apply_defaults();
        site.touch();
        Some(())
    })?;

    redirect(res, "/dashboard")
}

/// Drop the cached copy and read the document again.
fn reload(app: &App, res: &mut Response, req: &Request) -> HandlerResult {
    app.store.invalidate_site();
    app.load(req)?;
    redirect(res, "/dashboard")
}

#[cfg(test)]
mod tests {
    use crate::{
        router::{Method, Request},
        web::testing::*,
    };

    #[test]
    fn test_empty_home() {
        let (web, _) = web();
        let res = web.handle(Request::new(Method::Get, "/"));
        assert_eq!(res.status().0, 200);
        assert!(body(&res).contains("<em>No content yet.</em>"));
        assert!(res.header("Last-Modified").is_some());
    }

    #[test]
    fn test_home_content_and_not_modified() {
        let (web, _) = web_with(r##"{"content":"# Welcome","updated":"2024-05-01T10:00:00Z"}"##);
        let res = web.handle(Request::new(Method::Get, "/"));
        assert!(body(&res).contains("<h1>Welcome</h1>"));
        assert_eq!(res.header("Last-Modified"), Some("Wed, 01 May 2024 10:00:00 GMT"));

        let again = Request::new(Method::Get, "/").with_header("If-Modified-Since", "Wed, 01 May 2024 10:00:00 GMT");
        let res = web.handle(again);
        assert_eq!(res.status().0, 304);
        assert!(res.body().is_empty());
    }

    #[test]
    fn test_home_url_shows_blog_index() {
        let (web, _) = web_with(r#"{"homeurl":"https://me.example.com","content":"hidden"}"#);
        let html = body(&web.handle(Request::new(Method::Get, "/")));
        assert!(!html.contains("hidden"));
        assert!(html.contains(r#"href="https://me.example.com""#));
    }

    #[test]
    fn test_update_settings() {
        let (web, backend) = web();
        let mut client = Client::new(&web);
        assert_eq!(client.login().status().0, 302);

        let res = client.submit(
            "/dashboard",
            &[
                ("title", "Renamed"),
                ("domain", "blog.example.com"),
                ("scheme", ""),
                ("loginurl", ""),
                ("isodate", "on"),
                ("content", "Hello there"),
            ],
        );
        assert_eq!(res.status().0, 302);
        assert_eq!(res.header("Location"), Some("/dashboard"));

        let site = web.app().store.snapshot();
        assert_eq!(site.title, "Renamed");
        assert_eq!(site.scheme, "http");
        assert_eq!(site.login_url, "admin");
        assert!(site.iso_date);
        assert!(String::from_utf8(backend.contents()).unwrap().contains("Renamed"));
    }

    #[test]
    fn test_update_requires_csrf() {
        let (web, backend) = web();
        let mut client = Client::new(&web);
        client.login();

        let forged = Request::new(Method::Post, "/dashboard").with_form(&[("title", "Pwned"), ("token", "nope")]);
        let res = client.send(forged);
        assert_eq!(res.status().0, 400);
        assert_eq!(backend.saves(), 0);
        assert_eq!(web.app().store.snapshot().title, "Test Blog");
    }

    #[test]
    fn test_reload_picks_up_external_change() {
        let (web, backend) = web();
        let mut client = Client::new(&web);
        client.login();

        backend.set(r#"{"title":"Edited on disk"}"#);
        assert_eq!(web.app().store.snapshot().title, "Test Blog");

        let res = client.get("/dashboard/reload");
        assert_eq!(res.status().0, 302);
        assert_eq!(web.app().store.snapshot().title, "Edited on disk");
    }
}
