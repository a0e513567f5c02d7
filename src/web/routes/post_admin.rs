//! Dashboard post management: list, create, edit, delete.

use super::{bind, check_csrf};
use crate::{
    model::{Post, Site},
    router::{HandlerError, HandlerResult, Request, Response, Router, Values},
    web::{App, form::Form, notify::Webmention, redirect},
};
use anyhow::anyhow;
use chrono::{DateTime, NaiveDate, Utc};
use maud::html;
use std::sync::Arc;
use tiny_http::StatusCode;
use uuid::Uuid;

pub(super) fn register(router: &mut Router, app: &Arc<App>) {
    router
        .get("/dashboard/posts", bind(app, index))
        .get("/dashboard/posts/new", bind(app, create))
        .post("/dashboard/posts/new", bind(app, store))
        .get("/dashboard/posts/:id", bind(app, edit))
        .post("/dashboard/posts/:id", bind(app, update))
        .get("/dashboard/posts/:id/delete", bind(app, destroy));
}

/// Submitted post form, validated before the document is touched.
struct PostFields {
    title: String,
    slug: String,
    canonical: String,
    timestamp: DateTime<Utc>,
    lang: String,
    content: String,
    tags: String,
    page: bool,
    published: bool,
    skip_webmention: bool,
}

impl PostFields {
    fn parse(form: &Values, now: DateTime<Utc>) -> Result<Self, HandlerError> {
        Ok(Self {
            title: form.get("title").to_owned(),
            slug: form.get("slug").trim().to_owned(),
            canonical: form.get("canonical_url").to_owned(),
            timestamp: parse_published_date(form.get("published_date"), now)?,
            lang: form.get("lang").to_owned(),
            content: form.get("content").to_owned(),
            tags: form.get("tags").to_owned(),
            page: form.checked("is_page"),
            published: form.checked("publish"),
            skip_webmention: form.checked("skip_webmention"),
        })
    }

    /// Overwrite the editable fields of `post`. Tags already on the post
    /// keep their first-assignment time.
    fn apply(&self, post: &mut Post, now: DateTime<Utc>) {
        post.title.clone_from(&self.title);
        post.url.clone_from(&self.slug);
        post.canonical.clone_from(&self.canonical);
        post.timestamp = self.timestamp;
        post.lang.clone_from(&self.lang);
        post.content.clone_from(&self.content);
        post.tags = post.tags.reparse(&self.tags);
        post.page = self.page;
        post.published = self.published;
        post.updated = now;
    }

    /// The webmention to send once this post is saved, if any.
    fn mention(&self, site: &Site, post: &Post) -> Option<Webmention> {
        if !self.published || self.skip_webmention {
            return None;
        }
        Webmention::for_post(site, post)
    }
}

/// `YYYY-MM-DD` at midnight UTC; empty means today.
fn parse_published_date(value: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, HandlerError> {
    let value = value.trim();
    let date = if value.is_empty() {
        now.date_naive()
    } else {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map_err(|err| HandlerError::bad_request(anyhow!("invalid published_date `{value}`: {err}")))?
    };
    Ok(date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc())
}

fn index(app: &App, res: &mut Response, req: &Request) -> HandlerResult {
    let site = app.load(req)?;
    let posts = site.posts_and_pages(false);

    let body = html! {
        p { a href="/dashboard/posts/new" { "New post" } }
        @if posts.is_empty() {
            p { "No posts yet." }
        } @else {
            table {
                @for p in &posts {
                    tr class=[(!p.published).then_some("draft")] {
                        td { (p.timestamp.format("%Y-%m-%d").to_string()) }
                        td { a href=(format!("/dashboard/posts/{}", urlencoding::encode(&p.id))) { (p.title) } }
                        td { @if p.page { "page" } @else { "post" } }
                        td { a href=(format!("/{}?preview=true", p.url)) { "view" } }
                    }
                }
            }
        }
    };

    app.render_dashboard(res, "Posts", body)
}

fn post_form(csrf: &str, post: &Post, federated: bool) -> Form {
    let mut form = Form::new(csrf)
        .text("Title", "title", &post.title)
        .text("Slug", "slug", &post.url)
        .text("Canonical URL", "canonical_url", &post.canonical)
        .date("Published date", "published_date", &post.timestamp.format("%Y-%m-%d").to_string())
        .text("Language", "lang", &post.lang)
        .text("Tags (comma separated)", "tags", &post.tags.to_string())
        .textarea("Content", "content", &post.content, 24)
        .checkbox("Page (kept out of the blog list and feed)", "is_page", post.page)
        .checkbox("Published", "publish", post.published);
    if federated {
        form = form.checkbox("Skip Bridgy Fed webmention", "skip_webmention", false);
    }
    form
}

fn create(app: &App, res: &mut Response, req: &Request) -> HandlerResult {
    let site = app.load(req)?;
    let csrf = app.sessions.set_csrf(req, res);
    let draft = Post {
        timestamp: Utc::now(),
        ..Default::default()
    };
    let federated = !site.bridgy_fed_domain.is_empty();
    let form = post_form(&csrf, &draft, federated).finish("/dashboard/posts/new", "Create");
    app.render_dashboard(res, "New post", form)
}

/// Create a post under a fresh UUID.
fn store(app: &App, res: &mut Response, req: &Request) -> HandlerResult {
    check_csrf(app, req)?;
    let now = Utc::now();
    let fields = PostFields::parse(&req.form(), now)?;

    let mut post = Post {
        created: now,
        ..Default::default()
    };
    fields.apply(&mut post, now);

    let id = Uuid::new_v4().to_string();
    let mention = app.store.update(req.deadline(), |site| {
        let mention = fields.mention(site, &post);
        site.update_post(&id, Some(post));
        Some(mention)
    })?;

    if let Some(mention) = mention.flatten() {
        app.notifier.send(mention);
    }
    redirect(res, &format!("/dashboard/posts/{id}"))
}

fn edit(app: &App, res: &mut Response, req: &Request) -> HandlerResult {
    let site = app.load(req)?;
    let id = req.param("id");
    let Some(post) = site.post_by_id(id) else {
        return Ok(StatusCode(404));
    };

    let csrf = app.sessions.set_csrf(req, res);
    let action = format!("/dashboard/posts/{}", urlencoding::encode(id));
    let form = post_form(&csrf, &post, !site.bridgy_fed_domain.is_empty()).finish(&action, "Save");
    let body = html! {
        (form)
        p {
            a href=(format!("/{}?preview=true", post.url)) { "View" }
            " | "
            a href=(format!("{action}/delete")) { "Delete" }
        }
    };

    app.render_dashboard(res, "Edit post", body)
}

/// Replace the editable fields of an existing post.
fn update(app: &App, res: &mut Response, req: &Request) -> HandlerResult {
    check_csrf(app, req)?;
    let now = Utc::now();
    let fields = PostFields::parse(&req.form(), now)?;
    let id = req.param("id");

    let mention = app.store.update(req.deadline(), |site| {
        let mut post = site.post_by_id(id)?;
        fields.apply(&mut post, now);
        let mention = fields.mention(site, &post);
        site.update_post(id, Some(post));
        Some(mention)
    })?;

    let Some(mention) = mention else {
        return Ok(StatusCode(404));
    };
    if let Some(mention) = mention {
        app.notifier.send(mention);
    }
    redirect(res, &format!("/dashboard/posts/{}", urlencoding::encode(id)))
}

fn destroy(app: &App, res: &mut Response, req: &Request) -> HandlerResult {
    let id = req.param("id");
    let deleted = app.store.update(req.deadline(), |site| {
        site.post_by_id(id)?;
        site.update_post(id, None);
        Some(())
    })?;

    match deleted {
        Some(()) => redirect(res, "/dashboard/posts"),
        None => Ok(StatusCode(404)),
    }
}
