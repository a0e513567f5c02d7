//! Public blog index and single posts.

use super::bind;
use crate::{
    model::{Post, Site, TagList},
    router::{HandlerResult, Request, Response, Router},
    web::{
        App,
        render::{Page, human_date, plaintext_blurb},
    },
};
use maud::{Markup, PreEscaped, html};
use std::sync::Arc;
use tiny_http::StatusCode;

pub(super) fn register(router: &mut Router, app: &Arc<App>) {
    router.get("/blog", bind(app, index)).get("/:slug", bind(app, show));
}

/// Published posts, or with `?q=tag` every published post or page
/// carrying exactly that tag.
pub(super) fn index(app: &App, res: &mut Response, req: &Request) -> HandlerResult {
    let site = app.load(req)?;
    if let Some(status) = app.not_modified(res, req, &site) {
        return Ok(status);
    }

    let query = req.query("q");
    let body = if query.is_empty() {
        let tags = site.tags(true);
        html! {
            h1 { "Blog" }
            (post_list(&site, &site.published_posts()))
            @if !tags.is_empty() {
                (tag_links(&tags))
            }
        }
    } else {
        let posts: Vec<Post> = site
            .posts_and_pages(true)
            .into_iter()
            .filter(|p| p.tags.contains(&query))
            .map(|p| p.post)
            .collect();
        html! {
            h1 { "Filtering for \"" (query) "\"" }
            (post_list(&site, &posts))
        }
    };

    let page = Page {
        title: "Blog".into(),
        canonical: format!("{}/blog", site.site_url(None)),
        body,
        ..Default::default()
    };
    app.render(res, req, &site, &page)
}

/// A post or page by slug. Unpublished ones only with `?preview=true`.
fn show(app: &App, res: &mut Response, req: &Request) -> HandlerResult {
    let site = app.load(req)?;
    let Some(post) = site.post_by_slug(req.param("slug")) else {
        return Ok(StatusCode(404));
    };

    let preview = req.query("preview").eq_ignore_ascii_case("true");
    if !post.published && !preview {
        return Ok(StatusCode(404));
    }
    if post.published
        && let Some(status) = app.not_modified(res, req, &site)
    {
        return Ok(status);
    }

    let body = html! {
        @if !post.page {
            h1 { (post.title) }
            p { i { time datetime=(post.timestamp.format("%Y-%m-%d").to_string()) { (human_date(&site, post.timestamp)) } } }
        }
        (PreEscaped(app.markdown.render(&post.content)))
        @if !post.tags.is_empty() {
            (tag_links(&post.tags))
        }
    };

    let canonical = if post.canonical.is_empty() {
        site.site_url(Some(&post))
    } else {
        post.canonical.clone()
    };
    let page = Page {
        title: post.title.clone(),
        description: plaintext_blurb(&post.content),
        canonical,
        body,
        // pages are standalone, only posts get a thread
        comments: (!post.page).then(|| post.url.clone()),
    };
    app.render(res, req, &site, &page)
}

fn post_list(site: &Site, posts: &[Post]) -> Markup {
    html! {
        @if posts.is_empty() {
            p { "No posts yet." }
        } @else {
            ul class="blog-posts" {
                @for post in posts {
                    li {
                        span { i { time datetime=(post.timestamp.format("%Y-%m-%d").to_string()) { (human_date(site, post.timestamp)) } } }
                        " "
                        a href=(format!("/{}", post.url)) { (post.title) }
                    }
                }
            }
        }
    }
}

fn tag_links(tags: &TagList) -> Markup {
    html! {
        p class="tags" {
            @for tag in tags {
                a href=(format!("/blog?q={}", urlencoding::encode(&tag.name))) { "#" (tag.name) }
                " "
            }
        }
    }
}
