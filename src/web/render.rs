//! HTML rendering: markdown, page layouts and error pages.
//!
//! Markdown goes through pulldown-cmark with raw HTML turned into text.
//! Layouts are maud templates, so every interpolated value is escaped
//! unless it is wrapped in `PreEscaped` here.

use crate::model::Site;
use chrono::{DateTime, Utc};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html as md_html};

/// Longest meta description taken from post content.
const BLURB_LEN: usize = 160;

const PRISM_JS: &str = "https://cdn.jsdelivr.net/npm/prismjs@1/prism.min.js";
const STACKEDIT_JS: &str = "https://unpkg.com/stackedit-js@1.0.7/docs/lib/stackedit.min.js";
const CACTUS_JS: &str = "https://latest.cactus.chat/cactus.js";
const CACTUS_CSS: &str = "https://latest.cactus.chat/style.css";

/// Puts an "Open StackEdit" button above the content textarea.
const STACKEDIT_HOOK: &str = r#"document.querySelectorAll('textarea[name="content"]').forEach(function(el){var b=document.createElement('button');b.type='button';b.textContent='Open StackEdit';b.onclick=function(){var s=new Stackedit();s.openFile({content:{text:el.value}});s.on('fileChange',function(f){el.value=f.content.text;});};el.parentNode.insertBefore(b,el);});"#;

/// Markdown to HTML.
pub trait Markdown: Send + Sync {
    fn render(&self, source: &str) -> String;
}

/// CommonMark with tables, footnotes, strikethrough and task lists.
///
/// Raw HTML in the source is shown as text, and links or images with a
/// scheme other than `http`, `https` or `mailto` lose their target.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommonMark;

impl Markdown for CommonMark {
    fn render(&self, source: &str) -> String {
        let parser = Parser::new_ext(source, markdown_options()).map(neutralize);
        let mut out = String::with_capacity(source.len() + source.len() / 2);
        md_html::push_html(&mut out, parser);
        out
    }
}

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

fn neutralize(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link { link_type, dest_url, title, id }) if !safe_url(&dest_url) => {
            Event::Start(Tag::Link { link_type, dest_url: CowStr::Borrowed(""), title, id })
        }
        Event::Start(Tag::Image { link_type, dest_url, title, id }) if !safe_url(&dest_url) => {
            Event::Start(Tag::Image { link_type, dest_url: CowStr::Borrowed(""), title, id })
        }
        other => other,
    }
}

/// Relative URLs and the schemes a reader can follow without running code.
fn safe_url(url: &str) -> bool {
    let url = url.trim();
    let Some(colon) = url.find(':') else {
        return true;
    };
    // a colon after the first path, query or fragment delimiter is not a scheme
    if url[..colon].contains(['/', '?', '#']) {
        return true;
    }
    let scheme = url[..colon].to_ascii_lowercase();
    matches!(scheme.as_str(), "http" | "https" | "mailto")
}

/// First stretch of plain text from markdown, for meta descriptions.
pub fn plaintext_blurb(markdown: &str) -> String {
    let mut text = String::new();
    let mut in_code_block = false;
    for event in Parser::new_ext(markdown, markdown_options()) {
        match event {
            Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
            Event::End(TagEnd::CodeBlock) => in_code_block = false,
            Event::Text(t) | Event::Code(t) if !in_code_block => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            Event::End(TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item) => text.push(' '),
            _ => {}
        }
    }
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if text.chars().count() <= BLURB_LEN {
        return text;
    }
    let cut: String = text.chars().take(BLURB_LEN).collect();
    match cut.rfind(' ') {
        Some(space) => format!("{}...", &cut[..space]),
        None => format!("{cut}..."),
    }
}

/// Date as shown to readers, ISO or `02 Jan, 2006` depending on the site.
pub fn human_date(site: &Site, date: DateTime<Utc>) -> String {
    if site.iso_date {
        date.format("%Y-%m-%d").to_string()
    } else {
        date.format("%d %b, %Y").to_string()
    }
}

/// A public page to be wrapped in the site layout.
pub struct Page {
    /// Page title; empty means just the site title.
    pub title: String,
    pub description: String,
    pub canonical: String,
    pub body: Markup,
    /// Comment thread identifier. `None` renders no comment section.
    pub comments: Option<String>,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            canonical: String::new(),
            body: PreEscaped(String::new()),
            comments: None,
        }
    }
}

/// Per-request switches for the public layout.
#[derive(Debug, Default, Clone, Copy)]
pub struct LayoutOptions {
    pub authenticated: bool,
    /// Drop third-party scripts (analytics, comments).
    pub local: bool,
}

/// `value` as a JavaScript string literal that is safe inside `<script>`.
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_default().replace("</", "<\\/")
}

fn analytics(id: &str) -> Markup {
    let src = format!("https://www.googletagmanager.com/gtag/js?id={}", urlencoding::encode(id));
    html! {
        script async src=(src) {}
        script {
            (PreEscaped(format!(
                "window.dataLayer=window.dataLayer||[];function gtag(){{dataLayer.push(arguments);}}gtag('js',new Date());gtag('config',{});",
                js_string(id)
            )))
        }
    }
}

/// Disqus and Cactus threads, whichever the site has configured.
fn comments(site: &Site, page: &Page, thread: &str) -> Markup {
    html! {
        @if !site.disqus_id.is_empty() {
            div id="disqus_thread" {}
            script {
                (PreEscaped(format!(
                    "var disqus_config=function(){{this.page.url={url};this.page.identifier={id};}};(function(){{var d=document,s=d.createElement('script');s.src={src};s.setAttribute('data-timestamp',+new Date());(d.head||d.body).appendChild(s);}})();",
                    url = js_string(&page.canonical),
                    id = js_string(thread),
                    src = js_string(&format!("https://{}.disqus.com/embed.js", site.disqus_id)),
                )))
            }
        }
        @if !site.cactus_site_name.is_empty() {
            link rel="stylesheet" href=(CACTUS_CSS) type="text/css";
            script src=(CACTUS_JS) {}
            div id="comment-section" {}
            script {
                (PreEscaped(format!(
                    r#"initComments({{node:document.getElementById("comment-section"),defaultHomeserverUrl:"https://matrix.cactus.chat:8448",serverName:"cactus.chat",siteName:{},commentSectionId:{}}});"#,
                    js_string(&site.cactus_site_name),
                    js_string(thread),
                )))
            }
        }
    }
}

pub fn public_page(site: &Site, md: &dyn Markdown, page: &Page, opts: LayoutOptions) -> String {
    let site_title = if site.title.is_empty() { "Blog" } else { site.title.as_str() };
    let title = if page.title.is_empty() {
        site_title.to_owned()
    } else {
        format!("{} | {}", page.title, site_title)
    };
    let description = if page.description.is_empty() {
        &site.description
    } else {
        &page.description
    };
    let lang = if site.lang.is_empty() { "en" } else { site.lang.as_str() };
    let home = if site.home_url.is_empty() { "/" } else { site.home_url.as_str() };

    let markup = html! {
        (DOCTYPE)
        html lang=(lang) {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                meta name="description" content=(description);
                @if !site.author.is_empty() {
                    meta name="author" content=(site.author);
                }
                @if !site.fedi_creator.is_empty() {
                    meta name="fediverse:creator" content=(site.fedi_creator);
                }
                @if !page.canonical.is_empty() {
                    link rel="canonical" href=(page.canonical);
                }
                @if !site.favicon.is_empty() {
                    link rel="icon" href=(site.favicon);
                }
                link rel="alternate" type="application/rss+xml" title=(site_title) href="/rss.xml";
                @if site.styles.is_empty() || site.styles_append {
                    link rel="stylesheet" href="/assets/css/style.css";
                }
                @if !site.styles.is_empty() {
                    // closing tags in stored CSS would end the element early
                    style { (PreEscaped(site.styles.replace("</", "<\\/"))) }
                }
                @if !opts.local && !site.google_analytics_id.is_empty() {
                    (analytics(&site.google_analytics_id))
                }
            }
            body {
                header {
                    a class="title" href=(home) { h2 { (site_title) } }
                    @if !site.subtitle.is_empty() {
                        p class="subtitle" { (site.subtitle) }
                    }
                    nav {
                        @if !site.home_url.is_empty() {
                            a href=(home) { "Home" }
                        }
                        a href="/blog" { "Blog" }
                        @for p in site.published_pages() {
                            a href=(format!("/{}", p.url)) { (p.title) }
                        }
                        @if opts.authenticated {
                            a href="/dashboard" { "Dashboard" }
                        }
                    }
                }
                main {
                    (page.body)
                    @if let (false, Some(thread)) = (opts.local, &page.comments) {
                        (comments(site, page, thread))
                    }
                }
                footer { (PreEscaped(md.render(site.footer_markdown()))) }
                @if site.prism {
                    script src=(PRISM_JS) {}
                }
            }
        }
    };
    markup.into_string()
}

/// Dashboard layout. `stack_edit` adds the StackEdit button to content fields.
pub fn dashboard_page(title: &str, body: Markup, stack_edit: bool) -> String {
    let markup = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                meta name="robots" content="noindex";
                title { (title) " | Dashboard" }
                link rel="stylesheet" href="/assets/css/style.css";
                link rel="stylesheet" href="/assets/css/dashboard.css";
            }
            body {
                header {
                    nav {
                        a href="/" { "Site" }
                        a href="/dashboard" { "Home" }
                        a href="/dashboard/posts" { "Posts" }
                        a href="/dashboard/posts/new" { "New post" }
                        a href="/dashboard/styles" { "Styles" }
                        a href="/dashboard/reload" { "Reload" }
                        a href="/dashboard/logout" { "Log out" }
                    }
                }
                main {
                    h1 { (title) }
                    (body)
                }
                @if stack_edit {
                    script src=(STACKEDIT_JS) {}
                    script { (PreEscaped(STACKEDIT_HOOK)) }
                }
            }
        }
    };
    markup.into_string()
}

/// Generic page for an error status. Never includes error details.
pub fn error_page(site: &Site, md: &dyn Markdown, status: u16) -> String {
    let message = match status {
        404 => "The page you are looking for could not be found.",
        400..=499 => "The request could not be processed.",
        _ => "Something went wrong on our end. Please try again later.",
    };
    let page = Page {
        title: status.to_string(),
        body: html! {
            h1 { (status) }
            p { (message) }
        },
        ..Default::default()
    };
    public_page(site, md, &page, LayoutOptions { local: true, ..Default::default() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn md(s: &str) -> String {
        CommonMark.render(s)
    }

    #[test]
    fn test_markdown_blocks() {
        assert_eq!(md("# Title\n\nHello\nworld"), "<h1>Title</h1>\n<p>Hello\nworld</p>\n");
        assert_eq!(md("###### six"), "<h6>six</h6>\n");
        assert_eq!(md("####### seven"), "<p>####### seven</p>\n");
        assert_eq!(md("#tag"), "<p>#tag</p>\n");
        assert_eq!(md(""), "");
    }

    #[test]
    fn test_markdown_code_fence() {
        assert_eq!(md("```\n<b>x</b>\n```\nafter"), "<pre><code>&lt;b&gt;x&lt;/b&gt;\n</code></pre>\n<p>after</p>\n");
    }

    #[test]
    fn test_markdown_inline() {
        assert_eq!(md("*No content yet.*"), "<p><em>No content yet.</em></p>\n");
        assert_eq!(md("a **b** `<c>`"), "<p>a <strong>b</strong> <code>&lt;c&gt;</code></p>\n");
        assert_eq!(
            md("[plume](https://example.com/?a=1&b=2)"),
            "<p><a href=\"https://example.com/?a=1&amp;b=2\">plume</a></p>\n"
        );
        assert!(md("| a |\n|---|\n| 1 |").contains("<table>"));
    }

    #[test]
    fn test_markdown_escapes_html() {
        let block = md("<script>alert(1)</script>");
        assert!(!block.contains("<script>"));
        assert!(block.contains("&lt;script&gt;"));

        let inline = md("hi <img src=x onerror=alert(1)> there");
        assert!(!inline.contains("<img"));
        assert!(inline.contains("&lt;img"));
    }

    #[test]
    fn test_markdown_drops_unsafe_links() {
        let html = md("[x](javascript:alert(1)) ![y](JavaScript:alert(2)) [z](data:text/html,hi)");
        assert!(!html.to_lowercase().contains("javascript:"));
        assert!(!html.contains("data:"));
        assert!(html.contains("<a href=\"\">x</a>"));

        assert!(md("[m](mailto:me@example.com)").contains("href=\"mailto:me@example.com\""));
        assert!(md("[r](/blog?q=a:b)").contains("href=\"/blog?q=a:b\""));
    }

    #[test]
    fn test_plaintext_blurb() {
        assert_eq!(plaintext_blurb("# Hi\n\n*Some* text"), "Hi Some text");
        assert_eq!(plaintext_blurb("a [link](https://x.example) and\n```\ncode\n```"), "a link and");
        let long = "word ".repeat(100);
        let blurb = plaintext_blurb(&long);
        assert!(blurb.ends_with("..."));
        assert!(blurb.chars().count() <= BLURB_LEN + 3);
    }

    #[test]
    fn test_human_date() {
        let date = Utc.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap();
        let mut site = Site::default();
        assert_eq!(human_date(&site, date), "07 Mar, 2024");
        site.iso_date = true;
        assert_eq!(human_date(&site, date), "2024-03-07");
    }

    #[test]
    fn test_public_page_escapes_and_styles() {
        let mut site = Site::default();
        site.title = "A <b> Blog".into();
        site.styles = "body{color:red}".into();
        site.google_analytics_id = "G-1".into();
        let page = Page {
            title: "Post".into(),
            body: html! { p { "hi" } },
            ..Default::default()
        };

        let html = public_page(&site, &CommonMark, &page, LayoutOptions::default());
        assert!(html.contains("<title>Post | A &lt;b&gt; Blog</title>"));
        assert!(html.contains("<style>body{color:red}</style>"));
        assert!(!html.contains("/assets/css/style.css"));
        assert!(html.contains("googletagmanager"));
        assert!(html.contains("gtag('config',\"G-1\")"));
        assert!(html.contains("<p>hi</p>"));

        let local = public_page(&site, &CommonMark, &page, LayoutOptions { local: true, ..Default::default() });
        assert!(!local.contains("googletagmanager"));
    }

    #[test]
    fn test_values_are_not_substituted_twice() {
        let mut site = Site::default();
        site.title = "{body}".into();
        site.description = "{footer} {nav}".into();
        let page = Page {
            title: "{title}".into(),
            body: html! { p { "{scripts}" } },
            ..Default::default()
        };

        let html = public_page(&site, &CommonMark, &page, LayoutOptions::default());
        assert!(html.contains("<title>{title} | {body}</title>"));
        assert!(html.contains(r#"content="{footer} {nav}""#));
        assert!(html.contains("<p>{scripts}</p>"));
        assert_eq!(html.matches("<footer>").count(), 1);
    }

    #[test]
    fn test_analytics_id_cannot_break_out() {
        let mut site = Site::default();
        site.google_analytics_id = "G-1');alert(1);('</script><script>x".into();
        let html = public_page(&site, &CommonMark, &Page::default(), LayoutOptions::default());
        assert!(!html.contains("</script><script>x"));
        assert!(!html.contains("('G-1')"));
    }

    #[test]
    fn test_site_identity_in_layout() {
        let mut site = Site::default();
        site.subtitle = "Notes & <things>".into();
        site.author = "Jo".into();
        site.fedi_creator = "@jo@example.social".into();
        let html = public_page(&site, &CommonMark, &Page::default(), LayoutOptions::default());
        assert!(html.contains(r#"<p class="subtitle">Notes &amp; &lt;things&gt;</p>"#));
        assert!(html.contains(r#"<meta name="author" content="Jo">"#));
        assert!(html.contains(r#"<meta name="fediverse:creator" content="@jo@example.social">"#));

        let bare = public_page(&Site::default(), &CommonMark, &Page::default(), LayoutOptions::default());
        assert!(!bare.contains("subtitle"));
        assert!(!bare.contains("name=\"author\""));
        assert!(!bare.contains("fediverse:creator"));
    }

    #[test]
    fn test_comment_sections() {
        let mut site = Site::default();
        site.disqus_id = "myblog".into();
        site.cactus_site_name = "my-site".into();
        let page = Page {
            canonical: "https://blog.example.com/hello".into(),
            comments: Some("hello".into()),
            ..Default::default()
        };

        let html = public_page(&site, &CommonMark, &page, LayoutOptions::default());
        assert!(html.contains(r#"<div id="disqus_thread"></div>"#));
        assert!(html.contains(r#"s.src="https://myblog.disqus.com/embed.js""#));
        assert!(html.contains(r#"this.page.url="https://blog.example.com/hello""#));
        assert!(html.contains(CACTUS_JS));
        assert!(html.contains(r#"<div id="comment-section"></div>"#));
        assert!(html.contains(r#"siteName:"my-site",commentSectionId:"hello""#));

        let local = public_page(&site, &CommonMark, &page, LayoutOptions { local: true, ..Default::default() });
        assert!(!local.contains("disqus"));
        assert!(!local.contains("cactus"));

        let no_thread = Page { comments: None, ..Default::default() };
        let html = public_page(&site, &CommonMark, &no_thread, LayoutOptions::default());
        assert!(!html.contains("disqus_thread"));
    }

    #[test]
    fn test_dashboard_page() {
        let html = dashboard_page("Posts <1>", html! { p { "x" } }, false);
        assert!(html.contains("<title>Posts &lt;1&gt; | Dashboard</title>"));
        assert!(html.contains("<h1>Posts &lt;1&gt;</h1><p>x</p>"));
        assert!(html.contains(r#"<meta name="robots" content="noindex">"#));
        assert!(!html.contains("stackedit"));

        let html = dashboard_page("Edit", html! {}, true);
        assert!(html.contains(STACKEDIT_JS));
        assert!(html.contains("Open StackEdit"));
    }

    #[test]
    fn test_error_page_is_generic() {
        let html = error_page(&Site::default(), &CommonMark, 500);
        assert!(html.contains("<h1>500</h1>"));
        assert!(html.contains("Something went wrong"));
    }
}
