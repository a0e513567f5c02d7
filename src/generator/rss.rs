//! RSS feed for published posts.
//!
//! Pages never appear in the feed. With a tag filter only posts carrying
//! exactly that tag name are included.

use crate::{model::Site, web::render::Markdown};
use rss::{ChannelBuilder, GuidBuilder, ItemBuilder};

// ============================================================================
// Public API
// ============================================================================

/// Render the feed as an RSS 2.0 document.
pub fn build_rss(site: &Site, md: &dyn Markdown, tag: Option<&str>) -> String {
    let items: Vec<rss::Item> = site
        .published_posts()
        .iter()
        .filter(|post| tag.is_none_or(|tag| post.tags.contains(tag)))
        .map(|post| {
            let link = site.site_url(Some(post));
            ItemBuilder::default()
                .title(Some(post.title.clone()))
                .link(Some(link.clone()))
                .guid(Some(GuidBuilder::default().permalink(true).value(link).build()))
                .description(Some(md.render(&post.content)))
                .pub_date(Some(post.timestamp.to_rfc2822()))
                .build()
        })
        .collect();

    let title = match tag {
        Some(tag) => format!("{} #{tag}", site.title),
        None => site.title.clone(),
    };
    let language = if site.lang.is_empty() { "en-us" } else { site.lang.as_str() };

    ChannelBuilder::default()
        .title(title)
        .link(site.site_url(None))
        .description(site.description.clone())
        .language(Some(language.to_owned()))
        .generator(Some("plume".to_owned()))
        .last_build_date(Some(site.last_modified().to_rfc2822()))
        .items(items)
        .build()
        .to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{Post, TagList},
        web::render::CommonMark,
    };
    use chrono::{TimeZone, Utc};
    use rss::{Channel, validation::Validate};

    fn post(title: &str, url: &str, tags: &str, published: bool, page: bool) -> Post {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        Post {
            title: title.into(),
            url: url.into(),
            content: format!("# {title}\n\nbody of {url}"),
            timestamp: at,
            tags: TagList::parse_at(tags, at),
            published,
            page,
            ..Default::default()
        }
    }

    fn site() -> Site {
        let mut site = Site::default();
        site.title = "My Blog".into();
        site.description = "notes".into();
        site.scheme = "https".into();
        site.url = "blog.example.com".into();
        site.update_post("1", Some(post("First", "first", "rust,web", true, false)));
        site.update_post("2", Some(post("Draft", "draft", "rust", false, false)));
        site.update_post("3", Some(post("About", "about", "rust", true, true)));
        site.update_post("4", Some(post("Second", "second", "web", true, false)));
        site
    }

    fn parse(xml: &str) -> Channel {
        xml.parse::<Channel>().unwrap()
    }

    #[test]
    fn test_feed_lists_published_posts_only() {
        let xml = build_rss(&site(), &CommonMark, None);
        let channel = parse(&xml);
        channel.validate().unwrap();

        let titles: Vec<_> = channel.items().iter().filter_map(|i| i.title()).collect();
        assert_eq!(titles, ["First", "Second"]);
        assert_eq!(channel.generator(), Some("plume"));
        assert_eq!(channel.language(), Some("en-us"));
        assert_eq!(channel.link(), "https://blog.example.com");
    }

    #[test]
    fn test_item_fields() {
        let channel = parse(&build_rss(&site(), &CommonMark, None));
        let item = &channel.items()[0];

        assert_eq!(item.link(), Some("https://blog.example.com/first"));
        assert_eq!(item.guid().map(|g| g.value()), Some("https://blog.example.com/first"));
        assert!(item.pub_date().unwrap().contains("Jan 2024"));
        assert!(item.description().unwrap().contains("<h1>First</h1>"));
    }

    #[test]
    fn test_tag_filter_is_exact() {
        let channel = parse(&build_rss(&site(), &CommonMark, Some("rust")));
        let titles: Vec<_> = channel.items().iter().filter_map(|i| i.title()).collect();
        assert_eq!(titles, ["First"]);
        assert_eq!(channel.title(), "My Blog #rust");

        let none = parse(&build_rss(&site(), &CommonMark, Some("Rus")));
        assert!(none.items().is_empty());
    }

    #[test]
    fn test_site_language() {
        let mut s = site();
        s.lang = "de".into();
        assert_eq!(parse(&build_rss(&s, &CommonMark, None)).language(), Some("de"));
    }
}
