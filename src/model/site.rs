//! The site document.

use super::{Post, PostWithId, Tag, TagList};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, btree_map::Entry};

/// Footer shown when the site has none configured.
pub const DEFAULT_FOOTER: &str = "Powered by plume";

pub const DEFAULT_SCHEME: &str = "http";

/// Login path segment, `/login/admin` unless configured otherwise.
pub const DEFAULT_LOGIN_URL: &str = "admin";

type Posts = BTreeMap<String, Post>;

/// Singleton configuration + content document.
///
/// # Thread Safety
///
/// `posts` sits behind an `RwLock` so listings and lookups can run while
/// another thread calls [`Site::update_post`]. Every accessor returns owned
/// copies. Scalar fields are only ever replaced together with the whole
/// document.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Site {
    pub title: String,
    pub subtitle: String,
    pub author: String,
    #[serde(rename = "fedicreator")]
    pub fedi_creator: String,
    pub favicon: String,
    pub description: String,
    pub scheme: String,
    pub url: String,
    #[serde(rename = "homeurl")]
    pub home_url: String,
    #[serde(rename = "loginurl")]
    pub login_url: String,
    #[serde(rename = "googleanalytics")]
    pub google_analytics_id: String,
    #[serde(rename = "disqus")]
    pub disqus_id: String,
    #[serde(rename = "cactus")]
    pub cactus_site_name: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,

    /// Home page markdown.
    pub content: String,

    pub styles: String,
    #[serde(rename = "stylesappend")]
    pub styles_append: bool,
    #[serde(rename = "stackedit")]
    pub stack_edit: bool,
    pub prism: bool,
    #[serde(rename = "isodate")]
    pub iso_date: bool,
    pub lang: String,

    #[serde(rename = "bridgyFedDomain")]
    pub bridgy_fed_domain: String,
    #[serde(rename = "bridgyFedWeb")]
    pub bridgy_fed_web: String,

    /// Footer markdown, `None` means [`DEFAULT_FOOTER`].
    pub footer: Option<String>,

    #[serde(serialize_with = "serialize_posts", deserialize_with = "deserialize_posts")]
    posts: RwLock<Posts>,
}

fn serialize_posts<S: Serializer>(posts: &RwLock<Posts>, serializer: S) -> Result<S::Ok, S::Error> {
    posts.read().serialize(serializer)
}

fn deserialize_posts<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RwLock<Posts>, D::Error> {
    let posts: Option<Posts> = Option::deserialize(deserializer)?;
    Ok(RwLock::new(posts.unwrap_or_default()))
}

impl Clone for Site {
    fn clone(&self) -> Self {
        Self {
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            author: self.author.clone(),
            fedi_creator: self.fedi_creator.clone(),
            favicon: self.favicon.clone(),
            description: self.description.clone(),
            scheme: self.scheme.clone(),
            url: self.url.clone(),
            home_url: self.home_url.clone(),
            login_url: self.login_url.clone(),
            google_analytics_id: self.google_analytics_id.clone(),
            disqus_id: self.disqus_id.clone(),
            cactus_site_name: self.cactus_site_name.clone(),
            created: self.created,
            updated: self.updated,
            content: self.content.clone(),
            styles: self.styles.clone(),
            styles_append: self.styles_append,
            stack_edit: self.stack_edit,
            prism: self.prism,
            iso_date: self.iso_date,
            lang: self.lang.clone(),
            bridgy_fed_domain: self.bridgy_fed_domain.clone(),
            bridgy_fed_web: self.bridgy_fed_web.clone(),
            footer: self.footer.clone(),
            posts: RwLock::new(self.posts.read().clone()),
        }
    }
}

impl Site {
    /// Fill in fields that must never be empty after load.
    pub fn apply_defaults(&mut self) {
        if self.scheme.is_empty() {
            self.scheme = DEFAULT_SCHEME.to_owned();
        }
        if self.login_url.is_empty() {
            self.login_url = DEFAULT_LOGIN_URL.to_owned();
        }
    }

    /// `scheme://url`, plus `/slug` when a post is given.
    pub fn site_url(&self, post: Option<&Post>) -> String {
        let mut url = format!("{}://{}", self.scheme, self.url);
        if let Some(post) = post {
            url.push('/');
            url.push_str(&post.url);
        }
        url
    }

    pub fn footer_markdown(&self) -> &str {
        self.footer.as_deref().unwrap_or(DEFAULT_FOOTER)
    }

    /// Published blog entries, newest first.
    pub fn published_posts(&self) -> Vec<Post> {
        self.collect_sorted(|p| p.published && !p.page)
    }

    /// Published static pages, same order as posts.
    pub fn published_pages(&self) -> Vec<Post> {
        self.collect_sorted(|p| p.published && p.page)
    }

    fn collect_sorted(&self, keep: impl Fn(&Post) -> bool) -> Vec<Post> {
        let mut result: Vec<_> = {
            let posts = self.posts.read();
            posts.values().filter(|p| keep(p)).cloned().collect()
        };
        result.sort_by(Post::compare);
        result
    }

    /// Posts and pages with their IDs, optionally only published ones.
    pub fn posts_and_pages(&self, only_published: bool) -> Vec<PostWithId> {
        let mut result: Vec<_> = {
            let posts = self.posts.read();
            posts
                .iter()
                .filter(|(_, p)| !only_published || p.published)
                .map(|(id, p)| PostWithId {
                    id: id.clone(),
                    post: p.clone(),
                })
                .collect()
        };
        result.sort_by(PostWithId::compare);
        result
    }

    /// Unique tags across posts, sorted by name (case-insensitive).
    ///
    /// A name used on several posts keeps its earliest timestamp.
    pub fn tags(&self, only_published: bool) -> TagList {
        let mut unique: BTreeMap<String, Tag> = BTreeMap::new();
        {
            let posts = self.posts.read();
            for post in posts.values() {
                if only_published && !post.published {
                    continue;
                }
                for tag in &post.tags {
                    match unique.entry(tag.name.clone()) {
                        Entry::Vacant(e) => {
                            e.insert(tag.clone());
                        }
                        Entry::Occupied(mut e) => {
                            if tag.timestamp < e.get().timestamp {
                                e.get_mut().timestamp = tag.timestamp;
                            }
                        }
                    }
                }
            }
        }

        let mut tags: Vec<_> = unique.into_values().collect();
        tags.sort_by(|a, b| a.compare(b).then_with(|| a.name.cmp(&b.name)));
        TagList(tags)
    }

    /// Find a post by its slug. Linear scan.
    pub fn post_by_slug(&self, slug: &str) -> Option<PostWithId> {
        let posts = self.posts.read();
        posts
            .iter()
            .find(|(_, p)| p.url == slug)
            .map(|(id, p)| PostWithId {
                id: id.clone(),
                post: p.clone(),
            })
    }

    pub fn post_by_id(&self, id: &str) -> Option<Post> {
        self.posts.read().get(id).cloned()
    }

    /// Insert or fully replace a post, or delete it when `post` is `None`.
    pub fn update_post(&self, id: &str, post: Option<Post>) {
        let mut posts = self.posts.write();
        match post {
            Some(post) => {
                posts.insert(id.to_owned(), post);
            }
            None => {
                posts.remove(id);
            }
        }
    }

    pub fn post_count(&self) -> usize {
        self.posts.read().len()
    }

    /// Latest of the site's own update time and every post's update time.
    pub fn last_modified(&self) -> DateTime<Utc> {
        let posts = self.posts.read();
        posts
            .values()
            .map(|p| p.updated)
            .fold(self.updated, Ord::max)
    }

    pub fn touch(&mut self) {
        self.updated = Utc::now();
    }

    /// `https://{bridgy_fed_domain}{path}`, or `None` when federation is off.
    pub fn bridgy_fed_url(&self, path: &str) -> Option<String> {
        if self.bridgy_fed_domain.is_empty() {
            return None;
        }
        let path = if path.is_empty() { "/" } else { path };
        Some(format!("https://{}{}", self.bridgy_fed_domain, path))
    }
}
