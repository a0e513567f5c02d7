//! Machine-readable views of the site: RSS feed and sitemap.

mod rss;
mod sitemap;

pub use self::rss::build_rss;
pub use sitemap::build_sitemap;
