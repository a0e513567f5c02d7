//! Sitemap generation.
//!
//! Lists the home page, every published post and page, and one blog search
//! URL per tag, for search engine indexing.
//!
//! # Sitemap Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9" xmlns:xhtml="http://www.w3.org/1999/xhtml">
//!   <url>
//!     <loc>https://example.com/hello</loc>
//!     <lastmod>2025-01-01</lastmod>
//!   </url>
//! </urlset>
//! ```

use crate::model::Site;
use chrono::{DateTime, Utc};
use std::fmt::Write;

// ============================================================================
// Constants
// ============================================================================

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";

// ============================================================================
// Public API
// ============================================================================

/// Render the sitemap for the current site.
pub fn build_sitemap(site: &Site) -> String {
    Sitemap::from_site(site).into_xml()
}

// ============================================================================
// Sitemap Implementation
// ============================================================================

struct Sitemap {
    urls: Vec<UrlEntry>,
}

struct UrlEntry {
    loc: String,
    lastmod: DateTime<Utc>,
}

impl Sitemap {
    fn from_site(site: &Site) -> Self {
        let base = site.site_url(None);
        let mut urls = vec![UrlEntry {
            loc: base.clone(),
            lastmod: site.updated,
        }];

        urls.extend(site.posts_and_pages(true).iter().map(|p| UrlEntry {
            loc: site.site_url(Some(&p.post)),
            lastmod: p.timestamp,
        }));

        urls.extend(site.tags(true).iter().map(|tag| UrlEntry {
            loc: format!("{base}/blog?q={}", urlencoding::encode(&tag.name)),
            lastmod: tag.timestamp,
        }));

        Self { urls }
    }

    fn into_xml(self) -> String {
        let mut xml = String::with_capacity(256 + self.urls.len() * 96);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        let _ = writeln!(xml, r#"<urlset xmlns="{SITEMAP_NS}" xmlns:xhtml="{XHTML_NS}">"#);

        for entry in self.urls {
            xml.push_str("  <url>\n");
            let _ = writeln!(xml, "    <loc>{}</loc>", escape_xml(&entry.loc));
            let _ = writeln!(xml, "    <lastmod>{}</lastmod>", entry.lastmod.format("%Y-%m-%d"));
            xml.push_str("  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// ============================================================================
// Tests
// ============================================================================
