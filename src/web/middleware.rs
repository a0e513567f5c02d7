//! Checks that run around route handlers.

use crate::{model::Site, router::Request};
use chrono::{DateTime, TimeZone, Utc};

/// What to do with a request before routing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precheck {
    Continue,
    NotFound,
    /// Permanent (308) redirect to this location.
    Redirect(String),
}

/// Canonical host and trailing slash policy.
///
/// Outside local mode, a request whose `X-Forwarded-Host` (or `Host`) does
/// not mention the site URL is sent to `{scheme}://{url}{path}`. A path with
/// a dot and a trailing slash is a 404; any other trailing slash is trimmed
/// by redirect.
pub fn precheck(req: &Request, site: &Site, local: bool) -> Precheck {
    let path = req.path();

    if !local && !site.url.is_empty() {
        let host = req
            .header("X-Forwarded-Host")
            .filter(|h| !h.is_empty())
            .or_else(|| req.header("Host"))
            .unwrap_or_default();
        if !host.contains(&site.url) {
            return Precheck::Redirect(format!("{}://{}{}", site.scheme, site.url, path));
        }
    }

    if path.contains('.') && path.ends_with('/') {
        return Precheck::NotFound;
    }

    if path != "/" && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        let target = if trimmed.is_empty() { "/" } else { trimmed };
        return Precheck::Redirect(target.to_owned());
    }

    Precheck::Continue
}

/// HTTP-date, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn http_date(t: DateTime<Utc>) -> String {
    t.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn parse_http_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(s.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Round to the nearest whole second, HTTP dates have no fraction.
fn round_to_second(t: DateTime<Utc>) -> DateTime<Utc> {
    let secs = t.timestamp() + i64::from(t.timestamp_subsec_nanos() >= 500_000_000);
    Utc.timestamp_opt(secs, 0).single().unwrap_or(t)
}

/// Conditional GET against `last_modified`.
///
/// Returns the `Last-Modified` header value to send, or `None` when the
/// client's `If-Modified-Since` copy is still current and a `304` applies.
pub fn conditional_get(req: &Request, last_modified: DateTime<Utc>) -> Option<String> {
    let last_modified = round_to_second(last_modified);
    match req.header("If-Modified-Since").and_then(parse_http_date) {
        Some(since) if since >= last_modified => None,
        _ => Some(http_date(last_modified)),
    }
}

/// Dashboard paths need a logged-in session.
pub fn is_dashboard(path: &str) -> bool {
    path == "/dashboard" || path.starts_with("/dashboard/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Method;

    fn site(url: &str) -> Site {
        let mut site = Site::default();
        site.scheme = "https".into();
        site.url = url.into();
        site
    }

    fn get(path: &str) -> Request {
        Request::new(Method::Get, path).with_header("Host", "blog.example.com")
    }

    #[test]
    fn test_trailing_slash_redirects() {
        let s = site("");
        assert_eq!(precheck(&get("/blog/"), &s, false), Precheck::Redirect("/blog".into()));
        assert_eq!(precheck(&get("/a/b//"), &s, false), Precheck::Redirect("/a/b".into()));
        assert_eq!(precheck(&get("/"), &s, false), Precheck::Continue);
        assert_eq!(precheck(&get("/blog"), &s, false), Precheck::Continue);
    }

    #[test]
    fn test_dotted_trailing_slash_is_not_found() {
        let s = site("");
        assert_eq!(precheck(&get("/rss.xml/"), &s, false), Precheck::NotFound);
        assert_eq!(precheck(&get("/assets/css/"), &s, false), Precheck::Redirect("/assets/css".into()));
    }

    #[test]
    fn test_canonical_host_redirect() {
        let s = site("blog.example.com");
        assert_eq!(precheck(&get("/x"), &s, false), Precheck::Continue);

        let other = Request::new(Method::Get, "/x?y=1").with_header("Host", "old.example.net");
        assert_eq!(
            precheck(&other, &s, false),
            Precheck::Redirect("https://blog.example.com/x".into())
        );
        assert_eq!(precheck(&other, &s, true), Precheck::Continue);

        let proxied = Request::new(Method::Get, "/x")
            .with_header("Host", "10.0.0.1:8080")
            .with_header("X-Forwarded-Host", "blog.example.com");
        assert_eq!(precheck(&proxied, &s, false), Precheck::Continue);
    }

    #[test]
    fn test_conditional_get() {
        let modified = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();

        let fresh = Request::new(Method::Get, "/");
        assert_eq!(conditional_get(&fresh, modified).as_deref(), Some("Wed, 01 May 2024 10:00:00 GMT"));

        let cached = Request::new(Method::Get, "/").with_header("If-Modified-Since", "Wed, 01 May 2024 10:00:00 GMT");
        assert_eq!(conditional_get(&cached, modified), None);

        let stale = Request::new(Method::Get, "/").with_header("If-Modified-Since", "Wed, 01 May 2024 09:59:59 GMT");
        assert!(conditional_get(&stale, modified).is_some());

        let garbage = Request::new(Method::Get, "/").with_header("If-Modified-Since", "yesterday");
        assert!(conditional_get(&garbage, modified).is_some());
    }

    #[test]
    fn test_round_to_second() {
        let t = Utc.timestamp_opt(100, 600_000_000).unwrap();
        assert_eq!(round_to_second(t).timestamp(), 101);
        let t = Utc.timestamp_opt(100, 400_000_000).unwrap();
        assert_eq!(round_to_second(t).timestamp(), 100);
    }

    #[test]
    fn test_is_dashboard() {
        assert!(is_dashboard("/dashboard"));
        assert!(is_dashboard("/dashboard/posts/1"));
        assert!(!is_dashboard("/dashboards"));
        assert!(!is_dashboard("/login/admin"));
    }
}
