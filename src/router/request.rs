//! Transport-independent request and response.
//!
//! The server converts `tiny_http` requests into [`Request`] before dispatch
//! and turns the finished [`Response`] back into a `tiny_http` response, so
//! handlers and tests never touch sockets.

use super::Method;
use std::{borrow::Cow, net::SocketAddr, time::Instant};
use tiny_http::StatusCode;

/// Decoded `application/x-www-form-urlencoded` pairs (query string or body).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Values(Vec<(String, String)>);

impl Values {
    pub fn parse(input: &str) -> Self {
        let pairs = input
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (decode_component(key), decode_component(value))
            })
            .collect();
        Self(pairs)
    }

    /// First value for `key`, or `""`.
    pub fn get(&self, key: &str) -> &str {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map_or("", |(_, v)| v.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    /// HTML checkbox semantics: present with any non-empty value.
    pub fn checked(&self, key: &str) -> bool {
        !self.get(key).is_empty()
    }
}

/// `+` is a space in form encoding; invalid escapes pass through unchanged.
fn decode_component(s: &str) -> String {
    let s = s.replace('+', " ");
    let decoded = urlencoding::decode(&s).map(Cow::into_owned);
    decoded.unwrap_or(s)
}

/// Percent-decode one path segment.
pub(super) fn decode_segment(s: &str) -> Cow<'_, str> {
    urlencoding::decode(s).unwrap_or(Cow::Borrowed(s))
}

#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    /// Raw path, without the query string.
    path: String,
    query: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    params: Vec<(String, String)>,
    deadline: Option<Instant>,
    remote: Option<SocketAddr>,
}

impl Request {
    /// `url` is the request target, e.g. `/blog?q=rust`.
    pub fn new(method: Method, url: &str) -> Self {
        let (path, query) = url.split_once('?').unwrap_or((url, ""));
        let path = if path.is_empty() { "/" } else { path };
        Self {
            method,
            path: path.to_owned(),
            query: query.to_owned(),
            headers: Vec::new(),
            body: Vec::new(),
            params: Vec::new(),
            deadline: None,
            remote: None,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Form-encoded POST body, for tests and internal redirects.
    pub fn with_form(self, pairs: &[(&str, &str)]) -> Self {
        let body = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        self.with_header("Content-Type", "application/x-www-form-urlencoded")
            .with_body(body)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_remote(mut self, remote: Option<SocketAddr>) -> Self {
        self.remote = remote;
        self
    }

    pub const fn method(&self) -> Method {
        self.method
    }

    pub(super) fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string, without `?`.
    pub fn raw_query(&self) -> &str {
        &self.query
    }

    /// First query value for `key`, or `""`.
    pub fn query(&self, key: &str) -> String {
        Values::parse(&self.query).get(key).to_owned()
    }

    /// First header value, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body parsed as a URL-encoded form.
    pub fn form(&self) -> Values {
        Values::parse(&String::from_utf8_lossy(&self.body))
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.header("Cookie")?.split(';').find_map(|pair| {
            let (k, v) = pair.trim().split_once('=')?;
            (k == name).then_some(v)
        })
    }

    /// Captured route parameter, or `""` when the route has no such parameter.
    pub fn param(&self, name: &str) -> &str {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map_or("", |(_, v)| v.as_str())
    }

    pub(super) fn set_params(&mut self, params: Vec<(String, String)>) {
        self.params = params;
    }

    /// Point in time after which storage calls should give up.
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub const fn remote(&self) -> Option<SocketAddr> {
        self.remote
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: StatusCode(200),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }
}

impl Response {
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    pub(super) fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Set a header, replacing any previous value of the same name.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some(slot) => slot.1 = value,
            None => self.headers.push((name.to_owned(), value)),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn write(&mut self, bytes: impl AsRef<[u8]>) {
        self.body.extend_from_slice(bytes.as_ref());
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn clear_body(&mut self) {
        self.body.clear();
    }

    pub fn into_parts(self) -> (StatusCode, Vec<(String, String)>, Vec<u8>) {
        (self.status, self.headers, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_parse() {
        let v = Values::parse("title=Hello+World&tags=a%2Cb&empty=&flag");
        assert_eq!(v.get("title"), "Hello World");
        assert_eq!(v.get("tags"), "a,b");
        assert_eq!(v.get("empty"), "");
        assert!(v.has("flag"));
        assert!(!v.checked("flag"));
        assert_eq!(v.get("missing"), "");
    }

    #[test]
    fn test_values_first_wins() {
        let v = Values::parse("a=1&a=2");
        assert_eq!(v.get("a"), "1");
    }

    #[test]
    fn test_request_splits_query() {
        let req = Request::new(Method::Get, "/blog?q=rust%20lang");
        assert_eq!(req.path(), "/blog");
        assert_eq!(req.query("q"), "rust lang");
        assert_eq!(req.query("missing"), "");

        assert_eq!(Request::new(Method::Get, "?x=1").path(), "/");
    }

    #[test]
    fn test_request_headers_and_cookies() {
        let req = Request::new(Method::Get, "/")
            .with_header("Host", "example.com")
            .with_header("Cookie", "a=1; session=abc; b=2");
        assert_eq!(req.header("host"), Some("example.com"));
        assert_eq!(req.cookie("session"), Some("abc"));
        assert_eq!(req.cookie("nope"), None);
    }

    #[test]
    fn test_request_form() {
        let req = Request::new(Method::Post, "/").with_form(&[("title", "A & B"), ("tags", "x, y")]);
        let form = req.form();
        assert_eq!(form.get("title"), "A & B");
        assert_eq!(form.get("tags"), "x, y");
    }

    #[test]
    fn test_response_set_header_replaces() {
        let mut res = Response::default();
        res.set_header("Content-Type", "text/plain");
        res.set_header("content-type", "text/html");
        assert_eq!(res.headers().len(), 1);
        assert_eq!(res.header("Content-Type"), Some("text/html"));
    }
}
