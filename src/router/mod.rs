//! Method + path dispatch with a single completion hook.
//!
//! Handlers never write error pages themselves. They return a status, or an
//! error carrying one, and the router hands every outcome to one completion
//! callback:
//!
//! ```text
//! dispatch(req)
//!   ├─ trie[method] match ──► handler(res, req) ──┐
//!   ├─ HEAD, no HEAD route ─► GET handler ────────┤ (status, error)
//!   └─ no match ───────────► not_found(res, req) ─┤
//!                                                 ▼
//!                         completion(res, req, status, error)
//! ```
//!
//! # Matching
//!
//! Per path depth a literal segment beats `:param`, which beats `*wildcard`.
//! When two registrations could match the same path (two parameter names at
//! the same depth, or the exact same pattern twice) the one registered first
//! wins.

mod request;
mod tree;

pub use request::{Request, Response, Values};

use std::{
    fmt,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
};
use tiny_http::StatusCode;
use tree::{Node, parse_pattern, split_path};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    const ALL: [Self; 7] = [
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Patch,
        Self::Delete,
        Self::Head,
        Self::Options,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str().eq_ignore_ascii_case(s))
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A handler failure: the status to answer with plus the cause, which is
/// logged and never shown to the client.
#[derive(Debug)]
pub struct HandlerError {
    pub status: StatusCode,
    pub error: anyhow::Error,
}

impl HandlerError {
    pub fn new(status: u16, error: impl Into<anyhow::Error>) -> Self {
        Self {
            status: StatusCode(status),
            error: error.into(),
        }
    }

    pub fn bad_request(error: impl Into<anyhow::Error>) -> Self {
        Self::new(400, error)
    }
}

impl<E: Into<anyhow::Error>> From<E> for HandlerError {
    fn from(error: E) -> Self {
        Self::new(500, error)
    }
}

pub type HandlerResult = Result<StatusCode, HandlerError>;

pub trait Handler: Send + Sync {
    fn handle(&self, res: &mut Response, req: &Request) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(&mut Response, &Request) -> HandlerResult + Send + Sync,
{
    fn handle(&self, res: &mut Response, req: &Request) -> HandlerResult {
        self(res, req)
    }
}

/// Runs after every dispatch with the final status and the handler error, if any.
pub type Completion = Arc<dyn Fn(&mut Response, &Request, StatusCode, Option<&anyhow::Error>) + Send + Sync>;

pub struct Router {
    trees: [Node; 7],
    not_found: Arc<dyn Handler>,
    completion: Completion,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self {
            trees: Default::default(),
            not_found: Arc::new(|_: &mut Response, _: &Request| -> HandlerResult { Ok(StatusCode(404)) }),
            completion: Arc::new(|_: &mut Response, _: &Request, _: StatusCode, _: Option<&anyhow::Error>| {}),
        }
    }

    /// Register `handler` for `method` and `pattern`.
    ///
    /// # Panics
    ///
    /// On malformed patterns (see [`tree::parse_pattern`]).
    pub fn register(&mut self, method: Method, pattern: &str, handler: impl Handler + 'static) -> &mut Self {
        let segments = parse_pattern(pattern);
        self.trees[method.index()].insert(&segments, Arc::new(handler));
        self
    }

    pub fn get(&mut self, pattern: &str, handler: impl Handler + 'static) -> &mut Self {
        self.register(Method::Get, pattern, handler)
    }

    pub fn post(&mut self, pattern: &str, handler: impl Handler + 'static) -> &mut Self {
        self.register(Method::Post, pattern, handler)
    }

    pub fn put(&mut self, pattern: &str, handler: impl Handler + 'static) -> &mut Self {
        self.register(Method::Put, pattern, handler)
    }

    pub fn patch(&mut self, pattern: &str, handler: impl Handler + 'static) -> &mut Self {
        self.register(Method::Patch, pattern, handler)
    }

    pub fn delete(&mut self, pattern: &str, handler: impl Handler + 'static) -> &mut Self {
        self.register(Method::Delete, pattern, handler)
    }

    pub fn head(&mut self, pattern: &str, handler: impl Handler + 'static) -> &mut Self {
        self.register(Method::Head, pattern, handler)
    }

    pub fn options(&mut self, pattern: &str, handler: impl Handler + 'static) -> &mut Self {
        self.register(Method::Options, pattern, handler)
    }

    /// Handler for requests no route matches. Defaults to a bare 404.
    pub fn not_found(&mut self, handler: impl Handler + 'static) -> &mut Self {
        self.not_found = Arc::new(handler);
        self
    }

    pub fn completion(
        &mut self,
        completion: impl Fn(&mut Response, &Request, StatusCode, Option<&anyhow::Error>) + Send + Sync + 'static,
    ) -> &mut Self {
        self.completion = Arc::new(completion);
        self
    }

    /// Answer `req` with `status` without routing it, still running the
    /// completion callback. For checks that run before dispatch.
    pub fn respond(&self, req: &Request, res: Response, status: StatusCode) -> Response {
        self.finish(res, req, status, None)
    }

    /// Runs the completion callback. A `HEAD` answer keeps the length of
    /// whatever body was produced, but never the body itself.
    fn finish(&self, mut res: Response, req: &Request, status: StatusCode, error: Option<&anyhow::Error>) -> Response {
        res.set_status(status);
        (self.completion)(&mut res, req, status, error);
        if req.method() == Method::Head && !res.body().is_empty() {
            let len = res.body().len();
            res.clear_body();
            res.set_header("Content-Length", len.to_string());
        }
        res
    }

    /// Route `req`, run the handler and the completion callback, and return
    /// the finished response.
    pub fn dispatch(&self, mut req: Request) -> Response {
        let method = req.method();
        let segments: Vec<String> = split_path(req.path())
            .map(|s| request::decode_segment(s).into_owned())
            .collect();
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

        let mut head_fallback = false;
        let mut found = self.trees[method.index()].find(&segments);
        if found.is_none() && method == Method::Head {
            found = self.trees[Method::Get.index()].find(&segments);
            head_fallback = found.is_some();
        }

        let handler = match found {
            Some((handler, params)) => {
                req.set_params(params);
                handler
            }
            None => Arc::clone(&self.not_found),
        };

        // GET handlers see a GET even when answering a HEAD.
        if head_fallback {
            req.set_method(Method::Get);
        }

        let mut res = Response::default();
        let outcome = match catch_unwind(AssertUnwindSafe(|| handler.handle(&mut res, &req))) {
            Ok(outcome) => outcome,
            Err(_) => {
                res = Response::default();
                Err(HandlerError::new(500, anyhow::anyhow!("handler panicked")))
            }
        };

        if head_fallback {
            req.set_method(Method::Head);
        }

        let (status, error) = match outcome {
            Ok(status) => (status, None),
            Err(err) => (err.status, Some(err.error)),
        };
        self.finish(res, &req, status, error.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use parking_lot::Mutex;

    type Seen = Arc<Mutex<Vec<(u16, Option<String>)>>>;

    fn recording(router: &mut Router) -> Seen {
        let seen: Seen = Arc::default();
        let sink = Arc::clone(&seen);
        router.completion(move |res, _req, status, err| {
            sink.lock().push((status.0, err.map(|e| e.to_string())));
            if status.0 >= 400 && res.body().is_empty() {
                res.write(format!("error {}", status.0));
            }
        });
        seen
    }

    fn get(router: &Router, url: &str) -> Response {
        router.dispatch(Request::new(Method::Get, url))
    }

    #[test]
    fn test_param_extraction() {
        let mut router = Router::new();
        router.get("/user/:name", |res: &mut Response, req: &Request| -> HandlerResult {
            res.write(req.param("name"));
            res.write(format!("|{}", req.param("missing")));
            Ok(StatusCode(200))
        });

        let res = get(&router, "/user/jane");
        assert_eq!(res.status().0, 200);
        assert_eq!(res.body(), b"jane|");
    }

    #[test]
    fn test_param_is_percent_decoded() {
        let mut router = Router::new();
        router.get("/:slug", |res: &mut Response, req: &Request| -> HandlerResult {
            res.write(req.param("slug"));
            Ok(StatusCode(200))
        });
        assert_eq!(get(&router, "/hello%20world").body(), b"hello world");
    }

    #[test]
    fn test_literal_takes_precedence_regardless_of_order() {
        let mut router = Router::new();
        router.get("/user/:name", |_: &mut Response, _: &Request| -> HandlerResult { Ok(StatusCode(201)) });
        router.get("/user/me", |_: &mut Response, _: &Request| -> HandlerResult { Ok(StatusCode(202)) });

        assert_eq!(get(&router, "/user/me").status().0, 202);
        assert_eq!(get(&router, "/user/jane").status().0, 201);
    }

    #[test]
    fn test_wildcard_route() {
        let mut router = Router::new();
        router.get("/assets/*path", |res: &mut Response, req: &Request| -> HandlerResult {
            res.write(req.param("path"));
            Ok(StatusCode(200))
        });
        assert_eq!(get(&router, "/assets/css/a.css").body(), b"css/a.css");
    }

    #[test]
    fn test_methods_are_separate() {
        let mut router = Router::new();
        let seen = recording(&mut router);
        router.post("/form", |_: &mut Response, _: &Request| -> HandlerResult { Ok(StatusCode(303)) });
        router.delete("/form", |_: &mut Response, _: &Request| -> HandlerResult { Ok(StatusCode(204)) });

        assert_eq!(get(&router, "/form").status().0, 404);
        assert_eq!(router.dispatch(Request::new(Method::Post, "/form")).status().0, 303);
        assert_eq!(router.dispatch(Request::new(Method::Delete, "/form")).status().0, 204);
        assert_eq!(seen.lock().len(), 3);
    }

    #[test]
    fn test_head_falls_back_to_get() {
        let mut router = Router::new();
        router.get("/page", |res: &mut Response, req: &Request| -> HandlerResult {
            assert_eq!(req.method(), Method::Get);
            res.set_header("X-Test", "yes");
            res.write("hello");
            Ok(StatusCode(200))
        });

        let get_res = get(&router, "/page");
        let head_res = router.dispatch(Request::new(Method::Head, "/page"));

        assert_eq!(head_res.status(), get_res.status());
        assert_eq!(head_res.header("X-Test"), Some("yes"));
        assert_eq!(head_res.header("Content-Length"), Some("5"));
        assert!(head_res.body().is_empty());
        assert_eq!(get_res.body(), b"hello");
    }

    #[test]
    fn test_head_completion_sees_head() {
        let mut router = Router::new();
        router.get("/page", |res: &mut Response, _: &Request| -> HandlerResult {
            res.write("hello");
            Ok(StatusCode(200))
        });
        let methods: Arc<Mutex<Vec<Method>>> = Arc::default();
        let sink = Arc::clone(&methods);
        router.completion(move |_, req, _, _| sink.lock().push(req.method()));

        router.dispatch(Request::new(Method::Head, "/page"));
        assert_eq!(*methods.lock(), [Method::Head]);
    }

    #[test]
    fn test_head_not_found_has_no_body() {
        let mut router = Router::new();
        recording(&mut router);

        let res = router.dispatch(Request::new(Method::Head, "/nope"));
        assert_eq!(res.status().0, 404);
        assert!(res.body().is_empty());
        assert_eq!(res.header("Content-Length"), Some("9"));

        let res = router.respond(&Request::new(Method::Head, "/x/"), Response::default(), StatusCode(404));
        assert!(res.body().is_empty());
    }

    #[test]
    fn test_explicit_head_route_wins() {
        let mut router = Router::new();
        router.get("/x", |_: &mut Response, _: &Request| -> HandlerResult { Ok(StatusCode(200)) });
        router.head("/x", |_: &mut Response, _: &Request| -> HandlerResult { Ok(StatusCode(204)) });
        assert_eq!(router.dispatch(Request::new(Method::Head, "/x")).status().0, 204);
    }

    #[test]
    fn test_not_found_goes_through_completion() {
        let mut router = Router::new();
        let seen = recording(&mut router);

        let res = get(&router, "/nope");
        assert_eq!(res.status().0, 404);
        assert_eq!(res.body(), b"error 404");
        assert_eq!(seen.lock()[0], (404, None));
    }

    #[test]
    fn test_custom_not_found() {
        let mut router = Router::new();
        router.not_found(|res: &mut Response, _: &Request| -> HandlerResult {
            res.write("custom");
            Ok(StatusCode(404))
        });
        assert_eq!(get(&router, "/nope").body(), b"custom");
    }

    #[test]
    fn test_handler_error_reaches_completion() {
        let mut router = Router::new();
        let seen = recording(&mut router);
        router.get("/fail", |_: &mut Response, _: &Request| -> HandlerResult {
            Err(anyhow!("disk on fire").into())
        });
        router.get("/bad", |_: &mut Response, _: &Request| -> HandlerResult {
            Err(HandlerError::bad_request(anyhow!("csrf")))
        });

        let res = get(&router, "/fail");
        assert_eq!(res.status().0, 500);
        assert!(!String::from_utf8_lossy(res.body()).contains("disk on fire"));
        assert_eq!(get(&router, "/bad").status().0, 400);

        let seen = seen.lock();
        assert_eq!(seen[0], (500, Some("disk on fire".to_string())));
        assert_eq!(seen[1], (400, Some("csrf".to_string())));
    }

    #[test]
    fn test_question_mark_converts_errors() {
        fn parse(_: &mut Response, req: &Request) -> HandlerResult {
            let n: u32 = req.param("n").parse()?;
            Ok(StatusCode(if n > 0 { 200 } else { 404 }))
        }

        let mut router = Router::new();
        router.get("/n/:n", parse);
        assert_eq!(get(&router, "/n/3").status().0, 200);
        assert_eq!(get(&router, "/n/x").status().0, 500);
    }

    #[test]
    fn test_panicking_handler_becomes_500() {
        let mut router = Router::new();
        let seen = recording(&mut router);
        router.get("/panic", |res: &mut Response, _: &Request| -> HandlerResult {
            res.write("partial");
            panic!("boom")
        });

        let res = get(&router, "/panic");
        assert_eq!(res.status().0, 500);
        assert_eq!(res.body(), b"error 500");
        assert_eq!(seen.lock()[0].0, 500);
    }

    #[test]
    fn test_respond_runs_completion() {
        let mut router = Router::new();
        let seen = recording(&mut router);

        let mut res = Response::default();
        res.set_header("Location", "/x");
        let res = router.respond(&Request::new(Method::Get, "/x/"), res, StatusCode(308));
        assert_eq!(res.status().0, 308);
        assert_eq!(res.header("Location"), Some("/x"));
        assert_eq!(seen.lock()[0], (308, None));
    }

    #[test]
    fn test_method_parse() {
        assert_eq!(Method::parse("get"), Some(Method::Get));
        assert_eq!(Method::parse("OPTIONS"), Some(Method::Options));
        assert_eq!(Method::parse("TRACE"), None);
    }
}
