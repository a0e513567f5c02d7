//! Cookie sessions, CSRF tokens and operator credentials.
//!
//! Sessions live in memory only; a restart logs the operator out. Every
//! visitor that loads a form gets a session so its CSRF token has somewhere
//! to live; only a successful login attaches a user to it.

use crate::router::{Request, Response};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};
use uuid::Uuid;

/// Form field carrying the CSRF token.
pub const CSRF_FIELD: &str = "token";

/// Upper bound on live sessions.
const MAX_SESSIONS: usize = 1024;

/// Sessions without a user only carry a CSRF token for the next form post.
const ANONYMOUS_LIFETIME: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone)]
struct Session {
    user: Option<String>,
    csrf: Option<String>,
    expires: Instant,
}

pub struct Sessions {
    cookie: String,
    lifetime: Duration,
    /// Add `Secure` to the cookie (not in local mode).
    secure: bool,
    table: Mutex<HashMap<String, Session>>,
}

impl Sessions {
    pub fn new(cookie: impl Into<String>, lifetime: Duration, secure: bool) -> Self {
        Self {
            cookie: cookie.into(),
            lifetime,
            secure,
            table: Mutex::new(HashMap::new()),
        }
    }

    /// Logged-in user for this request, if any.
    pub fn user(&self, req: &Request) -> Option<String> {
        let token = req.cookie(&self.cookie)?;
        let table = self.table.lock();
        let session = table.get(token)?;
        if session.expires <= Instant::now() {
            return None;
        }
        session.user.clone()
    }

    pub fn authenticated(&self, req: &Request) -> bool {
        self.user(req).is_some()
    }

    /// Issue a fresh CSRF token for the request's session, creating the
    /// session (and its cookie) when needed.
    pub fn set_csrf(&self, req: &Request, res: &mut Response) -> String {
        let csrf = random_token();
        self.with_session(req, res, |session| session.csrf = Some(csrf.clone()));
        csrf
    }

    /// Whether the submitted form carries the session's CSRF token.
    pub fn check_csrf(&self, req: &Request) -> bool {
        let Some(token) = req.cookie(&self.cookie) else {
            return false;
        };
        let submitted = req.form().get(CSRF_FIELD).to_owned();
        if submitted.is_empty() {
            return false;
        }

        let table = self.table.lock();
        table
            .get(token)
            .filter(|s| s.expires > Instant::now())
            .and_then(|s| s.csrf.as_deref())
            .is_some_and(|expected| constant_time_eq(expected.as_bytes(), submitted.as_bytes()))
    }

    /// Attach `user` under a new session token, so a token seen before login
    /// can't be reused to ride the logged-in session.
    pub fn login(&self, req: &Request, res: &mut Response, user: &str) {
        if let Some(old) = req.cookie(&self.cookie) {
            self.table.lock().remove(old);
        }
        let token = random_token();
        self.insert(
            token.clone(),
            Session {
                user: Some(user.to_owned()),
                csrf: None,
                expires: Instant::now() + self.lifetime,
            },
        );
        self.set_cookie(res, &token);
    }

    pub fn logout(&self, req: &Request, res: &mut Response) {
        if let Some(token) = req.cookie(&self.cookie) {
            self.table.lock().remove(token);
        }
        let secure = if self.secure { "; Secure" } else { "" };
        res.set_header(
            "Set-Cookie",
            format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax{secure}", self.cookie),
        );
    }

    fn with_session(&self, req: &Request, res: &mut Response, update: impl FnOnce(&mut Session)) {
        let now = Instant::now();
        if let Some(token) = req.cookie(&self.cookie) {
            let mut table = self.table.lock();
            if let Some(session) = table.get_mut(token)
                && session.expires > now
            {
                update(session);
                return;
            }
        }

        let mut session = Session {
            user: None,
            csrf: None,
            expires: now + self.lifetime.min(ANONYMOUS_LIFETIME),
        };
        update(&mut session);
        let token = random_token();
        self.insert(token.clone(), session);
        self.set_cookie(res, &token);
    }

    /// Insert under the cap: expired sessions go first, then the one
    /// closest to expiry, anonymous before logged in.
    fn insert(&self, token: String, session: Session) {
        let mut table = self.table.lock();
        if table.len() >= MAX_SESSIONS {
            let now = Instant::now();
            table.retain(|_, s| s.expires > now);
        }
        while table.len() >= MAX_SESSIONS {
            let victim = table
                .iter()
                .min_by_key(|(_, s)| (s.user.is_some(), s.expires))
                .map(|(token, _)| token.clone());
            match victim {
                Some(victim) => table.remove(&victim),
                None => break,
            };
        }
        table.insert(token, session);
    }

    fn set_cookie(&self, res: &mut Response, token: &str) {
        let secure = if self.secure { "; Secure" } else { "" };
        res.set_header(
            "Set-Cookie",
            format!("{}={token}; Path=/; HttpOnly; SameSite=Lax{secure}", self.cookie),
        );
    }
}

/// 256 random bits, hex encoded.
fn random_token() -> String {
    let mut bytes = [0u8; 32];
    bytes[..16].copy_from_slice(Uuid::new_v4().as_bytes());
    bytes[16..].copy_from_slice(Uuid::new_v4().as_bytes());
    hex::encode(bytes)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Hex SHA-256 of `password`, the format stored in `[auth] password_hash`.
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// The single operator account.
#[derive(Debug, Clone)]
pub struct Credentials {
    username: String,
    password_hash: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into().to_ascii_lowercase(),
        }
    }

    /// An empty configured hash never matches.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        if self.password_hash.is_empty() {
            return false;
        }
        let hash = hash_password(password);
        let user_ok = constant_time_eq(username.as_bytes(), self.username.as_bytes());
        let pass_ok = constant_time_eq(hash.as_bytes(), self.password_hash.as_bytes());
        user_ok && pass_ok
    }
}
