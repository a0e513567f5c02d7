//! Outbound webmentions to a Bridgy Fed instance after a post is published.
//!
//! Sending happens on a detached thread with a short timeout. The request
//! that triggered it never waits on it and never sees its failure; the
//! outcome only shows up in the log.

use crate::{
    log,
    model::{Post, Site},
};
use reqwest::blocking::Client;
use std::{thread, time::Duration};

const TIMEOUT: Duration = Duration::from_secs(1);

/// What a webmention would carry: `source` links `target`, posted to `endpoint`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Webmention {
    pub endpoint: String,
    pub source: String,
    pub target: String,
}

impl Webmention {
    /// `None` when the site has no Bridgy Fed domain.
    pub fn for_post(site: &Site, post: &Post) -> Option<Self> {
        Some(Self {
            endpoint: site.bridgy_fed_url("/webmention")?,
            source: site.site_url(Some(post)),
            target: site.bridgy_fed_url("/")?,
        })
    }

    fn form(&self) -> [(&'static str, &str); 2] {
        [("source", self.source.as_str()), ("target", self.target.as_str())]
    }
}

pub struct Notifier {
    /// Log instead of sending.
    dry_run: bool,
}

impl Notifier {
    pub const fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Fire and forget.
    pub fn send(&self, mention: Webmention) {
        if self.dry_run {
            log!("webmention"; "local mode, not sending {} -> {}", mention.source, mention.endpoint);
            return;
        }

        let spawned = thread::Builder::new()
            .name("webmention".into())
            .spawn(move || deliver(&mention));
        if let Err(err) = spawned {
            log!("error"; "webmention thread: {err}");
        }
    }
}

fn deliver(mention: &Webmention) {
    let client = match Client::builder().timeout(TIMEOUT).build() {
        Ok(client) => client,
        Err(err) => {
            log!("error"; "webmention client: {err}");
            return;
        }
    };

    match client.post(&mention.endpoint).form(&mention.form()).send() {
        Ok(response) if response.status().is_success() => {
            log!("webmention"; "{} -> {}", mention.source, response.status());
        }
        Ok(response) => {
            log!("webmention"; "{} rejected: {}", mention.source, response.status());
        }
        Err(err) => {
            log!("error"; "webmention to {} failed: {err}", mention.endpoint);
        }
    }
}
