//! Site document model.
//!
//! The whole blog lives in one JSON document:
//!
//! ```text
//! Site ─┬─ configuration (title, scheme, url, loginurl, footer, styling toggles)
//!       ├─ created / updated
//!       └─ posts: { "<id>": Post { title, url, timestamp, tags: [Tag], .. } }
//! ```
//!
//! Readers get value copies out of [`Site`]; mutation goes through
//! [`Site::update_post`] on a private copy which is then handed back to the
//! content store for persistence.

mod post;
mod site;
mod tag;

pub use post::{Post, PostWithId};
pub use site::Site;
pub use tag::{Tag, TagList};

use serde::{Deserialize, Deserializer};

/// Deserialize `null` as the type's default value.
///
/// Older documents were written with `null` for empty collections.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
