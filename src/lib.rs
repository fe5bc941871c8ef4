//! Organize browser bookmarks into user-defined categories.
//!
//! The host (bookmark tree, key-value storage) is reached through the
//! [`browsers::BookmarkProvider`] and [`storage::SettingsStorage`] traits;
//! [`session::Session`] derives the searchable, paged view from them.

pub mod batch;
pub mod browsers;
pub mod category_store;
pub mod config;
pub mod error;
pub mod filter;
pub mod index;
pub mod memory;
pub mod notification;
pub mod pager;
pub mod progress;
pub mod report;
pub mod session;
pub mod settings;
pub mod storage;
pub mod transfer;

pub use error::{CategorizerError, Result};
pub use session::Session;
