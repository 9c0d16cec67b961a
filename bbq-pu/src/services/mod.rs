//! External service clients

pub mod feed_client;

pub use feed_client::{FeedClient, FeedError};
