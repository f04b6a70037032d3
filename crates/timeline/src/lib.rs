pub mod schema;
pub mod sanitizer;
pub mod parser;

pub use schema::{Entities, MediaEntity, Mention, Post, RawTweet, RawUser, UrlEntity, UserMention};
pub use sanitizer::sanitize;
pub use parser::parse_mention;
