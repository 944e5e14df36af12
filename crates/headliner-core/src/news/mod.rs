mod formatter;
mod models;

pub use formatter::{format_digest, render_digest, DIGEST_HEADER};
pub use models::{Category, NewsItem, MAX_ITEMS_PER_SITE};
