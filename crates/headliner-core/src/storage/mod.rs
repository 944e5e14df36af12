mod database;
mod news_repo;
mod source;

pub use database::{release, Database};
pub use news_repo::{is_valid_table_name, NewsRepository};
pub use source::{NewsSource, SqlNewsSource};
