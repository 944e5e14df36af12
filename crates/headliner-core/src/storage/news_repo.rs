use sqlx::AnyConnection;
use sqlx::Row;

use crate::news::{Category, NewsItem, MAX_ITEMS_PER_SITE};

/// Read-only access to the scraped headlines table
pub struct NewsRepository<'a> {
    conn: &'a mut AnyConnection,
    table: &'a str,
}

/// Table names cannot be bound as parameters, so only plain identifiers are
/// accepted
pub fn is_valid_table_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit())
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Build the ranking query for the non-empty categories in `groups`.
/// Bind order: every site once for the CTE, then per category its sites
/// followed by the rank limit.
fn ranked_news_query(table: &str, groups: &[(Category, &[String])]) -> String {
    let total: usize = groups.iter().map(|(_, sites)| sites.len()).sum();

    let selects: Vec<String> = groups
        .iter()
        .map(|(category, sites)| {
            format!(
                "SELECT {} AS category_rank, site, CAST(time AS CHAR) AS time_text, headline, link \
                 FROM ranked_news WHERE site IN ({}) AND rn <= ?",
                category.rank(),
                placeholders(sites.len())
            )
        })
        .collect();

    format!(
        "WITH ranked_news AS ( \
             SELECT site, date, time, headline, link, \
                    ROW_NUMBER() OVER (PARTITION BY site ORDER BY date DESC, time DESC) AS rn \
             FROM {} \
             WHERE site IN ({}) \
         ) \
         {} \
         ORDER BY category_rank, site, time_text DESC",
        table,
        placeholders(total),
        selects.join(" UNION ALL ")
    )
}

/// MySQL TIME columns render as HH:MM:SS; the digest shows HH:MM
fn short_time(raw: &str) -> String {
    match raw.get(..5) {
        Some(prefix) if raw.len() > 5 && prefix.as_bytes()[2] == b':' => prefix.to_string(),
        _ => raw.to_string(),
    }
}

impl<'a> NewsRepository<'a> {
    pub fn new(conn: &'a mut AnyConnection, table: &'a str) -> Self {
        Self { conn, table }
    }

    /// Latest headlines per site, at most three per site, ordered by
    /// category, then site, then time descending
    pub async fn latest(
        &mut self,
        general_sites: &[String],
        sports_sites: &[String],
    ) -> std::result::Result<Vec<NewsItem>, sqlx::Error> {
        if !is_valid_table_name(self.table) {
            return Err(sqlx::Error::Protocol(format!(
                "invalid table name: {}",
                self.table
            )));
        }

        let groups: Vec<(Category, &[String])> = [
            (Category::General, general_sites),
            (Category::Sports, sports_sites),
        ]
        .into_iter()
        .filter(|(_, sites)| !sites.is_empty())
        .collect();

        if groups.is_empty() {
            return Ok(Vec::new());
        }

        let sql = ranked_news_query(self.table, &groups);
        let mut query = sqlx::query(&sql);
        for (_, sites) in &groups {
            for site in sites.iter() {
                query = query.bind(site.as_str());
            }
        }
        for (_, sites) in &groups {
            for site in sites.iter() {
                query = query.bind(site.as_str());
            }
            query = query.bind(i64::from(MAX_ITEMS_PER_SITE));
        }

        let rows = query.fetch_all(&mut *self.conn).await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let rank: i64 = row.try_get("category_rank")?;
            let category = Category::from_rank(rank).ok_or_else(|| {
                sqlx::Error::Protocol(format!("unexpected category rank {}", rank))
            })?;
            let time: Option<String> = row.try_get("time_text")?;
            let link: Option<String> = row.try_get("link")?;

            items.push(NewsItem {
                site: row.try_get("site")?,
                time: short_time(time.as_deref().unwrap_or_default()),
                headline: row.try_get("headline")?,
                link: link.unwrap_or_default(),
                category,
            });
        }

        Ok(items)
    }
}
