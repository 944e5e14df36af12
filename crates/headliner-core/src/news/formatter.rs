use super::models::{Category, NewsItem};
use crate::error::FetchError;

/// First line of every digest body
pub const DIGEST_HEADER: &str = "Latest News Headlines";

/// Build the email body for a fetch result. A failed fetch yields the error
/// message itself.
pub fn format_digest(news: &Result<Vec<NewsItem>, FetchError>) -> String {
    match news {
        Ok(items) => render_digest(items),
        Err(e) => e.to_string(),
    }
}

/// Render items in the order given. A category separator is written each
/// time the category changes from the previous item.
pub fn render_digest(items: &[NewsItem]) -> String {
    let mut body = format!("{}\n\n", DIGEST_HEADER);
    let mut current: Option<Category> = None;

    for item in items {
        if current != Some(item.category) {
            body.push_str(&format!("--- {} ---\n", item.category));
            current = Some(item.category);
        }
        body.push_str(&format!(
            "{} [{}]: {}\n{}\n\n",
            item.site, item.time, item.headline, item.link
        ));
    }

    body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<NewsItem> {
        vec![
            NewsItem::new(Category::General, "ynet", "10:00", "H1", "L1"),
            NewsItem::new(Category::General, "ynet", "09:00", "H2", "L2"),
            NewsItem::new(Category::Sports, "one", "08:00", "H3", "L3"),
        ]
    }

    #[test]
    fn test_empty_digest_is_header_only() {
        let body = render_digest(&[]);
        assert_eq!(body, "Latest News Headlines\n\n");
        assert!(!body.contains("---"));
    }

    #[test]
    fn test_grouped_digest() {
        let body = render_digest(&sample());
        let expected = "Latest News Headlines\n\n\
                        --- General ---\n\
                        ynet [10:00]: H1\nL1\n\n\
                        ynet [09:00]: H2\nL2\n\n\
                        --- Sports ---\n\
                        one [08:00]: H3\nL3\n\n";
        assert_eq!(body, expected);
        assert_eq!(body.matches("--- General ---").count(), 1);
        assert_eq!(body.matches("--- Sports ---").count(), 1);
    }

    #[test]
    fn test_block_count_matches_items() {
        let items = sample();
        let body = render_digest(&items);
        let lines: Vec<&str> = body.lines().collect();

        // header + blank, one separator per category transition, three lines per item
        assert_eq!(lines.len(), 2 + 2 + items.len() * 3);
        let item_lines = lines.iter().filter(|l| l.contains(" [") && l.contains("]: ")).count();
        assert_eq!(item_lines, items.len());
    }

    #[test]
    fn test_separator_repeats_on_each_transition() {
        let items = vec![
            NewsItem::new(Category::General, "ynet", "10:00", "H1", "L1"),
            NewsItem::new(Category::Sports, "one", "08:00", "H2", "L2"),
            NewsItem::new(Category::General, "walla", "07:00", "H3", "L3"),
        ];
        let body = render_digest(&items);
        assert_eq!(body.matches("--- General ---").count(), 2);
    }

    #[test]
    fn test_error_passes_through_unchanged() {
        let err = FetchError::ConnectionFailed("connection refused".to_string());
        let expected = err.to_string();
        assert_eq!(format_digest(&Err(err)), expected);
    }

    #[test]
    fn test_format_ok_matches_render() {
        let items = sample();
        assert_eq!(format_digest(&Ok(items.clone())), render_digest(&items));
    }
}
