//! Groups summaries by category for the report.

use crate::models::{normalize_category, CategoryGroup, SummaryResult};
use clap::ValueEnum;
use std::collections::HashMap;

/// Order of category sections in the report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum CategoryOrder {
    /// Categories appear in the order their first article was produced.
    #[default]
    FirstSeen,
    /// Categories sorted by name.
    Alphabetical,
}

/// Group `results` by category.
///
/// Items keep their relative order inside each group. Blank categories land
/// in the "Uncategorized" bucket.
pub fn organize(results: Vec<SummaryResult>, order: CategoryOrder) -> Vec<CategoryGroup> {
    let mut groups: Vec<CategoryGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for result in results {
        let category = normalize_category(&result.category);
        let slot = *index.entry(category.clone()).or_insert_with(|| {
            groups.push(CategoryGroup {
                category,
                items: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].items.push(result);
    }

    if order == CategoryOrder::Alphabetical {
        groups.sort_by(|a, b| a.category.cmp(&b.category));
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentSource, SummaryStatus, UNCATEGORIZED};
    use chrono::{TimeZone, Utc};

    fn result(id: i64, category: &str) -> SummaryResult {
        SummaryResult {
            article_id: id,
            title: format!("T{id}"),
            url: format!("https://example.org/{id}"),
            category: category.to_string(),
            summary: "s".into(),
            status: SummaryStatus::Ok,
            source: "Feed".into(),
            author: "A".into(),
            published_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            content_source: ContentSource::Original,
        }
    }

    fn shape(groups: &[CategoryGroup]) -> Vec<(String, Vec<i64>)> {
        groups
            .iter()
            .map(|g| (g.category.clone(), g.items.iter().map(|r| r.article_id).collect()))
            .collect()
    }

    #[test]
    fn test_stable_first_seen_grouping() {
        let groups = organize(
            vec![result(1, "cat1"), result(2, "cat2"), result(3, "cat1")],
            CategoryOrder::FirstSeen,
        );
        assert_eq!(
            shape(&groups),
            vec![("cat1".into(), vec![1, 3]), ("cat2".into(), vec![2])]
        );
    }

    #[test]
    fn test_alphabetical_grouping_keeps_item_order() {
        let groups = organize(
            vec![result(1, "World"), result(2, "Tech"), result(3, "World"), result(4, "Arts")],
            CategoryOrder::Alphabetical,
        );
        assert_eq!(
            shape(&groups),
            vec![
                ("Arts".into(), vec![4]),
                ("Tech".into(), vec![2]),
                ("World".into(), vec![1, 3]),
            ]
        );
    }

    #[test]
    fn test_blank_category_goes_to_uncategorized() {
        let groups = organize(
            vec![result(1, ""), result(2, "News"), result(3, "   "), result(4, UNCATEGORIZED)],
            CategoryOrder::FirstSeen,
        );
        assert_eq!(
            shape(&groups),
            vec![(UNCATEGORIZED.into(), vec![1, 3, 4]), ("News".into(), vec![2])]
        );
    }

    #[test]
    fn test_exact_match_is_case_sensitive() {
        let groups = organize(vec![result(1, "news"), result(2, "News")], CategoryOrder::FirstSeen);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(organize(vec![], CategoryOrder::FirstSeen).is_empty());
    }

    #[test]
    fn test_category_order_parses_from_cli_value() {
        assert_eq!(
            CategoryOrder::from_str("first-seen", true).unwrap(),
            CategoryOrder::FirstSeen
        );
        assert_eq!(
            CategoryOrder::from_str("alphabetical", true).unwrap(),
            CategoryOrder::Alphabetical
        );
    }
}
