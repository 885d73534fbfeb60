use crate::cards::{Card, IconPicker, render_cards};
use crate::model::PullRequestRecord;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

pub const LEADERBOARD_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderEntry {
    pub author: String,
    pub count: usize,
}

/// Everything the board shows for one `(records, query)` pair.
#[derive(Debug, Clone, Default)]
pub struct RenderOutput {
    pub filtered_len: usize,
    pub label: String,
    pub leaderboard: Vec<LeaderEntry>,
    pub cards: Vec<Card>,
}

/// What the search box stores: trimmed and lowercased.
pub fn normalize_query(input: &str) -> String {
    input.trim().to_lowercase()
}

fn matches(record: &PullRequestRecord, query: &str) -> bool {
    let hay = format!("{} {}", record.title(), record.author()).to_lowercase();
    hay.contains(query)
}

/// Order-preserving substring filter over title and author.
///
/// `query` is expected in normalized (lowercase) form; an empty query keeps
/// everything.
pub fn filter_records(records: &[PullRequestRecord], query: &str) -> Vec<PullRequestRecord> {
    if query.is_empty() {
        return records.to_vec();
    }
    records.iter().filter(|r| matches(r, query)).cloned().collect()
}

/// Record count per raw author value, in order of first appearance.
pub fn author_counts(records: &[PullRequestRecord]) -> Vec<LeaderEntry> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut out: Vec<LeaderEntry> = Vec::new();
    for r in records {
        let author = r.author();
        match index.get(author) {
            Some(&i) => out[i].count += 1,
            None => {
                index.insert(author, out.len());
                out.push(LeaderEntry {
                    author: author.to_string(),
                    count: 1,
                });
            }
        }
    }
    out
}

/// Top authors by count. Ties keep first-appearance order.
pub fn leaderboard(records: &[PullRequestRecord]) -> Vec<LeaderEntry> {
    let mut counts = author_counts(records);
    // sort_by is stable, which is what gives the tie-break.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(LEADERBOARD_SIZE);
    counts
}

pub fn result_label(n: usize) -> String {
    if n == 1 {
        "1 result".to_string()
    } else {
        format!("{n} results")
    }
}

/// Filter, count and project. The leaderboard always covers the full set.
pub fn render(
    records: &[PullRequestRecord],
    query: &str,
    picker: &mut dyn IconPicker,
    now: DateTime<Utc>,
) -> RenderOutput {
    let filtered = filter_records(records, query);
    RenderOutput {
        filtered_len: filtered.len(),
        label: result_label(filtered.len()),
        leaderboard: leaderboard(records),
        cards: render_cards(&filtered, picker, now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::tests::FixedIcon;
    use chrono::TimeZone;

    fn rec(title: &str, author: &str) -> PullRequestRecord {
        PullRequestRecord {
            title: Some(title.to_string()),
            author: Some(author.to_string()),
            number: Some(1),
            url: None,
            ts: None,
        }
    }

    fn sample() -> Vec<PullRequestRecord> {
        vec![
            rec("Fix login redirect", "anika"),
            rec("Add dark mode", "Santiago"),
            rec("Bump deps", "anika"),
            rec("Docs: OAuth scopes", "noah"),
            rec("Refactor worker pool", "chen"),
            rec("Tune autovacuum", "chen"),
            rec("Flaky test", "anika"),
            rec("Tooltip edges", "mia"),
            rec("Rate limits", "jules"),
        ]
    }

    #[test]
    fn empty_query_is_identity() {
        let r = sample();
        assert_eq!(filter_records(&r, ""), r);
    }

    #[test]
    fn filter_is_idempotent() {
        let r = sample();
        for q in ["an", "fix", "zzz", "o"] {
            let once = filter_records(&r, q);
            assert_eq!(filter_records(&once, q), once);
        }
    }

    #[test]
    fn filter_matches_title_or_author_case_insensitively() {
        let r = sample();
        let q = normalize_query("  SANTIAGO ");
        let hits = filter_records(&r, &q);
        assert_eq!(hits, vec![rec("Add dark mode", "Santiago")]);

        let hits = filter_records(&r, "dark");
        assert_eq!(hits.len(), 1);

        let hits = filter_records(&r, "anika");
        let titles: Vec<&str> = hits.iter().map(|h| h.title()).collect();
        assert_eq!(titles, vec!["Fix login redirect", "Bump deps", "Flaky test"]);
    }

    #[test]
    fn filter_treats_missing_fields_as_empty() {
        let r = vec![PullRequestRecord::default(), rec("Fix", "a")];
        assert_eq!(filter_records(&r, "fix").len(), 1);
        assert_eq!(filter_records(&r, "").len(), 2);
    }

    #[test]
    fn leaderboard_is_capped_and_sorted() {
        let board = leaderboard(&sample());
        assert_eq!(board.len(), LEADERBOARD_SIZE);
        assert_eq!(
            board[0],
            LeaderEntry {
                author: "anika".to_string(),
                count: 3
            }
        );
        assert_eq!(board[1].author, "chen");
        // Ties keep feed order: Santiago appears before noah and mia.
        let rest: Vec<&str> = board[2..].iter().map(|e| e.author.as_str()).collect();
        assert_eq!(rest, vec!["Santiago", "noah", "mia"]);
    }

    #[test]
    fn author_counts_partition_the_feed() {
        let r = sample();
        let total: usize = author_counts(&r).iter().map(|e| e.count).sum();
        assert_eq!(total, r.len());
    }

    #[test]
    fn leaderboard_groups_on_raw_author() {
        let r = vec![rec("a", "Anika"), rec("b", "anika")];
        assert_eq!(leaderboard(&r).len(), 2);
    }

    #[test]
    fn render_uses_full_set_for_leaderboard() {
        let r = sample();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let view = render(&r, "noah", &mut FixedIcon(0), now);
        assert_eq!(view.filtered_len, 1);
        assert_eq!(view.label, "1 result");
        assert_eq!(view.cards.len(), 1);
        assert_eq!(view.leaderboard, leaderboard(&r));

        let again = render(&r, "noah", &mut FixedIcon(4), now);
        assert_eq!(again.filtered_len, view.filtered_len);
        assert_eq!(again.leaderboard, view.leaderboard);
    }

    #[test]
    fn result_label_pluralizes() {
        assert_eq!(result_label(0), "0 results");
        assert_eq!(result_label(1), "1 result");
        assert_eq!(result_label(12), "12 results");
    }
}
