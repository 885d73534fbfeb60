use crate::cards::IconPicker;
use crate::celebrate::CelebrationTrigger;
use crate::model::{PullRequestRecord, Theme};
use crate::pipeline::{RenderOutput, normalize_query, render};
use crate::refresh::{FeedUpdate, StaleGuard};
use crate::theme::{ThemeError, ThemeStore};
use chrono::{DateTime, Utc};

/// What a feed update did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied { count: usize },
    Stale,
    Failed,
}

/// Side effects the loop should carry out after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateEffects {
    /// This was the first completed load of the session.
    pub first_load: bool,
    pub celebrate: bool,
}

/// The whole board: loaded records, the search box, the theme and the last
/// rendered view. All changes go through methods that re-render.
pub struct AppState {
    pub records: Vec<PullRequestRecord>,
    pub search_input: String,
    pub query: String,
    pub theme: Theme,
    pub view: RenderOutput,
    pub selected_idx: usize,
    picker: Box<dyn IconPicker>,
    stale_guard: StaleGuard,
    celebration: CelebrationTrigger,
    loaded_once: bool,
}

impl AppState {
    pub fn new(theme: Theme, picker: Box<dyn IconPicker>) -> Self {
        Self {
            records: Vec::new(),
            search_input: String::new(),
            query: String::new(),
            theme,
            view: RenderOutput::default(),
            selected_idx: 0,
            picker,
            stale_guard: StaleGuard::default(),
            celebration: CelebrationTrigger::default(),
            loaded_once: false,
        }
    }

    pub fn rerender(&mut self, now: DateTime<Utc>) {
        self.view = render(&self.records, &self.query, self.picker.as_mut(), now);
        if self.view.cards.is_empty() {
            self.selected_idx = 0;
        } else if self.selected_idx >= self.view.cards.len() {
            self.selected_idx = self.view.cards.len() - 1;
        }
    }

    pub fn set_search_input(&mut self, input: String, now: DateTime<Utc>) {
        self.query = normalize_query(&input);
        self.search_input = input;
        self.rerender(now);
    }

    pub fn push_search_char(&mut self, c: char, now: DateTime<Utc>) {
        let mut input = std::mem::take(&mut self.search_input);
        input.push(c);
        self.set_search_input(input, now);
    }

    pub fn pop_search_char(&mut self, now: DateTime<Utc>) {
        let mut input = std::mem::take(&mut self.search_input);
        input.pop();
        self.set_search_input(input, now);
    }

    /// Apply a fetch result. Failures and out-of-order responses leave the
    /// records and view untouched.
    pub fn apply_update(&mut self, update: FeedUpdate, now: DateTime<Utc>) -> UpdateOutcome {
        match update.result {
            Ok(records) => {
                if !self.stale_guard.accept(update.request_id) {
                    log::debug!("Dropping stale feed response #{}", update.request_id);
                    return UpdateOutcome::Stale;
                }
                let count = records.len();
                self.records = records;
                self.rerender(now);
                log::info!("Loaded {count} records (request #{})", update.request_id);
                UpdateOutcome::Applied { count }
            }
            Err(e) => {
                log::warn!("Failed to load feed (request #{}): {e}", update.request_id);
                UpdateOutcome::Failed
            }
        }
    }

    /// [`Self::apply_update`] plus first-load bookkeeping.
    pub fn handle_update(&mut self, update: FeedUpdate, now: DateTime<Utc>) -> UpdateEffects {
        let outcome = self.apply_update(update, now);
        if self.loaded_once || outcome == UpdateOutcome::Stale {
            return UpdateEffects::default();
        }
        self.loaded_once = true;
        let loaded = match outcome {
            UpdateOutcome::Applied { count } => Some(count),
            _ => None,
        };
        UpdateEffects {
            first_load: true,
            celebrate: self.celebration.observe(loaded),
        }
    }

    /// Flip the theme and persist it. The in-memory value flips even if the
    /// write fails.
    pub fn toggle_theme(&mut self, store: &ThemeStore) -> Result<Theme, ThemeError> {
        let current = self.theme;
        self.theme = current.toggled();
        store.toggle(current)
    }

    pub fn select_prev(&mut self) {
        self.selected_idx = self.selected_idx.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        if self.selected_idx + 1 < self.view.cards.len() {
            self.selected_idx += 1;
        }
    }

    pub fn selected_url(&self) -> Option<&str> {
        self.view
            .cards
            .get(self.selected_idx)
            .map(|c| c.url.as_str())
            .filter(|u| !u.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::tests::FixedIcon;
    use crate::feed::FeedError;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn rec(title: &str, author: &str) -> PullRequestRecord {
        PullRequestRecord {
            title: Some(title.to_string()),
            author: Some(author.to_string()),
            number: Some(1),
            url: Some("https://example.com/pull/1".to_string()),
            ts: None,
        }
    }

    fn ok(request_id: u64, records: Vec<PullRequestRecord>) -> FeedUpdate {
        FeedUpdate {
            request_id,
            result: Ok(records),
        }
    }

    fn failed(request_id: u64) -> FeedUpdate {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        FeedUpdate {
            request_id,
            result: Err(FeedError::Parse(parse)),
        }
    }

    fn state() -> AppState {
        AppState::new(Theme::Dark, Box::new(FixedIcon(0)))
    }

    #[test]
    fn failed_fetch_keeps_last_good_state() {
        let mut s = state();
        s.handle_update(ok(1, vec![rec("A", "x"), rec("B", "y")]), now());
        let records = s.records.clone();
        let cards = s.view.cards.clone();
        let board = s.view.leaderboard.clone();

        assert_eq!(s.apply_update(failed(2), now()), UpdateOutcome::Failed);
        assert_eq!(s.records, records);
        assert_eq!(s.view.cards, cards);
        assert_eq!(s.view.leaderboard, board);
    }

    #[test]
    fn refresh_replaces_records_but_keeps_query_and_theme() {
        let mut s = state();
        s.theme = Theme::Light;
        s.handle_update(ok(1, vec![rec("Fix login", "anika")]), now());
        s.set_search_input("  FIX ".to_string(), now());
        assert_eq!(s.query, "fix");

        s.apply_update(
            ok(2, vec![rec("Fix build", "chen"), rec("Docs", "noah"), rec("Fix test", "mia")]),
            now(),
        );
        assert_eq!(s.records.len(), 3);
        assert_eq!(s.query, "fix");
        assert_eq!(s.theme, Theme::Light);
        assert_eq!(s.view.filtered_len, 2);
        assert_eq!(s.view.label, "2 results");
        assert_eq!(s.view.leaderboard.len(), 3);
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut s = state();
        s.apply_update(ok(3, vec![rec("new", "a")]), now());
        assert_eq!(s.apply_update(ok(2, vec![rec("old", "b")]), now()), UpdateOutcome::Stale);
        assert_eq!(s.records, vec![rec("new", "a")]);
    }

    #[test]
    fn typing_refilters_without_touching_records() {
        let mut s = state();
        s.apply_update(ok(1, vec![rec("Alpha", "x"), rec("Beta", "y")]), now());
        for c in "bet".chars() {
            s.push_search_char(c, now());
        }
        assert_eq!(s.view.filtered_len, 1);
        assert_eq!(s.view.cards[0].title, "Beta");
        s.pop_search_char(now());
        s.pop_search_char(now());
        s.pop_search_char(now());
        assert_eq!(s.view.filtered_len, 2);
        assert_eq!(s.records.len(), 2);
    }

    #[test]
    fn celebration_fires_only_on_first_non_empty_load() {
        let mut s = state();
        let first = s.handle_update(ok(1, vec![rec("A", "x")]), now());
        assert_eq!(
            first,
            UpdateEffects {
                first_load: true,
                celebrate: true
            }
        );
        let second = s.handle_update(ok(2, vec![rec("A", "x"), rec("B", "y")]), now());
        assert_eq!(second, UpdateEffects::default());
    }

    #[test]
    fn failed_first_load_still_counts_as_first_but_never_celebrates() {
        let mut s = state();
        let first = s.handle_update(failed(1), now());
        assert!(first.first_load);
        assert!(!first.celebrate);
        let later = s.handle_update(ok(2, vec![rec("A", "x")]), now());
        assert!(!later.celebrate);
        assert!(!later.first_load);
    }

    #[test]
    fn empty_first_load_never_celebrates() {
        let mut s = state();
        assert!(!s.handle_update(ok(1, Vec::new()), now()).celebrate);
        assert!(!s.handle_update(ok(2, vec![rec("A", "x")]), now()).celebrate);
    }

    #[test]
    fn theme_toggle_persists_each_flip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ThemeStore::new(dir.path().join("storage.toml"));
        let mut s = state();
        assert_eq!(s.toggle_theme(&store).unwrap(), Theme::Light);
        assert_eq!(store.load(), s.theme);
        assert_eq!(s.toggle_theme(&store).unwrap(), Theme::Dark);
        assert_eq!(store.load(), s.theme);
    }

    #[test]
    fn theme_toggle_starts_from_the_session_theme() {
        let dir = tempfile::tempdir().unwrap();
        let store = ThemeStore::new(dir.path().join("storage.toml"));
        store.save(Theme::Dark).unwrap();
        let mut s = AppState::new(Theme::Light, Box::new(FixedIcon(0)));
        assert_eq!(s.toggle_theme(&store).unwrap(), Theme::Dark);
        assert_eq!(s.theme, Theme::Dark);
        assert_eq!(store.load(), Theme::Dark);
    }

    #[test]
    fn failed_theme_write_still_flips_the_screen() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        let store = ThemeStore::new(blocker.join("storage.toml"));
        let mut s = state();
        assert!(s.toggle_theme(&store).is_err());
        assert_eq!(s.theme, Theme::Light);
    }

    #[test]
    fn selection_is_clamped_to_cards() {
        let mut s = state();
        s.apply_update(ok(1, vec![rec("A", "x"), rec("B", "y"), rec("C", "z")]), now());
        s.select_next();
        s.select_next();
        s.select_next();
        assert_eq!(s.selected_idx, 2);
        s.set_search_input("a".to_string(), now());
        assert_eq!(s.selected_idx, 0);
        assert_eq!(s.selected_url(), Some("https://example.com/pull/1"));
        s.select_prev();
        assert_eq!(s.selected_idx, 0);
    }
}
