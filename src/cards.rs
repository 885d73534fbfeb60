//! Card projection of feed records.
//!
//! Cards come out newest first (the feed appends), each with a freshly drawn
//! decorative icon. Text taken from the feed is kept raw on the [`Card`] and
//! escaped whenever it is turned into markup.

use crate::model::{PullRequestRecord, Theme};
use crate::pipeline::{LeaderEntry, RenderOutput};
use crate::rng::XorShift64;
use crate::timeutil::format_relative;
use chrono::{DateTime, Utc};

pub const ICONS: [&str; 10] = ["🎉", "🪅", "✨", "🎈", "🪩", "🔥", "🚀", "🍾", "💃", "🕺"];

/// Source of icon choices. Rendering asks once per card.
pub trait IconPicker {
    fn pick(&mut self, len: usize) -> usize;
}

#[derive(Debug, Clone)]
pub struct RandomIcons(XorShift64);

impl RandomIcons {
    pub fn from_clock() -> Self {
        Self(XorShift64::from_clock())
    }
}

impl IconPicker for RandomIcons {
    fn pick(&mut self, len: usize) -> usize {
        self.0.below(len)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub icon: &'static str,
    pub title: String,
    pub author: String,
    pub number: Option<i64>,
    pub url: String,
    pub relative: String,
}

impl Card {
    fn from_record(record: &PullRequestRecord, icon: &'static str, now: DateTime<Utc>) -> Self {
        Self {
            icon,
            title: record.title().to_string(),
            author: record.author().to_string(),
            number: record.number,
            url: record.url().to_string(),
            relative: format_relative(record.ts.as_deref(), now),
        }
    }

    fn number_text(&self) -> String {
        self.number.map(|n| n.to_string()).unwrap_or_default()
    }

    /// `by {author} • #{number} • {relative}`, unescaped (terminal use).
    pub fn meta_line(&self) -> String {
        format!("by {} • #{} • {}", self.author, self.number_text(), self.relative)
    }

    pub fn to_html(&self) -> String {
        format!(
            r#"<div class="card">
  <div class="emoji">{icon}</div>
  <div class="title">{title}</div>
  <div class="meta">by {author} • #{number} • {relative}</div>
  <a href="{url}" target="_blank" rel="noopener noreferrer">Open PR ↗</a>
</div>"#,
            icon = self.icon,
            title = escape_html(&self.title),
            author = escape_html(&self.author),
            number = self.number_text(),
            relative = self.relative,
            url = escape_html(&self.url),
        )
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn render_cards(
    records: &[PullRequestRecord],
    picker: &mut dyn IconPicker,
    now: DateTime<Utc>,
) -> Vec<Card> {
    records
        .iter()
        .rev()
        .map(|r| Card::from_record(r, ICONS[picker.pick(ICONS.len())], now))
        .collect()
}

fn leaderboard_html(entries: &[LeaderEntry]) -> String {
    entries
        .iter()
        .map(|e| {
            format!(
                r#"<span class="badge">👑 {}: {}</span>"#,
                escape_html(&e.author),
                e.count
            )
        })
        .collect::<Vec<_>>()
        .join("")
}

/// Standalone page with the same regions as the terminal board.
pub fn render_html_page(view: &RenderOutput, theme: Theme, refresh_secs: u64) -> String {
    let cards = view
        .cards
        .iter()
        .map(Card::to_html)
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r#"<!doctype html>
<html lang="en" data-theme="{theme}">
<head>
<meta charset="utf-8">
<title>PR Party</title>
<style>
:root[data-theme="dark"] {{ --bg: #0f1020; --fg: #f4f4ff; --card: #1b1d36; }}
:root[data-theme="light"] {{ --bg: #fafafa; --fg: #1b1d36; --card: #ffffff; }}
body {{ background: var(--bg); color: var(--fg); font-family: sans-serif; }}
.card {{ background: var(--card); border-radius: 12px; padding: 12px; margin: 8px 0; }}
.badge {{ margin-right: 8px; }}
</style>
</head>
<body>
<header>
  <span id="counter">{label}</span>
  <span id="refreshInfo">{refresh_secs}s</span>
  <span id="themeToggle">{button}</span>
</header>
<div id="leaderboard">{leaderboard}</div>
<main id="cards">
{cards}
</main>
</body>
</html>
"#,
        theme = theme.as_str(),
        label = escape_html(&view.label),
        button = theme.button_label(),
        leaderboard = leaderboard_html(&view.leaderboard),
    )
}
