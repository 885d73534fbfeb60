use crate::model::PullRequestRecord;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

static DEMO_TICK: AtomicU64 = AtomicU64::new(0);

/// A fresh record lands every this many refreshes.
const TICKS_PER_ARRIVAL: u64 = 3;

pub fn next_demo_tick() -> u64 {
    DEMO_TICK.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
}

struct DemoSpec {
    owner: &'static str,
    repo: &'static str,
    number: i64,
    author: &'static str,
    title: &'static str,
    age_secs: i64,
}

const SEED: &[DemoSpec] = &[
    DemoSpec {
        owner: "acme-inc",
        repo: "billing-api",
        number: 842,
        author: "anika",
        title: "Fix idempotency for retries on charge capture",
        age_secs: 4 * 86400,
    },
    DemoSpec {
        owner: "windmill-labs",
        repo: "infra",
        number: 317,
        author: "chen",
        title: "Bump Postgres to 16.2 and tune autovacuum thresholds",
        age_secs: 3 * 86400,
    },
    DemoSpec {
        owner: "orbit",
        repo: "web",
        number: 1932,
        author: "santiago",
        title: "Add keyboard navigation to project switcher",
        age_secs: 2 * 86400 + 7200,
    },
    DemoSpec {
        owner: "paperplane",
        repo: "docs",
        number: 42,
        author: "noah",
        title: "Docs: clarify OAuth scopes and add troubleshooting",
        age_secs: 30 * 3600,
    },
    DemoSpec {
        owner: "acme-inc",
        repo: "monorepo",
        number: 2551,
        author: "anika",
        title: "Refactor: extract feature flags into shared crate",
        age_secs: 11 * 3600,
    },
    DemoSpec {
        owner: "honeycombio",
        repo: "ui",
        number: 390,
        author: "mia",
        title: "Charts: fix tooltip positioning near viewport edges",
        age_secs: 9 * 3600,
    },
    DemoSpec {
        owner: "windmill-labs",
        repo: "sdk-rust",
        number: 98,
        author: "chen",
        title: "Add retry policy for 429/503 responses",
        age_secs: 5 * 3600,
    },
    DemoSpec {
        owner: "acme-inc",
        repo: "payments-worker",
        number: 219,
        author: "santiago",
        title: "Handle duplicate webhook deliveries and add metrics",
        age_secs: 3 * 3600,
    },
    DemoSpec {
        owner: "orbit",
        repo: "api",
        number: 1104,
        author: "jules",
        title: "Rate limit /v1/events and emit structured logs",
        age_secs: 50 * 60,
    },
    DemoSpec {
        owner: "acme-inc",
        repo: "design-system",
        number: 128,
        author: "anika",
        title: "Button: add loading state & improve <focus> ring",
        age_secs: 6 * 60,
    },
];

const ARRIVALS: &[DemoSpec] = &[
    DemoSpec {
        owner: "paperplane",
        repo: "mobile",
        number: 523,
        author: "noah",
        title: "Fix crash when resuming from background on iOS 17.2",
        age_secs: 0,
    },
    DemoSpec {
        owner: "honeycombio",
        repo: "otel-collector",
        number: 77,
        author: "devin",
        title: "Add tail-sampling defaults for high-cardinality traces",
        age_secs: 0,
    },
    DemoSpec {
        owner: "paperplane",
        repo: "backend",
        number: 611,
        author: "devin",
        title: "Graceful shutdown: drain queue workers before exit",
        age_secs: 0,
    },
    DemoSpec {
        owner: "orbit",
        repo: "web",
        number: 1940,
        author: "sofia",
        title: "Fix flaky onboarding test on CI runners",
        age_secs: 0,
    },
    DemoSpec {
        owner: "windmill-labs",
        repo: "infra",
        number: 321,
        author: "chen",
        title: "Terraform: split prod/staging state and add drift detection",
        age_secs: 0,
    },
];

fn pr_url(owner: &str, repo: &str, number: i64) -> String {
    format!("https://github.com/{owner}/{repo}/pull/{number}")
}

fn to_record(spec: &DemoSpec, at: DateTime<Utc>) -> PullRequestRecord {
    PullRequestRecord {
        title: Some(spec.title.to_string()),
        author: Some(spec.author.to_string()),
        number: Some(spec.number),
        url: Some(pr_url(spec.owner, spec.repo, spec.number)),
        ts: Some(at.to_rfc3339_opts(SecondsFormat::Secs, true)),
    }
}

/// Feed contents for refresh number `tick`: the seed set in append order, plus
/// one arrival per [`TICKS_PER_ARRIVAL`] ticks, each stamped when it "landed".
pub fn generate_demo_records(now: DateTime<Utc>, tick: u64) -> Vec<PullRequestRecord> {
    let mut out: Vec<PullRequestRecord> = SEED
        .iter()
        .map(|s| to_record(s, now - Duration::seconds(s.age_secs)))
        .collect();

    let arrived = (tick / TICKS_PER_ARRIVAL).min(ARRIVALS.len() as u64) as usize;
    for (i, spec) in ARRIVALS.iter().take(arrived).enumerate() {
        // Later arrivals are younger; each landed one arrival period after the previous.
        let landed_tick = (i as u64 + 1) * TICKS_PER_ARRIVAL;
        let age_ticks = tick.saturating_sub(landed_tick) as i64;
        out.push(to_record(spec, now - Duration::seconds(age_ticks * 20)));
    }
    out
}
