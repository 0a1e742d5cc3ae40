//! # Activity Reports
//!
//! Builds the weekly Markdown report from repository event streams.
//!
//! ## Key Components
//!
//! - **`Statistic`**: opened/closed counters for issues and pull requests.
//!   Statistics add field by field; the sum of nothing is the blank statistic.
//! - **`generate_report`**: turns one repository's events into a
//!   [`RepoReport`]: one bullet per counted event, plus the set of authors.
//! - **`WeeklyReport`**: folds repository reports into the final document,
//!   a totals table followed by one section per active repository and link
//!   references for every author.
//!
//! Bot accounts never show up in counters, bullets or authors.

use std::collections::BTreeSet;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use chrono::{DateTime, Duration, Utc};
use log::warn;

use crate::error::Result;
use crate::github::{is_bot, ActivityEvent, EventAction, GithubOperations};

/// Length of the trailing report window.
pub const REPORT_DAYS: i64 = 7;

/// The time span a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl ReportWindow {
    /// The seven days ending at `now`.
    pub fn trailing_week(now: DateTime<Utc>) -> Self {
        Self {
            since: now - Duration::days(REPORT_DAYS),
            until: now,
        }
    }

    /// Issue title for the report, dated by the window's end.
    pub fn title(&self) -> String {
        format!("Weekly report {}", self.until.format("%Y-%m-%d"))
    }
}

/// Issue and pull request counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Statistic {
    pub prs_opened: u64,
    pub prs_closed: u64,
    pub issues_opened: u64,
    pub issues_closed: u64,
}

impl Statistic {
    /// True when every counter is zero.
    pub fn is_blank(&self) -> bool {
        *self == Statistic::default()
    }

    /// The totals table that opens a weekly report.
    pub fn format_print(&self) -> String {
        format!(
            "\n## Weekly Stats\n\n\
             | | Opened this week | Closed this week |\n\
             | ---- | ---- | ---- |\n\
             | Issues | {} | {} |\n\
             | PR's | {} | {} |\n",
            self.issues_opened, self.issues_closed, self.prs_opened, self.prs_closed
        )
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PR open: {}, close: {}; Issue open: {}, close: {}",
            self.prs_opened, self.prs_closed, self.issues_opened, self.issues_closed
        )
    }
}

impl AddAssign for Statistic {
    fn add_assign(&mut self, other: Self) {
        self.prs_opened += other.prs_opened;
        self.prs_closed += other.prs_closed;
        self.issues_opened += other.issues_opened;
        self.issues_closed += other.issues_closed;
    }
}

impl Add for Statistic {
    type Output = Statistic;

    fn add(mut self, other: Self) -> Self {
        self += other;
        self
    }
}

impl Sum for Statistic {
    fn sum<I: Iterator<Item = Statistic>>(iter: I) -> Self {
        iter.fold(Statistic::default(), Add::add)
    }
}

impl<'a> Sum<&'a Statistic> for Statistic {
    fn sum<I: Iterator<Item = &'a Statistic>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// One repository's contribution to the weekly report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoReport {
    pub repo: String,
    /// Markdown section; empty when nothing was counted.
    pub content: String,
    pub authors: BTreeSet<String>,
    pub stat: Statistic,
}

/// Counts and describes one event. `None` for actions the report ignores.
fn describe(event: &ActivityEvent, stat: &mut Statistic) -> Option<&'static str> {
    let details = event.details();
    match (event, &details.action) {
        (ActivityEvent::Issue(_), EventAction::Opened) => {
            stat.issues_opened += 1;
            Some("opened issue")
        }
        (ActivityEvent::Issue(_), EventAction::Closed) => {
            stat.issues_closed += 1;
            Some("closed issue")
        }
        (ActivityEvent::PullRequest { .. }, EventAction::Opened) => {
            stat.prs_opened += 1;
            Some("opened pull request")
        }
        (ActivityEvent::PullRequest { merged, .. }, EventAction::Closed) => {
            stat.prs_closed += 1;
            Some(if *merged {
                "merged pull request"
            } else {
                "closed pull request"
            })
        }
        (_, EventAction::Other(_)) => None,
    }
}

/// Escapes characters that would end a markdown link text early.
fn escape_link_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '[' | ']') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Builds the report of one repository from its events in `window`.
pub fn generate_report(
    ops: &dyn GithubOperations,
    repo: &str,
    window: &ReportWindow,
) -> Result<RepoReport> {
    let mut report = RepoReport {
        repo: repo.to_string(),
        ..RepoReport::default()
    };
    let mut bullets = String::new();

    for event in ops.list_events(repo, window.since)? {
        let details = event.details();
        if is_bot(&details.actor) {
            continue;
        }
        match describe(&event, &mut report.stat) {
            Some(verb) => {
                bullets.push_str(&format!(
                    "- [@{}] {} [{}]({})\n",
                    details.actor,
                    verb,
                    escape_link_text(&details.title),
                    details.url
                ));
                report.authors.insert(details.actor.clone());
            }
            None => warn!("{}: skipping event with action {:?}", repo, details.action),
        }
    }

    if !report.stat.is_blank() {
        report.content = format!("## {}\n\n{}\n", repo, bullets);
    }
    Ok(report)
}

/// The weekly report across every repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklyReport {
    pub stat: Statistic,
    pub sections: Vec<String>,
    pub authors: BTreeSet<String>,
}

impl WeeklyReport {
    /// Folds repository reports in order, dropping blank ones.
    pub fn fold<I: IntoIterator<Item = RepoReport>>(reports: I) -> Self {
        let mut weekly = WeeklyReport::default();
        for report in reports {
            if report.stat.is_blank() {
                continue;
            }
            weekly.stat += report.stat;
            weekly.authors.extend(report.authors);
            weekly.sections.push(report.content);
        }
        weekly
    }

    /// Renders the Markdown body of the report issue.
    pub fn render(&self) -> String {
        let mut body = self.stat.format_print();
        body.push('\n');
        for section in &self.sections {
            body.push_str(section);
        }
        for author in &self.authors {
            body.push_str(&format!("[@{}]: https://github.com/{}\n", author, author));
        }
        body.push('\n');
        body
    }
}

/// Generates and folds the reports of `repos` in the given order.
pub fn weekly_report(
    ops: &dyn GithubOperations,
    repos: &[String],
    window: &ReportWindow,
) -> Result<WeeklyReport> {
    let reports = repos
        .iter()
        .map(|repo| generate_report(ops, repo, window))
        .collect::<Result<Vec<_>>>()?;
    Ok(WeeklyReport::fold(reports))
}
