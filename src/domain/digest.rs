use std::fmt::{Display, Write as _};

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

const EMPTY_SUBTITLE: &str = "No reviews today, try again tomorrow!";
/// ANSI C layout without the year, e.g. `Mon Jan  2 15:04:05`.
const SINCE_FORMAT: &str = "%a %b %e %H:%M:%S";
/// ANSI C layout, e.g. `Mon Jan  2 15:04:05 2006`.
const ANSIC_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// A single customer review as it appears in a digest.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Review {
    pub author: String,
    pub title: String,
    pub content: String,
    /// RFC 3339 timestamp as delivered by the feed.
    pub date: String,
    pub rating: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Digest {
    pub title: String,
    pub subtitle: String,
    #[serde(rename = "Reviews")]
    pub items: Vec<Review>,
}

impl Digest {
    /// Builds the digest for reviews published between `since` and `until`.
    pub fn new<Tz>(items: Vec<Review>, since: &DateTime<Tz>, until: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let title = format!(
            "App reviews from {} until {}",
            since.format(SINCE_FORMAT),
            until.format(ANSIC_FORMAT)
        );
        let subtitle = if items.is_empty() {
            EMPTY_SUBTITLE.to_string()
        } else {
            format!("{} reviews", items.len())
        };

        Self {
            title,
            subtitle,
            items,
        }
    }

    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# {}", self.title);
        let _ = writeln!(out, "{}", self.subtitle);
        for review in &self.items {
            let _ = writeln!(out, "## {}", review.title);
            let _ = writeln!(
                out,
                "**{} star(s)** \u{2014} _{}_\n",
                review.rating,
                readable_date(&review.date)
            );
            let _ = writeln!(out, "{}", review.content);
            let _ = writeln!(out, "\nby _{}_", review.author);
        }
        out
    }
}

/// Renders RFC 3339 dates in ANSI C form, keeping their own offset.
/// Anything else is passed through untouched.
fn readable_date(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|date| date.format(ANSIC_FORMAT).to_string())
        .unwrap_or_else(|_| raw.to_string())
}
