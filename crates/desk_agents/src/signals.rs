//! Keyword signals detected in ticket text.
//!
//! Each [`Signal`] is a family of word-prefix patterns. Agents and the
//! assignment rules both use them, so a ticket is read the same way
//! everywhere.

use std::sync::OnceLock;

use regex::Regex;

use crate::traits::Complexity;

/// A family of related keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// CMS / e-commerce platform vocabulary
    Platform,
    /// Hosting, deployment and runtime errors
    Infrastructure,
    /// Defects and verification
    Quality,
    /// Code changes and feature requests
    Implementation,
    /// Reporting and analytics
    Data,
    /// Money-path vocabulary
    Revenue,
}

const SIGNAL_COUNT: usize = 6;

impl Signal {
    pub const ALL: [Signal; SIGNAL_COUNT] = [
        Signal::Platform,
        Signal::Infrastructure,
        Signal::Quality,
        Signal::Implementation,
        Signal::Data,
        Signal::Revenue,
    ];

    /// Regex fragments, matched case-insensitively at a word start.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Signal::Platform => &[
                "wordpress", "woocommerce", "shopify", "magento", "drupal", "plugin",
                "theme", "cms", "elementor", "wp-admin",
            ],
            Signal::Infrastructure => &[
                "server", "hosting", "deploy", "dns", "ssl", "certificate", "outage",
                "downtime", "timeout", "timed out", "database", "crash", "error",
                r"5\d\d\b", r"(?:site|server|website) (?:is )?down",
            ],
            Signal::Quality => &[
                "bug", "broken", "regression", "test", "qa\\b", "reproduc", "flaky",
                "not working", "doesn't work",
            ],
            Signal::Implementation => &[
                "feature", "implement", "code", "api\\b", "integration", "endpoint",
                "enhancement", "add support", "refactor",
            ],
            Signal::Data => &[
                "report", "analytics", "dashboard", "metric", "export", "csv", "data\\b",
            ],
            Signal::Revenue => &[
                "checkout", "payment", "revenue", "billing", "order", "outage",
            ],
        }
    }

    fn slot(&self) -> usize {
        match self {
            Signal::Platform => 0,
            Signal::Infrastructure => 1,
            Signal::Quality => 2,
            Signal::Implementation => 3,
            Signal::Data => 4,
            Signal::Revenue => 5,
        }
    }

    fn pattern(&self) -> Option<&'static Regex> {
        static PATTERNS: [OnceLock<Option<Regex>>; SIGNAL_COUNT] =
            [const { OnceLock::new() }; SIGNAL_COUNT];

        PATTERNS[self.slot()]
            .get_or_init(|| {
                let alternation = self.keywords().join("|");
                Regex::new(&format!(r"(?i)\b(?:{})", alternation)).ok()
            })
            .as_ref()
    }

    /// Whether any keyword of this family appears in the text.
    pub fn matches(&self, text: &str) -> bool {
        self.pattern().map_or(false, |re| re.is_match(text))
    }

    /// Number of keyword occurrences of this family in the text.
    pub fn count(&self, text: &str) -> usize {
        self.pattern().map_or(0, |re| re.find_iter(text).count())
    }
}

/// Signals present in a piece of text.
pub fn detect(text: &str) -> Vec<Signal> {
    Signal::ALL.into_iter().filter(|s| s.matches(text)).collect()
}

/// Count of technical keyword hits, used as an effort indicator.
pub fn technical_weight(text: &str) -> usize {
    [Signal::Platform, Signal::Infrastructure, Signal::Implementation]
        .iter()
        .map(|s| s.count(text))
        .sum()
}

/// Rough effort class from text length and technical weight.
pub fn estimate_complexity(text: &str) -> Complexity {
    let weight = technical_weight(text);
    if text.len() > 1000 || weight >= 4 {
        Complexity::High
    } else if text.len() > 300 || weight >= 1 {
        Complexity::Medium
    } else {
        Complexity::Low
    }
}

/// Human-readable effort estimate for a complexity class.
pub fn effort_estimate(complexity: Complexity) -> &'static str {
    match complexity {
        Complexity::Low => "under 2 hours",
        Complexity::Medium => "2-8 hours",
        Complexity::High => "1-3 days",
    }
}
