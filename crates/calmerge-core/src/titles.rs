//! Title compatibility rules.
//!
//! An ordered table of incompatibility rules vetoes merges between
//! semantically distinct meeting categories. Matching is case-insensitive
//! (titles are lowercased and trimmed first) and word-boundary based.

use once_cell::sync::Lazy;
use regex::Regex;

/// One incompatibility rule: when either title matches a trigger pattern,
/// the other title must not match any of the blocked patterns.
struct IncompatibilityRule {
    triggers: Vec<Regex>,
    blocked: Vec<Regex>,
}

fn rule(triggers: &[&str], blocked: &[&str]) -> IncompatibilityRule {
    let compile = |patterns: &[&str]| -> Vec<Regex> {
        patterns
            .iter()
            .map(|p| Regex::new(p).expect("valid title pattern"))
            .collect()
    };
    IncompatibilityRule {
        triggers: compile(triggers),
        blocked: compile(blocked),
    }
}

static RULES: Lazy<Vec<IncompatibilityRule>> = Lazy::new(|| {
    vec![
        // 1:1 forms vs group ceremonies.
        rule(
            &[
                r"\b1:1\b",
                r"\bone\s+on\s+one\b",
                r"\bone\s+to\s+one\b",
                r"\bindividual\b",
            ],
            &[
                r"\bdemo\b",
                r"\bdemonstration\b",
                r"\bpresentation\b",
                r"\bstandup\b",
                r"\bsync\b",
                r"\breview\b",
                r"\bteam\b",
                r"\bgroup\b",
            ],
        ),
        // Seniority-prefixed calls vs demos and external meetings.
        rule(
            &[r"\b(manager|executive|director|vp|ceo|cto|cfo)\s+(call|meeting|1:1|one\s+on\s+one)\b"],
            &[
                r"\bdemo\b",
                r"\bdemonstration\b",
                r"\bpresentation\b",
                r"\bclient\b",
                r"\bcustomer\b",
            ],
        ),
        // Personal slots vs company-wide gatherings.
        rule(
            &[r"\bpersonal\b", r"\bprivate\b", r"\bconfidential\b"],
            &[
                r"\bteam\b",
                r"\bgroup\b",
                r"\bpublic\b",
                r"\ball[\s-]hands\b",
                r"\bcompany\b",
            ],
        ),
        // External meetings vs internal ceremonies.
        rule(
            &[
                r"\bclient\b",
                r"\bcustomer\b",
                r"\bexternal\b",
                r"\bvendor\b",
                r"\bpartner\b",
            ],
            &[
                r"\binternal\b",
                r"\bteam\b",
                r"\bstandup\b",
                r"\bsync\b",
                r"\b1:1\b",
                r"\bone\s+on\s+one\b",
            ],
        ),
        // Demos vs one-on-ones and personal slots.
        rule(
            &[r"\bdemo\b", r"\bdemonstration\b", r"\bpresentation\b"],
            &[
                r"\b1:1\b",
                r"\bone\s+on\s+one\b",
                r"\bmanager\b",
                r"\bexecutive\b",
                r"\bpersonal\b",
                r"\bprivate\b",
            ],
        ),
    ]
});

fn matches_any(patterns: &[Regex], title: &str) -> bool {
    patterns.iter().any(|p| p.is_match(title))
}

/// Decide whether two titles may ever be merged.
///
/// Rules are evaluated in order; the first rule that fires a block decides.
/// Empty (or whitespace-only) titles never match a pattern and are
/// compatible with everything. The check is symmetric:
/// `titles_compatible(a, b) == titles_compatible(b, a)`.
#[must_use]
pub fn titles_compatible(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return true;
    }

    for rule in RULES.iter() {
        if matches_any(&rule.triggers, &a) && matches_any(&rule.blocked, &b) {
            return false;
        }
        if matches_any(&rule.triggers, &b) && matches_any(&rule.blocked, &a) {
            return false;
        }
    }

    true
}
