//! Best-effort extraction of structured values from free model text
//!
//! Every extractor follows the same contract: try patterns in order, the
//! first match wins, then an explicit fallback, and `None` when nothing
//! applies. Callers pick the neutral default.

use regex::Regex;
use std::ops::RangeInclusive;
use std::sync::LazyLock;

/// Pulls one value out of a block of text
pub trait Extractor {
    type Output;

    fn extract(&self, text: &str) -> Option<Self::Output>;
}

static GOAL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"Goal confirmed: (.+?)[.!]",
        r"goal is: (.+?)[.!]",
        r"focusing on (.+?)[.!]",
        r"aiming to (.+?)[.!]",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid goal pattern"))
    .collect()
});

const GOAL_FALLBACK_MARKER: &str = "Goal confirmed:";
const GOAL_FALLBACK_TERMINATOR: &str = "Moving to next step";

/// Phrases the model appends after stating a goal
const GOAL_FILLER: &[&str] = &[
    "I'll help",
    "Let's begin",
    "Let's move",
    "Now let's",
    "Your insight",
];

/// Extracts the user's confirmed goal from a stage-1 completion reply
#[derive(Debug, Default, Clone, Copy)]
pub struct GoalExtractor;

impl GoalExtractor {
    fn from_patterns(text: &str) -> Option<String> {
        GOAL_PATTERNS.iter().find_map(|re| {
            re.captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        })
    }

    fn from_fallback(text: &str) -> Option<String> {
        let (_, after) = text.split_once(GOAL_FALLBACK_MARKER)?;
        let after = after.trim();
        let goal = match after.split_once('.') {
            Some((sentence, _)) => sentence,
            None => after
                .split_once(GOAL_FALLBACK_TERMINATOR)
                .map_or(after, |(head, _)| head),
        };
        Some(goal.to_string())
    }

    fn strip_filler(goal: &str) -> &str {
        let mut goal = goal.trim();
        for filler in GOAL_FILLER {
            if let Some((head, _)) = goal.split_once(filler) {
                goal = head.trim();
            }
        }
        goal
    }
}

impl Extractor for GoalExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Option<String> {
        let raw = Self::from_patterns(text).or_else(|| Self::from_fallback(text))?;
        let goal = Self::strip_filler(&raw);
        if goal.is_empty() {
            None
        } else {
            Some(goal.to_string())
        }
    }
}

static INTEGER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-+]?\d+").expect("valid integer regex"));

/// Extracts the first integer in the text, clamped to a range
#[derive(Debug, Clone)]
pub struct BoundedIntExtractor {
    range: RangeInclusive<i32>,
}

impl BoundedIntExtractor {
    pub fn new(range: RangeInclusive<i32>) -> Self {
        Self { range }
    }
}

impl Extractor for BoundedIntExtractor {
    type Output = i32;

    fn extract(&self, text: &str) -> Option<i32> {
        let digits = INTEGER_REGEX.find(text)?.as_str();
        // Only overflow can fail here; saturate toward the sign
        let value: i64 = digits.parse().unwrap_or(if digits.starts_with('-') {
            i64::MIN
        } else {
            i64::MAX
        });
        let clamped = value.clamp(
            i64::from(*self.range.start()),
            i64::from(*self.range.end()),
        );
        i32::try_from(clamped).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(text: &str) -> Option<String> {
        GoalExtractor.extract(text)
    }

    #[test]
    fn test_goal_confirmed_sentence() {
        assert_eq!(
            goal("...Goal confirmed: Ship the v2 API by March 1.  Moving to next step...").as_deref(),
            Some("Ship the v2 API by March 1")
        );
    }

    #[test]
    fn test_goal_stops_at_exclamation() {
        assert_eq!(
            goal("Goal confirmed: Run a 10k in May! Now let's look at obstacles.").as_deref(),
            Some("Run a 10k in May")
        );
    }

    #[test]
    fn test_later_patterns_are_tried_in_order() {
        assert_eq!(
            goal("So your goal is: reduce churn by 5%. Great.").as_deref(),
            Some("reduce churn by 5%")
        );
        assert_eq!(
            goal("We'll be focusing on hiring two engineers.").as_deref(),
            Some("hiring two engineers")
        );
        assert_eq!(
            goal("You're aiming to publish weekly.").as_deref(),
            Some("publish weekly")
        );
    }

    #[test]
    fn test_first_pattern_wins_over_later_ones() {
        assert_eq!(
            goal("You're aiming to relax. Goal confirmed: write the book.").as_deref(),
            Some("write the book")
        );
    }

    #[test]
    fn test_filler_is_stripped() {
        assert_eq!(
            goal("Goal confirmed: launch the beta Let's move on to problems.").as_deref(),
            Some("launch the beta")
        );
        assert_eq!(
            goal("Goal confirmed: learn Rust I'll help you get there!").as_deref(),
            Some("learn Rust")
        );
    }

    #[test]
    fn test_fallback_on_next_line() {
        assert_eq!(
            goal("Goal confirmed:\nFinish the thesis draft. Onward").as_deref(),
            Some("Finish the thesis draft")
        );
    }

    #[test]
    fn test_fallback_without_period_uses_terminator() {
        assert_eq!(
            goal("Goal confirmed:\nbuild a shed Moving to next step").as_deref(),
            Some("build a shed")
        );
    }

    #[test]
    fn test_no_goal() {
        assert_eq!(goal("Tell me more about what you want."), None);
        assert_eq!(goal("Goal confirmed without a colon"), None);
        assert_eq!(goal("Goal confirmed:   "), None);
    }

    #[test]
    fn test_bounded_int_takes_first_integer() {
        let extractor = BoundedIntExtractor::new(-10..=10);
        assert_eq!(extractor.extract("7"), Some(7));
        assert_eq!(extractor.extract("Score: -3 (out of 10)"), Some(-3));
        assert_eq!(extractor.extract("+4"), Some(4));
    }

    #[test]
    fn test_bounded_int_clamps_and_defaults() {
        let extractor = BoundedIntExtractor::new(-10..=10);
        assert_eq!(extractor.extract("42"), Some(10));
        assert_eq!(extractor.extract("-99"), Some(-10));
        assert_eq!(extractor.extract("neutral"), None);
    }

    #[test]
    fn test_bounded_int_saturates_on_overflow() {
        let extractor = BoundedIntExtractor::new(-10..=10);
        assert_eq!(extractor.extract("99999999999999"), Some(10));
        assert_eq!(extractor.extract("-99999999999999999999999"), Some(-10));
        assert_eq!(extractor.extract("Score: 123456789012345678901234567890"), Some(10));
    }
}
