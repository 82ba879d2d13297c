//! Marker protocol between the coaching prompts and the model
//!
//! A raw model reply can carry three things besides the text the user sees:
//! - an `<evaluation>...</evaluation>` block with the model's assessment
//! - the `STEP_COMPLETE` sentinel, or a stage-specific completion phrase
//! - `STEP n: TITLE` / `CURRENT STEP: n - TITLE` framing lines
//!
//! [`parse`] separates these. None of it is fatal: a reply without markers
//! is simply an incomplete stage with an empty evaluation.

use regex::Regex;
use std::sync::LazyLock;

/// Sentinel the prompts ask the model to emit when a stage is finished
pub const STEP_COMPLETE: &str = "STEP_COMPLETE";

const EVALUATION_OPEN: &str = "<evaluation>";
const EVALUATION_CLOSE: &str = "</evaluation>";

static HEADER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A[ \t]*STEP \d+: [A-Z][A-Z \t]*(?:\r?\n|\z)").expect("valid header regex")
});

static FOOTER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\r?\n|\A)[ \t]*CURRENT STEP: \d+ - [A-Z][A-Z \t]*\z")
        .expect("valid footer regex")
});

static BLANK_RUN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n\s*\n").expect("valid blank-run regex"));

/// Which substrings count as "this stage is done" for one stage.
///
/// The sentinel always counts. Some stages also accept loose phrases the
/// model tends to produce instead of the sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionRule {
    extra_phrases: &'static [&'static str],
}

impl CompletionRule {
    pub const SENTINEL_ONLY: Self = Self::with_phrases(&[]);

    pub const fn with_phrases(extra_phrases: &'static [&'static str]) -> Self {
        Self { extra_phrases }
    }

    pub fn is_complete(&self, text: &str) -> bool {
        text.contains(STEP_COMPLETE) || self.extra_phrases.iter().any(|p| text.contains(p))
    }
}

/// A model reply split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    /// Reply with the evaluation block excised but framing markers intact.
    /// This is what goes into history and what the goal is extracted from.
    pub body: String,
    /// Reply as the user should see it
    pub display_text: String,
    pub evaluation: String,
    pub is_complete: bool,
}

/// Split a raw model reply according to `rule`.
pub fn parse(raw: &str, rule: CompletionRule) -> ParsedReply {
    let (body, evaluation) = extract_evaluation(raw);
    let is_complete = rule.is_complete(&body);
    let display_text = clean_display(&body);
    ParsedReply {
        body,
        display_text,
        evaluation,
        is_complete,
    }
}

/// Excise the first `<evaluation>` block.
///
/// Returns `(text_without_block, evaluation)`. When the opening tag is
/// missing, or no closing tag follows it, the text comes back unchanged
/// with an empty evaluation.
pub fn extract_evaluation(text: &str) -> (String, String) {
    let Some(open) = text.find(EVALUATION_OPEN) else {
        return (text.to_string(), String::new());
    };
    let (before, rest) = text.split_at(open);
    let Some((inner, after)) = rest
        .strip_prefix(EVALUATION_OPEN)
        .and_then(|r| r.split_once(EVALUATION_CLOSE))
    else {
        return (text.to_string(), String::new());
    };

    (format!("{before}{after}"), inner.trim().to_string())
}

/// Produce user-facing text from a reply body.
///
/// Removes the sentinel, a leading `STEP n: TITLE` line and a trailing
/// `CURRENT STEP: n - TITLE` line, collapses runs of blank lines to a single
/// blank line and trims the result.
pub fn clean_display(text: &str) -> String {
    let without_sentinel = text.replace(STEP_COMPLETE, "");
    let trimmed = without_sentinel.trim();
    let without_header = HEADER_REGEX.replace(trimmed, "");
    let without_footer = FOOTER_REGEX.replace(&without_header, "");
    BLANK_RUN_REGEX
        .replace_all(&without_footer, "\n\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAGE_ONE: CompletionRule =
        CompletionRule::with_phrases(&["Goal confirmed", "goal is confirmed", "confirmed your goal"]);

    #[test]
    fn test_evaluation_is_excised() {
        let (body, evaluation) = extract_evaluation("Hello <evaluation>Good progress.</evaluation> world");
        assert_eq!(evaluation, "Good progress.");
        assert_eq!(body, "Hello  world");

        let parsed = parse(
            "Hello <evaluation>Good progress.</evaluation> world",
            CompletionRule::SENTINEL_ONLY,
        );
        assert_eq!(parsed.display_text, "Hello  world");
        assert_eq!(parsed.evaluation, "Good progress.");
        assert!(!parsed.is_complete);
    }

    #[test]
    fn test_evaluation_missing_close_tag() {
        let text = "Hello <evaluation>never closed";
        assert_eq!(extract_evaluation(text), (text.to_string(), String::new()));
    }

    #[test]
    fn test_close_before_open_is_not_found() {
        let text = "</evaluation> stray then <evaluation>open only";
        assert_eq!(extract_evaluation(text), (text.to_string(), String::new()));
    }

    #[test]
    fn test_only_first_evaluation_is_honored() {
        let (body, evaluation) =
            extract_evaluation("a<evaluation>one</evaluation>b<evaluation>two</evaluation>c");
        assert_eq!(evaluation, "one");
        assert_eq!(body, "ab<evaluation>two</evaluation>c");
    }

    #[test]
    fn test_evaluation_is_trimmed_and_multiline() {
        let (body, evaluation) =
            extract_evaluation("Intro\n<evaluation>\n  Line one.\n  Line two.\n</evaluation>\nOutro");
        assert_eq!(evaluation, "Line one.\n  Line two.");
        assert_eq!(body, "Intro\n\nOutro");
    }

    #[test]
    fn test_sentinel_completes_any_stage() {
        assert!(CompletionRule::SENTINEL_ONLY.is_complete("Great work. STEP_COMPLETE"));
        assert!(STAGE_ONE.is_complete("STEP_COMPLETE"));
    }

    #[test]
    fn test_loose_phrases_only_where_allowed() {
        let text = "Goal confirmed: run a marathon.";
        assert!(STAGE_ONE.is_complete(text));
        assert!(!CompletionRule::SENTINEL_ONLY.is_complete(text));
        assert!(STAGE_ONE.is_complete("I have confirmed your goal"));
    }

    #[test]
    fn test_sentinel_inside_evaluation_does_not_complete() {
        let parsed = parse(
            "Keep going <evaluation>not STEP_COMPLETE yet</evaluation>",
            CompletionRule::SENTINEL_ONLY,
        );
        assert!(!parsed.is_complete);
    }

    #[test]
    fn test_display_strips_framing_and_sentinel() {
        let raw = "STEP 2: IDENTIFY PROBLEMS\n\nWhat hurts most?\n\n\n\nSTEP_COMPLETE\n\nCURRENT STEP: 2 - IDENTIFY PROBLEMS";
        assert_eq!(clean_display(raw), "What hurts most?");
    }

    #[test]
    fn test_display_keeps_first_word_after_header() {
        let raw = "STEP 1: HAVE CLEAR GOALS\n\nHi there! Let's start.";
        assert_eq!(clean_display(raw), "Hi there! Let's start.");
    }

    #[test]
    fn test_display_leaves_inline_step_mentions() {
        let raw = "We covered STEP 3: DIAGNOSE earlier.";
        assert_eq!(clean_display(raw), raw);
    }

    #[test]
    fn test_body_keeps_markers_for_history() {
        let parsed = parse(
            "Goal confirmed: ship it. STEP_COMPLETE <evaluation>Clear.</evaluation>",
            STAGE_ONE,
        );
        assert!(parsed.body.contains(STEP_COMPLETE));
        assert!(!parsed.body.contains("<evaluation>"));
        assert_eq!(parsed.display_text, "Goal confirmed: ship it.");
        assert!(parsed.is_complete);
    }
}
