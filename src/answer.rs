//! Chat answer validation.
//!
//! Pure functions only; safe to call while a round is being settled.

use unicode_general_category::{get_general_category, GeneralCategory};

use crate::types::PresentedQuestion;

/// Labels shown next to answer choices, in display order
pub const ANSWER_LABELS: [char; 26] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S',
    'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

/// Label for the answer at `index`, if there is one
pub fn answer_label(index: usize) -> Option<char> {
    ANSWER_LABELS.get(index).copied()
}

/// Zero-based index for a label character (case-insensitive)
pub fn parse_answer_label(label: char) -> Option<usize> {
    let upper = label.to_ascii_uppercase();
    ANSWER_LABELS.iter().position(|l| *l == upper)
}

/// Control, format and unassigned code points, as appended by chat clients
/// to get around duplicate-message filters.
fn is_invisible(c: char) -> bool {
    matches!(
        get_general_category(c),
        GeneralCategory::Control
            | GeneralCategory::Format
            | GeneralCategory::Unassigned
            | GeneralCategory::Surrogate
    )
}

/// Drop a trailing "whitespace + invisible character" pair
pub fn strip_trailing_invisible(text: &str) -> &str {
    let mut chars = text.char_indices().rev();
    let (Some((_, last)), Some((before_at, before))) = (chars.next(), chars.next()) else {
        return text;
    };
    if is_invisible(last) && before.is_whitespace() {
        &text[..before_at]
    } else {
        text
    }
}

/// Map raw chat text to an answer index for the active question.
///
/// Returns `None` when no question is active, when the message is not a
/// single character, or when the label is outside the presented choices.
pub fn validate_answer(text: &str, active: Option<&PresentedQuestion>) -> Option<usize> {
    let presented = active?;
    let normalized = strip_trailing_invisible(text).trim();

    let mut chars = normalized.chars();
    let (Some(label), None) = (chars.next(), chars.next()) else {
        return None;
    };

    let index = parse_answer_label(label)?;
    (index < presented.answers.len()).then_some(index)
}
