use crate::answer_key::AnswerKey;
use crate::types::CharaId;

/// Normalize text for answer comparison (trim whitespace, lowercase)
fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Parse an id typed with ASCII or full-width digits
fn parse_id(guess: &str) -> Option<CharaId> {
    let digits: String = guess
        .chars()
        .map(|c| match c {
            '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
            _ => c,
        })
        .collect();
    digits.parse().ok()
}

/// Check a guess against the hidden answer.
///
/// Accepts the numeric id, the canonical name, or any name listed for the id
/// in the answer key. Comparison is exact after normalization.
pub fn matches(text: &str, target_id: CharaId, target_name: &str, key: &AnswerKey) -> bool {
    let guess = normalize(text);
    if guess.is_empty() {
        return false;
    }

    if parse_id(&guess) == Some(target_id) {
        return true;
    }

    if guess == normalize(target_name) {
        return true;
    }

    key.names(target_id)
        .iter()
        .any(|name| guess == normalize(name))
}
