//! Canned responses for greetings and small talk.
//!
//! Short queries (three words or fewer) containing a known greeting word get
//! a fixed response without touching the retrieval pipeline.

/// Greeting phrases and their canned responses.
const GREETING_RESPONSES: &[(&str, &str)] = &[
    (
        "hello",
        "Hello! How can I help you with questions about the university or the research lab?",
    ),
    ("hi", "Hi there! What can I do for you?"),
    ("hey", "Hey! How can I assist you?"),
    ("thanks", "You're welcome!"),
    (
        "thank you",
        "You're welcome! Is there anything else I can help with?",
    ),
    ("bye", "Goodbye! Have a great day."),
];

/// Return the canned response if the query is a greeting.
///
/// Only queries of at most three words are considered. The whole cleaned
/// query is checked first (so multi-word phrases like "thank you" match),
/// then each individual word.
pub fn greeting_response(query: &str) -> Option<&'static str> {
    let clean = query.trim().to_lowercase();
    let words: Vec<&str> = clean.split_whitespace().collect();

    if words.is_empty() || words.len() > 3 {
        return None;
    }

    if let Some((_, response)) = GREETING_RESPONSES.iter().find(|(key, _)| *key == clean) {
        return Some(response);
    }

    for word in words {
        if let Some((_, response)) = GREETING_RESPONSES.iter().find(|(key, _)| *key == word) {
            return Some(response);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_word_greeting() {
        assert!(greeting_response("hello").is_some());
        assert!(greeting_response("Hi").is_some());
        assert!(greeting_response("HEY").is_some());
        assert!(greeting_response("bye").is_some());
    }

    #[test]
    fn test_greeting_inside_short_query() {
        assert!(greeting_response("hey there friend").is_some());
        assert!(greeting_response("ok thanks").is_some());
    }

    #[test]
    fn test_multi_word_phrase() {
        let response = greeting_response("thank you").unwrap();
        assert!(response.contains("welcome"));
    }

    #[test]
    fn test_long_query_not_a_greeting() {
        // Four words: too long to be treated as small talk even though it
        // contains a greeting word.
        assert!(greeting_response("hello where is admissions office").is_none());
    }

    #[test]
    fn test_ordinary_question_not_a_greeting() {
        assert!(greeting_response("where is the lab").is_none());
        assert!(greeting_response("admission deadline").is_none());
    }

    #[test]
    fn test_whitespace_only() {
        assert!(greeting_response("   ").is_none());
    }
}
