use crate::models::chat::ChatTurn;
use crate::vision::VisualFacts;

const SYSTEM_PERSONA: &str =
    "You are a friendly educational tutor for kids. \
     Explain simply and accurately. Prefer short, clear sentences. \
     Use any provided visual facts; do NOT ask the user to describe the image.";

const DEFAULT_QUESTION: &str = "Teach me something interesting about it.";

/// Assembles the message sequence for the generation backend. The ordering is
/// a contract: visual grounding precedes conversational context, and the
/// active question comes last so the backend treats it as the primary
/// instruction.
pub fn compose(
    label: &str,
    facts: &VisualFacts,
    question: &str,
    history: &[ChatTurn]
) -> Vec<ChatTurn> {
    let mut messages = vec![
        ChatTurn::system(SYSTEM_PERSONA),
        ChatTurn::user(format!("The image contains: {}.", label))
    ];

    if let Some(summary) = facts_summary(facts) {
        messages.push(ChatTurn::user(summary));
    }

    messages.extend_from_slice(history);

    if question.trim().is_empty() {
        messages.push(ChatTurn::user(DEFAULT_QUESTION));
    } else {
        messages.push(ChatTurn::user(format!("Question about this image: {}", question)));
    }

    messages
}

/// Renders the facts turn, or `None` when every fact value is empty.
/// Underscored fact keys read as plain words in the prompt.
fn facts_summary(facts: &VisualFacts) -> Option<String> {
    let parts: Vec<String> = facts
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{}: {}", k.replace('_', " "), v))
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(format!("Visual facts (precomputed): {}", parts.join("; ")))
}
