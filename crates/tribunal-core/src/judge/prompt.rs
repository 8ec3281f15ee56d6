//! Prompt construction for ranking judges.
//!
//! The developer message pins the output contract (a JSON object with one
//! ranking entry per participant); the user message carries the criterion
//! and the transcript.

use crate::model::Criterion;

use super::FormattedTranscript;

pub fn developer_message() -> String {
    "You are an impartial judge for multi-agent social deduction game transcripts. \
     Rank every listed participant on the given criterion. Respond with a JSON object \
     of the form {\"rankings\": [{\"player_name\": ..., \"rank\": ..., \"reasoning\": ...}]}. \
     Use each rank from 1 (best) to N (worst) exactly once, include every participant \
     exactly once, and use participant names verbatim."
        .to_string()
}

pub fn user_message(transcript: &FormattedTranscript, criterion: &Criterion) -> String {
    let mut msg = String::new();
    msg.push_str(&format!("Criterion: {}\n\n", criterion.description));
    msg.push_str("Participants:\n");
    for name in &transcript.participants {
        msg.push_str(&format!("- {}\n", name));
    }
    if !transcript.character_info.is_empty() {
        msg.push_str("\nCharacter profiles:\n");
        msg.push_str(&transcript.character_info);
        msg.push('\n');
    }
    msg.push_str("\nGame log:\n");
    msg.push_str(&transcript.text);
    msg
}
