//! Scripted judge for tests and offline dry runs.

use super::{FormattedTranscript, Judge, JudgeResponse, RawRanking, RawRankingEntry};
use crate::model::Criterion;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

enum Mode {
    /// Pop scripted raw responses in order; the last one repeats once the
    /// script is exhausted.
    Scripted(Mutex<VecDeque<String>>),
    /// Always answer with the identity permutation over the roster.
    RosterOrder,
}

pub struct FakeJudge {
    mode: Mode,
    calls: AtomicUsize,
}

impl FakeJudge {
    pub fn scripted(responses: Vec<String>) -> Self {
        Self {
            mode: Mode::Scripted(Mutex::new(responses.into())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn roster_order() -> Self {
        Self {
            mode: Mode::RosterOrder,
            calls: AtomicUsize::new(0),
        }
    }

    /// Total evaluate() invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn roster_order_response(transcript: &FormattedTranscript) -> String {
        let ranking = RawRanking {
            rankings: transcript
                .participants
                .iter()
                .enumerate()
                .map(|(i, name)| RawRankingEntry {
                    player_name: name.clone(),
                    rank: (i + 1) as u32,
                    reasoning: format!("roster position {}", i + 1),
                })
                .collect(),
        };
        serde_json::to_string(&ranking).expect("fake ranking serializes")
    }
}

#[async_trait]
impl Judge for FakeJudge {
    async fn evaluate(
        &self,
        transcript: &FormattedTranscript,
        _criterion: &Criterion,
    ) -> anyhow::Result<JudgeResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = match &self.mode {
            Mode::Scripted(queue) => {
                let mut q = queue.lock().expect("fake judge script lock");
                match q.len() {
                    0 => anyhow::bail!("fake judge script exhausted"),
                    1 => q.front().cloned().expect("non-empty script"),
                    _ => q.pop_front().expect("non-empty script"),
                }
            }
            Mode::RosterOrder => Self::roster_order_response(transcript),
        };
        Ok(JudgeResponse {
            text,
            backend: "fake".to_string(),
            model: "fake".to_string(),
        })
    }

    fn backend_name(&self) -> &'static str {
        "fake"
    }
}
