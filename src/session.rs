//! Session controller for an active practice lesson.
//!
//! Implements the practice loop as a single-writer state machine: all
//! transitions go through the `reduce()` function, which returns the next
//! session and a list of effects to execute. The event loop owns the
//! session; effect completion comes back as events tagged with the attempt
//! id, and stale ids are dropped.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::catalog::{LessonDescriptor, PhraseItem};
use crate::feedback::{self, FeedbackPayload, PracticeMode};
use crate::gateway::{ChatScenario, ChatTurn};
use crate::progress::xp::{COMPLETION_XP, QUIZ_XP, STEP_XP};
use crate::progress::SubscriptionTier;

/// Most recent turns forwarded to the chat gateway per request.
pub const HISTORY_LIMIT: usize = 12;

/// Where the session currently is in the practice loop.
#[derive(Debug, Clone)]
pub enum Phase {
    /// The current step's content is on screen.
    Presenting,
    /// The user armed the microphone; capture is in the user's hands.
    AwaitingRecording,
    /// A recorded clip is with the gateway. Only a completion event
    /// carrying this attempt id may resolve it.
    Evaluating { attempt_id: Uuid },
    PassedFeedback { payload: FeedbackPayload },
    FailedFeedback { payload: FeedbackPayload },
    /// Step index reached the lesson's step count; teardown is the loop's.
    Complete,
}

/// Ephemeral state of one practice session. Created on admission, discarded
/// when the user returns to the catalog or completes the lesson.
#[derive(Debug, Clone)]
pub struct Session {
    pub lesson: Arc<LessonDescriptor>,
    pub mode: PracticeMode,
    /// Tier snapshot for gateway calls; refreshed by the loop on redemption.
    pub tier: SubscriptionTier,
    pub step: usize,
    pub phase: Phase,
    pub history: Vec<ChatTurn>,
    pub last_audio: Option<PathBuf>,
    pub started_at: DateTime<Utc>,
    /// Wall-clock budget for chat turns, minutes.
    pub session_minutes: u32,
    /// Who leads roleplay conversations.
    pub leader_mode: String,
}

impl Session {
    pub fn new(
        lesson: Arc<LessonDescriptor>,
        tier: SubscriptionTier,
        session_minutes: u32,
        leader_mode: String,
        now: DateTime<Utc>,
    ) -> Self {
        let mode = PracticeMode::for_lesson(lesson.lesson_type);
        Self {
            lesson,
            mode,
            tier,
            step: 0,
            phase: Phase::Presenting,
            history: Vec::new(),
            last_audio: None,
            started_at: now,
            session_minutes,
            leader_mode,
        }
    }

    pub fn current_item(&self) -> Option<&PhraseItem> {
        self.lesson.phrases.get(self.step)
    }

    /// Effects for first presenting a step (auto-play reference audio in
    /// shadowing modes).
    pub fn presenting_effects(&self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if matches!(self.mode, PracticeMode::Shadowing | PracticeMode::Exam) {
            if let Some(text) = self.current_item().and_then(|p| p.text.clone()) {
                effects.push(Effect::PlayReference { text });
            }
        }
        effects.push(Effect::EmitHud);
        effects
    }

    fn scenario(&self) -> ChatScenario {
        let mission = self
            .current_item()
            .and_then(|p| p.mission.clone())
            .unwrap_or_else(|| self.lesson.topic.clone());
        let ai_role = if self.lesson.is_premium_instructor() {
            "Teacher Adrian".to_string()
        } else {
            "Conversation Partner".to_string()
        };
        ChatScenario {
            scenario: mission,
            user_role: "Student".to_string(),
            ai_role,
            leader_mode: self.leader_mode.clone(),
        }
    }

    /// History bounded to the most recent `HISTORY_LIMIT` turns.
    fn bounded_history(&self) -> Vec<ChatTurn> {
        let skip = self.history.len().saturating_sub(HISTORY_LIMIT);
        self.history[skip..].to_vec()
    }

    fn chat_budget_spent(&self, now: DateTime<Utc>) -> bool {
        (now - self.started_at).num_minutes() >= self.session_minutes as i64
    }
}

/// Events that drive the session. Sent by the shell (user commands) and by
/// effect completions.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Replay the reference audio for the current step.
    PlayRequested,
    /// User hit the record control.
    RecordArmed,
    /// Capture stopped; the recorded clip is ready for evaluation.
    RecordingCaptured { audio: PathBuf },
    /// Multiple-choice answer for a grammar step.
    QuizAnswer { choice: usize },
    /// Gateway evaluation finished.
    EvaluationOk { id: Uuid, payload: FeedbackPayload },
    /// Gateway evaluation failed (includes id to prevent stale failures).
    EvaluationFail { id: Uuid, message: String },
    /// Move to the next step after passing.
    Advance,
    /// Re-present the same step after failing. No penalty.
    Retry,
}

/// Effects produced by a transition. The effect runner executes these
/// asynchronously; progress-mutating effects are applied by the event loop
/// against a fresh snapshot.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Play reference audio for a phrase (presentation detail downstream).
    PlayReference { text: String },
    CallScore {
        id: Uuid,
        audio: PathBuf,
        target: String,
        mode: PracticeMode,
        tier: SubscriptionTier,
    },
    CallChat {
        id: Uuid,
        audio: PathBuf,
        scenario: ChatScenario,
        history: Vec<ChatTurn>,
        started_at: DateTime<Utc>,
        session_minutes: u32,
        mode: PracticeMode,
        tier: SubscriptionTier,
    },
    /// Best-effort word translation (loop-level, outside any session).
    CallTranslate { word: String, lang: String },
    /// Redemption-code check (loop-level).
    CallRedeem { code: String },
    AwardXp { amount: u32 },
    /// Mark the lesson completed. Idempotent on the completion set.
    CompleteLesson { lesson_id: u32 },
    /// Re-project the HUD from current state.
    EmitHud,
}

/// Reducer: `(session, event) -> (next_session, effects)`.
///
/// Key rules:
/// - Never mutate in place; return the next session
/// - Ignore evaluation events with stale attempt ids
/// - Emit EmitHud after every visible change
pub fn reduce(session: &Session, event: SessionEvent) -> (Session, Vec<Effect>) {
    use Effect::*;
    use SessionEvent::*;

    match (&session.phase, event) {
        // -----------------
        // Presenting
        // -----------------
        (Phase::Presenting, PlayRequested) => {
            let effects = match session.current_item().and_then(|p| p.text.clone()) {
                Some(text) => vec![PlayReference { text }],
                None => vec![],
            };
            (session.clone(), effects)
        }
        (Phase::Presenting, RecordArmed) if session.mode != PracticeMode::Quiz => {
            let mut next = session.clone();
            next.phase = Phase::AwaitingRecording;
            (next, vec![EmitHud])
        }
        (Phase::Presenting, QuizAnswer { choice }) if session.mode == PracticeMode::Quiz => {
            let item = match session.current_item() {
                Some(item) => item,
                None => return (session.clone(), vec![]),
            };
            let payload = feedback::evaluate_quiz(item, choice);
            let mut next = session.clone();
            let mut effects = Vec::new();
            if payload.passed {
                next.phase = Phase::PassedFeedback { payload };
                effects.push(AwardXp { amount: QUIZ_XP });
            } else {
                next.phase = Phase::FailedFeedback { payload };
            }
            effects.push(EmitHud);
            (next, effects)
        }

        // -----------------
        // AwaitingRecording
        // -----------------
        (Phase::AwaitingRecording, RecordingCaptured { audio }) => {
            if session.mode.is_chat() {
                let now = Utc::now();
                if session.chat_budget_spent(now) {
                    // Turn rejected outright: no gateway call, no history
                    // mutation, step unchanged.
                    log::info!("Session budget spent, rejecting roleplay turn");
                    let mut next = session.clone();
                    next.phase = Phase::FailedFeedback {
                        payload: FeedbackPayload {
                            passed: false,
                            score: None,
                            feedback: "Session time limit reached.".to_string(),
                            corrections: None,
                            transcript: None,
                            user_text: None,
                            ai_response: None,
                        },
                    };
                    return (next, vec![EmitHud]);
                }
            }

            let id = Uuid::new_v4();
            let mut next = session.clone();
            next.last_audio = Some(audio.clone());
            next.phase = Phase::Evaluating { attempt_id: id };

            let call = if session.mode.is_chat() {
                CallChat {
                    id,
                    audio,
                    scenario: session.scenario(),
                    history: session.bounded_history(),
                    started_at: session.started_at,
                    session_minutes: session.session_minutes,
                    mode: session.mode,
                    tier: session.tier,
                }
            } else {
                CallScore {
                    id,
                    audio,
                    target: session
                        .current_item()
                        .and_then(|p| p.text.clone())
                        .unwrap_or_default(),
                    mode: session.mode,
                    tier: session.tier,
                }
            };
            (next, vec![call, EmitHud])
        }

        // -----------------
        // Evaluating
        // -----------------
        (Phase::Evaluating { attempt_id }, EvaluationOk { id, payload }) if *attempt_id == id => {
            let mut next = session.clone();
            // Chat modes accumulate every exchanged turn, pass or fail.
            if session.mode.is_chat() {
                if let (Some(user), Some(ai)) = (&payload.user_text, &payload.ai_response) {
                    next.history.push(ChatTurn::user(user.clone()));
                    next.history.push(ChatTurn::assistant(ai.clone()));
                }
            }
            next.phase = if payload.passed {
                Phase::PassedFeedback { payload }
            } else {
                Phase::FailedFeedback { payload }
            };
            (next, vec![EmitHud])
        }
        (Phase::Evaluating { attempt_id }, EvaluationFail { id, message }) if *attempt_id == id => {
            let mut next = session.clone();
            next.phase = Phase::FailedFeedback {
                payload: FeedbackPayload {
                    passed: false,
                    score: None,
                    feedback: message,
                    corrections: None,
                    transcript: None,
                    user_text: None,
                    ai_response: None,
                },
            };
            (next, vec![EmitHud])
        }

        // -----------------
        // Feedback
        // -----------------
        (Phase::PassedFeedback { .. }, Advance) => {
            let mut next = session.clone();
            next.step += 1;
            let mut effects = Vec::new();
            // Quiz questions were already awarded at answer time.
            if session.mode != PracticeMode::Quiz {
                effects.push(AwardXp { amount: STEP_XP });
            }
            if next.step >= next.lesson.step_count() {
                next.phase = Phase::Complete;
                effects.push(CompleteLesson {
                    lesson_id: next.lesson.id,
                });
                effects.push(AwardXp {
                    amount: COMPLETION_XP,
                });
                effects.push(EmitHud);
            } else {
                next.phase = Phase::Presenting;
                effects.extend(next.presenting_effects());
            }
            (next, effects)
        }
        (Phase::FailedFeedback { .. }, Retry) => {
            let mut next = session.clone();
            next.phase = Phase::Presenting;
            let effects = next.presenting_effects();
            (next, effects)
        }

        // -----------------
        // Stale evaluation events (drop silently)
        // -----------------
        (_, EvaluationOk { id, .. }) | (_, EvaluationFail { id, .. }) => {
            log::debug!("Dropping stale evaluation event {}", id);
            (session.clone(), vec![])
        }

        // -----------------
        // Unhandled: no transition
        // -----------------
        _ => (session.clone(), vec![]),
    }
}
