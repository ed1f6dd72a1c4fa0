//! Feedback evaluation.
//!
//! Normalizes the loosely-typed gateway replies into a pass/fail decision
//! plus display payload, using mode-dependent thresholds. Evaluation never
//! mutates progress; experience and energy changes happen only through the
//! session controller's explicit award effects.

use serde::Serialize;

use crate::catalog::{LessonType, PhraseItem};
use crate::gateway::{ChatReply, ScoreReply};

/// Active practice mode, derived from the lesson type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PracticeMode {
    /// Repeat a displayed phrase after hearing it spoken.
    Shadowing,
    /// Shadowing with a stricter pass bar.
    Exam,
    /// Scenario roleplay scored per turn.
    Roleplay,
    /// Open-ended conversation with the premium instructor.
    TeacherChat,
    /// Grammar explanation followed by a multiple-choice check.
    Quiz,
}

impl PracticeMode {
    pub fn for_lesson(lesson_type: LessonType) -> Self {
        match lesson_type {
            LessonType::Speaking => PracticeMode::Shadowing,
            LessonType::Exam | LessonType::Test => PracticeMode::Exam,
            LessonType::Challenge => PracticeMode::Roleplay,
            LessonType::Conversation => PracticeMode::TeacherChat,
            LessonType::Grammar => PracticeMode::Quiz,
        }
    }

    /// Whether this mode runs the conversational (chat) gateway.
    pub fn is_chat(&self) -> bool {
        matches!(self, PracticeMode::Roleplay | PracticeMode::TeacherChat)
    }

    pub fn label(&self) -> &'static str {
        match self {
            PracticeMode::Shadowing => "shadowing",
            PracticeMode::Exam => "exam",
            PracticeMode::Roleplay => "roleplay",
            PracticeMode::TeacherChat => "teacher-chat",
            PracticeMode::Quiz => "quiz",
        }
    }

    /// Pass decision for a numeric score in this mode. Quiz checks are exact
    /// choice matches and never reach this path.
    pub fn passes(&self, score: u32) -> bool {
        match self {
            PracticeMode::Shadowing => score >= 70,
            PracticeMode::Exam => score >= 85,
            PracticeMode::Roleplay | PracticeMode::TeacherChat => score > 60,
            PracticeMode::Quiz => false,
        }
    }
}

/// Normalized feedback consumed by the session controller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackPayload {
    pub passed: bool,
    pub score: Option<u32>,
    pub feedback: String,
    /// Corrections to display: missed words, else the raw transcript.
    pub corrections: Option<String>,
    pub transcript: Option<String>,
    /// What the user actually said (chat modes).
    pub user_text: Option<String>,
    /// The in-character reply (chat modes).
    pub ai_response: Option<String>,
}

/// Prefer the explicit `passed` field when present; otherwise derive it
/// from `score` against the mode's threshold.
fn normalize_pass(passed: Option<bool>, score: Option<u32>, mode: PracticeMode) -> bool {
    match passed {
        Some(p) => p,
        None => score.map(|s| mode.passes(s)).unwrap_or(false),
    }
}

pub fn evaluate_score(reply: &ScoreReply, mode: PracticeMode) -> FeedbackPayload {
    let corrections = if reply.missed_words.is_empty() {
        reply.transcript.clone()
    } else {
        Some(reply.missed_words.join(", "))
    };
    FeedbackPayload {
        passed: normalize_pass(reply.passed, reply.score, mode),
        score: reply.score,
        feedback: reply.feedback.clone(),
        corrections,
        transcript: reply.transcript.clone(),
        user_text: None,
        ai_response: None,
    }
}

pub fn evaluate_chat(reply: &ChatReply, mode: PracticeMode) -> FeedbackPayload {
    FeedbackPayload {
        passed: normalize_pass(reply.passed, reply.score, mode),
        score: reply.score,
        feedback: reply.feedback.clone(),
        corrections: (!reply.missed_words.is_empty()).then(|| reply.missed_words.join(", ")),
        transcript: Some(reply.user_text.clone()),
        user_text: Some(reply.user_text.clone()),
        ai_response: Some(reply.ai_response.clone()),
    }
}

/// Grammar quiz check: pass on exact multiple-choice match.
pub fn evaluate_quiz(item: &PhraseItem, choice: usize) -> FeedbackPayload {
    let passed = item.answer == Some(choice);
    let feedback = if passed {
        "Correct!".to_string()
    } else {
        match item.answer.and_then(|i| item.choices.get(i)) {
            Some(right) => format!("Not quite. The answer is \"{}\".", right),
            None => "Not quite.".to_string(),
        }
    };
    FeedbackPayload {
        passed,
        score: None,
        feedback,
        corrections: None,
        transcript: None,
        user_text: None,
        ai_response: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_mapping_from_lesson_type() {
        assert_eq!(
            PracticeMode::for_lesson(LessonType::Speaking),
            PracticeMode::Shadowing
        );
        assert_eq!(
            PracticeMode::for_lesson(LessonType::Exam),
            PracticeMode::Exam
        );
        assert_eq!(
            PracticeMode::for_lesson(LessonType::Challenge),
            PracticeMode::Roleplay
        );
        assert_eq!(
            PracticeMode::for_lesson(LessonType::Grammar),
            PracticeMode::Quiz
        );
    }

    #[test]
    fn shadowing_passes_at_70_exam_at_85() {
        assert!(!PracticeMode::Shadowing.passes(69));
        assert!(PracticeMode::Shadowing.passes(70));
        assert!(!PracticeMode::Exam.passes(84));
        assert!(PracticeMode::Exam.passes(85));
    }

    #[test]
    fn roleplay_passes_strictly_above_60() {
        assert!(!PracticeMode::Roleplay.passes(60));
        assert!(PracticeMode::Roleplay.passes(61));
    }

    #[test]
    fn score_without_passed_field_derives_from_threshold() {
        let reply = ScoreReply {
            score: Some(72),
            passed: None,
            feedback: "Good rhythm".to_string(),
            ..ScoreReply::default()
        };
        let payload = evaluate_score(&reply, PracticeMode::Shadowing);
        assert!(payload.passed);

        let payload = evaluate_score(&reply, PracticeMode::Exam);
        assert!(!payload.passed);
    }

    #[test]
    fn explicit_passed_field_wins_over_score() {
        let reply = ScoreReply {
            score: Some(95),
            passed: Some(false),
            ..ScoreReply::default()
        };
        assert!(!evaluate_score(&reply, PracticeMode::Shadowing).passed);
    }

    #[test]
    fn missing_score_and_passed_fails_closed() {
        let reply = ScoreReply::default();
        assert!(!evaluate_score(&reply, PracticeMode::Shadowing).passed);
    }

    #[test]
    fn missed_words_take_priority_over_transcript_in_corrections() {
        let reply = ScoreReply {
            missed_words: vec!["later".to_string(), "you".to_string()],
            transcript: Some("see yu late".to_string()),
            ..ScoreReply::default()
        };
        let payload = evaluate_score(&reply, PracticeMode::Shadowing);
        assert_eq!(payload.corrections.as_deref(), Some("later, you"));
    }

    #[test]
    fn chat_evaluation_carries_the_exchange() {
        let reply = ChatReply {
            user_text: "One coffee please".to_string(),
            ai_response: "Coming right up!".to_string(),
            score: Some(75),
            passed: None,
            feedback: "Natural phrasing".to_string(),
            missed_words: vec![],
        };
        let payload = evaluate_chat(&reply, PracticeMode::Roleplay);
        assert!(payload.passed);
        assert_eq!(payload.user_text.as_deref(), Some("One coffee please"));
        assert_eq!(payload.ai_response.as_deref(), Some("Coming right up!"));
    }

    #[test]
    fn quiz_passes_only_on_exact_match() {
        let item = PhraseItem {
            explanation: Some("Past tense of go".to_string()),
            choices: vec!["goed".to_string(), "went".to_string(), "gone".to_string()],
            answer: Some(1),
            ..PhraseItem::default()
        };
        assert!(evaluate_quiz(&item, 1).passed);
        let wrong = evaluate_quiz(&item, 0);
        assert!(!wrong.passed);
        assert!(wrong.feedback.contains("went"));
    }
}
