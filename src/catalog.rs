//! Lesson catalog: descriptors loaded once per run from a static JSON
//! resource, plus the read-only catalog view (filter, search, lock and
//! completion annotation) rendered from `UserProgress`.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::progress::UserProgress;

/// Kind of lesson, as authored in the catalog file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonType {
    Speaking,
    Grammar,
    Conversation,
    Challenge,
    Exam,
    Test,
}

impl LessonType {
    pub fn label(&self) -> &'static str {
        match self {
            LessonType::Speaking => "speaking",
            LessonType::Grammar => "grammar",
            LessonType::Conversation => "conversation",
            LessonType::Challenge => "challenge",
            LessonType::Exam => "exam",
            LessonType::Test => "test",
        }
    }
}

impl std::fmt::Display for LessonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One practice step. The catalog file is loosely shaped: shadowing items
/// carry `text`/`translation`, scripted roleplay lines carry
/// `mission`/`context`, grammar items add `explanation`/`choices`/`answer`.
/// Absent fields simply stay `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PhraseItem {
    /// Target phrase for shadowing modes.
    pub text: Option<String>,
    pub translation: Option<String>,
    /// Roleplay mission statement.
    pub mission: Option<String>,
    pub context: Option<String>,
    /// Grammar explanation shown before the check.
    pub explanation: Option<String>,
    pub choices: Vec<String>,
    /// Index into `choices` of the correct answer.
    pub answer: Option<usize>,
}

impl PhraseItem {
    /// The text presented to the user for this step.
    pub fn prompt(&self) -> &str {
        self.text
            .as_deref()
            .or(self.mission.as_deref())
            .or(self.explanation.as_deref())
            .unwrap_or("")
    }
}

/// Immutable lesson descriptor, sourced externally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonDescriptor {
    pub id: u32,
    #[serde(rename = "type")]
    pub lesson_type: LessonType,
    pub topic: String,
    #[serde(default)]
    pub icon: String,
    pub phrases: Vec<PhraseItem>,
}

impl LessonDescriptor {
    /// Number of steps in this lesson: one per authored phrase/line.
    pub fn step_count(&self) -> usize {
        self.phrases.len()
    }

    /// Premium-instructor lessons are gated behind a paid tier regardless of
    /// the ad-unlock mechanism.
    pub fn is_premium_instructor(&self) -> bool {
        let topic = self.topic.to_lowercase();
        topic.contains("adrian") || topic.contains("teacher")
    }
}

/// Load the catalog from a JSON file. Fetched once per app load.
pub fn load_catalog(path: &Path) -> Result<Vec<Arc<LessonDescriptor>>, String> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read catalog {:?}: {}", path, e))?;
    let lessons: Vec<LessonDescriptor> = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse catalog {:?}: {}", path, e))?;
    log::info!("Loaded {} lessons from {:?}", lessons.len(), path);
    Ok(lessons.into_iter().map(Arc::new).collect())
}

/// Catalog view filter: optional type tab plus a free-text topic search.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    pub lesson_type: Option<LessonType>,
    pub query: String,
}

/// One row of the rendered catalog view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: u32,
    pub topic: String,
    pub lesson_type: LessonType,
    pub icon: String,
    pub locked: bool,
    pub completed: bool,
    pub premium: bool,
    pub status_label: String,
}

/// Render the catalog as seen by `progress`. Pure; stable source order.
pub fn render(
    catalog: &[Arc<LessonDescriptor>],
    progress: &UserProgress,
    filter: &CatalogFilter,
) -> Vec<CatalogEntry> {
    let query = filter.query.to_lowercase();
    catalog
        .iter()
        .filter(|lesson| {
            filter
                .lesson_type
                .map(|t| lesson.lesson_type == t)
                .unwrap_or(true)
        })
        .filter(|lesson| query.is_empty() || lesson.topic.to_lowercase().contains(&query))
        .map(|lesson| {
            let blanket = progress.subscription_tier.has_blanket_access();
            let premium = lesson.is_premium_instructor() && !blanket;
            let locked = !progress.unlocked_lessons.contains(&lesson.id) && !blanket;
            let completed = progress.completed_lessons.contains(&lesson.id);

            let status_label = if premium {
                "Premium activation required".to_string()
            } else if locked {
                "Unlock with a short ad".to_string()
            } else {
                format!("{} steps", lesson.step_count())
            };

            CatalogEntry {
                id: lesson.id,
                topic: lesson.topic.clone(),
                lesson_type: lesson.lesson_type,
                icon: lesson.icon.clone(),
                locked: locked || premium,
                completed,
                premium,
                status_label,
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::progress::SubscriptionTier;

    pub(crate) fn lesson(id: u32, topic: &str, lesson_type: LessonType) -> Arc<LessonDescriptor> {
        Arc::new(LessonDescriptor {
            id,
            lesson_type,
            topic: topic.to_string(),
            icon: String::new(),
            phrases: vec![
                PhraseItem {
                    text: Some("Good morning".to_string()),
                    translation: Some("Bonjour".to_string()),
                    ..PhraseItem::default()
                },
                PhraseItem {
                    text: Some("See you later".to_string()),
                    translation: Some("A plus tard".to_string()),
                    ..PhraseItem::default()
                },
            ],
        })
    }

    fn sample_catalog() -> Vec<Arc<LessonDescriptor>> {
        vec![
            lesson(1, "Greetings", LessonType::Speaking),
            lesson(6, "Ordering Food", LessonType::Speaking),
            lesson(7, "Teacher Adrian Live", LessonType::Conversation),
            lesson(8, "Past Tense Drills", LessonType::Grammar),
        ]
    }

    #[test]
    fn free_lessons_are_open_and_later_ones_locked() {
        let entries = render(
            &sample_catalog(),
            &UserProgress::default(),
            &CatalogFilter::default(),
        );
        assert!(!entries[0].locked);
        assert!(entries[1].locked);
    }

    #[test]
    fn premium_instructor_is_locked_for_free_tier_even_when_unlocked() {
        let mut progress = UserProgress::default();
        progress.unlocked_lessons.insert(7);
        let entries = render(&sample_catalog(), &progress, &CatalogFilter::default());
        let adrian = entries.iter().find(|e| e.id == 7).unwrap();
        assert!(adrian.premium);
        assert!(adrian.locked);
    }

    #[test]
    fn paid_tier_grants_blanket_access() {
        let progress = UserProgress {
            subscription_tier: SubscriptionTier::ProAccess,
            ..UserProgress::default()
        };
        let entries = render(&sample_catalog(), &progress, &CatalogFilter::default());
        assert!(entries.iter().all(|e| !e.locked && !e.premium));
    }

    #[test]
    fn completed_flag_comes_from_progress() {
        let mut progress = UserProgress::default();
        progress.completed_lessons.insert(1);
        let entries = render(&sample_catalog(), &progress, &CatalogFilter::default());
        assert!(entries[0].completed);
        assert!(!entries[1].completed);
    }

    #[test]
    fn type_filter_and_search_preserve_source_order() {
        let filter = CatalogFilter {
            lesson_type: Some(LessonType::Speaking),
            query: String::new(),
        };
        let entries = render(&sample_catalog(), &UserProgress::default(), &filter);
        assert_eq!(
            entries.iter().map(|e| e.id).collect::<Vec<_>>(),
            vec![1, 6]
        );

        let filter = CatalogFilter {
            lesson_type: None,
            query: "FOOD".to_string(),
        };
        let entries = render(&sample_catalog(), &UserProgress::default(), &filter);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, 6);
    }

    #[test]
    fn catalog_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lessons.json");
        let json = serde_json::to_string(
            &sample_catalog()
                .iter()
                .map(|l| l.as_ref().clone())
                .collect::<Vec<_>>(),
        )
        .unwrap();
        std::fs::write(&path, json).unwrap();

        let loaded = load_catalog(&path).unwrap();
        assert_eq!(loaded.len(), 4);
        assert_eq!(loaded[2].topic, "Teacher Adrian Live");
        assert!(loaded[2].is_premium_instructor());
    }
}
