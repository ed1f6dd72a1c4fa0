//! End-to-end tests for the app loop: gating, session progression, XP and
//! energy bookkeeping, and persistence across restarts.
//!
//! These run against the stub effect runner, so no gateway or network is
//! involved; evaluations resolve locally as passes.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};

use errorparrot::catalog::{LessonDescriptor, LessonType, PhraseItem};
use errorparrot::config::AppConfig;
use errorparrot::effects::{EffectRunner, StubEffectRunner};
use errorparrot::gateway::Redemption;
use errorparrot::metrics::MetricsCollector;
use errorparrot::progress::{ProgressStore, SubscriptionTier};
use errorparrot::session::SessionEvent;
use errorparrot::{run_app_loop, AppEvent, HudState};

fn speaking_lesson(id: u32, topic: &str, steps: usize) -> Arc<LessonDescriptor> {
    Arc::new(LessonDescriptor {
        id,
        lesson_type: LessonType::Speaking,
        topic: topic.to_string(),
        icon: String::new(),
        phrases: (0..steps)
            .map(|i| PhraseItem {
                text: Some(format!("phrase {}", i)),
                translation: Some(format!("translation {}", i)),
                ..PhraseItem::default()
            })
            .collect(),
    })
}

fn quiz_lesson(id: u32) -> Arc<LessonDescriptor> {
    Arc::new(LessonDescriptor {
        id,
        lesson_type: LessonType::Grammar,
        topic: "Past tense".to_string(),
        icon: String::new(),
        phrases: vec![PhraseItem {
            explanation: Some("Pick the past tense of 'go'".to_string()),
            choices: vec!["goed".to_string(), "went".to_string()],
            answer: Some(1),
            ..PhraseItem::default()
        }],
    })
}

fn test_catalog() -> Vec<Arc<LessonDescriptor>> {
    vec![
        speaking_lesson(1, "Greetings", 2),
        quiz_lesson(2),
        speaking_lesson(10, "Advanced idioms", 1),
        speaking_lesson(20, "Teacher Adrian office hours", 1),
    ]
}

/// Spawned app loop plus the handles a test drives it with.
struct Harness {
    tx: mpsc::Sender<AppEvent>,
    hud_rx: watch::Receiver<HudState>,
    progress_path: PathBuf,
    _dir: tempfile::TempDir,
    loop_handle: tokio::task::JoinHandle<()>,
}

fn start_harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let progress_path = dir.path().join("progress.json");
    let store = ProgressStore::open(progress_path.clone());

    let config = Arc::new(AppConfig::default());
    let metrics = Arc::new(Mutex::new(MetricsCollector::new()));
    let runner: Arc<dyn EffectRunner> = StubEffectRunner::new();

    let (tx, rx) = mpsc::channel::<AppEvent>(32);
    let (hud_tx, hud_rx) = watch::channel(HudState::Catalog {
        level: 0,
        experience: 0,
        next_level_xp: 0,
        energy: None,
        streak: 0,
        tier: String::new(),
    });

    let loop_handle = tokio::spawn(run_app_loop(
        store,
        test_catalog(),
        config,
        metrics,
        rx,
        tx.clone(),
        runner,
        hud_tx,
    ));

    Harness {
        tx,
        hud_rx,
        progress_path,
        _dir: dir,
        loop_handle,
    }
}

impl Harness {
    async fn send(&self, event: AppEvent) {
        self.tx.send(event).await.unwrap();
    }

    /// Wait until the HUD shows a practice session in `status`.
    async fn wait_for_status(&mut self, want: &str) {
        let deadline = Duration::from_secs(5);
        tokio::time::timeout(deadline, async {
            loop {
                {
                    let hud = self.hud_rx.borrow_and_update();
                    if let HudState::Practicing { status, .. } = &*hud {
                        if status == want {
                            return;
                        }
                    }
                }
                self.hud_rx
                    .changed()
                    .await
                    .expect("hud channel closed while waiting");
            }
        })
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for status {:?}", want));
    }

    async fn wait_for_catalog(&mut self) {
        let deadline = Duration::from_secs(5);
        tokio::time::timeout(deadline, async {
            loop {
                {
                    let hud = self.hud_rx.borrow_and_update();
                    if matches!(&*hud, HudState::Catalog { .. }) {
                        return;
                    }
                }
                self.hud_rx
                    .changed()
                    .await
                    .expect("hud channel closed while waiting");
            }
        })
        .await
        .expect("timed out waiting for catalog");
    }

    /// Shut the loop down and reload the persisted progress snapshot.
    async fn finish(self) -> ProgressStore {
        self.tx.send(AppEvent::Exit).await.unwrap();
        self.loop_handle.await.unwrap();
        ProgressStore::open(self.progress_path)
    }
}

#[tokio::test]
async fn completing_a_lesson_awards_xp_and_spends_energy() {
    let mut h = start_harness();

    h.send(AppEvent::OpenLesson { id: 1 }).await;
    h.wait_for_status("presenting").await;

    // Two shadowing steps, both passing via the stub evaluator.
    for _ in 0..2 {
        h.send(AppEvent::Session(SessionEvent::RecordArmed)).await;
        h.wait_for_status("recording").await;
        h.send(AppEvent::Session(SessionEvent::RecordingCaptured {
            audio: PathBuf::from("/tmp/clip.webm"),
        }))
        .await;
        h.wait_for_status("passed").await;
        h.send(AppEvent::Session(SessionEvent::Advance)).await;
    }
    // The final advance completes the lesson and returns to the catalog.
    h.wait_for_catalog().await;

    let store = h.finish().await;
    let progress = store.progress();
    assert!(progress.completed_lessons.contains(&1));
    // Two step awards plus the completion bonus.
    assert_eq!(progress.experience, 15 + 15 + 100);
    assert_eq!(progress.total_xp, 130);
    // One energy spent on admission, none regenerated.
    assert_eq!(progress.energy, 4);
    assert_eq!(progress.streak, 1);
}

#[tokio::test]
async fn quiz_lesson_awards_at_answer_time_and_completes() {
    let mut h = start_harness();

    h.send(AppEvent::OpenLesson { id: 2 }).await;
    h.wait_for_status("presenting").await;

    h.send(AppEvent::Session(SessionEvent::QuizAnswer { choice: 1 }))
        .await;
    h.wait_for_status("passed").await;
    h.send(AppEvent::Session(SessionEvent::Advance)).await;
    h.wait_for_catalog().await;

    let store = h.finish().await;
    let progress = store.progress();
    assert!(progress.completed_lessons.contains(&2));
    // Quiz question award plus completion bonus; no per-step award.
    assert_eq!(progress.experience, 10 + 100);
}

#[tokio::test]
async fn wrong_quiz_answer_allows_retry_without_penalty() {
    let mut h = start_harness();

    h.send(AppEvent::OpenLesson { id: 2 }).await;
    h.wait_for_status("presenting").await;

    h.send(AppEvent::Session(SessionEvent::QuizAnswer { choice: 0 }))
        .await;
    h.wait_for_status("failed").await;
    h.send(AppEvent::Session(SessionEvent::Retry)).await;
    h.wait_for_status("presenting").await;

    h.send(AppEvent::Session(SessionEvent::QuizAnswer { choice: 1 }))
        .await;
    h.wait_for_status("passed").await;

    let store = h.finish().await;
    // The failed attempt cost nothing beyond the admission energy.
    assert_eq!(store.progress().energy, 4);
    assert_eq!(store.progress().experience, 10);
}

#[tokio::test]
async fn locked_lesson_opens_only_after_ad_unlock() {
    let mut h = start_harness();

    // Lesson 10 is outside the initial free set: no session starts.
    h.send(AppEvent::OpenLesson { id: 10 }).await;
    h.send(AppEvent::ListCatalog {
        filter: Default::default(),
    })
    .await;
    h.wait_for_catalog().await;

    // The ad unlock both persists the unlock and admits the session.
    h.send(AppEvent::AdWatched { lesson_id: 10 }).await;
    h.wait_for_status("presenting").await;

    h.send(AppEvent::ExitSession).await;
    let store = h.finish().await;
    assert!(store.progress().unlocked_lessons.contains(&10));
    assert!(!store.progress().completed_lessons.contains(&10));
}

#[tokio::test]
async fn premium_lesson_admits_after_redemption() {
    let mut h = start_harness();

    // Premium-instructor lesson on the Free tier: stays on the catalog.
    h.send(AppEvent::OpenLesson { id: 20 }).await;
    h.send(AppEvent::ListCatalog {
        filter: Default::default(),
    })
    .await;
    h.wait_for_catalog().await;

    h.send(AppEvent::RedeemResolved {
        result: Ok(Redemption {
            tier: SubscriptionTier::ProAccess,
            expiry: None,
        }),
    })
    .await;
    h.send(AppEvent::OpenLesson { id: 20 }).await;
    h.wait_for_status("presenting").await;

    h.send(AppEvent::ExitSession).await;
    let store = h.finish().await;
    assert_eq!(
        store.progress().subscription_tier,
        SubscriptionTier::ProAccess
    );
}

#[tokio::test]
async fn expired_subscription_loses_premium_access_without_a_restart() {
    let mut h = start_harness();

    // A redemption whose expiry has already lapsed grants nothing lasting.
    h.send(AppEvent::RedeemResolved {
        result: Ok(Redemption {
            tier: SubscriptionTier::ProAccess,
            expiry: Some(chrono::Utc::now() - chrono::Duration::hours(2)),
        }),
    })
    .await;
    // The gate must see the lapsed tier as Free and refuse the
    // premium-instructor lesson.
    h.send(AppEvent::OpenLesson { id: 20 }).await;

    let store = h.finish().await;
    assert_eq!(store.progress().subscription_tier, SubscriptionTier::Free);
    assert!(store.progress().subscription_expiry.is_none());
    // No admission happened, so no energy was spent.
    assert_eq!(store.progress().energy, 5);
    assert!(store.progress().completed_lessons.is_empty());
}

#[tokio::test]
async fn completion_frees_the_session_slot_for_the_next_lesson() {
    let mut h = start_harness();

    h.send(AppEvent::OpenLesson { id: 2 }).await;
    h.wait_for_status("presenting").await;
    h.send(AppEvent::Session(SessionEvent::QuizAnswer { choice: 1 }))
        .await;
    h.wait_for_status("passed").await;
    h.send(AppEvent::Session(SessionEvent::Advance)).await;
    h.wait_for_catalog().await;

    // The completed session is gone, so the next start is admitted without
    // an intervening `back`.
    h.send(AppEvent::OpenLesson { id: 1 }).await;
    h.wait_for_status("presenting").await;

    h.send(AppEvent::ExitSession).await;
    let store = h.finish().await;
    assert!(store.progress().completed_lessons.contains(&2));
    // One energy per admission.
    assert_eq!(store.progress().energy, 3);
}

#[tokio::test]
async fn abandoning_a_session_returns_to_catalog_without_completion() {
    let mut h = start_harness();

    h.send(AppEvent::OpenLesson { id: 1 }).await;
    h.wait_for_status("presenting").await;

    h.send(AppEvent::Session(SessionEvent::RecordArmed)).await;
    h.wait_for_status("recording").await;
    h.send(AppEvent::ExitSession).await;
    h.wait_for_catalog().await;

    let store = h.finish().await;
    // Energy stays spent; nothing else changed.
    assert_eq!(store.progress().energy, 4);
    assert!(store.progress().completed_lessons.is_empty());
    assert_eq!(store.progress().experience, 0);
}

#[tokio::test]
async fn saved_phrases_deduplicate_and_persist() {
    let mut h = start_harness();

    h.send(AppEvent::SavePhrase {
        text: "hello".to_string(),
        translation: "greeting".to_string(),
    })
    .await;
    h.send(AppEvent::SavePhrase {
        text: "hello".to_string(),
        translation: "another".to_string(),
    })
    .await;
    h.send(AppEvent::ListCatalog {
        filter: Default::default(),
    })
    .await;
    h.wait_for_catalog().await;

    let store = h.finish().await;
    assert_eq!(store.progress().saved_phrases.len(), 1);
    assert_eq!(store.progress().saved_phrases[0].translation, "greeting");
}
