//! ErrorParrot: client-side session and progression engine for a
//! language-practice app.
//!
//! The library is built around a single-writer event loop: every mutation of
//! durable progress and of the active practice session flows through
//! `run_app_loop()`, which applies reducer transitions and executes their
//! effects through an `EffectRunner`. The binary wraps this loop in a small
//! console shell.

pub mod api_key;
pub mod catalog;
pub mod config;
pub mod effects;
pub mod feedback;
pub mod gating;
pub mod gateway;
pub mod metrics;
pub mod progress;
pub mod session;

use std::io::BufRead;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{mpsc, watch, Mutex};

use catalog::{CatalogFilter, LessonDescriptor, LessonType};
use config::AppConfig;
use effects::{EffectRunner, GatewayEffectRunner};
use feedback::FeedbackPayload;
use gateway::{CodeStore, Redemption};
use gating::GateDecision;
use metrics::MetricsCollector;
use progress::{energy, xp, ProgressStore, SubscriptionTier, UserProgress};
use session::{Effect, Phase, Session, SessionEvent};

/// Top-level events consumed by the app loop. Sent by the shell (user
/// commands), the energy ticker, and effect completions.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Print the catalog view under a filter.
    ListCatalog { filter: CatalogFilter },
    /// Request entry into a lesson; runs the gating policy.
    OpenLesson { id: u32 },
    /// The user finished watching an unlock ad for a locked lesson.
    AdWatched { lesson_id: u32 },
    /// An event for the active practice session.
    Session(SessionEvent),
    /// Abandon the active session and return to the catalog.
    ExitSession,
    RedeemCode { code: String },
    /// Completion of a redemption check.
    RedeemResolved { result: Result<Redemption, String> },
    LookupWord { word: String },
    /// Completion of a dictionary lookup.
    TranslationReady {
        word: String,
        result: Result<String, String>,
    },
    SavePhrase { text: String, translation: String },
    ShowStats,
    /// Periodic energy regeneration check.
    EnergyTick,
    Exit,
}

/// HUD projection sent to the display layer. Tagged union:
/// `{ "screen": "catalog", ... }` or `{ "screen": "practicing", ... }`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "screen", rename_all = "camelCase")]
pub enum HudState {
    Catalog {
        level: u32,
        experience: u32,
        #[serde(rename = "nextLevelXp")]
        next_level_xp: u32,
        /// `None` means unlimited.
        energy: Option<u32>,
        streak: u32,
        tier: String,
    },
    Practicing {
        topic: String,
        mode: String,
        /// 1-based step number for display.
        step: usize,
        #[serde(rename = "stepCount")]
        step_count: usize,
        status: String,
        prompt: Option<String>,
        feedback: Option<FeedbackPayload>,
    },
}

fn project_hud(progress: &UserProgress, session: Option<&Session>) -> HudState {
    match session {
        Some(session) => {
            let (status, feedback) = match &session.phase {
                Phase::Presenting => ("presenting", None),
                Phase::AwaitingRecording => ("recording", None),
                Phase::Evaluating { .. } => ("evaluating", None),
                Phase::PassedFeedback { payload } => ("passed", Some(payload.clone())),
                Phase::FailedFeedback { payload } => ("failed", Some(payload.clone())),
                Phase::Complete => ("complete", None),
            };
            HudState::Practicing {
                topic: session.lesson.topic.clone(),
                mode: session.mode.label().to_string(),
                step: (session.step + 1).min(session.lesson.step_count()),
                step_count: session.lesson.step_count(),
                status: status.to_string(),
                prompt: session.current_item().map(|p| p.prompt().to_string()),
                feedback,
            }
        }
        None => {
            let unlimited = progress.subscription_tier.has_blanket_access();
            HudState::Catalog {
                level: progress.level,
                experience: progress.experience,
                next_level_xp: xp::level_threshold(progress.level),
                energy: (!unlimited).then_some(progress.energy),
                streak: progress.streak,
                tier: progress.subscription_tier.label().to_string(),
            }
        }
    }
}

fn emit_hud(
    hud_tx: &watch::Sender<HudState>,
    progress: &UserProgress,
    session: Option<&Session>,
) {
    let hud = project_hud(progress, session);
    log::debug!("HUD update: {:?}", serde_json::to_string(&hud));
    // Receiver may be gone during shutdown.
    let _ = hud_tx.send(hud);
}

/// Apply reducer effects. Progress-mutating effects run here against the
/// loop's own store; everything else goes to the runner.
fn apply_effects(
    effects: Vec<Effect>,
    store: &mut ProgressStore,
    session: Option<&Session>,
    runner: &Arc<dyn EffectRunner>,
    tx: &mpsc::Sender<AppEvent>,
    hud_tx: &watch::Sender<HudState>,
) {
    for effect in effects {
        match effect {
            Effect::AwardXp { amount } => {
                let today = Utc::now().date_naive();
                let levels_gained = store.mutate(|p| {
                    let gained = xp::award(p, amount);
                    xp::touch_active_day(p, today);
                    gained
                });
                if levels_gained > 0 {
                    println!(
                        "*** Level up! You are now level {} (energy refilled)",
                        store.progress().level
                    );
                }
            }
            Effect::CompleteLesson { lesson_id } => {
                store.mutate(|p| {
                    // Idempotent: re-completing an already-completed lesson
                    // is a no-op on the set.
                    p.completed_lessons.insert(lesson_id);
                });
                println!("Lesson {} completed!", lesson_id);
            }
            Effect::EmitHud => emit_hud(hud_tx, store.progress(), session),
            other => runner.spawn(other, tx.clone()),
        }
    }
}

fn print_catalog(
    catalog: &[Arc<LessonDescriptor>],
    progress: &UserProgress,
    filter: &CatalogFilter,
) {
    let entries = catalog::render(catalog, progress, filter);
    if entries.is_empty() {
        println!("No lessons match.");
        return;
    }
    for entry in entries {
        let mark = if entry.completed {
            "[done]"
        } else if entry.locked {
            "[locked]"
        } else {
            "      "
        };
        println!(
            "{:>4}  {} {:<12} {:<40} {}",
            entry.id,
            mark,
            entry.lesson_type.label(),
            entry.topic,
            entry.status_label
        );
    }
}

/// Attempt to enter a lesson. On admission this spends one energy and
/// returns the new session; otherwise it prints what is still required.
fn try_open_lesson(
    catalog: &[Arc<LessonDescriptor>],
    store: &mut ProgressStore,
    id: u32,
) -> Option<Session> {
    let lesson = match catalog.iter().find(|l| l.id == id) {
        Some(lesson) => lesson.clone(),
        None => {
            println!("No lesson with id {}.", id);
            return None;
        }
    };

    let now = Utc::now();
    // An expiry that lapsed since the last tick must not admit through a
    // stale paid tier.
    if store.progress().clone().revert_expired_subscription(now) {
        store.mutate(|p| {
            p.revert_expired_subscription(now);
        });
        println!("Your subscription has expired; back to the Free tier.");
    }

    match gating::evaluate(&lesson, store.progress()) {
        GateDecision::RequirePremium => {
            println!(
                "\"{}\" needs a premium activation. Redeem a code with `redeem <code>`.",
                lesson.topic
            );
            None
        }
        GateDecision::RequireAd { lesson_id } => {
            println!(
                "\"{}\" is locked. Watch an ad to unlock it, then `ad {}`.",
                lesson.topic, lesson_id
            );
            None
        }
        GateDecision::RequireEnergy => {
            println!("Out of energy. Wait for regeneration or redeem an upgrade code.");
            None
        }
        GateDecision::Admit => {
            let spent = store.mutate(|p| energy::spend_one(p, now));
            if !spent {
                // Gate saw energy a moment ago; treat as the energy case.
                println!("Out of energy. Wait for regeneration or redeem an upgrade code.");
                return None;
            }
            let progress = store.progress();
            let session = Session::new(
                lesson,
                progress.subscription_tier,
                progress.settings.session_minutes,
                progress.settings.leader_mode.clone(),
                now,
            );
            log::info!(
                "Session admitted: lesson {} ({:?} mode)",
                session.lesson.id,
                session.mode
            );
            Some(session)
        }
    }
}

/// Run the main app loop: single writer for `ProgressStore` and the active
/// session.
pub async fn run_app_loop(
    mut store: ProgressStore,
    catalog: Vec<Arc<LessonDescriptor>>,
    config: Arc<AppConfig>,
    metrics: Arc<Mutex<MetricsCollector>>,
    mut rx: mpsc::Receiver<AppEvent>,
    tx: mpsc::Sender<AppEvent>,
    effect_runner: Arc<dyn EffectRunner>,
    hud_tx: watch::Sender<HudState>,
) {
    let mut session: Option<Session> = None;

    emit_hud(&hud_tx, store.progress(), None);
    log::info!("App loop started");

    while let Some(event) = rx.recv().await {
        log::debug!("Received event: {:?}", event);

        match event {
            AppEvent::Exit => {
                log::info!("Exit requested, shutting down app loop");
                break;
            }

            AppEvent::ListCatalog { filter } => {
                print_catalog(&catalog, store.progress(), &filter);
            }

            AppEvent::OpenLesson { id } => {
                if session.is_some() {
                    println!("A session is already active; `back` first.");
                    continue;
                }
                if let Some(new_session) = try_open_lesson(&catalog, &mut store, id) {
                    let effects = new_session.presenting_effects();
                    session = Some(new_session);
                    apply_effects(
                        effects,
                        &mut store,
                        session.as_ref(),
                        &effect_runner,
                        &tx,
                        &hud_tx,
                    );
                }
            }

            AppEvent::AdWatched { lesson_id } => {
                store.mutate(|p| {
                    p.unlocked_lessons.insert(lesson_id);
                });
                log::info!("Lesson {} unlocked by ad", lesson_id);
                println!("Lesson {} unlocked. Starting...", lesson_id);
                if session.is_none() {
                    if let Some(new_session) = try_open_lesson(&catalog, &mut store, lesson_id) {
                        let effects = new_session.presenting_effects();
                        session = Some(new_session);
                        apply_effects(
                            effects,
                            &mut store,
                            session.as_ref(),
                            &effect_runner,
                            &tx,
                            &hud_tx,
                        );
                    }
                }
            }

            AppEvent::Session(session_event) => {
                let Some(current) = session.as_ref() else {
                    log::debug!("Dropping session event with no active session");
                    continue;
                };
                let (next, effects) = session::reduce(current, session_event);
                if matches!(next.phase, Phase::Complete) {
                    // Completion tears the session down; the catalog HUD is
                    // projected while the completion effects run.
                    log::info!("Lesson {} finished, back to catalog", next.lesson.id);
                    session = None;
                } else {
                    session = Some(next);
                }
                apply_effects(
                    effects,
                    &mut store,
                    session.as_ref(),
                    &effect_runner,
                    &tx,
                    &hud_tx,
                );
            }

            AppEvent::ExitSession => {
                if session.take().is_some() {
                    log::info!("Session abandoned, back to catalog");
                }
                emit_hud(&hud_tx, store.progress(), None);
            }

            AppEvent::RedeemCode { code } => {
                effect_runner.spawn(Effect::CallRedeem { code }, tx.clone());
            }

            AppEvent::RedeemResolved { result } => match result {
                Ok(redemption) => {
                    store.mutate(|p| {
                        p.subscription_tier = redemption.tier;
                        p.subscription_expiry = redemption.expiry;
                        energy::refill(p);
                    });
                    if let Some(s) = session.as_mut() {
                        s.tier = redemption.tier;
                    }
                    println!(
                        "Code accepted: {} tier active{}",
                        redemption.tier.label(),
                        redemption
                            .expiry
                            .map(|e| format!(" until {}", e.format("%Y-%m-%d")))
                            .unwrap_or_default()
                    );
                    emit_hud(&hud_tx, store.progress(), session.as_ref());
                }
                Err(message) => {
                    println!("Code rejected: {}", message);
                }
            },

            AppEvent::LookupWord { word } => {
                effect_runner.spawn(
                    Effect::CallTranslate {
                        word,
                        lang: config.translate_lang.clone(),
                    },
                    tx.clone(),
                );
            }

            AppEvent::TranslationReady { word, result } => match result {
                Ok(translation) => {
                    println!("{} = {}", word, translation);
                    println!("(use `save {} :: {}` to keep it)", word, translation);
                }
                Err(message) => println!("Translation of \"{}\" failed: {}", word, message),
            },

            AppEvent::SavePhrase { text, translation } => {
                let added = store.mutate(|p| p.save_phrase(&text, &translation));
                if added {
                    println!("Saved \"{}\" for review.", text);
                } else {
                    println!("\"{}\" is already in your review list.", text);
                }
            }

            AppEvent::ShowStats => {
                let progress = store.progress();
                println!(
                    "Level {} ({}/{} XP), total {} XP, streak {} days",
                    progress.level,
                    progress.experience,
                    xp::level_threshold(progress.level),
                    progress.total_xp,
                    progress.streak
                );
                println!(
                    "Tier: {}, completed lessons: {}, saved phrases: {}",
                    progress.subscription_tier.label(),
                    progress.completed_lessons.len(),
                    progress.saved_phrases.len()
                );
                let summary = metrics.lock().await.get_summary();
                println!(
                    "Attempts: {} ({} passed, {} failed), avg evaluation {}ms",
                    summary.total_attempts,
                    summary.passed_attempts,
                    summary.failed_attempts,
                    summary.avg_evaluation_ms
                );
                if let Some(error) = summary.last_error {
                    println!("Last error [{}]: {}", error.error_type, error.message);
                }
            }

            AppEvent::EnergyTick => {
                let now = Utc::now();
                // Probe on a copy first: only pay the disk write when
                // something actually changed.
                let mut probe = store.progress().clone();
                let reverted = probe.revert_expired_subscription(now);
                let regenerated = energy::regenerate(&mut probe, now);
                if reverted || regenerated {
                    store.mutate(|p| {
                        p.revert_expired_subscription(now);
                        energy::regenerate(p, now);
                    });
                    if reverted {
                        println!("Your subscription has expired; back to the Free tier.");
                    }
                    emit_hud(&hud_tx, store.progress(), session.as_ref());
                }
            }
        }
    }

    log::info!("App loop ended");
}

/// Parse one console line into an app event. `None` means the line was not
/// understood.
pub fn parse_command(line: &str) -> Option<AppEvent> {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match head {
        "list" => {
            let mut filter = CatalogFilter::default();
            let mut words = rest.split_whitespace().peekable();
            if let Some(first) = words.peek() {
                if let Some(lesson_type) = parse_lesson_type(first) {
                    filter.lesson_type = Some(lesson_type);
                    words.next();
                }
            }
            filter.query = words.collect::<Vec<_>>().join(" ");
            Some(AppEvent::ListCatalog { filter })
        }
        "start" => rest.parse().ok().map(|id| AppEvent::OpenLesson { id }),
        "ad" => rest.parse().ok().map(|lesson_id| AppEvent::AdWatched { lesson_id }),
        "play" => Some(AppEvent::Session(SessionEvent::PlayRequested)),
        "record" if rest.is_empty() => Some(AppEvent::Session(SessionEvent::RecordArmed)),
        "done" if !rest.is_empty() => Some(AppEvent::Session(SessionEvent::RecordingCaptured {
            audio: rest.into(),
        })),
        "answer" => rest
            .parse()
            .ok()
            .map(|choice| AppEvent::Session(SessionEvent::QuizAnswer { choice })),
        "next" => Some(AppEvent::Session(SessionEvent::Advance)),
        "retry" => Some(AppEvent::Session(SessionEvent::Retry)),
        "back" => Some(AppEvent::ExitSession),
        "redeem" if !rest.is_empty() => Some(AppEvent::RedeemCode {
            code: rest.to_string(),
        }),
        "translate" if !rest.is_empty() => Some(AppEvent::LookupWord {
            word: rest.to_string(),
        }),
        "save" => rest.split_once("::").map(|(text, translation)| AppEvent::SavePhrase {
            text: text.trim().to_string(),
            translation: translation.trim().to_string(),
        }),
        "stats" => Some(AppEvent::ShowStats),
        "quit" | "exit" => Some(AppEvent::Exit),
        _ => None,
    }
}

fn parse_lesson_type(word: &str) -> Option<LessonType> {
    match word {
        "speaking" => Some(LessonType::Speaking),
        "grammar" => Some(LessonType::Grammar),
        "conversation" => Some(LessonType::Conversation),
        "challenge" => Some(LessonType::Challenge),
        "exam" => Some(LessonType::Exam),
        "test" => Some(LessonType::Test),
        _ => None,
    }
}

fn print_help() {
    println!("Commands:");
    println!("  list [type] [query]     show the catalog (type: speaking/grammar/...)");
    println!("  start <id>              enter a lesson");
    println!("  ad <id>                 unlock a lesson after watching an ad");
    println!("  play                    replay the reference audio");
    println!("  record                  arm the microphone");
    println!("  done <audio-file>       submit a recorded clip");
    println!("  answer <n>              answer a grammar question (0-based)");
    println!("  next / retry / back     advance, retry the step, leave the session");
    println!("  redeem <code>           redeem a premium code");
    println!("  translate <word>        look up a word");
    println!("  save <text> :: <tr>     save a phrase for review");
    println!("  key set <value> | key show | key clear");
    println!("  stats                   progression and attempt metrics");
    println!("  quit");
}

/// Handle `key ...` commands locally in the shell; the provider key lives in
/// the OS keyring, not in progress state.
fn handle_key_command(rest: &str) {
    let (sub, value) = match rest.split_once(char::is_whitespace) {
        Some((sub, value)) => (sub, value.trim()),
        None => (rest, ""),
    };
    match sub {
        "set" if !value.is_empty() => match api_key::set_provider_api_key(Some(value)) {
            Ok(()) => println!("Provider API key stored."),
            Err(e) => println!("Failed to store key: {}", e),
        },
        "clear" => match api_key::set_provider_api_key(None) {
            Ok(()) => println!("Provider API key cleared."),
            Err(e) => println!("Failed to clear key: {}", e),
        },
        "show" => match api_key::get_masked_provider_key() {
            Some(masked) => println!("Provider API key: {}", masked),
            None => println!("No provider API key configured."),
        },
        _ => println!("Usage: key set <value> | key show | key clear"),
    }
}

fn print_hud(hud: &HudState) {
    match hud {
        HudState::Catalog {
            level,
            experience,
            next_level_xp,
            energy,
            streak,
            tier,
        } => {
            let energy_display = match energy {
                Some(e) => e.to_string(),
                None => "∞".to_string(),
            };
            println!(
                "-- catalog | level {} ({}/{} XP) | energy {} | streak {} | {} --",
                level, experience, next_level_xp, energy_display, streak, tier
            );
        }
        HudState::Practicing {
            topic,
            mode,
            step,
            step_count,
            status,
            prompt,
            feedback,
        } => {
            println!(
                "-- {} | {} | step {}/{} | {} --",
                topic, mode, step, step_count, status
            );
            if let Some(prompt) = prompt {
                if !prompt.is_empty() && status == "presenting" {
                    println!("   > {}", prompt);
                }
            }
            if let Some(fb) = feedback {
                if let Some(score) = fb.score {
                    println!("   score: {}", score);
                }
                println!("   {}", fb.feedback);
                if let Some(corrections) = &fb.corrections {
                    println!("   work on: {}", corrections);
                }
                if let Some(reply) = &fb.ai_response {
                    println!("   partner: {}", reply);
                }
            }
        }
    }
}

/// Application entry point: wire the store, catalog, runner, ticker, and
/// console shell together, then run the loop to completion.
pub async fn run() -> Result<(), String> {
    let config = Arc::new(config::load_config());
    let catalog = catalog::load_catalog(&config.lessons_path)?;
    let store = ProgressStore::at_default_location();
    if store.progress().subscription_tier == SubscriptionTier::ApiLicense
        && !api_key::is_provider_key_configured()
    {
        log::warn!(
            "API License tier is active but no provider API key is stored; \
             evaluations will fail until `key set <value>`"
        );
    }
    let metrics = Arc::new(Mutex::new(MetricsCollector::new()));
    let codes = Arc::new(CodeStore::at_default_location(
        gateway::codes::admin_secret_from_env(),
    ));

    let effect_runner: Arc<dyn EffectRunner> =
        GatewayEffectRunner::new(config.clone(), metrics.clone(), codes);

    let (tx, rx) = mpsc::channel::<AppEvent>(32);
    let (hud_tx, mut hud_rx) = watch::channel(project_hud(store.progress(), None));

    // HUD printer: follows the watch channel so updates driven by effect
    // completions show up without a prompt round-trip.
    tokio::spawn(async move {
        while hud_rx.changed().await.is_ok() {
            let hud = hud_rx.borrow_and_update().clone();
            print_hud(&hud);
        }
    });

    // Energy ticker.
    let tick_tx = tx.clone();
    let tick_secs = config.energy_tick_secs;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(tick_secs));
        interval.tick().await; // first tick fires immediately; skip it
        loop {
            interval.tick().await;
            if tick_tx.send(AppEvent::EnergyTick).await.is_err() {
                break;
            }
        }
    });

    // Console shell on a plain thread: stdin reads are blocking.
    let shell_tx = tx.clone();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        println!("ErrorParrot ready. Type `help` for commands.");
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(_) => break,
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed == "help" {
                print_help();
                continue;
            }
            if let Some(rest) = trimmed.strip_prefix("key") {
                if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                    handle_key_command(rest.trim());
                    continue;
                }
            }
            match parse_command(trimmed) {
                Some(event) => {
                    let is_exit = matches!(event, AppEvent::Exit);
                    if shell_tx.blocking_send(event).is_err() || is_exit {
                        break;
                    }
                }
                None => println!("Unknown command. Type `help`."),
            }
        }
        // Stdin closed (EOF): shut the loop down.
        let _ = shell_tx.blocking_send(AppEvent::Exit);
    });

    log::info!("ErrorParrot started");
    run_app_loop(
        store,
        catalog,
        config,
        metrics,
        rx,
        tx,
        effect_runner,
        hud_tx,
    )
    .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_command_covers_the_session_verbs() {
        assert!(matches!(
            parse_command("start 3"),
            Some(AppEvent::OpenLesson { id: 3 })
        ));
        assert!(matches!(
            parse_command("record"),
            Some(AppEvent::Session(SessionEvent::RecordArmed))
        ));
        assert!(matches!(
            parse_command("answer 2"),
            Some(AppEvent::Session(SessionEvent::QuizAnswer { choice: 2 }))
        ));
        assert!(matches!(parse_command("back"), Some(AppEvent::ExitSession)));
        assert!(matches!(parse_command("quit"), Some(AppEvent::Exit)));
    }

    #[test]
    fn parse_command_splits_list_filters() {
        match parse_command("list grammar past tense") {
            Some(AppEvent::ListCatalog { filter }) => {
                assert_eq!(filter.lesson_type, Some(LessonType::Grammar));
                assert_eq!(filter.query, "past tense");
            }
            other => panic!("unexpected parse: {:?}", other),
        }
        match parse_command("list coffee") {
            Some(AppEvent::ListCatalog { filter }) => {
                assert_eq!(filter.lesson_type, None);
                assert_eq!(filter.query, "coffee");
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn parse_command_rejects_malformed_input() {
        assert!(parse_command("start abc").is_none());
        assert!(parse_command("frobnicate").is_none());
        assert!(parse_command("save no-separator").is_none());
    }

    #[test]
    fn save_command_trims_both_halves() {
        match parse_command("save hello there :: greeting") {
            Some(AppEvent::SavePhrase { text, translation }) => {
                assert_eq!(text, "hello there");
                assert_eq!(translation, "greeting");
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn hud_projects_catalog_fields_from_progress() {
        let progress = UserProgress::default();
        match project_hud(&progress, None) {
            HudState::Catalog {
                level,
                energy,
                tier,
                ..
            } => {
                assert_eq!(level, 1);
                assert_eq!(energy, Some(5));
                assert_eq!(tier, "Free");
            }
            other => panic!("unexpected hud: {:?}", other),
        }
    }

    #[test]
    fn hud_hides_energy_for_blanket_tiers() {
        let progress = UserProgress {
            subscription_tier: progress::SubscriptionTier::ProAccess,
            ..UserProgress::default()
        };
        match project_hud(&progress, None) {
            HudState::Catalog { energy, .. } => assert_eq!(energy, None),
            other => panic!("unexpected hud: {:?}", other),
        }
    }
}
