//! Effect runner for ErrorParrot.
//!
//! Executes the side effects produced by the session reducer and the app
//! loop: gateway calls for scoring, roleplay chat, translation, and code
//! redemption. Completion comes back as events on the loop's channel, tagged
//! with the attempt id so the reducer can drop stale results.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::config::AppConfig;
use crate::feedback;
use crate::gateway::{self, CodeStore, GatewayError};
use crate::metrics::MetricsCollector;
use crate::session::{Effect, SessionEvent};
use crate::AppEvent;

/// Trait for running effects asynchronously.
/// Completion events are sent back via the provided channel.
pub trait EffectRunner: Send + Sync + 'static {
    fn spawn(&self, effect: Effect, tx: mpsc::Sender<AppEvent>);
}

/// User-facing message for a failed evaluation. Transient failures carry a
/// hint toward the `retry` command; permanent ones do not.
fn failure_message(err: &GatewayError) -> String {
    if err.is_retryable() {
        format!("{} Use `retry` to try again.", err)
    } else {
        err.to_string()
    }
}

/// Real effect runner backed by the HTTP gateway and the local code store.
pub struct GatewayEffectRunner {
    config: Arc<AppConfig>,
    metrics: Arc<Mutex<MetricsCollector>>,
    codes: Arc<CodeStore>,
}

impl GatewayEffectRunner {
    pub fn new(
        config: Arc<AppConfig>,
        metrics: Arc<Mutex<MetricsCollector>>,
        codes: Arc<CodeStore>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            metrics,
            codes,
        })
    }
}

impl EffectRunner for GatewayEffectRunner {
    fn spawn(&self, effect: Effect, tx: mpsc::Sender<AppEvent>) {
        match effect {
            Effect::PlayReference { text } => {
                // Playback is the presentation layer's concern; we only have
                // a console, so log what would be spoken.
                log::info!("Reference audio: \"{}\"", text);
            }

            Effect::CallScore {
                id,
                audio,
                target,
                mode,
                tier,
            } => {
                let base_url = self.config.gateway_base_url.clone();
                let metrics = self.metrics.clone();

                tokio::spawn(async move {
                    {
                        let mut m = metrics.lock().await;
                        m.start_attempt(id, mode.label());
                    }

                    match gateway::score::submit(&base_url, &audio, &target, tier, None).await {
                        Ok(reply) => {
                            let payload = feedback::evaluate_score(&reply, mode);
                            {
                                let mut m = metrics.lock().await;
                                m.attempt_resolved(payload.score, payload.passed);
                            }
                            let _ = tx
                                .send(AppEvent::Session(SessionEvent::EvaluationOk {
                                    id,
                                    payload,
                                }))
                                .await;
                        }
                        Err(e) => {
                            log::error!("Score attempt {} failed: {}", id, e);
                            {
                                let mut m = metrics.lock().await;
                                m.attempt_failed(e.to_string());
                            }
                            let _ = tx
                                .send(AppEvent::Session(SessionEvent::EvaluationFail {
                                    id,
                                    message: failure_message(&e),
                                }))
                                .await;
                        }
                    }
                });
            }

            Effect::CallChat {
                id,
                audio,
                scenario,
                history,
                started_at,
                session_minutes,
                mode,
                tier,
            } => {
                let base_url = self.config.gateway_base_url.clone();
                let metrics = self.metrics.clone();

                tokio::spawn(async move {
                    {
                        let mut m = metrics.lock().await;
                        m.start_attempt(id, mode.label());
                    }

                    match gateway::chat::submit(
                        &base_url,
                        &audio,
                        &scenario,
                        &history,
                        started_at,
                        session_minutes,
                        tier,
                        None,
                    )
                    .await
                    {
                        Ok(reply) => {
                            let payload = feedback::evaluate_chat(&reply, mode);
                            {
                                let mut m = metrics.lock().await;
                                m.attempt_resolved(payload.score, payload.passed);
                            }
                            let _ = tx
                                .send(AppEvent::Session(SessionEvent::EvaluationOk {
                                    id,
                                    payload,
                                }))
                                .await;
                        }
                        Err(e) => {
                            log::error!("Chat attempt {} failed: {}", id, e);
                            {
                                let mut m = metrics.lock().await;
                                m.attempt_failed(e.to_string());
                            }
                            let _ = tx
                                .send(AppEvent::Session(SessionEvent::EvaluationFail {
                                    id,
                                    message: failure_message(&e),
                                }))
                                .await;
                        }
                    }
                });
            }

            Effect::CallTranslate { word, lang } => {
                let base_url = self.config.gateway_base_url.clone();

                tokio::spawn(async move {
                    let result = gateway::translate::lookup(&base_url, &word, &lang)
                        .await
                        .map_err(|e| e.to_string());
                    let _ = tx.send(AppEvent::TranslationReady { word, result }).await;
                });
            }

            Effect::CallRedeem { code } => {
                let codes = self.codes.clone();
                let metrics = self.metrics.clone();

                tokio::spawn(async move {
                    // The store does blocking file IO; keep it off the runtime.
                    let codes_for_task = codes.clone();
                    let code_for_task = code.clone();
                    let result =
                        tokio::task::spawn_blocking(move || codes_for_task.redeem(&code_for_task))
                            .await;

                    let result = match result {
                        Ok(Ok(redemption)) => Ok(redemption),
                        Ok(Err(e)) => {
                            let mut m = metrics.lock().await;
                            m.record_error("redeem".to_string(), e.to_string(), None);
                            Err(e.to_string())
                        }
                        Err(e) => {
                            log::error!("Redeem task for {} panicked: {}", code, e);
                            Err("internal error".to_string())
                        }
                    };

                    let _ = tx.send(AppEvent::RedeemResolved { result }).await;
                });
            }

            // Progress-mutating effects and HUD projection are applied by the
            // event loop against its own snapshot, never here.
            Effect::AwardXp { .. } | Effect::CompleteLesson { .. } | Effect::EmitHud => {
                unreachable!("progress effects are handled in run_app_loop");
            }
        }
    }
}

/// Stub effect runner: resolves every evaluation locally without touching the
/// network. Used by integration tests and offline smoke runs.
pub struct StubEffectRunner;

impl StubEffectRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl EffectRunner for StubEffectRunner {
    fn spawn(&self, effect: Effect, tx: mpsc::Sender<AppEvent>) {
        match effect {
            Effect::PlayReference { text } => {
                log::info!("Stub: would play \"{}\"", text);
            }

            Effect::CallScore { id, mode, .. } => {
                tokio::spawn(async move {
                    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                    let payload = crate::feedback::FeedbackPayload {
                        passed: true,
                        score: Some(90),
                        feedback: format!("Stub evaluation for {:?} attempt", mode),
                        corrections: None,
                        transcript: None,
                        user_text: None,
                        ai_response: None,
                    };
                    let _ = tx
                        .send(AppEvent::Session(SessionEvent::EvaluationOk { id, payload }))
                        .await;
                });
            }

            Effect::CallChat { id, .. } => {
                tokio::spawn(async move {
                    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                    let payload = crate::feedback::FeedbackPayload {
                        passed: true,
                        score: Some(75),
                        feedback: "Stub chat reply".to_string(),
                        corrections: None,
                        transcript: None,
                        user_text: Some("hello".to_string()),
                        ai_response: Some("Hello! Shall we continue?".to_string()),
                    };
                    let _ = tx
                        .send(AppEvent::Session(SessionEvent::EvaluationOk { id, payload }))
                        .await;
                });
            }

            Effect::CallTranslate { word, .. } => {
                tokio::spawn(async move {
                    let result = Ok(format!("[{}]", word));
                    let _ = tx.send(AppEvent::TranslationReady { word, result }).await;
                });
            }

            Effect::CallRedeem { .. } => {
                tokio::spawn(async move {
                    let _ = tx
                        .send(AppEvent::RedeemResolved {
                            result: Err("stub runner has no code store".to_string()),
                        })
                        .await;
                });
            }

            Effect::AwardXp { .. } | Effect::CompleteLesson { .. } | Effect::EmitHud => {
                unreachable!("progress effects are handled in run_app_loop");
            }
        }
    }
}
