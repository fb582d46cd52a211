//! Policy Engine
//!
//! Input: ThreatEvent + ClassificationResult + PolicyConfig
//! Output: PolicyOutcome stream ending in exactly one Completed(action)

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use super::callbacks::PolicyCallbacks;
use super::config::PolicyConfig;
use super::types::*;
use crate::constants::{BOT_ADVISORY_MESSAGE, COUNTERMEASURES_MESSAGE};
use crate::logic::native_guard::panic_message;
use crate::logic::telemetry::ThreatEvent;
use crate::logic::threat::{ClassificationResult, Severity};

// ============================================================================
// MAIN DECISION FUNCTION
// ============================================================================

/// Pure policy decision for a severity tier
pub fn decide(severity: Severity, config: &PolicyConfig) -> PolicyDecision {
    let mut effects = Vec::new();
    let mut reasons = Vec::new();

    let action = match severity {
        Severity::Low => {
            reasons.push("Low severity".to_string());
            quiet_action(config)
        }

        Severity::Medium if config.enable_user_notification => {
            effects.push(SideEffect::NotifyUser(BOT_ADVISORY_MESSAGE.to_string()));
            reasons.push("Medium severity - user notification enabled".to_string());
            ResponseAction::WarnUser
        }

        Severity::High if config.enable_security_countermeasures => {
            effects.push(SideEffect::Countermeasures);
            if config.enable_user_notification {
                effects.push(SideEffect::NotifyUser(COUNTERMEASURES_MESSAGE.to_string()));
            }
            reasons.push("High severity - countermeasures enabled".to_string());
            ResponseAction::SecurityMeasures
        }

        Severity::Critical if config.enable_app_protection => {
            effects.push(SideEffect::CriticalThreat);
            reasons.push("Critical severity - app protection enabled".to_string());
            ResponseAction::AppProtection
        }

        // Response for this tier is switched off
        _ => {
            reasons.push(format!("{} severity - response disabled by config", severity));
            quiet_action(config)
        }
    };

    PolicyDecision {
        severity,
        action,
        effects,
        reasons,
    }
}

fn quiet_action(config: &PolicyConfig) -> ResponseAction {
    if config.is_log_only_mode {
        ResponseAction::LogOnly
    } else {
        ResponseAction::Monitor
    }
}

// ============================================================================
// TICKET
// ============================================================================

/// Receiving end of one asynchronous policy run
#[derive(Debug)]
pub struct PolicyTicket {
    rx: mpsc::UnboundedReceiver<PolicyOutcome>,
}

impl PolicyTicket {
    /// Next outcome, `None` once the run has finished
    pub async fn next(&mut self) -> Option<PolicyOutcome> {
        self.rx.recv().await
    }

    /// Wait for the run to finish and return every outcome in order
    pub async fn collect(mut self) -> Vec<PolicyOutcome> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.rx.recv().await {
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Wait for the terminal action
    pub async fn completion(self) -> Option<ResponseAction> {
        self.collect().await.into_iter().find_map(|o| match o {
            PolicyOutcome::Completed(action) => Some(action),
            _ => None,
        })
    }
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct PolicyEngine {
    config: PolicyConfig,
    callbacks: Option<Arc<dyn PolicyCallbacks>>,
    runtime: Handle,
}

impl PolicyEngine {
    /// Engine that runs its work on `runtime`
    pub fn new(config: PolicyConfig, runtime: Handle) -> Self {
        log::info!(
            "Policy engine created (sensitivity: {}, log-only: {})",
            config.sensitivity.as_str(),
            config.is_log_only_mode
        );
        Self {
            config,
            callbacks: None,
            runtime,
        }
    }

    pub fn with_callbacks(mut self, callbacks: Arc<dyn PolicyCallbacks>) -> Self {
        self.callbacks = Some(callbacks);
        self
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Fire-and-forget: returns immediately, outcomes arrive on the ticket
    pub fn handle(&self, event: ThreatEvent, classification: ClassificationResult) -> PolicyTicket {
        let (tx, rx) = mpsc::unbounded_channel();
        let config = self.config.clone();
        let callbacks = self.callbacks.clone();

        self.runtime.spawn_blocking(move || {
            execute(&config, callbacks.as_deref(), &event, &classification, &mut |outcome| {
                // Receiver may be gone; the run still completes
                let _ = tx.send(outcome);
            });
        });

        PolicyTicket { rx }
    }

    /// Run inline on the calling thread
    pub fn process(&self, event: &ThreatEvent, classification: &ClassificationResult) -> Vec<PolicyOutcome> {
        let mut outcomes = Vec::new();
        execute(&self.config, self.callbacks.as_deref(), event, classification, &mut |o| {
            outcomes.push(o)
        });
        outcomes
    }
}

fn execute(
    config: &PolicyConfig,
    callbacks: Option<&dyn PolicyCallbacks>,
    event: &ThreatEvent,
    classification: &ClassificationResult,
    emit: &mut dyn FnMut(PolicyOutcome),
) {
    let decision = decide(classification.severity, config);

    log::info!(
        "Bot-defense event {}: severity {} -> {} (sensitivity: {}, indicators: {:?})",
        event.id,
        decision.severity,
        decision.action,
        config.sensitivity.as_str(),
        classification.indicators
    );

    for effect in &decision.effects {
        let result = match effect {
            SideEffect::NotifyUser(message) => {
                emit(PolicyOutcome::NotificationRequired(message.clone()));
                callbacks.map(|cb| invoke("on_notify_user", || cb.on_notify_user(message)))
            }
            SideEffect::Countermeasures => {
                emit(PolicyOutcome::CountermeasuresTriggered);
                callbacks.map(|cb| invoke("on_countermeasures", || cb.on_countermeasures(event)))
            }
            SideEffect::CriticalThreat => {
                emit(PolicyOutcome::CriticalThreat(event.clone()));
                callbacks.map(|cb| invoke("on_critical_threat", || cb.on_critical_threat(event)))
            }
        };

        if let Some(Err(err)) = result {
            log::error!("Policy callback error for event {}: {}", event.id, err);
            if let Some(cb) = callbacks {
                if let Err(e) = invoke("on_error", || {
                    cb.on_error(&err);
                    Ok(())
                }) {
                    log::error!("Policy error callback failed: {}", e);
                }
            }
            emit(PolicyOutcome::Failed(err));
        }
    }

    emit(PolicyOutcome::Completed(decision.action));
    if let Some(cb) = callbacks {
        if let Err(e) = invoke("on_complete", || {
            cb.on_complete(decision.action);
            Ok(())
        }) {
            log::error!("Policy completion callback failed: {}", e);
        }
    }
}

/// Run one callback, turning errors and panics into `PolicyError`
fn invoke<F>(callback: &'static str, f: F) -> Result<(), PolicyError>
where
    F: FnOnce() -> anyhow::Result<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(PolicyError::Callback {
            callback,
            reason: format!("{:#}", e),
        }),
        Err(payload) => Err(PolicyError::Panicked {
            callback,
            reason: panic_message(payload.as_ref()),
        }),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::telemetry::{attr, RawPayload};
    use crate::logic::threat::classify;
    use parking_lot::Mutex;

    /// Records every callback invocation by name
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
        fail_notify: bool,
        panic_countermeasures: bool,
    }

    impl Recorder {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    impl PolicyCallbacks for Recorder {
        fn on_notify_user(&self, message: &str) -> anyhow::Result<()> {
            self.calls.lock().push(format!("notify:{}", message));
            if self.fail_notify {
                anyhow::bail!("toast service unavailable");
            }
            Ok(())
        }

        fn on_countermeasures(&self, _event: &ThreatEvent) -> anyhow::Result<()> {
            self.calls.lock().push("countermeasures".to_string());
            if self.panic_countermeasures {
                panic!("countermeasure crashed");
            }
            Ok(())
        }

        fn on_critical_threat(&self, event: &ThreatEvent) -> anyhow::Result<()> {
            self.calls.lock().push(format!("critical:{}", event.id));
            Ok(())
        }

        fn on_complete(&self, action: ResponseAction) {
            self.calls.lock().push(format!("complete:{}", action));
        }

        fn on_error(&self, _error: &PolicyError) {
            self.calls.lock().push("error".to_string());
        }
    }

    fn bot_event(code: &str) -> ThreatEvent {
        ThreatEvent::new(
            "MobileBotDefenseCheck",
            RawPayload::new("MobileBotDefenseCheck")
                .with_attr(attr::THREAT_CODE, code)
                .attributes,
        )
    }

    fn all_configs() -> Vec<PolicyConfig> {
        let mut configs = Vec::new();
        for bits in 0u8..16 {
            configs.push(PolicyConfig {
                enable_user_notification: bits & 1 != 0,
                enable_security_countermeasures: bits & 2 != 0,
                enable_app_protection: bits & 4 != 0,
                is_log_only_mode: bits & 8 != 0,
                ..Default::default()
            });
        }
        configs
    }

    #[test]
    fn test_decision_table() {
        let log_only = PolicyConfig { is_log_only_mode: true, ..Default::default() };
        assert_eq!(decide(Severity::Low, &log_only).action, ResponseAction::LogOnly);
        assert_eq!(decide(Severity::Low, &PolicyConfig::default()).action, ResponseAction::Monitor);

        let medium = decide(Severity::Medium, &PolicyConfig::default());
        assert_eq!(medium.action, ResponseAction::WarnUser);
        assert_eq!(medium.effects, vec![SideEffect::NotifyUser(BOT_ADVISORY_MESSAGE.to_string())]);

        let high = decide(Severity::High, &PolicyConfig::default());
        assert_eq!(high.action, ResponseAction::SecurityMeasures);
        assert_eq!(high.effects[0], SideEffect::Countermeasures);
        assert_eq!(high.effects.len(), 2);

        let critical = decide(Severity::Critical, &PolicyConfig::default());
        assert_eq!(critical.action, ResponseAction::AppProtection);
        assert_eq!(critical.effects, vec![SideEffect::CriticalThreat]);
    }

    #[test]
    fn test_high_without_notification_skips_notify() {
        let config = PolicyConfig { enable_user_notification: false, ..Default::default() };
        let high = decide(Severity::High, &config);
        assert_eq!(high.effects, vec![SideEffect::Countermeasures]);
    }

    #[test]
    fn test_disabled_tier_degrades_quietly() {
        let config = PolicyConfig::log_only();
        for severity in Severity::ALL {
            let decision = decide(severity, &config);
            assert_eq!(decision.action, ResponseAction::LogOnly);
            assert!(decision.effects.is_empty());
        }

        let config = PolicyConfig { enable_app_protection: false, ..Default::default() };
        assert_eq!(decide(Severity::Critical, &config).action, ResponseAction::Monitor);
    }

    #[test]
    fn test_exactly_one_completion_for_every_combination() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        for config in all_configs() {
            for severity in Severity::ALL {
                let recorder = Arc::new(Recorder::default());
                let engine = PolicyEngine::new(config.clone(), runtime.handle().clone())
                    .with_callbacks(recorder.clone());
                let classification = ClassificationResult { severity, ..Default::default() };
                let outcomes = engine.process(&bot_event("X"), &classification);

                let completions = outcomes.iter().filter(|o| o.is_terminal()).count();
                assert_eq!(completions, 1, "{:?} {:?}", severity, config);
                assert!(outcomes.last().unwrap().is_terminal());

                let complete_calls = recorder.calls().iter().filter(|c| c.starts_with("complete:")).count();
                assert_eq!(complete_calls, 1);
            }
        }
    }

    #[tokio::test]
    async fn test_handle_completes_once_for_every_combination() {
        for config in all_configs() {
            for severity in Severity::ALL {
                let recorder = Arc::new(Recorder::default());
                let engine = PolicyEngine::new(config.clone(), Handle::current())
                    .with_callbacks(recorder.clone());
                let classification = ClassificationResult { severity, ..Default::default() };
                let outcomes = engine.handle(bot_event("X"), classification).collect().await;

                let completions = outcomes.iter().filter(|o| o.is_terminal()).count();
                assert_eq!(completions, 1, "{:?} {:?}", severity, config);
                assert!(outcomes.last().unwrap().is_terminal());

                let complete_calls = recorder.calls().iter().filter(|c| c.starts_with("complete:")).count();
                assert_eq!(complete_calls, 1, "{:?} {:?}", severity, config);
            }
        }
    }

    #[tokio::test]
    async fn test_handle_is_async_and_ordered() {
        let recorder = Arc::new(Recorder::default());
        let engine = PolicyEngine::new(PolicyConfig::default(), Handle::current())
            .with_callbacks(recorder.clone());

        let event = bot_event("BOT_HIGH_1");
        let outcomes = engine.handle(event.clone(), classify(&event)).collect().await;

        assert_eq!(
            outcomes,
            vec![
                PolicyOutcome::CountermeasuresTriggered,
                PolicyOutcome::NotificationRequired(COUNTERMEASURES_MESSAGE.to_string()),
                PolicyOutcome::Completed(ResponseAction::SecurityMeasures),
            ]
        );
        assert_eq!(
            recorder.calls(),
            vec![
                "countermeasures".to_string(),
                format!("notify:{}", COUNTERMEASURES_MESSAGE),
                "complete:SECURITY_MEASURES".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_critical_carries_original_event() {
        let recorder = Arc::new(Recorder::default());
        let engine = PolicyEngine::new(PolicyConfig::default(), Handle::current())
            .with_callbacks(recorder.clone());

        let event = bot_event("BOT_CRITICAL_1");
        let outcomes = engine.handle(event.clone(), classify(&event)).collect().await;

        assert_eq!(outcomes[0], PolicyOutcome::CriticalThreat(event.clone()));
        assert_eq!(recorder.calls()[0], format!("critical:{}", event.id));
    }

    #[tokio::test]
    async fn test_callback_error_is_reported_not_escalated() {
        let recorder = Arc::new(Recorder { fail_notify: true, ..Default::default() });
        let engine = PolicyEngine::new(PolicyConfig::default(), Handle::current())
            .with_callbacks(recorder.clone());

        let event = bot_event("BOT_MEDIUM_1");
        let outcomes = engine.handle(event.clone(), classify(&event)).collect().await;

        assert!(matches!(
            &outcomes[1],
            PolicyOutcome::Failed(PolicyError::Callback { callback: "on_notify_user", .. })
        ));
        assert_eq!(outcomes.last(), Some(&PolicyOutcome::Completed(ResponseAction::WarnUser)));
        assert_eq!(recorder.calls()[1], "error");
    }

    #[tokio::test]
    async fn test_callback_panic_is_contained() {
        let recorder = Arc::new(Recorder { panic_countermeasures: true, ..Default::default() });
        let engine = PolicyEngine::new(PolicyConfig::default(), Handle::current())
            .with_callbacks(recorder.clone());

        let event = bot_event("BOT_HIGH_1");
        let action = engine.handle(event.clone(), classify(&event)).completion().await;

        assert_eq!(action, Some(ResponseAction::SecurityMeasures));
        assert!(recorder.calls().contains(&"error".to_string()));
    }

    #[tokio::test]
    async fn test_runs_without_callbacks() {
        let engine = PolicyEngine::new(PolicyConfig::default(), Handle::current());
        let event = bot_event("BOT_CRITICAL_1");
        let action = engine.handle(event.clone(), classify(&event)).completion().await;
        assert_eq!(action, Some(ResponseAction::AppProtection));
    }
}
