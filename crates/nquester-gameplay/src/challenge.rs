//! Challenge dispatch: routes a quest's challenge to an external provider.
//!
//! Providers (minigames, the boss battle) are black boxes that run to
//! completion synchronously. Whatever they do, the dispatcher turns it into a
//! [`ChallengeOutcome`]; a provider error or panic never escapes.

use crate::catalog::{ChallengeKind, ChallengeParams};
use crate::player::PlayerProgress;
use nquester_common::QuestId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors a provider can report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChallengeError {
    /// Player backed out (escape)
    #[error("Challenge cancelled")]
    Cancelled,
    /// Provider broke
    #[error("Provider failure: {0}")]
    Provider(String),
    /// Nothing registered for this kind
    #[error("No provider registered for {0}")]
    MissingProvider(ChallengeKind),
}

/// Optional measurements a provider may report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChallengeMetrics {
    /// Seconds the challenge took
    pub time_taken: Option<f64>,
    /// Bugs squashed during the challenge
    pub bugs_found: Option<u32>,
}

impl ChallengeMetrics {
    /// Metrics with only a time.
    #[must_use]
    pub const fn timed(seconds: f64) -> Self {
        Self {
            time_taken: Some(seconds),
            bugs_found: None,
        }
    }
}

/// What a provider returns when it runs to completion.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChallengeReport {
    /// Pass or fail
    pub success: bool,
    /// Optional measurements
    pub metrics: ChallengeMetrics,
}

impl ChallengeReport {
    /// A passing report.
    #[must_use]
    pub const fn passed(metrics: ChallengeMetrics) -> Self {
        Self {
            success: true,
            metrics,
        }
    }

    /// A failing report.
    #[must_use]
    pub const fn failed(metrics: ChallengeMetrics) -> Self {
        Self {
            success: false,
            metrics,
        }
    }
}

/// Everything a provider is given to run a challenge.
#[derive(Debug, Clone, Copy)]
pub struct ChallengeRequest<'a> {
    /// Quest being attempted
    pub quest_id: &'a QuestId,
    /// Challenge parameters
    pub params: &'a ChallengeParams,
    /// Player state, read only
    pub player: &'a PlayerProgress,
}

impl ChallengeRequest<'_> {
    /// Challenge kind.
    #[must_use]
    pub const fn kind(&self) -> ChallengeKind {
        self.params.kind()
    }
}

/// Outcome of a dispatched challenge.
#[derive(Debug, Clone, PartialEq)]
pub enum ChallengeOutcome {
    /// Challenge passed
    Passed(ChallengeMetrics),
    /// Challenge failed
    Failed(ChallengeMetrics),
    /// Player cancelled; counts as a failed attempt
    Cancelled,
    /// Provider missing, errored or panicked; counts as a failed attempt
    ProviderError(String),
}

impl ChallengeOutcome {
    /// Returns whether the challenge passed.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Passed(_))
    }

    /// Metrics, if the provider reported any.
    #[must_use]
    pub const fn metrics(&self) -> Option<&ChallengeMetrics> {
        match self {
            Self::Passed(metrics) | Self::Failed(metrics) => Some(metrics),
            Self::Cancelled | Self::ProviderError(_) => None,
        }
    }
}

/// An external challenge implementation.
pub trait ChallengeProvider {
    /// Runs the challenge to completion.
    fn run(&mut self, request: &ChallengeRequest<'_>) -> Result<ChallengeReport, ChallengeError>;
}

impl<F> ChallengeProvider for F
where
    F: FnMut(&ChallengeRequest<'_>) -> Result<ChallengeReport, ChallengeError>,
{
    fn run(&mut self, request: &ChallengeRequest<'_>) -> Result<ChallengeReport, ChallengeError> {
        self(request)
    }
}

/// Pins a closure to the provider signature so its argument lifetimes infer.
pub fn provider_fn<F>(f: F) -> F
where
    F: FnMut(&ChallengeRequest<'_>) -> Result<ChallengeReport, ChallengeError>,
{
    f
}

/// Built-in check: the player holds the fetch item or every collection item.
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryCheck;

impl ChallengeProvider for InventoryCheck {
    fn run(&mut self, request: &ChallengeRequest<'_>) -> Result<ChallengeReport, ChallengeError> {
        let success = match request.params {
            ChallengeParams::Fetch { item } => request.player.has_item(item.as_str()),
            ChallengeParams::ItemCollection { required_items } => {
                request.player.missing_items(required_items).is_empty()
            },
            other => {
                return Err(ChallengeError::Provider(format!(
                    "inventory check cannot run {}",
                    other.kind()
                )))
            },
        };
        Ok(ChallengeReport {
            success,
            metrics: ChallengeMetrics::default(),
        })
    }
}

/// Routes challenges to providers by kind.
#[derive(Default)]
pub struct ChallengeDispatcher {
    providers: HashMap<ChallengeKind, Box<dyn ChallengeProvider>>,
}

impl std::fmt::Debug for ChallengeDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.providers.keys().collect();
        kinds.sort();
        f.debug_struct("ChallengeDispatcher")
            .field("providers", &kinds)
            .finish()
    }
}

impl ChallengeDispatcher {
    /// Creates a dispatcher with no providers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dispatcher with the inventory checks registered for fetch
    /// and item collection.
    #[must_use]
    pub fn with_builtin_checks() -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register(ChallengeKind::Fetch, InventoryCheck);
        dispatcher.register(ChallengeKind::ItemCollection, InventoryCheck);
        dispatcher
    }

    /// Registers (or replaces) the provider for a kind.
    pub fn register(&mut self, kind: ChallengeKind, provider: impl ChallengeProvider + 'static) {
        self.providers.insert(kind, Box::new(provider));
    }

    /// Returns whether a provider is registered for `kind`.
    #[must_use]
    pub fn has_provider(&self, kind: ChallengeKind) -> bool {
        self.providers.contains_key(&kind)
    }

    /// Runs the challenge and converts whatever happens into an outcome.
    pub fn dispatch(&mut self, request: &ChallengeRequest<'_>) -> ChallengeOutcome {
        let kind = request.kind();
        let Some(provider) = self.providers.get_mut(&kind) else {
            warn!("No challenge provider for {kind}");
            return ChallengeOutcome::ProviderError(
                ChallengeError::MissingProvider(kind).to_string(),
            );
        };

        let result = panic::catch_unwind(AssertUnwindSafe(|| provider.run(request)));
        let outcome = match result {
            Ok(Ok(report)) if report.success => ChallengeOutcome::Passed(report.metrics),
            Ok(Ok(report)) => ChallengeOutcome::Failed(report.metrics),
            Ok(Err(ChallengeError::Cancelled)) => ChallengeOutcome::Cancelled,
            Ok(Err(e)) => {
                warn!("Challenge provider for {kind} failed: {e}");
                ChallengeOutcome::ProviderError(e.to_string())
            },
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!("Challenge provider for {kind} panicked: {message}");
                ChallengeOutcome::ProviderError(message)
            },
        };
        debug!("Challenge {} for {} -> {outcome:?}", kind, request.quest_id);
        outcome
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "provider panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nquester_common::ItemId;

    fn request<'a>(
        quest_id: &'a QuestId,
        params: &'a ChallengeParams,
        player: &'a PlayerProgress,
    ) -> ChallengeRequest<'a> {
        ChallengeRequest {
            quest_id,
            params,
            player,
        }
    }

    #[test]
    fn test_closure_provider_passes() {
        let mut dispatcher = ChallengeDispatcher::new();
        dispatcher.register(
            ChallengeKind::Minigame,
            provider_fn(|_| Ok(ChallengeReport::passed(ChallengeMetrics::timed(3.0)))),
        );

        let quest = QuestId::new("q1");
        let params = ChallengeParams::minigame("swift_debug");
        let player = PlayerProgress::new();
        let outcome = dispatcher.dispatch(&request(&quest, &params, &player));
        assert_eq!(outcome, ChallengeOutcome::Passed(ChallengeMetrics::timed(3.0)));
        assert!(outcome.is_success());
    }

    #[test]
    fn test_missing_provider_is_error() {
        let mut dispatcher = ChallengeDispatcher::new();
        let quest = QuestId::new("q1");
        let params = ChallengeParams::BossBattle;
        let player = PlayerProgress::new();
        let outcome = dispatcher.dispatch(&request(&quest, &params, &player));
        assert!(matches!(outcome, ChallengeOutcome::ProviderError(_)));
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_cancel_and_error_mapping() {
        let mut dispatcher = ChallengeDispatcher::new();
        dispatcher.register(
            ChallengeKind::Clicker,
            provider_fn(|_| Err(ChallengeError::Cancelled)),
        );
        dispatcher.register(
            ChallengeKind::Rhythm,
            provider_fn(|_| Err(ChallengeError::Provider("audio device lost".to_string()))),
        );

        let quest = QuestId::new("q");
        let player = PlayerProgress::new();
        let clicker = ChallengeParams::clicker(50, 30);
        assert_eq!(
            dispatcher.dispatch(&request(&quest, &clicker, &player)),
            ChallengeOutcome::Cancelled
        );

        let rhythm = ChallengeParams::Rhythm {
            beats_needed: 20,
            time_limit_secs: 30,
        };
        let outcome = dispatcher.dispatch(&request(&quest, &rhythm, &player));
        assert!(
            matches!(outcome, ChallengeOutcome::ProviderError(ref m) if m.contains("audio"))
        );
    }

    #[test]
    fn test_panicking_provider_is_contained() {
        let mut dispatcher = ChallengeDispatcher::new();
        dispatcher.register(
            ChallengeKind::BossBattle,
            provider_fn(|_| panic!("boss sprite missing")),
        );

        let quest = QuestId::new("quest_final_boss");
        let params = ChallengeParams::BossBattle;
        let player = PlayerProgress::new();
        let outcome = dispatcher.dispatch(&request(&quest, &params, &player));
        assert_eq!(
            outcome,
            ChallengeOutcome::ProviderError("boss sprite missing".to_string())
        );
    }

    #[test]
    fn test_inventory_check() {
        let mut dispatcher = ChallengeDispatcher::with_builtin_checks();
        let quest = QuestId::new("collect");
        let params = ChallengeParams::collection(["a", "b"]);
        let mut player = PlayerProgress::new();
        player.add_item(ItemId::new("a"), 1);

        let outcome = dispatcher.dispatch(&request(&quest, &params, &player));
        assert!(matches!(outcome, ChallengeOutcome::Failed(_)));

        player.add_item(ItemId::new("b"), 1);
        let outcome = dispatcher.dispatch(&request(&quest, &params, &player));
        assert!(outcome.is_success());
    }
}
