//! ``src/model/lifecycle.rs``
//! ============================================================================
//! # `CollectionLifecycle`: Discovery Session State Machine
//!
//! The session moves Ready → Connecting → Connected → Collecting → Collected,
//! with Error reachable from anywhere. [`transition`] is a pure function of
//! `(state, event)`; side effects are returned as [`Effect`] values for the
//! controller to run. Every accepted start/stop bumps the generation, and
//! results tagged with an older generation are discarded.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectorStatus {
    #[default]
    Ready,
    Connecting,
    Connected,
    Collecting,
    Collected,
    Error,
}

impl CollectorStatus {
    /// A collection is in flight on the agent.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::Connected | Self::Collecting)
    }

    #[must_use]
    pub const fn can_start(self) -> bool {
        matches!(self, Self::Ready | Self::Error | Self::Collected)
    }

    /// Position along the forward path; `None` for Ready and Error.
    const fn progress(self) -> Option<u8> {
        match self {
            Self::Connecting => Some(1),
            Self::Connected => Some(2),
            Self::Collecting => Some(3),
            Self::Collected => Some(4),
            Self::Ready | Self::Error => None,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ready => "Ready",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
            Self::Collecting => "Collecting",
            Self::Collected => "Collected",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for CollectorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Collector status as reported by the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    #[serde(alias = "state")]
    pub status: CollectorStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_credentials: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusReport {
    #[must_use]
    pub const fn new(status: CollectorStatus) -> Self {
        Self {
            status,
            has_credentials: None,
            error: None,
        }
    }
}

/// vCenter credentials, held only for the request that carries them.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub url: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(u64);

impl Generation {
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleState {
    pub status: CollectorStatus,
    pub error: Option<String>,
    pub has_credentials: bool,
    /// A start or stop request is in flight.
    pub busy: bool,
    pub generation: Generation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Console start-up: sync with whatever the agent is doing.
    Attach,
    Start(Credentials),
    StartResolved {
        generation: Generation,
        report: StatusReport,
    },
    StartFailed {
        generation: Generation,
        message: String,
    },
    Stop,
    StopResolved {
        generation: Generation,
    },
    StopFailed {
        generation: Generation,
        message: String,
    },
    PollResolved {
        generation: Generation,
        report: StatusReport,
    },
    StatusFetchFailed {
        generation: Generation,
        message: String,
    },
    StatusSynced {
        generation: Generation,
        report: StatusReport,
    },
}

impl LifecycleEvent {
    const fn name(&self) -> &'static str {
        match self {
            Self::Attach => "attach",
            Self::Start(_) => "start",
            Self::StartResolved { .. } => "start_resolved",
            Self::StartFailed { .. } => "start_failed",
            Self::Stop => "stop",
            Self::StopResolved { .. } => "stop_resolved",
            Self::StopFailed { .. } => "stop_failed",
            Self::PollResolved { .. } => "poll_resolved",
            Self::StatusFetchFailed { .. } => "status_fetch_failed",
            Self::StatusSynced { .. } => "status_synced",
        }
    }

    /// Generation a result was issued under; commands carry none.
    const fn tag(&self) -> Option<Generation> {
        match self {
            Self::Attach | Self::Start(_) | Self::Stop => None,
            Self::StartResolved { generation, .. }
            | Self::StartFailed { generation, .. }
            | Self::StopResolved { generation }
            | Self::StopFailed { generation, .. }
            | Self::PollResolved { generation, .. }
            | Self::StatusFetchFailed { generation, .. }
            | Self::StatusSynced { generation, .. } => Some(*generation),
        }
    }
}

/// Work for the controller to perform after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Connect {
        generation: Generation,
        credentials: Credentials,
    },
    Disconnect {
        generation: Generation,
    },
    StartPolling {
        generation: Generation,
    },
    StopPolling,
    SyncStatus {
        generation: Generation,
    },
    FetchInventory {
        generation: Generation,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// The command is not valid in the current state.
    Rejected(&'static str),
    /// A current result that carries nothing to apply.
    Ignored,
    /// A result from an earlier generation.
    Stale,
}

pub type Effects = SmallVec<[Effect; 3]>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: LifecycleState,
    pub effects: Effects,
    pub outcome: Outcome,
}

impl Transition {
    fn unchanged(state: &LifecycleState, outcome: Outcome) -> Self {
        Self {
            next: state.clone(),
            effects: Effects::new(),
            outcome,
        }
    }

    fn applied(next: LifecycleState, effects: Effects) -> Self {
        Self {
            next,
            effects,
            outcome: Outcome::Applied,
        }
    }
}

const COLLECTION_FAILED: &str = "Collection failed";

fn into_error(mut next: LifecycleState, message: String) -> Transition {
    next.status = CollectorStatus::Error;
    next.error = Some(message);
    next.busy = false;
    Transition::applied(next, SmallVec::from_iter([Effect::StopPolling]))
}

/// Apply a reported phase along the forward-only path.
fn advance(state: &LifecycleState, mut next: LifecycleState, report: StatusReport) -> Transition {
    if let Some(flag) = report.has_credentials {
        next.has_credentials = flag;
    }

    if report.status == CollectorStatus::Error {
        let message = report.error.unwrap_or_else(|| COLLECTION_FAILED.to_string());
        return into_error(next, message);
    }

    let moves_forward = match (state.status.progress(), report.status.progress()) {
        (Some(current), Some(reported)) => reported > current,
        _ => false,
    };
    if !moves_forward {
        let outcome = if next == *state {
            Outcome::Ignored
        } else {
            Outcome::Applied
        };
        return Transition {
            next,
            effects: Effects::new(),
            outcome,
        };
    }

    next.status = report.status;
    let mut effects = Effects::new();
    if report.status == CollectorStatus::Collected {
        effects.push(Effect::StopPolling);
        effects.push(Effect::FetchInventory {
            generation: next.generation,
        });
    }
    Transition::applied(next, effects)
}

/// Pure lifecycle transition.
#[must_use]
pub fn transition(state: &LifecycleState, event: LifecycleEvent) -> Transition {
    if let Some(tag) = event.tag()
        && tag != state.generation
    {
        return Transition::unchanged(state, Outcome::Stale);
    }

    let mut next = state.clone();
    match event {
        LifecycleEvent::Attach => Transition::applied(
            next,
            SmallVec::from_iter([Effect::SyncStatus {
                generation: state.generation,
            }]),
        ),

        LifecycleEvent::Start(credentials) => {
            if !state.status.can_start() {
                return Transition::unchanged(state, Outcome::Rejected("a collection is already running"));
            }
            next.status = CollectorStatus::Connecting;
            next.generation = state.generation.next();
            next.error = None;
            next.busy = true;
            let generation = next.generation;
            // Polling waits for the start reply; until then the agent may
            // still report the previous session's phase.
            Transition::applied(
                next,
                SmallVec::from_iter([Effect::Connect {
                    generation,
                    credentials,
                }]),
            )
        }

        LifecycleEvent::StartResolved { report, .. } => {
            next.busy = false;
            let mut resolved = advance(state, next, report);
            if resolved.next.status.is_active() {
                resolved.effects.push(Effect::StartPolling {
                    generation: resolved.next.generation,
                });
                resolved.outcome = Outcome::Applied;
            }
            resolved
        }

        LifecycleEvent::StartFailed { message, .. }
        | LifecycleEvent::StatusFetchFailed { message, .. } => into_error(next, message),

        LifecycleEvent::Stop => {
            if state.status == CollectorStatus::Ready {
                return Transition::unchanged(state, Outcome::Rejected("no collection to stop"));
            }
            let in_flight = state.status.is_active() || state.busy;
            next.status = CollectorStatus::Ready;
            next.generation = state.generation.next();
            next.error = None;
            next.busy = in_flight;

            let mut effects = SmallVec::from_iter([Effect::StopPolling]);
            if in_flight {
                effects.push(Effect::Disconnect {
                    generation: next.generation,
                });
            }
            Transition::applied(next, effects)
        }

        LifecycleEvent::StopResolved { .. } | LifecycleEvent::StopFailed { .. } => {
            if !state.busy {
                return Transition::unchanged(state, Outcome::Ignored);
            }
            next.busy = false;
            Transition::applied(next, Effects::new())
        }

        LifecycleEvent::PollResolved { report, .. } => {
            if !state.status.is_active() {
                return Transition::unchanged(state, Outcome::Ignored);
            }
            advance(state, next, report)
        }

        LifecycleEvent::StatusSynced { report, .. } => {
            next.status = report.status;
            next.error = match report.status {
                CollectorStatus::Error => {
                    Some(report.error.unwrap_or_else(|| COLLECTION_FAILED.to_string()))
                }
                _ => None,
            };
            if let Some(flag) = report.has_credentials {
                next.has_credentials = flag;
            }

            let generation = next.generation;
            let mut effects = Effects::new();
            if next.status.is_active() {
                effects.push(Effect::StartPolling { generation });
            } else if next.status == CollectorStatus::Collected {
                effects.push(Effect::FetchInventory { generation });
            }
            Transition::applied(next, effects)
        }
    }
}

/// Owning wrapper that applies transitions and logs them.
#[derive(Debug, Default)]
pub struct CollectionLifecycle {
    state: LifecycleState,
}

impl CollectionLifecycle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> &LifecycleState {
        &self.state
    }

    #[must_use]
    pub const fn status(&self) -> CollectorStatus {
        self.state.status
    }

    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.state.generation
    }

    pub fn apply(&mut self, event: LifecycleEvent) -> (Outcome, Effects) {
        let name = event.name();
        let from = self.state.status;
        let Transition {
            next,
            effects,
            outcome,
        } = transition(&self.state, event);

        match outcome {
            Outcome::Applied => info!(
                marker = "LIFECYCLE",
                operation_type = "lifecycle_transition",
                event = name,
                from = %from,
                to = %next.status,
                generation = %next.generation,
                effects = effects.len(),
                "Lifecycle transition applied"
            ),
            Outcome::Rejected(reason) => warn!(
                marker = "LIFECYCLE",
                operation_type = "lifecycle_transition",
                event = name,
                status = %from,
                reason,
                "Lifecycle command rejected"
            ),
            Outcome::Ignored | Outcome::Stale => debug!(
                marker = "LIFECYCLE",
                operation_type = "lifecycle_transition",
                event = name,
                status = %from,
                outcome = ?outcome,
                "Lifecycle result discarded"
            ),
        }

        self.state = next;
        (outcome, effects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials {
            url: "https://vcenter.local/sdk".into(),
            username: "admin".into(),
            password: "hunter2".into(),
        }
    }

    fn report(status: CollectorStatus) -> StatusReport {
        StatusReport::new(status)
    }

    fn started() -> (CollectionLifecycle, Generation) {
        let mut lifecycle = CollectionLifecycle::new();
        let (outcome, effects) = lifecycle.apply(LifecycleEvent::Start(creds()));
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(effects.len(), 1);
        (lifecycle, lifecycle_generation(&effects))
    }

    fn lifecycle_generation(effects: &Effects) -> Generation {
        match &effects[0] {
            Effect::Connect { generation, .. } => *generation,
            other => panic!("unexpected effect {other:?}"),
        }
    }

    #[test]
    fn start_from_ready_connects() {
        let (lifecycle, generation) = started();
        assert_eq!(lifecycle.status(), CollectorStatus::Connecting);
        assert!(lifecycle.state().busy);
        assert_eq!(generation, lifecycle.generation());
        assert_eq!(generation.get(), 1);
    }

    #[test]
    fn polling_begins_once_start_resolves() {
        let (mut lifecycle, g) = started();
        let (outcome, effects) = lifecycle.apply(LifecycleEvent::StartResolved {
            generation: g,
            report: report(CollectorStatus::Connecting),
        });
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(lifecycle.status(), CollectorStatus::Connecting);
        assert!(!lifecycle.state().busy);
        assert_eq!(effects.as_slice(), &[Effect::StartPolling { generation: g }]);
    }

    #[test]
    fn start_resolving_as_error_does_not_poll() {
        let (mut lifecycle, g) = started();
        let (_, effects) = lifecycle.apply(LifecycleEvent::StartResolved {
            generation: g,
            report: report(CollectorStatus::Error),
        });
        assert_eq!(lifecycle.status(), CollectorStatus::Error);
        assert_eq!(effects.as_slice(), &[Effect::StopPolling]);
    }

    #[test]
    fn start_right_after_stop_does_not_wait_for_disconnect() {
        let (mut lifecycle, _) = started();
        lifecycle.apply(LifecycleEvent::Stop);
        let stopped = lifecycle.generation();
        assert!(lifecycle.state().busy);

        let (outcome, effects) = lifecycle.apply(LifecycleEvent::Start(creds()));
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(lifecycle.status(), CollectorStatus::Connecting);
        assert!(matches!(effects[0], Effect::Connect { .. }));

        // The pending disconnect reply belongs to the stopped generation.
        let (outcome, _) = lifecycle.apply(LifecycleEvent::StopResolved {
            generation: stopped,
        });
        assert_eq!(outcome, Outcome::Stale);
        assert!(lifecycle.state().busy);
        assert_eq!(lifecycle.status(), CollectorStatus::Connecting);
    }

    #[test]
    fn start_while_active_is_rejected() {
        let (mut lifecycle, _) = started();
        let before = lifecycle.state().clone();
        let (outcome, effects) = lifecycle.apply(LifecycleEvent::Start(creds()));
        assert!(matches!(outcome, Outcome::Rejected(_)));
        assert!(effects.is_empty());
        assert_eq!(lifecycle.state(), &before);
    }

    #[test]
    fn polls_advance_forward_only() {
        let (mut lifecycle, g) = started();
        lifecycle.apply(LifecycleEvent::StartResolved {
            generation: g,
            report: report(CollectorStatus::Connected),
        });
        assert_eq!(lifecycle.status(), CollectorStatus::Connected);
        assert!(!lifecycle.state().busy);

        let (outcome, _) = lifecycle.apply(LifecycleEvent::PollResolved {
            generation: g,
            report: report(CollectorStatus::Connecting),
        });
        assert_eq!(outcome, Outcome::Ignored);
        assert_eq!(lifecycle.status(), CollectorStatus::Connected);

        lifecycle.apply(LifecycleEvent::PollResolved {
            generation: g,
            report: report(CollectorStatus::Ready),
        });
        assert_eq!(lifecycle.status(), CollectorStatus::Connected);

        lifecycle.apply(LifecycleEvent::PollResolved {
            generation: g,
            report: report(CollectorStatus::Collecting),
        });
        assert_eq!(lifecycle.status(), CollectorStatus::Collecting);
    }

    #[test]
    fn collected_stops_polling_and_fetches_inventory() {
        let (mut lifecycle, g) = started();
        let (_, effects) = lifecycle.apply(LifecycleEvent::PollResolved {
            generation: g,
            report: report(CollectorStatus::Collected),
        });
        assert_eq!(lifecycle.status(), CollectorStatus::Collected);
        assert_eq!(
            effects.as_slice(),
            &[Effect::StopPolling, Effect::FetchInventory { generation: g }]
        );
    }

    #[test]
    fn stop_during_connecting_ignores_late_poll() {
        let (mut lifecycle, g) = started();

        let (outcome, effects) = lifecycle.apply(LifecycleEvent::Stop);
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(lifecycle.status(), CollectorStatus::Ready);
        assert_eq!(effects[0], Effect::StopPolling);
        assert!(matches!(effects[1], Effect::Disconnect { .. }));

        let (outcome, _) = lifecycle.apply(LifecycleEvent::PollResolved {
            generation: g,
            report: report(CollectorStatus::Connected),
        });
        assert_eq!(outcome, Outcome::Stale);
        assert_eq!(lifecycle.status(), CollectorStatus::Ready);

        let (outcome, _) = lifecycle.apply(LifecycleEvent::StartResolved {
            generation: g,
            report: report(CollectorStatus::Collecting),
        });
        assert_eq!(outcome, Outcome::Stale);
        assert_eq!(lifecycle.status(), CollectorStatus::Ready);
    }

    #[test]
    fn stop_from_ready_is_rejected() {
        let mut lifecycle = CollectionLifecycle::new();
        let (outcome, _) = lifecycle.apply(LifecycleEvent::Stop);
        assert!(matches!(outcome, Outcome::Rejected(_)));
        assert_eq!(lifecycle.generation().get(), 0);
    }

    #[test]
    fn stop_from_collected_skips_disconnect() {
        let (mut lifecycle, g) = started();
        lifecycle.apply(LifecycleEvent::StartResolved {
            generation: g,
            report: report(CollectorStatus::Collected),
        });
        let (_, effects) = lifecycle.apply(LifecycleEvent::Stop);
        assert_eq!(effects.as_slice(), &[Effect::StopPolling]);
        assert!(!lifecycle.state().busy);
    }

    #[test]
    fn stop_failure_keeps_state() {
        let (mut lifecycle, _) = started();
        lifecycle.apply(LifecycleEvent::Stop);
        let g = lifecycle.generation();
        assert!(lifecycle.state().busy);

        let (outcome, _) = lifecycle.apply(LifecycleEvent::StopFailed {
            generation: g,
            message: "agent unreachable".into(),
        });
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(lifecycle.status(), CollectorStatus::Ready);
        assert_eq!(lifecycle.state().error, None);
        assert!(!lifecycle.state().busy);
    }

    #[test]
    fn error_report_enters_error_with_message() {
        let (mut lifecycle, g) = started();
        let mut failed = report(CollectorStatus::Error);
        failed.error = Some("invalid credentials".into());

        let (_, effects) = lifecycle.apply(LifecycleEvent::PollResolved {
            generation: g,
            report: failed,
        });
        assert_eq!(lifecycle.status(), CollectorStatus::Error);
        assert_eq!(lifecycle.state().error.as_deref(), Some("invalid credentials"));
        assert_eq!(effects.as_slice(), &[Effect::StopPolling]);
    }

    #[test]
    fn status_fetch_failure_moves_to_error_and_restart_clears_it() {
        let (mut lifecycle, g) = started();
        lifecycle.apply(LifecycleEvent::StatusFetchFailed {
            generation: g,
            message: "connection refused".into(),
        });
        assert_eq!(lifecycle.status(), CollectorStatus::Error);

        let (outcome, _) = lifecycle.apply(LifecycleEvent::Start(creds()));
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(lifecycle.status(), CollectorStatus::Connecting);
        assert_eq!(lifecycle.state().error, None);
    }

    #[test]
    fn stale_failure_is_discarded() {
        let (mut lifecycle, g) = started();
        lifecycle.apply(LifecycleEvent::Stop);
        lifecycle.apply(LifecycleEvent::StopResolved {
            generation: lifecycle.generation(),
        });
        lifecycle.apply(LifecycleEvent::Start(creds()));

        let (outcome, _) = lifecycle.apply(LifecycleEvent::StatusFetchFailed {
            generation: g,
            message: "old failure".into(),
        });
        assert_eq!(outcome, Outcome::Stale);
        assert_eq!(lifecycle.status(), CollectorStatus::Connecting);
    }

    #[test]
    fn attach_adopts_agent_phase() {
        let mut lifecycle = CollectionLifecycle::new();
        let (_, effects) = lifecycle.apply(LifecycleEvent::Attach);
        let generation = lifecycle.generation();
        assert_eq!(effects.as_slice(), &[Effect::SyncStatus { generation }]);

        let mut synced = report(CollectorStatus::Collecting);
        synced.has_credentials = Some(true);
        let (_, effects) = lifecycle.apply(LifecycleEvent::StatusSynced {
            generation,
            report: synced,
        });
        assert_eq!(lifecycle.status(), CollectorStatus::Collecting);
        assert!(lifecycle.state().has_credentials);
        assert_eq!(effects.as_slice(), &[Effect::StartPolling { generation }]);
    }

    #[test]
    fn attach_to_collected_session_fetches_inventory() {
        let mut lifecycle = CollectionLifecycle::new();
        lifecycle.apply(LifecycleEvent::Attach);
        let generation = lifecycle.generation();
        let (_, effects) = lifecycle.apply(LifecycleEvent::StatusSynced {
            generation,
            report: report(CollectorStatus::Collected),
        });
        assert_eq!(effects.as_slice(), &[Effect::FetchInventory { generation }]);
    }

    #[test]
    fn report_accepts_state_alias() {
        let report: StatusReport =
            serde_json::from_str(r#"{"state":"collecting","hasCredentials":true}"#).unwrap();
        assert_eq!(report.status, CollectorStatus::Collecting);
        assert_eq!(report.has_credentials, Some(true));
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let rendered = format!("{:?}", creds());
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
