// ── Environment switch state machine ──
//
// One `EnvironmentSwitch` per attempt: Idle → Pending → {Committed, RolledBack}.
// The controller drives it: `begin` applies the optimistic selector value,
// `resolve` folds the server's answer into a `SwitchOutcome`.

use serde::Serialize;

use healthdash_api::SetEnvironmentResponse;

/// Reason shown when the server rejects a switch without saying why.
pub const UNKNOWN_REJECTION: &str = "unknown error";

/// Notification text for switch attempts that never reached the server.
pub const UNREACHABLE_MESSAGE: &str = "Could not reach the server to switch environments";

/// Phase of the most recent switch attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SwitchPhase {
    #[default]
    Idle,
    Pending,
    Committed,
    RolledBack,
}

/// An in-flight switch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentSwitch {
    previous: String,
    target: String,
}

impl EnvironmentSwitch {
    /// Start an attempt from `current` to `target`.
    ///
    /// Returns `None` when there is nothing to switch: the target is blank
    /// or already current.
    pub fn begin(current: &str, target: &str) -> Option<Self> {
        let target = target.trim();
        if target.is_empty() || target == current {
            return None;
        }
        Some(Self {
            previous: current.to_owned(),
            target: target.to_owned(),
        })
    }

    /// Environment committed before this attempt; the rollback value.
    pub fn previous(&self) -> &str {
        &self.previous
    }

    /// Requested environment; the optimistic selector value.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn phase(&self) -> SwitchPhase {
        SwitchPhase::Pending
    }

    /// Settle the attempt with the server's answer.
    pub fn resolve(
        self,
        result: Result<SetEnvironmentResponse, healthdash_api::Error>,
    ) -> SwitchOutcome {
        match result {
            Ok(resp) if resp.success => SwitchOutcome::Committed {
                previous: self.previous,
                // The server echoes the name it actually selected; trust it.
                environment: resp.environment.unwrap_or(self.target),
            },
            Ok(resp) => SwitchOutcome::RolledBack {
                environment: self.previous,
                attempted: self.target,
                reason: RollbackReason::Rejected(
                    resp.error.unwrap_or_else(|| UNKNOWN_REJECTION.to_owned()),
                ),
            },
            Err(e) => SwitchOutcome::RolledBack {
                environment: self.previous,
                attempted: self.target,
                reason: RollbackReason::Unreachable(e.to_string()),
            },
        }
    }
}

/// Why a switch was rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RollbackReason {
    /// `success: false`, with the server's reason.
    Rejected(String),
    /// Transport or protocol failure; carries the underlying error text.
    Unreachable(String),
}

impl RollbackReason {
    /// Operator-facing notification text.
    pub fn message(&self) -> String {
        match self {
            Self::Rejected(reason) => format!("Failed to switch environment: {reason}"),
            Self::Unreachable(_) => UNREACHABLE_MESSAGE.to_owned(),
        }
    }
}

/// Terminal result of a switch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SwitchOutcome {
    /// Target already current; nothing was sent.
    Unchanged { environment: String },
    Committed { previous: String, environment: String },
    RolledBack {
        environment: String,
        attempted: String,
        reason: RollbackReason,
    },
}

impl SwitchOutcome {
    /// Environment that is committed after this outcome.
    pub fn environment(&self) -> &str {
        match self {
            Self::Unchanged { environment }
            | Self::Committed { environment, .. }
            | Self::RolledBack { environment, .. } => environment,
        }
    }

    pub fn phase(&self) -> SwitchPhase {
        match self {
            Self::Unchanged { .. } => SwitchPhase::Idle,
            Self::Committed { .. } => SwitchPhase::Committed,
            Self::RolledBack { .. } => SwitchPhase::RolledBack,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}
