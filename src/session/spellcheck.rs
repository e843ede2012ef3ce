//! Spelling validation in front of every explicit submission.

use crate::config::SpellFailurePolicy;
use crate::error::BackendError;
use crate::model::SpellCheck;
use crate::session::query::{QueryStore, Seq};

/// A validation request the orchestrator should send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateRequest {
    pub seq: Seq,
    pub word: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GatePhase {
    #[default]
    Idle,
    Validating {
        seq: Seq,
        text: String,
    },
    CorrectionNeeded {
        original: String,
        suggestion: String,
    },
    /// Only reachable with [`SpellFailurePolicy::FailClosed`]
    Blocked {
        text: String,
        reason: String,
    },
}

/// What the session should do after a validation response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// The response belongs to an abandoned submission
    Stale,
    /// Search may run for `text`
    Proceed { seq: Seq, text: String },
    /// The user is offered `suggestion` instead
    Correction { suggestion: String },
    /// Validation failed and the policy refuses to search
    Blocked,
}

#[derive(Debug, Clone, Default)]
pub struct SpellCheckGate {
    phase: GatePhase,
    policy: SpellFailurePolicy,
}

impl SpellCheckGate {
    pub fn new(policy: SpellFailurePolicy) -> Self {
        Self {
            phase: GatePhase::Idle,
            policy,
        }
    }

    pub fn phase(&self) -> &GatePhase {
        &self.phase
    }

    pub fn policy(&self) -> SpellFailurePolicy {
        self.policy
    }

    pub fn is_validating(&self) -> bool {
        matches!(self.phase, GatePhase::Validating { .. })
    }

    pub fn correction(&self) -> Option<&str> {
        match &self.phase {
            GatePhase::CorrectionNeeded { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        self.phase = GatePhase::Idle;
    }

    /// Drop an outstanding validation whose response can no longer apply
    pub fn abandon_pending(&mut self) {
        if self.is_validating() {
            self.phase = GatePhase::Idle;
        }
    }

    /// Start validating `text` for the submission tagged `seq`
    pub fn begin(&mut self, seq: Seq, text: impl Into<String>) -> ValidateRequest {
        let text = text.into();
        self.phase = GatePhase::Validating {
            seq,
            text: text.clone(),
        };
        ValidateRequest { seq, word: text }
    }

    pub fn receive(
        &mut self,
        seq: Seq,
        result: Result<SpellCheck, BackendError>,
        store: &QueryStore,
    ) -> GateDecision {
        let text = match &self.phase {
            GatePhase::Validating { seq: pending, text } if *pending == seq && store.is_current(seq) => {
                text.clone()
            }
            _ => {
                tracing::debug!(
                    "Discarding stale spelling verdict (seq {}, current {})",
                    seq,
                    store.seq()
                );
                return GateDecision::Stale;
            }
        };

        match result {
            Ok(check) if check.is_correct => self.proceed(seq, text),
            Ok(SpellCheck { suggestion, .. }) => match suggestion {
                Some(suggestion) if !suggestion.eq_ignore_ascii_case(text.trim()) => {
                    tracing::debug!("'{}' looks misspelled, offering '{}'", text, suggestion);
                    self.phase = GatePhase::CorrectionNeeded {
                        original: text,
                        suggestion: suggestion.clone(),
                    };
                    GateDecision::Correction { suggestion }
                }
                // Nothing better to offer; searching beats a dead end
                _ => self.proceed(seq, text),
            },
            Err(e) => match self.policy {
                SpellFailurePolicy::FailOpen => {
                    tracing::warn!("Spelling validation failed, searching unchecked: {}", e);
                    self.proceed(seq, text)
                }
                SpellFailurePolicy::FailClosed => {
                    tracing::warn!("Spelling validation failed, blocking search: {}", e);
                    self.phase = GatePhase::Blocked {
                        text,
                        reason: "Spelling check is unavailable right now".to_string(),
                    };
                    GateDecision::Blocked
                }
            },
        }
    }

    fn proceed(&mut self, seq: Seq, text: String) -> GateDecision {
        self.phase = GatePhase::Idle;
        GateDecision::Proceed { seq, text }
    }

    /// Take the offered correction so it can be re-submitted
    pub fn accept_correction(&mut self) -> Option<String> {
        match std::mem::take(&mut self.phase) {
            GatePhase::CorrectionNeeded { suggestion, .. } => Some(suggestion),
            other => {
                self.phase = other;
                None
            }
        }
    }

    /// The text a blocked submission was for, so it can be retried
    pub fn blocked_text(&self) -> Option<&str> {
        match &self.phase {
            GatePhase::Blocked { text, .. } => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Operation;

    fn submitted(text: &str) -> (QueryStore, Seq) {
        let mut store = QueryStore::new();
        store.set_query(text);
        let seq = store.commit();
        (store, seq)
    }

    fn unreachable_validator() -> BackendError {
        BackendError::Unavailable {
            operation: Operation::Validate,
            reason: "connection refused".into(),
        }
    }

    #[test]
    fn test_correct_spelling_proceeds() {
        let (store, seq) = submitted("python");
        let mut gate = SpellCheckGate::new(SpellFailurePolicy::FailOpen);
        gate.begin(seq, "python");
        assert!(gate.is_validating());

        let decision = gate.receive(seq, Ok(SpellCheck::correct()), &store);
        assert_eq!(
            decision,
            GateDecision::Proceed {
                seq,
                text: "python".into()
            }
        );
        assert_eq!(gate.phase(), &GatePhase::Idle);
    }

    #[test]
    fn test_misspelling_offers_correction() {
        let (store, seq) = submitted("pythom");
        let mut gate = SpellCheckGate::new(SpellFailurePolicy::FailOpen);
        gate.begin(seq, "pythom");

        let decision = gate.receive(seq, Ok(SpellCheck::misspelled("python")), &store);
        assert_eq!(
            decision,
            GateDecision::Correction {
                suggestion: "python".into()
            }
        );
        assert_eq!(gate.correction(), Some("python"));
        assert_eq!(gate.accept_correction().as_deref(), Some("python"));
        assert_eq!(gate.phase(), &GatePhase::Idle);
    }

    #[test]
    fn test_correction_equal_to_input_proceeds() {
        let (store, seq) = submitted("Python");
        let mut gate = SpellCheckGate::new(SpellFailurePolicy::FailOpen);
        gate.begin(seq, "Python");

        let decision = gate.receive(seq, Ok(SpellCheck::misspelled("python")), &store);
        assert!(matches!(decision, GateDecision::Proceed { .. }));
    }

    #[test]
    fn test_misspelling_without_suggestion_proceeds() {
        let (store, seq) = submitted("xqzv");
        let mut gate = SpellCheckGate::new(SpellFailurePolicy::FailOpen);
        gate.begin(seq, "xqzv");

        let verdict = SpellCheck {
            is_correct: false,
            suggestion: None,
        };
        assert!(matches!(
            gate.receive(seq, Ok(verdict), &store),
            GateDecision::Proceed { .. }
        ));
    }

    #[test]
    fn test_fail_open_proceeds_on_error() {
        let (store, seq) = submitted("rust");
        let mut gate = SpellCheckGate::new(SpellFailurePolicy::FailOpen);
        gate.begin(seq, "rust");

        let decision = gate.receive(seq, Err(unreachable_validator()), &store);
        assert!(matches!(decision, GateDecision::Proceed { .. }));
    }

    #[test]
    fn test_fail_closed_blocks_on_error() {
        let (store, seq) = submitted("rust");
        let mut gate = SpellCheckGate::new(SpellFailurePolicy::FailClosed);
        gate.begin(seq, "rust");

        assert_eq!(
            gate.receive(seq, Err(unreachable_validator()), &store),
            GateDecision::Blocked
        );
        assert_eq!(gate.blocked_text(), Some("rust"));
    }

    #[test]
    fn test_verdict_after_edit_is_stale() {
        let (mut store, seq) = submitted("pythom");
        let mut gate = SpellCheckGate::new(SpellFailurePolicy::FailOpen);
        gate.begin(seq, "pythom");
        store.set_query("pythomx");

        assert_eq!(
            gate.receive(seq, Ok(SpellCheck::misspelled("python")), &store),
            GateDecision::Stale
        );
    }

    #[test]
    fn test_accept_without_correction_is_none() {
        let mut gate = SpellCheckGate::new(SpellFailurePolicy::FailOpen);
        assert_eq!(gate.accept_correction(), None);
    }
}
