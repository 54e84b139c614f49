use std::collections::BTreeSet;

/// One-shot readiness signals features wait on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    /// Layout is measured and the session started.
    LayoutReady,
    /// The intro gate reached its terminal state.
    IntroUnlocked,
    /// At least one sequence frame is loaded.
    FramesLoaded,
}

/// Signals raised so far.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReadinessSet {
    raised: BTreeSet<Readiness>,
}

impl ReadinessSet {
    /// Raise `signal`. Returns `true` the first time only.
    pub fn raise(&mut self, signal: Readiness) -> bool {
        let first = self.raised.insert(signal);
        if first {
            tracing::debug!(?signal, "readiness raised");
        }
        first
    }

    /// Whether `signal` has been raised.
    pub fn is_raised(&self, signal: Readiness) -> bool {
        self.raised.contains(&signal)
    }

    /// Whether every signal in `signals` has been raised.
    pub fn all(&self, signals: &[Readiness]) -> bool {
        signals.iter().all(|s| self.raised.contains(s))
    }
}
