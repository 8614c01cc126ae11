use crate::counting::domain::counting_state::CountingState;
use crate::settings::domain::detection_settings::DetectionSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Settings replaced; counting state untouched.
    Applied,
    /// Reset token changed: counting state was cleared.
    Reset,
}

/// Holds the last-known-good settings and turns reset token changes into
/// counting epoch boundaries.
///
/// The first settings ever applied only adopt their token, so starting up
/// against a dashboard with a non-zero token does not count as a reset.
#[derive(Debug, Default)]
pub struct SettingsReconciler {
    current: DetectionSettings,
    last_token: Option<i64>,
}

impl SettingsReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &DetectionSettings {
        &self.current
    }

    pub fn last_token(&self) -> Option<i64> {
        self.last_token
    }

    pub fn apply(&mut self, settings: DetectionSettings, state: &mut CountingState) -> ReconcileOutcome {
        let token = settings.reset_token;
        let outcome = match self.last_token {
            Some(last) if last != token => {
                state.reset();
                log::info!("Reset token changed ({last} -> {token}); counters cleared");
                ReconcileOutcome::Reset
            }
            _ => ReconcileOutcome::Applied,
        };
        self.last_token = Some(token);
        self.current = settings;
        outcome
    }
}
