//! Plan status state machine.

use super::error::{PlanError, PlanResult};
use super::types::{PhaseStatus, Plan, PlanStatus};

impl PlanStatus {
    /// Statuses reachable from this one in a single transition.
    pub fn allowed_transitions(self) -> &'static [PlanStatus] {
        match self {
            Self::Draft => &[Self::Reviewing, Self::InProgress],
            Self::Reviewing => &[Self::Draft, Self::Approved],
            Self::Approved => &[Self::InProgress, Self::Draft],
            Self::InProgress => &[Self::InReview, Self::Approved],
            Self::InReview => &[Self::Complete, Self::InProgress],
            Self::Complete => &[],
        }
    }

    pub fn can_transition_to(self, to: PlanStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }
}

impl Plan {
    /// Move the plan to a new status.
    ///
    /// A pair outside the transition table fails with
    /// [`PlanError::InvalidTransition`] and leaves the plan untouched.
    pub fn transition_to(&mut self, to: PlanStatus) -> PlanResult<()> {
        let from = self.status;
        if !from.can_transition_to(to) {
            return Err(PlanError::InvalidTransition { from, to });
        }

        self.status = to;
        self.touch();
        tracing::info!(plan = %self.id, %from, %to, "Plan status changed");
        Ok(())
    }

    /// Set a phase's status and derive the plan status from it.
    ///
    /// Starting a phase of a draft or approved plan puts the plan in
    /// progress, and completing the last phase puts it in review. Both are
    /// forced and skip the transition table.
    pub fn set_phase_status(&mut self, phase_id: &str, status: PhaseStatus) -> PlanResult<()> {
        let phase = self
            .phase_mut(phase_id)
            .ok_or_else(|| PlanError::PhaseNotFound(phase_id.to_string()))?;
        let previous = phase.status;
        phase.status = status;
        tracing::info!(plan = %self.id, phase = %phase_id, from = %previous, to = %status, "Phase status changed");

        if status == PhaseStatus::InProgress
            && matches!(self.status, PlanStatus::Draft | PlanStatus::Approved)
        {
            self.force_status(PlanStatus::InProgress);
        }

        if self.all_phases_complete() {
            self.force_status(PlanStatus::InReview);
        }

        Ok(())
    }

    fn force_status(&mut self, to: PlanStatus) {
        if self.status != to {
            tracing::info!(plan = %self.id, from = %self.status, %to, "Plan status derived from phases");
        }
        self.status = to;
        self.touch();
    }
}
