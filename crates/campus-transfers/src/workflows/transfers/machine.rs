//! Transition tables for the four transfer workflows.
//!
//! Every workflow is a small finite state machine: `next` is the
//! `(state, action) -> state` table and `required_slot` the parallel
//! `(state, action) -> approver slot` table. The engine consults both before
//! committing anything, so an action that is missing from the table can never
//! reach storage.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::domain::{ApproverSlot, TransferKind};

/// Action verbs accepted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Approve,
    Decline,
    Cancel,
    Confirm,
}

impl ActionKind {
    pub const fn label(self) -> &'static str {
        match self {
            ActionKind::Approve => "approve",
            ActionKind::Decline => "decline",
            ActionKind::Cancel => "cancel",
            ActionKind::Confirm => "confirm",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Section transfers settle in a single coordinator decision.
/// There is no cancel path: once submitted the coordinator acts on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    Pending,
    Approved,
    Declined,
}

impl SectionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            SectionStatus::Pending => "pending",
            SectionStatus::Approved => "approved",
            SectionStatus::Declined => "declined",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, SectionStatus::Pending)
    }

    fn next(self, action: ActionKind) -> Option<SectionStatus> {
        match (self, action) {
            (SectionStatus::Pending, ActionKind::Approve) => Some(SectionStatus::Approved),
            (SectionStatus::Pending, ActionKind::Decline) => Some(SectionStatus::Declined),
            _ => None,
        }
    }

    fn required_slot(self, action: ActionKind) -> Option<ApproverSlot> {
        match (self, action) {
            (SectionStatus::Pending, ActionKind::Approve | ActionKind::Decline) => {
                Some(ApproverSlot::Coordinator)
            }
            _ => None,
        }
    }
}

/// Shared two-approver chain used by shift and grade-skip transfers: the own
/// (source) coordinator approves first, then the other (destination) one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TwoStepStatus {
    PendingOwnCoord,
    PendingOtherCoord,
    Approved,
    Declined,
}

impl TwoStepStatus {
    pub const fn label(self) -> &'static str {
        match self {
            TwoStepStatus::PendingOwnCoord => "pending_own_coord",
            TwoStepStatus::PendingOtherCoord => "pending_other_coord",
            TwoStepStatus::Approved => "approved",
            TwoStepStatus::Declined => "declined",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, TwoStepStatus::Approved | TwoStepStatus::Declined)
    }

    fn next(self, action: ActionKind) -> Option<TwoStepStatus> {
        match (self, action) {
            (TwoStepStatus::PendingOwnCoord, ActionKind::Approve) => {
                Some(TwoStepStatus::PendingOtherCoord)
            }
            (TwoStepStatus::PendingOwnCoord, ActionKind::Decline) => Some(TwoStepStatus::Declined),
            (TwoStepStatus::PendingOtherCoord, ActionKind::Approve) => Some(TwoStepStatus::Approved),
            (TwoStepStatus::PendingOtherCoord, ActionKind::Decline) => {
                Some(TwoStepStatus::Declined)
            }
            _ => None,
        }
    }

    fn required_slot(self, action: ActionKind) -> Option<ApproverSlot> {
        match (self, action) {
            (TwoStepStatus::PendingOwnCoord, ActionKind::Approve | ActionKind::Decline) => {
                Some(ApproverSlot::OwnCoordinator)
            }
            (TwoStepStatus::PendingOtherCoord, ActionKind::Approve | ActionKind::Decline) => {
                Some(ApproverSlot::OtherCoordinator)
            }
            _ => None,
        }
    }
}

/// The four-stage campus chain. Decline is open at every pending stage, cancel
/// only at the first one, and the final step is the confirm/apply action that
/// commits reassignment together with the status flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampusStatus {
    PendingFromCoord,
    PendingFromPrincipal,
    PendingToPrincipal,
    PendingToCoord,
    Approved,
    Declined,
    Cancelled,
}

impl CampusStatus {
    pub const fn label(self) -> &'static str {
        match self {
            CampusStatus::PendingFromCoord => "pending_from_coord",
            CampusStatus::PendingFromPrincipal => "pending_from_principal",
            CampusStatus::PendingToPrincipal => "pending_to_principal",
            CampusStatus::PendingToCoord => "pending_to_coord",
            CampusStatus::Approved => "approved",
            CampusStatus::Declined => "declined",
            CampusStatus::Cancelled => "cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            CampusStatus::Approved | CampusStatus::Declined | CampusStatus::Cancelled
        )
    }

    fn next(self, action: ActionKind) -> Option<CampusStatus> {
        match (self, action) {
            (CampusStatus::PendingFromCoord, ActionKind::Approve) => {
                Some(CampusStatus::PendingFromPrincipal)
            }
            (CampusStatus::PendingFromCoord, ActionKind::Decline) => Some(CampusStatus::Declined),
            (CampusStatus::PendingFromCoord, ActionKind::Cancel) => Some(CampusStatus::Cancelled),
            (CampusStatus::PendingFromPrincipal, ActionKind::Approve) => {
                Some(CampusStatus::PendingToPrincipal)
            }
            (CampusStatus::PendingFromPrincipal, ActionKind::Decline) => {
                Some(CampusStatus::Declined)
            }
            (CampusStatus::PendingToPrincipal, ActionKind::Approve) => {
                Some(CampusStatus::PendingToCoord)
            }
            (CampusStatus::PendingToPrincipal, ActionKind::Decline) => Some(CampusStatus::Declined),
            (CampusStatus::PendingToCoord, ActionKind::Confirm) => Some(CampusStatus::Approved),
            (CampusStatus::PendingToCoord, ActionKind::Decline) => Some(CampusStatus::Declined),
            _ => None,
        }
    }

    fn required_slot(self, action: ActionKind) -> Option<ApproverSlot> {
        match (self, action) {
            (CampusStatus::PendingFromCoord, ActionKind::Approve | ActionKind::Decline) => {
                Some(ApproverSlot::FromCoordinator)
            }
            (CampusStatus::PendingFromCoord, ActionKind::Cancel) => Some(ApproverSlot::Initiator),
            (CampusStatus::PendingFromPrincipal, ActionKind::Approve | ActionKind::Decline) => {
                Some(ApproverSlot::FromPrincipal)
            }
            (CampusStatus::PendingToPrincipal, ActionKind::Approve | ActionKind::Decline) => {
                Some(ApproverSlot::ToPrincipal)
            }
            (CampusStatus::PendingToCoord, ActionKind::Confirm | ActionKind::Decline) => {
                Some(ApproverSlot::ToCoordinator)
            }
            _ => None,
        }
    }
}

/// Status of a transfer record, tagged by workflow kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "workflow", content = "state", rename_all = "snake_case")]
pub enum TransferStatus {
    Section(SectionStatus),
    Shift(TwoStepStatus),
    GradeSkip(TwoStepStatus),
    Campus(CampusStatus),
}

impl TransferStatus {
    /// Initial pending state for a freshly created transfer of the given kind.
    pub const fn initial(kind: TransferKind) -> TransferStatus {
        match kind {
            TransferKind::Section => TransferStatus::Section(SectionStatus::Pending),
            TransferKind::Shift => TransferStatus::Shift(TwoStepStatus::PendingOwnCoord),
            TransferKind::GradeSkip => TransferStatus::GradeSkip(TwoStepStatus::PendingOwnCoord),
            TransferKind::Campus => TransferStatus::Campus(CampusStatus::PendingFromCoord),
        }
    }

    pub const fn kind(self) -> TransferKind {
        match self {
            TransferStatus::Section(_) => TransferKind::Section,
            TransferStatus::Shift(_) => TransferKind::Shift,
            TransferStatus::GradeSkip(_) => TransferKind::GradeSkip,
            TransferStatus::Campus(_) => TransferKind::Campus,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            TransferStatus::Section(status) => status.label(),
            TransferStatus::Shift(status) | TransferStatus::GradeSkip(status) => status.label(),
            TransferStatus::Campus(status) => status.label(),
        }
    }

    pub const fn is_terminal(self) -> bool {
        match self {
            TransferStatus::Section(status) => status.is_terminal(),
            TransferStatus::Shift(status) | TransferStatus::GradeSkip(status) => {
                status.is_terminal()
            }
            TransferStatus::Campus(status) => status.is_terminal(),
        }
    }

    pub const fn is_approved(self) -> bool {
        matches!(
            self,
            TransferStatus::Section(SectionStatus::Approved)
                | TransferStatus::Shift(TwoStepStatus::Approved)
                | TransferStatus::GradeSkip(TwoStepStatus::Approved)
                | TransferStatus::Campus(CampusStatus::Approved)
        )
    }

    pub const fn is_declined(self) -> bool {
        matches!(
            self,
            TransferStatus::Section(SectionStatus::Declined)
                | TransferStatus::Shift(TwoStepStatus::Declined)
                | TransferStatus::GradeSkip(TwoStepStatus::Declined)
                | TransferStatus::Campus(CampusStatus::Declined)
        )
    }

    pub const fn is_cancelled(self) -> bool {
        matches!(self, TransferStatus::Campus(CampusStatus::Cancelled))
    }

    /// Table lookup: the state this action moves to, or `None` when the
    /// current state does not admit it.
    pub fn next(self, action: ActionKind) -> Option<TransferStatus> {
        match self {
            TransferStatus::Section(status) => status.next(action).map(TransferStatus::Section),
            TransferStatus::Shift(status) => status.next(action).map(TransferStatus::Shift),
            TransferStatus::GradeSkip(status) => status.next(action).map(TransferStatus::GradeSkip),
            TransferStatus::Campus(status) => status.next(action).map(TransferStatus::Campus),
        }
    }

    /// Parallel table: the approver slot whose holder may fire this action here.
    pub fn required_slot(self, action: ActionKind) -> Option<ApproverSlot> {
        match self {
            TransferStatus::Section(status) => status.required_slot(action),
            TransferStatus::Shift(status) | TransferStatus::GradeSkip(status) => {
                status.required_slot(action)
            }
            TransferStatus::Campus(status) => status.required_slot(action),
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_settles_in_one_decision() {
        let pending = TransferStatus::Section(SectionStatus::Pending);

        assert_eq!(
            pending.next(ActionKind::Approve),
            Some(TransferStatus::Section(SectionStatus::Approved))
        );
        assert_eq!(
            pending.next(ActionKind::Decline),
            Some(TransferStatus::Section(SectionStatus::Declined))
        );
        assert_eq!(pending.next(ActionKind::Cancel), None);
        assert_eq!(pending.next(ActionKind::Confirm), None);
        assert_eq!(
            pending.required_slot(ActionKind::Approve),
            Some(ApproverSlot::Coordinator)
        );
    }

    #[test]
    fn two_step_chain_passes_between_coordinators() {
        let first = TransferStatus::Shift(TwoStepStatus::PendingOwnCoord);
        let second = first.next(ActionKind::Approve).expect("first approval");

        assert_eq!(
            second,
            TransferStatus::Shift(TwoStepStatus::PendingOtherCoord)
        );
        assert_eq!(
            first.required_slot(ActionKind::Approve),
            Some(ApproverSlot::OwnCoordinator)
        );
        assert_eq!(
            second.required_slot(ActionKind::Approve),
            Some(ApproverSlot::OtherCoordinator)
        );
        assert_eq!(
            second.next(ActionKind::Approve),
            Some(TransferStatus::Shift(TwoStepStatus::Approved))
        );
        assert_eq!(
            second.next(ActionKind::Decline),
            Some(TransferStatus::Shift(TwoStepStatus::Declined))
        );
    }

    #[test]
    fn campus_chain_walks_all_four_approvers() {
        let mut status = TransferStatus::initial(TransferKind::Campus);
        let expected_slots = [
            ApproverSlot::FromCoordinator,
            ApproverSlot::FromPrincipal,
            ApproverSlot::ToPrincipal,
        ];

        for slot in expected_slots {
            assert_eq!(status.required_slot(ActionKind::Approve), Some(slot));
            status = status.next(ActionKind::Approve).expect("forward step");
        }

        assert_eq!(status, TransferStatus::Campus(CampusStatus::PendingToCoord));
        assert_eq!(status.next(ActionKind::Approve), None);
        assert_eq!(
            status.required_slot(ActionKind::Confirm),
            Some(ApproverSlot::ToCoordinator)
        );
        assert_eq!(
            status.next(ActionKind::Confirm),
            Some(TransferStatus::Campus(CampusStatus::Approved))
        );
    }

    #[test]
    fn campus_cancel_limited_to_first_stage() {
        let first = TransferStatus::Campus(CampusStatus::PendingFromCoord);
        assert_eq!(
            first.next(ActionKind::Cancel),
            Some(TransferStatus::Campus(CampusStatus::Cancelled))
        );
        assert_eq!(
            first.required_slot(ActionKind::Cancel),
            Some(ApproverSlot::Initiator)
        );

        let later = TransferStatus::Campus(CampusStatus::PendingFromPrincipal);
        assert_eq!(later.next(ActionKind::Cancel), None);
        assert_eq!(later.required_slot(ActionKind::Cancel), None);
    }

    #[test]
    fn campus_decline_open_at_every_pending_stage() {
        let pending = [
            CampusStatus::PendingFromCoord,
            CampusStatus::PendingFromPrincipal,
            CampusStatus::PendingToPrincipal,
            CampusStatus::PendingToCoord,
        ];

        for status in pending {
            assert_eq!(
                TransferStatus::Campus(status).next(ActionKind::Decline),
                Some(TransferStatus::Campus(CampusStatus::Declined))
            );
        }
    }

    #[test]
    fn terminal_states_admit_nothing() {
        let terminals = [
            TransferStatus::Section(SectionStatus::Approved),
            TransferStatus::Section(SectionStatus::Declined),
            TransferStatus::Shift(TwoStepStatus::Approved),
            TransferStatus::GradeSkip(TwoStepStatus::Declined),
            TransferStatus::Campus(CampusStatus::Approved),
            TransferStatus::Campus(CampusStatus::Cancelled),
        ];
        let actions = [
            ActionKind::Approve,
            ActionKind::Decline,
            ActionKind::Cancel,
            ActionKind::Confirm,
        ];

        for status in terminals {
            assert!(status.is_terminal());
            for action in actions {
                assert_eq!(status.next(action), None);
                assert_eq!(status.required_slot(action), None);
            }
        }
    }

    #[test]
    fn labels_match_reported_statuses() {
        assert_eq!(
            TransferStatus::Shift(TwoStepStatus::PendingOwnCoord).label(),
            "pending_own_coord"
        );
        assert_eq!(
            TransferStatus::Campus(CampusStatus::PendingToCoord).label(),
            "pending_to_coord"
        );
        assert_eq!(
            TransferStatus::GradeSkip(TwoStepStatus::Approved).to_string(),
            "approved"
        );
    }
}
