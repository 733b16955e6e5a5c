//! Storage and collaborator contracts for the transfer engine: the persisted
//! record shape, the compare-and-swap store trait, the assignment writer used
//! by the apply step, and the letter emitter fired after approvals.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    Actor, ApproverSlot, CampusId, ClassroomId, EntityId, EntityRef, Grade, PersonId, Shift,
    TransferDetail, TransferId, TransferKind,
};
use super::machine::{ActionKind, TransferStatus};

/// One committed transition, kept in chain order on the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub slot: ApproverSlot,
    pub action: ActionKind,
    pub acted_by: PersonId,
    pub acted_at: DateTime<Utc>,
}

/// Persisted transfer request. Mutated only through the engine's transitions;
/// immutable history once the status turns terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRecord {
    pub id: TransferId,
    pub entity: EntityRef,
    pub reason: String,
    pub requested_date: NaiveDate,
    pub status: TransferStatus,
    pub decline_reason: Option<String>,
    pub initiator: Actor,
    pub detail: TransferDetail,
    pub audit: Vec<AuditEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransferRecord {
    pub fn kind(&self) -> TransferKind {
        self.detail.kind()
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Slot and person whose action moves this record forward, when pending.
    pub fn current_approver(&self) -> Option<(ApproverSlot, &PersonId)> {
        let slot = self
            .status
            .required_slot(ActionKind::Approve)
            .or_else(|| self.status.required_slot(ActionKind::Confirm))?;
        let person = self.detail.approver_for(slot)?;
        Some((slot, person))
    }

    /// Whether this person holds any approver slot on the record.
    pub fn involves(&self, person: &PersonId) -> bool {
        self.detail.approvers().into_iter().any(|held| held == person)
    }

    pub fn status_view(&self) -> TransferStatusView {
        TransferStatusView {
            transfer_id: self.id.clone(),
            kind: self.kind(),
            entity: self.entity.clone(),
            status: self.status.label(),
            decline_reason: self.decline_reason.clone(),
            awaiting: self
                .current_approver()
                .map(|(slot, person)| AwaitingApprover {
                    slot: slot.label(),
                    person: person.clone(),
                }),
            updated_at: self.updated_at,
        }
    }
}

/// Sanitized representation of a transfer's exposed status.
#[derive(Debug, Clone, Serialize)]
pub struct TransferStatusView {
    pub transfer_id: TransferId,
    pub kind: TransferKind,
    pub entity: EntityRef,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decline_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awaiting: Option<AwaitingApprover>,
    pub updated_at: DateTime<Utc>,
}

/// Next actor a pending transfer is waiting on.
#[derive(Debug, Clone, Serialize)]
pub struct AwaitingApprover {
    pub slot: &'static str,
    pub person: PersonId,
}

/// Status filter for list queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Approved,
    Declined,
    Cancelled,
}

impl StatusFilter {
    pub fn matches(self, status: TransferStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => !status.is_terminal(),
            StatusFilter::Approved => status.is_approved(),
            StatusFilter::Declined => status.is_declined(),
            StatusFilter::Cancelled => status.is_cancelled(),
        }
    }
}

/// Storage abstraction for transfer records.
///
/// Two contracts matter beyond plain CRUD:
/// - `insert` must enforce the one-active-transfer-per-entity rule atomically
///   with the write, not as a separate pre-check, so racing creates cannot
///   both land.
/// - `swap` and `swap_and_reassign` are compare-and-swap updates keyed on the
///   expected current status; when the stored status differs, nothing is
///   written and `StoreError::StatusChanged` reports what was found.
pub trait TransferStore: Send + Sync {
    fn insert(&self, record: TransferRecord) -> Result<TransferRecord, StoreError>;

    fn fetch(&self, id: &TransferId) -> Result<Option<TransferRecord>, StoreError>;

    fn swap(
        &self,
        expected: TransferStatus,
        record: TransferRecord,
    ) -> Result<TransferRecord, StoreError>;

    /// CAS update plus entity reassignment committed as one unit: when the
    /// assignment write fails the status swap must not become visible.
    fn swap_and_reassign(
        &self,
        expected: TransferStatus,
        record: TransferRecord,
        change: &AssignmentChange,
        assignments: &dyn AssignmentWriter,
    ) -> Result<TransferRecord, StoreError>;

    fn list_by_initiator(
        &self,
        person: &PersonId,
        filter: StatusFilter,
    ) -> Result<Vec<TransferRecord>, StoreError>;

    /// Records on which this person holds any approver slot.
    fn list_by_approver(
        &self,
        person: &PersonId,
        filter: StatusFilter,
    ) -> Result<Vec<TransferRecord>, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("entity already has an active transfer ({existing})")]
    ActiveTransferExists { existing: TransferId },
    #[error("record not found")]
    NotFound,
    #[error("stored status is now '{found}', not the expected one")]
    StatusChanged { found: TransferStatus },
    #[error(transparent)]
    Assignment(#[from] AssignmentError),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// New assignment written to the directory when a transfer is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentChange {
    pub entity: EntityRef,
    pub campus: CampusId,
    pub shift: Shift,
    pub grade: Option<Grade>,
    pub classroom: Option<ClassroomId>,
    pub new_display_id: String,
}

/// Writes entity assignments; invoked only inside `swap_and_reassign`.
pub trait AssignmentWriter: Send + Sync {
    fn reassign(&self, change: &AssignmentChange) -> Result<(), AssignmentError>;
}

/// Assignment write failures.
#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    #[error("entity '{0}' is not registered")]
    UnknownEntity(EntityId),
    #[error("classroom '{0}' is not registered")]
    UnknownClassroom(ClassroomId),
    #[error("classroom '{classroom}' has no free seat")]
    NoCapacity { classroom: ClassroomId },
    #[error("assignment writer unavailable: {0}")]
    Unavailable(String),
}

/// Outbound letter describing an applied transfer, handed to notification
/// adapters after the commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLetter {
    pub transfer_id: TransferId,
    pub kind: TransferKind,
    pub entity: EntityRef,
    pub new_display_id: String,
    pub details: BTreeMap<String, String>,
}

/// Trait describing the letter/notification hook fired on approvals.
/// Delivery failures must never affect the committed transfer.
pub trait LetterEmitter: Send + Sync {
    fn deliver(&self, letter: TransferLetter) -> Result<(), LetterError>;
}

/// Letter dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum LetterError {
    #[error("letter transport unavailable: {0}")]
    Transport(String),
}
