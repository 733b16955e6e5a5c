//! Transfer workflows for students and teachers across the campus network.
//!
//! Four kinds of relocation run through one engine: section changes inside a
//! shift, shift changes inside a campus, grade skips, and campus-to-campus
//! moves. Each kind owns a fixed approval chain encoded as transition tables;
//! the engine layers actor authorization, destination eligibility, and a
//! compare-and-swap store contract on top, and rewrites the entity's display
//! identifier when a transfer is applied.

pub mod directory;
pub mod domain;
pub(crate) mod eligibility;
pub mod identifier;
pub mod machine;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use directory::{CampusRecord, ClassroomRecord, Directory, DirectoryError, EntitySnapshot};
pub use domain::{
    Actor, ApproverSlot, CampusDetail, CampusId, ClassroomId, DestinationParams, EntityId,
    EntityKind, EntityRef, Grade, GradeSkipDetail, PersonId, Role, SectionDetail, Shift,
    ShiftDetail, TransferDetail, TransferId, TransferKind,
};
pub use eligibility::{DestinationOption, EligibilityError, EligibilityResolver, EligibilityScope};
pub use identifier::{DisplayIdParts, IdChangePreview, IdentifierError, ID_DELIMITER};
pub use machine::{ActionKind, CampusStatus, SectionStatus, TransferStatus, TwoStepStatus};
pub use memory::{InMemoryDirectory, InMemoryLetterEmitter, InMemoryTransferStore};
pub use repository::{
    AssignmentChange, AssignmentError, AssignmentWriter, AuditEntry, AwaitingApprover,
    LetterEmitter, LetterError, StatusFilter, StoreError, TransferLetter, TransferRecord,
    TransferStatusView, TransferStore,
};
pub use router::{transfer_router, ApproveBody, CancelBody, ConfirmBody, DeclineBody, StatusQuery};
pub use service::{
    TransferAction, TransferRequest, TransferService, TransferServiceError,
    APPLY_CONFIRMATION_PHRASE, REASON_MAX_CHARS, REASON_MIN_CHARS,
};
