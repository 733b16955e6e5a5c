use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier wrapper for persisted transfer requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferId(pub String);

/// Opaque handle for a student or teacher in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub String);

/// Identity of a staff member acting on a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonId(pub String);

/// Handle for a campus in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CampusId(pub String);

/// Handle for a classroom (one section of one grade, in one shift).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassroomId(pub String);

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CampusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ClassroomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a transfer concerns a student or a teacher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Student,
    Teacher,
}

impl EntityKind {
    pub const fn label(self) -> &'static str {
        match self {
            EntityKind::Student => "student",
            EntityKind::Teacher => "teacher",
        }
    }
}

/// Entity reference stored on every transfer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: EntityId,
}

/// The two teaching shifts a campus can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shift {
    Morning,
    Afternoon,
}

impl Shift {
    pub const fn opposite(self) -> Self {
        match self {
            Shift::Morning => Shift::Afternoon,
            Shift::Afternoon => Shift::Morning,
        }
    }

    /// Single-letter code used inside display identifiers.
    pub const fn code(self) -> &'static str {
        match self {
            Shift::Morning => "M",
            Shift::Afternoon => "A",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Shift::Morning => "morning",
            Shift::Afternoon => "afternoon",
        }
    }
}

/// Grade level; ordering follows the numeric level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Grade(pub u8);

impl Grade {
    pub const fn next(self) -> Grade {
        Grade(self.0 + 1)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G{}", self.0)
    }
}

/// Staff roles recognized by the approval chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Teacher,
    Coordinator,
    Principal,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Teacher => "teacher",
            Role::Coordinator => "coordinator",
            Role::Principal => "principal",
        }
    }
}

/// Identity plus role, threaded explicitly through every engine operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub person: PersonId,
    pub role: Role,
}

/// The four supported transfer workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    Section,
    Shift,
    GradeSkip,
    Campus,
}

impl TransferKind {
    pub const fn label(self) -> &'static str {
        match self {
            TransferKind::Section => "section",
            TransferKind::Shift => "shift",
            TransferKind::GradeSkip => "grade_skip",
            TransferKind::Campus => "campus",
        }
    }
}

/// Destination parameters submitted with a create command, one variant per kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DestinationParams {
    Section {
        to_classroom: ClassroomId,
    },
    Shift {
        to_shift: Shift,
        to_classroom: ClassroomId,
    },
    GradeSkip {
        to_grade: Grade,
        #[serde(default)]
        to_classroom: Option<ClassroomId>,
    },
    Campus {
        to_campus: CampusId,
        to_shift: Shift,
        #[serde(default)]
        to_classroom: Option<ClassroomId>,
        #[serde(default)]
        skip_grade: bool,
    },
}

impl DestinationParams {
    pub const fn kind(&self) -> TransferKind {
        match self {
            DestinationParams::Section { .. } => TransferKind::Section,
            DestinationParams::Shift { .. } => TransferKind::Shift,
            DestinationParams::GradeSkip { .. } => TransferKind::GradeSkip,
            DestinationParams::Campus { .. } => TransferKind::Campus,
        }
    }
}

/// Named approver positions; the holder of the slot is the only legal actor
/// for the pending state that demands it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApproverSlot {
    Coordinator,
    OwnCoordinator,
    OtherCoordinator,
    FromCoordinator,
    FromPrincipal,
    ToPrincipal,
    ToCoordinator,
    Initiator,
}

impl ApproverSlot {
    pub const fn label(self) -> &'static str {
        match self {
            ApproverSlot::Coordinator => "coordinator",
            ApproverSlot::OwnCoordinator => "own_coordinator",
            ApproverSlot::OtherCoordinator => "other_coordinator",
            ApproverSlot::FromCoordinator => "from_coordinator",
            ApproverSlot::FromPrincipal => "from_principal",
            ApproverSlot::ToPrincipal => "to_principal",
            ApproverSlot::ToCoordinator => "to_coordinator",
            ApproverSlot::Initiator => "initiator",
        }
    }

    /// Role the slot holder must present; the initiator slot checks identity only.
    pub const fn required_role(self) -> Option<Role> {
        match self {
            ApproverSlot::Coordinator
            | ApproverSlot::OwnCoordinator
            | ApproverSlot::OtherCoordinator
            | ApproverSlot::FromCoordinator
            | ApproverSlot::ToCoordinator => Some(Role::Coordinator),
            ApproverSlot::FromPrincipal | ApproverSlot::ToPrincipal => Some(Role::Principal),
            ApproverSlot::Initiator => None,
        }
    }
}

impl fmt::Display for ApproverSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Section transfer: same campus, same shift, a different section of the grade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDetail {
    pub from_classroom: ClassroomId,
    pub to_classroom: ClassroomId,
    /// Source and destination share one coordinator.
    pub coordinator: PersonId,
}

/// Shift transfer: move to the complementary shift of the same campus/grade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftDetail {
    pub from_shift: Shift,
    pub to_shift: Shift,
    pub from_classroom: ClassroomId,
    pub to_classroom: ClassroomId,
    pub from_coordinator: PersonId,
    pub to_coordinator: PersonId,
}

/// Grade-skip transfer: jump to the next grade level within the same shift.
/// The destination section may stay unset until the receiving coordinator picks one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeSkipDetail {
    pub from_grade: Grade,
    pub to_grade: Grade,
    pub from_classroom: ClassroomId,
    pub to_classroom: Option<ClassroomId>,
    pub from_coordinator: PersonId,
    pub to_coordinator: PersonId,
}

/// Campus transfer: relocation across campuses, optionally changing shift and
/// grade. Teachers use this kind without grade or section fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampusDetail {
    pub from_campus: CampusId,
    pub to_campus: CampusId,
    pub from_shift: Shift,
    pub to_shift: Shift,
    pub from_grade: Option<Grade>,
    pub to_grade: Option<Grade>,
    pub from_classroom: Option<ClassroomId>,
    pub to_classroom: Option<ClassroomId>,
    pub skip_grade: bool,
    pub from_coordinator: PersonId,
    pub to_coordinator: PersonId,
    pub from_principal: PersonId,
    pub to_principal: PersonId,
}

/// Kind-specific payload of a transfer record, fixed at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransferDetail {
    Section(SectionDetail),
    Shift(ShiftDetail),
    GradeSkip(GradeSkipDetail),
    Campus(CampusDetail),
}

impl TransferDetail {
    pub const fn kind(&self) -> TransferKind {
        match self {
            TransferDetail::Section(_) => TransferKind::Section,
            TransferDetail::Shift(_) => TransferKind::Shift,
            TransferDetail::GradeSkip(_) => TransferKind::GradeSkip,
            TransferDetail::Campus(_) => TransferKind::Campus,
        }
    }

    /// Person bound to an approver slot, if this detail carries that slot.
    /// The initiator slot is resolved from the record, not the detail.
    pub fn approver_for(&self, slot: ApproverSlot) -> Option<&PersonId> {
        match (self, slot) {
            (TransferDetail::Section(detail), ApproverSlot::Coordinator) => {
                Some(&detail.coordinator)
            }
            (TransferDetail::Shift(detail), ApproverSlot::OwnCoordinator) => {
                Some(&detail.from_coordinator)
            }
            (TransferDetail::Shift(detail), ApproverSlot::OtherCoordinator) => {
                Some(&detail.to_coordinator)
            }
            (TransferDetail::GradeSkip(detail), ApproverSlot::OwnCoordinator) => {
                Some(&detail.from_coordinator)
            }
            (TransferDetail::GradeSkip(detail), ApproverSlot::OtherCoordinator) => {
                Some(&detail.to_coordinator)
            }
            (TransferDetail::Campus(detail), ApproverSlot::FromCoordinator) => {
                Some(&detail.from_coordinator)
            }
            (TransferDetail::Campus(detail), ApproverSlot::FromPrincipal) => {
                Some(&detail.from_principal)
            }
            (TransferDetail::Campus(detail), ApproverSlot::ToPrincipal) => {
                Some(&detail.to_principal)
            }
            (TransferDetail::Campus(detail), ApproverSlot::ToCoordinator) => {
                Some(&detail.to_coordinator)
            }
            _ => None,
        }
    }

    /// Every person holding an approver slot on this transfer, in chain order.
    pub fn approvers(&self) -> Vec<&PersonId> {
        match self {
            TransferDetail::Section(detail) => vec![&detail.coordinator],
            TransferDetail::Shift(detail) => {
                vec![&detail.from_coordinator, &detail.to_coordinator]
            }
            TransferDetail::GradeSkip(detail) => {
                vec![&detail.from_coordinator, &detail.to_coordinator]
            }
            TransferDetail::Campus(detail) => vec![
                &detail.from_coordinator,
                &detail.from_principal,
                &detail.to_principal,
                &detail.to_coordinator,
            ],
        }
    }
}
