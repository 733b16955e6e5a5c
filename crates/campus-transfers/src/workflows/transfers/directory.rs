//! Read-only lookups against the school directory: entities, campuses,
//! classrooms, and the staff bound to them. The engine validates every actor
//! and destination through this trait so it can be exercised in isolation.

use serde::{Deserialize, Serialize};

use super::domain::{CampusId, ClassroomId, EntityId, EntityKind, Grade, PersonId, Shift};

/// Campus master data. `code` is the token written into display identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampusRecord {
    pub id: CampusId,
    pub code: String,
    pub name: String,
    pub shifts: Vec<Shift>,
}

impl CampusRecord {
    pub fn offers(&self, shift: Shift) -> bool {
        self.shifts.contains(&shift)
    }
}

/// One section of one grade in one shift, with its seat bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassroomRecord {
    pub id: ClassroomId,
    pub campus: CampusId,
    pub shift: Shift,
    pub grade: Grade,
    pub section: String,
    pub capacity: u16,
    pub enrolled: u16,
}

impl ClassroomRecord {
    pub fn seats_left(&self) -> u16 {
        self.capacity.saturating_sub(self.enrolled)
    }

    pub fn has_free_seat(&self) -> bool {
        self.seats_left() > 0
    }

    /// Human label such as `G5-A`.
    pub fn label(&self) -> String {
        format!("{}-{}", self.grade, self.section)
    }
}

/// Directory view of a student or teacher at a point in time.
/// Teachers carry no grade or classroom assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: String,
    pub display_id: String,
    pub campus: CampusId,
    pub shift: Shift,
    pub grade: Option<Grade>,
    pub classroom: Option<ClassroomId>,
}

/// Directory lookup failures.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// Read-only directory collaborator.
pub trait Directory: Send + Sync {
    fn entity(&self, id: &EntityId) -> Result<Option<EntitySnapshot>, DirectoryError>;

    fn campus(&self, id: &CampusId) -> Result<Option<CampusRecord>, DirectoryError>;

    fn classroom(&self, id: &ClassroomId) -> Result<Option<ClassroomRecord>, DirectoryError>;

    fn classrooms_in(&self, campus: &CampusId) -> Result<Vec<ClassroomRecord>, DirectoryError>;

    /// Coordinator responsible for one grade band of one shift.
    fn coordinator_for(
        &self,
        campus: &CampusId,
        shift: Shift,
        grade: Grade,
    ) -> Result<Option<PersonId>, DirectoryError>;

    /// Lead coordinator of a whole shift; used for staff moves, which carry no grade.
    fn coordinator_for_shift(
        &self,
        campus: &CampusId,
        shift: Shift,
    ) -> Result<Option<PersonId>, DirectoryError>;

    fn principal_for(&self, campus: &CampusId) -> Result<Option<PersonId>, DirectoryError>;

    /// Coordinator of the grade band a classroom belongs to.
    fn coordinator_for_classroom(
        &self,
        id: &ClassroomId,
    ) -> Result<Option<PersonId>, DirectoryError> {
        match self.classroom(id)? {
            Some(room) => self.coordinator_for(&room.campus, room.shift, room.grade),
            None => Ok(None),
        }
    }
}
