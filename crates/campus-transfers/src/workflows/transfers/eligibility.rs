//! Computes the legal destination set for a transfer: which sections an
//! entity may actually move into, given capacity, grade, shift, and campus
//! offering rules. The engine validates every submitted destination against
//! this set and also serves it to callers picking a target.

use serde::{Deserialize, Serialize};

use super::directory::{ClassroomRecord, Directory, DirectoryError, EntitySnapshot};
use super::domain::{CampusId, ClassroomId, EntityId, Grade, Shift};

/// What the caller is asking to do, shaped like the transfer kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EligibilityScope {
    Section,
    Shift,
    GradeSkip,
    Campus {
        campus: CampusId,
        shift: Shift,
        #[serde(default)]
        skip_grade: bool,
    },
}

/// One legal destination section, with its remaining capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestinationOption {
    pub classroom: ClassroomId,
    pub campus: CampusId,
    pub shift: Shift,
    pub grade: Grade,
    pub section: String,
    pub seats_left: u16,
}

impl From<ClassroomRecord> for DestinationOption {
    fn from(room: ClassroomRecord) -> Self {
        let seats_left = room.seats_left();
        Self {
            classroom: room.id,
            campus: room.campus,
            shift: room.shift,
            grade: room.grade,
            section: room.section,
            seats_left,
        }
    }
}

/// Resolution failures. An empty option set is not an error.
#[derive(Debug, thiserror::Error)]
pub enum EligibilityError {
    #[error("entity '{0}' has no current grade or classroom assignment")]
    MissingAssignment(EntityId),
    #[error("campus '{0}' is not registered")]
    UnknownCampus(CampusId),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// Stateless resolver over the directory collaborator.
pub struct EligibilityResolver<'a> {
    directory: &'a dyn Directory,
}

impl<'a> EligibilityResolver<'a> {
    pub fn new(directory: &'a dyn Directory) -> Self {
        Self { directory }
    }

    /// Legal destination sections for this entity and scope, sorted by section
    /// label for stable presentation. Returns an empty set when nothing is
    /// currently eligible.
    pub fn options(
        &self,
        entity: &EntitySnapshot,
        scope: &EligibilityScope,
    ) -> Result<Vec<DestinationOption>, EligibilityError> {
        let (grade, current_room) = match (entity.grade, entity.classroom.as_ref()) {
            (Some(grade), Some(room)) => (grade, room),
            _ => return Err(EligibilityError::MissingAssignment(entity.id.clone())),
        };

        let (campus, shift, target_grade) = match scope {
            EligibilityScope::Section => (entity.campus.clone(), entity.shift, grade),
            EligibilityScope::Shift => (entity.campus.clone(), entity.shift.opposite(), grade),
            EligibilityScope::GradeSkip => (entity.campus.clone(), entity.shift, grade.next()),
            EligibilityScope::Campus {
                campus,
                shift,
                skip_grade,
            } => {
                let record = self
                    .directory
                    .campus(campus)?
                    .ok_or_else(|| EligibilityError::UnknownCampus(campus.clone()))?;
                if !record.offers(*shift) {
                    return Ok(Vec::new());
                }
                let target = if *skip_grade { grade.next() } else { grade };
                (campus.clone(), *shift, target)
            }
        };

        let mut options: Vec<DestinationOption> = self
            .directory
            .classrooms_in(&campus)?
            .into_iter()
            .filter(|room| room.shift == shift && room.grade == target_grade)
            .filter(|room| room.id != *current_room)
            .filter(ClassroomRecord::has_free_seat)
            .map(DestinationOption::from)
            .collect();

        options.sort_by(|a, b| {
            a.section
                .cmp(&b.section)
                .then_with(|| a.classroom.0.cmp(&b.classroom.0))
        });
        Ok(options)
    }
}
