//! In-memory implementations of the engine's collaborator traits. The API
//! service runs on these, and the test suites seed them directly; a
//! database-backed deployment replaces them behind the same traits.

use std::collections::HashMap;
use std::sync::Mutex;

use super::directory::{CampusRecord, ClassroomRecord, Directory, DirectoryError, EntitySnapshot};
use super::domain::{CampusId, ClassroomId, EntityId, Grade, PersonId, Shift, TransferId};
use super::machine::TransferStatus;
use super::repository::{
    AssignmentChange, AssignmentError, AssignmentWriter, LetterEmitter, LetterError, StatusFilter,
    StoreError, TransferLetter, TransferRecord, TransferStore,
};

#[derive(Default)]
struct DirectoryState {
    campuses: HashMap<CampusId, CampusRecord>,
    classrooms: HashMap<ClassroomId, ClassroomRecord>,
    entities: HashMap<EntityId, EntitySnapshot>,
    grade_coordinators: HashMap<(CampusId, Shift, Grade), PersonId>,
    shift_coordinators: HashMap<(CampusId, Shift), PersonId>,
    principals: HashMap<CampusId, PersonId>,
}

/// School directory held in process memory. Doubles as the assignment writer
/// so an applied transfer lands in the same view the next lookup reads.
#[derive(Default)]
pub struct InMemoryDirectory {
    state: Mutex<DirectoryState>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_campus(&self, campus: CampusRecord) {
        let mut state = self.state.lock().expect("directory mutex poisoned");
        state.campuses.insert(campus.id.clone(), campus);
    }

    pub fn add_classroom(&self, classroom: ClassroomRecord) {
        let mut state = self.state.lock().expect("directory mutex poisoned");
        state.classrooms.insert(classroom.id.clone(), classroom);
    }

    pub fn add_entity(&self, entity: EntitySnapshot) {
        let mut state = self.state.lock().expect("directory mutex poisoned");
        state.entities.insert(entity.id.clone(), entity);
    }

    pub fn set_grade_coordinator(
        &self,
        campus: CampusId,
        shift: Shift,
        grade: Grade,
        person: PersonId,
    ) {
        let mut state = self.state.lock().expect("directory mutex poisoned");
        state.grade_coordinators.insert((campus, shift, grade), person);
    }

    pub fn set_shift_coordinator(&self, campus: CampusId, shift: Shift, person: PersonId) {
        let mut state = self.state.lock().expect("directory mutex poisoned");
        state.shift_coordinators.insert((campus, shift), person);
    }

    pub fn set_principal(&self, campus: CampusId, person: PersonId) {
        let mut state = self.state.lock().expect("directory mutex poisoned");
        state.principals.insert(campus, person);
    }

    /// Current snapshot, for assertions and demo output.
    pub fn entity_snapshot(&self, id: &EntityId) -> Option<EntitySnapshot> {
        let state = self.state.lock().expect("directory mutex poisoned");
        state.entities.get(id).cloned()
    }

    pub fn classroom_record(&self, id: &ClassroomId) -> Option<ClassroomRecord> {
        let state = self.state.lock().expect("directory mutex poisoned");
        state.classrooms.get(id).cloned()
    }
}

impl Directory for InMemoryDirectory {
    fn entity(&self, id: &EntityId) -> Result<Option<EntitySnapshot>, DirectoryError> {
        let state = self.state.lock().expect("directory mutex poisoned");
        Ok(state.entities.get(id).cloned())
    }

    fn campus(&self, id: &CampusId) -> Result<Option<CampusRecord>, DirectoryError> {
        let state = self.state.lock().expect("directory mutex poisoned");
        Ok(state.campuses.get(id).cloned())
    }

    fn classroom(&self, id: &ClassroomId) -> Result<Option<ClassroomRecord>, DirectoryError> {
        let state = self.state.lock().expect("directory mutex poisoned");
        Ok(state.classrooms.get(id).cloned())
    }

    fn classrooms_in(&self, campus: &CampusId) -> Result<Vec<ClassroomRecord>, DirectoryError> {
        let state = self.state.lock().expect("directory mutex poisoned");
        let mut rooms: Vec<ClassroomRecord> = state
            .classrooms
            .values()
            .filter(|room| room.campus == *campus)
            .cloned()
            .collect();
        rooms.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(rooms)
    }

    fn coordinator_for(
        &self,
        campus: &CampusId,
        shift: Shift,
        grade: Grade,
    ) -> Result<Option<PersonId>, DirectoryError> {
        let state = self.state.lock().expect("directory mutex poisoned");
        Ok(state
            .grade_coordinators
            .get(&(campus.clone(), shift, grade))
            .cloned())
    }

    fn coordinator_for_shift(
        &self,
        campus: &CampusId,
        shift: Shift,
    ) -> Result<Option<PersonId>, DirectoryError> {
        let state = self.state.lock().expect("directory mutex poisoned");
        Ok(state
            .shift_coordinators
            .get(&(campus.clone(), shift))
            .cloned())
    }

    fn principal_for(&self, campus: &CampusId) -> Result<Option<PersonId>, DirectoryError> {
        let state = self.state.lock().expect("directory mutex poisoned");
        Ok(state.principals.get(campus).cloned())
    }
}

impl AssignmentWriter for InMemoryDirectory {
    fn reassign(&self, change: &AssignmentChange) -> Result<(), AssignmentError> {
        let mut state = self.state.lock().expect("directory mutex poisoned");

        let snapshot = state
            .entities
            .get(&change.entity.id)
            .cloned()
            .ok_or_else(|| AssignmentError::UnknownEntity(change.entity.id.clone()))?;

        // Seat check happens against live counts before anything mutates.
        if let Some(target) = &change.classroom {
            let room = state
                .classrooms
                .get(target)
                .ok_or_else(|| AssignmentError::UnknownClassroom(target.clone()))?;
            if !room.has_free_seat() {
                return Err(AssignmentError::NoCapacity {
                    classroom: target.clone(),
                });
            }
        }

        if let Some(previous) = &snapshot.classroom {
            if let Some(room) = state.classrooms.get_mut(previous) {
                room.enrolled = room.enrolled.saturating_sub(1);
            }
        }
        if let Some(target) = &change.classroom {
            if let Some(room) = state.classrooms.get_mut(target) {
                room.enrolled += 1;
            }
        }

        let entry = state
            .entities
            .get_mut(&change.entity.id)
            .ok_or_else(|| AssignmentError::UnknownEntity(change.entity.id.clone()))?;
        entry.campus = change.campus.clone();
        entry.shift = change.shift;
        entry.grade = change.grade;
        entry.classroom = change.classroom.clone();
        entry.display_id = change.new_display_id.clone();

        Ok(())
    }
}

/// Transfer store held in a single mutex, which is what makes `insert` and
/// the swap operations atomic with their checks.
#[derive(Default)]
pub struct InMemoryTransferStore {
    records: Mutex<HashMap<TransferId, TransferRecord>>,
}

impl InMemoryTransferStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("transfer store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cas_check(
        records: &HashMap<TransferId, TransferRecord>,
        id: &TransferId,
        expected: TransferStatus,
    ) -> Result<(), StoreError> {
        let current = records.get(id).ok_or(StoreError::NotFound)?;
        if current.status == expected {
            Ok(())
        } else {
            Err(StoreError::StatusChanged {
                found: current.status,
            })
        }
    }
}

impl TransferStore for InMemoryTransferStore {
    fn insert(&self, record: TransferRecord) -> Result<TransferRecord, StoreError> {
        let mut records = self.records.lock().expect("transfer store mutex poisoned");

        if let Some(existing) = records
            .values()
            .find(|held| held.entity.id == record.entity.id && held.is_active())
        {
            return Err(StoreError::ActiveTransferExists {
                existing: existing.id.clone(),
            });
        }

        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &TransferId) -> Result<Option<TransferRecord>, StoreError> {
        let records = self.records.lock().expect("transfer store mutex poisoned");
        Ok(records.get(id).cloned())
    }

    fn swap(
        &self,
        expected: TransferStatus,
        record: TransferRecord,
    ) -> Result<TransferRecord, StoreError> {
        let mut records = self.records.lock().expect("transfer store mutex poisoned");
        Self::cas_check(&records, &record.id, expected)?;
        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn swap_and_reassign(
        &self,
        expected: TransferStatus,
        record: TransferRecord,
        change: &AssignmentChange,
        assignments: &dyn AssignmentWriter,
    ) -> Result<TransferRecord, StoreError> {
        let mut records = self.records.lock().expect("transfer store mutex poisoned");
        Self::cas_check(&records, &record.id, expected)?;

        // The assignment write happens under the store lock, before the new
        // status becomes visible; a failure here leaves the record untouched.
        assignments.reassign(change)?;

        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn list_by_initiator(
        &self,
        person: &PersonId,
        filter: StatusFilter,
    ) -> Result<Vec<TransferRecord>, StoreError> {
        let records = self.records.lock().expect("transfer store mutex poisoned");
        Ok(records
            .values()
            .filter(|record| record.initiator.person == *person && filter.matches(record.status))
            .cloned()
            .collect())
    }

    fn list_by_approver(
        &self,
        person: &PersonId,
        filter: StatusFilter,
    ) -> Result<Vec<TransferRecord>, StoreError> {
        let records = self.records.lock().expect("transfer store mutex poisoned");
        Ok(records
            .values()
            .filter(|record| record.involves(person) && filter.matches(record.status))
            .cloned()
            .collect())
    }
}

/// Captures emitted letters instead of sending them anywhere.
#[derive(Default)]
pub struct InMemoryLetterEmitter {
    letters: Mutex<Vec<TransferLetter>>,
}

impl InMemoryLetterEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn letters(&self) -> Vec<TransferLetter> {
        self.letters.lock().expect("letter mutex poisoned").clone()
    }
}

impl LetterEmitter for InMemoryLetterEmitter {
    fn deliver(&self, letter: TransferLetter) -> Result<(), LetterError> {
        let mut letters = self.letters.lock().expect("letter mutex poisoned");
        letters.push(letter);
        Ok(())
    }
}
