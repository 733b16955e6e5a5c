use std::sync::Arc;

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::transfers::directory::{CampusRecord, ClassroomRecord, EntitySnapshot};
use crate::workflows::transfers::domain::{
    Actor, CampusId, ClassroomId, EntityId, EntityKind, Grade, PersonId, Role, Shift, TransferId,
};
use crate::workflows::transfers::machine::TransferStatus;
use crate::workflows::transfers::memory::{
    InMemoryDirectory, InMemoryLetterEmitter, InMemoryTransferStore,
};
use crate::workflows::transfers::repository::{
    AssignmentChange, AssignmentWriter, LetterEmitter, LetterError, StatusFilter, StoreError,
    TransferLetter, TransferRecord, TransferStore,
};
use crate::workflows::transfers::service::{TransferRequest, TransferService};
use crate::workflows::transfers::{transfer_router, DestinationParams};

/// Three campuses: Riverbend (C06) and Hilltop (C09) run both shifts,
/// Lakeside (C11) is morning-only.
pub(super) struct SchoolFixture {
    pub(super) directory: Arc<InMemoryDirectory>,
    pub(super) store: Arc<InMemoryTransferStore>,
    pub(super) letters: Arc<InMemoryLetterEmitter>,
    pub(super) service: TransferService<InMemoryTransferStore, InMemoryDirectory, InMemoryLetterEmitter>,
}

pub(super) fn fixture() -> SchoolFixture {
    let directory = Arc::new(InMemoryDirectory::new());
    seed_directory(&directory);

    let store = Arc::new(InMemoryTransferStore::new());
    let letters = Arc::new(InMemoryLetterEmitter::new());
    let service = TransferService::new(
        directory.clone(),
        store.clone(),
        directory.clone(),
        letters.clone(),
    );

    SchoolFixture {
        directory,
        store,
        letters,
        service,
    }
}

pub(super) fn seed_directory(directory: &InMemoryDirectory) {
    directory.add_campus(campus("c-riverbend", "C06", "Riverbend", true));
    directory.add_campus(campus("c-hilltop", "C09", "Hilltop", true));
    directory.add_campus(campus("c-lakeside", "C11", "Lakeside", false));

    // Riverbend morning G5: A holds Lia, B has room, C is full.
    directory.add_classroom(room("c06-m-g5-a", "c-riverbend", Shift::Morning, 5, "A", 30, 29));
    directory.add_classroom(room("c06-m-g5-b", "c-riverbend", Shift::Morning, 5, "B", 30, 24));
    directory.add_classroom(room("c06-m-g5-c", "c-riverbend", Shift::Morning, 5, "C", 25, 25));
    directory.add_classroom(room("c06-a-g5-a", "c-riverbend", Shift::Afternoon, 5, "A", 30, 18));
    directory.add_classroom(room("c06-m-g6-a", "c-riverbend", Shift::Morning, 6, "A", 28, 22));

    directory.add_classroom(room("c09-m-g5-a", "c-hilltop", Shift::Morning, 5, "A", 30, 27));
    directory.add_classroom(room("c09-a-g5-a", "c-hilltop", Shift::Afternoon, 5, "A", 30, 21));
    directory.add_classroom(room("c09-a-g6-a", "c-hilltop", Shift::Afternoon, 6, "A", 30, 15));

    directory.add_classroom(room("c11-m-g5-a", "c-lakeside", Shift::Morning, 5, "A", 20, 12));

    directory.add_entity(student(
        "st-01109",
        "Lia Fontes",
        "C06-M-25-01109",
        "c-riverbend",
        Shift::Morning,
        5,
        "c06-m-g5-a",
    ));
    directory.add_entity(student(
        "st-01204",
        "Tomas Iber",
        "C06-M-25-01204",
        "c-riverbend",
        Shift::Morning,
        5,
        "c06-m-g5-b",
    ));
    directory.add_entity(student(
        "st-01318",
        "Noor Amal",
        "C06-A-25-01318",
        "c-riverbend",
        Shift::Afternoon,
        5,
        "c06-a-g5-a",
    ));
    directory.add_entity(EntitySnapshot {
        id: EntityId("tch-0042".to_string()),
        kind: EntityKind::Teacher,
        name: "Paulo Reyes".to_string(),
        display_id: "C06-M-19-T04".to_string(),
        campus: CampusId("c-riverbend".to_string()),
        shift: Shift::Morning,
        grade: None,
        classroom: None,
    });

    let riverbend = CampusId("c-riverbend".to_string());
    let hilltop = CampusId("c-hilltop".to_string());

    directory.set_grade_coordinator(
        riverbend.clone(),
        Shift::Morning,
        Grade(5),
        PersonId("p-irene".to_string()),
    );
    directory.set_grade_coordinator(
        riverbend.clone(),
        Shift::Afternoon,
        Grade(5),
        PersonId("p-noah".to_string()),
    );
    directory.set_grade_coordinator(
        riverbend.clone(),
        Shift::Morning,
        Grade(6),
        PersonId("p-yara".to_string()),
    );
    directory.set_grade_coordinator(
        hilltop.clone(),
        Shift::Afternoon,
        Grade(5),
        PersonId("p-tessa".to_string()),
    );
    directory.set_grade_coordinator(
        hilltop.clone(),
        Shift::Afternoon,
        Grade(6),
        PersonId("p-ravi".to_string()),
    );

    directory.set_shift_coordinator(riverbend.clone(), Shift::Morning, PersonId("p-dana".to_string()));
    directory.set_shift_coordinator(hilltop.clone(), Shift::Afternoon, PersonId("p-priya".to_string()));

    directory.set_principal(riverbend, PersonId("p-helena".to_string()));
    directory.set_principal(hilltop, PersonId("p-marcus".to_string()));
}

fn campus(id: &str, code: &str, name: &str, both_shifts: bool) -> CampusRecord {
    let shifts = if both_shifts {
        vec![Shift::Morning, Shift::Afternoon]
    } else {
        vec![Shift::Morning]
    };
    CampusRecord {
        id: CampusId(id.to_string()),
        code: code.to_string(),
        name: name.to_string(),
        shifts,
    }
}

fn room(
    id: &str,
    campus: &str,
    shift: Shift,
    grade: u8,
    section: &str,
    capacity: u16,
    enrolled: u16,
) -> ClassroomRecord {
    ClassroomRecord {
        id: ClassroomId(id.to_string()),
        campus: CampusId(campus.to_string()),
        shift,
        grade: Grade(grade),
        section: section.to_string(),
        capacity,
        enrolled,
    }
}

fn student(
    id: &str,
    name: &str,
    display_id: &str,
    campus: &str,
    shift: Shift,
    grade: u8,
    classroom: &str,
) -> EntitySnapshot {
    EntitySnapshot {
        id: EntityId(id.to_string()),
        kind: EntityKind::Student,
        name: name.to_string(),
        display_id: display_id.to_string(),
        campus: CampusId(campus.to_string()),
        shift,
        grade: Some(Grade(grade)),
        classroom: Some(ClassroomId(classroom.to_string())),
    }
}

pub(super) fn coordinator(person: &str) -> Actor {
    Actor {
        person: PersonId(person.to_string()),
        role: Role::Coordinator,
    }
}

pub(super) fn principal(person: &str) -> Actor {
    Actor {
        person: PersonId(person.to_string()),
        role: Role::Principal,
    }
}

pub(super) fn homeroom_teacher(person: &str) -> Actor {
    Actor {
        person: PersonId(person.to_string()),
        role: Role::Teacher,
    }
}

pub(super) fn reason() -> String {
    "Family schedule changed for the new school term".to_string()
}

pub(super) fn request(entity: &str, destination: DestinationParams) -> TransferRequest {
    TransferRequest {
        entity: EntityId(entity.to_string()),
        destination,
        reason: reason(),
        requested_date: NaiveDate::from_ymd_opt(2025, 9, 1).expect("valid date"),
        initiator: homeroom_teacher("p-leo"),
    }
}

pub(super) fn section_request(entity: &str, to_classroom: &str) -> TransferRequest {
    request(
        entity,
        DestinationParams::Section {
            to_classroom: ClassroomId(to_classroom.to_string()),
        },
    )
}

pub(super) fn shift_request(entity: &str, to_shift: Shift, to_classroom: &str) -> TransferRequest {
    request(
        entity,
        DestinationParams::Shift {
            to_shift,
            to_classroom: ClassroomId(to_classroom.to_string()),
        },
    )
}

pub(super) fn grade_skip_request(
    entity: &str,
    to_grade: u8,
    to_classroom: Option<&str>,
) -> TransferRequest {
    request(
        entity,
        DestinationParams::GradeSkip {
            to_grade: Grade(to_grade),
            to_classroom: to_classroom.map(|room| ClassroomId(room.to_string())),
        },
    )
}

pub(super) fn campus_request(
    entity: &str,
    to_campus: &str,
    to_shift: Shift,
    to_classroom: Option<&str>,
    skip_grade: bool,
) -> TransferRequest {
    request(
        entity,
        DestinationParams::Campus {
            to_campus: CampusId(to_campus.to_string()),
            to_shift,
            to_classroom: to_classroom.map(|room| ClassroomId(room.to_string())),
            skip_grade,
        },
    )
}

/// Router sharing the fixture's directory, store, and letter state.
pub(super) fn school_router(school: &SchoolFixture) -> axum::Router {
    let service = TransferService::new(
        school.directory.clone(),
        school.store.clone(),
        school.directory.clone(),
        school.letters.clone(),
    );
    transfer_router(Arc::new(service))
}

pub(super) struct FailingLetterEmitter;

impl LetterEmitter for FailingLetterEmitter {
    fn deliver(&self, _letter: TransferLetter) -> Result<(), LetterError> {
        Err(LetterError::Transport("letter office offline".to_string()))
    }
}

pub(super) struct UnavailableStore;

impl TransferStore for UnavailableStore {
    fn insert(&self, _record: TransferRecord) -> Result<TransferRecord, StoreError> {
        Err(StoreError::Unavailable("records office offline".to_string()))
    }

    fn fetch(&self, _id: &TransferId) -> Result<Option<TransferRecord>, StoreError> {
        Err(StoreError::Unavailable("records office offline".to_string()))
    }

    fn swap(
        &self,
        _expected: TransferStatus,
        _record: TransferRecord,
    ) -> Result<TransferRecord, StoreError> {
        Err(StoreError::Unavailable("records office offline".to_string()))
    }

    fn swap_and_reassign(
        &self,
        _expected: TransferStatus,
        _record: TransferRecord,
        _change: &AssignmentChange,
        _assignments: &dyn AssignmentWriter,
    ) -> Result<TransferRecord, StoreError> {
        Err(StoreError::Unavailable("records office offline".to_string()))
    }

    fn list_by_initiator(
        &self,
        _person: &PersonId,
        _filter: StatusFilter,
    ) -> Result<Vec<TransferRecord>, StoreError> {
        Err(StoreError::Unavailable("records office offline".to_string()))
    }

    fn list_by_approver(
        &self,
        _person: &PersonId,
        _filter: StatusFilter,
    ) -> Result<Vec<TransferRecord>, StoreError> {
        Err(StoreError::Unavailable("records office offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
