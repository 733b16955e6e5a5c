use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use campus_transfers::workflows::transfers::{
    CampusId, CampusRecord, ClassroomId, ClassroomRecord, EntityId, EntityKind, EntitySnapshot,
    Grade, InMemoryDirectory, InMemoryLetterEmitter, InMemoryTransferStore, PersonId, Shift,
    TransferService,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type SchoolTransferService =
    TransferService<InMemoryTransferStore, InMemoryDirectory, InMemoryLetterEmitter>;

/// Shared handles behind a running transfer desk. The directory doubles as
/// the assignment writer, so approvals rewrite the same roster the eligibility
/// checks read.
pub(crate) struct SeededSchool {
    pub(crate) directory: Arc<InMemoryDirectory>,
    pub(crate) store: Arc<InMemoryTransferStore>,
    pub(crate) letters: Arc<InMemoryLetterEmitter>,
}

impl SeededSchool {
    pub(crate) fn service(&self) -> SchoolTransferService {
        TransferService::new(
            self.directory.clone(),
            self.store.clone(),
            self.directory.clone(),
            self.letters.clone(),
        )
    }
}

/// Bootstrap roster for the in-memory deployment: three campuses, their
/// grade 5 and 6 sections, and the staff who sit in the approval chains.
pub(crate) fn seed_school() -> SeededSchool {
    let directory = Arc::new(InMemoryDirectory::new());

    directory.add_campus(campus("c-riverbend", "C06", "Riverbend", true));
    directory.add_campus(campus("c-hilltop", "C09", "Hilltop", true));
    directory.add_campus(campus("c-lakeside", "C11", "Lakeside", false));

    let rooms: &[(&str, &str, Shift, u8, &str, u16, u16)] = &[
        ("c06-m-g5-a", "c-riverbend", Shift::Morning, 5, "A", 30, 29),
        ("c06-m-g5-b", "c-riverbend", Shift::Morning, 5, "B", 30, 24),
        ("c06-a-g5-a", "c-riverbend", Shift::Afternoon, 5, "A", 30, 18),
        ("c06-m-g6-a", "c-riverbend", Shift::Morning, 6, "A", 28, 22),
        ("c09-m-g5-a", "c-hilltop", Shift::Morning, 5, "A", 30, 27),
        ("c09-a-g5-a", "c-hilltop", Shift::Afternoon, 5, "A", 30, 21),
        ("c09-a-g6-a", "c-hilltop", Shift::Afternoon, 6, "A", 30, 15),
        ("c11-m-g5-a", "c-lakeside", Shift::Morning, 5, "A", 20, 12),
    ];
    for (id, campus, shift, grade, section, capacity, enrolled) in rooms {
        directory.add_classroom(ClassroomRecord {
            id: ClassroomId((*id).to_string()),
            campus: CampusId((*campus).to_string()),
            shift: *shift,
            grade: Grade(*grade),
            section: (*section).to_string(),
            capacity: *capacity,
            enrolled: *enrolled,
        });
    }

    let students: &[(&str, &str, &str, Shift, u8, &str)] = &[
        (
            "st-01109",
            "Lia Fontes",
            "C06-M-25-01109",
            Shift::Morning,
            5,
            "c06-m-g5-a",
        ),
        (
            "st-01204",
            "Tomas Iber",
            "C06-M-25-01204",
            Shift::Morning,
            5,
            "c06-m-g5-b",
        ),
        (
            "st-01318",
            "Noor Amal",
            "C06-A-25-01318",
            Shift::Afternoon,
            5,
            "c06-a-g5-a",
        ),
    ];
    for (id, name, display_id, shift, grade, room) in students {
        directory.add_entity(EntitySnapshot {
            id: EntityId((*id).to_string()),
            kind: EntityKind::Student,
            name: (*name).to_string(),
            display_id: (*display_id).to_string(),
            campus: CampusId("c-riverbend".to_string()),
            shift: *shift,
            grade: Some(Grade(*grade)),
            classroom: Some(ClassroomId((*room).to_string())),
        });
    }

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
    directory.set_shift_coordinator(
        riverbend.clone(),
        Shift::Morning,
        PersonId("p-dana".to_string()),
    );
    directory.set_shift_coordinator(
        hilltop.clone(),
        Shift::Afternoon,
        PersonId("p-priya".to_string()),
    );
    directory.set_principal(riverbend, PersonId("p-helena".to_string()));
    directory.set_principal(hilltop, PersonId("p-marcus".to_string()));

    SeededSchool {
        directory,
        store: Arc::new(InMemoryTransferStore::new()),
        letters: Arc::new(InMemoryLetterEmitter::new()),
    }
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

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_shift(raw: &str) -> Result<Shift, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "morning" | "m" => Ok(Shift::Morning),
        "afternoon" | "a" => Ok(Shift::Afternoon),
        other => Err(format!(
            "'{other}' is not a recognized shift (use morning or afternoon)"
        )),
    }
}
