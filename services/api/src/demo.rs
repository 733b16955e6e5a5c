use crate::infra::{seed_school, SchoolTransferService, SeededSchool};
use chrono::{Local, NaiveDate};
use clap::Args;

use campus_transfers::error::AppError;
use campus_transfers::workflows::transfers::{
    identifier, Actor, CampusId, ClassroomId, DestinationParams, EligibilityScope, EntityId,
    PersonId, Role, Shift, StatusFilter, TransferRequest, TransferServiceError,
    APPLY_CONFIRMATION_PHRASE,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Requested effective date for the demo transfers (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) requested_date: Option<NaiveDate>,
    /// Skip the campus transfer portion of the demo.
    #[arg(long)]
    pub(crate) skip_campus: bool,
}

#[derive(Args, Debug)]
pub(crate) struct IdPreviewArgs {
    /// Current display identifier, e.g. C06-M-25-01109
    #[arg(long)]
    pub(crate) display_id: String,
    /// Destination campus code, e.g. C09
    #[arg(long)]
    pub(crate) campus_code: String,
    /// Destination shift (morning or afternoon)
    #[arg(long, value_parser = crate::infra::parse_shift)]
    pub(crate) shift: Shift,
}

pub(crate) fn run_id_preview(args: IdPreviewArgs) -> Result<(), AppError> {
    let preview = identifier::preview(&args.display_id, &args.campus_code, args.shift.code())
        .map_err(TransferServiceError::from_identifier)?;

    println!("Identifier preview");
    println!("- current: {}", preview.old_id);
    println!("- after transfer: {}", preview.new_id);
    println!(
        "- rewritten tokens: campus {} | shift {}",
        preview.campus_code, preview.shift_code
    );
    println!(
        "- preserved tokens: enrollment year {} | suffix {}",
        preview.enrollment_year, preview.suffix
    );
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let requested_date = args
        .requested_date
        .unwrap_or_else(|| Local::now().date_naive());

    let school = seed_school();
    let service = school.service();

    println!("Campus transfer desk demo");
    println!("Requested effective date: {requested_date}");

    run_section_walkthrough(&school, &service, requested_date)?;

    if args.skip_campus {
        return Ok(());
    }

    run_campus_walkthrough(&school, &service, requested_date)?;
    Ok(())
}

fn run_section_walkthrough(
    school: &SeededSchool,
    service: &SchoolTransferService,
    requested_date: NaiveDate,
) -> Result<(), AppError> {
    println!("\nSection transfer: Lia Fontes (C06-M-25-01109)");

    let lia = EntityId("st-01109".to_string());
    let options = service.eligible_destinations(&lia, &EligibilityScope::Section)?;
    println!("Eligible sections in her grade and shift:");
    for option in &options {
        println!(
            "  - {} (section {}, {} seats left)",
            option.classroom, option.section, option.seats_left
        );
    }

    let record = service.create(TransferRequest {
        entity: lia.clone(),
        destination: DestinationParams::Section {
            to_classroom: ClassroomId("c06-m-g5-b".to_string()),
        },
        reason: "Sibling already attends the section B homeroom".to_string(),
        requested_date,
        initiator: homeroom_teacher(),
    })?;
    let view = record.status_view();
    println!("Created {} -> status {}", view.transfer_id, view.status);
    if let Some(awaiting) = &view.awaiting {
        println!("Waiting on {} ({})", awaiting.person, awaiting.slot);
    }

    let irene = PersonId("p-irene".to_string());
    let queue = service.inbox(&irene, StatusFilter::Pending)?;
    println!("Coordinator inbox for {irene}: {} pending item(s)", queue.len());

    let approved = service.approve(&record.id, coordinator("p-irene"))?;
    println!("Approved by p-irene -> status {}", approved.status.label());

    if let Some(snapshot) = school.directory.entity_snapshot(&lia) {
        let room = snapshot
            .classroom
            .as_ref()
            .map(|room| room.to_string())
            .unwrap_or_else(|| "no section".to_string());
        println!(
            "Roster now shows {} in {} with id {}",
            snapshot.name, room, snapshot.display_id
        );
    }
    Ok(())
}

fn run_campus_walkthrough(
    school: &SeededSchool,
    service: &SchoolTransferService,
    requested_date: NaiveDate,
) -> Result<(), AppError> {
    println!("\nCampus transfer: Tomas Iber (C06-M-25-01204) -> Hilltop, afternoon shift");

    let tomas = EntityId("st-01204".to_string());
    let record = service.create(TransferRequest {
        entity: tomas.clone(),
        destination: DestinationParams::Campus {
            to_campus: CampusId("c-hilltop".to_string()),
            to_shift: Shift::Afternoon,
            to_classroom: Some(ClassroomId("c09-a-g5-a".to_string())),
            skip_grade: false,
        },
        reason: "Household is relocating closer to the Hilltop campus".to_string(),
        requested_date,
        initiator: homeroom_teacher(),
    })?;
    println!("Created {} -> status {}", record.id, record.status.label());

    let preview = service.preview_id_change(&record.id)?;
    println!(
        "Identifier on apply: {} -> {} (year {} and suffix {} preserved)",
        preview.old_id, preview.new_id, preview.enrollment_year, preview.suffix
    );

    let chain = [
        ("p-irene", Role::Coordinator, "source coordinator"),
        ("p-helena", Role::Principal, "source principal"),
        ("p-marcus", Role::Principal, "destination principal"),
    ];
    for (person, role, label) in chain {
        let actor = Actor {
            person: PersonId(person.to_string()),
            role,
        };
        let stepped = service.approve(&record.id, actor)?;
        println!("{label} {person} approved -> {}", stepped.status.label());
    }

    // The final step refuses anything but the exact confirmation phrase.
    match service.confirm(&record.id, coordinator("p-tessa"), "apply transfer") {
        Err(TransferServiceError::Validation(message)) => {
            println!("Sloppy confirmation rejected: {message}");
        }
        Ok(_) => println!("Unexpected: lowercase phrase was accepted"),
        Err(err) => return Err(err.into()),
    }

    let applied = service.confirm(
        &record.id,
        coordinator("p-tessa"),
        APPLY_CONFIRMATION_PHRASE,
    )?;
    println!(
        "Confirmed with '{APPLY_CONFIRMATION_PHRASE}' -> status {}",
        applied.status.label()
    );

    if let Some(snapshot) = school.directory.entity_snapshot(&tomas) {
        println!(
            "Roster now shows {} at {} ({} shift) with id {}",
            snapshot.name,
            snapshot.campus,
            snapshot.shift.label(),
            snapshot.display_id
        );
    }

    let letters = school.letters.letters();
    if letters.is_empty() {
        println!("Transfer letters: none dispatched");
    } else {
        println!("Transfer letters:");
        for letter in letters {
            println!(
                "  - {} for {} -> new id {}",
                letter.transfer_id, letter.entity.id, letter.new_display_id
            );
        }
    }
    Ok(())
}

fn coordinator(person: &str) -> Actor {
    Actor {
        person: PersonId(person.to_string()),
        role: Role::Coordinator,
    }
}

fn homeroom_teacher() -> Actor {
    Actor {
        person: PersonId("p-leo".to_string()),
        role: Role::Teacher,
    }
}
