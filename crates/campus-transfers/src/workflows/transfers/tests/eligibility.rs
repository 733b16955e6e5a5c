use super::common::*;
use crate::workflows::transfers::domain::{CampusId, EntityId, Grade, Shift};
use crate::workflows::transfers::eligibility::{
    EligibilityError, EligibilityResolver, EligibilityScope,
};
use crate::workflows::transfers::service::TransferServiceError;

#[test]
fn section_options_exclude_current_and_full_rooms() {
    let school = fixture();
    let lia = school
        .directory
        .entity_snapshot(&EntityId("st-01109".to_string()))
        .expect("snapshot present");

    let resolver = EligibilityResolver::new(school.directory.as_ref());
    let options = resolver
        .options(&lia, &EligibilityScope::Section)
        .expect("resolution succeeds");

    // A is Lia's own room and C is full, leaving only B.
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].classroom.0, "c06-m-g5-b");
    assert_eq!(options[0].section, "B");
    assert_eq!(options[0].seats_left, 6);
}

#[test]
fn shift_options_target_opposite_shift() {
    let school = fixture();
    let lia = school
        .directory
        .entity_snapshot(&EntityId("st-01109".to_string()))
        .expect("snapshot present");

    let resolver = EligibilityResolver::new(school.directory.as_ref());
    let options = resolver
        .options(&lia, &EligibilityScope::Shift)
        .expect("resolution succeeds");

    assert_eq!(options.len(), 1);
    assert_eq!(options[0].classroom.0, "c06-a-g5-a");
    assert_eq!(options[0].shift, Shift::Afternoon);
    assert_eq!(options[0].grade, Grade(5));
}

#[test]
fn grade_skip_options_target_next_grade() {
    let school = fixture();
    let lia = school
        .directory
        .entity_snapshot(&EntityId("st-01109".to_string()))
        .expect("snapshot present");

    let resolver = EligibilityResolver::new(school.directory.as_ref());
    let options = resolver
        .options(&lia, &EligibilityScope::GradeSkip)
        .expect("resolution succeeds");

    assert_eq!(options.len(), 1);
    assert_eq!(options[0].classroom.0, "c06-m-g6-a");
    assert_eq!(options[0].grade, Grade(6));
}

#[test]
fn campus_options_follow_destination_shift() {
    let school = fixture();
    let lia = school
        .directory
        .entity_snapshot(&EntityId("st-01109".to_string()))
        .expect("snapshot present");

    let resolver = EligibilityResolver::new(school.directory.as_ref());
    let options = resolver
        .options(
            &lia,
            &EligibilityScope::Campus {
                campus: CampusId("c-hilltop".to_string()),
                shift: Shift::Afternoon,
                skip_grade: false,
            },
        )
        .expect("resolution succeeds");

    assert_eq!(options.len(), 1);
    assert_eq!(options[0].classroom.0, "c09-a-g5-a");
    assert_eq!(options[0].campus.0, "c-hilltop");
}

#[test]
fn campus_options_empty_when_shift_not_offered() {
    let school = fixture();
    let lia = school
        .directory
        .entity_snapshot(&EntityId("st-01109".to_string()))
        .expect("snapshot present");

    let resolver = EligibilityResolver::new(school.directory.as_ref());
    let options = resolver
        .options(
            &lia,
            &EligibilityScope::Campus {
                campus: CampusId("c-lakeside".to_string()),
                shift: Shift::Afternoon,
                skip_grade: false,
            },
        )
        .expect("an unoffered shift is not an error");

    assert!(options.is_empty());
}

#[test]
fn campus_skip_grade_targets_next_grade_rooms() {
    let school = fixture();
    let lia = school
        .directory
        .entity_snapshot(&EntityId("st-01109".to_string()))
        .expect("snapshot present");

    let resolver = EligibilityResolver::new(school.directory.as_ref());
    let options = resolver
        .options(
            &lia,
            &EligibilityScope::Campus {
                campus: CampusId("c-hilltop".to_string()),
                shift: Shift::Afternoon,
                skip_grade: true,
            },
        )
        .expect("resolution succeeds");

    assert_eq!(options.len(), 1);
    assert_eq!(options[0].classroom.0, "c09-a-g6-a");
    assert_eq!(options[0].grade, Grade(6));
}

#[test]
fn unknown_campus_is_an_error() {
    let school = fixture();
    let lia = school
        .directory
        .entity_snapshot(&EntityId("st-01109".to_string()))
        .expect("snapshot present");

    let resolver = EligibilityResolver::new(school.directory.as_ref());
    match resolver.options(
        &lia,
        &EligibilityScope::Campus {
            campus: CampusId("c-nowhere".to_string()),
            shift: Shift::Morning,
            skip_grade: false,
        },
    ) {
        Err(EligibilityError::UnknownCampus(campus)) => assert_eq!(campus.0, "c-nowhere"),
        other => panic!("expected unknown campus, got {other:?}"),
    }
}

#[test]
fn unassigned_entity_is_an_error() {
    let school = fixture();
    let mut lia = school
        .directory
        .entity_snapshot(&EntityId("st-01109".to_string()))
        .expect("snapshot present");
    lia.classroom = None;

    let resolver = EligibilityResolver::new(school.directory.as_ref());
    match resolver.options(&lia, &EligibilityScope::Section) {
        Err(EligibilityError::MissingAssignment(entity)) => assert_eq!(entity.0, "st-01109"),
        other => panic!("expected missing assignment, got {other:?}"),
    }
}

#[test]
fn service_gives_teachers_no_section_options() {
    let school = fixture();
    let paulo = EntityId("tch-0042".to_string());

    let options = school
        .service
        .eligible_destinations(
            &paulo,
            &EligibilityScope::Campus {
                campus: CampusId("c-hilltop".to_string()),
                shift: Shift::Afternoon,
                skip_grade: false,
            },
        )
        .expect("campus scope succeeds for teachers");
    assert!(options.is_empty());

    match school
        .service
        .eligible_destinations(&paulo, &EligibilityScope::Section)
    {
        Err(TransferServiceError::Validation(_)) => {}
        other => panic!("expected validation error, got {other:?}"),
    }
}
