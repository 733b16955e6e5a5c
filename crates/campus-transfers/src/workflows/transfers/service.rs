//! The workflow engine: creates transfer requests, executes role-gated
//! transitions through the machine tables, and commits the apply step
//! (status + identifier + assignment) as one unit through the store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::directory::{CampusRecord, Directory, DirectoryError, EntitySnapshot};
use super::domain::{
    Actor, ApproverSlot, CampusDetail, CampusId, ClassroomId, DestinationParams, EntityId,
    EntityKind, EntityRef, Grade, GradeSkipDetail, PersonId, SectionDetail, Shift, ShiftDetail,
    TransferDetail, TransferId, TransferKind,
};
use super::eligibility::{
    DestinationOption, EligibilityError, EligibilityResolver, EligibilityScope,
};
use super::identifier::{self, IdChangePreview, IdentifierError};
use super::machine::{ActionKind, TransferStatus, TwoStepStatus};
use super::repository::{
    AssignmentChange, AssignmentError, AssignmentWriter, AuditEntry, LetterEmitter, StatusFilter,
    StoreError, TransferLetter, TransferRecord, TransferStore,
};

/// Literal phrase the receiving coordinator must submit on the campus apply step.
pub const APPLY_CONFIRMATION_PHRASE: &str = "APPLY TRANSFER";

/// Bounds on the free-text reason captured at creation, in characters.
pub const REASON_MIN_CHARS: usize = 20;
pub const REASON_MAX_CHARS: usize = 500;

/// Parameters for creating a transfer of any kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub entity: EntityId,
    pub destination: DestinationParams,
    pub reason: String,
    pub requested_date: NaiveDate,
    pub initiator: Actor,
}

/// An action fired against an existing transfer, with its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferAction {
    Approve {
        /// Only honored on the final grade-skip approval, where the receiving
        /// coordinator may pick the destination section.
        destination_section: Option<ClassroomId>,
    },
    Decline {
        reason: String,
    },
    Cancel,
    Confirm {
        phrase: String,
    },
}

impl TransferAction {
    pub const fn kind(&self) -> ActionKind {
        match self {
            TransferAction::Approve { .. } => ActionKind::Approve,
            TransferAction::Decline { .. } => ActionKind::Decline,
            TransferAction::Cancel => ActionKind::Cancel,
            TransferAction::Confirm { .. } => ActionKind::Confirm,
        }
    }
}

/// Service composing the directory, store, assignment writer, and letter hook.
pub struct TransferService<S, W, L> {
    directory: Arc<dyn Directory>,
    store: Arc<S>,
    assignments: Arc<W>,
    letters: Arc<L>,
}

static TRANSFER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_transfer_id() -> TransferId {
    let id = TRANSFER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    TransferId(format!("tr-{id:06}"))
}

impl<S, W, L> TransferService<S, W, L>
where
    S: TransferStore + 'static,
    W: AssignmentWriter + 'static,
    L: LetterEmitter + 'static,
{
    pub fn new(
        directory: Arc<dyn Directory>,
        store: Arc<S>,
        assignments: Arc<W>,
        letters: Arc<L>,
    ) -> Self {
        Self {
            directory,
            store,
            assignments,
            letters,
        }
    }

    /// Create a transfer request in its kind's initial pending state.
    ///
    /// Validates the reason length, the entity, and the destination against
    /// the current eligible set; the one-active-transfer-per-entity rule is
    /// enforced by the store at insert time so concurrent creates cannot race
    /// past each other.
    pub fn create(&self, request: TransferRequest) -> Result<TransferRecord, TransferServiceError> {
        let TransferRequest {
            entity,
            destination,
            reason,
            requested_date,
            initiator,
        } = request;

        let reason = validate_reason(&reason)?;
        let snapshot = self.snapshot(&entity)?;
        let detail = self.build_detail(&snapshot, &destination)?;
        let kind = detail.kind();

        let now = Utc::now();
        let record = TransferRecord {
            id: next_transfer_id(),
            entity: EntityRef {
                kind: snapshot.kind,
                id: snapshot.id.clone(),
            },
            reason,
            requested_date,
            status: TransferStatus::initial(kind),
            decline_reason: None,
            initiator,
            detail,
            audit: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.store.insert(record).map_err(|error| match error {
            StoreError::ActiveTransferExists { existing } => TransferServiceError::Conflict {
                entity: snapshot.id.clone(),
                existing,
            },
            other => TransferServiceError::Store(other),
        })
    }

    /// Execute one transition: check the machine tables, authorize the actor
    /// against the required approver slot, validate the action payload, and
    /// commit via compare-and-swap. A transition into `approved` additionally
    /// regenerates the display identifier and writes the new assignment in
    /// the same store transaction, then hands a letter to the emitter.
    pub fn advance(
        &self,
        id: &TransferId,
        action: TransferAction,
        actor: Actor,
    ) -> Result<TransferRecord, TransferServiceError> {
        let record = self
            .store
            .fetch(id)
            .map_err(TransferServiceError::Store)?
            .ok_or_else(|| TransferServiceError::NotFound(id.clone()))?;

        let action_kind = action.kind();
        let (next, slot) = match (
            record.status.next(action_kind),
            record.status.required_slot(action_kind),
        ) {
            (Some(next), Some(slot)) => (next, slot),
            _ => {
                return Err(TransferServiceError::StaleState {
                    transfer: id.clone(),
                    found: record.status,
                })
            }
        };

        authorize(&record, slot, &actor)?;

        let mut updated = record.clone();
        match &action {
            TransferAction::Approve {
                destination_section,
            } => {
                self.apply_approve_payload(&mut updated, destination_section.as_ref())?;
            }
            TransferAction::Decline { reason } => {
                let reason = reason.trim();
                if reason.is_empty() || reason.chars().count() > REASON_MAX_CHARS {
                    return Err(TransferServiceError::Validation(format!(
                        "declining requires a non-empty reason of at most {REASON_MAX_CHARS} characters"
                    )));
                }
                updated.decline_reason = Some(reason.to_string());
            }
            TransferAction::Cancel => {}
            TransferAction::Confirm { phrase } => {
                if phrase != APPLY_CONFIRMATION_PHRASE {
                    return Err(TransferServiceError::Validation(format!(
                        "confirmation phrase does not match '{APPLY_CONFIRMATION_PHRASE}'"
                    )));
                }
            }
        }

        let now = Utc::now();
        updated.status = next;
        updated.updated_at = now;
        updated.audit.push(AuditEntry {
            slot,
            action: action_kind,
            acted_by: actor.person.clone(),
            acted_at: now,
        });

        if next.is_approved() {
            let change = self.assignment_change(&updated)?;
            let committed = self
                .store
                .swap_and_reassign(record.status, updated, &change, self.assignments.as_ref())
                .map_err(|error| map_swap_error(error, id))?;
            info!(
                transfer = %committed.id,
                entity = %committed.entity.id,
                new_id = %change.new_display_id,
                "transfer applied"
            );
            self.deliver_letter(&committed, &change);
            Ok(committed)
        } else {
            self.store
                .swap(record.status, updated)
                .map_err(|error| map_swap_error(error, id))
        }
    }

    pub fn approve(
        &self,
        id: &TransferId,
        actor: Actor,
    ) -> Result<TransferRecord, TransferServiceError> {
        self.advance(
            id,
            TransferAction::Approve {
                destination_section: None,
            },
            actor,
        )
    }

    /// Approval that also picks the destination section; legal only on the
    /// final grade-skip step.
    pub fn approve_into_section(
        &self,
        id: &TransferId,
        actor: Actor,
        classroom: ClassroomId,
    ) -> Result<TransferRecord, TransferServiceError> {
        self.advance(
            id,
            TransferAction::Approve {
                destination_section: Some(classroom),
            },
            actor,
        )
    }

    pub fn decline(
        &self,
        id: &TransferId,
        actor: Actor,
        reason: impl Into<String>,
    ) -> Result<TransferRecord, TransferServiceError> {
        self.advance(
            id,
            TransferAction::Decline {
                reason: reason.into(),
            },
            actor,
        )
    }

    pub fn cancel(
        &self,
        id: &TransferId,
        actor: Actor,
    ) -> Result<TransferRecord, TransferServiceError> {
        self.advance(id, TransferAction::Cancel, actor)
    }

    pub fn confirm(
        &self,
        id: &TransferId,
        actor: Actor,
        phrase: impl Into<String>,
    ) -> Result<TransferRecord, TransferServiceError> {
        self.advance(
            id,
            TransferAction::Confirm {
                phrase: phrase.into(),
            },
            actor,
        )
    }

    /// Fetch a transfer record for API responses.
    pub fn get(&self, id: &TransferId) -> Result<TransferRecord, TransferServiceError> {
        self.store
            .fetch(id)
            .map_err(TransferServiceError::Store)?
            .ok_or_else(|| TransferServiceError::NotFound(id.clone()))
    }

    /// Transfers this person initiated, newest first.
    pub fn outbox(
        &self,
        person: &PersonId,
        filter: StatusFilter,
    ) -> Result<Vec<TransferRecord>, TransferServiceError> {
        let mut records = self
            .store
            .list_by_initiator(person, filter)
            .map_err(TransferServiceError::Store)?;
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(records)
    }

    /// Transfers involving this person as an approver, newest first. With the
    /// pending filter, only records currently waiting on them are returned.
    pub fn inbox(
        &self,
        person: &PersonId,
        filter: StatusFilter,
    ) -> Result<Vec<TransferRecord>, TransferServiceError> {
        let mut records = self
            .store
            .list_by_approver(person, filter)
            .map_err(TransferServiceError::Store)?;
        if filter == StatusFilter::Pending {
            records.retain(|record| {
                record
                    .current_approver()
                    .map_or(false, |(_, approver)| approver == person)
            });
        }
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(records)
    }

    /// Legal destination sections for an entity under the given scope.
    /// An empty set is a valid "no options right now" answer, not an error.
    pub fn eligible_destinations(
        &self,
        entity: &EntityId,
        scope: &EligibilityScope,
    ) -> Result<Vec<DestinationOption>, TransferServiceError> {
        let snapshot = self.snapshot(entity)?;

        if snapshot.kind == EntityKind::Teacher {
            // Teachers move between campuses without section placement, so
            // there is no section set to offer.
            return match scope {
                EligibilityScope::Campus { .. } => Ok(Vec::new()),
                _ => Err(TransferServiceError::Validation(
                    "teachers may only request campus transfers".to_string(),
                )),
            };
        }

        let resolver = EligibilityResolver::new(self.directory.as_ref());
        resolver
            .options(&snapshot, scope)
            .map_err(TransferServiceError::from)
    }

    /// The identifier rewrite a pending transfer would perform, without
    /// committing anything.
    pub fn preview_id_change(
        &self,
        id: &TransferId,
    ) -> Result<IdChangePreview, TransferServiceError> {
        let record = self.get(id)?;
        let snapshot = self.snapshot(&record.entity.id)?;

        let (campus, shift) = match &record.detail {
            TransferDetail::Section(_) | TransferDetail::GradeSkip(_) => {
                (snapshot.campus.clone(), snapshot.shift)
            }
            TransferDetail::Shift(detail) => (snapshot.campus.clone(), detail.to_shift),
            TransferDetail::Campus(detail) => (detail.to_campus.clone(), detail.to_shift),
        };

        let campus_record = self.require_campus(&campus)?;
        identifier::preview(&snapshot.display_id, &campus_record.code, shift.code())
            .map_err(TransferServiceError::from_identifier)
    }

    fn snapshot(&self, entity: &EntityId) -> Result<EntitySnapshot, TransferServiceError> {
        self.directory.entity(entity)?.ok_or_else(|| {
            TransferServiceError::Validation(format!("entity '{entity}' is not registered"))
        })
    }

    fn build_detail(
        &self,
        snapshot: &EntitySnapshot,
        destination: &DestinationParams,
    ) -> Result<TransferDetail, TransferServiceError> {
        match destination {
            DestinationParams::Section { to_classroom } => {
                require_student(snapshot, TransferKind::Section)?;
                let (grade, from_classroom) = student_assignment(snapshot)?;
                self.require_option(snapshot, &EligibilityScope::Section, to_classroom)?;

                Ok(TransferDetail::Section(SectionDetail {
                    from_classroom,
                    to_classroom: to_classroom.clone(),
                    coordinator: self.require_coordinator(
                        &snapshot.campus,
                        snapshot.shift,
                        grade,
                    )?,
                }))
            }
            DestinationParams::Shift {
                to_shift,
                to_classroom,
            } => {
                require_student(snapshot, TransferKind::Shift)?;
                let (grade, from_classroom) = student_assignment(snapshot)?;
                if *to_shift != snapshot.shift.opposite() {
                    return Err(TransferServiceError::Validation(format!(
                        "shift transfers must target the {} shift",
                        snapshot.shift.opposite().label()
                    )));
                }
                self.require_option(snapshot, &EligibilityScope::Shift, to_classroom)?;

                Ok(TransferDetail::Shift(ShiftDetail {
                    from_shift: snapshot.shift,
                    to_shift: *to_shift,
                    from_classroom,
                    to_classroom: to_classroom.clone(),
                    from_coordinator: self.require_coordinator(
                        &snapshot.campus,
                        snapshot.shift,
                        grade,
                    )?,
                    to_coordinator: self.require_coordinator(&snapshot.campus, *to_shift, grade)?,
                }))
            }
            DestinationParams::GradeSkip {
                to_grade,
                to_classroom,
            } => {
                require_student(snapshot, TransferKind::GradeSkip)?;
                let (grade, from_classroom) = student_assignment(snapshot)?;
                if *to_grade != grade.next() {
                    return Err(TransferServiceError::Validation(format!(
                        "grade-skip transfers must target {}, one level above {grade}",
                        grade.next()
                    )));
                }
                if let Some(room) = to_classroom {
                    self.require_option(snapshot, &EligibilityScope::GradeSkip, room)?;
                }

                Ok(TransferDetail::GradeSkip(GradeSkipDetail {
                    from_grade: grade,
                    to_grade: *to_grade,
                    from_classroom,
                    to_classroom: to_classroom.clone(),
                    from_coordinator: self.require_coordinator(
                        &snapshot.campus,
                        snapshot.shift,
                        grade,
                    )?,
                    to_coordinator: self.require_coordinator(
                        &snapshot.campus,
                        snapshot.shift,
                        *to_grade,
                    )?,
                }))
            }
            DestinationParams::Campus {
                to_campus,
                to_shift,
                to_classroom,
                skip_grade,
            } => match snapshot.kind {
                EntityKind::Student => self.campus_detail_for_student(
                    snapshot,
                    to_campus,
                    *to_shift,
                    to_classroom.as_ref(),
                    *skip_grade,
                ),
                EntityKind::Teacher => self.campus_detail_for_teacher(
                    snapshot,
                    to_campus,
                    *to_shift,
                    to_classroom.as_ref(),
                    *skip_grade,
                ),
            },
        }
    }

    fn campus_detail_for_student(
        &self,
        snapshot: &EntitySnapshot,
        to_campus: &CampusId,
        to_shift: Shift,
        to_classroom: Option<&ClassroomId>,
        skip_grade: bool,
    ) -> Result<TransferDetail, TransferServiceError> {
        let (grade, _) = student_assignment(snapshot)?;
        let to_grade = if skip_grade { grade.next() } else { grade };

        let Some(room) = to_classroom else {
            return Err(TransferServiceError::Validation(
                "campus transfers for students must name a destination section".to_string(),
            ));
        };
        let scope = EligibilityScope::Campus {
            campus: to_campus.clone(),
            shift: to_shift,
            skip_grade,
        };
        self.require_option(snapshot, &scope, room)?;

        Ok(TransferDetail::Campus(CampusDetail {
            from_campus: snapshot.campus.clone(),
            to_campus: to_campus.clone(),
            from_shift: snapshot.shift,
            to_shift,
            from_grade: Some(grade),
            to_grade: Some(to_grade),
            from_classroom: snapshot.classroom.clone(),
            to_classroom: Some(room.clone()),
            skip_grade,
            from_coordinator: self.require_coordinator(&snapshot.campus, snapshot.shift, grade)?,
            to_coordinator: self.require_coordinator(to_campus, to_shift, to_grade)?,
            from_principal: self.require_principal(&snapshot.campus)?,
            to_principal: self.require_principal(to_campus)?,
        }))
    }

    fn campus_detail_for_teacher(
        &self,
        snapshot: &EntitySnapshot,
        to_campus: &CampusId,
        to_shift: Shift,
        to_classroom: Option<&ClassroomId>,
        skip_grade: bool,
    ) -> Result<TransferDetail, TransferServiceError> {
        if skip_grade {
            return Err(TransferServiceError::Validation(
                "grade fields do not apply to teacher campus transfers".to_string(),
            ));
        }
        if to_classroom.is_some() {
            return Err(TransferServiceError::Validation(
                "teacher campus transfers do not carry a destination section".to_string(),
            ));
        }

        let campus = self.directory.campus(to_campus)?.ok_or_else(|| {
            TransferServiceError::InvalidDestination(format!(
                "campus '{to_campus}' is not registered"
            ))
        })?;
        if !campus.offers(to_shift) {
            return Err(TransferServiceError::InvalidDestination(format!(
                "campus '{}' does not offer the {} shift",
                campus.name,
                to_shift.label()
            )));
        }

        Ok(TransferDetail::Campus(CampusDetail {
            from_campus: snapshot.campus.clone(),
            to_campus: to_campus.clone(),
            from_shift: snapshot.shift,
            to_shift,
            from_grade: None,
            to_grade: None,
            from_classroom: snapshot.classroom.clone(),
            to_classroom: None,
            skip_grade: false,
            from_coordinator: self
                .require_shift_coordinator(&snapshot.campus, snapshot.shift)?,
            to_coordinator: self.require_shift_coordinator(to_campus, to_shift)?,
            from_principal: self.require_principal(&snapshot.campus)?,
            to_principal: self.require_principal(to_campus)?,
        }))
    }

    fn apply_approve_payload(
        &self,
        record: &mut TransferRecord,
        destination_section: Option<&ClassroomId>,
    ) -> Result<(), TransferServiceError> {
        let final_grade_skip_step = matches!(
            record.status,
            TransferStatus::GradeSkip(TwoStepStatus::PendingOtherCoord)
        );

        if let Some(room) = destination_section {
            if !final_grade_skip_step {
                return Err(TransferServiceError::Validation(
                    "a destination section can only be chosen on the final grade-skip approval"
                        .to_string(),
                ));
            }
            let snapshot = self.snapshot(&record.entity.id)?;
            self.require_option(&snapshot, &EligibilityScope::GradeSkip, room)?;
            if let TransferDetail::GradeSkip(detail) = &mut record.detail {
                detail.to_classroom = Some(room.clone());
            }
        }

        if final_grade_skip_step {
            if let TransferDetail::GradeSkip(detail) = &record.detail {
                if detail.to_classroom.is_none() {
                    return Err(TransferServiceError::Validation(
                        "grade-skip transfers need a destination section before the final approval"
                            .to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// The directory write an approval commits, including the regenerated
    /// display identifier. Pure with respect to the store.
    fn assignment_change(
        &self,
        record: &TransferRecord,
    ) -> Result<AssignmentChange, TransferServiceError> {
        let snapshot = self.snapshot(&record.entity.id)?;

        let (campus, shift, grade, classroom) = match &record.detail {
            TransferDetail::Section(detail) => (
                snapshot.campus.clone(),
                snapshot.shift,
                snapshot.grade,
                Some(detail.to_classroom.clone()),
            ),
            TransferDetail::Shift(detail) => (
                snapshot.campus.clone(),
                detail.to_shift,
                snapshot.grade,
                Some(detail.to_classroom.clone()),
            ),
            TransferDetail::GradeSkip(detail) => {
                let Some(room) = detail.to_classroom.clone() else {
                    return Err(TransferServiceError::Validation(
                        "grade-skip transfers need a destination section before the final approval"
                            .to_string(),
                    ));
                };
                (
                    snapshot.campus.clone(),
                    snapshot.shift,
                    Some(detail.to_grade),
                    Some(room),
                )
            }
            TransferDetail::Campus(detail) => (
                detail.to_campus.clone(),
                detail.to_shift,
                detail.to_grade,
                detail.to_classroom.clone(),
            ),
        };

        let campus_record = self.require_campus(&campus)?;
        let new_display_id =
            identifier::regenerate(&snapshot.display_id, &campus_record.code, shift.code())
                .map_err(TransferServiceError::from_identifier)?;

        Ok(AssignmentChange {
            entity: record.entity.clone(),
            campus,
            shift,
            grade,
            classroom,
            new_display_id,
        })
    }

    fn deliver_letter(&self, record: &TransferRecord, change: &AssignmentChange) {
        let mut details = BTreeMap::new();
        details.insert("status".to_string(), record.status.label().to_string());
        details.insert(
            "effective_on".to_string(),
            record.requested_date.to_string(),
        );

        let letter = TransferLetter {
            transfer_id: record.id.clone(),
            kind: record.kind(),
            entity: record.entity.clone(),
            new_display_id: change.new_display_id.clone(),
            details,
        };

        // Fire-and-forget: the transfer is already committed.
        if let Err(error) = self.letters.deliver(letter) {
            warn!(transfer = %record.id, %error, "approved-transfer letter delivery failed");
        }
    }

    fn require_option(
        &self,
        snapshot: &EntitySnapshot,
        scope: &EligibilityScope,
        classroom: &ClassroomId,
    ) -> Result<(), TransferServiceError> {
        let resolver = EligibilityResolver::new(self.directory.as_ref());
        let options = resolver.options(snapshot, scope)?;

        if options.iter().any(|option| option.classroom == *classroom) {
            Ok(())
        } else {
            Err(TransferServiceError::InvalidDestination(format!(
                "classroom '{classroom}' is not in the eligible destination set"
            )))
        }
    }

    fn require_campus(&self, campus: &CampusId) -> Result<CampusRecord, TransferServiceError> {
        self.directory.campus(campus)?.ok_or_else(|| {
            TransferServiceError::Validation(format!("campus '{campus}' is not registered"))
        })
    }

    fn require_coordinator(
        &self,
        campus: &CampusId,
        shift: Shift,
        grade: Grade,
    ) -> Result<PersonId, TransferServiceError> {
        self.directory
            .coordinator_for(campus, shift, grade)?
            .ok_or_else(|| {
                TransferServiceError::Validation(format!(
                    "no coordinator is assigned for {grade} ({}) at campus '{campus}'",
                    shift.label()
                ))
            })
    }

    fn require_shift_coordinator(
        &self,
        campus: &CampusId,
        shift: Shift,
    ) -> Result<PersonId, TransferServiceError> {
        self.directory
            .coordinator_for_shift(campus, shift)?
            .ok_or_else(|| {
                TransferServiceError::Validation(format!(
                    "no {} shift coordinator is assigned at campus '{campus}'",
                    shift.label()
                ))
            })
    }

    fn require_principal(&self, campus: &CampusId) -> Result<PersonId, TransferServiceError> {
        self.directory.principal_for(campus)?.ok_or_else(|| {
            TransferServiceError::Validation(format!(
                "no principal is assigned at campus '{campus}'"
            ))
        })
    }
}

fn validate_reason(reason: &str) -> Result<String, TransferServiceError> {
    let trimmed = reason.trim();
    let length = trimmed.chars().count();
    if (REASON_MIN_CHARS..=REASON_MAX_CHARS).contains(&length) {
        Ok(trimmed.to_string())
    } else {
        Err(TransferServiceError::Validation(format!(
            "reason must be between {REASON_MIN_CHARS} and {REASON_MAX_CHARS} characters, got {length}"
        )))
    }
}

fn require_student(
    snapshot: &EntitySnapshot,
    kind: TransferKind,
) -> Result<(), TransferServiceError> {
    if snapshot.kind == EntityKind::Student {
        Ok(())
    } else {
        Err(TransferServiceError::Validation(format!(
            "{} transfers are limited to students; teachers may only request campus transfers",
            kind.label()
        )))
    }
}

fn student_assignment(
    snapshot: &EntitySnapshot,
) -> Result<(Grade, ClassroomId), TransferServiceError> {
    match (snapshot.grade, snapshot.classroom.clone()) {
        (Some(grade), Some(room)) => Ok((grade, room)),
        _ => Err(TransferServiceError::Validation(format!(
            "entity '{}' has no current grade or classroom assignment",
            snapshot.id
        ))),
    }
}

/// Authorization is a pure function of the record, the required slot, and the
/// acting identity; no ambient role state is consulted.
fn authorize(
    record: &TransferRecord,
    slot: ApproverSlot,
    actor: &Actor,
) -> Result<(), TransferServiceError> {
    let expected = match slot {
        ApproverSlot::Initiator => Some(&record.initiator.person),
        other => record.detail.approver_for(other),
    };

    let holds_identity = expected.map_or(false, |person| *person == actor.person);
    let holds_role = slot
        .required_role()
        .map_or(true, |role| role == actor.role);

    if holds_identity && holds_role {
        Ok(())
    } else {
        Err(TransferServiceError::UnauthorizedTransition {
            actor: actor.person.clone(),
            slot,
        })
    }
}

fn map_swap_error(error: StoreError, id: &TransferId) -> TransferServiceError {
    match error {
        StoreError::NotFound => TransferServiceError::NotFound(id.clone()),
        StoreError::StatusChanged { found } => TransferServiceError::StaleState {
            transfer: id.clone(),
            found,
        },
        StoreError::Assignment(AssignmentError::NoCapacity { classroom }) => {
            TransferServiceError::InvalidDestination(format!(
                "classroom '{classroom}' has no free seat"
            ))
        }
        other => TransferServiceError::Store(other),
    }
}

/// Error raised by the transfer engine. Every failure is typed and surfaced
/// synchronously; `StaleState` is the caller's signal to refetch and retry.
#[derive(Debug, thiserror::Error)]
pub enum TransferServiceError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("invalid destination: {0}")]
    InvalidDestination(String),
    #[error("entity '{entity}' already has an active transfer ({existing})")]
    Conflict {
        entity: EntityId,
        existing: TransferId,
    },
    #[error("transfer '{transfer}' is now '{found}'; refetch and retry")]
    StaleState {
        transfer: TransferId,
        found: TransferStatus,
    },
    #[error("actor '{actor}' does not hold the required '{slot}' approver slot")]
    UnauthorizedTransition { actor: PersonId, slot: ApproverSlot },
    #[error("stored identifier could not be parsed: {0}")]
    MalformedId(#[source] IdentifierError),
    #[error("transfer '{0}' not found")]
    NotFound(TransferId),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error("store failure: {0}")]
    Store(#[source] StoreError),
}

impl TransferServiceError {
    pub fn from_identifier(error: IdentifierError) -> Self {
        match error {
            IdentifierError::Malformed { .. } => TransferServiceError::MalformedId(error),
            IdentifierError::InvalidCode { .. } => {
                TransferServiceError::Validation(error.to_string())
            }
        }
    }
}

impl From<EligibilityError> for TransferServiceError {
    fn from(error: EligibilityError) -> Self {
        match error {
            EligibilityError::MissingAssignment(_) => {
                TransferServiceError::Validation(error.to_string())
            }
            EligibilityError::UnknownCampus(_) => {
                TransferServiceError::InvalidDestination(error.to_string())
            }
            EligibilityError::Directory(inner) => TransferServiceError::Directory(inner),
        }
    }
}
