//! Codec for display identifiers of the form
//! `{campusCode}-{shiftCode}-{enrollmentYear}-{sequenceOrRoleSuffix}`,
//! e.g. `C06-M-25-01109` for a student or `C06-M-19-T04` for a teacher.
//!
//! Applying a transfer rewrites the campus and shift tokens and never touches
//! the enrollment year or the trailing suffix. Both operations here are pure;
//! `regenerate` is idempotent for fixed destination codes, which makes the
//! apply step safe to retry.

use serde::Serialize;

pub const ID_DELIMITER: char = '-';

const ID_TOKENS: usize = 4;

/// Structured view of a well-formed display identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayIdParts {
    pub campus_code: String,
    pub shift_code: String,
    /// Two-digit year of first enrollment; never recomputed from the current date.
    pub enrollment_year: String,
    /// Sequence number for students, role tag for staff.
    pub suffix: String,
}

/// Codec failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("identifier '{id}' must contain exactly {ID_TOKENS} '-'-separated tokens, found {found}")]
    Malformed { id: String, found: usize },
    #[error("replacement code '{code}' must be non-empty and free of '{ID_DELIMITER}'")]
    InvalidCode { code: String },
}

/// Split an identifier into its four tokens.
pub fn parse(id: &str) -> Result<DisplayIdParts, IdentifierError> {
    let tokens: Vec<&str> = id.split(ID_DELIMITER).collect();
    if tokens.len() != ID_TOKENS {
        return Err(IdentifierError::Malformed {
            id: id.to_string(),
            found: tokens.len(),
        });
    }

    Ok(DisplayIdParts {
        campus_code: tokens[0].to_string(),
        shift_code: tokens[1].to_string(),
        enrollment_year: tokens[2].to_string(),
        suffix: tokens[3].to_string(),
    })
}

/// Rewrite the campus and shift tokens, preserving year and suffix verbatim.
pub fn regenerate(
    old_id: &str,
    campus_code: &str,
    shift_code: &str,
) -> Result<String, IdentifierError> {
    check_code(campus_code)?;
    check_code(shift_code)?;

    let parts = parse(old_id)?;
    Ok(format!(
        "{campus_code}{ID_DELIMITER}{shift_code}{ID_DELIMITER}{}{ID_DELIMITER}{}",
        parts.enrollment_year, parts.suffix
    ))
}

/// The identifier change a pending transfer would apply, without committing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdChangePreview {
    pub old_id: String,
    pub new_id: String,
    pub campus_code: String,
    pub shift_code: String,
    pub enrollment_year: String,
    pub suffix: String,
}

/// Run the regeneration computation and report the resulting tokens side by side.
pub fn preview(
    old_id: &str,
    campus_code: &str,
    shift_code: &str,
) -> Result<IdChangePreview, IdentifierError> {
    let new_id = regenerate(old_id, campus_code, shift_code)?;
    let parts = parse(&new_id)?;

    Ok(IdChangePreview {
        old_id: old_id.to_string(),
        new_id,
        campus_code: parts.campus_code,
        shift_code: parts.shift_code,
        enrollment_year: parts.enrollment_year,
        suffix: parts.suffix,
    })
}

fn check_code(code: &str) -> Result<(), IdentifierError> {
    if code.is_empty() || code.contains(ID_DELIMITER) {
        return Err(IdentifierError::InvalidCode {
            code: code.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regenerate_replaces_codes_and_preserves_tail() {
        let new_id = regenerate("C06-M-25-01109", "C09", "A").expect("valid id");
        assert_eq!(new_id, "C09-A-25-01109");

        let parts = parse(&new_id).expect("round trip");
        assert_eq!(parts.enrollment_year, "25");
        assert_eq!(parts.suffix, "01109");
    }

    #[test]
    fn regenerate_is_idempotent_for_fixed_destination() {
        let once = regenerate("C06-M-25-01109", "C09", "A").expect("first pass");
        let twice = regenerate(&once, "C09", "A").expect("second pass");
        assert_eq!(once, twice);
    }

    #[test]
    fn role_suffixes_survive_regeneration() {
        let new_id = regenerate("C06-M-19-T04", "C11", "M").expect("teacher id");
        assert_eq!(new_id, "C11-M-19-T04");
    }

    #[test]
    fn wrong_token_count_is_malformed() {
        for bad in ["C06-M-25", "C06-M-25-01109-EXTRA", "", "plain"] {
            match regenerate(bad, "C09", "A") {
                Err(IdentifierError::Malformed { id, .. }) => assert_eq!(id, bad),
                other => panic!("expected malformed id for '{bad}', got {other:?}"),
            }
        }
    }

    #[test]
    fn replacement_codes_must_be_clean() {
        assert!(matches!(
            regenerate("C06-M-25-01109", "", "A"),
            Err(IdentifierError::InvalidCode { .. })
        ));
        assert!(matches!(
            regenerate("C06-M-25-01109", "C-09", "A"),
            Err(IdentifierError::InvalidCode { .. })
        ));
    }

    #[test]
    fn preview_reports_old_and_new_side_by_side() {
        let preview = preview("C06-M-25-01109", "C09", "A").expect("previewable");
        assert_eq!(preview.old_id, "C06-M-25-01109");
        assert_eq!(preview.new_id, "C09-A-25-01109");
        assert_eq!(preview.campus_code, "C09");
        assert_eq!(preview.shift_code, "A");
        assert_eq!(preview.enrollment_year, "25");
        assert_eq!(preview.suffix, "01109");
    }
}
