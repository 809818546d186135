//! Validation of the personal-details enrollment step.

use serde::Deserialize;
use shared::validation::{parse_date_of_birth, validate_not_blank, validate_phone_number};
use validator::{ValidationError, ValidationErrors};

use crate::models::application::PersonalDetails;

/// Default bounds on guardian contact digits, after separators are stripped.
pub const DEFAULT_CONTACT_MIN_DIGITS: usize = 7;
pub const DEFAULT_CONTACT_MAX_DIGITS: usize = 15;

const MAX_NAME_LENGTH: usize = 100;
const MAX_ADDRESS_LENGTH: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactRule {
    pub min_digits: usize,
    pub max_digits: usize,
}

impl Default for ContactRule {
    fn default() -> Self {
        Self {
            min_digits: DEFAULT_CONTACT_MIN_DIGITS,
            max_digits: DEFAULT_CONTACT_MAX_DIGITS,
        }
    }
}

/// Raw personal-details form values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PersonalDetailsForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: String,
    #[serde(default)]
    pub guardian_name: String,
    #[serde(default)]
    pub guardian_contact: String,
    #[serde(default)]
    pub address: String,
}

fn too_long(max: usize) -> ValidationError {
    let mut err = ValidationError::new("length");
    err.message = Some(format!("Must be at most {} characters", max).into());
    err
}

fn check_text(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
    max: usize,
) {
    if let Err(err) = validate_not_blank(value) {
        errors.add(field, err);
    } else if value.trim().chars().count() > max {
        errors.add(field, too_long(max));
    }
}

impl PersonalDetailsForm {
    /// Validates every field, returning trimmed details or all field errors.
    ///
    /// The photo is handled separately by the caller.
    pub fn validate(&self, contact: ContactRule) -> Result<PersonalDetails, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        check_text(&mut errors, "first_name", &self.first_name, MAX_NAME_LENGTH);
        check_text(&mut errors, "last_name", &self.last_name, MAX_NAME_LENGTH);
        check_text(&mut errors, "guardian_name", &self.guardian_name, MAX_NAME_LENGTH);
        check_text(&mut errors, "address", &self.address, MAX_ADDRESS_LENGTH);

        let date_of_birth = match parse_date_of_birth(&self.date_of_birth) {
            Ok(date) => Some(date),
            Err(err) => {
                errors.add("date_of_birth", err);
                None
            }
        };

        if let Err(err) =
            validate_phone_number(&self.guardian_contact, contact.min_digits, contact.max_digits)
        {
            errors.add("guardian_contact", err);
        }

        match date_of_birth {
            Some(date_of_birth) if errors.is_empty() => Ok(PersonalDetails {
                first_name: self.first_name.trim().to_string(),
                last_name: self.last_name.trim().to_string(),
                date_of_birth,
                guardian_name: self.guardian_name.trim().to_string(),
                guardian_contact: self.guardian_contact.trim().to_string(),
                address: self.address.trim().to_string(),
                photo_path: None,
            }),
            _ => Err(errors),
        }
    }
}
