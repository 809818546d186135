//! Form field validation helpers.
//!
//! Each helper returns a `validator::ValidationError` carrying a
//! user-facing message so that request types can use them through
//! `#[validate(custom(function = ...))]` or call them directly.

use chrono::{NaiveDate, Utc};
use validator::{ValidateEmail, ValidationError};

/// Accepted format for dates submitted through forms.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Rejects values that are empty once surrounding whitespace is removed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(error("blank", "This field is required"))
    } else {
        Ok(())
    }
}

/// Validates the syntax of an email address.
pub fn validate_email_address(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(error("email_required", "Email address is required"));
    }
    if !value.validate_email() {
        return Err(error("email_format", "Please enter a valid email address"));
    }
    Ok(())
}

/// Parses a calendar date in `YYYY-MM-DD` form.
///
/// Impossible dates such as `2013-02-30` are rejected, as are dates in the
/// future.
pub fn parse_date_of_birth(value: &str) -> Result<NaiveDate, ValidationError> {
    let date = NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| error("date_invalid", "Please enter a valid date (YYYY-MM-DD)"))?;

    if date > Utc::now().date_naive() {
        return Err(error("date_future", "Date of birth cannot be in the future"));
    }

    Ok(date)
}

/// Counts the digits of a phone number after dropping common separators.
///
/// Returns `None` if anything other than digits and separators is present.
pub fn phone_digit_count(value: &str) -> Option<usize> {
    let mut digits = 0;
    for c in value.trim().chars() {
        match c {
            '0'..='9' => digits += 1,
            ' ' | '-' | '.' | '(' | ')' | '+' => {}
            _ => return None,
        }
    }
    Some(digits)
}

/// Validates a phone-number-shaped string with a bounded digit count.
pub fn validate_phone_number(
    value: &str,
    min_digits: usize,
    max_digits: usize,
) -> Result<(), ValidationError> {
    match phone_digit_count(value) {
        Some(n) if n >= min_digits && n <= max_digits => Ok(()),
        Some(_) => {
            let mut err = error("phone_length", "");
            err.message = Some(
                if min_digits == max_digits {
                    format!("Contact number must contain exactly {} digits", min_digits)
                } else {
                    format!(
                        "Contact number must contain between {} and {} digits",
                        min_digits, max_digits
                    )
                }
                .into(),
            );
            Err(err)
        }
        None => Err(error(
            "phone_format",
            "Contact number may only contain digits, spaces, dashes and brackets",
        )),
    }
}
