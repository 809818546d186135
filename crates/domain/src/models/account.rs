//! Portal account domain models.
//!
//! Staff and applicant accounts share one shape. Everything that differs
//! between the two (identifier prefix, default photo, photo directory) is
//! resolved through [`AccountVariant::policy`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::password::{meets_minimum_length, MIN_PASSWORD_LENGTH};
use validator::{Validate, ValidationError, ValidationErrors};

use super::identifier::IdNamespace;

/// Role partition of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountVariant {
    Staff,
    Applicant,
}

/// Per-variant policy values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantPolicy {
    pub namespace: IdNamespace,
    /// Image shown when the account has no stored photo.
    pub default_photo: &'static str,
    /// Directory, relative to the upload root, that holds profile photos.
    pub photo_dir: &'static str,
    pub label: &'static str,
}

const STAFF_POLICY: VariantPolicy = VariantPolicy {
    namespace: IdNamespace::Staff,
    default_photo: "assets/images/teacher_default.png",
    photo_dir: "photos/staff",
    label: "Staff",
};

const APPLICANT_POLICY: VariantPolicy = VariantPolicy {
    namespace: IdNamespace::Applicant,
    default_photo: "assets/images/student_default.png",
    photo_dir: "photos/applicants",
    label: "Applicant",
};

impl AccountVariant {
    pub const ALL: [AccountVariant; 2] = [AccountVariant::Staff, AccountVariant::Applicant];

    pub fn policy(&self) -> &'static VariantPolicy {
        match self {
            AccountVariant::Staff => &STAFF_POLICY,
            AccountVariant::Applicant => &APPLICANT_POLICY,
        }
    }

    pub fn namespace(&self) -> IdNamespace {
        self.policy().namespace
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountVariant::Staff => "staff",
            AccountVariant::Applicant => "applicant",
        }
    }
}

impl std::fmt::Display for AccountVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "staff" => Ok(AccountVariant::Staff),
            "applicant" => Ok(AccountVariant::Applicant),
            other => Err(format!("Unknown account variant: {}", other)),
        }
    }
}

/// A registered account of either variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Account {
    pub id: String,
    pub variant: AccountVariant,
    pub full_name: String,
    pub email: String,
    pub photo_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// The stored photo reference, or the variant's default image.
    pub fn resolved_photo(&self) -> String {
        resolve_photo(self.variant, self.photo_path.as_deref())
    }
}

/// Resolves a stored photo reference, falling back to the variant default.
pub fn resolve_photo(variant: AccountVariant, photo_path: Option<&str>) -> String {
    match photo_path.map(str::trim) {
        Some(path) if !path.is_empty() => path.to_string(),
        _ => variant.policy().default_photo.to_string(),
    }
}

/// Public view of an account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AccountResponse {
    pub id: String,
    pub variant: AccountVariant,
    pub full_name: String,
    pub email: String,
    pub photo: String,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        let photo = account.resolved_photo();
        Self {
            id: account.id,
            variant: account.variant,
            full_name: account.full_name,
            email: account.email,
            photo,
            created_at: account.created_at,
        }
    }
}

/// Registration form for either variant.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct RegisterAccountRequest {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    #[validate(length(max = 100, message = "Full name must be at most 100 characters"))]
    pub full_name: String,

    #[validate(custom(function = "shared::validation::validate_email_address"))]
    #[validate(length(max = 255, message = "Email must be at most 255 characters"))]
    pub email: String,

    pub password: String,

    pub confirm_password: String,
}

impl RegisterAccountRequest {
    /// Runs field validation plus the password length and confirmation checks.
    pub fn validate_registration(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        if !meets_minimum_length(&self.password) {
            let mut err = ValidationError::new("length");
            err.message = Some(
                format!(
                    "Password must be at least {} characters",
                    MIN_PASSWORD_LENGTH
                )
                .into(),
            );
            errors.add("password", err);
        }

        if self.password != self.confirm_password {
            let mut err = ValidationError::new("password_mismatch");
            err.message = Some("Passwords do not match".into());
            errors.add("confirm_password", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Email with surrounding whitespace removed, as stored and matched.
    pub fn normalized_email(&self) -> &str {
        self.email.trim()
    }

    pub fn normalized_name(&self) -> &str {
        self.full_name.trim()
    }
}

/// Response after a successful registration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RegisterAccountResponse {
    pub id: String,
    pub variant: AccountVariant,
    pub full_name: String,
    pub email: String,
}
