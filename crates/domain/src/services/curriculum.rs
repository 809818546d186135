//! Subject selection rules for the second enrollment step.
//!
//! Lower years take a fixed core plus one language/agriculture choice and
//! one practical choice. Upper years take two core subjects plus a stream
//! and three options from that stream's list.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::models::application::{Stream, YearBand, YearLevel};

pub const LOWER_CORE_SUBJECTS: &[&str] = &[
    "English",
    "Mathematics",
    "Basic Science",
    "Social Science",
    "Commercial Studies",
];

pub const LANGUAGE_OPTIONS: &[&str] = &["Hindi", "Agriculture", "Fijian"];

pub const PRACTICAL_OPTIONS: &[&str] = &[
    "Home Economics",
    "Basic Technology",
    "Applied Technology",
    "Office Technology",
];

pub const UPPER_CORE_SUBJECTS: &[&str] = &["English", "Mathematics"];

pub const ARTS_OPTIONS: &[&str] = &[
    "History",
    "Geography",
    "Economics",
    "Accounting",
    "Literature",
    "Hindi",
    "Fijian",
];

pub const SCIENCE_OPTIONS: &[&str] = &[
    "Physics",
    "Chemistry",
    "Biology",
    "Computer Studies",
    "Geography",
    "Agriculture",
];

/// Number of options an upper-year stream requires.
pub const STREAM_OPTION_COUNT: usize = 3;

pub fn stream_options(stream: Stream) -> &'static [&'static str] {
    match stream {
        Stream::Arts => ARTS_OPTIONS,
        Stream::Science => SCIENCE_OPTIONS,
    }
}

/// Raw subject-selection form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SubjectSelectionRequest {
    #[serde(default)]
    pub year_level: String,
    #[serde(default, alias = "lang")]
    pub language_choice: Option<String>,
    #[serde(default, alias = "prac")]
    pub practical_choice: Option<String>,
    #[serde(default)]
    pub stream: Option<String>,
    #[serde(default)]
    pub stream_options: Vec<String>,
}

/// A validated selection, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectSelection {
    pub year_level: YearLevel,
    pub stream: Option<Stream>,
    pub subjects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CurriculumError {
    #[error("Please select a year level")]
    MissingYearLevel,

    #[error("Unknown year level: {0}")]
    UnknownYearLevel(String),

    #[error("Enrollment for {0} is not open yet")]
    YearLevelNotOpen(YearLevel),

    #[error("Please select a language / agriculture subject")]
    MissingLanguageChoice,

    #[error("Please select a practical subject")]
    MissingPracticalChoice,

    #[error("'{value}' is not an available choice")]
    InvalidChoice { field: &'static str, value: String },

    #[error("Please select a stream (Arts or Science)")]
    MissingStream,

    #[error("Unknown stream: {0}")]
    UnknownStream(String),

    #[error("Please select exactly {expected} stream subjects (got {got})")]
    WrongOptionCount { expected: usize, got: usize },

    #[error("{0} was selected more than once")]
    DuplicateOption(String),
}

impl CurriculumError {
    /// Form field the error belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            CurriculumError::MissingYearLevel
            | CurriculumError::UnknownYearLevel(_)
            | CurriculumError::YearLevelNotOpen(_) => "year_level",
            CurriculumError::MissingLanguageChoice => "language_choice",
            CurriculumError::MissingPracticalChoice => "practical_choice",
            CurriculumError::InvalidChoice { field, .. } => *field,
            CurriculumError::MissingStream | CurriculumError::UnknownStream(_) => "stream",
            CurriculumError::WrongOptionCount { .. } | CurriculumError::DuplicateOption(_) => {
                "stream_options"
            }
        }
    }
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn pick(
    value: Option<&String>,
    options: &[&str],
    field: &'static str,
    missing: CurriculumError,
    errors: &mut Vec<CurriculumError>,
) -> Option<String> {
    match non_blank(value) {
        None => {
            errors.push(missing);
            None
        }
        Some(v) if options.contains(&v) => Some(v.to_string()),
        Some(v) => {
            errors.push(CurriculumError::InvalidChoice {
                field,
                value: v.to_string(),
            });
            None
        }
    }
}

/// Validates a subject selection against the curriculum and the open year levels.
///
/// All problems are reported together.
pub fn select_subjects(
    request: &SubjectSelectionRequest,
    open_year_levels: &[YearLevel],
) -> Result<SubjectSelection, Vec<CurriculumError>> {
    let label = request.year_level.trim();
    if label.is_empty() {
        return Err(vec![CurriculumError::MissingYearLevel]);
    }
    let year_level = YearLevel::from_label(label)
        .ok_or_else(|| vec![CurriculumError::UnknownYearLevel(label.to_string())])?;
    if !open_year_levels.contains(&year_level) {
        return Err(vec![CurriculumError::YearLevelNotOpen(year_level)]);
    }

    let mut errors = Vec::new();
    let selection = match year_level.band() {
        YearBand::Lower => select_lower(request, year_level, &mut errors),
        YearBand::Upper => select_upper(request, year_level, &mut errors),
    };

    match selection {
        Some(selection) if errors.is_empty() => Ok(selection),
        _ => Err(errors),
    }
}

fn select_lower(
    request: &SubjectSelectionRequest,
    year_level: YearLevel,
    errors: &mut Vec<CurriculumError>,
) -> Option<SubjectSelection> {
    let language = pick(
        request.language_choice.as_ref(),
        LANGUAGE_OPTIONS,
        "language_choice",
        CurriculumError::MissingLanguageChoice,
        errors,
    );
    let practical = pick(
        request.practical_choice.as_ref(),
        PRACTICAL_OPTIONS,
        "practical_choice",
        CurriculumError::MissingPracticalChoice,
        errors,
    );

    let (language, practical) = (language?, practical?);
    let mut subjects: Vec<String> = LOWER_CORE_SUBJECTS.iter().map(|s| s.to_string()).collect();
    subjects.push(language);
    subjects.push(practical);

    Some(SubjectSelection {
        year_level,
        stream: None,
        subjects,
    })
}

fn select_upper(
    request: &SubjectSelectionRequest,
    year_level: YearLevel,
    errors: &mut Vec<CurriculumError>,
) -> Option<SubjectSelection> {
    let stream = match non_blank(request.stream.as_ref()) {
        None => {
            errors.push(CurriculumError::MissingStream);
            return None;
        }
        Some(label) => match Stream::from_label(label) {
            Some(stream) => stream,
            None => {
                errors.push(CurriculumError::UnknownStream(label.to_string()));
                return None;
            }
        },
    };

    let allowed = stream_options(stream);
    let chosen: Vec<&str> = request
        .stream_options
        .iter()
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .collect();

    let error_count = errors.len();
    let mut seen = HashSet::new();
    for option in &chosen {
        if !allowed.contains(option) {
            errors.push(CurriculumError::InvalidChoice {
                field: "stream_options",
                value: option.to_string(),
            });
        } else if !seen.insert(*option) {
            errors.push(CurriculumError::DuplicateOption(option.to_string()));
        }
    }
    if chosen.len() != STREAM_OPTION_COUNT {
        errors.push(CurriculumError::WrongOptionCount {
            expected: STREAM_OPTION_COUNT,
            got: chosen.len(),
        });
    }
    if errors.len() > error_count {
        return None;
    }

    let subjects = UPPER_CORE_SUBJECTS
        .iter()
        .copied()
        .chain(chosen)
        .map(str::to_string)
        .collect();

    Some(SubjectSelection {
        year_level,
        stream: Some(stream),
        subjects,
    })
}

/// One year level in the published curriculum.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct YearLevelCatalog {
    pub year_level: YearLevel,
    pub band: YearBand,
    pub open: bool,
}

/// The published curriculum, used by clients to build the selection form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CurriculumCatalog {
    pub year_levels: Vec<YearLevelCatalog>,
    pub lower_core: &'static [&'static str],
    pub language_options: &'static [&'static str],
    pub practical_options: &'static [&'static str],
    pub upper_core: &'static [&'static str],
    pub arts_options: &'static [&'static str],
    pub science_options: &'static [&'static str],
    pub stream_option_count: usize,
}

pub fn catalog(open_year_levels: &[YearLevel]) -> CurriculumCatalog {
    CurriculumCatalog {
        year_levels: YearLevel::ALL
            .into_iter()
            .map(|year_level| YearLevelCatalog {
                year_level,
                band: year_level.band(),
                open: open_year_levels.contains(&year_level),
            })
            .collect(),
        lower_core: LOWER_CORE_SUBJECTS,
        language_options: LANGUAGE_OPTIONS,
        practical_options: PRACTICAL_OPTIONS,
        upper_core: UPPER_CORE_SUBJECTS,
        arts_options: ARTS_OPTIONS,
        science_options: SCIENCE_OPTIONS,
        stream_option_count: STREAM_OPTION_COUNT,
    }
}
