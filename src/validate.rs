use crate::record::ObservationRecord;
use std::fmt;

/// Minimum number of characters a photo filename should have.
pub const MIN_PHOTO_NAME_LEN: usize = 5;

pub const REPORT_HEADER: &str = "Se encontraron los siguientes errores:";

/// One violated constraint of an observation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationIssue {
    MissingDate,
    MissingPhoto,
    ShortPhotoName,
    MissingObserver,
    MissingDigitizer,
    MissingInteraction,
    MissingBodyPart,
    MissingLocation,
}

impl ValidationIssue {
    pub fn message(&self) -> &'static str {
        match self {
            ValidationIssue::MissingDate => "Falta fecha de observación (obligatorio).",
            ValidationIssue::MissingPhoto => "No hay fotografía adjudicada a la observación.",
            ValidationIssue::ShortPhotoName => {
                "El nombre de la fotografía es sospechosamente pequeño."
            }
            ValidationIssue::MissingObserver => "Falta el observador (obligatorio).",
            ValidationIssue::MissingDigitizer => "Falta el digitador (obligatorio).",
            ValidationIssue::MissingInteraction => "Falta el tipo de interacción (obligatorio).",
            ValidationIssue::MissingBodyPart => "Falta el órgano de interacción (obligatorio).",
            ValidationIssue::MissingLocation => {
                "Falta la ubicación: ingrese latitud y longitud, o seleccione un sitio."
            }
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Ordered list of issues found in a record. Empty means the record can be submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Header plus messages separated by blank lines, or an empty string.
    pub fn render(&self) -> String {
        if self.issues.is_empty() {
            return String::new();
        }
        let messages: Vec<&str> = self.issues.iter().map(ValidationIssue::message).collect();
        format!("{}\n\n{}", REPORT_HEADER, messages.join("\n\n"))
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Check every rule against `record`. Rules never short-circuit each other.
pub fn validate(record: &ObservationRecord) -> ValidationReport {
    let mut issues = Vec::new();

    if record.date.is_none() {
        issues.push(ValidationIssue::MissingDate);
    }

    match &record.photo {
        None => issues.push(ValidationIssue::MissingPhoto),
        Some(photo) if photo.name.chars().count() < MIN_PHOTO_NAME_LEN => {
            issues.push(ValidationIssue::ShortPhotoName)
        }
        Some(_) => {}
    }

    if record.observer.is_none() {
        issues.push(ValidationIssue::MissingObserver);
    }
    if record.digitizer.is_none() {
        issues.push(ValidationIssue::MissingDigitizer);
    }
    if record.interaction.is_none() {
        issues.push(ValidationIssue::MissingInteraction);
    }
    if record.body_part.is_none() {
        issues.push(ValidationIssue::MissingBodyPart);
    }

    if record.site.is_none() && !record.has_coordinates() {
        issues.push(ValidationIssue::MissingLocation);
    }

    ValidationReport { issues }
}
