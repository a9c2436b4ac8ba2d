use crate::error::InputError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};

/// Format of the submission timestamp written to the sheet.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Accepted date formats for typed input. The first one is also the output format.
pub const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

pub const LATITUDE_RANGE: (f64, f64) = (3.725902, 4.838990);
pub const LONGITUDE_RANGE: (f64, f64) = (-74.2248, -73.99194);

/// Number of cells in a submitted row.
pub const ROW_LENGTH: usize = 12;

pub const DEFAULT_OBSERVERS: [&str; 3] = ["Juliana Zuluaga", "Carlos Vargas", "Nelson Salinas"];

pub const DIGITIZERS: [&str; 2] = ["Angela", "Nelson"];

pub const INTERACTIONS: [&str; 12] = [
    "Alelopatía negativa con",
    "Alelopatía positiva con",
    "Anida en",
    "Consume",
    "Crece sobre",
    "Dispersa a",
    "Es simbionte con",
    "Nidifica con",
    "Parasita a",
    "Poliniza a",
    "Interactúa con",
    "Se agrede con",
];

pub const BODY_PARTS: [&str; 19] = [
    "esporangio",
    "esporófilo",
    "flor",
    "néctar",
    "polen",
    "fruto",
    "general",
    "hoja",
    "piel",
    "raíz",
    "savia",
    "sangre",
    "semilla",
    "parte no especificada",
    "sistema digestivo",
    "tallo",
    "hígado",
    "huevo",
    "pulmón",
];

/// The photograph an observation is based on.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoRef {
    pub path: PathBuf,
    pub name: String,
}

impl PhotoRef {
    /// Reference a photo on disk. The file must exist.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, InputError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(InputError::PhotoNotFound(path.display().to_string()));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            path: path.to_path_buf(),
            name,
        })
    }

    /// Reference a photo by name only, without touching the filesystem.
    #[cfg(test)]
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: PathBuf::from(&name),
            name,
        }
    }
}

/// One photographic observation of an ecological interaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationRecord {
    pub date: Option<NaiveDate>,
    pub photo: Option<PhotoRef>,
    pub observer: Option<String>,
    pub digitizer: Option<String>,
    pub species_plant: Option<String>,
    pub species_animal: Option<String>,
    pub interaction: Option<String>,
    pub body_part: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub site: Option<String>,
}

/// A scalar cell of a submitted row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    fn text(value: &Option<String>) -> Self {
        value.clone().map_or(Cell::Empty, Cell::Text)
    }

    fn number(value: Option<f64>) -> Self {
        value.map_or(Cell::Empty, Cell::Number)
    }
}

#[cfg(test)]
impl Cell {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Number(n) => serializer.serialize_f64(*n),
            // An empty string keeps the column in place; null would be skipped.
            Cell::Empty => serializer.serialize_str(""),
        }
    }
}

impl ObservationRecord {
    /// Map the record to its fixed-order sheet row, stamped with `submitted_at`.
    pub fn to_row(&self, submitted_at: NaiveDateTime) -> Vec<Cell> {
        let row = vec![
            Cell::text(&self.date.map(|d| d.format(DATE_FORMATS[0]).to_string())),
            Cell::text(&self.photo.as_ref().map(|p| p.name.clone())),
            Cell::text(&self.observer),
            Cell::text(&self.species_plant),
            Cell::text(&self.species_animal),
            Cell::text(&self.interaction),
            Cell::text(&self.body_part),
            Cell::number(self.latitude),
            Cell::number(self.longitude),
            Cell::text(&self.site),
            Cell::Text(submitted_at.format(TIMESTAMP_FORMAT).to_string()),
            Cell::text(&self.digitizer),
        ];
        debug_assert_eq!(row.len(), ROW_LENGTH);
        row
    }

    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// Parse a typed date in any of the accepted formats.
pub fn parse_date(input: &str) -> Result<NaiveDate, InputError> {
    let input = input.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
        .ok_or_else(|| InputError::InvalidDate(input.to_string()))
}

/// Parse a decimal coordinate, accepting a comma as decimal separator.
pub fn parse_coordinate(input: &str) -> Result<f64, InputError> {
    let input = input.trim();
    input
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| InputError::InvalidNumber(input.to_string()))
}

pub(crate) fn check_range(field: &'static str, value: f64, (min, max): (f64, f64)) -> Result<f64, InputError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(value)
    } else {
        Err(InputError::OutOfRange { field, value, min, max })
    }
}

/// Resolve `value` against a closed list, returning the canonical entry.
pub(crate) fn pick<S: AsRef<str>>(field: &'static str, value: &str, options: &[S]) -> Result<String, InputError> {
    let value = value.trim();
    options
        .iter()
        .map(|o| AsRef::<str>::as_ref(o))
        .find(|o| *o == value)
        .map(str::to_string)
        .ok_or_else(|| InputError::NotInList {
            field,
            value: value.to_string(),
        })
}
