use thiserror::Error;

/// A value rejected while it is being entered into a field.
#[derive(Error, Debug, PartialEq)]
pub enum InputError {
    #[error("'{value}' no es una opción válida para {field}")]
    NotInList { field: &'static str, value: String },

    #[error("{field} fuera de rango: {value} (permitido {min} a {max})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Fecha no reconocida: '{0}' (use AAAA-MM-DD)")]
    InvalidDate(String),

    #[error("Número no reconocido: '{0}'")]
    InvalidNumber(String),

    #[error("No se encontró la fotografía: {0}")]
    PhotoNotFound(String),
}

/// Failure while loading the reference lists.
#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("Failed to read reference file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse reference CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Failure while appending a row to the remote sheet.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("La observación no ha sido validada")]
    NotReady,

    #[error("Fallo de red: {0}")]
    Http(#[from] reqwest::Error),

    #[error("El servicio rechazó la fila ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Destino inválido: {0}")]
    Destination(String),
}
