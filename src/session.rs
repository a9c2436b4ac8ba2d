use crate::error::{InputError, SubmitError};
use crate::record::{
    check_range, parse_coordinate, parse_date, pick, ObservationRecord, PhotoRef, BODY_PARTS,
    DIGITIZERS, INTERACTIONS, LATITUDE_RANGE, LONGITUDE_RANGE,
};
use crate::reference::ReferenceLists;
use crate::sheets::RowAppender;
use crate::validate::{validate, ValidationReport};
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, error, info, warn};

/// Where the session stands in the validate / preview / submit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Editing,
    Rejected,
    Previewing,
    Submitted,
}

/// Read-only view of the values about to be submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub lines: Vec<(&'static str, String)>,
}

impl Preview {
    fn of(record: &ObservationRecord) -> Self {
        let mut lines = Vec::new();
        let mut push = |label: &'static str, value: Option<String>| {
            if let Some(v) = value {
                lines.push((label, v));
            }
        };
        push("Fecha observación", record.date.map(|d| d.to_string()));
        push("Nombre de la fotografía", record.photo.as_ref().map(|p| p.name.clone()));
        push("Observador", record.observer.clone());
        push("Digitador", record.digitizer.clone());
        push("Especie 1", record.species_plant.clone());
        push("Especie 2", record.species_animal.clone());
        push("Interacción", record.interaction.clone());
        push("Órgano", record.body_part.clone());
        push("Latitud", record.latitude.map(|v| format!("{:?}", v)));
        push("Longitud", record.longitude.map(|v| format!("{:?}", v)));
        push("Sitio", record.site.clone());
        Self { lines }
    }

    pub fn render(&self) -> String {
        self.lines
            .iter()
            .map(|(label, value)| format!("{}: '{}'", label, value))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One digitizer's in-progress observation plus the outcome of the last validation.
pub struct FormSession {
    lists: ReferenceLists,
    record: ObservationRecord,
    errors: String,
    state: SessionState,
}

fn blank_to_none(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

impl FormSession {
    pub fn new(lists: ReferenceLists) -> Self {
        Self {
            lists,
            record: ObservationRecord::default(),
            errors: String::new(),
            state: SessionState::Editing,
        }
    }

    pub fn lists(&self) -> &ReferenceLists {
        &self.lists
    }

    pub fn record(&self) -> &ObservationRecord {
        &self.record
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Rendered report of the last validation pass.
    pub fn errors(&self) -> &str {
        &self.errors
    }

    #[cfg(test)]
    pub fn submitted(&self) -> bool {
        self.state == SessionState::Submitted
    }

    /// Discard the record and any validation outcome.
    pub fn reset(&mut self) {
        self.record = ObservationRecord::default();
        self.errors.clear();
        self.state = SessionState::Editing;
    }

    fn edit<T>(&mut self, apply: impl FnOnce(&mut ObservationRecord) -> T) -> T {
        let out = apply(&mut self.record);
        self.state = SessionState::Editing;
        out
    }

    pub fn set_date(&mut self, date: Option<NaiveDate>) {
        self.edit(|r| r.date = date);
    }

    /// Parse typed text into the date field; blank clears it.
    pub fn set_date_text(&mut self, text: &str) -> Result<(), InputError> {
        let date = blank_to_none(text).map(parse_date).transpose()?;
        self.set_date(date);
        Ok(())
    }

    pub fn set_photo(&mut self, photo: Option<PhotoRef>) {
        self.edit(|r| r.photo = photo);
    }

    pub fn set_observer(&mut self, value: Option<&str>) -> Result<(), InputError> {
        let observer = value
            .and_then(blank_to_none)
            .map(|v| pick("Observador", v, &self.lists.observers()))
            .transpose()?;
        self.edit(|r| r.observer = observer);
        Ok(())
    }

    pub fn set_digitizer(&mut self, value: Option<&str>) -> Result<(), InputError> {
        let digitizer = value
            .and_then(blank_to_none)
            .map(|v| pick("Digitador", v, &DIGITIZERS))
            .transpose()?;
        self.edit(|r| r.digitizer = digitizer);
        Ok(())
    }

    pub fn set_species_plant(&mut self, value: Option<&str>) {
        let species = value.and_then(blank_to_none).map(str::to_string);
        self.edit(|r| r.species_plant = species);
    }

    pub fn set_species_animal(&mut self, value: Option<&str>) {
        let species = value.and_then(blank_to_none).map(str::to_string);
        self.edit(|r| r.species_animal = species);
    }

    pub fn set_interaction(&mut self, value: Option<&str>) -> Result<(), InputError> {
        let interaction = value
            .and_then(blank_to_none)
            .map(|v| pick("Tipo de interacción", v, &INTERACTIONS))
            .transpose()?;
        self.edit(|r| r.interaction = interaction);
        Ok(())
    }

    pub fn set_body_part(&mut self, value: Option<&str>) -> Result<(), InputError> {
        let part = value
            .and_then(blank_to_none)
            .map(|v| pick("Órgano de interacción", v, &BODY_PARTS))
            .transpose()?;
        self.edit(|r| r.body_part = part);
        Ok(())
    }

    pub fn set_latitude(&mut self, value: Option<f64>) -> Result<(), InputError> {
        let lat = value
            .map(|v| check_range("Latitud", v, LATITUDE_RANGE))
            .transpose()?;
        self.edit(|r| r.latitude = lat);
        Ok(())
    }

    pub fn set_longitude(&mut self, value: Option<f64>) -> Result<(), InputError> {
        let lon = value
            .map(|v| check_range("Longitud", v, LONGITUDE_RANGE))
            .transpose()?;
        self.edit(|r| r.longitude = lon);
        Ok(())
    }

    pub fn set_latitude_text(&mut self, text: &str) -> Result<(), InputError> {
        let lat = blank_to_none(text).map(parse_coordinate).transpose()?;
        self.set_latitude(lat)
    }

    pub fn set_longitude_text(&mut self, text: &str) -> Result<(), InputError> {
        let lon = blank_to_none(text).map(parse_coordinate).transpose()?;
        self.set_longitude(lon)
    }

    pub fn set_site(&mut self, value: Option<&str>) -> Result<(), InputError> {
        let site = value
            .and_then(blank_to_none)
            .map(|v| pick("Sitio", v, self.lists.sites()))
            .transpose()?;
        self.edit(|r| r.site = site);
        Ok(())
    }

    /// Validate the current record and store the rendered report.
    ///
    /// Always withdraws any previous submission; only a clean pass opens the preview.
    pub fn validate(&mut self) -> ValidationReport {
        self.errors.clear();
        let report = validate(&self.record);
        self.errors = report.render();
        if report.is_clean() {
            info!("Observation validated");
            self.state = SessionState::Previewing;
        } else {
            info!("Observation rejected with {} issue(s)", report.issues().len());
            self.state = SessionState::Rejected;
        }
        report
    }

    pub fn preview(&self) -> Option<Preview> {
        (self.state == SessionState::Previewing).then(|| Preview::of(&self.record))
    }

    /// Append the validated record to the digitizer's worksheet.
    ///
    /// On failure the record and the preview state are kept so the same
    /// observation can be sent again.
    pub async fn submit<A: RowAppender>(
        &mut self,
        appender: &A,
        now: NaiveDateTime,
    ) -> Result<(), SubmitError> {
        if self.state != SessionState::Previewing {
            warn!("Submit requested in state {:?}", self.state);
            return Err(SubmitError::NotReady);
        }
        let worksheet = self.record.digitizer.clone().ok_or(SubmitError::NotReady)?;
        let row = self.record.to_row(now);
        if let Some(photo) = &self.record.photo {
            debug!("Photo file {}", photo.path.display());
        }

        info!("Submitting observation to worksheet '{}'", worksheet);
        if let Err(e) = appender.append_row(&worksheet, &row).await {
            error!("Submission to '{}' failed: {}", worksheet, e);
            return Err(e);
        }

        self.record = ObservationRecord::default();
        self.errors.clear();
        self.state = SessionState::Submitted;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Cell, ROW_LENGTH};
    use crate::validate::ValidationIssue;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemorySheet {
        rows: Mutex<Vec<(String, Vec<Cell>)>>,
        fail: bool,
    }

    impl RowAppender for MemorySheet {
        async fn append_row(&self, worksheet: &str, row: &[Cell]) -> Result<(), SubmitError> {
            if self.fail {
                return Err(SubmitError::Rejected {
                    status: 400,
                    message: format!("Unable to parse range: '{}'!A1", worksheet),
                });
            }
            self.rows
                .lock()
                .unwrap()
                .push((worksheet.to_string(), row.to_vec()));
            Ok(())
        }
    }

    fn lists() -> ReferenceLists {
        ReferenceLists::from_reader("Sitios\nParque Nacional\n".as_bytes()).unwrap()
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap()
    }

    fn filled() -> FormSession {
        let mut session = FormSession::new(lists());
        session.set_date_text("2024-05-01").unwrap();
        session.set_photo(Some(PhotoRef::named("img1.jpg")));
        session.set_observer(Some("Nelson Salinas")).unwrap();
        session.set_digitizer(Some("Nelson")).unwrap();
        session.set_interaction(Some("Poliniza a")).unwrap();
        session.set_body_part(Some("flor")).unwrap();
        session.set_latitude(Some(3.9)).unwrap();
        session.set_longitude(Some(-74.0)).unwrap();
        session
    }

    #[tokio::test]
    async fn test_valid_observation_is_submitted() {
        let mut session = filled();
        assert!(session.validate().is_clean());
        assert_eq!(session.errors(), "");
        assert_eq!(session.state(), SessionState::Previewing);

        let sheet = MemorySheet::default();
        session.submit(&sheet, now()).await.unwrap();

        let rows = sheet.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        let (worksheet, row) = &rows[0];
        assert_eq!(worksheet, "Nelson");
        assert_eq!(row.len(), ROW_LENGTH);
        assert_eq!(row[8].as_number(), Some(-74.0));
        assert_eq!(row[10].as_text(), Some("2024-05-01 09:15:00"));

        assert!(session.submitted());
        assert_eq!(session.record(), &ObservationRecord::default());
    }

    #[tokio::test]
    async fn test_empty_form_is_withheld() {
        let mut session = FormSession::new(lists());
        let report = session.validate();
        assert_eq!(report.issues().len(), 7);
        assert_eq!(session.state(), SessionState::Rejected);
        assert!(session.errors().starts_with(crate::validate::REPORT_HEADER));
        assert!(session.preview().is_none());

        let sheet = MemorySheet::default();
        let result = session.submit(&sheet, now()).await;
        assert!(matches!(result, Err(SubmitError::NotReady)));
        assert!(sheet.rows.lock().unwrap().is_empty());
    }

    #[test]
    fn test_site_without_coordinates_passes() {
        let mut session = filled();
        session.set_latitude(None).unwrap();
        session.set_longitude(None).unwrap();
        session.set_site(Some("Parque Nacional")).unwrap();
        assert!(session.validate().is_clean());
    }

    #[tokio::test]
    async fn test_failed_append_keeps_record() {
        let mut session = filled();
        session.validate();
        let before = session.record().clone();

        let broken = MemorySheet {
            fail: true,
            ..Default::default()
        };
        let result = session.submit(&broken, now()).await;
        assert!(matches!(result, Err(SubmitError::Rejected { status: 400, .. })));
        assert_eq!(session.record(), &before);
        assert_eq!(session.state(), SessionState::Previewing);
        assert!(!session.submitted());

        let sheet = MemorySheet::default();
        session.submit(&sheet, now()).await.unwrap();
        assert_eq!(sheet.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_edit_after_validation_requires_revalidation() {
        let mut session = filled();
        session.validate();
        session.set_species_plant(Some("Bidens pilosa"));
        assert_eq!(session.state(), SessionState::Editing);
        assert!(session.preview().is_none());

        let sheet = MemorySheet::default();
        assert!(matches!(
            session.submit(&sheet, now()).await,
            Err(SubmitError::NotReady)
        ));
    }

    #[test]
    fn test_validate_clears_previous_errors() {
        let mut session = FormSession::new(lists());
        session.validate();
        assert!(!session.errors().is_empty());

        let mut session = filled();
        session.set_date(None);
        session.validate();
        let first = session.errors().to_string();
        session.validate();
        assert_eq!(session.errors(), first);
        assert!(first.contains(ValidationIssue::MissingDate.message()));

        session.set_date_text("01/05/2024").unwrap();
        assert!(session.validate().is_clean());
        assert_eq!(session.errors(), "");
    }

    #[test]
    fn test_setters_reject_values_outside_lists() {
        let mut session = FormSession::new(lists());
        assert!(session.set_digitizer(Some("Carlos")).is_err());
        assert!(session.set_interaction(Some("Come")).is_err());
        assert!(session.set_site(Some("Otro lugar")).is_err());
        assert!(session.set_latitude(Some(10.0)).is_err());
        assert!(session.set_longitude_text("-73.5").is_err());
        assert!(session.set_latitude_text("norte").is_err());
        assert_eq!(session.record(), &ObservationRecord::default());

        session.set_observer(Some("  ")).unwrap();
        assert_eq!(session.record().observer, None);
    }

    #[test]
    fn test_preview_lists_present_values() {
        let mut session = filled();
        session.set_species_animal(Some("Apis mellifera"));
        session.validate();
        let preview = session.preview().unwrap();
        let labels: Vec<&str> = preview.lines.iter().map(|(l, _)| *l).collect();
        assert_eq!(
            labels,
            vec![
                "Fecha observación",
                "Nombre de la fotografía",
                "Observador",
                "Digitador",
                "Especie 2",
                "Interacción",
                "Órgano",
                "Latitud",
                "Longitud",
            ]
        );
        let rendered = preview.render();
        assert!(rendered.contains("Latitud: '3.9'"));
        assert!(rendered.contains("Longitud: '-74.0'"));
    }
}
