use crate::error::InputError;
use crate::record::{PhotoRef, BODY_PARTS, DIGITIZERS, INTERACTIONS};
use crate::session::{FormSession, SessionState};
use crate::sheets::RowAppender;
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use std::io::{self, BufRead, Write};
use std::time::Duration;

pub const BANNER: &str = "\
# Jardín Botánico de Bogotá
## Programa Conservación in situ
### Formato de digitalización de interacciones fotográficas.

Digite los datos de una observación. Enter conserva el valor actual y '-' lo borra.
Al terminar los datos serán validados; si existen errores, un mensaje indicará la
naturaleza del error. Los datos erróneos no serán guardados.
";

const MAX_SUGGESTIONS: usize = 5;

enum Answer {
    Keep,
    Clear,
    Value(String),
}

/// Line-oriented form over any input/output pair.
pub struct Form<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Form<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        write!(self.output, "{} ", question)?;
        self.output.flush()?;
        self.read_line()
    }

    /// Prompt one field until `apply` accepts the answer. Returns false on end of input.
    fn field<F>(
        &mut self,
        session: &mut FormSession,
        label: &str,
        help: &str,
        current: Option<String>,
        options: &[String],
        mut apply: F,
    ) -> io::Result<bool>
    where
        F: FnMut(&mut FormSession, Option<&str>) -> Result<(), InputError>,
    {
        writeln!(self.output, "\n{} ({})", label, help)?;
        for (i, option) in options.iter().enumerate() {
            writeln!(self.output, "  {:>2}. {}", i + 1, option)?;
        }
        loop {
            let shown = current.as_deref().unwrap_or("");
            let Some(line) = self.ask(&format!("{} [{}]:", label, shown))? else {
                return Ok(false);
            };
            let answer = match line.as_str() {
                "" => Answer::Keep,
                "-" => Answer::Clear,
                _ => Answer::Value(resolve_choice(&line, options)),
            };
            let result = match &answer {
                Answer::Keep => return Ok(true),
                Answer::Clear => apply(session, None),
                Answer::Value(v) => apply(session, Some(v.as_str())),
            };
            match result {
                Ok(()) => return Ok(true),
                Err(e) => writeln!(self.output, "  {}", e)?,
            }
        }
    }

    fn species_field(
        &mut self,
        session: &mut FormSession,
        label: &str,
        help: &str,
        plant: bool,
    ) -> io::Result<bool> {
        let current = if plant {
            session.record().species_plant.clone()
        } else {
            session.record().species_animal.clone()
        };
        let keep_going = self.field(session, label, help, current, &[], |s, v| {
            if plant {
                s.set_species_plant(v);
            } else {
                s.set_species_animal(v);
            }
            Ok(())
        })?;

        let value = if plant {
            session.record().species_plant.clone()
        } else {
            session.record().species_animal.clone()
        };
        if let Some(value) = value {
            let suggestions = session.lists().suggest_species(&value, MAX_SUGGESTIONS);
            if !suggestions.is_empty() && !suggestions.contains(&value.as_str()) {
                writeln!(self.output, "  Nombres similares en la lista: {}", suggestions.join(", "))?;
            }
        }
        Ok(keep_going)
    }

    /// One pass over every field, keeping the current values as defaults.
    fn fill(&mut self, session: &mut FormSession) -> io::Result<bool> {
        let record = session.record().clone();
        let observers = session.lists().observers();
        let sites = session.lists().sites().to_vec();
        let digitizers = to_owned(&DIGITIZERS);
        let interactions = to_owned(&INTERACTIONS);
        let parts = to_owned(&BODY_PARTS);

        if !self.field(
            session,
            "Fecha",
            "fecha en la cual fue realizada la observación, AAAA-MM-DD",
            record.date.map(|d| d.to_string()),
            &[],
            |s, v| s.set_date_text(v.unwrap_or("")),
        )? {
            return Ok(false);
        }
        if !self.field(
            session,
            "Fotografía",
            "ruta del archivo de la fotografía base de observación",
            record.photo.as_ref().map(|p| p.name.clone()),
            &[],
            |s, v| {
                let photo = v.map(|path| PhotoRef::from_path(path)).transpose()?;
                s.set_photo(photo);
                Ok(())
            },
        )? {
            return Ok(false);
        }
        if !self.field(
            session,
            "Observador",
            "persona que tomó la fotografía",
            record.observer.clone(),
            &observers,
            |s, v| s.set_observer(v),
        )? {
            return Ok(false);
        }
        if !self.field(
            session,
            "Digitalizador",
            "persona que sistematiza la fotografía",
            record.digitizer.clone(),
            &digitizers,
            |s, v| s.set_digitizer(v),
        )? {
            return Ok(false);
        }
        if !self.species_field(session, "Especie de planta", "nombre científico sin autores", true)? {
            return Ok(false);
        }
        if !self.species_field(session, "Especie de animal", "nombre científico sin autores", false)? {
            return Ok(false);
        }
        if !self.field(
            session,
            "Tipo de interacción",
            "tipo de interacción entre las especies",
            record.interaction.clone(),
            &interactions,
            |s, v| s.set_interaction(v),
        )? {
            return Ok(false);
        }
        if !self.field(
            session,
            "Órgano de interacción",
            "órgano morfológico donde se realiza la interacción",
            record.body_part.clone(),
            &parts,
            |s, v| s.set_body_part(v),
        )? {
            return Ok(false);
        }
        if !self.field(
            session,
            "Latitud",
            "formato decimal, e.g. 4.6097",
            record.latitude.map(|v| v.to_string()),
            &[],
            |s, v| s.set_latitude_text(v.unwrap_or("")),
        )? {
            return Ok(false);
        }
        if !self.field(
            session,
            "Longitud",
            "formato decimal, e.g. -74.0817",
            record.longitude.map(|v| v.to_string()),
            &[],
            |s, v| s.set_longitude_text(v.unwrap_or("")),
        )? {
            return Ok(false);
        }

        if sites.is_empty() {
            return Ok(true);
        }
        self.field(
            session,
            "Sitio",
            "alternativa a latitud y longitud",
            record.site.clone(),
            &sites,
            |s, v| s.set_site(v),
        )
    }

    /// Run the form until the user quits or input ends. Returns how many rows were saved.
    pub async fn run<A: RowAppender>(
        &mut self,
        session: &mut FormSession,
        appender: &A,
    ) -> io::Result<usize> {
        writeln!(self.output, "{}", BANNER)?;
        let mut saved = 0;

        'entry: loop {
            if !self.fill(session)? {
                break;
            }

            session.validate();
            if session.state() == SessionState::Rejected {
                writeln!(self.output, "\n{}\n", session.errors())?;
                continue;
            }

            if let Some(preview) = session.preview() {
                writeln!(self.output, "\n{}\n", preview.render())?;
            }
            writeln!(
                self.output,
                "Si los datos arriba son correctos, digite 's' para guardarlos."
            )?;

            loop {
                let Some(choice) =
                    self.ask("¿Guardar? [s = guardar, e = editar, d = descartar, q = salir]:")?
                else {
                    break 'entry;
                };
                match choice.to_lowercase().as_str() {
                    "s" => {}
                    "e" => continue 'entry,
                    "d" => {
                        session.reset();
                        writeln!(self.output, "Observación descartada.")?;
                        continue 'entry;
                    }
                    "q" => break 'entry,
                    _ => continue,
                }

                let worksheet = session.record().digitizer.clone().unwrap_or_default();
                let spinner = spinner(&worksheet);
                let result = session.submit(appender, Local::now().naive_local()).await;
                spinner.finish_and_clear();

                match result {
                    Ok(()) => {
                        saved += 1;
                        writeln!(self.output, "Observación guardada en la hoja '{}'.", worksheet)?;
                        break;
                    }
                    Err(e) => {
                        writeln!(self.output, "Error al guardar: {}", e)?;
                        writeln!(self.output, "Los datos no se han perdido; puede intentar de nuevo.")?;
                    }
                }
            }

            let another = self.ask("¿Digitar otra observación? [s/N]:")?;
            if !matches!(another.as_deref(), Some("s" | "S")) {
                break;
            }
        }

        debug!("Form closed after {} saved observation(s)", saved);
        Ok(saved)
    }
}

fn to_owned(options: &[&str]) -> Vec<String> {
    options.iter().map(|s| s.to_string()).collect()
}

/// Map a 1-based option number to its text; anything else passes through.
fn resolve_choice(line: &str, options: &[String]) -> String {
    line.parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| options.get(i))
        .cloned()
        .unwrap_or_else(|| line.to_string())
}

fn spinner(worksheet: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Guardando en la hoja '{}'...", worksheet));
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
