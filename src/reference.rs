use crate::error::ReferenceError;
use crate::record::DEFAULT_OBSERVERS;
use csv::ReaderBuilder;
use log::info;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const PLANTS: &str = "plantas";
pub const BIRDS: &str = "aves";
pub const INSECTS: &str = "insectos";
pub const OBSERVERS: &str = "observadores";
pub const SITES: &str = "sitios";

const SPECIES_CATEGORIES: [&str; 3] = [PLANTS, BIRDS, INSECTS];

/// Immutable lookup of category name to sorted, deduplicated choices.
///
/// Loaded once at startup and handed to the form; nothing reads the
/// reference file afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceLists {
    categories: BTreeMap<String, Vec<String>>,
    species: Vec<String>,
}

impl ReferenceLists {
    /// Lists available without a reference file: only the default observers.
    pub fn builtin() -> Self {
        Self::from_categories(BTreeMap::new())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ReferenceError> {
        let path = path.as_ref();
        let lists = Self::from_reader(File::open(path)?)?;
        info!(
            "Loaded reference lists from {}: {} species, {} observers, {} sites",
            path.display(),
            lists.species().len(),
            lists.observers().len(),
            lists.sites().len()
        );
        Ok(lists)
    }

    /// Parse a CSV whose header names the categories, one value per cell.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ReferenceError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.to_lowercase())
            .collect();

        let mut sets: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for row in rdr.records() {
            let record = row?;
            for (header, value) in headers.iter().zip(record.iter()) {
                if header.is_empty() || value.is_empty() {
                    continue;
                }
                sets.entry(header.clone())
                    .or_default()
                    .insert(value.to_string());
            }
        }

        let categories = sets
            .into_iter()
            .map(|(name, values)| (name, values.into_iter().collect()))
            .collect();
        Ok(Self::from_categories(categories))
    }

    fn from_categories(categories: BTreeMap<String, Vec<String>>) -> Self {
        let species: BTreeSet<String> = SPECIES_CATEGORIES
            .iter()
            .filter_map(|c| categories.get(*c))
            .flatten()
            .cloned()
            .collect();
        Self {
            categories,
            species: species.into_iter().collect(),
        }
    }

    /// Values of one category, empty when the category is absent.
    pub fn category(&self, name: &str) -> &[String] {
        self.categories
            .get(&name.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Plants, birds and insects merged into one sorted list.
    pub fn species(&self) -> &[String] {
        &self.species
    }

    pub fn observers(&self) -> Vec<String> {
        let listed = self.category(OBSERVERS);
        if listed.is_empty() {
            DEFAULT_OBSERVERS.iter().map(|s| s.to_string()).collect()
        } else {
            listed.to_vec()
        }
    }

    pub fn sites(&self) -> &[String] {
        self.category(SITES)
    }

    /// Species starting with `prefix`, ignoring case.
    pub fn suggest_species(&self, prefix: &str, limit: usize) -> Vec<&str> {
        let prefix = prefix.trim().to_lowercase();
        if prefix.is_empty() {
            return Vec::new();
        }
        self.species
            .iter()
            .filter(|s| s.to_lowercase().starts_with(&prefix))
            .take(limit)
            .map(String::as_str)
            .collect()
    }
}

impl Default for ReferenceLists {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
Plantas,Aves,Insectos,Observadores,Sitios
Espeletia grandiflora,Zonotrichia capensis,Apis mellifera,Nelson Salinas,Parque Nacional
Bidens pilosa,,Bombus atratus,Juliana Zuluaga,Humedal Córdoba
Bidens pilosa,Colibri coruscans,,,
 Acacia decurrens ,,Apis mellifera,,
";

    #[test]
    fn test_builtin_lists() {
        let lists = ReferenceLists::builtin();
        assert!(lists.species().is_empty());
        assert!(lists.sites().is_empty());
        assert_eq!(lists.observers(), DEFAULT_OBSERVERS.to_vec());
    }

    #[test]
    fn test_categories_skip_blanks_and_sort() {
        let lists = ReferenceLists::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(
            lists.category(PLANTS),
            &["Acacia decurrens", "Bidens pilosa", "Espeletia grandiflora"]
        );
        assert_eq!(lists.category("Aves"), &["Colibri coruscans", "Zonotrichia capensis"]);
        assert_eq!(lists.sites(), &["Humedal Córdoba", "Parque Nacional"]);
        assert_eq!(lists.observers(), vec!["Juliana Zuluaga", "Nelson Salinas"]);
        assert!(lists.category("hongos").is_empty());
    }

    #[test]
    fn test_species_merged_and_deduplicated() {
        let lists = ReferenceLists::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(
            lists.species(),
            &[
                "Acacia decurrens",
                "Apis mellifera",
                "Bidens pilosa",
                "Bombus atratus",
                "Colibri coruscans",
                "Espeletia grandiflora",
                "Zonotrichia capensis",
            ]
        );
    }

    #[test]
    fn test_suggest_species() {
        let lists = ReferenceLists::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(lists.suggest_species("b", 10), vec!["Bidens pilosa", "Bombus atratus"]);
        assert_eq!(lists.suggest_species("B", 1), vec!["Bidens pilosa"]);
        assert!(lists.suggest_species("  ", 10).is_empty());
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let lists = ReferenceLists::from_path(file.path()).unwrap();
        assert_eq!(lists.species().len(), 7);

        let missing = ReferenceLists::from_path("no-such-file.csv");
        assert!(matches!(missing, Err(ReferenceError::Io(_))));
    }
}
