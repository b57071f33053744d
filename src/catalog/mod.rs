//! Element-set catalog and observer position files.
//!
//! The catalog holds records of exactly three lines: a name followed by the two element
//! lines. Blank lines are ignored. Loading is all-or-nothing.

mod error;

pub use error::CatalogError;

use std::{fs, path::Path, sync::Arc};

use serde::Serialize;
use utoipa::ToSchema;

use crate::predict::{Observer, Sgp4Ephemeris};

/// Raw two-line element text of one satellite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ElementSet {
    pub name: String,
    pub line1: String,
    pub line2: String,
}

#[derive(Clone)]
pub struct CatalogEntry {
    pub elements: ElementSet,
    pub ephemeris: Arc<Sgp4Ephemeris>,
}

impl CatalogEntry {
    pub fn name(&self) -> &str {
        &self.elements.name
    }

    fn from_elements(elements: ElementSet) -> Result<Self, CatalogError> {
        let invalid = |message: String| CatalogError::InvalidElements {
            name: elements.name.clone(),
            message,
        };
        let parsed = sgp4::Elements::from_tle(
            Some(elements.name.clone()),
            elements.line1.as_bytes(),
            elements.line2.as_bytes(),
        )
        .map_err(|e| invalid(e.to_string()))?;
        let ephemeris = Sgp4Ephemeris::from_elements(parsed).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            elements,
            ephemeris: Arc::new(ephemeris),
        })
    }
}

#[derive(Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn parse(text: &str) -> Result<Self, CatalogError> {
        let lines: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim_end()))
            .filter(|(_, l)| !l.trim().is_empty())
            .collect();

        let mut entries = Vec::with_capacity(lines.len() / 3);
        for record in lines.chunks(3) {
            let [(_, name), (_, line1), (number, line2)] = record else {
                let (line, content) = record[record.len() - 1];
                return Err(CatalogError::CorruptCatalog {
                    line,
                    content: content.to_string(),
                });
            };
            if !line2.starts_with('2') {
                return Err(CatalogError::CorruptCatalog {
                    line: *number,
                    content: line2.to_string(),
                });
            }

            entries.push(CatalogEntry::from_elements(ElementSet {
                name: name.trim().to_string(),
                line1: line1.trim().to_string(),
                line2: line2.trim().to_string(),
            })?);
        }

        Ok(Catalog { entries })
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::parse(&text)?;
        log::info!(
            "loaded {} element sets from {}",
            catalog.entries.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact name match, falling back to a case-insensitive one.
    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        let name = name.trim();
        self.entries
            .iter()
            .find(|e| e.name() == name)
            .or_else(|| self.entries.iter().find(|e| e.name().eq_ignore_ascii_case(name)))
    }
}

/// Reads an observer position file: one `"<longitude>,<latitude>"` line.
pub fn load_observer(path: &Path, altitude_m: Option<f64>) -> Result<Observer, CatalogError> {
    let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let first = text.lines().next().unwrap_or_default().trim();
    let observer =
        Observer::from_coordinates(first, altitude_m).ok_or_else(|| CatalogError::InvalidObserver {
            path: path.to_path_buf(),
            content: first.to_string(),
        })?;
    log::debug!(
        "observer at {}, {} from {}",
        observer.longitude_deg,
        observer.latitude_deg,
        path.display()
    );
    Ok(observer)
}
