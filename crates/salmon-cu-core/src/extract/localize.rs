use std::collections::BTreeMap;
use tracing::warn;

use super::query::ResultSet;

/// Coded category value -> translated label. Codes without an entry keep
/// their original value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryMap {
    entries: BTreeMap<String, String>,
}

const STATUS_FR: &[(&str, &str)] = &[
    ("Red", "Rouge"),
    ("Amber", "Ambre"),
    ("Green", "Vert"),
    ("RedAmber", "Rouge/Ambre"),
    ("AmberGreen", "Ambre/Vert"),
    ("DD", "Données insuffisantes"),
    ("Data Deficient", "Données insuffisantes"),
    ("Not Assessed", "Non évalué"),
    ("Extinct", "Disparue"),
];

impl CategoryMap {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Status categories in French.
    pub fn status_fr() -> Self {
        Self::new(STATUS_FR.iter().copied())
    }

    pub fn translate<'a>(&'a self, code: &'a str) -> &'a str {
        self.entries.get(code).map(String::as_str).unwrap_or(code)
    }
}

/// Clean up text in localized columns: non-breaking spaces become plain
/// spaces and stray byte-order marks are dropped.
///
/// A listed column that is absent only produces a warning.
pub fn normalize_localized_text(result: &mut ResultSet, columns: &[&str]) {
    for column in columns {
        let Some(index) = result.column_index(column) else {
            warn!(
                "{}: localized column '{}' not present, left as is",
                result.name, column
            );
            continue;
        };
        for row in result.rows.iter_mut() {
            let cell = &mut row[index];
            if cell.contains(['\u{a0}', '\u{feff}']) {
                *cell = cell
                    .replace('\u{a0}', " ")
                    .replace('\u{feff}', "")
                    .trim()
                    .to_string();
            }
        }
    }
}
