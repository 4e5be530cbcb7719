use rusqlite::types::Value;
use rusqlite::params_from_iter;
use tracing::{debug, warn};

use super::localize::{normalize_localized_text, CategoryMap};
use crate::error::Error;
use crate::storage::sqlite::quote_ident;
use crate::storage::Database;

pub const UNIT_CODE: &str = "CU_INDEX";
pub const SPECIES: &str = "SPECIES";
pub const LIFE_HISTORY: &str = "LH_TYPE";

pub const TRANSLATION_TABLE: &str = "region_translations";
pub const TRANSLATION_KEY: &str = "LABEL_EN";
pub const TRANSLATION_VALUE: &str = "LABEL_FR";

pub const LOCALIZED_NAMES_TABLE: &str = "cu_names_fr";
pub const LOCALIZED_NAME: &str = "CU_NAME_FR";

/// Which rows of a source table a query keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeciesGroup {
    pub code: &'static str,
    pub name: &'static str,
    pub species: &'static str,
    pub life_history: Option<&'static str>,
    /// Explicit unit codes to keep; all codes of the species when `None`.
    pub include: Option<&'static [&'static str]>,
    /// Length of the unit-code prefix used as the species qualifier.
    pub prefix_len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// A column of the source table, unchanged.
    Source(&'static str),
    /// First `prefix_len` characters of the unit code.
    Qualifier,
    /// A source column replaced by its translated label, when one exists.
    Translated(&'static str),
    /// The localized CU name.
    LocalizedName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputColumn {
    pub column: Column,
    pub alias: &'static str,
}

pub const fn col(column: Column, alias: &'static str) -> OutputColumn {
    OutputColumn { column, alias }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Localization {
    /// Output column whose coded values go through `categories`.
    pub category_column: Option<&'static str>,
    pub categories: CategoryMap,
    /// Output columns cleaned by the localized-text step.
    pub text_columns: Vec<&'static str>,
}

/// One named projection of a source table for one species group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub name: String,
    pub title: String,
    pub table: &'static str,
    pub group: SpeciesGroup,
    pub columns: Vec<OutputColumn>,
    pub localization: Option<Localization>,
    /// Join conditions not yet confirmed against real exports.
    pub needs_validation: bool,
}

impl QuerySpec {
    /// The query name, or the sanitized title when the name is blank.
    pub fn file_stem(&self) -> String {
        if self.name.trim().is_empty() {
            super::output::sanitize_file_stem(&self.title)
        } else {
            self.name.clone()
        }
    }

    fn uses(&self, wanted: fn(&Column) -> bool) -> bool {
        self.columns.iter().any(|c| wanted(&c.column))
    }

    /// Source-table columns the query reads.
    pub fn required_columns(&self) -> Vec<&'static str> {
        let mut required = vec![UNIT_CODE, SPECIES];
        if self.group.life_history.is_some() {
            required.push(LIFE_HISTORY);
        }
        for output in &self.columns {
            if let Column::Source(name) | Column::Translated(name) = output.column {
                if !required.contains(&name) {
                    required.push(name);
                }
            }
        }
        required
    }

    /// Every table the query touches, with the columns it needs from each.
    pub fn required_tables(&self) -> Vec<(&'static str, Vec<&'static str>)> {
        let mut tables = vec![(self.table, self.required_columns())];
        if self.uses(|c| matches!(c, Column::Translated(_))) {
            tables.push((TRANSLATION_TABLE, vec![TRANSLATION_KEY, TRANSLATION_VALUE]));
        }
        if self.uses(|c| matches!(c, Column::LocalizedName)) {
            tables.push((LOCALIZED_NAMES_TABLE, vec![UNIT_CODE, LOCALIZED_NAME]));
        }
        tables
    }

    /// SQL text plus positional parameters.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let select = self
            .columns
            .iter()
            .map(|output| {
                let expr = match output.column {
                    Column::Source(name) => format!("s.{}", quote_ident(name)),
                    Column::Qualifier => format!(
                        "substr(s.{}, 1, {})",
                        quote_ident(UNIT_CODE),
                        self.group.prefix_len
                    ),
                    Column::Translated(name) => format!(
                        "COALESCE(t.{}, s.{})",
                        quote_ident(TRANSLATION_VALUE),
                        quote_ident(name)
                    ),
                    Column::LocalizedName => format!("n.{}", quote_ident(LOCALIZED_NAME)),
                };
                format!("{} AS {}", expr, quote_ident(output.alias))
            })
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!("SELECT {} FROM {} s", select, quote_ident(self.table));

        let translated = self.columns.iter().find_map(|c| match c.column {
            Column::Translated(name) => Some(name),
            _ => None,
        });
        if let Some(name) = translated {
            sql.push_str(&format!(
                " LEFT JOIN {} t ON t.{} = s.{}",
                quote_ident(TRANSLATION_TABLE),
                quote_ident(TRANSLATION_KEY),
                quote_ident(name)
            ));
        }
        if self.uses(|c| matches!(c, Column::LocalizedName)) {
            sql.push_str(&format!(
                " LEFT JOIN {} n ON n.{code} = s.{code}",
                quote_ident(LOCALIZED_NAMES_TABLE),
                code = quote_ident(UNIT_CODE)
            ));
        }

        let mut params = vec![Value::Text(self.group.species.to_string())];
        sql.push_str(&format!(" WHERE s.{} = ?", quote_ident(SPECIES)));

        if let Some(life_history) = self.group.life_history {
            sql.push_str(&format!(" AND s.{} = ?", quote_ident(LIFE_HISTORY)));
            params.push(Value::Text(life_history.to_string()));
        }

        if let Some(include) = self.group.include {
            if include.is_empty() {
                sql.push_str(" AND 0");
            } else {
                let marks = vec!["?"; include.len()].join(", ");
                sql.push_str(&format!(" AND s.{} IN ({})", quote_ident(UNIT_CODE), marks));
                params.extend(include.iter().map(|code| Value::Text(code.to_string())));
            }
        }

        sql.push_str(&format!(" ORDER BY s.{} ASC", quote_ident(UNIT_CODE)));
        (sql, params)
    }
}

/// Rows produced by one query, already renamed and sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultSet {
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    pub fn column(&self, header: &str) -> Option<Vec<&str>> {
        let index = self.column_index(header)?;
        Some(self.rows.iter().map(|row| row[index].as_str()).collect())
    }
}

/// Check the schema, run the filter/projection, then apply any localization.
pub fn run_query(db: &Database, spec: &QuerySpec) -> Result<ResultSet, Error> {
    for (table, required) in spec.required_tables() {
        let missing = db.missing_columns(table, &required)?;
        if !missing.is_empty() {
            return Err(Error::MissingColumns {
                table: table.to_string(),
                columns: missing,
            });
        }
    }

    let (sql, params) = spec.to_sql();
    debug!("{}: {}", spec.name, sql);

    let mut stmt = db.connection().prepare(&sql)?;
    let width = spec.columns.len();
    let rows = stmt
        .query_map(params_from_iter(params.iter()), |row| {
            (0..width)
                .map(|i| row.get::<_, Option<String>>(i).map(Option::unwrap_or_default))
                .collect::<rusqlite::Result<Vec<String>>>()
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut result = ResultSet {
        name: spec.file_stem(),
        headers: spec.columns.iter().map(|c| c.alias.to_string()).collect(),
        rows,
    };

    if let Some(localization) = &spec.localization {
        match localization
            .category_column
            .and_then(|header| result.column_index(header))
        {
            Some(index) => {
                for row in result.rows.iter_mut() {
                    let translated = localization.categories.translate(&row[index]).to_string();
                    row[index] = translated;
                }
            }
            None => {
                if let Some(header) = localization.category_column {
                    warn!("{}: category column '{}' not in output", spec.name, header);
                }
            }
        }
        normalize_localized_text(&mut result, &localization.text_columns);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Table;

    const PINK_EVEN: SpeciesGroup = SpeciesGroup {
        code: "PKE",
        name: "Pink Even Year",
        species: "Pink",
        life_history: Some("Even Year"),
        include: None,
        prefix_len: 3,
    };

    fn status_table() -> Table {
        let mut table = Table::new(
            "cu_status",
            ["CU_INDEX", "CU_NAME", "SPECIES", "LH_TYPE", "REGION", "STATUS"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        table.push_row(["PKE-03", "Nass-Skeena Even", "Pink", "Even Year", "Skeena", "Green"]);
        table.push_row(["PKE-01", "Fraser Even", "Pink", "Even Year", "Fraser", "DD"]);
        table.push_row(["PKO-01", "Fraser Odd", "Pink", "Odd Year", "Fraser", "Green"]);
        table.push_row(["CK-01", "Lower Fraser", "Chinook", "", "Fraser", "Red"]);
        table
    }

    fn db() -> Database {
        let mut db = Database::open_in_memory().unwrap();
        db.load_table(&status_table()).unwrap();
        db
    }

    fn spec(group: SpeciesGroup) -> QuerySpec {
        QuerySpec {
            name: format!("{}_CU_STATUS_En", group.code),
            title: format!("{} status", group.name),
            table: "cu_status",
            group,
            columns: vec![
                col(Column::Source("CU_INDEX"), "cu_index"),
                col(Column::Qualifier, "species_qualified"),
                col(Column::Source("STATUS"), "status"),
            ],
            localization: None,
            needs_validation: false,
        }
    }

    #[test]
    fn test_pink_even_sorted_with_qualifier() {
        let result = run_query(&db(), &spec(PINK_EVEN)).unwrap();
        assert_eq!(result.headers, vec!["cu_index", "species_qualified", "status"]);
        assert_eq!(result.column("cu_index").unwrap(), vec!["PKE-01", "PKE-03"]);
        assert_eq!(result.column("species_qualified").unwrap(), vec!["PKE", "PKE"]);
    }

    #[test]
    fn test_include_list_restricts_codes() {
        static CODES: &[&str] = &["PKE-03", "PKO-01"];
        let group = SpeciesGroup {
            include: Some(CODES),
            life_history: None,
            ..PINK_EVEN
        };
        let result = run_query(&db(), &spec(group)).unwrap();
        assert_eq!(result.column("cu_index").unwrap(), vec!["PKE-03", "PKO-01"]);
    }

    #[test]
    fn test_missing_columns_fail_fast() {
        let mut query = spec(PINK_EVEN);
        query.columns.push(col(Column::Source("STATUS_YEAR"), "status_year"));
        query.columns.push(col(Column::Source("TREND"), "trend"));
        match run_query(&db(), &query) {
            Err(Error::MissingColumns { table, columns }) => {
                assert_eq!(table, "cu_status");
                assert_eq!(columns, vec!["STATUS_YEAR".to_string(), "TREND".to_string()]);
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_localized_variant_joins_and_maps_categories() {
        let mut db = db();
        let mut translations = Table::new(
            TRANSLATION_TABLE,
            vec![TRANSLATION_KEY.into(), TRANSLATION_VALUE.into()],
        );
        translations.push_row(["Fraser", "Fleuve Fraser"]);
        db.load_table(&translations).unwrap();

        let mut names = Table::new(
            LOCALIZED_NAMES_TABLE,
            vec![UNIT_CODE.into(), LOCALIZED_NAME.into()],
        );
        names.push_row(["PKE-01", "Fraser\u{a0}pair"]);
        db.load_table(&names).unwrap();

        let query = QuerySpec {
            name: "PKE_CU_STATUS_Fr".into(),
            title: "Pink even status (French)".into(),
            table: "cu_status",
            group: PINK_EVEN,
            columns: vec![
                col(Column::Source("CU_INDEX"), "indice_uc"),
                col(Column::LocalizedName, "nom_uc"),
                col(Column::Translated("REGION"), "region"),
                col(Column::Source("STATUS"), "statut"),
            ],
            localization: Some(Localization {
                category_column: Some("statut"),
                categories: CategoryMap::status_fr(),
                text_columns: vec!["nom_uc", "region", "statut"],
            }),
            needs_validation: true,
        };

        let result = run_query(&db, &query).unwrap();
        assert_eq!(result.column("nom_uc").unwrap(), vec!["Fraser pair", ""]);
        assert_eq!(result.column("region").unwrap(), vec!["Fleuve Fraser", "Skeena"]);
        assert_eq!(
            result.column("statut").unwrap(),
            vec!["Données insuffisantes", "Vert"]
        );
    }

    #[test]
    fn test_localized_variant_requires_join_tables() {
        let query = QuerySpec {
            columns: vec![
                col(Column::Source("CU_INDEX"), "indice_uc"),
                col(Column::LocalizedName, "nom_uc"),
            ],
            ..spec(PINK_EVEN)
        };
        match run_query(&db(), &query) {
            Err(Error::MissingColumns { table, columns }) => {
                assert_eq!(table, LOCALIZED_NAMES_TABLE);
                assert_eq!(columns.len(), 2);
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_file_stem_falls_back_to_title() {
        let mut query = spec(PINK_EVEN);
        query.name = String::new();
        query.title = "Pink (Even Year) status".into();
        assert_eq!(query.file_stem(), "Pink_Even_Year_status");
    }
}
