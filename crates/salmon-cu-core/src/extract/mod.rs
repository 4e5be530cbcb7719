pub mod catalog;
pub mod localize;
pub mod output;
pub mod query;

pub use catalog::{species_groups, standard_catalog};
pub use localize::CategoryMap;
pub use output::{sanitize_file_stem, write_csv};
pub use query::{run_query, Column, OutputColumn, QuerySpec, ResultSet, SpeciesGroup};
