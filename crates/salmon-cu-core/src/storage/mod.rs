pub mod source;
pub mod sqlite;
pub mod table;

pub use sqlite::Database;
pub use table::Table;
