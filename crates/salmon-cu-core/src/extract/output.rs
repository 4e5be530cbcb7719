use std::fs;
use std::path::{Path, PathBuf};

use super::query::ResultSet;
use crate::error::Error;

/// Write `result` as `<dir>/<result.name>.csv`: a header row, then the rows.
pub fn write_csv(result: &ResultSet, dir: &Path) -> Result<PathBuf, Error> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.csv", result.name));

    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(&result.headers)?;
    for row in &result.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    Ok(path)
}

/// Turn a human-readable title into a file stem made of ASCII letters,
/// digits and single underscores.
pub fn sanitize_file_stem(title: &str) -> String {
    let mut stem = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            stem.push(c);
        } else if !stem.ends_with('_') {
            stem.push('_');
        }
    }
    stem.trim_matches('_').to_string()
}
