/// A named grid of optional text cells with a header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new(name: &str, columns: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the header width.
    /// All-whitespace cells become `None`; other values are kept verbatim.
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<Option<String>> = cells
            .into_iter()
            .map(Into::into)
            .map(|cell| if cell.trim().is_empty() { None } else { Some(cell) })
            .collect();
        row.resize(self.columns.len(), None);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
