//! Open-time table configuration

/// Configuration for a [`crate::LazyTable`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TableConfig {
    /// Index every column as it is created
    pub index_all_columns: bool,
    /// Disable the journal and synchronous writes for bulk loads.
    /// A crash mid-write can corrupt the database file.
    pub fast_and_unsafe: bool,
}

impl TableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index_all_columns(mut self, enabled: bool) -> Self {
        self.index_all_columns = enabled;
        self
    }

    pub fn with_fast_and_unsafe(mut self, enabled: bool) -> Self {
        self.fast_and_unsafe = enabled;
        self
    }
}
