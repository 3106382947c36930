use crate::parsing::index::IndexEntry;

/// Options for filtering index traversal
#[derive(Debug, Clone)]
pub struct FilingOptions {
    pub form_types: Option<Vec<String>>,
    pub ciks: Option<Vec<u64>>,
    /// Stop the traversal after this many matching entries.
    pub limit: Option<usize>,
    /// Whether to automatically include amendment forms (e.g., 4/A when 4 is requested).
    /// Defaults to true.
    pub include_amendments: bool,
}

impl Default for FilingOptions {
    fn default() -> Self {
        Self {
            form_types: None,
            ciks: None,
            limit: None,
            include_amendments: true,
        }
    }
}

impl FilingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_form_type(mut self, form_type: impl Into<String>) -> Self {
        let form_type = form_type.into();
        self.form_types = Some(vec![form_type]);
        self
    }

    pub fn with_form_types(mut self, form_types: Vec<String>) -> Self {
        self.form_types = Some(form_types);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_cik(mut self, cik: u64) -> Self {
        self.ciks = Some(vec![cik]);
        self
    }

    pub fn with_ciks(mut self, ciks: Vec<u64>) -> Self {
        self.ciks = Some(ciks);
        self
    }

    /// Set whether to include amendment forms automatically.
    ///
    /// When true (default), requesting "4" will also include "4/A" filings.
    /// When false, only the exact form type specified will be returned.
    pub fn with_include_amendments(mut self, include_amendments: bool) -> Self {
        self.include_amendments = include_amendments;
        self
    }

    /// Returns `true` if `entry` passes the form type and CIK filters.
    pub fn matches(&self, entry: &IndexEntry) -> bool {
        if let Some(ref ciks) = self.ciks {
            if !ciks.contains(&entry.cik) {
                return false;
            }
        }

        match self.form_types {
            Some(ref form_types) => {
                let form = entry.form_type.trim();
                form_types.iter().any(|ft| {
                    form == ft
                        || (self.include_amendments
                            && form.strip_suffix("/A") == Some(ft.as_str()))
                })
            }
            None => true,
        }
    }
}
