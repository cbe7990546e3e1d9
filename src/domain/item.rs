use serde::Serialize;

/// Category assigned when the spreadsheet leaves the second column empty.
pub const DEFAULT_CATEGORY: &str = "Broad";

/// One keyword to classify, together with its match type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub text: String,
    pub category: String,
}

impl Item {
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: category.into(),
        }
    }

    /// Builds an item from raw cell values. Returns `None` when the text cell is blank.
    pub fn from_cells(text: Option<&str>, category: Option<&str>) -> Option<Self> {
        let text = text.map(str::trim).filter(|t| !t.is_empty())?;
        let category = category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CATEGORY);
        Some(Self::new(text, category))
    }
}
