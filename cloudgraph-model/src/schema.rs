use cloudgraph_types::ProviderName;
use serde::{Deserialize, Serialize};

/// The type/field declarations one provider contributes to the store schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaFragment {
    pub provider: ProviderName,
    pub type_defs: Vec<String>,
}

impl SchemaFragment {
    pub fn new(provider: impl Into<ProviderName>, type_defs: Vec<String>) -> Self {
        Self {
            provider: provider.into(),
            type_defs,
        }
    }

    /// The fragment as one schema document.
    pub fn document(&self) -> String {
        self.type_defs.join("\n")
    }
}

/// Provider fragments concatenated in provider order.
///
/// Nothing is deduplicated: providers own disjoint type names, and a clash
/// is for the store to reject.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedSchema {
    fragments: Vec<SchemaFragment>,
}

impl CombinedSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: SchemaFragment) {
        self.fragments.push(fragment);
    }

    pub fn fragments(&self) -> &[SchemaFragment] {
        &self.fragments
    }

    pub fn type_def_count(&self) -> usize {
        self.fragments.iter().map(|f| f.type_defs.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.type_def_count() == 0
    }

    /// The combined schema document sent to the store.
    pub fn document(&self) -> String {
        self.fragments
            .iter()
            .flat_map(|f| f.type_defs.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl FromIterator<SchemaFragment> for CombinedSchema {
    fn from_iter<I: IntoIterator<Item = SchemaFragment>>(iter: I) -> Self {
        Self {
            fragments: iter.into_iter().collect(),
        }
    }
}
