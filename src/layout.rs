//! Floor layout groups used to seed machines at initialization.

use serde::{Deserialize, Serialize};

pub const GROUP_16_SPINDLES: &str = "16_fusos";
pub const GROUP_32_SPINDLES: &str = "32_fusos";

/// One layout group and the machine codes it holds, in display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorLayout {
    pub group: String,
    pub codes: Vec<String>,
}

impl FloorLayout {
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            codes: Vec::new(),
        }
    }

    /// Append `prefix1..=prefixN`
    pub fn with_series(mut self, prefix: &str, count: u32) -> Self {
        self.codes
            .extend((1..=count).map(|n| format!("{prefix}{n}")));
        self
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// The two production layouts of the floor
pub fn default_layouts() -> Vec<FloorLayout> {
    vec![
        FloorLayout::new(GROUP_16_SPINDLES)
            .with_series("CD", 24)
            .with_series("CI", 4)
            .with_series("F", 24),
        FloorLayout::new(GROUP_32_SPINDLES)
            .with_series("CT", 24)
            .with_series("U", 33)
            .with_series("N", 10),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_layout_sizes() {
        let layouts = default_layouts();
        assert_eq!(layouts.len(), 2);
        assert_eq!(layouts[0].group, "16_fusos");
        assert_eq!(layouts[0].len(), 52);
        assert_eq!(layouts[1].group, "32_fusos");
        assert_eq!(layouts[1].len(), 67);
        assert_eq!(layouts[0].codes.first().map(String::as_str), Some("CD1"));
        assert_eq!(layouts[1].codes.last().map(String::as_str), Some("N10"));
    }

    #[test]
    fn test_codes_unique_within_group() {
        for layout in default_layouts() {
            let unique: HashSet<_> = layout.codes.iter().collect();
            assert_eq!(unique.len(), layout.codes.len(), "{}", layout.group);
        }
    }
}
