//! Extraction policy.

/// Immutable per-call configuration of the extraction pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ExtractionPolicy {
    /// Keep colored (pending) fragments. `false` selects the approved view.
    pub include_colored: bool,
    /// Render tables as pipe rows; otherwise as plain containers.
    pub format_tables: bool,
    /// Render lists with markers and indents; otherwise as plain containers.
    pub format_lists: bool,
    /// Render headings with `#` prefixes; otherwise as plain containers.
    pub format_headers: bool,
    /// Repair spacing inside `<...>` placeholder tokens.
    pub clean_brackets: bool,
}

impl ExtractionPolicy {
    /// Policy for the "all fragments" view.
    #[must_use]
    pub fn all() -> Self {
        Self {
            include_colored: true,
            format_tables: true,
            format_lists: true,
            format_headers: true,
            clean_brackets: true,
        }
    }

    /// Policy for the "approved fragments" view.
    #[must_use]
    pub fn approved() -> Self {
        Self {
            include_colored: false,
            ..Self::all()
        }
    }

    #[must_use]
    pub fn with_tables(mut self, enabled: bool) -> Self {
        self.format_tables = enabled;
        self
    }

    #[must_use]
    pub fn with_lists(mut self, enabled: bool) -> Self {
        self.format_lists = enabled;
        self
    }

    #[must_use]
    pub fn with_headers(mut self, enabled: bool) -> Self {
        self.format_headers = enabled;
        self
    }

    #[must_use]
    pub fn with_clean_brackets(mut self, enabled: bool) -> Self {
        self.clean_brackets = enabled;
        self
    }
}

impl Default for ExtractionPolicy {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_differ_only_in_color_mode() {
        let all = ExtractionPolicy::all();
        let approved = ExtractionPolicy::approved();
        assert!(all.include_colored);
        assert!(!approved.include_colored);
        assert_eq!(
            ExtractionPolicy {
                include_colored: true,
                ..approved
            },
            all
        );
    }

    #[test]
    fn test_builder_toggles() {
        let policy = ExtractionPolicy::approved()
            .with_tables(false)
            .with_lists(false)
            .with_headers(false)
            .with_clean_brackets(false);
        assert!(!policy.format_tables);
        assert!(!policy.format_lists);
        assert!(!policy.format_headers);
        assert!(!policy.clean_brackets);
        assert!(!policy.include_colored);
    }
}
