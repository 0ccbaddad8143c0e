//! Scanner configuration shared (read-only) by every unit in a batch.

/// Knobs for one parser pass. `Default` matches what the `pydox` binary
/// uses without flags.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Discard an untagged `##` block before the first statement when it
    /// reads like a copyright or license notice.
    pub skip_license_header: bool,
    /// Lower-case substrings that mark license text.
    pub license_markers: Vec<String>,
    /// Columns a tab advances to; used for indentation scopes.
    pub tab_width: usize,
    /// Method name that makes a method a constructor.
    pub initializer: String,
    /// Treat docstrings as plain text: `@cmd`/`\cmd` lines inside them are
    /// not parsed, so they cannot carry tags.
    pub verbatim_docstrings: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            skip_license_header: true,
            license_markers: ["copyright", "license", "licence", "all rights reserved"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            tab_width: 8,
            initializer: "__init__".to_string(),
            verbatim_docstrings: false,
        }
    }
}

impl ScanOptions {
    pub fn is_license_text(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.license_markers.iter().any(|m| lower.contains(m.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn license_detection_is_case_insensitive() {
        let opts = ScanOptions::default();
        assert!(opts.is_license_text("Copyright (c) 2014 Someone"));
        assert!(opts.is_license_text("GNU General Public LICENSE version 2"));
        assert!(!opts.is_license_text("Documentation for a function."));
    }

    #[test]
    fn custom_markers_replace_defaults() {
        let opts = ScanOptions {
            license_markers: vec!["proprietary".to_string()],
            ..Default::default()
        };
        assert!(opts.is_license_text("Proprietary and confidential"));
        assert!(!opts.is_license_text("Copyright 2020"));
    }
}
