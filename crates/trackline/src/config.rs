use serde::{Deserialize, Serialize};

/// View settings a tracking-status node reads when fetching and laying out
/// its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Default page size. `0` fetches the whole range.
    pub page_size: usize,
    /// Show unpushed commits. When off, an ahead node shows the changed files
    /// directly instead.
    pub show_ahead_commits: bool,
    /// Insert a date marker before the first commit of each day.
    pub show_date_markers: bool,
    /// Include the files-summary entry above the commits.
    pub show_files: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            show_ahead_commits: true,
            show_date_markers: true,
            show_files: true,
        }
    }
}

impl ViewConfig {
    /// Translate a page size into a log limit; `0` means unbounded.
    pub fn limit_for(page_size: usize) -> Option<usize> {
        (page_size > 0).then_some(page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: ViewConfig =
            serde_json::from_str(r#"{"page_size": 5, "show_ahead_commits": false}"#).unwrap();
        assert_eq!(config.page_size, 5);
        assert!(!config.show_ahead_commits);
        assert!(config.show_date_markers);
        assert!(config.show_files);
    }

    #[test]
    fn test_zero_page_size_is_unbounded() {
        assert_eq!(ViewConfig::limit_for(0), None);
        assert_eq!(ViewConfig::limit_for(20), Some(20));
    }
}
