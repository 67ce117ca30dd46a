//! Directory configuration.

/// Paging limits for directory listings.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Page size used when a caller does not pick one (default: 20).
    pub default_page_size: u64,
    /// Largest page size a caller may request (default: 100).
    pub max_page_size: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}
