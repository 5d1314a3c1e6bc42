//! Writer configuration.

use dexgen_format::{DEFAULT_VERSION, SUPPORTED_VERSIONS};

/// Options for [`ApplicationWriter`](crate::ApplicationWriter).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriterConfig {
    version: u32,
    emit_debug_info: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION,
            emit_debug_info: true,
        }
    }
}

impl WriterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Format version written into the magic. Unknown versions fall back to
    /// the default.
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = if SUPPORTED_VERSIONS.contains(&version) {
            version
        } else {
            tracing::debug!(version, "unsupported format version, using default");
            DEFAULT_VERSION
        };
        self
    }

    pub fn with_debug_info(mut self, enabled: bool) -> Self {
        self.emit_debug_info = enabled;
        self
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn emit_debug_info(&self) -> bool {
        self.emit_debug_info
    }
}
