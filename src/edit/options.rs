//! Options for staged editing.

use std::path::{Path, PathBuf};

use crate::codec::ZlibEncoderOptions;

/// Default number of spilled bytes kept in memory per staged entry (1 MiB).
pub const DEFAULT_MEMORY_LIMIT: usize = 1024 * 1024;

/// Default zlib compression level.
pub const DEFAULT_LEVEL: u32 = 6;

/// Options for an [`Editor`](crate::Editor).
#[derive(Debug, Clone)]
pub struct EditOptions {
    /// Directory for spill files.
    pub temp_dir: PathBuf,
    /// Zlib compression level (0-9) for compressed entries.
    pub level: u32,
    /// Spill bytes kept in memory before moving to a temporary file.
    pub memory_limit: usize,
}

impl Default for EditOptions {
    fn default() -> Self {
        Self {
            temp_dir: std::env::temp_dir(),
            level: DEFAULT_LEVEL,
            memory_limit: DEFAULT_MEMORY_LIMIT,
        }
    }
}

impl EditOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the directory where large staged payloads are spilled.
    pub fn temp_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.temp_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Sets the compression level (strict validation).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCompressionLevel`] if `level > 9`.
    /// Use [`level_clamped`] to clamp instead.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cmfkit::EditOptions;
    ///
    /// let opts = EditOptions::new().level(9)?;
    /// assert_eq!(opts.level, 9);
    ///
    /// assert!(EditOptions::new().level(15).is_err());
    /// # Ok::<(), cmfkit::Error>(())
    /// ```
    ///
    /// [`level_clamped`]: Self::level_clamped
    /// [`Error::InvalidCompressionLevel`]: crate::Error::InvalidCompressionLevel
    pub fn level(mut self, level: u32) -> crate::Result<Self> {
        if level > 9 {
            return Err(crate::Error::InvalidCompressionLevel { level });
        }
        self.level = level;
        Ok(self)
    }

    /// Sets the compression level, clamping values above 9.
    ///
    /// ```rust
    /// use cmfkit::EditOptions;
    ///
    /// assert_eq!(EditOptions::new().level_clamped(15).level, 9);
    /// ```
    pub fn level_clamped(mut self, level: u32) -> Self {
        self.level = level.min(9);
        self
    }

    /// Sets how many spill bytes are kept in memory per entry.
    pub fn memory_limit(mut self, bytes: usize) -> Self {
        self.memory_limit = bytes;
        self
    }

    pub(crate) fn encoder_options(&self) -> ZlibEncoderOptions {
        ZlibEncoderOptions::with_level(self.level)
    }
}
