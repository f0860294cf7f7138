//! Parsing of `<digest> <filename>` checksum listings.
//!
//! Both local checksums files and the release `{version}-sha.txt` files use this format:
//!
//! ```text
//! Hash: SHA512
//! 2f3c...e1 dotnet-runtime-9.0.0-linux-x64.tar.gz
//! 7ab0...9d dotnet-runtime-9.0.0-win-x64.zip
//! ```

use std::collections::HashMap;
use tracing::warn;

/// File name to lower-case hex digest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumTable {
    entries: HashMap<String, String>,
}

impl ChecksumTable {
    /// Parses a checksum listing.
    ///
    /// A first line containing `Hash` is a header. Every other non-empty line must split
    /// on a single space into exactly a digest and a file name; malformed lines are logged
    /// and skipped. When a file name appears twice the first digest is kept.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut entries = HashMap::new();

        for (index, line) in content.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if index == 0 && line.contains("Hash") {
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }

            let parts: Vec<&str> = line.split(' ').collect();
            let [digest, file_name] = parts.as_slice() else {
                warn!("Skipping malformed checksum line {}: '{line}'", index + 1);
                continue;
            };
            if digest.is_empty() || file_name.is_empty() {
                warn!("Skipping malformed checksum line {}: '{line}'", index + 1);
                continue;
            }

            entries.entry((*file_name).to_string()).or_insert_with(|| digest.to_lowercase());
        }

        Self {
            entries,
        }
    }

    /// Returns the digest recorded for `file_name`.
    #[must_use]
    pub fn get(&self, file_name: &str) -> Option<&str> {
        self.entries.get(file_name).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
