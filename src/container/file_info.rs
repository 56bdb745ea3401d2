//! The optional file-info record (frame tag `0xFD`).
//!
//! This record's internal layout is owned by whatever collaborator attaches
//! metadata to a compressed stream; Blazer only guarantees where the frame
//! appears (exactly once, immediately after the header/encryption header)
//! and ships a minimal, reasonable payload shape rather than a rich format.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileInfo {
    pub name: Option<String>,
    pub mtime: Option<i64>,
    pub mode: Option<u32>,
}

impl FileInfo {
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("FileInfo fields are all JSON-safe")
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_json() {
        let info = FileInfo {
            name: Some("archive.txt".to_string()),
            mtime: Some(1_700_000_000),
            mode: Some(0o644),
        };
        let bytes = info.to_bytes();
        let back = FileInfo::from_bytes(&bytes).unwrap();
        assert_eq!(info, back);
    }

    #[test]
    fn empty_info_roundtrips() {
        let info = FileInfo::default();
        let bytes = info.to_bytes();
        let back = FileInfo::from_bytes(&bytes).unwrap();
        assert_eq!(info, back);
    }
}
