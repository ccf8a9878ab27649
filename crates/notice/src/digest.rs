//! Content digests used as the deduplication key for notices.

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};

/// Width of a [`Digest`] in bytes.
pub const DIGEST_LEN: usize = blake3::OUT_LEN;
/// Number of digest bytes read when deriving a bucket key.
pub const BUCKET_KEY_LEN: usize = 4;

/// Fixed-width BLAKE3 hash of a notice's text.
///
/// Two notices with equal digests are treated as identical, regardless of
/// which file they came from. Ordering is byte-lexicographic, which is what
/// the store's sorted bucket chains rely on.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Hashes `bytes`.
    #[must_use]
    pub fn of(bytes: impl AsRef<[u8]>) -> Self {
        Self(*blake3::hash(bytes.as_ref()).as_bytes())
    }

    #[must_use]
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Reads [`BUCKET_KEY_LEN`] bytes starting at `offset` as a little-endian
    /// `u32`. Returns `None` if the window runs past the end of the digest.
    #[must_use]
    pub fn bucket_key(&self, offset: usize) -> Option<u32> {
        let window = self.0.get(offset..offset.checked_add(BUCKET_KEY_LEN)?)?;
        let bytes: [u8; BUCKET_KEY_LEN] = window.try_into().ok()?;
        Some(u32::from_le_bytes(bytes))
    }

    /// Largest offset accepted by [`bucket_key`](Self::bucket_key).
    pub const MAX_KEY_OFFSET: usize = DIGEST_LEN - BUCKET_KEY_LEN;
}

impl Display for Digest {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl Debug for Digest {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Digest({self})")
    }
}

impl From<[u8; DIGEST_LEN]> for Digest {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self::from_bytes(bytes)
    }
}
