//! Content-addressed postal address.

use common::AddressId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Separates hashed fields so that ("ab", "c") and ("a", "bc") differ.
const FIELD_SEPARATOR: &[u8] = b"\x1f";

/// Deterministic digest over the four address fields.
///
/// Two structurally identical addresses always produce the same hash, which
/// is the natural key used to deduplicate stored addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressHash(String);

impl AddressHash {
    /// Computes the hash of an address. Absent optional lines hash as empty strings.
    pub fn compute(
        line_one: &str,
        line_two: Option<&str>,
        line_three: Option<&str>,
        post_code: &str,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(line_one.as_bytes());
        hasher.update(FIELD_SEPARATOR);
        hasher.update(line_two.unwrap_or_default().as_bytes());
        hasher.update(FIELD_SEPARATOR);
        hasher.update(line_three.unwrap_or_default().as_bytes());
        hasher.update(FIELD_SEPARATOR);
        hasher.update(post_code.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Wraps a previously computed hash (e.g. one read back from storage).
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// Returns the hash as lowercase hex.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AddressHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored address.
///
/// Addresses are immutable once created: there are no setters, and a change
/// of address is modelled as resolving (or creating) a different address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    id: AddressId,
    line_one: String,
    line_two: Option<String>,
    line_three: Option<String>,
    post_code: String,
    hash: AddressHash,
}

impl Address {
    /// Creates a new address, computing its content hash.
    pub fn new(
        line_one: impl Into<String>,
        line_two: Option<String>,
        line_three: Option<String>,
        post_code: impl Into<String>,
    ) -> Self {
        let line_one = line_one.into();
        let post_code = post_code.into();
        let hash = AddressHash::compute(
            &line_one,
            line_two.as_deref(),
            line_three.as_deref(),
            &post_code,
        );
        Self {
            id: AddressId::new(),
            line_one,
            line_two,
            line_three,
            post_code,
            hash,
        }
    }

    /// Rebuilds an address from its stored columns.
    pub fn from_parts(
        id: AddressId,
        line_one: String,
        line_two: Option<String>,
        line_three: Option<String>,
        post_code: String,
        hash: AddressHash,
    ) -> Self {
        Self {
            id,
            line_one,
            line_two,
            line_three,
            post_code,
            hash,
        }
    }

    pub fn id(&self) -> AddressId {
        self.id
    }

    pub fn line_one(&self) -> &str {
        &self.line_one
    }

    pub fn line_two(&self) -> Option<&str> {
        self.line_two.as_deref()
    }

    pub fn line_three(&self) -> Option<&str> {
        self.line_three.as_deref()
    }

    pub fn post_code(&self) -> &str {
        &self.post_code
    }

    pub fn hash(&self) -> &AddressHash {
        &self.hash
    }
}
