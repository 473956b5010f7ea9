//! Fixed-length identifier types.
//!
//! Every external id in this system (transaction id, block id, data-item id,
//! wallet address, tag name/value hash) is a fixed-length byte string. The
//! wire encoding is URL-safe base64 without padding; the persisted and
//! in-memory form is raw bytes. See spec §3 "Identifiers".

use crate::encoding::{b64url_decode, b64url_encode};
use crate::errors::EncodingError;
use std::fmt;

/// Declares a `Copy` fixed-size byte-array identifier with base64url
/// `Display`/`FromStr`/`TryFrom<&[u8]>` plumbing.
macro_rules! fixed_id {
    ($name:ident, $len:expr, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub const fn zero() -> Self {
                Self([0u8; $len])
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn to_base64url(&self) -> String {
                b64url_encode(&self.0)
            }

            pub fn from_base64url(s: &str) -> Result<Self, EncodingError> {
                let bytes = b64url_decode(s)?;
                Self::try_from(bytes.as_slice())
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = EncodingError;

            fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
                if value.len() != $len {
                    return Err(EncodingError::WrongLength {
                        expected: $len,
                        actual: value.len(),
                    });
                }
                let mut buf = [0u8; $len];
                buf.copy_from_slice(value);
                Ok(Self(buf))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_base64url())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.to_base64url())
            }
        }

        impl std::str::FromStr for $name {
            type Err = EncodingError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_base64url(s)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.to_base64url())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::from_base64url(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

fixed_id!(TxId, 32, "A transaction id.");
fixed_id!(BlockId, 32, "A block's independent hash.");
fixed_id!(DataItemId, 32, "A bundled data item's id.");
fixed_id!(WalletAddress, 32, "SHA-256 of an owner's public modulus.");
fixed_id!(DataRoot, 32, "A transaction's data root.");
fixed_id!(ContentHash, 32, "A canonical content hash in the data index.");
fixed_id!(NameHash, 20, "SHA-1 of a tag name's raw bytes.");
fixed_id!(ValueHash, 20, "SHA-1 of a tag value's raw bytes.");

impl NameHash {
    pub fn of(name: &[u8]) -> Self {
        use sha1::{Digest, Sha1};
        let digest = Sha1::digest(name);
        Self(digest.into())
    }
}

impl ValueHash {
    pub fn of(value: &[u8]) -> Self {
        use sha1::{Digest, Sha1};
        let digest = Sha1::digest(value);
        Self(digest.into())
    }
}

impl WalletAddress {
    pub fn of_modulus(modulus: &[u8]) -> Self {
        use sha2::{Digest, Sha256};
        let digest = Sha256::digest(modulus);
        Self(digest.into())
    }
}

/// The bare-transaction sentinel used by the query planner's uniform
/// projection: bare transactions project `data_item_id = 0x00`. See spec
/// §4.4 "Four sources".
pub const BARE_TX_DATA_ITEM_ID: DataItemId = DataItemId::zero();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_base64url() {
        let id = TxId([7u8; 32]);
        let encoded = id.to_base64url();
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
        assert!(!encoded.contains('='));
        assert_eq!(TxId::from_base64url(&encoded).unwrap(), id);
    }

    #[test]
    fn rejects_wrong_length() {
        let err = TxId::try_from(&[0u8; 10][..]).unwrap_err();
        assert_eq!(
            err,
            EncodingError::WrongLength {
                expected: 32,
                actual: 10
            }
        );
    }

    #[test]
    fn name_hash_matches_sha1() {
        let hash = NameHash::of(b"Content-Type");
        assert_eq!(hash.as_bytes().len(), 20);
        // SHA-1 is deterministic; re-hashing must agree.
        assert_eq!(hash, NameHash::of(b"Content-Type"));
        assert_ne!(hash, NameHash::of(b"App-Name"));
    }
}
