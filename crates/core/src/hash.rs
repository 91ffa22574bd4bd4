//! Digest provider for the hash chain.
//!
//! Account identities, transaction ids, merkle roots and block digests are
//! all built from [`hash`] and [`hash_concat`]. Nothing outside this module
//! looks at digest bytes except through equality, ordering and
//! [`Hash::leading_zero_nibbles`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw 256-bit digest.
pub type H256 = [u8; 32];

/// Number of hex characters in a rendered digest.
pub const HEX_LEN: usize = 64;

/// A blake3 digest.
///
/// Byte order and hex order agree, so `Ord` sorts digests the same way
/// their hex strings sort.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Hash(pub H256);

impl Hash {
    /// All zeros. Used as the previous hash of genesis.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Lowercase hex, always [`HEX_LEN`] characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse exactly [`HEX_LEN`] hex characters.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Number of leading `'0'` characters in [`Hash::to_hex`].
    pub fn leading_zero_nibbles(&self) -> usize {
        match self.0.iter().position(|&b| b != 0) {
            None => HEX_LEN,
            Some(i) if self.0[i] < 0x10 => 2 * i + 1,
            Some(i) => 2 * i,
        }
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({}..)", &self.to_hex()[..12])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Digest of `data`.
pub fn hash(data: &[u8]) -> Hash {
    Hash(*blake3::hash(data).as_bytes())
}

/// Digest of the concatenation of `parts`, without building the
/// concatenated buffer.
pub fn hash_concat(parts: &[&[u8]]) -> Hash {
    let hasher = parts
        .iter()
        .fold(blake3::Hasher::new(), |mut hasher, part| {
            hasher.update(part);
            hasher
        });
    Hash(*hasher.finalize().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_input_same_digest() {
        assert_eq!(hash(b"powchain"), hash(b"powchain"));
        assert_ne!(hash(b"powchain"), hash(b"powchain!"));
    }

    #[test]
    fn test_hex_form() {
        let h = hash(b"block");
        let rendered = h.to_hex();

        assert_eq!(rendered.len(), HEX_LEN);
        assert!(rendered.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
        assert_eq!(h.to_string(), rendered);
        assert_eq!(Hash::from_hex(&rendered).unwrap(), h);
    }

    #[test]
    fn test_from_hex_wrong_length() {
        assert!(Hash::from_hex("abcd").is_err());
        assert!(Hash::from_hex(&"0".repeat(HEX_LEN + 2)).is_err());
    }

    #[test]
    fn test_concat_equals_joined_input() {
        assert_eq!(hash_concat(&[b"ab", b"", b"cd"]), hash(b"abcd"));
        assert_eq!(hash_concat(&[]), hash(b""));
    }

    #[test]
    fn test_leading_zero_nibbles() {
        let mut bytes = [0xffu8; 32];
        assert_eq!(Hash(bytes).leading_zero_nibbles(), 0);

        bytes[0] = 0x0f;
        assert_eq!(Hash(bytes).leading_zero_nibbles(), 1);

        bytes[0] = 0x00;
        bytes[1] = 0x01;
        assert_eq!(Hash(bytes).leading_zero_nibbles(), 3);

        bytes[1] = 0x10;
        assert_eq!(Hash(bytes).leading_zero_nibbles(), 2);

        assert_eq!(Hash::ZERO.leading_zero_nibbles(), HEX_LEN);
    }

    #[test]
    fn test_leading_zero_nibbles_matches_hex() {
        for i in 0u32..500 {
            let h = hash(&i.to_le_bytes());
            let from_hex = h.to_hex().chars().take_while(|c| *c == '0').count();
            assert_eq!(h.leading_zero_nibbles(), from_hex);
        }
    }

    #[test]
    fn test_ordering_matches_hex() {
        let mut digests: Vec<Hash> = (0u8..20).map(|i| hash(&[i])).collect();
        let mut rendered: Vec<String> = digests.iter().map(Hash::to_hex).collect();
        digests.sort();
        rendered.sort();

        assert_eq!(
            digests.iter().map(Hash::to_hex).collect::<Vec<_>>(),
            rendered
        );
    }
}
