use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Content-derived identifier for a stored stack.
///
/// An `Address` wraps the 256-bit content hash of a stack, treated as a
/// big-endian integer. Identical content always produces the same address;
/// accidental hash collisions between unrelated content are resolved by
/// linear probing with [`Address::successor`]. Rendered base-36 lowercase,
/// which is also the on-disk file name stem.
///
/// Addressing is deterministic, not adversarial-safe: the probing scheme
/// tolerates accidental collisions but offers no cryptographic guarantees.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address([u8; 32]);

impl Address {
    /// Create an address from a pre-computed content hash.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The raw 32-byte big-endian value.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The next address in probing order: the underlying integer plus one,
    /// wrapping at 2^256.
    pub fn successor(&self) -> Self {
        let mut bytes = self.0;
        for byte in bytes.iter_mut().rev() {
            let (value, overflow) = byte.overflowing_add(1);
            *byte = value;
            if !overflow {
                break;
            }
        }
        Self(bytes)
    }

    /// Base-36 lowercase rendering of the address value.
    pub fn to_base36(&self) -> String {
        let mut scratch = self.0;
        let mut out = Vec::new();
        while scratch.iter().any(|&b| b != 0) {
            // Long division of the 256-bit value by 36, collecting remainders.
            let mut rem: u32 = 0;
            for byte in scratch.iter_mut() {
                let acc = (rem << 8) | u32::from(*byte);
                *byte = (acc / 36) as u8;
                rem = acc % 36;
            }
            out.push(DIGITS[rem as usize]);
        }
        if out.is_empty() {
            out.push(b'0');
        }
        out.reverse();
        String::from_utf8(out).expect("base-36 digits are ASCII")
    }

    /// Parse a base-36 rendering back into an address.
    ///
    /// Accepts upper- or lowercase digits. Fails on empty input, foreign
    /// characters, or values that do not fit in 256 bits.
    pub fn from_base36(s: &str) -> Result<Self, TypeError> {
        if s.is_empty() {
            return Err(TypeError::InvalidAddress("empty string".to_string()));
        }
        let mut bytes = [0u8; 32];
        for ch in s.bytes() {
            let digit = match ch {
                b'0'..=b'9' => ch - b'0',
                b'a'..=b'z' => ch - b'a' + 10,
                b'A'..=b'Z' => ch - b'A' + 10,
                _ => {
                    return Err(TypeError::InvalidAddress(format!(
                        "invalid digit {:?} in {s:?}",
                        char::from(ch)
                    )))
                }
            };
            // bytes = bytes * 36 + digit, big-endian with carry.
            let mut carry = u32::from(digit);
            for byte in bytes.iter_mut().rev() {
                let acc = u32::from(*byte) * 36 + carry;
                *byte = (acc & 0xff) as u8;
                carry = acc >> 8;
            }
            if carry != 0 {
                return Err(TypeError::AddressOverflow);
            }
        }
        Ok(Self(bytes))
    }

    /// Short prefix of the base-36 rendering, for log labels.
    pub fn short(&self) -> String {
        let mut rendered = self.to_base36();
        rendered.truncate(8);
        rendered
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.short())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base36())
    }
}

impl FromStr for Address {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base36(s)
    }
}
