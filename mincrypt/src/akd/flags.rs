//! Bit flags for key-material serialization and for party roles.
//!
//! Both families use the same low bits, so they are kept as separate types and
//! can never be mixed up.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Selects which components of a keypair are written to / read from a stream.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct FieldMask(u32);

impl FieldMask {
    pub const EMPTY: Self = Self(0);
    pub const COMMON_P: Self = Self(0x1);
    pub const COMMON_G: Self = Self(0x2);
    pub const COMMON: Self = Self(0x1 | 0x2);
    pub const PUBLIC: Self = Self(0x4);
    pub const PRIVATE: Self = Self(0x8);
    pub const ALL: Self = Self(0xf);

    /// Single-field masks in stream order.
    pub const ORDER: [Self; 4] = [
        Self::COMMON_P,
        Self::COMMON_G,
        Self::PUBLIC,
        Self::PRIVATE,
    ];

    /// Keeps only known bits.
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::ALL.0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The selected single-field masks, in stream order.
    pub fn fields(self) -> impl Iterator<Item = Self> {
        Self::ORDER.into_iter().filter(move |&f| self.contains(f))
    }
}

impl BitOr for FieldMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for FieldMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for FieldMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self
            .fields()
            .map(|field| match field {
                Self::COMMON_P => "common_p",
                Self::COMMON_G => "common_g",
                Self::PUBLIC => "public",
                _ => "private",
            })
            .collect();

        if names.is_empty() {
            return write!(f, "none");
        }
        write!(f, "{}", names.join("|"))
    }
}

/// Which side of an exchange a value block belongs to.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Direction(u32);

impl Direction {
    pub const RECEIVER: Self = Self(0x1);
    pub const SENDER: Self = Self(0x2);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_sender(self) -> bool {
        self.contains(Self::SENDER)
    }

    pub fn is_receiver(self) -> bool {
        self.contains(Self::RECEIVER)
    }
}

impl BitOr for Direction {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.is_sender(), self.is_receiver()) {
            (true, true) => write!(f, "sender|receiver"),
            (true, false) => write!(f, "sender"),
            (false, true) => write!(f, "receiver"),
            (false, false) => write!(f, "none"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_is_p_and_g() {
        assert_eq!(FieldMask::COMMON, FieldMask::COMMON_P | FieldMask::COMMON_G);
        assert!(FieldMask::ALL.contains(FieldMask::COMMON));
        assert!(!FieldMask::PUBLIC.contains(FieldMask::PRIVATE));
    }

    #[test]
    fn test_fields_follow_stream_order() {
        let mask = FieldMask::PRIVATE | FieldMask::COMMON_P | FieldMask::PUBLIC;
        let fields: Vec<FieldMask> = mask.fields().collect();
        assert_eq!(
            fields,
            vec![FieldMask::COMMON_P, FieldMask::PUBLIC, FieldMask::PRIVATE]
        );
        assert_eq!(mask.to_string(), "common_p|public|private");
        assert_eq!(FieldMask::EMPTY.to_string(), "none");
    }

    #[test]
    fn test_truncate_drops_unknown_bits() {
        assert_eq!(FieldMask::from_bits_truncate(0xff), FieldMask::ALL);
    }

    #[test]
    fn test_direction() {
        assert!(Direction::SENDER.is_sender());
        assert!(!Direction::SENDER.is_receiver());
        assert_eq!(Direction::RECEIVER.to_string(), "receiver");
        assert_eq!((Direction::SENDER | Direction::RECEIVER).bits(), 0x3);
    }
}
