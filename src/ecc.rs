//! Error-correction levels of a QR Code symbol.
//!
//! Each level carries two independent numbers:
//!
//! | Level      | `format_bits` | `rank` | Recoverable codewords |
//! |------------|---------------|--------|-----------------------|
//! | `Low`      | 1             | 0      | ~7%                   |
//! | `Medium`   | 0             | 1      | ~15%                  |
//! | `Quartile` | 3             | 2      | ~25%                  |
//! | `High`     | 2             | 3      | ~30%                  |
//!
//! `format_bits` is the 2-bit code written into the symbol's format
//! information. `rank` orders levels by protection strength and is what
//! `Ord` compares; the two must never be confused, since ordering by code
//! would put `Medium` below `Low`.
//!
//! ```
//! use memokit::ecc::Ecc;
//!
//! assert!(Ecc::Low < Ecc::Medium);
//! assert!(Ecc::Medium.format_bits() < Ecc::Low.format_bits());
//! assert_eq!(Ecc::ALL.iter().max(), Some(&Ecc::High));
//! ```

use std::cmp::Ordering;
use std::fmt;

/// Error-correction level, ordered from weakest to strongest protection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ecc {
    /// Tolerates about 7% erroneous codewords.
    Low,
    /// Tolerates about 15% erroneous codewords.
    Medium,
    /// Tolerates about 25% erroneous codewords.
    Quartile,
    /// Tolerates about 30% erroneous codewords.
    High,
}

// Ranks must be exactly 0..4 in `ALL` order and codes distinct 2-bit values.
const _: () = {
    let mut i = 0;
    while i < Ecc::ALL.len() {
        let level = Ecc::ALL[i];
        assert!(level.rank() as usize == i);
        assert!(level.format_bits() < 4);
        let mut j = i + 1;
        while j < Ecc::ALL.len() {
            assert!(level.format_bits() != Ecc::ALL[j].format_bits());
            j += 1;
        }
        i += 1;
    }
};

impl Ecc {
    /// Every level in ascending order of protection.
    pub const ALL: [Ecc; 4] = [Ecc::Low, Ecc::Medium, Ecc::Quartile, Ecc::High];

    /// The 2-bit code used in format information.
    pub const fn format_bits(self) -> u8 {
        match self {
            Ecc::Low => 1,
            Ecc::Medium => 0,
            Ecc::Quartile => 3,
            Ecc::High => 2,
        }
    }

    /// Position in ascending order of protection, `0` for the weakest.
    pub const fn rank(self) -> u8 {
        match self {
            Ecc::Low => 0,
            Ecc::Medium => 1,
            Ecc::Quartile => 2,
            Ecc::High => 3,
        }
    }

    /// Approximate share of codewords, in percent, that can be recovered.
    pub const fn recovery_percent(self) -> u8 {
        match self {
            Ecc::Low => 7,
            Ecc::Medium => 15,
            Ecc::Quartile => 25,
            Ecc::High => 30,
        }
    }

    /// Looks a level up by its 2-bit format code.
    pub fn from_format_bits(bits: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.format_bits() == bits)
    }

    /// Looks a level up by its rank.
    pub fn from_rank(rank: u8) -> Option<Self> {
        Self::ALL.get(usize::from(rank)).copied()
    }

    /// The next stronger level, if any.
    pub fn stronger(self) -> Option<Self> {
        Self::from_rank(self.rank() + 1)
    }
}

impl PartialOrd for Ecc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ecc {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Ecc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Ecc::Low => "LOW",
            Ecc::Medium => "MEDIUM",
            Ecc::Quartile => "QUARTILE",
            Ecc::High => "HIGH",
        })
    }
}
