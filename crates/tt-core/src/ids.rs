//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.

use std::fmt;
use std::str::FromStr;

use crate::ValidationError;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// A rider account.  Issued by the outer account service.
    pub struct RiderId(u64);
}

typed_id! {
    /// A travel session, unique for the lifetime of the process.
    pub struct SessionId(u64);
}

typed_id! {
    /// Position of a route inside the currently loaded corpus.
    ///
    /// Only meaningful against the snapshot that produced it; route indices
    /// are reassigned on every refresh.  Persist the route's string id
    /// instead.
    pub struct RouteIdx(u32);
}

impl FromStr for RiderId {
    type Err = ValidationError;

    /// Parse the decimal id the outer service passes in URLs and payloads.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(RiderId)
            .map_err(|_| ValidationError::InvalidRiderId(s.to_owned()))
    }
}
