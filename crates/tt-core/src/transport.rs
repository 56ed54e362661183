//! Public-transport type shared by the route corpus, the classifier and the
//! usage counters.

use std::fmt;

/// The kind of vehicle a route (or a classified ride) belongs to.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TransportType {
    Bus,
    Trolleybus,
    Tram,
    Subway,
    Train,
    Ferry,
    /// No signal, or a provider tag we do not recognise.
    #[default]
    Unknown,
}

impl TransportType {
    /// All concrete (non-`Unknown`) variants.
    pub const ALL: [TransportType; 6] = [
        TransportType::Bus,
        TransportType::Trolleybus,
        TransportType::Tram,
        TransportType::Subway,
        TransportType::Train,
        TransportType::Ferry,
    ];

    /// Map a provider's free-form route tag (OSM `route=*`, GTFS route
    /// type names, …) onto a variant.  Never fails.
    pub fn from_tag(tag: &str) -> TransportType {
        match tag.trim().to_ascii_lowercase().as_str() {
            "bus" | "coach" | "minibus"                   => TransportType::Bus,
            "trolleybus" | "trolley"                      => TransportType::Trolleybus,
            "tram" | "light_rail" | "streetcar"           => TransportType::Tram,
            "subway" | "metro" | "underground"            => TransportType::Subway,
            "train" | "rail" | "railway" | "regional"
            | "monorail" | "funicular"                    => TransportType::Train,
            "ferry" | "boat"                              => TransportType::Ferry,
            _                                             => TransportType::Unknown,
        }
    }

    #[inline]
    pub fn is_known(self) -> bool {
        !matches!(self, TransportType::Unknown)
    }

    /// Lower-case label used in CSV columns and JSON keys.
    pub fn as_str(self) -> &'static str {
        match self {
            TransportType::Bus        => "bus",
            TransportType::Trolleybus => "trolleybus",
            TransportType::Tram       => "tram",
            TransportType::Subway     => "subway",
            TransportType::Train      => "train",
            TransportType::Ferry      => "ferry",
            TransportType::Unknown    => "unknown",
        }
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
