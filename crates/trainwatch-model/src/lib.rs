//! Document shapes shared by the collector and generator.
//!
//! These types describe the *logical* shape of the four collections in the
//! shared store. They carry `serde` derives so a `Store` implementation can
//! serialize them however it likes (BSON documents, JSON fixtures, …); this
//! crate has no opinion on the wire format.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

/// Names of the four collections in the shared store.
pub mod collections {
    /// Append-only performance-metric time series.
    pub const PPM: &str = "PPM";
    /// Berth documents, keyed by `NAME`.
    pub const BERTHS: &str = "BERTHS";
    /// Train documents, keyed by `NAME` (reporting number).
    pub const TRAINS: &str = "TRAINS";
}

/// Errors constructing the validated newtypes in this crate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// A berth name was not exactly 6 ASCII characters.
    #[error("berth name must be exactly 6 ASCII characters, got {len} ({value:?})")]
    InvalidBerthName {
        /// Length of the rejected value.
        len: usize,
        /// The rejected value itself.
        value: String,
    },
    /// A reporting number was not exactly 4 ASCII characters.
    #[error("reporting number must be exactly 4 ASCII characters, got {len} ({value:?})")]
    InvalidReportingNumber {
        /// Length of the rejected value.
        len: usize,
        /// The rejected value itself.
        value: String,
    },
}

/// A validated `NAME` for a `BERTH` document: a 2-character signalling-area
/// code concatenated with a 4-character berth code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BerthName(String);

impl BerthName {
    /// Build a `BerthName` from its two components.
    pub fn from_parts(area_id: &str, berth: &str) -> Result<Self, ModelError> {
        Self::try_from(format!("{area_id}{berth}"))
    }

    /// The 2-character signalling-area code.
    #[must_use]
    pub fn area(&self) -> &str {
        &self.0[..2]
    }

    /// The 4-character berth code.
    #[must_use]
    pub fn berth(&self) -> &str {
        &self.0[2..]
    }

    /// The full 6-character name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BerthName {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.len() == 6 && value.is_ascii() {
            Ok(Self(value))
        } else {
            Err(ModelError::InvalidBerthName {
                len: value.chars().count(),
                value,
            })
        }
    }
}

impl TryFrom<&str> for BerthName {
    type Error = ModelError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_owned())
    }
}

impl From<BerthName> for String {
    fn from(name: BerthName) -> Self {
        name.0
    }
}

impl fmt::Display for BerthName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated 4-character reporting number (headcode).
///
/// Also used for `BERTH.LATEST_TRAIN`, where the literal value `"0000"` is a
/// sentinel meaning "no train in this berth" rather than a real identifier —
/// use [`ReportingNumber::is_vacant`] rather than comparing against the
/// literal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReportingNumber(String);

impl ReportingNumber {
    /// The sentinel value meaning "no train occupies this berth".
    pub const VACANT: &'static str = "0000";

    /// The vacant sentinel as a `ReportingNumber`.
    #[must_use]
    pub fn vacant() -> Self {
        Self(Self::VACANT.to_owned())
    }

    /// Whether this value is the vacant sentinel, not a real reporting number.
    #[must_use]
    pub fn is_vacant(&self) -> bool {
        self.0 == Self::VACANT
    }

    /// The raw 4-character string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ReportingNumber {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.len() == 4 && value.is_ascii() {
            Ok(Self(value))
        } else {
            Err(ModelError::InvalidReportingNumber {
                len: value.chars().count(),
                value,
            })
        }
    }
}

impl TryFrom<&str> for ReportingNumber {
    type Error = ModelError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_owned())
    }
}

impl From<ReportingNumber> for String {
    fn from(value: ReportingNumber) -> Self {
        value.0
    }
}

impl fmt::Display for ReportingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single Public Performance Measure sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ppm {
    /// Instant the sample covers.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// Total number of services counted.
    pub total: i64,
    /// Services arriving on time.
    pub on_time: i64,
    /// Services arriving late.
    pub late: i64,
    /// Percentage of services on time.
    pub ppm: f64,
    /// Rolling average of `ppm`.
    pub rolling_ppm: f64,
}

/// A berth document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Berth {
    /// Unique key: area code + berth code.
    #[serde(rename = "NAME")]
    pub name: BerthName,
    /// Signalling-area code component of `name`.
    #[serde(rename = "TD")]
    pub td: String,
    /// Berth code component of `name`.
    #[serde(rename = "BERTH")]
    pub berth: String,
    /// Latitude, present only for fixed berths (until the layout fills it in).
    #[serde(rename = "LATITUDE")]
    pub latitude: Option<f64>,
    /// Longitude, present only for fixed berths (until the layout fills it in).
    #[serde(rename = "LONGITUDE")]
    pub longitude: Option<f64>,
    /// Whether this berth has an authoritative, collector-immutable coordinate.
    #[serde(rename = "FIXED")]
    pub fixed: bool,
    /// Reporting number currently occupying the berth, or the vacant sentinel.
    #[serde(rename = "LATEST_TRAIN")]
    pub latest_train: ReportingNumber,
    /// When `latest_train` was last set.
    #[serde(rename = "LATEST_TIME", with = "time::serde::rfc3339::option")]
    pub latest_time: Option<OffsetDateTime>,
    /// Names of berths ever directly observed adjacent to this one.
    #[serde(rename = "CONNECTIONS")]
    pub connections: BTreeSet<BerthName>,
    /// Whether the most recent generator run included this berth.
    #[serde(rename = "SELECTED")]
    pub selected: bool,
    /// Adjacency lists from the most recent layout.
    #[serde(rename = "EDGES")]
    pub edges: Vec<Vec<BerthName>>,
    /// Static bootstrap metadata, present only for berths seeded from the
    /// known-berth bootstrap.
    #[serde(flatten)]
    pub metadata: BerthMetadata,
}

/// Optional static metadata loaded once by the known-berth bootstrap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BerthMetadata {
    #[serde(rename = "TIPLOC", skip_serializing_if = "Option::is_none")]
    pub tiploc: Option<String>,
    #[serde(rename = "STANOX", skip_serializing_if = "Option::is_none")]
    pub stanox: Option<String>,
    #[serde(rename = "STANME", skip_serializing_if = "Option::is_none")]
    pub stanme: Option<String>,
    #[serde(rename = "DESCRIPTION", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "PLATFORM", skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(rename = "LINE", skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
    #[serde(rename = "EVENT", skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(rename = "OFFSET", skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
}

impl Berth {
    /// A newly-observed, non-fixed berth with no prior history; on-insert
    /// sets `FIXED=false`.
    #[must_use]
    pub fn new_unfixed(name: BerthName) -> Self {
        Self {
            td: name.area().to_owned(),
            berth: name.berth().to_owned(),
            name,
            latitude: None,
            longitude: None,
            fixed: false,
            latest_train: ReportingNumber::vacant(),
            latest_time: None,
            connections: BTreeSet::new(),
            selected: false,
            edges: Vec::new(),
            metadata: BerthMetadata::default(),
        }
    }
}

/// A train document, accumulating the berth sequence for a reporting number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Train {
    /// Reporting number this document tracks.
    #[serde(rename = "NAME")]
    pub name: ReportingNumber,
    /// Ordered berth names visited, same length as `times`.
    #[serde(rename = "BERTHS")]
    pub berths: Vec<BerthName>,
    /// Ordered instants matching `berths`.
    #[serde(rename = "TIMES", with = "time_vec_rfc3339")]
    pub times: Vec<OffsetDateTime>,
}

impl Train {
    /// A freshly created, empty train document.
    #[must_use]
    pub fn new(name: ReportingNumber) -> Self {
        Self {
            name,
            berths: Vec::new(),
            times: Vec::new(),
        }
    }

    /// `true` unless a writer has let the berth history and time history
    /// drift out of lockstep.
    #[must_use]
    pub fn invariant_holds(&self) -> bool {
        self.berths.len() == self.times.len()
    }
}

mod time_vec_rfc3339 {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use time::OffsetDateTime;

    #[derive(Serialize, Deserialize)]
    #[serde(transparent)]
    struct Wrapper(#[serde(with = "time::serde::rfc3339")] OffsetDateTime);

    pub fn serialize<S: Serializer>(
        times: &[OffsetDateTime],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let wrapped: Vec<Wrapper> = times.iter().copied().map(Wrapper).collect();
        wrapped.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<OffsetDateTime>, D::Error> {
        let wrapped = Vec::<Wrapper>::deserialize(deserializer)?;
        Ok(wrapped.into_iter().map(|w| w.0).collect())
    }
}
