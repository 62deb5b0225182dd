use core::fmt;

/// A generated identifier: a 64-bit integer with the top bit always clear.
///
/// The value is the packed projection of an [`IdParts`] triple under some
/// [`BitLayout`]; the ID itself does not remember which layout produced it.
/// Use [`BitLayout::decode`] or a [`Decoder`] to take it apart again.
///
/// IDs compare by their integer value, so IDs from one layout sort by
/// timestamp first, then generator, then sequence.
///
/// [`BitLayout`]: crate::BitLayout
/// [`BitLayout::decode`]: crate::BitLayout::decode
/// [`Decoder`]: crate::Decoder
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnowflakeId {
    id: u64,
}

impl SnowflakeId {
    /// Wraps a raw integer.
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Returns the raw integer.
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Returns the ID as a signed integer, or `None` if the top bit is set
    /// (never the case for generated IDs).
    pub fn to_i64(&self) -> Option<i64> {
        i64::try_from(self.id).ok()
    }

    /// Wraps a signed integer, e.g. one read back from a `BIGINT` column.
    /// Returns `None` for negative values.
    pub fn from_i64(raw: i64) -> Option<Self> {
        u64::try_from(raw).ok().map(Self::from_raw)
    }
}

impl From<SnowflakeId> for u64 {
    fn from(id: SnowflakeId) -> Self {
        id.id
    }
}

impl From<u64> for SnowflakeId {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SnowflakeId").field(&self.id).finish()
    }
}

/// The structured view of an ID: timestamp (units since the layout epoch),
/// generator identity, and sequence.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdParts {
    pub timestamp: u64,
    pub generator_id: u64,
    pub sequence: u64,
}

impl IdParts {
    pub const fn new(timestamp: u64, generator_id: u64, sequence: u64) -> Self {
        Self {
            timestamp,
            generator_id,
            sequence,
        }
    }
}
