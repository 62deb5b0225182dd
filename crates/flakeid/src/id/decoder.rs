use core::time::Duration;
use std::time::SystemTime;

use crate::{
    id::{BitLayout, IdParts, SnowflakeId},
    time::from_units,
};

/// Takes IDs apart for debugging, logging and tests.
///
/// Unlike [`BitLayout::decode`], the decoded view also recovers the absolute
/// instant the ID was issued at (`epoch + timestamp * unit`).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use flakeid::{BitLayout, Decoder};
///
/// let layout = BitLayout::new(41, 10, 12)?.with_epoch(Duration::from_millis(1_609_459_200_000));
/// let id = layout.encode(123, 5, 0)?;
///
/// let decoded = Decoder::new(layout).decode(id);
/// assert_eq!(decoded.generator_id, 5);
/// assert_eq!(decoded.unix_time(), Duration::from_millis(1_609_459_200_123));
/// # Ok::<(), flakeid::Error>(())
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Decoder {
    layout: BitLayout,
}

impl Decoder {
    pub const fn new(layout: BitLayout) -> Self {
        Self { layout }
    }

    pub const fn layout(&self) -> &BitLayout {
        &self.layout
    }

    /// Decodes `id`. Total: any integer decodes, bits above the layout width
    /// are ignored.
    pub fn decode(&self, id: SnowflakeId) -> DecodedId {
        let parts = self.layout.decode(id);
        let elapsed = from_units(parts.timestamp, self.layout.unit());
        DecodedId {
            id,
            timestamp: parts.timestamp,
            generator_id: parts.generator_id,
            sequence: parts.sequence,
            unix_time: self.layout.epoch().saturating_add(elapsed),
        }
    }
}

/// A decoded ID.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DecodedId {
    /// The ID that was decoded.
    pub id: SnowflakeId,
    /// Units since the layout epoch.
    pub timestamp: u64,
    pub generator_id: u64,
    pub sequence: u64,
    unix_time: Duration,
}

impl DecodedId {
    pub const fn parts(&self) -> IdParts {
        IdParts::new(self.timestamp, self.generator_id, self.sequence)
    }

    /// The issue instant as an offset from 1970-01-01 UTC.
    pub const fn unix_time(&self) -> Duration {
        self.unix_time
    }

    /// The issue instant as a [`SystemTime`], or `None` if it is not
    /// representable on this platform.
    pub fn system_time(&self) -> Option<SystemTime> {
        SystemTime::UNIX_EPOCH.checked_add(self.unix_time)
    }
}
