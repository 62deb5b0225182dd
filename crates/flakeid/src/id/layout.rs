use core::time::Duration;

use crate::{
    error::{Error, Field, Result},
    id::{IdParts, SnowflakeId},
    time::{CUSTOM_EPOCH, DISCORD_EPOCH, INSTAGRAM_EPOCH, TWITTER_EPOCH, from_units, to_units},
};

/// Usable bits of a layout. Bit 63 stays clear so every ID is also a
/// non-negative `i64`.
pub const MAX_LAYOUT_BITS: u32 = 63;

/// All-ones value of a `bits`-wide field. `bits` must be at most 64.
pub(crate) const fn mask(bits: u8) -> u64 {
    if bits == 0 { 0 } else { u64::MAX >> (64 - bits as u32) }
}

/// How an ID's bits are split between timestamp, generator identity and
/// sequence, plus the epoch and unit the timestamp is measured in.
///
/// Fields are packed most-significant first:
///
/// ```text
///  Bit Index:  63           63 62                            0
///              +--------------+-----------+--------------+----------+
///  Field:      | reserved (1) | timestamp | generator id | sequence |
///              +--------------+-----------+--------------+----------+
///              |<------- MSB ---------- 64 bits ---------- LSB ---->|
/// ```
///
/// Unused high bits (when the widths sum to less than 63) are zero. The
/// layout is immutable and `Copy`; generators and decoders each keep their
/// own copy.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use flakeid::{BitLayout, IdParts};
///
/// let layout = BitLayout::new(41, 10, 12)?.with_epoch(Duration::from_millis(1_609_459_200_000));
///
/// let id = layout.encode(123, 5, 1)?;
/// assert_eq!(layout.decode(id), IdParts::new(123, 5, 1));
/// # Ok::<(), flakeid::Error>(())
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BitLayout {
    timestamp_bits: u8,
    generator_id_bits: u8,
    sequence_bits: u8,
    epoch: Duration,
    unit: Duration,
}

impl Default for BitLayout {
    /// 41 timestamp bits, 10 generator bits, 12 sequence bits, millisecond
    /// units since [`CUSTOM_EPOCH`].
    fn default() -> Self {
        Self::preset(CUSTOM_EPOCH, 41, 10, 12)
    }
}

impl BitLayout {
    /// Creates a layout with the given field widths, measured in milliseconds
    /// since [`CUSTOM_EPOCH`].
    ///
    /// # Errors
    ///
    /// - [`Error::LayoutTooWide`] if the widths sum beyond
    ///   [`MAX_LAYOUT_BITS`]
    /// - [`Error::InvalidLayout`] if `timestamp_bits` is zero
    pub fn new(timestamp_bits: u8, generator_id_bits: u8, sequence_bits: u8) -> Result<Self> {
        let bits =
            u32::from(timestamp_bits) + u32::from(generator_id_bits) + u32::from(sequence_bits);
        if bits > MAX_LAYOUT_BITS {
            return Err(Error::LayoutTooWide {
                bits,
                max: MAX_LAYOUT_BITS,
            });
        }
        if timestamp_bits == 0 {
            return Err(Error::InvalidLayout {
                reason: "timestamp field must be at least one bit wide",
            });
        }
        Ok(Self::preset(
            CUSTOM_EPOCH,
            timestamp_bits,
            generator_id_bits,
            sequence_bits,
        ))
    }

    const fn preset(epoch: Duration, ts: u8, gen_id: u8, seq: u8) -> Self {
        Self {
            timestamp_bits: ts,
            generator_id_bits: gen_id,
            sequence_bits: seq,
            epoch,
            unit: Duration::from_millis(1),
        }
    }

    /// Twitter layout: 41/10/12 in milliseconds since [`TWITTER_EPOCH`].
    pub const fn twitter() -> Self {
        Self::preset(TWITTER_EPOCH, 41, 10, 12)
    }

    /// 41/10/12 in milliseconds since [`DISCORD_EPOCH`]. Discord itself uses
    /// a 42-bit timestamp that needs the reserved bit.
    pub const fn discord() -> Self {
        Self::preset(DISCORD_EPOCH, 41, 10, 12)
    }

    /// Instagram layout: 41/13/10 in milliseconds since [`INSTAGRAM_EPOCH`].
    pub const fn instagram() -> Self {
        Self::preset(INSTAGRAM_EPOCH, 41, 13, 10)
    }

    /// Replaces the epoch, given as an offset from 1970-01-01 UTC.
    #[must_use]
    pub const fn with_epoch(mut self, epoch: Duration) -> Self {
        self.epoch = epoch;
        self
    }

    /// Replaces the time unit (the resolution of the timestamp field).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLayout`] if `unit` is zero.
    pub fn with_unit(mut self, unit: Duration) -> Result<Self> {
        if unit.is_zero() {
            return Err(Error::InvalidLayout {
                reason: "time unit must be non-zero",
            });
        }
        self.unit = unit;
        Ok(self)
    }

    pub const fn timestamp_bits(&self) -> u8 {
        self.timestamp_bits
    }

    pub const fn generator_id_bits(&self) -> u8 {
        self.generator_id_bits
    }

    pub const fn sequence_bits(&self) -> u8 {
        self.sequence_bits
    }

    /// Sum of the three field widths.
    pub const fn total_bits(&self) -> u32 {
        self.timestamp_bits as u32 + self.generator_id_bits as u32 + self.sequence_bits as u32
    }

    /// Offset of the epoch from 1970-01-01 UTC.
    pub const fn epoch(&self) -> Duration {
        self.epoch
    }

    /// Duration of one timestamp tick.
    pub const fn unit(&self) -> Duration {
        self.unit
    }

    pub const fn max_timestamp(&self) -> u64 {
        mask(self.timestamp_bits)
    }

    pub const fn max_generator_id(&self) -> u64 {
        mask(self.generator_id_bits)
    }

    pub const fn max_sequence(&self) -> u64 {
        mask(self.sequence_bits)
    }

    pub const fn timestamp_shift(&self) -> u32 {
        self.generator_id_bits as u32 + self.sequence_bits as u32
    }

    pub const fn generator_id_shift(&self) -> u32 {
        self.sequence_bits as u32
    }

    /// How long after the epoch the timestamp field runs out.
    pub fn lifespan(&self) -> Duration {
        from_units(self.max_timestamp(), self.unit).saturating_add(self.unit)
    }

    /// The epoch expressed in units since the Unix epoch.
    pub fn epoch_units(&self) -> u64 {
        to_units(self.epoch, self.unit)
    }

    /// Translates a clock reading (units since the Unix epoch) into a
    /// timestamp field value (units since this layout's epoch).
    ///
    /// # Errors
    ///
    /// - [`Error::BeforeEpoch`] if `now` predates the epoch
    /// - [`Error::FieldOverflow`] if the layout's lifespan is exhausted
    pub fn elapsed_units(&self, now: u64) -> Result<u64> {
        let epoch = self.epoch_units();
        let elapsed = now
            .checked_sub(epoch)
            .ok_or(Error::BeforeEpoch { now, epoch })?;
        self.check(Field::Timestamp, elapsed)
    }

    /// Returns `value` if it fits `field`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldOverflow`] otherwise.
    pub fn check(&self, field: Field, value: u64) -> Result<u64> {
        let max = match field {
            Field::Timestamp => self.max_timestamp(),
            Field::GeneratorId => self.max_generator_id(),
            Field::Sequence => self.max_sequence(),
        };
        if value > max {
            return Err(Error::FieldOverflow { field, value, max });
        }
        Ok(value)
    }

    /// Packs the three fields into an ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldOverflow`] if any value exceeds its field width.
    pub fn encode(&self, timestamp: u64, generator_id: u64, sequence: u64) -> Result<SnowflakeId> {
        let timestamp = self.check(Field::Timestamp, timestamp)?;
        let generator_id = self.check(Field::GeneratorId, generator_id)?;
        let sequence = self.check(Field::Sequence, sequence)?;
        Ok(self.pack(timestamp, generator_id, sequence))
    }

    /// [`Self::encode`] for an [`IdParts`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldOverflow`] if any value exceeds its field width.
    pub fn encode_parts(&self, parts: IdParts) -> Result<SnowflakeId> {
        self.encode(parts.timestamp, parts.generator_id, parts.sequence)
    }

    // Callers have range-checked every field.
    fn pack(&self, timestamp: u64, generator_id: u64, sequence: u64) -> SnowflakeId {
        let raw = (timestamp << self.timestamp_shift())
            | (generator_id << self.generator_id_shift())
            | sequence;
        SnowflakeId::from_raw(raw)
    }

    /// Unpacks an ID. Bits above [`Self::total_bits`] are ignored.
    pub const fn decode(&self, id: SnowflakeId) -> IdParts {
        let raw = id.to_raw();
        IdParts {
            timestamp: (raw >> self.timestamp_shift()) & self.max_timestamp(),
            generator_id: (raw >> self.generator_id_shift()) & self.max_generator_id(),
            sequence: raw & self.max_sequence(),
        }
    }
}
