use core::time::Duration;

use crate::{
    error::Result,
    generator::WaitStrategy,
    id::{BitLayout, NodeIdentity},
    time::CUSTOM_EPOCH,
};

/// How a generator's identity is supplied.
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IdentityConfig {
    /// The generator id as a single number.
    Flat { generator_id: u64 },
    /// A datacenter and worker pair, the worker taking the low
    /// `worker_bits` of the generator-id field.
    Node {
        datacenter: u64,
        worker: u64,
        worker_bits: u8,
    },
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self::Flat { generator_id: 0 }
    }
}

/// Plain-data generator settings, for hosts that load them from a file or
/// environment.
///
/// Every field has a default (41/10/12 bits, the crate epoch, millisecond
/// ticks, generator id 0, [`WaitStrategy::Yield`]), so a partial document is
/// enough:
///
/// ```
/// # #[cfg(feature = "serde")] {
/// use flakeid::{GeneratorConfig, WaitStrategy};
///
/// let config: GeneratorConfig = serde_json::from_str(r#"{
///     "sequence_bits": 10,
///     "identity": { "datacenter": 2, "worker": 5, "worker_bits": 6 },
///     "wait": { "strategy": "sleep", "interval": { "secs": 0, "nanos": 100000 } }
/// }"#).unwrap();
///
/// assert_eq!(config.timestamp_bits, 41);
/// assert_eq!(config.generator_id().unwrap(), (2 << 6) | 5);
/// assert!(matches!(config.wait, WaitStrategy::Sleep { .. }));
/// # }
/// ```
///
/// Validation is deferred to [`Self::layout`] and [`Self::generator_id`].
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GeneratorConfig {
    pub timestamp_bits: u8,
    pub generator_id_bits: u8,
    pub sequence_bits: u8,
    /// Custom epoch in milliseconds since the Unix epoch.
    pub epoch_millis: u64,
    /// Length of one timestamp tick in milliseconds.
    pub unit_millis: u64,
    pub identity: IdentityConfig,
    pub wait: WaitStrategy,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let layout = BitLayout::default();
        Self {
            timestamp_bits: layout.timestamp_bits(),
            generator_id_bits: layout.generator_id_bits(),
            sequence_bits: layout.sequence_bits(),
            epoch_millis: u64::try_from(CUSTOM_EPOCH.as_millis()).unwrap_or(u64::MAX),
            unit_millis: 1,
            identity: IdentityConfig::default(),
            wait: WaitStrategy::default(),
        }
    }
}

impl GeneratorConfig {
    /// Builds and validates the [`BitLayout`].
    ///
    /// # Errors
    ///
    /// [`Error::LayoutTooWide`] or [`Error::InvalidLayout`] (including a zero
    /// `unit_millis`).
    ///
    /// [`Error::LayoutTooWide`]: crate::Error::LayoutTooWide
    /// [`Error::InvalidLayout`]: crate::Error::InvalidLayout
    pub fn layout(&self) -> Result<BitLayout> {
        BitLayout::new(
            self.timestamp_bits,
            self.generator_id_bits,
            self.sequence_bits,
        )?
        .with_epoch(Duration::from_millis(self.epoch_millis))
        .with_unit(Duration::from_millis(self.unit_millis))
    }

    /// Resolves the identity to a single generator id. Whether it fits the
    /// layout is checked when the generator is built.
    ///
    /// # Errors
    ///
    /// Any error from [`NodeIdentity::compose`].
    pub fn generator_id(&self) -> Result<u64> {
        match self.identity {
            IdentityConfig::Flat { generator_id } => Ok(generator_id),
            IdentityConfig::Node {
                datacenter,
                worker,
                worker_bits,
            } => NodeIdentity::new(datacenter, worker).compose(worker_bits),
        }
    }
}
