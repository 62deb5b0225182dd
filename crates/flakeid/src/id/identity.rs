use crate::{
    error::{Error, Result},
    id::layout::mask,
};

/// A generator identity split into a datacenter and a worker number.
///
/// The worker occupies the low `worker_bits` of the generator-id field and
/// the datacenter the bits above it. Whether the composed value fits the
/// layout is checked when the generator is constructed.
///
/// # Example
///
/// ```
/// use flakeid::NodeIdentity;
///
/// let node = NodeIdentity::new(3, 17);
/// let generator_id = node.compose(6)?;
/// assert_eq!(generator_id, (3 << 6) | 17);
/// assert_eq!(NodeIdentity::split(generator_id, 6), node);
/// # Ok::<(), flakeid::Error>(())
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NodeIdentity {
    pub datacenter: u64,
    pub worker: u64,
}

impl NodeIdentity {
    pub const fn new(datacenter: u64, worker: u64) -> Self {
        Self { datacenter, worker }
    }

    /// Packs the pair into a single generator id.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidLayout`] if `worker_bits` is 64 or more
    /// - [`Error::InvalidGeneratorId`] if the worker does not fit
    ///   `worker_bits`, or the datacenter cannot sit above it without losing
    ///   bits
    pub fn compose(&self, worker_bits: u8) -> Result<u64> {
        if worker_bits > 63 {
            return Err(Error::InvalidLayout {
                reason: "worker field must be narrower than 64 bits",
            });
        }
        let max_worker = mask(worker_bits);
        if self.worker > max_worker {
            return Err(Error::InvalidGeneratorId {
                id: self.worker,
                max: max_worker,
            });
        }
        let max_datacenter = u64::MAX >> worker_bits;
        if self.datacenter > max_datacenter {
            return Err(Error::InvalidGeneratorId {
                id: self.datacenter,
                max: max_datacenter,
            });
        }
        Ok((self.datacenter << worker_bits) | self.worker)
    }

    /// Inverse of [`Self::compose`].
    pub const fn split(generator_id: u64, worker_bits: u8) -> Self {
        if worker_bits > 63 {
            return Self::new(0, generator_id);
        }
        Self::new(generator_id >> worker_bits, generator_id & mask(worker_bits))
    }
}
