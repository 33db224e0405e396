//! Bit layout shared by every encoding.
//!
//! ```text
//!  Bit Index:  (49 + 63)        49 48               16 15             0
//!              +------------------+-------------------+---------------+
//!  Field:      | timestamp (63)   | host (16) pid(17) | sequence (16) |
//!              +------------------+-------------------+---------------+
//!              |<------------ MSB ---------- u128 ------- LSB ------->|
//! ```
//!
//! A `u64` container only keeps the low `64 - TIMESTAMP_SHIFT` bits of the
//! timestamp field; the `u128` container keeps all of it.
use core::fmt;

/// Width of the per-tick sequence field.
pub const SEQUENCE_BITS: u32 = 16;

/// Width of the process component of the node identity.
pub const PID_BITS: u32 = 17;

/// Width of the host component of the node identity.
pub const HOST_BITS: u32 = 16;

/// Width of the combined node identity (`host << PID_BITS | pid`).
pub const NODE_BITS: u32 = HOST_BITS + PID_BITS;

/// Width of the timestamp field.
pub const TIMESTAMP_BITS: u32 = 63;

/// Largest sequence value; also the sequence mask.
pub const MAX_SEQUENCE: u64 = (1 << SEQUENCE_BITS) - 1;

/// Largest process component; also the process mask.
pub const MAX_PID: u64 = (1 << PID_BITS) - 1;

/// Largest host component; also the host mask.
pub const MAX_HOST_ID: u64 = (1 << HOST_BITS) - 1;

/// Largest combined node identity; also the node mask.
pub const MAX_NODE_ID: u64 = (1 << NODE_BITS) - 1;

/// Largest elapsed-time delta accepted by the generator.
pub const MAX_TIMESTAMP: u64 = (1 << TIMESTAMP_BITS) - 1;

/// Shift placing the node identity above the sequence.
pub const NODE_SHIFT: u32 = SEQUENCE_BITS;

/// Shift placing the timestamp above the node identity and sequence.
pub const TIMESTAMP_SHIFT: u32 = NODE_BITS + SEQUENCE_BITS;

/// Multiplier moving a raw time delta into the timestamp field
/// (`1 << TIMESTAMP_SHIFT`).
pub const TIMESTAMP_SCALE: u64 = 1 << TIMESTAMP_SHIFT;

/// Width of the full layout. Only the `u128` container holds it entirely.
pub const ID_BITS: u32 = TIMESTAMP_BITS + NODE_BITS + SEQUENCE_BITS;

/// Width of the timestamp field that survives in a `u64` container.
pub const U64_TIMESTAMP_BITS: u32 = u64::BITS - TIMESTAMP_SHIFT;

const _: () = assert!(NODE_BITS + SEQUENCE_BITS < u64::BITS);
const _: () = assert!(ID_BITS <= u128::BITS);

/// The fields recovered from an integer-form identifier.
///
/// # Example
///
/// ```
/// use nodeflake::IdParts;
///
/// let parts = IdParts {
///     timestamp: 1000,
///     node_id: 7,
///     sequence: 3,
/// };
/// assert_eq!(IdParts::from_u128(parts.to_u128()), parts);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdParts {
    /// Elapsed time since the epoch, in the unit of the encoding that
    /// produced the identifier. From a `u64` only the low
    /// [`U64_TIMESTAMP_BITS`] bits are recoverable.
    pub timestamp: u64,
    /// The unshifted node identity.
    pub node_id: u64,
    /// The masked sequence value.
    pub sequence: u64,
}

impl IdParts {
    /// Splits a `u64` identifier into its fields.
    pub const fn from_u64(id: u64) -> Self {
        Self {
            timestamp: id >> TIMESTAMP_SHIFT,
            node_id: (id >> NODE_SHIFT) & MAX_NODE_ID,
            sequence: id & MAX_SEQUENCE,
        }
    }

    /// Splits a `u128` identifier into its fields.
    pub const fn from_u128(id: u128) -> Self {
        Self {
            timestamp: (id >> TIMESTAMP_SHIFT) as u64 & MAX_TIMESTAMP,
            node_id: (id >> NODE_SHIFT) as u64 & MAX_NODE_ID,
            sequence: id as u64 & MAX_SEQUENCE,
        }
    }

    /// Packs the fields into a `u64`, truncating the timestamp to the bits
    /// the container can hold.
    pub const fn to_u64(&self) -> u64 {
        self.timestamp.wrapping_mul(TIMESTAMP_SCALE)
            | ((self.node_id & MAX_NODE_ID) << NODE_SHIFT)
            | (self.sequence & MAX_SEQUENCE)
    }

    /// Packs the fields into a `u128`.
    pub const fn to_u128(&self) -> u128 {
        ((self.timestamp & MAX_TIMESTAMP) as u128) * (TIMESTAMP_SCALE as u128)
            + (((self.node_id & MAX_NODE_ID) << NODE_SHIFT) | (self.sequence & MAX_SEQUENCE))
                as u128
    }
}

impl fmt::Display for IdParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "timestamp={} node_id={} sequence={}",
            self.timestamp, self.node_id, self.sequence
        )
    }
}
