//! Coordination-free, roughly time-ordered identifiers.
//!
//! Every process derives a [`NodeIdentity`] from its host and process
//! components, then stamps each identifier with the elapsed time since a fixed
//! epoch, that node identity, and a value taken from a per-generator
//! [`SequenceCounter`]. The same layout is available in three encodings:
//!
//! - [`U64Encoding`]: millisecond epoch, packed into a `u64`.
//! - [`U128Encoding`]: nanosecond epoch, packed into a `u128` without
//!   truncating the timestamp field.
//! - [`DecimalEncoding`]: nanosecond epoch, the decimal delta immediately
//!   followed by the decimal `node | sequence` value.
//!
//! # Example
//!
//! ```
//! use nodeflake::{Generator, GeneratorConfig, IdParts, StaticHostname};
//!
//! let config = GeneratorConfig::builder()
//!     .process_override(42)
//!     .hostname_source(StaticHostname::new("build-host"))
//!     .build();
//! let generator = Generator::new(&config).unwrap();
//!
//! let id = generator.next_u64().unwrap();
//! let parts = IdParts::from_u64(id);
//! assert_eq!(parts.node_id, generator.node_identity().node_id());
//! ```
mod config;
mod encoding;
mod error;
mod generator;
mod identity;
mod layout;
mod sequence;
#[cfg(feature = "async-tokio")]
mod stream;
mod time;

pub use crate::config::*;
pub use crate::encoding::*;
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::identity::*;
pub use crate::layout::*;
pub use crate::sequence::*;
#[cfg(feature = "async-tokio")]
pub use crate::stream::*;
pub use crate::time::*;
