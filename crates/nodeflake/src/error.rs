use core::fmt;

/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// The identifier field a [`Error::FieldOverflow`] refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Field {
    /// The process component of the node identity.
    Process,
    /// The host component of the node identity.
    Host,
    /// The combined host and process node identity.
    Node,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Process => "process id",
            Self::Host => "host id",
            Self::Node => "node id",
        };
        f.write_str(name)
    }
}

/// All error variants that `nodeflake` can emit.
///
/// Resolution errors ([`Error::FieldOverflow`], [`Error::HostResolution`])
/// surface when a [`crate::NodeIdentity`] is built. Generation errors
/// ([`Error::TimestampOverflow`]) surface per call and never corrupt the
/// sequence counter.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A node identity component does not fit its bit budget.
    ///
    /// Under [`crate::OverflowPolicy::Clamp`] this is a diagnostic: the value
    /// was reduced modulo `max` and resolution continued. Under
    /// [`crate::OverflowPolicy::Reject`] it fails resolution.
    #[error("too big {field}: {value}. Max: {max}")]
    FieldOverflow { field: Field, value: u64, max: u64 },

    /// The local hostname could not be determined.
    #[error("host resolution failed: {reason}")]
    HostResolution { reason: String },

    /// Elapsed time since the epoch no longer fits the timestamp field.
    #[error("too big timestamp: {elapsed}. Max: {max}")]
    TimestampOverflow { elapsed: u64, max: u64 },

    /// Node identity resolution failed; holds every error collected while
    /// resolving.
    #[error("node identity resolution failed: {}", join(.errors))]
    Resolution { errors: Vec<Error> },
}

fn join(errors: &[Error]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
