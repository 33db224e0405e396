use std::fmt;

use crate::{
    error::{Error, Field, Result},
    layout::{MAX_HOST_ID, MAX_NODE_ID, MAX_PID, NODE_SHIFT, PID_BITS},
};

/// The host and process components that disambiguate which process minted an
/// identifier.
///
/// A `NodeIdentity` is produced by [`NodeIdentityResolver::resolve`] and is
/// immutable afterwards. Both components are always within their bit budget.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeIdentity {
    process: u64,
    host: u64,
    node_id: u64,
}

impl NodeIdentity {
    /// The process component, at most [`MAX_PID`].
    pub const fn process_component(&self) -> u64 {
        self.process
    }

    /// The host component, at most [`MAX_HOST_ID`].
    pub const fn host_component(&self) -> u64 {
        self.host
    }

    /// The combined `host << PID_BITS | process` value, at most
    /// [`MAX_NODE_ID`].
    pub const fn node_id(&self) -> u64 {
        self.node_id
    }

    /// The node id moved into its position within the identifier layout.
    pub const fn shifted(&self) -> u64 {
        self.node_id << NODE_SHIFT
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (host={}, process={})",
            self.node_id, self.host, self.process
        )
    }
}

/// What the resolver does with a component that exceeds its bit budget.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum OverflowPolicy {
    /// Reduce the value modulo its maximum and record a
    /// [`Error::FieldOverflow`] diagnostic.
    ///
    /// Reduction folds distinct inputs onto the same component, which raises
    /// the collision probability between nodes.
    #[default]
    Clamp,
    /// Fail resolution with [`Error::FieldOverflow`].
    Reject,
}

/// Source of the local hostname used to derive the host component.
pub trait HostnameSource: Send + Sync {
    /// Returns the hostname.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HostResolution`] if the hostname cannot be determined.
    fn hostname(&self) -> Result<String>;
}

/// Reads the hostname from the operating system (`gethostname(2)` on Unix,
/// `GetComputerNameExW` on Windows). In containers the hostname is usually
/// the container id.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemHostname;

impl HostnameSource for SystemHostname {
    fn hostname(&self) -> Result<String> {
        let name = gethostname::gethostname()
            .into_string()
            .map_err(|raw| Error::HostResolution {
                reason: format!("hostname is not valid UTF-8: {raw:?}"),
            })?;

        let name = name.trim();
        if name.is_empty() {
            return Err(Error::HostResolution {
                reason: "operating system reported an empty hostname".to_owned(),
            });
        }
        Ok(name.to_owned())
    }
}

/// A fixed hostname, for tests and for deployments that assign one
/// explicitly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticHostname(String);

impl StaticHostname {
    /// Wraps `name` as the hostname to hash.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl HostnameSource for StaticHostname {
    fn hostname(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Hashes a hostname down to a 16-bit host component.
///
/// Uses 64-bit FNV-1a folded onto 16 bits, so the value is stable across
/// processes, builds and platforms.
pub fn host_component(hostname: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let hash = hostname
        .bytes()
        .fold(OFFSET, |h, b| (h ^ u64::from(b)).wrapping_mul(PRIME));
    (hash ^ (hash >> 16) ^ (hash >> 32) ^ (hash >> 48)) & MAX_HOST_ID
}

/// Outcome of resolving a [`NodeIdentity`].
///
/// `diagnostics` holds soft errors (clamped components); `errors` holds the
/// failures that prevent an identity from being produced. Soft errors never
/// block construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    identity: Option<NodeIdentity>,
    diagnostics: Vec<Error>,
    errors: Vec<Error>,
}

impl Resolution {
    /// The resolved identity, if resolution succeeded.
    pub fn identity(&self) -> Option<&NodeIdentity> {
        self.identity.as_ref()
    }

    /// Soft errors recorded while clamping.
    pub fn diagnostics(&self) -> &[Error] {
        &self.diagnostics
    }

    /// Errors that made resolution fail.
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Whether an identity was produced. Diagnostics alone do not fail
    /// resolution.
    pub fn is_ok(&self) -> bool {
        self.identity.is_some()
    }

    /// Converts into the identity, or [`Error::Resolution`] carrying every
    /// collected error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolution`] if resolution failed.
    pub fn into_identity(self) -> Result<NodeIdentity> {
        self.identity.ok_or(Error::Resolution {
            errors: self.errors,
        })
    }
}

/// Derives a [`NodeIdentity`] from a process seed and a host seed.
///
/// Without explicit seeds the process component is the OS process id and the
/// host component is [`host_component`] of the local hostname.
///
/// # Example
///
/// ```
/// use nodeflake::{Error, NodeIdentityResolver, StaticHostname, MAX_PID};
///
/// let resolution = NodeIdentityResolver::new()
///     .process_seed(MAX_PID + 5)
///     .resolve(&StaticHostname::new("node-a"));
///
/// let identity = resolution.identity().unwrap();
/// assert_eq!(identity.process_component(), 5);
/// assert!(matches!(resolution.diagnostics(), [Error::FieldOverflow { .. }]));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeIdentityResolver {
    process_seed: Option<u64>,
    host_seed: Option<u64>,
    policy: OverflowPolicy,
}

impl NodeIdentityResolver {
    /// A resolver using the OS process id, the local hostname and
    /// [`OverflowPolicy::Clamp`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `seed` instead of the OS process id.
    #[must_use]
    pub fn process_seed(mut self, seed: u64) -> Self {
        self.process_seed = Some(seed);
        self
    }

    /// Uses `seed` instead of hashing the hostname.
    #[must_use]
    pub fn host_seed(mut self, seed: u64) -> Self {
        self.host_seed = Some(seed);
        self
    }

    /// Chooses between clamping and rejecting out-of-range components.
    #[must_use]
    pub fn policy(mut self, policy: OverflowPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resolves the identity, consulting `hostname` only when no host seed
    /// was given.
    pub fn resolve(&self, hostname: &dyn HostnameSource) -> Resolution {
        let mut diagnostics = Vec::new();
        let mut errors = Vec::new();

        let process_seed = self
            .process_seed
            .unwrap_or_else(|| u64::from(std::process::id()));
        let process = self.reduce(
            Field::Process,
            process_seed,
            MAX_PID,
            &mut diagnostics,
            &mut errors,
        );

        let host_seed = match self.host_seed {
            Some(seed) => Some(seed),
            None => match hostname.hostname() {
                Ok(name) => Some(host_component(&name)),
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!("{e}");
                    errors.push(e);
                    None
                }
            },
        };
        let host = host_seed.map(|seed| {
            self.reduce(Field::Host, seed, MAX_HOST_ID, &mut diagnostics, &mut errors)
        });

        let identity = match host {
            Some(host) if errors.is_empty() => {
                let combined = (host << PID_BITS) | process;
                let node_id = self.reduce(
                    Field::Node,
                    combined,
                    MAX_NODE_ID,
                    &mut diagnostics,
                    &mut errors,
                );
                errors.is_empty().then_some(NodeIdentity {
                    process,
                    host,
                    node_id,
                })
            }
            _ => None,
        };

        Resolution {
            identity,
            diagnostics,
            errors,
        }
    }

    fn reduce(
        &self,
        field: Field,
        value: u64,
        max: u64,
        diagnostics: &mut Vec<Error>,
        errors: &mut Vec<Error>,
    ) -> u64 {
        if value <= max {
            return value;
        }

        let err = Error::FieldOverflow { field, value, max };
        match self.policy {
            OverflowPolicy::Clamp => {
                #[cfg(feature = "tracing")]
                tracing::warn!("{err}; reducing to {}", value % max);
                diagnostics.push(err);
            }
            OverflowPolicy::Reject => {
                #[cfg(feature = "tracing")]
                tracing::error!("{err}");
                errors.push(err);
            }
        }
        value % max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoHostname;

    impl HostnameSource for NoHostname {
        fn hostname(&self) -> Result<String> {
            Err(Error::HostResolution {
                reason: "lookup failed".to_owned(),
            })
        }
    }

    fn resolve(process: u64, host: u64) -> Resolution {
        NodeIdentityResolver::new()
            .process_seed(process)
            .host_seed(host)
            .resolve(&NoHostname)
    }

    #[test]
    fn combines_host_above_process() {
        let resolution = resolve(7, 3);
        let identity = resolution.identity().unwrap();
        assert_eq!(identity.process_component(), 7);
        assert_eq!(identity.host_component(), 3);
        assert_eq!(identity.node_id(), (3 << PID_BITS) | 7);
        assert_eq!(identity.shifted(), ((3 << PID_BITS) | 7) << NODE_SHIFT);
        assert!(resolution.diagnostics().is_empty());
    }

    #[test]
    fn max_components_fill_node_field() {
        let identity = resolve(MAX_PID, MAX_HOST_ID).into_identity().unwrap();
        assert_eq!(identity.node_id(), MAX_NODE_ID);
    }

    // Clamping is modulo `max`, not `max + 1`, so `MAX_PID + 1` lands on 1
    // and collides with a process whose id really is 1.
    #[test]
    fn process_overflow_is_clamped_with_diagnostic() {
        let resolution = resolve(MAX_PID + 5, 1);
        let identity = resolution.identity().unwrap();
        assert_eq!(identity.process_component(), 5 % MAX_PID);
        assert_eq!(
            resolution.diagnostics(),
            &[Error::FieldOverflow {
                field: Field::Process,
                value: MAX_PID + 5,
                max: MAX_PID,
            }]
        );
        assert!(resolution.errors().is_empty());
    }

    #[test]
    fn clamping_collides_distinct_processes() {
        let clamped = resolve(MAX_PID + 1, 9).into_identity().unwrap();
        let genuine = resolve(1, 9).into_identity().unwrap();
        assert_eq!(clamped.node_id(), genuine.node_id());
    }

    #[test]
    fn host_overflow_is_clamped_with_diagnostic() {
        let resolution = resolve(1, MAX_HOST_ID + 2);
        assert_eq!(resolution.identity().unwrap().host_component(), 2);
        assert_eq!(resolution.diagnostics().len(), 1);
    }

    #[test]
    fn reject_policy_fails_resolution() {
        let resolution = NodeIdentityResolver::new()
            .process_seed(MAX_PID + 5)
            .host_seed(1)
            .policy(OverflowPolicy::Reject)
            .resolve(&NoHostname);
        assert!(!resolution.is_ok());
        assert!(resolution.diagnostics().is_empty());
        let err = resolution.into_identity().unwrap_err();
        assert_eq!(
            err,
            Error::Resolution {
                errors: vec![Error::FieldOverflow {
                    field: Field::Process,
                    value: MAX_PID + 5,
                    max: MAX_PID,
                }]
            }
        );
    }

    #[test]
    fn hostname_failure_fails_resolution() {
        let resolution = NodeIdentityResolver::new()
            .process_seed(1)
            .resolve(&NoHostname);
        assert!(resolution.identity().is_none());
        assert!(matches!(
            resolution.errors(),
            [Error::HostResolution { .. }]
        ));
    }

    #[test]
    fn hostname_failure_and_overflow_are_both_reported() {
        let resolution = NodeIdentityResolver::new()
            .process_seed(MAX_PID + 5)
            .resolve(&NoHostname);
        assert_eq!(resolution.diagnostics().len(), 1);
        assert_eq!(resolution.errors().len(), 1);
    }

    #[test]
    fn host_seed_skips_hostname_lookup() {
        assert!(resolve(1, 1).is_ok());
    }

    #[test]
    fn hostname_is_hashed_into_host_component() {
        let identity = NodeIdentityResolver::new()
            .process_seed(1)
            .resolve(&StaticHostname::new("web-1"))
            .into_identity()
            .unwrap();
        assert_eq!(identity.host_component(), host_component("web-1"));
    }

    #[test]
    fn host_component_is_stable_and_bounded() {
        assert_eq!(host_component("web-1"), host_component("web-1"));
        assert_ne!(host_component("web-1"), host_component("web-2"));
        assert!(host_component("a-rather-long-container-id-0123456789") <= MAX_HOST_ID);
        // FNV-1a of the empty input is the offset basis.
        let basis: u64 = 0xcbf2_9ce4_8422_2325;
        assert_eq!(
            host_component(""),
            (basis ^ (basis >> 16) ^ (basis >> 32) ^ (basis >> 48)) & MAX_HOST_ID
        );
    }

    #[test]
    fn default_process_seed_is_pid() {
        let identity = NodeIdentityResolver::new()
            .host_seed(1)
            .resolve(&NoHostname)
            .into_identity()
            .unwrap();
        let pid = u64::from(std::process::id());
        let expected = if pid > MAX_PID { pid % MAX_PID } else { pid };
        assert_eq!(identity.process_component(), expected);
    }

    #[test]
    fn system_hostname_matches_os() {
        let expected = gethostname::gethostname();
        let name = SystemHostname.hostname().unwrap();
        assert!(!name.is_empty());
        assert_eq!(name, expected.to_string_lossy().trim());
    }

    #[test]
    fn system_hostname_resolves_identity() {
        let identity = NodeIdentityResolver::new()
            .process_seed(1)
            .resolve(&SystemHostname)
            .into_identity()
            .unwrap();
        let name = SystemHostname.hostname().unwrap();
        assert_eq!(identity.host_component(), host_component(&name));
    }
}
