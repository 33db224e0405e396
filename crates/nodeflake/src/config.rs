use core::time::Duration;

use crate::{
    error::Result,
    identity::{
        HostnameSource, NodeIdentity, NodeIdentityResolver, OverflowPolicy, Resolution,
        SystemHostname,
    },
    time::DEFAULT_EPOCH,
};

/// Immutable, resolved configuration shared by the generators of one process.
///
/// Resolution happens once, in [`GeneratorConfigBuilder::build`]. A failed
/// resolution is kept inside the config, and every
/// [`crate::Generator::new`] against it fails with the collected errors; to
/// retry, build a new config with corrected inputs. Generators copy what they
/// need at construction, so a new config never affects generators that
/// already exist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    resolution: Resolution,
    epoch: Duration,
}

impl GeneratorConfig {
    /// Starts a builder with the OS process id, the system hostname and
    /// [`DEFAULT_EPOCH`].
    pub fn builder() -> GeneratorConfigBuilder {
        GeneratorConfigBuilder::default()
    }

    /// Wraps an existing resolution.
    pub fn from_resolution(resolution: Resolution, epoch: Duration) -> Self {
        Self { resolution, epoch }
    }

    /// The full resolution outcome, including clamping diagnostics.
    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    /// The resolved identity, or `None` if resolution failed.
    pub fn node_identity(&self) -> Option<&NodeIdentity> {
        self.resolution.identity()
    }

    /// The instant elapsed time is measured from, as a duration since the
    /// Unix epoch.
    pub fn epoch(&self) -> Duration {
        self.epoch
    }

    /// Returns the identity or the collected resolution errors.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Resolution`] if resolution failed.
    pub fn try_identity(&self) -> Result<NodeIdentity> {
        self.resolution.clone().into_identity()
    }
}

impl Default for GeneratorConfig {
    /// Resolves from the OS process id and hostname with the default epoch.
    fn default() -> Self {
        GeneratorConfigBuilder::default().build()
    }
}

/// Builder for [`GeneratorConfig`].
///
/// # Example
///
/// ```
/// use core::time::Duration;
/// use nodeflake::{GeneratorConfig, OverflowPolicy, StaticHostname};
///
/// let config = GeneratorConfig::builder()
///     .process_override(12)
///     .hostname_source(StaticHostname::new("db-3"))
///     .overflow_policy(OverflowPolicy::Reject)
///     .epoch(Duration::from_millis(1_700_000_000_000))
///     .build();
///
/// assert_eq!(config.node_identity().unwrap().process_component(), 12);
/// ```
pub struct GeneratorConfigBuilder {
    resolver: NodeIdentityResolver,
    hostname: Box<dyn HostnameSource>,
    epoch: Duration,
}

impl Default for GeneratorConfigBuilder {
    fn default() -> Self {
        Self {
            resolver: NodeIdentityResolver::new(),
            hostname: Box::new(SystemHostname),
            epoch: DEFAULT_EPOCH,
        }
    }
}

impl GeneratorConfigBuilder {
    /// Replaces the OS process id as the process component seed.
    #[must_use]
    pub fn process_override(mut self, process: u64) -> Self {
        self.resolver = self.resolver.process_seed(process);
        self
    }

    /// Replaces the hashed hostname as the host component seed.
    #[must_use]
    pub fn host_override(mut self, host: u64) -> Self {
        self.resolver = self.resolver.host_seed(host);
        self
    }

    /// Replaces [`SystemHostname`] as the source of the hostname to hash.
    /// Ignored when a host override is set.
    #[must_use]
    pub fn hostname_source(mut self, source: impl HostnameSource + 'static) -> Self {
        self.hostname = Box::new(source);
        self
    }

    /// Chooses between clamping and rejecting out-of-range components.
    #[must_use]
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.resolver = self.resolver.policy(policy);
        self
    }

    /// Replaces [`DEFAULT_EPOCH`]; given as a duration since the Unix epoch.
    #[must_use]
    pub fn epoch(mut self, epoch: Duration) -> Self {
        self.epoch = epoch;
        self
    }

    /// Resolves the node identity and freezes the configuration.
    pub fn build(self) -> GeneratorConfig {
        let resolution = self.resolver.resolve(self.hostname.as_ref());

        #[cfg(feature = "tracing")]
        {
            match resolution.identity() {
                Some(identity) => tracing::debug!("Resolved node identity {identity}"),
                None => tracing::warn!(
                    "Node identity resolution failed with {} error(s)",
                    resolution.errors().len()
                ),
            }
        }

        GeneratorConfig {
            resolution,
            epoch: self.epoch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, MAX_PID, StaticHostname, host_component};

    #[test]
    fn builder_threads_overrides_into_resolution() {
        let config = GeneratorConfig::builder()
            .process_override(3)
            .hostname_source(StaticHostname::new("cache-1"))
            .build();
        let identity = config.node_identity().unwrap();
        assert_eq!(identity.process_component(), 3);
        assert_eq!(identity.host_component(), host_component("cache-1"));
        assert_eq!(config.epoch(), DEFAULT_EPOCH);
    }

    #[test]
    fn host_override_wins_over_hostname_source() {
        let config = GeneratorConfig::builder()
            .process_override(3)
            .host_override(77)
            .hostname_source(StaticHostname::new("ignored"))
            .build();
        assert_eq!(config.node_identity().unwrap().host_component(), 77);
    }

    #[test]
    fn failed_resolution_is_retained() {
        let config = GeneratorConfig::builder()
            .process_override(MAX_PID + 1)
            .host_override(1)
            .overflow_policy(OverflowPolicy::Reject)
            .build();
        assert!(config.node_identity().is_none());
        assert!(matches!(
            config.try_identity(),
            Err(Error::Resolution { ref errors }) if errors.len() == 1
        ));
        // Still failing on a second look.
        assert!(config.try_identity().is_err());
    }

    #[test]
    fn custom_epoch_is_kept() {
        let epoch = Duration::from_secs(1_700_000_000);
        let config = GeneratorConfig::builder()
            .process_override(1)
            .host_override(1)
            .epoch(epoch)
            .build();
        assert_eq!(config.epoch(), epoch);
    }
}
