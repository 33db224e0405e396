use anyhow::bail;
use clap::{Parser, ValueEnum};
use nodeflake::{GeneratorConfig, OverflowPolicy};

/// Which serialization to print.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// Millisecond epoch packed into a 64-bit integer.
    U64,
    /// Nanosecond epoch packed into a 128-bit integer.
    U128,
    /// Nanosecond epoch as a decimal concatenation.
    String,
}

/// How identifiers are produced.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// One generation call per identifier.
    Single,
    /// One reservation for all identifiers.
    Batch,
    /// A background producer feeding a channel.
    Stream,
}

/// Runtime configuration for the `nodeflake` binary.
///
/// All values are parsed from CLI arguments or environment variables (a
/// `.env` file is loaded first, if present).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "nodeflake",
    version,
    about = "Prints coordination-free, roughly time-ordered identifiers"
)]
pub struct CliArgs {
    /// Output encoding.
    ///
    /// Environment variable: `NODEFLAKE_FORMAT`
    #[arg(long, env = "NODEFLAKE_FORMAT", value_enum, default_value_t = Format::U64)]
    pub format: Format,

    /// Number of identifiers to print.
    ///
    /// Environment variable: `NODEFLAKE_COUNT`
    #[arg(short = 'n', long, env = "NODEFLAKE_COUNT", default_value_t = 1)]
    pub count: u32,

    /// Generation mode.
    ///
    /// Environment variable: `NODEFLAKE_MODE`
    #[arg(long, env = "NODEFLAKE_MODE", value_enum, default_value_t = Mode::Single)]
    pub mode: Mode,

    /// Process component override; defaults to the OS process id.
    ///
    /// Environment variable: `NODEFLAKE_PID`
    #[arg(long, env = "NODEFLAKE_PID")]
    pub pid: Option<u64>,

    /// Host component override; defaults to a hash of the OS hostname.
    ///
    /// Environment variable: `NODEFLAKE_HOST`
    #[arg(long, env = "NODEFLAKE_HOST")]
    pub host: Option<u64>,

    /// Fail instead of clamping when a node identity component is out of
    /// range.
    ///
    /// Environment variable: `NODEFLAKE_REJECT_OVERFLOW`
    #[arg(long, env = "NODEFLAKE_REJECT_OVERFLOW", default_value_t = false)]
    pub reject_overflow: bool,

    /// Channel capacity of the streaming producer.
    ///
    /// Environment variable: `NODEFLAKE_STREAM_BUFFER`
    #[arg(long, env = "NODEFLAKE_STREAM_BUFFER", default_value_t = 64)]
    pub buffer: usize,
}

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub format: Format,
    pub count: u32,
    pub mode: Mode,
    pub pid: Option<u64>,
    pub host: Option<u64>,
    pub policy: OverflowPolicy,
    pub buffer: usize,
}

impl TryFrom<CliArgs> for CliConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.count == 0 {
            bail!("NODEFLAKE_COUNT must be greater than 0");
        }

        if args.buffer == 0 {
            bail!("NODEFLAKE_STREAM_BUFFER must be greater than 0");
        }

        let policy = if args.reject_overflow {
            OverflowPolicy::Reject
        } else {
            OverflowPolicy::Clamp
        };

        Ok(Self {
            format: args.format,
            count: args.count,
            mode: args.mode,
            pid: args.pid,
            host: args.host,
            policy,
            buffer: args.buffer,
        })
    }
}

impl CliConfig {
    /// Builds the library configuration, resolving the node identity.
    pub fn generator_config(&self) -> GeneratorConfig {
        let mut builder = GeneratorConfig::builder().overflow_policy(self.policy);
        if let Some(pid) = self.pid {
            builder = builder.process_override(pid);
        }
        if let Some(host) = self.host {
            builder = builder.host_override(host);
        }
        builder.build()
    }
}
