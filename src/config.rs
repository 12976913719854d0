use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use tracing::trace;

use crate::Service;
use crate::validate::{ServiceError, is_valid_phone_number, parse_service};

const DEFAULT_THRESHOLD: usize = 1;
const DEFAULT_INTERVAL_MINUTES: u64 = 1;
const DEFAULT_MSG_LIMIT: usize = 1;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Checks multiple hosts/services, sends a text message if down.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "sms-notify", version, about)]
pub struct Args {
    /// JSON config file (command line values take precedence)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Keep running and check every <INTERVAL> minutes
    #[arg(short, long)]
    pub daemonize: bool,

    /// Notify only if at least this many checks fail [default: 1]
    #[arg(short = 'e', long)]
    pub threshold: Option<usize>,

    /// Do not stop running checks after the first one fails
    #[arg(short, long = "force-all-checks")]
    pub force_all_checks: bool,

    /// Run checks every x minutes, a value above 0 implies --daemonize [default: 1]
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Log file [default: /tmp/sms_notify.log]
    #[arg(short, long)]
    pub logfile: Option<PathBuf>,

    /// Limit of messages sent per hour, a value above 1 implies --daemonize [default: 1]
    #[arg(short, long = "msg-limit")]
    pub msg_limit: Option<usize>,

    /// Write the process id to this file
    #[arg(short, long)]
    pub pidfile: Option<PathBuf>,

    /// Show errors only on the console
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable debug output
    #[arg(short, long)]
    pub verbose: bool,

    /// Test run, do not send any text message
    #[arg(short, long)]
    pub test: bool,

    /// Seconds to wait for a TCP connection [default: 10]
    #[arg(long)]
    pub timeout: Option<u64>,

    /// SIP account username
    pub username: Option<String>,

    /// SIP account password
    pub password: Option<String>,

    /// Mobile phone number to send the message to, starting with the country code (e.g. 4917712345678)
    pub mobile: Option<String>,

    /// TCP service to check, as host:port or IP:port
    #[arg(value_name = "SERVICE")]
    pub services: Vec<String>,
}

/// Contents of the optional JSON config file. Every key may be omitted.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub services: Vec<String>,
    pub threshold: Option<usize>,
    pub force_all_checks: Option<bool>,
    pub interval: Option<u64>,
    pub msg_limit: Option<usize>,
    pub timeout: Option<u64>,
    pub logfile: Option<PathBuf>,
    pub pidfile: Option<PathBuf>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub mobile: Option<String>,
    pub daemonize: Option<bool>,
    pub test: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// Fully resolved and validated runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub services: Vec<Service>,
    pub threshold: usize,
    pub force_all: bool,
    pub interval: Duration,
    pub msg_limit: usize,
    pub timeout: Duration,
    pub daemonize: bool,
    pub dry_run: bool,
    pub logfile: PathBuf,
    pub pidfile: Option<PathBuf>,
    pub verbosity: Verbosity,
    pub credentials: Credentials,
    pub mobile: String,
}

/// Errors while turning arguments and config file into [`Settings`]
#[derive(Debug)]
pub enum ConfigError {
    /// A service could not be parsed
    Service(ServiceError),

    /// A required value was given neither on the command line nor in the config file
    Missing(&'static str),

    /// No service to check
    NoServices,

    /// Threshold of zero would notify on every cycle
    InvalidThreshold(usize),

    /// Without --force-all-checks at most one check can fail per cycle
    ThresholdRequiresForceAll(usize),

    /// Interval in minutes does not fit into a duration
    InvalidInterval(u64),

    /// Timeout of zero seconds
    InvalidTimeout,

    /// Destination is not a plain number with country code
    InvalidPhoneNumber(String),

    /// Directory for the PID file does not exist or is read-only
    PidfileNotWritable(PathBuf),

    /// Config file could not be read
    Io(PathBuf, std::io::Error),

    /// Config file is not valid
    Parse(PathBuf, serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Service(err) => write!(f, "{}", err),
            ConfigError::Missing(what) => write!(f, "missing {}", what),
            ConfigError::NoServices => write!(f, "no service to check given"),
            ConfigError::InvalidThreshold(t) => {
                write!(f, "invalid threshold '{}', must be at least 1", t)
            }
            ConfigError::ThresholdRequiresForceAll(t) => write!(
                f,
                "threshold '{}' can never be reached without --force-all-checks, \
                 because checks stop after the first failure",
                t
            ),
            ConfigError::InvalidInterval(i) => write!(f, "invalid interval '{}' minutes", i),
            ConfigError::InvalidTimeout => write!(f, "timeout must be at least 1 second"),
            ConfigError::InvalidPhoneNumber(n) => write!(
                f,
                "invalid mobile phone number '{}', expected digits starting with the country code",
                n
            ),
            ConfigError::PidfileNotWritable(dir) => {
                write!(f, "PIDfile location ('{}') not writable.", dir.display())
            }
            ConfigError::Io(path, err) => {
                write!(f, "could not read config file '{}': {}", path.display(), err)
            }
            ConfigError::Parse(path, err) => {
                write!(f, "invalid configuration file '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Service(err) => Some(err),
            ConfigError::Io(_, err) => Some(err),
            ConfigError::Parse(_, err) => Some(err),
            _ => None,
        }
    }
}

impl From<ServiceError> for ConfigError {
    fn from(err: ServiceError) -> Self {
        ConfigError::Service(err)
    }
}

pub fn read_config_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let file_content =
        std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
    serde_json::from_str(&file_content)
        .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
        .inspect(|config| trace!("loaded config: {config:?}"))
}

impl Settings {
    /// Resolve the command line, reading the config file it points to (if any).
    pub fn load(args: Args) -> Result<Settings, ConfigError> {
        let file = match &args.config {
            Some(path) => read_config_file(path)?,
            None => FileConfig::default(),
        };
        Settings::resolve(args, file)
    }

    /// Merge command line and config file and apply the option rules.
    pub fn resolve(args: Args, file: FileConfig) -> Result<Settings, ConfigError> {
        let service_specs = if args.services.is_empty() {
            file.services
        } else {
            args.services
        };
        let services = service_specs
            .iter()
            .map(|spec| parse_service(spec))
            .collect::<Result<Vec<_>, _>>()?;
        if services.is_empty() {
            return Err(ConfigError::NoServices);
        }

        let force_all = args.force_all_checks || file.force_all_checks.unwrap_or(false);
        let threshold = args
            .threshold
            .or(file.threshold)
            .unwrap_or(DEFAULT_THRESHOLD);
        if threshold == 0 {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        if threshold > 1 && !force_all {
            return Err(ConfigError::ThresholdRequiresForceAll(threshold));
        }

        let mut interval = args
            .interval
            .or(file.interval)
            .unwrap_or(DEFAULT_INTERVAL_MINUTES);
        let mut msg_limit = args
            .msg_limit
            .or(file.msg_limit)
            .unwrap_or(DEFAULT_MSG_LIMIT);

        let mut daemonize = args.daemonize || file.daemonize.unwrap_or(false);
        if interval > 0 || msg_limit > 1 {
            daemonize = true;
        }
        if daemonize {
            interval = interval.max(1);
            msg_limit = msg_limit.max(1);
        }

        let interval = interval
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or(ConfigError::InvalidInterval(interval))?;

        let timeout = args
            .timeout
            .or(file.timeout)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        let pidfile = args.pidfile.or(file.pidfile);
        if let Some(pidfile) = &pidfile {
            check_pidfile_location(pidfile)?;
        }

        let username = args
            .username
            .or(file.username)
            .ok_or(ConfigError::Missing("SIP account username"))?;
        let password = args
            .password
            .or(file.password)
            .ok_or(ConfigError::Missing("SIP account password"))?;
        let mobile = args
            .mobile
            .or(file.mobile)
            .ok_or(ConfigError::Missing("mobile phone number"))?;
        if !is_valid_phone_number(&mobile) {
            return Err(ConfigError::InvalidPhoneNumber(mobile));
        }

        let verbosity = if args.verbose {
            Verbosity::Verbose
        } else if args.quiet {
            Verbosity::Quiet
        } else {
            Verbosity::Normal
        };

        Ok(Settings {
            services,
            threshold,
            force_all,
            interval,
            msg_limit,
            timeout: Duration::from_secs(timeout),
            daemonize,
            dry_run: args.test || file.test.unwrap_or(false),
            logfile: args
                .logfile
                .or(file.logfile)
                .unwrap_or_else(crate::util::get_logfile),
            pidfile,
            verbosity,
            credentials: Credentials { username, password },
            mobile,
        })
    }
}

fn check_pidfile_location(pidfile: &Path) -> Result<(), ConfigError> {
    let dir = match pidfile.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    // permission bits alone say nothing about the current user
    let writable = tempfile::Builder::new()
        .prefix(".sms-notify")
        .tempfile_in(dir)
        .is_ok();

    if writable {
        Ok(())
    } else {
        Err(ConfigError::PidfileNotWritable(dir.to_path_buf()))
    }
}
