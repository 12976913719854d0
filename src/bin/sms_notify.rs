use std::fs::OpenOptions;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use sms_notify::{
    checks::TcpConnect,
    config::{Args, Settings, Verbosity},
    daemon::{PidFile, shutdown_signal},
    limiter::MessageLimiter,
    monitor::{Monitor, MonitorConfig},
    notify::SipgateSms,
    util::{get_rpc_url, load_env},
};
use tracing::{debug, error, info, level_filters::LevelFilter, trace};
use tracing_subscriber::{Layer, filter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const CONFIG_ERROR: u8 = 2;

fn init(settings: &Settings) -> anyhow::Result<()> {
    let logfile = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.logfile)
        .with_context(|| format!("could not open logfile '{}'", settings.logfile.display()))?;

    let (console_level, file_level) = match settings.verbosity {
        Verbosity::Verbose => (LevelFilter::DEBUG, LevelFilter::DEBUG),
        Verbosity::Quiet => (LevelFilter::ERROR, LevelFilter::INFO),
        Verbosity::Normal => (LevelFilter::INFO, LevelFilter::INFO),
    };

    let filter = filter::Targets::new().with_target("sms_notify", LevelFilter::TRACE);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false)
                .with_filter(console_level),
        )
        .with(
            fmt::layer()
                .with_writer(Mutex::new(logfile))
                .with_ansi(false)
                .with_filter(file_level),
        )
        .with(filter)
        .init();

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    load_env();
    let args = Args::parse();

    let settings = match Settings::load(args) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("sms-notify: {e}");
            eprintln!("            for help use --help");
            return ExitCode::from(CONFIG_ERROR);
        }
    };

    if let Err(e) = init(&settings) {
        eprintln!("sms-notify: {e:#}");
        return ExitCode::from(CONFIG_ERROR);
    }
    trace!("running with settings: {settings:?}");

    match run(settings).await {
        Ok(failed) => ExitCode::from(u8::try_from(failed).unwrap_or(u8::MAX)),
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: Settings) -> anyhow::Result<usize> {
    let _pidfile = if settings.daemonize {
        info!("** STARTING **");
        info!("Running in daemon mode with PID {}.", std::process::id());
        settings.pidfile.as_ref().map(PidFile::create).transpose()?
    } else {
        None
    };

    let sender = SipgateSms::new(
        get_rpc_url(),
        &settings.credentials.username,
        &settings.credentials.password,
    )?;
    if settings.dry_run {
        debug!("test run, not logging in to the SMS provider");
    } else {
        sender
            .identify()
            .await
            .context("could not log in to the SMS provider")?;
    }

    let monitor = Monitor::new(
        MonitorConfig::from(&settings),
        TcpConnect::new(settings.timeout),
        sender,
        MessageLimiter::new(settings.msg_limit),
    );

    monitor.run(shutdown_signal()).await
}
