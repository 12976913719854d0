use std::process::ExitCode;

use clap::Parser;
use sms_notify::{
    notify::{MAX_MESSAGE_LEN, SipgateSms, SmsSender},
    util::{get_rpc_url, load_env},
    validate::is_valid_phone_number,
};
use tracing::{error, level_filters::LevelFilter};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

/// Send a short message via SIP provider sipgate.
#[derive(Clone, Parser)]
#[command(name = "send-sms", version, about)]
struct Args {
    /// Enable debug output
    #[arg(short, long)]
    verbose: bool,

    /// sipgate account username
    username: String,

    /// sipgate account password
    password: String,

    /// Mobile phone number to send the message to
    mobile: String,

    /// The message, max 160 characters
    message: String,
}

fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = filter::Targets::new().with_targets(vec![("sms_notify", level), ("send_sms", level)]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    load_env();
    let args = Args::parse();
    init(args.verbose);

    let length = args.message.chars().count();
    if length > MAX_MESSAGE_LEN {
        error!("Message too long ({length} characters, max {MAX_MESSAGE_LEN}).");
        return ExitCode::from(2);
    }
    if !is_valid_phone_number(&args.mobile) {
        error!("Invalid mobile phone number '{}'.", args.mobile);
        return ExitCode::from(2);
    }

    match send(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Could not send message: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn send(args: &Args) -> anyhow::Result<()> {
    let sms = SipgateSms::new(get_rpc_url(), &args.username, &args.password)?;
    sms.identify().await?;
    sms.send(&args.mobile, &args.message).await?;
    Ok(())
}
