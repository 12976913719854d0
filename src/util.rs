use std::path::PathBuf;

const SIPGATE_RPC_URL: &str = "SIPGATE_RPC_URL";

const DEFAULT_RPC_URL: &str = "https://samurai.sipgate.net/RPC2";

pub fn get_default_rpc_url() -> &'static str {
    DEFAULT_RPC_URL
}

pub fn get_rpc_url() -> String {
    let url_from_env = std::env::var(SIPGATE_RPC_URL);
    url_from_env
        .ok()
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_RPC_URL.to_string())
}

const SMS_NOTIFY_LOGFILE: &str = "SMS_NOTIFY_LOGFILE";

const DEFAULT_LOGFILE: &str = "/tmp/sms_notify.log";

pub fn get_logfile() -> PathBuf {
    let logfile_from_env = std::env::var(SMS_NOTIFY_LOGFILE);
    logfile_from_env.map_or(PathBuf::from(DEFAULT_LOGFILE), PathBuf::from)
}

/// Load a `.env` file from the working directory, if there is one.
pub fn load_env() {
    dotenv::dotenv().ok();
}
