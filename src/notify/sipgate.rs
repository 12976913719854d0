//! sipgate XML-RPC client
//!
//! Only the two calls needed to deliver a text are implemented:
//!
//! 1. `samurai.ClientIdentify` - announces the client, fails on bad credentials
//! 2. `samurai.SessionInitiate` - with `TOS = "text"` this sends an SMS
//!
//! API documentation: <http://www.sipgate.de/basic/api>

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode, header::CONTENT_TYPE};
use tracing::{debug, info, instrument};

use super::{MAX_MESSAGE_LEN, SmsError, SmsResult, SmsSender};

pub const CLIENT_NAME: &str = "sms_notify_if_host_down (rust reqwest)";
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CLIENT_VENDOR: &str = "https://github.com/dansan/sms_notify_if_host_down/";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

static FAULT_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<name>faultCode</name>\s*<value>\s*<(?:i4|int)>(-?\d+)</(?:i4|int)>")
        .expect("fault code pattern is valid")
});

static FAULT_STRING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<name>faultString</name>\s*<value>\s*(?:<string>)?([^<]*)")
        .expect("fault string pattern is valid")
});

static STATUS_STRING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<name>StatusString</name>\s*<value>\s*(?:<string>)?([^<]*)")
        .expect("status string pattern is valid")
});

/// Sends text messages through the sipgate "samurai" XML-RPC endpoint.
#[derive(Debug, Clone)]
pub struct SipgateSms {
    client: Client,
    url: String,
    username: String,
    password: String,
}

impl SipgateSms {
    pub fn new(
        url: impl ToString,
        username: impl ToString,
        password: impl ToString,
    ) -> SmsResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            url: url.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// Announce this client to sipgate. Fails if the credentials are wrong.
    #[instrument(skip(self), fields(username = %self.username))]
    pub async fn identify(&self) -> SmsResult<()> {
        debug!("Connecting to {} as {}", self.url, self.username);

        let reply = self
            .call(
                "samurai.ClientIdentify",
                &[
                    ("ClientName", CLIENT_NAME),
                    ("ClientVersion", CLIENT_VERSION),
                    ("ClientVendor", CLIENT_VENDOR),
                ],
            )
            .await?;

        debug!("Login success. Server reply to ClientIdentify(): '{reply}'");
        Ok(())
    }

    async fn call(&self, method: &str, members: &[(&str, &str)]) -> SmsResult<String> {
        let body = method_call(method, members);

        let response = self
            .client
            .post(&self.url)
            .basic_auth(&self.username, Some(&self.password))
            .header(CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SmsError::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            return Err(SmsError::Http(status.as_u16()));
        }

        let text = response.text().await?;
        parse_response(&text)
    }
}

#[async_trait]
impl SmsSender for SipgateSms {
    #[instrument(skip(self, message))]
    async fn send(&self, destination: &str, message: &str) -> SmsResult<()> {
        let length = message.chars().count();
        if length > MAX_MESSAGE_LEN {
            return Err(SmsError::MessageTooLong {
                length,
                max: MAX_MESSAGE_LEN,
            });
        }

        let remote_uri = format!("sip:{destination}@sipgate.de");
        let reply = self
            .call(
                "samurai.SessionInitiate",
                &[
                    ("RemoteUri", remote_uri.as_str()),
                    ("TOS", "text"),
                    ("Content", message),
                ],
            )
            .await?;

        info!("Success sending '{message}' to '{destination}'.");
        debug!("Server reply to SessionInitiate(): '{reply}'");
        Ok(())
    }
}

/// Build an XML-RPC `methodCall` with a single struct parameter of strings.
fn method_call(method: &str, members: &[(&str, &str)]) -> String {
    let members = members
        .iter()
        .map(|(name, value)| {
            format!(
                "<member><name>{}</name><value><string>{}</string></value></member>",
                escape(name),
                escape(value)
            )
        })
        .collect::<String>();

    format!(
        "<?xml version=\"1.0\"?>\n<methodCall><methodName>{method}</methodName>\
         <params><param><value><struct>{members}</struct></value></param></params></methodCall>"
    )
}

/// Turn a `methodResponse` into the provider's status string, or a fault.
fn parse_response(body: &str) -> SmsResult<String> {
    if !body.contains("<methodResponse") {
        return Err(SmsError::InvalidResponse(format!(
            "not an XML-RPC response: {}",
            body.chars().take(80).collect::<String>()
        )));
    }

    if body.contains("<fault>") {
        let code = FAULT_CODE
            .captures(body)
            .and_then(|c| c[1].parse().ok())
            .unwrap_or_default();
        let message = FAULT_STRING
            .captures(body)
            .map(|c| unescape(c[1].trim()))
            .unwrap_or_else(|| String::from("unknown fault"));
        return Err(SmsError::Fault { code, message });
    }

    Ok(STATUS_STRING
        .captures(body)
        .map(|c| unescape(c[1].trim()))
        .unwrap_or_default())
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn unescape(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
