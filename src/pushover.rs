/// Pushover notification adapter
///
/// Best-effort only: a lost notification never fails a run that already
/// updated Cloudflare successfully.
use crate::state;
use serde::Serialize;
use std::error::Error;

const PUSHOVER_API_URL: &str = "https://api.pushover.net/1/messages.json";

/// Application token registered for this tool with Pushover.
const APP_TOKEN: &str = "a4dhut1a7waegz6p2xh7enzegjedgo";

#[derive(Debug, Serialize)]
struct Message<'a> {
    token: &'a str,
    user: &'a str,
    title: &'a str,
    message: &'a str,
    timestamp: u64,
}

/// Tell the configured Pushover user which addresses changed for which
/// record. Failures are logged and swallowed.
pub fn notify(user_token: &str, dns_record: &str, changed_ips: &[String]) {
    match send(PUSHOVER_API_URL, user_token, dns_record, changed_ips) {
        Ok(()) => log::info!("Pushover Notification Sent OK"),
        Err(e) => log::error!("Pushover notification failed: {}", e),
    }
}

fn send(
    api_url: &str,
    user_token: &str,
    dns_record: &str,
    changed_ips: &[String],
) -> Result<(), Box<dyn Error>> {
    let title = format!("IP updated to {}", changed_ips.join(", "));
    let message = format!("For {}", dns_record);

    let body = Message {
        token: APP_TOKEN,
        user: user_token,
        title: &title,
        message: &message,
        timestamp: state::current_timestamp(),
    };

    let res = minreq::post(api_url)
        .with_header("Content-Type", "application/json")
        .with_header("User-Agent", crate::USER_AGENT)
        .with_json(&body)?
        .send()?;

    if !(200..300).contains(&res.status_code) {
        return Err(format!(
            "Pushover returned status {}: {}",
            res.status_code,
            res.as_str().unwrap_or("")
        )
        .into());
    }

    Ok(())
}
