/// Persisted updater state
///
/// Between runs the updater remembers the last addresses it pushed to
/// Cloudflare so that unchanged IPs cost no API calls. The state lives in a
/// small JSON file next to the configuration:
///
/// ```json
/// {
///   "DNSRecord": "home.example.com",
///   "LastIPv4": "203.0.113.5",
///   "LastIPv6": "2001:db8::2",
///   "LastUpdateTime": 1724980000
/// }
/// ```
///
/// The file is safe to delete at any time; the next run simply performs a
/// full resync. It is only written after a successful remote update.
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const DEFAULT_STATE_FILENAME: &str = "cloudflare-ddns-state.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// The record name these addresses were pushed for. A mismatch with the
    /// configured record forces a full resync.
    #[serde(rename = "DNSRecord", default)]
    pub dns_record: String,

    #[serde(rename = "LastIPv4", default)]
    pub last_ipv4: String,

    #[serde(rename = "LastIPv6", default)]
    pub last_ipv6: String,

    /// Unix epoch seconds of the last successful update.
    #[serde(rename = "LastUpdateTime", default)]
    pub last_update_time: u64,
}

impl State {
    /// Load state from `path`, failing open: a missing or unreadable file is
    /// normal on first run and yields a zero-valued state, and a damaged
    /// file logs a warning instead of aborting the run.
    pub fn load(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => return State::default(),
        };

        match serde_json::from_str(&contents) {
            Ok(state) => state,
            Err(e) => {
                log::warn!(
                    "State file {} looks damaged, starting fresh: {}",
                    path.display(),
                    e
                );
                State::default()
            }
        }
    }

    /// Persist the state as pretty-printed JSON. The contents are written to
    /// a temporary sibling first and renamed into place, so a failed write
    /// never corrupts the previous state. Owner-only permissions on Unix.
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;

        let mut tmp_path = path.as_os_str().to_owned();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);

        fs::write(&tmp_path, contents)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;
        }

        fs::rename(&tmp_path, path)?;

        Ok(())
    }
}

/// Resolve the state file path: the CLI/env override if given, otherwise
/// ~/.config/cloudflare-ddns-state.json.
pub fn state_path(override_path: Option<&str>) -> Result<PathBuf, Box<dyn Error>> {
    if let Some(path) = override_path {
        return Ok(PathBuf::from(path));
    }

    let home = dirs::home_dir().ok_or("Failed to determine home directory")?;
    Ok(home.join(".config").join(DEFAULT_STATE_FILENAME))
}

/// Current Unix timestamp in seconds.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
