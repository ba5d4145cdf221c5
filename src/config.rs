/// Cloudflare updater configuration
///
/// The configuration is a small JSON file, normally created by the setup
/// wizard (`--setup`) and read once per run:
///
/// ```json
/// {
///   "ZoneID": "023e105f4ecef8ad9ca31a8372d0c353",
///   "DNSRecord": "home.example.com",
///   "APIKey": "...",
///   "Protocols": "IPv4 Only",
///   "PushoverUserToken": ""
/// }
/// ```
///
/// Default location is ~/.config/cloudflare-ddns.json, overridable with
/// --config or CLOUDFLARE_DDNS_CONFIG.
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILENAME: &str = "cloudflare-ddns.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "ZoneID", default)]
    pub zone_id: String,

    #[serde(rename = "DNSRecord", default)]
    pub dns_record: String,

    #[serde(rename = "APIKey", default)]
    pub api_key: String,

    /// One of "IPv4 Only", "IPv6 Only", "Both". An empty value means
    /// IPv4 only (the historical default).
    #[serde(rename = "Protocols", default)]
    pub protocols: String,

    /// Pushover user token; empty disables notifications.
    #[serde(rename = "PushoverUserToken", default)]
    pub pushover_user_token: String,
}

impl Config {
    /// Read and parse the configuration file. A missing or damaged file is
    /// fatal for the run; the user is pointed at the setup wizard.
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err("Configuration not found, run again with --setup".into())
            }
            // Present but unreadable (permissions, a directory, ...) is not
            // a missing config; re-running setup would not help.
            Err(e) => return Err(format!("Configuration could not be opened: {}", e).into()),
        };

        let config: Config = serde_json::from_str(&contents)
            .map_err(|_| "Configuration file looks damaged, run again with --setup")?;

        Ok(config)
    }

    /// Write the configuration as pretty-printed JSON, creating parent
    /// directories as needed. The file holds an API key, so it is written
    /// with owner-only permissions on Unix.
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    /// Ensures the required Cloudflare fields are present.
    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.api_key.is_empty() || self.zone_id.is_empty() || self.dns_record.is_empty() {
            return Err("Configuration is incomplete, run again with --setup".into());
        }

        Ok(())
    }

    pub fn ipv4_enabled(&self) -> bool {
        // The wizard historically wrote protocol names with stray padding,
        // so compare trimmed.
        matches!(self.protocols.trim(), "IPv4 Only" | "Both" | "")
    }

    pub fn ipv6_enabled(&self) -> bool {
        matches!(self.protocols.trim(), "IPv6 Only" | "Both")
    }
}

/// Resolve the configuration file path: the CLI/env override if given,
/// otherwise ~/.config/cloudflare-ddns.json.
pub fn config_path(override_path: Option<&str>) -> Result<PathBuf, Box<dyn Error>> {
    if let Some(path) = override_path {
        return Ok(PathBuf::from(path));
    }

    let home = dirs::home_dir().ok_or("Failed to determine home directory")?;
    Ok(home.join(".config").join(DEFAULT_CONFIG_FILENAME))
}
