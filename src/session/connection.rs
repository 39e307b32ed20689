//! Connection metadata attached to a session.
//!
//! Captures where a session is being used from so users can recognise their
//! active logins. Refreshed on every successful validation.

use crate::utils::truncate_string;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length for IP address strings (IPv6 max is 45 chars).
const MAX_IP_LENGTH: usize = 45;

/// Maximum length for user agent strings to prevent DoS.
const MAX_USER_AGENT_LENGTH: usize = 512;

/// Coarse device class derived from the user agent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Desktop,
    Mobile,
    Tablet,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Last-known connection details of a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub ip: String,
    pub device_type: DeviceType,
    pub os: String,
    pub browser: String,
    pub last_active_at: DateTime<Utc>,
}

impl ConnectionInfo {
    /// Build connection info from a client address and user agent header.
    ///
    /// Inputs are truncated before use. A missing user agent yields
    /// `Unknown` browser/OS and `DeviceType::Unknown`.
    #[must_use]
    pub fn from_request(ip: impl Into<String>, user_agent: Option<&str>) -> Self {
        let ip = truncate_string(ip.into(), MAX_IP_LENGTH);
        let (browser, os, device_type) = match user_agent {
            Some(ua) => {
                let ua = truncate_string(ua.to_string(), MAX_USER_AGENT_LENGTH);
                (parse_browser(&ua), parse_os(&ua), parse_device_type(&ua))
            }
            None => ("Unknown", "Unknown", DeviceType::Unknown),
        };

        Self {
            ip,
            device_type,
            os: os.to_string(),
            browser: browser.to_string(),
            last_active_at: Utc::now(),
        }
    }

    /// Human-readable device description, e.g. "Chrome on macOS".
    pub fn describe(&self) -> String {
        format!("{} on {}", self.browser, self.os)
    }

    /// Stamp the connection as active now.
    pub fn touch(&mut self) {
        self.last_active_at = Utc::now();
    }
}

fn parse_browser(ua: &str) -> &'static str {
    // Edge and Chrome both advertise Safari; order matters
    if ua.contains("Edg") {
        "Edge"
    } else if ua.contains("Chrome") {
        "Chrome"
    } else if ua.contains("Firefox") {
        "Firefox"
    } else if ua.contains("Safari") {
        "Safari"
    } else {
        "Other"
    }
}

fn parse_os(ua: &str) -> &'static str {
    if ua.contains("Windows") {
        "Windows"
    } else if ua.contains("iPhone") || ua.contains("iPad") || ua.contains("iOS") {
        // Check iOS before macOS since iOS user agents contain "Mac OS X"
        "iOS"
    } else if ua.contains("Mac OS") {
        "macOS"
    } else if ua.contains("Android") {
        "Android"
    } else if ua.contains("Linux") {
        "Linux"
    } else {
        "Other"
    }
}

fn parse_device_type(ua: &str) -> DeviceType {
    let lower = ua.to_ascii_lowercase();
    if lower.contains("ipad") || lower.contains("tablet") {
        DeviceType::Tablet
    } else if lower.contains("mobile") {
        DeviceType::Mobile
    } else if lower.contains("android") {
        // Android without "Mobile" is a tablet
        DeviceType::Tablet
    } else {
        DeviceType::Desktop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAC_CHROME: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const WIN_EDGE: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0";
    const IPHONE_SAFARI: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    const IPAD_SAFARI: &str = "Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    const ANDROID_PHONE: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";
    const ANDROID_TABLET: &str = "Mozilla/5.0 (Linux; Android 14; SM-X910) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const LINUX_FIREFOX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";

    #[test]
    fn test_parse_user_agents() {
        let info = ConnectionInfo::from_request("10.0.0.1", Some(MAC_CHROME));
        assert_eq!(info.describe(), "Chrome on macOS");
        assert_eq!(info.device_type, DeviceType::Desktop);

        let info = ConnectionInfo::from_request("10.0.0.1", Some(WIN_EDGE));
        assert_eq!(info.describe(), "Edge on Windows");

        let info = ConnectionInfo::from_request("10.0.0.1", Some(IPHONE_SAFARI));
        assert_eq!(info.describe(), "Safari on iOS");
        assert_eq!(info.device_type, DeviceType::Mobile);

        let info = ConnectionInfo::from_request("10.0.0.1", Some(IPAD_SAFARI));
        assert_eq!(info.device_type, DeviceType::Tablet);

        let info = ConnectionInfo::from_request("10.0.0.1", Some(ANDROID_PHONE));
        assert_eq!(info.os, "Android");
        assert_eq!(info.device_type, DeviceType::Mobile);

        let info = ConnectionInfo::from_request("10.0.0.1", Some(ANDROID_TABLET));
        assert_eq!(info.device_type, DeviceType::Tablet);

        let info = ConnectionInfo::from_request("10.0.0.1", Some(LINUX_FIREFOX));
        assert_eq!(info.describe(), "Firefox on Linux");

        let info = ConnectionInfo::from_request("10.0.0.1", Some("curl/8.4.0"));
        assert_eq!(info.describe(), "Other on Other");
    }

    #[test]
    fn test_missing_user_agent() {
        let info = ConnectionInfo::from_request("::1", None);
        assert_eq!(info.browser, "Unknown");
        assert_eq!(info.os, "Unknown");
        assert_eq!(info.device_type, DeviceType::Unknown);
    }

    #[test]
    fn test_input_truncation() {
        let info = ConnectionInfo::from_request("a".repeat(100), Some(&"x".repeat(10_000)));
        assert_eq!(info.ip.len(), 45);
    }

    #[test]
    fn test_device_type_serialization() {
        assert_eq!(serde_json::to_string(&DeviceType::Tablet).unwrap(), "\"tablet\"");
        let parsed: DeviceType = serde_json::from_str("\"smartwatch\"").unwrap();
        assert_eq!(parsed, DeviceType::Unknown);
    }

    #[test]
    fn test_touch_moves_forward() {
        let mut info = ConnectionInfo::from_request("10.0.0.1", None);
        let before = info.last_active_at;
        std::thread::sleep(std::time::Duration::from_millis(2));
        info.touch();
        assert!(info.last_active_at > before);
    }
}
