use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::NaiveTime;

/// Application-level constants
pub const APP_NAME: &str = "Clinicdesk";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Clinic opening hours. Slots and calendar hour rows live inside this window.
pub const CLINIC_OPEN_HOUR: u32 = 8;
pub const CLINIC_CLOSE_HOUR: u32 = 20;

/// Atomic booking granularity, in minutes.
pub const SLOT_MINUTES: u32 = 30;

/// How many days ahead (starting tomorrow) patients may book.
pub const BOOKING_WINDOW_DAYS: u32 = 14;

/// Staff login screen that unauthenticated back-office requests are sent to.
pub const STAFF_LOGIN_PATH: &str = "/admin";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_SESSION_TTL_SECS: u64 = 12 * 60 * 60;

pub fn clinic_open() -> NaiveTime {
    NaiveTime::from_hms_opt(CLINIC_OPEN_HOUR, 0, 0).unwrap_or(NaiveTime::MIN)
}

pub fn clinic_close() -> NaiveTime {
    NaiveTime::from_hms_opt(CLINIC_CLOSE_HOUR, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Get the application data directory.
/// ~/Clinicdesk/ unless the home directory cannot be resolved, in which case
/// the working directory is used.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// SQLite database file inside a data directory.
pub fn database_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join("clinic.db")
}

/// Filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "clinicdesk=info,tower_http=info"
}

/// Runtime settings for the HTTP server, read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    /// Re-check slot availability inside the booking transaction.
    pub enforce_slot_conflicts: bool,
    pub session_ttl_secs: u64,
    /// Login ensured to hold `super_admin` at startup.
    pub bootstrap_admin: Option<AdminCredentials>,
}

#[derive(Clone)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8080))),
            data_dir: app_data_dir(),
            enforce_slot_conflicts: false,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            bootstrap_admin: None,
        }
    }
}

impl ServerConfig {
    /// Reads `CLINIC_BIND_ADDR`, `CLINIC_DATA_DIR`,
    /// `CLINIC_ENFORCE_SLOT_CONFLICTS`, `CLINIC_SESSION_TTL_SECS` and the
    /// `CLINIC_ADMIN_EMAIL`/`CLINIC_ADMIN_PASSWORD` pair.
    /// Unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("CLINIC_BIND_ADDR") {
            match addr.parse() {
                Ok(parsed) => config.bind_addr = parsed,
                Err(_) => tracing::warn!(value = %addr, "Ignoring invalid CLINIC_BIND_ADDR"),
            }
        }
        if let Some(dir) = lookup("CLINIC_DATA_DIR").filter(|d| !d.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(flag) = lookup("CLINIC_ENFORCE_SLOT_CONFLICTS") {
            config.enforce_slot_conflicts =
                matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        if let Some(ttl) = lookup("CLINIC_SESSION_TTL_SECS") {
            match ttl.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.session_ttl_secs = secs,
                _ => tracing::warn!(value = %ttl, "Ignoring invalid CLINIC_SESSION_TTL_SECS"),
            }
        }
        if let (Some(email), Some(password)) =
            (lookup("CLINIC_ADMIN_EMAIL"), lookup("CLINIC_ADMIN_PASSWORD"))
        {
            if !email.trim().is_empty() && !password.is_empty() {
                config.bootstrap_admin = Some(AdminCredentials { email, password });
            }
        }
        config
    }

    pub fn database_path(&self) -> PathBuf {
        database_path(&self.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_data_dir_named_after_app() {
        assert!(app_data_dir().ends_with("Clinicdesk"));
    }

    #[test]
    fn database_path_inside_data_dir() {
        let path = database_path(std::path::Path::new("/tmp/clinic"));
        assert_eq!(path, PathBuf::from("/tmp/clinic/clinic.db"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn clinic_hours() {
        assert_eq!(clinic_open(), NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(clinic_close(), NaiveTime::from_hms_opt(20, 0, 0).unwrap());
    }

    #[test]
    fn defaults_when_env_empty() {
        let config = ServerConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.bind_addr.port(), 8080);
        assert!(!config.enforce_slot_conflicts);
        assert_eq!(config.session_ttl_secs, 12 * 60 * 60);
    }

    #[test]
    fn env_overrides_apply() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("CLINIC_BIND_ADDR", "0.0.0.0:9000"),
            ("CLINIC_DATA_DIR", "/srv/clinic"),
            ("CLINIC_ENFORCE_SLOT_CONFLICTS", "true"),
            ("CLINIC_SESSION_TTL_SECS", "600"),
        ]));
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.database_path(), PathBuf::from("/srv/clinic/clinic.db"));
        assert!(config.enforce_slot_conflicts);
        assert_eq!(config.session_ttl_secs, 600);
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("CLINIC_BIND_ADDR", "not-an-address"),
            ("CLINIC_SESSION_TTL_SECS", "0"),
            ("CLINIC_ENFORCE_SLOT_CONFLICTS", "maybe"),
        ]));
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.session_ttl_secs, 12 * 60 * 60);
        assert!(!config.enforce_slot_conflicts);
    }

    #[test]
    fn bootstrap_admin_needs_both_values() {
        let only_email =
            ServerConfig::from_lookup(lookup_from(&[("CLINIC_ADMIN_EMAIL", "admin@clinic.rw")]));
        assert!(only_email.bootstrap_admin.is_none());

        let both = ServerConfig::from_lookup(lookup_from(&[
            ("CLINIC_ADMIN_EMAIL", "admin@clinic.rw"),
            ("CLINIC_ADMIN_PASSWORD", "s3cret-pass"),
        ]));
        let admin = both.bootstrap_admin.unwrap();
        assert_eq!(admin.email, "admin@clinic.rw");
        assert!(!format!("{admin:?}").contains("s3cret"));
    }
}
