//! Plugin configuration loaded from environment variables

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the guessing game
#[derive(Debug, Clone)]
pub struct WhoisConfig {
    /// How long a round stays open before the answer is revealed
    pub timeout: Duration,
    /// Groups allowed to play (empty = all groups)
    pub enable_groups: Vec<String>,
    /// Groups never allowed to play, wins over `enable_groups`
    pub disable_groups: Vec<String>,
    /// Directory containing `<name>.png` icons
    pub icon_path: PathBuf,
    /// Background image for both puzzle and answer
    pub bg_path: PathBuf,
    /// Caption font
    pub font_path: PathBuf,
    /// Optional JSON answer key replacing the built-in table
    pub answer_key_path: Option<PathBuf>,
    /// Users that may always force-stop a round
    pub superusers: Vec<String>,
    /// Prefix for commands, e.g. `/whois`
    pub command_start: String,
}

impl Default for WhoisConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            enable_groups: Vec::new(),
            disable_groups: Vec::new(),
            icon_path: PathBuf::from("resource/icon"),
            bg_path: PathBuf::from("resource/whois_bg.jpg"),
            font_path: PathBuf::from("resource/sakura.ttf"),
            answer_key_path: None,
            superusers: Vec::new(),
            command_start: "/".to_string(),
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn env_list(key: &str) -> Vec<String> {
    env_non_empty(key)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

impl WhoisConfig {
    /// Load config from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let timeout = env_non_empty("WHOIS_TIMEOUT")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        Self {
            timeout,
            enable_groups: env_list("WHOIS_ENABLE_GROUPS"),
            disable_groups: env_list("WHOIS_DISABLE_GROUPS"),
            icon_path: env_non_empty("WHOIS_ICON_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.icon_path),
            bg_path: env_non_empty("WHOIS_BG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.bg_path),
            font_path: env_non_empty("WHOIS_FONT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.font_path),
            answer_key_path: env_non_empty("WHOIS_ANSWER_KEY_PATH").map(PathBuf::from),
            superusers: env_list("SUPERUSERS"),
            command_start: env_non_empty("COMMAND_START").unwrap_or(defaults.command_start),
        }
    }

    /// Whether rounds may be started in this group
    pub fn group_enabled(&self, group_id: &str) -> bool {
        if self.disable_groups.iter().any(|g| g == group_id) {
            return false;
        }
        self.enable_groups.is_empty() || self.enable_groups.iter().any(|g| g == group_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "WHOIS_TIMEOUT",
        "WHOIS_ENABLE_GROUPS",
        "WHOIS_DISABLE_GROUPS",
        "WHOIS_ICON_PATH",
        "WHOIS_ANSWER_KEY_PATH",
        "SUPERUSERS",
        "COMMAND_START",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_default_config() {
        let config = WhoisConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.command_start, "/");
        assert!(config.answer_key_path.is_none());
    }

    #[test]
    #[serial]
    fn test_from_env_reads_values() {
        clear_env();
        std::env::set_var("WHOIS_TIMEOUT", "15");
        std::env::set_var("WHOIS_ENABLE_GROUPS", "g1, g2,,");
        std::env::set_var("SUPERUSERS", "42");
        std::env::set_var("WHOIS_ICON_PATH", "/tmp/icons");

        let config = WhoisConfig::from_env();
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.enable_groups, vec!["g1", "g2"]);
        assert_eq!(config.superusers, vec!["42"]);
        assert_eq!(config.icon_path, PathBuf::from("/tmp/icons"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_ignores_invalid_timeout() {
        clear_env();
        std::env::set_var("WHOIS_TIMEOUT", "soon");
        assert_eq!(WhoisConfig::from_env().timeout, Duration::from_secs(60));

        std::env::set_var("WHOIS_TIMEOUT", "0");
        assert_eq!(WhoisConfig::from_env().timeout, Duration::from_secs(60));

        clear_env();
    }

    #[test]
    fn test_group_enabled() {
        let mut config = WhoisConfig::default();
        assert!(config.group_enabled("anything"));

        config.enable_groups = vec!["g1".to_string(), "g2".to_string()];
        assert!(config.group_enabled("g1"));
        assert!(!config.group_enabled("g3"));

        config.disable_groups = vec!["g2".to_string()];
        assert!(!config.group_enabled("g2"));
    }
}
