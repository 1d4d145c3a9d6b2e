//! Query filter policy
//!
//! Declarative deny/allow lists applied to every ranking query before
//! scoring. Administrative and noise channels are identified by their
//! `provider:channel` pid prefix; whole sources by their id. The same
//! channel prefixes double as the allow-list for the announcements feed.

/// Exclusion/inclusion rules for candidate queries.
#[derive(Debug, Clone)]
pub struct FilterPolicy {
    /// pid prefixes excluded from general ranking.
    pub deny_pid_prefixes: Vec<String>,
    /// Source ids excluded from general ranking.
    pub deny_source_ids: Vec<String>,
    /// pid prefixes selected by the announcements feed.
    pub announcement_pid_prefixes: Vec<String>,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        let announcement_channels = vec![
            "discord:844618231553720330".to_string(), // network status
            "discord:370285586894028811".to_string(), // announcements
            "discord:572793415138410517".to_string(), // beta-announcements
            "discord:644987172935565335".to_string(), // rep-announcements
        ];
        Self {
            deny_pid_prefixes: announcement_channels.clone(),
            deny_source_ids: vec![
                "discord:403628195548495882".to_string(), // trade server
                "discord:431804330853662721".to_string(), // rep-support
            ],
            announcement_pid_prefixes: announcement_channels,
        }
    }
}

impl FilterPolicy {
    /// Build the policy from the environment, falling back to the
    /// production defaults. Lists are comma-separated.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            deny_pid_prefixes: env_list("FILTER_DENY_PID_PREFIXES")
                .unwrap_or(defaults.deny_pid_prefixes),
            deny_source_ids: env_list("FILTER_DENY_SOURCE_IDS")
                .unwrap_or(defaults.deny_source_ids),
            announcement_pid_prefixes: env_list("FILTER_ANNOUNCEMENT_PID_PREFIXES")
                .unwrap_or(defaults.announcement_pid_prefixes),
        }
    }

    /// Deny prefixes as SQL LIKE patterns.
    pub fn deny_pid_patterns(&self) -> Vec<String> {
        like_patterns(&self.deny_pid_prefixes)
    }

    /// Announcement prefixes as SQL LIKE patterns.
    pub fn announcement_pid_patterns(&self) -> Vec<String> {
        like_patterns(&self.announcement_pid_prefixes)
    }
}

fn like_patterns(prefixes: &[String]) -> Vec<String> {
    prefixes
        .iter()
        .map(|prefix| format!("{}:%", prefix.trim_end_matches(':')))
        .collect()
}

fn env_list(key: &str) -> Option<Vec<String>> {
    let raw = std::env::var(key).ok()?;
    let items: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_has_production_lists() {
        let policy = FilterPolicy::default();
        assert_eq!(policy.deny_pid_prefixes.len(), 4);
        assert_eq!(policy.deny_source_ids.len(), 2);
        assert_eq!(
            policy.deny_pid_prefixes,
            policy.announcement_pid_prefixes,
            "announcement allow-list inverts the channel deny-list"
        );
    }

    #[test]
    fn like_patterns_append_channel_separator() {
        let policy = FilterPolicy {
            deny_pid_prefixes: vec!["discord:123".to_string()],
            deny_source_ids: Vec::new(),
            announcement_pid_prefixes: vec!["discord:456:".to_string()],
        };
        assert_eq!(policy.deny_pid_patterns(), vec!["discord:123:%"]);
        assert_eq!(policy.announcement_pid_patterns(), vec!["discord:456:%"]);
    }
}
