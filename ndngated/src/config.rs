use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use ndngate_core::{EntryStatus, Name, RuleAction};
use ndngate_engine::{
    ChunkCondition, NameCondition, NameMatch, PacketControlRule, SourceCondition, SweepConfig,
    TimeCondition,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub daemon: DaemonConfig,
    pub sweep: SweepSettings,
    pub logging: LoggingConfig,
    /// Default action when no rule matches.
    #[serde(default = "default_action")]
    pub default_action: RuleAction,
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    pub control_socket: String,
    pub pid_file: String,
    /// Line-oriented FIB status seed file; absent means no seeding.
    pub fib_status_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepSettings {
    /// How often the sweep task wakes up.
    pub tick_secs: u64,
    pub demote_interval_secs: u64,
    pub inactive_threshold_secs: u64,
    pub cleanup_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

/// A route seeded at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    pub prefix: String,
    #[serde(default)]
    pub faces: Vec<u32>,
    pub status: Option<EntryStatus>,
    #[serde(default)]
    pub priority: u32,
}

/// A classification rule seeded at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    pub action: RuleAction,
    pub priority: u8,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub name: Option<NameConditionConfig>,
    pub time: Option<TimeConditionConfig>,
    pub source: Option<SourceConditionConfig>,
    pub chunk: Option<ChunkConditionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameConditionConfig {
    /// Pattern as a name URI; converted to TLV wire form before matching.
    pub pattern: String,
    #[serde(rename = "match")]
    pub match_type: NameMatchConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameMatchConfig {
    Exact,
    Prefix,
    Substring,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TimeConditionConfig {
    Always,
    Period { start_us: u64, end_us: u64 },
    Schedule {
        #[serde(default)]
        weekdays: u8,
        start_hour: u8,
        end_hour: u8,
    },
    Interval { interval_sec: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConditionConfig {
    #[serde(default)]
    pub face_id: u32,
    pub node_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkConditionConfig {
    #[serde(default)]
    pub min: u32,
    #[serde(default)]
    pub max: u32,
}

fn default_action() -> RuleAction {
    RuleAction::Forward
}

fn default_enabled() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daemon: DaemonConfig {
                control_socket: "/var/run/ndngated.sock".to_string(),
                pid_file: "/var/run/ndngated.pid".to_string(),
                fib_status_file: None,
            },
            sweep: SweepSettings {
                tick_secs: 10,
                demote_interval_secs: 300,
                inactive_threshold_secs: 30 * 60,
                cleanup_interval_secs: 3600,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: None,
            },
            default_action: RuleAction::Forward,
            routes: Vec::new(),
            rules: Vec::new(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        if !path.as_ref().exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

impl SweepSettings {
    pub fn to_sweep_config(&self) -> SweepConfig {
        SweepConfig {
            demote_interval: Duration::from_secs(self.demote_interval_secs),
            inactive_threshold: Duration::from_secs(self.inactive_threshold_secs),
            cleanup_interval: Duration::from_secs(self.cleanup_interval_secs),
        }
    }
}

impl RuleConfig {
    /// Build the engine rule this configuration describes.
    pub fn to_rule(&self) -> Result<PacketControlRule, Box<dyn std::error::Error>> {
        let mut rule = PacketControlRule::new(self.action, self.priority);
        if !self.enabled {
            rule = rule.disabled();
        }

        if let Some(name) = &self.name {
            let pattern = Name::from_uri(&name.pattern)?.to_wire();
            rule = rule.with_name(NameCondition {
                pattern,
                match_type: match name.match_type {
                    NameMatchConfig::Exact => NameMatch::Exact,
                    NameMatchConfig::Prefix => NameMatch::Prefix,
                    NameMatchConfig::Substring => NameMatch::Substring,
                },
            });
        }

        if let Some(time) = &self.time {
            rule = rule.with_time(match *time {
                TimeConditionConfig::Always => TimeCondition::Always,
                TimeConditionConfig::Period { start_us, end_us } => {
                    TimeCondition::Period { start_us, end_us }
                }
                TimeConditionConfig::Schedule {
                    weekdays,
                    start_hour,
                    end_hour,
                } => TimeCondition::Schedule {
                    weekdays,
                    start_hour,
                    end_hour,
                },
                TimeConditionConfig::Interval { interval_sec } => {
                    TimeCondition::Interval { interval_sec }
                }
            });
        }

        if let Some(source) = &self.source {
            rule = rule.with_source(SourceCondition {
                face_id: source.face_id,
                node_id: source.node_id.as_ref().map(|s| s.as_bytes().to_vec()),
            });
        }

        if let Some(chunk) = &self.chunk {
            rule = rule.with_chunk(ChunkCondition {
                min: chunk.min,
                max: chunk.max,
            });
        }

        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = Config::load("/nonexistent/ndngated.conf").unwrap();
        assert_eq!(config.daemon.control_socket, "/var/run/ndngated.sock");
        assert_eq!(config.default_action, RuleAction::Forward);
        assert!(config.routes.is_empty());
    }

    #[test]
    fn test_load_full_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
default_action = "return"

[daemon]
control_socket = "/tmp/test.sock"
pid_file = "/tmp/test.pid"
fib_status_file = "/tmp/fib_status"

[sweep]
tick_secs = 5
demote_interval_secs = 60
inactive_threshold_secs = 600
cleanup_interval_secs = 1200

[logging]
level = "debug"

[[routes]]
prefix = "/video"
faces = [1, 2]
priority = 5

[[routes]]
prefix = "/parked"
status = "suspended"

[[rules]]
action = "forward"
priority = 255
name = {{ pattern = "/emergency", match = "prefix" }}

[[rules]]
action = "drop"
priority = 10
enabled = false
time = {{ kind = "schedule", start_hour = 22, end_hour = 6 }}
chunk = {{ min = 0, max = 99 }}
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.default_action, RuleAction::Return);
        assert_eq!(config.daemon.fib_status_file.as_deref(), Some("/tmp/fib_status"));
        assert_eq!(config.sweep.demote_interval_secs, 60);
        assert_eq!(config.routes.len(), 2);
        assert_eq!(config.routes[0].faces, vec![1, 2]);
        assert_eq!(config.routes[1].status, Some(EntryStatus::Suspended));
        assert_eq!(config.rules.len(), 2);
        assert!(!config.rules[1].enabled);
    }

    #[test]
    fn test_rule_config_to_rule() {
        let rule_config = RuleConfig {
            action: RuleAction::Drop,
            priority: 40,
            enabled: true,
            name: Some(NameConditionConfig {
                pattern: "/video".to_string(),
                match_type: NameMatchConfig::Prefix,
            }),
            time: Some(TimeConditionConfig::Schedule {
                weekdays: 0,
                start_hour: 22,
                end_hour: 6,
            }),
            source: Some(SourceConditionConfig {
                face_id: 7,
                node_id: Some("node-1".to_string()),
            }),
            chunk: Some(ChunkConditionConfig { min: 0, max: 99 }),
        };

        let rule = rule_config.to_rule().unwrap();
        assert_eq!(rule.priority, 40);
        assert!(rule.enabled);
        assert_eq!(
            rule.name_cond.as_ref().unwrap().pattern,
            Name::from_uri("/video").unwrap().to_wire()
        );
        assert!(matches!(
            rule.time_cond,
            Some(TimeCondition::Schedule {
                start_hour: 22,
                end_hour: 6,
                ..
            })
        ));
        assert_eq!(
            rule.source_cond.as_ref().unwrap().node_id.as_deref(),
            Some(b"node-1".as_slice())
        );
    }

    #[test]
    fn test_save_round_trip() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.routes.push(RouteConfig {
            prefix: "/a".to_string(),
            faces: vec![3],
            status: None,
            priority: 0,
        });
        config.save(file.path()).unwrap();

        let loaded = Config::load(file.path()).unwrap();
        assert_eq!(loaded.routes.len(), 1);
        assert_eq!(loaded.routes[0].prefix, "/a");
    }
}
