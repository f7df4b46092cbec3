use std::fmt;

use chrono::{DateTime, Local};
use log::debug;

use ndngate_core::{PacketAttrs, RuleAction};

use crate::conditions::{
    ChunkCondition, NameCondition, PacketPredicate, SourceCondition, TimeCondition,
};

/// Errors from rule administration
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("Rule not found: {0}")]
    NotFound(u32),
    #[error("Invalid rule: {0}")]
    InvalidArgument(String),
}

/// One packet-classification rule.
///
/// Conditions combine with AND semantics; a condition that is not present
/// is always true, so a rule with no conditions matches unconditionally.
/// The id is engine-assigned on insertion and used for removal.
pub struct PacketControlRule {
    pub id: u32,
    pub action: RuleAction,
    /// Higher priorities are evaluated first.
    pub priority: u8,
    pub enabled: bool,
    pub name_cond: Option<NameCondition>,
    pub time_cond: Option<TimeCondition>,
    pub source_cond: Option<SourceCondition>,
    pub chunk_cond: Option<ChunkCondition>,
    pub custom_cond: Option<Box<dyn PacketPredicate>>,
    /// Times this rule has been the winning match.
    pub match_count: u64,
    /// Unix microseconds of the last winning match.
    pub last_match_time: u64,
}

impl PacketControlRule {
    pub fn new(action: RuleAction, priority: u8) -> Self {
        Self {
            id: 0,
            action,
            priority,
            enabled: true,
            name_cond: None,
            time_cond: None,
            source_cond: None,
            chunk_cond: None,
            custom_cond: None,
            match_count: 0,
            last_match_time: 0,
        }
    }

    pub fn with_name(mut self, condition: NameCondition) -> Self {
        self.name_cond = Some(condition);
        self
    }

    pub fn with_time(mut self, condition: TimeCondition) -> Self {
        self.time_cond = Some(condition);
        self
    }

    pub fn with_source(mut self, condition: SourceCondition) -> Self {
        self.source_cond = Some(condition);
        self
    }

    pub fn with_chunk(mut self, condition: ChunkCondition) -> Self {
        self.chunk_cond = Some(condition);
        self
    }

    pub fn with_custom(mut self, predicate: Box<dyn PacketPredicate>) -> Self {
        self.custom_cond = Some(predicate);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Evaluate all present conditions in the fixed order Name, Time,
    /// Source, ChunkNum, Custom, short-circuiting on the first failure.
    fn matches(&self, attrs: &PacketAttrs, name_wire: &[u8], now: DateTime<Local>) -> bool {
        if let Some(condition) = &self.name_cond {
            if !condition.matches(name_wire) {
                return false;
            }
        }
        if let Some(condition) = &self.time_cond {
            if !condition.matches(now) {
                return false;
            }
        }
        if let Some(condition) = &self.source_cond {
            if !condition.matches(attrs.incoming_face, attrs.node_id.as_deref()) {
                return false;
            }
        }
        if let Some(condition) = &self.chunk_cond {
            if !condition.matches(attrs.chunk) {
                return false;
            }
        }
        if let Some(predicate) = &self.custom_cond {
            if !predicate.matches(&attrs.msg) {
                return false;
            }
        }
        true
    }

    fn validate(&self) -> Result<(), RuleError> {
        match self.time_cond {
            Some(TimeCondition::Interval { interval_sec: 0 }) => {
                return Err(RuleError::InvalidArgument(
                    "interval must be nonzero".to_string(),
                ));
            }
            Some(TimeCondition::Period { start_us, end_us }) if start_us > end_us => {
                return Err(RuleError::InvalidArgument(
                    "period start after end".to_string(),
                ));
            }
            Some(TimeCondition::Schedule {
                start_hour,
                end_hour,
                ..
            }) if start_hour > 23 || end_hour > 23 => {
                return Err(RuleError::InvalidArgument(
                    "schedule hour out of range".to_string(),
                ));
            }
            _ => {}
        }

        if let Some(ChunkCondition { min, max }) = self.chunk_cond {
            if max != 0 && min > max {
                return Err(RuleError::InvalidArgument(
                    "chunk range min above max".to_string(),
                ));
            }
        }

        Ok(())
    }
}

impl fmt::Debug for PacketControlRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PacketControlRule")
            .field("id", &self.id)
            .field("action", &self.action)
            .field("priority", &self.priority)
            .field("enabled", &self.enabled)
            .field("name_cond", &self.name_cond)
            .field("time_cond", &self.time_cond)
            .field("source_cond", &self.source_cond)
            .field("chunk_cond", &self.chunk_cond)
            .field("custom_cond", &self.custom_cond.as_ref().map(|_| "<predicate>"))
            .field("match_count", &self.match_count)
            .finish()
    }
}

/// Priority-ordered packet-classification engine.
///
/// Rules are kept sorted by descending priority; among equal priorities,
/// insertion order is preserved (new rules append after existing ones of
/// the same priority), so evaluation order is a stable total order.
#[derive(Debug)]
pub struct RuleEngine {
    rules: Vec<PacketControlRule>,
    next_id: u32,
    default_action: RuleAction,
    total_packets: u64,
    processed_packets: u64,
}

impl RuleEngine {
    pub fn new(default_action: RuleAction) -> Self {
        Self {
            rules: Vec::new(),
            next_id: 1,
            default_action,
            total_packets: 0,
            processed_packets: 0,
        }
    }

    pub fn rules(&self) -> &[PacketControlRule] {
        &self.rules
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn default_action(&self) -> RuleAction {
        self.default_action
    }

    pub fn total_packets(&self) -> u64 {
        self.total_packets
    }

    pub fn processed_packets(&self) -> u64 {
        self.processed_packets
    }

    /// Insert a rule at its priority position and return the id assigned
    /// to it. Malformed rules are rejected before anything changes.
    pub fn add_rule(&mut self, mut rule: PacketControlRule) -> Result<u32, RuleError> {
        rule.validate()?;

        rule.id = self.next_id;
        self.next_id += 1;

        // first slot whose priority is strictly lower keeps FIFO order
        // within an equal-priority class
        let position = self
            .rules
            .iter()
            .position(|existing| existing.priority < rule.priority)
            .unwrap_or(self.rules.len());

        debug!(
            "Added rule {} with priority {} (total: {} rules)",
            rule.id,
            rule.priority,
            self.rules.len() + 1
        );
        let id = rule.id;
        self.rules.insert(position, rule);
        Ok(id)
    }

    pub fn remove_rule(&mut self, id: u32) -> Result<(), RuleError> {
        let position = self
            .rules
            .iter()
            .position(|rule| rule.id == id)
            .ok_or(RuleError::NotFound(id))?;
        self.rules.remove(position);
        debug!("Removed rule {} ({} rules remain)", id, self.rules.len());
        Ok(())
    }

    /// Classify one packet. The first enabled rule whose conditions all
    /// hold wins and its action is returned; otherwise the default action.
    /// Never fails: absent configuration degrades to the default, and only
    /// a winning rule moves per-rule statistics.
    pub fn evaluate(&mut self, attrs: &PacketAttrs, now: DateTime<Local>) -> RuleAction {
        self.total_packets += 1;

        let name_wire = attrs.name.to_wire();
        for rule in &mut self.rules {
            if !rule.enabled {
                continue;
            }
            if rule.matches(attrs, &name_wire, now) {
                rule.match_count += 1;
                rule.last_match_time = now.timestamp_micros().max(0) as u64;
                self.processed_packets += 1;
                debug!("Rule {} matched, action: {}", rule.id, rule.action);
                return rule.action;
            }
        }

        self.default_action
    }

    /// Human-readable counter dump; observational only.
    pub fn render_statistics(&self) -> String {
        let mut report = String::new();
        report.push_str("PacketControl Statistics:\n");
        report.push_str(&format!("  Total Packets: {}\n", self.total_packets));
        report.push_str(&format!("  Processed Packets: {}\n", self.processed_packets));
        report.push_str(&format!("  Total Rules: {}\n", self.rules.len()));
        report.push_str(&format!("  Default Action: {}\n", self.default_action));
        report.push_str("\nRule Details:\n");
        for rule in &self.rules {
            report.push_str(&format!(
                "  Rule {}: Priority={}, Enabled={}, Matches={}\n",
                rule.id,
                rule.priority,
                if rule.enabled { "YES" } else { "NO" },
                rule.match_count
            ));
        }
        report
    }
}
