use chrono::{DateTime, Datelike, Local, Timelike};

/// How a name pattern is compared against a candidate name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch {
    /// Byte-for-byte equality of the full name.
    Exact,
    /// Candidate's leading bytes equal the pattern.
    Prefix,
    /// Pattern occurs anywhere in the candidate as a contiguous run.
    Substring,
}

/// Name predicate over the TLV wire form of a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCondition {
    pub pattern: Vec<u8>,
    pub match_type: NameMatch,
}

impl NameCondition {
    /// An empty pattern always matches, whatever the match type.
    pub fn matches(&self, name: &[u8]) -> bool {
        if self.pattern.is_empty() {
            return true;
        }

        match self.match_type {
            NameMatch::Exact => name == self.pattern.as_slice(),
            NameMatch::Prefix => {
                name.len() >= self.pattern.len() && name[..self.pattern.len()] == self.pattern[..]
            }
            NameMatch::Substring => {
                if name.len() < self.pattern.len() {
                    return false;
                }
                name.windows(self.pattern.len())
                    .any(|window| window == self.pattern.as_slice())
            }
        }
    }
}

/// Time predicate, evaluated against a caller-supplied local-time view so
/// tests can pin the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeCondition {
    Always,
    /// Inclusive window in unix microseconds.
    Period { start_us: u64, end_us: u64 },
    /// Weekday bitmask (bit 0 = Sunday; zero means every day) plus an
    /// hour-of-day window `[start_hour, end_hour)`. When `start_hour >
    /// end_hour` the window wraps midnight; equal hours skip the hour
    /// check and match the full day.
    Schedule {
        weekdays: u8,
        start_hour: u8,
        end_hour: u8,
    },
    /// Matches when the current unix second is an exact multiple of
    /// `interval_sec`. Known limitation: this is a coarse pulse that only
    /// matches packets arriving in the exact matching second, not "once
    /// per interval" semantics.
    Interval { interval_sec: u32 },
}

impl TimeCondition {
    pub fn matches(&self, now: DateTime<Local>) -> bool {
        match *self {
            TimeCondition::Always => true,
            TimeCondition::Period { start_us, end_us } => {
                let now_us = now.timestamp_micros();
                now_us >= start_us as i64 && now_us <= end_us as i64
            }
            TimeCondition::Schedule {
                weekdays,
                start_hour,
                end_hour,
            } => {
                if weekdays != 0 {
                    let weekday_bit = 1u8 << now.weekday().num_days_from_sunday();
                    if weekdays & weekday_bit == 0 {
                        return false;
                    }
                }

                let hour = now.hour() as u8;
                if start_hour == end_hour {
                    true
                } else if start_hour < end_hour {
                    hour >= start_hour && hour < end_hour
                } else {
                    // window crosses midnight
                    hour >= start_hour || hour < end_hour
                }
            }
            TimeCondition::Interval { interval_sec } => {
                if interval_sec == 0 {
                    return false;
                }
                now.timestamp() % interval_sec as i64 == 0
            }
        }
    }
}

/// Source predicate: arrival face and optional node identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCondition {
    /// Face id to require; 0 is a wildcard.
    pub face_id: u32,
    /// When set, the packet's node id must match exactly in length and
    /// content.
    pub node_id: Option<Vec<u8>>,
}

impl SourceCondition {
    pub fn matches(&self, incoming_face: u32, node_id: Option<&[u8]>) -> bool {
        if self.face_id != 0 && self.face_id != incoming_face {
            return false;
        }

        match &self.node_id {
            Some(expected) if !expected.is_empty() => {
                matches!(node_id, Some(actual) if actual == expected.as_slice())
            }
            _ => true,
        }
    }
}

/// Chunk-range predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkCondition {
    pub min: u32,
    /// Upper bound; 0 means unbounded. A chunkless packet passes only
    /// when both bounds are 0.
    pub max: u32,
}

impl ChunkCondition {
    pub fn matches(&self, chunk: Option<u32>) -> bool {
        match chunk {
            // a chunkless packet only matches a rule that expects one
            None => self.min == 0 && self.max == 0,
            Some(chunk) => chunk >= self.min && (self.max == 0 || chunk <= self.max),
        }
    }
}

/// Caller-supplied predicate over the raw packet bytes. The engine treats
/// the result as authoritative and applies no further interpretation.
pub trait PacketPredicate: Send + Sync {
    fn matches(&self, msg: &[u8]) -> bool;
}

impl<F> PacketPredicate for F
where
    F: Fn(&[u8]) -> bool + Send + Sync,
{
    fn matches(&self, msg: &[u8]) -> bool {
        self(msg)
    }
}
