use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Liveness state of a whole forwarding-table entry.
///
/// Wire bytes match the control protocol: Active = 0x01, Inactive = 0x02,
/// Suspended = 0x04.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Active,
    Inactive,
    Suspended,
}

impl EntryStatus {
    pub fn to_wire(self) -> u8 {
        match self {
            EntryStatus::Active => 0x01,
            EntryStatus::Inactive => 0x02,
            EntryStatus::Suspended => 0x04,
        }
    }

    /// Any byte outside the three known values decodes as `None`; callers
    /// that need a conservative default map that to `Inactive`.
    pub fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(EntryStatus::Active),
            0x02 => Some(EntryStatus::Inactive),
            0x04 => Some(EntryStatus::Suspended),
            _ => None,
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryStatus::Active => write!(f, "active"),
            EntryStatus::Inactive => write!(f, "inactive"),
            EntryStatus::Suspended => write!(f, "suspended"),
        }
    }
}

impl FromStr for EntryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(EntryStatus::Active),
            "inactive" => Ok(EntryStatus::Inactive),
            "suspended" => Ok(EntryStatus::Suspended),
            other => Err(format!("unknown entry status: {}", other)),
        }
    }
}

/// Liveness state of a single face within an entry's face list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceStatus {
    Active,
    Inactive,
}

impl FaceStatus {
    pub fn to_wire(self) -> u8 {
        match self {
            FaceStatus::Active => 0x01,
            FaceStatus::Inactive => 0x02,
        }
    }

    pub fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(FaceStatus::Active),
            0x02 => Some(FaceStatus::Inactive),
            _ => None,
        }
    }
}

impl FromStr for FaceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(FaceStatus::Active),
            "inactive" => Ok(FaceStatus::Inactive),
            other => Err(format!("unknown face status: {}", other)),
        }
    }
}

impl fmt::Display for FaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaceStatus::Active => write!(f, "active"),
            FaceStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// Admission decision produced by packet classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    /// Continue into FIB lookup and egress selection.
    Forward,
    /// Discard the packet silently.
    Drop,
    /// Send an Interest Return toward the requester.
    Return,
    /// Hand the packet to the deferred-processing queue.
    Queue,
}

impl RuleAction {
    pub fn to_wire(self) -> u8 {
        match self {
            RuleAction::Forward => 0x01,
            RuleAction::Drop => 0x02,
            RuleAction::Return => 0x04,
            RuleAction::Queue => 0x08,
        }
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleAction::Forward => write!(f, "FORWARD"),
            RuleAction::Drop => write!(f, "DROP"),
            RuleAction::Return => write!(f, "RETURN"),
            RuleAction::Queue => write!(f, "QUEUE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_status_wire_round_trip() {
        for status in [
            EntryStatus::Active,
            EntryStatus::Inactive,
            EntryStatus::Suspended,
        ] {
            assert_eq!(EntryStatus::from_wire(status.to_wire()), Some(status));
        }
        assert_eq!(EntryStatus::from_wire(0x00), None);
        assert_eq!(EntryStatus::from_wire(0xFF), None);
    }

    #[test]
    fn test_entry_status_from_str() {
        assert_eq!("active".parse(), Ok(EntryStatus::Active));
        assert_eq!("suspended".parse(), Ok(EntryStatus::Suspended));
        assert!("up".parse::<EntryStatus>().is_err());
    }

    #[test]
    fn test_face_status_wire() {
        assert_eq!(FaceStatus::from_wire(0x01), Some(FaceStatus::Active));
        assert_eq!(FaceStatus::from_wire(0x02), Some(FaceStatus::Inactive));
        assert_eq!(FaceStatus::from_wire(0x04), None);
    }
}
