use std::fmt;

use serde::{Deserialize, Serialize};

/// TLV type carried by ordinary name segments on the wire.
pub const TYPE_NAME_SEGMENT: u16 = 0x0001;

/// Errors that can occur while parsing or encoding names
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NameError {
    #[error("Truncated name at offset {0}")]
    Truncated(usize),
    #[error("Name component exceeds maximum length: {0}")]
    ComponentTooLong(usize),
    #[error("Invalid name URI: {0}")]
    InvalidUri(String),
}

/// A single structural component of a hierarchical name.
///
/// Wire form is `[type:2][length:2][value:length]` with big-endian
/// multi-byte integers, concatenated per component with no outer wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NameComponent {
    pub type_: u16,
    pub value: Vec<u8>,
}

impl NameComponent {
    pub fn new(value: Vec<u8>) -> Self {
        Self {
            type_: TYPE_NAME_SEGMENT,
            value,
        }
    }

    pub fn from_str(s: &str) -> Self {
        Self::new(s.as_bytes().to_vec())
    }

    pub fn as_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.value)
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Total number of bytes this component occupies on the wire.
    pub fn encoded_length(&self) -> usize {
        4 + self.value.len()
    }
}

impl fmt::Display for NameComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Ok(s) => write!(f, "{}", s),
            Err(_) => write!(f, "{:?}", self.value),
        }
    }
}

/// A hierarchical TLV name.
///
/// `Name` is `Eq + Hash + Ord` so it can key a map directly; component
/// order is structural, so prefix relationships follow component prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Name {
    pub components: Vec<NameComponent>,
}

impl Name {
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// Parse a `/a/b/c` style URI. Empty segments are skipped, so
    /// `/a//b` and `/a/b` produce the same name.
    pub fn from_uri(uri: &str) -> Result<Self, NameError> {
        let mut components = Vec::new();

        let trimmed = uri.strip_prefix('/').unwrap_or(uri);
        for part in trimmed.split('/') {
            if part.is_empty() {
                continue;
            }
            if part.len() > u16::MAX as usize {
                return Err(NameError::ComponentTooLong(part.len()));
            }
            components.push(NameComponent::from_str(part));
        }

        Ok(Self { components })
    }

    /// Decode a name from its wire form, walking component TLVs until the
    /// buffer is exhausted.
    pub fn from_wire(data: &[u8]) -> Result<Self, NameError> {
        let mut components = Vec::new();
        let mut offset = 0;

        while offset < data.len() {
            if data.len() - offset < 4 {
                return Err(NameError::Truncated(offset));
            }
            let type_ = u16::from_be_bytes([data[offset], data[offset + 1]]);
            let length = u16::from_be_bytes([data[offset + 2], data[offset + 3]]) as usize;
            offset += 4;

            if data.len() - offset < length {
                return Err(NameError::Truncated(offset));
            }
            components.push(NameComponent {
                type_,
                value: data[offset..offset + length].to_vec(),
            });
            offset += length;
        }

        Ok(Self { components })
    }

    /// Encode to wire form: concatenated component TLVs, no outer wrapper.
    pub fn to_wire(&self) -> Vec<u8> {
        let total: usize = self.components.iter().map(|c| c.encoded_length()).sum();
        let mut buffer = Vec::with_capacity(total);

        for component in &self.components {
            buffer.extend_from_slice(&component.type_.to_be_bytes());
            buffer.extend_from_slice(&(component.value.len() as u16).to_be_bytes());
            buffer.extend_from_slice(&component.value);
        }

        buffer
    }

    pub fn push(&mut self, component: NameComponent) {
        self.components.push(component);
    }

    pub fn get_component(&self, index: usize) -> Option<&NameComponent> {
        self.components.get(index)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// The name with its last structural component removed, or `None` when
    /// already empty. This is the shortening step of longest-prefix search.
    pub fn parent(&self) -> Option<Name> {
        if self.components.is_empty() {
            return None;
        }
        Some(Self {
            components: self.components[..self.components.len() - 1].to_vec(),
        })
    }

    pub fn get_prefix(&self, length: usize) -> Name {
        let end = std::cmp::min(length, self.components.len());
        Self {
            components: self.components[..end].to_vec(),
        }
    }

    /// True when every component of `self` equals the corresponding leading
    /// component of `other`. An empty name is a prefix of every name.
    pub fn is_prefix_of(&self, other: &Name) -> bool {
        if self.components.len() > other.components.len() {
            return false;
        }
        self.components
            .iter()
            .zip(other.components.iter())
            .all(|(a, b)| a == b)
    }

    pub fn to_uri(&self) -> String {
        if self.components.is_empty() {
            return "/".to_string();
        }

        let mut uri = String::new();
        for component in &self.components {
            uri.push('/');
            uri.push_str(&component.to_string());
        }
        uri
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uri())
    }
}
