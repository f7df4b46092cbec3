use crate::status::{EntryStatus, FaceStatus};

/// Control protocol operation codes.
pub const OP_SET_STATUS: u8 = 0x01;
pub const OP_GET_STATUS: u8 = 0x02;
pub const OP_STATISTICS: u8 = 0x03;
pub const OP_CLEANUP: u8 = 0x04;
pub const OP_SET_FACE_STATUS: u8 = 0x05;

/// Errors raised while decoding control messages
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ControlError {
    #[error("Truncated control message")]
    Truncated,
    #[error("Unknown operation: {0:#04x}")]
    UnknownOperation(u8),
    #[error("Unknown status byte: {0:#04x}")]
    UnknownStatus(u8),
    #[error("Failure response")]
    Failure,
}

/// A decoded control request.
///
/// Wire layout is `[operation:1][status:1][name_len:2][name:name_len]`,
/// big-endian multi-byte integers; `SetFaceStatus` carries a trailing
/// `[face_id:2]`. The name bytes are the TLV wire form of the target
/// entry's name and are not interpreted at this layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlRequest {
    SetStatus { name: Vec<u8>, status: EntryStatus },
    GetStatus { name: Vec<u8> },
    Statistics,
    Cleanup,
    SetFaceStatus {
        name: Vec<u8>,
        face_id: u16,
        status: FaceStatus,
    },
}

impl ControlRequest {
    pub fn operation(&self) -> u8 {
        match self {
            ControlRequest::SetStatus { .. } => OP_SET_STATUS,
            ControlRequest::GetStatus { .. } => OP_GET_STATUS,
            ControlRequest::Statistics => OP_STATISTICS,
            ControlRequest::Cleanup => OP_CLEANUP,
            ControlRequest::SetFaceStatus { .. } => OP_SET_FACE_STATUS,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let (status_byte, name, face_id) = match self {
            ControlRequest::SetStatus { name, status } => (status.to_wire(), name.as_slice(), None),
            ControlRequest::GetStatus { name } => (0, name.as_slice(), None),
            ControlRequest::Statistics => (0, &[] as &[u8], None),
            ControlRequest::Cleanup => (0, &[] as &[u8], None),
            ControlRequest::SetFaceStatus {
                name,
                face_id,
                status,
            } => (status.to_wire(), name.as_slice(), Some(*face_id)),
        };

        let mut buffer = Vec::with_capacity(4 + name.len() + 2);
        buffer.push(self.operation());
        buffer.push(status_byte);
        buffer.extend_from_slice(&(name.len() as u16).to_be_bytes());
        buffer.extend_from_slice(name);
        if let Some(face_id) = face_id {
            buffer.extend_from_slice(&face_id.to_be_bytes());
        }
        buffer
    }

    /// Decode a request, rejecting truncation at every field boundary.
    /// A malformed message yields an error before any field is acted on.
    pub fn decode(data: &[u8]) -> Result<Self, ControlError> {
        if data.len() < 4 {
            return Err(ControlError::Truncated);
        }
        let operation = data[0];
        let status_byte = data[1];
        let name_len = u16::from_be_bytes([data[2], data[3]]) as usize;

        if data.len() < 4 + name_len {
            return Err(ControlError::Truncated);
        }
        let name = data[4..4 + name_len].to_vec();

        match operation {
            OP_SET_STATUS => {
                let status = EntryStatus::from_wire(status_byte)
                    .ok_or(ControlError::UnknownStatus(status_byte))?;
                Ok(ControlRequest::SetStatus { name, status })
            }
            OP_GET_STATUS => Ok(ControlRequest::GetStatus { name }),
            OP_STATISTICS => Ok(ControlRequest::Statistics),
            OP_CLEANUP => Ok(ControlRequest::Cleanup),
            OP_SET_FACE_STATUS => {
                let status = FaceStatus::from_wire(status_byte)
                    .ok_or(ControlError::UnknownStatus(status_byte))?;
                let rest = &data[4 + name_len..];
                if rest.len() < 2 {
                    return Err(ControlError::Truncated);
                }
                let face_id = u16::from_be_bytes([rest[0], rest[1]]);
                Ok(ControlRequest::SetFaceStatus {
                    name,
                    face_id,
                    status,
                })
            }
            other => Err(ControlError::UnknownOperation(other)),
        }
    }
}

/// A control response. `Ok`/`Failure` are the single result byte; a status
/// query appends the entry status, a statistics query replaces the body
/// with three big-endian counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlResponse {
    Ok,
    Failure,
    Status(EntryStatus),
    Statistics {
        active: u32,
        inactive: u32,
        suspended: u32,
    },
}

impl ControlResponse {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            ControlResponse::Ok => vec![0x01],
            ControlResponse::Failure => vec![0x00],
            ControlResponse::Status(status) => vec![0x01, status.to_wire()],
            ControlResponse::Statistics {
                active,
                inactive,
                suspended,
            } => {
                let mut buffer = Vec::with_capacity(13);
                buffer.push(0x01);
                buffer.extend_from_slice(&active.to_be_bytes());
                buffer.extend_from_slice(&inactive.to_be_bytes());
                buffer.extend_from_slice(&suspended.to_be_bytes());
                buffer
            }
        }
    }

    /// Decode the response to `operation`. The response shape depends on
    /// the request, so the caller supplies the operation it sent.
    pub fn decode(operation: u8, data: &[u8]) -> Result<Self, ControlError> {
        if data.is_empty() {
            return Err(ControlError::Truncated);
        }
        if data[0] == 0x00 {
            return Ok(ControlResponse::Failure);
        }

        match operation {
            OP_GET_STATUS => {
                if data.len() < 2 {
                    return Err(ControlError::Truncated);
                }
                let status = EntryStatus::from_wire(data[1])
                    .ok_or(ControlError::UnknownStatus(data[1]))?;
                Ok(ControlResponse::Status(status))
            }
            OP_STATISTICS => {
                if data.len() < 13 {
                    return Err(ControlError::Truncated);
                }
                Ok(ControlResponse::Statistics {
                    active: u32::from_be_bytes([data[1], data[2], data[3], data[4]]),
                    inactive: u32::from_be_bytes([data[5], data[6], data[7], data[8]]),
                    suspended: u32::from_be_bytes([data[9], data[10], data[11], data[12]]),
                })
            }
            _ => Ok(ControlResponse::Ok),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_status_round_trip() {
        let request = ControlRequest::SetStatus {
            name: vec![0x00, 0x01, 0x00, 0x01, b'a'],
            status: EntryStatus::Suspended,
        };
        let encoded = request.encode();
        assert_eq!(encoded[0], OP_SET_STATUS);
        assert_eq!(encoded[1], 0x04);
        assert_eq!(&encoded[2..4], &[0x00, 0x05]);
        assert_eq!(ControlRequest::decode(&encoded).unwrap(), request);
    }

    #[test]
    fn test_set_face_status_round_trip() {
        let request = ControlRequest::SetFaceStatus {
            name: vec![0xAA, 0xBB],
            face_id: 0x0102,
            status: FaceStatus::Inactive,
        };
        let encoded = request.encode();
        assert_eq!(encoded.last(), Some(&0x02));
        assert_eq!(ControlRequest::decode(&encoded).unwrap(), request);
    }

    #[test]
    fn test_statistics_zero_name_len_is_well_formed() {
        let encoded = ControlRequest::Statistics.encode();
        assert_eq!(encoded, vec![OP_STATISTICS, 0x00, 0x00, 0x00]);
        assert_eq!(
            ControlRequest::decode(&encoded).unwrap(),
            ControlRequest::Statistics
        );
    }

    #[test]
    fn test_decode_rejects_truncation_at_each_boundary() {
        let request = ControlRequest::SetFaceStatus {
            name: vec![1, 2, 3],
            face_id: 9,
            status: FaceStatus::Active,
        };
        let encoded = request.encode();
        for len in 0..encoded.len() {
            assert_eq!(
                ControlRequest::decode(&encoded[..len]),
                Err(ControlError::Truncated),
                "length {} should be rejected",
                len
            );
        }
    }

    #[test]
    fn test_decode_rejects_unknown_operation() {
        assert_eq!(
            ControlRequest::decode(&[0x7F, 0x01, 0x00, 0x00]),
            Err(ControlError::UnknownOperation(0x7F))
        );
    }

    #[test]
    fn test_decode_rejects_unknown_status() {
        assert_eq!(
            ControlRequest::decode(&[OP_SET_STATUS, 0x09, 0x00, 0x00]),
            Err(ControlError::UnknownStatus(0x09))
        );
    }

    #[test]
    fn test_response_round_trips() {
        let response = ControlResponse::Statistics {
            active: 3,
            inactive: 1,
            suspended: 0,
        };
        let encoded = response.encode();
        assert_eq!(encoded.len(), 13);
        assert_eq!(
            ControlResponse::decode(OP_STATISTICS, &encoded).unwrap(),
            response
        );

        let status = ControlResponse::Status(EntryStatus::Inactive);
        assert_eq!(
            ControlResponse::decode(OP_GET_STATUS, &status.encode()).unwrap(),
            status
        );

        assert_eq!(
            ControlResponse::decode(OP_SET_STATUS, &ControlResponse::Failure.encode()).unwrap(),
            ControlResponse::Failure
        );
        assert_eq!(
            ControlResponse::decode(OP_CLEANUP, &ControlResponse::Ok.encode()).unwrap(),
            ControlResponse::Ok
        );
    }
}
