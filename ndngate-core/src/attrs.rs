use crate::name::Name;

/// The parsed-Interest view handed to packet classification.
///
/// Full wire parsing happens upstream; this carries only the fields the
/// admission layer consults, plus the raw message bytes for custom
/// predicates.
#[derive(Debug, Clone)]
pub struct PacketAttrs {
    /// Raw message bytes as received, available to custom predicates.
    pub msg: Vec<u8>,
    /// Interest name, without any trailing chunk component.
    pub name: Name,
    /// Face the packet arrived on.
    pub incoming_face: u32,
    /// Source node identifier, when the transport layer knows one.
    pub node_id: Option<Vec<u8>>,
    /// Chunk number, when the Interest carries one.
    pub chunk: Option<u32>,
}

impl PacketAttrs {
    pub fn new(name: Name, incoming_face: u32) -> Self {
        Self {
            msg: Vec::new(),
            name,
            incoming_face,
            node_id: None,
            chunk: None,
        }
    }

    pub fn with_msg(mut self, msg: Vec<u8>) -> Self {
        self.msg = msg;
        self
    }

    pub fn with_node_id(mut self, node_id: Vec<u8>) -> Self {
        self.node_id = Some(node_id);
        self
    }

    pub fn with_chunk(mut self, chunk: u32) -> Self {
        self.chunk = Some(chunk);
        self
    }
}
