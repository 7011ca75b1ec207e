// Self-describing wrapper around one inner object's serialized bytes: source_ip, type_tag,
// payload_length, payload_bytes, in that wire order (see the frame vs. envelope layering note
// in transport::frame — the envelope is one layer up, inside a frame's payload).
use crate::errors::CoreError;
use crate::object::codec::{write_string, write_u32, Reader};
use crate::object::inner::InnerObject;
use crate::object::registry::TypeRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub source_ip: String,
    pub type_tag: String,
    pub payload_bytes: Vec<u8>,
}

impl Envelope {
    pub fn wrap(source_ip: &str, object: &InnerObject) -> Self {
        Self {
            source_ip: source_ip.to_string(),
            type_tag: object.type_tag().to_string(),
            payload_bytes: object.encode(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        write_string(&mut buf, &self.source_ip);
        write_string(&mut buf, &self.type_tag);
        write_u32(&mut buf, self.payload_bytes.len() as u32);
        buf.extend_from_slice(&self.payload_bytes);
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CoreError> {
        let mut r = Reader::new(bytes);
        let source_ip = r.read_string()?;
        let type_tag = r.read_string()?;
        let payload_bytes = r.read_bytes()?;
        Ok(Self {
            source_ip,
            type_tag,
            payload_bytes,
        })
    }

    pub fn decode_payload(&self, registry: &TypeRegistry) -> Result<InnerObject, CoreError> {
        registry.decode(&self.type_tag, &self.payload_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_round_trips() {
        let object = InnerObject::Ping {
            sender_ip: "192.168.1.2".to_string(),
        };
        let envelope = Envelope::wrap("192.168.1.2", &object);
        let encoded = envelope.encode();
        let decoded = Envelope::decode(&encoded).unwrap();
        assert_eq!(decoded, envelope);

        let registry = TypeRegistry::new();
        let inner = decoded.decode_payload(&registry).unwrap();
        match inner {
            InnerObject::Ping { sender_ip } => assert_eq!(sender_ip, "192.168.1.2"),
            _ => panic!("wrong variant decoded"),
        }
    }

    #[test]
    fn missing_payload_bytes_is_malformed() {
        let mut buf = Vec::new();
        write_string(&mut buf, "10.0.0.1");
        write_string(&mut buf, "Ping");
        write_u32(&mut buf, 100); // claims 100 bytes of payload, supplies none
        let err = Envelope::decode(&buf).unwrap_err();
        assert_eq!(err.error_code(), "MALFORMED_ENVELOPE");
    }
}
