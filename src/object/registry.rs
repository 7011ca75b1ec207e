// Mapping from wire type tag to decode function, populated once at layer construction.
use crate::errors::CoreError;
use crate::object::inner::InnerObject;
use std::collections::HashMap;

type DecodeFn = fn(&[u8]) -> Result<InnerObject, CoreError>;

pub struct TypeRegistry {
    decoders: HashMap<&'static str, DecodeFn>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut decoders: HashMap<&'static str, DecodeFn> = HashMap::new();
        decoders.insert("FileSendMetadata", InnerObject::decode_file_send_metadata);
        decoders.insert("FileReqAck", InnerObject::decode_file_req_ack);
        decoders.insert("FilePartObj", InnerObject::decode_file_part_obj);
        decoders.insert("Ping", InnerObject::decode_ping);
        Self { decoders }
    }

    pub fn decode(&self, type_tag: &str, payload: &[u8]) -> Result<InnerObject, CoreError> {
        match self.decoders.get(type_tag) {
            Some(decode) => decode(payload),
            None => Err(CoreError::UnknownType {
                type_tag: type_tag.to_string(),
            }),
        }
    }

    pub fn is_registered(&self, type_tag: &str) -> bool {
        self.decoders.contains_key(type_tag)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tag_yields_unknown_type_error() {
        let registry = TypeRegistry::new();
        let err = registry.decode("NotARealType", &[]).unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_TYPE");
    }

    #[test]
    fn every_spec_type_is_registered() {
        let registry = TypeRegistry::new();
        for tag in ["FileSendMetadata", "FileReqAck", "FilePartObj", "Ping"] {
            assert!(registry.is_registered(tag));
        }
    }
}
