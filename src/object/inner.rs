// Inner object types carried inside an envelope's payload_bytes.
use crate::errors::CoreError;
use crate::object::codec::{
    write_bool, write_bytes, write_string, write_u32, write_u64, Reader,
};

#[derive(Debug, Clone, PartialEq)]
pub struct FileMetadata {
    pub file_name: String,
    pub file_path: String,
    pub file_size: u64,
}

impl FileMetadata {
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        write_string(buf, &self.file_name);
        write_string(buf, &self.file_path);
        write_u64(buf, self.file_size);
    }

    pub fn decode_from(r: &mut Reader) -> Result<Self, CoreError> {
        Ok(Self {
            file_name: r.read_string()?,
            file_path: r.read_string()?,
            file_size: r.read_u64()?,
        })
    }
}

#[derive(Debug, Clone)]
pub enum InnerObject {
    FileSendMetadata {
        files: Vec<FileMetadata>,
        buffer_size: u32,
        sender_ip: String,
    },
    FileReqAck {
        accepted: bool,
    },
    FilePartObj {
        file_metadata: FileMetadata,
        offset: u64,
        data: Vec<u8>,
        is_last: bool,
    },
    Ping {
        sender_ip: String,
    },
}

impl InnerObject {
    pub fn type_tag(&self) -> &'static str {
        match self {
            InnerObject::FileSendMetadata { .. } => "FileSendMetadata",
            InnerObject::FileReqAck { .. } => "FileReqAck",
            InnerObject::FilePartObj { .. } => "FilePartObj",
            InnerObject::Ping { .. } => "Ping",
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            InnerObject::FileSendMetadata {
                files,
                buffer_size,
                sender_ip,
            } => {
                write_u32(&mut buf, files.len() as u32);
                for f in files {
                    f.encode_into(&mut buf);
                }
                write_u32(&mut buf, *buffer_size);
                write_string(&mut buf, sender_ip);
            }
            InnerObject::FileReqAck { accepted } => write_bool(&mut buf, *accepted),
            InnerObject::FilePartObj {
                file_metadata,
                offset,
                data,
                is_last,
            } => {
                file_metadata.encode_into(&mut buf);
                write_u64(&mut buf, *offset);
                write_bytes(&mut buf, data);
                write_bool(&mut buf, *is_last);
            }
            InnerObject::Ping { sender_ip } => write_string(&mut buf, sender_ip),
        }
        buf
    }

    pub fn decode_file_send_metadata(bytes: &[u8]) -> Result<InnerObject, CoreError> {
        let mut r = Reader::new(bytes);
        let count = r.read_u32()?;
        let mut files = Vec::with_capacity(count as usize);
        for _ in 0..count {
            files.push(FileMetadata::decode_from(&mut r)?);
        }
        let buffer_size = r.read_u32()?;
        let sender_ip = r.read_string()?;
        Ok(InnerObject::FileSendMetadata {
            files,
            buffer_size,
            sender_ip,
        })
    }

    pub fn decode_file_req_ack(bytes: &[u8]) -> Result<InnerObject, CoreError> {
        let mut r = Reader::new(bytes);
        Ok(InnerObject::FileReqAck {
            accepted: r.read_bool()?,
        })
    }

    pub fn decode_file_part_obj(bytes: &[u8]) -> Result<InnerObject, CoreError> {
        let mut r = Reader::new(bytes);
        let file_metadata = FileMetadata::decode_from(&mut r)?;
        let offset = r.read_u64()?;
        let data = r.read_bytes()?;
        let is_last = r.read_bool()?;
        Ok(InnerObject::FilePartObj {
            file_metadata,
            offset,
            data,
            is_last,
        })
    }

    pub fn decode_ping(bytes: &[u8]) -> Result<InnerObject, CoreError> {
        let mut r = Reader::new(bytes);
        Ok(InnerObject::Ping {
            sender_ip: r.read_string()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_part_obj_round_trips() {
        let obj = InnerObject::FilePartObj {
            file_metadata: FileMetadata {
                file_name: "a.bin".to_string(),
                file_path: "/tmp/a.bin".to_string(),
                file_size: 10_000,
            },
            offset: 4096,
            data: vec![7u8; 4096],
            is_last: false,
        };
        let encoded = obj.encode();
        let decoded = InnerObject::decode_file_part_obj(&encoded).unwrap();
        match decoded {
            InnerObject::FilePartObj {
                file_metadata,
                offset,
                data,
                is_last,
            } => {
                assert_eq!(file_metadata.file_name, "a.bin");
                assert_eq!(offset, 4096);
                assert_eq!(data.len(), 4096);
                assert!(!is_last);
            }
            _ => panic!("wrong variant decoded"),
        }
    }

    #[test]
    fn file_send_metadata_round_trips_a_list() {
        let obj = InnerObject::FileSendMetadata {
            files: vec![
                FileMetadata {
                    file_name: "x".to_string(),
                    file_path: "/tmp/x".to_string(),
                    file_size: 500,
                },
                FileMetadata {
                    file_name: "y".to_string(),
                    file_path: "/tmp/y".to_string(),
                    file_size: 1500,
                },
            ],
            buffer_size: 600,
            sender_ip: "10.0.0.1".to_string(),
        };
        let encoded = obj.encode();
        let decoded = InnerObject::decode_file_send_metadata(&encoded).unwrap();
        match decoded {
            InnerObject::FileSendMetadata {
                files,
                buffer_size,
                sender_ip,
            } => {
                assert_eq!(files.len(), 2);
                assert_eq!(buffer_size, 600);
                assert_eq!(sender_ip, "10.0.0.1");
            }
            _ => panic!("wrong variant decoded"),
        }
    }
}
