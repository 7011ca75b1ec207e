// Configuration validation utilities
use std::path::Path;

/// Basic IPv4 validation used when a caller supplies a target address as a string.
pub fn is_valid_ipv4(addr: &str) -> bool {
    addr.parse::<std::net::Ipv4Addr>().is_ok()
}

/// Whether `dir` either already exists or can be created. Used by `NodeConfig::validate`
/// so a bad `temp_dir` is rejected before `start()` rather than on the first received file.
pub fn is_creatable_dir(dir: &Path) -> bool {
    if dir.is_dir() {
        return true;
    }
    std::fs::create_dir_all(dir).is_ok()
}
