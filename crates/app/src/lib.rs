pub mod config;
pub mod session;

/// Format a state hash as `0x` followed by exactly 16 lowercase hex digits.
pub fn format_state_hash(hash: u64) -> String {
    format!("0x{hash:016x}")
}
