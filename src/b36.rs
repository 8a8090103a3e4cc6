//! Base-36 addresses used as the external keys of list containers.

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Render `n` as a lowercase base-36 string (`0..9`, `a..z`, `10`, ...).
pub fn int_to_b36(mut n: u64) -> String {
    if n == 0 {
        return "0".into();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Parse a base-36 string, case-insensitively.
///
/// Returns `None` for empty input, signs, or any character outside `[0-9a-zA-Z]`.
pub fn b36_to_int(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    u64::from_str_radix(s, 36).ok()
}
