use chrono::Utc;
use uuid::Uuid;

const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Client-side reference id: `REQ-` + base36 millisecond timestamp + four
/// random base36 characters, all uppercase. Generated once per submit action
/// and reused across retries.
pub fn generate_reference_id() -> String {
    let timestamp = to_base36(Utc::now().timestamp_millis().max(0) as u64);
    let random: String = Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(4)
        .map(|b| BASE36[(*b % 36) as usize] as char)
        .collect();
    format!("REQ-{}{}", timestamp, random)
}

/// Server-side fallback id, used when the inbound request carries no
/// `referenceId` field.
pub fn fallback_reference_id() -> String {
    format!(
        "REF-{}",
        to_base36(Utc::now().timestamp_millis().max(0) as u64)
    )
}
