use std::time::{SystemTime, UNIX_EPOCH};

/// return minisecond
pub(crate) fn get_now_as_millis() -> u64 {
    let now = SystemTime::now();
    let since_epoch = now.duration_since(UNIX_EPOCH).expect("Time went backwards");
    since_epoch.as_millis() as u64
}

/// return second
#[allow(dead_code)]
pub(crate) fn get_now_as_u64() -> u64 {
    let now = SystemTime::now();
    let since_epoch = now.duration_since(UNIX_EPOCH).expect("Time went backwards");
    since_epoch.as_secs()
}
