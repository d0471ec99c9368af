use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use chrono::NaiveDateTime;
use chrono_tz::Tz;

/// Current Unix time in whole seconds.
pub fn now_epoch_secs() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

/// Current wall-clock time in `tz`, stripped of its offset. Snapshot stamps
/// carry no zone, so the zone is applied once here and nowhere else.
pub fn now_in(tz: &Tz) -> NaiveDateTime {
    chrono::Utc::now().with_timezone(tz).naive_local()
}
