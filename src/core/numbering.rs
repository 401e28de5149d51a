use chrono::{Datelike, NaiveDateTime, Timelike};

/// Number of 100-nanosecond ticks in a second.
const TICKS_PER_SECOND: u64 = 10_000_000;

/// Generate an invoice number for a submission made at `at`.
///
/// Format: `FV {year}/{month}/{day}/{ticks}`, where `ticks` counts
/// 100-nanosecond intervals since midnight. Two runs on the same day get
/// distinct numbers unless they start within the same tick.
///
/// ```
/// use chrono::NaiveDate;
/// use ksef_minimal::core::invoice_number;
///
/// let at = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap().and_hms_opt(0, 0, 1).unwrap();
/// assert_eq!(invoice_number(at), "FV 2025/3/7/10000000");
/// ```
pub fn invoice_number(at: NaiveDateTime) -> String {
    format!(
        "FV {}/{}/{}/{}",
        at.year(),
        at.month(),
        at.day(),
        ticks_since_midnight(at)
    )
}

fn ticks_since_midnight(at: NaiveDateTime) -> u64 {
    let seconds = u64::from(at.num_seconds_from_midnight());
    // nanosecond() exceeds 1e9 during a leap second; it still maps to a later tick.
    seconds * TICKS_PER_SECOND + u64::from(at.nanosecond()) / 100
}
