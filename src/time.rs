//////////////////////////////////////////////////////////
// Time conversions
//////////////////////////////////////////////////////////
// The providers disagree on what a "time" is: GRT sends seconds since
// midnight, NextBus sends seconds until arrival. Both conversions live
// here so no handler grows its own copy.

/// Seconds since midnight -> zero-padded "hh:mm:ss" wall-clock string.
/// Values past midnight wrap (the hour is taken modulo 24).
pub fn clock_from_daily_seconds(total: u32) -> String {
    let seconds = total % 60;
    let minutes = (total / 60) % 60;
    let hours = (total / 3600) % 24;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Seconds until arrival -> countdown phrase.
pub fn countdown_phrase(seconds: u32) -> String {
    if seconds < 60 {
        format!("{} seconds", seconds)
    } else if seconds < 120 {
        format!("One minute, {} seconds", seconds - 60)
    } else {
        format!("{} minutes, {} seconds", seconds / 60, seconds % 60)
    }
}
