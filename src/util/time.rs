//! show time helpers, all times are minutes since local midnight

use chrono::{Local, Timelike};

/// parse 24-hour `HHMM`, exactly four ascii digits, hour < 24 and minute < 60
pub fn parse_hhmm(text: &str) -> Option<u16> {
    let bytes = text.as_bytes();
    if bytes.len() != 4 || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let digit = |i: usize| (bytes[i] - b'0') as u16;
    let hour = digit(0) * 10 + digit(1);
    let minute = digit(2) * 10 + digit(3);
    if hour >= 24 || minute >= 60 {
        return None;
    }
    Some(hour * 60 + minute)
}

/// `20:00` -> `08:00 PM`, midnight and noon show as 12
pub fn format_12h(minutes: u16) -> String {
    let mut hour = (minutes / 60) % 24;
    let minute = minutes % 60;
    let suffix = if hour >= 12 { 'P' } else { 'A' };
    if hour >= 12 {
        hour -= 12;
    }
    if hour == 0 {
        hour = 12;
    }
    format!("{:02}:{:02} {}M", hour, minute, suffix)
}

/// current local wall clock minute
pub fn local_minute_of_day() -> u16 {
    let now = Local::now();
    (now.hour() * 60 + now.minute()) as u16
}
