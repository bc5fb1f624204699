//! venue control query -> command
//!
//! the first character selects the family:
//! - `v<text>`   venue name, percent encoded
//! - `t<HHMM>`   downbeat
//! - `c<s><p>`   color slot `0-2`, palette `0-7`
//! - `<d><0|1>`  flag bit `1 << d` for `d` in `0-3`
//!
//! anything else decodes to `Command::Unrecognized`, which the coordinator answers with a
//! plain snapshot

use data_encoding::HEXUPPER_PERMISSIVE;

use crate::entity::bo::command_bo::Command;
use crate::util::time::parse_hhmm;

pub fn decode_query(query: &str) -> Command {
    let query = query.strip_prefix('?').unwrap_or(query);
    let bytes = query.as_bytes();
    if bytes.len() < 2 {
        return Command::Unrecognized;
    }

    match bytes[0] {
        b'v' => {
            let decoded = percent_decode(&query[1..]);
            Command::SetVenueName(String::from_utf8_lossy(&decoded).into_owned())
        }
        b't' => match query.get(1..5).and_then(parse_hhmm) {
            Some(minutes) => Command::SetDownbeat(minutes as i32),
            None => Command::Unrecognized,
        },
        b'c' => match (bytes.get(1), bytes.get(2)) {
            (Some(slot @ b'0'..=b'2'), Some(color @ b'0'..=b'7')) => Command::SetColorSlot {
                slot: slot - b'0' + 1,
                color: color - b'0',
            },
            _ => Command::Unrecognized,
        },
        digit @ b'0'..=b'3' => match bytes[1] {
            b'0' => Command::ToggleFlag {
                mask: 1 << (digit - b'0'),
                on: false,
            },
            b'1' => Command::ToggleFlag {
                mask: 1 << (digit - b'0'),
                on: true,
            },
            _ => Command::Unrecognized,
        },
        _ => Command::Unrecognized,
    }
}

/// `%XX` -> byte, hex digits in either case
/// malformed or truncated escapes are kept as typed, `+` is not a space
pub fn percent_decode(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if let Some(escape) = bytes.get(i + 1..i + 3) {
                if let Ok(decoded) = HEXUPPER_PERMISSIVE.decode(escape) {
                    out.extend_from_slice(&decoded);
                    i += 3;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}
