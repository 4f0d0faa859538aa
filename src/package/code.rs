//! Pickup codes: `PK-YYMMDD-XXXX`.

use std::sync::OnceLock;

use chrono::NaiveDate;
use rand_core::{OsRng, RngCore};
use regex::Regex;

pub const PREFIX: &str = "PK-";

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SUFFIX_LEN: usize = 4;

fn code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^PK-\d{6}-[A-Z0-9]{4}$").expect("static regex"))
}

/// Generate a code for a package received on `date`.
pub fn generate(date: NaiveDate) -> String {
    generate_with(date, &mut OsRng)
}

/// Generate a code drawing the random suffix from `rng`.
pub fn generate_with<R: RngCore>(date: NaiveDate, rng: &mut R) -> String {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| ALPHABET[(rng.next_u32() as usize) % ALPHABET.len()] as char)
        .collect();
    format!("{PREFIX}{}-{suffix}", date.format("%y%m%d"))
}

/// `true` when `code` is exactly `PK-YYMMDD-XXXX`.
pub fn is_valid(code: &str) -> bool {
    code_re().is_match(code)
}

/// The `YYMMDD` segment of a well-formed code.
pub fn date_segment(code: &str) -> Option<&str> {
    if is_valid(code) { code.get(3..9) } else { None }
}
