//! Unique identifiers for `!name` tokens
//!
//! A [`UniqueCounter`] lives as long as a compilation session, so every
//! generated string is distinct within one run. A [`UniquesPerComponent`]
//! lives for one usage site and maps each token text to its string.

use std::collections::HashMap;

/// Lowest character used in generated identifiers
const FIRST: char = 'A';
/// The radix is the span between `FIRST` and this character
const LAST: char = 'z';

/// Session-wide counter of generated identifiers
#[derive(Debug, Default)]
pub struct UniqueCounter {
    count: u64,
}

impl UniqueCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next identifier
    pub fn next_unique(&mut self) -> String {
        let value = encode(self.count);
        self.count += 1;
        value
    }

    /// Start again from the first identifier
    pub fn reset(&mut self) {
        self.count = 0;
    }
}

/// Render a counter value in base `LAST - FIRST`, least significant digit first
fn encode(mut n: u64) -> String {
    let radix = LAST as u64 - FIRST as u64;
    if n == 0 {
        return FIRST.to_string();
    }
    let mut out = String::new();
    while n > 0 {
        let digit = (n % radix) as u8;
        out.push((FIRST as u8 + digit) as char);
        n /= radix;
    }
    out
}

/// Token to identifier mapping for one component usage
#[derive(Debug, Default)]
pub struct UniquesPerComponent {
    by_token: HashMap<String, String>,
}

impl UniquesPerComponent {
    pub fn new() -> Self {
        Self::default()
    }

    /// The identifier for a token, allocating one on first sight
    pub fn get_by_id(&mut self, token: &str, counter: &mut UniqueCounter) -> String {
        self.by_token
            .entry(token.to_string())
            .or_insert_with(|| counter.next_unique())
            .clone()
    }
}
