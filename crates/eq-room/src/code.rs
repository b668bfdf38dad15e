//! Room codes.

use rand::Rng;

/// Length of a room code.
pub const CODE_LEN: usize = 6;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A random room code of uppercase letters and digits.
pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LEN)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect()
}

/// Normalize user input into a room code: trimmed and uppercased.
/// `None` if the result is not a valid code.
pub fn normalize(input: &str) -> Option<String> {
    let code = input.trim().to_ascii_uppercase();
    is_valid(&code).then_some(code)
}

/// Whether `code` has the shape of a room code.
pub fn is_valid(code: &str) -> bool {
    code.len() == CODE_LEN && code.bytes().all(|b| ALPHABET.contains(&b))
}
