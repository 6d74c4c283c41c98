//! Client access token generation.

use rand::Rng;

/// Uppercase letters and digits without look-alikes (0/O, 1/I/L).
pub const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Shortest token accepted from configuration.
pub const MIN_TOKEN_LENGTH: usize = 6;

/// Generates a random access token of `length` characters.
///
/// Lengths below [`MIN_TOKEN_LENGTH`] are raised to it.
pub fn generate_access_token(length: usize) -> String {
    let length = length.max(MIN_TOKEN_LENGTH);
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}
