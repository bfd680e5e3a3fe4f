//! Random token generation for provisioned secrets.

use rand::Rng;

/// Characters a generated token may contain.
const ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()-_=+";

/// Length of lazily provisioned secrets such as the socket password.
pub const SECRET_TOKEN_LEN: usize = 64;

/// Generate a random token of `len` characters drawn from [`ALPHABET`].
pub fn random_token(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}
