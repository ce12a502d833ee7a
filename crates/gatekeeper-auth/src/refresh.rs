use data_encoding::BASE64URL_NOPAD;
use rand::RngCore;
use rand::rngs::OsRng;

const REFRESH_TOKEN_BYTES: usize = 32;

/// Generates an opaque refresh token: 32 random bytes, URL-safe base64.
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    BASE64URL_NOPAD.encode(&bytes)
}
