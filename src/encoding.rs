//! Base64url helpers shared by the WebAuthn code.
//!
//! Credential ids, user handles and challenges all travel as unpadded
//! base64url strings in the browser API, and credential ids are stored in
//! the same form.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_without_padding_using_url_alphabet() {
        assert_eq!(encode([0xfb, 0xff]), "-_8");
        assert_eq!(encode(b"a"), "YQ");
        assert_eq!(encode(Vec::<u8>::new()), "");
    }
}
