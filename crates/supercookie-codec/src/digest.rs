use sha2::{Digest, Sha256};

/// Number of digest rounds concatenated into one expansion.
pub const ROUNDS: usize = 8;
/// Bytes kept from each round's digest.
pub const DIGEST_LEN: usize = 16;
/// 1024 bits, one per favicon pixel.
pub const EXPANDED_LEN: usize = ROUNDS * DIGEST_LEN;
/// Hex characters kept in a probe key.
pub const PROBE_KEY_LEN: usize = 16;

fn digest16(data: impl AsRef<[u8]>) -> [u8; DIGEST_LEN] {
    let full = Sha256::digest(data);
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&full[..DIGEST_LEN]);
    out
}

/// Expands `input` to exactly 128 bytes.
///
/// Round `i` hashes `"{input}:{i}"`; rounds are laid out in order, so byte
/// `16 * i` starts round `i`.
pub fn expand(input: &str) -> [u8; EXPANDED_LEN] {
    let mut out = [0u8; EXPANDED_LEN];
    for (round, chunk) in out.chunks_exact_mut(DIGEST_LEN).enumerate() {
        chunk.copy_from_slice(&digest16(format!("{input}:{round}")));
    }
    out
}

/// Cache validator for `input`: 32 lowercase hex characters, unquoted.
pub fn etag(input: &str) -> String {
    hex::encode(digest16(input))
}

/// `etag(input)` in the quoted form carried by the `ETag` header.
pub fn quoted_etag(input: &str) -> String {
    format!("\"{}\"", etag(input))
}

/// One-way key for the `(identifier, bit_position)` pair.
///
/// Keys for neighbouring bit positions share no structure; correlating them
/// requires knowing the identifier.
pub fn probe_key(identifier: &str, bit_position: u32) -> String {
    let mut key = hex::encode(Sha256::digest(format!("{identifier}:probe:{bit_position}")));
    key.truncate(PROBE_KEY_LEN);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expansion_rounds_are_independent_digests() {
        let expanded = expand("abc");
        assert_eq!(&expanded[..DIGEST_LEN], &digest16("abc:0"));
        assert_eq!(&expanded[7 * DIGEST_LEN..], &digest16("abc:7"));
        assert_ne!(&expanded[..DIGEST_LEN], &expanded[DIGEST_LEN..2 * DIGEST_LEN]);
    }

    #[test]
    fn etag_is_lowercase_hex() {
        let tag = etag("abc");
        assert_eq!(tag.len(), 2 * DIGEST_LEN);
        assert!(tag.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(tag, "ba7816bf8f01cfea414140de5dae2223");
        assert_eq!(quoted_etag("abc"), format!("\"{tag}\""));
    }

    #[test]
    fn empty_input_is_accepted() {
        assert_eq!(expand("").len(), EXPANDED_LEN);
        assert_eq!(etag("").len(), 32);
    }

    #[test]
    fn probe_keys_are_short_and_uncorrelated() {
        let k0 = probe_key("user-1", 0);
        let k1 = probe_key("user-1", 1);
        assert_eq!(k0.len(), PROBE_KEY_LEN);
        assert_eq!(k0, "b369b6a8c9f862b8");
        assert_eq!(k1, "17ff4f89cf83fe5c");
        assert_ne!(k0, k1);
        assert_ne!(k0[..4], k1[..4]);
        assert_ne!(k0, probe_key("user-2", 0));
    }
}
