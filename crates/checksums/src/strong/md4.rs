use digest::Digest;
use std::fmt;

use super::StrongDigest;

/// Streaming MD4 hasher used for RDC chunk signatures.
#[derive(Clone, Default)]
pub struct Md4 {
    inner: md4::Md4,
}

impl fmt::Debug for Md4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Md4").finish_non_exhaustive()
    }
}

impl Md4 {
    /// Convenience helper that computes the MD4 digest for `data` in one shot.
    #[must_use]
    pub fn digest(data: &[u8]) -> [u8; 16] {
        <Self as StrongDigest>::digest(data)
    }
}

impl StrongDigest for Md4 {
    type Digest = [u8; 16];
    const DIGEST_LEN: usize = 16;

    fn new() -> Self {
        Self {
            inner: md4::Md4::new(),
        }
    }

    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.inner, data);
    }

    fn finalize(self) -> Self::Digest {
        self.inner.finalize().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_hex(bytes: &[u8]) -> String {
        use std::fmt::Write as _;

        let mut out = String::with_capacity(bytes.len() * 2);
        for byte in bytes {
            write!(&mut out, "{byte:02x}").expect("write! to String cannot fail");
        }
        out
    }

    #[test]
    fn md4_rfc1320_vectors() {
        let vectors = [
            (b"".as_slice(), "31d6cfe0d16ae931b73c59d7e0c089c0"),
            (b"a".as_slice(), "bde52cb31de33e46245e05fbdbd6fb24"),
            (b"abc".as_slice(), "a448017aaf21d8525fc10ae87aa6729d"),
            (b"message digest".as_slice(), "d9130a8164549fe818874806e1c7014b"),
        ];

        for (input, expected) in vectors {
            assert_eq!(to_hex(&Md4::digest(input)), expected);
        }
    }

    #[test]
    fn md4_streaming_matches_one_shot() {
        let mut hasher = <Md4 as StrongDigest>::new();
        hasher.update(b"message ");
        hasher.update(b"digest");
        assert_eq!(hasher.finalize(), Md4::digest(b"message digest"));
    }
}
