//! crates/checksums/src/strong/mod.rs
//!
//! Strong digests used to sign chunks.
//!
//! Each hasher is a value type: [`StrongDigest::finalize`] consumes it, so the
//! state is released as soon as the digest has been produced.

mod md4;
mod sha1;

pub use self::md4::Md4;
pub use self::sha1::Sha1;

/// Streaming digest with a fixed output length.
pub trait StrongDigest: Sized {
    /// Fixed-size digest returned by [`StrongDigest::finalize`].
    type Digest: AsRef<[u8]> + Copy + Eq;

    /// Length of the digest in bytes.
    const DIGEST_LEN: usize;

    /// Creates a hasher with an empty state.
    fn new() -> Self;

    /// Feeds additional bytes into the digest state.
    fn update(&mut self, data: &[u8]);

    /// Consumes the hasher and returns the digest.
    fn finalize(self) -> Self::Digest;

    /// Computes the digest of `data` in one shot.
    fn digest(data: &[u8]) -> Self::Digest {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest_in_pieces<D: StrongDigest>(data: &[u8], piece: usize) -> D::Digest {
        let mut hasher = D::new();
        for chunk in data.chunks(piece) {
            hasher.update(chunk);
        }
        hasher.finalize()
    }

    #[test]
    fn streaming_matches_one_shot_for_both_algorithms() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i * 7 % 251) as u8).collect();
        assert_eq!(digest_in_pieces::<Sha1>(&data, 13), Sha1::digest(&data));
        assert_eq!(digest_in_pieces::<Md4>(&data, 64), Md4::digest(&data));
    }

    #[test]
    fn digest_lengths_match_associated_constants() {
        assert_eq!(Sha1::digest(b"x").as_ref().len(), Sha1::DIGEST_LEN);
        assert_eq!(Md4::digest(b"x").as_ref().len(), Md4::DIGEST_LEN);
    }
}
