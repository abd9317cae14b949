//! Integration tests for the public digest surface.

use checksums::strong::{Md4, Sha1, StrongDigest};
use checksums::{DEFAULT_RDC_WINDOW, RdcRollingHash};
use rand::{Rng, SeedableRng, rngs::StdRng};

// ============================================================================
// Strong digests
// ============================================================================

fn streamed<D: StrongDigest>(data: &[u8], cut: usize) -> D::Digest {
    let mut hasher = D::new();
    hasher.update(&data[..cut]);
    hasher.update(&data[cut..]);
    hasher.finalize()
}

#[test]
fn megabyte_sized_input_streams_consistently() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut data = vec![0u8; 1024 * 1024 + 17];
    rng.fill(data.as_mut_slice());

    for cut in [0, 1, 4096, data.len() / 2, data.len()] {
        assert_eq!(streamed::<Sha1>(&data, cut), Sha1::digest(&data));
        assert_eq!(streamed::<Md4>(&data, cut), Md4::digest(&data));
    }
}

#[test]
fn different_inputs_produce_different_digests() {
    assert_ne!(Sha1::digest(b"chunk-a"), Sha1::digest(b"chunk-b"));
    assert_ne!(Md4::digest(b"chunk-a"), Md4::digest(b"chunk-b"));
}

// ============================================================================
// Rolling hash
// ============================================================================

#[test]
fn rolling_hash_depends_only_on_window_contents() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut prefix_a = vec![0u8; 300];
    let mut prefix_b = vec![0u8; 123];
    rng.fill(prefix_a.as_mut_slice());
    rng.fill(prefix_b.as_mut_slice());
    let tail: Vec<u8> = (0..DEFAULT_RDC_WINDOW as u8).collect();

    let a: Vec<u8> = prefix_a.iter().chain(tail.iter()).copied().collect();
    let b: Vec<u8> = prefix_b.iter().chain(tail.iter()).copied().collect();

    let hashes_a = RdcRollingHash::window_hashes(&a, DEFAULT_RDC_WINDOW).expect("hashes");
    let hashes_b = RdcRollingHash::window_hashes(&b, DEFAULT_RDC_WINDOW).expect("hashes");
    assert_eq!(hashes_a.last(), hashes_b.last());
}
