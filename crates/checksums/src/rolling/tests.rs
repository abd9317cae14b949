use super::*;
use proptest::prelude::*;

#[test]
fn zero_window_is_rejected() {
    assert_eq!(RdcRollingHash::new(0), Err(RollingError::EmptyWindow));
}

#[test]
fn roll_requires_full_window() {
    let mut rolling = RdcRollingHash::new(4).expect("window");
    rolling.update(b"ab").expect("update");
    let err = rolling.roll(b'a', b'c').unwrap_err();
    assert_eq!(
        err,
        RollingError::WindowNotFull {
            filled: 2,
            window: 4
        }
    );
    assert_eq!(
        err.to_string(),
        "rolling hash window holds 2 of 4 bytes; cannot roll yet"
    );
}

#[test]
fn update_past_window_overflows() {
    let mut rolling = RdcRollingHash::new(3).expect("window");
    assert!(matches!(
        rolling.update(b"abcd"),
        Err(RollingError::WindowOverflow { window: 3 })
    ));
    rolling.update(b"abc").expect("fits");
    assert!(rolling.is_full());
    assert!(matches!(
        rolling.push(b'd'),
        Err(RollingError::WindowOverflow { .. })
    ));
}

#[test]
fn reset_clears_state() {
    let mut rolling = RdcRollingHash::new(8).expect("window");
    rolling.update(b"payload").expect("update");
    rolling.reset();
    assert!(rolling.is_empty());
    assert_eq!(rolling.value(), 0);
    assert_eq!(rolling.window(), 8);
}

#[test]
fn push_matches_update() {
    let mut pushed = RdcRollingHash::new(16).expect("window");
    for &byte in b"hello world" {
        pushed.push(byte).expect("push");
    }
    let mut updated = RdcRollingHash::new(16).expect("window");
    updated.update(b"hello world").expect("update");
    assert_eq!(pushed, updated);
}

#[test]
fn window_hashes_cover_every_position() {
    let data = b"the quick brown fox jumps over the lazy dog";
    let hashes = RdcRollingHash::window_hashes(data, 8).expect("hashes");
    assert_eq!(hashes.len(), data.len());
    assert_eq!(hashes[2], RdcRollingHash::hash_window(&data[..3]));
    assert_eq!(hashes[20], RdcRollingHash::hash_window(&data[13..21]));
}

#[test]
fn window_larger_than_32_still_cancels_outgoing_byte() {
    let data: Vec<u8> = (0..200u8).collect();
    let hashes = RdcRollingHash::window_hashes(&data, DEFAULT_RDC_WINDOW).expect("hashes");
    let last = data.len() - 1;
    assert_eq!(
        hashes[last],
        RdcRollingHash::hash_window(&data[data.len() - DEFAULT_RDC_WINDOW..])
    );
}

proptest! {
    #[test]
    fn rolling_matches_recomputation(
        data in prop::collection::vec(any::<u8>(), 1..512),
        window in 1usize..80,
    ) {
        let hashes = RdcRollingHash::window_hashes(&data, window).expect("hashes");
        for (end, &hash) in hashes.iter().enumerate() {
            let start = (end + 1).saturating_sub(window);
            prop_assert_eq!(hash, RdcRollingHash::hash_window(&data[start..=end]));
        }
    }
}
