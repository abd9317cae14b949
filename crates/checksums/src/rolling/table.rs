/// Per-byte mixing values, generated at compile time from a fixed SplitMix64
/// seed so every build produces the same chunk boundaries.
pub(super) const BYTE_TABLE: [u32; 256] = build_table(0x5244_4353_4947_4e31);

const fn build_table(seed: u64) -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut state = seed;
    let mut index = 0;
    while index < 256 {
        state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        table[index] = (z >> 32) as u32;
        index += 1;
    }
    table
}

#[cfg(test)]
mod tests {
    use super::BYTE_TABLE;

    #[test]
    fn table_entries_are_distinct() {
        let mut sorted = BYTE_TABLE.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), BYTE_TABLE.len());
    }
}
