//! NUL-terminated string decoding over guest memory

/// Decode the NUL-terminated string starting at `offset` in `memory`.
///
/// Every byte is taken as one character code, so bytes above 0x7f map to
/// U+0080..U+00FF. The scan stops at the first `0` byte or the end of the
/// buffer. `offset` comes straight from the guest: negative or out-of-range
/// values give an empty string.
pub fn decode_c0_string(memory: &[u8], offset: i32) -> String {
    let Ok(start) = usize::try_from(offset) else {
        return String::new();
    };
    let Some(tail) = memory.get(start..) else {
        return String::new();
    };

    tail.iter()
        .take_while(|&&byte| byte != 0)
        .map(|&byte| char::from(byte))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn char_codes(s: &str) -> Vec<u8> {
        s.chars().map(|c| c as u32 as u8).collect()
    }

    #[test]
    fn test_decode_stops_at_nul() {
        assert_eq!(decode_c0_string(&[72, 105, 0, 33], 0), "Hi");
    }

    #[test]
    fn test_decode_from_offset() {
        let memory = b"xxHello\0world";
        assert_eq!(decode_c0_string(memory, 2), "Hello");
        assert_eq!(decode_c0_string(memory, 8), "world");
    }

    #[test]
    fn test_decode_without_terminator_reads_to_end() {
        assert_eq!(decode_c0_string(b"abc", 0), "abc");
    }

    #[test]
    fn test_decode_empty_string() {
        assert_eq!(decode_c0_string(&[0, 65], 0), "");
    }

    #[test]
    fn test_decode_at_buffer_end() {
        assert_eq!(decode_c0_string(b"abc", 3), "");
    }

    #[test]
    fn test_decode_out_of_range() {
        assert_eq!(decode_c0_string(b"abc", 4), "");
        assert_eq!(decode_c0_string(b"abc", i32::MAX), "");
        assert_eq!(decode_c0_string(b"abc", -1), "");
        assert_eq!(decode_c0_string(&[], 0), "");
    }

    #[test]
    fn test_decode_high_bytes_as_latin1() {
        assert_eq!(decode_c0_string(&[0xe9, 0xff, 0], 0), "\u{e9}\u{ff}");
    }

    proptest! {
        #[test]
        fn prop_decode_is_prefix_before_nul(
            buffer in proptest::collection::vec(any::<u8>(), 0..256),
            seed in any::<usize>(),
        ) {
            let offset = seed % (buffer.len() + 1);
            let decoded = decode_c0_string(&buffer, offset as i32);

            let tail = &buffer[offset..];
            let expected: Vec<u8> = tail.iter().copied().take_while(|&b| b != 0).collect();

            prop_assert!(!decoded.contains('\0'));
            prop_assert_eq!(char_codes(&decoded), expected);
        }

        #[test]
        fn prop_decode_outside_range_is_empty(
            buffer in proptest::collection::vec(any::<u8>(), 0..256),
            beyond in 1i32..10_000,
            negative in i32::MIN..0,
        ) {
            let past_end = buffer.len() as i32 + beyond;
            prop_assert_eq!(decode_c0_string(&buffer, past_end), "");
            prop_assert_eq!(decode_c0_string(&buffer, negative), "");
        }
    }
}
