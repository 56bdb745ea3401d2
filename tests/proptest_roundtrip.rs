//! Property-based round-trip tests across random byte sequences and flag
//! combinations (spec §8: "for every byte sequence b and every valid option
//! combination O, decompress(compress(b, O), O) == b").

use blazer::flags::ALGORITHM_BLOCK;
use blazer::{compress_with_flags, decompress_with_password, Flags};
use proptest::prelude::*;

fn arb_flags(exponent: u8, crc: bool, header: bool, trailer: bool) -> Flags {
    let mut flags = Flags::new(exponent, ALGORITHM_BLOCK).unwrap();
    flags.set_crc(crc);
    flags.set_header(header);
    flags.set_trailer(trailer);
    flags
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn roundtrip_arbitrary_bytes(
        data in proptest::collection::vec(any::<u8>(), 0..4096),
        exponent in 0u8..=4,
        crc in any::<bool>(),
        header in any::<bool>(),
        trailer in any::<bool>(),
    ) {
        let flags = arb_flags(exponent, crc, header, trailer);
        let container = compress_with_flags(&data, flags, None).unwrap();

        let out = if header {
            blazer::decompress(&container)
        } else {
            let mut stream = blazer::DecompressionStream::new_headerless(container.as_slice(), flags, None).unwrap();
            stream.decompress_all().map_err(Into::into)
        };
        prop_assert_eq!(out.unwrap(), data);
    }

    #[test]
    fn roundtrip_highly_repetitive_bytes(
        byte in any::<u8>(),
        len in 0usize..65_536,
        exponent in 0u8..=6,
    ) {
        let data = vec![byte; len];
        let flags = arb_flags(exponent, true, true, true);
        let container = compress_with_flags(&data, flags, None).unwrap();
        let out = blazer::decompress(&container).unwrap();
        prop_assert_eq!(out, data);
    }

    #[test]
    fn roundtrip_encrypted_arbitrary_bytes(
        data in proptest::collection::vec(any::<u8>(), 0..2048),
        password in "[a-zA-Z0-9]{1,16}",
    ) {
        let mut flags = blazer::default_flags();
        flags.set_encrypt_inner(true);
        let container = compress_with_flags(&data, flags, Some(password.as_bytes())).unwrap();
        let out = decompress_with_password(&container, Some(password.as_bytes())).unwrap();
        prop_assert_eq!(out, data);
    }
}
