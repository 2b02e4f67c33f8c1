use pikuseru_core::abi::{encode_tokens, from_hex, selector, to_hex, Token};
use pikuseru_core::pxnft::{calls, decode, COLOR_UPDATED_TOPIC, TRANSFER_TOPIC};
use pikuseru_core::{decode_log, Address, Color, PixelEvent, RawLog};

fn address(value: &str) -> Address {
    Address::parse(value).unwrap()
}

fn word_u64(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

fn address_topic(value: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(value.as_bytes());
    word
}

#[test]
fn selectors_match_known_values() {
    // ownerOf / tokenURI / Transfer are the canonical ERC-721 values.
    assert_eq!(selector("ownerOf(uint256)"), [0x63, 0x52, 0x21, 0x1e]);
    assert_eq!(selector("tokenURI(uint256)"), [0xc8, 0x7b, 0x56, 0xdd]);
    assert_eq!(
        hex::encode(*TRANSFER_TOPIC),
        "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
    );
    assert_eq!(
        selector("mint(uint256,uint256,string)"),
        [0xc6, 0xe6, 0x4e, 0x53]
    );
    assert_eq!(
        selector("getMintedPixelsInRange(uint256,uint256,uint256,uint256)"),
        [0x53, 0xd5, 0xad, 0xea]
    );
}

#[test]
fn mint_call_layout() {
    let color = Color::parse("#ff0000").unwrap();
    let data = calls::mint(10, 20, &color);
    assert_eq!(&data[..4], &[0xc6, 0xe6, 0x4e, 0x53]);
    // Three head slots: x, y, offset to the string tail.
    assert_eq!(data[4..36], word_u64(10));
    assert_eq!(data[36..68], word_u64(20));
    assert_eq!(data[68..100], word_u64(0x60));
    // Tail: length 7 then "#ff0000" padded to a word.
    assert_eq!(data[100..132], word_u64(7));
    assert_eq!(&data[132..139], b"#ff0000");
    assert_eq!(data.len(), 4 + 5 * 32);
}

#[test]
fn hex_round_trip() {
    let data = calls::total_minted();
    let encoded = to_hex(&data);
    assert!(encoded.starts_with("0x"));
    assert_eq!(from_hex(&encoded).unwrap(), data);
    assert!(from_hex("0xzz").is_err());
}

#[test]
fn decodes_range_page() {
    let owner_a = address("0x00000000000000000000000000000000000000aa");
    let owner_b = address("0x00000000000000000000000000000000000000bb");
    let payload = encode_tokens(&[
        Token::UintArray(vec![3010, 3011]),
        Token::AddressArray(vec![owner_a, owner_b]),
        Token::StrArray(vec!["#ff0000".into(), "#00d3dd".into()]),
    ]);

    let page = decode::range_page(&payload).unwrap();
    assert_eq!(page.ids, vec![3010, 3011]);
    assert_eq!(page.owners, vec![owner_a, owner_b]);
    assert_eq!(page.colors, vec!["#ff0000", "#00d3dd"]);

    let cells: Vec<_> = page.cells().collect();
    assert_eq!(cells[0], ((10, 20), owner_a, "#ff0000"));
    assert_eq!(cells[1], ((11, 20), owner_b, "#00d3dd"));
}

#[test]
fn range_page_skips_non_cell_ids() {
    let owner = address("0x00000000000000000000000000000000000000aa");
    let payload = encode_tokens(&[
        Token::UintArray(vec![100_000]),
        Token::AddressArray(vec![owner]),
        Token::StrArray(vec!["#ffffff".into()]),
    ]);
    let page = decode::range_page(&payload).unwrap();
    assert_eq!(page.cells().count(), 0);
}

#[test]
fn decodes_fee_tuples() {
    let payload = encode_tokens(&[Token::Uint(1_500_000_000_000_000), Token::Bool(true)]);
    assert_eq!(
        decode::update_fee(&payload).unwrap(),
        (1_500_000_000_000_000, true)
    );

    let payload = encode_tokens(&[Token::Uint(42), Token::Uint(7)]);
    assert_eq!(decode::batch_update_fee(&payload).unwrap(), (42, 7));
}

#[test]
fn decodes_scalar_replies() {
    let owner = address("0x00000000000000000000000000000000000000cc");
    assert_eq!(
        decode::address_value(&encode_tokens(&[Token::Address(owner)])).unwrap(),
        owner
    );
    assert_eq!(
        decode::string_value(&encode_tokens(&[Token::Str("#ff0000".into())])).unwrap(),
        "#ff0000"
    );
    assert_eq!(
        decode::uint_value(&encode_tokens(&[Token::Uint(22_500)])).unwrap(),
        22_500
    );
    assert!(decode::bool_value(&encode_tokens(&[Token::Bool(true)])).unwrap());
    assert!(decode::uint_value(&[]).is_err());
}

#[test]
fn decodes_composition_info() {
    let payload = encode_tokens(&[
        Token::UintArray(vec![3010, 3011, 3160]),
        Token::Uint(10),
        Token::Uint(20),
        Token::Uint(11),
        Token::Uint(21),
    ]);
    let info = decode::composition_info(&payload).unwrap();
    assert_eq!(info.token_ids, vec![3010, 3011, 3160]);
    assert_eq!((info.min_x, info.min_y, info.max_x, info.max_y), (10, 20, 11, 21));
}

#[test]
fn decodes_token_images() {
    let payload = encode_tokens(&[
        Token::StrArray(vec!["data:image/svg+xml;base64,AAAA".into(), String::new()]),
        Token::UintArray(vec![1, 0]),
    ]);
    let (images, exists) = decode::token_images(&payload).unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(exists, vec![true, false]);
}

#[test]
fn decodes_mint_transfer_log() {
    let owner = address("0x00000000000000000000000000000000000000aa");
    let log = RawLog {
        topics: vec![
            *TRANSFER_TOPIC,
            address_topic(&Address::ZERO),
            address_topic(&owner),
            word_u64(3010),
        ],
        data: Vec::new(),
    };
    assert_eq!(
        decode_log(&log),
        Some(PixelEvent::Minted { token_id: 3010, owner })
    );
}

#[test]
fn ignores_secondary_transfers() {
    let from = address("0x00000000000000000000000000000000000000aa");
    let to = address("0x00000000000000000000000000000000000000bb");
    let log = RawLog {
        topics: vec![
            *TRANSFER_TOPIC,
            address_topic(&from),
            address_topic(&to),
            word_u64(3010),
        ],
        data: Vec::new(),
    };
    assert_eq!(decode_log(&log), None);
}

#[test]
fn decodes_color_updated_log() {
    let owner = address("0x00000000000000000000000000000000000000bb");
    let data = encode_tokens(&[
        Token::Uint(10),
        Token::Uint(20),
        Token::Str("#e50000".into()),
        Token::Address(owner),
    ]);
    let log = RawLog {
        topics: vec![*COLOR_UPDATED_TOPIC, word_u64(3010)],
        data,
    };
    assert_eq!(
        decode_log(&log),
        Some(PixelEvent::ColorChanged {
            x: 10,
            y: 20,
            color: "#e50000".into(),
            owner,
        })
    );
}

#[test]
fn unknown_topics_are_ignored() {
    let log = RawLog {
        topics: vec![[0x11; 32]],
        data: Vec::new(),
    };
    assert_eq!(decode_log(&log), None);

    let log = RawLog {
        topics: Vec::new(),
        data: Vec::new(),
    };
    assert_eq!(decode_log(&log), None);
}

#[test]
fn batch_call_heads_reference_tails() {
    let cells = vec![(1, 2), (3, 4)];
    let colors = vec![
        Color::parse("#ff0000").unwrap(),
        Color::parse("#0000ea").unwrap(),
    ];
    let data = calls::batch_mint(&cells, &colors);
    assert_eq!(&data[..4], &selector("batchMint(uint256[],uint256[],string[])"));
    // xs offset: three head words end at 0x60.
    assert_eq!(data[4..36], word_u64(0x60));
    // xs tail: length then 1, 3.
    assert_eq!(data[100..132], word_u64(2));
    assert_eq!(data[132..164], word_u64(1));
    assert_eq!(data[164..196], word_u64(3));
}
