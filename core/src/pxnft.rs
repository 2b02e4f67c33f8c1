//! Call builders and response decoders for the PXNFT contract surface, plus
//! decoding of the two log kinds the client watches. The contract itself is
//! an opaque boundary; everything here is byte layout.

use once_cell::sync::Lazy;

use crate::abi::{encode_call, keccak256, AbiError, Decoder, Token};
use crate::address::Address;
use crate::cell::{cell_coords, CellKey};
use crate::chunk::Chunk;
use crate::color::Color;

/// Topic of `Transfer(address,address,uint256)`; filtered to
/// `from == 0x0` these signal mints.
pub static TRANSFER_TOPIC: Lazy<[u8; 32]> =
    Lazy::new(|| keccak256(b"Transfer(address,address,uint256)"));

/// Topic of `ColorUpdated(uint256 indexed,uint256,uint256,string,address)`.
pub static COLOR_UPDATED_TOPIC: Lazy<[u8; 32]> =
    Lazy::new(|| keccak256(b"ColorUpdated(uint256,uint256,uint256,string,address)"));

pub mod calls {
    use super::*;

    fn uints(values: impl IntoIterator<Item = u128>) -> Token {
        Token::UintArray(values.into_iter().collect())
    }

    fn xy_arrays(cells: &[CellKey]) -> (Token, Token) {
        (
            uints(cells.iter().map(|(x, _)| u128::from(*x))),
            uints(cells.iter().map(|(_, y)| u128::from(*y))),
        )
    }

    pub fn mint(x: u32, y: u32, color: &Color) -> Vec<u8> {
        encode_call(
            "mint(uint256,uint256,string)",
            &[
                Token::Uint(u128::from(x)),
                Token::Uint(u128::from(y)),
                Token::Str(color.as_str().to_string()),
            ],
        )
    }

    pub fn batch_mint(cells: &[CellKey], colors: &[Color]) -> Vec<u8> {
        let (xs, ys) = xy_arrays(cells);
        encode_call(
            "batchMint(uint256[],uint256[],string[])",
            &[
                xs,
                ys,
                Token::StrArray(colors.iter().map(|c| c.as_str().to_string()).collect()),
            ],
        )
    }

    pub fn update_color(x: u32, y: u32, color: &Color) -> Vec<u8> {
        encode_call(
            "updateColor(uint256,uint256,string)",
            &[
                Token::Uint(u128::from(x)),
                Token::Uint(u128::from(y)),
                Token::Str(color.as_str().to_string()),
            ],
        )
    }

    pub fn batch_update_color(cells: &[CellKey], colors: &[Color]) -> Vec<u8> {
        let (xs, ys) = xy_arrays(cells);
        encode_call(
            "batchUpdateColor(uint256[],uint256[],string[])",
            &[
                xs,
                ys,
                Token::StrArray(colors.iter().map(|c| c.as_str().to_string()).collect()),
            ],
        )
    }

    pub fn compose_pixels(x0: u32, y0: u32, x1: u32, y1: u32) -> Vec<u8> {
        encode_call(
            "composePixels(uint256,uint256,uint256,uint256)",
            &[
                Token::Uint(u128::from(x0)),
                Token::Uint(u128::from(y0)),
                Token::Uint(u128::from(x1)),
                Token::Uint(u128::from(y1)),
            ],
        )
    }

    pub fn decompose_pixels(token_id: u64) -> Vec<u8> {
        encode_call(
            "decomposePixels(uint256)",
            &[Token::Uint(u128::from(token_id))],
        )
    }

    pub fn approve_pixel_multi(x: u32, y: u32, operator: Address) -> Vec<u8> {
        encode_call(
            "approvePixelMulti(uint256,uint256,address)",
            &[
                Token::Uint(u128::from(x)),
                Token::Uint(u128::from(y)),
                Token::Address(operator),
            ],
        )
    }

    pub fn batch_approve_pixel_multi(cells: &[CellKey], operators: &[Address]) -> Vec<u8> {
        let (xs, ys) = xy_arrays(cells);
        encode_call(
            "batchApprovePixelMulti(uint256[],uint256[],address[])",
            &[xs, ys, Token::AddressArray(operators.to_vec())],
        )
    }

    pub fn revoke_pixel_multi(x: u32, y: u32, operator: Address) -> Vec<u8> {
        encode_call(
            "revokePixelMulti(uint256,uint256,address)",
            &[
                Token::Uint(u128::from(x)),
                Token::Uint(u128::from(y)),
                Token::Address(operator),
            ],
        )
    }

    pub fn batch_revoke_pixel_multi(cells: &[CellKey], operators: &[Address]) -> Vec<u8> {
        let (xs, ys) = xy_arrays(cells);
        encode_call(
            "batchRevokePixelMulti(uint256[],uint256[],address[])",
            &[xs, ys, Token::AddressArray(operators.to_vec())],
        )
    }

    pub fn owner_of(token_id: u64) -> Vec<u8> {
        encode_call("ownerOf(uint256)", &[Token::Uint(u128::from(token_id))])
    }

    pub fn get_color(x: u32, y: u32) -> Vec<u8> {
        encode_call(
            "getColor(uint256,uint256)",
            &[Token::Uint(u128::from(x)), Token::Uint(u128::from(y))],
        )
    }

    pub fn get_minted_pixels_in_range(chunk: &Chunk) -> Vec<u8> {
        encode_call(
            "getMintedPixelsInRange(uint256,uint256,uint256,uint256)",
            &[
                Token::Uint(u128::from(chunk.x0)),
                Token::Uint(u128::from(chunk.y0)),
                Token::Uint(u128::from(chunk.x1)),
                Token::Uint(u128::from(chunk.y1)),
            ],
        )
    }

    pub fn total_minted() -> Vec<u8> {
        encode_call("totalMinted()", &[])
    }

    pub fn calculate_update_fee(x: u32, y: u32, caller: Address) -> Vec<u8> {
        encode_call(
            "calculateUpdateFee(uint256,uint256,address)",
            &[
                Token::Uint(u128::from(x)),
                Token::Uint(u128::from(y)),
                Token::Address(caller),
            ],
        )
    }

    pub fn calculate_batch_update_fee(cells: &[CellKey], caller: Address) -> Vec<u8> {
        let (xs, ys) = xy_arrays(cells);
        encode_call(
            "calculateBatchUpdateFee(uint256[],uint256[],address)",
            &[xs, ys, Token::Address(caller)],
        )
    }

    pub fn is_pixel_authorized(x: u32, y: u32, caller: Address) -> Vec<u8> {
        encode_call(
            "isPixelAuthorized(uint256,uint256,address)",
            &[
                Token::Uint(u128::from(x)),
                Token::Uint(u128::from(y)),
                Token::Address(caller),
            ],
        )
    }

    pub fn has_exemption(caller: Address) -> Vec<u8> {
        encode_call("hasExemption(address)", &[Token::Address(caller)])
    }

    pub fn get_pixel_approval_count(x: u32, y: u32) -> Vec<u8> {
        encode_call(
            "getPixelApprovalCount(uint256,uint256)",
            &[Token::Uint(u128::from(x)), Token::Uint(u128::from(y))],
        )
    }

    pub fn get_pixel_approved_addresses_list(x: u32, y: u32) -> Vec<u8> {
        encode_call(
            "getPixelApprovedAddressesList(uint256,uint256)",
            &[Token::Uint(u128::from(x)), Token::Uint(u128::from(y))],
        )
    }

    pub fn get_owned_pixels_in_area(
        x0: u32,
        y0: u32,
        x1: u32,
        y1: u32,
        owner: Address,
    ) -> Vec<u8> {
        encode_call(
            "getOwnedPixelsInArea(uint256,uint256,uint256,uint256,address)",
            &[
                Token::Uint(u128::from(x0)),
                Token::Uint(u128::from(y0)),
                Token::Uint(u128::from(x1)),
                Token::Uint(u128::from(y1)),
                Token::Address(owner),
            ],
        )
    }

    pub fn get_composition_info(token_id: u64) -> Vec<u8> {
        encode_call(
            "getCompositionInfo(uint256)",
            &[Token::Uint(u128::from(token_id))],
        )
    }

    pub fn token_uri(token_id: u64) -> Vec<u8> {
        encode_call("tokenURI(uint256)", &[Token::Uint(u128::from(token_id))])
    }

    pub fn get_batch_token_images(token_ids: &[u64]) -> Vec<u8> {
        encode_call(
            "getBatchTokenImages(uint256[])",
            &[uints(token_ids.iter().map(|id| u128::from(*id)))],
        )
    }
}

/// One page of `getMintedPixelsInRange`: parallel arrays keyed by index.
#[derive(Clone, Debug, PartialEq)]
pub struct RangePage {
    pub ids: Vec<u64>,
    pub owners: Vec<Address>,
    pub colors: Vec<String>,
}

impl RangePage {
    /// Iterate `(cell, owner, color)` triples, skipping entries whose id
    /// does not map back onto the canvas.
    pub fn cells(&self) -> impl Iterator<Item = (CellKey, Address, &str)> + '_ {
        self.ids
            .iter()
            .zip(self.owners.iter())
            .zip(self.colors.iter())
            .filter_map(|((id, owner), color)| {
                let key = cell_coords(*id).ok()?;
                Some((key, *owner, color.as_str()))
            })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompositionInfo {
    pub token_ids: Vec<u64>,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

pub mod decode {
    use super::*;

    fn uint_u64(value: u128, offset: usize) -> Result<u64, AbiError> {
        u64::try_from(value).map_err(|_| AbiError::UintOverflow { offset })
    }

    fn uint_u32(value: u128, offset: usize) -> Result<u32, AbiError> {
        u32::try_from(value).map_err(|_| AbiError::UintOverflow { offset })
    }

    pub fn address_value(data: &[u8]) -> Result<Address, AbiError> {
        Decoder::new(data).address(0)
    }

    pub fn string_value(data: &[u8]) -> Result<String, AbiError> {
        Decoder::new(data).string(0)
    }

    pub fn uint_value(data: &[u8]) -> Result<u128, AbiError> {
        Decoder::new(data).uint(0)
    }

    pub fn bool_value(data: &[u8]) -> Result<bool, AbiError> {
        Decoder::new(data).boolean(0)
    }

    pub fn range_page(data: &[u8]) -> Result<RangePage, AbiError> {
        let decoder = Decoder::new(data);
        let ids = decoder
            .uint_array(0)?
            .into_iter()
            .map(|id| uint_u64(id, 0))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RangePage {
            ids,
            owners: decoder.address_array(1)?,
            colors: decoder.str_array(2)?,
        })
    }

    /// `calculateUpdateFee` returns `(fee, requiresFee)`.
    pub fn update_fee(data: &[u8]) -> Result<(u128, bool), AbiError> {
        let decoder = Decoder::new(data);
        Ok((decoder.uint(0)?, decoder.boolean(1)?))
    }

    /// `calculateBatchUpdateFee` returns `(totalFee, unauthorizedCount)`.
    pub fn batch_update_fee(data: &[u8]) -> Result<(u128, u64), AbiError> {
        let decoder = Decoder::new(data);
        Ok((decoder.uint(0)?, uint_u64(decoder.uint(1)?, 32)?))
    }

    pub fn token_id_list(data: &[u8]) -> Result<Vec<u64>, AbiError> {
        Decoder::new(data)
            .uint_array(0)?
            .into_iter()
            .map(|id| uint_u64(id, 0))
            .collect()
    }

    pub fn address_list(data: &[u8]) -> Result<Vec<Address>, AbiError> {
        Decoder::new(data).address_array(0)
    }

    pub fn composition_info(data: &[u8]) -> Result<CompositionInfo, AbiError> {
        let decoder = Decoder::new(data);
        let token_ids = decoder
            .uint_array(0)?
            .into_iter()
            .map(|id| uint_u64(id, 0))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CompositionInfo {
            token_ids,
            min_x: uint_u32(decoder.uint(1)?, 32)?,
            min_y: uint_u32(decoder.uint(2)?, 64)?,
            max_x: uint_u32(decoder.uint(3)?, 96)?,
            max_y: uint_u32(decoder.uint(4)?, 128)?,
        })
    }

    /// `getBatchTokenImages` returns `(string[] images, bool[] exists)`.
    pub fn token_images(data: &[u8]) -> Result<(Vec<String>, Vec<bool>), AbiError> {
        let decoder = Decoder::new(data);
        Ok((decoder.str_array(0)?, decoder.bool_array(1)?))
    }
}

/// A raw log entry as returned by `eth_getLogs`.
#[derive(Clone, Debug, PartialEq)]
pub struct RawLog {
    pub topics: Vec<[u8; 32]>,
    pub data: Vec<u8>,
}

/// The two chain signals the store reconciles against.
#[derive(Clone, Debug, PartialEq)]
pub enum PixelEvent {
    Minted { token_id: u64, owner: Address },
    ColorChanged { x: u32, y: u32, color: String, owner: Address },
}

/// Decode a contract log. Returns `None` for topics the client does not
/// watch, transfers that are not mints, and malformed entries (a bad log is
/// not worth failing the poll over).
pub fn decode_log(log: &RawLog) -> Option<PixelEvent> {
    let topic0 = log.topics.first()?;
    if *topic0 == *TRANSFER_TOPIC {
        if log.topics.len() != 4 {
            return None;
        }
        let from = topic_address(&log.topics[1])?;
        if !from.is_zero() {
            return None;
        }
        let owner = topic_address(&log.topics[2])?;
        let token_id = topic_u64(&log.topics[3])?;
        return Some(PixelEvent::Minted { token_id, owner });
    }
    if *topic0 == *COLOR_UPDATED_TOPIC {
        let decoder = Decoder::new(&log.data);
        let x = u32::try_from(decoder.uint(0).ok()?).ok()?;
        let y = u32::try_from(decoder.uint(1).ok()?).ok()?;
        let color = decoder.string(2).ok()?;
        let owner = decoder.address(3).ok()?;
        return Some(PixelEvent::ColorChanged { x, y, color, owner });
    }
    None
}

fn topic_address(topic: &[u8; 32]) -> Option<Address> {
    if topic[..12].iter().any(|byte| *byte != 0) {
        return None;
    }
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&topic[12..]);
    Some(Address::from_bytes(bytes))
}

fn topic_u64(topic: &[u8; 32]) -> Option<u64> {
    if topic[..24].iter().any(|byte| *byte != 0) {
        return None;
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&topic[24..]);
    Some(u64::from_be_bytes(bytes))
}
