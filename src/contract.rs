use std::rc::Rc;

use pikuseru_core::abi::AbiError;
use pikuseru_core::cell_id;
use pikuseru_core::chunk::Chunk;
use pikuseru_core::pxnft::{calls, decode, CompositionInfo, RangePage};
use pikuseru_core::{Address, CellKey, Color};

use crate::app_core::Area;
use crate::rpc::{RpcClient, RpcError};

#[derive(Debug, thiserror::Error)]
pub(crate) enum ContractError {
    #[error("{0}")]
    Rpc(#[from] RpcError),
    #[error("{0}")]
    Abi(#[from] AbiError),
    #[error("cell ({0}, {1}) is outside the canvas")]
    OutOfBounds(u32, u32),
}

/// Typed read surface of the PXNFT contract. Writes only build calldata;
/// submission goes through the wallet.
pub(crate) struct PxnftContract {
    rpc: Rc<RpcClient>,
    address: String,
}

impl PxnftContract {
    pub(crate) fn new(rpc: Rc<RpcClient>, address: String) -> Rc<Self> {
        Rc::new(Self { rpc, address })
    }

    pub(crate) fn address(&self) -> &str {
        &self.address
    }

    async fn read(&self, data: Vec<u8>) -> Result<Vec<u8>, RpcError> {
        self.rpc.call(&self.address, &data).await
    }

    pub(crate) async fn owner_of(&self, token_id: u64) -> Result<Address, ContractError> {
        let reply = self.read(calls::owner_of(token_id)).await?;
        Ok(decode::address_value(&reply)?)
    }

    pub(crate) async fn color_at(&self, x: u32, y: u32) -> Result<Color, ContractError> {
        let reply = self.read(calls::get_color(x, y)).await?;
        Ok(Color::parse_or_default(&decode::string_value(&reply)?))
    }

    /// Authoritative `(owner, color)` for one cell, used by the fallback
    /// reconciliation path.
    pub(crate) async fn cell_state(&self, key: CellKey) -> Result<(Address, Color), ContractError> {
        let (x, y) = key;
        let id = cell_id(x, y).map_err(|_| ContractError::OutOfBounds(x, y))?;
        let owner = self.owner_of(id).await?;
        let color = self.color_at(x, y).await?;
        Ok((owner, color))
    }

    pub(crate) async fn range(&self, chunk: &Chunk) -> Result<RangePage, ContractError> {
        let reply = self.read(calls::get_minted_pixels_in_range(chunk)).await?;
        Ok(decode::range_page(&reply)?)
    }

    pub(crate) async fn total_minted(&self) -> Result<u64, ContractError> {
        let reply = self.read(calls::total_minted()).await?;
        let total = decode::uint_value(&reply)?;
        Ok(u64::try_from(total).unwrap_or(u64::MAX))
    }

    pub(crate) async fn update_fee(
        &self,
        x: u32,
        y: u32,
        caller: Address,
    ) -> Result<(u128, bool), ContractError> {
        let reply = self.read(calls::calculate_update_fee(x, y, caller)).await?;
        Ok(decode::update_fee(&reply)?)
    }

    pub(crate) async fn batch_update_fee(
        &self,
        cells: &[CellKey],
        caller: Address,
    ) -> Result<(u128, u64), ContractError> {
        let reply = self
            .read(calls::calculate_batch_update_fee(cells, caller))
            .await?;
        Ok(decode::batch_update_fee(&reply)?)
    }

    pub(crate) async fn is_pixel_authorized(
        &self,
        x: u32,
        y: u32,
        caller: Address,
    ) -> Result<bool, ContractError> {
        let reply = self.read(calls::is_pixel_authorized(x, y, caller)).await?;
        Ok(decode::bool_value(&reply)?)
    }

    pub(crate) async fn has_exemption(&self, caller: Address) -> Result<bool, ContractError> {
        let reply = self.read(calls::has_exemption(caller)).await?;
        Ok(decode::bool_value(&reply)?)
    }

    pub(crate) async fn approval_count(&self, x: u32, y: u32) -> Result<u64, ContractError> {
        let reply = self.read(calls::get_pixel_approval_count(x, y)).await?;
        let count = decode::uint_value(&reply)?;
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    pub(crate) async fn approved_addresses(
        &self,
        x: u32,
        y: u32,
    ) -> Result<Vec<Address>, ContractError> {
        let reply = self
            .read(calls::get_pixel_approved_addresses_list(x, y))
            .await?;
        Ok(decode::address_list(&reply)?)
    }

    pub(crate) async fn owned_pixels_in_area(
        &self,
        area: Area,
        owner: Address,
    ) -> Result<Vec<u64>, ContractError> {
        let reply = self
            .read(calls::get_owned_pixels_in_area(
                area.x0, area.y0, area.x1, area.y1, owner,
            ))
            .await?;
        Ok(decode::token_id_list(&reply)?)
    }

    pub(crate) async fn composition_info(
        &self,
        token_id: u64,
    ) -> Result<CompositionInfo, ContractError> {
        let reply = self.read(calls::get_composition_info(token_id)).await?;
        Ok(decode::composition_info(&reply)?)
    }

    pub(crate) async fn token_uri(&self, token_id: u64) -> Result<String, ContractError> {
        let reply = self.read(calls::token_uri(token_id)).await?;
        Ok(decode::string_value(&reply)?)
    }

    pub(crate) async fn batch_token_images(
        &self,
        token_ids: &[u64],
    ) -> Result<(Vec<String>, Vec<bool>), ContractError> {
        let reply = self.read(calls::get_batch_token_images(token_ids)).await?;
        Ok(decode::token_images(&reply)?)
    }
}
