use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use pikuseru_core::ops::OpContext;
use pikuseru_core::{CellKey, OpKind};

use crate::timers::TimerHandle;

/// Cancellation token for one operation's fallback reconciliation. The
/// event path cancels it when authoritative data arrives first; a
/// cancelled fallback is a no-op.
#[derive(Clone)]
pub(crate) struct FallbackToken(Rc<Cell<bool>>);

impl FallbackToken {
    pub(crate) fn new() -> Self {
        Self(Rc::new(Cell::new(false)))
    }

    pub(crate) fn cancel(&self) {
        self.0.set(true);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

pub(crate) struct PendingOp {
    pub(crate) kind: OpKind,
    pub(crate) cells: Vec<CellKey>,
    pub(crate) batch_size: usize,
    pub(crate) token: FallbackToken,
    fallback_timer: Option<TimerHandle>,
}

impl PendingOp {
    pub(crate) fn context(&self) -> OpContext {
        match (self.kind.is_batch(), self.cells.first()) {
            (false, Some(cell)) => OpContext::single(*cell),
            _ => OpContext::batch(self.batch_size),
        }
    }
}

/// Outstanding operations keyed by transaction hash. Each entry owns its
/// receipt watcher and fallback timer, so a second submission never
/// abandons the first one's reconciliation.
#[derive(Default)]
pub(crate) struct TxRegistry {
    ops: HashMap<String, PendingOp>,
}

impl TxRegistry {
    pub(crate) fn insert(
        &mut self,
        hash: String,
        kind: OpKind,
        cells: Vec<CellKey>,
        batch_size: usize,
    ) -> FallbackToken {
        let token = FallbackToken::new();
        self.ops.insert(
            hash,
            PendingOp {
                kind,
                cells,
                batch_size,
                token: token.clone(),
                fallback_timer: None,
            },
        );
        token
    }

    pub(crate) fn set_fallback_timer(&mut self, hash: &str, timer: TimerHandle) {
        if let Some(op) = self.ops.get_mut(hash) {
            if let Some(previous) = op.fallback_timer.replace(timer) {
                previous.cancel();
            }
        }
    }

    pub(crate) fn take(&mut self, hash: &str) -> Option<PendingOp> {
        self.ops.remove(hash)
    }

    pub(crate) fn get(&self, hash: &str) -> Option<&PendingOp> {
        self.ops.get(hash)
    }

    pub(crate) fn len(&self) -> usize {
        self.ops.len()
    }

    /// Event path: authoritative data arrived for `cell`. Cancel and
    /// retire the covering operation so its fallback never runs.
    pub(crate) fn reconcile_cell(&mut self, cell: CellKey) -> Option<PendingOp> {
        let hash = self
            .ops
            .iter()
            .find(|(_, op)| op.cells.contains(&cell))
            .map(|(hash, _)| hash.clone())?;
        let mut op = self.ops.remove(&hash)?;
        op.token.cancel();
        if let Some(timer) = op.fallback_timer.take() {
            timer.cancel();
        }
        Some(op)
    }
}

#[cfg(target_arch = "wasm32")]
pub(crate) use driver::TxTracker;

#[cfg(target_arch = "wasm32")]
mod driver {
    use super::*;

    use std::cell::RefCell;

    use gloo::console;
    use gloo::timers::future::TimeoutFuture;
    use wasm_bindgen_futures::spawn_local;

    use pikuseru_core::ops::{self, FALLBACK_DELAY_MS, MODE_RESET_DELAY_MS};
    use pikuseru_core::pxnft::calls;
    use pikuseru_core::{Address, Color};

    use crate::app_core::{Area, CanvasCore, Mode, PendingMark};
    use crate::notifications::NotificationStore;
    use crate::contract::PxnftContract;
    use crate::rpc::RpcClient;
    use crate::timers;
    use crate::wallet;

    const RECEIPT_POLL_MS: u32 = 1_000;
    const RECEIPT_MAX_ATTEMPTS: u32 = 120;

    fn format_mon(fee: u128) -> String {
        format!("{} MON", fee as f64 / 1e18)
    }

    /// Watches submitted mutations through confirmation and reconciles the
    /// store on both outcomes.
    pub(crate) struct TxTracker {
        registry: RefCell<TxRegistry>,
        core: Rc<CanvasCore>,
        notices: Rc<NotificationStore>,
        contract: Rc<PxnftContract>,
        rpc: Rc<RpcClient>,
    }

    impl TxTracker {
        pub(crate) fn new(
            core: Rc<CanvasCore>,
            notices: Rc<NotificationStore>,
            contract: Rc<PxnftContract>,
            rpc: Rc<RpcClient>,
        ) -> Rc<Self> {
            Rc::new(Self {
                registry: RefCell::new(TxRegistry::default()),
                core,
                notices,
                contract,
                rpc,
            })
        }

        pub(crate) fn in_flight(&self) -> usize {
            self.registry.borrow().len()
        }

        fn wallet_or_notice(&self) -> Option<Address> {
            let wallet = self.core.wallet();
            if wallet.is_none() {
                self.notices
                    .error("Not Connected", "Please connect your wallet first");
            }
            wallet
        }

        // --- submissions ---------------------------------------------

        /// Mint one cell with the selected color. The pending mark lands
        /// before the wallet prompt opens.
        pub(crate) fn submit_mint(self: &Rc<Self>, x: u32, y: u32) {
            let Some(from) = self.wallet_or_notice() else {
                return;
            };
            let color = self.core.selected_color();
            let cells = vec![(x, y)];
            self.core.mark_pending(PendingMark::Mint, &cells);

            let tracker = self.clone();
            spawn_local(async move {
                let data = calls::mint(x, y, &color);
                tracker
                    .send(OpKind::Mint, cells, 1, from, data, 0)
                    .await;
            });
        }

        /// Update one cell's color, pre-checking authorization, exemption
        /// and the fee the contract will charge.
        pub(crate) fn submit_update(self: &Rc<Self>, x: u32, y: u32) {
            let Some(from) = self.wallet_or_notice() else {
                return;
            };
            let color = self.core.selected_color();
            let cells = vec![(x, y)];
            self.core.mark_pending(PendingMark::Update, &cells);

            let tracker = self.clone();
            spawn_local(async move {
                let authorized = tracker
                    .contract
                    .is_pixel_authorized(x, y, from)
                    .await
                    .unwrap_or(false);
                let exempt = tracker.contract.has_exemption(from).await.unwrap_or(false);
                let fee = if authorized || exempt {
                    0
                } else {
                    match tracker.contract.update_fee(x, y, from).await {
                        Ok((fee, true)) => fee,
                        Ok((_, false)) => 0,
                        Err(err) => {
                            console::warn!("fee check failed", err.to_string());
                            0
                        }
                    }
                };
                let data = calls::update_color(x, y, &color);
                tracker
                    .send(OpKind::Update, cells, 1, from, data, fee)
                    .await;
            });
        }

        /// Batch-mint the staged cells that are still unminted. Minted and
        /// pending cells are silently excluded.
        pub(crate) fn submit_batch_mint(self: &Rc<Self>) {
            let Some(from) = self.wallet_or_notice() else {
                return;
            };
            let staged = self.core.batch_mint_candidates();
            if staged.is_empty() {
                self.notices
                    .error("No Valid Pixels", "No unminted pixels selected for minting");
                return;
            }
            let cells: Vec<CellKey> = staged.iter().map(|(key, _)| *key).collect();
            let colors: Vec<Color> = staged.iter().map(|(_, color)| color.clone()).collect();
            self.core.mark_pending(PendingMark::Mint, &cells);
            self.core.clear_drawn();
            self.core.set_mode(Mode::View);

            let tracker = self.clone();
            spawn_local(async move {
                let count = cells.len();
                let data = calls::batch_mint(&cells, &colors);
                tracker
                    .send(
                        OpKind::BatchMint,
                        cells,
                        count,
                        from,
                        data,
                        0,
                    )
                    .await;
            });
        }

        /// Batch-update the staged cells that are minted, paying whatever
        /// fee the contract quotes for the unauthorized ones.
        pub(crate) fn submit_batch_update(self: &Rc<Self>) {
            let Some(from) = self.wallet_or_notice() else {
                return;
            };
            let staged = self.core.batch_update_candidates();
            if staged.is_empty() {
                self.notices
                    .error("No Valid Pixels", "No minted pixels found to update");
                return;
            }
            let cells: Vec<CellKey> = staged.iter().map(|(key, _)| *key).collect();
            let colors: Vec<Color> = staged.iter().map(|(_, color)| color.clone()).collect();
            self.core.mark_pending(PendingMark::Update, &cells);
            self.core.clear_drawn();
            self.core.set_mode(Mode::View);

            let tracker = self.clone();
            spawn_local(async move {
                let exempt = tracker.contract.has_exemption(from).await.unwrap_or(false);
                let (fee, unauthorized) = if exempt {
                    (0, 0)
                } else {
                    match tracker.contract.batch_update_fee(&cells, from).await {
                        Ok(quote) => quote,
                        Err(err) => {
                            console::warn!("batch fee check failed", err.to_string());
                            (0, 0)
                        }
                    }
                };
                let count = cells.len();
                let data = calls::batch_update_color(&cells, &colors);
                let submitted = tracker
                    .send(
                        OpKind::BatchUpdate,
                        cells,
                        count,
                        from,
                        data,
                        fee,
                    )
                    .await;
                if submitted && fee > 0 {
                    let free = count as u64 - unauthorized.min(count as u64);
                    tracker.notices.info(
                        "Batch Fee",
                        format!(
                            "{free} free, {unauthorized} paid, total {}",
                            format_mon(fee)
                        ),
                        None,
                    );
                }
            });
        }

        /// Compose the owned cells inside the selected area into one NFT.
        pub(crate) fn submit_compose(self: &Rc<Self>, area: Area) {
            let Some(from) = self.wallet_or_notice() else {
                return;
            };
            let tracker = self.clone();
            spawn_local(async move {
                let owned = match tracker.contract.owned_pixels_in_area(area, from).await {
                    Ok(ids) => ids.len(),
                    // Range query unavailable: count from local state.
                    Err(_) => tracker.core.owned_cells_in_area(area).len(),
                };
                if owned < 2 {
                    tracker.notices.error(
                        "Cannot Compose",
                        "Need at least 2 owned pixels in the selected area",
                    );
                    return;
                }
                tracker.core.clear_area();
                tracker.core.set_mode(Mode::View);
                let data = calls::compose_pixels(area.x0, area.y0, area.x1, area.y1);
                tracker
                    .send(
                        OpKind::Compose,
                        Vec::new(),
                        owned,
                        from,
                        data,
                        0,
                    )
                    .await;
            });
        }

        /// Break a composite NFT back into its member cells.
        pub(crate) fn submit_decompose(self: &Rc<Self>, token_id: u64) {
            let Some(from) = self.wallet_or_notice() else {
                return;
            };
            let tracker = self.clone();
            spawn_local(async move {
                let data = calls::decompose_pixels(token_id);
                tracker
                    .send(
                        OpKind::Compose,
                        Vec::new(),
                        1,
                        from,
                        data,
                        0,
                    )
                    .await;
            });
        }

        /// Grant update rights on owned cells to one or more operators.
        pub(crate) fn submit_delegate(self: &Rc<Self>, cells: Vec<CellKey>, operators: Vec<Address>) {
            self.submit_approval(OpKind::Delegate, cells, operators);
        }

        /// Revoke previously granted update rights.
        pub(crate) fn submit_revoke(self: &Rc<Self>, cells: Vec<CellKey>, operators: Vec<Address>) {
            self.submit_approval(OpKind::Revoke, cells, operators);
        }

        fn submit_approval(
            self: &Rc<Self>,
            kind: OpKind,
            cells: Vec<CellKey>,
            operators: Vec<Address>,
        ) {
            let Some(from) = self.wallet_or_notice() else {
                return;
            };
            if operators.is_empty() {
                self.notices
                    .error("No Addresses", "Please enter at least one address");
                return;
            }
            if cells.is_empty() {
                self.notices.error("No Pixels", "Please select pixels first");
                return;
            }
            for (x, y) in &cells {
                if !self.core.can_update((*x, *y)) {
                    self.notices
                        .error("Not Owner", format!("You do not own pixel ({x}, {y})"));
                    return;
                }
            }

            let batch_size = cells.len() * operators.len();
            let data = match (kind, cells.as_slice(), operators.as_slice()) {
                (OpKind::Delegate, [(x, y)], [operator]) => {
                    calls::approve_pixel_multi(*x, *y, *operator)
                }
                (OpKind::Delegate, _, _) => calls::batch_approve_pixel_multi(&cells, &operators),
                (OpKind::Revoke, [(x, y)], [operator]) => {
                    calls::revoke_pixel_multi(*x, *y, *operator)
                }
                _ => calls::batch_revoke_pixel_multi(&cells, &operators),
            };

            let tracker = self.clone();
            spawn_local(async move {
                tracker
                    .send(kind, cells, batch_size, from, data, 0)
                    .await;
            });
        }

        // --- lifecycle -----------------------------------------------

        /// Submit through the wallet and hand the hash to the watcher.
        /// Returns whether a transaction went out.
        async fn send(
            self: &Rc<Self>,
            kind: OpKind,
            cells: Vec<CellKey>,
            batch_size: usize,
            from: Address,
            data: Vec<u8>,
            value_wei: u128,
        ) -> bool {
            let context = if kind.is_batch() || cells.len() != 1 {
                OpContext::batch(batch_size)
            } else {
                OpContext::single(cells[0])
            };
            match wallet::send_transaction(from, self.contract.address(), &data, value_wei).await {
                Ok(hash) => {
                    let (title, mut message) = kind.submit_notice(&context);
                    if value_wei > 0 {
                        message = format!("{message} (fee {})", format_mon(value_wei));
                    }
                    self.notices.info(title, message, Some(hash.clone()));
                    self.registry
                        .borrow_mut()
                        .insert(hash.clone(), kind, cells, batch_size);
                    self.clone().watch_receipt(hash);
                    true
                }
                Err(err) => {
                    if !cells.is_empty() {
                        self.core.clear_pending(&cells);
                    }
                    let (title, default_message) = kind.failure_notice(&context);
                    let message = ops::failure_reason(&err.to_string())
                        .map(str::to_string)
                        .unwrap_or(default_message);
                    self.notices.error(title, message);
                    false
                }
            }
        }

        fn watch_receipt(self: Rc<Self>, hash: String) {
            spawn_local(async move {
                for _ in 0..RECEIPT_MAX_ATTEMPTS {
                    TimeoutFuture::new(RECEIPT_POLL_MS).await;
                    match self.rpc.transaction_receipt(&hash).await {
                        Ok(Some(receipt)) => {
                            if receipt.status {
                                self.confirmed(&hash);
                            } else {
                                self.failed(&hash, "Transaction reverted by contract");
                            }
                            return;
                        }
                        Ok(None) => {}
                        Err(err) => {
                            // Transient: keep polling.
                            console::warn!("receipt poll failed", err.to_string());
                        }
                    }
                }
                self.failed(&hash, "Transaction confirmation timed out");
            });
        }

        fn confirmed(self: &Rc<Self>, hash: &str) {
            let (kind, context) = {
                let registry = self.registry.borrow();
                let Some(op) = registry.get(hash) else {
                    return;
                };
                (op.kind, op.context())
            };

            let (title, message) = kind.success_notice(&context);
            self.notices.success(title, message, Some(hash.to_string()));

            // Fallback reconciliation unless the event path lands first.
            let tracker = self.clone();
            let hash_for_fallback = hash.to_string();
            let timer = timers::schedule(FALLBACK_DELAY_MS, move || {
                let tracker = tracker.clone();
                spawn_local(async move {
                    tracker.run_fallback(hash_for_fallback).await;
                });
            });
            self.registry.borrow_mut().set_fallback_timer(hash, timer);

            if kind.resets_mode_ui() {
                let core = self.core.clone();
                timers::schedule(MODE_RESET_DELAY_MS, move || core.reset_mode_ui()).forget();
            }

            let tracker = self.clone();
            spawn_local(async move {
                tracker.refresh_total_minted().await;
            });
        }

        /// Forcibly converge the affected cells by direct re-read. A
        /// cancelled token means the event path got there first.
        async fn run_fallback(self: Rc<Self>, hash: String) {
            let Some(op) = self.registry.borrow_mut().take(&hash) else {
                return;
            };
            if op.token.is_cancelled() {
                return;
            }
            if op.kind.is_batch() {
                self.core.clear_all_pending();
            } else {
                for cell in &op.cells {
                    match self.contract.cell_state(*cell).await {
                        Ok((owner, color)) => {
                            self.core.apply_authoritative(*cell, color, owner);
                        }
                        Err(err) => {
                            console::warn!("fallback read failed", err.to_string());
                            self.core.clear_pending(&[*cell]);
                        }
                    }
                }
            }
            self.refresh_total_minted().await;
        }

        fn failed(self: &Rc<Self>, hash: &str, reason: &str) {
            let Some(op) = self.registry.borrow_mut().take(hash) else {
                return;
            };
            if !op.cells.is_empty() {
                self.core.clear_pending(&op.cells);
            }
            let (title, _) = op.kind.failure_notice(&op.context());
            self.notices.error(title, reason.to_string());
        }

        /// Event path: a chain event delivered authoritative state for
        /// `cell`, so the covering operation's fallback is redundant.
        pub(crate) fn note_cell_reconciled(&self, cell: CellKey) {
            self.registry.borrow_mut().reconcile_cell(cell);
        }

        pub(crate) async fn refresh_total_minted(&self) {
            match self.contract.total_minted().await {
                Ok(total) => self.core.set_total_minted(total),
                Err(err) => console::warn!("totalMinted read failed", err.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_cancellation_is_sticky() {
        let token = FallbackToken::new();
        assert!(!token.is_cancelled());
        let shared = token.clone();
        shared.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn registry_keys_operations_by_hash() {
        let mut registry = TxRegistry::default();
        registry.insert("0xaaa".into(), OpKind::Mint, vec![(10, 20)], 1);
        registry.insert("0xbbb".into(), OpKind::BatchMint, vec![(1, 1), (2, 2)], 2);
        assert_eq!(registry.len(), 2);

        // A second submission does not clobber the first.
        let first = registry.take("0xaaa").unwrap();
        assert_eq!(first.kind, OpKind::Mint);
        assert_eq!(registry.len(), 1);
        assert!(registry.get("0xbbb").is_some());
    }

    #[test]
    fn reconcile_cell_retires_the_covering_operation() {
        let mut registry = TxRegistry::default();
        let token_a = registry.insert("0xaaa".into(), OpKind::Mint, vec![(10, 20)], 1);
        let token_b = registry.insert("0xbbb".into(), OpKind::Update, vec![(30, 40)], 1);

        let retired = registry.reconcile_cell((10, 20)).unwrap();
        assert_eq!(retired.kind, OpKind::Mint);
        assert!(token_a.is_cancelled());
        assert!(!token_b.is_cancelled());
        assert_eq!(registry.len(), 1);

        // No covering operation: nothing happens.
        assert!(registry.reconcile_cell((10, 20)).is_none());
    }

    #[test]
    fn context_reflects_operation_shape() {
        let mut registry = TxRegistry::default();
        registry.insert("0xaaa".into(), OpKind::Mint, vec![(10, 20)], 1);
        registry.insert("0xbbb".into(), OpKind::BatchUpdate, vec![(1, 1), (2, 2)], 2);

        let single = registry.get("0xaaa").unwrap().context();
        assert_eq!(single.cell, Some((10, 20)));
        let batch = registry.get("0xbbb").unwrap().context();
        assert_eq!(batch.cell, None);
        assert_eq!(batch.count, 2);
    }
}
