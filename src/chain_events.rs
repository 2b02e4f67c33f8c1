//! Log polling against the contract: Transfer-from-zero (mints) and
//! ColorUpdated. Whichever of this path or the tracker's fallback timer
//! reaches a cell first wins; the other becomes a no-op.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo::console;
use gloo::timers::callback::Interval;
use wasm_bindgen_futures::spawn_local;

use pikuseru_core::{cell_coords, decode_log, Color, PixelEvent};

use crate::app_core::CanvasCore;
use crate::contract::PxnftContract;
use crate::rpc::{RpcClient, RpcError};
use crate::timers;
use crate::tx_tracker::TxTracker;

pub(crate) const EVENT_POLL_INTERVAL_MS: u32 = 4_000;

/// Watching starts this long after boot so the first canvas load is not
/// competing with log queries.
pub(crate) const EVENT_WATCH_ENABLE_DELAY_MS: u32 = 2_000;

pub(crate) struct EventWatcher {
    core: Rc<CanvasCore>,
    contract: Rc<PxnftContract>,
    rpc: Rc<RpcClient>,
    tracker: Rc<TxTracker>,
    interval: RefCell<Option<Interval>>,
    last_block: Cell<u64>,
    polling: Cell<bool>,
}

impl EventWatcher {
    pub(crate) fn new(
        core: Rc<CanvasCore>,
        contract: Rc<PxnftContract>,
        rpc: Rc<RpcClient>,
        tracker: Rc<TxTracker>,
    ) -> Rc<Self> {
        Rc::new(Self {
            core,
            contract,
            rpc,
            tracker,
            interval: RefCell::new(None),
            last_block: Cell::new(0),
            polling: Cell::new(false),
        })
    }

    pub(crate) fn start(self: &Rc<Self>) {
        let watcher = self.clone();
        timers::schedule(EVENT_WATCH_ENABLE_DELAY_MS, move || watcher.enable()).forget();
    }

    fn enable(self: &Rc<Self>) {
        let watcher = self.clone();
        let interval = Interval::new(EVENT_POLL_INTERVAL_MS, move || {
            let watcher = watcher.clone();
            spawn_local(async move {
                watcher.poll().await;
            });
        });
        *self.interval.borrow_mut() = Some(interval);
    }

    pub(crate) fn stop(&self) {
        self.interval.borrow_mut().take();
    }

    async fn poll(self: Rc<Self>) {
        if self.polling.replace(true) {
            return;
        }
        let result = self.poll_inner().await;
        self.polling.set(false);
        if let Err(err) = result {
            // The fallback timers still converge state without events.
            console::warn!("event watching failed, disabling", err.to_string());
            self.stop();
        }
    }

    async fn poll_inner(&self) -> Result<(), RpcError> {
        let current = self.rpc.block_number().await?;
        let last = self.last_block.get();
        if last == 0 {
            self.last_block.set(current);
            return Ok(());
        }
        if current <= last {
            return Ok(());
        }
        let logs = self.rpc.get_logs(self.contract.address(), last + 1).await?;
        self.last_block.set(current);

        for log in &logs {
            match decode_log(log) {
                Some(PixelEvent::Minted { token_id, owner }) => {
                    // Composite mints carry ids past the canvas range.
                    let Ok(key) = cell_coords(token_id) else {
                        continue;
                    };
                    self.tracker.note_cell_reconciled(key);
                    self.core.bump_total_minted();
                    match self.contract.color_at(key.0, key.1).await {
                        Ok(color) => self.core.apply_authoritative(key, color, owner),
                        Err(err) => {
                            console::warn!("color read for mint failed", err.to_string());
                            self.core.clear_pending(&[key]);
                        }
                    }
                }
                Some(PixelEvent::ColorChanged { x, y, color, owner }) => {
                    self.tracker.note_cell_reconciled((x, y));
                    self.core
                        .apply_authoritative((x, y), Color::parse_or_default(&color), owner);
                }
                None => {}
            }
        }
        Ok(())
    }
}
