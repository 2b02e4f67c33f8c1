use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use pikuseru_core::chunk::{self, Chunk};
use pikuseru_core::Viewport;

use crate::timers::TimerHandle;

/// Bookkeeping for the chunked range loader: which chunks are loaded or in
/// flight, which load tier applies, and the debounce/rerun flags the wasm
/// driver uses. A chunk that fails a fetch ends up in neither set, so the
/// next pass retries it by omission.
pub(crate) struct ChunkLoader {
    loaded: RefCell<HashSet<String>>,
    loading: RefCell<HashSet<String>>,
    first_load: Cell<bool>,
    running: Cell<bool>,
    rerun: Cell<bool>,
    debounce: RefCell<Option<TimerHandle>>,
}

impl ChunkLoader {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self {
            loaded: RefCell::new(HashSet::new()),
            loading: RefCell::new(HashSet::new()),
            first_load: Cell::new(true),
            running: Cell::new(false),
            rerun: Cell::new(false),
            debounce: RefCell::new(None),
        })
    }

    pub(crate) fn plan(&self, viewport: &Viewport) -> Vec<Chunk> {
        chunk::plan_chunks(
            viewport,
            self.first_load.get(),
            &self.loaded.borrow(),
            &self.loading.borrow(),
        )
    }

    pub(crate) fn is_first_load(&self) -> bool {
        self.first_load.get()
    }

    pub(crate) fn note_loading(&self, key: String) {
        self.loading.borrow_mut().insert(key);
    }

    pub(crate) fn note_loaded(&self, key: String) {
        self.loading.borrow_mut().remove(&key);
        self.loaded.borrow_mut().insert(key);
    }

    pub(crate) fn note_failed(&self, key: &str) {
        self.loading.borrow_mut().remove(key);
    }

    pub(crate) fn is_loaded(&self, key: &str) -> bool {
        self.loaded.borrow().contains(key)
    }

    /// A completed pass switches the loader to the steady tier.
    pub(crate) fn finish_pass(&self) {
        self.first_load.set(false);
    }

    /// Drop the loaded set so the next pass refetches everything visible.
    pub(crate) fn invalidate(&self) {
        self.loaded.borrow_mut().clear();
    }
}

#[cfg(target_arch = "wasm32")]
pub(crate) mod driver {
    use super::*;

    use futures_util::future::join_all;
    use gloo::console;
    use gloo::timers::future::TimeoutFuture;
    use wasm_bindgen_futures::spawn_local;

    use crate::app_core::CanvasCore;
    use crate::contract::PxnftContract;
    use crate::timers;

    /// Trailing-edge debounce: every viewport change reschedules the pass;
    /// only a quiet period lets it run.
    pub(crate) fn request_load(
        loader: &Rc<ChunkLoader>,
        core: &Rc<CanvasCore>,
        contract: &Rc<PxnftContract>,
    ) {
        let loader_for_timer = loader.clone();
        let core_for_timer = core.clone();
        let contract_for_timer = contract.clone();
        let timer = timers::schedule(chunk::VIEWPORT_DEBOUNCE_MS, move || {
            spawn_local(run_pass(
                loader_for_timer,
                core_for_timer,
                contract_for_timer,
            ));
        });
        *loader.debounce.borrow_mut() = Some(timer);
    }

    /// Load immediately, without waiting out the debounce. Used for the
    /// initial pass.
    pub(crate) fn load_now(
        loader: &Rc<ChunkLoader>,
        core: &Rc<CanvasCore>,
        contract: &Rc<PxnftContract>,
    ) {
        spawn_local(run_pass(loader.clone(), core.clone(), contract.clone()));
    }

    async fn run_pass(loader: Rc<ChunkLoader>, core: Rc<CanvasCore>, contract: Rc<PxnftContract>) {
        if loader.running.get() {
            loader.rerun.set(true);
            return;
        }
        loader.running.set(true);
        loop {
            let first = loader.is_first_load();
            let plan = loader.plan(&core.viewport());
            if plan.is_empty() {
                break;
            }
            core.begin_load(plan.len());
            for batch in plan.chunks(chunk::concurrency_for(first)) {
                let fetches: Vec<_> = batch
                    .iter()
                    .map(|entry| fetch_chunk(&loader, &core, &contract, *entry))
                    .collect();
                join_all(fetches).await;
                TimeoutFuture::new(chunk::batch_delay_ms(first)).await;
            }
            core.end_load();
            loader.finish_pass();
            if !loader.rerun.replace(false) {
                break;
            }
        }
        loader.running.set(false);
    }

    async fn fetch_chunk(
        loader: &Rc<ChunkLoader>,
        core: &Rc<CanvasCore>,
        contract: &Rc<PxnftContract>,
        chunk: Chunk,
    ) {
        let key = chunk.key();
        loader.note_loading(key.clone());
        match contract.range(&chunk).await {
            Ok(page) => {
                core.merge_range_page(&page);
                loader.note_loaded(key);
            }
            Err(err) => {
                console::warn!("chunk load failed", key.clone(), err.to_string());
                loader.note_failed(&key);
            }
        }
        core.progress_tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport { x: 0, y: 0, size: 10 }
    }

    #[test]
    fn loaded_chunks_are_not_replanned() {
        let loader = ChunkLoader::new();
        let plan = loader.plan(&viewport());
        let total = plan.len();
        assert!(total > 0);

        let key = plan[0].key();
        loader.note_loading(key.clone());
        loader.note_loaded(key.clone());
        assert!(loader.is_loaded(&key));

        let replanned = loader.plan(&viewport());
        assert_eq!(replanned.len(), total - 1);
        assert!(replanned.iter().all(|chunk| chunk.key() != key));
    }

    #[test]
    fn in_flight_chunks_are_not_replanned() {
        let loader = ChunkLoader::new();
        let plan = loader.plan(&viewport());
        loader.note_loading(plan[0].key());
        let replanned = loader.plan(&viewport());
        assert_eq!(replanned.len(), plan.len() - 1);
    }

    #[test]
    fn failed_chunks_stay_retryable() {
        let loader = ChunkLoader::new();
        let plan = loader.plan(&viewport());
        let key = plan[0].key();
        loader.note_loading(key.clone());
        loader.note_failed(&key);

        // The failed chunk is a candidate again on the next pass.
        let replanned = loader.plan(&viewport());
        assert!(replanned.iter().any(|chunk| chunk.key() == key));
    }

    #[test]
    fn invalidate_forces_refetch() {
        let loader = ChunkLoader::new();
        loader.finish_pass();
        for chunk in loader.plan(&viewport()) {
            loader.note_loading(chunk.key());
            loader.note_loaded(chunk.key());
        }
        assert!(loader.plan(&viewport()).is_empty());

        loader.invalidate();
        assert!(!loader.plan(&viewport()).is_empty());
        assert!(!loader.is_first_load());
    }

    #[test]
    fn first_pass_uses_the_smaller_tier() {
        let loader = ChunkLoader::new();
        let initial = loader.plan(&viewport()).len();
        loader.finish_pass();
        // Steady tier expands the buffer, so more chunks are planned.
        let steady = loader.plan(&viewport()).len();
        assert!(steady > initial);
    }
}
