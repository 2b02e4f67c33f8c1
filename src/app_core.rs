use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use pikuseru_core::pxnft::RangePage;
use pikuseru_core::{Address, CellKey, Color, Viewport};

pub(crate) type CanvasSubscriber = Rc<dyn Fn()>;

/// Staging highlight used while picking cells to delegate.
pub(crate) const DELEGATE_HIGHLIGHT: &str = "#4f46e5";
/// Staging highlight used while picking cells to revoke.
pub(crate) const REVOKE_HIGHLIGHT: &str = "#dc2626";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mode {
    View,
    /// Batch staging: clicks toggle cells in the drawn set.
    Draw,
    /// Rectangle selection for composition.
    AreaSelect,
    Delegate { batch: bool },
    Revoke { batch: bool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PendingMark {
    Mint,
    Update,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Area {
    pub(crate) x0: u32,
    pub(crate) y0: u32,
    pub(crate) x1: u32,
    pub(crate) y1: u32,
}

impl Area {
    pub(crate) fn normalized(a: CellKey, b: CellKey) -> Self {
        Self {
            x0: a.0.min(b.0),
            y0: a.1.min(b.1),
            x1: a.0.max(b.0),
            y1: a.1.max(b.1),
        }
    }

    pub(crate) fn cells(&self) -> impl Iterator<Item = CellKey> + '_ {
        let xs = self.x0..=self.x1;
        xs.flat_map(move |x| (self.y0..=self.y1).map(move |y| (x, y)))
    }

    pub(crate) fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PixelCell {
    pub(crate) color: Color,
    pub(crate) owner: Option<Address>,
    pub(crate) minted: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct LoadProgress {
    pub(crate) current: usize,
    pub(crate) total: usize,
    pub(crate) active: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StageOutcome {
    Added,
    Removed,
    RejectedPending,
}

struct CanvasState {
    pixels: HashMap<CellKey, PixelCell>,
    pending_mints: HashSet<CellKey>,
    pending_updates: HashSet<CellKey>,
    drawn: HashMap<CellKey, Color>,
    viewport: Viewport,
    selected: Option<CellKey>,
    selected_color: Color,
    mode: Mode,
    area_start: Option<CellKey>,
    area_dragging: bool,
    area: Option<Area>,
    total_minted: u64,
    progress: LoadProgress,
    wallet: Option<Address>,
}

impl CanvasState {
    fn new() -> Self {
        Self {
            pixels: HashMap::new(),
            pending_mints: HashSet::new(),
            pending_updates: HashSet::new(),
            drawn: HashMap::new(),
            viewport: Viewport::new(),
            selected: None,
            selected_color: Color::parse_or_default("#e50000"),
            mode: Mode::View,
            area_start: None,
            area_dragging: false,
            area: None,
            total_minted: 0,
            progress: LoadProgress::default(),
            wallet: None,
        }
    }

    fn is_pending(&self, key: CellKey) -> bool {
        self.pending_mints.contains(&key) || self.pending_updates.contains(&key)
    }

    fn is_minted(&self, key: CellKey) -> bool {
        self.pixels.get(&key).map(|cell| cell.minted).unwrap_or(false)
    }

    fn owner_of(&self, key: CellKey) -> Option<Address> {
        self.pixels.get(&key).and_then(|cell| cell.owner)
    }

    fn can_update(&self, key: CellKey) -> bool {
        match (self.wallet, self.owner_of(key)) {
            (Some(wallet), Some(owner)) => wallet == owner,
            _ => false,
        }
    }
}

/// What the view renders from. Rebuilt on every notification via the
/// double buffer, so subscribers never observe a half-applied mutation.
#[derive(Clone)]
pub(crate) struct CanvasSnapshot {
    pub(crate) pixels: HashMap<CellKey, PixelCell>,
    pub(crate) pending_mints: HashSet<CellKey>,
    pub(crate) pending_updates: HashSet<CellKey>,
    pub(crate) drawn: HashMap<CellKey, Color>,
    pub(crate) viewport: Viewport,
    pub(crate) selected: Option<CellKey>,
    pub(crate) selected_color: Color,
    pub(crate) mode: Mode,
    pub(crate) area: Option<Area>,
    pub(crate) total_minted: u64,
    pub(crate) progress: LoadProgress,
    pub(crate) wallet: Option<Address>,
}

impl CanvasSnapshot {
    pub(crate) fn is_minted(&self, x: u32, y: u32) -> bool {
        self.pixels
            .get(&(x, y))
            .map(|cell| cell.minted)
            .unwrap_or(false)
    }

    pub(crate) fn is_pending(&self, x: u32, y: u32) -> bool {
        self.pending_mints.contains(&(x, y)) || self.pending_updates.contains(&(x, y))
    }

    pub(crate) fn owner_of(&self, x: u32, y: u32) -> Option<Address> {
        self.pixels.get(&(x, y)).and_then(|cell| cell.owner)
    }

    /// Render color: authoritative for minted cells, staged/selection
    /// preview for unminted ones, background otherwise.
    pub(crate) fn color_of(&self, x: u32, y: u32) -> Color {
        let key = (x, y);
        if let Some(cell) = self.pixels.get(&key) {
            if cell.minted {
                return cell.color.clone();
            }
        }
        match self.mode {
            Mode::Draw | Mode::Delegate { .. } | Mode::Revoke { .. } => {
                if let Some(color) = self.drawn.get(&key) {
                    return color.clone();
                }
            }
            Mode::View => {
                if self.selected == Some(key) {
                    return self.selected_color.clone();
                }
            }
            Mode::AreaSelect => {}
        }
        Color::default()
    }

    pub(crate) fn can_update(&self, x: u32, y: u32) -> bool {
        match (self.wallet, self.owner_of(x, y)) {
            (Some(wallet), Some(owner)) => wallet == owner,
            _ => false,
        }
    }
}

fn build_snapshot(state: &CanvasState) -> CanvasSnapshot {
    CanvasSnapshot {
        pixels: state.pixels.clone(),
        pending_mints: state.pending_mints.clone(),
        pending_updates: state.pending_updates.clone(),
        drawn: state.drawn.clone(),
        viewport: state.viewport,
        selected: state.selected,
        selected_color: state.selected_color.clone(),
        mode: state.mode,
        area: state.area,
        total_minted: state.total_minted,
        progress: state.progress,
        wallet: state.wallet,
    }
}

fn fill_snapshot(state: &CanvasState, snapshot: &mut CanvasSnapshot) {
    snapshot.pixels.clone_from(&state.pixels);
    snapshot.pending_mints.clone_from(&state.pending_mints);
    snapshot.pending_updates.clone_from(&state.pending_updates);
    snapshot.drawn.clone_from(&state.drawn);
    snapshot.viewport = state.viewport;
    snapshot.selected = state.selected;
    snapshot.selected_color.clone_from(&state.selected_color);
    snapshot.mode = state.mode;
    snapshot.area = state.area;
    snapshot.total_minted = state.total_minted;
    snapshot.progress = state.progress;
    snapshot.wallet = state.wallet;
}

struct SnapshotBuffer {
    front: CanvasSnapshot,
    back: CanvasSnapshot,
}

impl SnapshotBuffer {
    fn new(state: &CanvasState) -> Self {
        let snapshot = build_snapshot(state);
        Self {
            front: snapshot.clone(),
            back: snapshot,
        }
    }

    fn refresh_from_state(&mut self, state: &CanvasState) {
        fill_snapshot(state, &mut self.back);
        std::mem::swap(&mut self.front, &mut self.back);
    }
}

/// Single source of truth for everything the canvas renders.
pub(crate) struct CanvasCore {
    state: RefCell<CanvasState>,
    snapshots: RefCell<SnapshotBuffer>,
    subscribers: Rc<RefCell<Vec<CanvasSubscriber>>>,
}

pub(crate) struct CanvasSubscription {
    subscriber: CanvasSubscriber,
    subscribers: Rc<RefCell<Vec<CanvasSubscriber>>>,
}

impl Drop for CanvasSubscription {
    fn drop(&mut self) {
        self.subscribers
            .borrow_mut()
            .retain(|entry| !Rc::ptr_eq(entry, &self.subscriber));
    }
}

impl CanvasCore {
    pub(crate) fn new() -> Rc<Self> {
        let state = CanvasState::new();
        let snapshots = SnapshotBuffer::new(&state);
        Rc::new(Self {
            state: RefCell::new(state),
            snapshots: RefCell::new(snapshots),
            subscribers: Rc::new(RefCell::new(Vec::new())),
        })
    }

    pub(crate) fn subscribe(&self, subscriber: CanvasSubscriber) -> CanvasSubscription {
        self.subscribers.borrow_mut().push(subscriber.clone());
        CanvasSubscription {
            subscriber,
            subscribers: Rc::clone(&self.subscribers),
        }
    }

    pub(crate) fn snapshot(&self) -> CanvasSnapshot {
        self.snapshots.borrow().front.clone()
    }

    fn notify(&self) {
        {
            let state = self.state.borrow();
            let mut snapshots = self.snapshots.borrow_mut();
            snapshots.refresh_from_state(&state);
        }
        let subscribers = self.subscribers.borrow().clone();
        for subscriber in subscribers {
            (subscriber)();
        }
    }

    fn mutate<R>(&self, mutator: impl FnOnce(&mut CanvasState) -> R) -> R {
        let result = mutator(&mut self.state.borrow_mut());
        self.notify();
        result
    }

    // --- viewport -----------------------------------------------------

    pub(crate) fn viewport(&self) -> Viewport {
        self.state.borrow().viewport
    }

    pub(crate) fn pan(&self, delta_x_px: f64, delta_y_px: f64) -> bool {
        self.mutate(|state| state.viewport.pan(delta_x_px, delta_y_px))
    }

    pub(crate) fn zoom_in(&self, anchor: Option<(f64, f64)>) -> bool {
        self.mutate(|state| state.viewport.zoom_in(anchor))
    }

    pub(crate) fn zoom_out(&self, anchor: Option<(f64, f64)>) -> bool {
        self.mutate(|state| state.viewport.zoom_out(anchor))
    }

    pub(crate) fn jump_to(&self, x: u32, y: u32) {
        self.mutate(|state| state.viewport.jump_to(x, y));
    }

    // --- authoritative writes ----------------------------------------

    /// Merge one range-query page. Pending marks live in their own sets,
    /// so a chunk landing mid-transaction cannot clobber them.
    pub(crate) fn merge_range_page(&self, page: &RangePage) {
        self.mutate(|state| {
            for (key, owner, color) in page.cells() {
                state.pixels.insert(
                    key,
                    PixelCell {
                        color: Color::parse_or_default(color),
                        owner: Some(owner),
                        minted: true,
                    },
                );
            }
        });
    }

    /// Confirmation data from either the event path or the fallback
    /// re-read. Idempotent: applying twice leaves the same state.
    pub(crate) fn apply_authoritative(&self, key: CellKey, color: Color, owner: Address) {
        self.mutate(|state| {
            state.pixels.insert(
                key,
                PixelCell {
                    color,
                    owner: Some(owner),
                    minted: true,
                },
            );
            state.pending_mints.remove(&key);
            state.pending_updates.remove(&key);
        });
    }

    // --- pending marks -----------------------------------------------

    pub(crate) fn mark_pending(&self, mark: PendingMark, cells: &[CellKey]) {
        self.mutate(|state| {
            let set = match mark {
                PendingMark::Mint => &mut state.pending_mints,
                PendingMark::Update => &mut state.pending_updates,
            };
            for key in cells {
                set.insert(*key);
            }
        });
    }

    pub(crate) fn clear_pending(&self, cells: &[CellKey]) {
        self.mutate(|state| {
            for key in cells {
                state.pending_mints.remove(key);
                state.pending_updates.remove(key);
            }
        });
    }

    pub(crate) fn clear_all_pending(&self) {
        self.mutate(|state| {
            state.pending_mints.clear();
            state.pending_updates.clear();
        });
    }

    pub(crate) fn is_pending(&self, key: CellKey) -> bool {
        self.state.borrow().is_pending(key)
    }

    pub(crate) fn is_minted(&self, key: CellKey) -> bool {
        self.state.borrow().is_minted(key)
    }

    pub(crate) fn owner_of(&self, key: CellKey) -> Option<Address> {
        self.state.borrow().owner_of(key)
    }

    pub(crate) fn can_update(&self, key: CellKey) -> bool {
        self.state.borrow().can_update(key)
    }

    // --- wallet / counters -------------------------------------------

    pub(crate) fn set_wallet(&self, wallet: Option<Address>) {
        self.mutate(|state| state.wallet = wallet);
    }

    pub(crate) fn wallet(&self) -> Option<Address> {
        self.state.borrow().wallet
    }

    pub(crate) fn set_total_minted(&self, total: u64) {
        self.mutate(|state| state.total_minted = total);
    }

    pub(crate) fn bump_total_minted(&self) {
        self.mutate(|state| state.total_minted += 1);
    }

    // --- selection / modes -------------------------------------------

    pub(crate) fn select(&self, cell: Option<CellKey>) {
        self.mutate(|state| state.selected = cell);
    }

    pub(crate) fn selected(&self) -> Option<CellKey> {
        self.state.borrow().selected
    }

    pub(crate) fn set_selected_color(&self, color: Color) {
        self.mutate(|state| state.selected_color = color);
    }

    pub(crate) fn selected_color(&self) -> Color {
        self.state.borrow().selected_color.clone()
    }

    pub(crate) fn mode(&self) -> Mode {
        self.state.borrow().mode
    }

    /// Mode transitions clear whatever staging the old mode owned.
    pub(crate) fn set_mode(&self, mode: Mode) {
        self.mutate(|state| {
            if state.mode == mode {
                return;
            }
            state.drawn.clear();
            state.area = None;
            state.area_start = None;
            state.area_dragging = false;
            if matches!(mode, Mode::Draw | Mode::AreaSelect) {
                state.selected = None;
            }
            state.mode = mode;
        });
    }

    /// Used by the tracker when a confirmed delegate/revoke auto-closes
    /// its mode UI.
    pub(crate) fn reset_mode_ui(&self) {
        self.mutate(|state| {
            state.mode = Mode::View;
            state.drawn.clear();
            state.area = None;
            state.area_start = None;
            state.area_dragging = false;
            state.selected = None;
        });
    }

    // --- staging ------------------------------------------------------

    /// Draw-mode click: toggle a cell in the staged set. Cells with an
    /// in-flight transaction cannot be staged.
    pub(crate) fn stage_toggle(&self, key: CellKey) -> StageOutcome {
        self.mutate(|state| {
            if state.drawn.contains_key(&key) {
                state.drawn.remove(&key);
                return StageOutcome::Removed;
            }
            if state.is_pending(key) {
                return StageOutcome::RejectedPending;
            }
            let color = state.selected_color.clone();
            state.drawn.insert(key, color);
            StageOutcome::Added
        })
    }

    pub(crate) fn clear_drawn(&self) {
        self.mutate(|state| state.drawn.clear());
    }

    pub(crate) fn drawn_cells(&self) -> Vec<(CellKey, Color)> {
        let state = self.state.borrow();
        let mut cells: Vec<_> = state
            .drawn
            .iter()
            .map(|(key, color)| (*key, color.clone()))
            .collect();
        cells.sort_by_key(|(key, _)| (key.1, key.0));
        cells
    }

    /// Stage every owned cell inside `area` with a highlight color.
    /// Returns how many were staged.
    pub(crate) fn stage_owned_in_area(&self, area: Area, highlight: Color) -> usize {
        self.mutate(|state| {
            state.drawn.clear();
            let mut staged = 0;
            for key in area.cells() {
                if state.can_update(key) {
                    state.drawn.insert(key, highlight.clone());
                    staged += 1;
                }
            }
            staged
        })
    }

    /// Staged cells eligible for a batch mint: unminted and not pending.
    /// Already-minted cells are silently excluded.
    pub(crate) fn batch_mint_candidates(&self) -> Vec<(CellKey, Color)> {
        let state = self.state.borrow();
        let mut cells: Vec<_> = state
            .drawn
            .iter()
            .filter(|(key, _)| !state.is_minted(**key) && !state.is_pending(**key))
            .map(|(key, color)| (*key, color.clone()))
            .collect();
        cells.sort_by_key(|(key, _)| (key.1, key.0));
        cells
    }

    /// Staged cells eligible for a batch color update: minted and not
    /// pending. Authorization is the contract's call.
    pub(crate) fn batch_update_candidates(&self) -> Vec<(CellKey, Color)> {
        let state = self.state.borrow();
        let mut cells: Vec<_> = state
            .drawn
            .iter()
            .filter(|(key, _)| state.is_minted(**key) && !state.is_pending(**key))
            .map(|(key, color)| (*key, color.clone()))
            .collect();
        cells.sort_by_key(|(key, _)| (key.1, key.0));
        cells
    }

    pub(crate) fn owned_cells_in_area(&self, area: Area) -> Vec<CellKey> {
        let state = self.state.borrow();
        area.cells().filter(|key| state.can_update(*key)).collect()
    }

    // --- area selection ----------------------------------------------

    pub(crate) fn begin_area(&self, key: CellKey) {
        self.mutate(|state| {
            state.area_start = Some(key);
            state.area_dragging = true;
            state.area = Some(Area::normalized(key, key));
        });
    }

    pub(crate) fn update_area(&self, key: CellKey) {
        self.mutate(|state| {
            if !state.area_dragging {
                return;
            }
            if let Some(start) = state.area_start {
                state.area = Some(Area::normalized(start, key));
            }
        });
    }

    pub(crate) fn end_area(&self, key: CellKey) -> Option<Area> {
        self.mutate(|state| {
            if !state.area_dragging {
                return None;
            }
            state.area_dragging = false;
            let start = state.area_start?;
            let area = Area::normalized(start, key);
            state.area = Some(area);
            Some(area)
        })
    }

    pub(crate) fn area_dragging(&self) -> bool {
        self.state.borrow().area_dragging
    }

    pub(crate) fn clear_area(&self) {
        self.mutate(|state| {
            state.area = None;
            state.area_start = None;
            state.area_dragging = false;
        });
    }

    pub(crate) fn area(&self) -> Option<Area> {
        self.state.borrow().area
    }

    // --- load progress -----------------------------------------------

    pub(crate) fn begin_load(&self, total: usize) {
        self.mutate(|state| {
            state.progress = LoadProgress {
                current: 0,
                total,
                active: true,
            };
        });
    }

    pub(crate) fn progress_tick(&self) {
        self.mutate(|state| {
            state.progress.current = (state.progress.current + 1).min(state.progress.total);
        });
    }

    pub(crate) fn end_load(&self) {
        self.mutate(|state| state.progress.active = false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pikuseru_core::abi::{encode_tokens, Token};
    use pikuseru_core::pxnft::decode;

    fn owner(tag: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = tag;
        Address::from_bytes(bytes)
    }

    fn color(value: &str) -> Color {
        Color::parse(value).unwrap()
    }

    fn range_page(entries: &[(u64, Address, &str)]) -> RangePage {
        let payload = encode_tokens(&[
            Token::UintArray(entries.iter().map(|(id, _, _)| u128::from(*id)).collect()),
            Token::AddressArray(entries.iter().map(|(_, owner, _)| *owner).collect()),
            Token::StrArray(entries.iter().map(|(_, _, c)| (*c).to_string()).collect()),
        ]);
        decode::range_page(&payload).unwrap()
    }

    #[test]
    fn chunk_merge_preserves_pending_marks() {
        let core = CanvasCore::new();
        core.mark_pending(PendingMark::Mint, &[(10, 20)]);
        core.merge_range_page(&range_page(&[(3010, owner(1), "#e50000")]));

        assert!(core.is_pending((10, 20)));
        assert!(core.is_minted((10, 20)));
        let snapshot = core.snapshot();
        assert_eq!(snapshot.color_of(10, 20), color("#e50000"));
        assert_eq!(snapshot.owner_of(10, 20), Some(owner(1)));
    }

    #[test]
    fn authoritative_apply_clears_pending() {
        let core = CanvasCore::new();
        core.mark_pending(PendingMark::Mint, &[(10, 20)]);
        core.apply_authoritative((10, 20), color("#0000ea"), owner(2));

        assert!(!core.is_pending((10, 20)));
        assert!(core.is_minted((10, 20)));
        assert_eq!(core.owner_of((10, 20)), Some(owner(2)));

        // Second application (event after fallback) is a no-op.
        core.apply_authoritative((10, 20), color("#0000ea"), owner(2));
        assert_eq!(core.snapshot().color_of(10, 20), color("#0000ea"));
    }

    #[test]
    fn failure_rollback_restores_last_authoritative_state() {
        let core = CanvasCore::new();
        core.merge_range_page(&range_page(&[(3010, owner(1), "#e50000")]));
        core.mark_pending(PendingMark::Update, &[(10, 20)]);
        assert!(core.is_pending((10, 20)));

        core.clear_pending(&[(10, 20)]);
        assert!(!core.is_pending((10, 20)));
        assert_eq!(core.snapshot().color_of(10, 20), color("#e50000"));
    }

    #[test]
    fn batch_mint_excludes_minted_and_pending_cells() {
        let core = CanvasCore::new();
        core.set_mode(Mode::Draw);
        core.merge_range_page(&range_page(&[(3010, owner(1), "#e50000")]));

        // Stage three cells, one of which is already minted.
        assert_eq!(core.stage_toggle((10, 20)), StageOutcome::Added);
        assert_eq!(core.stage_toggle((11, 20)), StageOutcome::Added);
        assert_eq!(core.stage_toggle((12, 20)), StageOutcome::Added);

        let candidates = core.batch_mint_candidates();
        assert_eq!(
            candidates.iter().map(|(key, _)| *key).collect::<Vec<_>>(),
            vec![(11, 20), (12, 20)]
        );

        // The minted one is what a batch update would submit.
        let updates = core.batch_update_candidates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, (10, 20));
    }

    #[test]
    fn staging_rejects_pending_cells() {
        let core = CanvasCore::new();
        core.set_mode(Mode::Draw);
        core.mark_pending(PendingMark::Mint, &[(5, 5)]);
        assert_eq!(core.stage_toggle((5, 5)), StageOutcome::RejectedPending);
        assert!(core.drawn_cells().is_empty());
    }

    #[test]
    fn area_staging_selects_owned_cells_only() {
        let core = CanvasCore::new();
        core.set_wallet(Some(owner(7)));
        core.merge_range_page(&range_page(&[
            (3010, owner(7), "#e50000"),
            (3011, owner(9), "#0000ea"),
        ]));

        let area = Area::normalized((10, 20), (12, 20));
        let staged = core.stage_owned_in_area(area, color(DELEGATE_HIGHLIGHT));
        assert_eq!(staged, 1);
        assert_eq!(core.owned_cells_in_area(area), vec![(10, 20)]);
    }

    #[test]
    fn mode_change_clears_staging() {
        let core = CanvasCore::new();
        core.set_mode(Mode::Draw);
        core.stage_toggle((1, 1));
        assert_eq!(core.drawn_cells().len(), 1);

        core.set_mode(Mode::Delegate { batch: true });
        assert!(core.drawn_cells().is_empty());

        core.reset_mode_ui();
        assert_eq!(core.mode(), Mode::View);
    }

    #[test]
    fn area_selection_normalizes_and_finishes() {
        let core = CanvasCore::new();
        core.set_mode(Mode::AreaSelect);
        core.begin_area((12, 4));
        core.update_area((10, 6));
        let area = core.end_area((10, 6)).unwrap();
        assert_eq!(area, Area { x0: 10, y0: 4, x1: 12, y1: 6 });
        assert!(!core.area_dragging());
        assert_eq!(area.cells().count(), 9);
        assert!(area.contains(11, 5));
    }

    #[test]
    fn unminted_cells_render_previews_then_background() {
        let core = CanvasCore::new();
        core.set_selected_color(color("#02be01"));
        core.select(Some((3, 3)));
        let snapshot = core.snapshot();
        assert_eq!(snapshot.color_of(3, 3), color("#02be01"));
        assert_eq!(snapshot.color_of(4, 4), Color::default());
    }

    #[test]
    fn viewport_mutations_notify_subscribers() {
        let core = CanvasCore::new();
        let seen = Rc::new(std::cell::Cell::new(0));
        let observed = seen.clone();
        let _subscription = core.subscribe(Rc::new(move || observed.set(observed.get() + 1)));

        assert!(core.zoom_out(None));
        core.jump_to(75, 75);
        assert!(seen.get() >= 2);
        assert_eq!(core.viewport().size, 15);
    }
}
