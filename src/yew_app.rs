use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, MouseEvent, TouchEvent, WheelEvent};
use yew::prelude::*;

use pikuseru_core::viewport::{PAN_THRESHOLD_PX, PINCH_THRESHOLD_PX};
use pikuseru_core::{
    cell_id, Address, CellKey, Color, OpKind, CANVAS_CELLS, CANVAS_HEIGHT, CANVAS_WIDTH, PALETTE,
};

use crate::app_core::{
    CanvasCore, CanvasSnapshot, CanvasSubscription, Mode, StageOutcome, DELEGATE_HIGHLIGHT,
    REVOKE_HIGHLIGHT,
};
use crate::chain_events::EventWatcher;
use crate::chunk_loader::{driver as loader_driver, ChunkLoader};
use crate::config::{self, AppConfig};
use crate::contract::PxnftContract;
use crate::indexer::{self, ResponseCache, TokenFilter};
use crate::notifications::{NoticeKind, NotificationStore};
use crate::rpc::RpcClient;
use crate::timers::{self, TimerHandle};
use crate::tx_tracker::TxTracker;
use crate::wallet;

const AUTH_CHECK_DEBOUNCE_MS: u32 = 500;
const WHEEL_DEAD_ZONE: f64 = 10.0;

struct AppRuntime {
    config: AppConfig,
    core: Rc<CanvasCore>,
    notices: Rc<NotificationStore>,
    loader: Rc<ChunkLoader>,
    contract: Rc<PxnftContract>,
    tracker: Rc<TxTracker>,
    _events: Rc<EventWatcher>,
    nft_cache: Rc<ResponseCache>,
    backend_healthy: Rc<std::cell::Cell<bool>>,
    _core_subscription: CanvasSubscription,
}

fn init_runtime(on_change: Rc<dyn Fn()>) -> AppRuntime {
    let config = config::load();
    let core = CanvasCore::new();
    let notices = NotificationStore::new();
    let loader = ChunkLoader::new();
    let rpc = Rc::new(RpcClient::new(config.rpc_url.clone()));
    let contract = PxnftContract::new(rpc.clone(), config.contract_address.clone());
    let tracker = TxTracker::new(core.clone(), notices.clone(), contract.clone(), rpc.clone());
    let events = EventWatcher::new(core.clone(), contract.clone(), rpc, tracker.clone());

    let prefs = config::load_prefs();
    if let Some((x, y)) = prefs.last_position {
        core.jump_to(x, y);
    }

    let subscription = core.subscribe(on_change.clone());
    notices.subscribe(on_change);

    loader_driver::load_now(&loader, &core, &contract);
    events.start();
    {
        let tracker = tracker.clone();
        spawn_local(async move {
            tracker.refresh_total_minted().await;
        });
    }
    let backend_healthy = Rc::new(std::cell::Cell::new(false));
    {
        let flag = backend_healthy.clone();
        let config = config.clone();
        spawn_local(async move {
            flag.set(config::backend_healthy(&config).await);
        });
    }

    AppRuntime {
        config,
        core,
        notices,
        loader,
        contract,
        tracker,
        _events: events,
        nft_cache: Rc::new(ResponseCache::new()),
        backend_healthy,
        _core_subscription: subscription,
    }
}

#[derive(Clone, Copy, Default)]
struct DragState {
    dragging: bool,
    last: (f64, f64),
    pinching: bool,
    pinch_distance: f64,
}

#[derive(Clone, PartialEq)]
struct PixelStatus {
    cell: CellKey,
    is_owner: bool,
    is_authorized: bool,
    checking: bool,
    fee: u128,
    has_exemption: bool,
    approval_count: u64,
    approved: Vec<Address>,
}

#[derive(Clone, Copy, PartialEq)]
struct BatchFeeInfo {
    total_fee: u128,
    authorized: usize,
    unauthorized: usize,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Gallery,
    MyPixels,
    MyComposites,
}

pub(crate) fn parse_addresses(raw: &str) -> Result<Vec<Address>, String> {
    let mut out = Vec::new();
    for part in raw.split(|ch: char| ch == ',' || ch.is_whitespace()) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match Address::parse(part) {
            Ok(address) => out.push(address),
            Err(_) => return Err(format!("Invalid address: {part}")),
        }
    }
    Ok(out)
}

fn touch_distance(event: &TouchEvent) -> Option<f64> {
    let touches = event.touches();
    if touches.length() != 2 {
        return None;
    }
    let a = touches.get(0)?;
    let b = touches.get(1)?;
    let dx = f64::from(a.client_x() - b.client_x());
    let dy = f64::from(a.client_y() - b.client_y());
    Some((dx * dx + dy * dy).sqrt())
}

fn world_anchor(
    event_x: f64,
    event_y: f64,
    target: &web_sys::Element,
    snapshot: &CanvasSnapshot,
) -> (f64, f64) {
    let rect = target.get_bounding_client_rect();
    let view = snapshot.viewport;
    let fx = ((event_x - rect.left()) / rect.width().max(1.0)).clamp(0.0, 1.0);
    let fy = ((event_y - rect.top()) / rect.height().max(1.0)).clamp(0.0, 1.0);
    (
        view.x as f64 + fx * view.size as f64,
        view.y as f64 + fy * view.size as f64,
    )
}

fn mon_label(fee: u128) -> String {
    format!("{} MON", fee as f64 / 1e18)
}

/// Indexer images go stale after color updates; re-read them from the
/// contract, fall back to tokenURI metadata, and annotate composites with
/// their member geometry.
async fn enrich_items(
    contract: &Rc<PxnftContract>,
    kind: ListKind,
    items: &mut [indexer::NftItem],
) {
    if items.is_empty() {
        return;
    }
    let ids: Vec<u64> = items.iter().map(|item| item.token_id).collect();
    if let Ok((images, exists)) = contract.batch_token_images(&ids).await {
        for (index, item) in items.iter_mut().enumerate() {
            if exists.get(index).copied().unwrap_or(false) {
                if let Some(image) = images.get(index) {
                    if !image.is_empty() {
                        item.image = image.clone();
                    }
                }
            }
        }
    }
    for item in items.iter_mut() {
        if item.image.is_empty() {
            if let Ok(uri) = contract.token_uri(item.token_id).await {
                if let Ok(metadata) = indexer::decode_metadata(&uri) {
                    item.image = metadata.image;
                    if item.description.is_empty() {
                        item.description = metadata.description;
                    }
                }
            }
        }
    }
    if kind == ListKind::MyComposites {
        for item in items.iter_mut() {
            if let Ok(info) = contract.composition_info(item.token_id).await {
                item.description = format!(
                    "{} pixels, ({}, {}) to ({}, {})",
                    info.token_ids.len(),
                    info.min_x,
                    info.min_y,
                    info.max_x,
                    info.max_y
                );
            }
        }
    }
}

#[function_component(App)]
pub(crate) fn app() -> Html {
    let update = use_force_update();
    let runtime = {
        let update = update.clone();
        use_mut_ref(move || init_runtime(Rc::new(move || update.force_update())))
    };
    let (config, core, notices, loader, contract, tracker) = {
        let rt = runtime.borrow();
        (
            rt.config.clone(),
            rt.core.clone(),
            rt.notices.clone(),
            rt.loader.clone(),
            rt.contract.clone(),
            rt.tracker.clone(),
        )
    };
    let snapshot = core.snapshot();

    let drag = use_mut_ref(DragState::default);
    let show_sidebar = use_state(|| config::load_prefs().show_sidebar.unwrap_or(true));
    let hex_input = use_state(String::new);
    let position_input = use_state(|| (String::new(), String::new()));
    let operator_input = use_state(String::new);
    let pixel_status: UseStateHandle<Option<PixelStatus>> = use_state(|| None);
    let batch_fee: UseStateHandle<Option<BatchFeeInfo>> = use_state(|| None);
    let batch_fee_timer: Rc<RefCell<Option<TimerHandle>>> = use_mut_ref(|| None);
    let nft_list: UseStateHandle<Option<(ListKind, Vec<indexer::NftItem>)>> = use_state(|| None);

    // Authorization/fee lookup for the selected pixel.
    {
        let contract = contract.clone();
        let core = core.clone();
        let pixel_status = pixel_status.clone();
        use_effect_with(snapshot.selected, move |selected| {
            let Some(cell) = *selected else {
                pixel_status.set(None);
                return;
            };
            let Some(wallet) = core.wallet() else {
                pixel_status.set(None);
                return;
            };
            let is_owner = core.owner_of(cell) == Some(wallet);
            pixel_status.set(Some(PixelStatus {
                cell,
                is_owner,
                is_authorized: is_owner,
                checking: !is_owner,
                fee: 0,
                has_exemption: false,
                approval_count: 0,
                approved: Vec::new(),
            }));
            spawn_local(async move {
                let (x, y) = cell;
                let authorized = if is_owner {
                    true
                } else {
                    contract
                        .is_pixel_authorized(x, y, wallet)
                        .await
                        .unwrap_or(false)
                };
                let exemption = contract.has_exemption(wallet).await.unwrap_or(false);
                let fee = if is_owner || authorized || exemption {
                    0
                } else {
                    contract
                        .update_fee(x, y, wallet)
                        .await
                        .map(|(fee, requires)| if requires { fee } else { 0 })
                        .unwrap_or(0)
                };
                let approval_count = contract.approval_count(x, y).await.unwrap_or(0);
                let approved = if approval_count > 0 {
                    contract.approved_addresses(x, y).await.unwrap_or_default()
                } else {
                    Vec::new()
                };
                pixel_status.set(Some(PixelStatus {
                    cell,
                    is_owner,
                    is_authorized: authorized,
                    checking: false,
                    fee,
                    has_exemption: exemption,
                    approval_count,
                    approved,
                }));
            });
        });
    }

    // Debounced fee/authorization summary for the staged batch.
    {
        let contract = contract.clone();
        let core = core.clone();
        let batch_fee = batch_fee.clone();
        let batch_fee_timer = batch_fee_timer.clone();
        let staged_len = snapshot.drawn.len();
        let in_draw_mode = snapshot.mode == Mode::Draw;
        use_effect_with((staged_len, in_draw_mode), move |_| {
            if !in_draw_mode || staged_len == 0 {
                batch_fee.set(None);
                return;
            }
            let timer = timers::schedule(AUTH_CHECK_DEBOUNCE_MS, move || {
                let Some(wallet) = core.wallet() else {
                    return;
                };
                let candidates = core.batch_update_candidates();
                if candidates.is_empty() {
                    batch_fee.set(None);
                    return;
                }
                let cells: Vec<CellKey> = candidates.iter().map(|(key, _)| *key).collect();
                spawn_local(async move {
                    match contract.batch_update_fee(&cells, wallet).await {
                        Ok((total_fee, unauthorized)) => {
                            let unauthorized = unauthorized as usize;
                            batch_fee.set(Some(BatchFeeInfo {
                                total_fee,
                                authorized: cells.len().saturating_sub(unauthorized),
                                unauthorized,
                            }));
                        }
                        Err(_) => batch_fee.set(None),
                    }
                });
            });
            *batch_fee_timer.borrow_mut() = Some(timer);
        });
    }

    // --- pointer handling on the canvas ------------------------------

    let on_mouse_down = {
        let drag = drag.clone();
        Callback::from(move |event: MouseEvent| {
            let mut drag = drag.borrow_mut();
            drag.dragging = true;
            drag.last = (f64::from(event.client_x()), f64::from(event.client_y()));
        })
    };

    let on_mouse_move = {
        let drag = drag.clone();
        let core = core.clone();
        let loader = loader.clone();
        let contract = contract.clone();
        Callback::from(move |event: MouseEvent| {
            let mut drag = drag.borrow_mut();
            if !drag.dragging {
                return;
            }
            let (x, y) = (f64::from(event.client_x()), f64::from(event.client_y()));
            let delta = (x - drag.last.0, y - drag.last.1);
            if delta.0.abs() < PAN_THRESHOLD_PX && delta.1.abs() < PAN_THRESHOLD_PX {
                return;
            }
            if core.pan(delta.0, delta.1) {
                loader_driver::request_load(&loader, &core, &contract);
            }
            drag.last = (x, y);
        })
    };

    let on_mouse_up = {
        let drag = drag.clone();
        Callback::from(move |_: MouseEvent| {
            drag.borrow_mut().dragging = false;
        })
    };

    let on_wheel = {
        let core = core.clone();
        let loader = loader.clone();
        let contract = contract.clone();
        Callback::from(move |event: WheelEvent| {
            event.prevent_default();
            let Some(target) = event
                .current_target()
                .and_then(|target| target.dyn_into::<web_sys::Element>().ok())
            else {
                return;
            };
            let anchor = world_anchor(
                f64::from(event.client_x()),
                f64::from(event.client_y()),
                &target,
                &core.snapshot(),
            );
            let moved = if event.delta_y() < -WHEEL_DEAD_ZONE {
                core.zoom_in(Some(anchor))
            } else if event.delta_y() > WHEEL_DEAD_ZONE {
                core.zoom_out(Some(anchor))
            } else {
                false
            };
            if moved {
                loader_driver::request_load(&loader, &core, &contract);
            }
        })
    };

    let on_touch_start = {
        let drag = drag.clone();
        Callback::from(move |event: TouchEvent| {
            let mut drag = drag.borrow_mut();
            if let Some(distance) = touch_distance(&event) {
                drag.pinching = true;
                drag.dragging = false;
                drag.pinch_distance = distance;
            } else if let Some(touch) = event.touches().get(0) {
                drag.dragging = true;
                drag.last = (f64::from(touch.client_x()), f64::from(touch.client_y()));
            }
        })
    };

    let on_touch_move = {
        let drag = drag.clone();
        let core = core.clone();
        let loader = loader.clone();
        let contract = contract.clone();
        Callback::from(move |event: TouchEvent| {
            event.prevent_default();
            let mut drag = drag.borrow_mut();
            if drag.pinching {
                let Some(distance) = touch_distance(&event) else {
                    return;
                };
                if drag.pinch_distance > 0.0 {
                    let delta = distance - drag.pinch_distance;
                    if delta.abs() > PINCH_THRESHOLD_PX {
                        let moved = if delta > 0.0 {
                            core.zoom_in(None)
                        } else {
                            core.zoom_out(None)
                        };
                        if moved {
                            loader_driver::request_load(&loader, &core, &contract);
                        }
                    }
                }
                drag.pinch_distance = distance;
                return;
            }
            if !drag.dragging {
                return;
            }
            let Some(touch) = event.touches().get(0) else {
                return;
            };
            let (x, y) = (f64::from(touch.client_x()), f64::from(touch.client_y()));
            let delta = (x - drag.last.0, y - drag.last.1);
            if delta.0.abs() < PAN_THRESHOLD_PX && delta.1.abs() < PAN_THRESHOLD_PX {
                return;
            }
            if core.pan(delta.0, delta.1) {
                loader_driver::request_load(&loader, &core, &contract);
            }
            drag.last = (x, y);
        })
    };

    let on_touch_end = {
        let drag = drag.clone();
        Callback::from(move |_: TouchEvent| {
            let mut drag = drag.borrow_mut();
            drag.dragging = false;
            drag.pinching = false;
            drag.pinch_distance = 0.0;
        })
    };

    // --- cell interaction --------------------------------------------

    let on_cell_click = {
        let core = core.clone();
        let notices = notices.clone();
        Callback::from(move |key: CellKey| {
            let mode = core.mode();
            match mode {
                Mode::View => {
                    core.select(Some(key));
                }
                Mode::Draw => {
                    core.select(Some(key));
                    if core.stage_toggle(key) == StageOutcome::RejectedPending {
                        notices.info(
                            "Pixel Pending",
                            format!("Pixel ({}, {}) has a pending transaction", key.0, key.1),
                            None,
                        );
                    }
                }
                Mode::AreaSelect => {
                    if core.area_dragging() {
                        core.end_area(key);
                    } else {
                        core.begin_area(key);
                    }
                }
                Mode::Delegate { batch: true } | Mode::Revoke { batch: true } => {
                    if core.area_dragging() {
                        if let Some(area) = core.end_area(key) {
                            let highlight = if matches!(mode, Mode::Delegate { .. }) {
                                DELEGATE_HIGHLIGHT
                            } else {
                                REVOKE_HIGHLIGHT
                            };
                            let staged = core
                                .stage_owned_in_area(area, Color::parse_or_default(highlight));
                            if staged > 0 {
                                notices.info(
                                    "Pixels Selected",
                                    format!("Selected {staged} owned pixels"),
                                    None,
                                );
                            } else {
                                notices.info(
                                    "No Owned Pixels",
                                    "No pixels you own were found in the selected area",
                                    None,
                                );
                            }
                        }
                    } else {
                        core.begin_area(key);
                    }
                }
                Mode::Delegate { batch: false } | Mode::Revoke { batch: false } => {
                    core.select(Some(key));
                    if !core.can_update(key) {
                        let verb = if matches!(mode, Mode::Delegate { .. }) {
                            "delegate"
                        } else {
                            "revoke access from"
                        };
                        notices
                            .error("Not Owner", format!("You can only {verb} pixels you own"));
                    }
                }
            }
        })
    };

    let on_cell_hover = {
        let core = core.clone();
        Callback::from(move |key: CellKey| {
            if core.area_dragging() {
                core.update_area(key);
            }
        })
    };

    // --- header actions ----------------------------------------------

    let on_connect = {
        let core = core.clone();
        let notices = notices.clone();
        Callback::from(move |_: MouseEvent| {
            if !wallet::has_provider() {
                notices.error("No Wallet", "No wallet provider found in this browser");
                return;
            }
            let core = core.clone();
            let notices = notices.clone();
            spawn_local(async move {
                match wallet::connect().await {
                    Ok(address) => {
                        core.set_wallet(Some(address));
                        notices.success("Connected", address.short(), None);
                    }
                    Err(err) => notices.error("Connection Failed", err.to_string()),
                }
            });
        })
    };

    let zoom = |direction: i32| {
        let core = core.clone();
        let loader = loader.clone();
        let contract = contract.clone();
        Callback::from(move |_: MouseEvent| {
            let moved = if direction < 0 {
                core.zoom_in(None)
            } else {
                core.zoom_out(None)
            };
            if moved {
                loader_driver::request_load(&loader, &core, &contract);
            }
        })
    };
    let on_zoom_in = zoom(-1);
    let on_zoom_out = zoom(1);

    let set_mode = |mode: Mode| {
        let core = core.clone();
        Callback::from(move |_: MouseEvent| {
            let next = if core.mode() == mode { Mode::View } else { mode };
            core.set_mode(next);
        })
    };
    let on_toggle_draw = set_mode(Mode::Draw);
    let on_toggle_area = set_mode(Mode::AreaSelect);
    let on_toggle_delegate = set_mode(Mode::Delegate { batch: false });
    let on_toggle_delegate_batch = set_mode(Mode::Delegate { batch: true });
    let on_toggle_revoke = set_mode(Mode::Revoke { batch: false });
    let on_toggle_revoke_batch = set_mode(Mode::Revoke { batch: true });

    let on_position_x = {
        let position_input = position_input.clone();
        Callback::from(move |event: InputEvent| {
            let input: HtmlInputElement = event.target_unchecked_into();
            position_input.set((input.value(), (*position_input).1.clone()));
        })
    };
    let on_position_y = {
        let position_input = position_input.clone();
        Callback::from(move |event: InputEvent| {
            let input: HtmlInputElement = event.target_unchecked_into();
            position_input.set(((*position_input).0.clone(), input.value()));
        })
    };
    let on_position_go = {
        let core = core.clone();
        let loader = loader.clone();
        let contract = contract.clone();
        let notices = notices.clone();
        let position_input = position_input.clone();
        Callback::from(move |_: MouseEvent| {
            let (raw_x, raw_y) = (*position_input).clone();
            match (raw_x.trim().parse::<u32>(), raw_y.trim().parse::<u32>()) {
                (Ok(x), Ok(y)) if x < CANVAS_WIDTH && y < CANVAS_HEIGHT => {
                    core.jump_to(x, y);
                    core.select(Some((x, y)));
                    config::update_prefs(|prefs| prefs.last_position = Some((x, y)));
                    loader_driver::request_load(&loader, &core, &contract);
                }
                _ => {
                    notices.error(
                        "Invalid Position",
                        format!(
                            "Enter coordinates within 0-{} and 0-{}",
                            CANVAS_WIDTH - 1,
                            CANVAS_HEIGHT - 1
                        ),
                    );
                }
            }
        })
    };

    // --- sidebar actions ---------------------------------------------

    let on_pick_color = {
        let core = core.clone();
        Callback::from(move |value: String| {
            core.set_selected_color(Color::parse_or_default(&value));
        })
    };

    let on_hex_input = {
        let hex_input = hex_input.clone();
        Callback::from(move |event: InputEvent| {
            let input: HtmlInputElement = event.target_unchecked_into();
            hex_input.set(input.value());
        })
    };
    let on_hex_apply = {
        let core = core.clone();
        let notices = notices.clone();
        let hex_input = hex_input.clone();
        Callback::from(move |_: MouseEvent| match Color::parse(&hex_input) {
            Ok(color) => {
                core.set_selected_color(color);
                hex_input.set(String::new());
            }
            Err(err) => notices.error("Invalid Color", err.to_string()),
        })
    };

    let on_mint = {
        let core = core.clone();
        let tracker = tracker.clone();
        Callback::from(move |_: MouseEvent| {
            if let Some((x, y)) = core.selected() {
                tracker.submit_mint(x, y);
            }
        })
    };
    let on_update = {
        let core = core.clone();
        let tracker = tracker.clone();
        Callback::from(move |_: MouseEvent| {
            if let Some((x, y)) = core.selected() {
                tracker.submit_update(x, y);
            }
        })
    };
    let on_batch_mint = {
        let tracker = tracker.clone();
        Callback::from(move |_: MouseEvent| tracker.submit_batch_mint())
    };
    let on_batch_update = {
        let tracker = tracker.clone();
        Callback::from(move |_: MouseEvent| tracker.submit_batch_update())
    };
    let on_clear_drawn = {
        let core = core.clone();
        let batch_fee = batch_fee.clone();
        Callback::from(move |_: MouseEvent| {
            core.clear_drawn();
            batch_fee.set(None);
        })
    };
    let on_compose = {
        let core = core.clone();
        let tracker = tracker.clone();
        Callback::from(move |_: MouseEvent| {
            if let Some(area) = core.area() {
                tracker.submit_compose(area);
            }
        })
    };

    let on_operator_input = {
        let operator_input = operator_input.clone();
        Callback::from(move |event: InputEvent| {
            let input: HtmlInputElement = event.target_unchecked_into();
            operator_input.set(input.value());
        })
    };
    let submit_approval = |kind: OpKind| {
        let core = core.clone();
        let tracker = tracker.clone();
        let notices = notices.clone();
        let operator_input = operator_input.clone();
        Callback::from(move |_: MouseEvent| {
            let operators = match parse_addresses(&operator_input) {
                Ok(list) => list,
                Err(message) => {
                    notices.error("Invalid Address", message);
                    return;
                }
            };
            let cells: Vec<CellKey> = match core.mode() {
                Mode::Delegate { batch: true } | Mode::Revoke { batch: true } => core
                    .drawn_cells()
                    .into_iter()
                    .map(|(key, _)| key)
                    .collect(),
                _ => core.selected().into_iter().collect(),
            };
            if kind == OpKind::Delegate {
                tracker.submit_delegate(cells, operators);
            } else {
                tracker.submit_revoke(cells, operators);
            }
            operator_input.set(String::new());
        })
    };
    let on_delegate_submit = submit_approval(OpKind::Delegate);
    let on_revoke_submit = submit_approval(OpKind::Revoke);

    let on_toggle_sidebar = {
        let show_sidebar = show_sidebar.clone();
        Callback::from(move |_: MouseEvent| {
            let next = !*show_sidebar;
            show_sidebar.set(next);
            config::update_prefs(|prefs| prefs.show_sidebar = Some(next));
        })
    };

    let load_list = |kind: ListKind| {
        let runtime = runtime.clone();
        let core = core.clone();
        let contract = contract.clone();
        let notices = notices.clone();
        let nft_list = nft_list.clone();
        Callback::from(move |_: MouseEvent| {
            let wallet = core.wallet();
            if kind != ListKind::Gallery && wallet.is_none() {
                notices.error("Not Connected", "Please connect your wallet first");
                return;
            }
            let (config, cache, healthy) = {
                let rt = runtime.borrow();
                (
                    rt.config.clone(),
                    rt.nft_cache.clone(),
                    rt.backend_healthy.get(),
                )
            };
            if !healthy {
                notices.error("Service Unavailable", "NFT listing backend is not reachable");
                return;
            }
            let (cache_kind, filter) = match kind {
                ListKind::Gallery => ("minted", TokenFilter::Pixels),
                ListKind::MyPixels => ("user", TokenFilter::Pixels),
                ListKind::MyComposites => ("user", TokenFilter::Composites),
            };
            let key_owner = if kind == ListKind::Gallery {
                None
            } else {
                wallet.as_ref()
            };
            let key = ResponseCache::key(cache_kind, key_owner, filter);
            if let Some(items) = cache.get(&key, timers::now_ms()) {
                nft_list.set(Some((kind, items)));
                return;
            }
            let nft_list = nft_list.clone();
            let notices = notices.clone();
            let contract = contract.clone();
            spawn_local(async move {
                let fetched = match kind {
                    ListKind::Gallery => {
                        indexer::remote::collection(&config, filter, indexer::DEFAULT_PAGE_LIMIT)
                            .await
                    }
                    _ => {
                        // wallet presence checked above
                        let Some(wallet) = wallet else { return };
                        indexer::remote::by_owner(
                            &config,
                            &wallet,
                            filter,
                            indexer::DEFAULT_PAGE_LIMIT,
                        )
                        .await
                    }
                };
                let mut items = match fetched {
                    Ok(items) => items,
                    Err(err) => {
                        notices.error("Listing Failed", err.to_string());
                        return;
                    }
                };
                enrich_items(&contract, kind, &mut items).await;
                cache.put(key, items.clone(), timers::now_ms());
                nft_list.set(Some((kind, items)));
            });
        })
    };
    let on_load_gallery = load_list(ListKind::Gallery);
    let on_load_my_pixels = load_list(ListKind::MyPixels);
    let on_load_my_composites = load_list(ListKind::MyComposites);

    let on_decompose = {
        let tracker = tracker.clone();
        Callback::from(move |token_id: u64| {
            tracker.submit_decompose(token_id);
        })
    };

    let on_refresh = {
        let loader = loader.clone();
        let core = core.clone();
        let contract = contract.clone();
        Callback::from(move |_: MouseEvent| {
            loader.invalidate();
            loader_driver::request_load(&loader, &core, &contract);
        })
    };

    let on_dismiss = {
        let notices = notices.clone();
        Callback::from(move |id: u64| notices.dismiss(id))
    };

    // --- render -------------------------------------------------------

    let view = snapshot.viewport;
    let grid_style = format!(
        "display:grid;grid-template-columns:repeat({}, 1fr);width:min(80vmin, 720px);height:min(80vmin, 720px);",
        view.size
    );

    let mut cells: Vec<Html> = Vec::with_capacity((view.size * view.size) as usize);
    for y in view.y..(view.y + view.size).min(CANVAS_HEIGHT) {
        for x in view.x..(view.x + view.size).min(CANVAS_WIDTH) {
            let color = snapshot.color_of(x, y);
            let pending = snapshot.is_pending(x, y);
            let selected = snapshot.selected == Some((x, y));
            let staged = snapshot.drawn.contains_key(&(x, y));
            let in_area = snapshot
                .area
                .map(|area| area.contains(x, y))
                .unwrap_or(false);
            let class = classes!(
                "cell",
                pending.then_some("pending"),
                selected.then_some("selected"),
                staged.then_some("staged"),
                in_area.then_some("in-area"),
            );
            let style = format!("background-color:{};", color.as_str());
            let on_click = {
                let on_cell_click = on_cell_click.clone();
                Callback::from(move |event: MouseEvent| {
                    event.stop_propagation();
                    on_cell_click.emit((x, y));
                })
            };
            let on_enter = {
                let on_cell_hover = on_cell_hover.clone();
                Callback::from(move |_: MouseEvent| on_cell_hover.emit((x, y)))
            };
            cells.push(html! {
                <div key={format!("{x}-{y}")} {class} {style}
                    onclick={on_click} onmouseenter={on_enter} />
            });
        }
    }

    let mode = snapshot.mode;
    let mode_button = |label: &str, active: bool, onclick: Callback<MouseEvent>| {
        html! {
            <button class={classes!("mode", active.then_some("active"))} {onclick}>
                { label.to_string() }
            </button>
        }
    };

    let wallet_label = snapshot
        .wallet
        .map(|address| address.short())
        .unwrap_or_else(|| "Connect Wallet".to_string());

    let progress = snapshot.progress;
    let progress_view = if progress.active && progress.total > 0 {
        html! {
            <span class="progress">
                { format!("loading {} / {}", progress.current, progress.total) }
            </span>
        }
    } else {
        html! {}
    };

    let selected_info = snapshot.selected.map(|(x, y)| {
        let token_id = cell_id(x, y).map(|id| id.to_string()).unwrap_or_default();
        let owner = snapshot.owner_of(x, y);
        let minted = snapshot.is_minted(x, y);
        let pending = snapshot.is_pending(x, y);
        let status = (*pixel_status)
            .clone()
            .filter(|status| status.cell == (x, y));
        html! {
            <section class="pixel-info">
                <h3>{ format!("Pixel ({x}, {y})") }</h3>
                <p>{ format!("token id {token_id}") }</p>
                <p>{
                    if minted {
                        owner
                            .map(|owner| format!("owned by {}", owner.short()))
                            .unwrap_or_else(|| "minted".to_string())
                    } else {
                        "not minted yet".to_string()
                    }
                }</p>
                if pending {
                    <p class="pending-note">{ "transaction pending" }</p>
                }
                if let Some(status) = status {
                    if status.checking {
                        <p>{ "checking authorization..." }</p>
                    } else {
                        <p>{
                            if status.is_owner {
                                "you own this pixel".to_string()
                            } else if status.is_authorized {
                                "you are delegated on this pixel".to_string()
                            } else if status.has_exemption {
                                "fee exempt".to_string()
                            } else if status.fee > 0 {
                                format!("update fee {}", mon_label(status.fee))
                            } else {
                                "no update fee".to_string()
                            }
                        }</p>
                        <p>{ format!("{} delegated addresses", status.approval_count) }</p>
                        <ul class="delegates">
                            { for status.approved.iter().map(|address| html! {
                                <li>{ address.short() }</li>
                            }) }
                        </ul>
                    }
                }
                <div class="actions">
                    if !minted && !pending {
                        <button onclick={on_mint.clone()}>{ "Mint" }</button>
                    }
                    if minted && !pending {
                        <button onclick={on_update.clone()}>{ "Update Color" }</button>
                    }
                </div>
            </section>
        }
    });

    let draw_controls = if mode == Mode::Draw {
        let staged = snapshot.drawn.len();
        html! {
            <section class="batch-controls">
                <h3>{ format!("{staged} pixels staged") }</h3>
                if let Some(info) = *batch_fee {
                    <p>{ format!(
                        "{} authorized, {} paid, total {}",
                        info.authorized, info.unauthorized, mon_label(info.total_fee)
                    ) }</p>
                }
                <button onclick={on_batch_mint.clone()}>{ "Batch Mint" }</button>
                <button onclick={on_batch_update.clone()}>{ "Batch Update" }</button>
                <button onclick={on_clear_drawn.clone()}>{ "Clear" }</button>
            </section>
        }
    } else {
        html! {}
    };

    let area_controls = if mode == Mode::AreaSelect {
        match snapshot.area {
            Some(area) => {
                let owned = core.owned_cells_in_area(area).len();
                html! {
                    <section class="area-controls">
                        <h3>{ format!(
                            "area ({}, {}) to ({}, {})",
                            area.x0, area.y0, area.x1, area.y1
                        ) }</h3>
                        <p>{ format!("{owned} owned pixels") }</p>
                        <button onclick={on_compose.clone()} disabled={owned < 2}>
                            { "Compose into NFT" }
                        </button>
                    </section>
                }
            }
            None => html! { <p class="hint">{ "click two corners to select an area" }</p> },
        }
    } else {
        html! {}
    };

    let approval_controls = match mode {
        Mode::Delegate { batch } => html! {
            <section class="approval-controls">
                <h3>{ if batch { "Batch delegate" } else { "Delegate pixel" } }</h3>
                <input placeholder="0x operator address(es)"
                    value={(*operator_input).clone()} oninput={on_operator_input.clone()} />
                <button onclick={on_delegate_submit.clone()}>{ "Delegate" }</button>
            </section>
        },
        Mode::Revoke { batch } => html! {
            <section class="approval-controls">
                <h3>{ if batch { "Batch revoke" } else { "Revoke pixel access" } }</h3>
                <input placeholder="0x operator address(es)"
                    value={(*operator_input).clone()} oninput={on_operator_input.clone()} />
                <button onclick={on_revoke_submit.clone()}>{ "Revoke" }</button>
            </section>
        },
        _ => html! {},
    };

    let nft_list_view = match (*nft_list).clone() {
        Some((_, items)) if items.is_empty() => html! { <p>{ "nothing here yet" }</p> },
        Some((kind, items)) => html! {
            <ul class="nft-list">
                { for items.iter().map(|item| {
                    let image = (!item.image.is_empty()).then(|| html! {
                        <img src={item.image.clone()} alt={item.name.clone()} />
                    });
                    let decompose = (kind == ListKind::MyComposites).then(|| {
                        let on_decompose = on_decompose.clone();
                        let token_id = item.token_id;
                        html! {
                            <button onclick={Callback::from(move |_: MouseEvent| {
                                on_decompose.emit(token_id)
                            })}>{ "Decompose" }</button>
                        }
                    });
                    html! {
                        <li key={item.token_id.to_string()}>
                            { image.unwrap_or_default() }
                            <span>{ item.name.clone() }</span>
                            if !item.description.is_empty() {
                                <small>{ item.description.clone() }</small>
                            }
                            { decompose.unwrap_or_default() }
                        </li>
                    }
                }) }
            </ul>
        },
        None => html! {},
    };

    let sidebar = if *show_sidebar {
        html! {
            <aside class="sidebar">
                <section class="palette">
                    { for PALETTE.iter().map(|entry| {
                        let value = (*entry).to_string();
                        let active = snapshot.selected_color.as_str() == *entry;
                        let on_pick_color = on_pick_color.clone();
                        let swatch_value = value.clone();
                        html! {
                            <button
                                class={classes!("swatch", active.then_some("active"))}
                                style={format!("background-color:{value};")}
                                onclick={Callback::from(move |_: MouseEvent| {
                                    on_pick_color.emit(swatch_value.clone())
                                })}
                            />
                        }
                    }) }
                    <div class="hex-entry">
                        <input placeholder="#rrggbb" value={(*hex_input).clone()}
                            oninput={on_hex_input.clone()} />
                        <button onclick={on_hex_apply.clone()}>{ "Set" }</button>
                    </div>
                </section>
                { selected_info.unwrap_or_default() }
                { draw_controls }
                { area_controls }
                { approval_controls }
                <section class="nft-section">
                    <button onclick={on_load_gallery.clone()}>{ "Gallery" }</button>
                    <button onclick={on_load_my_pixels.clone()}>{ "My Pixels" }</button>
                    <button onclick={on_load_my_composites.clone()}>{ "My Composites" }</button>
                    { nft_list_view }
                </section>
            </aside>
        }
    } else {
        html! {}
    };

    let notifications_view = html! {
        <div class="notifications">
            { for notices.entries().iter().map(|entry| {
                let entry = entry.clone();
                let class = match entry.kind {
                    NoticeKind::Success => "notice success",
                    NoticeKind::Error => "notice error",
                    NoticeKind::Info => "notice info",
                };
                let dismiss = {
                    let on_dismiss = on_dismiss.clone();
                    let id = entry.id;
                    Callback::from(move |_: MouseEvent| on_dismiss.emit(id))
                };
                let link = entry.tx_hash.as_ref().map(|hash| {
                    let href = config.explorer_tx_url(hash);
                    html! { <a href={href} target="_blank">{ "view tx" }</a> }
                });
                html! {
                    <div key={entry.id.to_string()} class={class}>
                        <strong>{ entry.title.clone() }</strong>
                        <span>{ entry.message.clone() }</span>
                        { link.unwrap_or_default() }
                        <button onclick={dismiss}>{ "x" }</button>
                    </div>
                }
            }) }
        </div>
    };

    html! {
        <div class="app">
            <header>
                <h1>{ "pikuseru" }</h1>
                <span class="minted">
                    { format!("{} / {} minted", snapshot.total_minted, CANVAS_CELLS) }
                </span>
                { progress_view }
                <div class="zoom">
                    <button onclick={on_zoom_in}>{ "+" }</button>
                    <span>{ format!("{}x{}", view.size, view.size) }</span>
                    <button onclick={on_zoom_out}>{ "-" }</button>
                    <button onclick={on_refresh}>{ "Refresh" }</button>
                </div>
                <nav class="modes">
                    { mode_button("Batch", mode == Mode::Draw, on_toggle_draw) }
                    { mode_button("Compose", mode == Mode::AreaSelect, on_toggle_area) }
                    { mode_button("Delegate", mode == (Mode::Delegate { batch: false }), on_toggle_delegate) }
                    { mode_button("Delegate area", mode == (Mode::Delegate { batch: true }), on_toggle_delegate_batch) }
                    { mode_button("Revoke", mode == (Mode::Revoke { batch: false }), on_toggle_revoke) }
                    { mode_button("Revoke area", mode == (Mode::Revoke { batch: true }), on_toggle_revoke_batch) }
                </nav>
                <div class="position">
                    <input placeholder="x" value={(*position_input).0.clone()} oninput={on_position_x} />
                    <input placeholder="y" value={(*position_input).1.clone()} oninput={on_position_y} />
                    <button onclick={on_position_go}>{ "Go" }</button>
                </div>
                <button class="wallet" onclick={on_connect}>{ wallet_label }</button>
                <button class="sidebar-toggle" onclick={on_toggle_sidebar}>{ "menu" }</button>
            </header>
            <main>
                <div class="canvas" style={grid_style}
                    onmousedown={on_mouse_down}
                    onmousemove={on_mouse_move}
                    onmouseup={on_mouse_up.clone()}
                    onmouseleave={on_mouse_up}
                    onwheel={on_wheel}
                    ontouchstart={on_touch_start}
                    ontouchmove={on_touch_move}
                    ontouchend={on_touch_end}
                >
                    { cells }
                </div>
                { sidebar }
            </main>
            { notifications_view }
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn parses_operator_lists() {
        let parsed = parse_addresses(
            "0x00000000000000000000000000000000000000aa,\n 0x00000000000000000000000000000000000000bb",
        )
        .unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(parse_addresses("0x123").is_err());
        assert!(parse_addresses("  ").unwrap().is_empty());
    }
}
