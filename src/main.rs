mod app_core;
#[cfg(target_arch = "wasm32")]
mod chain_events;
mod chunk_loader;
mod config;
#[cfg(target_arch = "wasm32")]
mod contract;
mod indexer;
mod notifications;
#[cfg(target_arch = "wasm32")]
mod rpc;
mod timers;
mod tx_tracker;
#[cfg(target_arch = "wasm32")]
mod wallet;
#[cfg(target_arch = "wasm32")]
mod yew_app;

#[cfg(target_arch = "wasm32")]
fn main() {
    yew::Renderer::<yew_app::App>::new().render();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    eprintln!("pikuseru is a wasm32 application; build it with trunk");
}
