mod rpc_ws;

use std::collections::HashSet;

use clap::{Parser, Subcommand};

use pikuseru_core::chunk::CHUNK_SIZE;
use pikuseru_core::pxnft::{calls, decode};
use pikuseru_core::{
    cell_id, decode_log, Chunk, PixelEvent, CANVAS_HEIGHT, CANVAS_WIDTH,
};

use rpc_ws::{normalize_ws_url, RpcSocket};

#[derive(Parser)]
#[command(name = "pikuseru-cli", version, about = "Operator tools for the pikuseru canvas")]
struct Cli {
    /// Websocket JSON-RPC endpoint. http(s) schemes are rewritten to ws(s).
    #[arg(long, env = "PIKUSERU_RPC_WS_URL", default_value = "wss://testnet-rpc.monad.xyz")]
    rpc_url: String,
    #[arg(
        long,
        env = "PIKUSERU_CONTRACT_ADDRESS",
        default_value = "0x82d0b70ad6fcdb8aad6048f86afca83d69f556b9"
    )]
    contract: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Canvas {
        #[command(subcommand)]
        command: CanvasCommand,
    },
}

#[derive(Subcommand)]
enum CanvasCommand {
    /// Range-read a region chunk by chunk and print a mint summary.
    Scan {
        #[arg(long, default_value_t = 0)]
        from_x: u32,
        #[arg(long, default_value_t = 0)]
        from_y: u32,
        #[arg(long, default_value_t = CANVAS_WIDTH - 1)]
        to_x: u32,
        #[arg(long, default_value_t = CANVAS_HEIGHT - 1)]
        to_y: u32,
    },
    /// Ownership, color and approvals for one cell.
    Pixel {
        #[arg(long)]
        x: u32,
        #[arg(long)]
        y: u32,
    },
    /// Subscribe to contract logs and print mint / color-change events.
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let url = normalize_ws_url(&cli.rpc_url)?;
    let mut socket = RpcSocket::connect(&url).await?;

    match cli.command {
        Commands::Canvas { command } => match command {
            CanvasCommand::Scan {
                from_x,
                from_y,
                to_x,
                to_y,
            } => scan(&mut socket, &cli.contract, (from_x, from_y), (to_x, to_y)).await,
            CanvasCommand::Pixel { x, y } => pixel(&mut socket, &cli.contract, x, y).await,
            CanvasCommand::Watch => watch(&mut socket, &cli.contract).await,
        },
    }
}

async fn scan(
    socket: &mut RpcSocket,
    contract: &str,
    from: (u32, u32),
    to: (u32, u32),
) -> Result<(), Box<dyn std::error::Error>> {
    let x_end = to.0.min(CANVAS_WIDTH - 1);
    let y_end = to.1.min(CANVAS_HEIGHT - 1);
    if from.0 > x_end || from.1 > y_end {
        return Err("empty scan region".into());
    }

    let mut minted = 0usize;
    let mut owners = HashSet::new();
    let mut chunks = 0usize;

    let mut y0 = from.1;
    while y0 <= y_end {
        let mut x0 = from.0;
        while x0 <= x_end {
            let chunk = Chunk {
                x0,
                y0,
                x1: (x0 + CHUNK_SIZE - 1).min(x_end),
                y1: (y0 + CHUNK_SIZE - 1).min(y_end),
            };
            let reply = socket
                .eth_call(contract, &calls::get_minted_pixels_in_range(&chunk))
                .await?;
            let page = decode::range_page(&reply)?;
            if !page.ids.is_empty() {
                println!(
                    "chunk ({}, {})-({}, {}): {} minted",
                    chunk.x0,
                    chunk.y0,
                    chunk.x1,
                    chunk.y1,
                    page.ids.len()
                );
            }
            minted += page.ids.len();
            owners.extend(page.owners.iter().map(ToString::to_string));
            chunks += 1;
            x0 += CHUNK_SIZE;
        }
        y0 += CHUNK_SIZE;
    }

    let region_cells =
        (u64::from(x_end - from.0) + 1) * (u64::from(y_end - from.1) + 1);
    println!("scanned {chunks} chunks, {region_cells} cells");
    println!("{minted} minted pixels, {} distinct owners", owners.len());
    Ok(())
}

async fn pixel(
    socket: &mut RpcSocket,
    contract: &str,
    x: u32,
    y: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = cell_id(x, y)?;
    println!("pixel ({x}, {y}), token id {id}");

    // ownerOf reverts for unminted tokens.
    match socket.eth_call(contract, &calls::owner_of(id)).await {
        Ok(reply) => {
            let owner = decode::address_value(&reply)?;
            println!("owner: {owner}");
            let reply = socket.eth_call(contract, &calls::get_color(x, y)).await?;
            println!("color: {}", decode::string_value(&reply)?);
            let reply = socket
                .eth_call(contract, &calls::get_pixel_approved_addresses_list(x, y))
                .await?;
            let approved = decode::address_list(&reply)?;
            println!("{} delegated addresses", approved.len());
            for address in approved {
                println!("  {address}");
            }
        }
        Err(_) => println!("not minted"),
    }
    Ok(())
}

async fn watch(
    socket: &mut RpcSocket,
    contract: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let subscription = socket.subscribe_logs(contract).await?;
    println!("subscribed ({subscription}), waiting for events...");
    loop {
        let log = socket.next_log().await?;
        match decode_log(&log) {
            Some(PixelEvent::Minted { token_id, owner }) => {
                println!("mint: token {token_id} -> {owner}");
            }
            Some(PixelEvent::ColorChanged { x, y, color, owner }) => {
                println!("color: ({x}, {y}) -> {color} by {owner}");
            }
            None => {}
        }
    }
}
