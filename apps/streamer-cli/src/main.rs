use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::{Vec2, Vec3};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use streamer_callbacks::{Host, ScriptEvent, ScriptSink};
use streamer_common::{ItemType, PlayerId, ScriptId, Shape, StreamerConfig};
use streamer_kernel::{ItemDef, ItemKind};
use streamer_tools::StreamerInspector;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "streamer-cli", about = "CLI tool for streamer operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Streamer configuration file (.yaml, .yml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Load and validate the configuration, then print the effective capacities
    Validate,
    /// Stream a random world to random-walking participants
    Simulate {
        /// Number of connected participants
        #[arg(short, long, default_value = "8")]
        players: u16,
        /// Number of items to create
        #[arg(short, long, default_value = "2000")]
        items: usize,
        /// Number of host ticks to run
        #[arg(short, long, default_value = "100")]
        ticks: u64,
        /// RNG seed for a reproducible run
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Print stream events and the final summary as JSON lines
        #[arg(long)]
        json: bool,
    },
}

/// Counts script events by name.
struct EventCounter {
    counts: Rc<RefCell<BTreeMap<&'static str, usize>>>,
}

impl ScriptSink for EventCounter {
    fn script(&self) -> ScriptId {
        ScriptId(1)
    }

    fn on_event(&mut self, event: &ScriptEvent) -> bool {
        *self.counts.borrow_mut().entry(event.name()).or_default() += 1;
        tracing::trace!(event = event.name(), "script event");
        false
    }
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn coord(state: &mut u64, span: f32) -> f32 {
    (splitmix64(state) % 100_000) as f32 / 100_000.0 * span - span / 2.0
}

fn load_config(path: Option<&Path>) -> anyhow::Result<StreamerConfig> {
    let Some(path) = path else {
        return Ok(StreamerConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => StreamerConfig::from_json_str(&text),
        _ => StreamerConfig::from_yaml_str(&text),
    }
    .with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}

fn random_item(rng: &mut u64, span: f32) -> ItemDef {
    let position = Vec3::new(coord(rng, span), coord(rng, span), 0.0);
    match splitmix64(rng) % 6 {
        0 => ItemDef::new(ItemKind::pickup(1239, 2), position),
        1 => ItemDef::new(ItemKind::map_icon(56, 0, 0), position),
        2 => ItemDef::new(ItemKind::text_label("label", 0xFFFF_FFFF), position),
        3 => ItemDef::area(Shape::Circle {
            center: Vec2::new(position.x, position.y),
            radius: 25.0,
        }),
        4 => ItemDef::new(ItemKind::actor(120, 0.0), position).stream_callbacks(true),
        _ => ItemDef::new(ItemKind::object(1337, Vec3::ZERO), position)
            .priority((splitmix64(rng) % 3) as i32),
    }
}

fn simulate(
    config: StreamerConfig,
    players: u16,
    items: usize,
    ticks: u64,
    seed: u64,
    json: bool,
) -> anyhow::Result<()> {
    const SPAN: f32 = 6000.0;
    const TICK_MS: u64 = 50;

    let mut host = Host::new(config)?;
    let counts = Rc::new(RefCell::new(BTreeMap::new()));
    host.register_script(Box::new(EventCounter {
        counts: counts.clone(),
    }))?;
    let mut rng = seed;

    for _ in 0..items {
        let def = random_item(&mut rng, SPAN);
        host.streamer_mut().create_item(def)?;
    }
    let mut positions = Vec::with_capacity(players as usize);
    for i in 0..players {
        let position = Vec3::new(coord(&mut rng, SPAN), coord(&mut rng, SPAN), 0.0);
        host.on_player_connect(PlayerId(i), position)?;
        positions.push(position);
    }

    let mut transitions = 0usize;
    for tick in 0..ticks {
        for (i, position) in positions.iter_mut().enumerate() {
            *position += Vec3::new(coord(&mut rng, 20.0), coord(&mut rng, 20.0), 0.0);
            host.streamer_mut()
                .move_player(PlayerId(i as u16), *position, 0.0)?;
        }
        let events = host.process_tick(tick * TICK_MS);
        transitions += events.len();
        if json {
            for event in &events {
                println!("{}", serde_json::to_string(event)?);
            }
        } else if !events.is_empty() {
            let stats = host.streamer().stats();
            println!(
                "tick {tick}: events={} in={} out={} areas={} took={:?}",
                events.len(),
                stats.streamed_in,
                stats.streamed_out,
                stats.area_transitions,
                stats.tick_time
            );
        }
    }

    let summary = StreamerInspector::summary(host.streamer());
    if json {
        println!("{}", serde_json::to_string(&summary)?);
        return Ok(());
    }
    println!("Simulation: seed={seed}, players={players}, items={items}, ticks={ticks}");
    println!("{summary}");
    println!("Stream transitions: {transitions}");
    for (name, count) in counts.borrow().iter() {
        println!("  script {name}: {count}");
    }
    for i in 0..players {
        if let Some(info) = StreamerInspector::inspect_player(host.streamer(), PlayerId(i)) {
            println!("  {info}");
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Info => {
            println!("streamer-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("kernel: {}", streamer_kernel::crate_info());
            println!("stream: {}", streamer_stream::crate_info());
            println!("callbacks: {}", streamer_callbacks::crate_info());
            println!("tools: {}", streamer_tools::crate_info());
        }
        Commands::Validate => {
            println!(
                "Config OK: cell_size={} tick_rate={} identifier_limit={}",
                config.cell_size, config.tick_rate, config.identifier_limit
            );
            for kind in ItemType::STREAMED {
                println!("  {kind}: capacity={}", config.capacity(kind));
            }
        }
        Commands::Simulate {
            players,
            items,
            ticks,
            seed,
            json,
        } => simulate(config, players, items, ticks, seed, json)?,
    }

    Ok(())
}
