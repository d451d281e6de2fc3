use std::path::PathBuf;

use clap::Parser;

use karst_blocks::BlockRegistry;
use karst_chunk::ChunkStatus;
use karst_edit::{build_block, hit_block};
use karst_io::{FileStore, MemoryStore, SavedPlayer, SavedWorld, WorldStore};
use karst_mesh::CullMesher;
use karst_render::HeadlessRender;
use karst_runtime::{Collaborators, Pipeline, StepStatus, WorldState, rebuild_dirty_chunks};
use karst_world::{NoiseTerrain, World, WorldGenParams};

#[derive(Parser, Debug)]
#[command(name = "karst", about = "Bounded chunked voxel world core: generate, mine, build, remesh")]
struct Args {
    /// World width in chunks
    #[arg(long, default_value_t = 4)]
    chunks_x: usize,
    /// World height in chunks
    #[arg(long, default_value_t = 2)]
    chunks_y: usize,
    /// World depth in chunks
    #[arg(long, default_value_t = 4)]
    chunks_z: usize,
    /// Worldgen seed
    #[arg(long, default_value_t = 1337)]
    seed: i32,
    /// Overlay water up to the sea level
    #[arg(long)]
    water: bool,
    /// Load a saved world instead of generating one
    #[arg(long)]
    load: Option<PathBuf>,
    /// Save the world here when the session ends
    #[arg(long)]
    save: Option<PathBuf>,
    /// Worldgen parameter TOML (defaults built in)
    #[arg(long)]
    params: Option<PathBuf>,
    /// Block table TOML (defaults built in)
    #[arg(long)]
    blocks: Option<PathBuf>,
    /// Extra scheduler ticks after the mine/build session
    #[arg(long, default_value_t = 4)]
    ticks: u32,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if let Err(e) = run(args) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let reg = match &args.blocks {
        Some(path) => BlockRegistry::load_from_path(path)?,
        None => BlockRegistry::with_defaults(),
    };
    let params = match &args.params {
        Some(path) => WorldGenParams::load_from_path(path)?,
        None => WorldGenParams::default(),
    };
    let tree_probability = params.tree_probability;

    let world = World::new(args.chunks_x, args.chunks_y, args.chunks_z, args.seed);
    log::info!(
        "world {}x{}x{} chunks ({} blocks)",
        world.chunks_x,
        world.chunks_y,
        world.chunks_z,
        world.volume()
    );
    let mut state = WorldState::new(world);
    let mut terrain = NoiseTerrain::new(args.seed, params, &reg);
    let mut mesher = CullMesher::new(&reg);
    let mut render = HeadlessRender::new();
    let store: Box<dyn WorldStore> = match &args.load {
        Some(path) => Box::new(FileStore::new(path)),
        None => Box::new(MemoryStore::new()),
    };

    let mut pipeline = if args.load.is_some() {
        Pipeline::load(&mut state)?
    } else {
        Pipeline::create(&mut state, args.water, tree_probability)?
    };
    let mut c = Collaborators {
        reg: &reg,
        terrain: &mut terrain,
        mesher: &mut mesher,
        render: &mut render,
        store: store.as_ref(),
    };
    // One stage (or one chunk) per tick, the way a frame loop would drive it.
    while pipeline.step(&mut state, &mut c)? == StepStatus::InProgress {
        log::debug!("pipeline at {:.0}%", pipeline.ratio() * 100.0);
    }
    if let Some(player) = pipeline.player() {
        log::info!("restored player at {:?}", player.position);
    }

    // Mine the surface block at the world center down to destruction,
    // scheduling rebuilds once per tick, mutations first.
    let cx = state.world.size_x() as i32 / 2;
    let cz = state.world.size_z() as i32 / 2;
    let surface = (0..state.world.size_y() as i32)
        .rev()
        .find(|&y| {
            let b = state.grid.get(cx as usize, y as usize, cz as usize);
            !b.is_air() && reg.is_solid(b.id)
        })
        .ok_or("world center column is empty")?;
    let target = state.grid.get(cx as usize, surface as usize, cz as usize);
    let name = reg
        .get(target.id)
        .map(|t| t.name.clone())
        .unwrap_or_else(|| format!("#{}", target.id));
    log::info!("mining {name} at ({cx},{surface},{cz}), {} hit points", target.hit_points);
    let mut destroyed = false;
    while !destroyed {
        destroyed = hit_block(
            &state.world,
            &mut state.grid,
            state.chunks.as_mut().ok_or("chunks not allocated")?,
            &mut mesher,
            &reg,
            cx,
            surface,
            cz,
        );
        rebuild_dirty_chunks(&mut state, &mesher, &mut render);
    }
    log::info!("block destroyed");

    // Build a stone block back into the hole on the next tick.
    if let Some(stone) = reg.id_by_name("stone") {
        let built = build_block(
            &state.world,
            &mut state.grid,
            state.chunks.as_mut().ok_or("chunks not allocated")?,
            &mut mesher,
            &reg,
            cx,
            surface,
            cz,
            stone,
        );
        log::info!("build at ({cx},{surface},{cz}): {built}");
        rebuild_dirty_chunks(&mut state, &mesher, &mut render);
    }

    for _ in 0..args.ticks {
        rebuild_dirty_chunks(&mut state, &mesher, &mut render);
    }

    let chunks = state.chunks.as_ref().ok_or("chunks not allocated")?;
    log::info!(
        "session done: {} render objects, {} terrain quads, {} water quads, {}/{} chunks ready",
        render.object_count(),
        render.total_terrain_quads(),
        render.total_water_quads(),
        chunks.count_with_status(ChunkStatus::Ready),
        chunks.len()
    );

    if let Some(path) = &args.save {
        let saved = SavedWorld {
            chunk_size: state.world.chunk_size as u32,
            chunks_x: state.world.chunks_x as u32,
            chunks_y: state.world.chunks_y as u32,
            chunks_z: state.world.chunks_z as u32,
            seed: state.world.seed,
            blocks: state.grid.as_slice().to_vec(),
            player: SavedPlayer {
                position: [cx as f32, surface as f32 + 2.0, cz as f32],
                rotation: [0.0, 0.0, 0.0],
            },
        };
        FileStore::new(path).save(&saved)?;
    }
    Ok(())
}
