#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a scripted Tilequest walkthrough.
//!
//! Builds a tiny two-map world (a town strip leading into a cave), holds the
//! walk-right command down, and logs the party position, script messages, and
//! the camera frame each tick. Useful for eyeballing the simulation without a
//! graphical adapter.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use glam::{IVec2, UVec2};
use serde_json::Value;
use tilequest_core::{
    CommandEdge, Direction, MapId, ObstacleClass, PartyCommand, Position, WELCOME_BANNER,
};
use tilequest_system_camera::{frame, transit_pixel_position, CameraConfig, CameraMode};
use tilequest_world::{
    query, Area, Grid, Map, MapError, MapObject, MapScript, Movement, MovementCycle, Party,
    ScriptEffect, Tile, TileImage, TileLayer, World,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const TOWN: MapId = MapId::new(1);
const CAVE: MapId = MapId::new(2);

/// Command-line options for the scripted walkthrough.
#[derive(Parser)]
#[command(name = "tilequest", about = "Scripted Tilequest walkthrough")]
struct Args {
    /// Number of simulation ticks to run.
    #[arg(long, default_value_t = 24)]
    ticks: u32,

    /// Square tile edge in pixels.
    #[arg(long, default_value_t = 16)]
    tile_size: u32,

    /// Viewport width in pixels.
    #[arg(long, default_value_t = 160)]
    viewport_width: u32,

    /// Viewport height in pixels.
    #[arg(long, default_value_t = 96)]
    viewport_height: u32,

    /// Camera strategy used when logging frames.
    #[arg(long, value_enum, default_value = "party-confined")]
    camera: CameraChoice,
}

/// Camera strategy selectable from the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CameraChoice {
    /// Viewport anchored at the map origin.
    Fixed,
    /// Viewport centered on the party.
    Centric,
    /// Party-centered, confined to map edges, small maps centered.
    PartyConfined,
    /// Party-centered, hard-clamped to the map bounds.
    ScreenConfined,
}

impl CameraChoice {
    fn mode(self) -> CameraMode {
        match self {
            CameraChoice::Fixed => CameraMode::Fixed {
                origin: IVec2::ZERO,
            },
            CameraChoice::Centric => CameraMode::PartyCentric,
            CameraChoice::PartyConfined => CameraMode::PartyConfined,
            CameraChoice::ScreenConfined => CameraMode::ScreenConfined,
        }
    }
}

fn open_map(columns: u32, rows: u32) -> Result<Map, MapError> {
    let ground = Tile::new(ObstacleClass::Below, TileImage::new(0));
    let terrain = TileLayer::filled(columns, rows, ground)?;
    let scenario = TileLayer::filled(columns, rows, ground)?;
    Ok(Map::new(Grid::new(terrain, vec![scenario])?))
}

/// Town strip: a shop counter, a patrolling villager, and a cave exit on the
/// rightmost column.
struct Town;

impl MapScript for Town {
    fn construct(&self) -> Result<Map, MapError> {
        let mut map = open_map(10, 5)?;

        let _ = map.place_object(
            MapObject::new(ObstacleClass::Counter, 1),
            Position::new(4, 0),
        )?;
        let _ = map.place_object(
            MapObject::new(ObstacleClass::Obstacle, 1).with_on_activate(Box::new(|effects| {
                effects.push(ScriptEffect::Message("shopkeeper: safe travels!".into()));
            })),
            Position::new(4, 1),
        )?;

        let _ = map.place_object(
            MapObject::new(ObstacleClass::Obstacle, 2).with_behavior(MovementCycle::new(vec![
                Movement::Step(Direction::Down),
                Movement::Wait(2),
                Movement::Step(Direction::Up),
                Movement::Wait(2),
            ])),
            Position::new(6, 3),
        )?;

        let exit = Area::from_rect(Position::new(9, 0), 1, 5).with_on_enter(Box::new(|effects| {
            effects.push(ScriptEffect::Message("entering the cave".into()));
            effects.push(ScriptEffect::ScheduleTeleport {
                map: Some(CAVE),
                position: Position::new(1, 2),
                facing: Some(Direction::Right),
            });
        }));
        let _ = map.add_area(exit);
        Ok(map)
    }

    fn initialize(&self, _map: &mut Map, local_state: Option<&Value>, _global_state: &mut Value) {
        info!(cached = local_state.is_some(), "town_initialized");
    }
}

/// Cave room whose rightmost column leads back to the town square.
struct Cave;

impl MapScript for Cave {
    fn construct(&self) -> Result<Map, MapError> {
        let mut map = open_map(6, 5)?;
        let exit = Area::from_rect(Position::new(5, 0), 1, 5).with_on_enter(Box::new(|effects| {
            effects.push(ScriptEffect::Message("back to town".into()));
            effects.push(ScriptEffect::SetLocalState(
                serde_json::json!({ "explored": true }),
            ));
            effects.push(ScriptEffect::ScheduleTeleport {
                map: Some(TOWN),
                position: Position::new(0, 2),
                facing: Some(Direction::Right),
            });
        }));
        let _ = map.add_area(exit);
        Ok(map)
    }

    fn initialize(&self, _map: &mut Map, _local_state: Option<&Value>, _global_state: &mut Value) {
    }
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    println!("{WELCOME_BANNER}");

    let mut world = World::new();
    world.register_map(TOWN, Box::new(Town))?;
    world.register_map(CAVE, Box::new(Cave))?;
    world.start(TOWN, Party::new(TileImage::new(7), 2), Position::new(1, 2))?;
    world.handle_command(PartyCommand::Right, CommandEdge::Pressed)?;

    for tick in 0..args.ticks {
        world.tick(false)?;
        for message in world.drain_messages() {
            info!(tick, message = %message, "script_message");
        }
        log_frame(&world, &args, tick);
    }

    Ok(())
}

fn log_frame(world: &World, args: &Args, tick: u32) {
    let Some(map) = world.active_map() else {
        return;
    };
    let Some(position) = query::party_position(world) else {
        return;
    };
    let facing = query::party_facing(world).unwrap_or(Direction::Down);
    let (phase, speed) = query::party_transit(world).unwrap_or((0, 1));

    let (columns, rows) = map.grid().dimensions();
    let config = CameraConfig::new(
        UVec2::new(args.viewport_width, args.viewport_height),
        args.tile_size,
        UVec2::new(columns, rows),
    );
    let pixels = transit_pixel_position(position, facing, phase, speed, args.tile_size);
    let framing = frame(args.camera.mode(), config, pixels);

    info!(
        tick,
        map = world.active_map_id().map_or(0, |id| id.get()),
        x = position.x(),
        y = position.y(),
        phase,
        slice_x = framing.slice_origin.x,
        slice_y = framing.slice_origin.y,
        objects = query::object_view(world).len(),
        "frame"
    );
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
