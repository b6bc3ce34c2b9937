//! World-controller scenarios: map lifecycles, teleports, and persistence.

use serde_json::{json, Value};
use tilequest_core::{CommandEdge, Direction, MapId, ObstacleClass, PartyCommand, Position};
use tilequest_world::{
    query, Area, Grid, Map, MapError, MapScript, Party, ScriptEffect, Tile, TileImage, TileLayer,
    World, WorldError, WorldState,
};

const TOWN: MapId = MapId::new(1);
const CAVE: MapId = MapId::new(2);

fn open_map(columns: u32, rows: u32) -> Result<Map, MapError> {
    let tile = Tile::new(ObstacleClass::Below, TileImage::new(0));
    let terrain = TileLayer::filled(columns, rows, tile)?;
    let scenario = TileLayer::filled(columns, rows, tile)?;
    Ok(Map::new(Grid::new(terrain, vec![scenario])?))
}

/// 3x1 strip whose rightmost tile leads into the cave.
struct Town;

impl MapScript for Town {
    fn construct(&self) -> Result<Map, MapError> {
        let mut map = open_map(3, 1)?;
        let exit = Area::new([Position::new(2, 0)]).with_on_enter(Box::new(|effects| {
            effects.push(ScriptEffect::Message("leaving town".into()));
            effects.push(ScriptEffect::SetLocalState(json!({ "visited": true })));
            effects.push(ScriptEffect::ScheduleTeleport {
                map: Some(CAVE),
                position: Position::new(1, 1),
                facing: Some(Direction::Up),
            });
        }));
        let _ = map.add_area(exit);
        Ok(map)
    }

    fn initialize(&self, _map: &mut Map, local_state: Option<&Value>, global_state: &mut Value) {
        if global_state.is_null() {
            *global_state = json!({});
        }
        if let Some(doc) = global_state.as_object_mut() {
            let _ = doc.insert("town_saw_cache".into(), Value::Bool(local_state.is_some()));
        }
    }
}

/// 3x3 room whose rightmost middle tile leads back to town.
struct Cave;

impl MapScript for Cave {
    fn construct(&self) -> Result<Map, MapError> {
        let mut map = open_map(3, 3)?;
        let exit = Area::new([Position::new(2, 1)]).with_on_enter(Box::new(|effects| {
            effects.push(ScriptEffect::ScheduleTeleport {
                map: Some(TOWN),
                position: Position::new(0, 0),
                facing: None,
            });
        }));
        let _ = map.add_area(exit);
        Ok(map)
    }

    fn initialize(&self, _map: &mut Map, _local_state: Option<&Value>, _global_state: &mut Value) {
    }
}

fn town_and_cave() -> World {
    let mut world = World::new();
    world
        .register_map(TOWN, Box::new(Town))
        .expect("register town");
    world
        .register_map(CAVE, Box::new(Cave))
        .expect("register cave");
    world
}

#[test]
fn walking_into_the_exit_area_swaps_maps_in_the_same_tick() {
    let mut world = town_and_cave();
    world
        .start(TOWN, Party::new(TileImage::new(7), 1), Position::new(0, 0))
        .expect("start");
    assert_eq!(world.state(), WorldState::Running);

    world
        .handle_command(PartyCommand::Right, CommandEdge::Pressed)
        .expect("press");
    world.tick(false).expect("tick");
    world.tick(false).expect("tick");

    assert_eq!(world.active_map_id(), Some(CAVE));
    assert_eq!(world.state(), WorldState::Running);
    assert_eq!(query::party_position(&world), Some(Position::new(1, 1)));
    assert_eq!(query::party_facing(&world), Some(Direction::Up));
    let snapshot = query::party_view(&world).expect("party snapshot");
    assert_eq!(snapshot.leader_image, TileImage::new(7));
    assert_eq!(snapshot.speed, 1);
    assert!(world
        .drain_messages()
        .contains(&"leaving town".to_owned()));
}

#[test]
fn local_state_is_cached_and_replayed_on_re_entry() {
    let mut world = town_and_cave();
    world
        .start(TOWN, Party::new(TileImage::new(7), 1), Position::new(0, 0))
        .expect("start");
    assert_eq!(world.global_state()["town_saw_cache"], Value::Bool(false));

    world
        .handle_command(PartyCommand::Right, CommandEdge::Pressed)
        .expect("press");
    // Two ticks reach the town exit; the third crosses the cave and
    // returns.
    for _ in 0..3 {
        world.tick(false).expect("tick");
    }

    assert_eq!(world.active_map_id(), Some(TOWN));
    assert_eq!(query::party_position(&world), Some(Position::new(0, 0)));
    assert_eq!(world.global_state()["town_saw_cache"], Value::Bool(true));
}

#[test]
fn party_motion_state_survives_the_map_swap() {
    let mut world = town_and_cave();
    let mut party = Party::new(TileImage::new(7), 3);
    party.custom_load(json!({ "gold": 250 }));
    world
        .start(TOWN, party, Position::new(1, 0))
        .expect("start");

    world
        .schedule_teleport(Some(CAVE), Position::new(0, 0), None)
        .expect("schedule");
    world.tick(false).expect("tick");

    assert_eq!(world.active_map_id(), Some(CAVE));
    let map = world.active_map().expect("active map");
    let party = map.party().expect("party");
    assert_eq!(party.mover().speed(), 3);
    assert_eq!(party.custom_save(), Some(json!({ "gold": 250 })));
    assert_eq!(party.leader_image(), TileImage::new(7));
}

#[test]
fn same_map_teleport_repositions_without_a_swap() {
    let mut world = town_and_cave();
    world
        .start(CAVE, Party::new(TileImage::new(7), 1), Position::new(0, 0))
        .expect("start");

    world
        .schedule_teleport(None, Position::new(2, 2), Some(Direction::Left))
        .expect("schedule");
    world.tick(false).expect("tick");

    assert_eq!(world.active_map_id(), Some(CAVE));
    assert_eq!(world.state(), WorldState::Running);
    assert_eq!(query::party_position(&world), Some(Position::new(2, 2)));
    assert_eq!(query::party_facing(&world), Some(Direction::Left));
}

#[test]
fn arrival_tile_held_by_an_npc_keeps_the_world_running() {
    const GUARDED: MapId = MapId::new(3);

    /// 3x3 room with a blocking guard standing on the arrival tile.
    struct Guarded;

    impl MapScript for Guarded {
        fn construct(&self) -> Result<Map, MapError> {
            let mut map = open_map(3, 3)?;
            let _ = map.place_object(
                tilequest_world::MapObject::new(ObstacleClass::Obstacle, 1),
                Position::new(1, 1),
            )?;
            Ok(map)
        }

        fn initialize(&self, _: &mut Map, _: Option<&Value>, _: &mut Value) {}
    }

    let mut world = town_and_cave();
    world
        .register_map(GUARDED, Box::new(Guarded))
        .expect("register guarded room");
    world
        .start(TOWN, Party::new(TileImage::new(7), 1), Position::new(0, 0))
        .expect("start");

    world
        .schedule_teleport(Some(GUARDED), Position::new(1, 1), None)
        .expect("schedule");
    world.tick(false).expect("tick");

    assert_eq!(world.active_map_id(), Some(GUARDED));
    assert_eq!(world.state(), WorldState::Running);
    assert_eq!(query::party_position(&world), Some(Position::new(1, 1)));

    // The party walks off the shared tile; the guard keeps blocking it.
    world
        .handle_command(PartyCommand::Right, CommandEdge::Pressed)
        .expect("press");
    world.tick(false).expect("tick");
    assert_eq!(query::party_position(&world), Some(Position::new(2, 1)));
    let map = world.active_map().expect("active map");
    assert!(!map.can_enter(Position::new(1, 1), Direction::Left));
}

#[test]
fn teleporting_to_an_unregistered_map_is_an_error() {
    let mut world = town_and_cave();
    world
        .start(TOWN, Party::new(TileImage::new(7), 1), Position::new(0, 0))
        .expect("start");

    world
        .schedule_teleport(Some(MapId::new(9)), Position::new(0, 0), None)
        .expect("schedule");
    let result = world.tick(false);

    assert!(matches!(result, Err(WorldError::UnknownMap(id)) if id == MapId::new(9)));
    // The world stays on the current map and keeps ticking.
    assert_eq!(world.active_map_id(), Some(TOWN));
    world.tick(false).expect("tick");
}

#[test]
fn lifecycle_misuse_is_rejected() {
    let mut world = town_and_cave();
    assert!(matches!(world.tick(false), Err(WorldError::NotRunning)));
    assert!(matches!(
        world.register_map(TOWN, Box::new(Town)),
        Err(WorldError::DuplicateMap(id)) if id == TOWN
    ));

    world
        .start(TOWN, Party::new(TileImage::new(7), 1), Position::new(0, 0))
        .expect("start");
    assert!(matches!(
        world.start(TOWN, Party::new(TileImage::new(7), 1), Position::new(0, 0)),
        Err(WorldError::AlreadyRunning)
    ));
}

#[test]
fn object_view_snapshots_are_ordered_by_id() {
    struct Busy;

    impl MapScript for Busy {
        fn construct(&self) -> Result<Map, MapError> {
            let mut map = open_map(4, 4)?;
            let _ = map.place_object(
                tilequest_world::MapObject::new(ObstacleClass::Obstacle, 1),
                Position::new(3, 3),
            )?;
            let _ = map.place_object(
                tilequest_world::MapObject::new(ObstacleClass::Below, 1),
                Position::new(0, 1),
            )?;
            Ok(map)
        }

        fn initialize(&self, _: &mut Map, _: Option<&Value>, _: &mut Value) {}
    }

    let mut world = World::new();
    world
        .register_map(MapId::new(1), Box::new(Busy))
        .expect("register");
    world
        .start(
            MapId::new(1),
            Party::new(TileImage::new(7), 1),
            Position::new(1, 1),
        )
        .expect("start");

    let view = query::object_view(&world);
    assert_eq!(view.len(), 2);
    assert!(view[0].id.get() < view[1].id.get());
    assert_eq!(view[0].position, Some(Position::new(3, 3)));
    assert_eq!(view[1].obstacle, ObstacleClass::Below);
}
