//! Immutable-per-map description of terrain and scenario tiles.

use thiserror::Error;
use tilequest_core::{Direction, ObstacleClass, Position};

/// Opaque handle to a tile image owned by the presentation collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileImage(u32);

impl TileImage {
    /// Creates a new image handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Single grid cell of one layer.
///
/// The obstacle classification is fixed once loaded; `Above` tiles are drawn
/// over entities, `Below` under them, and `Obstacle`/`Counter` tiles block
/// movement regardless of the per-direction openings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    obstacle: ObstacleClass,
    open: [bool; 4],
    image: TileImage,
}

impl Tile {
    /// Creates a tile that is enterable from every direction.
    #[must_use]
    pub const fn new(obstacle: ObstacleClass, image: TileImage) -> Self {
        Self {
            obstacle,
            open: [true; 4],
            image,
        }
    }

    /// Replaces the per-direction enterability table.
    ///
    /// The table is indexed by [`Direction::index`] with the mover's travel
    /// direction.
    #[must_use]
    pub const fn with_openings(mut self, open: [bool; 4]) -> Self {
        self.open = open;
        self
    }

    /// Obstacle classification of the tile.
    #[must_use]
    pub const fn obstacle(&self) -> ObstacleClass {
        self.obstacle
    }

    /// Reports whether the tile may be entered travelling in `direction`.
    #[must_use]
    pub const fn is_open(&self, direction: Direction) -> bool {
        self.open[direction.index()]
    }

    /// Image handle forwarded untouched to the presentation collaborator.
    #[must_use]
    pub const fn image(&self) -> TileImage {
        self.image
    }
}

/// Errors raised by grid construction and tile lookups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// A position was used to index outside the grid extent.
    #[error("position ({x}, {y}) lies outside the {columns}x{rows} grid")]
    OutOfBounds {
        /// Column of the offending position.
        x: i32,
        /// Row of the offending position.
        y: i32,
        /// Grid width in tiles.
        columns: u32,
        /// Grid height in tiles.
        rows: u32,
    },
    /// A layer was constructed with a tile count that does not match its
    /// declared dimensions.
    #[error("layer holds {actual} tiles but {columns}x{rows} requires {expected}")]
    TileCountMismatch {
        /// Declared layer width in tiles.
        columns: u32,
        /// Declared layer height in tiles.
        rows: u32,
        /// Tile count implied by the dimensions.
        expected: usize,
        /// Tile count actually provided.
        actual: usize,
    },
    /// A scenario layer does not share the terrain layer's dimensions.
    #[error("scenario layer {layer} is {actual_columns}x{actual_rows}, terrain is {columns}x{rows}")]
    LayerSizeMismatch {
        /// Zero-based index of the offending scenario layer.
        layer: usize,
        /// Terrain width in tiles.
        columns: u32,
        /// Terrain height in tiles.
        rows: u32,
        /// Offending layer width in tiles.
        actual_columns: u32,
        /// Offending layer height in tiles.
        actual_rows: u32,
    },
    /// A layer was constructed with a zero-area extent.
    #[error("grid layers require non-zero dimensions")]
    EmptyLayer,
    /// A grid was constructed without any scenario layer.
    #[error("a map grid requires at least one scenario layer")]
    MissingScenarioLayer,
}

/// Dense row-major matrix of tiles forming one map layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileLayer {
    columns: u32,
    rows: u32,
    tiles: Vec<Tile>,
}

impl TileLayer {
    /// Creates a layer from row-major tile data.
    pub fn new(columns: u32, rows: u32, tiles: Vec<Tile>) -> Result<Self, GridError> {
        if columns == 0 || rows == 0 {
            return Err(GridError::EmptyLayer);
        }
        let expected = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(usize::MAX);
        if tiles.len() != expected {
            return Err(GridError::TileCountMismatch {
                columns,
                rows,
                expected,
                actual: tiles.len(),
            });
        }
        Ok(Self {
            columns,
            rows,
            tiles,
        })
    }

    /// Creates a layer filled with copies of one tile.
    pub fn filled(columns: u32, rows: u32, tile: Tile) -> Result<Self, GridError> {
        if columns == 0 || rows == 0 {
            return Err(GridError::EmptyLayer);
        }
        let count = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(usize::MAX);
        Ok(Self {
            columns,
            rows,
            tiles: vec![tile; count],
        })
    }

    /// Width of the layer in tiles.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Height of the layer in tiles.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Reports whether the position lies within the layer extent.
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        self.index(position).is_some()
    }

    /// Retrieves the tile at `position`.
    ///
    /// Out-of-bounds lookups are an error, never a silent clamp or wrap.
    pub fn tile(&self, position: Position) -> Result<&Tile, GridError> {
        self.index(position)
            .and_then(|index| self.tiles.get(index))
            .ok_or(GridError::OutOfBounds {
                x: position.x(),
                y: position.y(),
                columns: self.columns,
                rows: self.rows,
            })
    }

    /// Replaces the tile at `position`.
    pub fn set_tile(&mut self, position: Position, tile: Tile) -> Result<(), GridError> {
        let index = self.index(position).ok_or(GridError::OutOfBounds {
            x: position.x(),
            y: position.y(),
            columns: self.columns,
            rows: self.rows,
        })?;
        self.tiles[index] = tile;
        Ok(())
    }

    fn tile_opt(&self, position: Position) -> Option<&Tile> {
        self.index(position).and_then(|index| self.tiles.get(index))
    }

    fn index(&self, position: Position) -> Option<usize> {
        if position.x() < 0 || position.y() < 0 {
            return None;
        }
        let x = position.x() as u32;
        let y = position.y() as u32;
        if x >= self.columns || y >= self.rows {
            return None;
        }
        let width = usize::try_from(self.columns).ok()?;
        let row = usize::try_from(y).ok()?;
        let column = usize::try_from(x).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

/// Layered tile matrices describing one map: terrain plus scenario layers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    terrain: TileLayer,
    scenario: Vec<TileLayer>,
}

impl Grid {
    /// Assembles a grid from a terrain layer and at least one scenario layer.
    ///
    /// All layers must share identical dimensions; a mismatch is a
    /// construction-time contract violation.
    pub fn new(terrain: TileLayer, scenario: Vec<TileLayer>) -> Result<Self, GridError> {
        if scenario.is_empty() {
            return Err(GridError::MissingScenarioLayer);
        }
        for (layer, tiles) in scenario.iter().enumerate() {
            if tiles.columns() != terrain.columns() || tiles.rows() != terrain.rows() {
                return Err(GridError::LayerSizeMismatch {
                    layer,
                    columns: terrain.columns(),
                    rows: terrain.rows(),
                    actual_columns: tiles.columns(),
                    actual_rows: tiles.rows(),
                });
            }
        }
        Ok(Self { terrain, scenario })
    }

    /// Grid extent as `(columns, rows)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.terrain.columns(), self.terrain.rows())
    }

    /// Reports whether the position lies within the grid extent.
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        self.terrain.contains(position)
    }

    /// Terrain layer of the grid.
    #[must_use]
    pub const fn terrain(&self) -> &TileLayer {
        &self.terrain
    }

    /// Scenario layers of the grid in draw order.
    #[must_use]
    pub fn scenario(&self) -> &[TileLayer] {
        &self.scenario
    }

    /// Mutable access to one scenario layer, for map initialization.
    pub fn scenario_mut(&mut self, layer: usize) -> Option<&mut TileLayer> {
        self.scenario.get_mut(layer)
    }

    /// Reports whether a step travelling in `direction` may land on
    /// `position`: every layer's tile must be non-blocking and open from
    /// that side. Out-of-bounds positions are never walkable.
    #[must_use]
    pub fn walkable(&self, position: Position, direction: Direction) -> bool {
        if !self.contains(position) {
            return false;
        }
        self.layer_iter().all(|layer| {
            layer.tile_opt(position).is_some_and(|tile| {
                !tile.obstacle().blocks_movement() && tile.is_open(direction)
            })
        })
    }

    fn layer_iter(&self) -> impl Iterator<Item = &TileLayer> {
        std::iter::once(&self.terrain).chain(self.scenario.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_tile() -> Tile {
        Tile::new(ObstacleClass::Below, TileImage::new(0))
    }

    fn grid_3x2() -> Grid {
        let terrain = TileLayer::filled(3, 2, open_tile()).expect("terrain");
        let scenario = TileLayer::filled(3, 2, open_tile()).expect("scenario");
        Grid::new(terrain, vec![scenario]).expect("grid")
    }

    #[test]
    fn out_of_bounds_lookup_is_an_error_not_a_clamp() {
        let grid = grid_3x2();
        let result = grid.terrain().tile(Position::new(3, 0));
        assert_eq!(
            result,
            Err(GridError::OutOfBounds {
                x: 3,
                y: 0,
                columns: 3,
                rows: 2
            })
        );
        assert!(grid.terrain().tile(Position::new(-1, 0)).is_err());
        assert!(grid.terrain().tile(Position::new(0, 2)).is_err());
    }

    #[test]
    fn mismatched_layer_sizes_are_rejected() {
        let terrain = TileLayer::filled(3, 2, open_tile()).expect("terrain");
        let scenario = TileLayer::filled(2, 2, open_tile()).expect("scenario");
        let result = Grid::new(terrain, vec![scenario]);
        assert!(matches!(
            result,
            Err(GridError::LayerSizeMismatch { layer: 0, .. })
        ));
    }

    #[test]
    fn grid_requires_a_scenario_layer() {
        let terrain = TileLayer::filled(3, 2, open_tile()).expect("terrain");
        assert_eq!(
            Grid::new(terrain, Vec::new()),
            Err(GridError::MissingScenarioLayer)
        );
    }

    #[test]
    fn zero_area_layers_are_rejected() {
        assert_eq!(
            TileLayer::filled(0, 4, open_tile()),
            Err(GridError::EmptyLayer)
        );
    }

    #[test]
    fn blocking_tile_on_any_layer_stops_the_step() {
        let mut grid = grid_3x2();
        let wall = Tile::new(ObstacleClass::Obstacle, TileImage::new(7));
        grid.scenario_mut(0)
            .expect("layer")
            .set_tile(Position::new(1, 1), wall)
            .expect("set tile");

        assert!(!grid.walkable(Position::new(1, 1), Direction::Right));
        assert!(grid.walkable(Position::new(0, 1), Direction::Left));
    }

    #[test]
    fn closed_direction_blocks_entry_from_that_side_only() {
        let mut grid = grid_3x2();
        // A ledge enterable from every side except while travelling up.
        let ledge = open_tile().with_openings([false, true, true, true]);
        grid.scenario_mut(0)
            .expect("layer")
            .set_tile(Position::new(1, 0), ledge)
            .expect("set tile");

        assert!(!grid.walkable(Position::new(1, 0), Direction::Up));
        assert!(grid.walkable(Position::new(1, 0), Direction::Right));
    }
}
