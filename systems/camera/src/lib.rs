#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Viewport framing for the presentation adapter.
//!
//! The camera is a pure function from the party's pixel position and a
//! viewport configuration to the background slice origin and the screen
//! offset applied to objects. No camera mode owns mutable state; strategy
//! selection is a plain enum consulted per frame. Every mode produces a
//! slice whose dimensions equal the configured screen size.

use glam::{IVec2, UVec2};
use tilequest_core::{Direction, Position};

/// Static framing configuration shared by all camera modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CameraConfig {
    viewport: UVec2,
    tile_size: u32,
    map_size: UVec2,
}

impl CameraConfig {
    /// Creates a new configuration.
    ///
    /// `viewport` is the screen size in pixels, `tile_size` the square tile
    /// edge in pixels, and `map_size` the map dimensions in tiles.
    #[must_use]
    pub const fn new(viewport: UVec2, tile_size: u32, map_size: UVec2) -> Self {
        Self {
            viewport,
            tile_size,
            map_size,
        }
    }

    /// Screen dimensions in pixels.
    #[must_use]
    pub const fn viewport(&self) -> UVec2 {
        self.viewport
    }

    /// Square tile edge length in pixels.
    #[must_use]
    pub const fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Total map extent in pixels.
    #[must_use]
    pub fn map_pixels(&self) -> UVec2 {
        self.map_size * self.tile_size
    }
}

/// Strategy used to anchor the viewport each frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraMode {
    /// Viewport anchored at a constant pixel coordinate, ignoring the party.
    Fixed {
        /// World-space pixel coordinate of the slice origin.
        origin: IVec2,
    },
    /// Viewport centered on the party, including sub-tile interpolation.
    PartyCentric,
    /// Tracks the party but never scrolls past map edges; maps smaller than
    /// the viewport are centered.
    PartyConfined,
    /// Tracks the party and hard-clamps the slice to the map bounds.
    ScreenConfined,
}

/// Computed framing handed to the presentation adapter for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Top-left pixel of the background slice to display.
    pub slice_origin: IVec2,
    /// Slice dimensions; always equal to the configured viewport.
    pub viewport: UVec2,
    /// Screen-space offset applied when placing objects over the slice.
    pub object_offset: IVec2,
}

/// Pixel position of an entity mid-transit.
///
/// The logical position commits on the first tick of a move, so the visible
/// position lags one tile opposite the facing direction, scaled by the
/// remaining `movement_phase` out of `speed` ticks.
#[must_use]
pub fn transit_pixel_position(
    position: Position,
    facing: Direction,
    movement_phase: u8,
    speed: u8,
    tile_size: u32,
) -> IVec2 {
    let tile = IVec2::new(position.x(), position.y()) * tile_size as i32;
    if movement_phase == 0 || speed == 0 {
        return tile;
    }
    let (dx, dy) = facing.offset();
    let lag = (i64::from(tile_size) * i64::from(movement_phase) / i64::from(speed)) as i32;
    tile - IVec2::new(dx, dy) * lag
}

/// Computes the frame for the provided mode and party pixel position.
#[must_use]
pub fn frame(mode: CameraMode, config: CameraConfig, party_pixels: IVec2) -> Frame {
    let slice_origin = match mode {
        CameraMode::Fixed { origin } => origin,
        CameraMode::PartyCentric => centered_origin(config, party_pixels),
        CameraMode::PartyConfined => {
            confine(centered_origin(config, party_pixels), config, true)
        }
        CameraMode::ScreenConfined => {
            confine(centered_origin(config, party_pixels), config, false)
        }
    };

    Frame {
        slice_origin,
        viewport: config.viewport(),
        object_offset: -slice_origin,
    }
}

fn centered_origin(config: CameraConfig, party_pixels: IVec2) -> IVec2 {
    let half_tile = (config.tile_size() / 2) as i32;
    let half_viewport = (config.viewport() / 2).as_ivec2();
    party_pixels + IVec2::splat(half_tile) - half_viewport
}

fn confine(origin: IVec2, config: CameraConfig, center_small_maps: bool) -> IVec2 {
    let map = config.map_pixels().as_ivec2();
    let viewport = config.viewport().as_ivec2();

    IVec2::new(
        confine_axis(origin.x, map.x, viewport.x, center_small_maps),
        confine_axis(origin.y, map.y, viewport.y, center_small_maps),
    )
}

fn confine_axis(origin: i32, map: i32, viewport: i32, center_small_maps: bool) -> i32 {
    if map >= viewport {
        origin.clamp(0, map - viewport)
    } else if center_small_maps {
        (map - viewport) / 2
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CameraConfig {
        // 20x15 tiles of 16px viewed through a 160x120 window.
        CameraConfig::new(UVec2::new(160, 120), 16, UVec2::new(20, 15))
    }

    #[test]
    fn fixed_mode_ignores_the_party() {
        let anchor = IVec2::new(48, 32);
        let frame = frame(
            CameraMode::Fixed { origin: anchor },
            config(),
            IVec2::new(300, 300),
        );
        assert_eq!(frame.slice_origin, anchor);
        assert_eq!(frame.object_offset, -anchor);
    }

    #[test]
    fn party_centric_centers_the_party_tile() {
        let party = transit_pixel_position(Position::new(10, 7), Direction::Down, 0, 4, 16);
        let frame = frame(CameraMode::PartyCentric, config(), party);

        // Party tile center sits at the viewport center.
        let tile_center = party + IVec2::splat(8);
        assert_eq!(frame.slice_origin + IVec2::new(80, 60), tile_center);
        assert_eq!(frame.viewport, UVec2::new(160, 120));
    }

    #[test]
    fn transit_offset_lags_opposite_the_facing() {
        // Two of four ticks remaining: half a tile behind the logical tile.
        let mid = transit_pixel_position(Position::new(5, 5), Direction::Right, 2, 4, 16);
        assert_eq!(mid, IVec2::new(80 - 8, 80));

        let rest = transit_pixel_position(Position::new(5, 5), Direction::Right, 0, 4, 16);
        assert_eq!(rest, IVec2::new(80, 80));
    }

    #[test]
    fn confined_modes_never_scroll_past_map_edges() {
        for mode in [CameraMode::PartyConfined, CameraMode::ScreenConfined] {
            let corner = transit_pixel_position(Position::new(0, 0), Direction::Down, 0, 4, 16);
            let frame_at_corner = frame(mode, config(), corner);
            assert_eq!(frame_at_corner.slice_origin, IVec2::ZERO);

            let far = transit_pixel_position(Position::new(19, 14), Direction::Down, 0, 4, 16);
            let frame_at_far = frame(mode, config(), far);
            let map = config().map_pixels().as_ivec2();
            let viewport = config().viewport().as_ivec2();
            assert_eq!(frame_at_far.slice_origin, map - viewport);
        }
    }

    #[test]
    fn party_confined_centers_maps_smaller_than_the_viewport() {
        let small = CameraConfig::new(UVec2::new(160, 120), 16, UVec2::new(4, 4));
        let party = transit_pixel_position(Position::new(2, 2), Direction::Down, 0, 4, 16);

        let confined = frame(CameraMode::PartyConfined, small, party);
        assert_eq!(confined.slice_origin, IVec2::new((64 - 160) / 2, (64 - 120) / 2));

        let pinned = frame(CameraMode::ScreenConfined, small, party);
        assert_eq!(pinned.slice_origin, IVec2::ZERO);
    }

    #[test]
    fn every_mode_preserves_viewport_dimensions() {
        let party = IVec2::new(500, -40);
        for mode in [
            CameraMode::Fixed {
                origin: IVec2::new(7, 7),
            },
            CameraMode::PartyCentric,
            CameraMode::PartyConfined,
            CameraMode::ScreenConfined,
        ] {
            assert_eq!(frame(mode, config(), party).viewport, config().viewport());
        }
    }
}
