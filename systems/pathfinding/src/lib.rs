#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic A* search over the tile grid.
//!
//! The search is pure: legality of an individual step is delegated to a
//! caller-supplied predicate so the algorithm never holds a reference to the
//! world. Edge cost is uniform (1 per step) and the heuristic is Manhattan
//! distance, admissible on 4-directional grids. Equal-cost frontier entries
//! are ordered by a monotonically increasing insertion counter, which keeps
//! the produced path identical across runs when several shortest paths
//! exist.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tilequest_core::{Direction, Position};

/// Computes a shortest sequence of directions from `start` to `goal`.
///
/// `is_step_legal(from, direction)` must report whether a single step from
/// `from` in `direction` is permitted; it is consulted read-only and must
/// not mutate world state. Returns `None` when the goal is unreachable and
/// an empty sequence when `start == goal`.
///
/// Positions outside `[0, columns) x [0, rows)` are never expanded, so the
/// predicate is only ever asked about in-bounds source tiles.
#[must_use]
pub fn find_path<F>(
    columns: u32,
    rows: u32,
    start: Position,
    goal: Position,
    mut is_step_legal: F,
) -> Option<Vec<Direction>>
where
    F: FnMut(Position, Direction) -> bool,
{
    let node_count = usize::try_from(u64::from(columns) * u64::from(rows)).ok()?;
    let start_index = node_index(columns, rows, start)?;
    let goal_index = node_index(columns, rows, goal)?;

    if start == goal {
        return Some(Vec::new());
    }

    let mut closed = vec![false; node_count];
    let mut best_g = vec![u32::MAX; node_count];
    let mut parent: Vec<Option<(usize, Direction)>> = vec![None; node_count];
    let mut open: BinaryHeap<Reverse<OpenEntry>> = BinaryHeap::new();
    let mut sequence: u64 = 0;

    best_g[start_index] = 0;
    open.push(Reverse(OpenEntry {
        f_cost: start.manhattan_distance(goal),
        g_cost: 0,
        sequence,
        position: start,
    }));

    while let Some(Reverse(entry)) = open.pop() {
        let Some(current_index) = node_index(columns, rows, entry.position) else {
            continue;
        };
        if closed[current_index] {
            continue;
        }
        closed[current_index] = true;

        if current_index == goal_index {
            return Some(reconstruct(&parent, start_index, goal_index));
        }

        let current_g = best_g[current_index];
        for direction in Direction::ALL {
            let neighbor = entry.position.step(direction, 1);
            let Some(neighbor_index) = node_index(columns, rows, neighbor) else {
                continue;
            };
            if closed[neighbor_index] {
                continue;
            }
            if !is_step_legal(entry.position, direction) {
                continue;
            }

            let tentative_g = current_g.saturating_add(1);
            if tentative_g >= best_g[neighbor_index] {
                continue;
            }

            best_g[neighbor_index] = tentative_g;
            parent[neighbor_index] = Some((current_index, direction));
            sequence = sequence.saturating_add(1);
            open.push(Reverse(OpenEntry {
                f_cost: tentative_g.saturating_add(neighbor.manhattan_distance(goal)),
                g_cost: tentative_g,
                sequence,
                position: neighbor,
            }));
        }
    }

    None
}

/// Frontier entry ordered by `(f, g, insertion sequence)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenEntry {
    f_cost: u32,
    g_cost: u32,
    sequence: u64,
    position: Position,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.f_cost, self.g_cost, self.sequence).cmp(&(
            other.f_cost,
            other.g_cost,
            other.sequence,
        ))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

fn node_index(columns: u32, rows: u32, position: Position) -> Option<usize> {
    if position.x() < 0 || position.y() < 0 {
        return None;
    }
    let x = position.x() as u32;
    let y = position.y() as u32;
    if x >= columns || y >= rows {
        return None;
    }
    let width = usize::try_from(columns).ok()?;
    let row = usize::try_from(y).ok()?;
    let column = usize::try_from(x).ok()?;
    row.checked_mul(width)?.checked_add(column)
}

fn reconstruct(
    parent: &[Option<(usize, Direction)>],
    start_index: usize,
    goal_index: usize,
) -> Vec<Direction> {
    let mut directions = Vec::new();
    let mut cursor = goal_index;
    while cursor != start_index {
        let Some((previous, direction)) = parent[cursor] else {
            break;
        };
        directions.push(direction);
        cursor = previous;
    }
    directions.reverse();
    directions
}
