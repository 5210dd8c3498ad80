//! Continuous collision queries over axis-aligned block boxes.

use block_jam_core::BlockId;
use block_jam_world::{query, World};
use glam::Vec2;

/// First obstacle struck by a swept box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweepHit {
    /// Distance travelled along the sweep direction before contact.
    pub distance: f32,
    /// Unit surface normal of the struck face, pointing back at the swept box.
    pub normal: Vec2,
    /// Block that was struck.
    pub other: BlockId,
}

/// Collision queries the move resolver needs from the scene.
pub trait SpatialQuery {
    /// Sweeps a box centered at `origin` along the unit `direction` for at most
    /// `max_distance` and reports the nearest obstacle it would strike.
    ///
    /// Obstacles already overlapping the box at `origin` are ignored, as is
    /// `exclude`, so obstacles behind it are still reported.
    fn sweep(
        &self,
        origin: Vec2,
        half_extents: Vec2,
        direction: Vec2,
        max_distance: f32,
        exclude: Option<BlockId>,
    ) -> Option<SweepHit>;

    /// Lists every obstacle whose interior overlaps the box.
    fn overlap(&self, center: Vec2, half_extents: Vec2) -> Vec<BlockId>;
}

/// Axis-aligned box on the ground plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Center of the box.
    pub center: Vec2,
    /// Half of the box's extent along each axis.
    pub half_extents: Vec2,
}

impl Aabb {
    /// Creates a box from its center and half extents.
    #[must_use]
    pub const fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    /// Minimum corner.
    #[must_use]
    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    /// Maximum corner.
    #[must_use]
    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }

    /// Reports whether the interiors of two boxes intersect; touching faces do not count.
    #[must_use]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        a_min.x < b_max.x && b_min.x < a_max.x && a_min.y < b_max.y && b_min.y < a_max.y
    }
}

/// Flat list of block boxes implementing [`SpatialQuery`] by brute force.
#[derive(Clone, Debug, Default)]
pub struct AabbObstacles {
    obstacles: Vec<(BlockId, Aabb)>,
}

impl AabbObstacles {
    /// Creates an empty obstacle set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the box of every block on the board except `exclude`.
    #[must_use]
    pub fn from_world(world: &World, exclude: Option<BlockId>) -> Self {
        let geometry = query::geometry(world);
        let obstacles = query::block_view(world)
            .iter()
            .filter(|block| Some(block.id) != exclude)
            .map(|block| {
                let size = block.footprint.size();
                let center = geometry.cell_rect_to_world_center(block.footprint.anchor(), size);
                (block.id, Aabb::new(center, geometry.half_extents(size)))
            })
            .collect();
        Self { obstacles }
    }

    /// Adds an obstacle box.
    pub fn push(&mut self, block: BlockId, aabb: Aabb) {
        self.obstacles.push((block, aabb));
    }

    /// Number of obstacles in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    /// Reports whether the set holds no obstacles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }
}

impl SpatialQuery for AabbObstacles {
    fn sweep(
        &self,
        origin: Vec2,
        half_extents: Vec2,
        direction: Vec2,
        max_distance: f32,
        exclude: Option<BlockId>,
    ) -> Option<SweepHit> {
        self.obstacles
            .iter()
            .filter(|(id, _)| Some(*id) != exclude)
            .filter_map(|(id, obstacle)| {
                let expanded = Aabb::new(obstacle.center, obstacle.half_extents + half_extents);
                ray_entry(origin, direction, max_distance, &expanded).map(|(distance, normal)| {
                    SweepHit {
                        distance,
                        normal,
                        other: *id,
                    }
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn overlap(&self, center: Vec2, half_extents: Vec2) -> Vec<BlockId> {
        let query_box = Aabb::new(center, half_extents);
        self.obstacles
            .iter()
            .filter(|(_, obstacle)| obstacle.overlaps(&query_box))
            .map(|(id, _)| *id)
            .collect()
    }
}

/// Slab test of a ray against a box, returning entry distance and face normal.
///
/// Rays starting inside the box report nothing.
fn ray_entry(origin: Vec2, direction: Vec2, max_distance: f32, aabb: &Aabb) -> Option<(f32, Vec2)> {
    let min = aabb.min();
    let max = aabb.max();
    let (enter_x, exit_x) = slab(origin.x, direction.x, min.x, max.x)?;
    let (enter_y, exit_y) = slab(origin.y, direction.y, min.y, max.y)?;

    let enter = enter_x.max(enter_y);
    let exit = exit_x.min(exit_y);
    if enter > exit || enter < 0.0 || enter > max_distance {
        return None;
    }

    let normal = if enter_x >= enter_y {
        Vec2::new(-direction.x.signum(), 0.0)
    } else {
        Vec2::new(0.0, -direction.y.signum())
    };
    Some((enter, normal))
}

fn slab(origin: f32, direction: f32, min: f32, max: f32) -> Option<(f32, f32)> {
    if direction.abs() <= f32::EPSILON {
        if origin <= min || origin >= max {
            return None;
        }
        return Some((f32::NEG_INFINITY, f32::INFINITY));
    }

    let first = (min - origin) / direction;
    let second = (max - origin) / direction;
    Some((first.min(second), first.max(second)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box_at(x: f32, y: f32) -> Aabb {
        Aabb::new(Vec2::new(x, y), Vec2::splat(0.5))
    }

    #[test]
    fn sweep_reports_nearest_face() {
        let mut obstacles = AabbObstacles::new();
        obstacles.push(BlockId::new(1), unit_box_at(3.0, 0.0));
        obstacles.push(BlockId::new(2), unit_box_at(6.0, 0.0));

        let hit = obstacles
            .sweep(Vec2::ZERO, Vec2::splat(0.5), Vec2::X, 10.0, None)
            .expect("hit");
        assert_eq!(hit.other, BlockId::new(1));
        assert!((hit.distance - 2.0).abs() < 1e-5);
        assert_eq!(hit.normal, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn sweep_ignores_obstacles_beyond_range_or_off_axis() {
        let mut obstacles = AabbObstacles::new();
        obstacles.push(BlockId::new(1), unit_box_at(3.0, 0.0));
        obstacles.push(BlockId::new(2), unit_box_at(1.0, 1.0));

        assert!(obstacles
            .sweep(Vec2::ZERO, Vec2::splat(0.5), Vec2::X, 1.5, None)
            .is_none());
        assert!(obstacles
            .sweep(Vec2::ZERO, Vec2::splat(0.5), Vec2::NEG_Y, 5.0, None)
            .is_none());
    }

    #[test]
    fn sweep_skips_obstacles_overlapping_at_start() {
        let mut obstacles = AabbObstacles::new();
        obstacles.push(BlockId::new(1), unit_box_at(0.5, 0.0));
        assert!(obstacles
            .sweep(Vec2::ZERO, Vec2::splat(0.5), Vec2::X, 5.0, None)
            .is_none());
    }

    #[test]
    fn sweep_moving_down_hits_top_face() {
        let mut obstacles = AabbObstacles::new();
        obstacles.push(BlockId::new(4), unit_box_at(0.0, -3.0));
        let hit = obstacles
            .sweep(Vec2::ZERO, Vec2::splat(0.25), Vec2::NEG_Y, 5.0, None)
            .expect("hit");
        assert!((hit.distance - 2.25).abs() < 1e-5);
        assert_eq!(hit.normal, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn excluded_box_does_not_hide_obstacles_behind_it() {
        let mut obstacles = AabbObstacles::new();
        obstacles.push(BlockId::new(1), unit_box_at(3.0, 0.0));
        obstacles.push(BlockId::new(2), unit_box_at(6.0, 0.0));

        let hit = obstacles
            .sweep(
                Vec2::ZERO,
                Vec2::splat(0.5),
                Vec2::X,
                10.0,
                Some(BlockId::new(1)),
            )
            .expect("hit");
        assert_eq!(hit.other, BlockId::new(2));
        assert!((hit.distance - 5.0).abs() < 1e-5);
    }

    #[test]
    fn overlap_ignores_touching_boxes() {
        let mut obstacles = AabbObstacles::new();
        obstacles.push(BlockId::new(1), unit_box_at(1.0, 0.0));
        obstacles.push(BlockId::new(2), unit_box_at(0.5, 0.5));

        let hits = obstacles.overlap(Vec2::ZERO, Vec2::splat(0.5));
        assert_eq!(hits, vec![BlockId::new(2)]);
    }
}
