//! Collision Resolution
//!
//! Axis-separated swept-AABB movement against static geometry.
//!
//! ## Sweeps and the deviation margin
//!
//! Every sweep is asked for `|d| + margin` and the applied distance is
//! `hit - margin`, so the collider settles `margin` away from whatever it
//! hit. Floating-point error can then eat into the skin without ever
//! pushing the collider through the surface.
//!
//! ## Corner correction
//!
//! When an upward move is blocked, the resolver looks for a small sideways
//! nudge that clears the ceiling, letting a jump that clips a ledge corner
//! slide past it. Horizontal and downward moves are never corrected.
//!
//! ```text
//!   ████████   ░░        ████████ ░░
//!          ┌──┐       →          ┌──┐
//!          │  │                  │  │
//! ```

use bitflags::bitflags;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::aabb::Aabb;
use crate::core::vec2::{Axis, Vec2, sign};
use crate::game::config::CollisionConfig;

/// Horizontal speeds below this count as standing still for corner probes.
const STILL_EPSILON: f32 = 1e-4;

bitflags! {
    /// Named static-geometry layers.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct LayerMask: u32 {
        /// Regular terrain
        const SOLID = 1 << 0;
        /// Geometry that only some actors collide with
        const BARRIER = 1 << 1;
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        LayerMask::SOLID
    }
}

// =============================================================================
// QUERY BACKEND
// =============================================================================

/// Nearest contact reported by a sweep.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepHit {
    /// Distance travelled before contact
    pub distance: f32,
    /// Surface normal at the contact, pointing away from the geometry
    pub normal: Vec2,
}

/// Read-only view of static geometry.
///
/// The resolver depends only on this shape; any spatial store can provide
/// it. Implementations report "nothing in range" as `None`, including for
/// degenerate queries.
pub trait CollisionQuery {
    /// Sweep a box of `half_extents` from `origin` along `direction` for at
    /// most `max_distance`, returning the nearest hit.
    fn sweep(
        &self,
        origin: Vec2,
        half_extents: Vec2,
        direction: Vec2,
        max_distance: f32,
        layer_mask: LayerMask,
    ) -> Option<SweepHit>;

    /// Does a box at `origin` overlap any geometry?
    fn overlap(&self, origin: Vec2, half_extents: Vec2, layer_mask: LayerMask) -> bool;
}

/// One solid box of level geometry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Solid {
    /// World-space bounds
    pub bounds: Aabb,
    /// Layers this solid belongs to
    pub layers: LayerMask,
}

/// Brute-force geometry store: a flat list of boxes.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StaticGeometry {
    solids: Vec<Solid>,
}

impl StaticGeometry {
    /// Empty level.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a solid on the given layers.
    pub fn add(&mut self, bounds: Aabb, layers: LayerMask) {
        self.solids.push(Solid { bounds, layers });
    }

    /// Add a [`LayerMask::SOLID`] box from its minimum corner and size.
    pub fn add_box(&mut self, min: Vec2, size: Vec2) {
        self.add(Aabb::from_min_size(min, size), LayerMask::SOLID);
    }

    /// Builder form of [`StaticGeometry::add_box`].
    pub fn with_box(mut self, min: Vec2, size: Vec2) -> Self {
        self.add_box(min, size);
        self
    }

    /// All solids.
    pub fn solids(&self) -> &[Solid] {
        &self.solids
    }

    fn layer_solids(&self, mask: LayerMask) -> impl Iterator<Item = &Solid> {
        self.solids.iter().filter(move |s| s.layers.intersects(mask))
    }
}

impl CollisionQuery for StaticGeometry {
    fn sweep(
        &self,
        origin: Vec2,
        half_extents: Vec2,
        direction: Vec2,
        max_distance: f32,
        layer_mask: LayerMask,
    ) -> Option<SweepHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec2::ZERO || !(max_distance > 0.0) || !origin.is_finite() {
            return None;
        }

        self.layer_solids(layer_mask)
            .filter_map(|solid| sweep_box(origin, half_extents, dir, max_distance, &solid.bounds))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn overlap(&self, origin: Vec2, half_extents: Vec2, layer_mask: LayerMask) -> bool {
        let probe = Aabb::new(origin, half_extents);
        self.layer_solids(layer_mask).any(|s| probe.overlaps(&s.bounds))
    }
}

/// Slab test of a ray against `target` grown by the moving box.
///
/// A box that starts overlapping the target only reports a hit (at zero
/// distance) when moving deeper into it, so an actor resting inside the
/// margin can always move away.
fn sweep_box(
    origin: Vec2,
    half_extents: Vec2,
    dir: Vec2,
    max_distance: f32,
    target: &Aabb,
) -> Option<SweepHit> {
    let grown = target.expanded(half_extents);
    let (min, max) = (grown.min(), grown.max());

    let mut t_entry = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut entry_normal = Vec2::ZERO;

    for axis in [Axis::Horizontal, Axis::Vertical] {
        let o = origin.get(axis);
        let d = dir.get(axis);
        let (lo, hi) = (min.get(axis), max.get(axis));

        if d == 0.0 {
            // Parallel: must be strictly inside the slab
            if o <= lo || o >= hi {
                return None;
            }
            continue;
        }

        let t1 = (lo - o) / d;
        let t2 = (hi - o) / d;
        let (near, far) = if t1 < t2 { (t1, t2) } else { (t2, t1) };

        if near > t_entry {
            t_entry = near;
            entry_normal = Vec2::along(axis, -sign(d));
        }
        t_exit = t_exit.min(far);
    }

    if t_entry > t_exit || t_exit <= 0.0 || t_entry > max_distance {
        return None;
    }

    if t_entry < 0.0 {
        let moving = Aabb::new(origin, half_extents);
        let pen = moving.penetration(target);
        let axis = if pen.x < pen.y { Axis::Horizontal } else { Axis::Vertical };
        let mut outward = sign(origin.get(axis) - target.center.get(axis));
        if outward == 0.0 {
            outward = -sign(dir.get(axis));
        }
        let normal = Vec2::along(axis, outward);
        if dir.dot(normal) >= 0.0 {
            return None;
        }
        return Some(SweepHit { distance: 0.0, normal });
    }

    Some(SweepHit {
        distance: t_entry,
        normal: entry_normal,
    })
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Counters that make resolver decisions observable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionStats {
    /// Times the corner-probe loop ran
    pub corner_probes: u32,
    /// Corrections that succeeded
    pub corrections: u32,
}

impl CorrectionStats {
    /// Fold another set of counters into this one.
    pub fn merge(&mut self, other: CorrectionStats) {
        self.corner_probes += other.corner_probes;
        self.corrections += other.corrections;
    }
}

/// Result of moving along one axis.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct AxisMove {
    /// Displacement actually applied, including any corner nudge
    pub displacement: Vec2,
    /// Movement was stopped by geometry
    pub blocked: bool,
    /// A corner correction was applied
    pub corrected: bool,
}

/// Result of resolving a full tick of movement.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Resolution {
    /// Total displacement applied
    pub displacement: Vec2,
    /// Velocity with blocked components zeroed
    pub velocity: Vec2,
    /// Horizontal move was blocked
    pub blocked_x: bool,
    /// Vertical move was blocked
    pub blocked_y: bool,
    /// A corner correction was applied
    pub corrected: bool,
    /// Probe counters for this tick
    pub stats: CorrectionStats,
}

/// Contact flags from short probes around the collider.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contacts {
    /// Ground directly below
    pub ground: bool,
    /// Ceiling directly above
    pub ceiling: bool,
    /// Wall directly to the left
    pub wall_left: bool,
    /// Wall directly to the right
    pub wall_right: bool,
}

/// Clips movement against a [`CollisionQuery`] backend.
///
/// Stateless: every call is a function of the collider, the requested
/// motion and the geometry.
pub struct CollisionResolver<'a, Q: CollisionQuery + ?Sized> {
    query: &'a Q,
    config: &'a CollisionConfig,
}

impl<'a, Q: CollisionQuery + ?Sized> CollisionResolver<'a, Q> {
    /// Bind a backend and tuning.
    pub fn new(query: &'a Q, config: &'a CollisionConfig) -> Self {
        Self { query, config }
    }

    #[inline]
    fn sweep(&self, collider: &Aabb, direction: Vec2, distance: f32) -> Option<SweepHit> {
        let hit = self.query.sweep(
            collider.center,
            collider.half_extents,
            direction,
            distance,
            self.config.layer_mask,
        );
        #[cfg(feature = "debug-tracing")]
        tracing::trace!(?direction, distance, ?hit, "sweep");
        hit
    }

    /// Move the collider `distance` along `axis`.
    ///
    /// `lateral_velocity` is the horizontal velocity, used to pick the side
    /// corner correction probes. A zero distance never touches the backend.
    pub fn move_axis(
        &self,
        collider: Aabb,
        axis: Axis,
        distance: f32,
        lateral_velocity: f32,
        stats: &mut CorrectionStats,
    ) -> AxisMove {
        let mut result = AxisMove::default();
        if distance == 0.0 || !distance.is_finite() {
            return result;
        }

        let margin = self.config.deviation_margin;
        let mut collider = collider;
        let mut remaining = distance;
        let mut corrections = 0u32;

        loop {
            let dir_sign = sign(remaining);
            let dir = Vec2::along(axis, dir_sign);

            let Some(hit) = self.sweep(&collider, dir, remaining.abs() + margin) else {
                result.displacement += Vec2::along(axis, remaining);
                return result;
            };

            let step = (hit.distance - margin).clamp(0.0, remaining.abs()) * dir_sign;
            collider = collider.translated(Vec2::along(axis, step));
            result.displacement += Vec2::along(axis, step);
            remaining -= step;

            let upward = axis == Axis::Vertical && dir_sign > 0.0;
            if upward && remaining > 0.0 && corrections < self.config.correction_iterations {
                if let Some(offset) = self.corner_correct(&collider, remaining, lateral_velocity, stats) {
                    debug!(offset, remaining, "corner correction");
                    collider = collider.translated(Vec2::new(offset, 0.0));
                    result.displacement.x += offset;
                    result.corrected = true;
                    corrections += 1;
                    continue;
                }
            }

            result.blocked = true;
            return result;
        }
    }

    /// Search for a sideways nudge that clears an upward move of `remaining`.
    fn corner_correct(
        &self,
        collider: &Aabb,
        remaining: f32,
        lateral_velocity: f32,
        stats: &mut CorrectionStats,
    ) -> Option<f32> {
        let steps = self.config.corner_probe_count();
        let step = self.config.corner_probe_step;
        if steps == 0 || step <= 0.0 {
            return None;
        }
        stats.corner_probes += 1;

        let margin = self.config.deviation_margin;
        let sides: &[f32] = if lateral_velocity.abs() < STILL_EPSILON {
            &[1.0, -1.0]
        } else if lateral_velocity > 0.0 {
            &[1.0]
        } else {
            &[-1.0]
        };

        for i in 1..=steps {
            for &side in sides {
                let offset = side * i as f32 * step;

                if self.sweep(collider, Vec2::new(side, 0.0), offset.abs() + margin).is_some() {
                    continue;
                }
                let shifted = collider.translated(Vec2::new(offset, 0.0));
                if self.sweep(&shifted, Vec2::UP, remaining + margin).is_none() {
                    stats.corrections += 1;
                    return Some(offset);
                }
            }
        }
        None
    }

    /// Resolve one tick of motion: horizontal first, then vertical from the
    /// post-horizontal position. Blocked velocity components are zeroed.
    pub fn resolve(&self, collider: Aabb, velocity: Vec2, dt: f32) -> Resolution {
        let mut stats = CorrectionStats::default();
        let mut velocity = velocity;

        let x = self.move_axis(collider, Axis::Horizontal, velocity.x * dt, velocity.x, &mut stats);
        if x.blocked {
            velocity.x = 0.0;
        }

        let moved = collider.translated(x.displacement);
        let y = self.move_axis(moved, Axis::Vertical, velocity.y * dt, velocity.x, &mut stats);
        if y.blocked {
            velocity.y = 0.0;
        }

        Resolution {
            displacement: x.displacement + y.displacement,
            velocity,
            blocked_x: x.blocked,
            blocked_y: y.blocked,
            corrected: y.corrected,
            stats,
        }
    }

    /// Probe a short distance in each direction, independent of movement.
    pub fn contacts(&self, collider: Aabb) -> Contacts {
        let reach = self.config.contact_distance + self.config.deviation_margin;
        Contacts {
            ground: self.sweep(&collider, Vec2::DOWN, reach).is_some(),
            ceiling: self.sweep(&collider, Vec2::UP, reach).is_some(),
            wall_left: self.sweep(&collider, Vec2::LEFT, reach).is_some(),
            wall_right: self.sweep(&collider, Vec2::RIGHT, reach).is_some(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
