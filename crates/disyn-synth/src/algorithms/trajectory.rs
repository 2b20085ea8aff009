//! Trajectory oscillator: a point bouncing inside a regular polygon.
//!
//! The polygon is inscribed in the unit circle with vertices at
//! `2πi/n + π/n`, wound counter-clockwise, so every edge's outward normal
//! is the edge vector rotated clockwise. The point starts just inside the
//! wall hit by a ray from the origin at the launch angle and moves along
//! that angle at `4·pitch / sample_rate` units per sample.
//!
//! Each sample the point advances by its velocity. If the new position is
//! outside, the most-penetrated edge reflects the velocity (optionally
//! rotated by a random jitter) and the point is pushed back inside along
//! that edge's normal. At most two reflections are resolved per sample;
//! whatever remains is accepted and bounded by the output clamp.
//!
//! | Param | Range |
//! |-------|-------|
//! | 1 | sides 3..12 |
//! | 2 | launch angle 0..360° |
//! | 3 | bounce jitter 0..10° |

use core::f32::consts::{PI, TAU};

use disyn_core::{clamp_abs, clamp01};
use libm::{cosf, hypotf, roundf, sinf};

use super::kernels::Lcg;
use super::{Algorithm, AlgorithmContext, AlgorithmOutput};

/// Most polygon sides supported.
pub const MAX_SIDES: usize = 12;
/// Fewest polygon sides supported.
pub const MIN_SIDES: usize = 3;

const MAX_BOUNCES: usize = 2;
const WALL_NUDGE: f32 = 1e-4;
const INSIDE_TOLERANCE: f32 = 1e-6;
const START_INSET: f32 = 0.995;
const MAX_JITTER_DEG: f32 = 10.0;
const JITTER_SEED: u32 = 0x1234_5678;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Vec2 {
    x: f32,
    y: f32,
}

impl Vec2 {
    const ZERO: Self = Self { x: 0.0, y: 0.0 };

    fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn from_angle(angle: f32) -> Self {
        Self::new(cosf(angle), sinf(angle))
    }

    fn add(self, o: Self) -> Self {
        Self::new(self.x + o.x, self.y + o.y)
    }

    fn sub(self, o: Self) -> Self {
        Self::new(self.x - o.x, self.y - o.y)
    }

    fn scale(self, k: f32) -> Self {
        Self::new(self.x * k, self.y * k)
    }

    fn dot(self, o: Self) -> f32 {
        self.x * o.x + self.y * o.y
    }

    fn cross(self, o: Self) -> f32 {
        self.x * o.y - self.y * o.x
    }

    fn normalized(self) -> Self {
        let len = hypotf(self.x, self.y);
        if len < 1e-6 {
            Self::ZERO
        } else {
            self.scale(1.0 / len)
        }
    }

    fn reflect(self, normal: Self) -> Self {
        self.sub(normal.scale(2.0 * self.dot(normal)))
    }

    fn rotate(self, angle: f32) -> Self {
        let (s, c) = (sinf(angle), cosf(angle));
        Self::new(self.x * c - self.y * s, self.x * s + self.y * c)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Edge {
    start: Vec2,
    end: Vec2,
    normal: Vec2,
}

/// Fixed-capacity regular polygon.
#[derive(Debug, Clone)]
struct Polygon {
    edges: [Edge; MAX_SIDES],
    sides: usize,
}

impl Polygon {
    fn regular(sides: usize) -> Self {
        let sides = sides.clamp(MIN_SIDES, MAX_SIDES);
        let rotation = PI / sides as f32;
        let mut vertices = [Vec2::ZERO; MAX_SIDES];
        for (i, v) in vertices.iter_mut().take(sides).enumerate() {
            *v = Vec2::from_angle(TAU * i as f32 / sides as f32 + rotation);
        }

        let mut edges = [Edge::default(); MAX_SIDES];
        for i in 0..sides {
            let start = vertices[i];
            let end = vertices[(i + 1) % sides];
            let dir = end.sub(start);
            edges[i] = Edge {
                start,
                end,
                normal: Vec2::new(dir.y, -dir.x).normalized(),
            };
        }
        Self { edges, sides }
    }

    fn edges(&self) -> &[Edge] {
        &self.edges[..self.sides]
    }

    fn contains(&self, p: Vec2) -> bool {
        self.edges()
            .iter()
            .all(|e| e.end.sub(e.start).cross(p.sub(e.start)) >= -INSIDE_TOLERANCE)
    }

    /// Edge the point is furthest outside of, with its penetration depth.
    fn deepest_penetration(&self, p: Vec2) -> Option<(f32, Vec2)> {
        let mut worst: Option<(f32, Vec2)> = None;
        for e in self.edges() {
            let depth = p.sub(e.start).dot(e.normal);
            if depth > 0.0 && worst.is_none_or(|(d, _)| depth > d) {
                worst = Some((depth, e.normal));
            }
        }
        worst
    }

    /// Nearest wall hit by a ray from the origin.
    fn ray_hit(&self, dir: Vec2) -> Option<Vec2> {
        let mut best: Option<f32> = None;
        for e in self.edges() {
            let segment = e.end.sub(e.start);
            let denom = dir.cross(segment);
            if denom.abs() < 1e-6 {
                continue;
            }
            let t = e.start.cross(segment) / denom;
            let u = e.start.cross(dir) / denom;
            if t >= 0.0 && (0.0..=1.0).contains(&u) && best.is_none_or(|b| t < b) {
                best = Some(t);
            }
        }
        best.map(|t| dir.scale(t))
    }
}

/// Bouncing-point oscillator; outputs the `(x, y)` position.
#[derive(Debug, Clone)]
pub struct Trajectory {
    sample_rate: f32,
    output_limit: f32,
    polygon: Polygon,
    launch_angle: f32,
    jitter: f32,
    frequency: f32,
    speed: f32,
    position: Vec2,
    velocity: Vec2,
    rng: Lcg,
}

impl Trajectory {
    /// Side count for a normalized control.
    pub fn sides_for(p1: f32) -> usize {
        (MIN_SIDES + roundf(clamp01(p1) * 9.0) as usize).clamp(MIN_SIDES, MAX_SIDES)
    }

    /// Current side count.
    pub fn sides(&self) -> usize {
        self.polygon.sides
    }

    /// Distance travelled per sample.
    pub fn speed(&self) -> f32 {
        self.speed
    }

    fn speed_for(&self, freq: f32) -> f32 {
        freq * 4.0 / self.sample_rate
    }

    fn reset_position(&mut self) {
        let dir = Vec2::from_angle(self.launch_angle);
        self.position = self
            .polygon
            .ray_hit(dir)
            .map_or(Vec2::ZERO, |hit| hit.scale(START_INSET));
    }

    fn update_velocity(&mut self) {
        self.velocity = Vec2::from_angle(self.launch_angle).scale(self.speed);
    }

    fn update_params(&mut self, pitch: f32, p1: f32, p2: f32, p3: f32) {
        let sides = Self::sides_for(p1);
        let angle = (clamp01(p2) * 360.0).to_radians();
        let jitter = (clamp01(p3) * MAX_JITTER_DEG).to_radians();

        let sides_changed = sides != self.polygon.sides;
        let launch_changed = (angle - self.launch_angle).abs() > 1e-6;
        let pitch_changed = (pitch - self.frequency).abs() > 1e-6;

        if sides_changed {
            self.polygon = Polygon::regular(sides);
        }
        self.launch_angle = angle;
        self.jitter = jitter;
        if pitch_changed {
            self.frequency = pitch;
            self.speed = self.speed_for(pitch);
        }

        if sides_changed || launch_changed {
            self.reset_position();
            self.update_velocity();
        } else if pitch_changed {
            // Keep the direction of travel, change only the speed.
            self.velocity = self.velocity.normalized().scale(self.speed);
            if self.velocity == Vec2::ZERO {
                self.update_velocity();
            }
        }
    }

    fn jittered(&mut self, v: Vec2) -> Vec2 {
        if self.jitter <= 0.0 {
            return v;
        }
        let angle = (self.rng.next_unit() * 2.0 - 1.0) * self.jitter;
        v.rotate(angle)
    }
}

impl Algorithm for Trajectory {
    fn new(ctx: AlgorithmContext) -> Self {
        let mut t = Self {
            sample_rate: ctx.sample_rate,
            output_limit: ctx.guards.output_limit,
            polygon: Polygon::regular(6),
            launch_angle: 0.0,
            jitter: 0.0,
            frequency: 440.0,
            speed: 0.0,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            rng: Lcg::new(JITTER_SEED),
        };
        t.speed = t.speed_for(t.frequency);
        t.reset();
        t
    }

    fn reset(&mut self) {
        self.rng.reset();
        self.reset_position();
        self.update_velocity();
    }

    fn process(&mut self, pitch: f32, p1: f32, p2: f32, p3: f32) -> AlgorithmOutput {
        self.update_params(pitch, p1, p2, p3);

        let mut current = self.position;
        let mut velocity = self.velocity;
        for _ in 0..MAX_BOUNCES {
            let next = current.add(velocity);
            if self.polygon.contains(next) {
                current = next;
                break;
            }
            let Some((depth, normal)) = self.polygon.deepest_penetration(next) else {
                current = next;
                break;
            };
            velocity = self.jittered(velocity.reflect(normal));
            current = next.sub(normal.scale(depth + WALL_NUDGE));
        }

        self.position = current;
        self.velocity = velocity;
        AlgorithmOutput::new(
            clamp_abs(current.x, self.output_limit),
            clamp_abs(current.y, self.output_limit),
        )
    }
}
