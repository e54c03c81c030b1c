//! The particle field: advance, prune, top up, thin out.
//!
//! One `ParticleField` drives either ambient fog or explosion smoke; the two
//! differ only in `FieldParams`. Each tick runs four passes in order:
//! advance kinematics (pruning expired and offscreen particles), recompute
//! occupancy, top up under-populated cells, then flag the oldest eligible
//! particles in over-populated cells to fade out.

use bevy::prelude::*;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::config::{
    SMOKE_BURST_MAX, SMOKE_BURST_MIN, SMOKE_COUNT_PER_RADIUS, SMOKE_JITTER_SPEED,
    SMOKE_RADIAL_SPEED, SMOKE_UPDRAFT_SPEED, SMOKE_WIND_CARRY, WIND_JITTER_HALF_ANGLE,
};
use crate::occupancy::CellOccupancy;
use crate::spatial_grid::ViewGrid;
use crate::world::WindState;

use super::types::{FieldParams, Particle};

#[derive(Debug, Clone)]
pub struct ParticleField {
    pub particles: Vec<Particle>,
    pub params: FieldParams,
}

impl ParticleField {
    pub fn new(params: FieldParams) -> Self {
        Self {
            particles: Vec::new(),
            params,
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Particles currently fading out (for stats/debug display).
    pub fn fading_count(&self) -> usize {
        self.particles.iter().filter(|p| p.fading_out).count()
    }

    /// Mean particle age in seconds, 0.0 when empty.
    pub fn average_age(&self) -> f32 {
        if self.particles.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.particles.iter().map(|p| p.age_secs).sum();
        sum / self.particles.len() as f32
    }

    /// One simulation tick over the whole field.
    pub fn update(&mut self, grid: &ViewGrid, wind: &WindState, dt: f32, rng: &mut ChaCha8Rng) {
        self.advance(grid, dt);
        let mut occupancy = CellOccupancy::compute(&self.particles, grid);
        self.top_up(grid, &mut occupancy, wind, rng);
        self.fade_over_target(&occupancy);
    }

    /// Integrate kinematics and prune: offscreen particles go immediately
    /// (no fade), fading particles go when their countdown runs out.
    fn advance(&mut self, grid: &ViewGrid, dt: f32) {
        let bounds = grid.extended_bounds();
        let cull_offscreen = self.params.cull_offscreen;
        self.particles.retain_mut(|p| {
            p.position += p.velocity * dt;
            p.age_secs += dt;
            if cull_offscreen && !bounds.contains(p.position) {
                return false;
            }
            if p.fading_out {
                p.fade_secs_left -= dt;
                if p.fade_secs_left <= 0.0 {
                    return false;
                }
            }
            true
        });
    }

    /// Synthesize particles in every cell below the minimum population. The
    /// live counts are incremented as we go so later cells in the same pass
    /// don't over-correct.
    fn top_up(
        &mut self,
        grid: &ViewGrid,
        occupancy: &mut CellOccupancy,
        wind: &WindState,
        rng: &mut ChaCha8Rng,
    ) {
        if self.params.min_per_cell == 0 {
            return;
        }
        for cell in 0..grid.cell_count() {
            while occupancy.counts[cell] < self.params.min_per_cell {
                if !self.spawn_wind_particle(grid.cell_bounds(cell), wind, rng) {
                    // Empty palette: leave the cell under target, no error.
                    return;
                }
                occupancy.counts[cell] += 1;
            }
        }
    }

    /// Spawn one wind-driven particle uniformly inside `bounds`. Returns
    /// false when the texture palette is empty.
    fn spawn_wind_particle(&mut self, bounds: Rect, wind: &WindState, rng: &mut ChaCha8Rng) -> bool {
        let position = Vec2::new(
            rng.gen_range(bounds.min.x..bounds.max.x),
            rng.gen_range(bounds.min.y..bounds.max.y),
        );
        let jitter = rng.gen_range(-WIND_JITTER_HALF_ANGLE..WIND_JITTER_HALF_ANGLE);
        let speed = self.params.drift_speed * rng.gen_range(0.9..1.1);
        let velocity = Vec2::from_angle(wind.direction + jitter) * speed;
        self.spawn(position, velocity, rng)
    }

    /// Common spawn path: sample scale/alpha/texture from the field params.
    fn spawn(&mut self, position: Vec2, velocity: Vec2, rng: &mut ChaCha8Rng) -> bool {
        if self.params.palette.is_empty() {
            return false;
        }
        let texture = self.params.palette[rng.gen_range(0..self.params.palette.len())];
        let (scale_min, scale_max) = self.params.scale_range;
        let (alpha_min, alpha_max) = self.params.alpha_range;
        self.particles.push(Particle {
            position,
            velocity,
            scale: rng.gen_range(scale_min..scale_max),
            rotation: 0.0,
            alpha: rng.gen_range(alpha_min..alpha_max),
            age_secs: 0.0,
            fading_out: false,
            fade_secs_left: self.params.fade_out_secs,
            texture,
        });
        true
    }

    /// Flag the oldest eligible particles in over-populated cells. The sort
    /// is stable, so equal ages resolve to insertion order — the particle
    /// that was spawned first wins the tie and fades first.
    pub fn fade_over_target(&mut self, occupancy: &CellOccupancy) {
        let max = self.params.max_per_cell as usize;
        for indices in &occupancy.eligible {
            if indices.len() <= max {
                continue;
            }
            let mut by_age: Vec<usize> = indices.clone();
            by_age.sort_by(|&a, &b| {
                self.particles[b]
                    .age_secs
                    .partial_cmp(&self.particles[a].age_secs)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            for &index in by_age.iter().take(indices.len() - max) {
                self.particles[index].fading_out = true;
            }
        }
    }

    /// One-shot explosion burst over a disk around `center`.
    ///
    /// Positions are area-uniform (`r = sqrt(u) * radius`); velocity blends an
    /// outward radial push, wind carry, a slow updraft, and random jitter.
    /// Unlike steady-state thinning, the per-cell cap is enforced at insert
    /// time: a particle whose target cell is already full is skipped.
    pub fn spawn_burst(
        &mut self,
        grid: &ViewGrid,
        center: Vec2,
        radius: f32,
        wind: &WindState,
        rng: &mut ChaCha8Rng,
    ) {
        let count =
            ((radius * SMOKE_COUNT_PER_RADIUS) as usize).clamp(SMOKE_BURST_MIN, SMOKE_BURST_MAX);
        let mut occupancy = CellOccupancy::compute(&self.particles, grid);

        for _ in 0..count {
            let angle = rng.gen_range(0.0..std::f32::consts::TAU);
            let distance = rng.gen::<f32>().sqrt() * radius;
            let outward = Vec2::from_angle(angle);
            let position = center + outward * distance;

            // Live occupancy check: skip spawns that would overfill a cell.
            let (col, row) = grid.cell_for_position(position);
            let Some(cell) = grid.cell_index(col, row) else {
                continue;
            };
            if occupancy.counts[cell] >= self.params.max_per_cell {
                continue;
            }

            let velocity = outward * (SMOKE_RADIAL_SPEED * rng.gen_range(0.4..1.0))
                + wind.vector() * (SMOKE_WIND_CARRY * rng.gen_range(0.5..1.0))
                + Vec2::NEG_Y * (SMOKE_UPDRAFT_SPEED * rng.gen_range(0.6..1.0))
                + Vec2::from_angle(rng.gen_range(0.0..std::f32::consts::TAU))
                    * (SMOKE_JITTER_SPEED * rng.gen::<f32>());

            if self.spawn(position, velocity, rng) {
                occupancy.counts[cell] += 1;
            }
        }
    }
}
