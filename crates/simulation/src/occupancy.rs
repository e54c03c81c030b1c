//! Per-cell particle occupancy index.
//!
//! Recomputed after every advance pass: per-cell totals plus per-cell lists
//! of indices for particles that are NOT already fading out. The density
//! controller needs both — totals decide top-up, while the eligible lists
//! are the only pool further fade-outs may be drawn from, so a particle is
//! never flagged twice.

use crate::particles::types::Particle;
use crate::spatial_grid::ViewGrid;

#[derive(Debug, Clone)]
pub struct CellOccupancy {
    /// All in-bounds particles per cell, fading or not.
    pub counts: Vec<u32>,
    /// Indices into the particle collection, non-fading particles only.
    pub eligible: Vec<Vec<usize>>,
}

impl CellOccupancy {
    pub fn compute(particles: &[Particle], grid: &ViewGrid) -> Self {
        let cells = grid.cell_count();
        let mut counts = vec![0u32; cells];
        let mut eligible = vec![Vec::new(); cells];

        for (index, particle) in particles.iter().enumerate() {
            let (col, row) = grid.cell_for_position(particle.position);
            // Out-of-range cells are effectively off-grid already; those
            // particles are pending removal and don't participate in
            // density control.
            let Some(cell) = grid.cell_index(col, row) else {
                continue;
            };
            counts[cell] += 1;
            if !particle.fading_out {
                eligible[cell].push(index);
            }
        }

        Self { counts, eligible }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::types::TextureHandle;
    use bevy::math::Vec2;

    fn particle_at(pos: Vec2, fading: bool) -> Particle {
        Particle {
            position: pos,
            velocity: Vec2::ZERO,
            scale: 1.0,
            rotation: 0.0,
            alpha: 0.3,
            age_secs: 0.0,
            fading_out: fading,
            fade_secs_left: 4.0,
            texture: TextureHandle(0),
        }
    }

    #[test]
    fn test_counts_include_fading_but_eligible_excludes_them() {
        let grid = ViewGrid::build(Vec2::ZERO, Vec2::new(512.0, 512.0), 256.0, 0);
        let center = grid.cell_bounds(0).center();
        let particles = vec![
            particle_at(center, false),
            particle_at(center, true),
            particle_at(center, false),
        ];
        let occ = CellOccupancy::compute(&particles, &grid);
        assert_eq!(occ.counts[0], 3);
        assert_eq!(occ.eligible[0], vec![0, 2]);
    }

    #[test]
    fn test_off_grid_particles_are_skipped() {
        let grid = ViewGrid::build(Vec2::ZERO, Vec2::new(512.0, 512.0), 256.0, 0);
        let outside = grid.origin - Vec2::splat(1000.0);
        let occ = CellOccupancy::compute(&[particle_at(outside, false)], &grid);
        assert!(occ.counts.iter().all(|&c| c == 0));
        assert!(occ.eligible.iter().all(|list| list.is_empty()));
    }

    #[test]
    fn test_counts_never_below_eligible() {
        let grid = ViewGrid::build(Vec2::ZERO, Vec2::new(1024.0, 1024.0), 256.0, 1);
        let mut particles = Vec::new();
        for index in 0..grid.cell_count() {
            let c = grid.cell_bounds(index).center();
            particles.push(particle_at(c, index % 3 == 0));
            particles.push(particle_at(c, false));
        }
        let occ = CellOccupancy::compute(&particles, &grid);
        for (cell, list) in occ.eligible.iter().enumerate() {
            assert!(occ.counts[cell] as usize >= list.len());
        }
    }
}
