//! Light sources the fog thins around.
//!
//! The host rebuilds this resource from the active location's light sources
//! every tick; it is transient and never persisted. An absent/empty table
//! just means no thinning.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy)]
pub struct LightInfo {
    pub position: Vec2,
    pub radius_px: f32,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct LightSources(pub Vec<LightInfo>);

impl LightSources {
    /// Lights whose radius reaches `pos`.
    pub fn lights_reaching(&self, pos: Vec2) -> impl Iterator<Item = &LightInfo> {
        self.0
            .iter()
            .filter(move |l| pos.distance(l.position) < l.radius_px)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lights_reaching_filters_by_radius() {
        let lights = LightSources(vec![
            LightInfo {
                position: Vec2::ZERO,
                radius_px: 100.0,
            },
            LightInfo {
                position: Vec2::new(500.0, 0.0),
                radius_px: 50.0,
            },
        ]);
        let reaching: Vec<_> = lights.lights_reaching(Vec2::new(30.0, 0.0)).collect();
        assert_eq!(reaching.len(), 1);
        assert_eq!(reaching[0].radius_px, 100.0);
    }
}
