//! Seeded point clouds for the nebula and the accretion disk.

use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::color::Rgb;

pub const NEBULA_POINTS: usize = 2000;
pub const NEBULA_RADIUS: f32 = 5.0;
pub const DISK_POINTS: usize = 1000;
pub const DISK_INNER_RADIUS: f32 = 2.0;
pub const DISK_OUTER_RADIUS: f32 = 4.0;
pub const DISK_THICKNESS: f32 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticleField {
    pub positions: Vec<[f32; 3]>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<Rgb>,
}

impl ParticleField {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn max_radius(&self) -> f32 {
        self.positions
            .iter()
            .map(|[x, y, z]| (x * x + y * y + z * z).sqrt())
            .fold(0.0, f32::max)
    }
}

/// Points scattered through a ball of `radius`, coloured between `inner` and
/// `outer`.
pub fn nebula_cloud(seed: u64, count: usize, radius: f32, inner: Rgb, outer: Rgb) -> ParticleField {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut positions = Vec::with_capacity(count);
    let mut colors = Vec::with_capacity(count);
    for _ in 0..count {
        let r = rng.gen::<f32>() * radius;
        let theta = rng.gen::<f32>() * TAU;
        let phi = (2.0 * rng.gen::<f32>() - 1.0).acos();
        positions.push([
            r * phi.sin() * theta.cos(),
            r * phi.sin() * theta.sin(),
            r * phi.cos(),
        ]);
        colors.push(inner.lerp(outer, rng.gen::<f32>()));
    }
    ParticleField { positions, colors }
}

/// Flat annulus in the XZ plane with a little vertical jitter.
pub fn accretion_disk(seed: u64, count: usize) -> ParticleField {
    let mut rng = StdRng::seed_from_u64(seed);
    let positions = (0..count)
        .map(|_| {
            let r = DISK_INNER_RADIUS + rng.gen::<f32>() * (DISK_OUTER_RADIUS - DISK_INNER_RADIUS);
            let theta = rng.gen::<f32>() * TAU;
            let y = (rng.gen::<f32>() - 0.5) * DISK_THICKNESS;
            [r * theta.cos(), y, r * theta.sin()]
        })
        .collect();
    ParticleField {
        positions,
        colors: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nebula_stays_inside_its_ball() {
        let cloud = nebula_cloud(
            7,
            NEBULA_POINTS,
            NEBULA_RADIUS,
            Rgb::from_u32(0x442288),
            Rgb::from_u32(0xff00aa),
        );
        assert_eq!(cloud.len(), NEBULA_POINTS);
        assert_eq!(cloud.colors.len(), NEBULA_POINTS);
        assert!(cloud.max_radius() <= NEBULA_RADIUS + 1e-4);
    }

    #[test]
    fn disk_points_lie_on_annulus() {
        let disk = accretion_disk(11, DISK_POINTS);
        for [x, y, z] in &disk.positions {
            let r = (x * x + z * z).sqrt();
            assert!((DISK_INNER_RADIUS - 1e-4..=DISK_OUTER_RADIUS + 1e-4).contains(&r));
            assert!(y.abs() <= DISK_THICKNESS / 2.0 + 1e-6);
        }
        assert!(disk.colors.is_empty());
    }

    #[test]
    fn same_seed_same_field() {
        assert_eq!(accretion_disk(3, 64), accretion_disk(3, 64));
        assert_ne!(accretion_disk(3, 64), accretion_disk(4, 64));
    }
}
