/// Axis-aligned bounding box in world space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb3 {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Aabb3 {
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Aabb3 { min, max }
    }

    /// Cube of half-size `half_extent` centered on `center`.
    pub fn around(center: [f64; 3], half_extent: f64) -> Self {
        let h = half_extent.abs();
        Aabb3 {
            min: [center[0] - h, center[1] - h, center[2] - h],
            max: [center[0] + h, center[1] + h, center[2] + h],
        }
    }

    pub fn contains(&self, p: [f64; 3]) -> bool {
        (0..3).all(|axis| p[axis] >= self.min[axis] && p[axis] <= self.max[axis])
    }

    /// Slab test. Returns the entry distance along `dir` within `[t_min, t_max]`.
    ///
    /// `dir` does not need to be normalized; the returned distance is expressed
    /// in multiples of `dir`.
    pub fn ray_entry(
        &self,
        origin: [f64; 3],
        dir: [f64; 3],
        mut t_min: f64,
        mut t_max: f64,
    ) -> Option<f64> {
        for axis in 0..3 {
            let o = origin[axis];
            let d = dir[axis];
            let min = self.min[axis];
            let max = self.max[axis];

            if d.abs() < 1e-12 {
                if o < min || o > max {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d;
            let mut t1 = (min - o) * inv;
            let mut t2 = (max - o) * inv;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }

            t_min = t_min.max(t1);
            t_max = t_max.min(t2);
            if t_max < t_min {
                return None;
            }
        }

        Some(t_min.max(0.0))
    }
}
