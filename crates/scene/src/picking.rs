use foundation::bounds::Aabb3;
use foundation::math::Vec3;

use crate::dataset::OverlayDataset;
use crate::entity::EntityId;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit {
    pub entity: EntityId,
    pub distance: f64,
    pub point: Vec3,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickOptions {
    pub max_distance: f64,
    /// Extra slack around each sprite, in pixels.
    pub tolerance_px: f64,
    /// Angular size of one screen pixel (radians). Converts sprite pixel
    /// sizes into world-space extents at a given camera distance.
    pub radians_per_pixel: f64,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            max_distance: 1.0e30,
            tolerance_px: 2.0,
            radians_per_pixel: 1.0e-3,
        }
    }
}

/// Deterministic ray picking against the overlay's point sprites.
///
/// Ordering contract:
/// - The closest hit along the (normalized) ray wins.
/// - If multiple entities are hit at the same distance, the lower `EntityId::index()` wins.
///
/// Notes:
/// - Hidden entities are not pickable.
/// - Each sprite is approximated by a cube whose half-size covers its pixel
///   radius (plus tolerance) at its distance from the ray origin.
pub fn pick_ray(dataset: &OverlayDataset, ray: Ray, opts: PickOptions) -> Option<PickHit> {
    let dir = ray.dir.normalized()?;
    let origin = ray.origin.as_array();
    let dir_a = dir.as_array();

    let mut best: Option<(f64, EntityId)> = None;

    for entity in dataset.iter().filter(|e| e.is_visible()) {
        let center = entity.position_ecef();
        let range = (center - ray.origin).length();
        let radius_px = entity.pixel_size() * 0.5 + opts.tolerance_px;
        let half_extent = radius_px * opts.radians_per_pixel * range;

        let bounds = Aabb3::around(center.as_array(), half_extent);
        let Some(t) = bounds.ray_entry(origin, dir_a, 0.0, opts.max_distance) else {
            continue;
        };

        best = match best {
            None => Some((t, entity.id)),
            Some((bt, be)) => {
                let ord = t.total_cmp(&bt).then_with(|| entity.id.index().cmp(&be.index()));
                if ord.is_lt() {
                    Some((t, entity.id))
                } else {
                    Some((bt, be))
                }
            }
        };
    }

    let (t, entity) = best?;
    Some(PickHit {
        entity,
        distance: t,
        point: ray.origin + dir.scale(t),
    })
}

/// Screen picking wrapper.
///
/// The caller supplies the screen->ray mapping via `make_ray`.
pub fn pick_screen<F>(
    dataset: &OverlayDataset,
    x_px: f64,
    y_px: f64,
    mut make_ray: F,
    opts: PickOptions,
) -> Option<PickHit>
where
    F: FnMut(f64, f64) -> Option<Ray>,
{
    let ray = make_ray(x_px, y_px)?;
    pick_ray(dataset, ray, opts)
}
