use super::spline::{generate_centerline, GeometryError, PathConnector, SplinePoint};
use crate::config::RoadConfig;
use crate::geometry::Float3;

/// Indexed triangle mesh. Triangles are counter-clockwise seen from outside.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    pub positions: Vec<Float3>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Float3; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            Some([
                *self.positions.get(tri[0] as usize)?,
                *self.positions.get(tri[1] as usize)?,
                *self.positions.get(tri[2] as usize)?,
            ])
        })
    }

    /// Axis-aligned bounds, or None for an empty mesh.
    pub fn bounds(&self) -> Option<(Float3, Float3)> {
        let first = *self.positions.first()?;
        Some(self.positions.iter().fold((first, first), |(min, max), p| {
            (
                Float3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
                Float3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)),
            )
        }))
    }

    /// Largest vertex distance from the local origin.
    pub fn bounding_radius(&self) -> f32 {
        self.positions
            .iter()
            .map(|p| p.magnitude())
            .fold(0.0, f32::max)
    }

    /// Axis-aligned box centred on the origin.
    pub fn cuboid(half_extents: Float3) -> Self {
        let h = half_extents;
        let positions = (0..8)
            .map(|i| {
                let sign = |bit: u32| if i & bit == 0 { -1.0 } else { 1.0 };
                Float3::new(h.x * sign(1), h.y * sign(2), h.z * sign(4))
            })
            .collect();
        #[rustfmt::skip]
        let indices = vec![
            0, 4, 6, 0, 6, 2, // -X
            1, 3, 7, 1, 7, 5, // +X
            0, 1, 5, 0, 5, 4, // -Y
            2, 6, 7, 2, 7, 3, // +Y
            0, 2, 3, 0, 3, 1, // -Z
            4, 5, 7, 4, 7, 6, // +Z
        ];
        Self { positions, indices }
    }
}

/// Extrudes a road of `width` along the sampled centerline.
///
/// With `thickness > 0` the strip is closed: top, bottom, both side walls and
/// end caps, four vertices per sample `[left, right, left-bottom, right-bottom]`.
/// Otherwise only the top face is emitted, two vertices per sample.
pub fn extrude(samples: &[SplinePoint], width: f32, thickness: f32) -> MeshData {
    if samples.len() < 2 {
        return MeshData::default();
    }
    let half = width * 0.5;
    let solid = thickness > 0.0;
    let stride: u32 = if solid { 4 } else { 2 };

    let mut positions = Vec::with_capacity(samples.len() * stride as usize);
    for s in samples {
        let left = s.position - s.right * half;
        let right = s.position + s.right * half;
        positions.push(left);
        positions.push(right);
        if solid {
            let drop = s.up * thickness;
            positions.push(left - drop);
            positions.push(right - drop);
        }
    }

    let segments = samples.len() as u32 - 1;
    let mut indices = Vec::with_capacity(segments as usize * if solid { 24 } else { 6 } + 12);
    for i in 0..segments {
        let a = i * stride;
        let b = a + stride;
        let (l0, r0, l1, r1) = (a, a + 1, b, b + 1);
        indices.extend_from_slice(&[l0, r0, l1, r0, r1, l1]);

        if solid {
            let (lb0, rb0, lb1, rb1) = (a + 2, a + 3, b + 2, b + 3);
            indices.extend_from_slice(&[lb0, lb1, rb0, rb0, lb1, rb1]);
            indices.extend_from_slice(&[l0, l1, lb0, lb0, l1, lb1]);
            indices.extend_from_slice(&[r0, rb0, r1, rb0, rb1, r1]);
        }
    }

    if solid {
        let first = 0;
        let last = segments * stride;
        indices.extend_from_slice(&[first, first + 2, first + 1, first + 1, first + 2, first + 3]);
        indices.extend_from_slice(&[last, last + 1, last + 2, last + 1, last + 3, last + 2]);
    }

    MeshData { positions, indices }
}

/// Full road mesh for a world-space connector path.
pub fn generate_mesh(
    connectors: &[PathConnector],
    config: &RoadConfig,
) -> Result<MeshData, GeometryError> {
    let samples = generate_centerline(connectors, config)?;
    Ok(extrude(&samples, config.width, config.thickness))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::defaults::straight_segment;
    use crate::geometry::Transform;
    use approx::assert_relative_eq;

    fn straight_path() -> Vec<PathConnector> {
        straight_segment()
            .connectors
            .iter()
            .map(|c| PathConnector::new(c.connector_type, c.world_frame(&Transform::IDENTITY)))
            .collect()
    }

    fn normal_of(tri: [Float3; 3]) -> Float3 {
        (tri[1] - tri[0]).cross(tri[2] - tri[0]).normalize()
    }

    fn centroid(mesh: &MeshData) -> Float3 {
        let sum = mesh
            .positions
            .iter()
            .fold(Float3::ZERO, |acc, p| acc + *p);
        sum * (1.0 / mesh.positions.len() as f32)
    }

    #[test]
    fn ribbon_has_two_triangles_per_segment() {
        let config = RoadConfig {
            thickness: 0.0,
            ..RoadConfig::default()
        };
        let mesh = generate_mesh(&straight_path(), &config).unwrap();
        assert_eq!(mesh.positions.len(), 100);
        assert_eq!(mesh.triangle_count(), 2 * 49);
        for tri in mesh.triangles() {
            assert_relative_eq!(normal_of(tri).y, 1.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn closed_strip_counts() {
        let mesh = generate_mesh(&straight_path(), &RoadConfig::default()).unwrap();
        assert_eq!(mesh.positions.len(), 200);
        assert_eq!(mesh.triangle_count(), 8 * 49 + 4);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.positions.len()));
    }

    #[test]
    fn closed_strip_faces_point_outward() {
        let mesh = generate_mesh(&straight_path(), &RoadConfig::default()).unwrap();
        let center = centroid(&mesh);
        for tri in mesh.triangles() {
            let mid = (tri[0] + tri[1] + tri[2]) * (1.0 / 3.0);
            assert!(
                normal_of(tri).dot(mid - center) > 0.0,
                "inward face at {mid:?}"
            );
        }
    }

    #[test]
    fn road_spans_configured_width_and_thickness() {
        let mesh = generate_mesh(&straight_path(), &RoadConfig::default()).unwrap();
        let (min, max) = mesh.bounds().unwrap();
        assert_relative_eq!(max.x - min.x, 8.0, epsilon = 1e-4);
        assert_relative_eq!(max.y, 0.0, epsilon = 1e-4);
        assert_relative_eq!(min.y, -0.5, epsilon = 1e-4);
        assert_relative_eq!(max.z, 31.0, epsilon = 1e-4);
    }

    #[test]
    fn invalid_path_registers_nothing() {
        let path: Vec<PathConnector> = straight_path()
            .into_iter()
            .filter(|c| c.connector_type != crate::catalog::ConnectorType::Entry)
            .collect();
        assert_eq!(
            generate_mesh(&path, &RoadConfig::default()),
            Err(GeometryError::MissingEntry)
        );
    }

    #[test]
    fn cuboid_is_closed_and_outward() {
        let mesh = MeshData::cuboid(Float3::new(0.5, 0.25, 1.0));
        assert_eq!(mesh.triangle_count(), 12);
        for tri in mesh.triangles() {
            let mid = (tri[0] + tri[1] + tri[2]) * (1.0 / 3.0);
            assert!(normal_of(tri).dot(mid) > 0.0);
        }
        assert_relative_eq!(
            mesh.bounding_radius(),
            Float3::new(0.5, 0.25, 1.0).magnitude(),
            epsilon = 1e-6
        );
    }
}
