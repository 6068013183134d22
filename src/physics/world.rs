//! In-process reference engine for tests and headless tools.
//!
//! Static bodies are triangle meshes; dynamic bodies collide as their mesh's
//! bounding sphere. There is no built-in gravity: every acceleration comes from
//! forces applied between steps.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use super::engine::{BodyHandle, MeshHandle, PhysicsEngine, RaycastHit};
use crate::geometry::{Float3, Quaternion};
use crate::track::MeshData;

const MIN_MASS: f32 = 1e-6;

#[derive(Debug, Clone)]
struct StaticBody {
    mesh: MeshHandle,
    friction: f32,
    restitution: f32,
    min: Float3,
    max: Float3,
}

#[derive(Debug, Clone)]
struct DynamicBody {
    mesh: MeshHandle,
    mass: f32,
    friction: f32,
    restitution: f32,
    radius: f32,
    position: Float3,
    velocity: Float3,
    orientation: Quaternion,
    force: Float3,
}

#[derive(Debug, Default)]
pub struct HeadlessWorld {
    meshes: BTreeMap<MeshHandle, MeshData>,
    statics: BTreeMap<BodyHandle, StaticBody>,
    dynamics: BTreeMap<BodyHandle, DynamicBody>,
    next_mesh: u32,
    next_body: u32,
}

impl HeadlessWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn static_body_count(&self) -> usize {
        self.statics.len()
    }

    pub fn dynamic_body_count(&self) -> usize {
        self.dynamics.len()
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&MeshData> {
        self.meshes.get(&handle)
    }

    /// Teleports a dynamic body; the debug equivalent of a respawn.
    pub fn set_body_position(&mut self, body: BodyHandle, position: Float3) {
        if let Some(b) = self.dynamics.get_mut(&body) {
            b.position = position;
        }
    }

    fn allocate_body(&mut self) -> BodyHandle {
        let handle = BodyHandle(self.next_body);
        self.next_body += 1;
        handle
    }

    fn resolve_contacts(&self, body: &mut DynamicBody) {
        for stat in self.statics.values() {
            let r = body.radius;
            let p = body.position;
            if p.x + r < stat.min.x
                || p.y + r < stat.min.y
                || p.z + r < stat.min.z
                || p.x - r > stat.max.x
                || p.y - r > stat.max.y
                || p.z - r > stat.max.z
            {
                continue;
            }
            let Some(mesh) = self.meshes.get(&stat.mesh) else {
                continue;
            };
            let friction = (body.friction * stat.friction).max(0.0).sqrt();
            let restitution = body.restitution.max(stat.restitution);

            for tri in mesh.triangles() {
                let closest = closest_point_on_triangle(body.position, tri);
                let offset = body.position - closest;
                let dist = offset.magnitude();
                if dist >= body.radius {
                    continue;
                }
                let normal = if dist > 1e-6 {
                    offset * (1.0 / dist)
                } else {
                    match (tri[1] - tri[0]).cross(tri[2] - tri[0]).try_normalize() {
                        Some(n) => n,
                        None => continue,
                    }
                };

                body.position += normal * (body.radius - dist);

                let vn = body.velocity.dot(normal);
                if vn < 0.0 {
                    let jn = -(1.0 + restitution) * vn;
                    body.velocity += normal * jn;

                    let tangential = body.velocity - normal * body.velocity.dot(normal);
                    let speed = tangential.magnitude();
                    if speed > 1e-6 {
                        let keep = (1.0 - friction * jn / speed).max(0.0);
                        body.velocity -= tangential * (1.0 - keep);
                    }
                }
            }
        }
    }
}

impl PhysicsEngine for HeadlessWorld {
    fn create_mesh(&mut self, mesh: MeshData) -> MeshHandle {
        let handle = MeshHandle(self.next_mesh);
        self.next_mesh += 1;
        trace!(%handle, triangles = mesh.triangle_count(), "mesh created");
        self.meshes.insert(handle, mesh);
        handle
    }

    fn create_static_collision_body(
        &mut self,
        mesh: MeshHandle,
        friction: f32,
        restitution: f32,
    ) -> Option<BodyHandle> {
        let (min, max) = self.meshes.get(&mesh)?.bounds()?;
        let handle = self.allocate_body();
        self.statics.insert(
            handle,
            StaticBody {
                mesh,
                friction,
                restitution,
                min,
                max,
            },
        );
        Some(handle)
    }

    fn create_dynamic_body(
        &mut self,
        mesh: MeshHandle,
        mass: f32,
        friction: f32,
        restitution: f32,
        position: Float3,
    ) -> Option<BodyHandle> {
        let radius = self.meshes.get(&mesh)?.bounding_radius();
        let handle = self.allocate_body();
        self.dynamics.insert(
            handle,
            DynamicBody {
                mesh,
                mass: mass.max(MIN_MASS),
                friction,
                restitution,
                radius,
                position,
                velocity: Float3::ZERO,
                orientation: Quaternion::IDENTITY,
                force: Float3::ZERO,
            },
        );
        Some(handle)
    }

    fn apply_force(&mut self, body: BodyHandle, force: Float3, _at: Float3) {
        if !force.is_finite() {
            return;
        }
        if let Some(b) = self.dynamics.get_mut(&body) {
            b.force += force;
        }
    }

    fn linear_velocity(&self, body: BodyHandle) -> Option<Float3> {
        self.dynamics.get(&body).map(|b| b.velocity)
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Float3) {
        if !velocity.is_finite() {
            return;
        }
        if let Some(b) = self.dynamics.get_mut(&body) {
            b.velocity = velocity;
        }
    }

    fn body_position(&self, body: BodyHandle) -> Option<Float3> {
        self.dynamics.get(&body).map(|b| b.position)
    }

    fn body_orientation(&self, body: BodyHandle) -> Option<Quaternion> {
        self.dynamics.get(&body).map(|b| b.orientation)
    }

    fn set_body_orientation(&mut self, body: BodyHandle, orientation: Quaternion) {
        if let Some(b) = self.dynamics.get_mut(&body) {
            b.orientation = orientation.normalize();
        }
    }

    fn body_mass(&self, body: BodyHandle) -> Option<f32> {
        if self.statics.contains_key(&body) {
            return Some(0.0);
        }
        self.dynamics.get(&body).map(|b| b.mass)
    }

    fn raycast(&self, origin: Float3, direction: Float3, max_length: f32) -> Option<RaycastHit> {
        let dir = direction.try_normalize()?;
        let mut best: Option<RaycastHit> = None;
        for stat in self.statics.values() {
            let Some(mesh) = self.meshes.get(&stat.mesh) else {
                continue;
            };
            for tri in mesh.triangles() {
                let Some(t) = intersect_triangle(origin, dir, tri) else {
                    continue;
                };
                if t > max_length || best.is_some_and(|b| b.distance <= t) {
                    continue;
                }
                let Some(mut normal) = (tri[1] - tri[0]).cross(tri[2] - tri[0]).try_normalize()
                else {
                    continue;
                };
                if normal.dot(dir) > 0.0 {
                    normal = -normal;
                }
                best = Some(RaycastHit {
                    point: origin + dir * t,
                    normal,
                    distance: t,
                });
            }
        }
        best
    }

    fn dispose(&mut self, mesh: MeshHandle) {
        if self.meshes.remove(&mesh).is_none() {
            return;
        }
        self.statics.retain(|_, b| b.mesh != mesh);
        self.dynamics.retain(|_, b| b.mesh != mesh);
        debug!(%mesh, "mesh disposed");
    }

    fn step(&mut self, dt: f32) {
        if !(dt > 0.0) {
            return;
        }
        let handles: Vec<BodyHandle> = self.dynamics.keys().copied().collect();
        for handle in handles {
            let Some(mut body) = self.dynamics.remove(&handle) else {
                continue;
            };
            body.velocity += body.force * (dt / body.mass);
            body.force = Float3::ZERO;
            body.position += body.velocity * dt;
            self.resolve_contacts(&mut body);
            self.dynamics.insert(handle, body);
        }
    }
}

/// Möller–Trumbore; returns the ray parameter of a front- or back-face hit.
fn intersect_triangle(origin: Float3, dir: Float3, tri: [Float3; 3]) -> Option<f32> {
    const EPS: f32 = 1e-7;
    let e1 = tri[1] - tri[0];
    let e2 = tri[2] - tri[0];
    let p = dir.cross(e2);
    let det = e1.dot(p);
    if det.abs() < EPS {
        return None;
    }
    let inv = 1.0 / det;
    let s = origin - tri[0];
    let u = s.dot(p) * inv;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = dir.dot(q) * inv;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(q) * inv;
    (t >= 0.0).then_some(t)
}

/// Closest point to `p` on the triangle, by Voronoi region.
fn closest_point_on_triangle(p: Float3, [a, b, c]: [Float3; 3]) -> Float3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        return a + ab * (d1 / (d1 - d3));
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        return a + ac * (d2 / (d2 - d6));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        return b + (c - b) * ((d4 - d3) / ((d4 - d3) + (d5 - d6)));
    }

    let denom = 1.0 / (va + vb + vc);
    a + ab * (vb * denom) + ac * (vc * denom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn floor(size: f32) -> MeshData {
        MeshData {
            positions: vec![
                Float3::new(-size, 0.0, -size),
                Float3::new(size, 0.0, -size),
                Float3::new(size, 0.0, size),
                Float3::new(-size, 0.0, size),
            ],
            indices: vec![0, 2, 1, 0, 3, 2],
        }
    }

    fn world_with_floor() -> (HeadlessWorld, MeshHandle) {
        let mut world = HeadlessWorld::new();
        let mesh = world.create_mesh(floor(10.0));
        world.create_static_collision_body(mesh, 0.5, 0.0).unwrap();
        (world, mesh)
    }

    #[test]
    fn raycast_hits_floor_with_normal_towards_origin() {
        let (world, _) = world_with_floor();
        let down = world.raycast(Float3::new(1.0, 3.0, 1.0), Float3::DOWN, 100.0).unwrap();
        assert_relative_eq!(down.distance, 3.0, epsilon = 1e-5);
        assert_relative_eq!(down.normal.y, 1.0, epsilon = 1e-5);

        let up = world.raycast(Float3::new(1.0, -2.0, 1.0), Float3::UP, 100.0).unwrap();
        assert_relative_eq!(up.distance, 2.0, epsilon = 1e-5);
        assert_relative_eq!(up.normal.y, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn raycast_respects_max_length_and_misses() {
        let (world, _) = world_with_floor();
        assert!(world.raycast(Float3::new(0.0, 3.0, 0.0), Float3::DOWN, 2.0).is_none());
        assert!(world.raycast(Float3::new(0.0, 3.0, 0.0), Float3::UP, 100.0).is_none());
        assert!(world.raycast(Float3::new(50.0, 3.0, 0.0), Float3::DOWN, 100.0).is_none());
    }

    #[test]
    fn raycast_ignores_dynamic_bodies() {
        let mut world = HeadlessWorld::new();
        let hull = world.create_mesh(MeshData::cuboid(Float3::new(1.0, 1.0, 1.0)));
        world
            .create_dynamic_body(hull, 1.0, 0.5, 0.0, Float3::new(0.0, -5.0, 0.0))
            .unwrap();
        assert!(world.raycast(Float3::ZERO, Float3::DOWN, 100.0).is_none());
    }

    #[test]
    fn force_integrates_and_body_rests_on_floor() {
        let (mut world, _) = world_with_floor();
        let hull = world.create_mesh(MeshData::cuboid(Float3::new(0.5, 0.5, 0.5)));
        let radius = world.mesh(hull).unwrap().bounding_radius();
        let body = world
            .create_dynamic_body(hull, 2.0, 0.5, 0.0, Float3::new(0.0, 3.0, 0.0))
            .unwrap();

        for _ in 0..240 {
            world.apply_force(body, Float3::new(0.0, -9.81 * 2.0, 0.0), Float3::ZERO);
            world.step(1.0 / 60.0);
        }

        let position = world.body_position(body).unwrap();
        assert_relative_eq!(position.y, radius, epsilon = 0.05);
        let velocity = world.linear_velocity(body).unwrap();
        assert!(velocity.magnitude() < 0.5, "still moving: {velocity:?}");
    }

    #[test]
    fn static_bodies_report_zero_mass() {
        let mut world = HeadlessWorld::new();
        let mesh = world.create_mesh(floor(1.0));
        let body = world.create_static_collision_body(mesh, 0.5, 0.0).unwrap();
        assert_eq!(world.body_mass(body), Some(0.0));
    }

    #[test]
    fn dispose_releases_mesh_and_bodies() {
        let (mut world, mesh) = world_with_floor();
        world.dispose(mesh);
        assert_eq!(world.mesh_count(), 0);
        assert_eq!(world.static_body_count(), 0);
        assert!(world.raycast(Float3::new(0.0, 3.0, 0.0), Float3::DOWN, 100.0).is_none());
    }

    #[test]
    fn non_finite_commands_are_ignored() {
        let mut world = HeadlessWorld::new();
        let hull = world.create_mesh(MeshData::cuboid(Float3::new(0.5, 0.5, 0.5)));
        let body = world.create_dynamic_body(hull, 1.0, 0.5, 0.0, Float3::ZERO).unwrap();
        world.apply_force(body, Float3::new(f32::NAN, 0.0, 0.0), Float3::ZERO);
        world.set_linear_velocity(body, Float3::new(0.0, f32::INFINITY, 0.0));
        world.step(1.0 / 60.0);
        assert_eq!(world.linear_velocity(body), Some(Float3::ZERO));
    }

    #[test]
    fn closest_point_regions() {
        let tri = [Float3::ZERO, Float3::new(1.0, 0.0, 0.0), Float3::new(0.0, 0.0, 1.0)];
        let inside = closest_point_on_triangle(Float3::new(0.2, 1.0, 0.2), tri);
        assert_relative_eq!(inside.x, 0.2, epsilon = 1e-6);
        assert_relative_eq!(inside.y, 0.0, epsilon = 1e-6);
        let corner = closest_point_on_triangle(Float3::new(-1.0, 0.0, -1.0), tri);
        assert_eq!(corner, Float3::ZERO);
        let edge = closest_point_on_triangle(Float3::new(0.5, 0.0, -1.0), tri);
        assert_relative_eq!(edge.x, 0.5, epsilon = 1e-6);
        assert_relative_eq!(edge.z, 0.0, epsilon = 1e-6);
    }
}
