//! Road geometry: centerline fitting through connector paths and ribbon extrusion.
//!
//! Everything here is a pure function of its inputs; registering the result
//! with a physics engine is the placement layer's job.

mod mesh;
mod spline;

pub use mesh::{extrude, generate_mesh, MeshData};
pub use spline::{
    build_control_points, generate_centerline, sample_count, ControlPoint, GeometryError,
    PathConnector, SplinePoint,
};
