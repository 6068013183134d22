use crate::catalog::{ConnectorFrame, ConnectorType};
use crate::config::RoadConfig;
use crate::geometry::{Float3, Frame};

/// Element geometry that cannot be turned into a road path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    MissingEntry,
    TooFewConnectors { found: usize },
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::MissingEntry => {
                write!(f, "invalid element geometry: no ENTRY connector")
            }
            GeometryError::TooFewConnectors { found } => write!(
                f,
                "invalid element geometry: need at least 2 connectors, found {found}"
            ),
        }
    }
}

impl std::error::Error for GeometryError {}

/// A world-space connector fed to the road generator.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PathConnector {
    pub connector_type: ConnectorType,
    pub frame: ConnectorFrame,
}

impl PathConnector {
    pub const fn new(connector_type: ConnectorType, frame: ConnectorFrame) -> Self {
        Self {
            connector_type,
            frame,
        }
    }
}

/// Interpolation knot: a position the curve passes through and the up vector there.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ControlPoint {
    pub position: Float3,
    pub up: Float3,
}

/// A sampled point on the road centerline with its orthonormal frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SplinePoint {
    /// Curve parameter in [0, 1].
    pub t: f32,
    /// Accumulated chord length from the first sample.
    pub arc: f32,
    pub position: Float3,
    pub forward: Float3,
    pub up: Float3,
    pub right: Float3,
}

impl SplinePoint {
    pub fn frame(&self) -> Frame {
        Frame::new(self.forward, self.up, self.right)
    }
}

/// Orders connectors into the control polygon: ENTRY, ENTRY pushed along its
/// forward vector, checkpoints in declared order, EXIT (or the last non-entry
/// connector), EXIT pushed along its forward vector.
pub fn build_control_points(
    connectors: &[PathConnector],
    extension: f32,
) -> Result<Vec<ControlPoint>, GeometryError> {
    let entry = connectors
        .iter()
        .find(|c| c.connector_type == ConnectorType::Entry)
        .ok_or(GeometryError::MissingEntry)?;

    let exit = connectors
        .iter()
        .find(|c| c.connector_type == ConnectorType::Exit);
    let mut inner: Vec<&PathConnector> = connectors
        .iter()
        .filter(|c| c.connector_type == ConnectorType::Checkpoint)
        .collect();

    let end = match exit {
        Some(exit) => exit,
        None => inner.pop().ok_or(GeometryError::TooFewConnectors {
            found: connectors.len(),
        })?,
    };

    let mut points = Vec::with_capacity(inner.len() + 4);
    points.push(knot(&entry.frame));
    if let Some(pushed) = extended(&entry.frame, extension) {
        points.push(pushed);
    }
    points.extend(inner.iter().map(|c| knot(&c.frame)));
    points.push(knot(&end.frame));
    if let Some(pushed) = extended(&end.frame, extension) {
        points.push(pushed);
    }

    if points.len() < 3 {
        // Interpolation needs three knots; continue the first chord past the second point.
        let a = points[0];
        let b = points[points.len() - 1];
        points.push(ControlPoint {
            position: b.position + (b.position - a.position),
            up: b.up,
        });
    }

    Ok(points)
}

fn knot(frame: &ConnectorFrame) -> ControlPoint {
    ControlPoint {
        position: frame.position,
        up: frame.up,
    }
}

fn extended(frame: &ConnectorFrame, extension: f32) -> Option<ControlPoint> {
    if extension <= 0.0 {
        return None;
    }
    let forward = frame.forward.try_normalize()?;
    Some(ControlPoint {
        position: frame.position + forward * extension,
        up: frame.up,
    })
}

/// Cubic `c0 + c1·w + c2·w² + c3·w³` between two knots.
#[derive(Debug, Copy, Clone)]
struct CubicSegment {
    c0: Float3,
    c1: Float3,
    c2: Float3,
    c3: Float3,
}

impl CubicSegment {
    /// Centripetal Catmull-Rom between `p1` and `p2` expressed as a Hermite cubic.
    fn centripetal(p0: Float3, p1: Float3, p2: Float3, p3: Float3) -> Self {
        let mut dt0 = (p1 - p0).magnitude_squared().powf(0.25);
        let mut dt1 = (p2 - p1).magnitude_squared().powf(0.25);
        let mut dt2 = (p3 - p2).magnitude_squared().powf(0.25);

        // Coincident knots would divide by zero.
        if dt1 < 1e-4 {
            dt1 = 1.0;
        }
        if dt0 < 1e-4 {
            dt0 = dt1;
        }
        if dt2 < 1e-4 {
            dt2 = dt1;
        }

        let t1 = ((p1 - p0) * (1.0 / dt0) - (p2 - p0) * (1.0 / (dt0 + dt1)) + (p2 - p1) * (1.0 / dt1))
            * dt1;
        let t2 = ((p2 - p1) * (1.0 / dt1) - (p3 - p1) * (1.0 / (dt1 + dt2)) + (p3 - p2) * (1.0 / dt2))
            * dt1;

        Self {
            c0: p1,
            c1: t1,
            c2: p1 * -3.0 + p2 * 3.0 - t1 * 2.0 - t2,
            c3: p1 * 2.0 - p2 * 2.0 + t1 + t2,
        }
    }

    fn position(&self, w: f32) -> Float3 {
        self.c0 + self.c1 * w + self.c2 * (w * w) + self.c3 * (w * w * w)
    }

    fn derivative(&self, w: f32) -> Float3 {
        self.c1 + self.c2 * (2.0 * w) + self.c3 * (3.0 * w * w)
    }
}

fn build_segments(points: &[Float3]) -> Vec<CubicSegment> {
    let n = points.len();
    let first_ghost = points[0] * 2.0 - points[1];
    let last_ghost = points[n - 1] * 2.0 - points[n - 2];

    (0..n - 1)
        .map(|i| {
            let p0 = if i > 0 { points[i - 1] } else { first_ghost };
            let p3 = if i + 2 < n { points[i + 2] } else { last_ghost };
            CubicSegment::centripetal(p0, points[i], points[i + 1], p3)
        })
        .collect()
}

/// Splits the global parameter `t` into a knot interval index and local weight.
fn locate(t: f32, knot_count: usize) -> (usize, f32) {
    let scaled = t.clamp(0.0, 1.0) * (knot_count - 1) as f32;
    let index = scaled.floor() as usize;
    if index >= knot_count - 1 {
        (knot_count - 2, 1.0)
    } else {
        (index, scaled - index as f32)
    }
}

/// Number of centerline samples for a control polygon of `knot_count` points.
pub fn sample_count(knot_count: usize, config: &RoadConfig) -> usize {
    config
        .min_samples
        .max(knot_count * config.samples_per_control_point)
        .max(2)
}

/// Fits the centerline through the connectors and samples it with orthonormal frames.
///
/// Up vectors are interpolated by control-point index rather than arc length.
/// The result is a pure function of the input.
pub fn generate_centerline(
    connectors: &[PathConnector],
    config: &RoadConfig,
) -> Result<Vec<SplinePoint>, GeometryError> {
    let knots = build_control_points(connectors, config.tangent_extension)?;
    Ok(sample_knots(&knots, config))
}

pub(crate) fn sample_knots(knots: &[ControlPoint], config: &RoadConfig) -> Vec<SplinePoint> {
    let positions: Vec<Float3> = knots.iter().map(|k| k.position).collect();
    let segments = build_segments(&positions);
    let count = sample_count(knots.len(), config);

    let mut result: Vec<SplinePoint> = Vec::with_capacity(count);
    let mut prev_forward = (positions[1] - positions[0])
        .try_normalize()
        .unwrap_or(Float3::FORWARD);
    let mut prev_up = knots[0].up.try_normalize().unwrap_or(Float3::UP);
    let mut prev_right = prev_forward
        .cross(prev_up)
        .try_normalize()
        .unwrap_or(Frame::DEFAULT.right);

    for i in 0..count {
        let t = i as f32 / (count - 1) as f32;
        let (index, w) = locate(t, knots.len());
        let segment = &segments[index];

        let position = segment.position(w);
        let tangent = segment
            .derivative(w)
            .try_normalize()
            .unwrap_or(prev_forward);
        let up = knots[index]
            .up
            .lerp(knots[index + 1].up, w)
            .try_normalize()
            .unwrap_or(prev_up);

        let frame = Frame::from_tangent_up(tangent, up, prev_right);
        let arc = match result.last() {
            Some(prev) => prev.arc + prev.position.distance(position),
            None => 0.0,
        };

        result.push(SplinePoint {
            t,
            arc,
            position,
            forward: frame.forward,
            up: frame.up,
            right: frame.right,
        });

        prev_forward = frame.forward;
        prev_up = frame.up;
        prev_right = frame.right;
    }

    result
}
