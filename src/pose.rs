use nalgebra::{Quaternion, UnitQuaternion, Vector3};

/// Acquisition pose of the sensor that captured a point cloud. Both components are stored in single
/// precision, independent of the precision of the source format.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorPose {
    pub origin: Vector3<f32>,
    pub orientation: UnitQuaternion<f32>,
}

impl Default for SensorPose {
    fn default() -> Self {
        Self {
            origin: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
        }
    }
}

impl SensorPose {
    pub fn new(origin: Vector3<f32>, orientation: UnitQuaternion<f32>) -> Self {
        Self {
            origin,
            orientation,
        }
    }

    /// Creates a pose from double-precision values. `offset` is subtracted from `origin` before it
    /// is narrowed to `f32`, which keeps precision for sensors that are far away from the origin
    /// of the coordinate system
    pub fn from_f64(
        origin: &Vector3<f64>,
        orientation: &UnitQuaternion<f64>,
        offset: &Vector3<f64>,
    ) -> Self {
        let q = orientation.quaternion();
        Self {
            origin: narrow_position(origin, offset),
            orientation: UnitQuaternion::new_normalize(Quaternion::new(
                q.w as f32, q.i as f32, q.j as f32, q.k as f32,
            )),
        }
    }

    /// Does this pose carry no information (zero origin and identity orientation)?
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Subtracts `offset` from `position` in double precision and narrows the result to `f32`
pub fn narrow_position(position: &Vector3<f64>, offset: &Vector3<f64>) -> Vector3<f32> {
    let local = position - offset;
    Vector3::new(local.x as f32, local.y as f32, local.z as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pose() {
        let pose = SensorPose::default();
        assert_eq!(Vector3::zeros(), pose.origin);
        assert_eq!(UnitQuaternion::identity(), pose.orientation);
        assert!(pose.is_default());
    }

    #[test]
    fn test_offset_keeps_precision() {
        let position = Vector3::new(4_500_123.25, 5_600_456.75, 312.5);
        let offset = Vector3::new(4_500_000.0, 5_600_000.0, 0.0);

        let local = narrow_position(&position, &offset);
        assert_eq!(Vector3::new(123.25f32, 456.75, 312.5), local);

        // Without the offset, the fractional part is lost in single precision
        let global = narrow_position(&position, &Vector3::zeros());
        assert_ne!(position.x, global.x as f64);
    }

    #[test]
    fn test_pose_from_f64() {
        let rotation = UnitQuaternion::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2);
        let pose = SensorPose::from_f64(
            &Vector3::new(1000.5, 2000.5, 10.0),
            &rotation,
            &Vector3::new(1000.0, 2000.0, 0.0),
        );

        assert_eq!(Vector3::new(0.5f32, 0.5, 10.0), pose.origin);
        let rotated = pose.orientation * Vector3::new(1.0f32, 0.0, 0.0);
        assert!((rotated - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-6);
        assert!(!pose.is_default());
    }
}
