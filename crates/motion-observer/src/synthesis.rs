use glam::{Quat, Vec3};
use motion_math::{apply_rotation, euler_to_quaternion, multiply, subtract, STANDARD_GRAVITY};
use std::f32::consts::FRAC_1_SQRT_2;

use crate::platform::AxisConvention;
use crate::types::{AccelerationEvent, OrientationEvent, RawAxes, RawMotion, RawOrientation};

/// -90 degrees about X: turns the sensor frame (looking out of the back of
/// the device) into a forward-looking world frame.
const BACK_CAMERA_CORRECTION: Quat = Quat::from_xyzw(-FRAC_1_SQRT_2, 0.0, 0.0, FRAC_1_SQRT_2);

/// What the accelerometer reads at rest in the world frame (Y up).
const WORLD_GRAVITY: Vec3 = Vec3::new(0.0, STANDARD_GRAVITY, 0.0);

/// Build an orientation event from a raw platform reading.
pub fn orientation_event(raw: &RawOrientation) -> OrientationEvent {
    let alpha = raw.alpha.unwrap_or(0.0).to_radians();
    let beta = raw.beta.unwrap_or(0.0).to_radians();
    let gamma = raw.gamma.unwrap_or(0.0).to_radians();

    // Device angles come as (Z, X, Y); the Euler step takes X, Y, Z.
    let euler = Vec3::new(beta, alpha, -gamma);
    let quaternion = multiply(euler_to_quaternion(euler), BACK_CAMERA_CORRECTION);

    let mut event = OrientationEvent::new(quaternion, Vec3::new(alpha, beta, gamma), raw.absolute);
    event.compass_heading = raw.compass_heading.map(f32::to_radians);
    event.compass_accuracy = raw.compass_accuracy.map(f32::to_radians);
    event
}

/// Gravity-free acceleration as measured by the platform.
pub fn measured_acceleration(raw: &RawMotion, convention: AxisConvention) -> AccelerationEvent {
    let acceleration = normalize(&raw.acceleration, convention, 0.0);
    AccelerationEvent::new(acceleration, raw.interval_ms, false)
}

/// Acceleration including gravity, in the standard sign convention.
pub fn including_gravity(raw: &RawMotion, convention: AxisConvention) -> AccelerationEvent {
    AccelerationEvent::new(including_gravity_vector(raw, convention), raw.interval_ms, false)
}

/// Estimate gravity-free acceleration by removing gravity as seen from
/// `orientation`. Returns `None` until an orientation is known.
pub fn derived_acceleration(
    raw: &RawMotion,
    convention: AxisConvention,
    orientation: Option<Quat>,
) -> Option<AccelerationEvent> {
    let orientation = orientation?;
    // The orientation maps device to world; gravity goes the other way.
    let gravity = apply_rotation(WORLD_GRAVITY, orientation.conjugate());
    let acceleration = subtract(including_gravity_vector(raw, convention), gravity);
    Some(AccelerationEvent::new(acceleration, raw.interval_ms, true))
}

fn including_gravity_vector(raw: &RawMotion, convention: AxisConvention) -> Vec3 {
    // A missing vertical reading means "at rest", never weightless.
    let missing_z = STANDARD_GRAVITY * convention.signs().z;
    normalize(&raw.acceleration_including_gravity, convention, missing_z)
}

fn normalize(axes: &RawAxes, convention: AxisConvention, missing_z: f32) -> Vec3 {
    let reading = Vec3::new(
        axes.x.unwrap_or(0.0),
        axes.y.unwrap_or(0.0),
        axes.z.unwrap_or(missing_z),
    );
    reading * convention.signs()
}
