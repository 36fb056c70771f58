// # Capture Module
//
// Sensor capability interface, the depth/color capture steps, and synthetic sources.

pub mod sensor;
pub mod synthetic;

pub use sensor::{CaptureSource, Plane, SensorImage, capture_depth, capture_rgb, encode_depth, encode_rgb};
pub use synthetic::{SyntheticColorSource, SyntheticDepthSource};
