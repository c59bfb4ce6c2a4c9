//! kiosk-hw — Camera capture, frame overlays and the preview window.

pub mod camera;
pub mod display;
pub mod frame;
pub mod overlay;

pub use camera::{Camera, CameraError, DeviceInfo, PixelFormat};
pub use display::{Display, DisplayError};
pub use frame::{Frame, FrameError};
pub use overlay::OverlayRenderer;
