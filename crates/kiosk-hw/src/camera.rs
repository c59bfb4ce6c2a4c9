//! V4L2 camera capture via the `v4l` crate.

use crate::frame::{self, Frame};
use std::path::Path;
use thiserror::Error;
use v4l::buffer::Type as BufType;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::FourCC;

const REQUESTED_WIDTH: u32 = 640;
const REQUESTED_HEIGHT: u32 = 480;
const STREAM_BUFFERS: u32 = 4;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("capture failed: {0}")]
    CaptureFailed(String),
    #[error("device busy")]
    DeviceBusy,
    #[error("format negotiation failed: {0}")]
    FormatNegotiationFailed(String),
    #[error("streaming not supported")]
    StreamingNotSupported,
}

/// Info about a discovered V4L2 device.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: String,
    pub name: String,
    pub driver: String,
    pub bus: String,
}

/// Negotiated pixel format for the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// YUYV 4:2:2 packed, 2 bytes/pixel.
    Yuyv,
    /// Motion-JPEG, one JPEG per buffer.
    Mjpg,
    /// Packed 24-bit RGB.
    Rgb3,
    /// 8-bit grayscale.
    Grey,
}

impl PixelFormat {
    fn from_fourcc(fourcc: FourCC) -> Option<Self> {
        match &fourcc.repr {
            b"YUYV" => Some(PixelFormat::Yuyv),
            b"MJPG" => Some(PixelFormat::Mjpg),
            b"RGB3" => Some(PixelFormat::Rgb3),
            b"GREY" => Some(PixelFormat::Grey),
            _ => None,
        }
    }
}

/// Streaming V4L2 camera handle producing RGB frames.
pub struct Camera {
    stream: MmapStream<'static>,
    pub width: u32,
    pub height: u32,
    pub device_path: String,
    pub fourcc: FourCC,
    pixel_format: PixelFormat,
}

impl Camera {
    /// Open a V4L2 camera (e.g., "/dev/video0") and start streaming.
    pub fn open(device_path: &str) -> Result<Self, CameraError> {
        if !Path::new(device_path).exists() {
            return Err(CameraError::DeviceNotFound(device_path.to_string()));
        }

        let device = Device::with_path(device_path).map_err(|e| {
            if e.to_string().contains("busy") || e.to_string().contains("EBUSY") {
                CameraError::DeviceBusy
            } else {
                CameraError::DeviceNotFound(format!("{device_path}: {e}"))
            }
        })?;

        let caps = device.query_caps().map_err(|e| {
            CameraError::CaptureFailed(format!("failed to query capabilities: {e}"))
        })?;

        tracing::info!(device = device_path, driver = %caps.driver, card = %caps.card, "opened camera");

        if !caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE) {
            return Err(CameraError::StreamingNotSupported);
        }

        // Ask for 640x480 YUYV; drivers may answer with MJPG, RGB3 or GREY instead.
        let mut fmt = device.format().map_err(|e| {
            CameraError::FormatNegotiationFailed(format!("failed to get format: {e}"))
        })?;
        fmt.fourcc = FourCC::new(b"YUYV");
        fmt.width = REQUESTED_WIDTH;
        fmt.height = REQUESTED_HEIGHT;

        let negotiated = device.set_format(&fmt).map_err(|e| {
            CameraError::FormatNegotiationFailed(format!("failed to set format: {e}"))
        })?;

        let fourcc = negotiated.fourcc;
        let pixel_format = PixelFormat::from_fourcc(fourcc).ok_or_else(|| {
            CameraError::FormatNegotiationFailed(format!(
                "unsupported pixel format: {fourcc:?} (need YUYV, MJPG, RGB3 or GREY)"
            ))
        })?;

        tracing::info!(width = negotiated.width, height = negotiated.height, fourcc = ?fourcc, "negotiated format");

        let stream = MmapStream::with_buffers(&device, BufType::VideoCapture, STREAM_BUFFERS)
            .map_err(|e| CameraError::CaptureFailed(format!("failed to create mmap stream: {e}")))?;

        Ok(Self {
            stream,
            width: negotiated.width,
            height: negotiated.height,
            device_path: device_path.to_string(),
            fourcc,
            pixel_format,
        })
    }

    /// Block until the next frame is available and convert it to RGB.
    pub fn capture_frame(&mut self) -> Result<Frame, CameraError> {
        let (buf, meta) = self
            .stream
            .next()
            .map_err(|e| CameraError::CaptureFailed(format!("failed to dequeue buffer: {e}")))?;

        let used = (meta.bytesused as usize).min(buf.len());
        let payload = if used > 0 { &buf[..used] } else { buf };

        let image = match self.pixel_format {
            PixelFormat::Yuyv => frame::yuyv_to_rgb(payload, self.width, self.height),
            PixelFormat::Mjpg => frame::mjpeg_to_rgb(payload),
            PixelFormat::Rgb3 => frame::rgb24_to_rgb(payload, self.width, self.height),
            PixelFormat::Grey => frame::grey_to_rgb(payload, self.width, self.height),
        }
        .map_err(|e| CameraError::CaptureFailed(format!("{:?} conversion failed: {e}", self.pixel_format)))?;

        Ok(Frame {
            image,
            timestamp: std::time::Instant::now(),
            sequence: meta.sequence,
        })
    }

    /// Drop `count` frames while auto-exposure settles.
    pub fn discard(&mut self, count: usize) {
        for _ in 0..count {
            if let Err(e) = self.stream.next() {
                tracing::debug!(error = %e, "warmup frame failed");
            }
        }
    }

    /// List available V4L2 video capture devices.
    pub fn list_devices() -> Vec<DeviceInfo> {
        (0..16)
            .map(|i| format!("/dev/video{i}"))
            .filter(|path| Path::new(path).exists())
            .filter_map(|path| {
                let dev = Device::with_path(&path).ok()?;
                let caps = dev.query_caps().ok()?;
                caps.capabilities
                    .contains(v4l::capability::Flags::VIDEO_CAPTURE)
                    .then(|| DeviceInfo {
                        path,
                        name: caps.card.clone(),
                        driver: caps.driver.clone(),
                        bus: caps.bus.clone(),
                    })
            })
            .collect()
    }
}
