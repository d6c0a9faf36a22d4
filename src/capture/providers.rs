use async_trait::async_trait;
use derive_more::{Display, Error};

/// JPEG quality the freeze-frame is encoded at.
pub const JPEG_QUALITY: f32 = 0.8;

/// A still frame frozen from the live feed, JPEG-encoded at the feed's
/// native resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum CameraError {
    #[display(fmt = "camera access was denied")]
    PermissionDenied,
    #[display(fmt = "no camera device is available")]
    DeviceUnavailable,
    #[display(fmt = "camera is held by another capture")]
    DeviceBusy,
    #[display(fmt = "frame capture failed")]
    CaptureFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum GeolocationError {
    #[display(fmt = "location access was denied")]
    PermissionDenied,
    #[display(fmt = "device position is unavailable")]
    PositionUnavailable,
    #[display(fmt = "location fix timed out")]
    Timeout,
}

/// One-shot device position fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,
}

/// Camera capability handle, injected by the embedder. Acquisition is
/// exclusive: while a feed is live, further acquisitions fail fast with
/// `DeviceBusy` instead of queueing.
#[async_trait]
pub trait Camera: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn CameraFeed>, CameraError>;
}

/// A live camera feed. `release` stops the underlying stream; implementations
/// must tolerate it being called exactly once, which `FeedGuard` guarantees.
pub trait CameraFeed: Send {
    fn capture_frame(&mut self, quality: f32) -> Result<Photo, CameraError>;
    fn release(&mut self);
}

/// Geolocation capability handle. The flow wraps the call in its own timeout,
/// since a fix may otherwise suspend until the user answers a prompt.
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(&self) -> Result<PositionFix, GeolocationError>;
}

/// Scoped ownership of an acquired feed: the stream is stopped on every exit
/// path because drop runs on every exit path.
pub struct FeedGuard {
    feed: Box<dyn CameraFeed>,
}

impl FeedGuard {
    pub fn new(feed: Box<dyn CameraFeed>) -> Self {
        Self { feed }
    }

    pub fn capture_frame(&mut self, quality: f32) -> Result<Photo, CameraError> {
        self.feed.capture_frame(quality)
    }
}

impl Drop for FeedGuard {
    fn drop(&mut self) {
        self.feed.release();
    }
}
