//! Photo acquisition from a file or a live camera.
//!
//! A [`CaptureSession`] holds at most one source at a time. Camera tracks are
//! stopped whenever the stream is replaced, the session is reset, or the
//! session is dropped.

use std::{fmt, io::Cursor, mem, path::Path};

use async_trait::async_trait;
use image::{ImageFormat, RgbImage};
use shared::DataUrl;
use tracing::{info, warn};

use crate::error::CaptureError;
use crate::media::read_image_file;

/// One RGB frame at the camera's native resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    /// Packed RGB8, `width * height * 3` bytes.
    pub rgb: Vec<u8>,
}

pub trait MediaTrack: Send + Sync {
    fn stop(&self);
}

/// A live camera stream.
pub trait MediaStream: Send + Sync {
    fn tracks(&self) -> &[Box<dyn MediaTrack>];

    /// Latest frame, if the camera has produced one.
    fn current_frame(&self) -> Option<VideoFrame>;

    fn stop_all(&self) {
        for track in self.tracks() {
            track.stop();
        }
    }
}

/// Something that can hand out a camera stream.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    async fn open(&self) -> Result<Box<dyn MediaStream>, CaptureError>;
}

pub enum CaptureState {
    Idle,
    CameraActive(Box<dyn MediaStream>),
    ImageReady(DataUrl),
}

impl fmt::Debug for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::CameraActive(stream) => write!(f, "CameraActive({} tracks)", stream.tracks().len()),
            Self::ImageReady(url) => write!(f, "ImageReady({})", url.mime_type()),
        }
    }
}

#[derive(Debug)]
pub struct CaptureSession {
    state: CaptureState,
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSession {
    pub fn new() -> Self {
        Self {
            state: CaptureState::Idle,
        }
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    /// Whether a photo or a live camera is available for a submission.
    pub fn has_source(&self) -> bool {
        !matches!(self.state, CaptureState::Idle)
    }

    /// Start the camera. On failure the current state is kept as is.
    pub async fn enable_camera(&mut self, device: &dyn CameraDevice) -> Result<(), CaptureError> {
        let stream = device.open().await.map_err(|e| {
            warn!("Camera unavailable: {}", e);
            e
        })?;

        self.replace(CaptureState::CameraActive(stream));
        info!("Camera enabled");
        Ok(())
    }

    /// Load a photo from disk, replacing any held image or stream.
    pub async fn choose_file(&mut self, path: impl AsRef<Path>) -> Result<(), CaptureError> {
        let image = read_image_file(path).await?;
        self.choose_image(image);
        Ok(())
    }

    pub fn choose_image(&mut self, image: DataUrl) {
        self.replace(CaptureState::ImageReady(image));
    }

    /// The image to submit. A live camera is captured now, at its native
    /// resolution, as a JPEG.
    pub fn snapshot(&self) -> Result<Option<DataUrl>, CaptureError> {
        match &self.state {
            CaptureState::Idle => Ok(None),
            CaptureState::ImageReady(image) => Ok(Some(image.clone())),
            CaptureState::CameraActive(stream) => {
                let frame = stream.current_frame().ok_or(CaptureError::NoFrame)?;
                encode_jpeg(frame).map(Some)
            }
        }
    }

    pub fn reset(&mut self) {
        self.replace(CaptureState::Idle);
    }

    fn replace(&mut self, next: CaptureState) {
        if let CaptureState::CameraActive(stream) = mem::replace(&mut self.state, next) {
            stream.stop_all();
            info!("Camera stopped");
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.reset();
    }
}

fn encode_jpeg(frame: VideoFrame) -> Result<DataUrl, CaptureError> {
    let (width, height) = (frame.width, frame.height);
    let image = RgbImage::from_raw(width, height, frame.rgb).ok_or(CaptureError::InvalidFrame { width, height })?;

    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Jpeg)?;

    Ok(DataUrl::from_bytes("image/jpeg", &out.into_inner()))
}


#[cfg(test)]
mod tests {
    use super::fakes::FakeCamera;
    use super::*;
    use image::GenericImageView;

    fn photo() -> DataUrl {
        DataUrl::from_bytes("image/png", b"png")
    }

    #[tokio::test]
    async fn test_permission_denied_keeps_state() {
        let mut session = CaptureSession::new();
        session.choose_image(photo());

        let camera = FakeCamera {
            deny: true,
            ..FakeCamera::with_frame(2, 2)
        };
        let err = session.enable_camera(&camera).await.unwrap_err();

        assert!(matches!(err, CaptureError::PermissionDenied));
        assert!(matches!(session.state(), CaptureState::ImageReady(url) if *url == photo()));
    }

    #[tokio::test]
    async fn test_enable_camera_drops_file_image() {
        let mut session = CaptureSession::new();
        session.choose_image(photo());

        let camera = FakeCamera::with_frame(2, 2);
        session.enable_camera(&camera).await.unwrap();

        assert!(matches!(session.state(), CaptureState::CameraActive(_)));
        assert_eq!(camera.stops(), 0);
    }

    #[tokio::test]
    async fn test_reenabling_camera_stops_previous_stream() {
        let mut session = CaptureSession::new();
        let camera = FakeCamera::with_frame(2, 2);

        session.enable_camera(&camera).await.unwrap();
        session.enable_camera(&camera).await.unwrap();

        // Only the first stream's tracks are stopped
        assert_eq!(camera.track_stops(), vec![1, 1, 0, 0]);
    }

    #[tokio::test]
    async fn test_choose_file_stops_camera() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("me.jpg");
        std::fs::write(&path, b"not really a jpeg").unwrap();

        let mut session = CaptureSession::new();
        let camera = FakeCamera::with_frame(2, 2);
        session.enable_camera(&camera).await.unwrap();

        session.choose_file(&path).await.unwrap();

        assert_eq!(camera.track_stops(), vec![1, 1]);
        match session.state() {
            CaptureState::ImageReady(url) => assert_eq!(url.mime_type(), "image/jpeg"),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reset_and_drop_stop_each_track_once() {
        let camera = FakeCamera::with_frame(2, 2);

        let mut session = CaptureSession::new();
        session.enable_camera(&camera).await.unwrap();
        assert_eq!(camera.track_stops(), vec![0, 0]);

        session.reset();
        assert!(matches!(session.state(), CaptureState::Idle));
        assert_eq!(camera.track_stops(), vec![1, 1]);

        // Reset of an idle session stops nothing more
        session.reset();
        assert_eq!(camera.track_stops(), vec![1, 1]);

        session.enable_camera(&camera).await.unwrap();
        drop(session);
        assert_eq!(camera.track_stops(), vec![1, 1, 1, 1]);
    }

    #[tokio::test]
    async fn test_snapshot_keeps_native_resolution() {
        let camera = FakeCamera::with_frame(64, 48);
        let mut session = CaptureSession::new();
        session.enable_camera(&camera).await.unwrap();

        let url = session.snapshot().unwrap().unwrap();
        assert_eq!(url.mime_type(), "image/jpeg");

        let decoded = image::load_from_memory(&url.decode().unwrap()).unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
        // Snapshot does not end the stream
        assert_eq!(camera.stops(), 0);
    }

    #[tokio::test]
    async fn test_snapshot_without_frame() {
        let camera = FakeCamera {
            frame: None,
            ..FakeCamera::with_frame(1, 1)
        };
        let mut session = CaptureSession::new();
        session.enable_camera(&camera).await.unwrap();

        assert!(matches!(session.snapshot(), Err(CaptureError::NoFrame)));
    }

    #[test]
    fn test_idle_snapshot_is_none() {
        let session = CaptureSession::new();
        assert!(session.snapshot().unwrap().is_none());
        assert!(!session.has_source());
    }

    #[test]
    fn test_mismatched_frame_buffer() {
        let frame = VideoFrame {
            width: 4,
            height: 4,
            rgb: vec![0; 3],
        };
        assert!(matches!(
            encode_jpeg(frame),
            Err(CaptureError::InvalidFrame { width: 4, height: 4 })
        ));
    }
}
