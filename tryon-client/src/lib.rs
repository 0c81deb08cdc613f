//! Client side of the virtual try-on product.
//!
//! Acquires a photo from a file or camera, submits it with a prompt and a
//! category to a relay, and tracks what the result panel shows.

pub mod capture;
pub mod client;
pub mod error;
pub mod media;
pub mod presentation;
pub mod workflow;

pub use capture::{CameraDevice, CaptureSession, CaptureState, MediaStream, MediaTrack, VideoFrame};
pub use client::{Credential, HttpTransport, Transport, TryOnClient};
pub use error::{CaptureError, ClientError, WorkflowError};
pub use media::read_image_file;
pub use presentation::{ResultView, DEFAULT_DOWNLOAD_NAME};
pub use workflow::Workflow;
