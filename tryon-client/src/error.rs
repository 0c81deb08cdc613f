use thiserror::Error;

/// Failures acquiring a photo from a file or the camera.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("Camera unavailable: {0}")]
    Unavailable(String),

    #[error("Camera has no frame available yet")]
    NoFrame,

    #[error("Frame buffer does not match {width}x{height}")]
    InvalidFrame { width: u32, height: u32 },

    #[error("Could not read image: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not encode frame: {0}")]
    Encode(#[from] image::ImageError),
}

/// Failures talking to a try-on relay.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to reach server: {0}")]
    Network(String),

    #[error("Invalid Credential")]
    InvalidCredential,

    #[error("Server returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("No generated image to download")]
    NothingToDownload,

    #[error(transparent)]
    InvalidImage(#[from] shared::Error),

    #[error("Could not write file: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

/// Reasons an apply was refused before anything was sent.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("A generation is already in progress")]
    Busy,

    #[error("Please describe the look you want")]
    MissingPrompt,

    #[error("Please upload a photo or enable the camera")]
    MissingImage,

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    InvalidRequest(#[from] shared::Error),
}
