//! The apply flow tying capture, relay call and result view together.

use std::{
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
};

use shared::{Category, GenerationOutcome, GenerationRequest};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::capture::{CameraDevice, CaptureSession};
use crate::client::{Credential, TryOnClient};
use crate::error::{CaptureError, WorkflowError};
use crate::presentation::ResultView;

/// One try-on screen: at most one generation in flight at a time.
pub struct Workflow {
    client: TryOnClient,
    capture: Mutex<CaptureSession>,
    view: Mutex<ResultView>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag on every exit path.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Workflow {
    pub fn new(client: TryOnClient) -> Self {
        Self {
            client,
            capture: Mutex::new(CaptureSession::new()),
            view: Mutex::new(ResultView::Empty),
            in_flight: AtomicBool::new(false),
        }
    }

    pub async fn enable_camera(&self, device: &dyn CameraDevice) -> Result<(), CaptureError> {
        self.capture.lock().await.enable_camera(device).await
    }

    pub async fn choose_file(&self, path: impl AsRef<Path>) -> Result<(), CaptureError> {
        self.capture.lock().await.choose_file(path).await
    }

    /// Compose and submit one request from the held photo or camera.
    ///
    /// Nothing is sent when another apply is running, the prompt is blank,
    /// or no image source is held.
    pub async fn apply(
        &self,
        prompt: &str,
        category: Category,
        credential: Option<&Credential>,
    ) -> Result<GenerationOutcome, WorkflowError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Apply ignored, generation already in flight");
            return Err(WorkflowError::Busy);
        }
        let _guard = InFlight(&self.in_flight);

        if prompt.trim().is_empty() {
            return Err(WorkflowError::MissingPrompt);
        }

        let image = self
            .capture
            .lock()
            .await
            .snapshot()?
            .filter(|image| !image.is_empty())
            .ok_or(WorkflowError::MissingImage)?;
        let request = GenerationRequest::new(image, prompt, category)?;

        self.view.lock().await.begin();
        let outcome = self.client.generate(&request, credential).await;
        self.view.lock().await.show(&outcome);

        info!("Apply finished with status {}", outcome.status_code());
        Ok(outcome)
    }

    pub async fn view(&self) -> ResultView {
        self.view.lock().await.clone()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Clear the result and release the camera.
    pub async fn reset(&self) {
        self.view.lock().await.reset();
        self.capture.lock().await.reset();
    }
}
