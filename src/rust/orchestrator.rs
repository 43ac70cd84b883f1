use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::{oneshot, watch};

use crate::classifier::{ClassifierError, Image, RequestBuilder};

/// Lifecycle of one classification call.
///
/// `Idle → Requested → Running → {Succeeded | Failed}`. A call without an image
/// goes straight from `Requested` to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    Requested,
    Running,
    Succeeded,
    Failed,
}

impl CallState {
    pub fn is_terminal(self) -> bool {
        matches!(self, CallState::Succeeded | CallState::Failed)
    }
}

/// The single result of a classification call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Succeeded { label: String, confidence: f32 },
    Failed(ClassifierError),
}

impl Outcome {
    pub fn state(&self) -> CallState {
        match self {
            Outcome::Succeeded { .. } => CallState::Succeeded,
            Outcome::Failed(_) => CallState::Failed,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Outcome::Succeeded { label, .. } => Some(label),
            Outcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ClassifierError> {
        match self {
            Outcome::Succeeded { .. } => None,
            Outcome::Failed(err) => Some(err),
        }
    }
}

/// An outcome tagged with the call that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub generation: u64,
    pub outcome: Outcome,
}

/// Handle to an in-flight classification call.
#[derive(Debug)]
pub struct ClassificationTask {
    generation: u64,
    state: watch::Receiver<CallState>,
    completion: oneshot::Receiver<Completion>,
}

impl ClassificationTask {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current state of the call
    pub fn state(&self) -> CallState {
        *self.state.borrow()
    }

    /// Waits for the call to reach its terminal state.
    pub async fn wait(self) -> Completion {
        let generation = self.generation;
        self.completion.await.unwrap_or_else(|_| Completion {
            generation,
            outcome: Outcome::Failed(ClassifierError::Execution(
                "Classification worker went away".into(),
            )),
        })
    }
}

/// Runs classification calls off the interactive task and hands back one
/// outcome per call.
///
/// Each submission takes a new generation number. Calls are never cancelled;
/// a completion whose generation is no longer the latest is stale and callers
/// should drop it (see `is_current`).
#[derive(Debug, Clone)]
pub struct Orchestrator {
    builder: Arc<RequestBuilder>,
    generation: Arc<AtomicU64>,
}

impl Orchestrator {
    pub fn new(builder: RequestBuilder) -> Self {
        Self {
            builder: Arc::new(builder),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn builder(&self) -> &RequestBuilder {
        &self.builder
    }

    /// Generation of the most recent submission, 0 before the first one
    pub fn latest_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// True if no call was submitted after the one that produced `completion`.
    pub fn is_current(&self, completion: &Completion) -> bool {
        completion.generation == self.latest_generation()
    }

    /// Starts a classification call and returns immediately.
    ///
    /// An absent or empty image fails the call with `NoImage` without touching
    /// the model.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, image: Option<Image>) -> ClassificationTask {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (state_tx, state_rx) = watch::channel(CallState::Idle);
        let (completion_tx, completion_rx) = oneshot::channel();
        let task = ClassificationTask {
            generation,
            state: state_rx,
            completion: completion_rx,
        };

        state_tx.send_replace(CallState::Requested);
        debug!("Call {} requested", generation);

        let image = match image.filter(|image| !image.is_empty()) {
            Some(image) => image,
            None => {
                Self::finish(
                    &state_tx,
                    completion_tx,
                    generation,
                    Outcome::Failed(ClassifierError::NoImage),
                );
                return task;
            }
        };

        let builder = Arc::clone(&self.builder);
        tokio::spawn(async move {
            state_tx.send_replace(CallState::Running);
            debug!("Call {} running", generation);

            let joined = tokio::task::spawn_blocking(move || {
                let request = builder.build_request()?;
                request.perform(&image)
            })
            .await;

            let outcome = match joined {
                Ok(Ok(result)) => {
                    let top = result.top();
                    Outcome::Succeeded {
                        label: top.identifier.clone(),
                        confidence: top.confidence,
                    }
                }
                Ok(Err(err)) => Outcome::Failed(err),
                Err(join_err) => Outcome::Failed(ClassifierError::Execution(format!(
                    "Classification worker failed: {}",
                    join_err
                ))),
            };

            Self::finish(&state_tx, completion_tx, generation, outcome);
        });

        task
    }

    /// Submits `image` and waits for the outcome.
    pub async fn classify(&self, image: Option<Image>) -> Completion {
        self.submit(image).wait().await
    }

    fn finish(
        state_tx: &watch::Sender<CallState>,
        completion_tx: oneshot::Sender<Completion>,
        generation: u64,
        outcome: Outcome,
    ) {
        match &outcome {
            Outcome::Succeeded { label, confidence } => {
                info!("Call {} classified as '{}' ({:.1}%)", generation, label, confidence * 100.0);
            }
            Outcome::Failed(ClassifierError::NoImage) => {
                warn!("Call {} has no image", generation);
            }
            Outcome::Failed(err) => {
                error!("Call {} failed: {}", generation, err);
            }
        }

        state_tx.send_replace(outcome.state());
        if completion_tx.send(Completion { generation, outcome }).is_err() {
            debug!("Call {} finished after its handle was dropped", generation);
        }
    }
}
