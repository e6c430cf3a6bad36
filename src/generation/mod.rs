use std::sync::mpsc;
use std::sync::Arc;

use thiserror::Error;

use crate::artifact::{Artifact, ImageData};
use crate::i18n::{translate, Language, MessageKey};

pub const GENERATED_ARTIFACT_STEM: &str = "generated-avatar";

pub type GenerationOutcome = std::result::Result<ImageData, GenerationFailure>;

/// Failure modes reported by the collaborator. All are handled uniformly.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationFailure {
    #[error("request was blocked ({reason}): {message}")]
    Blocked { reason: String, message: String },
    #[error("generation stopped unexpectedly ({reason})")]
    Stopped { reason: String },
    #[error("model returned no image")]
    NoImage { text: Option<String> },
    #[error("{0}")]
    Transport(String),
}

impl GenerationFailure {
    pub fn localized(&self, language: Language) -> String {
        match self {
            Self::Blocked { reason, message } => translate(
                language,
                MessageKey::GenerationBlocked,
                &[("reason", reason.as_str()), ("message", message.as_str())],
            ),
            Self::Stopped { reason } => {
                translate(language, MessageKey::GenerationStopped, &[("reason", reason.as_str())])
            }
            Self::NoImage { text: Some(text) } => {
                translate(language, MessageKey::GenerationNoImageText, &[("text", text.as_str())])
            }
            Self::NoImage { text: None } => {
                translate(language, MessageKey::GenerationNoImageGeneric, &[])
            }
            Self::Transport(message) => message.clone(),
        }
    }
}

pub trait ImageGenerator {
    fn generate(&self, image: &Artifact, prompt: &str) -> GenerationOutcome;
}

impl<F> ImageGenerator for F
where
    F: Fn(&Artifact, &str) -> GenerationOutcome,
{
    fn generate(&self, image: &Artifact, prompt: &str) -> GenerationOutcome {
        self(image, prompt)
    }
}

/// A validated request, tagged with the session epoch it was issued in.
#[derive(Debug, Clone)]
pub struct GenerationTicket {
    epoch: u64,
    source: Artifact,
    prompt: String,
}

impl GenerationTicket {
    pub(crate) fn new(epoch: u64, source: Artifact, prompt: String) -> Self {
        Self {
            epoch,
            source,
            prompt,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn source(&self) -> &Artifact {
        &self.source
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn run<G: ImageGenerator + ?Sized>(&self, generator: &G) -> GenerationOutcome {
        tracing::debug!(
            epoch = self.epoch,
            source = %self.source.id(),
            "invoking image generator"
        );
        generator.generate(&self.source, &self.prompt)
    }
}

/// A generation running on a worker thread.
#[derive(Debug)]
pub struct PendingGeneration {
    ticket: GenerationTicket,
    receiver: mpsc::Receiver<GenerationOutcome>,
}

impl PendingGeneration {
    pub fn ticket(&self) -> &GenerationTicket {
        &self.ticket
    }

    /// Non-blocking poll. Hands the pending generation back while the worker is still busy.
    pub fn try_finish(self) -> Result<(GenerationTicket, GenerationOutcome), Self> {
        match self.receiver.try_recv() {
            Ok(outcome) => Ok((self.ticket, outcome)),
            Err(mpsc::TryRecvError::Empty) => Err(self),
            Err(mpsc::TryRecvError::Disconnected) => Ok((self.ticket, Err(worker_exited()))),
        }
    }

    pub fn wait(self) -> (GenerationTicket, GenerationOutcome) {
        let outcome = self.receiver.recv().unwrap_or_else(|_| Err(worker_exited()));
        (self.ticket, outcome)
    }
}

/// Runs the collaborator off the calling thread; the result is collected with
/// [`PendingGeneration::try_finish`] or [`PendingGeneration::wait`].
pub fn spawn_generation(
    generator: Arc<dyn ImageGenerator + Send + Sync>,
    ticket: GenerationTicket,
) -> PendingGeneration {
    let (tx, rx) = mpsc::channel::<GenerationOutcome>();
    let request = ticket.clone();
    std::thread::spawn(move || {
        let outcome = request.run(generator.as_ref());
        let _ = tx.send(outcome);
    });

    PendingGeneration {
        ticket,
        receiver: rx,
    }
}

fn worker_exited() -> GenerationFailure {
    GenerationFailure::Transport("generation worker exited without a result".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket() -> GenerationTicket {
        GenerationTicket::new(
            3,
            Artifact::new("source.png", "image/png", vec![1_u8]),
            "paint it".to_string(),
        )
    }

    #[test]
    fn closure_generators_receive_source_and_prompt() {
        let generator = |image: &Artifact, prompt: &str| -> GenerationOutcome {
            Ok(ImageData::new(
                "image/png",
                format!("{}:{prompt}", image.name()).into_bytes(),
            ))
        };
        let outcome = ticket().run(&generator).expect("generator should succeed");
        assert_eq!(outcome.bytes, b"source.png:paint it".to_vec());
    }

    #[test]
    fn spawned_generation_delivers_outcome() {
        let generator: Arc<dyn ImageGenerator + Send + Sync> =
            Arc::new(|_: &Artifact, _: &str| -> GenerationOutcome {
                Err(GenerationFailure::Stopped {
                    reason: "SAFETY".to_string(),
                })
            });
        let (ticket, outcome) = spawn_generation(generator, ticket()).wait();
        assert_eq!(ticket.epoch(), 3);
        assert_eq!(
            outcome,
            Err(GenerationFailure::Stopped {
                reason: "SAFETY".to_string()
            })
        );
    }

    fn poll_until_done(mut pending: PendingGeneration) -> (GenerationTicket, GenerationOutcome) {
        loop {
            match pending.try_finish() {
                Ok(done) => return done,
                Err(still_running) => {
                    pending = still_running;
                    std::thread::sleep(std::time::Duration::from_millis(2));
                }
            }
        }
    }

    #[test]
    fn try_finish_hands_back_pending_until_worker_reports() {
        let (release, gate) = mpsc::channel::<()>();
        let gate = std::sync::Mutex::new(gate);
        let generator: Arc<dyn ImageGenerator + Send + Sync> =
            Arc::new(move |_: &Artifact, _: &str| -> GenerationOutcome {
                let _ = gate.lock().map(|rx| rx.recv());
                Ok(ImageData::new("image/png", vec![7_u8]))
            });

        let pending = spawn_generation(generator, ticket());
        let pending = match pending.try_finish() {
            Ok(_) => panic!("worker is still waiting on the gate"),
            Err(pending) => pending,
        };
        assert_eq!(pending.ticket().prompt(), "paint it");

        release.send(()).expect("worker should be waiting");
        let (ticket, outcome) = poll_until_done(pending);
        assert_eq!(ticket.epoch(), 3);
        assert_eq!(outcome, Ok(ImageData::new("image/png", vec![7_u8])));
    }

    #[test]
    fn try_finish_reports_worker_that_died_without_result() {
        let generator: Arc<dyn ImageGenerator + Send + Sync> =
            Arc::new(|_: &Artifact, _: &str| -> GenerationOutcome {
                panic!("collaborator crashed")
            });

        let (_, outcome) = poll_until_done(spawn_generation(generator, ticket()));
        assert_eq!(outcome, Err(worker_exited()));
    }

    #[test]
    fn localized_failures_interpolate_collaborator_text() {
        let failure = GenerationFailure::Blocked {
            reason: "OTHER".to_string(),
            message: "try again".to_string(),
        };
        assert_eq!(
            failure.localized(Language::En),
            "Request was blocked. Reason: OTHER. try again"
        );

        let failure = GenerationFailure::NoImage {
            text: Some("I can't".to_string()),
        };
        assert!(failure.localized(Language::Zh).contains("\"I can't\""));

        let failure = GenerationFailure::Transport("network down".to_string());
        assert_eq!(failure.localized(Language::En), "network down");
    }
}
