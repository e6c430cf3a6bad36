use thiserror::Error;

use crate::geometry::{CropRegion, Size};

pub type CropSessionResult<T> = std::result::Result<T, CropSessionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CropState {
    #[default]
    Idle,
    Active,
    Applying,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropEvent {
    Start,
    Change,
    Complete,
    Apply,
    Finish,
    Cancel,
    Settle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropTransition {
    pub from: CropState,
    pub event: CropEvent,
    pub to: CropState,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CropSessionError {
    #[error("invalid crop transition: from {from:?} using event {event:?}")]
    InvalidTransition { from: CropState, event: CropEvent },
    #[error("no finalized crop region")]
    NoCompletedCrop,
}

/// A finalized square region, consumed exactly once by the transform engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletedCrop(CropRegion);

impl CompletedCrop {
    pub fn new(region: CropRegion) -> Self {
        Self(region.squared())
    }

    pub fn region(&self) -> CropRegion {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct CropSession {
    state: CropState,
    region: Option<CropRegion>,
    completed: Option<CompletedCrop>,
    transitions: Vec<CropTransition>,
}

impl CropSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CropState {
        self.state
    }

    pub fn region(&self) -> Option<CropRegion> {
        self.region
    }

    pub fn completed(&self) -> Option<CompletedCrop> {
        self.completed
    }

    pub fn is_active(&self) -> bool {
        self.state == CropState::Active
    }

    /// State changes of the most recent session, oldest first.
    pub fn transitions(&self) -> &[CropTransition] {
        &self.transitions
    }

    pub fn can_transition(&self, event: CropEvent) -> bool {
        self.next_state(event).is_some()
    }

    pub fn next_state(&self, event: CropEvent) -> Option<CropState> {
        use CropEvent::*;
        match (self.state, event) {
            (CropState::Idle, Start) => Some(CropState::Active),
            (CropState::Active, Change | Complete) => Some(CropState::Active),
            (CropState::Active, Apply) => Some(CropState::Applying),
            (CropState::Active, Cancel) => Some(CropState::Cancelled),
            (CropState::Applying, Finish) => Some(CropState::Idle),
            (CropState::Cancelled, Settle) => Some(CropState::Idle),
            _ => None,
        }
    }

    fn transition(&mut self, event: CropEvent) -> CropSessionResult<CropState> {
        tracing::debug!(from = ?self.state, event = ?event, "request crop transition");
        let next = self.next_state(event).ok_or_else(|| {
            let from = self.state;
            tracing::warn!(from = ?from, event = ?event, "invalid crop transition requested");
            CropSessionError::InvalidTransition { from, event }
        })?;

        if event == CropEvent::Start {
            self.transitions.clear();
        }
        // Drag updates loop on Active and are not recorded.
        if next != self.state {
            self.transitions.push(CropTransition {
                from: self.state,
                event,
                to: next,
            });
        }
        self.state = next;
        Ok(next)
    }

    /// Enters crop mode with the largest centered square of the display box.
    pub fn start(&mut self, container: Size) -> CropSessionResult<CropRegion> {
        self.transition(CropEvent::Start)?;
        let region = CropRegion::centered_square(container);
        self.region = Some(region);
        self.completed = None;
        Ok(region)
    }

    pub fn change(&mut self, region: CropRegion) -> CropSessionResult<CropRegion> {
        self.transition(CropEvent::Change)?;
        let region = region.squared();
        self.region = Some(region);
        Ok(region)
    }

    pub fn complete(&mut self, region: CropRegion) -> CropSessionResult<CompletedCrop> {
        self.transition(CropEvent::Complete)?;
        let completed = CompletedCrop::new(region);
        self.region = Some(completed.region());
        self.completed = Some(completed);
        Ok(completed)
    }

    /// Moves to `Applying` and hands out the finalized crop.
    pub fn begin_apply(&mut self) -> CropSessionResult<CompletedCrop> {
        if !self.can_transition(CropEvent::Apply) {
            return Err(CropSessionError::InvalidTransition {
                from: self.state,
                event: CropEvent::Apply,
            });
        }
        let completed = self.completed.take().ok_or(CropSessionError::NoCompletedCrop)?;
        self.transition(CropEvent::Apply)?;
        Ok(completed)
    }

    /// Leaves `Applying`; the session is discarded whether or not the render succeeded.
    pub fn finish(&mut self) -> CropSessionResult<()> {
        self.transition(CropEvent::Finish)?;
        self.discard();
        Ok(())
    }

    pub fn cancel(&mut self) -> CropSessionResult<()> {
        self.transition(CropEvent::Cancel)?;
        self.discard();
        self.transition(CropEvent::Settle)?;
        Ok(())
    }

    /// Returns to `Idle` from any state without reporting errors.
    pub fn abandon(&mut self) -> bool {
        let result = match self.state {
            CropState::Idle => return false,
            CropState::Active => self.cancel(),
            CropState::Applying => self.finish(),
            CropState::Cancelled => self.transition(CropEvent::Settle).map(|_| ()),
        };
        if let Err(err) = result {
            tracing::warn!(?err, "crop session could not be abandoned cleanly");
        }
        self.discard();
        true
    }

    fn discard(&mut self) {
        self.region = None;
        self.completed = None;
    }
}
