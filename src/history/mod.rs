use crate::artifact::Artifact;

/// Linear edit history with a cursor. Appending after an undo discards the redo tail;
/// `reset` only moves the cursor, so later edits stay reachable through `redo`.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<Artifact>,
    position: Option<usize>,
}

impl History {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            position: None,
        }
    }

    pub fn initialize(&mut self, artifact: Artifact) {
        self.entries.clear();
        self.entries.push(artifact);
        self.position = Some(0);
    }

    /// Pushes `artifact` after the cursor and returns how many redo entries were evicted.
    pub fn append(&mut self, artifact: Artifact) -> usize {
        let Some(position) = self.position else {
            self.initialize(artifact);
            return 0;
        };

        let keep = position + 1;
        let evicted = self.entries.len().saturating_sub(keep);
        self.entries.truncate(keep);
        self.entries.push(artifact);
        self.position = Some(self.entries.len() - 1);
        evicted
    }

    pub fn can_undo(&self) -> bool {
        self.position.is_some_and(|position| position > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.position
            .is_some_and(|position| position + 1 < self.entries.len())
    }

    pub fn can_reset(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn undo(&mut self) -> bool {
        match self.position {
            Some(position) if position > 0 => {
                self.position = Some(position - 1);
                true
            }
            _ => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.position {
            Some(position) if position + 1 < self.entries.len() => {
                self.position = Some(position + 1);
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) -> bool {
        if !self.can_reset() {
            return false;
        }
        self.position = Some(0);
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.position = None;
    }

    pub fn current(&self) -> Option<&Artifact> {
        self.position.and_then(|position| self.entries.get(position))
    }

    pub fn original(&self) -> Option<&Artifact> {
        self.entries.first()
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn entries(&self) -> &[Artifact] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
