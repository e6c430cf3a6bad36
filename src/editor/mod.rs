//! Editor session: edit history, crop session, generation gate and the error slot.
//!
//! Every operation either advances the history exactly once or leaves it untouched.
//! Observers registered with [`Editor::subscribe`] see each transition as it happens.

mod error;

use std::sync::Arc;

pub use error::{EditorError, EditorResult, ValidationError};

use crate::artifact::{timestamp_millis, Artifact, ArtifactId, DecodingError};
use crate::config::AppConfig;
use crate::crop::{self, CompletedCrop, CropSession, CropState, RenderOptions, TransformError};
use crate::display::DisplaySlots;
use crate::events::{EditorEvent, EventBus, SubscriptionId};
use crate::generation::{
    GenerationOutcome, GenerationTicket, ImageGenerator, GENERATED_ARTIFACT_STEM,
};
use crate::geometry::{CropRegion, Size};
use crate::history::History;
use crate::i18n::Language;
use crate::templates::TemplateCatalog;

pub const CROPPED_ARTIFACT_STEM: &str = "cropped-avatar";
const CROPPED_ARTIFACT_MIME: &str = "image/png";

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EditorSettings {
    pub language: Language,
    pub render: RenderOptions,
}

impl From<&AppConfig> for EditorSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            language: config.language(),
            render: RenderOptions {
                pixel_ratio: config.pixel_ratio(),
                background: config.background(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStatus {
    Committed(ArtifactId),
    /// The session changed while the request was in flight; nothing was appended.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download<'a> {
    pub filename: String,
    pub mime: &'a str,
    pub bytes: &'a [u8],
}

#[derive(Debug)]
pub struct Editor {
    settings: EditorSettings,
    history: History,
    crop: CropSession,
    display: DisplaySlots,
    templates: TemplateCatalog,
    template_warning: Option<String>,
    prompt: String,
    selected_template: Option<String>,
    error: Option<String>,
    busy: bool,
    comparing: bool,
    epoch: u64,
    events: EventBus,
}

impl Editor {
    pub fn new(settings: EditorSettings) -> Self {
        Self {
            settings,
            history: History::new(),
            crop: CropSession::new(),
            display: DisplaySlots::new(),
            templates: TemplateCatalog::default(),
            template_warning: None,
            prompt: String::new(),
            selected_template: None,
            error: None,
            busy: false,
            comparing: false,
            epoch: 0,
            events: EventBus::new(),
        }
    }

    /// Builds an editor from config, loading templates when a catalog path resolves.
    pub fn from_config(config: &AppConfig) -> Self {
        let settings = EditorSettings::from(config);
        let mut editor = Self::new(settings);
        if let Some(path) = config.templates_path() {
            let (templates, warning) = TemplateCatalog::load_or_empty(&path, settings.language);
            editor.templates = templates;
            editor.template_warning = warning;
        }
        editor
    }

    pub fn with_templates(mut self, templates: TemplateCatalog) -> Self {
        self.templates = templates;
        self.template_warning = None;
        self
    }

    pub fn settings(&self) -> EditorSettings {
        self.settings
    }

    pub fn language(&self) -> Language {
        self.settings.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.settings.language = language;
    }

    pub fn toggle_language(&mut self) -> Language {
        self.settings.language = self.settings.language.toggled();
        self.settings.language
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn crop_session(&self) -> &CropSession {
        &self.crop
    }

    pub fn display(&self) -> &DisplaySlots {
        &self.display
    }

    pub fn templates(&self) -> &TemplateCatalog {
        &self.templates
    }

    pub fn template_warning(&self) -> Option<&str> {
        self.template_warning.as_deref()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn selected_template(&self) -> Option<&str> {
        self.selected_template.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_comparing(&self) -> bool {
        self.comparing
    }

    pub fn current(&self) -> Option<&Artifact> {
        self.history.current()
    }

    pub fn original(&self) -> Option<&Artifact> {
        self.history.original()
    }

    /// What the viewer shows: the original while comparing, otherwise the current artifact.
    pub fn displayed(&self) -> Option<&Artifact> {
        if self.comparing && self.history.can_undo() {
            self.history.original()
        } else {
            self.history.current()
        }
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&EditorEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Starts a fresh session from a user-supplied file.
    pub fn upload(
        &mut self,
        name: impl Into<String>,
        mime: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> EditorResult<ArtifactId> {
        let artifact = Artifact::new(name, mime, bytes);
        if let Err(err) = artifact.decode() {
            return Err(self.fail(err.into()));
        }

        self.abandon_crop();
        self.clear_error();
        self.clear_prompt();
        self.set_comparing(false);
        self.epoch += 1;

        let id = artifact.id();
        tracing::info!(artifact = %id, name = artifact.name(), "uploaded image");
        self.history.initialize(artifact);
        self.refresh_display();
        self.publish_history();
        Ok(id)
    }

    /// Drops the whole session so a new image can be uploaded.
    pub fn start_over(&mut self) {
        self.abandon_crop();
        self.clear_error();
        self.clear_prompt();
        self.set_comparing(false);
        self.epoch += 1;
        self.history.clear();
        self.refresh_display();
        self.publish_history();
        tracing::info!("session cleared");
    }

    pub fn undo(&mut self) -> bool {
        self.move_cursor("undo", History::undo)
    }

    pub fn redo(&mut self) -> bool {
        self.move_cursor("redo", History::redo)
    }

    pub fn reset(&mut self) -> bool {
        let moved = self.move_cursor("reset", History::reset);
        if moved {
            self.clear_error();
        }
        moved
    }

    fn move_cursor(&mut self, label: &'static str, step: fn(&mut History) -> bool) -> bool {
        if !step(&mut self.history) {
            tracing::debug!(action = label, "history action unavailable");
            return false;
        }
        self.abandon_crop();
        self.refresh_display();
        self.publish_history();
        tracing::debug!(action = label, position = ?self.history.position(), "history action applied");
        true
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
        self.events.publish(EditorEvent::PromptChanged);
    }

    /// Selects a template by label and copies its prompt for the active language.
    pub fn select_template(&mut self, label: &str) -> bool {
        let Some(template) = self.templates.find(label) else {
            tracing::debug!(label, "unknown template");
            return false;
        };
        self.prompt = template.prompt.get(self.settings.language).to_string();
        self.selected_template = Some(label.to_string());
        self.events.publish(EditorEvent::PromptChanged);
        true
    }

    pub fn set_comparing(&mut self, comparing: bool) {
        if self.comparing == comparing {
            return;
        }
        self.comparing = comparing;
        self.events
            .publish(EditorEvent::ComparingChanged { comparing });
    }

    pub fn begin_crop(&mut self, container: Size) -> EditorResult<CropRegion> {
        if self.history.current().is_none() {
            return Err(self.fail(ValidationError::NoImage.into()));
        }
        if self.busy {
            return Err(self.fail(ValidationError::Busy.into()));
        }
        match self.crop.start(container) {
            Ok(region) => {
                self.publish_crop();
                Ok(region)
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    pub fn change_crop(&mut self, region: CropRegion) -> EditorResult<CropRegion> {
        self.crop.change(region).map_err(|err| self.fail(err.into()))
    }

    pub fn complete_crop(&mut self, region: CropRegion) -> EditorResult<CompletedCrop> {
        self.crop.complete(region).map_err(|err| self.fail(err.into()))
    }

    pub fn cancel_crop(&mut self) -> EditorResult<()> {
        match self.crop.cancel() {
            Ok(()) => {
                self.publish_crop();
                Ok(())
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Renders the finalized crop of the current image shown in `container`.
    pub fn apply_crop(&mut self, container: Size) -> EditorResult<ArtifactId> {
        if self.busy {
            return Err(self.fail(ValidationError::Busy.into()));
        }
        let completed = match self.crop.begin_apply() {
            Ok(completed) => completed,
            Err(err) => {
                tracing::debug!(?err, "crop apply requested without a finalized crop");
                return Err(self.fail(TransformError::NoActiveCrop.into()));
            }
        };
        self.publish_crop();

        let rendered = self.render_crop(container, completed);
        if let Err(err) = self.crop.finish() {
            tracing::warn!(?err, "crop session did not finish cleanly");
        }
        self.publish_crop();

        match rendered {
            Ok(artifact) => Ok(self.commit(artifact)),
            Err(err) => Err(self.fail(err.into())),
        }
    }

    fn render_crop(&self, container: Size, completed: CompletedCrop) -> crop::TransformResult<Artifact> {
        let source = self
            .display
            .current()
            .ok_or(TransformError::NoActiveCrop)?;
        let output = crop::crop_to_square(source.image(), container, completed, self.settings.render)?;
        let bytes = crop::encode_png(&output)?;
        Ok(Artifact::new(
            format!("{CROPPED_ARTIFACT_STEM}-{}.png", timestamp_millis()),
            CROPPED_ARTIFACT_MIME,
            bytes,
        ))
    }

    /// Validates the request locally and marks the editor busy.
    pub fn begin_generation(&mut self) -> EditorResult<GenerationTicket> {
        let Some(source) = self.history.current().cloned() else {
            return Err(self.fail(ValidationError::NoImage.into()));
        };
        if self.prompt.trim().is_empty() {
            return Err(self.fail(ValidationError::EmptyPrompt.into()));
        }
        if self.busy {
            return Err(self.fail(ValidationError::Busy.into()));
        }

        self.clear_error();
        self.set_busy(true);
        Ok(GenerationTicket::new(self.epoch, source, self.prompt.clone()))
    }

    /// Commits a generation result only if the session and the current artifact are
    /// still the ones the ticket was issued for.
    pub fn finish_generation(
        &mut self,
        ticket: GenerationTicket,
        outcome: GenerationOutcome,
    ) -> EditorResult<CommitStatus> {
        self.set_busy(false);
        let current = self.history.current().map(Artifact::id);
        if ticket.epoch() != self.epoch || current != Some(ticket.source().id()) {
            tracing::info!(
                ticket_epoch = ticket.epoch(),
                epoch = self.epoch,
                source = %ticket.source().id(),
                ?current,
                "discarding stale generation result"
            );
            return Ok(CommitStatus::Stale);
        }

        let data = match outcome {
            Ok(data) => data,
            Err(failure) => return Err(self.fail(failure.into())),
        };
        if let Err(err) = image::load_from_memory(&data.bytes) {
            return Err(self.fail(DecodingError::from(err).into()));
        }

        let artifact = Artifact::from_image_data(GENERATED_ARTIFACT_STEM, data);
        Ok(CommitStatus::Committed(self.commit(artifact)))
    }

    /// Runs a whole generation round trip on the calling thread.
    pub fn generate_with<G: ImageGenerator + ?Sized>(
        &mut self,
        generator: &G,
    ) -> EditorResult<CommitStatus> {
        let ticket = self.begin_generation()?;
        let outcome = ticket.run(generator);
        self.finish_generation(ticket, outcome)
    }

    pub fn download(&self) -> Option<Download<'_>> {
        self.history.current().map(|artifact| Download {
            filename: artifact.download_name(),
            mime: artifact.mime(),
            bytes: artifact.bytes(),
        })
    }

    pub fn dismiss_error(&mut self) -> bool {
        let dismissed = self.error.take().is_some();
        if dismissed {
            self.events.publish(EditorEvent::ErrorDismissed);
        }
        dismissed
    }

    fn commit(&mut self, artifact: Artifact) -> ArtifactId {
        let id = artifact.id();
        let name = artifact.name().to_string();
        let evicted = self.history.append(artifact);
        self.refresh_display();
        self.publish_history();
        tracing::info!(
            artifact = %id,
            name,
            evicted,
            position = ?self.history.position(),
            "appended artifact to history"
        );
        id
    }

    fn fail(&mut self, err: EditorError) -> EditorError {
        let message = err.user_message(self.settings.language);
        tracing::warn!(%err, "editor operation failed");
        self.error = Some(message.clone());
        self.events.publish(EditorEvent::ErrorRaised { message });
        err
    }

    fn clear_error(&mut self) {
        self.dismiss_error();
    }

    fn clear_prompt(&mut self) {
        if self.prompt.is_empty() && self.selected_template.is_none() {
            return;
        }
        self.prompt.clear();
        self.selected_template = None;
        self.events.publish(EditorEvent::PromptChanged);
    }

    fn set_busy(&mut self, busy: bool) {
        if self.busy == busy {
            return;
        }
        self.busy = busy;
        self.events.publish(EditorEvent::BusyChanged { busy });
    }

    fn abandon_crop(&mut self) {
        if self.crop.abandon() {
            self.publish_crop();
        }
    }

    fn refresh_display(&mut self) {
        if let Err(err) = self
            .display
            .sync(self.history.current(), self.history.original())
        {
            tracing::warn!(?err, "failed to decode preview");
        }
    }

    fn publish_history(&mut self) {
        self.events.publish(EditorEvent::HistoryChanged {
            position: self.history.position(),
            len: self.history.len(),
        });
    }

    fn publish_crop(&mut self) {
        let state: CropState = self.crop.state();
        self.events.publish(EditorEvent::CropChanged { state });
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorSettings::default())
    }
}
