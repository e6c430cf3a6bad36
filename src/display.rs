use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use image::RgbaImage;

use crate::artifact::{Artifact, ArtifactId, DecodingResult};
use crate::geometry::ImageBounds;

pub struct PreviewHandle {
    artifact_id: ArtifactId,
    image: Arc<RgbaImage>,
    live: Rc<Cell<usize>>,
}

impl PreviewHandle {
    fn acquire(artifact_id: ArtifactId, image: Arc<RgbaImage>, live: &Rc<Cell<usize>>) -> Self {
        live.set(live.get() + 1);
        tracing::trace!(%artifact_id, live = live.get(), "acquired preview");
        Self {
            artifact_id,
            image,
            live: Rc::clone(live),
        }
    }

    pub fn artifact_id(&self) -> ArtifactId {
        self.artifact_id
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn bounds(&self) -> ImageBounds {
        ImageBounds::new(self.image.width(), self.image.height())
    }
}

impl std::fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewHandle")
            .field("artifact_id", &self.artifact_id)
            .field("bounds", &self.bounds())
            .finish()
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.live.set(self.live.get().saturating_sub(1));
        tracing::trace!(artifact_id = %self.artifact_id, live = self.live.get(), "released preview");
    }
}

/// Decoded previews for the current and original artifacts. A handle lives only while
/// its artifact occupies a slot.
#[derive(Debug, Default)]
pub struct DisplaySlots {
    current: Option<PreviewHandle>,
    original: Option<PreviewHandle>,
    live: Rc<Cell<usize>>,
}

impl DisplaySlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points both slots at the given artifacts, releasing whatever they no longer show.
    pub fn sync(
        &mut self,
        current: Option<&Artifact>,
        original: Option<&Artifact>,
    ) -> DecodingResult<()> {
        let current_result = self.sync_current(current);
        let original_result = self.sync_original(original);
        current_result.and(original_result)
    }

    fn sync_current(&mut self, artifact: Option<&Artifact>) -> DecodingResult<()> {
        let shared = shared_image(self.original.as_ref(), artifact);
        sync_slot(&mut self.current, artifact, shared, &self.live)
    }

    fn sync_original(&mut self, artifact: Option<&Artifact>) -> DecodingResult<()> {
        let shared = shared_image(self.current.as_ref(), artifact);
        sync_slot(&mut self.original, artifact, shared, &self.live)
    }

    pub fn current(&self) -> Option<&PreviewHandle> {
        self.current.as_ref()
    }

    pub fn original(&self) -> Option<&PreviewHandle> {
        self.original.as_ref()
    }

    pub fn live_handles(&self) -> usize {
        self.live.get()
    }
}

fn shared_image(other: Option<&PreviewHandle>, artifact: Option<&Artifact>) -> Option<Arc<RgbaImage>> {
    let (other, artifact) = (other?, artifact?);
    (other.artifact_id == artifact.id()).then(|| Arc::clone(&other.image))
}

fn sync_slot(
    slot: &mut Option<PreviewHandle>,
    artifact: Option<&Artifact>,
    shared: Option<Arc<RgbaImage>>,
    live: &Rc<Cell<usize>>,
) -> DecodingResult<()> {
    let Some(artifact) = artifact else {
        *slot = None;
        return Ok(());
    };
    if slot
        .as_ref()
        .is_some_and(|handle| handle.artifact_id == artifact.id())
    {
        return Ok(());
    }

    *slot = None;
    let image = match shared {
        Some(image) => image,
        None => Arc::new(artifact.decode()?.to_rgba8()),
    };
    *slot = Some(PreviewHandle::acquire(artifact.id(), image, live));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crop::encode_png;
    use image::Rgba;

    fn png_artifact(name: &str, width: u32, height: u32) -> Artifact {
        let image = RgbaImage::from_pixel(width, height, Rgba([1, 2, 3, 255]));
        let bytes = encode_png(&image).expect("encode should succeed");
        Artifact::new(name, "image/png", bytes)
    }

    #[test]
    fn sync_acquires_and_releases_on_swap() {
        let first = png_artifact("first.png", 4, 4);
        let second = png_artifact("second.png", 8, 2);
        let mut slots = DisplaySlots::new();

        slots.sync(Some(&first), Some(&first)).expect("sync should succeed");
        assert_eq!(slots.live_handles(), 2);
        assert_eq!(slots.current().map(PreviewHandle::artifact_id), Some(first.id()));

        slots.sync(Some(&second), Some(&first)).expect("sync should succeed");
        assert_eq!(slots.live_handles(), 2);
        assert_eq!(
            slots.current().map(PreviewHandle::bounds),
            Some(ImageBounds::new(8, 2))
        );

        slots.sync(None, None).expect("sync should succeed");
        assert_eq!(slots.live_handles(), 0);
        assert!(slots.current().is_none());
    }

    #[test]
    fn same_artifact_shares_decoded_bitmap() {
        let only = png_artifact("only.png", 3, 3);
        let mut slots = DisplaySlots::new();
        slots.sync(Some(&only), Some(&only)).expect("sync should succeed");

        let current = slots.current().expect("current slot");
        let original = slots.original().expect("original slot");
        assert!(Arc::ptr_eq(&current.image, &original.image));
    }

    #[test]
    fn dropping_slots_releases_handles() {
        let only = png_artifact("only.png", 3, 3);
        let mut slots = DisplaySlots::new();
        slots.sync(Some(&only), Some(&only)).expect("sync should succeed");
        let live = Rc::clone(&slots.live);
        drop(slots);
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn undecodable_artifact_leaves_slot_empty() {
        let broken = Artifact::new("broken.png", "image/png", vec![0_u8; 4]);
        let mut slots = DisplaySlots::new();
        assert!(slots.sync(Some(&broken), None).is_err());
        assert!(slots.current().is_none());
        assert_eq!(slots.live_handles(), 0);
    }
}
