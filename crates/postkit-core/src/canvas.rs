//! Canvas document and editing state.

use crate::color::HexColor;
use crate::layers::{
    ImageLayer, ImageSource, Layer, LayerId, LayerKind, LayerLimits, LayerPatch, ShapeKind,
    ShapeLayer, TextLayer,
};
use crate::resources::{ImageResource, ResourceHandle, ResourcePool};
use crate::viewport::Viewport;
use kurbo::{Point, Size, Vec2};
use std::collections::HashSet;
use thiserror::Error;

/// Offset applied to a duplicated layer so it does not hide the original.
pub const DUPLICATE_OFFSET: f64 = 16.0;

const DEFAULT_TEXT: &str = "New Text";
const TEXT_POSITION: Point = Point::new(80.0, 80.0);
const IMAGE_POSITION: Point = Point::new(120.0, 180.0);
const SHAPE_POSITION: Point = Point::new(100.0, 220.0);

/// Structural problems found when loading a layer collection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("layer collection is empty")]
    Empty,
    #[error("expected exactly one background layer, found {0}")]
    BackgroundCount(usize),
    #[error("duplicate layer id {0}")]
    DuplicateId(LayerId),
}

/// Direction for a single-step z-order change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderDirection {
    Forward,
    Backward,
}

/// The ordered layer collection of one composition.
///
/// Layers are stored in paint order and `z` always equals the index, with the
/// background at index 0.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasDocument {
    layers: Vec<Layer>,
}

impl Default for CanvasDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasDocument {
    /// Create a document holding only a white background.
    pub fn new() -> Self {
        Self {
            layers: vec![Layer::background(HexColor::white())],
        }
    }

    /// Build a document from layers in stored order, validating structure and
    /// renumbering z. The background is moved to the bottom if needed.
    pub fn from_layers(mut layers: Vec<Layer>) -> Result<Self, DocumentError> {
        if layers.is_empty() {
            return Err(DocumentError::Empty);
        }
        let backgrounds = layers.iter().filter(|l| l.is_background()).count();
        if backgrounds != 1 {
            return Err(DocumentError::BackgroundCount(backgrounds));
        }
        let mut seen = HashSet::new();
        for layer in &layers {
            if !seen.insert(layer.id) {
                return Err(DocumentError::DuplicateId(layer.id));
            }
        }
        if let Some(pos) = layers.iter().position(Layer::is_background) {
            if pos != 0 {
                let background = layers.remove(pos);
                layers.insert(0, background);
            }
        }
        let mut document = Self { layers };
        document.renumber();
        Ok(document)
    }

    /// Layers in paint order (bottom first).
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Deep copy of the layer collection.
    pub fn snapshot(&self) -> Vec<Layer> {
        self.layers.clone()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// A document always holds its background, so this is never true in
    /// practice.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    fn get_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn background(&self) -> Option<&Layer> {
        self.layers.first().filter(|l| l.is_background())
    }

    /// Highest z in use.
    pub fn max_z(&self) -> u32 {
        self.layers.iter().map(|l| l.z).max().unwrap_or(0)
    }

    /// Append a layer on top. The background cannot be added twice.
    fn push(&mut self, mut layer: Layer) -> Option<LayerId> {
        if layer.is_background() {
            return None;
        }
        layer.z = self.max_z() + 1;
        let id = layer.id;
        self.layers.push(layer);
        self.renumber();
        Some(id)
    }

    fn remove(&mut self, id: LayerId) -> Option<Layer> {
        let index = self.index_of(id)?;
        if self.layers[index].is_background() {
            return None;
        }
        let layer = self.layers.remove(index);
        self.renumber();
        Some(layer)
    }

    /// Swap with the neighbour in the given direction. Nothing moves past the
    /// background.
    fn reorder(&mut self, id: LayerId, direction: ReorderDirection) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        if self.layers[index].is_background() {
            return false;
        }
        let target = match direction {
            ReorderDirection::Forward if index + 1 < self.layers.len() => index + 1,
            ReorderDirection::Backward if index > 1 => index - 1,
            _ => return false,
        };
        self.layers.swap(index, target);
        self.renumber();
        true
    }

    /// Top-most non-background layer containing `point`.
    pub fn hit_test(&self, point: Point) -> Option<LayerId> {
        self.layers
            .iter()
            .rev()
            .find(|l| l.hit_test(point))
            .map(|l| l.id)
    }

    /// First text layer in paint order.
    pub fn first_text(&self) -> Option<&TextLayer> {
        self.layers.iter().find_map(Layer::as_text)
    }

    fn renumber(&mut self) {
        for (z, layer) in self.layers.iter_mut().enumerate() {
            layer.z = z as u32;
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.layers)
    }
}

/// The built-in starting composition for a new design.
pub fn default_layers() -> Vec<Layer> {
    let mut layers = vec![
        Layer::background(HexColor::white()),
        Layer::text(
            Point::new(60.0, 80.0),
            TextLayer::new("Your Title Here")
                .with_font_size(40.0)
                .with_bold(true)
                .with_color(HexColor::rgb(15, 23, 42)),
        ),
        Layer::text(
            Point::new(60.0, 140.0),
            TextLayer::new("Subtitle or short description")
                .with_font_size(16.0)
                .with_color(HexColor::rgb(71, 85, 105)),
        ),
    ];
    for (z, layer) in layers.iter_mut().enumerate() {
        layer.z = z as u32;
    }
    layers
}

/// Runtime editing state: the document plus selection, viewport, edit limits
/// and the resources owned by image layers.
#[derive(Debug)]
pub struct Canvas {
    pub document: CanvasDocument,
    pub viewport: Viewport,
    selection: Option<LayerId>,
    resources: ResourcePool,
    limits: LayerLimits,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    pub fn new() -> Self {
        Self::with_document(CanvasDocument::new())
    }

    pub fn with_document(document: CanvasDocument) -> Self {
        Self {
            document,
            viewport: Viewport::new(),
            selection: None,
            resources: ResourcePool::new(),
            limits: LayerLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: LayerLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Ranges every position, size and font-size edit is clamped to.
    pub fn limits(&self) -> &LayerLimits {
        &self.limits
    }

    pub fn set_limits(&mut self, limits: LayerLimits) {
        self.limits = limits;
    }

    pub fn selection(&self) -> Option<LayerId> {
        self.selection
    }

    pub fn selected_layer(&self) -> Option<&Layer> {
        self.selection.and_then(|id| self.document.get(id))
    }

    /// Select a layer. Unknown ids are ignored.
    pub fn select(&mut self, id: LayerId) -> bool {
        if self.document.contains(id) {
            self.selection = Some(id);
            true
        } else {
            log::debug!("Ignoring selection of unknown layer {}", id);
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn is_selected(&self, id: LayerId) -> bool {
        self.selection == Some(id)
    }

    pub fn resources(&self) -> &ResourcePool {
        &self.resources
    }

    pub fn layers_ordered(&self) -> &[Layer] {
        self.document.layers()
    }

    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.document.get(id)
    }

    pub fn hit_test(&self, point: Point) -> Option<LayerId> {
        self.document.hit_test(point)
    }

    fn insert_selected(&mut self, layer: Layer) -> LayerId {
        let id = layer.id;
        log::debug!("Adding {} layer {}", layer.layer_type().name(), id);
        if self.document.push(layer).is_some() {
            self.selection = Some(id);
        }
        id
    }

    /// Add a text layer. Empty or missing content falls back to "New Text".
    pub fn add_text(&mut self, content: Option<&str>) -> LayerId {
        let content = content.filter(|c| !c.is_empty()).unwrap_or(DEFAULT_TEXT);
        self.insert_selected(Layer::text(TEXT_POSITION, TextLayer::new(content)))
    }

    /// Add an image layer. With bytes the layer owns a new resource,
    /// otherwise it shows the placeholder picture.
    pub fn add_image(&mut self, bytes: Option<Vec<u8>>) -> LayerId {
        let image = match bytes {
            Some(bytes) => ImageLayer::owned(self.resources.register(ImageResource::new(bytes))),
            None => ImageLayer::placeholder(),
        };
        self.insert_selected(Layer::image(IMAGE_POSITION, image))
    }

    pub fn add_shape(&mut self, kind: ShapeKind) -> LayerId {
        self.insert_selected(Layer::shape(SHAPE_POSITION, ShapeLayer::new(kind)))
    }

    /// Deep-copy a layer, offset it and select the copy. Owned resources are
    /// copied so each layer keeps exclusive ownership of its handle.
    pub fn duplicate(&mut self, id: LayerId) -> Option<LayerId> {
        let source = self.document.get(id)?;
        if source.is_background() {
            return None;
        }
        let mut copy = source.clone();
        copy.id = LayerId::new();
        let offset = copy.position() + Vec2::new(DUPLICATE_OFFSET, DUPLICATE_OFFSET);
        copy.set_position(Point::new(
            self.limits.position(offset.x),
            self.limits.position(offset.y),
        ));

        let owned = copy.as_image().and_then(|i| i.source.owned_handle());
        if let (Some(handle), Some(image)) = (owned, copy.as_image_mut()) {
            image.source = match self.resources.duplicate(handle) {
                Some(fresh) => ImageSource::Local {
                    handle: fresh,
                    owned: true,
                },
                None => {
                    log::warn!("Resource {} is no longer held; duplicate has no image", handle);
                    ImageSource::Unset
                }
            };
        }
        Some(self.insert_selected(copy))
    }

    /// Remove a layer, releasing its owned resource. The background and
    /// unknown ids are ignored.
    pub fn delete(&mut self, id: LayerId) -> bool {
        let Some(layer) = self.document.remove(id) else {
            log::debug!("Ignoring delete of unknown or background layer {}", id);
            return false;
        };
        if let Some(handle) = layer.as_image().and_then(|i| i.source.owned_handle()) {
            self.resources.release(handle);
        }
        if self.selection == Some(id) {
            self.selection = None;
        }
        true
    }

    pub fn reorder(&mut self, id: LayerId, direction: ReorderDirection) -> bool {
        self.document.reorder(id, direction)
    }

    /// Apply a typed patch within the canvas limits. Wrong-variant patches
    /// and unknown ids are no-ops.
    pub fn update(&mut self, id: LayerId, patch: &LayerPatch) -> bool {
        match self.document.get_mut(id) {
            Some(layer) => layer.apply(patch, &self.limits),
            None => {
                log::debug!("Ignoring update of unknown layer {}", id);
                false
            }
        }
    }

    /// Move a layer without clamping; callers clamp to the canvas extent.
    pub fn set_position(&mut self, id: LayerId, position: Point) -> bool {
        match self.document.get_mut(id) {
            Some(layer) => {
                layer.set_position(position);
                true
            }
            None => false,
        }
    }

    /// Resize an image or shape layer within the canvas limits.
    pub fn set_size(&mut self, id: LayerId, size: Size) -> bool {
        let limits = self.limits;
        self.document
            .get_mut(id)
            .is_some_and(|layer| layer.set_size(size, &limits))
    }

    /// Point an image layer at new user-supplied bytes, releasing the
    /// resource it previously owned.
    pub fn replace_image(&mut self, id: LayerId, bytes: Vec<u8>) -> bool {
        let Some(image) = self.document.get_mut(id).and_then(Layer::as_image_mut) else {
            return false;
        };
        if let Some(previous) = image.source.owned_handle() {
            self.resources.release(previous);
        }
        let handle = self.resources.register(ImageResource::new(bytes));
        image.source = ImageSource::Local {
            handle,
            owned: true,
        };
        true
    }

    /// Replace the whole collection with a history snapshot. The selection is
    /// kept only if the layer still exists. Resources are not touched.
    pub fn restore(&mut self, layers: &[Layer]) -> bool {
        match CanvasDocument::from_layers(layers.to_vec()) {
            Ok(document) => {
                self.document = document;
                if self.selection.is_some_and(|id| !self.document.contains(id)) {
                    self.selection = None;
                }
                true
            }
            Err(err) => {
                log::error!("Refusing to restore invalid snapshot: {}", err);
                false
            }
        }
    }

    /// Handles of every resource the live document points at.
    pub fn referenced_handles(&self) -> HashSet<ResourceHandle> {
        self.document
            .layers()
            .iter()
            .filter_map(Layer::resource_handle)
            .collect()
    }

    /// Release resources that neither the live document nor `retained`
    /// (handles held elsewhere, e.g. by history snapshots) points at.
    pub fn release_unreferenced(&mut self, retained: &HashSet<ResourceHandle>) -> usize {
        let mut keep = self.referenced_handles();
        keep.extend(retained.iter().copied());
        let released = self.resources.release_unreferenced(&keep);
        if released > 0 {
            log::debug!("Released {} unreachable image resources", released);
        }
        released
    }

    /// Release every resource still held. Called on editor teardown.
    pub fn release_all_resources(&mut self) -> usize {
        self.resources.release_all()
    }

    /// Text content of the selected layer, if it is a text layer.
    pub fn selected_text(&self) -> Option<&TextLayer> {
        self.selected_layer().and_then(Layer::as_text)
    }

    pub fn layer_kind(&self, id: LayerId) -> Option<&LayerKind> {
        self.document.get(id).map(|l| &l.kind)
    }
}
