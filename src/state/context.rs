//! The editing session: one open project and everything that acts on it.
//!
//! `EditorContext` owns the scene store, render surface, history, tool
//! coordinator and persistence bridge, and is the only place their work is
//! sequenced. Every operation that can mutate the scene ends by draining the
//! store's change queue, which feeds the history capture timer, the autosave
//! timer and the event bus in one step.
//!
//! Timers never fire on their own. The host calls [`EditorContext::tick`]
//! from its event loop, and the injected [`Clock`] decides whether a debounced
//! history capture or autosave is due.
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn demo(services: canvas_studio::services::Services, id: canvas_studio::document::ProjectId) -> canvas_studio::error::EditorResult<()> {
//! use std::rc::Rc;
//! use canvas_studio::config::EditorConfig;
//! use canvas_studio::state::EditorContext;
//! use canvas_studio::tools::ToolId;
//! use canvas_studio::util::SystemClock;
//!
//! let mut session = EditorContext::open(services, EditorConfig::default(), Rc::new(SystemClock), &id).await?;
//! session.present(egui::vec2(1280.0, 800.0));
//! session.switch_tool(Some(ToolId::Crop))?;
//! session.commit_crop()?;
//! session.tick().await?;
//! session.close().await?;
//! # Ok(())
//! # }
//! ```
use std::rc::Rc;

use egui::{Pos2, Vec2};
use image::RgbaImage;

use super::persistence::PersistenceBridge;
use crate::config::EditorConfig;
use crate::document::{Document, ImageFlags, ProjectId};
use crate::element::{Element, ElementType, FilterKind, factory};
use crate::error::{EditorError, EditorResult};
use crate::event::{EditorEvent, EventBus, EventHandler, Notification, NoticeLevel, SubscriptionId};
use crate::history::HistoryManager;
use crate::id_generator::ObjectId;
use crate::renderer::{ExportPreset, ExportedImage, RenderSurface};
use crate::scene::{Background, SceneStore};
use crate::services::{AiEdit, NewProject, SearchResult, Services, UrlTransforms, UserProfile};
use crate::tools::{
    AdjustTool, AiEditTool, AiExtendTool, BackgroundTool, CropTool, DragGesture, ResizeTool, SwitchOutcome, TextTool,
    ToolContext, ToolCoordinator, ToolId, ToolKind,
};
use crate::util::Clock;

/// The main context of an editing session.
pub struct EditorContext {
    config: EditorConfig,
    clock: Rc<dyn Clock>,
    services: Services,
    user: UserProfile,
    document: Document,
    scene: SceneStore,
    surface: RenderSurface,
    history: HistoryManager,
    tools: ToolCoordinator,
    gesture: DragGesture,
    persistence: PersistenceBridge,
    event_bus: EventBus,
    /// Selection last announced on the bus
    last_selection: Option<ObjectId>,
    /// Problems met while opening the project
    load_warnings: Vec<Notification>,
}

impl std::fmt::Debug for EditorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorContext")
            .field("document", &self.document.id)
            .field("scene", &self.scene)
            .field("history", &self.history)
            .field("tools", &self.tools)
            .field("persistence", &self.persistence)
            .finish_non_exhaustive()
    }
}

fn tool_inactive(id: ToolId) -> EditorError {
    EditorError::InvalidState(format!("the {} tool is not active", id))
}

impl EditorContext {
    /// Upload an image and create a project around it, sized to the image
    pub async fn create_project(services: &Services, title: &str, bytes: Vec<u8>, file_name: &str) -> EditorResult<ProjectId> {
        let user = services.identity.current_user()?;
        let uploaded = services.host.upload_image(bytes, file_name).await?;
        let project = NewProject {
            title: title.to_owned(),
            width: uploaded.width,
            height: uploaded.height,
            original_image: uploaded.url,
            thumbnail: Some(uploaded.thumbnail_url),
        };
        services.projects.create_project(&user, project).await
    }

    /// Load a project for the signed-in user and open it
    pub async fn open(services: Services, config: EditorConfig, clock: Rc<dyn Clock>, project: &ProjectId) -> EditorResult<Self> {
        let user = services.identity.current_user()?;
        let document = services.projects.load_project(&user.id, project).await?;
        Self::from_document(services, config, clock, user, document).await
    }

    /// Open an already loaded document.
    ///
    /// The working image is placed centered and fitted; a saved snapshot then
    /// replaces that placement. Image or snapshot failures are reported in
    /// [`EditorContext::load_warnings`] and do not fail the open.
    pub async fn from_document(
        services: Services,
        config: EditorConfig,
        clock: Rc<dyn Clock>,
        user: UserProfile,
        document: Document,
    ) -> EditorResult<Self> {
        let mut scene = SceneStore::new();
        scene.initialize(document.width, document.height, Background::color(config.default_background.clone()))?;
        let mut surface = RenderSurface::new(services.images.clone(), &config);
        let mut load_warnings = Vec::new();

        if let Some(src) = document.working_image() {
            match surface.load_image(src).await {
                Ok((width, height)) => {
                    let image = factory::create_fitted_image(src, width, height, document.width, document.height);
                    scene.add_object(image)?;
                }
                Err(e) => {
                    log::error!("error loading project image {}: {}", src, e);
                    load_warnings.push(Notification {
                        level: NoticeLevel::Error,
                        message: format!("Could not load the project image: {}", e),
                    });
                }
            }
        }

        if let Some(snapshot) = &document.scene_snapshot {
            if let Err(e) = scene.load_snapshot(snapshot) {
                log::error!("error loading canvas state of {}: {}", document.id, e);
                load_warnings.push(Notification {
                    level: NoticeLevel::Error,
                    message: format!("Could not restore the saved canvas: {}", e),
                });
            }
        }

        let missing = surface.load_scene_images(&scene).await;
        if !missing.is_empty() {
            load_warnings.push(Notification {
                level: NoticeLevel::Error,
                message: format!("{} image(s) could not be loaded", missing.len()),
            });
        }
        scene.drain_changes();
        surface.measure_texts(&mut scene);

        let mut history = HistoryManager::new(config.history_capacity, config.history_debounce_ms);
        history.reset(scene.serialize()?);
        let persistence = PersistenceBridge::new(config.autosave_delay_ms);
        log::info!("opened project {} ({}x{})", document.id, document.width, document.height);

        Ok(Self {
            config,
            clock,
            services,
            user,
            document,
            scene,
            surface,
            history,
            tools: ToolCoordinator::new(),
            gesture: DragGesture::new(),
            persistence,
            event_bus: EventBus::new(),
            last_selection: None,
            load_warnings,
        })
    }

    // ---- accessors -----------------------------------------------------

    pub fn scene(&self) -> &SceneStore {
        &self.scene
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn tools(&self) -> &ToolCoordinator {
        &self.tools
    }

    pub fn active_tool(&self) -> Option<ToolId> {
        self.tools.current_id()
    }

    pub fn persistence(&self) -> &PersistenceBridge {
        &self.persistence
    }

    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn load_warnings(&self) -> &[Notification] {
        &self.load_warnings
    }

    pub fn subscribe(&self, handler: Box<dyn EventHandler>) -> SubscriptionId {
        self.event_bus.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.event_bus.unsubscribe(id)
    }

    pub fn register_font(&mut self, family: &str, bytes: Vec<u8>) -> EditorResult<()> {
        self.surface.register_font(family, bytes)?;
        self.surface.measure_texts(&mut self.scene);
        Ok(())
    }

    // ---- change plumbing -----------------------------------------------

    /// Forward queued scene changes to history, autosave and subscribers
    fn dispatch_changes(&mut self) {
        let changes = self.scene.drain_changes();
        if changes.is_empty() {
            return;
        }
        self.surface.measure_texts(&mut self.scene);
        let now = self.clock.now_ms();
        self.history.observe_change(now);
        self.persistence.observe(now);
        self.surface.request_redraw();
        for change in changes {
            self.event_bus.emit(EditorEvent::SceneChanged(change));
        }
    }

    /// Announce a selection change. User-driven selection of text opens the
    /// Text tool when the plan includes it.
    fn sync_selection(&mut self, follow_text: bool) {
        let active = self.scene.get_active();
        if active == self.last_selection {
            return;
        }
        self.last_selection = active;
        self.event_bus.emit(EditorEvent::SelectionChanged(active));

        let is_text = self.scene.active_object().is_some_and(|o| o.as_text().is_some());
        if follow_text
            && is_text
            && self.tools.current_id() != Some(ToolId::Text)
            && self.services.identity.has_tool_access(ToolId::Text)
        {
            if let Err(e) = self.switch_tool(Some(ToolId::Text)) {
                log::warn!("could not open the text tool: {}", e);
            }
        }
    }

    fn emit_history(&self) {
        self.event_bus.emit(EditorEvent::HistoryChanged {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        });
    }

    fn notify_error(&self, message: impl Into<String>) {
        self.event_bus.emit(EditorEvent::error(message));
    }

    /// Poll the history capture and autosave timers against the clock
    pub async fn tick(&mut self) -> EditorResult<()> {
        self.dispatch_changes();
        let now = self.clock.now_ms();
        if self.history.poll(now, &self.scene)? {
            self.emit_history();
        }
        if self.persistence.poll(now) {
            self.persist(true).await?;
        }
        Ok(())
    }

    // ---- viewport ------------------------------------------------------

    /// Fit the document into a container of the given size. Call again on every container resize.
    pub fn present(&mut self, container: Vec2) -> f32 {
        let zoom = self.surface.present(&mut self.scene, container);
        let viewport = self.scene.viewport();
        self.event_bus.emit(EditorEvent::ViewChanged {
            scale: viewport.zoom,
            translation: viewport.pan,
        });
        zoom
    }

    /// The document as currently shown, tool overlays included
    pub fn render_view(&mut self) -> RgbaImage {
        self.surface.take_redraw_request();
        self.surface.render_view(&self.scene)
    }

    pub fn needs_redraw(&mut self) -> bool {
        self.surface.take_redraw_request()
    }

    // ---- tools ---------------------------------------------------------

    /// Switch tools. A tool outside the user's plan is refused with an
    /// upgrade prompt and the current tool stays.
    pub fn switch_tool(&mut self, tool: Option<ToolId>) -> EditorResult<SwitchOutcome> {
        let identity = self.services.identity.clone();
        self.gesture.cancel();
        let mut cx = ToolContext::new(&mut self.scene, &mut self.surface);
        let outcome = self.tools.switch_to(tool, &*identity, &mut cx);
        self.dispatch_changes();
        let outcome = outcome?;
        match outcome {
            SwitchOutcome::Switched { old, new } => {
                log::info!("tool changed from {:?} to {:?}", old, new);
                self.event_bus.emit(EditorEvent::ToolChanged { old, new });
            }
            SwitchOutcome::UpgradeRequired(id) => {
                self.event_bus.emit(EditorEvent::UpgradeRequired {
                    tool: Some(id),
                    reason: format!("{} is available on the Pro plan", id.label()),
                });
            }
            SwitchOutcome::Unchanged => {}
        }
        self.sync_selection(false);
        Ok(outcome)
    }

    /// Borrow the current tool as `T` together with a context to run it in
    fn tool_and_context<T: ToolKind>(&mut self) -> EditorResult<(&mut T, ToolContext<'_>)> {
        if self.history.is_restoring() {
            return Err(EditorError::InvalidState("history is restoring".to_owned()));
        }
        let tool = self.tools.get_mut::<T>().ok_or_else(|| tool_inactive(T::ID))?;
        Ok((tool, ToolContext::new(&mut self.scene, &mut self.surface)))
    }

    /// Run `f` against the current tool, which must be a `T`
    pub fn with_tool<T: ToolKind, R>(&mut self, f: impl FnOnce(&mut T, &mut ToolContext<'_>) -> EditorResult<R>) -> EditorResult<R> {
        let (tool, mut cx) = self.tool_and_context::<T>()?;
        let result = f(tool, &mut cx);
        self.dispatch_changes();
        self.sync_selection(false);
        result
    }

    pub fn set_crop_aspect(&mut self, ratio: Option<f32>) -> EditorResult<()> {
        self.with_tool(|crop: &mut CropTool, cx| crop.set_aspect_ratio(ratio, cx))
    }

    pub fn commit_crop(&mut self) -> EditorResult<ObjectId> {
        let result = self.with_tool(|crop: &mut CropTool, cx| crop.commit(cx));
        if let Err(e) = &result {
            self.notify_error(format!("Failed to apply crop: {}", e));
        }
        result
    }

    pub fn cancel_crop(&mut self) -> EditorResult<()> {
        self.with_tool(|crop: &mut CropTool, cx| {
            crop.cancel(cx);
            Ok(())
        })
    }

    pub fn set_adjustment(&mut self, kind: FilterKind, value: f32) -> EditorResult<f32> {
        self.with_tool(|adjust: &mut AdjustTool, cx| adjust.set_parameter(kind, value, cx))
    }

    pub fn reset_adjustments(&mut self) -> EditorResult<()> {
        self.with_tool(|adjust: &mut AdjustTool, cx| adjust.reset(cx))
    }

    pub fn add_text(&mut self) -> EditorResult<ObjectId> {
        self.with_tool(|text: &mut TextTool, cx| text.add_text(cx))
    }

    pub async fn search_backgrounds(&mut self, query: &str) -> EditorResult<Vec<SearchResult>> {
        let search = self.services.search.clone();
        let tool = self
            .tools
            .get_mut::<BackgroundTool>()
            .ok_or_else(|| tool_inactive(ToolId::Background))?;
        let results = tool.search(&*search, query).await.map(<[SearchResult]>::to_vec);
        if let Err(e) = &results {
            self.notify_error(format!("Image search failed: {}", e));
        }
        results
    }

    pub async fn apply_background_image(&mut self, result: &SearchResult) -> EditorResult<()> {
        let search = self.services.search.clone();
        let (tool, mut cx) = self.tool_and_context::<BackgroundTool>()?;
        let outcome = tool.apply_image_background(&mut cx, &*search, result).await;
        self.dispatch_changes();
        if let Err(e) = &outcome {
            self.notify_error(format!("Failed to set background: {}", e));
        }
        outcome
    }

    /// Replace the main image with a background-removed copy
    pub async fn remove_background(&mut self) -> EditorResult<Option<ObjectId>> {
        let host = self.services.host.clone();
        let (tool, mut cx) = self.tool_and_context::<BackgroundTool>()?;
        let outcome = tool.remove_background(&mut cx, &*host).await;
        self.after_image_replaced(&outcome, "Background removed", true);
        outcome
    }

    pub async fn extend_canvas(&mut self) -> EditorResult<Option<ObjectId>> {
        let host = self.services.host.clone();
        let (tool, mut cx) = self.tool_and_context::<AiExtendTool>()?;
        let outcome = tool.extend(&mut cx, &*host).await;
        if outcome.as_ref().is_ok_and(|id| id.is_some()) {
            self.present_again();
        }
        self.after_image_replaced(&outcome, "Canvas extended", false);
        outcome
    }

    pub async fn apply_ai_edit(&mut self, edit: AiEdit) -> EditorResult<Option<ObjectId>> {
        let host = self.services.host.clone();
        let (tool, mut cx) = self.tool_and_context::<AiEditTool>()?;
        let outcome = tool.apply(&mut cx, &*host, edit).await;
        self.after_image_replaced(&outcome, "AI edit applied", false);
        outcome
    }

    fn present_again(&mut self) {
        if let Some(container) = self.surface.container() {
            self.present(container);
        }
    }

    /// Bookkeeping after a tool swapped the main image for a derived one
    fn after_image_replaced(&mut self, outcome: &EditorResult<Option<ObjectId>>, success: &str, background_removed: bool) {
        match outcome {
            Ok(Some(id)) => {
                let src = self.scene.get(*id).and_then(ElementType::as_image).map(|i| i.src.clone());
                if let Some(src) = src {
                    let mut flags = self.document.flags.clone();
                    if background_removed {
                        flags.background_removed = true;
                    }
                    let steps = UrlTransforms::steps(&src);
                    flags.active_transformations = (!steps.is_empty()).then(|| steps.join(":"));
                    self.persistence.note_current_image(src);
                    self.persistence.note_flags(flags);
                }
                self.event_bus.emit(EditorEvent::success(success));
            }
            Ok(None) => {}
            Err(e) => self.notify_error(format!("{} failed: {}", success, e)),
        }
        self.dispatch_changes();
        self.sync_selection(false);
    }

    // ---- pointer -------------------------------------------------------

    /// Pointer press in screen coordinates relative to the presented canvas
    pub fn pointer_down(&mut self, screen: Pos2) {
        let pos = self.scene.viewport().screen_to_document(screen);
        let mut cx = ToolContext::new(&mut self.scene, &mut self.surface);
        if !self.tools.pointer_down(pos, &mut cx) {
            self.gesture.pointer_down(pos, &mut self.scene);
        }
        self.dispatch_changes();
        self.sync_selection(true);
    }

    pub fn pointer_move(&mut self, screen: Pos2) {
        let pos = self.scene.viewport().screen_to_document(screen);
        let mut cx = ToolContext::new(&mut self.scene, &mut self.surface);
        if !self.tools.pointer_move(pos, &mut cx) && self.gesture.pointer_move(pos, &mut self.scene) {
            self.surface.request_redraw();
        }
        self.dispatch_changes();
    }

    pub fn pointer_up(&mut self, screen: Pos2) {
        let pos = self.scene.viewport().screen_to_document(screen);
        let mut cx = ToolContext::new(&mut self.scene, &mut self.surface);
        if !self.tools.pointer_up(pos, &mut cx) {
            self.gesture.pointer_up(pos, &mut self.scene);
        }
        self.dispatch_changes();
        self.sync_selection(true);
    }

    /// Select an object (or nothing) as the user would by clicking it
    pub fn select(&mut self, id: Option<ObjectId>) -> EditorResult<()> {
        self.scene.set_active(id)?;
        self.sync_selection(true);
        Ok(())
    }

    pub fn bring_forward(&mut self, id: ObjectId) -> EditorResult<()> {
        self.scene.bring_forward(id)?;
        self.surface.request_redraw();
        self.dispatch_changes();
        Ok(())
    }

    pub fn send_backward(&mut self, id: ObjectId) -> EditorResult<()> {
        self.scene.send_backward(id)?;
        self.surface.request_redraw();
        self.dispatch_changes();
        Ok(())
    }

    /// Apply the resize tool's pending size. Returns false when nothing changed.
    pub fn apply_resize(&mut self) -> EditorResult<bool> {
        self.with_tool(|resize: &mut ResizeTool, cx| resize.apply(cx))
    }

    // ---- history -------------------------------------------------------

    pub async fn undo(&mut self) -> EditorResult<bool> {
        self.step_history(true).await
    }

    pub async fn redo(&mut self) -> EditorResult<bool> {
        self.step_history(false).await
    }

    /// Load the neighbouring history entry. The current tool is taken down
    /// first and brought back on the restored scene.
    async fn step_history(&mut self, backwards: bool) -> EditorResult<bool> {
        if self.history.is_restoring() {
            return Ok(false);
        }
        // The latest edit may still be waiting out its debounce
        self.dispatch_changes();
        if self.history.flush(&self.scene)? {
            self.emit_history();
        }
        let available = if backwards { self.history.can_undo() } else { self.history.can_redo() };
        if !available {
            return Ok(false);
        }

        self.gesture.cancel();
        let mut cx = ToolContext::new(&mut self.scene, &mut self.surface);
        self.tools.suspend(&mut cx);
        self.dispatch_changes();

        let result = if backwards {
            self.history.undo(&mut self.scene)
        } else {
            self.history.redo(&mut self.scene)
        };
        match &result {
            Ok(true) => {
                let missing = self.surface.load_scene_images(&self.scene).await;
                if !missing.is_empty() {
                    log::warn!("{} image(s) missing after history step", missing.len());
                }
                // Reaches autosave only; history is restoring
                self.dispatch_changes();
                self.history.finish_restore();
                log::info!("{}", if backwards { "undid last action" } else { "redid last action" });
            }
            Ok(false) => {}
            Err(e) => {
                log::error!("history step failed: {}", e);
                self.notify_error(if backwards { "Failed to undo action" } else { "Failed to redo action" });
            }
        }

        let mut cx = ToolContext::new(&mut self.scene, &mut self.surface);
        if let Err(e) = self.tools.resume(&mut cx) {
            log::warn!("could not resume tool after history step: {}", e);
        }
        self.dispatch_changes();
        self.sync_selection(false);
        self.emit_history();
        result
    }

    // ---- persistence ---------------------------------------------------

    async fn persist(&mut self, autosave: bool) -> EditorResult<()> {
        let projects = self.services.projects.clone();
        let result = self
            .persistence
            .save(&*projects, &self.user.id, &mut self.document, &self.scene)
            .await;
        match &result {
            Ok(()) => self.event_bus.emit(EditorEvent::Saved { autosave }),
            Err(e) => self.notify_error(format!("Failed to save project: {}", e)),
        }
        result
    }

    /// Save right away, skipping the autosave delay
    pub async fn save(&mut self) -> EditorResult<()> {
        self.dispatch_changes();
        self.persist(false).await?;
        self.event_bus.emit(EditorEvent::success("Project saved successfully!"));
        Ok(())
    }

    /// Render at native resolution and encode. Counts against the plan's export quota.
    pub async fn export(&mut self, preset: &ExportPreset) -> EditorResult<ExportedImage> {
        let used = self.user.exports_this_month;
        if !self.services.identity.can_export(used) {
            let reason = format!("{} exports used this month", used);
            self.event_bus.emit(EditorEvent::UpgradeRequired {
                tool: None,
                reason: reason.clone(),
            });
            self.notify_error("Upgrade to export more images");
            return Err(EditorError::QuotaExceeded(reason));
        }

        let file_name = self.document.export_file_name(preset.format.extension());
        let exported = match self.surface.export_raster(&mut self.scene, preset, file_name).await {
            Ok(exported) => exported,
            Err(e) => {
                self.notify_error("Failed to export image");
                return Err(e);
            }
        };
        if let Err(e) = self.services.identity.record_export().await {
            log::warn!("could not record export: {}", e);
        }
        self.user.exports_this_month += 1;
        self.event_bus
            .emit(EditorEvent::success(format!("Image exported as {}!", preset.label)));
        Ok(exported)
    }

    /// Throw away every edit and start again from the original image.
    ///
    /// The current state is checkpointed first so the reset can be undone,
    /// and the result is saved immediately.
    pub async fn reset_to_original(&mut self) -> EditorResult<ObjectId> {
        let Some(original) = self.document.original_image.clone() else {
            self.notify_error("No original image found to reset to");
            return Err(EditorError::NotFound("original image".to_owned()));
        };
        if self.history.is_restoring() {
            return Err(EditorError::InvalidState("history is restoring".to_owned()));
        }

        self.gesture.cancel();
        let mut cx = ToolContext::new(&mut self.scene, &mut self.surface);
        self.tools.suspend(&mut cx);
        self.dispatch_changes();
        if self.history.push_now(&self.scene)? {
            self.emit_history();
        }

        let result = self.replace_with_original(&original).await;
        let mut cx = ToolContext::new(&mut self.scene, &mut self.surface);
        if let Err(e) = self.tools.resume(&mut cx) {
            log::warn!("could not resume tool after reset: {}", e);
        }
        self.dispatch_changes();
        self.sync_selection(false);

        let id = match result {
            Ok(id) => id,
            Err(e) => {
                self.notify_error("Failed to reset canvas");
                return Err(e);
            }
        };
        self.persist(false).await?;
        self.event_bus.emit(EditorEvent::success("Canvas reset to original image"));
        Ok(id)
    }

    async fn replace_with_original(&mut self, original: &str) -> EditorResult<ObjectId> {
        let (width, height) = self.surface.load_image(original).await?;
        let image = factory::create_fitted_image(original, width, height, self.scene.width(), self.scene.height());
        let id = image.id();
        self.scene
            .replace_contents(Background::color(self.config.default_background.clone()), vec![image])?;
        self.scene.set_active(Some(id))?;
        self.persistence.note_current_image(original);
        self.persistence.note_flags(ImageFlags::default());
        self.dispatch_changes();
        log::info!("canvas reset to {}", original);
        Ok(id)
    }

    /// End the session: take the current tool down and flush unsaved changes
    pub async fn close(&mut self) -> EditorResult<()> {
        let had_tool = self.tools.current_id();
        self.gesture.cancel();
        let mut cx = ToolContext::new(&mut self.scene, &mut self.surface);
        self.tools.teardown(&mut cx);
        self.dispatch_changes();
        if had_tool.is_some() {
            self.event_bus.emit(EditorEvent::ToolChanged { old: had_tool, new: None });
        }
        if self.persistence.is_dirty() {
            self.persist(true).await?;
        }
        log::info!("closed project {}", self.document.id);
        Ok(())
    }
}
