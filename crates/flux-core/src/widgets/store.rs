//! Persisted widget layouts and styles.

use super::handles::{hit_test_handle, ResizeHandle, HANDLE_HIT_TOLERANCE};
use super::layout::{move_layout, resize_layout, LayoutRules, Viewport, WidgetLayout};
use super::style::{ResolvedStyle, StyleField, WidgetStyle};
use crate::config::FluxConfig;
use crate::error::FluxResult;
use crate::storage::SharedBackend;
use kurbo::{Point, Vec2};
use std::collections::BTreeMap;

/// Backend key for widget layouts.
pub const LAYOUTS_KEY: &str = "flux_widget_layouts";
/// Backend key for widget style overrides.
pub const STYLES_KEY: &str = "flux_widget_styles";

/// What a press on a widget would start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureMode {
    Move,
    Resize(ResizeHandle),
}

/// Layout and appearance of every widget on the dashboard.
pub struct WidgetStore {
    layouts: BTreeMap<String, WidgetLayout>,
    styles: BTreeMap<String, WidgetStyle>,
    /// Stacking order, back to front.
    z_order: Vec<String>,
    defaults: ResolvedStyle,
    viewport: Viewport,
    config: FluxConfig,
    backend: SharedBackend,
}

impl WidgetStore {
    /// Empty store; nothing is read from the backend.
    pub fn new(backend: SharedBackend, viewport: Viewport, config: FluxConfig) -> Self {
        Self {
            layouts: BTreeMap::new(),
            styles: BTreeMap::new(),
            z_order: Vec::new(),
            defaults: ResolvedStyle::default(),
            viewport,
            config,
            backend,
        }
    }

    /// Load persisted layouts and styles. Missing keys yield an empty store.
    ///
    /// Loaded layouts are re-clamped, since the viewport may have shrunk
    /// since they were saved.
    pub async fn load(
        backend: SharedBackend,
        viewport: Viewport,
        config: FluxConfig,
    ) -> FluxResult<Self> {
        let mut store = Self::new(backend, viewport, config);

        if let Some(json) = store.backend.get(LAYOUTS_KEY).await? {
            store.layouts = serde_json::from_str(&json)?;
        }
        if let Some(json) = store.backend.get(STYLES_KEY).await? {
            store.styles = serde_json::from_str(&json)?;
        }
        store.z_order = store.layouts.keys().cloned().collect();
        store.reclamp();

        log::info!(
            "Loaded {} widget layouts and {} style overrides",
            store.layouts.len(),
            store.styles.len()
        );
        Ok(store)
    }

    /// Persist layouts and styles.
    pub async fn save(&self) -> FluxResult<()> {
        let layouts = serde_json::to_string(&self.layouts)?;
        let styles = serde_json::to_string(&self.styles)?;
        self.backend.set(LAYOUTS_KEY, layouts).await?;
        self.backend.set(STYLES_KEY, styles).await?;
        Ok(())
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn config(&self) -> &FluxConfig {
        &self.config
    }

    pub fn build_mode(&self) -> bool {
        self.config.build_mode
    }

    pub fn set_build_mode(&mut self, enabled: bool) {
        self.config.build_mode = enabled;
    }

    pub fn rules(&self) -> LayoutRules {
        LayoutRules {
            viewport: self.viewport,
            snap: self.config.build_mode.then_some(self.config.grid_pitch),
            min_size: self.config.min_widget_size,
        }
    }

    /// Viewport changed: every widget is pulled back inside.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.reclamp();
    }

    fn reclamp(&mut self) {
        let viewport = self.viewport;
        for layout in self.layouts.values_mut() {
            *layout = layout.clamped(viewport);
        }
    }

    pub fn layout(&self, id: &str) -> Option<WidgetLayout> {
        self.layouts.get(id).copied()
    }

    /// Add a widget with `default` layout unless it already has one.
    pub fn ensure(&mut self, id: &str, default: WidgetLayout) -> WidgetLayout {
        if let Some(layout) = self.layouts.get(id) {
            return *layout;
        }
        let layout = default.clamped(self.viewport);
        self.layouts.insert(id.to_string(), layout);
        self.z_order.push(id.to_string());
        layout
    }

    /// Store a layout, clamped to the viewport.
    pub fn set_layout(&mut self, id: &str, layout: WidgetLayout) -> WidgetLayout {
        let layout = layout.clamped(self.viewport);
        if self.layouts.insert(id.to_string(), layout).is_none() {
            self.z_order.push(id.to_string());
        }
        layout
    }

    pub fn remove(&mut self, id: &str) {
        self.layouts.remove(id);
        self.styles.remove(id);
        self.z_order.retain(|w| w != id);
    }

    /// Drag `id` from `start` by `delta`. Returns the stored layout.
    pub fn drag(&mut self, id: &str, start: WidgetLayout, delta: Vec2) -> WidgetLayout {
        let layout = move_layout(start, delta, &self.rules());
        self.set_layout(id, layout)
    }

    /// Resize `id` from `start` by dragging `handle` by `delta`.
    pub fn resize(
        &mut self,
        id: &str,
        start: WidgetLayout,
        handle: ResizeHandle,
        delta: Vec2,
    ) -> WidgetLayout {
        let layout = resize_layout(start, handle, delta, &self.rules());
        self.set_layout(id, layout)
    }

    pub fn bring_to_front(&mut self, id: &str) {
        if let Some(index) = self.z_order.iter().position(|w| w == id) {
            let id = self.z_order.remove(index);
            self.z_order.push(id);
        }
    }

    pub fn z_order(&self) -> &[String] {
        &self.z_order
    }

    /// Topmost widget under `point` and the gesture a press there starts.
    pub fn hit_test(&self, point: Point) -> Option<(String, GestureMode)> {
        for id in self.z_order.iter().rev() {
            let Some(layout) = self.layouts.get(id) else {
                continue;
            };
            let bounds = layout.rect();
            if let Some(handle) = hit_test_handle(bounds, point, HANDLE_HIT_TOLERANCE) {
                return Some((id.clone(), GestureMode::Resize(handle)));
            }
            if bounds.contains(point) {
                return Some((id.clone(), GestureMode::Move));
            }
        }
        None
    }

    /// Resolved appearance for `id`.
    pub fn style(&self, id: &str) -> ResolvedStyle {
        match self.styles.get(id) {
            Some(style) => style.resolve(&self.defaults),
            None => self.defaults.clone(),
        }
    }

    pub fn style_overrides(&self, id: &str) -> Option<&WidgetStyle> {
        self.styles.get(id)
    }

    /// Merge the set fields of `overrides` into the widget's overrides.
    /// Invalid overrides are rejected without touching the stored ones.
    pub fn set_style(&mut self, id: &str, overrides: WidgetStyle) -> FluxResult<()> {
        overrides.validate()?;
        self.styles
            .entry(id.to_string())
            .or_default()
            .apply(overrides)?;
        self.prune_style(id);
        Ok(())
    }

    /// Revert one field to the default.
    pub fn clear_style(&mut self, id: &str, field: StyleField) {
        if let Some(style) = self.styles.get_mut(id) {
            style.clear(field);
        }
        self.prune_style(id);
    }

    /// Drop every override for `id`.
    pub fn reset_style(&mut self, id: &str) {
        self.styles.remove(id);
    }

    fn prune_style(&mut self, id: &str) {
        if self.styles.get(id).is_some_and(WidgetStyle::is_empty) {
            self.styles.remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{block_on, MemoryBackend};
    use std::sync::Arc;

    fn store() -> (Arc<MemoryBackend>, WidgetStore) {
        let backend = Arc::new(MemoryBackend::new());
        let store = WidgetStore::new(
            backend.clone(),
            Viewport::new(800.0, 600.0),
            FluxConfig::default(),
        );
        (backend, store)
    }

    #[test]
    fn test_ensure_clamps_default() {
        let (_, mut store) = store();
        let layout = store.ensure("timer", WidgetLayout::new(700.0, 550.0, 200.0, 100.0));
        assert_eq!(layout, WidgetLayout::new(600.0, 500.0, 200.0, 100.0));

        // Second call keeps the existing layout.
        let again = store.ensure("timer", WidgetLayout::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(again, layout);
    }

    #[test]
    fn test_viewport_shrink_reclamps() {
        let (_, mut store) = store();
        store.set_layout("timer", WidgetLayout::new(600.0, 500.0, 200.0, 100.0));
        store.set_viewport(Viewport::new(400.0, 300.0));

        let layout = store.layout("timer").unwrap();
        assert!(layout.is_within(store.viewport()));
        assert_eq!(layout, WidgetLayout::new(200.0, 200.0, 200.0, 100.0));
    }

    #[test]
    fn test_build_mode_snaps_drag() {
        let (_, mut store) = store();
        let start = store.ensure("notes", WidgetLayout::new(100.0, 100.0, 200.0, 200.0));

        let free = store.drag("notes", start, Vec2::new(7.0, 7.0));
        assert_eq!(free.origin(), Point::new(107.0, 107.0));

        store.set_build_mode(true);
        let snapped = store.drag("notes", start, Vec2::new(7.0, 7.0));
        assert_eq!(snapped.origin(), Point::new(100.0, 100.0));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let (backend, mut store) = store();
        store.set_layout("timer", WidgetLayout::new(10.0, 20.0, 200.0, 100.0));
        store
            .set_style(
                "timer",
                WidgetStyle {
                    opacity: Some(0.5),
                    ..Default::default()
                },
            )
            .unwrap();
        block_on(store.save()).unwrap();

        let loaded = block_on(WidgetStore::load(
            backend,
            Viewport::new(800.0, 600.0),
            FluxConfig::default(),
        ))
        .unwrap();
        assert_eq!(loaded.layout("timer"), Some(WidgetLayout::new(10.0, 20.0, 200.0, 100.0)));
        assert_eq!(loaded.style("timer").opacity, 0.5);
    }

    #[test]
    fn test_load_empty_backend() {
        let backend = Arc::new(MemoryBackend::new());
        let store = block_on(WidgetStore::load(
            backend,
            Viewport::new(800.0, 600.0),
            FluxConfig::default(),
        ))
        .unwrap();
        assert!(store.layout("anything").is_none());
        assert_eq!(store.style("anything"), ResolvedStyle::default());
    }

    #[test]
    fn test_clear_style_prunes_empty_overrides() {
        let (_, mut store) = store();
        store
            .set_style(
                "timer",
                WidgetStyle {
                    text_color: Some("#000".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(store.style_overrides("timer").is_some());

        store.clear_style("timer", StyleField::TextColor);
        assert!(store.style_overrides("timer").is_none());
        assert_eq!(store.style("timer").text_color, ResolvedStyle::default().text_color);
    }

    #[test]
    fn test_invalid_style_leaves_no_entry() {
        let (backend, mut store) = store();
        let bad = WidgetStyle {
            opacity: Some(2.0),
            ..Default::default()
        };
        assert!(store.set_style("timer", bad).is_err());
        assert!(store.style_overrides("timer").is_none());

        block_on(store.save()).unwrap();
        assert_eq!(backend.raw(STYLES_KEY), Some("{}".to_string()));
    }

    #[test]
    fn test_reset_style() {
        let (_, mut store) = store();
        store
            .set_style(
                "timer",
                WidgetStyle {
                    corner_radius: Some(0.0),
                    border_color: Some("#123456".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        store.reset_style("timer");
        assert_eq!(store.style("timer"), ResolvedStyle::default());
    }

    #[test]
    fn test_hit_test_prefers_topmost_and_handles() {
        let (_, mut store) = store();
        store.set_layout("back", WidgetLayout::new(0.0, 0.0, 300.0, 300.0));
        store.set_layout("front", WidgetLayout::new(100.0, 100.0, 150.0, 150.0));

        assert_eq!(
            store.hit_test(Point::new(150.0, 150.0)),
            Some(("front".to_string(), GestureMode::Move))
        );
        assert_eq!(
            store.hit_test(Point::new(250.0, 250.0)),
            Some(("front".to_string(), GestureMode::Resize(ResizeHandle::BottomRight)))
        );

        store.bring_to_front("back");
        assert_eq!(
            store.hit_test(Point::new(150.0, 150.0)),
            Some(("back".to_string(), GestureMode::Move))
        );
        assert_eq!(store.hit_test(Point::new(700.0, 500.0)), None);
    }
}
