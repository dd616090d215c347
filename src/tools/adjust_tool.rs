use super::{Tool, ToolContext, ToolId};
use crate::element::{FilterDescriptor, FilterKind};
use crate::error::{EditorError, EditorResult};
use crate::id_generator::ObjectId;

/// How a UI parameter maps onto a filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjustParam {
    pub kind: FilterKind,
    pub label: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl AdjustParam {
    pub fn for_kind(kind: FilterKind) -> &'static AdjustParam {
        match kind {
            FilterKind::Brightness => &ADJUST_PARAMS[0],
            FilterKind::Contrast => &ADJUST_PARAMS[1],
            FilterKind::Saturation => &ADJUST_PARAMS[2],
            FilterKind::Vibrance => &ADJUST_PARAMS[3],
            FilterKind::Blur => &ADJUST_PARAMS[4],
            FilterKind::HueRotation => &ADJUST_PARAMS[5],
        }
    }

    /// UI value to filter value
    pub fn to_filter(&self, value: f32) -> f32 {
        match self.kind {
            FilterKind::HueRotation => value.to_radians(),
            _ => value / 100.0,
        }
    }

    /// Filter value back to the nearest UI value
    pub fn from_filter(&self, value: f32) -> f32 {
        let ui = match self.kind {
            FilterKind::HueRotation => value.to_degrees(),
            _ => value * 100.0,
        };
        ui.round().clamp(self.min, self.max)
    }
}

/// Parameters in the order their filters are applied
pub const ADJUST_PARAMS: [AdjustParam; 6] = [
    AdjustParam {
        kind: FilterKind::Brightness,
        label: "Brightness",
        min: -100.0,
        max: 100.0,
        default: 0.0,
    },
    AdjustParam {
        kind: FilterKind::Contrast,
        label: "Contrast",
        min: -100.0,
        max: 100.0,
        default: 0.0,
    },
    AdjustParam {
        kind: FilterKind::Saturation,
        label: "Saturation",
        min: -100.0,
        max: 100.0,
        default: 0.0,
    },
    AdjustParam {
        kind: FilterKind::Vibrance,
        label: "Vibrance",
        min: -100.0,
        max: 100.0,
        default: 0.0,
    },
    AdjustParam {
        kind: FilterKind::Blur,
        label: "Blur",
        min: 0.0,
        max: 100.0,
        default: 0.0,
    },
    AdjustParam {
        kind: FilterKind::HueRotation,
        label: "Hue",
        min: -180.0,
        max: 180.0,
        default: 0.0,
    },
];

/// UI values of every parameter, indexed like [`ADJUST_PARAMS`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterValues([f32; 6]);

impl Default for FilterValues {
    fn default() -> Self {
        let mut values = [0.0; 6];
        for (value, param) in values.iter_mut().zip(ADJUST_PARAMS.iter()) {
            *value = param.default;
        }
        Self(values)
    }
}

impl FilterValues {
    fn index(kind: FilterKind) -> usize {
        ADJUST_PARAMS.iter().position(|p| p.kind == kind).unwrap_or(0)
    }

    pub fn get(&self, kind: FilterKind) -> f32 {
        self.0[Self::index(kind)]
    }

    pub fn set(&mut self, kind: FilterKind, value: f32) {
        self.0[Self::index(kind)] = value;
    }

    /// Read values back from an image's filter list
    pub fn from_filters(filters: &[FilterDescriptor]) -> Self {
        let mut values = Self::default();
        for filter in filters {
            let param = AdjustParam::for_kind(filter.kind);
            values.set(filter.kind, param.from_filter(filter.value));
        }
        values
    }

    /// Filter list for these values; parameters at their default are left out
    pub fn to_filters(&self) -> Vec<FilterDescriptor> {
        ADJUST_PARAMS
            .iter()
            .zip(self.0.iter())
            .filter(|(param, value)| **value != param.default)
            .map(|(param, value)| FilterDescriptor::new(param.kind, param.to_filter(*value)))
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct AdjustTool {
    values: FilterValues,
    target: Option<ObjectId>,
}

impl AdjustTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> FilterValues {
        self.values
    }

    pub fn target(&self) -> Option<ObjectId> {
        self.target
    }

    /// Re-read the values from the image currently being adjusted
    pub fn sync_from_scene(&mut self, cx: &ToolContext<'_>) {
        self.target = cx.scene.main_image();
        self.values = self
            .target
            .and_then(|id| cx.scene.get(id))
            .and_then(|o| o.as_image())
            .map(|image| FilterValues::from_filters(&image.filters))
            .unwrap_or_default();
    }

    /// Set one parameter and re-filter the image. Returns the clamped value.
    ///
    /// The image's descriptor of that kind is dropped and, unless the value is
    /// the default, a fresh one is appended.
    pub fn set_parameter(&mut self, kind: FilterKind, value: f32, cx: &mut ToolContext<'_>) -> EditorResult<f32> {
        let param = AdjustParam::for_kind(kind);
        let value = if value.is_finite() { value.round().clamp(param.min, param.max) } else { param.default };
        if cx.scene.main_image() != self.target {
            self.sync_from_scene(cx);
        }
        self.values.set(kind, value);
        let descriptor = (value != param.default).then(|| FilterDescriptor::new(kind, param.to_filter(value)));
        self.update_filters(cx, |filters| {
            filters.retain(|f| f.kind != kind);
            filters.extend(descriptor);
        })?;
        Ok(value)
    }

    /// Put every parameter back to its default, clearing the image's filters
    pub fn reset(&mut self, cx: &mut ToolContext<'_>) -> EditorResult<()> {
        self.target = cx.scene.main_image();
        self.values = FilterValues::default();
        self.update_filters(cx, |filters| filters.retain(|f| !FilterKind::ALL.contains(&f.kind)))
    }

    fn update_filters(&mut self, cx: &mut ToolContext<'_>, f: impl FnOnce(&mut Vec<FilterDescriptor>)) -> EditorResult<()> {
        let target = self
            .target
            .ok_or_else(|| EditorError::NotFound("no image to adjust".to_owned()))?;
        cx.scene
            .modify(target, |object| object.as_image_mut().map(|image| f(&mut image.filters)))?
            .ok_or_else(|| EditorError::InvalidState(format!("object {} is not an image", target)))?;
        cx.surface.request_redraw();
        Ok(())
    }
}

impl Tool for AdjustTool {
    fn id(&self) -> ToolId {
        ToolId::Adjust
    }

    fn activate(&mut self, cx: &mut ToolContext<'_>) -> EditorResult<()> {
        self.sync_from_scene(cx);
        Ok(())
    }

    fn deactivate(&mut self, _cx: &mut ToolContext<'_>) {
        self.target = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_produce_no_filters() {
        assert!(FilterValues::default().to_filters().is_empty());
    }

    #[test]
    fn values_map_to_filter_space() {
        let mut values = FilterValues::default();
        values.set(FilterKind::Brightness, 50.0);
        values.set(FilterKind::HueRotation, 90.0);
        let filters = values.to_filters();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0], FilterDescriptor::new(FilterKind::Brightness, 0.5));
        assert_eq!(filters[1].kind, FilterKind::HueRotation);
        assert!((filters[1].value - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn filters_read_back_rounded() {
        let filters = [
            FilterDescriptor::new(FilterKind::Contrast, -0.333),
            FilterDescriptor::new(FilterKind::HueRotation, 1.0),
        ];
        let values = FilterValues::from_filters(&filters);
        assert_eq!(values.get(FilterKind::Contrast), -33.0);
        assert_eq!(values.get(FilterKind::HueRotation), 57.0);
        assert_eq!(values.get(FilterKind::Blur), 0.0);
    }
}
