use image::{Rgba, RgbaImage, imageops};
use serde::{Deserialize, Serialize};

/// The kinds of non-destructive adjustment an image can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Brightness,
    Contrast,
    Saturation,
    Vibrance,
    Blur,
    HueRotation,
}

impl FilterKind {
    pub const ALL: [FilterKind; 6] = [
        FilterKind::Brightness,
        FilterKind::Contrast,
        FilterKind::Saturation,
        FilterKind::Vibrance,
        FilterKind::Blur,
        FilterKind::HueRotation,
    ];
}

/// One filter applied to an image.
///
/// `value` is in filter space: -1..1 for the color filters, 0..1 for blur,
/// radians for hue rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterDescriptor {
    pub kind: FilterKind,
    pub value: f32,
}

impl FilterDescriptor {
    pub fn new(kind: FilterKind, value: f32) -> Self {
        Self { kind, value }
    }
}

/// Stable text key for a filter list, used to cache filtered pixels
pub fn fingerprint(filters: &[FilterDescriptor]) -> String {
    filters
        .iter()
        .map(|f| format!("{:?}:{:08x}", f.kind, f.value.to_bits()))
        .collect::<Vec<_>>()
        .join("|")
}

/// Apply `filters` in order to a copy of `source`. The source is never mutated.
pub fn apply_filters(source: &RgbaImage, filters: &[FilterDescriptor]) -> RgbaImage {
    let mut image = source.clone();
    for filter in filters {
        image = match filter.kind {
            FilterKind::Blur => {
                let longest = image.width().max(image.height()) as f32;
                let sigma = filter.value.clamp(0.0, 1.0) * longest * 0.02;
                if sigma <= 0.0 {
                    image
                } else {
                    imageops::blur(&image, sigma)
                }
            }
            FilterKind::HueRotation => {
                imageops::huerotate(&image, filter.value.to_degrees().round() as i32)
            }
            _ => {
                for pixel in image.pixels_mut() {
                    *pixel = adjust_pixel(*pixel, filter);
                }
                image
            }
        };
    }
    image
}

fn adjust_pixel(pixel: Rgba<u8>, filter: &FilterDescriptor) -> Rgba<u8> {
    let [r, g, b, a] = pixel.0;
    let mut rgb = [r as f32, g as f32, b as f32];
    let value = filter.value;
    match filter.kind {
        FilterKind::Brightness => {
            for c in &mut rgb {
                *c += value * 255.0;
            }
        }
        FilterKind::Contrast => {
            let c = value.clamp(-1.0, 1.0) * 255.0;
            let factor = 259.0 * (c + 255.0) / (255.0 * (259.0 - c));
            for ch in &mut rgb {
                *ch = factor * (*ch - 128.0) + 128.0;
            }
        }
        FilterKind::Saturation => {
            let adjust = -value;
            let max = rgb[0].max(rgb[1]).max(rgb[2]);
            for ch in &mut rgb {
                if *ch != max {
                    *ch += (max - *ch) * adjust;
                }
            }
        }
        FilterKind::Vibrance => {
            let adjust = -value;
            let max = rgb[0].max(rgb[1]).max(rgb[2]);
            let avg = (rgb[0] + rgb[1] + rgb[2]) / 3.0;
            let amount = ((max - avg).abs() * 2.0 / 255.0) * adjust;
            for ch in &mut rgb {
                if *ch != max {
                    *ch += (max - *ch) * amount;
                }
            }
        }
        FilterKind::Blur | FilterKind::HueRotation => {}
    }
    let clamp = |v: f32| v.round().clamp(0.0, 255.0) as u8;
    Rgba([clamp(rgb[0]), clamp(rgb[1]), clamp(rgb[2]), a])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(4, 4, Rgba(color))
    }

    #[test]
    fn brightness_shifts_channels() {
        let out = apply_filters(
            &solid([100, 100, 100, 255]),
            &[FilterDescriptor::new(FilterKind::Brightness, 0.2)],
        );
        assert_eq!(out.get_pixel(0, 0).0, [151, 151, 151, 255]);
    }

    #[test]
    fn full_desaturation_is_grey_of_max() {
        let out = apply_filters(
            &solid([200, 100, 50, 255]),
            &[FilterDescriptor::new(FilterKind::Saturation, -1.0)],
        );
        assert_eq!(out.get_pixel(0, 0).0, [200, 200, 200, 255]);
    }

    #[test]
    fn filters_do_not_touch_source_and_are_repeatable() {
        let source = solid([10, 20, 30, 255]);
        let filters = [
            FilterDescriptor::new(FilterKind::Contrast, 0.5),
            FilterDescriptor::new(FilterKind::HueRotation, 1.0),
        ];
        let first = apply_filters(&source, &filters);
        let second = apply_filters(&source, &filters);
        assert_eq!(first, second);
        assert_eq!(source.get_pixel(0, 0).0, [10, 20, 30, 255]);
    }

    #[test]
    fn fingerprint_distinguishes_values() {
        let a = fingerprint(&[FilterDescriptor::new(FilterKind::Blur, 0.1)]);
        let b = fingerprint(&[FilterDescriptor::new(FilterKind::Blur, 0.2)]);
        assert_ne!(a, b);
        assert_eq!(fingerprint(&[]), "");
    }
}
