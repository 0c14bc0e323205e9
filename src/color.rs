use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Categorical palette
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            // Start at blue so a single series reads like a default bar colour.
            let hue = 210.0 + (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.65, 0.55);
            let rgb: Srgb = hsl.into_color();
            to_color32(rgb)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Diverging ramp for correlations
// ---------------------------------------------------------------------------

const COOL: (u8, u8, u8) = (59, 76, 192);
const NEUTRAL: (u8, u8, u8) = (221, 221, 221);
const WARM: (u8, u8, u8) = (180, 4, 38);

/// Blue → light grey → red ramp over `[-1, 1]`, like matplotlib's coolwarm.
/// Values outside the range are clamped; `NaN` is drawn grey.
pub fn coolwarm(t: f64) -> Color32 {
    if t.is_nan() {
        return Color32::GRAY;
    }
    let t = t.clamp(-1.0, 1.0) as f32;
    let lin = |(r, g, b): (u8, u8, u8)| -> LinSrgb {
        Srgb::new(r, g, b).into_format::<f32>().into_linear()
    };
    let mixed = if t < 0.0 {
        lin(NEUTRAL).mix(lin(COOL), -t)
    } else {
        lin(NEUTRAL).mix(lin(WARM), t)
    };
    to_color32(Srgb::from_linear(mixed))
}

/// Black or white, whichever reads better on `background`.
pub fn text_color_for(background: Color32) -> Color32 {
    let luma = 0.299 * background.r() as f32
        + 0.587 * background.g() as f32
        + 0.114 * background.b() as f32;
    if luma > 140.0 {
        Color32::BLACK
    } else {
        Color32::WHITE
    }
}

fn to_color32(rgb: Srgb) -> Color32 {
    let rgb: Srgb<u8> = rgb.into_format();
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_colours_are_distinct() {
        let colors = generate_palette(5);
        assert_eq!(colors.len(), 5);
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn coolwarm_endpoints() {
        assert_eq!(coolwarm(-1.0), Color32::from_rgb(59, 76, 192));
        assert_eq!(coolwarm(0.0), Color32::from_rgb(221, 221, 221));
        assert_eq!(coolwarm(1.0), Color32::from_rgb(180, 4, 38));
        assert_eq!(coolwarm(3.0), coolwarm(1.0));
        assert_eq!(coolwarm(f64::NAN), Color32::GRAY);
    }

    #[test]
    fn text_contrast() {
        assert_eq!(text_color_for(coolwarm(0.0)), Color32::BLACK);
        assert_eq!(text_color_for(coolwarm(1.0)), Color32::WHITE);
    }
}
