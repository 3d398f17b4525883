//! Hue, saturation and value color representation.

use serde::{Deserialize, Serialize};

use super::Color;

/// A color expressed as hue (0-359 degrees), saturation (0-100 percent)
/// and value (0-100 percent).
///
/// Some bulbs take colors in this form rather than as RGB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hsv {
    hue: u16,
    saturation: u8,
    value: u8,
}

impl Hsv {
    /// Create a new HSV triple.
    ///
    /// Returns `None` if values are outside valid ranges.
    ///
    /// # Examples
    ///
    /// ```
    /// use lights_gateway::Hsv;
    ///
    /// assert!(Hsv::create(0, 100, 100).is_some());
    /// assert!(Hsv::create(359, 50, 10).is_some());
    /// assert!(Hsv::create(360, 50, 50).is_none());
    /// assert!(Hsv::create(180, 101, 50).is_none());
    /// ```
    pub fn create(hue: u16, saturation: u8, value: u8) -> Option<Self> {
        if hue < 360 && saturation <= 100 && value <= 100 {
            Some(Hsv {
                hue,
                saturation,
                value,
            })
        } else {
            None
        }
    }

    pub fn hue(&self) -> u16 {
        self.hue
    }

    pub fn saturation(&self) -> u8 {
        self.saturation
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Convert to RGB.
    ///
    /// # Examples
    ///
    /// ```
    /// use lights_gateway::{Color, Hsv};
    ///
    /// let hsv = Hsv::create(120, 100, 100).unwrap();
    /// assert_eq!(hsv.to_color(), Color::rgb(0, 255, 0));
    /// ```
    pub fn to_color(&self) -> Color {
        let s = f32::from(self.saturation) / 100.0;
        let v = f32::from(self.value) / 100.0;

        if s == 0.0 {
            let gray = to_channel(v);
            return Color::rgb(gray, gray, gray);
        }

        let h = f32::from(self.hue) / 60.0;
        let i = h.floor() as i32;
        let f = h - i as f32;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));

        let (r, g, b) = match i % 6 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };

        Color::rgb(to_channel(r), to_channel(g), to_channel(b))
    }
}

impl From<&Color> for Hsv {
    fn from(color: &Color) -> Self {
        let r = f32::from(color.red) / 255.0;
        let g = f32::from(color.green) / 255.0;
        let b = f32::from(color.blue) / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let hue = if delta == 0.0 {
            0.0
        } else if max == r {
            60.0 * ((g - b) / delta).rem_euclid(6.0)
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };
        let saturation = if max == 0.0 { 0.0 } else { delta / max };

        Hsv {
            hue: (hue.round() as u16) % 360,
            saturation: (saturation * 100.0).round() as u8,
            value: (max * 100.0).round() as u8,
        }
    }
}

impl From<&Hsv> for Color {
    fn from(hsv: &Hsv) -> Self {
        hsv.to_color()
    }
}

fn to_channel(x: f32) -> u8 {
    (x * 255.0).round().clamp(0.0, 255.0) as u8
}
