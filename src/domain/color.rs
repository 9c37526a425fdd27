//! Color conversions
//!
//! Brightness scale mapping between the host's 0-255 range and the
//! device's 1-100 percent, and the Kelvin to RGB approximation used for
//! color temperature frames.

use crate::domain::models::Rgb;

/// Lowest brightness percent the device accepts.
pub const MIN_PERCENT: u8 = 1;
/// Highest brightness percent the device accepts.
pub const MAX_PERCENT: u8 = 100;

/// Scale a host 0-255 brightness into device percent, clamped to 1-100.
///
/// Zero maps to 1: turning off is a POWER command, never brightness 0.
pub fn level_to_percent(level: u8) -> u8 {
    let scaled = (f64::from(level) * f64::from(MAX_PERCENT) / 255.0).round() as u8;
    scaled.clamp(MIN_PERCENT, MAX_PERCENT)
}

/// Scale a device percent back to the host 0-255 range.
pub fn percent_to_level(percent: u8) -> u8 {
    let percent = percent.min(MAX_PERCENT);
    (f64::from(percent) * 255.0 / f64::from(MAX_PERCENT)).round() as u8
}

/// Approximate the RGB appearance of a black body at `kelvin`.
///
/// Tanner Helland's curve fit, the same one Home Assistant uses. Input is
/// clamped to 1000-40000 K; each channel is rounded to the nearest integer.
pub fn kelvin_to_rgb(kelvin: u16) -> Rgb {
    let temperature = f64::from(kelvin.clamp(1_000, 40_000)) / 100.0;
    Rgb::new(
        channel(red(temperature)),
        channel(green(temperature)),
        channel(blue(temperature)),
    )
}

fn channel(value: f64) -> u8 {
    value.clamp(0.0, 255.0).round() as u8
}

fn red(temperature: f64) -> f64 {
    if temperature <= 66.0 {
        return 255.0;
    }
    329.698727446 * (temperature - 60.0).powf(-0.1332047592)
}

fn green(temperature: f64) -> f64 {
    if temperature <= 66.0 {
        99.4708025861 * temperature.ln() - 161.1195681661
    } else {
        288.1221695283 * (temperature - 60.0).powf(-0.0755148492)
    }
}

fn blue(temperature: f64) -> f64 {
    if temperature >= 66.0 {
        255.0
    } else if temperature <= 19.0 {
        0.0
    } else {
        138.5177312231 * (temperature - 10.0).ln() - 305.0447927307
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_bounds() {
        assert_eq!(level_to_percent(0), 1);
        assert_eq!(level_to_percent(1), 1);
        assert_eq!(level_to_percent(255), 100);
    }

    #[test]
    fn level_round_trips_through_percent() {
        assert_eq!(percent_to_level(50), 128);
        assert_eq!(level_to_percent(percent_to_level(50)), 50);
        assert_eq!(percent_to_level(100), 255);
    }

    #[test]
    fn warm_white() {
        assert_eq!(kelvin_to_rgb(2000), Rgb::new(255, 137, 14));
    }

    #[test]
    fn neutral_white_saturates() {
        assert_eq!(kelvin_to_rgb(6600), Rgb::new(255, 255, 255));
    }

    #[test]
    fn cool_white_leans_blue() {
        let rgb = kelvin_to_rgb(9000);
        assert_eq!(rgb.b, 255);
        assert!(rgb.r < rgb.g);
        assert!(rgb.g < rgb.b);
    }

    #[test]
    fn very_low_kelvin_clamps() {
        assert_eq!(kelvin_to_rgb(0), kelvin_to_rgb(1000));
        assert_eq!(kelvin_to_rgb(1000).b, 0);
    }
}
