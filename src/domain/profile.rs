//! Device profiles
//!
//! Static capability data for each supported Govee model. A profile is
//! looked up once from the model identifier and never changes afterwards.
//!
//! | Model | Brightness | Color temp    | Color frame |
//! |-------|------------|---------------|-------------|
//! | H6006 | yes        | 2000-9000 K   | RGBWW       |
//! | H6008 | yes        | 2000-9000 K   | RGBWW       |
//! | H6053 | yes        | no            | segments    |
//! | H6072 | yes        | no            | segments    |
//! | H6102 | yes        | no            | segments    |
//! | H6199 | yes        | no            | segments    |
//! | H617A | yes        | no            | segments    |
//! | H617C | yes        | no            | segments    |
//!
//! Any other model falls back to on/off plus manual RGB.

use crate::domain::models::ColorMode;

/// How a model expects COLOR frames to be laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorEncoding {
    /// `MANUAL` mode byte followed by RGB.
    Manual,
    /// `RGBWW` mode byte followed by RGB; the same mode carries color temperature.
    Rgbww,
    /// `SEGMENTS` mode addressing every segment of a strip.
    Segments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KelvinRange {
    pub min: u16,
    pub max: u16,
}

impl KelvinRange {
    pub fn clamp(&self, kelvin: u16) -> u16 {
        kelvin.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub brightness: bool,
    pub color_temp: Option<KelvinRange>,
    pub color_encoding: ColorEncoding,
}

const WHITE_RANGE: KelvinRange = KelvinRange { min: 2000, max: 9000 };

const BULB: Capabilities = Capabilities {
    brightness: true,
    color_temp: Some(WHITE_RANGE),
    color_encoding: ColorEncoding::Rgbww,
};

const SEGMENTED_STRIP: Capabilities = Capabilities {
    brightness: true,
    color_temp: None,
    color_encoding: ColorEncoding::Segments,
};

const FALLBACK: Capabilities = Capabilities {
    brightness: false,
    color_temp: None,
    color_encoding: ColorEncoding::Manual,
};

static MODELS: &[(&str, Capabilities)] = &[
    ("H6006", BULB),
    ("H6008", BULB),
    ("H6053", SEGMENTED_STRIP),
    ("H6072", SEGMENTED_STRIP),
    ("H6102", SEGMENTED_STRIP),
    ("H6199", SEGMENTED_STRIP),
    ("H617A", SEGMENTED_STRIP),
    ("H617C", SEGMENTED_STRIP),
];

/// A model identifier together with its capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProfile {
    model: String,
    capabilities: Capabilities,
    known: bool,
}

impl DeviceProfile {
    /// Look up a model. Matching ignores ASCII case.
    pub fn for_model(model: &str) -> Self {
        let found = MODELS.iter().find(|(name, _)| name.eq_ignore_ascii_case(model));

        match found {
            Some((name, capabilities)) => Self {
                model: (*name).to_string(),
                capabilities: *capabilities,
                known: true,
            },
            None => Self {
                model: model.to_string(),
                capabilities: FALLBACK,
                known: false,
            },
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Whether the model was found in the table rather than defaulted.
    pub fn is_known(&self) -> bool {
        self.known
    }

    /// Color modes a host should advertise for this model.
    ///
    /// Every model takes RGB. `Brightness` is implied by a color mode, so
    /// it is never listed.
    pub fn color_modes(&self) -> Vec<ColorMode> {
        let mut modes = vec![ColorMode::Rgb];
        if self.capabilities.color_temp.is_some() {
            modes.insert(0, ColorMode::ColorTemp);
        }
        modes
    }
}

/// Model identifiers with a dedicated table entry.
pub fn known_models() -> impl Iterator<Item = &'static str> {
    MODELS.iter().map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn h6008_is_a_color_temp_bulb() {
        let profile = DeviceProfile::for_model("H6008");
        assert!(profile.is_known());
        let caps = profile.capabilities();
        assert!(caps.brightness);
        assert_eq!(caps.color_temp, Some(KelvinRange { min: 2000, max: 9000 }));
        assert_eq!(caps.color_encoding, ColorEncoding::Rgbww);
    }

    #[test]
    fn h6053_is_segmented() {
        let profile = DeviceProfile::for_model("h6053");
        assert_eq!(profile.model(), "H6053");
        assert_eq!(
            profile.capabilities().color_encoding,
            ColorEncoding::Segments
        );
        assert!(profile.capabilities().color_temp.is_none());
    }

    #[test]
    fn unknown_model_falls_back() {
        let profile = DeviceProfile::for_model("H9999");
        assert!(!profile.is_known());
        assert_eq!(profile.model(), "H9999");
        assert!(!profile.capabilities().brightness);
        assert_eq!(profile.capabilities().color_encoding, ColorEncoding::Manual);
    }

    #[test]
    fn color_modes_follow_capabilities() {
        assert_eq!(
            DeviceProfile::for_model("H6006").color_modes(),
            vec![ColorMode::ColorTemp, ColorMode::Rgb]
        );
        assert_eq!(
            DeviceProfile::for_model("H6102").color_modes(),
            vec![ColorMode::Rgb]
        );
    }

    #[test]
    fn brightness_is_never_advertised_alone() {
        for model in known_models().chain(["H9999"]) {
            let modes = DeviceProfile::for_model(model).color_modes();
            assert!(modes.contains(&ColorMode::Rgb), "{model}");
            assert!(!modes.contains(&ColorMode::Brightness), "{model}");
        }
    }

    #[test]
    fn kelvin_range_clamps() {
        assert_eq!(WHITE_RANGE.clamp(1500), 2000);
        assert_eq!(WHITE_RANGE.clamp(12000), 9000);
        assert_eq!(WHITE_RANGE.clamp(4000), 4000);
    }

    #[test]
    fn table_has_no_duplicates() {
        let models: Vec<_> = known_models().collect();
        for (i, model) in models.iter().enumerate() {
            assert!(!models[i + 1..].contains(model), "duplicate entry {model}");
        }
    }
}
