use std::env;

use crate::paint::ClearColor;

/// How the scene reaches the screen. Fixed for the lifetime of a pipeline.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PipelineMode {
    /// Scene drawn straight into the screen target (with depth).
    Direct,
    /// Scene into a single-sample offscreen target, then sampled onto the screen.
    Offscreen,
    /// Scene into a multisampled target, resolved, then sampled onto the screen.
    Multisample { samples: u32 },
}

impl PipelineMode {
    pub fn sample_count(self) -> u32 {
        match self {
            PipelineMode::Multisample { samples } => samples,
            PipelineMode::Direct | PipelineMode::Offscreen => 1,
        }
    }

    /// A multisample mode with fewer than two samples is plain offscreen
    /// rendering: no multisampled target, nothing to resolve.
    pub fn normalized(self) -> Self {
        match self {
            PipelineMode::Multisample { samples } if samples < 2 => PipelineMode::Offscreen,
            mode => mode,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub mode: PipelineMode,
    /// Clear color of the offscreen scene target. Alpha is forced to zero.
    pub offscreen_clear: ClearColor,
    /// Clear color of the screen target. Alpha is forced to zero.
    pub screen_clear: ClearColor,
    /// Recolor every quad each frame, uploading only the color range.
    pub animate_colors: bool,
    /// Turn graphics faults reported at the end of a frame into an error.
    pub fatal_graphics_errors: bool,
}

pub const DEFAULT_SAMPLES: u32 = 4;

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: PipelineMode::Multisample {
                samples: DEFAULT_SAMPLES,
            },
            offscreen_clear: ClearColor::OFFSCREEN,
            screen_clear: ClearColor::SCREEN,
            animate_colors: false,
            fatal_graphics_errors: cfg!(debug_assertions),
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden from the environment:
    /// - `TESSERA_MODE`: `direct`, `offscreen` or `msaa`
    /// - `TESSERA_SAMPLES`: sample count for `msaa` (default 4)
    /// - `TESSERA_ANIMATE`: `1` or `true` to recolor quads every frame
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        let samples = match lookup("TESSERA_SAMPLES") {
            Some(val) => val.trim().parse::<u32>().unwrap_or_else(|_| {
                log::warn!("TESSERA_SAMPLES={val:?} is not a number; using {DEFAULT_SAMPLES}");
                DEFAULT_SAMPLES
            }),
            None => DEFAULT_SAMPLES,
        };

        if let Some(mode) = lookup("TESSERA_MODE") {
            match mode.trim().to_ascii_lowercase().as_str() {
                "direct" => config.mode = PipelineMode::Direct,
                "offscreen" => config.mode = PipelineMode::Offscreen,
                "msaa" | "multisample" => config.mode = PipelineMode::Multisample { samples },
                other => log::warn!("unknown TESSERA_MODE {other:?}; keeping {:?}", config.mode),
            }
        } else if let PipelineMode::Multisample { .. } = config.mode {
            config.mode = PipelineMode::Multisample { samples };
        }

        config.mode = config.mode.normalized();

        config.animate_colors = lookup("TESSERA_ANIMATE")
            .is_some_and(|val| val == "1" || val.eq_ignore_ascii_case("true"));

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn default_is_four_sample_msaa() {
        let c = PipelineConfig::default();
        assert_eq!(c.mode, PipelineMode::Multisample { samples: 4 });
        assert!(!c.animate_colors);
        assert_eq!(c.offscreen_clear, ClearColor::OFFSCREEN);
    }

    #[test]
    fn empty_environment_keeps_defaults() {
        assert_eq!(PipelineConfig::from_lookup(|_| None), PipelineConfig::default());
    }

    #[test]
    fn mode_and_samples_from_environment() {
        let c = PipelineConfig::from_lookup(lookup(&[("TESSERA_MODE", "msaa"), ("TESSERA_SAMPLES", "8")]));
        assert_eq!(c.mode, PipelineMode::Multisample { samples: 8 });

        let c = PipelineConfig::from_lookup(lookup(&[("TESSERA_MODE", "Direct")]));
        assert_eq!(c.mode, PipelineMode::Direct);
        assert_eq!(c.mode.sample_count(), 1);
    }

    #[test]
    fn single_sample_msaa_falls_back_to_offscreen() {
        for samples in ["0", "1"] {
            let c = PipelineConfig::from_lookup(lookup(&[("TESSERA_MODE", "msaa"), ("TESSERA_SAMPLES", samples)]));
            assert_eq!(c.mode, PipelineMode::Offscreen, "samples {samples}");
        }
        assert_eq!(PipelineMode::Multisample { samples: 2 }.normalized(), PipelineMode::Multisample { samples: 2 });
    }

    #[test]
    fn samples_alone_adjust_default_mode() {
        let c = PipelineConfig::from_lookup(lookup(&[("TESSERA_SAMPLES", "2")]));
        assert_eq!(c.mode, PipelineMode::Multisample { samples: 2 });
    }

    #[test]
    fn bad_values_fall_back() {
        let c = PipelineConfig::from_lookup(lookup(&[("TESSERA_MODE", "sideways"), ("TESSERA_SAMPLES", "lots")]));
        assert_eq!(c.mode, PipelineMode::Multisample { samples: 4 });
    }

    #[test]
    fn animate_flag() {
        assert!(PipelineConfig::from_lookup(lookup(&[("TESSERA_ANIMATE", "true")])).animate_colors);
        assert!(!PipelineConfig::from_lookup(lookup(&[("TESSERA_ANIMATE", "0")])).animate_colors);
    }
}
