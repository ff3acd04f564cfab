//! Sampling density: zoom level, interaction mode and the tiered
//! constants that turn them into sample counts and thresholds.
//!
//! The constants are tuned by hand.  What matters is their structure:
//! more zoom gives denser sampling, deeper recursion and tighter
//! error thresholds; [`InteractionMode::Live`] does as little work as
//! possible.

use crate::error::{Error, Result};

/// How much effort a sampling pass may spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    /// Final rendering: uniform pass followed by adaptive refinement.
    #[default]
    Full,
    /// Continuous user input (e.g. dragging a slider).  Uniform
    /// sampling only, with a hard cap on evaluations.
    Live,
}

/// What the host knows about the current view.
///
/// Only `pixels_per_unit` drives sampling: sample counts follow the
/// domain length at that zoom, not the visible part of it.  The canvas
/// size is carried along for the host (e.g. to build an
/// [`Affine`][crate::Affine] or a clipping box) and is not validated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityContext {
    /// Screen pixels per domain unit (both axes, averaged).
    pub pixels_per_unit: f64,
    /// Canvas width in pixels.  Not read by the samplers.
    pub canvas_width: f64,
    /// Canvas height in pixels.  Not read by the samplers.
    pub canvas_height: f64,
}

impl Default for DensityContext {
    /// A 800×600 canvas showing about 16 units horizontally.
    fn default() -> Self {
        Self { pixels_per_unit: 50., canvas_width: 800., canvas_height: 600. }
    }
}

impl DensityContext {
    pub fn new(pixels_per_unit: f64, canvas_width: f64,
               canvas_height: f64) -> Self {
        Self { pixels_per_unit, canvas_width, canvas_height }
    }

    pub(crate) fn check(&self) -> Result<()> {
        let ppu = self.pixels_per_unit;
        if ppu.is_finite() && ppu > 0. {
            Ok(())
        } else {
            Err(Error::InvalidDensity { pixels_per_unit: ppu })
        }
    }
}

/// Constants of [`InteractionMode::Live`] sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveTier {
    pub points_per_pixel: f64,
    pub min_points: usize,
    pub max_points: usize,
    /// No pass, fallback ladder included, evaluates the function more
    /// often than this.
    pub max_evaluations: usize,
}

/// Constants of [`InteractionMode::Full`] sampling for views with at
/// least `min_pixels_per_unit` pixels per domain unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tier {
    pub min_pixels_per_unit: f64,
    /// Density of the uniform pass.
    pub points_per_pixel: f64,
    /// Cap on the number of points of the uniform pass.
    pub max_points: usize,
    /// Cap on the number of evaluations of the whole pass.
    pub max_evaluations: usize,
    pub max_depth: u32,
    /// Intervals narrower than this (in pixels) are not subdivided.
    pub min_step_px: f64,
    /// Uniform intervals wider than this (in pixels) are refined.
    pub refine_gap_px: f64,
    /// Tolerated distance (in pixels) between the curve and the chord
    /// at the midpoint of an interval.
    pub error_px: f64,
    /// Tolerated turning angle (radians) across an interval.
    pub max_turn: f64,
}

/// The full set of density constants.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityTable {
    pub live: LiveTier,
    /// Sorted by increasing `min_pixels_per_unit`; the first one must
    /// start at `0.`.
    pub tiers: Vec<Tier>,
    /// Uniform sample counts tried, in order, when a pass does not
    /// produce at least two valid points.
    pub fallback: Vec<usize>,
}

impl Default for DensityTable {
    fn default() -> Self {
        let tier = |min_pixels_per_unit, points_per_pixel, max_points,
                    max_evaluations, max_depth, min_step_px, refine_gap_px,
                    error_px, max_turn| {
            Tier { min_pixels_per_unit, points_per_pixel, max_points,
                   max_evaluations, max_depth, min_step_px, refine_gap_px,
                   error_px, max_turn }
        };
        DensityTable {
            live: LiveTier { points_per_pixel: 0.5,  min_points: 32,
                             max_points: 256,  max_evaluations: 512 },
            tiers: vec![
                tier(0.,      4., 10_000, 30_000, 10, 1. / 64.,   0.2,  0.5,  0.6),
                tier(50.,     5., 12_000, 40_000, 14, 1. / 128.,  0.15, 0.35, 0.45),
                tier(500.,    6., 15_000, 50_000, 18, 1. / 256.,  0.12, 0.25, 0.35),
                tier(5_000.,  7., 18_000, 60_000, 24, 1. / 512.,  0.1,  0.15, 0.25),
                tier(50_000., 8., 20_000, 80_000, 30, 1. / 1024., 0.08, 0.1,  0.2),
            ],
            fallback: vec![1_000, 5_000, 20_000],
        }
    }
}

/// Parameters of one sampling pass, resolved from a [`DensityTable`]
/// for a given domain, view and mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Plan {
    pub mode: InteractionMode,
    /// Index of the tier used (`None` in live mode).
    pub tier: Option<usize>,
    /// Number of points of the uniform pass.
    pub n: usize,
    pub max_evaluations: usize,
    pub max_depth: u32,
    /// Domain widths (converted from pixels).
    pub min_step: f64,
    pub refine_gap: f64,
    pub error_px: f64,
    pub max_turn: f64,
    pub pixels_per_unit: f64,
}

impl DensityTable {
    /// The Full-mode tier used at the zoom level `pixels_per_unit`.
    pub fn tier(&self, pixels_per_unit: f64) -> Option<(usize, &Tier)> {
        self.tiers.iter().enumerate()
            .rev()
            .find(|(_, t)| t.min_pixels_per_unit <= pixels_per_unit)
            .or_else(|| self.tiers.first().map(|t| (0, t)))
    }

    pub(crate) fn plan(&self, domain_range: f64, ctx: &DensityContext,
                       mode: InteractionMode) -> Plan {
        let ppu = ctx.pixels_per_unit;
        let pixels_covered = domain_range * ppu;
        let count = |ppp: f64, min: usize, max: usize| {
            let n = (pixels_covered * ppp).ceil();
            // `n` may be huge or NaN for absurd views.
            if n.is_nan() { min }
            else { (n.min(max as f64) as usize).max(min).min(max) }
        };
        match (mode, self.tier(ppu)) {
            (InteractionMode::Full, Some((i, t))) => {
                let n = count(t.points_per_pixel, 16.min(t.max_points),
                              t.max_points);
                // The uniform pass and one midpoint per interval are
                // always affordable.
                Plan { mode, tier: Some(i),  n,
                       max_evaluations: t.max_evaluations.max(2 * n),
                       max_depth: t.max_depth,
                       min_step: t.min_step_px / ppu,
                       refine_gap: t.refine_gap_px / ppu,
                       error_px: t.error_px,
                       max_turn: t.max_turn,
                       pixels_per_unit: ppu }
            }
            // Live mode, or a table without Full tiers.
            _ => {
                let l = &self.live;
                let n = count(l.points_per_pixel, l.min_points, l.max_points)
                    .min(l.max_evaluations);
                Plan { mode: InteractionMode::Live,  tier: None,  n,
                       max_evaluations: l.max_evaluations,
                       max_depth: 0,
                       min_step: f64::INFINITY,
                       refine_gap: f64::INFINITY,
                       error_px: f64::INFINITY,
                       max_turn: f64::INFINITY,
                       pixels_per_unit: ppu }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_get_finer_with_zoom() {
        let d = DensityTable::default();
        for w in d.tiers.windows(2) {
            assert!(w[0].min_pixels_per_unit < w[1].min_pixels_per_unit);
            assert!(w[0].points_per_pixel <= w[1].points_per_pixel);
            assert!(w[0].max_depth <= w[1].max_depth);
            assert!(w[0].error_px > w[1].error_px);
            assert!(w[0].max_turn > w[1].max_turn);
        }
        assert_eq!(d.tier(1.).map(|(i, _)| i), Some(0));
        assert_eq!(d.tier(50.).map(|(i, _)| i), Some(1));
        assert_eq!(d.tier(1e9).map(|(i, _)| i), Some(4));
    }

    #[test]
    fn full_plan() {
        let d = DensityTable::default();
        let ctx = DensityContext::new(100., 800., 600.);
        let p = d.plan(2., &ctx, InteractionMode::Full);
        assert_eq!(p.tier, Some(1));
        assert_eq!(p.n, 1000); // 200 px × 5
        assert_eq!(p.max_depth, 14);
        assert!((p.min_step - 1. / 128. / 100.).abs() < 1e-15);
        // Huge domain: capped.
        let p = d.plan(1e12, &ctx, InteractionMode::Full);
        assert_eq!(p.n, 12_000);
    }

    #[test]
    fn live_plan_is_capped() {
        let d = DensityTable::default();
        let ctx = DensityContext::new(100., 800., 600.);
        let p = d.plan(1e6, &ctx, InteractionMode::Live);
        assert_eq!(p.mode, InteractionMode::Live);
        assert_eq!(p.n, 256);
        let p = d.plan(0.01, &ctx, InteractionMode::Live);
        assert_eq!(p.n, 32);
        assert_eq!(p.max_evaluations, 512);
    }

    #[test]
    fn bad_density() {
        assert!(DensityContext::new(0., 1., 1.).check().is_err());
        assert!(DensityContext::new(f64::NAN, 1., 1.).check().is_err());
        assert!(DensityContext::default().check().is_ok());
    }
}
