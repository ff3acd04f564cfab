//! Adaptive sampling of functions and curves for plotting.
//!
//! A plot goes through three stages:
//!
//! 1. [`Sampling::fun`], [`Sampling::param`] or [`Sampling::param_xy`]
//!    evaluate the function on its domain.  The number of points and
//!    the amount of refinement follow the zoom level of the view
//!    ([`DensityContext`]) and the [`InteractionMode`].
//! 2. [`Sampling::segment`] maps the points to the screen and cuts
//!    the path at discontinuities, giving a [`RenderPath`].
//! 3. [`RenderPath::render`] draws each segment as a smooth spline on
//!    any [`Surface`].
//!
//! ```
//! use curve_sampling::{Affine, Path, Sampling, Transform};
//! # fn main() -> Result<(), curve_sampling::Error> {
//! let tr = Affine::fit(-1., 1., -10., 10., 400., 300.);
//! let s = Sampling::fun(|x| 1. / x, -1., 1.)
//!     .density(tr.density([0., 0.], 400., 300.))
//!     .build()?;
//! let path = s.segment(&tr);
//! assert!(path.segments().len() >= 2);
//! let mut svg = Path::new();
//! path.render(&mut svg);
//! # Ok(()) }
//! ```
//!
//! Implicit curves `f(x, y) = 0` are handled by [`Sampling::implicit`].

use std::{fmt::{self, Display, Formatter},
          io::{self, Write}};
use rgb::RGB8;

mod adaptive;
mod cache;
mod classify;
mod density;
mod error;
mod fast;
mod implicit;
mod render;
mod transform;

pub use adaptive::Stats;
pub use cache::{EvalCache, Evaluation, Lookup};
pub use classify::{Classifier, RenderPath, Segment, Thresholds};
pub use density::{DensityContext, DensityTable, InteractionMode, LiveTier,
                  Tier};
pub use error::{Error, Result};
pub use implicit::Implicit;
pub use render::{draw_spline, LaTeX, Path, PathCmd, Surface};
pub use transform::{Affine, Transform};

use adaptive::{Components, Curve, Graph, Image, Sampler};

/// A sample: the parameter `t` and the world point (`x`, `y`) it
/// maps to.  For graphs of functions, `x == t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub t: f64,
    pub x: f64,
    pub y: f64,
}

/// A box \[`xmin`, `xmax`\] × \[`ymin`, `ymax`\].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl BoundingBox {
    /// Box containing nothing, neutral for [`BoundingBox::hull`].
    pub const EMPTY: BoundingBox = BoundingBox {
        xmin: f64::INFINITY,  xmax: f64::NEG_INFINITY,
        ymin: f64::INFINITY,  ymax: f64::NEG_INFINITY };

    /// Return `true` if the bounding box has an empty interior.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.xmin < self.xmax && self.ymin < self.ymax) // NAN ⟹ empty
    }

    /// Return `true` if the point `p` belongs to `bb` (possibly on
    /// the boundary).
    #[inline]
    pub fn contains(&self, p: [f64; 2]) -> bool {
        self.xmin <= p[0] && p[0] <= self.xmax
            && self.ymin <= p[1] && p[1] <= self.ymax
    }

    /// Enlarge the box so it contains `p`.
    #[inline]
    pub fn include(&mut self, p: [f64; 2]) {
        self.xmin = self.xmin.min(p[0]);
        self.xmax = self.xmax.max(p[0]);
        self.ymin = self.ymin.min(p[1]);
        self.ymax = self.ymax.max(p[1]);
    }

    /// Return the smaller bounding-box containing both `self` and
    /// `other`.
    #[inline]
    pub fn hull(&self, other: &Self) -> Self {
        BoundingBox { xmin: self.xmin.min(other.xmin),
                      xmax: self.xmax.max(other.xmax),
                      ymin: self.ymin.min(other.ymin),
                      ymax: self.ymax.max(other.ymax) }
    }
}

////////////////////////////////////////////////////////////////////////
//
// Sampling

/// The points of one sampling pass, sorted by parameter.  All
/// coordinates are finite and no two points share a parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Sampling {
    points: Vec<Point>,
    a: f64,
    b: f64,
    ctx: DensityContext,
    color: Option<RGB8>,
    stats: Stats,
}

impl Sampling {
    pub fn points(&self) -> &[Point] { &self.points }

    pub fn len(&self) -> usize { self.points.len() }

    /// Always `false` for a sampling returned by a `build` method.
    pub fn is_empty(&self) -> bool { self.points.is_empty() }

    /// Iterate on the world points (`x`, `y`).
    pub fn iter(&self) -> impl Iterator<Item = [f64; 2]> + '_ {
        self.points.iter().map(|p| [p.x, p.y])
    }

    /// The domain \[`a`, `b`\] that was sampled.
    pub fn domain(&self) -> (f64, f64) { (self.a, self.b) }

    /// The view the sampling was computed for.
    pub fn density(&self) -> DensityContext { self.ctx }

    pub fn color(&self) -> Option<RGB8> { self.color }

    /// Cost of the pass that produced the sampling.
    pub fn stats(&self) -> &Stats { &self.stats }

    /// Smallest box containing all world points.
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bb = BoundingBox::EMPTY;
        for p in self.iter() { bb.include(p) }
        bb
    }

    /// Map the points to the screen with `tr` and cut the path where
    /// it is discontinuous, using the default [`Thresholds`].
    pub fn segment(&self, tr: &impl Transform) -> RenderPath {
        self.segment_with(tr, &Thresholds::default())
    }

    /// Same as [`Sampling::segment`] with custom thresholds.
    pub fn segment_with(&self, tr: &impl Transform, th: &Thresholds)
                        -> RenderPath {
        let c = Classifier::new(th, self.ctx.pixels_per_unit, self.a, self.b,
                                self.stats.uniform);
        RenderPath::new(c.split(&self.points, tr), self.color)
    }
}

/// Options shared by all sampling builders.
#[derive(Debug, Clone)]
struct Options {
    a: f64,
    b: f64,
    ctx: DensityContext,
    mode: InteractionMode,
    table: DensityTable,
    color: Option<RGB8>,
    init: Vec<f64>,
    jitter: Option<u64>,
}

impl Options {
    fn new(a: f64, b: f64) -> Self {
        Options { a, b,
                  ctx: DensityContext::default(),
                  mode: InteractionMode::Full,
                  table: DensityTable::default(),
                  color: None,
                  init: vec![],
                  jitter: None }
    }

    fn sample<C: Curve>(&self, curve: C) -> Result<Sampling> {
        error::check_domain(self.a, self.b)?;
        self.ctx.check()?;
        let plan = self.table.plan(self.b - self.a, &self.ctx, self.mode);
        // Initial abscissae count against the evaluation budget, which
        // must still pay for one midpoint per uniform interval.
        let reserved = match plan.mode {
            InteractionMode::Full => 2 * plan.n,
            InteractionMode::Live => plan.n,
        };
        let extra = plan.max_evaluations.saturating_sub(reserved);
        let init = &self.init[.. self.init.len().min(extra)];
        let sampler = Sampler { curve, a: self.a, b: self.b, plan, init,
                                jitter: self.jitter,
                                fallback: &self.table.fallback };
        let (points, stats) = sampler.run()?;
        Ok(Sampling { points, a: self.a, b: self.b, ctx: self.ctx,
                      color: self.color, stats })
    }
}

/// Implement the options setters of a sampling builder.
macro_rules! sampling_options {
    ($struct: ident < $($g: ident),* >) => {
        impl<$($g),*> $struct<$($g),*> {
            /// Set the view the sampling is for.  Its zoom level
            /// selects the density tier.  Default: 50 pixels per unit
            /// on a 800×600 canvas.
            pub fn density(mut self, ctx: DensityContext) -> Self {
                self.opt.ctx = ctx;
                self
            }

            /// Default: [`InteractionMode::Full`].
            pub fn mode(mut self, mode: InteractionMode) -> Self {
                self.opt.mode = mode;
                self
            }

            /// Colour hint passed on to the [`RenderPath`].
            pub fn color(mut self, color: RGB8) -> Self {
                self.opt.color = Some(color);
                self
            }

            /// Replace the density constants.
            pub fn tiers(mut self, table: DensityTable) -> Self {
                self.opt.table = table;
                self
            }

            /// Add values of the parameter that must be sampled in
            /// addition to the uniform ones (e.g. known critical
            /// points).  Values outside the domain are ignored.
            pub fn init<'a, I>(mut self, ts: I) -> Self
            where I: IntoIterator<Item = &'a f64> {
                for &t in ts {
                    if self.opt.a <= t && t <= self.opt.b { // ⟹ t is finite
                        self.opt.init.push(t);
                    }
                }
                self
            }

            /// Move the interior points of the uniform pass randomly
            /// by up to 1/16 of the spacing, so periodic functions do
            /// not alias with the grid.  The same `seed` gives the same
            /// sampling.
            pub fn jitter(mut self, seed: u64) -> Self {
                self.opt.jitter = Some(seed);
                self
            }
        }
    }
}

/// Options for the graph of a function.  See [`Sampling::fun`].
pub struct Fun<F> {
    f: F,
    opt: Options,
}

/// Options for a parametric curve.  See [`Sampling::param`].
pub struct Param<F> {
    f: F,
    opt: Options,
}

/// Options for a parametric curve given by its components.  See
/// [`Sampling::param_xy`].
pub struct ParamXY<Fx, Fy> {
    fx: Fx,
    fy: Fy,
    opt: Options,
}

sampling_options!(Fun<F>);
sampling_options!(Param<F>);
sampling_options!(ParamXY<Fx, Fy>);

impl Sampling {
    /// Create a sampling for the graph of `f` on the interval
    /// \[`a`, `b`\].  `f` may return `f64`, `Option<f64>` or
    /// `Result<f64, E>`; `None`, errors and non-finite values mean
    /// that `f` is not defined there.
    ///
    /// # Example
    ///
    /// ```
    /// use curve_sampling::{Sampling, InteractionMode};
    /// # fn main() -> Result<(), curve_sampling::Error> {
    /// let s = Sampling::fun(|x| x.sqrt(), -1., 4.)
    ///     .mode(InteractionMode::Live)
    ///     .build()?;
    /// assert!(s.iter().all(|[x, _]| x >= 0.));
    /// # Ok(()) }
    /// ```
    #[must_use]
    pub fn fun<F, R>(f: F, a: f64, b: f64) -> Fun<F>
    where F: FnMut(f64) -> R, R: Evaluation<f64> {
        Fun { f, opt: Options::new(a, b) }
    }

    /// Create a sampling of the image of `f` on \[`a`, `b`\].  `f`
    /// returns `[x, y]` or `(x, y)`, possibly wrapped in an `Option`
    /// or a `Result`.
    ///
    /// # Example
    ///
    /// ```
    /// use std::f64::consts::PI;
    /// use curve_sampling::Sampling;
    /// # fn main() -> Result<(), curve_sampling::Error> {
    /// let s = Sampling::param(|t| [t.cos(), t.sin()], 0., 2. * PI)
    ///     .build()?;
    /// let bb = s.bounding_box();
    /// assert!((bb.xmin + 1.).abs() < 1e-3 && (bb.ymax - 1.).abs() < 1e-3);
    /// # Ok(()) }
    /// ```
    #[must_use]
    pub fn param<F, R>(f: F, a: f64, b: f64) -> Param<F>
    where F: FnMut(f64) -> R, R: Evaluation<[f64; 2]> {
        Param { f, opt: Options::new(a, b) }
    }

    /// Create a sampling of the curve `t ↦ (fx(t), fy(t))` on
    /// \[`a`, `b`\].  Each component has its own cache; `fy` is only
    /// evaluated where `fx` is defined.
    #[must_use]
    pub fn param_xy<Fx, Fy, Rx, Ry>(fx: Fx, fy: Fy, a: f64, b: f64)
                                    -> ParamXY<Fx, Fy>
    where Fx: FnMut(f64) -> Rx, Rx: Evaluation<f64>,
          Fy: FnMut(f64) -> Ry, Ry: Evaluation<f64> {
        ParamXY { fx, fy, opt: Options::new(a, b) }
    }
}

impl<F, R> Fun<F>
where F: FnMut(f64) -> R, R: Evaluation<f64> {
    /// Return the sampling.  Fails on a malformed domain or view, or
    /// if `f` is nowhere defined on the points tried.
    pub fn build(&mut self) -> Result<Sampling> {
        self.opt.sample(Graph { f: &mut self.f, cache: EvalCache::new() })
    }
}

impl<F, R> Param<F>
where F: FnMut(f64) -> R, R: Evaluation<[f64; 2]> {
    /// See [`Fun::build`].
    pub fn build(&mut self) -> Result<Sampling> {
        self.opt.sample(Image { f: &mut self.f, cache: EvalCache::new() })
    }
}

impl<Fx, Fy, Rx, Ry> ParamXY<Fx, Fy>
where Fx: FnMut(f64) -> Rx, Rx: Evaluation<f64>,
      Fy: FnMut(f64) -> Ry, Ry: Evaluation<f64> {
    /// See [`Fun::build`].
    pub fn build(&mut self) -> Result<Sampling> {
        self.opt.sample(Components { fx: &mut self.fx, fy: &mut self.fy,
                                     cache_x: EvalCache::new(),
                                     cache_y: EvalCache::new() })
    }
}

////////////////////////////////////////////////////////////////////////
//
// Output

impl Sampling {
    /// Write the sampling to `f` in a tabular form: each point is
    /// written as "x y" on a single line (in scientific notation).
    /// This format is compatible with Gnuplot.
    pub fn write(&self, f: &mut impl Write) -> io::Result<()> {
        for [x, y] in self.iter() {
            writeln!(f, "{:e} {:e}", x, y)?;
        }
        Ok(())
    }
}

impl Display for Sampling {
    /// Same format as [`Sampling::write`].
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for [x, y] in self.iter() {
            writeln!(f, "{:e} {:e}", x, y)?;
        }
        Ok(())
    }
}

impl RenderPath {
    /// Write the world points of the path to `f`, one "x y" line per
    /// point, with a blank line between segments (Gnuplot format).
    pub fn write(&self, f: &mut impl Write) -> io::Result<()> {
        for (i, seg) in self.segments().iter().enumerate() {
            if i > 0 { writeln!(f)? }
            for p in seg.points() {
                writeln!(f, "{:e} {:e}", p.x, p.y)?;
            }
        }
        Ok(())
    }
}

impl Display for RenderPath {
    /// Same format as [`RenderPath::write`].
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments().iter().enumerate() {
            if i > 0 { writeln!(f)? }
            for p in seg.points() {
                writeln!(f, "{:e} {:e}", p.x, p.y)?;
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////
//
// Tests

#[cfg(test)]
mod tests {
    use std::{cell::Cell, f64::consts::PI};
    use rgb::RGB8;
    use crate::*;

    fn zoom(ppu: f64) -> DensityContext { DensityContext::new(ppu, 800., 600.) }

    #[test_log::test]
    fn smooth_function_within_error() {
        let f = |x: f64| 3. * (5. * x).sin();
        let ppu = 10.;
        let s = Sampling::fun(f, 0., 4.).density(zoom(ppu)).build().unwrap();
        let table = DensityTable::default();
        let (_, tier) = table.tier(ppu).unwrap();
        for w in s.points().windows(2) {
            let tm = 0.5 * (w[0].t + w[1].t);
            let err = (f(tm) - 0.5 * (w[0].y + w[1].y)).abs() * ppu;
            assert!(err <= tier.error_px, "error {} px at {}", err, tm);
        }
        assert_eq!(s.points()[0].t, 0.);
        assert_eq!(s.points()[s.len() - 1].t, 4.);
    }

    #[test]
    fn error_bound_holds_on_a_capped_tier() {
        // 24 units at 100 px/unit: the uniform pass is capped and the
        // budget is tight.  Sharp bumps sit at both ends.
        let f = |x: f64| (-(100. * (x + 11.)).powi(2)).exp()
            + (-(100. * (x - 11.)).powi(2)).exp() + (0.5 * x).sin();
        let ppu = 100.;
        let s = Sampling::fun(f, -12., 12.).density(zoom(ppu)).build().unwrap();
        let table = DensityTable::default();
        let (_, tier) = table.tier(ppu).unwrap();
        assert_eq!(s.stats().uniform, tier.max_points);
        assert!(s.stats().evaluations <= tier.max_evaluations,
                "{} evaluations", s.stats().evaluations);
        for w in s.points().windows(2) {
            let tm = 0.5 * (w[0].t + w[1].t);
            let err = (f(tm) - 0.5 * (w[0].y + w[1].y)).abs() * ppu;
            assert!(err <= tier.error_px, "error {} px at {}", err, tm);
        }
    }

    #[test]
    fn canvas_size_does_not_change_the_samples() {
        let f = |x: f64| (3. * x).sin() / x;
        let s0 = Sampling::fun(f, -5., 5.)
            .density(DensityContext::new(80., 800., 600.)).build().unwrap();
        let s1 = Sampling::fun(f, -5., 5.)
            .density(DensityContext::new(80., 0., f64::NAN)).build().unwrap();
        assert_eq!(s0.points(), s1.points());
    }

    #[test]
    fn deterministic() {
        let f = |x: f64| (1. / x).sin() * x;
        let run = || Sampling::fun(f, -0.5, 0.7).density(zoom(300.))
            .build().unwrap();
        let (s1, s2) = (run(), run());
        assert_eq!(s1.points(), s2.points());
        assert_eq!(s1.stats(), s2.stats());
    }

    #[test]
    fn segments_are_monotonic() {
        let tr = Affine::centered([0., 0.], 200., 800., 600.);
        let s = Sampling::fun(|x| x.tan(), -3., 3.).density(zoom(200.))
            .build().unwrap();
        let path = s.segment(&tr);
        for seg in path.segments() {
            assert!(seg.points().windows(2).all(|w| w[0].t < w[1].t));
        }
    }

    #[test_log::test]
    fn pole_of_inverse() {
        let ppu = 1000.;
        let tr = Affine::centered([0., 0.], ppu, 800., 600.);
        let s = Sampling::fun(|x| 1. / x, -1., 1.).density(zoom(ppu))
            .build().unwrap();
        let path = s.segment(&tr);
        assert!(path.segments().len() >= 2);
        for seg in path.segments() {
            let pts = seg.points();
            assert!(pts.iter().all(|p| p.t < 0.) || pts.iter().all(|p| p.t > 0.),
                    "segment spans the pole: {:?} .. {:?}",
                    pts[0], pts[pts.len() - 1]);
        }
    }

    #[test]
    fn oscillation_is_not_cut() {
        for ppu in [50., 1000.] {
            let tr = Affine::centered([0.5, 0.], ppu, 800., 600.);
            let s = Sampling::fun(|x| (50. * x).sin(), 0., 1.)
                .density(zoom(ppu)).build().unwrap();
            assert_eq!(s.segment(&tr).segments().len(), 1, "ppu = {}", ppu);
        }
    }

    #[test]
    fn single_valid_point_survives() {
        let s = Sampling::fun(|x| if x <= 0. { 1. } else { f64::NAN }, 0., 1.)
            .build().unwrap();
        assert_eq!(s.points(), &[Point { t: 0., x: 0., y: 1. }]);
        assert!(s.stats().attempts.len() > 1);
        let path = s.segment(&Affine::centered([0., 0.], 50., 800., 600.));
        assert_eq!(path.segments().len(), 1);
        let mut p = Path::new();
        path.render(&mut p);
        assert_eq!(p.commands().len(), 2);
    }

    #[test]
    fn total_failure_is_reported() {
        let r = Sampling::fun(|_| -> std::result::Result<f64, &str> {
            Err("domain error") }, -1., 1.)
            .mode(InteractionMode::Live)
            .build();
        match r {
            Err(Error::NoValidSamples { min, max, attempts }) => {
                assert_eq!((min, max), (-1., 1.));
                assert!(!attempts.is_empty());
            }
            r => panic!("expected a failure, got {:?}", r),
        }
    }

    #[test]
    fn live_mode_is_capped() {
        let calls = Cell::new(0);
        let f = |x: f64| {
            calls.set(calls.get() + 1);
            (1. / x).sin() * (x * 1e3).cos()
        };
        let s = Sampling::fun(f, -100., 100.).density(zoom(1e4))
            .mode(InteractionMode::Live).build().unwrap();
        let cap = DensityTable::default().live.max_evaluations;
        assert!(calls.get() <= cap);
        assert!(s.stats().evaluations <= cap);
        assert_eq!(s.stats().attempts.len(), 1);
    }

    #[test]
    fn malformed_requests() {
        assert_eq!(Sampling::fun(|x| x, 1., 0.).build(),
                   Err(Error::InvalidDomain { min: 1., max: 0. }));
        assert!(Sampling::fun(|x| x, 0., f64::INFINITY).build().is_err());
        assert!(Sampling::fun(|x| x, 0., 1.)
                .density(zoom(-1.)).build().is_err());
        let mut called = false;
        let _ = Sampling::fun(|x| { called = true; x }, 0., 0.).build();
        assert!(!called);
    }

    #[test]
    fn circle() {
        let tr = Affine::centered([0., 0.], 100., 400., 400.);
        let s = Sampling::param(|t| [t.cos(), t.sin()], 0., 2. * PI)
            .density(zoom(100.)).build().unwrap();
        let path = s.segment(&tr);
        assert_eq!(path.segments().len(), 1);
        let pts = s.points();
        assert!(pts.windows(2).all(|w| w[0].t < w[1].t));
        assert!(pts.iter().all(|p| (p.x.hypot(p.y) - 1.).abs() < 1e-12));
    }

    #[test]
    fn param_xy_and_options() {
        let s = Sampling::param_xy(|t| t, |t| t * t, -1., 1.)
            .mode(InteractionMode::Live)
            .init(&[0.123456, 5.])
            .color(RGB8 { r: 0, g: 128, b: 0 })
            .build().unwrap();
        assert!(s.points().iter().any(|p| p.t == 0.123456));
        assert!(s.points().iter().all(|p| p.t <= 1.));
        let path = s.segment(&Affine::centered([0., 0.], 50., 800., 600.));
        assert_eq!(path.color(), Some(RGB8 { r: 0, g: 128, b: 0 }));
    }

    #[test]
    fn jitter_keeps_endpoints() {
        let s = Sampling::fun(|x| (30. * x).sin(), 0., 2.)
            .mode(InteractionMode::Live).jitter(42).build().unwrap();
        let t: Vec<_> = s.points().iter().map(|p| p.t).collect();
        assert_eq!((t[0], t[t.len() - 1]), (0., 2.));
        let dt = 2. / (s.stats().uniform - 1) as f64;
        assert!(t.iter().enumerate()
                .all(|(i, &t)| (t - i as f64 * dt).abs() <= dt / 16.));
    }

    #[test]
    fn gnuplot_output() {
        let path = RenderPath::from([[1., 2.], [f64::NAN, 0.], [3., 4.]]);
        assert_eq!(path.to_string(), "1e0 2e0\n\n3e0 4e0\n");
        let s = Sampling::fun(|x| 2. * x, 0., 1.)
            .mode(InteractionMode::Live).build().unwrap();
        let mut out = vec![];
        s.write(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), s.to_string());
        assert!(s.to_string().starts_with("0e0 0e0\n"));
    }

    #[test]
    fn bounding_boxes() {
        let s = Sampling::fun(|x| x * x, -1., 2.)
            .mode(InteractionMode::Live).build().unwrap();
        let bb = s.bounding_box();
        assert_eq!((bb.xmin, bb.xmax, bb.ymax), (-1., 2., 4.));
        assert!(0. <= bb.ymin && bb.ymin < 1e-2, "{:?}", bb);
        let unit = BoundingBox { xmin: 0., xmax: 1., ymin: 0., ymax: 1. };
        assert_eq!(bb.hull(&unit),
                   BoundingBox { xmin: -1., xmax: 2., ymin: 0., ymax: 4. });
        assert!(bb.contains([0., 1.]) && !bb.contains([3., 1.]));
        assert!(BoundingBox::EMPTY.is_empty());
        assert!(RenderPath::default().bounding_box().is_empty());
    }
}
