//! Adaptive sampling of a curve `t ↦ (x(t), y(t))` over a domain.
//!
//! A pass has three stages:
//! 1. a uniform pass whose density comes from the [`Plan`];
//! 2. (Full mode only) bisection of the uniform intervals where the
//!    chord is visibly off the curve, the direction turns too much,
//!    the function stops being defined, or nothing is defined yet.
//!    The worst interval is always refined first, so the evaluation
//!    budget is shared by the whole domain;
//! 3. if fewer than two valid points were found, a fallback ladder of
//!    denser uniform passes.
//!
//! All evaluations go through pass-local [`EvalCache`]s.

use std::{cmp::Ordering, collections::BinaryHeap};
use log::{debug, trace, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};
use crate::{
    Point,
    cache::{self, EvalCache, Evaluation},
    density::{InteractionMode, Plan},
    error::{Error, Result},
    fast,
};

/// Fallback rungs the evaluation budget cannot pay for are skipped.
const MIN_RUNG: usize = 8;

/// Jittered abscissae move by at most this fraction of the spacing.
const JITTER: f64 = 0.0625;

/// A curve evaluated through caches.
pub(crate) trait Curve {
    /// World point for the parameter `t`, if defined.
    fn eval(&mut self, t: f64) -> Option<[f64; 2]>;

    /// Number of distinct parameters at which the user function(s)
    /// were called.
    fn evaluations(&self) -> usize;

    fn hits(&self) -> usize;
}

/// Graph `t ↦ (t, f(t))` of a scalar function.
pub(crate) struct Graph<F> {
    pub f: F,
    pub cache: EvalCache<f64>,
}

impl<F, R> Curve for Graph<F>
where F: FnMut(f64) -> R, R: Evaluation<f64> {
    fn eval(&mut self, t: f64) -> Option<[f64; 2]> {
        let f = &mut self.f;
        self.cache.eval(t, |t| f(t).finite()).map(|y| [t, y])
    }
    fn evaluations(&self) -> usize { self.cache.evaluations() }
    fn hits(&self) -> usize { self.cache.hits() }
}

/// Image `t ↦ f(t)` of a parametric function.
pub(crate) struct Image<F> {
    pub f: F,
    pub cache: EvalCache<[f64; 2]>,
}

impl<F, R> Curve for Image<F>
where F: FnMut(f64) -> R, R: Evaluation<[f64; 2]> {
    fn eval(&mut self, t: f64) -> Option<[f64; 2]> {
        let f = &mut self.f;
        self.cache.eval(t, |t| f(t).finite())
    }
    fn evaluations(&self) -> usize { self.cache.evaluations() }
    fn hits(&self) -> usize { self.cache.hits() }
}

/// Parametric curve given by its two components, each with its own
/// cache.  `fy` is only called where `fx` is defined.
pub(crate) struct Components<Fx, Fy> {
    pub fx: Fx,
    pub fy: Fy,
    pub cache_x: EvalCache<f64>,
    pub cache_y: EvalCache<f64>,
}

impl<Fx, Fy, Rx, Ry> Curve for Components<Fx, Fy>
where Fx: FnMut(f64) -> Rx, Rx: Evaluation<f64>,
      Fy: FnMut(f64) -> Ry, Ry: Evaluation<f64> {
    fn eval(&mut self, t: f64) -> Option<[f64; 2]> {
        let fx = &mut self.fx;
        let x = self.cache_x.eval(t, |t| fx(t).finite())?;
        let fy = &mut self.fy;
        let y = self.cache_y.eval(t, |t| fy(t).finite())?;
        Some([x, y])
    }
    fn evaluations(&self) -> usize { self.cache_x.evaluations() }
    fn hits(&self) -> usize { self.cache_x.hits() + self.cache_y.hits() }
}

/// Cost of a sampling pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    /// Number of points of the first uniform pass.
    pub uniform: usize,
    /// Number of distinct parameters at which the function was called.
    pub evaluations: usize,
    /// Evaluations answered by the cache.
    pub cache_hits: usize,
    /// Sample counts of the uniform pass and of every fallback rung
    /// that was tried.
    pub attempts: Vec<usize>,
}

/// Outcome of an evaluation at `t`.
type Sample = (f64, Option<[f64; 2]>);

/// One sampling pass.
pub(crate) struct Sampler<'a, C> {
    pub curve: C,
    pub a: f64,
    pub b: f64,
    pub plan: Plan,
    /// Extra abscissae for the uniform pass, within [a, b].
    pub init: &'a [f64],
    pub jitter: Option<u64>,
    pub fallback: &'a [usize],
}

#[inline]
fn push(out: &mut Vec<Point>, (t, p): Sample) {
    if let Some([x, y]) = p {
        out.push(Point { t, x, y });
    }
}

impl<'a, C: Curve> Sampler<'a, C> {
    /// Run the pass.  The points are sorted by parameter, with no two
    /// points sharing a cache key.
    pub fn run(mut self) -> Result<(Vec<Point>, Stats)> {
        let n = self.plan.n.max(2);
        let mut stats = Stats { uniform: n, attempts: vec![n],
                                ..Default::default() };
        let uniform = self.uniform(n, self.jitter);
        let mut out: Vec<Point> = Vec::with_capacity(2 * uniform.len());
        for &s in &uniform { push(&mut out, s) }

        if out.len() >= 2 {
            if self.plan.mode == InteractionMode::Full {
                self.refine(&uniform, &mut out);
            }
        } else {
            self.fallback(n, &mut out, &mut stats.attempts);
        }

        stats.evaluations = self.curve.evaluations();
        stats.cache_hits = self.curve.hits();
        if out.is_empty() {
            warn!("no valid sample on [{}, {}] after {:?} attempts",
                  self.a, self.b, stats.attempts);
            return Err(Error::NoValidSamples { min: self.a, max: self.b,
                                               attempts: stats.attempts })
        }
        out.sort_unstable_by(|p, q| p.t.total_cmp(&q.t));
        out.dedup_by(|q, p| cache::same_key(p.t, q.t));
        debug!("sampled [{}, {}]: {:?} tier {:?}, {} uniform, \
                {} evaluations, {} cache hits, {} points",
               self.a, self.b, self.plan.mode, self.plan.tier, n,
               stats.evaluations, stats.cache_hits, out.len());
        Ok((out, stats))
    }

    /// Evaluate the curve at `n` evenly spaced parameters (plus the
    /// initial ones), sorted by parameter.
    fn uniform(&mut self, n: usize, jitter: Option<u64>) -> Vec<Sample> {
        let dt = (self.b - self.a) / (n - 1) as f64;
        let mut rng = jitter.map(StdRng::seed_from_u64);
        let mut ts = Vec::with_capacity(n + self.init.len());
        ts.push(self.a);
        for i in 1 .. n - 1 {
            let mut t = self.a + i as f64 * dt;
            if let Some(rng) = &mut rng {
                t += (rng.gen::<f64>() - 0.5) * 2. * JITTER * dt;
            }
            ts.push(t);
        }
        ts.push(self.b);
        ts.extend_from_slice(self.init);
        ts.sort_unstable_by(f64::total_cmp);
        ts.into_iter().map(|t| (t, self.curve.eval(t))).collect()
    }

    /// Try denser uniform passes until one of them gives at least two
    /// valid points or the evaluation budget is spent.
    fn fallback(&mut self, n0: usize, out: &mut Vec<Point>,
                attempts: &mut Vec<usize>) {
        let mut n_prev = n0;
        for &rung in self.fallback {
            if rung <= n_prev { continue }
            let budget = self.plan.max_evaluations
                .saturating_sub(self.curve.evaluations());
            let mut n = rung.min(budget);
            // Same spacing as the previous pass: nothing new to learn.
            if n == n_prev { n -= 1 }
            if n < MIN_RUNG { break }
            attempts.push(n);
            let mut valid = 0;
            for s in self.uniform(n, None) {
                if s.1.is_some() { valid += 1 }
                push(out, s);
            }
            trace!("fallback rung of {} points: {} valid", n, valid);
            if valid >= 2 { break }
            n_prev = n;
        }
    }

    /// Refine the intervals between the `uniform` samples, worst
    /// first, until none needs it or the evaluation budget is spent.
    fn refine(&mut self, uniform: &[Sample], out: &mut Vec<Point>) {
        let mut queue = BinaryHeap::new();
        for w in uniform.windows(2) {
            if w[1].0 - w[0].0 > self.plan.refine_gap
                && !self.consider(w[0], w[1], 0, out, &mut queue) {
                return
            }
        }
        let queued = queue.len();
        let mut split = 0;
        while let Some(iv) = queue.pop() {
            split += 1;
            if !(self.consider(iv.l, iv.m, iv.depth + 1, out, &mut queue)
                 && self.consider(iv.m, iv.r, iv.depth + 1, out, &mut queue)) {
                trace!("evaluation budget spent with {} intervals left",
                       queue.len());
                break
            }
        }
        trace!("{} uniform intervals queued, {} bisections", queued, split);
    }

    /// Evaluate the midpoint of [l, r] and queue the interval if it
    /// needs more points.  Return `false` if the budget is spent.
    fn consider(&mut self, l: Sample, r: Sample, depth: u32,
                out: &mut Vec<Point>, queue: &mut BinaryHeap<Pending>)
                -> bool {
        if self.curve.evaluations() >= self.plan.max_evaluations {
            return false
        }
        let w = r.0 - l.0;
        let tm = l.0 + 0.5 * w;
        let m = (tm, self.curve.eval(tm));
        push(out, m);
        if w <= self.plan.min_step || depth >= self.plan.max_depth {
            return true
        }
        let cost = self.cost(l, m, r);
        if cost > 1. { // NaN is not queued
            queue.push(Pending { cost, width: w, l, m, r, depth });
        }
        true
    }

    /// How badly [l, r] with midpoint `m` needs more points.  Above 1,
    /// it must be bisected.
    fn cost(&self, l: Sample, m: Sample, r: Sample) -> f64 {
        let w = r.0 - l.0;
        match (l.1, m.1, r.1) {
            (Some(pl), Some(pm), Some(pr)) => {
                let cx = 0.5 * (pl[0] + pr[0]);
                let cy = 0.5 * (pl[1] + pr[1]);
                let err_px = fast::hypot(pm[0] - cx, pm[1] - cy)
                    * self.plan.pixels_per_unit;
                let sub = |p: [f64; 2], q: [f64; 2]| [p[0] - q[0], p[1] - q[1]];
                let turn = fast::turn(sub(pm, pl), sub(pr, pm));
                (err_px / self.plan.error_px).max(turn / self.plan.max_turn)
            }
            // Nothing defined: keep searching, wide intervals first,
            // after the visible defects.
            (None, None, None) => 1. + w / (self.b - self.a),
            // Definedness changes inside the interval.
            _ => 1. + w / self.plan.min_step,
        }
    }
}

/// An interval waiting for bisection, ordered by cost then width.
#[derive(Debug, Clone, Copy)]
struct Pending {
    cost: f64,
    width: f64,
    l: Sample,
    m: Sample,
    r: Sample,
    depth: u32,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool { self.cmp(other) == Ordering::Equal }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost.total_cmp(&other.cost)
            .then(self.width.total_cmp(&other.width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::{DensityContext, DensityTable};

    fn graph<F: FnMut(f64) -> f64>(f: F) -> Graph<F> {
        Graph { f, cache: EvalCache::new() }
    }

    fn run<F>(f: F, a: f64, b: f64, ppu: f64, mode: InteractionMode)
              -> Result<(Vec<Point>, Stats)>
    where F: FnMut(f64) -> f64 {
        let table = DensityTable::default();
        let ctx = DensityContext::new(ppu, 800., 600.);
        let plan = table.plan(b - a, &ctx, mode);
        Sampler { curve: graph(f), a, b, plan, init: &[], jitter: None,
                  fallback: &table.fallback }.run()
    }

    #[test]
    fn refinement_concentrates_on_curvature() {
        let (pts, _) = run(|x| (x.abs() - 0.5).abs(), -1., 1., 2.,
                           InteractionMode::Full).unwrap();
        // 4 px covered: 16 uniform points; kinks at ±0.5 and 0 refined.
        let near_kink = pts.iter()
            .filter(|p| (p.t - 0.5).abs() < 0.05).count();
        let flat = pts.iter()
            .filter(|p| (p.t - 0.75).abs() < 0.05).count();
        assert!(near_kink > flat, "{} vs {}", near_kink, flat);
    }

    #[test]
    fn points_are_sorted_and_unique() {
        let (pts, _) = run(|x| (1. / x).sin(), -0.4, 0.4, 1000.,
                           InteractionMode::Full).unwrap();
        assert!(pts.windows(2).all(|w| w[0].t < w[1].t));
        assert!(pts.iter().all(|p| p.x == p.t && p.y.is_finite()));
    }

    #[test]
    fn one_sided_failure_is_resolved() {
        // Defined for x ≥ 0.3; the boundary gets refined.
        let (pts, _) = run(|x| (x - 0.3).sqrt(), 0., 1., 10.,
                           InteractionMode::Full).unwrap();
        let first = pts[0].t;
        assert!(first >= 0.3 && first < 0.3 + 1e-3, "{}", first);
    }

    #[test]
    fn defined_island_is_found() {
        // Defined on [0, 0.5] and on a 4e-3 wide island between two
        // uniform samples.
        let f = |x: f64| {
            if x <= 0.5 || (x - 0.7123).abs() < 2e-3 { x } else { f64::NAN }
        };
        let (pts, _) = run(f, 0., 1., 10., InteractionMode::Full).unwrap();
        let island = pts.iter().filter(|p| p.t > 0.6).count();
        assert!(island >= 2, "{} points on the island", island);
        assert!(pts.iter().all(|p| p.t <= 0.5 || (p.t - 0.7123).abs() < 2e-3));
    }

    #[test]
    fn budget_is_shared_along_the_domain() {
        let table = DensityTable::default();
        let ppu = 100.;
        let (_, tier) = table.tier(ppu).unwrap();
        for c in [-11., 11.] {
            let f = move |x: f64| (-(200. * (x - c)).powi(2)).exp();
            let (pts, stats) = run(f, -12., 12., ppu, InteractionMode::Full)
                .unwrap();
            assert_eq!(stats.uniform, tier.max_points);
            assert!(stats.evaluations <= tier.max_evaluations);
            let worst = pts.windows(2)
                .filter(|w| (w[0].t - c).abs() < 0.05)
                .map(|w| {
                    let tm = 0.5 * (w[0].t + w[1].t);
                    (f(tm) - 0.5 * (w[0].y + w[1].y)).abs() * ppu
                })
                .fold(0., f64::max);
            assert!(worst <= tier.error_px, "peak at {}: {} px", c, worst);
        }
    }

    #[test]
    fn ladder_finds_sparse_points() {
        // Only defined on a tiny interval missed by the first pass.
        let f = |x: f64| if (x - 0.1234).abs() < 2e-3 { 1. } else { f64::NAN };
        let (pts, stats) = run(f, 0., 1., 10., InteractionMode::Full)
            .unwrap();
        assert!(!pts.is_empty());
        assert!(stats.attempts.len() >= 2, "{:?}", stats.attempts);
    }

    #[test]
    fn total_failure() {
        let e = run(|_| f64::NAN, 0., 1., 10., InteractionMode::Full)
            .unwrap_err();
        match e {
            Error::NoValidSamples { min, max, attempts } => {
                assert_eq!((min, max), (0., 1.));
                assert!(attempts.len() > 1);
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn live_cap_holds_through_the_ladder() {
        let table = DensityTable::default();
        let mut calls = 0;
        let e = run(|_| { calls += 1; f64::NAN }, 0., 1e6, 100.,
                    InteractionMode::Live).unwrap_err();
        assert!(calls <= table.live.max_evaluations, "{} calls", calls);
        match e {
            Error::NoValidSamples { attempts, .. } =>
                assert!(attempts.len() >= 2, "{:?}", attempts),
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn jitter_is_reproducible() {
        let table = DensityTable::default();
        let ctx = DensityContext::default();
        let plan = table.plan(10., &ctx, InteractionMode::Live);
        let pass = |seed| {
            Sampler { curve: graph(f64::sin), a: 0., b: 10., plan,
                      init: &[], jitter: Some(seed),
                      fallback: &table.fallback }.run().unwrap().0
        };
        assert_eq!(pass(7), pass(7));
        assert_ne!(pass(7), pass(8));
        let p = pass(7);
        assert_eq!((p[0].t, p[p.len() - 1].t), (0., 10.));
    }

    #[test]
    fn components_share_nothing() {
        let table = DensityTable::default();
        let plan = table.plan(1., &DensityContext::default(),
                              InteractionMode::Live);
        let mut y_calls = 0;
        let curve = Components {
            fx: |t: f64| if t < 0.5 { f64::NAN } else { t },
            fy: |t: f64| { y_calls += 1; t * t },
            cache_x: EvalCache::new(), cache_y: EvalCache::new() };
        let (pts, stats) = Sampler { curve, a: 0., b: 1., plan, init: &[],
                                     jitter: None,
                                     fallback: &table.fallback }
            .run().unwrap();
        assert_eq!(stats.evaluations, plan.n);
        assert_eq!(y_calls, pts.len());
    }
}
