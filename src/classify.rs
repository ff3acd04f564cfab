//! Splitting a sampled point list into continuous segments.
//!
//! Breaking a legitimate curve is far more visible than drawing one
//! spurious steep line, so the rules only fire on blatant jumps.

use log::trace;
use rgb::RGB8;
use crate::{Point, transform::Transform};

/// Constants of the [`Classifier`].  Jumps are measured in screen
/// pixels; thresholds grow with the zoom level as `max(px, units ×
/// pixels_per_unit)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Vertical jump (any sign pattern) regarded as an asymptote.
    pub asymptote_px: f64,
    pub asymptote_units: f64,
    /// Vertical jump regarded as a pole when the value changes sign
    /// while the domain crosses zero.
    pub sign_jump_px: f64,
    pub sign_jump_units: f64,
    /// A domain gap larger than this multiple of the nominal spacing
    /// (domain range / number of samples) is a hole in the sampling.
    pub gap_multiple: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds { asymptote_px: 4_000.,  asymptote_units: 40.,
                     sign_jump_px: 400.,  sign_jump_units: 4.,
                     gap_multiple: 25. }
    }
}

/// Decides whether two consecutive samples are connected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classifier {
    asymptote_px: f64,
    sign_jump_px: f64,
    max_gap: f64,
}

impl Classifier {
    /// Classifier for `samples` points spread over the domain
    /// [`t_min`, `t_max`] viewed with `pixels_per_unit` pixels per unit.
    pub fn new(th: &Thresholds, pixels_per_unit: f64, t_min: f64, t_max: f64,
               samples: usize) -> Self {
        let spacing = (t_max - t_min).abs() / samples.max(1) as f64;
        Classifier {
            asymptote_px: th.asymptote_px
                .max(th.asymptote_units * pixels_per_unit),
            sign_jump_px: th.sign_jump_px
                .max(th.sign_jump_units * pixels_per_unit),
            max_gap: th.gap_multiple * spacing,
        }
    }

    /// Return `true` if the path must be cut between `prev` (a point
    /// and its screen position) and `p` (with screen position `s`).
    pub fn is_break(&self, prev: Option<(&Point, [f64; 2])>, p: &Point,
                    s: [f64; 2]) -> bool {
        if !(p.t.is_finite() && p.x.is_finite() && p.y.is_finite()
             && s[0].is_finite() && s[1].is_finite()) {
            return true
        }
        let Some((p0, s0)) = prev else { return false };
        let jump = (s[1] - s0[1]).abs();
        if jump > self.asymptote_px { return true }
        if (p.t - p0.t).abs() > self.max_gap { return true }
        let sign_change = (p0.y < 0. && p.y > 0.) || (p0.y > 0. && p.y < 0.);
        let crosses_zero = (p0.t < 0.) != (p.t < 0.);
        sign_change && crosses_zero && jump > self.sign_jump_px
    }

    /// Cut `points` (in traversal order) into continuous segments,
    /// mapping them to the screen with `tr`.  Non-finite points are
    /// dropped.
    pub fn split(&self, points: &[Point], tr: &impl Transform)
                 -> Vec<Segment> {
        let mut segments = vec![];
        let mut cur = Segment::default();
        for p in points {
            let s = tr.to_screen([p.x, p.y]);
            let prev = cur.last();
            if self.is_break(prev, p, s) {
                if !cur.is_empty() {
                    segments.push(std::mem::take(&mut cur));
                }
                if !(s[0].is_finite() && s[1].is_finite()
                     && p.x.is_finite() && p.y.is_finite()) {
                    continue
                }
            }
            cur.push(*p, s);
        }
        if !cur.is_empty() { segments.push(cur) }
        segments
    }
}

/// Continuous piece of a curve: the sampled points and their screen
/// positions, in traversal order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segment {
    points: Vec<Point>,
    screen: Vec<[f64; 2]>,
}

impl Segment {
    #[inline]
    pub(crate) fn push(&mut self, p: Point, s: [f64; 2]) {
        self.points.push(p);
        self.screen.push(s);
    }

    fn last(&self) -> Option<(&Point, [f64; 2])> {
        self.points.last().zip(self.screen.last().copied())
    }

    /// World points (parameter, x, y).
    pub fn points(&self) -> &[Point] { &self.points }

    /// Screen positions of [`Segment::points`].
    pub fn screen(&self) -> &[[f64; 2]] { &self.screen }

    pub fn len(&self) -> usize { self.points.len() }

    pub fn is_empty(&self) -> bool { self.points.is_empty() }
}

/// The segments of one plot, ready to be drawn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderPath {
    pub(crate) segments: Vec<Segment>,
    pub(crate) color: Option<RGB8>,
}

impl RenderPath {
    pub(crate) fn new(segments: Vec<Segment>, color: Option<RGB8>) -> Self {
        trace!("render path of {} segment(s)", segments.len());
        RenderPath { segments, color }
    }

    pub fn segments(&self) -> &[Segment] { &self.segments }

    /// Colour hint of the plot, if any.
    pub fn color(&self) -> Option<RGB8> { self.color }

    pub fn is_empty(&self) -> bool { self.segments.is_empty() }

    /// Iterate on the screen positions of all segments.
    pub fn screen(&self) -> impl Iterator<Item = &[[f64; 2]]> {
        self.segments.iter().map(|s| s.screen())
    }
}

impl<T> From<T> for RenderPath
where T: IntoIterator<Item = [f64; 2]> {
    /// Path whose screen positions are the given points (world and
    /// screen coordinates coincide, the parameter is the index).
    /// Points with non-finite coordinates are interpreted as cuts.
    fn from(points: T) -> Self {
        let mut segments = vec![];
        let mut cur = Segment::default();
        for (i, [x, y]) in points.into_iter().enumerate() {
            if x.is_finite() && y.is_finite() {
                cur.push(Point { t: i as f64, x, y }, [x, y]);
            } else if !cur.is_empty() {
                segments.push(std::mem::take(&mut cur));
            }
        }
        if !cur.is_empty() { segments.push(cur) }
        RenderPath { segments, color: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Affine;

    fn pt(t: f64, y: f64) -> Point { Point { t, x: t, y } }

    fn classifier(ppu: f64, samples: usize) -> Classifier {
        Classifier::new(&Thresholds::default(), ppu, -1., 1., samples)
    }

    #[test]
    fn start_and_non_finite() {
        let c = classifier(100., 100);
        assert!(!c.is_break(None, &pt(0.5, 1e300), [0., 0.]));
        assert!(c.is_break(None, &pt(0.5, f64::NAN), [0., 0.]));
        let p0 = pt(0.5, 1.);
        assert!(c.is_break(Some((&p0, [0., 0.])), &pt(0.51, 1.),
                           [1., f64::INFINITY]));
    }

    #[test]
    fn asymptote_jump() {
        let c = classifier(100., 1000);
        let p0 = pt(0.1, 0.);
        // 40 units × 100 px = 4000 px.
        assert!(!c.is_break(Some((&p0, [0., 0.])), &pt(0.101, 1.),
                            [0., 3_999.]));
        assert!(c.is_break(Some((&p0, [0., 0.])), &pt(0.101, 1.),
                           [0., 4_001.]));
    }

    #[test]
    fn sign_change_across_zero() {
        let c = classifier(10., 1000);
        let p0 = pt(-0.001, -50.);
        let s0 = [0., 500.];
        // Pole at 0: jump of 1000 px > 400 px.
        assert!(c.is_break(Some((&p0, s0)), &pt(0.001, 50.), [0., -500.]));
        // Same jump without crossing zero in the domain.
        let p1 = pt(0.2, -50.);
        assert!(!c.is_break(Some((&p1, s0)), &pt(0.202, 50.), [0., -500.]));
        // Crossing zero with a small jump (e.g. x³).
        assert!(!c.is_break(Some((&p0, s0)), &pt(0.001, 50.), [0., 200.]));
    }

    #[test]
    fn sampling_hole() {
        let c = classifier(10., 100); // nominal spacing 0.02
        let p0 = pt(-0.5, 0.);
        assert!(!c.is_break(Some((&p0, [0., 0.])), &pt(-0.1, 0.), [4., 0.]));
        assert!(c.is_break(Some((&p0, [0., 0.])), &pt(0.2, 0.), [7., 0.]));
    }

    #[test]
    fn split_drops_invalid_points() {
        let tr = Affine::centered([0., 0.], 10., 100., 100.);
        let pts = [pt(-0.2, 1.), pt(-0.1, f64::NAN), pt(0., 1.),
                   pt(0.1, 2.)];
        let c = classifier(10., 20);
        let segs = c.split(&pts, &tr);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].len(), 1);
        assert_eq!(segs[1].points(), &[pt(0., 1.), pt(0.1, 2.)]);
        assert_eq!(segs[1].screen()[0], [50., 40.]);
    }

    #[test]
    fn from_points_with_cuts() {
        let p = RenderPath::from([[0., 0.], [1., 1.], [f64::NAN, 0.],
                                  [f64::NAN, 1.], [2., 2.]]);
        assert_eq!(p.segments().len(), 2);
        assert_eq!(p.segments()[1].screen(), &[[2., 2.]]);
        assert_eq!(p.segments()[1].points()[0].t, 4.);
    }
}
