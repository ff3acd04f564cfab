//! Drawing segments as smooth curves.
//!
//! Each segment is drawn as a Catmull-Rom spline through its screen
//! points, converted to cubic Bézier pieces.  The drawing surface is
//! anything implementing [`Surface`].

use std::{fmt::{self, Display, Formatter},
          io::{self, Write}};
use rgb::RGB8;
use crate::{BoundingBox, Point,
            classify::{RenderPath, Segment}};

/// A drawing surface accepting path commands (in screen coordinates).
pub trait Surface {
    /// Start a new sub-path at `p`.
    fn move_to(&mut self, p: [f64; 2]);
    fn line_to(&mut self, p: [f64; 2]);
    /// Cubic Bézier from the current point to `p` with control points
    /// `c1` and `c2`.
    fn curve_to(&mut self, c1: [f64; 2], c2: [f64; 2], p: [f64; 2]);
}

/// Draw a spline passing through all `points`, in order.
///
/// Each piece `p1 → p2` is a cubic with controls `p1 + (p2 - p0)/6`
/// and `p2 - (p3 - p1)/6` where `p0`, `p3` are the neighbours (the
/// endpoints are duplicated at the ends).  Two points give a line,
/// one point a zero-length path, none nothing.
pub fn draw_spline<S: Surface + ?Sized>(s: &mut S, points: &[[f64; 2]]) {
    match points {
        [] => (),
        [p] => { s.move_to(*p); s.line_to(*p) }
        [p1, p2] => { s.move_to(*p1); s.line_to(*p2) }
        _ => {
            let n = points.len();
            s.move_to(points[0]);
            for i in 0 .. n - 1 {
                let p0 = points[i.saturating_sub(1)];
                let p1 = points[i];
                let p2 = points[i + 1];
                let p3 = points[(i + 2).min(n - 1)];
                let c1 = [p1[0] + (p2[0] - p0[0]) / 6.,
                          p1[1] + (p2[1] - p0[1]) / 6.];
                let c2 = [p2[0] - (p3[0] - p1[0]) / 6.,
                          p2[1] - (p3[1] - p1[1]) / 6.];
                s.curve_to(c1, c2, p2);
            }
        }
    }
}

impl RenderPath {
    /// Draw every segment on `s` as a separate sub-path.
    pub fn render<S: Surface + ?Sized>(&self, s: &mut S) {
        for seg in &self.segments {
            draw_spline(s, seg.screen());
        }
    }

    /// Smallest box containing all screen positions.  If the path is
    /// empty, the "min" fields are +∞ and the "max" ones -∞.
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bb = BoundingBox::EMPTY;
        for &p in self.screen().flatten() {
            bb.include(p);
        }
        bb
    }
}

/// A path command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCmd {
    MoveTo([f64; 2]),
    LineTo([f64; 2]),
    CubicTo { c1: [f64; 2], c2: [f64; 2], end: [f64; 2] },
}

/// Recording surface.  Its `Display` is SVG path data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    cmds: Vec<PathCmd>,
}

impl Path {
    pub fn new() -> Self { Self::default() }

    pub fn commands(&self) -> &[PathCmd] { &self.cmds }

    pub fn is_empty(&self) -> bool { self.cmds.is_empty() }

    /// Points the path passes through: sub-path starts and the ends
    /// of lines and curves.
    pub fn anchors(&self) -> impl Iterator<Item = [f64; 2]> + '_ {
        self.cmds.iter().map(|c| match *c {
            PathCmd::MoveTo(p) | PathCmd::LineTo(p) => p,
            PathCmd::CubicTo { end, .. } => end,
        })
    }
}

impl Surface for Path {
    fn move_to(&mut self, p: [f64; 2]) { self.cmds.push(PathCmd::MoveTo(p)) }

    fn line_to(&mut self, p: [f64; 2]) { self.cmds.push(PathCmd::LineTo(p)) }

    fn curve_to(&mut self, c1: [f64; 2], c2: [f64; 2], end: [f64; 2]) {
        self.cmds.push(PathCmd::CubicTo { c1, c2, end })
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, c) in self.cmds.iter().enumerate() {
            if i > 0 { f.write_str(" ")? }
            match c {
                PathCmd::MoveTo([x, y]) => write!(f, "M{} {}", x, y)?,
                PathCmd::LineTo([x, y]) => write!(f, "L{} {}", x, y)?,
                PathCmd::CubicTo { c1, c2, end } =>
                    write!(f, "C{} {} {} {} {} {}",
                           c1[0], c1[1], c2[0], c2[1], end[0], end[1])?,
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////
//
// Clipping

/// A point with its screen position.
#[derive(Debug, Clone, Copy)]
struct Node {
    p: Point,
    s: [f64; 2],
}

impl Node {
    #[inline]
    fn lerp(&self, other: &Node, r: f64) -> Node {
        let l = |a: f64, b: f64| a + r * (b - a);
        Node { p: Point { t: l(self.p.t, other.p.t),
                          x: l(self.p.x, other.p.x),
                          y: l(self.p.y, other.p.y) },
               s: [l(self.s[0], other.s[0]), l(self.s[1], other.s[1])] }
    }
}

/// Intersection of a segment with the bounding box.
#[derive(Debug)]
enum Intersection {
    Empty,
    Pt(Node),
    Seg(Node, Node),
}

/// Assume `n0` ∈ `bb` and `n1` ∉ `bb`.  Return the point where the
/// segment leaves `bb`, unless it is `n0` itself.
fn exit(n0: &Node, n1: &Node, bb: &BoundingBox) -> Option<Node> {
    let mut r = 1.; // r ∈ [0, 1]
    let dx = n1.s[0] - n0.s[0]; // May be 0.
    let rx = (if dx >= 0. { bb.xmax } else { bb.xmin } - n0.s[0]) / dx;
    if rx < r { r = rx }
    let dy = n1.s[1] - n0.s[1]; // May be 0.
    let ry = (if dy >= 0. { bb.ymax } else { bb.ymin } - n0.s[1]) / dy;
    if ry < r { r = ry }
    if r <= 1e-14 { None } else { Some(n0.lerp(n1, r)) }
}

/// Assume `n0`, `n1` ∉ `bb`.  Return the part of the segment inside
/// `bb`, preserving its direction.
fn cross(n0: &Node, n1: &Node, bb: &BoundingBox) -> Intersection {
    let mut r0 = 0.;
    let mut r1 = 1.;
    for (d, lo, hi, o) in [(n1.s[0] - n0.s[0], bb.xmin, bb.xmax, n0.s[0]),
                           (n1.s[1] - n0.s[1], bb.ymin, bb.ymax, n0.s[1])] {
        // a ≤ b, or NaN if on a boundary line parallel to the move.
        let (a, b) = if d >= 0. { ((lo - o) / d, (hi - o) / d) }
                     else { ((hi - o) / d, (lo - o) / d) };
        if a > r1 || b < r0 { return Intersection::Empty }
        if a > r0 { r0 = a }
        if b < r1 { r1 = b }
    }
    if r0 < r1 {
        Intersection::Seg(n0.lerp(n1, r0), n0.lerp(n1, r1))
    } else if r0 == r1 {
        Intersection::Pt(n0.lerp(n1, r0))
    } else {
        Intersection::Empty
    }
}

impl RenderPath {
    /// Return the path cut to the screen box `bb`.  Segments crossing
    /// the boundary get extra points at the crossings and are split
    /// where they leave the box; parts outside are dropped.
    ///
    /// A box with an empty interior (including [`BoundingBox::EMPTY`]
    /// and boxes with NaN bounds) yields an empty path.
    #[must_use]
    pub fn clip(&self, bb: BoundingBox) -> RenderPath {
        let mut segments = vec![];
        if bb.is_empty() {
            return RenderPath { segments, color: self.color }
        }
        for seg in &self.segments {
            clip_segment(seg, &bb, &mut segments);
        }
        RenderPath { segments, color: self.color }
    }
}

fn clip_segment(seg: &Segment, bb: &BoundingBox, out: &mut Vec<Segment>) {
    let mut nodes = seg.points().iter().zip(seg.screen())
        .map(|(&p, &s)| Node { p, s });
    let Some(mut n0) = nodes.next() else { return };
    let mut cur = Segment::default();
    let mut inside0 = bb.contains(n0.s);
    if inside0 { cur.push(n0.p, n0.s) }
    let mut flush = |cur: &mut Segment| {
        if !cur.is_empty() { out.push(std::mem::take(cur)) }
    };
    for n1 in nodes {
        let inside1 = bb.contains(n1.s);
        match (inside0, inside1) {
            (true, true) => cur.push(n1.p, n1.s),
            (true, false) => {
                if let Some(q) = exit(&n0, &n1, bb) { cur.push(q.p, q.s) }
                flush(&mut cur);
            }
            (false, true) => {
                if let Some(q) = exit(&n1, &n0, bb) { cur.push(q.p, q.s) }
                cur.push(n1.p, n1.s);
            }
            (false, false) => match cross(&n0, &n1, bb) {
                Intersection::Seg(q0, q1) => {
                    cur.push(q0.p, q0.s);
                    cur.push(q1.p, q1.s);
                    flush(&mut cur);
                }
                Intersection::Pt(q) => {
                    cur.push(q.p, q.s);
                    flush(&mut cur);
                }
                Intersection::Empty => (),
            },
        }
        n0 = n1;
        inside0 = inside1;
    }
    flush(&mut cur);
}

////////////////////////////////////////////////////////////////////////
//
// PGF output

/// LaTeX output of a [`RenderPath`].  The screen `y` axis points
/// down, so it is negated to keep the picture upright.
///
/// # Example
///
/// ```
/// use curve_sampling::RenderPath;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let path = RenderPath::from([[0., 0.], [1., 1.], [2., 0.]]);
/// let mut tex = vec![];
/// path.latex().write(&mut tex)?;
/// assert!(String::from_utf8(tex)?.contains("\\pgfpathcurveto"));
/// # Ok(()) }
/// ```
pub struct LaTeX<'a> {
    path: &'a RenderPath,
    n: usize,
    color: Option<RGB8>,
}

impl<'a> LaTeX<'a> {
    #[inline]
    fn new(path: &'a RenderPath) -> Self {
        Self { path, n: 20_000, color: path.color }
    }

    /// Set the maximum number of commands of a PGF path to `n`.  Longer
    /// segments are drawn as several PGF paths.  Default: 20_000.
    pub fn n(&mut self, n: usize) -> &mut Self {
        self.n = n.max(1);
        self
    }

    /// Set the color of the curve to `color`.  Defaults to the colour
    /// hint of the plot; if none, the active LaTeX color is used.
    pub fn color(&mut self, color: RGB8) -> &mut Self {
        self.color = Some(color);
        self
    }

    fn write_cmds(&self, f: &mut impl Write, cmds: &[PathCmd])
                  -> Result<(), io::Error> {
        let mut n = 0;
        for c in cmds {
            n += 1;
            match *c {
                PathCmd::MoveTo([x, y]) => {
                    writeln!(f, "\\pgfpathmoveto{{\\pgfpointxy\
                                 {{{:.16}}}{{{:.16}}}}}", x, -y)?;
                    n = 0;
                }
                PathCmd::LineTo([x, y]) =>
                    writeln!(f, "\\pgfpathlineto{{\\pgfpointxy\
                                 {{{:.16}}}{{{:.16}}}}}", x, -y)?,
                PathCmd::CubicTo { c1, c2, end } =>
                    writeln!(f, "\\pgfpathcurveto\
                                 {{\\pgfpointxy{{{:.16}}}{{{:.16}}}}}\
                                 {{\\pgfpointxy{{{:.16}}}{{{:.16}}}}}\
                                 {{\\pgfpointxy{{{:.16}}}{{{:.16}}}}}",
                             c1[0], -c1[1], c2[0], -c2[1],
                             end[0], -end[1])?,
            }
            if n >= self.n {
                let [x, y] = match *c {
                    PathCmd::MoveTo(p) | PathCmd::LineTo(p) => p,
                    PathCmd::CubicTo { end, .. } => end,
                };
                writeln!(f, "\\pgfusepath{{stroke}}\n\
                             \\pgfpathmoveto{{\\pgfpointxy\
                             {{{:.16}}}{{{:.16}}}}}", x, -y)?;
                n = 0;
            }
        }
        Ok(())
    }

    /// Write the path to `f` as PGF/TikZ commands.
    pub fn write(&self, f: &mut impl Write) -> Result<(), io::Error> {
        writeln!(f, "% Written by the Rust curve_sampling crate.")?;
        writeln!(f, "\\begin{{pgfscope}}")?;
        if let Some(RGB8 { r, g, b }) = self.color {
            writeln!(f, "\\definecolor{{RustCurveSamplingColor}}{{RGB}}\
                         {{{},{},{}}}\n\
                         \\pgfsetstrokecolor{{RustCurveSamplingColor}}",
                     r, g, b)?;
        }
        for seg in self.path.segments() {
            let mut p = Path::new();
            draw_spline(&mut p, seg.screen());
            self.write_cmds(f, p.commands())?;
            writeln!(f, "\\pgfusepath{{stroke}}")?;
        }
        writeln!(f, "\\end{{pgfscope}}")
    }
}

impl RenderPath {
    /// Write the path using PGF/TikZ commands.
    pub fn latex(&self) -> LaTeX<'_> { LaTeX::new(self) }
}
