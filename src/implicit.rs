//! Implicit curves `f(x, y) = 0` by marching squares.

use std::collections::HashMap;
use log::debug;
use rgb::RGB8;
use crate::{
    BoundingBox, Point, Sampling,
    cache::Evaluation,
    classify::{RenderPath, Segment},
    density::{DensityContext, InteractionMode},
    error::Result,
    transform::Transform,
};

/// Grid cell size, in pixels, for each interaction mode.
const CELL_PX_FULL: f64 = 4.;
const CELL_PX_LIVE: f64 = 12.;
/// Bound on the number of cells along one axis.
const MAX_CELLS: usize = 1024;

/// Options for sampling an implicit curve.  See [`Sampling::implicit`].
pub struct Implicit<F> {
    f: F,
    bb: BoundingBox,
    ctx: DensityContext,
    mode: InteractionMode,
    color: Option<RGB8>,
}

impl Sampling {
    /// Create a sampling of the curve `f(x, y) = 0` inside the world
    /// box `bb`.
    ///
    /// # Example
    ///
    /// ```
    /// use curve_sampling::{Affine, BoundingBox, Sampling};
    /// # fn main() -> Result<(), curve_sampling::Error> {
    /// let bb = BoundingBox { xmin: -2., xmax: 2., ymin: -2., ymax: 2. };
    /// let tr = Affine::fit(-2., 2., -2., 2., 400., 400.);
    /// let path = Sampling::implicit(|x, y| x * x + y * y - 1., bb)
    ///     .build(&tr)?;
    /// assert_eq!(path.segments().len(), 1);
    /// # Ok(()) }
    /// ```
    pub fn implicit<F, R>(f: F, bb: BoundingBox) -> Implicit<F>
    where F: FnMut(f64, f64) -> R, R: Evaluation<f64> {
        Implicit { f, bb, ctx: DensityContext::default(),
                   mode: InteractionMode::Full, color: None }
    }
}

/// Identifier of a grid edge: the horizontal or vertical edge starting
/// at a grid node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Edge {
    H(usize, usize),
    V(usize, usize),
}

impl<F> Implicit<F> {
    /// Set the view.  The grid resolution follows its zoom level.
    pub fn density(mut self, ctx: DensityContext) -> Self {
        self.ctx = ctx;
        self
    }

    pub fn mode(mut self, mode: InteractionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn color(mut self, color: RGB8) -> Self {
        self.color = Some(color);
        self
    }
}

impl<F, R> Implicit<F>
where F: FnMut(f64, f64) -> R, R: Evaluation<f64> {
    /// Grid dimensions (cells along x and y).
    fn grid(&self) -> (usize, usize) {
        let cell_px = match self.mode {
            InteractionMode::Full => CELL_PX_FULL,
            InteractionMode::Live => CELL_PX_LIVE,
        };
        let cell = cell_px / self.ctx.pixels_per_unit;
        let cells = |len: f64| {
            let n = (len / cell).ceil();
            if n >= MAX_CELLS as f64 { MAX_CELLS } else { (n as usize).max(2) }
        };
        (cells(self.bb.xmax - self.bb.xmin), cells(self.bb.ymax - self.bb.ymin))
    }

    /// Return the curve as polylines mapped to the screen with `tr`.
    /// Closed components repeat their first point.  A curve that does
    /// not meet the box gives an empty path.
    pub fn build(&mut self, tr: &impl Transform) -> Result<RenderPath> {
        let bb = self.bb;
        crate::error::check_domain(bb.xmin, bb.xmax)?;
        crate::error::check_domain(bb.ymin, bb.ymax)?;
        self.ctx.check()?;
        let (nx, ny) = self.grid();
        let dx = (bb.xmax - bb.xmin) / nx as f64;
        let dy = (bb.ymax - bb.ymin) / ny as f64;
        let node = |i: usize, j: usize| {
            [bb.xmin + i as f64 * dx, bb.ymin + j as f64 * dy]
        };
        let mut values = Vec::with_capacity((nx + 1) * (ny + 1));
        for j in 0 ..= ny {
            for i in 0 ..= nx {
                let [x, y] = node(i, j);
                values.push((self.f)(x, y).finite());
            }
        }
        let v = |i: usize, j: usize| values[j * (nx + 1) + i];

        // Crossing point on an edge, if the sign changes along it.
        let mut crossings: HashMap<Edge, [f64; 2]> = HashMap::new();
        let mut crossing = |e: Edge| -> Option<[f64; 2]> {
            if let Some(&p) = crossings.get(&e) { return Some(p) }
            let ((i0, j0), (i1, j1)) = match e {
                Edge::H(i, j) => ((i, j), (i + 1, j)),
                Edge::V(i, j) => ((i, j), (i, j + 1)),
            };
            let (v0, v1) = (v(i0, j0)?, v(i1, j1)?);
            if (v0 < 0.) == (v1 < 0.) { return None }
            let r = v0 / (v0 - v1);
            let (p0, p1) = (node(i0, j0), node(i1, j1));
            let p = [p0[0] + r * (p1[0] - p0[0]), p0[1] + r * (p1[1] - p0[1])];
            crossings.insert(e, p);
            Some(p)
        };

        let mut pieces: Vec<(Edge, Edge)> = vec![];
        for j in 0 .. ny {
            for i in 0 .. nx {
                let corners = [v(i, j), v(i + 1, j), v(i + 1, j + 1), v(i, j + 1)];
                let Some(c0) = corners[0] else { continue };
                if corners.iter().any(|c| c.is_none()) { continue }
                // Edges: bottom, right, top, left.
                let edges = [Edge::H(i, j), Edge::V(i + 1, j),
                             Edge::H(i, j + 1), Edge::V(i, j)];
                let crossed: Vec<Edge> = edges.iter().copied()
                    .filter(|&e| crossing(e).is_some()).collect();
                match crossed.len() {
                    2 => pieces.push((crossed[0], crossed[1])),
                    4 => {
                        // Saddle: decide with the value at the centre.
                        let [x, y] = node(i, j);
                        let centre = (self.f)(x + 0.5 * dx, y + 0.5 * dy)
                            .finite()
                            .unwrap_or_else(|| {
                                corners.iter().flatten().sum::<f64>() / 4.
                            });
                        if (centre < 0.) == (c0 < 0.) {
                            pieces.push((edges[0], edges[1]));
                            pieces.push((edges[2], edges[3]));
                        } else {
                            pieces.push((edges[3], edges[0]));
                            pieces.push((edges[1], edges[2]));
                        }
                    }
                    _ => (),
                }
            }
        }

        let segments = chain(&pieces).into_iter().map(|edges| {
            let mut seg = Segment::default();
            for (k, e) in edges.iter().enumerate() {
                if let Some(&[x, y]) = crossings.get(e) {
                    seg.push(Point { t: k as f64, x, y }, tr.to_screen([x, y]));
                }
            }
            seg
        }).filter(|s| !s.is_empty()).collect::<Vec<_>>();
        debug!("implicit curve on {}×{} grid: {} pieces, {} polylines",
               nx, ny, pieces.len(), segments.len());
        Ok(RenderPath::new(segments, self.color))
    }
}

/// Link the pieces sharing an edge into polylines (lists of edges).
fn chain(pieces: &[(Edge, Edge)]) -> Vec<Vec<Edge>> {
    let mut at: HashMap<Edge, Vec<usize>> = HashMap::new();
    for (k, &(a, b)) in pieces.iter().enumerate() {
        at.entry(a).or_default().push(k);
        at.entry(b).or_default().push(k);
    }
    let mut used = vec![false; pieces.len()];
    // Follow unused pieces from edge `e`, appending the edges reached.
    let walk = |mut e: Edge, stop: Edge, line: &mut Vec<Edge>,
                used: &mut Vec<bool>| {
        loop {
            let next = at.get(&e)
                .and_then(|ks| ks.iter().copied().find(|&k| !used[k]));
            let Some(k) = next else { return false };
            used[k] = true;
            let (a, b) = pieces[k];
            e = if a == e { b } else { a };
            line.push(e);
            if e == stop { return true }
        }
    };
    let mut lines = vec![];
    for k in 0 .. pieces.len() {
        if used[k] { continue }
        used[k] = true;
        let (a, b) = pieces[k];
        let mut fwd = vec![a, b];
        let closed = walk(b, a, &mut fwd, &mut used);
        if !closed {
            let mut back = vec![];
            walk(a, b, &mut back, &mut used);
            back.reverse();
            back.extend(fwd);
            fwd = back;
        }
        lines.push(fwd);
    }
    lines
}
