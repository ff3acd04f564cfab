//! Mapping from world (domain) coordinates to screen pixels.
//!
//! The pipeline only needs to know where a world point lands on the
//! screen.  How the host nests frames or stores its pan/zoom state is
//! none of its business, so any `Fn([f64; 2]) -> [f64; 2]` will do.

use crate::density::DensityContext;

/// Step (in world units, relative to the magnitude of the point) used
/// to measure the local scale of a transform.
const SCALE_STEP: f64 = 1e-3;

pub trait Transform {
    /// Screen position of the world point `p`.
    fn to_screen(&self, p: [f64; 2]) -> [f64; 2];

    /// Screen pixels per world unit around `at`, averaged over both
    /// axes.  Measured by mapping two nearby points.
    fn pixels_per_unit(&self, at: [f64; 2]) -> f64 {
        let h = SCALE_STEP * at[0].abs().max(at[1].abs()).max(1.);
        let s0 = self.to_screen(at);
        let sx = self.to_screen([at[0] + h, at[1]]);
        let sy = self.to_screen([at[0], at[1] + h]);
        let dx = (sx[0] - s0[0]).hypot(sx[1] - s0[1]);
        let dy = (sy[0] - s0[0]).hypot(sy[1] - s0[1]);
        0.5 * (dx + dy) / h
    }

    /// Density context for a canvas of the given size, with the zoom
    /// level measured at `at`.
    fn density(&self, at: [f64; 2], canvas_width: f64,
               canvas_height: f64) -> DensityContext {
        DensityContext::new(self.pixels_per_unit(at),
                            canvas_width, canvas_height)
    }
}

impl<F> Transform for F
where F: Fn([f64; 2]) -> [f64; 2] {
    #[inline]
    fn to_screen(&self, p: [f64; 2]) -> [f64; 2] { self(p) }
}

/// Per-axis affine map `s = scale * (p - origin)`, with the screen
/// `y` axis pointing down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    /// World point displayed at the top-left corner of the canvas.
    pub origin: [f64; 2],
    /// Pixels per world unit along each axis (both positive).
    pub scale: [f64; 2],
}

impl Affine {
    /// Transform showing the world box [`xmin`, `xmax`] × [`ymin`,
    /// `ymax`] on a `width` × `height` canvas.
    pub fn fit(xmin: f64, xmax: f64, ymin: f64, ymax: f64,
               width: f64, height: f64) -> Self {
        Affine { origin: [xmin, ymax],
                 scale: [width / (xmax - xmin), height / (ymax - ymin)] }
    }

    /// Same zoom on both axes; `center` lands in the middle of the
    /// canvas.
    pub fn centered(center: [f64; 2], pixels_per_unit: f64,
                    width: f64, height: f64) -> Self {
        let hw = 0.5 * width / pixels_per_unit;
        let hh = 0.5 * height / pixels_per_unit;
        Affine { origin: [center[0] - hw, center[1] + hh],
                 scale: [pixels_per_unit, pixels_per_unit] }
    }
}

impl Transform for Affine {
    #[inline]
    fn to_screen(&self, p: [f64; 2]) -> [f64; 2] {
        [(p[0] - self.origin[0]) * self.scale[0],
         (self.origin[1] - p[1]) * self.scale[1]]
    }

    fn pixels_per_unit(&self, _: [f64; 2]) -> f64 {
        0.5 * (self.scale[0] + self.scale[1])
    }
}
