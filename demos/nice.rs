use std::{error::Error,
          f64::consts::PI,
          fs::File,
          io::BufWriter};
use curve_sampling::{Affine, Sampling, Transform};

fn main() -> Result<(), Box<dyn Error>> {
    let dir = std::env::temp_dir();
    let tr = Affine::fit(-1.2, 1.2, -1.2, 1.2, 600., 600.);
    let ctx = tr.density([0., 0.], 600., 600.);

    let f = |t: f64| [t.cos(), (2. * t).sin()];
    let s = Sampling::param(f, 0., 2. * PI).density(ctx).build()?;
    s.write(&mut BufWriter::new(File::create(dir.join("nice1.dat"))?))?;

    let f = |x: f64| (- x.powi(2)).exp();
    let s = Sampling::fun(f, -2.5, 2.5).density(ctx).build()?;
    s.write(&mut BufWriter::new(File::create(dir.join("nice2.dat"))?))?;

    // Lemniscate of Bernoulli as an implicit curve.
    let bb = curve_sampling::BoundingBox {
        xmin: -1.2, xmax: 1.2, ymin: -1.2, ymax: 1.2 };
    let path = Sampling::implicit(|x: f64, y: f64| {
        (x * x + y * y).powi(2) - (x * x - y * y)
    }, bb).density(ctx).build(&tr)?;
    path.write(&mut BufWriter::new(File::create(dir.join("nice3.dat"))?))?;
    Ok(())
}
