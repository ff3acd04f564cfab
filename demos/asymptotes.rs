use std::{error::Error,
          fs::File,
          io::Write};
use curve_sampling::{Affine, BoundingBox, Path, Sampling, Transform};
use rgb::RGB8;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let dir = std::env::temp_dir();
    let (w, h) = (800., 600.);
    let tr = Affine::fit(-2., 2., -8., 8., w, h);
    let ctx = tr.density([0., 0.], w, h);
    let canvas = BoundingBox { xmin: 0., xmax: w, ymin: 0., ymax: h };

    let plots: [(&str, fn(f64) -> f64, RGB8); 3] = [
        ("inv", |x| 1. / x, RGB8 { r: 200, g: 0, b: 0 }),
        ("tan", |x| (2. * x).tan(), RGB8 { r: 0, g: 0, b: 200 }),
        ("log", |x| x.abs().ln(), RGB8 { r: 0, g: 150, b: 0 }),
    ];
    let mut svg = File::create(dir.join("asymptotes.svg"))?;
    writeln!(svg, "<svg xmlns=\"http://www.w3.org/2000/svg\" \
                   width=\"{}\" height=\"{}\">", w, h)?;
    for (name, f, color) in plots {
        let s = Sampling::fun(f, -2., 2.).density(ctx).color(color).build()?;
        let path = s.segment(&tr).clip(canvas);
        println!("{}: {} points, {} segments", name, s.len(),
                 path.segments().len());
        path.write(&mut File::create(dir.join(format!("{}.dat", name)))?)?;
        path.latex().write(&mut File::create(dir.join(format!("{}.tex", name)))?)?;
        let mut p = Path::new();
        path.render(&mut p);
        writeln!(svg, "  <path fill=\"none\" stroke=\"rgb({},{},{})\" \
                       d=\"{}\"/>", color.r, color.g, color.b, p)?;
    }
    writeln!(svg, "</svg>")?;
    Ok(())
}
