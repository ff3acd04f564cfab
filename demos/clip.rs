use std::{error::Error,
          fs::File};
use curve_sampling::{Affine, BoundingBox, Sampling, Transform};

fn main() -> Result<(), Box<dyn Error>> {
    let dir = std::env::temp_dir();
    // tan seen through a 400×300 window: the spikes leave the canvas.
    let tr = Affine::fit(-4., 4., -3., 3., 400., 300.);
    let s = Sampling::fun(f64::tan, -4., 4.)
        .density(tr.density([0., 0.], 400., 300.))
        .build()?;
    let path = s.segment(&tr);
    path.write(&mut File::create(dir.join("clip0.dat"))?)?;
    let canvas = BoundingBox { xmin: 0., xmax: 400., ymin: 0., ymax: 300. };
    let clipped = path.clip(canvas);
    clipped.write(&mut File::create(dir.join("clip1.dat"))?)?;
    clipped.latex().write(&mut File::create(dir.join("clip1.tex"))?)?;
    println!("{} segments, {} after clipping; screen box {:?}",
             path.segments().len(), clipped.segments().len(),
             clipped.bounding_box());
    Ok(())
}
