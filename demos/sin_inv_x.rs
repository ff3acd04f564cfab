use std::{error::Error,
          fs::File,
          io::Write};
use curve_sampling::{Affine, InteractionMode, Sampling, Transform};

type R = Result<(), Box<dyn Error>>;

fn main() -> R {
    let dir = std::env::temp_dir();
    let mut fh = File::create(dir.join("sin_inv_x.gp"))?;
    write!(fh, "set terminal pngcairo\n\
                set grid\n")?;
    let mut d = 0;
    let mut save = |s: &Sampling, title| -> R {
        d += 1;
        let fname = dir.join(format!("sin_inv_x{}.dat", d));
        let fname = fname.display();
        s.write(&mut File::create(fname.to_string())?)?;
        let n = s.len();
        write!(fh, "set output \"sin_inv_x{}.png\"\n\
                    plot '{}' with l lt 1 lw 2 title \"{} ({} pts)\"\n",
               d, fname, title, n)?;
        write!(fh, "set output \"sin_inv_x{}_p.png\"\n\
                    plot '{}' with l lt 5 lw 2 title \"{}\", \
                    '{}' with p lt 3 pt 5 ps 0.2 title \"points ({})\"\n",
               d, fname, title, fname, n)?;
        Ok(())
    };

    let f = |x: f64| x * (1. / x).sin();
    for ppu in [100., 1_000.] {
        let tr = Affine::centered([0., 0.], ppu, 800., 600.);
        let ctx = tr.density([0., 0.], 800., 600.);
        let s = Sampling::fun(f, -0.4, 0.4).density(ctx).build()?;
        save(&s, "x sin(1/x)")?;
        let s = Sampling::fun(f, -0.4, 0.4).density(ctx)
            .mode(InteractionMode::Live).build()?;
        save(&s, "x sin(1/x), live")?;
    }

    let s = Sampling::fun(|x: f64| (1. / x).sin(), -0.4, 0.4)
        .jitter(1).build()?;
    save(&s, "sin(1/x)")?;
    Ok(())
}
