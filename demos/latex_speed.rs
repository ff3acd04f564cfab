use std::{error::Error,
          fs::File,
          io::Write};
use curve_sampling::{Affine, Sampling, Transform};

fn main() -> Result<(), Box<dyn Error>> {
    let path = std::env::temp_dir().join("latex_speed.tex");
    let mut fh = File::create(&path)?;
    write!(fh, "\\documentclass[12pt,a4paper]{{article}}\n\
                \\usepackage{{tikz}}\n\
                \\begin{{document}}\n\
                \\begin{{tikzpicture}}[x=0.1mm, y=0.1mm]\n")?;
    // Very zoomed in, so the highest density tier is used.
    let tr = Affine::fit(-6., 6., -1.2, 1.2, 1e6, 2e5);
    let s = Sampling::fun(f64::sin, -6., 6.)
        .density(tr.density([0., 0.], 1e6, 2e5))
        .build()?;
    println!("Run \"latex {}\" to measure LaTeX speed with {} points \
              ({} evaluations).", path.display(), s.len(),
             s.stats().evaluations);
    s.segment(&tr).latex().write(&mut fh)?;
    write!(fh, "\\end{{tikzpicture}}\n\
                \\end{{document}}")?;
    Ok(())
}
