//! Prepare an image for the panel.
//!
//! ```text
//! epd-pack <input> <output> [max_width max_height]
//! ```
//!
//! Scales the image to fit the panel (or the given box) keeping its aspect
//! ratio, converts it to 16 gray levels and writes the packed bytes, ready
//! for `Epd::draw_grayscale_image`. The final size is printed as
//! `Image-Width` / `Image-Height`.

use std::{env, fs, path::PathBuf, process};

use anyhow::{anyhow, Context};
use epd47::{
    pack::{fit_within, pack_gray8},
    HEIGHT, WIDTH,
};
use image::imageops::FilterType;

struct Args {
    input: PathBuf,
    output: PathBuf,
    max_width: u32,
    max_height: u32,
}

fn parse_args() -> anyhow::Result<Args> {
    let args: Vec<String> = env::args().skip(1).collect();
    let (input, output, max) = match args.as_slice() {
        [input, output] => (input, output, None),
        [input, output, w, h] => (input, output, Some((w, h))),
        _ => return Err(anyhow!("usage: epd-pack <input> <output> [max_width max_height]")),
    };
    let (max_width, max_height) = match max {
        Some((w, h)) => (
            w.parse().with_context(|| format!("bad max_width {:?}", w))?,
            h.parse().with_context(|| format!("bad max_height {:?}", h))?,
        ),
        None => (WIDTH, HEIGHT),
    };
    if max_width < 2 || max_height < 2 {
        return Err(anyhow!("the target box must be at least 2x2 pixels"));
    }
    Ok(Args {
        input: input.into(),
        output: output.into(),
        max_width,
        max_height,
    })
}

fn run(args: &Args) -> anyhow::Result<()> {
    let image = image::open(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?
        .to_luma8();

    let (width, height) = fit_within(image.width(), image.height(), args.max_width, args.max_height);
    if width == 0 || height == 0 {
        return Err(anyhow!("{} has no pixels", args.input.display()));
    }
    let resized = image::imageops::resize(&image, width, height, FilterType::Lanczos3);
    let packed = pack_gray8(resized.as_raw(), width, height);

    fs::write(&args.output, &packed).with_context(|| format!("writing {}", args.output.display()))?;
    println!("Image-Width: {}", width);
    println!("Image-Height: {}", height);
    Ok(())
}

fn main() {
    let result = parse_args().and_then(|args| run(&args));
    if let Err(e) = result {
        eprintln!("epd-pack: {:#}", e);
        process::exit(1);
    }
}
