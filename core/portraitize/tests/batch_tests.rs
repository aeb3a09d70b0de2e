//! Batch converter semantics: terminal states, overwrite policy, and
//! failure isolation.

mod common;

use std::path::PathBuf;

use common::{face_image, scratch_dir, write_png, DarkCentroidClassifier, EYE_SEPARATION};
use image::{Rgba, RgbaImage};
use portraitize::{BatchConverter, IntensityPupilLocator, PortraitConverter};

fn converter() -> PortraitConverter {
    PortraitConverter::new(
        Box::new(DarkCentroidClassifier),
        Box::new(IntensityPupilLocator::new()),
    )
}

fn sample_face() -> RgbaImage {
    let half = EYE_SEPARATION / 2;
    face_image(400, 400, (200, 200 - half), (200, 200 + half))
}

fn seed_inputs(dir: &std::path::Path, count: usize) -> Vec<PathBuf> {
    let face = sample_face();
    (0..count)
        .map(|i| write_png(&face, dir, &format!("face_{i}.png")))
        .collect()
}

#[test]
fn every_input_reaches_exactly_one_terminal_state() {
    let dir = scratch_dir("terminal");
    let inputs = seed_inputs(&dir.join("in"), 4);
    let outdir = dir.join("out");

    let converter = converter();
    let summary = BatchConverter::new(&converter)
        .workers(2)
        .run(&inputs, &outdir)
        .unwrap();

    assert_eq!(summary.converted, 4);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.failed, 0);
    for input in &inputs {
        let output = outdir.join(input.file_name().unwrap());
        assert!(output.exists(), "missing {}", output.display());
    }
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn more_workers_than_inputs_is_fine() {
    let dir = scratch_dir("clamp");
    let inputs = seed_inputs(&dir.join("in"), 2);

    let converter = converter();
    let summary = BatchConverter::new(&converter)
        .workers(16)
        .run(&inputs, &dir.join("out"))
        .unwrap();
    assert_eq!(summary.converted, 2);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn existing_outputs_are_skipped_without_overwrite() {
    let dir = scratch_dir("skip");
    let inputs = seed_inputs(&dir.join("in"), 3);
    let outdir = dir.join("out");

    let converter = converter();
    let batch = BatchConverter::new(&converter).workers(2);
    assert_eq!(batch.run(&inputs, &outdir).unwrap().converted, 3);

    // Second run: everything already exists, nothing is rewritten.
    let before: Vec<_> = inputs
        .iter()
        .map(|p| {
            let out = outdir.join(p.file_name().unwrap());
            std::fs::metadata(&out).unwrap().modified().unwrap()
        })
        .collect();

    let summary = batch.run(&inputs, &outdir).unwrap();
    assert_eq!(summary.converted, 0);
    assert_eq!(summary.skipped, 3);
    assert_eq!(summary.failed, 0);

    for (input, stamp) in inputs.iter().zip(before) {
        let out = outdir.join(input.file_name().unwrap());
        assert_eq!(std::fs::metadata(&out).unwrap().modified().unwrap(), stamp);
    }
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn overwrite_rewrites_every_output() {
    let dir = scratch_dir("overwrite");
    let inputs = seed_inputs(&dir.join("in"), 3);
    let outdir = dir.join("out");

    let converter = converter();
    let batch = BatchConverter::new(&converter).workers(2);
    batch.run(&inputs, &outdir).unwrap();

    let summary = batch.overwrite(true).run(&inputs, &outdir).unwrap();
    assert_eq!(summary.converted, 3);
    assert_eq!(summary.skipped, 0);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn one_bad_input_does_not_sink_the_batch() {
    let dir = scratch_dir("isolation");
    let indir = dir.join("in");
    let mut inputs = seed_inputs(&indir, 2);
    let bad = indir.join("broken.png");
    std::fs::write(&bad, b"definitely not a png").unwrap();
    inputs.insert(1, bad);
    let outdir = dir.join("out");

    let converter = converter();
    let summary = BatchConverter::new(&converter)
        .workers(2)
        .run(&inputs, &outdir)
        .unwrap();

    assert_eq!(summary.converted, 2);
    assert_eq!(summary.failed, 1);
    assert!(!outdir.join("broken.png").exists());
    assert!(outdir.join("face_0.png").exists());
    assert!(outdir.join("face_1.png").exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn faceless_input_fails_alone_and_leaves_no_output() {
    let dir = scratch_dir("faceless");
    let indir = dir.join("in");
    let mut inputs = seed_inputs(&indir, 1);
    let blank = RgbaImage::from_pixel(300, 300, Rgba([255, 255, 255, 255]));
    inputs.push(write_png(&blank, &indir, "blank.png"));
    let outdir = dir.join("out");

    let converter = converter();
    let summary = BatchConverter::new(&converter)
        .run(&inputs, &outdir)
        .unwrap();

    assert_eq!(summary.converted, 1);
    assert_eq!(summary.failed, 1);
    assert!(!outdir.join("blank.png").exists());
    assert!(outdir.join("face_0.png").exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn output_directory_is_created_if_absent() {
    let dir = scratch_dir("mkdir");
    let inputs = seed_inputs(&dir.join("in"), 1);
    let outdir = dir.join("deeply").join("nested").join("out");

    let converter = converter();
    let summary = BatchConverter::new(&converter)
        .run(&inputs, &outdir)
        .unwrap();
    assert_eq!(summary.converted, 1);
    assert!(outdir.join("face_0.png").exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn jpeg_outputs_are_written_without_alpha() {
    let dir = scratch_dir("jpeg");
    let indir = dir.join("in");
    std::fs::create_dir_all(&indir).unwrap();
    let input = indir.join("face.jpg");
    image::DynamicImage::ImageRgba8(sample_face())
        .to_rgb8()
        .save(&input)
        .unwrap();
    let outdir = dir.join("out");

    let converter = converter();
    let summary = BatchConverter::new(&converter)
        .run(&[input], &outdir)
        .unwrap();
    assert_eq!(summary.converted, 1);

    let written = image::open(outdir.join("face.jpg")).unwrap();
    let ratio = written.width() as f64 / written.height() as f64;
    assert!((ratio - 0.75).abs() < 0.03, "ratio {ratio}");
    let _ = std::fs::remove_dir_all(&dir);
}
