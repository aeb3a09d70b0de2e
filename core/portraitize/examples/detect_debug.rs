//! Print face and pupil detections for images, to check what the portrait
//! pipeline would work with.
//!
//! Usage:
//!   cargo run --example detect_debug -- model/seeta_fd_frontal_v1.0.bin photo.jpg...

use portraitize::{FaceLocator, IntensityPupilLocator, SeetaFaceClassifier};

fn main() {
    let mut args = std::env::args().skip(1);
    let model = args
        .next()
        .expect("usage: detect_debug <model> <image>...");
    let locator = FaceLocator::new(
        Box::new(SeetaFaceClassifier::from_file(&model).expect("failed to load model")),
        Box::new(IntensityPupilLocator::new()),
    );

    for path in args {
        let image = match portraitize::exif::decode_file_with_exif(&path) {
            Ok(image) => image,
            Err(e) => {
                println!("=== {path} ===\n  {e}\n");
                continue;
            }
        };
        println!("=== {path} ({}x{}) ===", image.width(), image.height());

        match locator.detect_face(&image, 0.0) {
            Ok(face) => {
                let d = face.detection;
                println!(
                    "  face: center=({}, {}), scale={}, score={:.2}",
                    d.col, d.row, d.scale, d.score
                );
                if face.pupils_located() {
                    let (l, r) = (face.left_eye, face.right_eye);
                    let tilt = ((r.row - l.row) as f64)
                        .atan2((r.col - l.col) as f64)
                        .to_degrees();
                    println!(
                        "  pupils: left=({}, {}), right=({}, {}), eye line {tilt:.1} deg",
                        l.col, l.row, r.col, r.row
                    );
                } else {
                    println!("  pupils: not located — portrait conversion would fail");
                }
            }
            Err(e) => println!("  {e}"),
        }
        println!();
    }
}
