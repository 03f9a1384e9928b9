use std::io;
use std::time::Instant;

use mzridge::prelude::*;

/// (m/z, apex scan, apex height) of each synthetic feature's monoisotopic peak
const FEATURES: [(f64, f64, f64); 4] = [
    (301.1402, 60.0, 5.0e5),
    (445.1201, 110.0, 2.0e5),
    (512.2988, 75.0, 8.0e4),
    (622.0290, 160.0, 1.2e6),
];

/// Build a map of `n_scans` scans, one second apart, containing [`FEATURES`] along with
/// two isotopic peaks each. Every peak is sampled at three m/z points 0.0001 apart.
fn synthetic_scans(n_scans: usize) -> Vec<RawScan<'static>> {
    (0..n_scans)
        .map(|scan| {
            let mut points: Vec<(f64, f32)> = Vec::new();
            for (mz, apex, height) in FEATURES {
                let elution = (-0.5 * (scan as f64 - apex).powi(2) / 9.0).exp();
                for (isotope, abundance) in [(0.0, 1.0), (1.00335, 0.35), (2.0067, 0.08)] {
                    for (offset, profile) in [(-0.0001, 0.6), (0.0, 1.0), (0.0001, 0.6)] {
                        let y = height * abundance * profile * elution;
                        points.push((mz + isotope + offset, y as f32));
                    }
                }
            }
            points.sort_by(|a, b| a.0.total_cmp(&b.0));
            let (mzs, intensities): (Vec<f64>, Vec<f32>) = points.into_iter().unzip();
            RawScan::new(mzs, intensities, Some(scan as f64))
        })
        .collect()
}

fn main() -> io::Result<()> {
    pretty_env_logger::init();

    let start = Instant::now();
    let matrix = SparseMatrix::new(synthetic_scans(240));
    let mut matrix = match matrix {
        Ok(matrix) => matrix,
        Err(err) => {
            println!("Encountered error {:?}", err);
            return Ok(());
        }
    };
    println!(
        "Built a matrix of {} cells over {} scans in {} milliseconds",
        matrix.len(),
        matrix.num_scans(),
        (Instant::now() - start).as_millis()
    );

    let parameters = DetectionParameters::default()
        .large_scale_half_window(30)
        .fwhm(Some(0.0002));
    let detector = match PeakDetector::new(parameters) {
        Ok(detector) => detector,
        Err(err) => {
            println!("Encountered error {:?}", err);
            return Ok(());
        }
    };

    let start = Instant::now();
    match detector.detect(&mut matrix) {
        Ok(run) => {
            println!(
                "Found {} peaks from {} seeds ({:?}) in {} milliseconds",
                run.peaks.len(),
                run.seeds_visited,
                run.stop_reason,
                (Instant::now() - start).as_millis()
            );
            for peak in run.peaks.iter() {
                println!("\t{}", peak);
            }
        }
        Err(err) => println!("Encountered error {:?}", err),
    };
    Ok(())
}
