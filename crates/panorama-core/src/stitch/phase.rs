use ndarray::Array2;
use num_complex::Complex;
use rustfft::FftPlanner;

/// A peak of the phase correlation surface, as a signed shift of the target
/// relative to the reference: `target(y, x) ~ reference(y - dy, x - dx)`.
#[derive(Clone, Copy, Debug)]
pub(super) struct CorrelationPeak {
    pub dy: i64,
    pub dx: i64,
    pub value: f64,
}

/// Phase-correlate two planes of possibly different size.
///
/// Both planes are Hann-windowed on their own extent and zero-padded to the
/// common size, so shifts wrap modulo that size. Returns up to `max_peaks`
/// well-separated peaks, strongest first.
pub(super) fn correlate(
    reference: &Array2<f32>,
    target: &Array2<f32>,
    max_peaks: usize,
) -> (Vec<CorrelationPeak>, (usize, usize)) {
    let (rh, rw) = reference.dim();
    let (th, tw) = target.dim();
    let h = rh.max(th);
    let w = rw.max(tw);

    let ref_fft = fft2d(&pad_windowed(reference, h, w));
    let tgt_fft = fft2d(&pad_windowed(target, h, w));
    let cross_power = normalized_cross_power(&ref_fft, &tgt_fft);
    let correlation = ifft2d(&cross_power);

    let peaks = find_peaks(&correlation, max_peaks)
        .into_iter()
        .map(|(row, col, value)| CorrelationPeak {
            dy: wrap_signed(row, h),
            dx: wrap_signed(col, w),
            value,
        })
        .collect();
    (peaks, (h, w))
}

fn wrap_signed(index: usize, size: usize) -> i64 {
    if index > size / 2 {
        index as i64 - size as i64
    } else {
        index as i64
    }
}

/// Remove the mean, apply a Hann window over the plane's own extent and
/// zero-pad to `h x w`.
fn pad_windowed(data: &Array2<f32>, h: usize, w: usize) -> Array2<f32> {
    let (dh, dw) = data.dim();
    let mean = data.mean().unwrap_or(0.0);
    let mut result = Array2::<f32>::zeros((h, w));

    for row in 0..dh {
        let wy = 0.5 * (1.0 - (std::f64::consts::TAU * row as f64 / dh as f64).cos());
        for col in 0..dw {
            let wx = 0.5 * (1.0 - (std::f64::consts::TAU * col as f64 / dw as f64).cos());
            result[[row, col]] = (data[[row, col]] - mean) * (wy * wx) as f32;
        }
    }

    result
}

/// 2D FFT: row-wise FFT, then column-wise FFT.
fn fft2d(data: &Array2<f32>) -> Array2<Complex<f64>> {
    let (h, w) = data.dim();
    let mut planner = FftPlanner::new();
    let fft_row = planner.plan_fft_forward(w);
    let fft_col = planner.plan_fft_forward(h);

    let mut result = data.mapv(|v| Complex::new(v as f64, 0.0));

    for mut row in result.rows_mut() {
        let mut row_data: Vec<Complex<f64>> = row.to_vec();
        fft_row.process(&mut row_data);
        row.assign(&ndarray::ArrayView1::from(row_data.as_slice()));
    }

    for mut col in result.columns_mut() {
        let mut col_data: Vec<Complex<f64>> = col.to_vec();
        fft_col.process(&mut col_data);
        col.assign(&ndarray::ArrayView1::from(col_data.as_slice()));
    }

    result
}

/// Inverse 2D FFT, real part, normalized.
fn ifft2d(data: &Array2<Complex<f64>>) -> Array2<f64> {
    let (h, w) = data.dim();
    let mut planner = FftPlanner::new();
    let ifft_row = planner.plan_fft_inverse(w);
    let ifft_col = planner.plan_fft_inverse(h);

    let mut work = data.clone();

    for mut col in work.columns_mut() {
        let mut col_data: Vec<Complex<f64>> = col.to_vec();
        ifft_col.process(&mut col_data);
        col.assign(&ndarray::ArrayView1::from(col_data.as_slice()));
    }

    for mut row in work.rows_mut() {
        let mut row_data: Vec<Complex<f64>> = row.to_vec();
        ifft_row.process(&mut row_data);
        row.assign(&ndarray::ArrayView1::from(row_data.as_slice()));
    }

    let scale = 1.0 / (h * w) as f64;
    work.mapv(|c| c.re * scale)
}

fn normalized_cross_power(
    ref_fft: &Array2<Complex<f64>>,
    tgt_fft: &Array2<Complex<f64>>,
) -> Array2<Complex<f64>> {
    let mut result = Array2::<Complex<f64>>::zeros(ref_fft.dim());

    ndarray::Zip::from(&mut result)
        .and(ref_fft)
        .and(tgt_fft)
        .for_each(|out, &r, &t| {
            let cross = t * r.conj();
            let mag = cross.norm();
            *out = if mag > 1e-12 {
                cross / mag
            } else {
                Complex::new(0.0, 0.0)
            };
        });

    result
}

/// Strongest `count` peaks, each suppressing a small neighbourhood
/// (with wrap-around) so the list holds distinct shifts.
fn find_peaks(data: &Array2<f64>, count: usize) -> Vec<(usize, usize, f64)> {
    const SUPPRESS_RADIUS: i64 = 3;
    let (h, w) = data.dim();
    let mut surface = data.clone();
    let mut peaks = Vec::with_capacity(count);

    for _ in 0..count {
        let mut best = (0usize, 0usize, f64::NEG_INFINITY);
        for ((row, col), &v) in surface.indexed_iter() {
            if v > best.2 {
                best = (row, col, v);
            }
        }
        if !best.2.is_finite() {
            break;
        }
        peaks.push(best);

        for dr in -SUPPRESS_RADIUS..=SUPPRESS_RADIUS {
            for dc in -SUPPRESS_RADIUS..=SUPPRESS_RADIUS {
                let r = (best.0 as i64 + dr).rem_euclid(h as i64) as usize;
                let c = (best.1 as i64 + dc).rem_euclid(w as i64) as usize;
                surface[[r, c]] = f64::NEG_INFINITY;
            }
        }
    }

    peaks
}
