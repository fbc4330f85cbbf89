use image::{DynamicImage, GrayImage};
use shared::QualityReport;

pub const BLUR_THRESHOLD: f64 = 100.0;
pub const DARK_THRESHOLD: f64 = 50.0;
pub const BRIGHT_THRESHOLD: f64 = 200.0;
pub const LOW_CONTRAST_THRESHOLD: f64 = 30.0;

// Reference scales used to normalise each signal before averaging.
const BLUR_SCALE: f64 = 100.0;
const BRIGHTNESS_SCALE: f64 = 255.0;
const CONTRAST_SCALE: f64 = 128.0;

pub const MSG_BLURRY: &str = "Image appears blurry. Hold camera steady and focus on the object.";
pub const MSG_TOO_DARK: &str =
    "Image is too dark. Try better lighting or move closer to a light source.";
pub const MSG_TOO_BRIGHT: &str =
    "Image is too bright. Reduce lighting or move away from direct light.";
pub const MSG_LOW_CONTRAST: &str =
    "Low contrast detected. Ensure good lighting and clear background.";
pub const MSG_GOOD: &str = "Image quality is good for detection.";
pub const MSG_UNABLE: &str = "Unable to analyze image quality";

/// Advisory image checks. Never fails: unreadable input yields a zeroed
/// report so the scan can still go ahead.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageQualityAnalyzer;

impl ImageQualityAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, image_data: &[u8]) -> QualityReport {
        match image::load_from_memory(image_data) {
            Ok(image) => self.analyze_image(&image),
            Err(e) => {
                log::warn!("Unable to decode image for quality analysis: {}", e);
                degraded_report()
            }
        }
    }

    pub fn analyze_image(&self, image: &DynamicImage) -> QualityReport {
        self.analyze_luma(&image.to_luma8())
    }

    pub fn analyze_luma(&self, gray: &GrayImage) -> QualityReport {
        if gray.width() == 0 || gray.height() == 0 {
            log::warn!("Empty image passed to quality analysis");
            return degraded_report();
        }

        let blur_score = laplacian_variance(gray);
        let (brightness, contrast) = luminance_stats(gray);
        let quality_score = composite_score(blur_score, brightness, contrast);
        let recommendations = recommendations(blur_score, brightness, contrast);

        log::debug!(
            "Quality analysis: blur={:.2} brightness={:.2} contrast={:.2} score={:.1}",
            blur_score,
            brightness,
            contrast,
            quality_score
        );

        QualityReport {
            blur_score,
            brightness,
            contrast,
            quality_score,
            recommendations,
        }
    }
}

pub fn composite_score(blur_score: f64, brightness: f64, contrast: f64) -> f64 {
    let raw = (blur_score / BLUR_SCALE + brightness / BRIGHTNESS_SCALE + contrast / CONTRAST_SCALE)
        * 100.0
        / 3.0;
    if raw.is_nan() {
        0.0
    } else {
        raw.clamp(0.0, 100.0)
    }
}

pub fn recommendations(blur_score: f64, brightness: f64, contrast: f64) -> Vec<String> {
    let mut recommendations = Vec::new();

    if blur_score < BLUR_THRESHOLD {
        recommendations.push(MSG_BLURRY.to_string());
    }
    if brightness < DARK_THRESHOLD {
        recommendations.push(MSG_TOO_DARK.to_string());
    }
    if brightness > BRIGHT_THRESHOLD {
        recommendations.push(MSG_TOO_BRIGHT.to_string());
    }
    if contrast < LOW_CONTRAST_THRESHOLD {
        recommendations.push(MSG_LOW_CONTRAST.to_string());
    }

    if recommendations.is_empty() {
        recommendations.push(MSG_GOOD.to_string());
    }
    recommendations
}

fn degraded_report() -> QualityReport {
    QualityReport {
        blur_score: 0.0,
        brightness: 0.0,
        contrast: 0.0,
        quality_score: 0.0,
        recommendations: vec![MSG_UNABLE.to_string()],
    }
}

/// Variance of the 4-neighbour Laplacian `[0,1,0; 1,-4,1; 0,1,0]`, with
/// reflect-101 borders so every pixel contributes.
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    let (w, h) = (gray.width() as i64, gray.height() as i64);
    if w == 0 || h == 0 {
        return 0.0;
    }

    let at = |x: i64, y: i64| -> f64 {
        let x = reflect101(x, w) as u32;
        let y = reflect101(y, h) as u32;
        gray.get_pixel(x, y).0[0] as f64
    };

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for y in 0..h {
        for x in 0..w {
            let response =
                at(x, y - 1) + at(x, y + 1) + at(x - 1, y) + at(x + 1, y) - 4.0 * at(x, y);
            sum += response;
            sum_sq += response * response;
        }
    }

    let count = (w * h) as f64;
    let mean = sum / count;
    (sum_sq / count - mean * mean).max(0.0)
}

/// Mean and population standard deviation of the luminance channel.
pub fn luminance_stats(gray: &GrayImage) -> (f64, f64) {
    let count = gray.width() as f64 * gray.height() as f64;
    if count == 0.0 {
        return (0.0, 0.0);
    }

    let (sum, sum_sq) = gray.pixels().fold((0.0f64, 0.0f64), |(sum, sum_sq), p| {
        let v = p.0[0] as f64;
        (sum + v, sum_sq + v * v)
    });
    let mean = sum / count;
    let variance = (sum_sq / count - mean * mean).max(0.0);
    (mean, variance.sqrt())
}

fn reflect101(i: i64, n: i64) -> i64 {
    if n == 1 {
        0
    } else if i < 0 {
        -i
    } else if i >= n {
        2 * n - 2 - i
    } else {
        i
    }
}
