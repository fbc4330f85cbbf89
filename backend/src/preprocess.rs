use image::DynamicImage;
use image::imageops::FilterType;
use ndarray::Array4;

#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Image has zero width or height")]
    EmptyImage,
}

/// Decodes `image_data` and lays it out as an NCHW `[1, 3, size, size]`
/// tensor with values in [0, 1].
pub fn preprocess(image_data: &[u8], input_size: u32) -> Result<Array4<f32>, PreprocessError> {
    let image = image::load_from_memory(image_data)?;
    to_tensor(&image, input_size)
}

pub fn to_tensor(image: &DynamicImage, input_size: u32) -> Result<Array4<f32>, PreprocessError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(PreprocessError::EmptyImage);
    }

    let rgb = image
        .resize_exact(input_size, input_size, FilterType::CatmullRom)
        .to_rgb8();

    let size = input_size as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        for channel in 0..3 {
            tensor[[0, channel, y as usize, x as usize]] = pixel.0[channel] as f32 / 255.0;
        }
    }
    Ok(tensor)
}
