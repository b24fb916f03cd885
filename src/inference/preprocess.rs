use image::imageops::FilterType;
use tch::Tensor;

pub const INPUT_WIDTH: u32 = 128;
pub const INPUT_HEIGHT: u32 = 128;
pub const INPUT_CHANNELS: i64 = 3;

/// A decoded upload ready for scoring: shape `[1, 128, 128, 3]`, f32 pixel
/// values left in their native 0-255 range.
///
/// Both trained models were fitted on unnormalized Keras tensors, so no
/// scaling or mean subtraction may ever happen here; adding it would make
/// every downstream score meaningless.
#[derive(Debug)]
pub struct ImageTensor(Tensor);

impl ImageTensor {
    pub fn as_tensor(&self) -> &Tensor {
        &self.0
    }

    /// New handle onto the same underlying storage.
    pub fn shallow_clone(&self) -> Self {
        Self(self.0.shallow_clone())
    }
}

/// Decodes raw upload bytes and resizes (never crops) to the model input
/// shape, wrapped in a batch dimension of size 1.
pub fn preprocess(bytes: &[u8]) -> Result<ImageTensor, image::ImageError> {
    let decoded = image::load_from_memory(bytes)?;
    // Bilinear, matching the resize the models were trained against.
    let rgb = decoded
        .resize_exact(INPUT_WIDTH, INPUT_HEIGHT, FilterType::Triangle)
        .to_rgb8();
    let pixels: Vec<f32> = rgb.into_raw().into_iter().map(f32::from).collect();
    let tensor = Tensor::from_slice(&pixels).view([
        1,
        INPUT_HEIGHT as i64,
        INPUT_WIDTH as i64,
        INPUT_CHANNELS,
    ]);
    Ok(ImageTensor(tensor))
}
