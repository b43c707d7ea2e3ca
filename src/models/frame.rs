use image::RgbImage;

/// One video frame handed to the pose source.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Position in the stream, starting at 0.
    pub index: u64,
    pub image: RgbImage,
}

impl Frame {
    pub fn new(index: u64, image: RgbImage) -> Self {
        Self { index, image }
    }

    /// A 1x1 stand-in for streams whose landmarks were extracted offline.
    pub fn placeholder(index: u64) -> Self {
        Self::new(index, RgbImage::new(1, 1))
    }

    pub fn mirror(&mut self) {
        image::imageops::flip_horizontal_in_place(&mut self.image);
    }
}
