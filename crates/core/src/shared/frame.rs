use ndarray::{s, ArrayView3, ArrayViewMut3};

use crate::shared::geometry::PixelRect;

/// A single camera frame: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at I/O boundaries only; the domain layer
/// treats pixel data as opaque.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Copies the pixels inside `rect` into a new frame with the same index.
    ///
    /// The rect is clipped to the frame; `None` if nothing remains.
    pub fn crop(&self, rect: &PixelRect) -> Option<Frame> {
        let x2 = rect.x_end().min(self.width);
        let y2 = rect.y_end().min(self.height);
        let clipped = PixelRect::from_corners(rect.x, rect.y, x2, y2)?;

        let view = self.as_ndarray();
        let sub = view.slice(s![
            clipped.y as usize..clipped.y_end() as usize,
            clipped.x as usize..clipped.x_end() as usize,
            ..
        ]);
        let data: Vec<u8> = sub.iter().copied().collect();
        Some(Frame::new(
            data,
            clipped.width,
            clipped.height,
            self.channels,
            self.index,
        ))
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
