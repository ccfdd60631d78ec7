use crate::Result;

/// Decoded image in tightly packed 8-bit RGBA.
#[derive(Clone)]
pub struct Bitmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Bitmap {
    /// Wrap packed RGBA data. Returns `None` if the buffer does not hold
    /// exactly `width * height` pixels.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Option<Bitmap> {
        if data.len() != width as usize * height as usize * 4 {
            return None;
        }

        Some(Bitmap {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Decode a PNG, JPEG, or GIF image as returned by the map service.
pub fn decode(bytes: &[u8]) -> Result<Bitmap> {
    let image = image::load_from_memory(bytes)?.into_rgba8();

    let (width, height) = image.dimensions();
    tracing::trace!(width, height, "decoded map image");

    Ok(Bitmap {
        width,
        height,
        data: image.into_raw(),
    })
}
