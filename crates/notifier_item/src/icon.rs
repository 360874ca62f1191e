use std::{
    borrow::Cow,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IconError {
    #[error("icon dimensions {width}x{height} do not fit the pixmap format")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("row stride {stride} is shorter than a row of {width} {format:?} pixels")]
    StrideTooSmall { stride: usize, width: u32, format: PixelFormat },
    #[error("pixel buffer holds {actual} bytes, but a {width}x{height} image needs {expected}")]
    BufferTooShort { width: u32, height: u32, expected: usize, actual: usize },
}

/// Memory layouts a toolkit may hand us. All of them convert to ARGB32 without loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// One native-endian 32-bit word per pixel, `0xAARRGGBB`.
    Argb32,
    /// Bytes in the order R, G, B, A (what gdk-pixbuf uses for images with alpha).
    Rgba8888,
    /// Bytes in the order R, G, B. Treated as fully opaque.
    Rgb888,
}

impl PixelFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Argb32 => 4,
            PixelFormat::Rgba8888 => 4,
            PixelFormat::Rgb888 => 3,
        }
    }

    fn to_argb32(self, px: &[u8]) -> u32 {
        match self {
            PixelFormat::Argb32 => u32::from_ne_bytes([px[0], px[1], px[2], px[3]]),
            PixelFormat::Rgba8888 => u32::from_be_bytes([px[3], px[0], px[1], px[2]]),
            PixelFormat::Rgb888 => u32::from_be_bytes([0xff, px[0], px[1], px[2]]),
        }
    }
}

/// One rasterized resolution of an icon, as produced by the toolkit.
///
/// Rows may be padded (`stride` is the distance between the starts of two rows, in bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
    data: Vec<u8>,
}

impl RasterImage {
    pub fn new(width: u32, height: u32, stride: usize, format: PixelFormat, data: Vec<u8>) -> Result<Self, IconError> {
        // the wire format carries dimensions as int32
        if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
            return Err(IconError::InvalidDimensions { width, height });
        }

        let row_len = (width as usize)
            .checked_mul(format.bytes_per_pixel())
            .ok_or(IconError::InvalidDimensions { width, height })?;
        if stride < row_len {
            return Err(IconError::StrideTooSmall { stride, width, format });
        }

        // the last row doesn't need its padding
        let expected = match height {
            0 => 0,
            h => stride
                .checked_mul(h as usize - 1)
                .and_then(|n| n.checked_add(row_len))
                .ok_or(IconError::InvalidDimensions { width, height })?,
        };
        if data.len() < expected {
            return Err(IconError::BufferTooShort { width, height, expected, actual: data.len() });
        }

        Ok(Self { width, height, stride, format, data })
    }

    /// Build a tightly packed ARGB32 image from pixel words.
    pub fn from_argb32(width: u32, height: u32, pixels: &[u32]) -> Result<Self, IconError> {
        let data: Vec<u8> = pixels.iter().flat_map(|px| px.to_ne_bytes()).collect();
        let stride = (width as usize).saturating_mul(4);
        let image = Self::new(width, height, stride, PixelFormat::Argb32, data)?;
        if pixels.len() != width as usize * height as usize {
            return Err(IconError::BufferTooShort {
                width,
                height,
                expected: width as usize * height as usize * 4,
                actual: pixels.len() * 4,
            });
        }
        Ok(image)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Pixels as ARGB32 words, row by row, with the row padding skipped.
    pub fn argb32_pixels(&self) -> impl Iterator<Item = u32> + '_ {
        let bpp = self.format.bytes_per_pixel();
        let row_len = self.width as usize * bpp;
        let format = self.format;
        (0..self.height as usize).flat_map(move |y| {
            let start = y * self.stride;
            self.data[start..start + row_len].chunks_exact(bpp).map(move |px| format.to_argb32(px))
        })
    }
}

/// Something that can be published as an icon pixmap.
///
/// This is the seam to the toolkit: it knows which resolutions an icon offers and how to rasterize
/// them. `cache_key` must stay the same for as long as the rasterized content does, so that setting
/// the same icon again can be detected without comparing pixels.
pub trait IconSource {
    fn cache_key(&self) -> u64;

    /// One image per available resolution, in the order the toolkit enumerates them.
    fn raster_images(&self) -> Vec<Cow<'_, RasterImage>>;
}

// 0 is reserved for the empty icon
static NEXT_ICON_KEY: AtomicU64 = AtomicU64::new(1);

/// An in-memory icon with any number of resolutions.
///
/// Clones share their cache key, much like toolkit icon handles do.
#[derive(Debug, Clone)]
pub struct Icon {
    cache_key: u64,
    images: Arc<[RasterImage]>,
}

impl Icon {
    pub fn new(images: Vec<RasterImage>) -> Self {
        Self { cache_key: NEXT_ICON_KEY.fetch_add(1, Ordering::Relaxed), images: images.into() }
    }

    /// An icon without any resolution. Publishing it removes the pixmap.
    pub fn empty() -> Self {
        Self { cache_key: 0, images: Arc::from(Vec::new()) }
    }

    pub fn images(&self) -> &[RasterImage] {
        &self.images
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl IconSource for Icon {
    fn cache_key(&self) -> u64 {
        self.cache_key
    }

    fn raster_images(&self) -> Vec<Cow<'_, RasterImage>> {
        self.images.iter().map(Cow::Borrowed).collect()
    }
}

/// One resolution of an icon in the [wire format]: ARGB32 in network byte order, no padding.
///
/// [wire format]: https://freedesktop.org/wiki/Specifications/StatusNotifierItem/Icons/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedIcon {
    width: i32,
    height: i32,
    data: Vec<u8>,
}

pub type EncodedIconList = Vec<EncodedIcon>;

impl EncodedIcon {
    pub fn from_raster(image: &RasterImage) -> Self {
        Self {
            // RasterImage::new guarantees both fit
            width: image.width() as i32,
            height: image.height() as i32,
            data: image.argb32_pixels().flat_map(u32::to_be_bytes).collect(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Decode the pixels back into ARGB32 words.
    pub fn argb32_pixels(&self) -> impl Iterator<Item = u32> + '_ {
        self.data.chunks_exact(4).map(|px| u32::from_be_bytes([px[0], px[1], px[2], px[3]]))
    }

    pub(crate) fn to_dbus(&self) -> (i32, i32, Vec<u8>) {
        (self.width, self.height, self.data.clone())
    }
}

pub(crate) fn to_dbus_pixmaps(icons: &[EncodedIcon]) -> Vec<(i32, i32, Vec<u8>)> {
    icons.iter().map(EncodedIcon::to_dbus).collect()
}

/// Serialize every resolution of `icon` into the wire format.
///
/// An icon without resolutions encodes to an empty list.
pub fn encode(icon: &dyn IconSource) -> EncodedIconList {
    icon.raster_images().iter().map(|image| EncodedIcon::from_raster(image)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn checkerboard(size: u32) -> Vec<u32> {
        (0..size * size).map(|i| if i % 2 == 0 { 0xff112233 } else { 0x80a0b0c0 }).collect()
    }

    #[test]
    fn test_encode_one_entry_per_resolution() {
        let icon = Icon::new(vec![
            RasterImage::from_argb32(16, 16, &checkerboard(16)).unwrap(),
            RasterImage::from_argb32(22, 22, &checkerboard(22)).unwrap(),
            RasterImage::from_argb32(32, 32, &checkerboard(32)).unwrap(),
        ]);

        let encoded = encode(&icon);
        assert_eq!(encoded.len(), 3);
        for (entry, size) in encoded.iter().zip([16, 22, 32]) {
            assert_eq!((entry.width(), entry.height()), (size, size));
            assert_eq!(entry.data().len(), (size * size * 4) as usize);
        }
    }

    #[test]
    fn test_encode_is_big_endian() {
        let pixels = checkerboard(4);
        let image = RasterImage::from_argb32(4, 4, &pixels).unwrap();
        let encoded = EncodedIcon::from_raster(&image);

        assert_eq!(encoded.argb32_pixels().collect::<Vec<_>>(), pixels);
        assert_eq!(&encoded.data()[..4], &[0xff, 0x11, 0x22, 0x33]);

        let native: Vec<u8> = pixels.iter().flat_map(|px| px.to_ne_bytes()).collect();
        for (wire, native) in encoded.data().chunks(4).zip(native.chunks(4)) {
            if cfg!(target_endian = "little") {
                let mut swapped = native.to_vec();
                swapped.reverse();
                assert_eq!(wire, swapped.as_slice());
            } else {
                assert_eq!(wire, native);
            }
        }
    }

    #[test]
    fn test_encode_empty_icon() {
        assert_eq!(encode(&Icon::empty()), Vec::new());
    }

    #[test]
    fn test_encode_is_deterministic() {
        let icon = Icon::new(vec![RasterImage::from_argb32(8, 8, &checkerboard(8)).unwrap()]);
        assert_eq!(encode(&icon), encode(&icon));
    }

    #[test]
    fn test_rgba_converts_to_argb() {
        let image = RasterImage::new(2, 1, 8, PixelFormat::Rgba8888, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let encoded = EncodedIcon::from_raster(&image);
        assert_eq!(encoded.data(), &[4, 1, 2, 3, 8, 5, 6, 7]);
    }

    #[test]
    fn test_rgb_is_opaque_and_padding_is_dropped() {
        // 1 pixel per row, rows padded to 4 bytes
        let data = vec![10, 20, 30, 0, 40, 50, 60];
        let image = RasterImage::new(1, 2, 4, PixelFormat::Rgb888, data).unwrap();
        let encoded = EncodedIcon::from_raster(&image);
        assert_eq!(encoded.data(), &[0xff, 10, 20, 30, 0xff, 40, 50, 60]);
    }

    #[test]
    fn test_raster_validation() {
        assert_eq!(
            RasterImage::new(2, 2, 4, PixelFormat::Argb32, vec![0; 16]),
            Err(IconError::StrideTooSmall { stride: 4, width: 2, format: PixelFormat::Argb32 })
        );
        assert_eq!(
            RasterImage::new(2, 2, 8, PixelFormat::Argb32, vec![0; 12]),
            Err(IconError::BufferTooShort { width: 2, height: 2, expected: 16, actual: 12 })
        );
        assert_eq!(
            RasterImage::from_argb32(u32::MAX, 1, &[]),
            Err(IconError::InvalidDimensions { width: u32::MAX, height: 1 })
        );
    }

    #[test]
    fn test_icon_clones_share_cache_key() {
        let a = Icon::new(vec![]);
        let b = Icon::new(vec![]);
        assert_eq!(a.cache_key(), a.clone().cache_key());
        assert!(a.cache_key() != b.cache_key());
        assert_eq!(Icon::empty().cache_key(), Icon::empty().cache_key());
    }
}
