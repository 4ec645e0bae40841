//! Page buffer for the 800×480 black/white/red e-ink frame.
//!
//! Pixels live in two packed bit planes the way tri-color panels expect
//! them: a black plane where a cleared bit is black, and a red plane where a
//! set bit is red. Each row takes `ceil(width / 8)` bytes, MSB first.
//!
//! [`FrameBuffer`] implements the `embedded-graphics` [`DrawTarget`], so the
//! renderer draws with ordinary primitives and mono fonts.

use embedded_graphics::pixelcolor::PixelColor;
use embedded_graphics::prelude::*;
use std::convert::Infallible;

/// Display page width in pixels
pub const PAGE_WIDTH: u32 = 800;
/// Display page height in pixels
pub const PAGE_HEIGHT: u32 = 480;

/// The panel's whole palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Ink {
    White,
    Black,
    Red,
}

impl PixelColor for Ink {
    type Raw = ();
}

pub struct FrameBuffer {
    width: u32,
    height: u32,
    black_plane: Vec<u8>,
    red_plane: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let size = (width.div_ceil(8) * height) as usize;
        Self {
            width,
            height,
            black_plane: vec![0xFF; size], // white
            red_plane: vec![0x00; size],
        }
    }

    /// A blank page of the target display's size.
    pub fn page() -> Self {
        Self::new(PAGE_WIDTH, PAGE_HEIGHT)
    }

    fn locate(&self, x: u32, y: u32) -> Option<(usize, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = (y * self.width.div_ceil(8) + x / 8) as usize;
        Some((index, 0x80 >> (x % 8)))
    }

    /// Out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, ink: Ink) {
        let Some((i, mask)) = self.locate(x, y) else {
            return;
        };
        match ink {
            Ink::White => {
                self.black_plane[i] |= mask;
                self.red_plane[i] &= !mask;
            }
            Ink::Black => {
                self.black_plane[i] &= !mask;
                self.red_plane[i] &= !mask;
            }
            Ink::Red => {
                self.black_plane[i] |= mask;
                self.red_plane[i] |= mask;
            }
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Ink> {
        let (i, mask) = self.locate(x, y)?;
        Some(if self.red_plane[i] & mask != 0 {
            Ink::Red
        } else if self.black_plane[i] & mask == 0 {
            Ink::Black
        } else {
            Ink::White
        })
    }

    /// Number of pixels painted with `ink`.
    pub fn count(&self, ink: Ink) -> usize {
        (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .filter(|&(x, y)| self.pixel(x, y) == Some(ink))
            .count()
    }

    /// Binary PBM (`P4`) of the page. Red prints as black.
    pub fn to_pbm(&self) -> Vec<u8> {
        let mut out = format!("P4\n{} {}\n", self.width, self.height).into_bytes();
        out.extend(
            self.black_plane
                .iter()
                .zip(&self.red_plane)
                .map(|(black, red)| !black | red),
        );
        out
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Ink;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, ink) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set_pixel(point.x as u32, point.y as u32, ink);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{Line, PrimitiveStyle};

    #[test]
    fn starts_white() {
        let fb = FrameBuffer::new(16, 4);
        assert_eq!(fb.black_plane.len(), 8);
        assert_eq!(fb.pixel(0, 0), Some(Ink::White));
        assert_eq!(fb.count(Ink::White), 64);
    }

    #[test]
    fn set_pixel_and_read_back() {
        let mut fb = FrameBuffer::new(10, 3);
        fb.set_pixel(9, 2, Ink::Black);
        fb.set_pixel(1, 0, Ink::Red);
        assert_eq!(fb.pixel(9, 2), Some(Ink::Black));
        assert_eq!(fb.pixel(1, 0), Some(Ink::Red));
        // row stride is 2 bytes for width 10
        assert_eq!(fb.black_plane[5], 0xFF & !0x40);
        fb.set_pixel(1, 0, Ink::White);
        assert_eq!(fb.pixel(1, 0), Some(Ink::White));
    }

    #[test]
    fn out_of_bounds_is_ignored() {
        let mut fb = FrameBuffer::new(8, 8);
        fb.set_pixel(8, 0, Ink::Black);
        fb.set_pixel(0, 100, Ink::Black);
        assert_eq!(fb.count(Ink::Black), 0);
        assert_eq!(fb.pixel(8, 0), None);
    }

    #[test]
    fn draws_embedded_graphics_primitives() {
        let mut fb = FrameBuffer::new(20, 20);
        Line::new(Point::new(-5, 2), Point::new(9, 2))
            .into_styled(PrimitiveStyle::with_stroke(Ink::Black, 1))
            .draw(&mut fb)
            .unwrap();
        assert_eq!(fb.count(Ink::Black), 10);
    }

    #[test]
    fn pbm_header_and_size() {
        let mut fb = FrameBuffer::new(12, 2);
        fb.set_pixel(0, 0, Ink::Black);
        fb.set_pixel(1, 0, Ink::Red);
        let pbm = fb.to_pbm();
        let header = b"P4\n12 2\n";
        assert_eq!(&pbm[..header.len()], header);
        assert_eq!(pbm.len(), header.len() + 4);
        assert_eq!(pbm[header.len()], 0b1100_0000);
    }

    #[test]
    fn page_matches_display() {
        let fb = FrameBuffer::page();
        assert_eq!(fb.size(), Size::new(PAGE_WIDTH, PAGE_HEIGHT));
        assert_eq!(fb.pixel(799, 479), Some(Ink::White));
        assert_eq!(fb.pixel(800, 479), None);
    }
}
