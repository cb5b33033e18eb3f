//! Cartridge slot.
//!
//! The slot reserves a fixed window of the address space. While empty the window is unmapped;
//! once an image is loaded, the first `len` bytes of the window read back the image and the rest
//! of the window stays unmapped. The image is read-only from the bus.

use crate::common::error::{Error, Result};

/// Read-only ROM slot with a capacity cap.
pub struct Cartridge {
    base: u32,
    max_size: u32,
    image: Option<Box<[u8]>>,
}

impl Cartridge {
    /// Creates an empty slot.
    ///
    /// # Arguments
    ///
    /// * `base` - First address of the window.
    /// * `max_size` - Reserved window size; larger images are rejected.
    pub const fn new(base: u32, max_size: u32) -> Self {
        Self {
            base,
            max_size,
            image: None,
        }
    }

    /// Returns the window base address.
    pub const fn base(&self) -> u32 {
        self.base
    }

    /// Returns the reserved window size.
    pub const fn max_size(&self) -> u32 {
        self.max_size
    }

    /// Replaces the image.
    ///
    /// # Errors
    ///
    /// `RegionTooLarge` if `data` exceeds the window; the previous image is kept.
    pub fn load(&mut self, data: &[u8]) -> Result<()> {
        if data.len() > self.max_size as usize {
            return Err(Error::RegionTooLarge {
                size: data.len(),
                max: self.max_size as usize,
            });
        }
        self.image = Some(data.to_vec().into_boxed_slice());
        Ok(())
    }

    /// Ejects the image; the window becomes unmapped.
    pub fn unload(&mut self) {
        self.image = None;
    }

    /// Returns whether an image is present.
    pub const fn is_loaded(&self) -> bool {
        self.image.is_some()
    }

    /// Returns the loaded image length (0 when empty).
    pub fn len(&self) -> usize {
        self.image.as_ref().map_or(0, |img| img.len())
    }

    /// Returns whether the slot holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the loaded image.
    pub fn image(&self) -> Option<&[u8]> {
        self.image.as_deref()
    }

    /// Returns the image offset of `addr`, if it falls on a loaded byte.
    #[inline]
    pub fn offset_of(&self, addr: u32) -> Option<usize> {
        let image = self.image.as_ref()?;
        if addr < self.base {
            return None;
        }
        let offset = (addr - self.base) as usize;
        (offset < image.len()).then_some(offset)
    }
}

impl std::fmt::Debug for Cartridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cartridge")
            .field("base", &format_args!("{:#010x}", self.base))
            .field("max_size", &self.max_size)
            .field("loaded", &self.len())
            .finish()
    }
}
