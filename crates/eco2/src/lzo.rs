//! # The MiniLZO compression capability
//!
//! `.ecox` and `.tplx` files wrap the save buffer in MiniLZO. The
//! original tool loads an external MiniLZO.dll at runtime; here the
//! codec is injected as a trait object, so the format code never depends
//! on how (or whether) a compressor is linked. The `minilzo` cargo
//! feature (on by default) links the `minilzo-rs` crate statically.
//!
//! The container framing matches the .NET wrapper: a 4-byte
//! little-endian uncompressed-size prefix followed by the LZO1X block.

use displaydoc::Display;
use thiserror::Error;

/// Errors from the compression capability
#[derive(Debug, Display, Error)]
pub enum LzoError {
    /// MiniLZO support is not compiled into this build
    Unavailable,
    /// malformed MiniLZO data: {0}
    Malformed(String),
}

/// An injectable MiniLZO codec
pub trait Lzo {
    /// Wrap `data` in the save-file MiniLZO container
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, LzoError>;

    /// Unwrap a save-file MiniLZO container
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, LzoError>;

    /// Whether the capability is actually present
    fn available(&self) -> bool {
        true
    }
}

/// Placeholder codec for builds without MiniLZO support
#[derive(Debug, Default)]
pub struct NoLzo;

impl Lzo for NoLzo {
    fn compress(&self, _data: &[u8]) -> Result<Vec<u8>, LzoError> {
        Err(LzoError::Unavailable)
    }

    fn decompress(&self, _data: &[u8]) -> Result<Vec<u8>, LzoError> {
        Err(LzoError::Unavailable)
    }

    fn available(&self) -> bool {
        false
    }
}

/// The statically linked MiniLZO codec
#[cfg(feature = "minilzo")]
#[derive(Debug, Default)]
pub struct MiniLzo;

#[cfg(feature = "minilzo")]
impl Lzo for MiniLzo {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, LzoError> {
        let mut lzo = minilzo_rs::LZO::init().map_err(|_| LzoError::Unavailable)?;
        let block = lzo
            .compress(data)
            .map_err(|e| LzoError::Malformed(format!("{:?}", e)))?;
        let mut out = Vec::with_capacity(block.len() + 4);
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&block);
        Ok(out)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, LzoError> {
        if data.len() < 4 {
            return Err(LzoError::Malformed(format!(
                "container is only {} bytes",
                data.len()
            )));
        }
        let size = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
        minilzo_rs::LZO::init()
            .map_err(|_| LzoError::Unavailable)?
            .decompress_safe(&data[4..], size)
            .map_err(|e| LzoError::Malformed(format!("{:?}", e)))
    }
}

/// The codec compiled into this build
pub fn detect() -> &'static dyn Lzo {
    #[cfg(feature = "minilzo")]
    {
        &MiniLzo
    }
    #[cfg(not(feature = "minilzo"))]
    {
        &NoLzo
    }
}

#[cfg(test)]
mod tests {
    use super::{Lzo, LzoError, NoLzo};

    #[test]
    fn no_lzo_is_unavailable() {
        assert!(!NoLzo.available());
        assert!(matches!(NoLzo.compress(b"42"), Err(LzoError::Unavailable)));
        assert!(matches!(NoLzo.decompress(b"42"), Err(LzoError::Unavailable)));
    }

    #[cfg(feature = "minilzo")]
    #[test]
    fn mini_lzo_round_trip() {
        use super::MiniLzo;

        let data: Vec<u8> = b"forty two ".iter().cycle().take(4200).copied().collect();
        let packed = MiniLzo.compress(&data).unwrap();
        assert_eq!(&packed[..4], &(data.len() as u32).to_le_bytes());
        assert_eq!(MiniLzo.decompress(&packed).unwrap(), data);
    }

    #[cfg(feature = "minilzo")]
    #[test]
    fn mini_lzo_rejects_short_container() {
        use super::MiniLzo;

        assert!(matches!(
            MiniLzo.decompress(b"\x01"),
            Err(LzoError::Malformed(_))
        ));
    }
}
