//! The 100-byte main file header shared by `.shp` and `.shx`.

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use shpkit_common::{BinaryReader, Endian};

use crate::geometry::BoundingBox;
use crate::shape_type::ShapeType;
use crate::{Error, Result};

/// Size of the main file header in bytes.
pub const HEADER_SIZE: usize = 100;

/// Magic file code stored big-endian at offset 0.
pub const FILE_CODE: i32 = 9994;

/// Format version stored little-endian at offset 28.
pub const VERSION: i32 = 1000;

/// Main file header.
///
/// Offsets 0..28 are big-endian, the rest little-endian.
#[derive(Debug, Clone, PartialEq)]
pub struct ShpHeader {
    /// Total file length in bytes (stored in 16-bit words).
    pub file_length: usize,
    /// Format version, normally 1000.
    pub version: i32,
    /// Shape type of every non-null record.
    pub shape_type: ShapeType,
    /// XY extent of all shapes.
    pub bbox: BoundingBox,
    /// Z range (zero when the type has no Z).
    pub z_range: (f64, f64),
    /// M range (zero when the type has no M).
    pub m_range: (f64, f64),
}

impl ShpHeader {
    /// Read the header, leaving the reader little-endian at offset 100.
    pub fn load(reader: &mut BinaryReader<'_>) -> Result<Self> {
        reader.set_endian(Endian::Big);
        let file_code = reader.read_i32()?;
        if file_code != FILE_CODE {
            return Err(Error::InvalidFileCode(file_code));
        }
        reader.skip(20)?;
        let file_length = reader.read_i32()?.max(0) as usize * 2;

        reader.set_endian(Endian::Little);
        let version = reader.read_i32()?;
        let code = reader.read_i32()?;
        let shape_type = ShapeType::from_code(code).ok_or(Error::UnsupportedShapeType(code))?;

        let bbox = BoundingBox {
            min_x: reader.read_f64()?,
            min_y: reader.read_f64()?,
            max_x: reader.read_f64()?,
            max_y: reader.read_f64()?,
        };
        let z_range = (reader.read_f64()?, reader.read_f64()?);
        let m_range = (reader.read_f64()?, reader.read_f64()?);

        Ok(Self {
            file_length,
            version,
            shape_type,
            bbox,
            z_range,
            m_range,
        })
    }

    /// Serialize the header.
    pub fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        out.write_i32::<BigEndian>(FILE_CODE)?;
        for _ in 0..5 {
            out.write_i32::<BigEndian>(0)?;
        }
        out.write_i32::<BigEndian>((self.file_length / 2) as i32)?;
        out.write_i32::<LittleEndian>(self.version)?;
        out.write_i32::<LittleEndian>(self.shape_type.code())?;
        for value in [
            self.bbox.min_x,
            self.bbox.min_y,
            self.bbox.max_x,
            self.bbox.max_y,
            self.z_range.0,
            self.z_range.1,
            self.m_range.0,
            self.m_range.1,
        ] {
            out.write_f64::<LittleEndian>(value)?;
        }
        Ok(())
    }
}
