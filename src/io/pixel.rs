// src/io/pixel.rs
use std::fmt;
use std::str::FromStr;

use gdal::raster::GdalDataType;
use serde::{Deserialize, Serialize};

/// Pixel types a band may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelType {
    U8,
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
}

impl PixelType {
    /// Default no-data sentinel used when an output is created without an
    /// explicit value.
    pub fn default_no_data(self) -> f64 {
        match self {
            PixelType::U8 => 255.0,
            PixelType::U16 => 65535.0,
            PixelType::I16 => -32767.0,
            PixelType::U32 => 4294967293.0,
            PixelType::I32 => -2147483647.0,
            // Stored as the exact f32 value so written pixels compare equal
            // to the band's no-data when read back.
            PixelType::F32 => f32::MIN_POSITIVE as f64,
            PixelType::F64 => f64::MAX,
        }
    }

    pub fn from_gdal(data_type: GdalDataType) -> Option<Self> {
        match data_type {
            GdalDataType::UInt8 => Some(PixelType::U8),
            GdalDataType::UInt16 => Some(PixelType::U16),
            GdalDataType::Int16 => Some(PixelType::I16),
            GdalDataType::UInt32 => Some(PixelType::U32),
            GdalDataType::Int32 => Some(PixelType::I32),
            GdalDataType::Float32 => Some(PixelType::F32),
            GdalDataType::Float64 => Some(PixelType::F64),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PixelType::U8 => "u8",
            PixelType::U16 => "u16",
            PixelType::I16 => "i16",
            PixelType::U32 => "u32",
            PixelType::I32 => "i32",
            PixelType::F32 => "f32",
            PixelType::F64 => "f64",
        }
    }
}

impl Default for PixelType {
    fn default() -> Self {
        PixelType::F32
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelType {
    type Err = String;

    /// Accepts both the short names and GDAL's type names (`Byte`,
    /// `Float32`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "u8" | "byte" | "uint8" => Ok(PixelType::U8),
            "u16" | "uint16" => Ok(PixelType::U16),
            "i16" | "int16" => Ok(PixelType::I16),
            "u32" | "uint32" => Ok(PixelType::U32),
            "i32" | "int32" => Ok(PixelType::I32),
            "f32" | "float32" => Ok(PixelType::F32),
            "f64" | "float64" => Ok(PixelType::F64),
            other => Err(format!(
                "unknown pixel type '{}', expected one of u8, u16, i16, u32, i32, f32, f64",
                other
            )),
        }
    }
}
