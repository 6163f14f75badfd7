// src/io/raster.rs
use std::path::{Path, PathBuf};

use gdal::cpl::CslStringList;
use gdal::raster::Buffer;
use gdal::{Dataset, DatasetOptions, DriverManager, GdalOpenFlags, GeoTransform};
use log::debug;

use crate::error::{CalcError, Result};
use crate::io::pixel::PixelType;
use crate::processing::blocks::BlockSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    ReadOnly,
    Update,
}

/// Metadata captured when a raster is opened or created.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterInfo {
    pub width: usize,
    pub height: usize,
    pub pixel_type: PixelType,
    pub no_data: Option<f64>,
    pub geo_transform: Option<GeoTransform>,
    pub projection: String,
    pub block_size: (usize, usize),
}

/// Everything needed to create a new single-band raster.
#[derive(Debug, Clone)]
pub struct CreateParams<'a> {
    pub width: usize,
    pub height: usize,
    pub pixel_type: PixelType,
    pub no_data: f64,
    pub geo_transform: Option<GeoTransform>,
    pub projection: &'a str,
    pub driver: &'a str,
    pub creation_options: &'a [String],
}

/// One single-band raster on disk.
pub struct RasterHandle {
    path: PathBuf,
    dataset: Dataset,
    info: RasterInfo,
}

impl RasterHandle {
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let open_flags = match mode {
            OpenMode::ReadOnly => GdalOpenFlags::GDAL_OF_RASTER | GdalOpenFlags::GDAL_OF_READONLY,
            OpenMode::Update => GdalOpenFlags::GDAL_OF_RASTER | GdalOpenFlags::GDAL_OF_UPDATE,
        };
        let dataset = Dataset::open_ex(
            &path,
            DatasetOptions {
                open_flags,
                ..Default::default()
            },
        )
        .map_err(|source| CalcError::Open {
            path: path.clone(),
            source,
        })?;

        let info = read_info(&path, &dataset)?;
        debug!(
            "Opened {} ({:?}): {}x{}, type {}, nodata {:?}",
            path.display(),
            mode,
            info.width,
            info.height,
            info.pixel_type,
            info.no_data
        );

        Ok(Self { path, dataset, info })
    }

    /// Create a new single-band raster. Any file already at `path` must have
    /// been removed by the caller.
    pub fn create<P: AsRef<Path>>(path: P, params: &CreateParams<'_>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let create_err = |source| CalcError::Create {
            path: path.clone(),
            source,
        };

        let driver = DriverManager::get_driver_by_name(params.driver).map_err(create_err)?;

        let mut options = CslStringList::new();
        for opt in params.creation_options {
            options.add_string(opt).map_err(create_err)?;
        }

        let (w, h) = (params.width, params.height);
        let mut dataset = match params.pixel_type {
            PixelType::U8 => driver.create_with_band_type_with_options::<u8, _>(&path, w, h, 1, &options),
            PixelType::U16 => driver.create_with_band_type_with_options::<u16, _>(&path, w, h, 1, &options),
            PixelType::I16 => driver.create_with_band_type_with_options::<i16, _>(&path, w, h, 1, &options),
            PixelType::U32 => driver.create_with_band_type_with_options::<u32, _>(&path, w, h, 1, &options),
            PixelType::I32 => driver.create_with_band_type_with_options::<i32, _>(&path, w, h, 1, &options),
            PixelType::F32 => driver.create_with_band_type_with_options::<f32, _>(&path, w, h, 1, &options),
            PixelType::F64 => driver.create_with_band_type_with_options::<f64, _>(&path, w, h, 1, &options),
        }
        .map_err(create_err)?;

        if let Some(geo_transform) = &params.geo_transform {
            dataset.set_geo_transform(geo_transform).map_err(create_err)?;
        }
        if !params.projection.is_empty() {
            dataset.set_projection(params.projection).map_err(create_err)?;
        }

        let block_size = {
            let mut band = dataset.rasterband(1).map_err(create_err)?;
            band.set_no_data_value(Some(params.no_data)).map_err(create_err)?;
            band.block_size()
        };

        let info = RasterInfo {
            width: w,
            height: h,
            pixel_type: params.pixel_type,
            no_data: Some(params.no_data),
            geo_transform: params.geo_transform,
            projection: params.projection.to_string(),
            block_size,
        };

        Ok(Self { path, dataset, info })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self) -> &RasterInfo {
        &self.info
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.info.width, self.info.height)
    }

    pub fn pixel_type(&self) -> PixelType {
        self.info.pixel_type
    }

    pub fn no_data(&self) -> Option<f64> {
        self.info.no_data
    }

    pub fn geo_transform(&self) -> Option<&GeoTransform> {
        self.info.geo_transform.as_ref()
    }

    pub fn projection(&self) -> &str {
        &self.info.projection
    }

    pub fn native_block_size(&self) -> (usize, usize) {
        self.info.block_size
    }

    /// Record a no-data value on a band that has none.
    pub fn set_no_data(&mut self, value: f64) -> Result<()> {
        let no_data_err = |source| CalcError::SetNoData {
            path: self.path.clone(),
            source,
        };
        let mut band = self.dataset.rasterband(1).map_err(no_data_err)?;
        band.set_no_data_value(Some(value)).map_err(no_data_err)?;
        self.info.no_data = Some(value);
        Ok(())
    }

    /// Read one block of band 1, converted to `f64`.
    pub fn read_tile(&self, block: &BlockSpec) -> Result<Vec<f64>> {
        let read_err = |source| CalcError::Read {
            path: self.path.clone(),
            block: *block,
            source,
        };
        let band = self.dataset.rasterband(1).map_err(read_err)?;
        let buffer = band
            .read_as::<f64>(block.offset(), block.size(), block.size(), None)
            .map_err(read_err)?;
        Ok(buffer.into_iter().collect())
    }

    /// Write one block of band 1. GDAL converts the values to the band's
    /// pixel type.
    pub fn write_tile(&mut self, block: &BlockSpec, data: Vec<f64>) -> Result<()> {
        let write_err = |source| CalcError::Write {
            path: self.path.clone(),
            block: *block,
            source,
        };
        let mut band = self.dataset.rasterband(1).map_err(write_err)?;
        let mut buffer = Buffer::new(block.size(), data);
        band.write(block.offset(), block.size(), &mut buffer).map_err(write_err)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.dataset.flush_cache().map_err(|source| CalcError::Flush {
            path: self.path.clone(),
            source,
        })
    }
}

fn read_info(path: &Path, dataset: &Dataset) -> Result<RasterInfo> {
    let open_err = |source| CalcError::Open {
        path: path.to_path_buf(),
        source,
    };
    let band = dataset.rasterband(1).map_err(open_err)?;
    let band_type = band.band_type();
    let pixel_type = PixelType::from_gdal(band_type).ok_or_else(|| CalcError::UnsupportedPixelType {
        path: path.to_path_buf(),
        data_type: format!("{:?}", band_type),
    })?;
    let (width, height) = band.size();

    Ok(RasterInfo {
        width,
        height,
        pixel_type,
        no_data: band.no_data_value(),
        geo_transform: dataset.geo_transform().ok(),
        projection: dataset.projection(),
        block_size: band.block_size(),
    })
}
