// tests/engine_tests.rs
use std::path::{Path, PathBuf};

use gdal::raster::Buffer;
use gdal::{Dataset, DriverManager};
use tempfile::TempDir;

use band_calc::io::{OpenMode, OutputSpec, PixelType, RasterHandle};
use band_calc::processing::BlockSpec;
use band_calc::{CalcError, Calculation, Progress, RunConfig};

const GEO_TRANSFORM: [f64; 6] = [440720.0, 60.0, 0.0, 3751320.0, 0.0, -60.0];

/// Write a single-band Float32 GeoTIFF.
fn write_input(dir: &Path, name: &str, size: (usize, usize), data: &[f64], no_data: Option<f64>) -> PathBuf {
    let path = dir.join(name);
    let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
    let mut dataset = driver
        .create_with_band_type::<f32, _>(&path, size.0, size.1, 1)
        .unwrap();
    dataset.set_geo_transform(&GEO_TRANSFORM).unwrap();

    let mut band = dataset.rasterband(1).unwrap();
    if let Some(ndv) = no_data {
        band.set_no_data_value(Some(ndv)).unwrap();
    }
    let values: Vec<f32> = data.iter().map(|&v| v as f32).collect();
    let mut buffer = Buffer::new(size, values);
    band.write((0, 0), size, &mut buffer).unwrap();
    path
}

fn read_output(path: &Path) -> (Vec<f64>, Option<f64>) {
    let dataset = Dataset::open(path).unwrap();
    let band = dataset.rasterband(1).unwrap();
    let size = band.size();
    let buffer = band.read_as::<f64>((0, 0), size, size, None).unwrap();
    (buffer.data().to_vec(), band.no_data_value())
}

fn lst_config(dir: &Path, day: &[f64], night: &[f64], size: (usize, usize)) -> RunConfig {
    let day_in = write_input(dir, "day_in.tif", size, day, Some(0.0));
    let night_in = write_input(dir, "night_in.tif", size, night, Some(0.0));
    let mut config = RunConfig::new("lst")
        .input("day", day_in)
        .input("night", night_in)
        .output("day", OutputSpec::new(dir.join("day.tif")))
        .output("night", OutputSpec::new(dir.join("night.tif")));
    config.tile_size = Some((2, 2));
    config
}

#[test]
fn test_lst_end_to_end_with_edge_tiles() {
    let dir = TempDir::new().unwrap();
    // 5x3 raster: 2x2 tiles leave a 1-pixel column and row at the edges.
    let day = [15000.0, 0.0, 14000.0, 14500.0, 15000.0, 13657.5, 15000.0, 0.0, 14000.0, 15000.0, 0.0, 0.0, 15000.0, 15000.0, 14000.0];
    let night = [14000.0; 15];
    let config = lst_config(dir.path(), &day, &night, (5, 3));

    let summary = Calculation::new(&config).unwrap().run().unwrap();
    assert_eq!((summary.width, summary.height), (5, 3));
    assert_eq!(summary.blocks, 6);

    let (values, ndv) = read_output(&dir.path().join("day.tif"));
    let ndv = ndv.unwrap();
    assert_eq!(ndv, PixelType::F32.default_no_data());
    for (i, (&raw, &out)) in day.iter().zip(&values).enumerate() {
        if raw == 0.0 {
            assert_eq!(out, ndv, "pixel {} should be no-data", i);
        } else {
            let expected = raw * 0.02 - 273.15;
            assert!((out - expected).abs() < 1e-3, "pixel {}: expected {}, got {}", i, expected, out);
        }
    }

    // Night depends on its own band only.
    let (night_values, _) = read_output(&dir.path().join("night.tif"));
    assert!(night_values.iter().all(|v| (v - 6.85).abs() < 1e-3));

    let output = RasterHandle::open(dir.path().join("day.tif"), OpenMode::ReadOnly).unwrap();
    assert_eq!(output.geo_transform(), Some(&GEO_TRANSFORM));
    assert_eq!(output.pixel_type(), PixelType::F32);
}

#[test]
fn test_modis_indices_mask_per_output() {
    let dir = TempDir::new().unwrap();
    let size = (3, 1);
    let mut config = RunConfig::new("modis-indices");
    // Pixel 0: clean. Pixel 1: B1 missing. Pixel 2: only B4 missing.
    let bands: [(&str, [f64; 3]); 7] = [
        ("B1", [100.0, -1.0, 100.0]),
        ("B2", [200.0, 200.0, 200.0]),
        ("B3", [50.0, 50.0, 50.0]),
        ("B4", [10.0, 10.0, -1.0]),
        ("B5", [10.0, 10.0, 10.0]),
        ("B6", [10.0, 10.0, 10.0]),
        ("B7", [10.0, 10.0, 10.0]),
    ];
    for (name, data) in &bands {
        let path = write_input(dir.path(), &format!("{}.tif", name), size, data, Some(-1.0));
        config = config.input(*name, path);
    }
    config.no_data = Some(-9999.0);
    config = config
        .output("evi", OutputSpec::new(dir.path().join("evi.tif")))
        .output("tcb", OutputSpec::new(dir.path().join("tcb.tif")));

    Calculation::new(&config).unwrap().run().unwrap();

    let (evi, evi_ndv) = read_output(&dir.path().join("evi.tif"));
    assert_eq!(evi_ndv, Some(-9999.0));
    let expected = (((200.0 - 100.0) * 0.0001) / ((200.0 + 600.0 - 375.0) * 0.0001 + 1.0)) * 2.5;
    assert!((evi[0] - expected).abs() < 1e-6);
    assert_eq!(evi[1], -9999.0);
    assert!((evi[2] - expected).abs() < 1e-6);

    let (tcb, _) = read_output(&dir.path().join("tcb.tif"));
    assert!(tcb[0] != -9999.0);
    assert_eq!(tcb[1], -9999.0);
    assert_eq!(tcb[2], -9999.0);

    // Not configured, not written.
    assert!(!dir.path().join("tcw.tif").exists());
}

#[test]
fn test_dimension_mismatch_creates_no_output() {
    let dir = TempDir::new().unwrap();
    let a = write_input(dir.path(), "a.tif", (10, 10), &[1.0; 100], None);
    let b = write_input(dir.path(), "b.tif", (10, 11), &[1.0; 110], None);
    let out = dir.path().join("ndi.tif");
    let config = RunConfig::new("ndi")
        .input("a", a)
        .input("b", &b)
        .output("ndi", OutputSpec::new(&out));

    let err = Calculation::new(&config).unwrap().run().unwrap_err();
    match &err {
        CalcError::DimensionMismatch { path, actual, expected } => {
            assert_eq!(path, &b);
            assert_eq!(*actual, (10, 11));
            assert_eq!(*expected, (10, 10));
        }
        other => panic!("unexpected error: {}", other),
    }
    let message = err.to_string();
    assert!(message.contains("(10, 11)") && message.contains("(10, 10)"));
    assert!(!out.exists());
}

#[test]
fn test_fill_in_reuses_existing_no_data() {
    let dir = TempDir::new().unwrap();
    let day = [15000.0, 0.0, 14000.0, 14500.0];
    let mut config = lst_config(dir.path(), &day, &[14000.0; 4], (2, 2));
    config.no_data = Some(-5.0);

    Calculation::new(&config).unwrap().run().unwrap();
    let (first, first_ndv) = read_output(&dir.path().join("day.tif"));
    assert_eq!(first_ndv, Some(-5.0));

    // A second fill-in pass with a different requested no-data keeps the file's.
    config.no_data = Some(-7.0);
    Calculation::new(&config).unwrap().run().unwrap();
    let (second, second_ndv) = read_output(&dir.path().join("day.tif"));
    assert_eq!(second_ndv, Some(-5.0));
    assert_eq!(first, second);
    assert_eq!(second[1], -5.0);

    // Further passes over a fully written output leave the file untouched.
    let before = std::fs::read(dir.path().join("day.tif")).unwrap();
    Calculation::new(&config).unwrap().run().unwrap();
    let after = std::fs::read(dir.path().join("day.tif")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_overwrite_recreates_output() {
    let dir = TempDir::new().unwrap();
    let mut config = lst_config(dir.path(), &[15000.0, 0.0, 15000.0, 15000.0], &[14000.0; 4], (2, 2));
    config.no_data = Some(-5.0);
    Calculation::new(&config).unwrap().run().unwrap();

    config.no_data = Some(-7.0);
    config.overwrite = true;
    Calculation::new(&config).unwrap().run().unwrap();
    let (values, ndv) = read_output(&dir.path().join("day.tif"));
    assert_eq!(ndv, Some(-7.0));
    assert_eq!(values[1], -7.0);
}

#[test]
fn test_incompatible_existing_output() {
    let dir = TempDir::new().unwrap();
    let mut config = lst_config(dir.path(), &[15000.0; 4], &[14000.0; 4], (2, 2));
    let stale = write_input(dir.path(), "stale.tif", (3, 3), &[0.0; 9], None);
    config.outputs.clear();
    config = config.output("day", OutputSpec::new(&stale));

    let err = Calculation::new(&config).unwrap().run().unwrap_err();
    assert!(matches!(
        err,
        CalcError::IncompatibleOutput { actual: (3, 3), expected: (2, 2), .. }
    ));

    config.overwrite = true;
    Calculation::new(&config).unwrap().run().unwrap();
    let handle = RasterHandle::open(&stale, OpenMode::ReadOnly).unwrap();
    assert_eq!(handle.dimensions(), (2, 2));
}

#[test]
fn test_unknown_output_role_touches_nothing() {
    let dir = TempDir::new().unwrap();
    let mut config = lst_config(dir.path(), &[15000.0; 4], &[14000.0; 4], (2, 2));
    config = config.output("evi", OutputSpec::new(dir.path().join("evi.tif")));

    let err = Calculation::new(&config).unwrap().run().unwrap_err();
    assert!(matches!(err, CalcError::UnknownOutput { ref output, .. } if output == "evi"));
    assert!(!dir.path().join("day.tif").exists());
}

#[test]
fn test_zero_tile_size_leaves_existing_output_untouched() {
    let dir = TempDir::new().unwrap();
    let mut config = lst_config(dir.path(), &[15000.0, 0.0, 15000.0, 15000.0], &[14000.0; 4], (2, 2));
    Calculation::new(&config).unwrap().run().unwrap();
    let day = dir.path().join("day.tif");
    let before = std::fs::read(&day).unwrap();

    config.overwrite = true;
    config.tile_size = Some((0, 2));
    let err = Calculation::new(&config).unwrap().run().unwrap_err();
    assert!(matches!(err, CalcError::InvalidTileSize(0, 2)));
    assert_eq!(std::fs::read(&day).unwrap(), before);

    // Without overwrite no blank output is left behind either.
    let fresh = dir.path().join("fresh.tif");
    config.overwrite = false;
    config.outputs.clear();
    config = config.output("night", OutputSpec::new(&fresh));
    assert!(Calculation::new(&config).unwrap().run().is_err());
    assert!(!fresh.exists());
}

#[test]
fn test_default_tile_size_from_native_blocks() {
    let dir = TempDir::new().unwrap();
    let day = [15000.0, 0.0, 14000.0, 14500.0, 15000.0, 13657.5, 15000.0, 0.0, 14000.0, 15000.0, 0.0, 0.0, 15000.0, 15000.0, 14000.0];
    let mut config = lst_config(dir.path(), &day, &[14000.0; 15], (5, 3));
    config.tile_size = None;

    let summary = Calculation::new(&config).unwrap().run().unwrap();
    // Native blocks grow towards 1024 pixels and are clipped to the raster.
    assert_eq!(summary.tile_size, (5, 3));
    assert_eq!(summary.blocks, 1);

    let (values, ndv) = read_output(&dir.path().join("day.tif"));
    assert!((values[0] - 26.85).abs() < 1e-3);
    assert_eq!(values[1], ndv.unwrap());
}

#[test]
fn test_integer_output_type_and_default_no_data() {
    let dir = TempDir::new().unwrap();
    let mut config = lst_config(dir.path(), &[15000.0, 0.0, 15000.0, 15000.0], &[14000.0; 4], (2, 2));
    config.outputs.get_mut("day").unwrap().pixel_type = PixelType::I16;

    Calculation::new(&config).unwrap().run().unwrap();
    let handle = RasterHandle::open(dir.path().join("day.tif"), OpenMode::ReadOnly).unwrap();
    assert_eq!(handle.pixel_type(), PixelType::I16);
    assert_eq!(handle.no_data(), Some(-32767.0));
    let values = handle.read_tile(&BlockSpec { x: 0, y: 0, width: 2, height: 2 }).unwrap();
    assert_eq!(values[1], -32767.0);
}

#[test]
fn test_parallel_matches_sequential_and_reports_progress() {
    let dir = TempDir::new().unwrap();
    let size = (7, 5);
    let day: Vec<f64> = (0..35).map(|i| if i % 6 == 0 { 0.0 } else { 14000.0 + i as f64 * 10.0 }).collect();
    let night: Vec<f64> = (0..35).map(|i| if i % 4 == 0 { 0.0 } else { 13000.0 + i as f64 }).collect();
    let mut config = lst_config(dir.path(), &day, &night, size);

    let mut seen: Vec<Progress> = Vec::new();
    let summary = Calculation::new(&config)
        .unwrap()
        .with_progress(|p| seen.push(p))
        .run()
        .unwrap();
    assert_eq!(seen.len(), summary.blocks);
    assert!(seen.windows(2).all(|w| w[0].percent() <= w[1].percent()));
    assert_eq!(seen.last().unwrap().percent(), 100.0);
    let (seq_day, _) = read_output(&dir.path().join("day.tif"));
    let (seq_night, _) = read_output(&dir.path().join("night.tif"));

    let par_day_path = dir.path().join("par_day.tif");
    let par_night_path = dir.path().join("par_night.tif");
    config.outputs.clear();
    config = config
        .output("day", OutputSpec::new(&par_day_path))
        .output("night", OutputSpec::new(&par_night_path));
    config.workers = 3;

    let mut completed = 0;
    Calculation::new(&config)
        .unwrap()
        .with_progress(|p| completed = p.completed)
        .run()
        .unwrap();
    assert_eq!(completed, summary.blocks);

    let (par_day, _) = read_output(&par_day_path);
    let (par_night, _) = read_output(&par_night_path);
    assert_eq!(seq_day, par_day);
    assert_eq!(seq_night, par_night);
}

#[test]
fn test_missing_input_file_fails_before_outputs() {
    let dir = TempDir::new().unwrap();
    let mut config = lst_config(dir.path(), &[15000.0; 16], &[14000.0; 16], (4, 4));
    config.workers = 2;
    let night = config.inputs["night"].clone();
    std::fs::remove_file(&night).unwrap();

    let err = Calculation::new(&config).unwrap().run().unwrap_err();
    assert!(matches!(err, CalcError::Open { ref path, .. } if path == &night));
    assert!(!dir.path().join("day.tif").exists());
}

#[test]
fn test_read_and_write_adjacent_tiles() {
    let dir = TempDir::new().unwrap();
    let data: Vec<f64> = (0..12).map(|i| i as f64).collect();
    let path = write_input(dir.path(), "grid.tif", (4, 3), &data, None);

    let mut handle = RasterHandle::open(&path, OpenMode::Update).unwrap();
    let edge = BlockSpec { x: 3, y: 0, width: 1, height: 3 };
    assert_eq!(handle.read_tile(&edge).unwrap(), vec![3.0, 7.0, 11.0]);

    let left = BlockSpec { x: 0, y: 0, width: 2, height: 3 };
    let right = BlockSpec { x: 2, y: 0, width: 2, height: 3 };
    handle.write_tile(&left, vec![-1.0; 6]).unwrap();
    handle.write_tile(&right, vec![-2.0; 6]).unwrap();
    handle.write_tile(&right, vec![-3.0; 6]).unwrap();
    handle.flush().unwrap();
    drop(handle);

    let (values, _) = read_output(&path);
    assert_eq!(values, vec![-1.0, -1.0, -3.0, -3.0, -1.0, -1.0, -3.0, -3.0, -1.0, -1.0, -3.0, -3.0]);
}

#[test]
fn test_open_missing_file() {
    let err = RasterHandle::open("/nonexistent/band.tif", OpenMode::ReadOnly).err().unwrap();
    assert!(matches!(err, CalcError::Open { .. }));
}
