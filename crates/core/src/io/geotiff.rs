//! Native GeoTIFF reading/writing
//!
//! Uses the `tiff` crate for TIFF I/O plus the handful of GeoTIFF tags the
//! pipeline needs: pixel scale, tie point, a GeoKey directory carrying the
//! EPSG code, and the GDAL no-data tag.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use num_traits::{NumCast, ToPrimitive};
use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{GrayI16, Gray32Float};
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

const GT_MODEL_TYPE_KEY: u16 = 1024;
const GT_RASTER_TYPE_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;

/// On-disk sample type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleFormat {
    /// 32-bit IEEE float; NaN is no-data
    #[default]
    Float32,
    /// 16-bit signed integer with an explicit no-data sentinel
    Int16,
}

/// Options for writing GeoTIFF files
#[derive(Debug, Clone, Default)]
pub struct GeoTiffOptions {
    pub sample_format: SampleFormat,
}

impl GeoTiffOptions {
    pub fn int16() -> Self {
        Self {
            sample_format: SampleFormat::Int16,
        }
    }
}

/// Read a GeoTIFF file into a Raster
///
/// Transform, CRS (when the GeoKey directory carries an EPSG code) and the
/// GDAL no-data value are restored when present.
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    decode_geotiff(file)
}

/// Read a GeoTIFF from an in-memory buffer into a Raster
pub fn read_geotiff_from_buffer<T>(data: &[u8]) -> Result<Raster<T>>
where
    T: RasterElement,
{
    decode_geotiff(Cursor::new(data))
}

fn cast_all<S, T>(buf: Vec<S>) -> Vec<T>
where
    S: ToPrimitive + Copy,
    T: RasterElement,
{
    buf.into_iter()
        .map(|v| <T as NumCast>::from(v).unwrap_or_else(T::default_nodata))
        .collect()
}

fn decode_geotiff<T, R>(reader: R) -> Result<Raster<T>>
where
    T: RasterElement,
    R: Read + Seek,
{
    let mut decoder =
        Decoder::new(reader).map_err(|e| Error::Other(format!("TIFF decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Other(format!("Cannot read dimensions: {}", e)))?;

    let rows = height as usize;
    let cols = width as usize;

    // Georeferencing lives in the first IFD; read it before the pixel data
    let transform = read_geotransform(&mut decoder).ok();
    let crs = read_epsg(&mut decoder).map(CRS::from_epsg);
    let nodata = read_nodata::<T, R>(&mut decoder);

    let result = decoder
        .read_image()
        .map_err(|e| Error::Other(format!("Cannot read image data: {}", e)))?;

    let data: Vec<T> = match result {
        DecodingResult::F32(buf) => cast_all(buf),
        DecodingResult::F64(buf) => cast_all(buf),
        DecodingResult::U8(buf) => cast_all(buf),
        DecodingResult::U16(buf) => cast_all(buf),
        DecodingResult::U32(buf) => cast_all(buf),
        DecodingResult::I8(buf) => cast_all(buf),
        DecodingResult::I16(buf) => cast_all(buf),
        DecodingResult::I32(buf) => cast_all(buf),
        _ => return Err(Error::UnsupportedDataType("Unsupported TIFF pixel format".to_string())),
    };

    if data.len() != rows * cols {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }

    let mut raster = Raster::from_vec(data, rows, cols)?;
    if let Some(transform) = transform {
        raster.set_transform(transform);
    }
    raster.set_crs(crs);
    raster.set_nodata(nodata);
    Ok(raster)
}

/// GDAL no-data value, stored as ASCII text
fn read_nodata<T: RasterElement, R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<T> {
    let text = decoder.get_tag_ascii_string(Tag::GdalNodata).ok()?;
    let value = text.trim_matches(char::from(0)).trim().parse::<f64>().ok()?;
    <T as NumCast>::from(value)
}

/// Attempt to read GeoTransform from TIFF tags
fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(Tag::ModelPixelScaleTag)
        .map_err(|_| Error::Other("No pixel scale tag".into()))?;

    let tiepoint = decoder
        .get_tag_f64_vec(Tag::ModelTiepointTag)
        .map_err(|_| Error::Other("No tiepoint tag".into()))?;

    if scale.len() >= 2 && tiepoint.len() >= 6 {
        // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
        let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
        let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
        return Ok(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]));
    }

    Err(Error::Other("Cannot determine geotransform".into()))
}

/// EPSG code from the GeoKey directory, projected key first
fn read_epsg<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<u32> {
    let keys = decoder.get_tag_u16_vec(Tag::GeoKeyDirectoryTag).ok()?;
    if keys.len() < 4 {
        return None;
    }
    let count = keys[3] as usize;
    let entries: Vec<&[u16]> = keys[4..].chunks_exact(4).take(count).collect();
    let lookup = |id: u16| {
        entries
            .iter()
            .find(|e| e[0] == id && e[1] == 0)
            .map(|e| e[3] as u32)
    };
    lookup(PROJECTED_CS_TYPE_KEY).or_else(|| lookup(GEOGRAPHIC_TYPE_KEY))
}

/// Build the GeoKey directory for a CRS
fn geokey_directory(crs: Option<&CRS>) -> Vec<u16> {
    let epsg = crs.map(|c| c.epsg()).filter(|&c| c <= u16::MAX as u32);
    let geographic = matches!(epsg, Some(4326) | Some(4283));

    let mut entries: Vec<[u16; 4]> = vec![
        [GT_MODEL_TYPE_KEY, 0, 1, if geographic { 2 } else { 1 }],
        [GT_RASTER_TYPE_KEY, 0, 1, 1],
    ];
    if let Some(code) = epsg {
        let key = if geographic {
            GEOGRAPHIC_TYPE_KEY
        } else {
            PROJECTED_CS_TYPE_KEY
        };
        entries.push([key, 0, 1, code as u16]);
    }

    let mut out = vec![1, 1, 0, entries.len() as u16];
    out.extend(entries.iter().flatten());
    out
}

// Shared by both sample formats; `image` is a tiff ImageEncoder.
macro_rules! write_geo_tags {
    ($image:expr, $raster:expr, $nodata:expr) => {{
        let gt = $raster.transform();
        let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
        $image
            .encoder()
            .write_tag(Tag::ModelPixelScaleTag, &scale[..])
            .map_err(|e| Error::Other(format!("Cannot write scale tag: {}", e)))?;

        let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
        $image
            .encoder()
            .write_tag(Tag::ModelTiepointTag, &tiepoint[..])
            .map_err(|e| Error::Other(format!("Cannot write tiepoint tag: {}", e)))?;

        let geokeys = geokey_directory($raster.crs());
        $image
            .encoder()
            .write_tag(Tag::GeoKeyDirectoryTag, geokeys.as_slice())
            .map_err(|e| Error::Other(format!("Cannot write geokey tag: {}", e)))?;

        if let Some(text) = $nodata {
            $image
                .encoder()
                .write_tag(Tag::GdalNodata, text.as_str())
                .map_err(|e| Error::Other(format!("Cannot write nodata tag: {}", e)))?;
        }
    }};
}

/// Write a Raster to a GeoTIFF file
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P, options: Option<GeoTiffOptions>) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = BufWriter::new(File::create(path.as_ref())?);
    encode_geotiff(raster, file, options.unwrap_or_default())
}

/// Write a Raster to an in-memory GeoTIFF buffer
pub fn write_geotiff_to_buffer<T>(raster: &Raster<T>, options: Option<GeoTiffOptions>) -> Result<Vec<u8>>
where
    T: RasterElement,
{
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf), options.unwrap_or_default())?;
    Ok(buf)
}

fn encode_geotiff<T, W>(raster: &Raster<T>, writer: W, options: GeoTiffOptions) -> Result<()>
where
    T: RasterElement,
    W: Write + Seek,
{
    let mut encoder =
        TiffEncoder::new(writer).map_err(|e| Error::Other(format!("TIFF encoder error: {}", e)))?;

    let (rows, cols) = raster.shape();
    let nodata = raster.nodata();

    match options.sample_format {
        SampleFormat::Float32 => {
            let data: Vec<f32> = raster
                .data()
                .iter()
                .map(|&v| {
                    if v.is_nodata(nodata) {
                        f32::NAN
                    } else {
                        <f32 as NumCast>::from(v).unwrap_or(f32::NAN)
                    }
                })
                .collect();

            let mut image = encoder
                .new_image::<Gray32Float>(cols as u32, rows as u32)
                .map_err(|e| Error::Other(format!("Cannot create TIFF image: {}", e)))?;
            write_geo_tags!(image, raster, Some("nan".to_string()));
            image
                .write_data(&data)
                .map_err(|e| Error::Other(format!("Cannot write image data: {}", e)))?;
        }
        SampleFormat::Int16 => {
            let sentinel: i16 = nodata
                .and_then(<i16 as NumCast>::from)
                .unwrap_or(i16::default_nodata());
            let data: Vec<i16> = raster
                .data()
                .iter()
                .map(|&v| {
                    if v.is_nodata(nodata) {
                        sentinel
                    } else {
                        <i16 as NumCast>::from(v).unwrap_or(sentinel)
                    }
                })
                .collect();

            let mut image = encoder
                .new_image::<GrayI16>(cols as u32, rows as u32)
                .map_err(|e| Error::Other(format!("Cannot create TIFF image: {}", e)))?;
            write_geo_tags!(image, raster, Some(sentinel.to_string()));
            image
                .write_data(&data)
                .map_err(|e| Error::Other(format!("Cannot write image data: {}", e)))?;
        }
    }

    Ok(())
}
