//! Multi-page TIFF reading and writing.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};

use tiff::decoder::ifd::Value;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{self, ColorType as EncodedColor};
use tiff::encoder::{Rational, TiffEncoder, TiffValue};
use tiff::tags::Tag;
use tiff::{ColorType, TiffError, TiffResult};

use super::frame::Frame;
use super::frame_stack::{FrameStack, PixelType, Resolution, StackError, StackMetadata};

/// Suffix appended to the input stem for the default output name.
pub const OUTPUT_SUFFIX: &str = "_fixed";

/// Default output location: `<dir>/<stem>_fixed.tif`.
pub fn output_path_for(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "stack".to_string());
    input.with_file_name(format!("{stem}{OUTPUT_SUFFIX}.tif"))
}

/// Reads every page of a single-channel TIFF into a stack.
///
/// Supported samples: 8-bit and 16-bit unsigned, 32-bit float. All pages
/// must share one pixel type and geometry. Resolution and description tags
/// are taken from the first page.
pub fn read_tiff_stack(path: impl AsRef<Path>) -> Result<FrameStack, StackError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| StackError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let decode_err = |source| StackError::Decode {
        path: path.to_path_buf(),
        source,
    };

    let mut decoder = Decoder::new(BufReader::new(file)).map_err(decode_err)?;
    let metadata = read_metadata(&mut decoder).map_err(decode_err)?;
    let mut frames = Vec::new();
    let mut stack_type: Option<PixelType> = None;

    loop {
        let page = frames.len();
        let (width, height) = decoder.dimensions().map_err(decode_err)?;

        match decoder.colortype().map_err(decode_err)? {
            ColorType::Gray(_) => {}
            other => {
                return Err(StackError::UnsupportedFormat {
                    page,
                    detail: format!("{other:?} is not single-channel"),
                })
            }
        }

        let (pixel_type, pixels): (PixelType, Vec<f32>) =
            match decoder.read_image().map_err(decode_err)? {
                DecodingResult::U8(buf) => (PixelType::U8, buf.into_iter().map(f32::from).collect()),
                DecodingResult::U16(buf) => {
                    (PixelType::U16, buf.into_iter().map(f32::from).collect())
                }
                DecodingResult::F32(buf) => (PixelType::F32, buf),
                _ => {
                    return Err(StackError::UnsupportedFormat {
                        page,
                        detail: "sample type must be u8, u16 or f32".to_string(),
                    })
                }
            };

        match stack_type {
            None => stack_type = Some(pixel_type),
            Some(t) if t != pixel_type => {
                return Err(StackError::UnsupportedFormat {
                    page,
                    detail: format!("{pixel_type:?} page in a {t:?} stack"),
                })
            }
            Some(_) => {}
        }

        frames.push(Frame::new(pixels, width as usize, height as usize, page));

        if !decoder.more_images() {
            break;
        }
        decoder.next_image().map_err(decode_err)?;
    }

    tracing::info!(
        path = %path.display(),
        frames = frames.len(),
        pixel_type = ?stack_type,
        resolution = ?metadata.resolution,
        "Read image stack"
    );

    Ok(FrameStack::new(frames, stack_type.unwrap_or_default())?.with_metadata(metadata))
}

fn read_metadata<R: Read + Seek>(decoder: &mut Decoder<R>) -> TiffResult<StackMetadata> {
    let rational = |value: Option<Value>| match value {
        Some(Value::Rational(n, d)) => Some([n, d]),
        _ => None,
    };
    let x = rational(decoder.find_tag(Tag::XResolution)?);
    let y = rational(decoder.find_tag(Tag::YResolution)?);
    // Inch when the tag is absent
    let unit = decoder.find_tag_unsigned::<u16>(Tag::ResolutionUnit)?.unwrap_or(2);

    let resolution = match (x, y) {
        (Some(x), Some(y)) => Some(Resolution { x, y, unit }),
        _ => None,
    };
    let description = match decoder.find_tag(Tag::ImageDescription)? {
        Some(Value::Ascii(text)) if !text.is_empty() && !text.contains('\0') => Some(text),
        _ => None,
    };

    Ok(StackMetadata {
        resolution,
        description,
    })
}

/// Writes `stack` as a multi-page TIFF in its source pixel type.
///
/// Every page carries the stack's resolution; the description goes on the
/// first page only.
///
/// Pages go to a temporary sibling first and are moved into place once the
/// whole stack is encoded, so a failed write never leaves a truncated file
/// at `path`.
pub fn write_tiff_stack(path: impl AsRef<Path>, stack: &FrameStack) -> Result<(), StackError> {
    let path = path.as_ref();
    let partial = partial_path(path);

    let write_err = |source| StackError::Write {
        path: path.to_path_buf(),
        source,
    };
    let encode_err = |source| StackError::Encode {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(&partial).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    let result = encode_stack(&mut writer, stack)
        .map_err(encode_err)
        .and_then(|()| writer.flush().map_err(write_err));

    if let Err(e) = result {
        drop(writer);
        let _ = fs::remove_file(&partial);
        return Err(e);
    }
    drop(writer);

    fs::rename(&partial, path).map_err(write_err)?;

    tracing::info!(
        path = %path.display(),
        frames = stack.len(),
        "Wrote image stack"
    );

    Ok(())
}

fn encode_stack<W: Write + Seek>(writer: W, stack: &FrameStack) -> Result<(), TiffError> {
    let mut encoder = TiffEncoder::new(writer)?;
    let width = stack.geometry().width as u32;
    let height = stack.geometry().height as u32;
    let pixel_type = stack.pixel_type();

    for (page, frame) in stack.frames().iter().enumerate() {
        let quantized = frame.pixels().iter().map(|&v| pixel_type.quantize(v));
        let tags = PageTags {
            metadata: stack.metadata(),
            first: page == 0,
        };
        match pixel_type {
            PixelType::U8 => {
                let data: Vec<u8> = quantized.map(|v| v as u8).collect();
                write_page::<_, colortype::Gray8>(
                    &mut encoder,
                    width,
                    height,
                    &data,
                    tags,
                )?;
            }
            PixelType::U16 => {
                let data: Vec<u16> = quantized.map(|v| v as u16).collect();
                write_page::<_, colortype::Gray16>(
                    &mut encoder,
                    width,
                    height,
                    &data,
                    tags,
                )?;
            }
            PixelType::F32 => {
                let data: Vec<f32> = quantized.collect();
                write_page::<_, colortype::Gray32Float>(
                    &mut encoder,
                    width,
                    height,
                    &data,
                    tags,
                )?;
            }
        }
    }

    Ok(())
}

#[derive(Clone, Copy)]
struct PageTags<'a> {
    metadata: &'a StackMetadata,
    first: bool,
}

fn write_page<W: Write + Seek, C: EncodedColor>(
    encoder: &mut TiffEncoder<W>,
    width: u32,
    height: u32,
    data: &[C::Inner],
    tags: PageTags<'_>,
) -> TiffResult<()>
where
    [C::Inner]: TiffValue,
{
    let mut image = encoder.new_image::<C>(width, height)?;
    let directory = image.encoder();

    if let Some(res) = tags.metadata.resolution {
        let [xn, xd] = res.x;
        let [yn, yd] = res.y;
        directory.write_tag(Tag::XResolution, Rational { n: xn, d: xd })?;
        directory.write_tag(Tag::YResolution, Rational { n: yn, d: yd })?;
        directory.write_tag(Tag::ResolutionUnit, res.unit)?;
    }
    if tags.first {
        if let Some(description) = &tags.metadata.description {
            directory.write_tag(Tag::ImageDescription, description.as_str())?;
        }
    }

    image.write_data(data)
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}
