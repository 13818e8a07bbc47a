//! PNG image decoder

use std::path::Path;

use crate::models::Image;

/// Decode a PNG file to 8-bit samples.
///
/// Palette images are expanded to RGB(A) and 16-bit samples are reduced to
/// their high byte; gray and alpha channels are kept as declared.
pub(crate) fn decode_png<P: AsRef<Path>>(path: P) -> Result<Image, String> {
    use std::fs::File;
    use std::io::BufReader;

    let file = File::open(path.as_ref()).map_err(|e| format!("Failed to open PNG file: {}", e))?;
    let mut decoder = png::Decoder::new(BufReader::new(file));
    decoder.set_transformations(png::Transformations::normalize_to_color8());
    let mut reader = decoder
        .read_info()
        .map_err(|e| format!("Failed to read PNG info: {}", e))?;

    let (color_type, bit_depth) = reader.output_color_type();
    if bit_depth != png::BitDepth::Eight {
        return Err(format!(
            "Unsupported PNG output bit depth {:?} for {:?}",
            bit_depth, color_type
        ));
    }

    let buffer_size = reader
        .output_buffer_size()
        .ok_or_else(|| "Failed to determine PNG buffer size".to_string())?;
    let mut buf = vec![0u8; buffer_size];
    let frame_info = reader
        .next_frame(&mut buf)
        .map_err(|e| format!("Failed to read PNG frame: {}", e))?;
    buf.truncate(frame_info.buffer_size());

    if color_type == png::ColorType::Indexed {
        return Err("Indexed PNG was not expanded".to_string());
    }
    let channels = color_type.samples() as u8;

    Ok(Image {
        width: frame_info.width,
        height: frame_info.height,
        channels,
        pixels: buf,
    })
}
