//! Image XObjects for seal slices
//!
//! PDF images carry no alpha channel of their own, so the RGBA raster is
//! split into a DeviceRGB image and a DeviceGray soft mask.

use crate::types::Result;
use image::RgbaImage;
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

/// Add an RGBA raster to `doc` as an image XObject and return its id
pub fn add_rgba_image(doc: &mut Document, raster: &RgbaImage) -> Result<ObjectId> {
    let (width, height) = raster.dimensions();
    let pixel_count = width as usize * height as usize;

    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);
    for pixel in raster.pixels() {
        let [r, g, b, a] = pixel.0;
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
    }

    let mut image_dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
    };

    // Fully opaque slices do not need a mask
    if alpha.iter().any(|&a| a != u8::MAX) {
        let mut mask = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            alpha,
        );
        mask.compress()?;
        let mask_id = doc.add_object(mask);
        image_dict.set("SMask", Object::Reference(mask_id));
    }

    let mut image_stream = Stream::new(image_dict, rgb);
    image_stream.compress()?;
    Ok(doc.add_object(image_stream))
}
