use std::io::Cursor;

use super::*;

fn png_bytes(width: u32, height: u32, rgba: Vec<u8>) -> Vec<u8> {
    let img = image::RgbaImage::from_raw(width, height, rgba).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_png_dimensions_and_premul() {
    let buf = png_bytes(1, 1, vec![100, 50, 200, 128]);
    let img = RasterImage::decode(&buf).unwrap();
    assert_eq!((img.width(), img.height()), (1, 1));
    assert_eq!(
        img.pixel(0, 0).unwrap(),
        [
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128
        ]
    );
}

#[test]
fn decode_rejects_garbage_and_empty_input() {
    assert!(matches!(
        RasterImage::decode(b"definitely not a png"),
        Err(ReelError::InvalidImage(_))
    ));
    assert!(matches!(
        RasterImage::decode(&[]),
        Err(ReelError::InvalidImage(_))
    ));
}

#[test]
fn zero_size_images_are_invalid() {
    assert!(RasterImage::new(0, 10).is_err());
    assert!(RasterImage::filled(10, 0, [0, 0, 0, 255]).is_err());
    assert!(RasterImage::from_premul(2, 2, vec![0; 15]).is_err());
}

#[test]
fn png_roundtrip_preserves_opaque_pixels() {
    let img = RasterImage::filled(3, 2, [10, 20, 30, 255]).unwrap();
    let back = RasterImage::decode(&img.encode_png().unwrap()).unwrap();
    assert_eq!(back, img);
}

#[test]
fn mask_gates_pixels() {
    let mut img = RasterImage::filled(2, 1, [200, 100, 50, 255]).unwrap();
    let mask = Mask::from_raw(2, 1, vec![0, 255]).unwrap();
    apply_mask(&mut img, &mask).unwrap();
    assert_eq!(img.pixel(0, 0).unwrap(), [0, 0, 0, 0]);
    assert_eq!(img.pixel(1, 0).unwrap(), [200, 100, 50, 255]);

    let wrong = Mask::from_raw(1, 1, vec![255]).unwrap();
    assert!(apply_mask(&mut img, &wrong).is_err());
}
