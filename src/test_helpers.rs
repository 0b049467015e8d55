//! Shared test utilities for the meme-caption test suite.
//!
//! Provides in-memory source images and a one-shot HTTP server so fetch and
//! compose tests run without fixtures on disk or network access.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let png = encode_png(&gradient_image(800, 600));
//! let url = serve_once(200, "image/png", png);
//! ```

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::{Read, Write};
use std::net::TcpListener;

// =========================================================================
// Source images
// =========================================================================

/// A smooth RGB gradient; deterministic for a given size.
pub fn gradient_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        Rgb([r, g, 128])
    })
}

/// Encode an image as PNG bytes.
pub fn encode_png(img: &RgbImage) -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// Encode an image as JPEG bytes.
pub fn encode_jpeg(img: &RgbImage) -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut buf, ImageFormat::Jpeg)
        .unwrap();
    buf.into_inner()
}

// =========================================================================
// HTTP
// =========================================================================

/// Serve a single HTTP response on a loopback port and return its URL.
///
/// The server thread answers exactly one request, then exits.
pub fn serve_once(status: u16, content_type: &str, body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let content_type = content_type.to_string();

    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut request = [0u8; 4096];
            let _ = stream.read(&mut request);
            let head = format!(
                "HTTP/1.1 {status} X\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&body);
        }
    });

    format!("http://{addr}/image")
}

/// Accept connections on a loopback port but never answer.
///
/// The listener lives as long as the returned guard, so requests hang until
/// the client gives up.
pub fn silent_server() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/slow", listener.local_addr().unwrap());
    (listener, url)
}
