//! End-to-end composition through the public API with the production backend.
//!
//! Sources are generated in memory; the only network traffic is to loopback
//! listeners owned by the test.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use meme_caption::compose::{
    CaptionRequest, CaptionSource, ComposeError, Composer, CompositionRequest,
};
use meme_caption::fetch::Fetcher;
use meme_caption::imaging::{CaptionStyle, LayerPosition, RustBackend, plan_caption};
use std::net::TcpListener;
use std::time::{Duration, Instant};

fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 90])
    });
    let mut buf = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn composer(timeout: Duration) -> Composer<RustBackend> {
    Composer::with_backend(
        RustBackend::new(),
        Fetcher::with_timeout(timeout).unwrap(),
        CaptionStyle::default(),
    )
}

#[test]
fn scales_800x600_to_1024x768() {
    let result = composer(Duration::from_secs(5))
        .compose(
            CaptionSource::Bytes(gradient_png(800, 600)),
            &CompositionRequest::captions("When the sprint ends", "but the bugs start"),
        )
        .unwrap();

    assert_eq!((result.width, result.height), (1024, 768));
    let decoded = image::load_from_memory(&result.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1024, 768));
    assert_eq!(
        image::guess_format(&result.bytes).unwrap(),
        ImageFormat::Jpeg
    );
}

#[test]
fn caption_blocks_sit_at_top_and_bottom() {
    let plan = plan_caption(
        (800, 600),
        "WHEN THE SPRINT ENDS",
        "BUT THE BUGS START",
        1024,
        &CaptionStyle::default(),
    );
    let fs = plan.canvas.font_size as f32;
    let height = plan.canvas.height as f32;

    let top = &plan.layers[0];
    let bottom = &plan.layers[1];
    assert_eq!(top.position, LayerPosition::Top);
    assert_eq!(bottom.position, LayerPosition::Bottom);

    let first_top = top.baselines[0];
    assert!(first_top >= fs * 1.2 && first_top <= fs * 1.3 + 0.01);
    let last_bottom = *bottom.baselines.last().unwrap();
    assert!((last_bottom - (height - fs * 0.5)).abs() < 0.01);

    // Blocks do not overlap: the top block ends above where the bottom starts.
    let top_end = *top.baselines.last().unwrap();
    let bottom_start = bottom.baselines[0] - fs;
    assert!(top_end < bottom_start);
}

#[test]
fn captions_are_painted_in_their_bands_only() {
    let gray = RgbImage::from_pixel(800, 600, Rgb([128, 128, 128]));
    let mut png = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(gray)
        .write_to(&mut png, ImageFormat::Png)
        .unwrap();

    let result = composer(Duration::from_secs(5))
        .compose(
            CaptionSource::Bytes(png.into_inner()),
            &CompositionRequest::captions("When the sprint ends", "but the bugs start"),
        )
        .unwrap();
    let out = image::load_from_memory(&result.bytes).unwrap().to_rgb8();
    assert_eq!(out.dimensions(), (1024, 768));

    // font size 61: top glyphs sit above y=100, bottom glyphs below y=660.
    let count = |rows: std::ops::Range<u32>, pred: &dyn Fn(&Rgb<u8>) -> bool| {
        rows.flat_map(|y| (0..out.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| pred(out.get_pixel(x, y)))
            .count()
    };
    let white = |p: &Rgb<u8>| p.0.iter().all(|&c| c > 220);
    let black = |p: &Rgb<u8>| p.0.iter().all(|&c| c < 35);
    let gray_ish = |p: &Rgb<u8>| p.0.iter().all(|&c| c.abs_diff(128) <= 4);

    for band in [0..110, 650..768] {
        let w = count(band.clone(), &white);
        let b = count(band.clone(), &black);
        assert!(w > 200 && b > 200, "band {band:?}: white={w} black={b}");
    }

    let middle = 250..500;
    let total = (middle.end - middle.start) as usize * out.width() as usize;
    assert_eq!(count(middle, &gray_ish), total);
}

#[test]
fn tall_source_keeps_target_width() {
    let result = composer(Duration::from_secs(5))
        .compose(
            CaptionSource::Bytes(gradient_png(200, 4000)),
            &CompositionRequest::captions("top", "bottom"),
        )
        .unwrap();
    assert_eq!((result.width, result.height), (1024, 20_480));
}

#[test]
fn no_captions_is_plain_resize() {
    let composer = composer(Duration::from_secs(5));
    let png = gradient_png(400, 300);

    let result = composer
        .compose(
            CaptionSource::Bytes(png.clone()),
            &CompositionRequest::captions("", ""),
        )
        .unwrap();
    assert_eq!((result.width, result.height), (1024, 768));

    // Plain resize of the same source, encoded the same way.
    let expected = {
        let img = image::load_from_memory(&png)
            .unwrap()
            .resize_exact(1024, 768, image::imageops::FilterType::Lanczos3)
            .to_rgb8();
        let mut out = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, 90);
        DynamicImage::ImageRgb8(img).write_with_encoder(encoder).unwrap();
        out
    };
    assert_eq!(result.bytes, expected);
}

#[test]
fn identical_inputs_give_identical_bytes() {
    let composer = composer(Duration::from_secs(5));
    let png = gradient_png(640, 480);
    let request = CompositionRequest::new("one does not simply", "write deterministic code", 800, 85)
        .unwrap();

    let a = composer
        .compose(CaptionSource::Bytes(png.clone()), &request)
        .unwrap();
    let b = composer.compose(CaptionSource::Bytes(png), &request).unwrap();
    assert_eq!(a.bytes, b.bytes);
}

#[test]
fn single_caption_splits_at_character_midpoint() {
    let text: String = "0123456789".repeat(20);
    let request = CompositionRequest::try_from(CaptionRequest {
        text: Some(text.clone()),
        ..CaptionRequest::default()
    })
    .unwrap();

    assert_eq!(request.top_text().chars().count(), 100);
    assert_eq!(format!("{}{}", request.top_text(), request.bottom_text()), text);
}

#[test]
fn undecodable_bytes_fail_to_decode() {
    let err = composer(Duration::from_secs(5))
        .compose(
            CaptionSource::Bytes(b"GIF89a but not really".to_vec()),
            &CompositionRequest::captions("a", "b"),
        )
        .unwrap_err();
    assert!(matches!(err, ComposeError::DecodeFailed(_)));
}

#[test]
fn unreachable_source_fails_within_timeout() {
    // Accepts connections but never answers.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/template.jpg", listener.local_addr().unwrap());
    let timeout = Duration::from_millis(500);

    let started = Instant::now();
    let err = composer(timeout)
        .compose(
            CaptionSource::Url(url),
            &CompositionRequest::captions("a", "b"),
        )
        .unwrap_err();

    match err {
        ComposeError::FetchFailed(fetch) => assert!(fetch.is_timeout(), "{fetch}"),
        other => panic!("expected FetchFailed, got {other:?}"),
    }
    assert!(started.elapsed() < timeout * 10);
    drop(listener);
}
