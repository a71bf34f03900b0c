use std::io::Cursor;

use stripbooth::{
    AssetStore, Bitmap, BoothConfig, BoothError, CanvasSize, Compositor, CountdownStep,
    HandoffStore, MemoryHandoff, MirrorPolicy, Page, PreviewTick, RecordingNavigator, Stage,
    StillSource, decode_data_url,
};

/// Handoff store that counts writes.
#[derive(Default)]
struct CountingHandoff {
    inner: MemoryHandoff,
    puts: usize,
}

impl HandoffStore for CountingHandoff {
    fn put(&mut self, value: String) -> stripbooth::BoothResult<()> {
        self.puts += 1;
        self.inner.put(value)
    }

    fn take(&mut self) -> stripbooth::BoothResult<Option<String>> {
        self.inner.take()
    }

    fn clear(&mut self) -> stripbooth::BoothResult<()> {
        self.inner.clear()
    }
}

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];

fn small_config() -> BoothConfig {
    BoothConfig {
        canvas: CanvasSize {
            width: 16,
            height: 20,
        },
        ..BoothConfig::default()
    }
}

/// Transparent overlay with an opaque green first row.
fn frame_overlay(w: u32, h: u32) -> Bitmap {
    let mut data = vec![0u8; (w * h * 4) as usize];
    for px in data[..(w * 4) as usize].chunks_exact_mut(4) {
        px.copy_from_slice(&GREEN);
    }
    Bitmap::from_premul(w, h, data).unwrap()
}

fn assets_with_frame() -> AssetStore {
    let mut assets = AssetStore::new("/nonexistent-root");
    assets
        .insert("stickers/frame.png", frame_overlay(16, 20))
        .unwrap();
    assets
}

/// Left half `left`, right half `right`.
fn split_png(w: u32, h: u32, left: [u8; 4], right: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(w, h, |x, _| {
        image::Rgba(if x < w / 2 { left } else { right })
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn solid_png(w: u32, h: u32, c: [u8; 4]) -> Vec<u8> {
    split_png(w, h, c, c)
}

#[test]
fn upload_flow_finalizes_once() {
    let mut c = Compositor::new(
        small_config(),
        assets_with_frame(),
        CountingHandoff::default(),
        RecordingNavigator::new(),
    )
    .unwrap();

    assert_eq!(c.upload(&solid_png(32, 20, RED)).unwrap(), Stage::Bottom);
    assert!(c.strip().is_none());
    assert_eq!(c.handoff().puts, 0);

    assert_eq!(c.upload(&solid_png(32, 20, BLUE)).unwrap(), Stage::Done);
    assert_eq!(c.handoff().puts, 1);
    assert_eq!(c.navigator().visits(), &[Page::Editor]);

    let strip = c.strip().unwrap().clone();
    assert_eq!(strip.pixel(5, 0), Some(GREEN));
    assert_eq!(strip.pixel(5, 5), Some(RED));
    assert_eq!(strip.pixel(5, 15), Some(BLUE));

    let (mut handoff, _nav) = c.into_parts();
    let payload = handoff.take().unwrap().unwrap();
    assert_eq!(decode_data_url(&payload).unwrap(), strip);
    assert_eq!(handoff.take().unwrap(), None);
}

#[test]
fn third_upload_is_rejected_and_changes_nothing() {
    let mut c = Compositor::new(
        small_config(),
        assets_with_frame(),
        CountingHandoff::default(),
        RecordingNavigator::new(),
    )
    .unwrap();
    c.upload(&solid_png(8, 8, RED)).unwrap();
    c.upload(&solid_png(8, 8, BLUE)).unwrap();
    let before = c.surface().data().to_vec();

    let err = c.upload(&solid_png(8, 8, GREEN)).unwrap_err();
    assert!(matches!(err, BoothError::OverCapture));
    assert!(matches!(c.take_photo(), Err(BoothError::OverCapture)));
    assert!(matches!(c.capture(), Err(BoothError::OverCapture)));
    assert_eq!(c.stage(), Stage::Done);
    assert_eq!(c.session().captured().len(), 2);
    assert_eq!(c.surface().data(), &before[..]);
    assert_eq!(c.handoff().puts, 1);
    assert_eq!(c.navigator().visits().len(), 1);
}

#[test]
fn missing_frame_overlay_blocks_handoff() {
    let mut c = Compositor::new(
        small_config(),
        AssetStore::new("/nonexistent-root"),
        CountingHandoff::default(),
        RecordingNavigator::new(),
    )
    .unwrap();
    c.upload(&solid_png(8, 8, RED)).unwrap();
    let err = c.upload(&solid_png(8, 8, BLUE)).unwrap_err();
    assert!(matches!(err, BoothError::Decode(_)));
    assert_eq!(c.stage(), Stage::Done);
    assert!(c.strip().is_none());
    assert_eq!(c.handoff().puts, 0);
    assert!(c.navigator().visits().is_empty());
}

#[test]
fn upload_mirroring_follows_policy() {
    let png = split_png(32, 20, RED, BLUE);

    let mut mirrored = Compositor::new(
        small_config(),
        assets_with_frame(),
        MemoryHandoff::new(),
        RecordingNavigator::new(),
    )
    .unwrap();
    mirrored.upload(&png).unwrap();
    assert_eq!(mirrored.surface().pixel(1, 5), Some(BLUE));
    assert_eq!(mirrored.surface().pixel(14, 5), Some(RED));

    let config = BoothConfig {
        mirror: MirrorPolicy {
            live: true,
            upload: false,
        },
        ..small_config()
    };
    let mut plain = Compositor::new(
        config,
        assets_with_frame(),
        MemoryHandoff::new(),
        RecordingNavigator::new(),
    )
    .unwrap();
    plain.upload(&png).unwrap();
    assert_eq!(plain.surface().pixel(1, 5), Some(RED));
    assert_eq!(plain.surface().pixel(14, 5), Some(BLUE));
}

#[test]
fn wide_upload_is_center_cropped() {
    // 64x20 source into a 16x10 cell (aspect 1.6): only the middle 32 columns survive.
    let img = image::RgbaImage::from_fn(64, 20, |x, _| {
        image::Rgba(if (16..48).contains(&x) { GREEN } else { RED })
    });
    let mut png = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();

    let mut c = Compositor::new(
        small_config(),
        assets_with_frame(),
        MemoryHandoff::new(),
        RecordingNavigator::new(),
    )
    .unwrap();
    c.upload(&png).unwrap();
    for x in 0..16 {
        assert_eq!(c.surface().pixel(x, 5), Some(GREEN), "column {x}");
    }
}

#[test]
fn live_flow_captures_both_cells_after_countdowns() {
    let mut c = Compositor::new(
        small_config(),
        assets_with_frame(),
        CountingHandoff::default(),
        RecordingNavigator::new(),
    )
    .unwrap();
    c.attach_live(Box::new(StillSource::new(Bitmap::solid(64, 40, RED))));

    assert_eq!(c.on_animation_frame().unwrap(), PreviewTick::Continue);
    assert_eq!(c.take_photo().unwrap(), 3);
    assert_eq!(c.on_countdown_tick().unwrap(), CountdownStep::Show(2));
    assert_eq!(c.on_countdown_tick().unwrap(), CountdownStep::Show(1));
    assert_eq!(c.on_countdown_tick().unwrap(), CountdownStep::Fire);
    assert_eq!(c.stage(), Stage::Bottom);
    assert_eq!(c.session().captured()[0].pixel(0, 0), Some(RED));

    // The preview now targets the bottom cell and leaves the captured top cell alone.
    c.attach_live(Box::new(StillSource::new(Bitmap::solid(64, 40, BLUE))));
    assert_eq!(c.on_animation_frame().unwrap(), PreviewTick::Continue);
    assert_eq!(c.surface().pixel(8, 5), Some(RED));
    assert_eq!(c.surface().pixel(8, 15), Some(BLUE));

    c.take_photo().unwrap();
    for _ in 0..3 {
        c.on_countdown_tick().unwrap();
    }
    assert_eq!(c.stage(), Stage::Done);
    assert_eq!(c.handoff().puts, 1);
    assert_eq!(c.navigator().last(), Some(Page::Editor));
    assert_eq!(c.on_animation_frame().unwrap(), PreviewTick::Stop);
    assert_eq!(c.on_countdown_tick().unwrap(), CountdownStep::Idle);
    assert_eq!(c.handoff().puts, 1);
}

#[test]
fn preview_filter_applies_to_live_draw() {
    let config = BoothConfig {
        preview_filter: Some("grayscale(100%)".to_string()),
        ..small_config()
    };
    let mut c = Compositor::new(
        config,
        assets_with_frame(),
        MemoryHandoff::new(),
        RecordingNavigator::new(),
    )
    .unwrap();
    c.attach_live(Box::new(StillSource::new(Bitmap::solid(16, 10, RED))));
    c.on_animation_frame().unwrap();
    let [r, g, b, a] = c.surface().pixel(4, 4).unwrap();
    assert_eq!((r, a), (g, 255));
    assert_eq!(g, b);
}

#[test]
fn default_canvas_end_to_end() {
    let mut c = Compositor::new(
        BoothConfig::default(),
        {
            let mut a = AssetStore::new("/nonexistent-root");
            a.insert("stickers/frame.png", Bitmap::solid(10, 10, [0, 0, 0, 0]))
                .unwrap();
            a
        },
        CountingHandoff::default(),
        RecordingNavigator::new(),
    )
    .unwrap();
    c.upload(&solid_png(1920, 1080, RED)).unwrap();
    c.upload(&solid_png(1080, 1920, BLUE)).unwrap();
    let strip = c.strip().unwrap();
    assert_eq!((strip.width, strip.height), (1176, 1470));
    assert_eq!(strip.pixel(588, 0), Some(RED));
    assert_eq!(strip.pixel(588, 734), Some(RED));
    assert_eq!(strip.pixel(588, 735), Some(BLUE));
    assert_eq!(c.handoff().puts, 1);
}
