use super::*;

fn system_engine() -> Option<TextEngine> {
    let font = FontSource::System.load().ok()??;
    TextEngine::new(&font).ok()
}

#[test]
fn single_line_flattens_breaks() {
    assert_eq!(single_line("a\nb\r\nc\n"), "a b  c");
    assert_eq!(single_line(""), "");
}

#[test]
fn font_source_none_disables_text() {
    assert!(FontSource::None.load().unwrap().is_none());
}

#[test]
fn missing_font_file_is_an_error() {
    let src = FontSource::File {
        path: PathBuf::from("/definitely/not/here.ttf"),
    };
    assert!(src.load().is_err());
}

#[test]
fn font_source_serde_tagging() {
    let src: FontSource =
        serde_json::from_str(r#"{"kind":"file","path":"fonts/Inter.ttf"}"#).unwrap();
    assert_eq!(
        src,
        FontSource::File {
            path: PathBuf::from("fonts/Inter.ttf")
        }
    );
    let sys: FontSource = serde_json::from_str(r#"{"kind":"system"}"#).unwrap();
    assert_eq!(sys, FontSource::System);
}

#[test]
fn draw_text_with_system_font_if_present() {
    let Some(mut engine) = system_engine() else {
        return;
    };
    let mut canvas = RasterImage::new(200, 60).unwrap();
    engine
        .draw_text(&mut canvas, Point::new(4.0, 4.0), "Hello", 32.0, Rgba8::WHITE)
        .unwrap();
    assert!(canvas.as_bytes().chunks_exact(4).any(|px| px[3] > 0));
    assert!(engine.measure("Hello", 32.0).unwrap() > 0.0);
}

#[test]
fn draw_text_past_the_edge_is_clipped() {
    let Some(mut engine) = system_engine() else {
        return;
    };
    let mut canvas = RasterImage::new(20, 20).unwrap();
    engine
        .draw_text(
            &mut canvas,
            Point::new(10.0, 10.0),
            "a very long line that cannot fit",
            28.0,
            Rgba8::WHITE,
        )
        .unwrap();
    engine
        .draw_text(&mut canvas, Point::new(500.0, 500.0), "gone", 28.0, Rgba8::WHITE)
        .unwrap();
}

#[test]
fn draw_text_rejects_bad_size() {
    let Some(mut engine) = system_engine() else {
        return;
    };
    let mut canvas = RasterImage::new(20, 20).unwrap();
    assert!(
        engine
            .draw_text(&mut canvas, Point::ORIGIN, "x", 0.0, Rgba8::WHITE)
            .is_err()
    );
}

#[test]
fn shaped_runs_use_the_loaded_face() {
    let Some(font) = FontSource::System.load().ok().flatten() else {
        return;
    };
    let mut engine = TextEngine::new(&font).unwrap();
    let layout = engine
        .layout_line("Hello", 24.0, TextBrushRgba8::default())
        .unwrap();
    let mut runs = 0;
    for line in layout.lines() {
        for item in line.items() {
            if let parley::layout::PositionedLayoutItem::GlyphRun(run) = item {
                let shaped = run.run().font();
                assert_eq!(shaped.index, font.index);
                assert_eq!(shaped.data.data().len(), font.bytes.len());
                runs += 1;
            }
        }
    }
    assert!(runs > 0);
}
