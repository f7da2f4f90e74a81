use hrviz::classifier::{Classifier, KeywordClassifier};
use hrviz::config::AppConfig;
use hrviz::export::{export_scene, render_svg, unique_export_path, write_png};
use hrviz::payload::ChatResponse;
use hrviz::scene::{ChartPalette, Rgba, Scene};
use hrviz::{render_response_to_file, scene_for_response, ExportFormat};
use std::fs;
use tempfile::TempDir;

fn response(json: &str) -> ChatResponse {
    ChatResponse::from_json(json).expect("Failed to parse response")
}

fn funnel() -> ChatResponse {
    response(
        r#"{"type":"funnel","title":"Recruitment Funnel","data":{
            "headers":["Stage","Candidates"],
            "rows":[["Applied","400"],["Screened","180"],["Interviewed","60"],["Hired","12"]]
        }}"#,
    )
}

#[test]
fn test_svg_export_of_every_kind() {
    let config = AppConfig::default();
    let palette = ChartPalette::default();
    let payloads = [
        r#"{"type":"table","data":{"headers":["Name","Start"],"rows":[["Ana","2024-03-01"]]}}"#,
        r#"{"type":"chart","data":{"chartType":"line","data":[{"label":"Jan","value":3},{"label":"Feb","value":5}]}}"#,
        r#"{"type":"gantt","data":{"headers":["Id","Task","Start","Days"],"rows":[["1","Paperwork","Day 1","2"],["2","Training","Day 3","5"]]}}"#,
        r#"{"type":"treemap","data":{"headers":["Category","Item","Budget","Note"],"rows":[["Tech","Cloud","12000",""],["People","Coaching","3000",""]]}}"#,
    ];
    for json in payloads {
        let scene = scene_for_response(&response(json), &config.layout, &palette).unwrap();
        let svg = render_svg(&scene);
        assert!(svg.starts_with("<svg"), "bad svg for {}", json);
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(!svg.contains("NaN"));
    }
}

#[test]
fn test_render_response_to_file_writes_svg() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("funnel.svg");
    render_response_to_file(&funnel(), &path, ExportFormat::Svg, &AppConfig::default()).unwrap();
    let svg = fs::read_to_string(&path).unwrap();
    assert!(svg.contains("<title>Recruitment Funnel</title>"));
    assert!(svg.contains("Hired"));
}

#[test]
fn test_export_to_missing_directory_fails_with_context() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join("chart.svg");
    let config = AppConfig::default();
    let scene =
        scene_for_response(&funnel(), &config.layout, &ChartPalette::default()).unwrap();
    let err = export_scene(&path, &scene, ExportFormat::Svg, 1.0).unwrap_err();
    assert!(err.to_string().contains("Failed to export chart"));
}

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Width and height from the IHDR chunk.
fn png_size(bytes: &[u8]) -> (u32, u32) {
    let word = |at: usize| u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
    (word(16), word(20))
}

#[test]
fn test_png_export_of_every_catalog_chart() {
    let dir = TempDir::new().unwrap();
    let config = AppConfig::default();
    let classifier = KeywordClassifier::builtin().unwrap();
    let mut written = 0;
    for (i, prompt) in classifier.prompts().iter().enumerate() {
        let response = classifier.classify(prompt).unwrap();
        if scene_for_response(&response, &config.layout, &ChartPalette::default()).is_none() {
            continue;
        }
        let path = dir.path().join(format!("chart-{}.png", i));
        render_response_to_file(&response, &path, ExportFormat::Png, &config).unwrap();
        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(PNG_SIGNATURE), "not a PNG for {}", prompt);
        written += 1;
    }
    assert!(written >= 9, "only {} charts exported", written);
}

#[test]
fn test_png_scale_multiplies_pixel_size() {
    let dir = TempDir::new().unwrap();
    let config = AppConfig::default();
    let scene =
        scene_for_response(&funnel(), &config.layout, &ChartPalette::default()).unwrap();
    let single = dir.path().join("single.png");
    let double = dir.path().join("double.png");
    write_png(&single, &scene, 1.0).unwrap();
    write_png(&double, &scene, 2.0).unwrap();

    let (w1, h1) = png_size(&fs::read(&single).unwrap());
    let (w2, h2) = png_size(&fs::read(&double).unwrap());
    assert_eq!((w1, h1), (scene.width.ceil() as u32, scene.height.ceil() as u32));
    assert_eq!((w2, h2), ((scene.width * 2.0).ceil() as u32, (scene.height * 2.0).ceil() as u32));
    assert!(w2 >= 2 * w1 - 1 && h2 >= 2 * h1 - 1);
}

#[test]
fn test_png_rejects_empty_scene() {
    let dir = TempDir::new().unwrap();
    let scene = Scene {
        width: 0.0,
        height: 0.0,
        title: None,
        background: Rgba::rgb(255, 255, 255),
        items: Vec::new(),
    };
    assert!(write_png(&dir.path().join("empty.png"), &scene, 1.0).is_err());
}

#[test]
fn test_unique_path_skips_existing_files() {
    let dir = TempDir::new().unwrap();
    let first = unique_export_path(dir.path(), Some("Recruitment Funnel"), ExportFormat::Svg);
    assert_eq!(first.file_name().unwrap(), "recruitment-funnel.svg");
    fs::write(&first, "x").unwrap();
    let second = unique_export_path(dir.path(), Some("Recruitment Funnel"), ExportFormat::Svg);
    assert_eq!(second.file_name().unwrap(), "recruitment-funnel-2.svg");
}
