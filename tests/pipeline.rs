//! End-to-end runs through the public API: config file, job list and traits
//! directory on disk, real decoding and quantization, both output modes.

use image::{ImageFormat, Rgba, RgbaImage};
use layergen::config::load_config;
use layergen::generate::{self, GenerateEvent, GenerateOptions};
use layergen::scan::{TraitCatalog, load_descriptors};
use std::io::Cursor;
use std::path::Path;
use tempfile::TempDir;

fn png(image: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Opaque `color` on the left half, transparent on the right.
fn left_half(size: u32, color: [u8; 4]) -> Vec<u8> {
    png(&RgbaImage::from_fn(size, size, |x, _| {
        if x < size / 2 {
            Rgba(color)
        } else {
            Rgba([0, 0, 0, 0])
        }
    }))
}

fn write(path: &Path, bytes: &[u8]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, bytes).unwrap();
}

fn close(a: [u8; 4], b: [u8; 4]) -> bool {
    a.iter().zip(b).all(|(x, y)| x.abs_diff(y) <= 12)
}

/// Project with layers `sky` (solid) and `hill` (left half only).
fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(
        &root.join("config.json"),
        br#"{
            "name": "Hills",
            "order": ["sky", "hill"],
            "width": 40,
            "height": 40,
            "processing": {"max_workers": 3}
        }"#,
    );
    write(
        &root.join("traits/sky/blue.png"),
        &png(&RgbaImage::from_pixel(20, 20, Rgba([40, 90, 220, 255]))),
    );
    write(
        &root.join("traits/sky/dusk.png"),
        &png(&RgbaImage::from_pixel(20, 20, Rgba([230, 120, 40, 255]))),
    );
    write(
        &root.join("traits/hill/green.png"),
        &left_half(20, [30, 160, 60, 255]),
    );

    let jobs: Vec<serde_json::Value> = (1..=6)
        .map(|id| {
            let sky = if id % 2 == 0 { "dusk.png" } else { "blue.png" };
            serde_json::json!({"id": id, "sky": sky, "hill": "green.png"})
        })
        .collect();
    write(
        &root.join("jobs.json"),
        serde_json::to_string(&jobs).unwrap().as_bytes(),
    );
    tmp
}

#[test]
fn file_mode_writes_one_png_per_job() {
    let tmp = project();
    let root = tmp.path();
    let config = load_config(&root.join("config.json")).unwrap();
    let descriptors = load_descriptors(&root.join("jobs.json")).unwrap();
    let assets = root.join("assets");
    std::fs::create_dir_all(&assets).unwrap();

    let (tx, rx) = std::sync::mpsc::channel();
    let summary = generate::generate_files(
        &config,
        descriptors,
        &root.join("traits"),
        &assets,
        &GenerateOptions::from_config(&config),
        Some(tx),
    )
    .unwrap();

    assert!(summary.is_success());
    assert_eq!(summary.workers, 3);
    assert_eq!(summary.generated.len(), 6);

    let events: Vec<GenerateEvent> = rx.into_iter().collect();
    assert!(matches!(
        events[0],
        GenerateEvent::Started {
            total: 6,
            workers: 3
        }
    ));
    assert_eq!(events.len(), 7);

    for index in 0..6u32 {
        let output = image::open(assets.join(format!("{index}.png")))
            .unwrap()
            .to_rgba8();
        assert_eq!(output.dimensions(), (40, 40));

        let sky = if (index + 1) % 2 == 0 {
            [230, 120, 40, 255]
        } else {
            [40, 90, 220, 255]
        };
        assert!(close(output.get_pixel(5, 20).0, [30, 160, 60, 255]));
        assert!(close(output.get_pixel(35, 20).0, sky));
    }
}

#[test]
fn buffer_mode_matches_file_mode_names() {
    let tmp = project();
    let root = tmp.path();
    let config = load_config(&root.join("config.json")).unwrap();
    let descriptors = load_descriptors(&root.join("jobs.json")).unwrap();
    let catalog = TraitCatalog::scan(&root.join("traits"), &config.order).unwrap();
    assert!(catalog.missing_traits(&descriptors).is_empty());
    let sources = catalog.to_source_table().unwrap();

    let output = generate::generate_in_memory(
        &config,
        descriptors,
        &sources,
        &GenerateOptions::default().with_max_workers(2),
        None,
    )
    .unwrap();

    assert_eq!(output.summary.workers, 2);
    let names: Vec<&str> = output.images.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec!["0.png", "1.png", "2.png", "3.png", "4.png", "5.png"]
    );
    for bytes in output.images.values() {
        let decoded = image::load_from_memory(bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 40));
    }
}

#[test]
fn missing_trait_fails_only_its_job() {
    let tmp = project();
    let root = tmp.path();
    let config = load_config(&root.join("config.json")).unwrap();
    let mut descriptors = load_descriptors(&root.join("jobs.json")).unwrap();
    descriptors[3].layers.insert("hill".into(), "cliff.png".into());
    let assets = root.join("assets");
    std::fs::create_dir_all(&assets).unwrap();

    let catalog = TraitCatalog::scan(&root.join("traits"), &config.order).unwrap();
    let missing = catalog.missing_traits(&descriptors);
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].id, 4);

    let summary = generate::generate_files(
        &config,
        descriptors,
        &root.join("traits"),
        &assets,
        &GenerateOptions::from_config(&config),
        None,
    )
    .unwrap();

    assert_eq!(summary.generated.len(), 5);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].id, 4);
    assert!(!assets.join("3.png").exists());
    assert!(assets.join("4.png").exists());
}
