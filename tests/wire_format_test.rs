//! Integration tests for the JSON shape of extracted documents.

use unocr::render::{to_json, to_json_value, JsonFormat};
use unocr::{extract, extract_markdown, AssetMap, ContentItem, ImageAsset, UnifiedDocument};

const SAMPLE: &str = "# Results\n\nEnergy $E=mc^2$.\n\n| a | b |\n|---|---|\n| 1 | 2 |\n\n![plot](fig.png)";

#[test]
fn test_top_level_keys() {
    let doc = extract_markdown(SAMPLE).unwrap();
    let value = to_json_value(&doc).unwrap();

    for key in [
        "text",
        "tables",
        "formulas",
        "images",
        "handwritten",
        "performance",
        "metadata",
    ] {
        assert!(value.get(key).is_some(), "missing key {}", key);
    }
    assert!(value["text"].get("fullText").is_some());
    assert!(value["text"].get("textBlocks").is_some());
    assert!(value["text"].get("keywords").is_some());
    assert!(value["text"]["stats"].get("characters").is_some());
}

#[test]
fn test_record_wire_names() {
    let doc = extract_markdown(SAMPLE).unwrap();
    let value = to_json_value(&doc).unwrap();

    let table = &value["tables"][0];
    assert_eq!(table["rowCount"], 1);
    assert_eq!(table["columnCount"], 2);
    assert_eq!(table["source"], "pipe");

    let formula = &value["formulas"][0];
    assert_eq!(formula["type"], "inline");
    assert_eq!(formula["formula"], "E=mc^2");

    let image = &value["images"][0];
    assert_eq!(image["type"], "markdown");
    assert_eq!(image["altText"], "plot");

    let metadata = &value["metadata"];
    assert_eq!(metadata["mode"], "fallback");
    assert_eq!(
        metadata["contentTypes"],
        serde_json::json!(["text", "tables", "formulas", "images"])
    );
    assert!(metadata.get("processingTime").is_some());
}

#[test]
fn test_positions_serialized_for_items() {
    let items = vec![ContentItem::new("image", "diagram")
        .with_img_path("a.png")
        .with_bbox([1.0, 2.0, 3.0, 4.0])
        .with_page(1)];
    let mut assets = AssetMap::new();
    assets.insert("a.png".into(), ImageAsset::Encoded("AAAA".into()));

    let doc = extract("", Some(items), Some(assets)).unwrap();
    let value = to_json_value(&doc).unwrap();

    let image = &value["images"][0];
    assert_eq!(image["bbox"], serde_json::json!([1.0, 2.0, 3.0, 4.0]));
    assert!(image.get("position").is_none());
    assert_eq!(image["page"], 1);
    assert_eq!(image["base64"], "data:image/png;base64,AAAA");
    assert_eq!(value["metadata"]["mode"], "structured");
}

#[test]
fn test_json_round_trip() {
    let mut doc = extract_markdown(SAMPLE).unwrap();
    // timings are not exact through JSON
    doc.metadata.processing_time = None;
    doc.performance_hint.speed = 0.0;

    let json = to_json(&doc, JsonFormat::Compact).unwrap();
    let parsed: UnifiedDocument = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, doc);
}
