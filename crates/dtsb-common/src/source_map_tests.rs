use super::*;
use serde_json::Value;

fn decode_all(mappings: &str) -> Vec<(u32, u32, u32, u32)> {
    let mut decoded = Vec::new();
    let (mut original_line, mut original_column) = (0i32, 0i32);
    for (line, segments) in mappings.split(';').enumerate() {
        let mut column = 0i32;
        for segment in segments.split(',').filter(|s| !s.is_empty()) {
            let mut rest = segment;
            let mut fields = Vec::new();
            while !rest.is_empty() {
                let (value, consumed) = vlq::decode(rest).expect("valid vlq");
                fields.push(value);
                rest = &rest[consumed..];
            }
            column += fields[0];
            original_line += fields[2];
            original_column += fields[3];
            decoded.push((
                line as u32,
                column as u32,
                original_line as u32,
                original_column as u32,
            ));
        }
    }
    decoded
}

#[test]
fn test_vlq_encode_positive() {
    assert_eq!(vlq::encode(0), "A");
    assert_eq!(vlq::encode(1), "C");
    assert_eq!(vlq::encode(15), "e");
    assert_eq!(vlq::encode(16), "gB");
}

#[test]
fn test_vlq_encode_negative() {
    assert_eq!(vlq::encode(-1), "D");
    assert_eq!(vlq::encode(-15), "f");
}

#[test]
fn test_vlq_decode() {
    for value in [-100, -1, 0, 1, 100, 1000] {
        let encoded = vlq::encode(value);
        let (decoded, consumed) = vlq::decode(&encoded).unwrap();
        assert_eq!(decoded, value, "Failed for value {value}");
        assert_eq!(consumed, encoded.len());
    }
}

#[test]
fn test_source_map_with_content_and_names() {
    let mut generator = SourceMapGenerator::new("index.d.ts".to_string());
    let source = generator.add_source_with_content(
        "src/a.d.ts".to_string(),
        "declare const x: number;".to_string(),
    );
    let name = generator.add_name("x".to_string());
    generator.add_named_mapping(0, 14, source, 0, 14, name);

    let json: Value = serde_json::from_str(&generator.to_json()).expect("valid json");
    assert_eq!(json["version"], 3);
    assert_eq!(json["file"], "index.d.ts");
    assert_eq!(json["sources"][0], "src/a.d.ts");
    assert_eq!(json["sourcesContent"][0], "declare const x: number;");
    assert_eq!(json["names"][0], "x");
}

#[test]
fn test_mappings_are_sorted_and_line_separated() {
    let mut generator = SourceMapGenerator::new("out.d.ts".to_string());
    let source = generator.add_source("in.d.ts".to_string());
    generator.add_simple_mapping(1, 0, source, 3, 2);
    generator.add_simple_mapping(0, 5, source, 0, 3);
    generator.add_simple_mapping(0, 0, source, 0, 0);

    let json: Value = serde_json::from_str(&generator.to_json()).expect("valid json");
    let mappings = json["mappings"].as_str().unwrap_or("");
    assert_eq!(mappings.matches(';').count(), 1, "mappings: {mappings}");
    assert_eq!(
        decode_all(mappings),
        vec![(0, 0, 0, 0), (0, 5, 0, 3), (1, 0, 3, 2)]
    );
    assert!(json.get("sourcesContent").is_none());
}

#[test]
fn test_duplicate_sources_share_an_index() {
    let mut generator = SourceMapGenerator::new("out.d.ts".to_string());
    assert_eq!(generator.add_source("a.d.ts".to_string()), 0);
    assert_eq!(generator.add_source("b.d.ts".to_string()), 1);
    assert_eq!(generator.add_source("a.d.ts".to_string()), 0);
}
