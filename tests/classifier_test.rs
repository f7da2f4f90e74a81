use hrviz::classifier::{Classifier, KeywordClassifier};
use hrviz::payload::ChartPayload;
use std::fs;
use tempfile::TempDir;

fn builtin() -> KeywordClassifier {
    KeywordClassifier::builtin().expect("Built-in catalog should load")
}

#[test]
fn test_builtin_catalog_covers_every_kind() {
    let classifier = builtin();
    let mut kinds: Vec<&str> = classifier
        .prompts()
        .iter()
        .filter_map(|p| classifier.classify(p))
        .map(|r| r.payload.kind())
        .collect();
    kinds.sort_unstable();
    kinds.dedup();
    for kind in [
        "boxplot",
        "chart",
        "funnel",
        "gantt",
        "heatmap",
        "stackedbar",
        "table",
        "text",
        "treemap",
        "waterfall",
    ] {
        assert!(kinds.contains(&kind), "no sample prompt answers with {}", kind);
    }
}

#[test]
fn test_every_sample_prompt_is_answered() {
    let classifier = builtin();
    for prompt in classifier.prompts() {
        assert!(classifier.classify(prompt).is_some(), "'{}' has no answer", prompt);
    }
}

#[test]
fn test_matching_is_case_insensitive_on_whole_words() {
    let classifier = builtin();
    let reply = classifier.classify("RECRUITMENT numbers?").unwrap();
    assert!(matches!(reply.payload, ChartPayload::Funnel(_)));
    // Keywords inside longer words do not count
    assert!(classifier.classify("leaveless xyzzy").is_none());
}

#[test]
fn test_random_prompts_are_distinct_and_seeded() {
    let classifier = builtin();
    let a = classifier.random_prompts(3, 99);
    let b = classifier.random_prompts(3, 99);
    assert_eq!(a, b);
    assert_eq!(a.len(), 3);
    let mut unique = a.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 3);
    assert_eq!(classifier.random_prompts(100, 1).len(), classifier.prompts().len());
}

#[test]
fn test_catalog_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.json");
    fs::write(
        &path,
        r#"[{"prompt":"Who is on leave?","keywords":["leave"],
            "response":{"type":"table","data":{"headers":["Name"],"rows":[["Ana"]]}}}]"#,
    )
    .unwrap();
    let classifier = KeywordClassifier::from_path(&path).unwrap();
    assert_eq!(classifier.prompts(), ["Who is on leave?"]);
    assert!(matches!(
        classifier.classify("leave list").unwrap().payload,
        ChartPayload::Table(_)
    ));
}

#[test]
fn test_invalid_entry_names_the_prompt() {
    let err = KeywordClassifier::from_json(
        r#"[{"prompt":"Broken box","keywords":["box"],
            "response":{"type":"boxplot","data":{"headers":["Dept","Min"],"rows":[["Eng","1"]]}}}]"#,
    )
    .unwrap_err();
    assert!(format!("{:#}", err).contains("Broken box"));
}

#[test]
fn test_missing_catalog_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = KeywordClassifier::from_path(&dir.path().join("nope.json")).unwrap_err();
    assert!(err.to_string().contains("Failed to read catalog"));
}
