//! Integration tests for the gridsense system.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use gridsense::{App, Cli, Command};
use gridsense_core::{Bounds, Component, GridContext, NoGrid, Position, TextGrid};
use gridsense_dsl::compile;
use gridsense_engine::{ConfidenceBand, PatternRegistry, ReportAssembler, RuleMatcher};

const UI_PATTERNS: &str = r#"
# Push buttons render as [label]
<hunt:Button
    [MARKERS
        {tag ("[", "]")}
        {pluck (button_text, "\[\s*(.+?)\s*\]")}
    ]
> EXEC

# A checkbox needs room for its label
@@ <hunt:Checkbox
    [MARKERS
        {tag ("[x]")}
        {trap (min_width:(5))}
        {boil (0.9)}
    ]
> EXEC

# Menus list every bracketed entry
@@ <Track:MenuBar
    [ENTRIES=HARVEST
        {tag:menuBar ("|")}
        {pluck (items, "\[(\w+)\]")}
    ]
> EXEC

@@ <forge:SettingsPage
    [LAYOUT {skin (columns:(2))}]
> EXEC
"#;

fn temp_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("gridsense-{}-{name}", std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_compile_then_match_pipeline() {
    let registry = PatternRegistry::new();
    let output = compile(UI_PATTERNS, &registry).unwrap();

    assert!(output.is_ok());
    assert_eq!(registry.len(), 3);
    assert_eq!(output.interpretation.directives.len(), 1);
    assert_eq!(output.interpretation.directives[0].kind, "template");

    let matcher = RuleMatcher::new();

    // Button
    let results = matcher.match_component(&Component::from_text("b", "[ Save ]"), &NoGrid, &registry);
    let best = RuleMatcher::best_match(&results).unwrap();
    assert_eq!(best.pattern_id, "Button");
    assert_eq!(best.property_str("button_text"), Some("Save"));

    // Too narrow for the checkbox trap
    let results = matcher.match_component(&Component::from_text("c", "[x]"), &NoGrid, &registry);
    let checkbox = results.iter().find(|r| r.pattern_id == "Checkbox").unwrap();
    assert!(checkbox.disqualified);
    assert!(!checkbox.matched);

    // Wide enough
    let results =
        matcher.match_component(&Component::from_text("c", "[x] Remember"), &NoGrid, &registry);
    let checkbox = results.iter().find(|r| r.pattern_id == "Checkbox").unwrap();
    assert!(checkbox.matched);
    assert_eq!(checkbox.component_type, "checkbox");

    // Menu harvests every entry
    let results = matcher.match_component(
        &Component::from_text("m", "[File] | [Edit] | [View]"),
        &NoGrid,
        &registry,
    );
    let menu = results.iter().find(|r| r.pattern_id == "MenuBar").unwrap();
    assert!(menu.matched);
    assert_eq!(menu.component_type, "menu_bar");
    assert_eq!(
        menu.extracted_properties["items"],
        serde_json::json!(["File", "Edit", "View"])
    );
}

#[test]
fn test_boundary_markers_come_from_grid() {
    let registry = PatternRegistry::new();
    compile(
        r#"<hunt:Panel [FRAME {tag ("+", "|")}]> EXEC"#,
        &registry,
    )
    .unwrap();

    let grid = TextGrid::from_text("+--+\n|  |\n+--+");
    let boundary = vec![Position::new(0, 0), Position::new(1, 0), Position::new(2, 3)];
    let component = Component::new("p", Bounds::new(0, 0, 4, 3)).with_boundary(boundary);

    assert_eq!(grid.extract_text(&Bounds::new(0, 0, 4, 1)).trim(), "+--+");

    let results = RuleMatcher::new().match_component(&component, &grid, &registry);
    assert!(results[0].matched);

    let results = RuleMatcher::new().match_component(&component, &NoGrid, &registry);
    assert!(!results[0].matched);
}

#[test]
fn test_registration_order_breaks_ties() {
    let registry = PatternRegistry::new();
    compile(
        r#"<hunt:First [S {tag ("ok")}]> EXEC @@ <hunt:Second [S {tag ("ok")}]> EXEC"#,
        &registry,
    )
    .unwrap();

    let results =
        RuleMatcher::new().match_component(&Component::from_text("c", "ok"), &NoGrid, &registry);
    let ids: Vec<&str> = results.iter().map(|r| r.pattern_id.as_str()).collect();
    assert_eq!(ids, vec!["First", "Second"]);
}

#[tokio::test]
async fn test_concurrent_batch_reports() {
    let registry = PatternRegistry::new();
    compile(UI_PATTERNS, &registry).unwrap();

    let components: Vec<Component> = (0..16)
        .map(|i| Component::from_text(format!("c{i}"), format!("[Item{i}]")))
        .collect();
    let grid: Arc<dyn GridContext> = Arc::new(NoGrid);

    let batch = RuleMatcher::new()
        .match_batch_concurrent(components.clone(), grid, registry.snapshot())
        .await;
    let sequential = RuleMatcher::new().match_batch(&components, &NoGrid, &registry);
    assert_eq!(batch, sequential);

    let reports = ReportAssembler::new().assemble_batch(batch, ConfidenceBand::High);
    assert_eq!(reports.len(), 16);
    for (i, report) in reports.iter().enumerate() {
        assert_eq!(report.component_id, format!("c{i}"));
        assert_eq!(report.best_match.as_deref(), Some("Button"));
        assert!(report.results.iter().all(|r| r.confidence >= 0.9));
        assert!(chrono_like(&report.timestamp));
    }
}

/// RFC 3339 timestamps start with a date and carry a `T` separator.
fn chrono_like(timestamp: &str) -> bool {
    timestamp.len() >= 20 && timestamp.as_bytes()[4] == b'-' && timestamp.contains('T')
}

#[tokio::test]
async fn test_match_files_end_to_end() {
    let patterns = temp_file("ui.cbhs", UI_PATTERNS);
    let components = temp_file(
        "components.json",
        r#"[
            {"id": "ok", "bounding_box": {"row": 0, "col": 0, "width": 4, "height": 1}, "text_content": "[OK]"},
            {"id": "plain", "bounding_box": {"row": 1, "col": 0, "width": 2, "height": 1}, "text_content": "OK"}
        ]"#,
    );

    let cli = Cli::try_parse_from([
        "gridsense".to_string(),
        "match".to_string(),
        patterns.display().to_string(),
        components.display().to_string(),
        "--min-confidence".to_string(),
        "medium".to_string(),
    ])
    .unwrap();
    let output = App::load(cli.config.as_deref(), cli.strict)
        .unwrap()
        .run(cli.command)
        .await
        .unwrap();

    let reports: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(reports[0]["component_id"], "ok");
    assert_eq!(reports[0]["best_match"], "Button");
    assert_eq!(reports[0]["results"][0]["extracted_properties"]["button_text"], "OK");
    assert_eq!(reports[1]["component_id"], "plain");
    assert!(reports[1].get("best_match").is_none());
    assert_eq!(reports[1]["results"].as_array().unwrap().len(), 0);

    std::fs::remove_file(patterns).ok();
    std::fs::remove_file(components).ok();
}

#[tokio::test]
async fn test_compile_command_reports_errors_with_positions() {
    let broken = temp_file("broken.cbhs", "<hunt:Button [MARKERS {tag (\"[\")}> EXEC");
    let app = App::default();

    let err = app
        .run(Command::Compile {
            files: vec![broken.clone()],
        })
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("broken.cbhs:1:"), "{message}");
    assert!(message.contains("parse error"), "{message}");

    std::fs::remove_file(broken).ok();
}

#[tokio::test]
async fn test_compile_command_prints_summary() {
    let source = temp_file("summary.cbhs", UI_PATTERNS);
    let output = App::default()
        .run(Command::Compile {
            files: vec![source.clone()],
        })
        .await
        .unwrap();

    let summaries: serde_json::Value = serde_json::from_str(&output).unwrap();
    let patterns = summaries[0]["patterns"].as_array().unwrap();
    assert_eq!(patterns.len(), 3);
    assert_eq!(patterns[1]["confidence_threshold"], 0.9);
    assert_eq!(summaries[0]["directives"][0]["name"], "SettingsPage");

    std::fs::remove_file(source).ok();
}

#[test]
fn test_strict_flag_rejects_naming_violations() {
    let app = App::load(None, true).unwrap();
    let err = app
        .compile_sources(
            &[("lax.cbhs".to_string(), "<hunt:button [S {tag (x)}]> EXEC".to_string())],
            &PatternRegistry::new(),
        )
        .unwrap_err();
    assert!(err.to_string().contains("should be PascalCase"));
}
