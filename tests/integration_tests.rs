use std::fs;
use std::io::Write;
use std::process::{Command, Output, Stdio};

/// Helper function to run chartwright with arguments and CSV input on stdin
fn run_chartwright(args: &[&str], csv_content: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_chartwright"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn process");

    // Write CSV to stdin
    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(csv_content.as_bytes())
            .expect("Failed to write to stdin");
    }

    child.wait_with_output().expect("Failed to wait for process")
}

fn render(args: &[&str], csv_content: &str) -> Result<Vec<u8>, String> {
    let output = run_chartwright(args, csv_content);
    if output.status.success() {
        Ok(output.stdout)
    } else {
        Err(String::from_utf8_lossy(&output.stderr).to_string())
    }
}

/// Check if bytes are a valid PNG
fn is_valid_png(bytes: &[u8]) -> bool {
    bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
}

fn clinic() -> String {
    fs::read_to_string("test/clinic.csv").expect("Failed to read test CSV")
}

fn measurements() -> String {
    fs::read_to_string("test/measurements.csv").expect("Failed to read test CSV")
}

#[test]
fn test_end_to_end_bar_chart() {
    let result = render(&["plot", "bar", "-c", "site", "-c", "reading"], &measurements());
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()), "Output is not a valid PNG");
}

#[test]
fn test_end_to_end_horizontal_box_plot() {
    let result = render(&["plot", "box", "-c", "reading", "--horizontal"], &measurements());
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()));
}

#[test]
fn test_end_to_end_histogram_by_index() {
    let result = render(&["plot", "hist", "-c", "1", "--bins", "4"], &measurements());
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()));
}

#[test]
fn test_end_to_end_gantt_chart() {
    let result = render(
        &["plot", "gantt", "-c", "Disease", "-c", "Start Date", "-c", "End Date"],
        &clinic(),
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()));
}

#[test]
fn test_end_to_end_line_chart_with_values_and_now() {
    let result = render(
        &[
            "plot", "line", "-c", "Disease", "-c", "Start Date", "-c", "End Date", "-c", "Severity", "--now",
        ],
        &clinic(),
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()));
}

#[test]
fn test_end_to_end_pie_of_counts() {
    let result = render(&["plot", "pie", "-c", "Disease"], &clinic());
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()));
}

#[test]
fn test_end_to_end_calendar() {
    let result = render(&["plot", "calendar", "-c", "Disease", "-c", "Start Date"], &clinic());
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()));
}

#[test]
fn test_end_to_end_custom_size_and_title() {
    let result = render(
        &[
            "plot", "radar", "-c", "site", "-c", "reading", "--width", "500", "--height", "500", "--title", "Readings",
        ],
        &measurements(),
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()));
}

#[test]
fn test_end_to_end_grid() {
    let result = render(
        &["grid", "--kinds", "line,heatmap", "-c", "Disease", "-c", "Start Date", "-c", "End Date"],
        &clinic(),
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()));
}

#[test]
fn test_profile_output() {
    let output = run_chartwright(&["profile", "--columns", "3"], &clinic());
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Disease\tN"));
    assert!(stdout.contains("type code: NTT"));
}

#[test]
fn test_profile_with_ordered_column() {
    let output = run_chartwright(
        &["profile", "--ordered", "grade=low,medium,high"],
        &measurements(),
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("grade\tO"));
    assert!(stdout.contains("type code: NOQ"));
    assert!(stdout.contains("No appropriate chart found"));
}

#[test]
fn test_auto_writes_one_file_per_chart() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().to_str().unwrap();
    let output = run_chartwright(
        &["auto", "-c", "Disease", "-c", "Start Date", "-c", "End Date", "-o", out],
        &clinic(),
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let mut files: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    files.sort();
    assert_eq!(
        files,
        vec!["01_gantt.png", "02_pie.png", "03_line.png", "04_scatter.png", "05_heatmap.png"]
    );
    let bytes = fs::read(dir.path().join("03_line.png")).unwrap();
    assert!(is_valid_png(&bytes));
}

#[test]
fn test_existing_output_is_not_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chart.png");
    fs::write(&path, b"existing").unwrap();
    let target = path.to_str().unwrap();

    let output = run_chartwright(&["plot", "pie", "-c", "Disease", "-o", target], &clinic());
    assert!(output.status.success());
    assert_eq!(fs::read(&path).unwrap(), b"existing");
    assert!(String::from_utf8_lossy(&output.stderr).contains("Figure not saved"));

    let output = run_chartwright(&["plot", "pie", "-c", "Disease", "-o", target, "--overwrite"], &clinic());
    assert!(output.status.success());
    assert!(is_valid_png(&fs::read(&path).unwrap()));
}

#[test]
fn test_config_file_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("style.toml");
    fs::write(&config, "[plot]\ntitle = \"Styled\"\ncolor = \"#336699\"\n").unwrap();

    let result = render(
        &["plot", "bar", "-c", "site", "-c", "reading", "--config", config.to_str().unwrap()],
        &measurements(),
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()));
}

#[test]
fn test_unknown_config_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("style.toml");
    fs::write(&config, "[plot]\ncolour = \"red\"\n").unwrap();

    let result = render(
        &["plot", "bar", "-c", "site", "-c", "reading", "--config", config.to_str().unwrap()],
        &measurements(),
    );
    assert!(result.is_err());
}

#[test]
fn test_error_unknown_chart() {
    let result = render(&["plot", "sunburst", "-c", "site"], &measurements());
    let err = result.unwrap_err();
    assert!(err.contains("'sunburst' is not a supported chart type"), "{}", err);
}

#[test]
fn test_error_missing_column() {
    let result = render(&["plot", "bar", "-c", "site", "-c", "nonexistent"], &measurements());
    let err = result.unwrap_err();
    assert!(err.contains("nonexistent"), "{}", err);
}

#[test]
fn test_error_mismatched_columns_for_chart() {
    let result = render(&["plot", "gantt", "-c", "site", "-c", "reading"], &measurements());
    assert!(result.is_err());
}

#[test]
fn test_error_empty_csv() {
    let result = render(&["plot", "bar", "-c", "a", "-c", "b"], "a,b\n");
    assert!(result.is_err());
}

#[test]
fn test_error_zero_dot_size() {
    let result = render(
        &["plot", "calendar", "-c", "Disease", "-c", "Start Date", "--dot-size", "0"],
        &clinic(),
    );
    let err = result.unwrap_err();
    assert!(err.contains("Dot size must be a positive number"), "{}", err);
}
