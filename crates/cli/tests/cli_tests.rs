// Integration tests for the `strata` binary.
// Run with: cargo test -p strata-cli --test cli_tests -- --nocapture

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Binary isolated from the user's config dir.
fn strata(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_strata"));
    cmd.env("XDG_CONFIG_HOME", home.join("config"));
    cmd.env("HOME", home);
    cmd.env_remove("STRATA_SETTINGS");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn run(home: &Path, args: &[&str]) -> Output {
    strata(home).args(args).output().expect("run strata")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn init_layer(dir: &TempDir, extra: &[&str]) -> PathBuf {
    let file = dir.path().join("roads.xml");
    let mut args = vec!["init", file.to_str().unwrap(), "--id", "roads", "--name", "Roads"];
    args.extend_from_slice(extra);
    let output = run(dir.path(), &args);
    assert!(output.status.success(), "init failed: {}", stderr(&output));
    file
}

fn show_json(dir: &TempDir, file: &Path) -> serde_json::Value {
    let output = run(dir.path(), &["show", file.to_str().unwrap(), "--json"]);
    assert!(output.status.success(), "show failed: {}", stderr(&output));
    serde_json::from_str(&stdout(&output)).expect("valid JSON")
}

// ---------------------------------------------------------------------------
// init / show
// ---------------------------------------------------------------------------

#[test]
fn init_writes_defaults() {
    let dir = TempDir::new().unwrap();
    let file = init_layer(&dir, &[]);

    let xml = fs::read_to_string(&file).unwrap();
    assert!(xml.contains("<!DOCTYPE strata>"));
    assert!(xml.contains("<elevation"));

    let v = show_json(&dir, &file);
    assert_eq!(v["layer"]["id"], "roads");
    assert_eq!(v["layer"]["name"], "Roads");
    assert_eq!(v["z_scale"], 1.0);
    assert_eq!(v["clamping"], "Terrain");
    assert_eq!(v["binding"], "Centroid");
    assert_eq!(v["has_elevation"], false);
    assert_eq!(v["respect_layer_symbology"], true);
    assert_eq!(v["symbols"]["line"]["type"], "line");
    assert!(v["overrides"].as_object().unwrap().is_empty());
}

#[test]
fn init_with_z_uses_absolute_clamping_and_layer_color() {
    let dir = TempDir::new().unwrap();
    let file = init_layer(&dir, &["--has-z", "--color", "#336699"]);

    let v = show_json(&dir, &file);
    assert_eq!(v["clamping"], "Absolute");
    assert_eq!(v["binding"], "Vertex");
    assert_eq!(v["has_elevation"], true);
    assert_eq!(v["symbols"]["line"]["color"], "#336699");
    assert_eq!(v["symbols"]["marker"]["color"], "#336699");
}

#[test]
fn init_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    let file = init_layer(&dir, &[]);

    let output = run(dir.path(), &["init", file.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("--force"));

    let output = run(dir.path(), &["init", file.to_str().unwrap(), "--force"]);
    assert!(output.status.success());
}

#[test]
fn settings_file_changes_default_symbols() {
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("custom.json");
    fs::write(
        &settings,
        r##"{
    // profile colors for this project
    "profile.lineColor": "#ff4433",
    "profile.markerSize": 4.5,
    "output.indent": 0
}"##,
    )
    .unwrap();

    let file = dir.path().join("layer.xml");
    let output = run(
        dir.path(),
        &["--settings", settings.to_str().unwrap(), "init", file.to_str().unwrap()],
    );
    assert!(output.status.success(), "{}", stderr(&output));

    // Indent 0 writes a single line after the prolog
    let xml = fs::read_to_string(&file).unwrap();
    assert!(xml.lines().count() <= 2, "expected compact output:\n{}", xml);

    let v = show_json(&dir, &file);
    assert_eq!(v["symbols"]["line"]["color"], "#ff4433");
    assert_eq!(v["symbols"]["marker"]["size"], 4.5);
}

#[test]
fn show_text_and_html() {
    let dir = TempDir::new().unwrap();
    let file = init_layer(&dir, &[]);
    run(dir.path(), &["set", file.to_str().unwrap(), "zoffset", "2.5"]);

    let output = run(dir.path(), &["show", file.to_str().unwrap()]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("roads (Roads)"));
    assert!(text.contains("z offset:           2.5"));
    assert!(text.contains("overrides:          none"));

    let output = run(dir.path(), &["show", file.to_str().unwrap(), "--html"]);
    let html = stdout(&output);
    assert!(html.trim().starts_with("<ul>"));
    assert!(html.contains("<li>Offset: 2.5</li>"));
}

// ---------------------------------------------------------------------------
// set
// ---------------------------------------------------------------------------

#[test]
fn set_round_trips_through_file() {
    let dir = TempDir::new().unwrap();
    let file = init_layer(&dir, &[]);
    let path = file.to_str().unwrap();

    for (key, value) in [
        ("zscale", "2"),
        ("zoffset", "0.5"),
        ("clamping", "relative"),
        ("binding", "vertex"),
        ("extrusion", "10"),
        ("extrusion-enabled", "true"),
        ("respect-symbology", "no"),
        ("line-color", "#ff4433"),
        ("fill-color", "#ff4455"),
        ("marker-color", "#ff1122"),
        ("symbology", "FillBelow"),
    ] {
        let output = run(dir.path(), &["set", path, key, value]);
        assert!(output.status.success(), "set {} {}: {}", key, value, stderr(&output));
    }

    let v = show_json(&dir, &file);
    assert_eq!(v["z_scale"], 2.0);
    assert_eq!(v["z_offset"], 0.5);
    assert_eq!(v["clamping"], "Relative");
    assert_eq!(v["binding"], "Vertex");
    assert_eq!(v["extrusion_height"], 10.0);
    assert_eq!(v["extrusion_enabled"], true);
    assert_eq!(v["respect_layer_symbology"], false);
    assert_eq!(v["profile_symbology"], "FillBelow");
    assert_eq!(v["symbols"]["line"]["color"], "#ff4433");
    assert_eq!(v["symbols"]["fill"]["color"], "#ff4455");
    assert_eq!(v["symbols"]["marker"]["color"], "#ff1122");
    assert_eq!(v["has_elevation"], true);
}

#[test]
fn set_negative_offset() {
    let dir = TempDir::new().unwrap();
    let file = init_layer(&dir, &[]);

    let output = run(dir.path(), &["set", file.to_str().unwrap(), "zoffset", "-3.5"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(show_json(&dir, &file)["z_offset"], -3.5);
}

#[test]
fn set_rejects_bad_values() {
    let dir = TempDir::new().unwrap();
    let file = init_layer(&dir, &[]);
    let path = file.to_str().unwrap();

    let output = run(dir.path(), &["set", path, "zscale", "tall"]);
    assert_eq!(output.status.code(), Some(2));

    let output = run(dir.path(), &["set", path, "clamping", "floating"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("floating"));

    let output = run(dir.path(), &["set", path, "line-color", "blurple"]);
    assert_eq!(output.status.code(), Some(2));
}

// ---------------------------------------------------------------------------
// override / eval
// ---------------------------------------------------------------------------

#[test]
fn override_expression_is_stored_verbatim() {
    let dir = TempDir::new().unwrap();
    let file = init_layer(&dir, &[]);
    let path = file.to_str().unwrap();

    let output = run(dir.path(), &["override", path, "extrusionHeight", "--expression", "1*5"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let v = show_json(&dir, &file);
    assert_eq!(v["overrides"]["extrusionHeight"]["expression"], "1*5");
    assert_eq!(v["overrides"]["extrusionHeight"]["type"], "expression");
    assert_eq!(v["overrides"]["extrusionHeight"]["active"], true);
    assert_eq!(v["has_elevation"], true);
}

#[test]
fn override_disable_enable_clear() {
    let dir = TempDir::new().unwrap();
    let file = init_layer(&dir, &[]);
    let path = file.to_str().unwrap();

    run(dir.path(), &["override", path, "zOffset", "--field", "base"]);
    let output = run(dir.path(), &["override", path, "zOffset", "--disable"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let v = show_json(&dir, &file);
    assert_eq!(v["overrides"]["zOffset"]["active"], false);
    assert_eq!(v["overrides"]["zOffset"]["expression"], "\"base\"");
    assert_eq!(v["has_elevation"], false);

    run(dir.path(), &["override", path, "zOffset", "--enable"]);
    assert_eq!(show_json(&dir, &file)["overrides"]["zOffset"]["active"], true);

    run(dir.path(), &["override", path, "zOffset", "--clear"]);
    assert!(show_json(&dir, &file)["overrides"].as_object().unwrap().is_empty());
}

#[test]
fn override_rejects_unknown_key_and_bad_expression() {
    let dir = TempDir::new().unwrap();
    let file = init_layer(&dir, &[]);
    let path = file.to_str().unwrap();

    let output = run(dir.path(), &["override", path, "rotation", "--value", "3"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("zOffset"));

    let output = run(dir.path(), &["override", path, "zOffset", "--expression", "1 +"]);
    assert_eq!(output.status.code(), Some(4));

    let output = run(dir.path(), &["override", path, "zOffset"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn eval_uses_feature_fields() {
    let dir = TempDir::new().unwrap();
    let file = init_layer(&dir, &[]);
    let path = file.to_str().unwrap();

    run(dir.path(), &["set", path, "zscale", "2"]);
    run(dir.path(), &["set", path, "zoffset", "1"]);
    run(dir.path(), &["set", path, "extrusion-enabled", "1"]);
    run(dir.path(), &["override", path, "zOffset", "--expression", "\"base\" * 2"]);
    run(dir.path(), &["override", path, "extrusionHeight", "--field", "roof"]);

    let output = run(
        dir.path(),
        &["eval", path, "--field", "base=3", "--field", "roof=12", "--z", "100", "--json"],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    let v: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(v["z_offset"], 6.0);
    assert_eq!(v["extrusion_height"], 12.0);
    assert_eq!(v["z"], 206.0);

    // Missing fields fall back to the static values
    let output = run(dir.path(), &["eval", path, "--json"]);
    let v: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(v["z_offset"], 1.0);
    assert_eq!(v["extrusion_height"], 0.0);
    assert!(v["z"].is_null());
}

// ---------------------------------------------------------------------------
// Failure exit codes
// ---------------------------------------------------------------------------

#[test]
fn missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.xml");
    let output = run(dir.path(), &["show", missing.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("nope.xml"));
}

#[test]
fn malformed_xml_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("bad.xml");
    fs::write(&file, "<maplayer><elevation></maplayer>").unwrap();

    let output = run(dir.path(), &["show", file.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(4));

    fs::write(&file, "<project/>").unwrap();
    let output = run(dir.path(), &["show", file.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("maplayer"));
}

#[test]
fn missing_elevation_element() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("bare.xml");
    fs::write(&file, "<maplayer version=\"1\" id=\"bare\" name=\"Bare\"/>").unwrap();

    let output = run(dir.path(), &["show", file.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(5));

    // set creates the element from defaults
    let output = run(dir.path(), &["set", file.to_str().unwrap(), "zoffset", "4"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let v = show_json(&dir, &file);
    assert_eq!(v["z_offset"], 4.0);
    assert_eq!(v["layer"]["id"], "bare");
}

#[test]
fn unknown_tokens_warn_but_load() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("odd.xml");
    fs::write(
        &file,
        "<maplayer id=\"odd\"><elevation zoffset=\"2\" clamping=\"Floating\"/></maplayer>",
    )
    .unwrap();

    let output = run(dir.path(), &["show", file.to_str().unwrap(), "--json"]);
    assert!(output.status.success());
    assert!(stderr(&output).contains("warning:"));
    let v: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(v["clamping"], "Terrain");
    assert_eq!(v["z_offset"], 2.0);
}

// ---------------------------------------------------------------------------
// config-path
// ---------------------------------------------------------------------------

#[test]
fn config_path_points_into_config_dir() {
    let dir = TempDir::new().unwrap();
    let output = run(dir.path(), &["config-path"]);
    assert!(output.status.success());
    let path = stdout(&output);
    assert!(path.trim().ends_with("settings.json"));
    assert!(path.contains("strata"));
}
