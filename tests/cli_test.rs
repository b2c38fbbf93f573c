use image::{Rgba, RgbaImage};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Lays out a project folder with relative paths, as the CLI expects to run from it
fn create_project(converter: &str) -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp directory");
    let root = temp.path();

    fs::create_dir_all(root.join("config")).unwrap();
    fs::create_dir_all(root.join("src/vector")).unwrap();
    fs::write(root.join("src/vector/logo.svg"), "<svg/>").unwrap();

    fs::write(
        root.join("config/paths.json"),
        r#"{ "tmp": "tmp", "src": { "raster": "src/raster", "vector": "src/vector" } }"#,
    )
    .unwrap();
    fs::write(
        root.join("config/android.json"),
        r#"{
            "root": "app/src",
            "vectorRoot": "app/src/main/res/drawable",
            "defaultFlavor": "main",
            "sizes": [{ "percentage": 50, "path": "res/drawable-mdpi" }]
        }"#,
    )
    .unwrap();
    fs::write(
        root.join("config/ios.json"),
        format!(
            r#"{{
                "root": "Images.xcassets",
                "contentsFileName": "Contents.json",
                "imageSetSuffix": ".imageset",
                "contents": {{ "info": {{ "version": 1, "author": "xcode" }} }},
                "sizes": [
                    {{ "percentage": 50, "suffix": "@1x", "scale": 1 }},
                    {{ "percentage": 100, "suffix": "@2x", "scale": 2 }}
                ],
                "converter": {{ "program": "{converter}", "args": [] }}
            }}"#
        ),
    )
    .unwrap();

    create_dummy_image(&root.join("src/raster/icon.png"));
    temp
}

/// Creates a 64x64 gradient image and saves it as PNG
fn create_dummy_image(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut image = RgbaImage::new(64, 64);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        *pixel = Rgba([(x * 4) as u8, (y * 4) as u8, 128, 255]);
    }
    image.save(path).expect("Failed to save dummy image");
}

fn run_cli(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mobile-icons"))
        .current_dir(dir)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run mobile-icons")
}

#[cfg(unix)]
#[test]
fn test_cli_raster_for_ios() {
    let project = create_project("true");
    let root = project.path();

    let output = run_cli(root, &["raster", "--platform", "ios"]);
    if !output.status.success() {
        eprintln!("stderr: {}", String::from_utf8_lossy(&output.stderr));
        panic!("mobile-icons raster failed");
    }

    let set = root.join("tmp/ios/Images.xcassets/icon.imageset");
    assert!(set.join("icon@1x.png").exists());
    assert!(set.join("icon@2x.png").exists());

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(set.join("Contents.json")).unwrap())
            .expect("Contents.json should contain valid JSON");
    assert_eq!(manifest["images"].as_array().unwrap().len(), 2);
    assert!(root.join("tmp/ios/Images.xcassets/Contents.json").exists());
    assert!(!root.join("tmp/android").exists());
}

#[cfg(unix)]
#[test]
fn test_cli_converter_failure_exits_nonzero() {
    let project = create_project("false");
    let root = project.path();

    let output = run_cli(root, &["vector", "--platform", "ios"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("External converter failed"),
        "unexpected stderr: {stderr}"
    );
    assert!(!root
        .join("tmp/ios/Images.xcassets/logo.imageset/Contents.json")
        .exists());
}

#[cfg(unix)]
#[test]
fn test_cli_config_after_subcommand() {
    let project = create_project("true");
    let root = project.path();
    fs::rename(root.join("config"), root.join("settings")).unwrap();

    let output = run_cli(root, &["raster", "--config", "settings", "--platform", "ios"]);
    if !output.status.success() {
        eprintln!("stderr: {}", String::from_utf8_lossy(&output.stderr));
        panic!("mobile-icons raster --config failed");
    }

    assert!(root
        .join("tmp/ios/Images.xcassets/icon.imageset/Contents.json")
        .exists());
}

#[test]
fn test_cli_clean() {
    let project = create_project("true");
    let root = project.path();
    fs::create_dir_all(root.join("tmp/android/stale")).unwrap();

    let output = run_cli(root, &["clean"]);

    assert!(output.status.success());
    assert!(!root.join("tmp").exists());
}

#[test]
fn test_cli_missing_config() {
    let temp = TempDir::new().unwrap();

    let output = run_cli(temp.path(), &["images"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("paths.json"), "unexpected stderr: {stderr}");
}
