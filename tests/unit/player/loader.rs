use std::io::Cursor;

use super::*;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "scrollreel_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn png_bytes(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

/// Loader failing every locator listed in `fail`.
struct SyntheticLoader {
    fail: Vec<String>,
}

impl AssetLoader for SyntheticLoader {
    fn fetch_image(&self, locator: &str) -> Result<DecodedImage, LoadFailure> {
        if self.fail.iter().any(|f| f == locator) {
            return Err(LoadFailure::Fetch {
                locator: locator.to_owned(),
                reason: "404".to_owned(),
            });
        }
        Ok(DecodedImage::new(image::RgbaImage::new(4, 2)))
    }
}

#[test]
fn normalize_rel_path_rejects_escapes() {
    assert_eq!(
        normalize_rel_path("./images\\0001.jpg").unwrap(),
        "images/0001.jpg"
    );
    assert!(normalize_rel_path("/etc/passwd").is_err());
    assert!(normalize_rel_path("images/../../x.png").is_err());
    assert!(normalize_rel_path("./.").is_err());
    assert!(normalize_rel_path("").is_err());
}

#[test]
fn numbered_locators_zero_pad() {
    let l = numbered_locators("images/{n:04}.jpg", 1, 100).unwrap();
    assert_eq!(l.len(), 100);
    assert_eq!(l[0], "images/0001.jpg");
    assert_eq!(l[99], "images/0100.jpg");

    let l = numbered_locators("f{n}.png", 8, 3).unwrap();
    assert_eq!(l, vec!["f8.png", "f9.png", "f10.png"]);

    assert!(numbered_locators("images/x.jpg", 1, 3).is_err());
    assert!(numbered_locators("images/{n:4}.jpg", 1, 3).is_err());
    assert!(numbered_locators("{n}/{n}.jpg", 1, 3).is_err());
}

#[test]
fn fs_loader_distinguishes_fetch_and_decode_failures() {
    let tmp = temp_dir("loader_kinds");
    std::fs::create_dir_all(&tmp).unwrap();
    std::fs::write(tmp.join("ok.png"), png_bytes(3, 2, [10, 20, 30, 255])).unwrap();
    std::fs::write(tmp.join("bad.png"), b"not an image").unwrap();

    let loader = FsImageLoader::new(&tmp);
    let img = loader.fetch_image("ok.png").unwrap();
    assert_eq!((img.width(), img.height()), (3, 2));
    assert_eq!(img.pixels().get_pixel(0, 0).0, [10, 20, 30, 255]);

    let decode = loader.fetch_image("bad.png").unwrap_err();
    assert!(decode.is_decode());
    assert_eq!(decode.locator(), "bad.png");

    let fetch = loader.fetch_image("missing.png").unwrap_err();
    assert!(matches!(fetch, LoadFailure::Fetch { .. }));
    let escape = loader.fetch_image("../ok.png").unwrap_err();
    assert!(matches!(escape, LoadFailure::Fetch { .. }));

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn load_all_excludes_failures_without_gaps() {
    let locators = numbered_locators("images/{n:04}.jpg", 1, 100).unwrap();
    let fail: Vec<String> = locators.iter().step_by(8).take(13).cloned().collect();
    assert_eq!(fail.len(), 13);
    let loader = SyntheticLoader { fail: fail.clone() };

    let (images, report) = load_all(&loader, &locators, Some(4)).unwrap();
    assert_eq!(images.len(), 87);
    assert_eq!(report.requested, 100);
    assert_eq!(report.loaded, 87);
    let failed: Vec<&str> = report.failures.iter().map(|f| f.locator()).collect();
    assert_eq!(failed, fail.iter().map(String::as_str).collect::<Vec<_>>());
}

#[test]
fn load_all_reports_total_failure_as_empty() {
    let locators = numbered_locators("images/{n:04}.jpg", 1, 5).unwrap();
    let loader = SyntheticLoader {
        fail: locators.clone(),
    };
    let (images, report) = load_all(&loader, &locators, None).unwrap();
    assert!(images.is_empty());
    assert!(!report.any_loaded());
    assert_eq!(report.failures.len(), 5);
}

#[test]
fn load_all_rejects_zero_threads() {
    let loader = SyntheticLoader { fail: vec![] };
    assert!(load_all(&loader, &[], Some(0)).is_err());
}
