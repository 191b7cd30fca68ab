//! End-to-end: config on disk, shares in a JSON file, real JPEG decoding.

use image::{ImageEncoder, RgbImage};
use share_gallery::acl::{AclEntry, Permission, SubjectKind};
use share_gallery::cache::{Outcome, ThumbnailCache};
use share_gallery::config::load_config;
use share_gallery::entities::{Folder, Gallery, Photo};
use share_gallery::principal::User;
use share_gallery::share::{JsonShareStore, ShareStore};
use std::path::Path;
use tempfile::TempDir;

fn write_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 64])
    });
    let file = std::fs::File::create(path).unwrap();
    image::codecs::jpeg::JpegEncoder::new(std::io::BufWriter::new(file))
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

fn setup() -> (TempDir, Gallery) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    std::fs::create_dir(root.join("data")).unwrap();

    let config_path = root.join("gallery.toml");
    std::fs::write(
        &config_path,
        format!(
            "data_root = {:?}\ncache_root = {:?}\ntitle = \"Family\"\n\n[thumbnails]\nsizes = [128, 400]\n",
            root.join("data"),
            root.join("cache"),
        ),
    )
    .unwrap();

    let config = load_config(&config_path).unwrap();
    (tmp, Gallery::from_config(config))
}

#[test]
fn browse_share_and_thumbnail() {
    let (tmp, gallery) = setup();

    // A new top-level folder is a virtual share: nobody but superusers gets in.
    let holiday = Folder::create(&gallery, "holiday").unwrap();
    let alice = User::new("alice").with_group("family");
    assert!(holiday.share().is_virtual());
    assert!(!holiday.has_permission(Permission::Read, &alice).unwrap());

    // Grant the family group read access and persist it.
    let mut share = gallery.share("holiday").unwrap();
    share
        .grant(SubjectKind::Group, "family", Permission::Read)
        .unwrap();
    share.set_description("Summer trips");
    share.save(gallery.share_store()).unwrap();

    let stored = std::fs::read_to_string(tmp.path().join("data/.shares.json")).unwrap();
    assert!(stored.contains("\"group:family:r\""), "{stored}");

    // Entities opened after the save see the grant, nested folders included.
    let nested = Folder::create(&gallery, "holiday/2013").unwrap();
    assert!(nested.has_permission(Permission::Read, &alice).unwrap());
    assert!(!nested.has_permission(Permission::Write, &alice).unwrap());
    assert!(!nested.has_permission(Permission::Read, &User::new("mallory")).unwrap());

    write_jpeg(&nested.filepath().join("beach.jpg"), 1600, 1200);
    let contents = nested.contents().unwrap();
    assert_eq!(contents.photos.len(), 1);
    assert_eq!(contents.photos[0].path, "holiday/2013/beach.jpg");

    let photo = Photo::open(&gallery, "holiday/2013/beach.jpg").unwrap();
    let cache = ThumbnailCache::new(gallery.config());

    let first = cache.lookup(&photo, 400).unwrap();
    assert_eq!(first.url, "400/holiday/2013/beach.jpg");
    assert_eq!(first.outcome, Outcome::Generated);

    let artifact = tmp.path().join("cache/400/holiday/2013/beach.jpg");
    assert_eq!(image::image_dimensions(&artifact).unwrap(), (400, 300));

    assert_eq!(photo.thumbnail(&cache, 400).unwrap(), first.url);
    assert_eq!(cache.lookup(&photo, 400).unwrap().outcome, Outcome::Hit);
}

#[test]
fn warm_uses_configured_sizes() {
    let (tmp, gallery) = setup();
    let folder = Folder::create(&gallery, "work").unwrap();
    write_jpeg(&folder.filepath().join("a.jpg"), 300, 200);
    write_jpeg(&folder.filepath().join("b.jpg"), 200, 300);

    let cache = ThumbnailCache::new(gallery.config());
    let stats = cache
        .warm(&folder, &gallery.config().thumbnails.sizes)
        .unwrap();
    assert_eq!(stats.misses, 4);
    assert_eq!(stats.failed, 0);

    // 300x200 fits in 400x300 already: no upscaling.
    let big = tmp.path().join("cache/400/work/a.jpg");
    assert_eq!(image::image_dimensions(big).unwrap(), (300, 200));
    // 200x300 into 128x96: height bound.
    let small = tmp.path().join("cache/128/work/b.jpg");
    assert_eq!(image::image_dimensions(small).unwrap(), (64, 96));
}

#[test]
fn json_store_is_shared_between_instances() {
    let (tmp, gallery) = setup();
    Folder::create(&gallery, "holiday").unwrap();

    let mut share = gallery.share("holiday").unwrap();
    share.set_acls(&[
        AclEntry::user("alice").unwrap().with(Permission::Manage),
        AclEntry::other().with(Permission::Read),
    ]);
    share.save(gallery.share_store()).unwrap();

    let other_store = JsonShareStore::new(tmp.path().join("data/.shares.json"));
    let reloaded = other_store.load("holiday").unwrap().unwrap();
    assert_eq!(reloaded.access(), "user:alice:x,other::r");
    assert!(reloaded.has_permission(Permission::Read, &User::anonymous()).unwrap());
    assert_eq!(other_store.list().unwrap(), vec!["holiday".to_string()]);
}

#[test]
fn root_title_and_listing() {
    let (tmp, gallery) = setup();
    Folder::create(&gallery, "holiday").unwrap();
    let mut share = gallery.share("holiday").unwrap();
    share.set_description("Summer trips");
    share.save(gallery.share_store()).unwrap();
    assert!(tmp.path().join("data/.shares.json").is_file());

    let root = Folder::open(&gallery, "").unwrap();
    assert_eq!(root.name(), "Family");
    let contents = root.contents().unwrap();
    let names: Vec<_> = contents.folders.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["holiday"]);
    // The dot-prefixed shares file stays out of listings.
    assert!(contents.files.is_empty());
}
