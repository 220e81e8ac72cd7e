//! Cache-aware downloader against an in-memory transport and a temp cache root

use chrono::Utc;
use orbital_collector::{AssetResolver, CacheDownloader, MemoryTransport, SigningPolicy};
use orbital_core::error::OrbitalError;
use orbital_core::models::{AssetRef, CatalogScene};
use orbital_core::ports::HttpResponse;
use std::collections::BTreeMap;
use tempfile::TempDir;

const VISUAL_URL: &str = "https://blob.example/S2A_TEST/TCI.tif";
const NIR_URL: &str = "https://blob.example/S2A_TEST/B08.tif";
const SIGN_URL: &str = "https://sign.example/api/sas/v1/sign";

fn scene() -> CatalogScene {
    scene_with_id("S2A_TEST")
}

fn scene_with_id(id: &str) -> CatalogScene {
    let mut assets = BTreeMap::new();
    for (band, href) in [("visual", VISUAL_URL), ("B08", NIR_URL)] {
        assets.insert(
            band.to_string(),
            AssetRef { href: href.to_string(), media_type: Some("image/tiff".to_string()) },
        );
    }
    CatalogScene {
        id: id.to_string(),
        acquired_at: Utc::now(),
        cloud_cover: 3.0,
        gsd_m: 10.0,
        platform: "Sentinel-2A".to_string(),
        collection: "sentinel-2-l2a".to_string(),
        footprint: None,
        assets,
    }
}

fn downloader(transport: &MemoryTransport) -> CacheDownloader<MemoryTransport> {
    let resolver = AssetResolver::new(transport.clone(), SigningPolicy::disabled());
    CacheDownloader::new(resolver, transport.clone())
}

fn bands(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_default_band_is_true_color() {
    let cache = TempDir::new().unwrap();
    let transport = MemoryTransport::new();
    transport.respond(VISUAL_URL, HttpResponse::new(200, b"II*\0visual".to_vec()));

    let set = downloader(&transport).download(&scene(), &[], cache.path()).await.unwrap();

    let expected = cache.path().join("S2A_TEST").join("visual.tif");
    assert_eq!(set.scene_id, "S2A_TEST");
    assert_eq!(set.directory, cache.path().join("S2A_TEST"));
    assert_eq!(set.band("visual"), Some(expected.as_path()));
    assert_eq!(std::fs::read(&expected).unwrap(), b"II*\0visual");
    assert_eq!(set.bands.len(), 1);
}

#[tokio::test]
async fn test_second_download_is_served_from_cache() {
    let cache = TempDir::new().unwrap();
    let transport = MemoryTransport::new();
    transport.respond(VISUAL_URL, HttpResponse::new(200, b"visual".to_vec()));
    transport.respond(NIR_URL, HttpResponse::new(200, b"nir".to_vec()));
    let downloader = downloader(&transport);
    let requested = bands(&["visual", "B08"]);

    let first = downloader.download(&scene(), &requested, cache.path()).await.unwrap();
    assert_eq!(transport.call_count(), 2);

    transport.clear_calls();
    let second = downloader.download(&scene(), &requested, cache.path()).await.unwrap();

    assert_eq!(transport.call_count(), 0);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_cache_hit_skips_signing() {
    let cache = TempDir::new().unwrap();
    let scene_dir = cache.path().join("S2A_TEST");
    std::fs::create_dir_all(&scene_dir).unwrap();
    std::fs::write(scene_dir.join("visual.tif"), b"already here").unwrap();

    let transport = MemoryTransport::new();
    let resolver = AssetResolver::new(transport.clone(), SigningPolicy::strict(SIGN_URL));
    let downloader = CacheDownloader::new(resolver, transport.clone());

    let set = downloader.download(&scene(), &bands(&["visual"]), cache.path()).await.unwrap();

    assert!(set.band("visual").is_some());
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_bands_missing_from_scene_are_skipped() {
    let cache = TempDir::new().unwrap();
    let transport = MemoryTransport::new();
    transport.respond(VISUAL_URL, HttpResponse::new(200, b"visual".to_vec()));

    let set = downloader(&transport)
        .download(&scene(), &bands(&["visual", "SCL"]), cache.path())
        .await
        .unwrap();

    assert_eq!(set.bands.keys().collect::<Vec<_>>(), vec!["visual"]);
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_partial_failure_keeps_successful_bands() {
    let cache = TempDir::new().unwrap();
    let transport = MemoryTransport::new();
    transport.respond(VISUAL_URL, HttpResponse::new(200, b"visual".to_vec()));
    transport.break_mid_stream(NIR_URL, b"half a tiff".to_vec(), "connection reset by peer");

    let err = downloader(&transport)
        .download(&scene(), &bands(&["visual", "B08"]), cache.path())
        .await
        .unwrap_err();

    let partial = match err {
        OrbitalError::PartialDownload(partial) => partial,
        other => panic!("unexpected error {:?}", other),
    };
    assert_eq!(partial.scene_id, "S2A_TEST");
    assert_eq!(partial.succeeded, vec!["visual".to_string()]);
    assert_eq!(partial.failed.len(), 1);
    assert_eq!(partial.failed[0].band, "B08");
    assert!(partial.failed[0].reason.contains("connection reset"));
    assert!(partial.image_set.band("visual").is_some());
    assert!(partial.image_set.band("B08").is_none());

    // nothing published for the failed band, and no temp file left behind
    let scene_dir = cache.path().join("S2A_TEST");
    let names: Vec<String> = std::fs::read_dir(&scene_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["visual.tif".to_string()]);
}

#[tokio::test]
async fn test_error_status_is_band_failure() {
    let cache = TempDir::new().unwrap();
    let transport = MemoryTransport::new();
    transport.respond(VISUAL_URL, HttpResponse::new(403, "AuthenticationFailed"));

    let err = downloader(&transport).download(&scene(), &[], cache.path()).await.unwrap_err();

    match err {
        OrbitalError::PartialDownload(partial) => {
            assert!(partial.succeeded.is_empty());
            assert!(partial.failed[0].reason.contains("403"));
            assert!(partial.image_set.is_empty());
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(!cache.path().join("S2A_TEST").join("visual.tif").exists());
}

#[tokio::test]
async fn test_signed_url_is_used_for_download() {
    let cache = TempDir::new().unwrap();
    let transport = MemoryTransport::new();
    let sign_request = reqwest::Url::parse_with_params(SIGN_URL, &[("href", VISUAL_URL)]).unwrap();
    let signed = format!("{}?sv=2021&sig=abc", VISUAL_URL);
    transport.respond_json(sign_request.as_str(), 200, &serde_json::json!({ "href": signed }));
    transport.respond(&signed, HttpResponse::new(200, b"signed visual".to_vec()));

    let resolver = AssetResolver::new(transport.clone(), SigningPolicy::lenient(SIGN_URL));
    let downloader = CacheDownloader::new(resolver, transport.clone());

    let set = downloader.download(&scene(), &[], cache.path()).await.unwrap();

    assert_eq!(std::fs::read(set.band("visual").unwrap()).unwrap(), b"signed visual");
    let urls: Vec<String> = transport.calls().iter().map(|c| c.url().to_string()).collect();
    assert_eq!(urls, vec![sign_request.to_string(), signed]);
}

#[tokio::test]
async fn test_scene_ids_that_escape_the_cache_are_rejected() {
    let cache = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    let transport = MemoryTransport::new();
    transport.respond(VISUAL_URL, HttpResponse::new(200, b"visual".to_vec()));
    let downloader = downloader(&transport);

    let absolute = elsewhere.path().to_string_lossy().into_owned();
    for id in [absolute.as_str(), "/abs", "../up", "", ".", "S2A/nested"] {
        let err = downloader.download(&scene_with_id(id), &[], cache.path()).await.unwrap_err();
        assert!(matches!(err, OrbitalError::CatalogResponse { .. }), "id {:?}: {:?}", id, err);
    }

    assert_eq!(transport.call_count(), 0);
    assert_eq!(std::fs::read_dir(cache.path()).unwrap().count(), 0);
    assert_eq!(std::fs::read_dir(elsewhere.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_band_names_that_escape_the_scene_directory_fail() {
    let cache = TempDir::new().unwrap();
    let transport = MemoryTransport::new();
    transport.respond(VISUAL_URL, HttpResponse::new(200, b"visual".to_vec()));
    transport.respond("https://blob.example/escape.tif", HttpResponse::new(200, b"escape".to_vec()));
    let mut scene = scene();
    scene.assets.insert(
        "../escape".to_string(),
        AssetRef { href: "https://blob.example/escape.tif".to_string(), media_type: None },
    );

    let err = downloader(&transport)
        .download(&scene, &bands(&["visual", "../escape"]), cache.path())
        .await
        .unwrap_err();

    let partial = match err {
        OrbitalError::PartialDownload(partial) => partial,
        other => panic!("unexpected error {:?}", other),
    };
    assert_eq!(partial.succeeded, vec!["visual".to_string()]);
    assert_eq!(partial.failed.len(), 1);
    assert_eq!(partial.failed[0].band, "../escape");
    assert!(!cache.path().join("escape.tif").exists());
    // only the valid band was fetched
    assert_eq!(transport.call_count(), 1);
}
