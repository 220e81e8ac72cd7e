pub mod detection;
pub mod geometry;
pub mod scene;

pub use detection::{
    ChangeRegion, ChangeRequest, ChangeResponse, DetectRequest, DetectResponse, Detection,
    HealthStatus, ImageSource, PixelBox,
};
pub use geometry::{BoundingBox, GeoPoint};
pub use scene::{
    AssetRef, CatalogScene, DateWindow, ImagerySource, LocalImageSet, ResolvedAsset,
    SearchCriteria, SigningOutcome, DEFAULT_COLLECTION, DEFAULT_GSD_M, DEFAULT_MAX_RESULTS,
    TRUE_COLOR_BAND,
};
