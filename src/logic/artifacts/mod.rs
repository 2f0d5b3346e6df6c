//! Artifacts Module - Persistence of trained state
//!
//! Lưu / tải transform + model cùng manifest để kiểm tra toàn vẹn.

pub mod manifest;
pub mod store;


pub use manifest::{ArtifactManifest, ARTIFACT_FORMAT_VERSION};
pub use store::{ArtifactSet, ArtifactStore};
