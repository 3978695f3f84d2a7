use std::path::Path;

use actix_files::Files;

pub const MOUNT_PATH: &str = "/uploads";

/// Static files under `/uploads`, served from `dir`. A missing directory
/// is logged by actix-files and every lookup answers 404.
pub fn service(dir: &Path) -> Files {
    Files::new(MOUNT_PATH, dir).use_last_modified(true)
}
