/// State management module
/// 
/// This module handles all persisted application state, including:
/// - Database connection and schema (library.rs)
/// - Shared data structures (data.rs)
/// - Query descriptors (query.rs)
/// - Materializing applications from query results (loader.rs)

pub mod data;
pub mod library;
pub mod loader;
pub mod query;

#[cfg(test)]
pub(crate) mod fixtures {
    use super::data::{AppFlags, StatusFlags};
    use super::library::{ApplicationRecord, Library};
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    /// A 2x2 PNG icon
    pub(crate) fn png_icon() -> Vec<u8> {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([32, 96, 160, 255])));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    /// Store a plain user application
    pub(crate) fn store_app(library: &Library, package_name: &str, label: &str) {
        let icon = png_icon();
        library
            .upsert_application(&ApplicationRecord {
                package_name,
                label,
                version_code: 1,
                app_flags: AppFlags::HAS_PERMISSIONS,
                status_flags: StatusFlags::empty(),
                uid: 10_000,
                icon: &icon,
            })
            .unwrap();
    }
}
