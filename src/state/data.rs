//! Shared data structures for the application inventory
//! 
//! These structs represent the data model that flows between
//! the database layer and its consumers.

use image::DynamicImage;

bitflags::bitflags! {
    /// Application-level flags stored with each application.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AppFlags: u32 {
        const IS_SYSTEM_APP = 1 << 0;
        const HAS_PERMISSIONS = 1 << 1;
    }
}

bitflags::bitflags! {
    /// Cached privacy status of an application.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusFlags: u32 {
        /// At least one setting is not at its trusted option
        const IS_UNTRUSTED = 1 << 0;
        const NOTIFY_ON_ACCESS = 1 << 1;
        const LOG_ON_ACCESS = 1 << 2;
    }
}

/// Represents a single installed application
#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    /// Package identifier, unique per application
    pub package_name: String,
    /// Display label
    pub label: String,
    pub version_code: i32,
    /// Unknown bits are retained as stored
    pub app_flags: AppFlags,
    pub status_flags: StatusFlags,
    /// Owning user id
    pub uid: u32,
    /// Decoded icon
    pub icon: DynamicImage,
}

impl Application {
    pub fn is_system_app(&self) -> bool {
        self.app_flags.contains(AppFlags::IS_SYSTEM_APP)
    }

    pub fn is_untrusted(&self) -> bool {
        self.status_flags.contains(StatusFlags::IS_UNTRUSTED)
    }
}
