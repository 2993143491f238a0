//! # engine_defaults
//!
//! Stock components shared by tools and tests, each with the field metadata
//! the persistence layer needs. Call [`register_defaults`] once at startup.

pub mod location;
pub mod stats;

use engine_component::{ComponentLibrary, MetadataError};

pub use location::Location;
pub use stats::{DisplayName, Health, Inventory, NetworkOwner};

/// Register every stock component with `library`.
///
/// # Errors
///
/// Returns [`MetadataError::AlreadyRegistered`] if one of them is already
/// registered.
pub fn register_defaults(library: &mut ComponentLibrary) -> Result<(), MetadataError> {
    library.register(Location::metadata()?)?;
    library.register(Health::metadata()?)?;
    library.register(DisplayName::metadata()?)?;
    library.register(Inventory::metadata()?)?;
    library.register(NetworkOwner::metadata()?)?;
    Ok(())
}
