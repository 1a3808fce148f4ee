// Sidebar shared type definitions
// Entity records, snapshot shape, settings and error enums.

pub mod errors;
pub mod group;
pub mod recent;
pub mod settings;
pub mod snapshot;
pub mod tab;
