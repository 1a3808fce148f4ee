// Tab host bridge
// Wire format and transport used by the live backend.

pub mod protocol;
pub mod transport;
