// Engine: transfer coordination and the existence index.

pub mod coordinator;
pub mod index;
pub mod stats;
pub mod transfer;
