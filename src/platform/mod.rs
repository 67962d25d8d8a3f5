// Platform abstraction: the native file system behind the bridge, plus a local implementation.

pub mod local_fs;
pub mod traits;
