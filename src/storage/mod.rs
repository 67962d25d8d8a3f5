// Storage layout: maps logical filenames onto the on-disk root.

pub mod resolver;
