// Domain layer: reading-list models and the ports (interfaces) to the catalog and the store.

pub mod model;
pub mod ports;
