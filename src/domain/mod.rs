// Domain layer: models, the catalog and the ports the pipeline is built on.

pub mod catalog;
pub mod model;
pub mod ports;
pub mod settings;
