// Domain layer: core models and ports (interfaces). No external systems are touched here.

pub mod model;
pub mod ports;
