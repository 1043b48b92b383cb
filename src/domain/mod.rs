// Domain layer: update models and ports (interfaces).

pub mod model;
pub mod ports;
