// Domain layer: core models, the fixed catalogues and the ports the core talks through.

pub mod catalogue;
pub mod model;
pub mod ports;
