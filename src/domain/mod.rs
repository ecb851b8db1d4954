// Domain layer: connector data model and the ports the core talks to.

pub mod model;
pub mod ports;
