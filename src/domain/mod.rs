// Domain layer: Redmine models and the ports (traits) the core pipeline drives.

pub mod model;
pub mod ports;
