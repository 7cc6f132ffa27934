// Domain layer: record models and ports. Nothing here talks to a network or a cloud SDK.

pub mod model;
pub mod ports;
