// Domain layer: request/response models and the ports the orchestrator talks through.

pub mod model;
pub mod ports;
