// Domain layer - pure rotation and health decision logic
pub mod dashboard;
pub mod health;
pub mod rotation;
