// Application layer - supervisor state machine and capability seams
pub mod supervisor;
pub mod surface;
