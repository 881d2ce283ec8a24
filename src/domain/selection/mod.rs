pub mod affordance;
pub mod model;
pub mod range;
