pub mod dataset;
pub mod pagination;
pub mod record;
