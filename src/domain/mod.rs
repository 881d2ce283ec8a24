pub mod entities;
pub mod request_key;
pub mod selection;
