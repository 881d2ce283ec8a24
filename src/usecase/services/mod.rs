pub mod bulk_service;
pub mod dataset_view;
pub mod import_service;
pub mod query_service;
pub mod table_controller;
