pub mod credentials;
pub mod endpoints;
pub mod field_path;
pub mod report;
pub mod rules;
pub mod test_definition;
pub mod upload;
