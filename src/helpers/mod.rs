pub mod handler_404;
pub mod json_body;
pub mod validation;
