pub mod error_code;
pub mod form;
pub mod render;

pub use error_code::ErrorCode;
pub use form::{FormError, FormParams, MAX_FORM_BODY};
pub use render::render_json;
