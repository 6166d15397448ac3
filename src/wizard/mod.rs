pub mod api;
pub mod machine;
pub mod model;
pub mod session;
