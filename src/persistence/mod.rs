pub mod memory;
pub mod model;
pub mod repo;
pub mod seed;
