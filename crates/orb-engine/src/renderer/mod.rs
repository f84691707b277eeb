pub mod sphere_instance;

pub use sphere_instance::{SphereBuffer, SphereInstance};
