pub mod sphere_render;
