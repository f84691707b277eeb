use crate::components::entity::Entity;
use crate::renderer::sphere_instance::{SphereBuffer, SphereInstance};

/// Rebuild the sphere buffer from active entities that carry a mesh.
pub fn build_sphere_buffer<'a>(
    entities: impl Iterator<Item = &'a Entity>,
    buffer: &mut SphereBuffer,
) {
    buffer.clear();
    for entity in entities {
        if !entity.active {
            continue;
        }
        let Some(mesh) = &entity.mesh else {
            continue;
        };
        buffer.push(SphereInstance {
            x: entity.pos.x,
            y: entity.pos.y,
            radius: mesh.radius,
            rotation: entity.rotation,
            r: mesh.color.r,
            g: mesh.color.g,
            b: mesh.color.b,
            shininess: mesh.shininess,
            emissive: mesh.emissive,
            alpha: mesh.alpha,
            _pad0: 0.0,
            _pad1: 0.0,
        });
    }
    if buffer.dropped() > 0 {
        log::warn!("sphere buffer full, {} spheres not drawn", buffer.dropped());
    }
}
