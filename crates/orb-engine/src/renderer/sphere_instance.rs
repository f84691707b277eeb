use bytemuck::{Pod, Zeroable};

/// Per-sphere render data read by the TypeScript raymarcher.
/// 12 floats = 48 bytes per instance.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct SphereInstance {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub rotation: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub shininess: f32,
    pub emissive: f32,
    pub alpha: f32,
    pub _pad0: f32,
    pub _pad1: f32,
}

impl SphereInstance {
    pub const FLOATS: usize = 12;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;
}

/// Bounded buffer of sphere instances, rebuilt every frame.
/// Pushes beyond capacity are dropped so the shared buffer never overflows.
pub struct SphereBuffer {
    instances: Vec<SphereInstance>,
    capacity: usize,
    dropped: usize,
}

impl SphereBuffer {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            instances: Vec::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    pub fn clear(&mut self) {
        self.instances.clear();
        self.dropped = 0;
    }

    pub fn push(&mut self, instance: SphereInstance) {
        if self.instances.len() < self.capacity {
            self.instances.push(instance);
        } else {
            self.dropped += 1;
        }
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Instances that did not fit since the last `clear`.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.instances)
    }

    pub fn instances_ptr(&self) -> *const f32 {
        self.instances.as_ptr() as *const f32
    }
}

impl Default for SphereBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_instance_is_48_bytes() {
        assert_eq!(std::mem::size_of::<SphereInstance>(), SphereInstance::STRIDE_BYTES);
        assert_eq!(SphereInstance::FLOATS, 12);
    }

    #[test]
    fn push_respects_capacity() {
        let mut buf = SphereBuffer::with_capacity(2);
        for _ in 0..5 {
            buf.push(SphereInstance::default());
        }
        assert_eq!(buf.instance_count(), 2);
        assert_eq!(buf.dropped(), 3);
        assert_eq!(buf.as_floats().len(), 24);

        buf.clear();
        assert_eq!(buf.instance_count(), 0);
        assert_eq!(buf.dropped(), 0);
    }
}
