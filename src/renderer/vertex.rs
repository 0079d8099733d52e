//! Vertex layout for terrain meshes

use bytemuck::{Pod, Zeroable};

/// Terrain vertex with position, biome color and chunk-local UV
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub uv: [f32; 2],
}

impl TerrainVertex {
    pub const fn new(position: [f32; 3], color: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            color,
            uv,
        }
    }

    /// Byte stride of one vertex in a packed buffer
    pub const STRIDE: usize = std::mem::size_of::<TerrainVertex>();
}

/// Colors for non-terrain visuals
pub mod colors {
    pub const WHITE: [f32; 3] = [1.0, 1.0, 1.0];
    pub const HEALTH_PILL: [f32; 3] = [0.0, 1.0, 0.0];
    pub const ARMOR_PICKUP: [f32; 3] = [0.0, 0.5, 1.0];

    /// Enemy palette, one picked per spawn
    pub const ENEMY_PALETTE: [[f32; 3]; 9] = [
        [1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0],
        [0.0, 1.0, 0.0],
        [1.0, 1.0, 0.0],
        [1.0, 0.5, 0.0],
        [1.0, 0.0, 1.0],
        [0.0, 1.0, 1.0],
        [0.5, 0.5, 0.5],
        [1.0, 1.0, 1.0],
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_layout() {
        assert_eq!(TerrainVertex::STRIDE, 8 * 4);
        let verts = [
            TerrainVertex::new([1.0, 2.0, 3.0], [0.5, 0.5, 0.5], [0.0, 1.0]),
            TerrainVertex::new([4.0, 5.0, 6.0], [1.0, 1.0, 1.0], [1.0, 0.0]),
        ];
        let bytes: &[u8] = bytemuck::cast_slice(&verts);
        assert_eq!(bytes.len(), 2 * TerrainVertex::STRIDE);
        let floats: &[f32] = bytemuck::cast_slice(bytes);
        assert_eq!(floats[8], 4.0);
    }
}
