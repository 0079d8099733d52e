//! Chunk-based terrain streaming
//!
//! World space is cut into square tiles of `chunk_size` units. Every tile
//! within `render_distance` (Chebyshev, in chunk units) of the player's tile
//! has exactly one mesh; everything else is destroyed.

use std::collections::HashMap;

use glam::Vec3;

use super::terrain::{Biome, HeightField};
use crate::renderer::{MeshHandle, RenderSink, TerrainVertex};

/// Integer tile coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey {
    pub x: i32,
    pub z: i32,
}

impl ChunkKey {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Tile containing a world position (floor division)
    pub fn containing(position: Vec3, chunk_size: u32) -> Self {
        let size = chunk_size.max(1) as f32;
        let cx = (position.x / size).floor();
        let cz = (position.z / size).floor();
        let cx = if cx.is_finite() { cx as i32 } else { 0 };
        let cz = if cz.is_finite() { cz as i32 } else { 0 };
        Self { x: cx, z: cz }
    }

    /// Chebyshev distance in tiles
    #[inline]
    pub fn chebyshev(&self, other: ChunkKey) -> i32 {
        (self.x.saturating_sub(other.x))
            .saturating_abs()
            .max(self.z.saturating_sub(other.z).saturating_abs())
    }
}

/// Renderable mesh data for one tile, in tile-local coordinates
#[derive(Debug, Clone)]
pub struct ChunkMesh {
    /// World position of the tile's (0, 0) corner
    pub origin: Vec3,
    pub vertices: Vec<TerrainVertex>,
    /// Vertex index triples
    pub triangles: Vec<[u32; 3]>,
}

impl ChunkMesh {
    /// Build the mesh of one tile from height-field samples.
    ///
    /// The lattice has `(chunk_size + 1)²` shared vertices so a tile's last
    /// row samples the same wrapped cells as its neighbor's first row.
    pub fn build(field: &HeightField, key: ChunkKey, chunk_size: u32) -> Self {
        let n = chunk_size.max(1);
        let side = n + 1;
        let base_x = key.x as i64 * n as i64;
        let base_z = key.z as i64 * n as i64;

        let mut vertices = Vec::with_capacity((side * side) as usize);
        for lx in 0..side {
            for lz in 0..side {
                let wx = (base_x + lx as i64) as f32;
                let wz = (base_z + lz as i64) as f32;
                let h = field.height(wx, wz);
                vertices.push(TerrainVertex::new(
                    [lx as f32, h, lz as f32],
                    Biome::from_height(h).color(),
                    [lx as f32 / n as f32, lz as f32 / n as f32],
                ));
            }
        }

        let index = |lx: u32, lz: u32| lx * side + lz;
        let mut triangles = Vec::with_capacity((n * n * 2) as usize);
        for lx in 0..n {
            for lz in 0..n {
                let a = index(lx, lz);
                let b = index(lx + 1, lz);
                let c = index(lx, lz + 1);
                let d = index(lx + 1, lz + 1);
                triangles.push([a, b, c]);
                triangles.push([b, d, c]);
            }
        }

        Self {
            origin: Vec3::new(base_x as f32, 0.0, base_z as f32),
            vertices,
            triangles,
        }
    }

    /// Height stored at a tile-local lattice point
    pub fn height_at(&self, lx: u32, lz: u32, chunk_size: u32) -> Option<f32> {
        let side = chunk_size.max(1) + 1;
        if lx >= side || lz >= side {
            return None;
        }
        self.vertices
            .get((lx * side + lz) as usize)
            .map(|v| v.position[1])
    }
}

/// Streams tiles in and out around a moving viewpoint
#[derive(Debug)]
pub struct ChunkStreamer {
    chunk_size: u32,
    render_distance: i32,
    chunks: HashMap<ChunkKey, MeshHandle>,
}

impl ChunkStreamer {
    pub fn new(chunk_size: u32, render_distance: i32) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            render_distance: render_distance.max(0),
            chunks: HashMap::new(),
        }
    }

    #[inline]
    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    #[inline]
    pub fn render_distance(&self) -> i32 {
        self.render_distance
    }

    /// Number of cached tiles
    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Upper bound on the cache after a `maintain` call
    pub fn max_cached(&self) -> usize {
        let side = (2 * self.render_distance + 1) as usize;
        side * side
    }

    /// Handle of a cached tile
    pub fn handle(&self, key: ChunkKey) -> Option<MeshHandle> {
        self.chunks.get(&key).copied()
    }

    pub fn contains(&self, key: ChunkKey) -> bool {
        self.chunks.contains_key(&key)
    }

    /// Ensure every tile near the player exists and evict the rest
    pub fn maintain(&mut self, field: &HeightField, player: Vec3, sink: &mut dyn RenderSink) {
        let center = ChunkKey::containing(player, self.chunk_size);
        let r = self.render_distance;

        for dx in -r..=r {
            for dz in -r..=r {
                let key = ChunkKey::new(center.x.saturating_add(dx), center.z.saturating_add(dz));
                self.generate_chunk(field, key, sink);
            }
        }

        let stale: Vec<ChunkKey> = self
            .chunks
            .keys()
            .filter(|k| k.chebyshev(center) > r)
            .copied()
            .collect();
        for key in stale {
            if let Some(handle) = self.chunks.remove(&key) {
                sink.destroy(handle);
                log::trace!("Evicted chunk ({}, {})", key.x, key.z);
            }
        }
    }

    /// Build and upload a tile unless it is already cached
    pub fn generate_chunk(
        &mut self,
        field: &HeightField,
        key: ChunkKey,
        sink: &mut dyn RenderSink,
    ) -> MeshHandle {
        if let Some(handle) = self.chunks.get(&key) {
            return *handle;
        }
        let mesh = ChunkMesh::build(field, key, self.chunk_size);
        let handle = sink.upload_chunk(key, &mesh);
        let previous = self.chunks.insert(key, handle);
        debug_assert!(previous.is_none(), "two meshes for chunk {:?}", key);
        handle
    }

    /// Destroy every cached tile
    pub fn clear(&mut self, sink: &mut dyn RenderSink) {
        for (_, handle) in self.chunks.drain() {
            sink.destroy(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::HeadlessRenderer;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn field() -> HeightField {
        let mut rng = Pcg32::seed_from_u64(5);
        HeightField::generate(64, 64, 4.0, 8.0, true, &mut rng)
    }

    #[test]
    fn test_key_floor_division() {
        assert_eq!(ChunkKey::containing(Vec3::new(0.0, 0.0, 15.9), 16), ChunkKey::new(0, 0));
        assert_eq!(ChunkKey::containing(Vec3::new(16.0, 0.0, 0.0), 16), ChunkKey::new(1, 0));
        assert_eq!(ChunkKey::containing(Vec3::new(-0.1, 0.0, -16.0), 16), ChunkKey::new(-1, -1));
        assert_eq!(ChunkKey::containing(Vec3::new(-16.1, 0.0, 0.0), 16), ChunkKey::new(-2, 0));
    }

    #[test]
    fn test_mesh_shape() {
        let mesh = ChunkMesh::build(&field(), ChunkKey::new(2, -1), 16);
        assert_eq!(mesh.vertices.len(), 17 * 17);
        assert_eq!(mesh.triangles.len(), 16 * 16 * 2);
        assert_eq!(mesh.origin, Vec3::new(32.0, 0.0, -16.0));
        let max_index = mesh.triangles.iter().flatten().copied().max().unwrap();
        assert_eq!(max_index as usize, mesh.vertices.len() - 1);
        for v in &mesh.vertices {
            assert!(v.uv[0] >= 0.0 && v.uv[0] <= 1.0);
            assert!(v.uv[1] >= 0.0 && v.uv[1] <= 1.0);
            assert_eq!(v.color, Biome::from_height(v.position[1]).color());
        }
    }

    #[test]
    fn test_adjacent_chunks_share_edges() {
        let f = field();
        let a = ChunkMesh::build(&f, ChunkKey::new(0, 0), 16);
        let east = ChunkMesh::build(&f, ChunkKey::new(1, 0), 16);
        let north = ChunkMesh::build(&f, ChunkKey::new(0, 1), 16);
        for i in 0..=16 {
            assert_eq!(a.height_at(16, i, 16), east.height_at(0, i, 16));
            assert_eq!(a.height_at(i, 16, 16), north.height_at(i, 0, 16));
        }
    }

    #[test]
    fn test_generate_is_idempotent() {
        let f = field();
        let mut sink = HeadlessRenderer::new();
        let mut streamer = ChunkStreamer::new(16, 1);
        let first = streamer.generate_chunk(&f, ChunkKey::new(4, 4), &mut sink);
        let second = streamer.generate_chunk(&f, ChunkKey::new(4, 4), &mut sink);
        assert_eq!(first, second);
        assert_eq!(sink.uploads(), 1);
        assert_eq!(streamer.len(), 1);
    }

    #[test]
    fn test_maintain_fills_radius() {
        let f = field();
        let mut sink = HeadlessRenderer::new();
        let mut streamer = ChunkStreamer::new(16, 3);
        streamer.maintain(&f, Vec3::new(32.0, 5.0, 32.0), &mut sink);
        assert_eq!(streamer.len(), 49);
        assert_eq!(streamer.max_cached(), 49);
        assert!(streamer.contains(ChunkKey::new(-1, -1)));
        assert!(streamer.contains(ChunkKey::new(5, 5)));
        assert!(!streamer.contains(ChunkKey::new(6, 2)));

        // Staying put uploads nothing new
        let uploads = sink.uploads();
        streamer.maintain(&f, Vec3::new(33.0, 5.0, 34.0), &mut sink);
        assert_eq!(sink.uploads(), uploads);
    }

    #[test]
    fn test_moving_away_evicts() {
        let f = field();
        let mut sink = HeadlessRenderer::new();
        let mut streamer = ChunkStreamer::new(16, 1);

        // A stray tile far from anything tracked
        streamer.generate_chunk(&f, ChunkKey::new(40, 40), &mut sink);
        streamer.maintain(&f, Vec3::ZERO, &mut sink);
        assert!(!streamer.contains(ChunkKey::new(40, 40)));
        assert_eq!(streamer.len(), 9);

        streamer.maintain(&f, Vec3::new(16.0 * 10.0, 0.0, 0.0), &mut sink);
        assert_eq!(streamer.len(), 9);
        assert!(!streamer.contains(ChunkKey::new(0, 0)));
        assert!(streamer.contains(ChunkKey::new(10, 0)));
        assert_eq!(sink.live_meshes(), 9);
    }

    #[test]
    fn test_cache_bounded_while_walking() {
        let f = field();
        let mut sink = HeadlessRenderer::new();
        let mut streamer = ChunkStreamer::new(16, 2);
        for step in 0..200 {
            let pos = Vec3::new(step as f32 * 3.7, 0.0, step as f32 * -2.1);
            streamer.maintain(&f, pos, &mut sink);
            assert!(streamer.len() <= streamer.max_cached());
        }
        assert_eq!(sink.live_meshes(), streamer.len());
    }

    #[test]
    fn test_clear_destroys_all() {
        let f = field();
        let mut sink = HeadlessRenderer::new();
        let mut streamer = ChunkStreamer::new(8, 1);
        streamer.maintain(&f, Vec3::ZERO, &mut sink);
        streamer.clear(&mut sink);
        assert!(streamer.is_empty());
        assert_eq!(sink.live_meshes(), 0);
    }
}
