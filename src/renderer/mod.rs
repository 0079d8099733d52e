//! Render collaborator interface
//!
//! The simulation only produces mesh data and entity state. Whatever draws
//! it implements [`RenderSink`]; the crate ships a headless implementation
//! that just tracks live handles.

pub mod vertex;

use std::collections::HashSet;

pub use vertex::{TerrainVertex, colors};

use crate::sim::chunk::{ChunkKey, ChunkMesh};

/// Opaque handle to an uploaded mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u64);

/// Write-only sink for terrain meshes
pub trait RenderSink {
    /// Take ownership of a chunk mesh and return a handle for later destruction
    fn upload_chunk(&mut self, key: ChunkKey, mesh: &ChunkMesh) -> MeshHandle;

    /// Release an uploaded mesh
    fn destroy(&mut self, handle: MeshHandle);
}

/// Renderer that draws nothing and keeps count
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    next_handle: u64,
    live: HashSet<MeshHandle>,
    uploads: u64,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Meshes uploaded and not yet destroyed
    pub fn live_meshes(&self) -> usize {
        self.live.len()
    }

    /// Total uploads ever made
    pub fn uploads(&self) -> u64 {
        self.uploads
    }
}

impl RenderSink for HeadlessRenderer {
    fn upload_chunk(&mut self, key: ChunkKey, mesh: &ChunkMesh) -> MeshHandle {
        self.next_handle += 1;
        self.uploads += 1;
        let handle = MeshHandle(self.next_handle);
        self.live.insert(handle);
        log::trace!(
            "Uploaded chunk ({}, {}) with {} vertices",
            key.x,
            key.z,
            mesh.vertices.len()
        );
        handle
    }

    fn destroy(&mut self, handle: MeshHandle) {
        let existed = self.live.remove(&handle);
        debug_assert!(existed, "destroyed unknown mesh {:?}", handle);
    }
}
