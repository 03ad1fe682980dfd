//! Seams between the landscape and the graphics backend.
//!
//! Everything that touches GPU resources takes a [`GpuContext`], a token that
//! is neither `Send` nor `Sync`. Holding one proves the caller is on the
//! thread that owns the graphics context, so mesh uploads and releases cannot
//! be issued from generation workers.

use std::fmt;
use std::marker::PhantomData;
use std::thread::{self, ThreadId};

use bevy::math::{Mat4, Vec2, Vec3};

use crate::chunk::Chunk;
use crate::coords::ChunkPos;
use crate::mesh::MeshData;

/// Proof of being on the graphics thread.
///
/// Created once by whoever owns the graphics context and passed by reference
/// to every GPU-touching call.
#[derive(Debug)]
pub struct GpuContext {
  thread: ThreadId,
  _not_send: PhantomData<*const ()>,
}

impl GpuContext {
  /// Binds a context token to the calling thread.
  pub fn bind_current_thread() -> Self {
    Self {
      thread: thread::current().id(),
      _not_send: PhantomData,
    }
  }

  /// Thread the token was created on.
  pub fn thread(&self) -> ThreadId {
    self.thread
  }
}

/// Backend handle for an uploaded chunk mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GpuMeshId(pub u64);

/// Error from a GPU operation.
#[derive(Debug, Clone, PartialEq)]
pub enum GpuError {
  /// The backend could not create a resource.
  ResourceCreation(String),
  /// Upload requested for a chunk whose resources were already released.
  ChunkRetired(ChunkPos),
}

impl fmt::Display for GpuError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::ResourceCreation(msg) => write!(f, "GPU resource creation failed: {msg}"),
      Self::ChunkRetired(pos) => write!(f, "chunk {pos} was already unloaded"),
    }
  }
}

impl std::error::Error for GpuError {}

/// Creates and releases per-chunk GPU meshes.
pub trait GpuBackend {
  /// Uploads a chunk mesh placed at `pos`.
  fn create_mesh(
    &mut self,
    ctx: &GpuContext,
    pos: ChunkPos,
    mesh: &MeshData,
  ) -> Result<GpuMeshId, GpuError>;

  /// Releases a mesh created by [`GpuBackend::create_mesh`].
  fn destroy_mesh(&mut self, ctx: &GpuContext, id: GpuMeshId);
}

/// Draws the visible chunks of a frame.
///
/// Implementations own their pipeline state (shaders, textures, materials).
pub trait ChunkRenderer {
  /// Draws `chunks`, nearest first, from `projection`.
  fn render(&mut self, ctx: &GpuContext, chunks: &[&Chunk], projection: &Projection);
}

/// Observer placement for a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
  /// Observer position in world space.
  pub position: Vec3,
  /// View direction.
  pub dir: Vec3,
}

impl Projection {
  pub fn new(position: Vec3, dir: Vec3) -> Self {
    Self { position, dir }
  }

  /// Observer position on the XZ plane.
  #[inline]
  pub fn xz(&self) -> Vec2 {
    Vec2::new(self.position.x, self.position.z)
  }

  /// Right-handed view matrix looking along `dir` with Y up.
  pub fn view(&self) -> Mat4 {
    Mat4::look_to_rh(self.position, self.dir, Vec3::Y)
  }
}
