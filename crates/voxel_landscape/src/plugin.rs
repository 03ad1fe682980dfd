//! Bevy integration.
//!
//! [`LandscapePlugin`] drives a [`Landscape`] from the [`StreamingCamera`]
//! every frame. Chunk meshes become `Mesh` assets on entities that stay hidden
//! until the landscape lists them as visible.

use std::collections::{HashMap, HashSet};

use bevy::asset::RenderAssetUsages;
use bevy::image::ImageSampler;
use bevy::mesh::PrimitiveTopology;
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};

use crate::chunk::Chunk;
use crate::config::LandscapeConfig;
use crate::coords::ChunkPos;
use crate::gpu::{ChunkRenderer, GpuBackend, GpuContext, GpuError, GpuMeshId, Projection};
use crate::landscape::Landscape;
use crate::mesh::MeshData;

/// Marker component for the camera that controls streaming.
#[derive(Component)]
pub struct StreamingCamera;

/// Links a chunk entity to its backend mesh id.
#[derive(Component, Clone, Copy, Debug)]
pub struct ChunkMesh(pub GpuMeshId);

/// Material shared by every chunk mesh.
#[derive(Resource, Clone)]
pub struct ChunkMaterial(pub Handle<StandardMaterial>);

/// Entities and mesh assets owned by loaded chunks.
#[derive(Resource, Default)]
pub struct ChunkEntities {
  next_id: u64,
  live: HashMap<GpuMeshId, (Entity, Handle<Mesh>)>,
}

impl ChunkEntities {
  /// Number of chunk entities alive.
  pub fn len(&self) -> usize {
    self.live.len()
  }

  pub fn is_empty(&self) -> bool {
    self.live.is_empty()
  }

  pub fn entity(&self, id: GpuMeshId) -> Option<Entity> {
    self.live.get(&id).map(|(entity, _)| *entity)
  }
}

/// Mesh ids drawn in the latest frame.
#[derive(Resource, Default, Debug)]
pub struct VisibleChunks {
  ids: HashSet<GpuMeshId>,
  nearest: Option<ChunkPos>,
}

impl VisibleChunks {
  pub fn contains(&self, id: GpuMeshId) -> bool {
    self.ids.contains(&id)
  }

  pub fn len(&self) -> usize {
    self.ids.len()
  }

  pub fn is_empty(&self) -> bool {
    self.ids.is_empty()
  }

  /// Closest drawn chunk.
  pub fn nearest(&self) -> Option<ChunkPos> {
    self.nearest
  }
}

impl ChunkRenderer for VisibleChunks {
  fn render(&mut self, _ctx: &GpuContext, chunks: &[&Chunk], _projection: &Projection) {
    self.ids.clear();
    self.ids.extend(chunks.iter().filter_map(|chunk| chunk.gpu_mesh()));
    self.nearest = chunks.first().map(|chunk| chunk.pos());
  }
}

/// [`GpuBackend`] that spawns one mesh entity per chunk.
pub struct BevyMeshBackend<'a, 'w, 's> {
  pub commands: &'a mut Commands<'w, 's>,
  pub meshes: &'a mut Assets<Mesh>,
  pub material: Handle<StandardMaterial>,
  pub entities: &'a mut ChunkEntities,
}

impl GpuBackend for BevyMeshBackend<'_, '_, '_> {
  fn create_mesh(
    &mut self,
    _ctx: &GpuContext,
    pos: ChunkPos,
    mesh: &MeshData,
  ) -> Result<GpuMeshId, GpuError> {
    if mesh.positions.len() != mesh.normals.len() || mesh.positions.len() != mesh.uvs.len() {
      return Err(GpuError::ResourceCreation(format!(
        "mismatched attribute lengths for chunk {pos}"
      )));
    }

    let id = GpuMeshId(self.entities.next_id);
    self.entities.next_id += 1;

    let handle = self.meshes.add(to_bevy_mesh(mesh));
    let entity = self
      .commands
      .spawn((
        Name::new(format!("Chunk {pos}")),
        Mesh3d(handle.clone()),
        MeshMaterial3d(self.material.clone()),
        Transform::from_xyz(pos.x as f32, 0.0, pos.z as f32),
        Visibility::Hidden,
        ChunkMesh(id),
      ))
      .id();
    self.entities.live.insert(id, (entity, handle));
    Ok(id)
  }

  fn destroy_mesh(&mut self, _ctx: &GpuContext, id: GpuMeshId) {
    let Some((entity, handle)) = self.entities.live.remove(&id) else {
      warn!("Release of unknown chunk mesh {id:?}");
      return;
    };
    self.commands.entity(entity).despawn();
    self.meshes.remove(handle.id());
  }
}

/// Converts a chunk mesh into a bevy `Mesh`.
///
/// Chunk meshes wind clockwise with inward normals; bevy culls clockwise
/// faces, so each triangle is reversed and each normal negated.
pub fn to_bevy_mesh(mesh: &MeshData) -> Mesh {
  let count = mesh.vertex_count() / 3 * 3;
  let mut positions = Vec::with_capacity(count);
  let mut normals = Vec::with_capacity(count);
  let mut uvs = Vec::with_capacity(count);

  for tri in (0..count).step_by(3) {
    for i in [tri, tri + 2, tri + 1] {
      positions.push(mesh.positions[i]);
      normals.push((-Vec3::from_array(mesh.normals[i])).normalize_or_zero().to_array());
      uvs.push(mesh.uvs[i]);
    }
  }

  Mesh::new(
    PrimitiveTopology::TriangleList,
    RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
  )
  .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
  .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
  .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
}

/// Creates a 2x2 checkerboard texture with nearest-neighbor sampling.
pub fn create_checker_texture(images: &mut Assets<Image>) -> Handle<Image> {
  const LIGHT: [u8; 4] = [168, 160, 140, 255];
  const DARK: [u8; 4] = [112, 104, 92, 255];

  let data = [LIGHT, DARK, DARK, LIGHT].concat();
  let mut image = Image::new(
    Extent3d {
      width: 2,
      height: 2,
      depth_or_array_layers: 1,
    },
    TextureDimension::D2,
    data,
    TextureFormat::Rgba8UnormSrgb,
    RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
  );
  image.sampler = ImageSampler::nearest();
  images.add(image)
}

/// Streams terrain around the [`StreamingCamera`].
pub struct LandscapePlugin {
  pub config: LandscapeConfig,
}

impl Default for LandscapePlugin {
  fn default() -> Self {
    Self {
      config: LandscapeConfig::default(),
    }
  }
}

impl Plugin for LandscapePlugin {
  fn build(&self, app: &mut App) {
    let landscape = Landscape::from_config(self.config.clone())
      .unwrap_or_else(|e| panic!("failed to start landscape streaming: {e}"));

    app
      .insert_non_send_resource(GpuContext::bind_current_thread())
      .insert_resource(landscape)
      .init_resource::<ChunkEntities>()
      .init_resource::<VisibleChunks>()
      .add_systems(Startup, setup_chunk_material)
      .add_systems(
        Update,
        (stream_landscape, apply_chunk_visibility)
          .chain()
          .run_if(resource_exists::<ChunkMaterial>),
      );
  }
}

fn setup_chunk_material(
  mut commands: Commands,
  mut images: ResMut<Assets<Image>>,
  mut materials: ResMut<Assets<StandardMaterial>>,
) {
  let texture = create_checker_texture(&mut images);
  let material = materials.add(StandardMaterial {
    base_color_texture: Some(texture),
    perceptual_roughness: 0.9,
    ..default()
  });
  commands.insert_resource(ChunkMaterial(material));
}

#[allow(clippy::too_many_arguments)]
fn stream_landscape(
  ctx: NonSend<GpuContext>,
  mut commands: Commands,
  mut meshes: ResMut<Assets<Mesh>>,
  material: Res<ChunkMaterial>,
  mut entities: ResMut<ChunkEntities>,
  mut landscape: ResMut<Landscape>,
  mut visible: ResMut<VisibleChunks>,
  camera: Query<&GlobalTransform, With<StreamingCamera>>,
) {
  let Ok(transform) = camera.single() else {
    return;
  };
  let projection = Projection::new(transform.translation(), transform.forward().as_vec3());

  let mut backend = BevyMeshBackend {
    commands: &mut commands,
    meshes: &mut meshes,
    material: material.0.clone(),
    entities: &mut entities,
  };
  if let Err(e) = landscape.render(&projection, &ctx, &mut backend, &mut *visible) {
    error!("Landscape streaming failed: {e}");
  }
}

fn apply_chunk_visibility(
  visible: Res<VisibleChunks>,
  mut chunks: Query<(&ChunkMesh, &mut Visibility)>,
) {
  for (chunk, mut visibility) in &mut chunks {
    let target = if visible.contains(chunk.0) {
      Visibility::Inherited
    } else {
      Visibility::Hidden
    };
    if *visibility != target {
      *visibility = target;
    }
  }
}
