//! Fly-over Demo - streamed voxel terrain.
//!
//! Controls:
//! - WASD: Move horizontally
//! - Space / LCtrl: Rise / sink
//! - Arrow keys: Look around
//! - Shift: Speed boost (5x)
//!
//! An optional TOML config path may be passed as the first argument.
//!
//! Run with: `cargo run -p voxel_landscape --example fly --features demo`

use bevy::prelude::*;
use voxel_landscape::{LandscapeConfig, LandscapePlugin, StreamingCamera, VisibleChunks};

const CAMERA_SPEED: f32 = 60.0;
const SPEED_BOOST: f32 = 5.0;
const TURN_SPEED: f32 = 1.5;

fn main() {
  let config = match std::env::args().nth(1) {
    Some(path) => LandscapeConfig::load(&path).unwrap_or_else(|e| {
      eprintln!("Failed to load {path}: {e}, using defaults");
      LandscapeConfig::default()
    }),
    None => LandscapeConfig::default(),
  };

  App::new()
    .add_plugins(DefaultPlugins.set(WindowPlugin {
      primary_window: Some(Window {
        title: "Fly-over Demo - Voxel Landscape".to_string(),
        resolution: (1280, 720).into(),
        ..default()
      }),
      ..default()
    }))
    .add_plugins(LandscapePlugin { config })
    .insert_resource(ClearColor(Color::srgb(0.55, 0.7, 0.9)))
    .add_systems(Startup, setup)
    .add_systems(Update, (camera_input, report_streaming).chain())
    .run();
}

fn setup(mut commands: Commands) {
  commands.spawn((
    Camera3d::default(),
    StreamingCamera,
    Transform::from_xyz(0.0, 300.0, 0.0).looking_to(Vec3::new(0.0, -0.4, -1.0), Vec3::Y),
  ));

  commands.spawn((
    DirectionalLight {
      illuminance: 8_000.0,
      ..default()
    },
    Transform::from_xyz(0.0, 500.0, 0.0).looking_at(Vec3::new(0.3, 0.0, -0.5), Vec3::Y),
  ));
}

fn camera_input(
  keys: Res<ButtonInput<KeyCode>>,
  mut camera: Query<&mut Transform, With<StreamingCamera>>,
  time: Res<Time>,
) {
  let Ok(mut transform) = camera.single_mut() else {
    return;
  };
  let dt = time.delta_secs();

  let mut yaw = 0.0;
  let mut pitch = 0.0;
  if keys.pressed(KeyCode::ArrowLeft) {
    yaw += 1.0;
  }
  if keys.pressed(KeyCode::ArrowRight) {
    yaw -= 1.0;
  }
  if keys.pressed(KeyCode::ArrowUp) {
    pitch += 1.0;
  }
  if keys.pressed(KeyCode::ArrowDown) {
    pitch -= 1.0;
  }
  transform.rotate_y(yaw * TURN_SPEED * dt);
  transform.rotate_local_x(pitch * TURN_SPEED * dt);

  let forward = transform.forward().as_vec3().with_y(0.0).normalize_or_zero();
  let right = transform.right().as_vec3().with_y(0.0).normalize_or_zero();

  let mut direction = Vec3::ZERO;
  if keys.pressed(KeyCode::KeyW) {
    direction += forward;
  }
  if keys.pressed(KeyCode::KeyS) {
    direction -= forward;
  }
  if keys.pressed(KeyCode::KeyD) {
    direction += right;
  }
  if keys.pressed(KeyCode::KeyA) {
    direction -= right;
  }
  if keys.pressed(KeyCode::Space) {
    direction += Vec3::Y;
  }
  if keys.pressed(KeyCode::ControlLeft) {
    direction -= Vec3::Y;
  }

  if direction == Vec3::ZERO {
    return;
  }

  let speed = if keys.pressed(KeyCode::ShiftLeft) || keys.pressed(KeyCode::ShiftRight) {
    CAMERA_SPEED * SPEED_BOOST
  } else {
    CAMERA_SPEED
  };
  transform.translation += direction.normalize() * speed * dt;
}

fn report_streaming(visible: Res<VisibleChunks>, mut last: Local<Option<IVec2>>) {
  let Some(nearest) = visible.nearest() else {
    return;
  };
  let grid = nearest.grid();
  if *last != Some(grid) {
    info!("Over chunk {grid}, drawing {} chunks", visible.len());
    *last = Some(grid);
  }
}
