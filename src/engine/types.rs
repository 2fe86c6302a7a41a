use crate::world::{Camera, Sector};

/// Constants that depend on the *frame-buffer*, not on the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Screen {
    pub w: i32,
    pub h: i32,
}

/// Size of the projection plane at the near distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjPlane {
    pub w: f32,
    pub h: f32,
}

impl ProjPlane {
    /// `w = 2·tan(fov/2)·near`, `h = w / aspect`.
    pub fn from_camera(cam: &Camera) -> Self {
        let w = (cam.fov * 0.5).tan() * cam.near * 2.0;
        Self {
            w,
            h: w / cam.aspect_ratio,
        }
    }
}

/// Camera state reused by every wall of one frame.
#[derive(Clone, Copy, Debug)]
pub struct Viewer {
    /// Input camera with its eye lifted by the home sector's floor.
    pub camera: Camera,
    pub plane: ProjPlane,
    pub screen: Screen,
    /// Floor / ceiling of the sector the camera stands in.
    pub home_floor: f32,
    pub home_ceil: f32,
}

impl Viewer {
    pub fn new(camera: &Camera, home: &Sector, screen: Screen) -> Self {
        let mut camera = *camera;
        camera.position.y += home.floor_height;
        Self {
            plane: ProjPlane::from_camera(&camera),
            camera,
            screen,
            home_floor: home.floor_height,
            home_ceil: home.ceil_height,
        }
    }
}
