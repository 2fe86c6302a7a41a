//! Portal traversal: which sectors are seen, through which masks, in which
//! order, and how each wall's columns are handed to the rasterizer.
//!
//! * Sectors are visited breadth-first starting from the camera's sector.
//! * A portal spawns a new visit whose mask is the portal's screen quad,
//!   chained to the mask of the sector it was seen from.
//! * A `(sector, source)` pair is queued at most once per frame and a sector
//!   already on the current mask path is never re-entered.
//! * Each wall's columns are split into bands; with a pool the bands run as
//!   scoped jobs and the wall finishes before the next one starts.

use std::collections::{HashSet, VecDeque};

use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use smallvec::{SmallVec, smallvec};

use crate::{
    engine::{
        arena::FrameArena,
        mask::{self, MaskId, Masks, PortalMask},
        projection::project_wall,
        types::{Screen, Viewer},
    },
    renderer::{
        Surface,
        columns::{SectionKind, WallSection},
        palette::wall_colour,
        target::ColumnTarget,
    },
    world::{Camera, ProjectionKind, Scene, SectorId, WallId},
};

/*──────────────────────────── Report ───────────────────────────────*/

/// One dequeued traversal entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SectorVisit {
    pub sector: SectorId,
    /// Sector whose portal led here (the sector itself for the first visit).
    pub source: SectorId,
    /// Walls handed to the rasterizer, in sector order.
    pub walls: Vec<WallId>,
    /// Walls dropped by clipping.
    pub culled: Vec<WallId>,
    /// Columns painted for this visit.
    pub columns: usize,
}

/// What one frame did, in traversal order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub visits: Vec<SectorVisit>,
    pub walls_drawn: usize,
    pub walls_culled: usize,
}

/*──────────────────────────── Renderer ─────────────────────────────*/

#[derive(Clone, Copy, Debug)]
struct Pending {
    sector: SectorId,
    source: SectorId,
    mask: MaskId,
}

/// Frame-to-frame scratch of the portal renderer.
///
/// Keeping one around avoids re-allocating the queue, arenas and depth
/// buffer every frame; the free functions [`render`] / [`render_parallel`]
/// use a fresh one.
#[derive(Default)]
pub struct PortalRenderer {
    masks: Masks,
    sections: FrameArena<WallSection>,
    depth: Vec<f32>,
    queue: VecDeque<Pending>,
    seen: HashSet<(SectorId, SectorId)>,
}

impl PortalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw one frame on the calling thread.
    pub fn render(&mut self, surface: &mut Surface<'_>, scene: &Scene, camera: &Camera, sector: SectorId) -> FrameReport {
        self.run(surface, scene, camera, sector, None)
    }

    /// Draw one frame, splitting each wall's columns over `pool`.
    pub fn render_parallel(
        &mut self,
        surface: &mut Surface<'_>,
        scene: &Scene,
        camera: &Camera,
        sector: SectorId,
        pool: &ThreadPool,
    ) -> FrameReport {
        self.run(surface, scene, camera, sector, Some(pool))
    }

    fn run(
        &mut self,
        surface: &mut Surface<'_>,
        scene: &Scene,
        camera: &Camera,
        home: SectorId,
        pool: Option<&ThreadPool>,
    ) -> FrameReport {
        let mut report = FrameReport::default();
        let Some(home_sector) = scene.sectors.get(home as usize) else {
            if !scene.sectors.is_empty() {
                log::warn!("camera sector {home} does not exist, nothing drawn");
            }
            return report;
        };

        let screen = Screen {
            w: surface.width() as i32,
            h: surface.height() as i32,
        };
        if camera.projection != ProjectionKind::Perspective {
            log::trace!("{:?} projection drawn with perspective math", camera.projection);
        }
        let view = Viewer::new(camera, home_sector, screen);
        let format = surface.format();
        let parts = pool.map_or(1, ThreadPool::current_num_threads);

        let Self {
            masks,
            sections,
            depth,
            queue,
            seen,
        } = self;

        /*----- 1. Frame reset -----------------------------------------------*/
        masks.reset();
        sections.reset();
        queue.clear();
        seen.clear();
        depth.clear();
        depth.resize(surface.width(), f32::INFINITY);

        let root = masks.alloc(PortalMask::root(screen, home));
        seen.insert((home, home));
        queue.push_back(Pending {
            sector: home,
            source: home,
            mask: root,
        });

        let mut target = ColumnTarget::new(surface, depth);

        /*----- 2. Breadth-first over portals --------------------------------*/
        while let Some(entry) = queue.pop_front() {
            let sector = &scene.sectors[entry.sector as usize];
            let mut visit = SectorVisit {
                sector: entry.sector,
                source: entry.source,
                ..SectorVisit::default()
            };

            for &wall_id in &sector.walls {
                let wall = &scene.walls[wall_id as usize];
                let Some(quad) = project_wall(&view, scene, wall_id, sector) else {
                    log::trace!("sector {}: wall {wall_id} culled", entry.sector);
                    visit.culled.push(wall_id);
                    continue;
                };
                visit.walls.push(wall_id);

                /*----- 2a. Queue the sector behind a portal -----------------*/
                let (x1, x2) = quad.x_span();
                if wall.is_portal && x1 != x2 {
                    if let Some(next) = wall.other_side(entry.sector) {
                        let fresh = !seen.contains(&(next, entry.sector))
                            && !mask::on_path(masks, entry.mask, next);
                        if fresh {
                            let child = masks.alloc(PortalMask {
                                corners: quad.mask_corners(),
                                parent: Some(entry.mask),
                                sector: next,
                            });
                            if mask::draw_width(masks, child).is_some() {
                                seen.insert((next, entry.sector));
                                queue.push_back(Pending {
                                    sector: next,
                                    source: entry.sector,
                                    mask: child,
                                });
                            }
                        }
                    }
                }

                /*----- 2b. Rasterize with the current mask ------------------*/
                let kind = if wall.is_portal {
                    SectionKind::Portal {
                        upper: sector.ceil_height < view.home_ceil,
                        lower: sector.floor_height > view.home_floor,
                    }
                } else {
                    SectionKind::Solid
                };
                let section = WallSection::new(quad, view.camera.far, entry.mask, wall_colour(wall_id), kind);

                let Some((w0, w1)) = mask::draw_width(masks, entry.mask) else {
                    continue;
                };
                let mut bands = target.bands(x1.max(w0), x2.min(w1), parts);
                let mut painted: SmallVec<[usize; 16]> = smallvec![0; bands.len()];

                let mut jobs = sections.checkpoint();
                for _ in 0..bands.len() {
                    jobs.alloc(section);
                }
                let masks = &*masks;
                let work = jobs.fresh().iter().zip(bands.iter_mut()).zip(painted.iter_mut());

                match pool {
                    None => {
                        for ((job, band), n) in work {
                            *n = job.draw(band, masks, &format);
                        }
                    }
                    Some(pool) => pool.scope(|s| {
                        for ((job, band), n) in work {
                            s.spawn(move |_| *n = job.draw(band, masks, &format));
                        }
                    }),
                }
                visit.columns += painted.iter().sum::<usize>();
            }

            report.walls_drawn += visit.walls.len();
            report.walls_culled += visit.culled.len();
            report.visits.push(visit);
        }

        log::debug!(
            "frame: {} sector visit(s), {} wall(s) drawn, {} culled",
            report.visits.len(),
            report.walls_drawn,
            report.walls_culled
        );
        report
    }
}

/*──────────────────────────── Entry points ─────────────────────────*/

/// Draw `scene` as seen by `camera` standing in `sector`, single-threaded.
pub fn render(surface: &mut Surface<'_>, scene: &Scene, camera: &Camera, sector: SectorId) -> FrameReport {
    PortalRenderer::new().render(surface, scene, camera, sector)
}

/// Like [`render`], with each wall's columns spread over `pool`.
pub fn render_parallel(
    surface: &mut Surface<'_>,
    scene: &Scene,
    camera: &Camera,
    sector: SectorId,
    pool: &ThreadPool,
) -> FrameReport {
    PortalRenderer::new().render_parallel(surface, scene, camera, sector, pool)
}

/// Worker pool for [`render_parallel`]; `threads <= 0` picks the default
/// (one worker per available core).
pub fn build_pool(threads: i32) -> Result<ThreadPool, ThreadPoolBuildError> {
    let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("portal-columns-{i}"));
    if threads > 0 {
        builder = builder.num_threads(threads as usize);
    }
    builder.build()
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        map::parse_scene,
        renderer::{
            PixelFormat, Rgba,
            palette::{CEILING, FLOOR, shade},
        },
    };
    use glam::Vec3;
    use std::f32::consts::FRAC_PI_2;

    const W: usize = 65;
    const H: usize = 65;

    /// 40×40 room, floor 0 ceiling 10.
    const ROOM: &str = "\
[BEGIN_VERTS]
0 0
40 0
40 40
0 40
[END_VERTS]
[BEGIN_WALLS]
0 1 false
1 2 false
2 3 false
3 0 false
[END_WALLS]
[BEGIN_SECTORS]
0 10 0 1 2 3
[END_SECTORS]
";

    /// Two 20×20 rooms side by side along z, joined by wall 2 (z = 20).
    /// The far room has a lower ceiling and a raised floor.
    const TWO_ROOMS: &str = "\
[BEGIN_VERTS]
0 0
20 0
20 20
0 20
20 40
0 40
[END_VERTS]
[BEGIN_WALLS]
0 1 false
1 2 false
2 3 true
3 0 false
2 4 false
4 5 false
5 3 false
[END_WALLS]
[BEGIN_SECTORS]
0 10 0 1 2 3
2 8 4 5 6 2
[END_SECTORS]
";

    fn camera(x: f32, y: f32, z: f32, dir: Vec3) -> Camera {
        Camera::new(Vec3::new(x, y, z), dir, FRAC_PI_2, W as f32 / H as f32)
    }

    fn frame() -> Vec<u32> {
        vec![0; W * H]
    }

    fn draw(fb: &mut [u32], scene: &Scene, cam: &Camera, sector: SectorId) -> FrameReport {
        let mut surface = Surface::from_u32(W, H, PixelFormat::xrgb8888(), fb).expect("valid");
        render(&mut surface, scene, cam, sector)
    }

    fn order(report: &FrameReport) -> Vec<(SectorId, SectorId)> {
        report.visits.iter().map(|v| (v.sector, v.source)).collect()
    }

    fn px(fb: &[u32], x: usize, y: usize) -> Rgba {
        PixelFormat::xrgb8888().unpack(fb[y * W + x])
    }

    #[test]
    fn closed_room_visits_only_itself() {
        let scene = parse_scene(ROOM).expect("loads");
        let mut fb = frame();
        let report = draw(&mut fb, &scene, &camera(20.0, 5.0, 20.0, Vec3::Z), 0);

        assert_eq!(report.visits.len(), 1);
        let visit = &report.visits[0];
        assert_eq!((visit.sector, visit.source), (0, 0));

        // every wall of the sector is either drawn or culled, in order
        let mut all: Vec<WallId> = visit.walls.iter().chain(&visit.culled).copied().collect();
        all.sort_unstable();
        assert_eq!(all, scene.sectors[0].walls);
        assert!(visit.walls.contains(&2));
        assert!(visit.culled.contains(&0));
    }

    #[test]
    fn facing_wall_is_strip_between_ceiling_and_floor() {
        let scene = parse_scene(ROOM).expect("loads");
        let mut fb = frame();
        draw(&mut fb, &scene, &camera(20.0, 5.0, 20.0, Vec3::Z), 0);

        // wall 2 sits 20 units ahead: rows 24..=40 on a 65 px surface
        let face = shade(wall_colour(2), 0.2);
        assert_eq!(px(&fb, 32, 5), CEILING);
        assert_eq!(px(&fb, 32, 23), CEILING);
        assert_eq!(px(&fb, 32, 32), face);
        assert_eq!(px(&fb, 32, 41), FLOOR);
        assert_eq!(px(&fb, 32, 60), FLOOR);
    }

    #[test]
    fn walls_behind_and_beyond_far_write_nothing() {
        let scene = parse_scene(ROOM).expect("loads");

        // looking out of the room: the only wall ahead is further than far
        let mut cam = camera(20.0, 5.0, 20.0, Vec3::Z);
        cam.far = 10.0;
        let mut fb = frame();
        let report = draw(&mut fb, &scene, &cam, 0);
        assert!(!report.visits[0].walls.contains(&2));
        assert!(report.visits[0].culled.contains(&0));
        assert!(report.visits[0].culled.contains(&2));
        assert_eq!(report.visits[0].columns, 0);
        assert!(fb.iter().all(|&p| p == 0));
    }

    #[test]
    fn portal_queues_neighbour_once_and_masks_it() {
        let scene = parse_scene(TWO_ROOMS).expect("loads");
        let cam = camera(10.0, 5.0, 2.0, Vec3::Z);
        let mut fb = frame();
        let report = draw(&mut fb, &scene, &cam, 0);

        assert_eq!(order(&report), vec![(0, 0), (1, 0)]);
        // the portal wall is seen from room 0, the far wall from room 1
        assert!(report.visits[0].walls.contains(&2));
        assert!(report.visits[1].walls.contains(&5));

        // screen quad of the opening as room 0 sees it
        let screen = Screen {
            w: W as i32,
            h: H as i32,
        };
        let view = Viewer::new(&cam, &scene.sectors[0], screen);
        let quad = project_wall(&view, &scene, 2, &scene.sectors[0]).expect("portal visible");
        let (x1, x2) = quad.x_span();
        let [tl, bl, br, tr] = quad.mask_corners();
        let (top, bottom) = (tl.y.min(tr.y), bl.y.max(br.y));

        // the far wall only shows through the opening
        let far_face = shade(wall_colour(5), 38.0 / 100.0);
        let mut far_rows = Vec::new();
        for y in 0..H {
            for x in 0..W {
                if px(&fb, x, y) == far_face {
                    assert!((x1..=x2).contains(&(x as i32)), "far wall at column {x}");
                    assert!((top..=bottom).contains(&(y as i32)), "far wall at row {y}");
                    if x == 32 {
                        far_rows.push(y);
                    }
                }
            }
        }
        let (first, last) = (far_rows[0], far_rows[far_rows.len() - 1]);

        // far room is lower: both steps are painted in the portal wall's colour
        let step = shade(wall_colour(2), 18.0 / 100.0);
        let column: Vec<Rgba> = (0..H).map(|y| px(&fb, 32, y)).collect();
        assert!(column[..first].contains(&step));
        assert!(column[last + 1..].contains(&step));
        for (y, &c) in column.iter().enumerate() {
            if c == step {
                assert!((top..=bottom).contains(&(y as i32)), "step at row {y}");
            }
        }
        // outside the opening the column keeps room 0's ceiling and floor
        assert!(column[..top as usize].iter().all(|&c| c == CEILING));
        assert!(column[bottom as usize + 1..].iter().all(|&c| c == FLOOR));
    }

    #[test]
    fn portal_back_edges_are_not_walked() {
        // three triangles in a row; each portal also leads straight back
        let src = "\
[BEGIN_VERTS]
0 0
10 0
10 10
0 10
5 20
[END_VERTS]
[BEGIN_WALLS]
0 1 false
1 2 false
2 0 true
2 3 true
3 0 false
2 4 false
4 3 false
[END_WALLS]
[BEGIN_SECTORS]
0 10 0 1 2
0 10 2 3 4
0 10 3 5 6
[END_SECTORS]
";
        let scene = parse_scene(src).expect("loads");
        let mut fb = frame();
        let report = draw(&mut fb, &scene, &camera(6.0, 5.0, 2.0, Vec3::new(-0.3, 0.0, 1.0)), 0);
        assert_eq!(order(&report), vec![(0, 0), (1, 0), (2, 1)]);
    }

    #[test]
    fn portal_ring_reaches_each_neighbour_once() {
        // three triangles around one vertex, every pair shares a portal
        let src = "\
[BEGIN_VERTS]
10 10
0 0
20 0
10 20
[END_VERTS]
[BEGIN_WALLS]
1 2 false
2 0 true
0 1 true
2 3 false
3 0 true
3 1 false
[END_WALLS]
[BEGIN_SECTORS]
0 10 0 1 2
0 10 1 3 4
0 10 4 5 2
[END_SECTORS]
";
        let scene = parse_scene(src).expect("loads");
        let mut fb = frame();
        let report = draw(&mut fb, &scene, &camera(12.0, 5.0, 2.0, Vec3::Z), 0);

        // sector 2 is reached from 0 directly and again through 1;
        // sector 0 is never re-entered from either side
        assert_eq!(order(&report), vec![(0, 0), (1, 0), (2, 0), (2, 1)]);
        let mut pairs = HashSet::new();
        for v in &report.visits {
            assert!(pairs.insert((v.sector, v.source)), "pair {:?} queued twice", (v.sector, v.source));
        }
    }

    #[test]
    fn pillar_hides_far_side_of_ring() {
        // four rooms around a square pillar, joined by diagonal portals
        let src = "\
[BEGIN_VERTS]
0 0
30 0
30 30
0 30
10 10
20 10
20 20
10 20
[END_VERTS]
[BEGIN_WALLS]
0 1 false
1 5 true
5 4 false
4 0 true
1 2 false
2 6 true
6 5 false
2 3 false
3 7 true
7 6 false
3 0 false
4 7 false
[END_WALLS]
[BEGIN_SECTORS]
0 10 0 1 2 3
0 10 4 5 6 1
0 10 7 8 9 5
0 10 10 3 11 8
[END_SECTORS]
";
        let scene = parse_scene(src).expect("loads");
        let mut fb = frame();
        let report = draw(&mut fb, &scene, &camera(15.0, 5.0, 2.0, Vec3::Z), 0);

        // both neighbours are entered, the room behind the pillar is not
        assert_eq!(order(&report), vec![(0, 0), (1, 0), (3, 0)]);
        assert!(report.visits[0].walls.contains(&2));
    }

    #[test]
    fn every_projection_kind_draws_in_perspective() {
        let scene = parse_scene(TWO_ROOMS).expect("loads");
        let cam = camera(10.0, 5.0, 2.0, Vec3::Z);
        let mut expected = frame();
        draw(&mut expected, &scene, &cam, 0);

        for kind in [ProjectionKind::None, ProjectionKind::Orthographic] {
            let mut fb = frame();
            draw(&mut fb, &scene, &Camera { projection: kind, ..cam }, 0);
            assert_eq!(fb, expected, "{kind:?}");
        }
    }

    #[test]
    fn single_and_pooled_frames_match() {
        let scene = parse_scene(TWO_ROOMS).expect("loads");
        let cam = camera(7.0, 5.0, 3.0, Vec3::new(0.2, 0.0, 1.0));

        let mut a = frame();
        let mut b = frame();
        let mut c = frame();
        let ra = draw(&mut a, &scene, &cam, 0);
        let rb = draw(&mut b, &scene, &cam, 0);

        let pool = build_pool(3).expect("pool");
        let mut surface = Surface::from_u32(W, H, PixelFormat::xrgb8888(), &mut c).expect("valid");
        let rc = render_parallel(&mut surface, &scene, &cam, 0, &pool);

        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(ra, rb);
        assert_eq!(ra, rc);
    }

    #[test]
    fn renderer_is_reusable_across_frames() {
        let scene = parse_scene(TWO_ROOMS).expect("loads");
        let cam = camera(10.0, 5.0, 2.0, Vec3::Z);
        let mut renderer = PortalRenderer::new();

        let mut first = frame();
        let mut second = frame();
        for fb in [&mut first, &mut second] {
            let mut surface = Surface::from_u32(W, H, PixelFormat::xrgb8888(), fb).expect("valid");
            renderer.render(&mut surface, &scene, &cam, 0);
        }
        assert_eq!(first, second);
    }

    #[test]
    fn bad_camera_sector_draws_nothing() {
        let scene = parse_scene(ROOM).expect("loads");
        let mut fb = frame();
        let report = draw(&mut fb, &scene, &camera(20.0, 5.0, 20.0, Vec3::Z), 7);
        assert!(report.visits.is_empty());
        assert!(fb.iter().all(|&p| p == 0));

        let report = draw(&mut fb, &Scene::default(), &camera(0.0, 0.0, 0.0, Vec3::Z), 0);
        assert_eq!(report, FrameReport::default());
    }

    #[test]
    fn pool_size() {
        assert_eq!(build_pool(2).expect("pool").current_num_threads(), 2);
        assert!(build_pool(0).expect("pool").current_num_threads() >= 1);
        assert!(build_pool(-4).expect("pool").current_num_threads() >= 1);
    }
}
