use glam::Vec2;

pub type VertexId = u32;
pub type WallId = u32;
pub type SectorId = u32;

/// Runtime snapshot of one scene (immutable after load).
///
/// Three independent index-addressed lists; every cross reference is an
/// index into one of them.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub vertices: Vec<Vertex>,
    pub walls: Vec<Wall>,
    pub sectors: Vec<Sector>,
}

/*----------------------- simple primitives --------------------------*/

/// A point on the map plane (x, y). Lifted to world space with height 0.
pub type Vertex = Vec2;

/*----------------------------- walls --------------------------------*/

/// An undirected wall segment between two vertices.
#[derive(Clone, Debug, PartialEq)]
pub struct Wall {
    pub vertices: [VertexId; 2],
    pub is_portal: bool,

    /// Sectors that reference this wall, filled by the loader's link pass.
    pub shared_with: [SectorId; 2],
    pub shared_count: u8,
}

impl Wall {
    pub fn new(v1: VertexId, v2: VertexId, is_portal: bool) -> Self {
        Self {
            vertices: [v1, v2],
            is_portal,
            shared_with: [0; 2],
            shared_count: 0,
        }
    }

    /// Owning sectors, in the order they claimed this wall.
    #[inline]
    pub fn sectors(&self) -> &[SectorId] {
        &self.shared_with[..self.shared_count as usize]
    }

    /// The sector on the far side of this wall when seen from `from`.
    ///
    /// `None` unless the wall is shared by exactly two sectors.
    pub fn other_side(&self, from: SectorId) -> Option<SectorId> {
        match self.sectors() {
            [a, b] if *a == from => Some(*b),
            [a, b] if *b == from => Some(*a),
            _ => None,
        }
    }
}

/*---------------------------- sectors -------------------------------*/

#[derive(Clone, Debug, PartialEq)]
pub struct Sector {
    pub floor_height: f32,
    pub ceil_height: f32,

    /// Wall indices, one or more closed boundaries back to back.
    pub walls: Vec<WallId>,
    /// Index into `walls` of the last wall of each boundary.
    pub cycle_ends: Vec<u32>,
}

impl Sector {
    /// Each closed boundary as a slice of wall indices.
    pub fn cycles(&self) -> impl Iterator<Item = &[WallId]> + '_ {
        let mut start = 0usize;
        self.cycle_ends.iter().map(move |&end| {
            let end = (end as usize + 1).min(self.walls.len());
            let cycle = &self.walls[start.min(end)..end];
            start = end;
            cycle
        })
    }
}

impl Scene {
    /// Map-plane position of vertex `id`.
    #[inline]
    pub fn vertex(&self, id: VertexId) -> Vec2 {
        self.vertices[id as usize]
    }

    /// Both endpoints of wall `id`.
    #[inline]
    pub fn wall_points(&self, id: WallId) -> [Vec2; 2] {
        let w = &self.walls[id as usize];
        [self.vertex(w.vertices[0]), self.vertex(w.vertices[1])]
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    fn sector(walls: Vec<WallId>, cycle_ends: Vec<u32>) -> Sector {
        Sector {
            floor_height: 0.0,
            ceil_height: 1.0,
            walls,
            cycle_ends,
        }
    }

    #[test]
    fn other_side_needs_two_owners() {
        let mut w = Wall::new(0, 1, true);
        assert_eq!(w.other_side(0), None);

        w.shared_with = [3, 7];
        w.shared_count = 2;
        assert_eq!(w.other_side(3), Some(7));
        assert_eq!(w.other_side(7), Some(3));
        assert_eq!(w.other_side(5), None);
    }

    #[test]
    fn cycles_split_on_cycle_ends() {
        let s = sector(vec![0, 1, 2, 3, 4, 5, 6], vec![3, 6]);
        let cycles: Vec<&[WallId]> = s.cycles().collect();
        assert_eq!(cycles, vec![&[0, 1, 2, 3][..], &[4, 5, 6][..]]);
    }

    #[test]
    fn single_cycle_covers_everything() {
        let s = sector(vec![9, 8, 7], vec![2]);
        assert_eq!(s.cycles().count(), 1);
        assert_eq!(s.cycles().next(), Some(&[9, 8, 7][..]));
    }
}
