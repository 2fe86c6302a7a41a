//! Whole-scene checks run once after parsing.
//!
//! 1. sector → wall references
//! 2. wall → vertex references
//! 3. wall ↔ sector linking (at most two owners per wall)

use super::{LoadError, ParseErrorKind, parser::SourceRefs};
use crate::world::{Scene, SectorId};

pub fn link(scene: &mut Scene, refs: &SourceRefs) -> Result<(), LoadError> {
    /*----- 1. Sector walls exist ----------------------------------------*/
    let wall_count = scene.walls.len();
    for (sector, positions) in scene.sectors.iter().zip(&refs.sector_walls) {
        for (&wall, &pos) in sector.walls.iter().zip(positions) {
            if wall as usize >= wall_count {
                return Err(LoadError::at(ParseErrorKind::UndefinedReference, pos));
            }
        }
    }

    /*----- 2. Wall vertices exist ---------------------------------------*/
    let vertex_count = scene.vertices.len();
    for (wall, positions) in scene.walls.iter().zip(&refs.wall_vertices) {
        for (&v, &pos) in wall.vertices.iter().zip(positions) {
            if v as usize >= vertex_count {
                return Err(LoadError::at(ParseErrorKind::UndefinedReference, pos));
            }
        }
    }

    /*----- 3. Link walls to their sectors -------------------------------*/
    for (sector_id, (sector, positions)) in scene
        .sectors
        .iter()
        .zip(&refs.sector_walls)
        .enumerate()
    {
        for (&wall_id, &pos) in sector.walls.iter().zip(positions) {
            let wall = &mut scene.walls[wall_id as usize];
            let n = wall.shared_count as usize;
            if n >= wall.shared_with.len() {
                return Err(LoadError::at(ParseErrorKind::InvalidWall, pos));
            }
            wall.shared_with[n] = sector_id as SectorId;
            wall.shared_count += 1;
        }
    }

    for (id, wall) in scene.walls.iter().enumerate() {
        if wall.is_portal && wall.shared_count != 2 {
            log::warn!(
                "portal wall {id} belongs to {} sector(s), nothing will be seen through it",
                wall.shared_count
            );
        }
    }
    Ok(())
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
