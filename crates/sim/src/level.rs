use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fixed::{Angle, Fixed};

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct SectorFlags: u16 {
        /// Gravity pulls toward the ceiling inside this sector.
        const REVERSED_GRAVITY = 1 << 0;
        /// The base volume is liquid from the floor up to the liquid surface.
        const LIQUID           = 1 << 1;
        /// Touching the floor here removes the entity outright.
        const LETHAL_PIT       = 1 << 2;
        /// The ceiling opens to sky; missiles vanish against it quietly.
        const SKY_CEILING      = 1 << 3;
    }
}

/// Sloped plane `z = origin + dzdx * x + dzdy * y`, all fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slope {
    pub z_origin: Fixed,
    pub dzdx: Fixed,
    pub dzdy: Fixed,
}

impl Slope {
    pub fn z_at(&self, x: Fixed, y: Fixed) -> Fixed {
        self.z_origin + self.dzdx.mul(x) + self.dzdy.mul(y)
    }

    /// Unnormalized upward plane normal; callers normalize on demand.
    pub fn normal(&self) -> (Fixed, Fixed, Fixed) {
        (-self.dzdx, -self.dzdy, Fixed::ONE)
    }

    pub fn is_flat(&self) -> bool {
        self.dzdx.is_zero() && self.dzdy.is_zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    /// A solid platform entities can stand on or bonk against.
    Solid,
    /// A liquid volume; entering it dampens gravity and spawns a splash.
    Liquid,
}

/// One stacked height layer inside a sector, on top of the base volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtraLayer {
    pub bottom: Fixed,
    pub top: Fixed,
    pub kind: LayerKind,
}

/// A sector is the unit of vertical structure: base floor/ceiling (possibly
/// sloped), gravity behavior, and any stacked layers.
#[derive(Debug, Clone, PartialEq)]
pub struct Sector {
    pub floor_height: Fixed,
    pub ceiling_height: Fixed,
    pub floor_slope: Option<Slope>,
    pub ceiling_slope: Option<Slope>,
    pub gravity_mult: Fixed,
    pub flags: SectorFlags,
    pub layers: Vec<ExtraLayer>,
}

impl Sector {
    pub fn room(floor_height: Fixed, ceiling_height: Fixed) -> Sector {
        Sector {
            floor_height,
            ceiling_height,
            floor_slope: None,
            ceiling_slope: None,
            gravity_mult: Fixed::ONE,
            flags: SectorFlags::empty(),
            layers: Vec::new(),
        }
    }

    pub fn floor_z_at(&self, x: Fixed, y: Fixed) -> Fixed {
        match &self.floor_slope {
            Some(slope) => slope.z_at(x, y),
            None => self.floor_height,
        }
    }

    pub fn ceiling_z_at(&self, x: Fixed, y: Fixed) -> Fixed {
        match &self.ceiling_slope {
            Some(slope) => slope.z_at(x, y),
            None => self.ceiling_height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("cell count mismatch: expected {expected}, got {actual}")]
    CellCountMismatch { expected: usize, actual: usize },
    #[error("cell {cell} references sector {sector} but only {sector_count} sectors exist")]
    BadSectorRef {
        cell: usize,
        sector: u16,
        sector_count: usize,
    },
    #[error("cell size must be positive")]
    NonPositiveCellSize,
    #[error("level must have at least one sector")]
    NoSectors,
}

/// The consumed map-data product: a rectangular grid of cells, each naming a
/// sector. The simulation never parses a map format; a host hands it one of
/// these already built.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelMap {
    width: u32,
    height: u32,
    cell_size: Fixed,
    origin_x: Fixed,
    origin_y: Fixed,
    cells: Vec<u16>,
    sectors: Vec<Sector>,
    base_gravity: Fixed,
}

impl LevelMap {
    pub fn new(
        width: u32,
        height: u32,
        cell_size: Fixed,
        origin_x: Fixed,
        origin_y: Fixed,
        cells: Vec<u16>,
        sectors: Vec<Sector>,
        base_gravity: Fixed,
    ) -> Result<LevelMap, LevelError> {
        if cell_size <= Fixed::ZERO {
            return Err(LevelError::NonPositiveCellSize);
        }
        if sectors.is_empty() {
            return Err(LevelError::NoSectors);
        }
        let expected = width as usize * height as usize;
        if cells.len() != expected {
            return Err(LevelError::CellCountMismatch {
                expected,
                actual: cells.len(),
            });
        }
        for (cell, sector) in cells.iter().enumerate() {
            if *sector as usize >= sectors.len() {
                return Err(LevelError::BadSectorRef {
                    cell,
                    sector: *sector,
                    sector_count: sectors.len(),
                });
            }
        }
        Ok(LevelMap {
            width,
            height,
            cell_size,
            origin_x,
            origin_y,
            cells,
            sectors,
            base_gravity,
        })
    }

    /// Single-sector level covering the whole grid; test and demo scaffolding.
    pub fn flat(width: u32, height: u32, cell_size: Fixed, sector: Sector) -> LevelMap {
        let cells = vec![0u16; width as usize * height as usize];
        LevelMap::new(
            width,
            height,
            cell_size,
            Fixed::ZERO,
            Fixed::ZERO,
            cells,
            vec![sector],
            LevelMap::DEFAULT_GRAVITY,
        )
        .expect("flat level shape is valid by construction")
    }

    /// Nominal per-tick gravity delta for unmodified sectors.
    pub const DEFAULT_GRAVITY: Fixed = Fixed::HALF;

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn base_gravity(&self) -> Fixed {
        self.base_gravity
    }

    pub fn with_base_gravity(mut self, base_gravity: Fixed) -> LevelMap {
        self.base_gravity = base_gravity;
        self
    }

    /// Grid cell containing a point, clamped to the nearest edge cell so
    /// out-of-bounds positions still resolve deterministically.
    pub fn cell_at(&self, x: Fixed, y: Fixed) -> (u32, u32) {
        let cx = (x - self.origin_x).div(self.cell_size).to_int();
        let cy = (y - self.origin_y).div(self.cell_size).to_int();
        let cx = cx.clamp(0, self.width as i32 - 1) as u32;
        let cy = cy.clamp(0, self.height as i32 - 1) as u32;
        (cx, cy)
    }

    pub fn sector_index_at(&self, x: Fixed, y: Fixed) -> u16 {
        let (cx, cy) = self.cell_at(x, y);
        self.cells[(cy * self.width + cx) as usize]
    }

    pub fn sector_at(&self, x: Fixed, y: Fixed) -> &Sector {
        &self.sectors[self.sector_index_at(x, y) as usize]
    }

    pub fn sector(&self, index: u16) -> Option<&Sector> {
        self.sectors.get(index as usize)
    }

    pub fn sector_count(&self) -> usize {
        self.sectors.len()
    }
}

/// A queued spawn descriptor from the map-data boundary: enough to re-create
/// an entity of a given kind at a placement, nothing more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub kind: u16,
    pub x: Fixed,
    pub y: Fixed,
    pub z: Fixed,
    pub angle: Angle,
}
