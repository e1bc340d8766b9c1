//! Recorded maze event logs.
//!
//! A log is parsed leniently: the document shape (grid, markers, event list) must be valid JSON,
//! but individual events with missing or ill-typed fields are kept as [`Action::Malformed`] so
//! replay can skip them without losing its position in the log.

use std::{fmt, fs, path::Path};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::LoadError, geometry::Geometry};

/// A grid position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Reads an `[x, y]` pair. Anything else yields `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        let arr = value.as_array()?;
        if arr.len() < 2 {
            return None;
        }
        let x = i32::try_from(arr[0].as_i64()?).ok()?;
        let y = i32::try_from(arr[1].as_i64()?).ok()?;
        Some(Self { x, y })
    }

    /// Saturates at `u32::MAX` for cells at opposite ends of the `i32` range.
    pub fn manhattan(self, other: Cell) -> u32 {
        self.x.abs_diff(other.x).saturating_add(self.y.abs_diff(other.y))
    }

    /// Whether the cell lies inside `grid`.
    pub fn within(self, grid: GridSize) -> bool {
        u32::try_from(self.x).is_ok_and(|x| x < grid.width)
            && u32::try_from(self.y).is_ok_and(|y| y < grid.height)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// An undirected adjacency between two cells.
///
/// The endpoints are stored lexicographically ordered, so `Edge::new(a, b) == Edge::new(b, a)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    lo: Cell,
    hi: Cell,
}

impl Edge {
    pub fn new(a: Cell, b: Cell) -> Self {
        if a <= b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }

    pub fn endpoints(self) -> (Cell, Cell) {
        (self.lo, self.hi)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.lo, self.hi)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
}

impl GridSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Generate,
    Solve,
    Unknown,
}

impl Phase {
    fn parse(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str) {
            Some("generate") => Self::Generate,
            Some("solve") => Self::Solve,
            _ => Self::Unknown,
        }
    }
}

/// What an event does, with its payload already decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Activate { cell: Cell },
    Link { parent: Cell, child: Cell },
    Explore { cell: Cell, parent: Option<Cell> },
    Path { cells: Vec<Cell> },
    /// Unknown kind, or a known kind whose payload could not be read.
    Malformed,
}

impl Action {
    /// Downgrades the action to [`Action::Malformed`] when a required cell lies outside `grid`.
    /// An out-of-grid `explore` parent is dropped like an unreadable one.
    fn confined_to(self, grid: GridSize) -> Self {
        match self {
            Self::Activate { cell } if !cell.within(grid) => Self::Malformed,
            Self::Link { parent, child } if !(parent.within(grid) && child.within(grid)) => {
                Self::Malformed
            }
            Self::Explore { cell, .. } if !cell.within(grid) => Self::Malformed,
            Self::Explore { cell, parent } => Self::Explore {
                cell,
                parent: parent.filter(|p| p.within(grid)),
            },
            Self::Path { cells } if !cells.iter().all(|c| c.within(grid)) => Self::Malformed,
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub phase: Phase,
    pub action: Action,
}

impl Event {
    pub fn activate(cell: Cell) -> Self {
        Self {
            phase: Phase::Generate,
            action: Action::Activate { cell },
        }
    }

    pub fn link(parent: Cell, child: Cell) -> Self {
        Self {
            phase: Phase::Generate,
            action: Action::Link { parent, child },
        }
    }

    pub fn explore(cell: Cell, parent: Option<Cell>) -> Self {
        Self {
            phase: Phase::Solve,
            action: Action::Explore { cell, parent },
        }
    }

    pub fn path(cells: Vec<Cell>) -> Self {
        Self {
            phase: Phase::Solve,
            action: Action::Path { cells },
        }
    }

    /// Decodes one entry of the `events` array.
    pub fn from_json(value: &Value) -> Self {
        let phase = Phase::parse(value.get("phase"));
        let cell = |name: &str| value.get(name).and_then(Cell::from_json);

        let action = match value.get("event").and_then(Value::as_str) {
            Some("activate") => match cell("cell") {
                Some(cell) => Action::Activate { cell },
                None => Action::Malformed,
            },
            // Older logs put the child under `cell`.
            Some("link") => match (cell("parent"), cell("child").or_else(|| cell("cell"))) {
                (Some(parent), Some(child)) => Action::Link { parent, child },
                _ => Action::Malformed,
            },
            Some("explore") => match cell("cell") {
                Some(c) => Action::Explore {
                    cell: c,
                    parent: cell("parent"),
                },
                None => Action::Malformed,
            },
            Some("path") => value
                .get("cells")
                .and_then(Value::as_array)
                .and_then(|cells| cells.iter().map(Cell::from_json).collect::<Option<Vec<_>>>())
                .map(|cells| Action::Path { cells })
                .unwrap_or(Action::Malformed),
            _ => Action::Malformed,
        };

        Self { phase, action }
    }
}

#[derive(Debug, Deserialize)]
struct RawGrid {
    width: i64,
    height: i64,
}

#[derive(Debug, Deserialize)]
struct RawLog {
    grid: RawGrid,
    #[serde(default)]
    start: Option<Value>,
    #[serde(default)]
    target: Option<Value>,
    #[serde(default)]
    events: Vec<Value>,
}

/// An immutable, ordered event log together with the grid it was recorded on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLog {
    grid: GridSize,
    start: Cell,
    target: Cell,
    events: Vec<Event>,
    solver_boundary: usize,
}

impl EventLog {
    pub fn new(grid: GridSize, start: Cell, target: Cell, events: Vec<Event>) -> Self {
        let solver_boundary = events
            .iter()
            .position(|e| e.phase == Phase::Solve)
            .unwrap_or(events.len());
        Self {
            grid,
            start,
            target,
            events,
            solver_boundary,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, LoadError> {
        let raw: RawLog = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    pub fn load_json_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    fn from_raw(raw: RawLog) -> Result<Self, LoadError> {
        let RawGrid { width, height } = raw.grid;
        let dims = u32::try_from(width).ok().zip(u32::try_from(height).ok());
        let grid = match dims {
            Some((w, h)) if Geometry::fits(GridSize::new(w, h)) => GridSize::new(w, h),
            _ => return Err(LoadError::InvalidGrid { width, height }),
        };

        let marker = |v: Option<Value>| v.as_ref().and_then(Cell::from_json).unwrap_or_default();
        let events = raw
            .events
            .iter()
            .map(|value| {
                let Event { phase, action } = Event::from_json(value);
                Event {
                    phase,
                    action: action.confined_to(grid),
                }
            })
            .collect();

        Ok(Self::new(grid, marker(raw.start), marker(raw.target), events))
    }

    pub fn grid(&self) -> GridSize {
        self.grid
    }

    pub fn start(&self) -> Cell {
        self.start
    }

    pub fn target(&self) -> Cell {
        self.target
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Index of the first `solve` event, or the log length if there is none.
    pub fn solver_boundary(&self) -> usize {
        self.solver_boundary
    }
}
