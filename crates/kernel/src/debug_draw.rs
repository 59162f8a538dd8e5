use std::cell::RefCell;
use std::ops::BitOr;
use std::rc::Rc;

use glam::Vec3;

/// Bit set selecting which diagnostics a dynamics world emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DebugDrawModes(pub u32);

impl DebugDrawModes {
    pub const NONE: Self = Self(0);
    pub const WIREFRAME: Self = Self(1);
    pub const AABB: Self = Self(1 << 1);
    pub const CONTACT_POINTS: Self = Self(1 << 3);
    pub const CONSTRAINTS: Self = Self(1 << 11);
    pub const CONSTRAINT_LIMITS: Self = Self(1 << 12);
    pub const NORMALS: Self = Self(1 << 14);
    pub const FRAMES: Self = Self(1 << 15);
    /// Every diagnostic the world knows how to draw.
    pub const MAX: Self = Self(
        Self::WIREFRAME.0
            | Self::AABB.0
            | Self::CONTACT_POINTS.0
            | Self::CONSTRAINTS.0
            | Self::CONSTRAINT_LIMITS.0
            | Self::NORMALS.0
            | Self::FRAMES.0,
    );

    pub fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }
}

impl BitOr for DebugDrawModes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Draw-command interface a dynamics world writes diagnostics into.
pub trait DebugDraw {
    fn draw_line(&mut self, from: Vec3, to: Vec3, color: Vec3);

    /// Contact point with its normal scaled by the penetration distance.
    fn draw_contact_point(&mut self, point: Vec3, normal: Vec3, distance: f32, color: Vec3) {
        self.draw_line(point, point + normal * distance, color);
    }

    fn debug_mode(&self) -> DebugDrawModes;
}

/// A single accumulated line segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugLine {
    pub from: Vec3,
    pub to: Vec3,
    pub color: Vec3,
}

/// Accumulates line commands for one diagnostic pass.
///
/// Owned through [`SharedDebugDraw`]: the simulation world holds one strong
/// handle, renderers may hold more, and the dynamics world only a weak one.
#[derive(Debug, Clone, Default)]
pub struct DebugDrawSink {
    mode: DebugDrawModes,
    lines: Vec<DebugLine>,
}

/// Shared-ownership handle to the debug-draw sink.
pub type SharedDebugDraw = Rc<RefCell<DebugDrawSink>>;

impl DebugDrawSink {
    pub fn new(mode: DebugDrawModes) -> Self {
        Self {
            mode,
            lines: Vec::new(),
        }
    }

    pub fn set_debug_mode(&mut self, mode: DebugDrawModes) {
        self.mode = mode;
    }

    pub fn clear_lines(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[DebugLine] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

impl DebugDraw for DebugDrawSink {
    fn draw_line(&mut self, from: Vec3, to: Vec3, color: Vec3) {
        self.lines.push(DebugLine { from, to, color });
    }

    fn debug_mode(&self) -> DebugDrawModes {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_mode_contains_every_flag() {
        for flag in [
            DebugDrawModes::WIREFRAME,
            DebugDrawModes::AABB,
            DebugDrawModes::CONTACT_POINTS,
            DebugDrawModes::CONSTRAINTS,
            DebugDrawModes::CONSTRAINT_LIMITS,
            DebugDrawModes::NORMALS,
            DebugDrawModes::FRAMES,
        ] {
            assert!(DebugDrawModes::MAX.contains(flag));
        }
        assert!(!DebugDrawModes::MAX.contains(DebugDrawModes::NONE));
    }

    #[test]
    fn bitor_combines_flags() {
        let mode = DebugDrawModes::AABB | DebugDrawModes::WIREFRAME;
        assert!(mode.contains(DebugDrawModes::AABB));
        assert!(!mode.contains(DebugDrawModes::CONSTRAINTS));
    }

    #[test]
    fn sink_accumulates_and_clears() {
        let mut sink = DebugDrawSink::new(DebugDrawModes::MAX);
        sink.draw_line(Vec3::ZERO, Vec3::X, Vec3::ONE);
        sink.draw_contact_point(Vec3::ZERO, Vec3::Y, 0.5, Vec3::ONE);
        assert_eq!(sink.line_count(), 2);
        assert_eq!(sink.lines()[1].to, Vec3::new(0.0, 0.5, 0.0));

        sink.clear_lines();
        assert_eq!(sink.line_count(), 0);
        assert_eq!(sink.debug_mode(), DebugDrawModes::MAX);
    }
}
