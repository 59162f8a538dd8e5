use glam::Vec3;
use physworld_kernel::{DebugDraw, DebugDrawSink, DebugLine};

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Field of view in degrees.
    pub fov_degrees: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 10.0, 10.0),
            target: Vec3::ZERO,
            fov_degrees: 60.0,
        }
    }
}

impl RenderView {
    /// True when `point` lies in front of the eye.
    pub fn faces(&self, point: Vec3) -> bool {
        (point - self.eye).dot(self.target - self.eye) > 0.0
    }
}

/// Renderer-agnostic interface over a debug-draw line buffer.
pub trait Renderer {
    type Output;

    /// Render one frame from the buffered lines and the view.
    fn render(&self, sink: &DebugDrawSink, view: &RenderView) -> Self::Output;
}

/// Produces a human-readable listing of the debug lines.
///
/// Lines entirely behind the camera are counted but not listed.
#[derive(Debug, Clone)]
pub struct DebugTextRenderer {
    max_lines: usize,
}

impl Default for DebugTextRenderer {
    fn default() -> Self {
        Self { max_lines: 32 }
    }
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of listed lines.
    pub fn with_max_lines(max_lines: usize) -> Self {
        Self { max_lines }
    }

    fn format_line(line: &DebugLine) -> String {
        format!(
            "  ({:.2}, {:.2}, {:.2}) -> ({:.2}, {:.2}, {:.2}) rgb=({:.1}, {:.1}, {:.1})\n",
            line.from.x,
            line.from.y,
            line.from.z,
            line.to.x,
            line.to.y,
            line.to.z,
            line.color.x,
            line.color.y,
            line.color.z
        )
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, sink: &DebugDrawSink, view: &RenderView) -> String {
        let visible: Vec<&DebugLine> = sink
            .lines()
            .iter()
            .filter(|l| view.faces(l.from) || view.faces(l.to))
            .collect();

        let mut out = format!(
            "=== Debug Draw (mode={:#x}, lines={}, visible={}) ===\n",
            sink.debug_mode().0,
            sink.line_count(),
            visible.len()
        );
        out.push_str(&format!(
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}\n",
            view.eye.x,
            view.eye.y,
            view.eye.z,
            view.target.x,
            view.target.y,
            view.target.z,
            view.fov_degrees
        ));

        for line in visible.iter().take(self.max_lines) {
            out.push_str(&Self::format_line(line));
        }
        if visible.len() > self.max_lines {
            out.push_str(&format!("  ... {} more\n", visible.len() - self.max_lines));
        }

        tracing::trace!(lines = sink.line_count(), "debug text rendered");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use physworld_kernel::DebugDrawModes;

    fn sink_with(lines: &[(Vec3, Vec3)]) -> DebugDrawSink {
        let mut sink = DebugDrawSink::new(DebugDrawModes::MAX);
        for &(from, to) in lines {
            sink.draw_line(from, to, Vec3::ONE);
        }
        sink
    }

    #[test]
    fn empty_sink() {
        let output = DebugTextRenderer::new().render(&sink_with(&[]), &RenderView::default());
        assert!(output.contains("lines=0"));
        assert!(output.contains("visible=0"));
    }

    #[test]
    fn lists_visible_lines() {
        let sink = sink_with(&[(Vec3::ZERO, Vec3::X), (Vec3::ZERO, Vec3::Y)]);
        let output = DebugTextRenderer::new().render(&sink, &RenderView::default());
        assert!(output.contains("lines=2"));
        assert!(output.contains("(0.00, 0.00, 0.00) -> (1.00, 0.00, 0.00)"));
    }

    #[test]
    fn lines_behind_the_camera_are_hidden() {
        let behind = Vec3::new(0.0, 20.0, 20.0);
        let sink = sink_with(&[(behind, behind + Vec3::Y), (Vec3::ZERO, Vec3::X)]);
        let output = DebugTextRenderer::new().render(&sink, &RenderView::default());
        assert!(output.contains("lines=2, visible=1"));
    }

    #[test]
    fn listing_is_capped() {
        let sink = sink_with(&[(Vec3::ZERO, Vec3::X); 5]);
        let output = DebugTextRenderer::with_max_lines(2).render(&sink, &RenderView::default());
        assert!(output.contains("... 3 more"));
        assert_eq!(output.matches(" -> ").count(), 2);
    }

    #[test]
    fn render_view_default() {
        let view = RenderView::default();
        assert_eq!(view.fov_degrees, 60.0);
        assert_eq!(view.target, Vec3::ZERO);
    }
}
