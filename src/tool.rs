//! Drawing tools and the per-tool interaction protocol.
//!
//! [`ToolStateMachine`] consumes pointer input that has already been mapped
//! to canvas space and reports what happened as a [`ToolOutput`]. It never
//! touches the annotation store; the session applies the outputs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::MIN_RECTANGLE_SIZE;
use crate::geometry::{Point, Rect};
use crate::model::{AnnotationId, AnnotationType, Shape};

/// The active annotation tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Select annotations and pan the canvas.
    Select,
    /// Drag out axis-aligned boxes.
    #[default]
    Rectangle,
    /// Click vertices, finish with double-click or right-click.
    Polygon,
    /// Single-click point markers.
    Point,
    /// Single-click keypoint markers.
    Keypoint,
}

impl Tool {
    pub fn all() -> [Tool; 5] {
        [
            Tool::Select,
            Tool::Rectangle,
            Tool::Polygon,
            Tool::Point,
            Tool::Keypoint,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tool::Select => "select",
            Tool::Rectangle => "rectangle",
            Tool::Polygon => "polygon",
            Tool::Point => "point",
            Tool::Keypoint => "keypoint",
        }
    }

    /// Annotation type produced by this tool, if it creates annotations.
    pub fn annotation_type(&self) -> Option<AnnotationType> {
        match self {
            Tool::Select => None,
            Tool::Rectangle => Some(AnnotationType::Rectangle),
            Tool::Polygon => Some(AnnotationType::Polygon),
            Tool::Point => Some(AnnotationType::Point),
            Tool::Keypoint => Some(AnnotationType::Keypoint),
        }
    }

    pub fn is_drawing_tool(&self) -> bool {
        self.annotation_type().is_some()
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Interaction state of the active tool.
///
/// Dragging and drawing are separate variants, so the canvas can never pan
/// while a shape is in progress.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    /// Canvas pan with the select tool. The anchor is in screen pixels.
    Dragging { anchor_x: f32, anchor_y: f32 },
    /// Rectangle drag in progress, canvas space.
    DrawingRectangle { start: Point, current: Point },
    /// Polygon vertices placed so far plus the live cursor, canvas space.
    DrawingPolygon { path: Vec<Point>, cursor: Point },
}

/// Effect of feeding one input to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// Nothing happened.
    None,
    /// The in-progress shape changed and needs repainting.
    Preview,
    /// The select tool hit this annotation.
    Select(AnnotationId),
    /// The select tool missed; selection should be cleared and a pan begins.
    StartPan,
    /// Incremental pan in screen pixels.
    Pan { dx: f32, dy: f32 },
    EndPan,
    /// A finished shape ready to be committed.
    Commit(Shape),
    /// A finished shape was below the commit threshold and dropped.
    Discarded,
    /// The in-progress shape was abandoned (Escape or tool switch).
    Abandoned,
}

/// Explicit tool/drawing state machine.
#[derive(Debug, Clone)]
pub struct ToolStateMachine {
    tool: Tool,
    state: InteractionState,
    min_rectangle_size: f32,
}

impl Default for ToolStateMachine {
    fn default() -> Self {
        Self::new(MIN_RECTANGLE_SIZE)
    }
}

impl ToolStateMachine {
    pub fn new(min_rectangle_size: f32) -> Self {
        Self {
            tool: Tool::default(),
            state: InteractionState::Idle,
            min_rectangle_size,
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn is_drawing(&self) -> bool {
        matches!(
            self.state,
            InteractionState::DrawingRectangle { .. } | InteractionState::DrawingPolygon { .. }
        )
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, InteractionState::Dragging { .. })
    }

    /// Switch tools.
    ///
    /// Any in-progress shape is discarded and an active pan ends.
    pub fn set_tool(&mut self, tool: Tool) -> ToolOutput {
        let output = self.interrupt();
        if self.tool != tool {
            log::debug!("🔧 Tool: {} -> {}", self.tool, tool);
        }
        self.tool = tool;
        output
    }

    /// Primary button press.
    ///
    /// `screen` is the raw pointer position (pan anchor); `hit` is consulted
    /// only by the select tool.
    pub fn press<F>(&mut self, canvas: Point, screen: (f32, f32), hit: F) -> ToolOutput
    where
        F: FnOnce(Point) -> Option<AnnotationId>,
    {
        match self.tool {
            Tool::Select => match hit(canvas) {
                Some(id) => ToolOutput::Select(id),
                None => {
                    self.state = InteractionState::Dragging {
                        anchor_x: screen.0,
                        anchor_y: screen.1,
                    };
                    ToolOutput::StartPan
                }
            },
            Tool::Rectangle => {
                self.state = InteractionState::DrawingRectangle {
                    start: canvas,
                    current: canvas,
                };
                ToolOutput::Preview
            }
            Tool::Polygon => {
                match &mut self.state {
                    InteractionState::DrawingPolygon { path, cursor } => {
                        path.push(canvas);
                        *cursor = canvas;
                    }
                    _ => {
                        self.state = InteractionState::DrawingPolygon {
                            path: vec![canvas],
                            cursor: canvas,
                        };
                    }
                }
                ToolOutput::Preview
            }
            Tool::Point => ToolOutput::Commit(Shape::Point(canvas)),
            Tool::Keypoint => ToolOutput::Commit(Shape::Keypoint(canvas)),
        }
    }

    /// Pointer movement.
    pub fn move_to(&mut self, canvas: Point, screen: (f32, f32)) -> ToolOutput {
        match &mut self.state {
            InteractionState::Dragging { anchor_x, anchor_y } => {
                let dx = screen.0 - *anchor_x;
                let dy = screen.1 - *anchor_y;
                *anchor_x = screen.0;
                *anchor_y = screen.1;
                ToolOutput::Pan { dx, dy }
            }
            InteractionState::DrawingRectangle { current, .. } => {
                *current = canvas;
                ToolOutput::Preview
            }
            InteractionState::DrawingPolygon { cursor, .. } => {
                *cursor = canvas;
                ToolOutput::Preview
            }
            InteractionState::Idle => ToolOutput::None,
        }
    }

    /// Primary button release.
    pub fn release(&mut self, canvas: Point) -> ToolOutput {
        match std::mem::take(&mut self.state) {
            InteractionState::Dragging { .. } => ToolOutput::EndPan,
            InteractionState::DrawingRectangle { start, .. } => {
                let shape = Shape::Rectangle(Rect::from_corners(start, canvas));
                if shape.is_committable(self.min_rectangle_size) {
                    ToolOutput::Commit(shape)
                } else {
                    log::debug!("Rectangle below {}px, discarded", self.min_rectangle_size);
                    ToolOutput::Discarded
                }
            }
            other => {
                self.state = other;
                ToolOutput::None
            }
        }
    }

    /// Close the polygon in progress (double-click or right-click).
    ///
    /// Commits with three or more vertices; otherwise discards. Either way the
    /// drawing state ends.
    pub fn finish_polygon(&mut self) -> ToolOutput {
        match std::mem::take(&mut self.state) {
            InteractionState::DrawingPolygon { path, .. } => {
                let shape = Shape::Polygon(path);
                if shape.is_committable(self.min_rectangle_size) {
                    ToolOutput::Commit(shape)
                } else {
                    log::debug!("Polygon with too few vertices, discarded");
                    ToolOutput::Discarded
                }
            }
            other => {
                self.state = other;
                ToolOutput::None
            }
        }
    }

    /// Abandon the in-progress shape, if any. Panning is left alone.
    pub fn cancel(&mut self) -> ToolOutput {
        if self.is_drawing() {
            self.state = InteractionState::Idle;
            log::debug!("In-progress shape abandoned");
            ToolOutput::Abandoned
        } else {
            ToolOutput::None
        }
    }

    /// Drop back to idle, discarding drawing and pan state.
    pub fn reset(&mut self) {
        self.state = InteractionState::Idle;
    }

    fn interrupt(&mut self) -> ToolOutput {
        match std::mem::take(&mut self.state) {
            InteractionState::Idle => ToolOutput::None,
            InteractionState::Dragging { .. } => ToolOutput::EndPan,
            InteractionState::DrawingRectangle { .. } | InteractionState::DrawingPolygon { .. } => {
                log::debug!("Tool switch abandoned in-progress {} shape", self.tool);
                ToolOutput::Abandoned
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_hit(_: Point) -> Option<AnnotationId> {
        None
    }

    fn machine(tool: Tool) -> ToolStateMachine {
        let mut sm = ToolStateMachine::default();
        sm.set_tool(tool);
        sm
    }

    fn drag_rect(sm: &mut ToolStateMachine, from: Point, to: Point) -> ToolOutput {
        sm.press(from, (from.x, from.y), no_hit);
        sm.move_to(to, (to.x, to.y));
        sm.release(to)
    }

    #[test]
    fn test_rectangle_threshold() {
        let mut sm = machine(Tool::Rectangle);
        let out = drag_rect(&mut sm, Point::new(0.0, 0.0), Point::new(4.0, 10.0));
        assert_eq!(out, ToolOutput::Discarded);
        assert!(!sm.is_drawing());

        let out = drag_rect(&mut sm, Point::new(0.0, 0.0), Point::new(6.0, 6.0));
        assert_eq!(
            out,
            ToolOutput::Commit(Shape::Rectangle(Rect::new(0.0, 0.0, 6.0, 6.0)))
        );
    }

    #[test]
    fn test_rectangle_normalizes_corners() {
        let mut sm = machine(Tool::Rectangle);
        let out = drag_rect(&mut sm, Point::new(50.0, 40.0), Point::new(10.0, 20.0));
        assert_eq!(
            out,
            ToolOutput::Commit(Shape::Rectangle(Rect::new(10.0, 20.0, 40.0, 20.0)))
        );
    }

    #[test]
    fn test_polygon_needs_three_vertices() {
        let mut sm = machine(Tool::Polygon);
        sm.press(Point::new(0.0, 0.0), (0.0, 0.0), no_hit);
        sm.press(Point::new(10.0, 0.0), (10.0, 0.0), no_hit);
        assert_eq!(sm.finish_polygon(), ToolOutput::Discarded);
        assert!(!sm.is_drawing());

        let pts = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(5.0, 8.0)];
        for p in pts {
            sm.press(p, (p.x, p.y), no_hit);
        }
        assert_eq!(sm.finish_polygon(), ToolOutput::Commit(Shape::Polygon(pts.to_vec())));
    }

    #[test]
    fn test_polygon_keeps_duplicate_vertices() {
        let mut sm = machine(Tool::Polygon);
        for _ in 0..3 {
            sm.press(Point::new(1.0, 1.0), (1.0, 1.0), no_hit);
        }
        match sm.state() {
            InteractionState::DrawingPolygon { path, .. } => assert_eq!(path.len(), 3),
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn test_point_tools_commit_on_press() {
        let mut sm = machine(Tool::Point);
        let out = sm.press(Point::new(3.0, 4.0), (3.0, 4.0), no_hit);
        assert_eq!(out, ToolOutput::Commit(Shape::Point(Point::new(3.0, 4.0))));
        assert!(!sm.is_drawing());

        sm.set_tool(Tool::Keypoint);
        let out = sm.press(Point::new(1.0, 2.0), (1.0, 2.0), no_hit);
        assert_eq!(out, ToolOutput::Commit(Shape::Keypoint(Point::new(1.0, 2.0))));
    }

    #[test]
    fn test_select_hit_and_pan() {
        let mut sm = machine(Tool::Select);
        let out = sm.press(Point::new(5.0, 5.0), (105.0, 105.0), |_| Some("a".to_string()));
        assert_eq!(out, ToolOutput::Select("a".to_string()));
        assert!(!sm.is_dragging());

        assert_eq!(sm.press(Point::new(0.0, 0.0), (100.0, 100.0), no_hit), ToolOutput::StartPan);
        assert_eq!(
            sm.move_to(Point::new(0.0, 0.0), (110.0, 95.0)),
            ToolOutput::Pan { dx: 10.0, dy: -5.0 }
        );
        // Relative to the previous move, not the press.
        assert_eq!(
            sm.move_to(Point::new(0.0, 0.0), (112.0, 95.0)),
            ToolOutput::Pan { dx: 2.0, dy: 0.0 }
        );
        assert_eq!(sm.release(Point::new(0.0, 0.0)), ToolOutput::EndPan);
        assert!(!sm.is_dragging());
    }

    #[test]
    fn test_tool_switch_discards_polygon() {
        let mut sm = machine(Tool::Polygon);
        sm.press(Point::new(0.0, 0.0), (0.0, 0.0), no_hit);
        sm.press(Point::new(10.0, 0.0), (10.0, 0.0), no_hit);

        assert_eq!(sm.set_tool(Tool::Rectangle), ToolOutput::Abandoned);
        sm.set_tool(Tool::Polygon);
        assert_eq!(sm.state(), &InteractionState::Idle);

        sm.press(Point::new(7.0, 7.0), (7.0, 7.0), no_hit);
        match sm.state() {
            InteractionState::DrawingPolygon { path, .. } => {
                assert_eq!(path, &vec![Point::new(7.0, 7.0)])
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn test_cancel() {
        let mut sm = machine(Tool::Rectangle);
        assert_eq!(sm.cancel(), ToolOutput::None);
        sm.press(Point::new(0.0, 0.0), (0.0, 0.0), no_hit);
        assert_eq!(sm.cancel(), ToolOutput::Abandoned);
        assert!(!sm.is_drawing());
        assert_eq!(sm.release(Point::new(50.0, 50.0)), ToolOutput::None);
    }

    #[test]
    fn test_tool_serde_names() {
        assert_eq!(serde_json::to_string(&Tool::Keypoint).unwrap(), "\"keypoint\"");
        let tool: Tool = serde_json::from_str("\"select\"").unwrap();
        assert_eq!(tool, Tool::Select);
    }
}
