//! Frame rendering as a display list.
//!
//! [`render_frame`] turns the editor state into an ordered list of
//! [`DrawCommand`]s that a canvas backend replays verbatim. The order is
//! fixed: clear, transform, image, committed annotations, in-progress shape,
//! restore, crosshair.
//!
//! Commands between [`DrawCommand::PushTransform`] and
//! [`DrawCommand::PopTransform`] are in canvas space. Text sizes are always
//! screen pixels, so labels keep their size at every zoom level.

use serde::Serialize;

use crate::color_utils::{Rgba, darken};
use crate::constants::style;
use crate::geometry::{Point, Rect};
use crate::model::{Annotation, Category, ImageInfo, Shape, color_for};
use crate::tool::InteractionState;
use crate::viewport::{CanvasBounds, Viewport};

/// Stroke and fill settings of one command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Style {
    pub stroke: Option<Rgba>,
    pub line_width: f32,
    pub fill: Option<Rgba>,
    pub dash: Option<[f32; 2]>,
}

impl Style {
    pub fn stroke(color: Rgba, line_width: f32) -> Self {
        Self {
            stroke: Some(color),
            line_width,
            fill: None,
            dash: None,
        }
    }

    pub fn fill(color: Rgba) -> Self {
        Self {
            stroke: None,
            line_width: 0.0,
            fill: Some(color),
            dash: None,
        }
    }

    pub fn with_fill(mut self, color: Rgba) -> Self {
        self.fill = Some(color);
        self
    }

    pub fn dashed(mut self, dash: [f32; 2]) -> Self {
        self.dash = Some(dash);
        self
    }
}

/// One drawing primitive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear {
        width: f32,
        height: f32,
    },
    /// Translate by the offset, then scale.
    PushTransform {
        offset_x: f32,
        offset_y: f32,
        scale: f32,
    },
    PopTransform,
    Image {
        image_id: String,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Rect {
        rect: Rect,
        style: Style,
    },
    Polyline {
        points: Vec<Point>,
        closed: bool,
        style: Style,
    },
    Circle {
        center: Point,
        radius: f32,
        style: Style,
    },
    Line {
        from: Point,
        to: Point,
        style: Style,
    },
    Text {
        text: String,
        position: Point,
        size_px: f32,
        color: Rgba,
    },
}

/// A rendered frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frame {
    pub commands: Vec<DrawCommand>,
}

impl Frame {
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter()
    }

    /// Label texts in draw order.
    pub fn labels(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }
}

/// Fallback colours used when a category has no match.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub annotation_fallback: String,
    pub drawing_fallback: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            annotation_fallback: style::FALLBACK_ANNOTATION_COLOR.to_string(),
            drawing_fallback: style::FALLBACK_DRAWING_COLOR.to_string(),
        }
    }
}

/// Everything one frame depends on.
#[derive(Debug, Clone)]
pub struct Scene<'a> {
    pub bounds: CanvasBounds,
    pub viewport: Viewport,
    /// The current image, only once it has loaded.
    pub image: Option<&'a ImageInfo>,
    /// Annotations of the current image, in store order.
    pub annotations: Vec<&'a Annotation>,
    pub selected_id: Option<&'a str>,
    pub categories: &'a [Category],
    pub interaction: &'a InteractionState,
    /// Category new shapes will be committed with.
    pub current_category: &'a str,
    /// Last known cursor position, canvas space.
    pub cursor: Point,
    pub palette: &'a Palette,
}

/// Render one frame.
pub fn render_frame(scene: &Scene<'_>) -> Frame {
    let mut frame = Frame::default();
    let vp = scene.viewport;

    frame.push(DrawCommand::Clear {
        width: scene.bounds.width,
        height: scene.bounds.height,
    });
    frame.push(DrawCommand::PushTransform {
        offset_x: vp.offset_x,
        offset_y: vp.offset_y,
        scale: vp.scale,
    });

    if let Some(image) = scene.image {
        // Stretched over the visible extent; aspect ratio is not preserved.
        frame.push(DrawCommand::Image {
            image_id: image.id.clone(),
            x: 0.0,
            y: 0.0,
            width: scene.bounds.width / vp.scale,
            height: scene.bounds.height / vp.scale,
        });
    }

    for ann in &scene.annotations {
        let selected = scene.selected_id == Some(ann.id.as_str());
        draw_annotation(&mut frame, ann, selected, scene);
    }

    draw_in_progress(&mut frame, scene);

    frame.push(DrawCommand::PopTransform);

    if scene.image.is_some() {
        draw_crosshair(&mut frame, scene);
    }

    frame
}

fn annotation_style(base_hex: &str, selected: bool, fallback: &str) -> Style {
    let (hex, width, alpha) = if selected {
        (
            darken(base_hex, style::SELECTED_DARKEN),
            style::SELECTED_STROKE_WIDTH,
            style::SELECTED_FILL_ALPHA,
        )
    } else {
        (base_hex.to_string(), style::STROKE_WIDTH, style::FILL_ALPHA)
    };
    let color = Rgba::from_hex(&hex)
        .or_else(|| Rgba::from_hex(fallback))
        .unwrap_or(Rgba::GREEN);
    Style::stroke(color, width).with_fill(color.with_alpha(alpha))
}

fn label(frame: &mut Frame, text: &str, x: f32, y: f32) {
    let color = Rgba::from_hex(style::LABEL_COLOR).unwrap_or(Rgba::BLACK);
    frame.push(DrawCommand::Text {
        text: text.to_string(),
        position: Point::new(x, y),
        size_px: style::LABEL_FONT_PX,
        color,
    });
}

fn draw_annotation(frame: &mut Frame, ann: &Annotation, selected: bool, scene: &Scene<'_>) {
    let fallback = scene.palette.annotation_fallback.as_str();
    let base = color_for(scene.categories, &ann.category).unwrap_or(fallback);
    let paint = annotation_style(base, selected, fallback);
    let dot = paint.fill.map(Style::fill);

    match &ann.shape {
        Shape::Rectangle(rect) => {
            frame.push(DrawCommand::Rect { rect: *rect, style: paint });
            label(frame, &ann.category, rect.x, rect.y + style::LABEL_OFFSET_Y);
        }
        Shape::Polygon(points) => {
            if points.len() < 2 {
                return;
            }
            frame.push(DrawCommand::Polyline {
                points: points.clone(),
                closed: true,
                style: paint,
            });
            if let Some(dot) = dot {
                for p in points {
                    frame.push(DrawCommand::Circle {
                        center: *p,
                        radius: style::VERTEX_RADIUS,
                        style: dot,
                    });
                }
            }
            let first = points[0];
            label(frame, &ann.category, first.x, first.y + style::LABEL_OFFSET_Y);
        }
        Shape::Point(p) => {
            frame.push(DrawCommand::Circle {
                center: *p,
                radius: style::POINT_RADIUS,
                style: paint,
            });
            label(
                frame,
                &ann.category,
                p.x + style::POINT_LABEL_OFFSET_X,
                p.y + style::LABEL_OFFSET_Y,
            );
        }
        Shape::Keypoint(p) => {
            let arm = style::KEYPOINT_ARM;
            let cross = Style { fill: None, ..paint };
            frame.push(DrawCommand::Line {
                from: Point::new(p.x - arm, p.y),
                to: Point::new(p.x + arm, p.y),
                style: cross,
            });
            frame.push(DrawCommand::Line {
                from: Point::new(p.x, p.y - arm),
                to: Point::new(p.x, p.y + arm),
                style: cross,
            });
            if let Some(dot) = dot {
                frame.push(DrawCommand::Circle {
                    center: *p,
                    radius: style::KEYPOINT_DOT_RADIUS,
                    style: dot,
                });
            }
            label(
                frame,
                &ann.category,
                p.x + style::POINT_LABEL_OFFSET_X,
                p.y + style::LABEL_OFFSET_Y,
            );
        }
        Shape::Classification => {}
    }
}

fn draw_in_progress(frame: &mut Frame, scene: &Scene<'_>) {
    let fallback = scene.palette.drawing_fallback.as_str();
    let hex = color_for(scene.categories, scene.current_category).unwrap_or(fallback);
    let color = Rgba::from_hex(hex)
        .or_else(|| Rgba::from_hex(fallback))
        .unwrap_or(Rgba::rgb(255, 0, 0));
    let paint = Style::stroke(color, style::STROKE_WIDTH).dashed(style::DRAFT_DASH);

    match scene.interaction {
        InteractionState::DrawingRectangle { start, current } => {
            frame.push(DrawCommand::Rect {
                rect: Rect::from_corners(*start, *current),
                style: paint,
            });
        }
        InteractionState::DrawingPolygon { path, cursor } => {
            // Rubber band from the last vertex to the cursor.
            let mut points = path.clone();
            points.push(*cursor);
            frame.push(DrawCommand::Polyline {
                points,
                closed: false,
                style: paint,
            });
            for p in path {
                frame.push(DrawCommand::Circle {
                    center: *p,
                    radius: style::VERTEX_RADIUS,
                    style: Style::fill(color),
                });
            }
        }
        InteractionState::Idle | InteractionState::Dragging { .. } => {}
    }
}

fn draw_crosshair(frame: &mut Frame, scene: &Scene<'_>) {
    let (x, y) = scene.viewport.canvas_to_local(scene.cursor);
    let (width, height) = (scene.bounds.width, scene.bounds.height);
    let green = Rgba::from_hex(style::CROSSHAIR_COLOR).unwrap_or(Rgba::GREEN);
    let outline = Rgba::BLACK.with_alpha(style::CROSSHAIR_OUTLINE_ALPHA);

    for line_style in [
        Style::stroke(outline, style::CROSSHAIR_OUTLINE_WIDTH),
        Style::stroke(green, style::CROSSHAIR_WIDTH),
    ] {
        frame.push(DrawCommand::Line {
            from: Point::new(x, 0.0),
            to: Point::new(x, height),
            style: line_style,
        });
        frame.push(DrawCommand::Line {
            from: Point::new(0.0, y),
            to: Point::new(width, y),
            style: line_style,
        });
    }

    frame.push(DrawCommand::Circle {
        center: Point::new(x, y),
        radius: style::CROSSHAIR_DOT_RADIUS,
        style: Style::stroke(outline, style::CROSSHAIR_WIDTH).with_fill(green),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_ann(id: &str, category: &str) -> Annotation {
        Annotation::new(
            id,
            "img",
            category,
            Shape::Rectangle(Rect::new(10.0, 20.0, 30.0, 40.0)),
            "t",
        )
    }

    struct Fixture {
        image: ImageInfo,
        categories: Vec<Category>,
        palette: Palette,
        idle: InteractionState,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                image: ImageInfo::new("img", "a.png", 640, 480),
                categories: vec![Category::new("1", "car", "#656565")],
                palette: Palette::default(),
                idle: InteractionState::Idle,
            }
        }

        fn scene<'a>(&'a self, annotations: Vec<&'a Annotation>) -> Scene<'a> {
            Scene {
                bounds: CanvasBounds::sized(800.0, 600.0),
                viewport: Viewport::new(2.0, 10.0, 20.0),
                image: Some(&self.image),
                annotations,
                selected_id: None,
                categories: &self.categories,
                interaction: &self.idle,
                current_category: "car",
                cursor: Point::new(5.0, 5.0),
                palette: &self.palette,
            }
        }
    }

    #[test]
    fn test_draw_order() {
        let fx = Fixture::new();
        let ann = rect_ann("a", "car");
        let frame = render_frame(&fx.scene(vec![&ann]));

        assert!(matches!(frame.commands[0], DrawCommand::Clear { .. }));
        assert!(matches!(
            frame.commands[1],
            DrawCommand::PushTransform { scale, .. } if scale == 2.0
        ));
        assert_eq!(
            frame.commands[2],
            DrawCommand::Image {
                image_id: "img".into(),
                x: 0.0,
                y: 0.0,
                width: 400.0,
                height: 300.0
            }
        );
        assert!(matches!(frame.commands[3], DrawCommand::Rect { .. }));
        assert!(matches!(frame.commands[4], DrawCommand::Text { .. }));
        assert_eq!(frame.commands[5], DrawCommand::PopTransform);
        // Crosshair: two outline lines, two green lines, marker dot.
        assert_eq!(frame.len(), 11);
        assert!(matches!(frame.commands[10], DrawCommand::Circle { .. }));
    }

    #[test]
    fn test_selected_style_darkens() {
        let fx = Fixture::new();
        let ann = rect_ann("a", "car");
        let mut scene = fx.scene(vec![&ann]);

        let unselected = render_frame(&scene);
        scene.selected_id = Some("a");
        let selected = render_frame(&scene);

        let style_of = |frame: &Frame| match &frame.commands[3] {
            DrawCommand::Rect { style, .. } => *style,
            other => panic!("unexpected {:?}", other),
        };
        let normal = style_of(&unselected);
        assert_eq!(normal.stroke, Some(Rgba::rgb(101, 101, 101)));
        assert_eq!(normal.line_width, 2.0);
        assert_eq!(normal.fill, Some(Rgba::rgb(101, 101, 101).with_alpha(0.1)));

        let sel = style_of(&selected);
        assert_eq!(sel.stroke, Some(Rgba::rgb(70, 70, 70)));
        assert_eq!(sel.line_width, 3.0);
        assert_eq!(sel.fill, Some(Rgba::rgb(70, 70, 70).with_alpha(0.2)));
    }

    #[test]
    fn test_unknown_category_uses_fallback() {
        let fx = Fixture::new();
        let ann = rect_ann("a", "unknown");
        let frame = render_frame(&fx.scene(vec![&ann]));
        match &frame.commands[3] {
            DrawCommand::Rect { style, .. } => assert_eq!(style.stroke, Some(Rgba::GREEN)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_label_positions() {
        let fx = Fixture::new();
        let rect = rect_ann("r", "car");
        let point = Annotation::new("p", "img", "nose", Shape::Point(Point::new(50.0, 60.0)), "t");
        let frame = render_frame(&fx.scene(vec![&rect, &point]));

        let positions: Vec<Point> = frame
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Text { position, size_px, .. } => {
                    assert_eq!(*size_px, 12.0);
                    Some(*position)
                }
                _ => None,
            })
            .collect();
        assert_eq!(positions, [Point::new(10.0, 15.0), Point::new(60.0, 55.0)]);
        assert_eq!(frame.labels(), ["car", "nose"]);
    }

    #[test]
    fn test_in_progress_polygon_is_dashed() {
        let mut fx = Fixture::new();
        fx.idle = InteractionState::DrawingPolygon {
            path: vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)],
            cursor: Point::new(10.0, 10.0),
        };
        let frame = render_frame(&fx.scene(Vec::new()));

        let band = frame
            .iter()
            .find_map(|cmd| match cmd {
                DrawCommand::Polyline { points, closed, style } => Some((points, *closed, *style)),
                _ => None,
            })
            .expect("rubber band polyline");
        assert_eq!(band.0.len(), 3);
        assert!(!band.1);
        assert_eq!(band.2.dash, Some([5.0, 5.0]));
        assert_eq!(band.2.stroke, Some(Rgba::rgb(101, 101, 101)));
    }

    #[test]
    fn test_no_image_no_crosshair() {
        let fx = Fixture::new();
        let mut scene = fx.scene(Vec::new());
        scene.image = None;
        let frame = render_frame(&scene);
        assert_eq!(frame.len(), 3);
        assert_eq!(frame.commands[2], DrawCommand::PopTransform);
    }

    #[test]
    fn test_crosshair_in_screen_space() {
        let fx = Fixture::new();
        let frame = render_frame(&fx.scene(Vec::new()));
        // cursor (5,5) at scale 2, offset (10,20) -> (20,30)
        match frame.commands.last() {
            Some(DrawCommand::Circle { center, radius, .. }) => {
                assert_eq!(*center, Point::new(20.0, 30.0));
                assert_eq!(*radius, 4.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
