//! Overlay shape decoding.
//!
//! An LSM file can carry up to nine overlay lists (vector overlay, LUTs,
//! ROIs, ...), each a header followed by shape records. Every shape starts
//! with a 204-byte prefix holding its style, followed by a type-specific body
//! of knots. Bodies may be padded, so the decoder always seeks to
//! `start + block_length` before reading the next shape.
//!
//! Geometry is reconstructed from the knots: rectangles are normalized to
//! a top-left origin, ellipses are derived from four axis knots or from a
//! center and two axis points, and three-point circles are solved for their
//! circumcenter.

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{IoError, LsmError};
use crate::io::{ByteOrder, RangeReader, RecordCursor};
use crate::metadata::{MetaTarget, MetaValue, MetadataSink};

/// Overlay lists whose declared size does not exceed this are absent.
pub const MIN_LIST_SIZE: i32 = 194;

/// Reserved bytes in the list header before and after the validity flag.
const LIST_RESERVED_BEFORE_VALID: u64 = 20;
const LIST_RESERVED_AFTER_VALID: u64 = 164;

/// Reserved bytes at the end of the shape prefix.
const SHAPE_RESERVED: u64 = 34;

/// Length of the font name field.
const FONT_NAME_LEN: usize = 64;

/// Bytes of a marker shape body.
const MARKER_BODY: u64 = 36;

/// Bytes of one knot (two f64).
const KNOT_SIZE: u64 = 16;

// =============================================================================
// Overlay Lists
// =============================================================================

/// The overlay lists referenced from the header, in header order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OverlayList {
    VectorOverlay,
    InputLut,
    OutputLut,
    Roi,
    BleachRoi,
    MeanOfRoisOverlay,
    TopoIsolineOverlay,
    TopoProfileOverlay,
    LinescanOverlay,
}

impl OverlayList {
    pub const ALL: [OverlayList; 9] = [
        OverlayList::VectorOverlay,
        OverlayList::InputLut,
        OverlayList::OutputLut,
        OverlayList::Roi,
        OverlayList::BleachRoi,
        OverlayList::MeanOfRoisOverlay,
        OverlayList::TopoIsolineOverlay,
        OverlayList::TopoProfileOverlay,
        OverlayList::LinescanOverlay,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OverlayList::VectorOverlay => "VectorOverlay",
            OverlayList::InputLut => "InputLut",
            OverlayList::OutputLut => "OutputLut",
            OverlayList::Roi => "ROI",
            OverlayList::BleachRoi => "BleachROI",
            OverlayList::MeanOfRoisOverlay => "MeanOfRoisOverlay",
            OverlayList::TopoIsolineOverlay => "TopoIsolineOverlay",
            OverlayList::TopoProfileOverlay => "TopoProfileOverlay",
            OverlayList::LinescanOverlay => "LinescanOverlay",
        }
    }
}

// =============================================================================
// Shape Types
// =============================================================================

/// Shape type codes.
pub mod shape_type {
    pub const TEXT: i32 = 13;
    pub const LINE: i32 = 14;
    pub const SCALE_BAR: i32 = 15;
    pub const OPEN_ARROW: i32 = 16;
    pub const CLOSED_ARROW: i32 = 17;
    pub const RECTANGLE: i32 = 18;
    pub const ELLIPSE: i32 = 19;
    pub const CLOSED_POLYLINE: i32 = 20;
    pub const OPEN_POLYLINE: i32 = 21;
    pub const CLOSED_BEZIER: i32 = 22;
    pub const OPEN_BEZIER: i32 = 23;
    pub const CIRCLE: i32 = 24;
    pub const PALETTE: i32 = 25;
    pub const POLYLINE_ARROW: i32 = 26;
    pub const BEZIER_WITH_ARROW: i32 = 27;
    pub const ANGLE: i32 = 28;
    pub const CIRCLE_3POINT: i32 = 29;
}

/// A 2-D point in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Font description from the shape prefix.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FontInfo {
    pub name: String,
    pub height: i32,
    pub width: i32,
    pub escapement: i32,
    pub orientation: i32,
    pub weight: i32,
    pub italic: bool,
    pub underline: bool,
    pub strikeout: bool,
    pub charset: i32,
    pub output_precision: i32,
    pub clip_precision: i32,
    pub quality: i32,
    pub pitch_and_family: i32,
}

/// Styling shared by every shape kind.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ShapeStyle {
    pub line_width: i32,
    pub measurements: i32,
    pub text_offset: (f64, f64),
    pub color: i32,
    pub valid: bool,
    pub knot_width: i32,
    pub catch_area: i32,
    pub font: FontInfo,
    pub enabled: bool,
    pub locked: bool,
}

impl ShapeStyle {
    pub fn font_style(&self) -> &'static str {
        if self.font.italic {
            "italic"
        } else {
            "normal"
        }
    }

    pub fn text_decoration(&self) -> &'static str {
        if self.font.underline {
            "underline"
        } else if self.font.strikeout {
            "line-through"
        } else {
            "normal"
        }
    }
}

/// Shapes that carry no geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarkerKind {
    ScaleBar,
    OpenArrow,
    ClosedArrow,
    Palette,
}

/// Reconstructed shape geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum ShapeGeometry {
    Text {
        anchor: Point,
        text: String,
    },
    Line {
        start: Point,
        end: Point,
    },
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Ellipse {
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
        /// `rotate(<degrees> <cx> <cy>)` for the center-and-axes form
        transform: Option<String>,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
    },
    /// Open polylines, polyline arrows and angles
    Polyline {
        points: Vec<Point>,
    },
    /// Closed polylines
    Polygon {
        points: Vec<Point>,
    },
    /// Bézier curves; control points are not retained
    Bezier {
        knots: usize,
    },
    Marker {
        marker: MarkerKind,
    },
}

/// One decoded shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayShape {
    pub list: OverlayList,
    pub type_code: i32,
    pub style: ShapeStyle,
    pub geometry: ShapeGeometry,
}

// =============================================================================
// Geometry
// =============================================================================

/// Normalize two opposite corners to `(x, y, width, height)`.
pub fn rectangle_from_corners(a: Point, b: Point) -> ShapeGeometry {
    ShapeGeometry::Rectangle {
        x: a.x.min(b.x),
        y: a.y.min(b.y),
        width: (b.x - a.x).abs(),
        height: (b.y - a.y).abs(),
    }
}

/// Ellipse from two knot pairs `(k0, k2)` and `(k1, k3)`.
///
/// The pair with the larger x separation spans the vertical axis: it gives
/// `ry` and the center y, while the other pair gives `rx` and the center x.
/// Equal separations favour the second pair for `ry`.
pub fn ellipse_from_four_knots(k: [Point; 4]) -> ShapeGeometry {
    let r1x = (k[2].x - k[0].x).abs() / 2.0;
    let r1y = (k[2].y - k[0].y).abs() / 2.0;
    let r2x = (k[3].x - k[1].x).abs() / 2.0;
    let r2y = (k[3].y - k[1].y).abs() / 2.0;

    let (rx, ry, cx, cy) = if r1x > r2x {
        (r2x, r1y, k[3].x.min(k[1].x) + r2x, k[2].y.min(k[0].y) + r1y)
    } else {
        (r1x, r2y, k[2].x.min(k[0].x) + r1x, k[3].y.min(k[1].y) + r2y)
    };

    ShapeGeometry::Ellipse {
        cx,
        cy,
        rx,
        ry,
        transform: None,
    }
}

/// Ellipse from its center `k0` and one point on each axis.
pub fn ellipse_from_center(k: [Point; 3]) -> ShapeGeometry {
    let center = k[0];
    let rx = center.distance(k[1]);
    let ry = center.distance(k[2]);
    let theta = ((k[2].y - center.y) / (k[2].x - center.x)).atan().to_degrees();

    ShapeGeometry::Ellipse {
        cx: center.x,
        cy: center.y,
        rx,
        ry,
        transform: Some(format!("rotate({} {} {})", theta, center.x, center.y)),
    }
}

/// Circle through three perimeter points.
///
/// Returns `None` when the points are collinear.
pub fn circle_through(p: [Point; 3]) -> Option<ShapeGeometry> {
    let div = (p[0].x - p[1].x) * (p[2].y - p[0].y) - (p[1].y - p[0].y) * (p[0].x - p[2].x);
    if div == 0.0 {
        return None;
    }
    let s = 0.5 * ((p[1].x - p[2].x) * (p[0].x - p[2].x) - (p[1].y - p[2].y) * (p[2].y - p[0].y))
        / div;

    let cx = 0.5 * (p[0].x + p[1].x) + s * (p[1].y - p[0].y);
    let cy = 0.5 * (p[0].y + p[1].y) + s * (p[0].x - p[1].x);
    let r = p[0].distance(Point::new(cx, cy));
    Some(ShapeGeometry::Circle { cx, cy, r })
}

/// Format points as `"x,y x,y ..."`.
pub fn points_string(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

// =============================================================================
// Decoder
// =============================================================================

/// Decode one overlay list at `offset`.
///
/// A shape whose body is truncated or degenerate is skipped; decoding
/// continues at the next shape. A list whose shape headers cannot be read
/// ends early.
pub fn read_overlay_list<R: RangeReader + ?Sized>(
    reader: &R,
    order: ByteOrder,
    list: OverlayList,
    offset: u64,
) -> Vec<OverlayShape> {
    let mut c = RecordCursor::new(reader, order);
    c.seek(offset);

    let (count, valid) = match read_list_header(&mut c) {
        Ok(Some(header)) => header,
        Ok(None) => {
            debug!(list = list.as_str(), offset, "overlay list absent");
            return Vec::new();
        }
        Err(_) => {
            warn!(list = list.as_str(), offset, "overlay list header truncated");
            return Vec::new();
        }
    };
    if !valid {
        debug!(list = list.as_str(), "overlay list not flagged valid");
    }

    let mut shapes = Vec::new();
    for i in 0..count.max(0) {
        let start = c.position();
        let (type_code, block_length) = match (c.read_i32(), c.read_i32()) {
            (Ok(t), Ok(len)) => (t, len),
            _ => {
                let error = LsmError::TruncatedRecord {
                    offset: start,
                    context: "overlay shape",
                };
                warn!(list = list.as_str(), %error, "abandoning overlay list");
                break;
            }
        };

        match read_shape(&mut c, type_code, i as usize) {
            Ok(Some((style, geometry))) => shapes.push(OverlayShape {
                list,
                type_code,
                style,
                geometry,
            }),
            Ok(None) => debug!(type_code, "skipping unknown overlay shape type"),
            Err(error) => warn!(list = list.as_str(), shape = i, %error, "skipping overlay shape"),
        }

        if block_length <= 0 {
            warn!(list = list.as_str(), shape = i, block_length, "invalid shape length");
            break;
        }
        c.seek(start + block_length as u64);
    }

    debug!(list = list.as_str(), shapes = shapes.len(), "read overlay list");
    shapes
}

/// Read the list header. `None` when the list is absent.
fn read_list_header<R: RangeReader + ?Sized>(
    c: &mut RecordCursor<'_, R>,
) -> Result<Option<(i32, bool)>, IoError> {
    let count = c.read_i32()?;
    let size = c.read_i32()?;
    if size <= MIN_LIST_SIZE {
        return Ok(None);
    }
    c.skip(LIST_RESERVED_BEFORE_VALID);
    let valid = c.read_i32()? == 1;
    c.skip(LIST_RESERVED_AFTER_VALID);
    Ok(Some((count, valid)))
}

/// Read the rest of the shape prefix and its body.
fn read_shape<R: RangeReader + ?Sized>(
    c: &mut RecordCursor<'_, R>,
    type_code: i32,
    index: usize,
) -> Result<Option<(ShapeStyle, ShapeGeometry)>, LsmError> {
    let start = c.position().saturating_sub(8);
    let truncated = |_| LsmError::TruncatedRecord {
        offset: start,
        context: "overlay shape",
    };

    let style = read_style(c).map_err(truncated)?;
    let geometry = match read_geometry(c, type_code).map_err(truncated)? {
        Geometry::Shape(geometry) => geometry,
        Geometry::Degenerate => return Err(LsmError::GeometryDegenerate { shape: index }),
        Geometry::Unknown => return Ok(None),
    };
    Ok(Some((style, geometry)))
}

fn read_style<R: RangeReader + ?Sized>(c: &mut RecordCursor<'_, R>) -> Result<ShapeStyle, IoError> {
    let line_width = c.read_i32()?;
    let measurements = c.read_i32()?;
    let text_offset = (c.read_f64()?, c.read_f64()?);
    let color = c.read_i32()?;
    let valid = c.read_i32()? != 0;
    let knot_width = c.read_i32()?;
    let catch_area = c.read_i32()?;

    let mut font = FontInfo {
        height: c.read_i32()?,
        width: c.read_i32()?,
        escapement: c.read_i32()?,
        orientation: c.read_i32()?,
        weight: c.read_i32()?,
        italic: c.read_i32()? != 0,
        underline: c.read_i32()? != 0,
        strikeout: c.read_i32()? != 0,
        charset: c.read_i32()?,
        output_precision: c.read_i32()?,
        clip_precision: c.read_i32()?,
        quality: c.read_i32()?,
        pitch_and_family: c.read_i32()?,
        ..FontInfo::default()
    };
    font.name = c.read_string(FONT_NAME_LEN)?.trim().to_string();

    let enabled = c.read_i16()? == 0;
    let locked = c.read_i32()? == 0;
    c.skip(SHAPE_RESERVED);

    Ok(ShapeStyle {
        line_width,
        measurements,
        text_offset,
        color,
        valid,
        knot_width,
        catch_area,
        font,
        enabled,
        locked,
    })
}

enum Geometry {
    Shape(ShapeGeometry),
    Degenerate,
    Unknown,
}

fn read_point<R: RangeReader + ?Sized>(c: &mut RecordCursor<'_, R>) -> Result<Point, IoError> {
    Ok(Point::new(c.read_f64()?, c.read_f64()?))
}

fn read_points<R: RangeReader + ?Sized, const N: usize>(
    c: &mut RecordCursor<'_, R>,
) -> Result<[Point; N], IoError> {
    let mut points = [Point::new(0.0, 0.0); N];
    for point in &mut points {
        *point = read_point(c)?;
    }
    Ok(points)
}

/// Read a knot count followed by that many knots.
fn read_knots<R: RangeReader + ?Sized>(c: &mut RecordCursor<'_, R>) -> Result<Vec<Point>, IoError> {
    let count = c.read_i32()?.max(0) as u64;
    let needed = count * KNOT_SIZE;
    if needed > c.remaining() {
        return Err(IoError::RangeOutOfBounds {
            offset: c.position(),
            requested: needed,
            size: c.len(),
        });
    }
    (0..count).map(|_| read_point(c)).collect()
}

fn read_geometry<R: RangeReader + ?Sized>(
    c: &mut RecordCursor<'_, R>,
    type_code: i32,
) -> Result<Geometry, IoError> {
    use shape_type::*;

    let geometry = match type_code {
        TEXT => {
            let anchor = read_point(c)?;
            let text = c.read_cstring()?.trim().to_string();
            ShapeGeometry::Text { anchor, text }
        }
        LINE => {
            c.skip(4);
            let [start, end]: [Point; 2] = read_points(c)?;
            ShapeGeometry::Line { start, end }
        }
        SCALE_BAR | OPEN_ARROW | CLOSED_ARROW | PALETTE => {
            c.skip(MARKER_BODY);
            let marker = match type_code {
                SCALE_BAR => MarkerKind::ScaleBar,
                OPEN_ARROW => MarkerKind::OpenArrow,
                CLOSED_ARROW => MarkerKind::ClosedArrow,
                _ => MarkerKind::Palette,
            };
            ShapeGeometry::Marker { marker }
        }
        RECTANGLE => {
            c.skip(4);
            let [a, b]: [Point; 2] = read_points(c)?;
            rectangle_from_corners(a, b)
        }
        ELLIPSE => {
            let knots = read_knots(c)?;
            match knots.len() {
                4 => ellipse_from_four_knots([knots[0], knots[1], knots[2], knots[3]]),
                3 => ellipse_from_center([knots[0], knots[1], knots[2]]),
                _ => ShapeGeometry::Ellipse {
                    cx: 0.0,
                    cy: 0.0,
                    rx: 0.0,
                    ry: 0.0,
                    transform: None,
                },
            }
        }
        CIRCLE => {
            c.skip(4);
            let [center, edge]: [Point; 2] = read_points(c)?;
            ShapeGeometry::Circle {
                cx: center.x,
                cy: center.y,
                r: center.distance(edge),
            }
        }
        CIRCLE_3POINT => {
            c.skip(4);
            match circle_through(read_points(c)?) {
                Some(circle) => circle,
                None => return Ok(Geometry::Degenerate),
            }
        }
        ANGLE => {
            c.skip(4);
            let points: [Point; 3] = read_points(c)?;
            ShapeGeometry::Polyline {
                points: points.to_vec(),
            }
        }
        CLOSED_POLYLINE => ShapeGeometry::Polygon {
            points: read_knots(c)?,
        },
        OPEN_POLYLINE | POLYLINE_ARROW => ShapeGeometry::Polyline {
            points: read_knots(c)?,
        },
        CLOSED_BEZIER | OPEN_BEZIER | BEZIER_WITH_ARROW => ShapeGeometry::Bezier {
            knots: read_knots(c)?.len(),
        },
        _ => return Ok(Geometry::Unknown),
    };
    Ok(Geometry::Shape(geometry))
}

// =============================================================================
// Publication
// =============================================================================

/// Publish shapes under `MetaTarget::Shape`, numbered from `first_index`.
pub fn publish_shapes(
    shapes: &[OverlayShape],
    series: usize,
    first_index: usize,
    sink: &mut dyn MetadataSink,
) {
    for (i, shape) in shapes.iter().enumerate() {
        let target = MetaTarget::Shape {
            series,
            shape: first_index + i,
        };
        let mut put = |key: &str, value: MetaValue| sink.put(target, key, value);
        let style = &shape.style;

        put("List", shape.list.as_str().into());
        put("FontFamily", style.font.name.as_str().into());
        put("FontSize", style.font.height.into());
        put("FontStyle", style.font_style().into());
        put("FontWeight", style.font.weight.into());
        put("Locked", style.locked.into());
        put("StrokeColor", style.color.into());
        put("StrokeWidth", style.line_width.into());
        put("TextDecoration", style.text_decoration().into());
        put("Visible", style.enabled.into());

        match &shape.geometry {
            ShapeGeometry::Text { anchor, text } => {
                put("Text", text.as_str().into());
                put("X", anchor.x.into());
                put("Y", anchor.y.into());
            }
            ShapeGeometry::Line { start, end } => {
                put("X1", start.x.into());
                put("Y1", start.y.into());
                put("X2", end.x.into());
                put("Y2", end.y.into());
            }
            ShapeGeometry::Rectangle {
                x,
                y,
                width,
                height,
            } => {
                put("X", (*x).into());
                put("Y", (*y).into());
                put("Width", (*width).into());
                put("Height", (*height).into());
            }
            ShapeGeometry::Ellipse {
                cx,
                cy,
                rx,
                ry,
                transform,
            } => {
                put("Cx", (*cx).into());
                put("Cy", (*cy).into());
                put("Rx", (*rx).into());
                put("Ry", (*ry).into());
                if let Some(transform) = transform {
                    put("Transform", transform.as_str().into());
                }
            }
            ShapeGeometry::Circle { cx, cy, r } => {
                put("Cx", (*cx).into());
                put("Cy", (*cy).into());
                put("R", (*r).into());
            }
            ShapeGeometry::Polyline { points } => put("PolylinePoints", points_string(points).into()),
            ShapeGeometry::Polygon { points } => put("PolygonPoints", points_string(points).into()),
            ShapeGeometry::Bezier { knots } => put("BezierKnots", (*knots).into()),
            ShapeGeometry::Marker { marker } => put("Marker", format!("{marker:?}").into()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
