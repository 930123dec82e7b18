//! The sum type behind a dictionary entry.
//!
//! One variant per supported kind. The match in [`DictValue::tag`]
//! is the single value→tag mapping; it is exhaustive, so adding a
//! kind forces every dispatch site to be revisited.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    geometry::{
        BoundingBox, Color, Font, Interval, Line, Plane, Point2d, Point2f, Point2i, Point3d,
        Point3f, Point4d, Ray3d, Rect2f, Rect2i, Size2f, Size2i, Transform, Vector2d, Vector3d,
        Vector3f,
    },
    store::Dictionary,
    tags::ItemTag,
};

/// Payload of a legacy read-only entry, kept verbatim.
///
/// Captured as the raw bytes of the entry frame so an old archive
/// can still be inspected; the writer never re-emits these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpaqueItem {
    pub tag: ItemTag,
    pub bytes: Vec<u8>,
}

/// A value stored under one dictionary key.
///
/// There is no `Undefined` variant on purpose: an entry that holds
/// a `DictValue` always has something to persist, which is what
/// keeps the "tag 0 is never written" invariant true by
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DictValue {
    Bool(bool),
    Byte(u8),
    SByte(i8),
    Short(i16),
    UShort(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    Single(f32),
    Double(f64),
    Guid(Uuid),
    Str(String),

    BoolArray(Vec<bool>),
    ByteArray(Vec<u8>),
    SByteArray(Vec<i8>),
    ShortArray(Vec<i16>),
    Int32Array(Vec<i32>),
    SingleArray(Vec<f32>),
    DoubleArray(Vec<f64>),
    GuidArray(Vec<Uuid>),
    StrArray(Vec<String>),

    Color(Color),
    Point(Point2i),
    PointF(Point2f),
    Rect(Rect2i),
    RectF(Rect2f),
    Size(Size2i),
    SizeF(Size2f),
    Font(Font),

    Interval(Interval),
    Point2d(Point2d),
    Point3d(Point3d),
    Point4d(Point4d),
    Vector2d(Vector2d),
    Vector3d(Vector3d),
    BoundingBox(BoundingBox),
    Ray3d(Ray3d),
    /// Exactly four coefficients; enforced by
    /// [`Dictionary::set_plane_equation`](super::store::Dictionary::set_plane_equation).
    PlaneEquation([f64; 4]),
    Xform(Box<Transform>),
    Plane(Plane),
    Line(Line),
    Point3f(Point3f),
    Vector3f(Vector3f),

    /// A nested dictionary, owned by value.
    Dictionary(Box<Dictionary>),
    /// Legacy payload: decoded archives only, never written back.
    Opaque(OpaqueItem),
}

impl DictValue {
    /// The registry tag this value persists under.
    pub fn tag(&self) -> ItemTag {
        match self {
            DictValue::Bool(_) => ItemTag::Bool,
            DictValue::Byte(_) => ItemTag::Byte,
            DictValue::SByte(_) => ItemTag::SByte,
            DictValue::Short(_) => ItemTag::Short,
            DictValue::UShort(_) => ItemTag::UShort,
            DictValue::Int32(_) => ItemTag::Int32,
            DictValue::UInt32(_) => ItemTag::UInt32,
            DictValue::Int64(_) => ItemTag::Int64,
            DictValue::Single(_) => ItemTag::Single,
            DictValue::Double(_) => ItemTag::Double,
            DictValue::Guid(_) => ItemTag::Guid,
            DictValue::Str(_) => ItemTag::String,
            DictValue::BoolArray(_) => ItemTag::BoolArray,
            DictValue::ByteArray(_) => ItemTag::ByteArray,
            DictValue::SByteArray(_) => ItemTag::SByteArray,
            DictValue::ShortArray(_) => ItemTag::ShortArray,
            DictValue::Int32Array(_) => ItemTag::Int32Array,
            DictValue::SingleArray(_) => ItemTag::SingleArray,
            DictValue::DoubleArray(_) => ItemTag::DoubleArray,
            DictValue::GuidArray(_) => ItemTag::GuidArray,
            DictValue::StrArray(_) => ItemTag::StringArray,
            DictValue::Color(_) => ItemTag::Color,
            DictValue::Point(_) => ItemTag::Point,
            DictValue::PointF(_) => ItemTag::PointF,
            DictValue::Rect(_) => ItemTag::Rect,
            DictValue::RectF(_) => ItemTag::RectF,
            DictValue::Size(_) => ItemTag::Size,
            DictValue::SizeF(_) => ItemTag::SizeF,
            DictValue::Font(_) => ItemTag::Font,
            DictValue::Interval(_) => ItemTag::Interval,
            DictValue::Point2d(_) => ItemTag::Point2d,
            DictValue::Point3d(_) => ItemTag::Point3d,
            DictValue::Point4d(_) => ItemTag::Point4d,
            DictValue::Vector2d(_) => ItemTag::Vector2d,
            DictValue::Vector3d(_) => ItemTag::Vector3d,
            DictValue::BoundingBox(_) => ItemTag::BoundingBox,
            DictValue::Ray3d(_) => ItemTag::Ray3d,
            DictValue::PlaneEquation(_) => ItemTag::PlaneEquation,
            DictValue::Xform(_) => ItemTag::Xform,
            DictValue::Plane(_) => ItemTag::Plane,
            DictValue::Line(_) => ItemTag::Line,
            DictValue::Point3f(_) => ItemTag::Point3f,
            DictValue::Vector3f(_) => ItemTag::Vector3f,
            DictValue::Dictionary(_) => ItemTag::Dictionary,
            DictValue::Opaque(o) => o.tag,
        }
    }

    /// Whether the writer will persist this value. Legacy opaque
    /// payloads are read-only.
    pub fn is_writable(&self) -> bool {
        !matches!(self, DictValue::Opaque(_))
    }
}

macro_rules! impl_from {
    ($($source:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$source> for DictValue {
                fn from(v: $source) -> Self {
                    DictValue::$variant(v)
                }
            }
        )+
    };
}

impl_from! {
    bool => Bool,
    u8 => Byte,
    i8 => SByte,
    i16 => Short,
    u16 => UShort,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    f32 => Single,
    f64 => Double,
    Uuid => Guid,
    String => Str,
    Vec<bool> => BoolArray,
    Vec<u8> => ByteArray,
    Vec<i8> => SByteArray,
    Vec<i16> => ShortArray,
    Vec<i32> => Int32Array,
    Vec<f32> => SingleArray,
    Vec<f64> => DoubleArray,
    Vec<Uuid> => GuidArray,
    Vec<String> => StrArray,
    Color => Color,
    Point2i => Point,
    Point2f => PointF,
    Rect2i => Rect,
    Rect2f => RectF,
    Size2i => Size,
    Size2f => SizeF,
    Font => Font,
    Interval => Interval,
    Point2d => Point2d,
    Point3d => Point3d,
    Point4d => Point4d,
    Vector2d => Vector2d,
    Vector3d => Vector3d,
    BoundingBox => BoundingBox,
    Ray3d => Ray3d,
    Plane => Plane,
    Line => Line,
    Point3f => Point3f,
    Vector3f => Vector3f,
}

impl From<&str> for DictValue {
    fn from(v: &str) -> Self {
        DictValue::Str(v.to_owned())
    }
}

impl From<Transform> for DictValue {
    fn from(v: Transform) -> Self {
        DictValue::Xform(Box::new(v))
    }
}

impl From<Dictionary> for DictValue {
    fn from(v: Dictionary) -> Self {
        DictValue::Dictionary(Box::new(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_mapping_matches_registry() {
        assert_eq!(DictValue::Bool(true).tag(), ItemTag::Bool);
        assert_eq!(DictValue::Str("s".into()).tag(), ItemTag::String);
        assert_eq!(DictValue::DoubleArray(vec![]).tag(), ItemTag::DoubleArray);
        assert_eq!(
            DictValue::Dictionary(Box::new(Dictionary::new())).tag(),
            ItemTag::Dictionary
        );
        let opaque = DictValue::Opaque(OpaqueItem {
            tag: ItemTag::Geometry,
            bytes: vec![1, 2, 3],
        });
        assert_eq!(opaque.tag(), ItemTag::Geometry);
        assert!(!opaque.is_writable());
    }

    #[test]
    fn test_from_conversions() {
        assert_eq!(DictValue::from(42i32), DictValue::Int32(42));
        assert_eq!(DictValue::from("key"), DictValue::Str("key".into()));
        assert!(matches!(
            DictValue::from(Transform::identity()),
            DictValue::Xform(_)
        ));
    }
}
