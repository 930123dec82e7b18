/// Archive primitive I/O: frames, scalars, arrays, strings.
pub mod archive;
/// The dictionary protocol: tag registry, values, codec.
pub mod dict;
/// Common error types: archive I/O and dictionary usage errors.
pub mod error;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Read/write sessions and the tri-state entry sentinel.
pub use archive::{ArchiveReader, ArchiveWriter, EntryStatus};
/// The dictionary, its values and the tag registry.
pub use dict::{
    is_known, read_dictionary, write_dictionary, BoundingBox, Color, DictValue, Dictionary, Font,
    Interval, ItemTag, Line, OpaqueItem, Plane, Point2d, Point2f, Point2i, Point3d, Point3f,
    Point4d, Ray3d, Rect2f, Rect2i, Size2f, Size2i, Transform, Vector2d, Vector3d, Vector3f,
    DICTIONARY_FORMAT_ID, MAX_TAG,
};
/// Operation errors and result types.
pub use error::{ArchiveError, ArchiveResult, DictError, DictResult};
