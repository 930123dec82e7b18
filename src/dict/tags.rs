//! Реестр тегов типов для записей словаря.
//!
//! Каждому поддерживаемому виду значения соответствует небольшое
//! целое, которое пишется в кадр записи перед ключом. Реестр
//! закрыт и только пополняется: новый вид получает следующий
//! свободный номер.
//!
//! НИКОГДА не меняйте уже присвоенные номера — это сломает чтение
//! всех существующих архивов. Именно стабильность номеров делает
//! пропуск незнакомых тегов (см. [`crate::dict::decode`])
//! корректным.

use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};

/// Тег вида значения в записи словаря.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TryFromPrimitive,
)]
#[repr(i32)]
pub enum ItemTag {
    /// Сентинел «значения нет». В поток не пишется никогда.
    Undefined = 0,

    // скаляры
    Bool = 1,
    Byte = 2,
    SByte = 3,
    Short = 4,
    UShort = 5,
    Int32 = 6,
    UInt32 = 7,
    Int64 = 8,
    Single = 9,
    Double = 10,
    Guid = 11,
    String = 12,

    // однородные массивы скаляров
    BoolArray = 13,
    ByteArray = 14,
    SByteArray = 15,
    ShortArray = 16,
    Int32Array = 17,
    SingleArray = 18,
    DoubleArray = 19,
    GuidArray = 20,
    StringArray = 21,

    // экранные структуры
    Color = 22,
    Point = 23,
    PointF = 24,
    Rect = 25,
    RectF = 26,
    Size = 27,
    SizeF = 28,
    Font = 29,

    // геометрические структуры
    Interval = 30,
    Point2d = 31,
    Point3d = 32,
    Point4d = 33,
    Vector2d = 34,
    Vector3d = 35,
    BoundingBox = 36,
    Ray3d = 37,
    PlaneEquation = 38,
    Xform = 39,
    Plane = 40,
    Line = 41,
    Point3f = 42,
    Vector3f = 43,

    /// Вложенный словарь (рекурсивно).
    Dictionary = 44,
    /// Легаси-объект: читается дословно, заново не пишется.
    Object = 45,
    /// Легаси-параметры сетки: читаются дословно, заново не пишутся.
    MeshParameters = 46,
    /// Легаси-геометрия: читается дословно, заново не пишется.
    Geometry = 47,
}

/// Наибольший присвоенный на сегодня тег.
pub const MAX_TAG: i32 = ItemTag::Geometry as i32;

/// Известен ли тег текущей версии реестра.
///
/// Читатель не пытается разобрать нагрузку незнакомого тега —
/// запись пропускается по длине кадра.
pub fn is_known(tag: i32) -> bool {
    (1..=MAX_TAG).contains(&tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Номера тегов зафиксированы навсегда; выборочная проверка
    /// против случайной перенумерации.
    #[test]
    fn test_tag_values_are_frozen() {
        assert_eq!(ItemTag::Undefined as i32, 0);
        assert_eq!(ItemTag::Bool as i32, 1);
        assert_eq!(ItemTag::String as i32, 12);
        assert_eq!(ItemTag::BoolArray as i32, 13);
        assert_eq!(ItemTag::StringArray as i32, 21);
        assert_eq!(ItemTag::Color as i32, 22);
        assert_eq!(ItemTag::Interval as i32, 30);
        assert_eq!(ItemTag::Vector3f as i32, 43);
        assert_eq!(ItemTag::Dictionary as i32, 44);
        assert_eq!(ItemTag::Geometry as i32, 47);
        assert_eq!(MAX_TAG, 47);
    }

    #[test]
    fn test_is_known_bounds() {
        assert!(!is_known(0));
        assert!(is_known(1));
        assert!(is_known(MAX_TAG));
        assert!(!is_known(MAX_TAG + 1));
        assert!(!is_known(-1));
    }

    #[test]
    fn test_try_from_roundtrip() {
        for raw in 0..=MAX_TAG {
            let tag = ItemTag::try_from(raw).unwrap();
            assert_eq!(tag as i32, raw);
        }
        assert!(ItemTag::try_from(MAX_TAG + 1).is_err());
    }
}
