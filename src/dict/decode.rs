//! Чтение словаря из архива.
//!
//! Читатель ведёт сентинельный цикл: «есть ли ещё запись?» — и на
//! каждую запись диспетчеризуется по тегу. Незнакомый тег — не
//! ошибка: запись закрывается по длине кадра, байты нагрузки
//! пропускаются. Так архив, записанный будущей версией реестра,
//! остаётся читаемым.

use std::io::Read;

use crate::{
    archive::{ArchiveReader, EntryStatus},
    dict::{
        geometry::{
            BoundingBox, Color, Font, Interval, Line, Plane, Point2d, Point2f, Point2i, Point3d,
            Point3f, Point4d, Ray3d, Rect2f, Rect2i, Size2f, Size2i, Transform, Vector2d,
            Vector3d, Vector3f,
        },
        store::Dictionary,
        tags::ItemTag,
        value::{DictValue, OpaqueItem},
    },
    error::DictResult,
};

use super::encode::DICTIONARY_FORMAT_ID;

/// Читает словарь целиком, рекурсивно со всеми вложенными.
///
/// `Ok(None)` означает «это не наш словарь»: идентификатор
/// производителя в заголовке не совпал. Кадр при этом закрывается,
/// и позиция потока остаётся той же, что после успешного чтения, —
/// вызывающий может продолжать работу с объемлющим архивом.
///
/// Глубина рекурсии равна глубине вложенности словарей; предела
/// нет, так что вызывающий, которому нужна жёсткая гарантия,
/// должен ограничить вложенность сам.
pub fn read_dictionary<R: Read>(archive: &mut ArchiveReader<R>) -> DictResult<Option<Dictionary>> {
    archive.begin_frame()?;
    let (id, version, name) = archive.read_dict_header()?;
    if id != DICTIONARY_FORMAT_ID {
        tracing::debug!(%id, "dictionary header carries a foreign producer id");
        archive.end_frame()?;
        return Ok(None);
    }

    let mut dict = Dictionary::with_version_and_name(version as i32, name);
    loop {
        match archive.begin_entry()? {
            EntryStatus::End => break,
            EntryStatus::Entry { tag, key } => {
                match ItemTag::try_from(tag) {
                    Ok(ItemTag::Undefined) | Err(_) => {
                        // совместимость вперёд: нагрузку не трогаем,
                        // кадр закроется по длине
                        tracing::debug!(tag, key = %key, "skipping entry with unknown tag");
                    }
                    Ok(_) if key.is_empty() => {
                        tracing::debug!(tag, "skipping entry with empty key");
                    }
                    Ok(it) => read_item(archive, &mut dict, it, &key)?,
                }
                archive.end_entry()?;
            }
        }
    }
    archive.end_frame()?;
    Ok(Some(dict))
}

/// Читает нагрузку одной записи и кладёт значение в словарь.
fn read_item<R: Read>(
    archive: &mut ArchiveReader<R>,
    dict: &mut Dictionary,
    it: ItemTag,
    key: &str,
) -> DictResult<()> {
    let value = match it {
        // отфильтрован вызывающим
        ItemTag::Undefined => return Ok(()),

        ItemTag::Bool => DictValue::Bool(archive.read_bool()?),
        ItemTag::Byte => DictValue::Byte(archive.read_u8()?),
        ItemTag::SByte => DictValue::SByte(archive.read_i8()?),
        ItemTag::Short => DictValue::Short(archive.read_i16()?),
        ItemTag::UShort => DictValue::UShort(archive.read_u16()?),
        ItemTag::Int32 => DictValue::Int32(archive.read_i32()?),
        ItemTag::UInt32 => DictValue::UInt32(archive.read_u32()?),
        ItemTag::Int64 => DictValue::Int64(archive.read_i64()?),
        ItemTag::Single => DictValue::Single(archive.read_f32()?),
        ItemTag::Double => DictValue::Double(archive.read_f64()?),
        ItemTag::Guid => DictValue::Guid(archive.read_guid()?),
        ItemTag::String => DictValue::Str(archive.read_str()?),

        ItemTag::BoolArray => DictValue::BoolArray(archive.read_bool_array()?),
        ItemTag::ByteArray => DictValue::ByteArray(archive.read_byte_array()?),
        ItemTag::SByteArray => DictValue::SByteArray(archive.read_i8_array()?),
        ItemTag::ShortArray => DictValue::ShortArray(archive.read_i16_array()?),
        ItemTag::Int32Array => DictValue::Int32Array(archive.read_i32_array()?),
        ItemTag::SingleArray => DictValue::SingleArray(archive.read_f32_array()?),
        ItemTag::DoubleArray => DictValue::DoubleArray(archive.read_f64_array()?),
        ItemTag::GuidArray => DictValue::GuidArray(archive.read_guid_array()?),
        ItemTag::StringArray => DictValue::StrArray(archive.read_str_array()?),

        ItemTag::Color => DictValue::Color(Color {
            a: archive.read_u8()?,
            r: archive.read_u8()?,
            g: archive.read_u8()?,
            b: archive.read_u8()?,
        }),
        ItemTag::Point => DictValue::Point(Point2i {
            x: archive.read_i32()?,
            y: archive.read_i32()?,
        }),
        ItemTag::PointF => DictValue::PointF(Point2f {
            x: archive.read_f32()?,
            y: archive.read_f32()?,
        }),
        ItemTag::Rect => DictValue::Rect(Rect2i {
            x: archive.read_i32()?,
            y: archive.read_i32()?,
            width: archive.read_i32()?,
            height: archive.read_i32()?,
        }),
        ItemTag::RectF => DictValue::RectF(Rect2f {
            x: archive.read_f32()?,
            y: archive.read_f32()?,
            width: archive.read_f32()?,
            height: archive.read_f32()?,
        }),
        ItemTag::Size => DictValue::Size(Size2i {
            width: archive.read_i32()?,
            height: archive.read_i32()?,
        }),
        ItemTag::SizeF => DictValue::SizeF(Size2f {
            width: archive.read_f32()?,
            height: archive.read_f32()?,
        }),
        ItemTag::Font => DictValue::Font(Font {
            family: archive.read_str()?,
            point_size: archive.read_f64()?,
            bold: archive.read_bool()?,
            italic: archive.read_bool()?,
        }),

        ItemTag::Interval => DictValue::Interval(Interval {
            t0: archive.read_f64()?,
            t1: archive.read_f64()?,
        }),
        ItemTag::Point2d => DictValue::Point2d(Point2d {
            x: archive.read_f64()?,
            y: archive.read_f64()?,
        }),
        ItemTag::Point3d => DictValue::Point3d(read_point3d(archive)?),
        ItemTag::Point4d => DictValue::Point4d(Point4d {
            x: archive.read_f64()?,
            y: archive.read_f64()?,
            z: archive.read_f64()?,
            w: archive.read_f64()?,
        }),
        ItemTag::Vector2d => DictValue::Vector2d(Vector2d {
            x: archive.read_f64()?,
            y: archive.read_f64()?,
        }),
        ItemTag::Vector3d => DictValue::Vector3d(read_vector3d(archive)?),
        ItemTag::BoundingBox => DictValue::BoundingBox(BoundingBox {
            min: read_point3d(archive)?,
            max: read_point3d(archive)?,
        }),
        ItemTag::Ray3d => DictValue::Ray3d(Ray3d {
            origin: read_point3d(archive)?,
            direction: read_vector3d(archive)?,
        }),
        ItemTag::PlaneEquation => {
            let mut c = [0.0; 4];
            for x in &mut c {
                *x = archive.read_f64()?;
            }
            DictValue::PlaneEquation(c)
        }
        ItemTag::Xform => {
            let mut m = [[0.0; 4]; 4];
            for row in &mut m {
                for x in row {
                    *x = archive.read_f64()?;
                }
            }
            DictValue::Xform(Box::new(Transform(m)))
        }
        ItemTag::Plane => DictValue::Plane(Plane {
            origin: read_point3d(archive)?,
            xaxis: read_vector3d(archive)?,
            yaxis: read_vector3d(archive)?,
            zaxis: read_vector3d(archive)?,
        }),
        ItemTag::Line => DictValue::Line(Line {
            from: read_point3d(archive)?,
            to: read_point3d(archive)?,
        }),
        ItemTag::Point3f => DictValue::Point3f(Point3f {
            x: archive.read_f32()?,
            y: archive.read_f32()?,
            z: archive.read_f32()?,
        }),
        ItemTag::Vector3f => DictValue::Vector3f(Vector3f {
            x: archive.read_f32()?,
            y: archive.read_f32()?,
            z: archive.read_f32()?,
        }),

        ItemTag::Dictionary => match read_dictionary(archive)? {
            Some(nested) => DictValue::Dictionary(Box::new(nested)),
            // вложенный словарь чужого производителя: запись
            // пропускаем, ошибки нет
            None => return Ok(()),
        },

        // легаси-виды: нагрузка сохраняется дословно и заново не
        // записывается
        ItemTag::Object | ItemTag::MeshParameters | ItemTag::Geometry => {
            DictValue::Opaque(OpaqueItem {
                tag: it,
                bytes: archive.read_frame_rest()?,
            })
        }
    };
    dict.set(key, value)?;
    Ok(())
}

fn read_point3d<R: Read>(archive: &mut ArchiveReader<R>) -> DictResult<Point3d> {
    Ok(Point3d {
        x: archive.read_f64()?,
        y: archive.read_f64()?,
        z: archive.read_f64()?,
    })
}

fn read_vector3d<R: Read>(archive: &mut ArchiveReader<R>) -> DictResult<Vector3d> {
    Ok(Vector3d {
        x: archive.read_f64()?,
        y: archive.read_f64()?,
        z: archive.read_f64()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{archive::ArchiveWriter, dict::encode::write_dictionary, error::ArchiveError};
    use uuid::Uuid;

    fn roundtrip(dict: &Dictionary) -> Dictionary {
        let mut w = ArchiveWriter::new(Vec::new());
        write_dictionary(&mut w, dict).unwrap();
        let buf = w.into_inner();

        let mut r = ArchiveReader::new(&buf[..]);
        read_dictionary(&mut r).unwrap().unwrap()
    }

    #[test]
    fn test_scalar_roundtrip() {
        let mut dict = Dictionary::with_version(1);
        dict.set("b", true).unwrap();
        dict.set("i", -5i32).unwrap();
        dict.set("s", "строка").unwrap();

        assert_eq!(roundtrip(&dict), dict);
    }

    #[test]
    fn test_foreign_producer_id_yields_none() {
        // словарь с чужим идентификатором, собранный вручную
        let mut w = ArchiveWriter::new(Vec::new());
        w.begin_frame().unwrap();
        w.write_dict_header(Uuid::nil(), 3, "alien").unwrap();
        w.end_frame().unwrap();
        let buf = w.into_inner();

        let mut r = ArchiveReader::new(&buf[..]);
        assert_eq!(read_dictionary(&mut r).unwrap(), None);
        // позиция — сразу за кадром словаря
        assert_eq!(r.position(), buf.len() as u64);
    }

    #[test]
    fn test_unknown_tag_skipped() {
        use crate::dict::tags::MAX_TAG;

        let mut w = ArchiveWriter::new(Vec::new());
        w.begin_frame().unwrap();
        w.write_dict_header(DICTIONARY_FORMAT_ID, 0, "").unwrap();
        // запись тега из будущей версии реестра
        w.begin_entry(MAX_TAG + 1, "future").unwrap();
        w.write_f64(99.0).unwrap();
        w.write_str("whatever the future payload is").unwrap();
        w.end_entry().unwrap();
        // следом обычная запись
        w.begin_entry(ItemTag::Int32 as i32, "known").unwrap();
        w.write_i32(17).unwrap();
        w.end_entry().unwrap();
        w.end_frame().unwrap();
        let buf = w.into_inner();

        let mut r = ArchiveReader::new(&buf[..]);
        let dict = read_dictionary(&mut r).unwrap().unwrap();
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.get_i32("known"), Some(17));
    }

    #[test]
    fn test_legacy_payload_read_verbatim() {
        let payload = vec![0xCA, 0xFE, 0xBA, 0xBE];

        let mut w = ArchiveWriter::new(Vec::new());
        w.begin_frame().unwrap();
        w.write_dict_header(DICTIONARY_FORMAT_ID, 0, "").unwrap();
        w.begin_entry(ItemTag::Geometry as i32, "geo").unwrap();
        w.write_byte_array(&payload).unwrap();
        w.end_entry().unwrap();
        w.end_frame().unwrap();
        let buf = w.into_inner();

        let mut r = ArchiveReader::new(&buf[..]);
        let dict = read_dictionary(&mut r).unwrap().unwrap();
        match dict.get("geo") {
            Some(DictValue::Opaque(o)) => {
                assert_eq!(o.tag, ItemTag::Geometry);
                // дословный остаток кадра: счётчик + байты
                let mut expected = 4i32.to_be_bytes().to_vec();
                expected.extend(&payload);
                assert_eq!(o.bytes, expected);
            }
            other => panic!("Expected Opaque, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_stream_is_error_and_sticks() {
        let mut dict = Dictionary::new();
        dict.set("k", 123i64).unwrap();

        let mut w = ArchiveWriter::new(Vec::new());
        write_dictionary(&mut w, &dict).unwrap();
        let mut buf = w.into_inner();
        buf.truncate(buf.len() - 3);

        let mut r = ArchiveReader::new(&buf[..]);
        assert!(read_dictionary(&mut r).is_err());
        assert!(r.is_failed());
        assert!(matches!(r.read_u8().unwrap_err(), ArchiveError::Failed));
    }
}
