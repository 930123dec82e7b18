//! Запись словаря в архив.
//!
//! Словарь — это один кадр: заголовок (идентификатор
//! производителя, версия, имя), затем по кадру на каждую запись.
//! Счётчика записей нет — читатель определяет конец по исчерпанию
//! кадра словаря.

use std::io::Write;

use uuid::Uuid;

use crate::{
    archive::ArchiveWriter,
    dict::{
        geometry::{Plane, Point3d, Transform, Vector3d},
        store::Dictionary,
        value::DictValue,
    },
    error::DictResult,
};

/// Идентификатор производителя: постоянный GUID, которым помечен
/// заголовок каждого словаря этого протокола. Поток с любым другим
/// идентификатором — «не наш» и при чтении даёт `None`.
///
/// Каноническая форма: `64e1a1b6-2e74-4c2f-9ae6-05cf5a41d00d`.
pub const DICTIONARY_FORMAT_ID: Uuid = Uuid::from_bytes([
    0x64, 0xe1, 0xa1, 0xb6, 0x2e, 0x74, 0x4c, 0x2f, 0x9a, 0xe6, 0x05, 0xcf, 0x5a, 0x41, 0xd0,
    0x0d,
]);

/// Пишет словарь целиком, рекурсивно со всеми вложенными.
///
/// Первая же неудача прерывает запись; с точки зрения вызывающего
/// операция атомарна — либо словарь записан полностью, либо сессия
/// отказала.
pub fn write_dictionary<W: Write>(
    archive: &mut ArchiveWriter<W>,
    dict: &Dictionary,
) -> DictResult<()> {
    archive.begin_frame()?;
    archive.write_dict_header(DICTIONARY_FORMAT_ID, dict.version() as u32, dict.name())?;
    for (key, value) in dict.iter() {
        if !value.is_writable() {
            // легаси-нагрузки заново не пишутся
            tracing::debug!(key, tag = ?value.tag(), "skipping read-only legacy entry");
            continue;
        }
        write_item(archive, key, value)?;
    }
    archive.end_frame()?;
    Ok(())
}

/// Пишет одну запись: кадр с тегом и ключом, затем нагрузка по
/// виду значения.
fn write_item<W: Write>(
    archive: &mut ArchiveWriter<W>,
    key: &str,
    value: &DictValue,
) -> DictResult<()> {
    archive.begin_entry(value.tag() as i32, key)?;
    match value {
        DictValue::Bool(v) => archive.write_bool(*v)?,
        DictValue::Byte(v) => archive.write_u8(*v)?,
        DictValue::SByte(v) => archive.write_i8(*v)?,
        DictValue::Short(v) => archive.write_i16(*v)?,
        DictValue::UShort(v) => archive.write_u16(*v)?,
        DictValue::Int32(v) => archive.write_i32(*v)?,
        DictValue::UInt32(v) => archive.write_u32(*v)?,
        DictValue::Int64(v) => archive.write_i64(*v)?,
        DictValue::Single(v) => archive.write_f32(*v)?,
        DictValue::Double(v) => archive.write_f64(*v)?,
        DictValue::Guid(v) => archive.write_guid(*v)?,
        DictValue::Str(v) => archive.write_str(v)?,

        DictValue::BoolArray(v) => archive.write_bool_array(v)?,
        DictValue::ByteArray(v) => archive.write_byte_array(v)?,
        DictValue::SByteArray(v) => archive.write_i8_array(v)?,
        DictValue::ShortArray(v) => archive.write_i16_array(v)?,
        DictValue::Int32Array(v) => archive.write_i32_array(v)?,
        DictValue::SingleArray(v) => archive.write_f32_array(v)?,
        DictValue::DoubleArray(v) => archive.write_f64_array(v)?,
        DictValue::GuidArray(v) => archive.write_guid_array(v)?,
        DictValue::StrArray(v) => archive.write_str_array(v)?,

        DictValue::Color(v) => {
            archive.write_u8(v.a)?;
            archive.write_u8(v.r)?;
            archive.write_u8(v.g)?;
            archive.write_u8(v.b)?;
        }
        DictValue::Point(v) => {
            archive.write_i32(v.x)?;
            archive.write_i32(v.y)?;
        }
        DictValue::PointF(v) => {
            archive.write_f32(v.x)?;
            archive.write_f32(v.y)?;
        }
        DictValue::Rect(v) => {
            archive.write_i32(v.x)?;
            archive.write_i32(v.y)?;
            archive.write_i32(v.width)?;
            archive.write_i32(v.height)?;
        }
        DictValue::RectF(v) => {
            archive.write_f32(v.x)?;
            archive.write_f32(v.y)?;
            archive.write_f32(v.width)?;
            archive.write_f32(v.height)?;
        }
        DictValue::Size(v) => {
            archive.write_i32(v.width)?;
            archive.write_i32(v.height)?;
        }
        DictValue::SizeF(v) => {
            archive.write_f32(v.width)?;
            archive.write_f32(v.height)?;
        }
        DictValue::Font(v) => {
            archive.write_str(&v.family)?;
            archive.write_f64(v.point_size)?;
            archive.write_bool(v.bold)?;
            archive.write_bool(v.italic)?;
        }

        DictValue::Interval(v) => {
            archive.write_f64(v.t0)?;
            archive.write_f64(v.t1)?;
        }
        DictValue::Point2d(v) => {
            archive.write_f64(v.x)?;
            archive.write_f64(v.y)?;
        }
        DictValue::Point3d(v) => write_point3d(archive, v)?,
        DictValue::Point4d(v) => {
            archive.write_f64(v.x)?;
            archive.write_f64(v.y)?;
            archive.write_f64(v.z)?;
            archive.write_f64(v.w)?;
        }
        DictValue::Vector2d(v) => {
            archive.write_f64(v.x)?;
            archive.write_f64(v.y)?;
        }
        DictValue::Vector3d(v) => write_vector3d(archive, v)?,
        DictValue::BoundingBox(v) => {
            write_point3d(archive, &v.min)?;
            write_point3d(archive, &v.max)?;
        }
        DictValue::Ray3d(v) => {
            write_point3d(archive, &v.origin)?;
            write_vector3d(archive, &v.direction)?;
        }
        DictValue::PlaneEquation(c) => {
            for x in c {
                archive.write_f64(*x)?;
            }
        }
        DictValue::Xform(v) => write_transform(archive, v)?,
        DictValue::Plane(v) => write_plane(archive, v)?,
        DictValue::Line(v) => {
            write_point3d(archive, &v.from)?;
            write_point3d(archive, &v.to)?;
        }
        DictValue::Point3f(v) => {
            archive.write_f32(v.x)?;
            archive.write_f32(v.y)?;
            archive.write_f32(v.z)?;
        }
        DictValue::Vector3f(v) => {
            archive.write_f32(v.x)?;
            archive.write_f32(v.y)?;
            archive.write_f32(v.z)?;
        }

        DictValue::Dictionary(d) => write_dictionary(archive, d)?,
        // не достижимо: write_dictionary отфильтровывает легаси
        // до открытия кадра
        DictValue::Opaque(_) => {}
    }
    archive.end_entry()?;
    Ok(())
}

fn write_point3d<W: Write>(archive: &mut ArchiveWriter<W>, p: &Point3d) -> DictResult<()> {
    archive.write_f64(p.x)?;
    archive.write_f64(p.y)?;
    archive.write_f64(p.z)?;
    Ok(())
}

fn write_vector3d<W: Write>(archive: &mut ArchiveWriter<W>, v: &Vector3d) -> DictResult<()> {
    archive.write_f64(v.x)?;
    archive.write_f64(v.y)?;
    archive.write_f64(v.z)?;
    Ok(())
}

fn write_plane<W: Write>(archive: &mut ArchiveWriter<W>, p: &Plane) -> DictResult<()> {
    write_point3d(archive, &p.origin)?;
    write_vector3d(archive, &p.xaxis)?;
    write_vector3d(archive, &p.yaxis)?;
    write_vector3d(archive, &p.zaxis)?;
    Ok(())
}

fn write_transform<W: Write>(archive: &mut ArchiveWriter<W>, t: &Transform) -> DictResult<()> {
    for row in &t.0 {
        for x in row {
            archive.write_f64(*x)?;
        }
    }
    Ok(())
}
