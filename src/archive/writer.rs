//! Запись примитивов архива в бинарный поток.
//!
//! [`ArchiveWriter`] пишет скаляры, массивы и строки в формате BE,
//! а также кадры — области с префиксом длины. Открытый кадр
//! буферизуется целиком, поэтому к моменту `end_frame` его точная
//! длина в байтах всегда известна.

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};
use uuid::Uuid;

use crate::error::{ArchiveError, ArchiveResult};

/// Сессия записи поверх произвольного `Write`.
///
/// Первая же ошибка переводит сессию в «залипшее» состояние: все
/// дальнейшие вызовы возвращают [`ArchiveError::Failed`], ничего
/// не записывая.
pub struct ArchiveWriter<W: Write> {
    inner: W,
    /// Стек буферов открытых кадров, от внешнего к внутреннему.
    frames: Vec<Vec<u8>>,
    failed: bool,
}

impl<W: Write> ArchiveWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            frames: Vec::new(),
            failed: false,
        }
    }

    /// Возвращает `true`, если сессия уже отказала.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Отдаёт нижележащий поток. Все кадры должны быть закрыты.
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn guard<T>(&mut self, f: impl FnOnce(&mut Self) -> ArchiveResult<T>) -> ArchiveResult<T> {
        if self.failed {
            return Err(ArchiveError::Failed);
        }
        let rc = f(self);
        if rc.is_err() {
            self.failed = true;
        }
        rc
    }

    /// Приёмник текущих байтов: внутренний кадр либо сам поток.
    fn sink(&mut self) -> &mut dyn Write {
        match self.frames.last_mut() {
            Some(buf) => buf,
            None => &mut self.inner,
        }
    }

    // ---- кадры ------------------------------------------------------------

    /// Открывает кадр с префиксом длины.
    pub fn begin_frame(&mut self) -> ArchiveResult<()> {
        self.guard(|w| {
            w.frames.push(Vec::new());
            Ok(())
        })
    }

    /// Закрывает внутренний кадр: пишет `[len: u32][байты]` в
    /// объемлющий кадр или в поток.
    pub fn end_frame(&mut self) -> ArchiveResult<()> {
        self.guard(|w| {
            let buf = w.frames.pop().ok_or_else(|| {
                ArchiveError::InvalidData("end_frame without begin_frame".into())
            })?;
            let len = u32::try_from(buf.len())
                .map_err(|_| ArchiveError::InvalidData("frame too large".into()))?;
            let sink = w.sink();
            sink.write_u32::<BigEndian>(len)?;
            sink.write_all(&buf)?;
            Ok(())
        })
    }

    // ---- скаляры ----------------------------------------------------------

    pub fn write_bool(&mut self, v: bool) -> ArchiveResult<()> {
        self.guard(|w| Ok(w.sink().write_u8(v as u8)?))
    }

    pub fn write_u8(&mut self, v: u8) -> ArchiveResult<()> {
        self.guard(|w| Ok(w.sink().write_u8(v)?))
    }

    pub fn write_i8(&mut self, v: i8) -> ArchiveResult<()> {
        self.guard(|w| Ok(w.sink().write_i8(v)?))
    }

    pub fn write_i16(&mut self, v: i16) -> ArchiveResult<()> {
        self.guard(|w| Ok(w.sink().write_i16::<BigEndian>(v)?))
    }

    pub fn write_u16(&mut self, v: u16) -> ArchiveResult<()> {
        self.guard(|w| Ok(w.sink().write_u16::<BigEndian>(v)?))
    }

    pub fn write_i32(&mut self, v: i32) -> ArchiveResult<()> {
        self.guard(|w| Ok(w.sink().write_i32::<BigEndian>(v)?))
    }

    pub fn write_u32(&mut self, v: u32) -> ArchiveResult<()> {
        self.guard(|w| Ok(w.sink().write_u32::<BigEndian>(v)?))
    }

    pub fn write_i64(&mut self, v: i64) -> ArchiveResult<()> {
        self.guard(|w| Ok(w.sink().write_i64::<BigEndian>(v)?))
    }

    pub fn write_f32(&mut self, v: f32) -> ArchiveResult<()> {
        self.guard(|w| Ok(w.sink().write_f32::<BigEndian>(v)?))
    }

    pub fn write_f64(&mut self, v: f64) -> ArchiveResult<()> {
        self.guard(|w| Ok(w.sink().write_f64::<BigEndian>(v)?))
    }

    /// GUID пишется как 16 байт RFC-раскладки.
    pub fn write_guid(&mut self, v: Uuid) -> ArchiveResult<()> {
        self.guard(|w| Ok(w.sink().write_all(v.as_bytes())?))
    }

    /// Строка: `u32`-длина + байты UTF-8.
    pub fn write_str(&mut self, s: &str) -> ArchiveResult<()> {
        self.guard(|w| {
            let b = s.as_bytes();
            let len = u32::try_from(b.len())
                .map_err(|_| ArchiveError::InvalidData("string too large".into()))?;
            let sink = w.sink();
            sink.write_u32::<BigEndian>(len)?;
            sink.write_all(b)?;
            Ok(())
        })
    }

    // ---- массивы ----------------------------------------------------------
    //
    // Каждый массив — это `i32`-счётчик элементов и сами элементы.
    // Счётчик 0 валиден и отличим от «значения нет».

    fn write_count(&mut self, len: usize) -> ArchiveResult<()> {
        self.guard(|w| {
            let count = i32::try_from(len)
                .map_err(|_| ArchiveError::InvalidData("array too large".into()))?;
            Ok(w.sink().write_i32::<BigEndian>(count)?)
        })
    }

    pub fn write_bool_array(&mut self, v: &[bool]) -> ArchiveResult<()> {
        self.write_count(v.len())?;
        for x in v {
            self.write_bool(*x)?;
        }
        Ok(())
    }

    pub fn write_byte_array(&mut self, v: &[u8]) -> ArchiveResult<()> {
        self.write_count(v.len())?;
        self.guard(|w| Ok(w.sink().write_all(v)?))
    }

    pub fn write_i8_array(&mut self, v: &[i8]) -> ArchiveResult<()> {
        self.write_count(v.len())?;
        for x in v {
            self.write_i8(*x)?;
        }
        Ok(())
    }

    pub fn write_i16_array(&mut self, v: &[i16]) -> ArchiveResult<()> {
        self.write_count(v.len())?;
        for x in v {
            self.write_i16(*x)?;
        }
        Ok(())
    }

    pub fn write_i32_array(&mut self, v: &[i32]) -> ArchiveResult<()> {
        self.write_count(v.len())?;
        for x in v {
            self.write_i32(*x)?;
        }
        Ok(())
    }

    pub fn write_f32_array(&mut self, v: &[f32]) -> ArchiveResult<()> {
        self.write_count(v.len())?;
        for x in v {
            self.write_f32(*x)?;
        }
        Ok(())
    }

    pub fn write_f64_array(&mut self, v: &[f64]) -> ArchiveResult<()> {
        self.write_count(v.len())?;
        for x in v {
            self.write_f64(*x)?;
        }
        Ok(())
    }

    pub fn write_guid_array(&mut self, v: &[Uuid]) -> ArchiveResult<()> {
        self.write_count(v.len())?;
        for x in v {
            self.write_guid(*x)?;
        }
        Ok(())
    }

    pub fn write_str_array(&mut self, v: &[String]) -> ArchiveResult<()> {
        self.write_count(v.len())?;
        for x in v {
            self.write_str(x)?;
        }
        Ok(())
    }

    // ---- протокол словаря -------------------------------------------------

    /// Заголовок словаря: идентификатор производителя, версия, имя.
    pub fn write_dict_header(&mut self, id: Uuid, version: u32, name: &str) -> ArchiveResult<()> {
        self.write_guid(id)?;
        self.write_u32(version)?;
        self.write_str(name)
    }

    /// Открывает кадр записи: `[len][tag: i32][key]...`.
    pub fn begin_entry(&mut self, tag: i32, key: &str) -> ArchiveResult<()> {
        self.begin_frame()?;
        self.write_i32(tag)?;
        self.write_str(key)
    }

    /// Закрывает кадр записи.
    pub fn end_entry(&mut self) -> ArchiveResult<()> {
        self.end_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_scalars_layout() {
        let mut w = ArchiveWriter::new(Vec::new());
        w.write_bool(true).unwrap();
        w.write_u8(0xAB).unwrap();
        w.write_i32(-1).unwrap();
        w.write_f64(1.5).unwrap();

        let out = w.into_inner();
        let mut expected = vec![1u8, 0xAB];
        expected.extend(&(-1i32).to_be_bytes());
        expected.extend(&1.5f64.to_be_bytes());
        assert_eq!(out, expected);
    }

    #[test]
    fn test_write_str_length_prefixed() {
        let mut w = ArchiveWriter::new(Vec::new());
        w.write_str("ключ").unwrap();

        let out = w.into_inner();
        let b = "ключ".as_bytes();
        let mut expected = (b.len() as u32).to_be_bytes().to_vec();
        expected.extend(b);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_frame_wraps_payload_with_length() {
        let mut w = ArchiveWriter::new(Vec::new());
        w.begin_frame().unwrap();
        w.write_u8(7).unwrap();
        w.write_u8(9).unwrap();
        w.end_frame().unwrap();

        assert_eq!(w.into_inner(), vec![0, 0, 0, 2, 7, 9]);
    }

    #[test]
    fn test_nested_frames() {
        let mut w = ArchiveWriter::new(Vec::new());
        w.begin_frame().unwrap();
        w.begin_frame().unwrap();
        w.write_u8(1).unwrap();
        w.end_frame().unwrap();
        w.end_frame().unwrap();

        // внешний кадр содержит внутренний целиком: [len=5][len=1][1]
        assert_eq!(w.into_inner(), vec![0, 0, 0, 5, 0, 0, 0, 1, 1]);
    }

    #[test]
    fn test_empty_array_is_count_zero() {
        let mut w = ArchiveWriter::new(Vec::new());
        w.write_f64_array(&[]).unwrap();
        assert_eq!(w.into_inner(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_end_frame_without_begin_fails_and_latches() {
        let mut w = ArchiveWriter::new(Vec::new());
        let err = w.end_frame().unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidData(_)));

        // сессия залипла
        assert!(w.is_failed());
        assert!(matches!(w.write_u8(1).unwrap_err(), ArchiveError::Failed));
    }
}
