//! Чтение примитивов архива из бинарного потока.
//!
//! [`ArchiveReader`] ведёт счётчик прочитанных байт и стек границ
//! открытых кадров. Благодаря префиксу длины `end_frame` умеет
//! пропустить непрочитанный остаток кадра — на этом держится
//! совместимость вперёд: запись с незнакомым тегом закрывается
//! без попытки понять её содержимое.

use std::io::{self, Read};

use byteorder::{BigEndian, ReadBytesExt};
use uuid::Uuid;

use crate::error::{ArchiveError, ArchiveResult};

/// Результат [`ArchiveReader::begin_entry`]: запись либо конец
/// словаря. Ошибка ввода-вывода приходит третьим исходом, через
/// `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryStatus {
    /// Открыт кадр очередной записи; тег и ключ уже прочитаны.
    Entry { tag: i32, key: String },
    /// Записей больше нет: объемлющий кадр словаря исчерпан.
    End,
}

/// Reader-обёртка, считающая прочитанные байты на лету.
struct CountingRead<R: Read> {
    inner: R,
    bytes_read: u64,
}

impl<R: Read> Read for CountingRead<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.bytes_read += n as u64;
        Ok(n)
    }
}

/// Сессия чтения поверх произвольного `Read`.
///
/// Как и у писателя, первая ошибка «залипает»: дальнейшие вызовы
/// возвращают [`ArchiveError::Failed`], не трогая поток.
pub struct ArchiveReader<R: Read> {
    inner: CountingRead<R>,
    /// Стек абсолютных смещений концов открытых кадров.
    frames: Vec<u64>,
    failed: bool,
}

impl<R: Read> ArchiveReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: CountingRead {
                inner,
                bytes_read: 0,
            },
            frames: Vec::new(),
            failed: false,
        }
    }

    /// Текущая позиция в потоке (байт, прочитанных с начала).
    pub fn position(&self) -> u64 {
        self.inner.bytes_read
    }

    /// Возвращает `true`, если сессия уже отказала.
    pub fn is_failed(&self) -> bool {
        self.failed
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

    /// Чтение `n` байт не должно пересекать границу внутреннего
    /// кадра — иначе это повреждённый поток, а не короткая запись.
    fn check_bounds(&self, n: u64) -> ArchiveResult<()> {
        if let Some(&end) = self.frames.last() {
            if self.inner.bytes_read + n > end {
                return Err(ArchiveError::InvalidData(format!(
                    "read of {n} bytes crosses frame end"
                )));
            }
        }
        Ok(())
    }

    // ---- кадры ------------------------------------------------------------

    /// Открывает кадр: читает `u32`-длину и запоминает, где кадр
    /// кончается.
    pub fn begin_frame(&mut self) -> ArchiveResult<()> {
        self.guard(|r| {
            r.check_bounds(4)?;
            let len = r.inner.read_u32::<BigEndian>()? as u64;
            let end = r.inner.bytes_read + len;
            if let Some(&outer) = r.frames.last() {
                if end > outer {
                    return Err(ArchiveError::InvalidData(
                        "frame exceeds enclosing frame".into(),
                    ));
                }
            }
            r.frames.push(end);
            Ok(())
        })
    }

    /// Закрывает кадр, пропуская его непрочитанный остаток.
    pub fn end_frame(&mut self) -> ArchiveResult<()> {
        self.guard(|r| {
            let end = r.frames.pop().ok_or_else(|| {
                ArchiveError::InvalidData("end_frame without begin_frame".into())
            })?;
            let pos = r.inner.bytes_read;
            if pos > end {
                return Err(ArchiveError::InvalidData("frame overrun".into()));
            }
            if pos < end {
                io::copy(&mut (&mut r.inner).take(end - pos), &mut io::sink())?;
                if r.inner.bytes_read != end {
                    return Err(ArchiveError::Io(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "stream ended inside a frame",
                    )));
                }
            }
            Ok(())
        })
    }

    /// Читает остаток внутреннего кадра как сырые байты.
    ///
    /// Используется для легаси-нагрузок, которые сохраняются
    /// дословно, без разбора.
    pub fn read_frame_rest(&mut self) -> ArchiveResult<Vec<u8>> {
        self.guard(|r| {
            let end = *r.frames.last().ok_or_else(|| {
                ArchiveError::InvalidData("read_frame_rest outside a frame".into())
            })?;
            let len = (end - r.inner.bytes_read) as usize;
            let mut buf = vec![0; len];
            r.inner.read_exact(&mut buf)?;
            Ok(buf)
        })
    }

    // ---- скаляры ----------------------------------------------------------

    pub fn read_bool(&mut self) -> ArchiveResult<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u8(&mut self) -> ArchiveResult<u8> {
        self.guard(|r| {
            r.check_bounds(1)?;
            Ok(r.inner.read_u8()?)
        })
    }

    pub fn read_i8(&mut self) -> ArchiveResult<i8> {
        self.guard(|r| {
            r.check_bounds(1)?;
            Ok(r.inner.read_i8()?)
        })
    }

    pub fn read_i16(&mut self) -> ArchiveResult<i16> {
        self.guard(|r| {
            r.check_bounds(2)?;
            Ok(r.inner.read_i16::<BigEndian>()?)
        })
    }

    pub fn read_u16(&mut self) -> ArchiveResult<u16> {
        self.guard(|r| {
            r.check_bounds(2)?;
            Ok(r.inner.read_u16::<BigEndian>()?)
        })
    }

    pub fn read_i32(&mut self) -> ArchiveResult<i32> {
        self.guard(|r| {
            r.check_bounds(4)?;
            Ok(r.inner.read_i32::<BigEndian>()?)
        })
    }

    pub fn read_u32(&mut self) -> ArchiveResult<u32> {
        self.guard(|r| {
            r.check_bounds(4)?;
            Ok(r.inner.read_u32::<BigEndian>()?)
        })
    }

    pub fn read_i64(&mut self) -> ArchiveResult<i64> {
        self.guard(|r| {
            r.check_bounds(8)?;
            Ok(r.inner.read_i64::<BigEndian>()?)
        })
    }

    pub fn read_f32(&mut self) -> ArchiveResult<f32> {
        self.guard(|r| {
            r.check_bounds(4)?;
            Ok(r.inner.read_f32::<BigEndian>()?)
        })
    }

    pub fn read_f64(&mut self) -> ArchiveResult<f64> {
        self.guard(|r| {
            r.check_bounds(8)?;
            Ok(r.inner.read_f64::<BigEndian>()?)
        })
    }

    pub fn read_guid(&mut self) -> ArchiveResult<Uuid> {
        self.guard(|r| {
            r.check_bounds(16)?;
            let mut b = [0u8; 16];
            r.inner.read_exact(&mut b)?;
            Ok(Uuid::from_bytes(b))
        })
    }

    pub fn read_str(&mut self) -> ArchiveResult<String> {
        self.guard(|r| {
            r.check_bounds(4)?;
            let len = r.inner.read_u32::<BigEndian>()? as u64;
            r.check_bounds(len)?;
            let mut buf = vec![0; len as usize];
            r.inner.read_exact(&mut buf)?;
            String::from_utf8(buf)
                .map_err(|e| ArchiveError::InvalidData(format!("Invalid UTF-8 encoding: {e}")))
        })
    }

    // ---- массивы ----------------------------------------------------------

    fn read_count(&mut self) -> ArchiveResult<usize> {
        self.guard(|r| {
            r.check_bounds(4)?;
            let count = r.inner.read_i32::<BigEndian>()?;
            if count < 0 {
                return Err(ArchiveError::InvalidData(format!(
                    "negative array count {count}"
                )));
            }
            Ok(count as usize)
        })
    }

    pub fn read_bool_array(&mut self) -> ArchiveResult<Vec<bool>> {
        let n = self.read_count()?;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.read_bool()?);
        }
        Ok(out)
    }

    pub fn read_byte_array(&mut self) -> ArchiveResult<Vec<u8>> {
        let n = self.read_count()?;
        self.guard(|r| {
            r.check_bounds(n as u64)?;
            let mut buf = vec![0; n];
            r.inner.read_exact(&mut buf)?;
            Ok(buf)
        })
    }

    pub fn read_i8_array(&mut self) -> ArchiveResult<Vec<i8>> {
        let n = self.read_count()?;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.read_i8()?);
        }
        Ok(out)
    }

    pub fn read_i16_array(&mut self) -> ArchiveResult<Vec<i16>> {
        let n = self.read_count()?;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.read_i16()?);
        }
        Ok(out)
    }

    pub fn read_i32_array(&mut self) -> ArchiveResult<Vec<i32>> {
        let n = self.read_count()?;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.read_i32()?);
        }
        Ok(out)
    }

    pub fn read_f32_array(&mut self) -> ArchiveResult<Vec<f32>> {
        let n = self.read_count()?;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.read_f32()?);
        }
        Ok(out)
    }

    pub fn read_f64_array(&mut self) -> ArchiveResult<Vec<f64>> {
        let n = self.read_count()?;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.read_f64()?);
        }
        Ok(out)
    }

    pub fn read_guid_array(&mut self) -> ArchiveResult<Vec<Uuid>> {
        let n = self.read_count()?;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.read_guid()?);
        }
        Ok(out)
    }

    pub fn read_str_array(&mut self) -> ArchiveResult<Vec<String>> {
        let n = self.read_count()?;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.read_str()?);
        }
        Ok(out)
    }

    // ---- протокол словаря -------------------------------------------------

    /// Заголовок словаря: идентификатор производителя, версия, имя.
    pub fn read_dict_header(&mut self) -> ArchiveResult<(Uuid, u32, String)> {
        let id = self.read_guid()?;
        let version = self.read_u32()?;
        let name = self.read_str()?;
        Ok((id, version, name))
    }

    /// Сентинельный шаг цикла записей: есть ли в словаре ещё одна?
    ///
    /// Счётчика записей в формате нет — конец определяется
    /// исчерпанием кадра словаря.
    pub fn begin_entry(&mut self) -> ArchiveResult<EntryStatus> {
        let at_end = self.guard(|r| {
            let end = *r.frames.last().ok_or_else(|| {
                ArchiveError::InvalidData("begin_entry outside a dictionary frame".into())
            })?;
            Ok(r.inner.bytes_read >= end)
        })?;
        if at_end {
            return Ok(EntryStatus::End);
        }
        self.begin_frame()?;
        let tag = self.read_i32()?;
        let key = self.read_str()?;
        Ok(EntryStatus::Entry { tag, key })
    }

    /// Закрывает кадр записи, пропуская непонятую нагрузку.
    pub fn end_entry(&mut self) -> ArchiveResult<()> {
        self.end_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveWriter;

    #[test]
    fn test_read_scalars() {
        let mut w = ArchiveWriter::new(Vec::new());
        w.write_bool(true).unwrap();
        w.write_i16(-2).unwrap();
        w.write_i64(1 << 40).unwrap();
        w.write_f32(0.25).unwrap();
        let buf = w.into_inner();

        let mut r = ArchiveReader::new(&buf[..]);
        assert!(r.read_bool().unwrap());
        assert_eq!(r.read_i16().unwrap(), -2);
        assert_eq!(r.read_i64().unwrap(), 1 << 40);
        assert_eq!(r.read_f32().unwrap(), 0.25);
    }

    #[test]
    fn test_read_str() {
        let s = "кадр";
        let mut data = (s.len() as u32).to_be_bytes().to_vec();
        data.extend(s.as_bytes());

        let mut r = ArchiveReader::new(&data[..]);
        assert_eq!(r.read_str().unwrap(), s);
    }

    #[test]
    fn test_end_frame_skips_unread_payload() {
        // кадр из 4 байт, из которых читаем только один
        let data = vec![0, 0, 0, 4, 0xDE, 0xAD, 0xBE, 0xEF, 0x2A];

        let mut r = ArchiveReader::new(&data[..]);
        r.begin_frame().unwrap();
        assert_eq!(r.read_u8().unwrap(), 0xDE);
        r.end_frame().unwrap();

        // позиция — сразу за кадром
        assert_eq!(r.read_u8().unwrap(), 0x2A);
    }

    #[test]
    fn test_read_cannot_cross_frame_end() {
        let data = vec![0, 0, 0, 2, 1, 2, 3, 4, 5, 6, 7, 8];

        let mut r = ArchiveReader::new(&data[..]);
        r.begin_frame().unwrap();
        let err = r.read_i64().unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidData(_)));
    }

    #[test]
    fn test_truncated_frame_is_eof() {
        // кадр объявляет 8 байт, в потоке их нет
        let data = vec![0, 0, 0, 8, 1, 2];

        let mut r = ArchiveReader::new(&data[..]);
        r.begin_frame().unwrap();
        assert!(r.end_frame().is_err());
    }

    #[test]
    fn test_sticky_failure() {
        let data = vec![0, 0, 0, 8, 1, 2];

        let mut r = ArchiveReader::new(&data[..]);
        r.begin_frame().unwrap();
        assert!(r.end_frame().is_err());
        assert!(r.is_failed());

        // каждый следующий вызов отказывает, не читая поток
        assert!(matches!(r.read_u8().unwrap_err(), ArchiveError::Failed));
        assert!(matches!(r.begin_frame().unwrap_err(), ArchiveError::Failed));
    }

    #[test]
    fn test_negative_array_count_rejected() {
        let data = (-1i32).to_be_bytes().to_vec();

        let mut r = ArchiveReader::new(&data[..]);
        assert!(matches!(
            r.read_i32_array().unwrap_err(),
            ArchiveError::InvalidData(_)
        ));
    }

    #[test]
    fn test_empty_array_roundtrip() {
        let mut w = ArchiveWriter::new(Vec::new());
        w.write_guid_array(&[]).unwrap();
        let buf = w.into_inner();

        let mut r = ArchiveReader::new(&buf[..]);
        assert_eq!(r.read_guid_array().unwrap(), Vec::<Uuid>::new());
    }
}
