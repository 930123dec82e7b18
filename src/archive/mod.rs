//! Примитивный ввод-вывод архива.
//!
//! Слой, на который опирается протокол словаря: скаляры, массивы,
//! строки и кадры — области с префиксом длины. Кадр можно закрыть,
//! не прочитав его содержимое, и позиция потока всё равно окажется
//! сразу за кадром.
//!
//! ## Модули
//!
//! - [`writer`] — сессия записи [`ArchiveWriter`]
//! - [`reader`] — сессия чтения [`ArchiveReader`] и сентинел
//!   [`EntryStatus`]

pub mod reader;
pub mod writer;

pub use reader::{ArchiveReader, EntryStatus};
pub use writer::ArchiveWriter;
