//! Протокол архивируемого словаря.
//!
//! Типизированный словарь «ключ → значение» с ~40 видами значений,
//! включая сам словарь (вложение рекурсивно), и его бинарная
//! сериализация поверх кадров [`crate::archive`].
//!
//! ## Модули
//!
//! - [`tags`] — закрытый реестр тегов видов значений
//! - [`geometry`] — структуры-значения фиксированного размера
//! - [`value`] — сумма-тип [`DictValue`]
//! - [`store`] — сам словарь [`Dictionary`] и его API
//! - [`encode`] — запись словаря в архив
//! - [`decode`] — чтение словаря из архива

pub mod decode;
pub mod encode;
pub mod geometry;
pub mod store;
pub mod tags;
pub mod value;

pub use decode::read_dictionary;
pub use encode::{write_dictionary, DICTIONARY_FORMAT_ID};
pub use geometry::*;
pub use store::Dictionary;
pub use tags::{is_known, ItemTag, MAX_TAG};
pub use value::{DictValue, OpaqueItem};
