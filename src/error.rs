// src/error.rs
use thiserror::Error;

/// Ошибки генерации мира.
///
/// Почти все шаги генерации работают по принципу "best effort" и молча
/// принимают частичный результат. Единственное фатальное нарушение
/// инварианта — мир без единого города: сессии негде разместить стартовую
/// локацию.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// На готовой карте не оказалось ни одного города.
    #[error("generated world contains no towns")]
    NoTowns,

    /// Для легаси-сохранения не удалось вывести ни одного пригодного сида.
    #[error("no usable seed: save has neither an explicit seed nor hashable identity")]
    NoUsableSeed,

    /// Ошибка чтения конфигурационного файла.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Ошибка разбора TOML-конфигурации.
    #[error("failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),
}
