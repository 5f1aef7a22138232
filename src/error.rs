use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutoclickError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Неверный селектор: '{0}'")]
    Selector(String),

    #[error("Элемент не найден: {0}")]
    ElementNotFound(String),

    #[error("Ошибка хоста страницы: {0}")]
    Host(String),

    #[error("Ошибка CDP: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),
}

impl AutoclickError {
    pub fn element_not_found<T>(msg: impl Into<String>) -> Result<T> {
        Err(AutoclickError::ElementNotFound(msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, AutoclickError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! autoclick_error {
    (element_not_found, $($arg:tt)*) => {
        $crate::error::AutoclickError::ElementNotFound(format!($($arg)*))
    };
    (host, $($arg:tt)*) => {
        $crate::error::AutoclickError::Host(format!($($arg)*))
    };
}
