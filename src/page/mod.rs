//! Снимок страницы: HTML, разобранный `scraper`, и поиск по CSS-селекторам.

pub mod document;

pub use document::Document;
